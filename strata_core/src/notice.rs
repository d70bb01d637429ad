// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notices and the sink trait that receives them.
//!
//! Every stage affected by a change batch gets exactly one
//! [`ObjectsChanged`] notice when the outermost change block closes. Notices
//! are delivered synchronously to each [`NoticeSink`] subscribed to the stage.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use understory_dirty::{Channel, CycleHandling, DirtyTracker};

use crate::dirty;
use crate::path::Path;
use crate::stage::StageId;

/// Changed field names, keyed by object path.
pub type ChangedFields = BTreeMap<Path, Vec<String>>;

/// The effect of one change batch on one stage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectsChanged {
    stage: Option<StageId>,
    resynced: ChangedFields,
    changed_info_only: ChangedFields,
    resolved_asset_paths_resynced: ChangedFields,
}

impl ObjectsChanged {
    /// The stage this notice describes.
    #[must_use]
    pub fn stage(&self) -> Option<StageId> {
        self.stage
    }

    /// Minimal set of paths whose composed namespace or composition changed.
    /// Everything beneath a listed path is implied.
    pub fn resynced_paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.resynced.keys()
    }

    /// Paths where only non-structural field values changed.
    pub fn changed_info_only_paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.changed_info_only.keys()
    }

    /// Paths owning asset-path fields that now resolve differently.
    pub fn resolved_asset_paths_resynced_paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.resolved_asset_paths_resynced.keys()
    }

    /// Resynced paths with their changed fields.
    #[must_use]
    pub fn resynced(&self) -> &ChangedFields {
        &self.resynced
    }

    /// Info-only paths with their changed fields.
    #[must_use]
    pub fn changed_info_only(&self) -> &ChangedFields {
        &self.changed_info_only
    }

    /// Resolved-asset paths with the asset fields involved.
    #[must_use]
    pub fn resolved_asset_paths_resynced(&self) -> &ChangedFields {
        &self.resolved_asset_paths_resynced
    }

    /// Changed fields recorded for `path` in any of the three sets.
    #[must_use]
    pub fn changed_fields(&self, path: &Path) -> &[String] {
        self.resynced
            .get(path)
            .or_else(|| self.changed_info_only.get(path))
            .or_else(|| self.resolved_asset_paths_resynced.get(path))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether the object at `path` is covered by a resync.
    #[must_use]
    pub fn resynced_object(&self, path: &Path) -> bool {
        self.resynced.keys().any(|r| path.has_prefix(r))
    }

    /// Whether `path` is resynced or listed as info-only.
    #[must_use]
    pub fn affected_object(&self, path: &Path) -> bool {
        self.resynced_object(path) || self.changed_info_only.contains_key(path)
    }

    /// Whether nothing was listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resynced.is_empty()
            && self.changed_info_only.is_empty()
            && self.resolved_asset_paths_resynced.is_empty()
    }
}

/// Receives change notices from a stage.
///
/// The default implementation ignores the notice.
pub trait NoticeSink {
    /// Called once per change batch that affected the stage.
    fn on_objects_changed(&mut self, notice: &ObjectsChanged) {
        _ = notice;
    }
}

/// A sink that ignores every notice.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl NoticeSink for NoopSink {}

/// Accumulates the paths touched by a change batch for one stage.
#[derive(Debug)]
pub(crate) struct ChangeTracker {
    dirty: DirtyTracker<u32>,
    ids: BTreeMap<Path, u32>,
    paths: Vec<Path>,
    fields: [BTreeMap<u32, BTreeSet<String>>; 3],
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self {
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            ids: BTreeMap::new(),
            paths: Vec::new(),
            fields: core::array::from_fn(|_| BTreeMap::new()),
        }
    }
}

impl ChangeTracker {
    fn intern(&mut self, path: &Path) -> u32 {
        if let Some(&id) = self.ids.get(path) {
            return id;
        }
        let id = u32::try_from(self.paths.len()).unwrap_or(u32::MAX);
        self.paths.push(path.clone());
        self.ids.insert(path.clone(), id);
        id
    }

    fn mark(&mut self, path: &Path, channel: Channel, slot: usize, field: Option<&str>) {
        let id = self.intern(path);
        self.dirty.mark(id, channel);
        let names = self.fields[slot].entry(id).or_default();
        if let Some(field) = field {
            names.insert(field.to_string());
        }
    }

    pub(crate) fn mark_resync(&mut self, path: &Path, field: Option<&str>) {
        self.mark(path, dirty::RESYNC, 0, field);
    }

    pub(crate) fn mark_info(&mut self, path: &Path, field: &str) {
        self.mark(path, dirty::INFO, 1, Some(field));
    }

    pub(crate) fn mark_asset(&mut self, path: &Path, field: &str) {
        self.mark(path, dirty::ASSET, 2, Some(field));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Drains every channel into a notice; `None` if nothing was marked.
    pub(crate) fn take_notice(&mut self, stage: StageId) -> Option<ObjectsChanged> {
        if self.is_empty() {
            return None;
        }
        let resynced = self.drain_channel(dirty::RESYNC, 0);
        let info = self.drain_channel(dirty::INFO, 1);
        let asset = self.drain_channel(dirty::ASSET, 2);
        self.ids.clear();
        self.paths.clear();

        let resync_roots: Vec<&Path> = resynced.keys().collect();
        let minimal: ChangedFields = resynced
            .iter()
            .filter(|(p, _)| !resync_roots.iter().any(|r| r.is_ancestor_of(p)))
            .map(|(p, f)| (p.clone(), f.clone()))
            .collect();
        let info: ChangedFields = info
            .into_iter()
            .filter(|(p, _)| !minimal.keys().any(|r| p.has_prefix(r)))
            .collect();

        let notice = ObjectsChanged {
            stage: Some(stage),
            resynced: minimal,
            changed_info_only: info,
            resolved_asset_paths_resynced: asset,
        };
        (!notice.is_empty()).then_some(notice)
    }

    fn drain_channel(&mut self, channel: Channel, slot: usize) -> ChangedFields {
        let ids: Vec<u32> = self.dirty.drain(channel).deterministic().run().collect();
        let mut fields = core::mem::take(&mut self.fields[slot]);
        ids.into_iter()
            .filter_map(|id| {
                let path = self.paths.get(id as usize)?.clone();
                let names = fields.remove(&id).unwrap_or_default();
                Some((path, names.into_iter().collect()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    fn stage() -> StageId {
        StageId {
            idx: 0,
            generation: 0,
        }
    }

    #[test]
    fn resyncs_reduce_to_minimal_roots() {
        let mut t = ChangeTracker::default();
        t.mark_resync(&p("/A/B"), None);
        t.mark_resync(&p("/A"), Some("typeName"));
        t.mark_resync(&p("/A.x"), None);
        t.mark_resync(&p("/C"), None);
        t.mark_info(&p("/A/B.y"), "default");
        t.mark_info(&p("/C2.y"), "default");
        let notice = t.take_notice(stage()).unwrap();
        let resynced: Vec<&Path> = notice.resynced_paths().collect();
        assert_eq!(resynced, vec![&p("/A"), &p("/C")]);
        assert_eq!(notice.changed_fields(&p("/A")), &["typeName".to_string()]);
        let info: Vec<&Path> = notice.changed_info_only_paths().collect();
        assert_eq!(info, vec![&p("/C2.y")]);
        assert!(notice.resynced_object(&p("/A/B/Deep")));
    }

    #[test]
    fn fields_merge_and_tracker_resets() {
        let mut t = ChangeTracker::default();
        t.mark_info(&p("/A"), "comment");
        t.mark_info(&p("/A"), "customData");
        let notice = t.take_notice(stage()).unwrap();
        assert_eq!(
            notice.changed_fields(&p("/A")),
            &["comment".to_string(), "customData".to_string()]
        );
        assert!(t.take_notice(stage()).is_none());
    }
}
