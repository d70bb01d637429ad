// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene: an arena owning every layer and stage, plus change batching.
//!
//! All mutation funnels through a [`ChangeBlock`]. Blocks nest; when the
//! outermost one is dropped the scene drains the change records of every
//! layer, recomposes the stages those layers feed, and delivers one
//! [`ObjectsChanged`](crate::notice::ObjectsChanged) notice per affected
//! stage.
//!
//! ```text
//!   Scene::change_block() ──► Layer mutations ──► LayerChange records
//!                                                       │
//!                 ┌─────────────────────────────────────┘
//!                 ▼
//!   drop(outermost block) ──► recompose ──► map to stage paths
//!                                                │
//!                 ┌──────────────────────────────┘
//!                 ▼
//!   ChangeTracker::take_notice() ──► NoticeSink::on_objects_changed()
//! ```

use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::ops::{Deref, DerefMut};

use crate::compose::{Composition, LayerStackKey};
use crate::config::StageConfig;
use crate::layer::{
    Layer, LayerChange, LayerId, LayerStore, LayerStoreError, SpecError, SpecKind, Specifier,
    Value, field,
};
use crate::notice::{ChangeTracker, NoticeSink};
use crate::path::Path;
use crate::stage::{AssetResolver, Stage, StageId};

/// Arena of layers and stages.
#[derive(Debug, Default)]
pub struct Scene {
    layers: LayerStore,
    stages: Vec<Option<Stage>>,
    stage_generation: Vec<u32>,
    stage_free: Vec<u32>,
    batch_depth: u32,
}

/// RAII guard batching every mutation made through it.
///
/// Dereferences to the [`Scene`], so scene convenience methods and nested
/// blocks can be used while it is open.
///
/// Dropping the outermost block recomposes affected stages and delivers
/// notices. With the `std` feature, a block dropped while panicking skips
/// that step; its changes go out with the next outermost block.
#[derive(Debug)]
pub struct ChangeBlock<'a> {
    scene: &'a mut Scene,
}

impl Deref for ChangeBlock<'_> {
    type Target = Scene;

    fn deref(&self) -> &Scene {
        self.scene
    }
}

impl DerefMut for ChangeBlock<'_> {
    fn deref_mut(&mut self) -> &mut Scene {
        self.scene
    }
}

impl Drop for ChangeBlock<'_> {
    fn drop(&mut self) {
        self.scene.batch_depth -= 1;
        #[cfg(feature = "std")]
        if std::thread::panicking() {
            tracing::warn!(
                depth = self.scene.batch_depth,
                "change block unwound, changes left pending"
            );
            return;
        }
        if self.scene.batch_depth == 0 {
            self.scene.flush_changes();
        }
    }
}

impl ChangeBlock<'_> {
    /// Mutably borrows a layer for the duration of the block.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn layer_mut(&mut self, id: LayerId) -> &mut Layer {
        self.scene.layers.layer_mut(id)
    }

    /// Takes a copy of a layer, including its pending change records.
    pub(crate) fn snapshot_layer(&self, id: LayerId) -> Layer {
        self.scene.layers.layer(id).clone()
    }

    /// Puts back a snapshot taken with [`snapshot_layer`](Self::snapshot_layer).
    pub(crate) fn restore_layer(&mut self, id: LayerId, snapshot: Layer) {
        self.scene.layers.restore(id, snapshot);
    }
}

impl Scene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Batching --

    /// Opens a change block. Notices are delivered when the outermost block
    /// is dropped.
    pub fn change_block(&mut self) -> ChangeBlock<'_> {
        self.batch_depth += 1;
        ChangeBlock { scene: self }
    }

    /// Whether a change block is currently open.
    #[must_use]
    pub fn in_change_block(&self) -> bool {
        self.batch_depth > 0
    }

    /// Runs `f` against a layer inside its own change block.
    pub fn edit_layer<R>(&mut self, id: LayerId, f: impl FnOnce(&mut Layer) -> R) -> R {
        let mut block = self.change_block();
        f(block.layer_mut(id))
    }

    // -- Layers --

    /// All layers.
    #[must_use]
    pub fn layers(&self) -> &LayerStore {
        &self.layers
    }

    /// Borrows a layer.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn layer(&self, id: LayerId) -> &Layer {
        self.layers.layer(id)
    }

    /// Creates an empty layer with the given identifier.
    pub fn create_layer(&mut self, identifier: &str) -> Result<LayerId, LayerStoreError> {
        self.layers.create_layer(identifier)
    }

    /// Creates a layer with a fresh unique identifier derived from `tag`.
    pub fn create_anonymous_layer(&mut self, tag: &str) -> LayerId {
        self.layers.create_anonymous_layer(tag)
    }

    /// Marks a layer read-only (or writable again).
    pub fn set_read_only(&mut self, id: LayerId, read_only: bool) {
        self.layers.set_read_only(id, read_only);
    }

    /// Authors a field value.
    pub fn set_field(
        &mut self,
        layer: LayerId,
        path: &Path,
        name: &str,
        value: Value,
    ) -> Result<bool, SpecError> {
        self.edit_layer(layer, |l| l.set_field(path, name, value))
    }

    /// Clears an authored field.
    pub fn clear_field(&mut self, layer: LayerId, path: &Path, name: &str) -> Result<bool, SpecError> {
        self.edit_layer(layer, |l| l.clear_field(path, name))
    }

    /// Sets a spec's type name.
    pub fn set_type_name(
        &mut self,
        layer: LayerId,
        path: &Path,
        type_name: &str,
    ) -> Result<bool, SpecError> {
        self.edit_layer(layer, |l| l.set_type_name(path, type_name))
    }

    /// Sets a prim spec's specifier.
    pub fn set_specifier(
        &mut self,
        layer: LayerId,
        path: &Path,
        specifier: Specifier,
    ) -> Result<bool, SpecError> {
        self.edit_layer(layer, |l| l.set_specifier(path, specifier))
    }

    /// Creates a prim spec (and `over` ancestors).
    pub fn create_prim_spec(
        &mut self,
        layer: LayerId,
        path: &Path,
        specifier: Specifier,
        type_name: &str,
    ) -> Result<bool, SpecError> {
        self.edit_layer(layer, |l| l.create_prim_spec(path, specifier, type_name))
    }

    /// Creates an attribute or relationship spec.
    pub fn create_property_spec(
        &mut self,
        layer: LayerId,
        path: &Path,
        kind: SpecKind,
        type_name: &str,
    ) -> Result<bool, SpecError> {
        self.edit_layer(layer, |l| l.create_property_spec(path, kind, type_name))
    }

    /// Removes a prim spec and its subtree.
    pub fn remove_prim_spec(&mut self, layer: LayerId, path: &Path) -> Result<bool, SpecError> {
        if !path.is_prim_path() {
            return Err(SpecError::InvalidPath(path.clone()));
        }
        self.edit_layer(layer, |l| l.remove_spec(path))
    }

    /// Removes a property spec.
    pub fn remove_property_spec(&mut self, layer: LayerId, path: &Path) -> Result<bool, SpecError> {
        if !path.is_property_path() {
            return Err(SpecError::InvalidPath(path.clone()));
        }
        self.edit_layer(layer, |l| l.remove_spec(path))
    }

    /// Replaces a layer's sublayer list.
    pub fn set_sublayers(&mut self, layer: LayerId, sublayers: Vec<String>) -> Result<bool, SpecError> {
        self.edit_layer(layer, |l| l.set_sublayers(sublayers))
    }

    /// Inserts a sublayer.
    pub fn insert_sublayer(
        &mut self,
        layer: LayerId,
        index: usize,
        identifier: &str,
    ) -> Result<(), SpecError> {
        self.edit_layer(layer, |l| l.insert_sublayer(index, identifier))
    }

    /// Removes a sublayer.
    pub fn remove_sublayer(&mut self, layer: LayerId, index: usize) -> Result<bool, SpecError> {
        self.edit_layer(layer, |l| l.remove_sublayer(index))
    }

    /// Sets a layer's default prim.
    pub fn set_default_prim(&mut self, layer: LayerId, value: &str) -> Result<(), SpecError> {
        self.edit_layer(layer, |l| l.set_default_prim(value))
    }

    /// Clears a layer's default prim.
    pub fn clear_default_prim(&mut self, layer: LayerId) -> Result<(), SpecError> {
        self.edit_layer(layer, Layer::clear_default_prim)
    }

    // -- Stages --

    /// Opens a stage on `root`.
    pub fn open_stage(&mut self, root: LayerId, config: StageConfig) -> StageId {
        self.open_stage_with_key(LayerStackKey::rooted_at(root), config)
    }

    /// Opens a stage on `root` with a stronger session layer.
    pub fn open_stage_with_session(
        &mut self,
        root: LayerId,
        session: LayerId,
        config: StageConfig,
    ) -> StageId {
        self.open_stage_with_key(
            LayerStackKey {
                root,
                session: Some(session),
            },
            config,
        )
    }

    fn open_stage_with_key(&mut self, key: LayerStackKey, config: StageConfig) -> StageId {
        let stage = Stage::open(&self.layers, key, config);
        let idx = if let Some(idx) = self.stage_free.pop() {
            self.stage_generation[idx as usize] += 1;
            self.stages[idx as usize] = Some(stage);
            idx
        } else {
            let idx = u32::try_from(self.stages.len()).unwrap_or(u32::MAX);
            self.stages.push(Some(stage));
            self.stage_generation.push(0);
            idx
        };
        let id = StageId {
            idx,
            generation: self.stage_generation[idx as usize],
        };
        tracing::debug!(?id, "opened stage");
        id
    }

    /// Closes a stage, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn close_stage(&mut self, id: StageId) {
        self.validate_stage(id);
        self.stages[id.idx as usize] = None;
        self.stage_generation[id.idx as usize] += 1;
        self.stage_free.push(id.idx);
    }

    /// Returns whether the given handle refers to an open stage.
    #[must_use]
    pub fn is_open(&self, id: StageId) -> bool {
        (id.idx as usize) < self.stages.len()
            && self.stage_generation[id.idx as usize] == id.generation
            && self.stages[id.idx as usize].is_some()
    }

    /// Borrows a stage.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn stage(&self, id: StageId) -> &Stage {
        self.validate_stage(id);
        match &self.stages[id.idx as usize] {
            Some(stage) => stage,
            None => unreachable!("validated slot is occupied"),
        }
    }

    fn stage_mut(&mut self, id: StageId) -> &mut Stage {
        self.validate_stage(id);
        match &mut self.stages[id.idx as usize] {
            Some(stage) => stage,
            None => unreachable!("validated slot is occupied"),
        }
    }

    /// Handles of all open stages.
    pub fn stage_ids(&self) -> impl Iterator<Item = StageId> + '_ {
        self.stages
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| {
                let idx = u32::try_from(i).unwrap_or(u32::MAX);
                StageId {
                    idx,
                    generation: self.stage_generation[i],
                }
            })
    }

    /// Subscribes a sink to a stage's notices.
    pub fn subscribe(&mut self, stage: StageId, sink: Box<dyn NoticeSink>) {
        self.stage_mut(stage).sinks.push(sink);
    }

    /// Loads the payloads of `path` and its descendants on a stage.
    pub fn load(&mut self, stage: StageId, path: &Path) {
        let mut block = self.change_block();
        let s = block.stage_mut(stage);
        if s.loads.load(path) {
            s.needs_recompose = true;
            s.tracker.mark_resync(path, None);
        }
    }

    /// Unloads the payloads of `path` and its descendants on a stage.
    pub fn unload(&mut self, stage: StageId, path: &Path) {
        let mut block = self.change_block();
        let s = block.stage_mut(stage);
        if s.loads.unload(path) {
            s.needs_recompose = true;
            s.tracker.mark_resync(path, None);
        }
    }

    /// Mutes a layer on one stage.
    pub fn mute_layer(&mut self, stage: StageId, identifier: &str) {
        let mut block = self.change_block();
        let s = block.stage_mut(stage);
        if s.muted.insert(identifier.to_string()) {
            s.needs_recompose = true;
            s.tracker.mark_resync(&Path::absolute_root(), None);
        }
    }

    /// Unmutes a layer on one stage.
    pub fn unmute_layer(&mut self, stage: StageId, identifier: &str) {
        let mut block = self.change_block();
        let s = block.stage_mut(stage);
        if s.muted.remove(identifier) {
            s.needs_recompose = true;
            s.tracker.mark_resync(&Path::absolute_root(), None);
        }
    }

    /// Replaces a stage's asset resolver and reports every object whose
    /// asset-path fields now resolve differently.
    pub fn set_resolver(&mut self, stage: StageId, resolver: Box<dyn AssetResolver>) {
        let mut block = self.change_block();
        let scene = &mut *block;
        let s = match &mut scene.stages[stage.idx as usize] {
            Some(s) if scene.stage_generation[stage.idx as usize] == stage.generation => s,
            _ => panic!("stale StageId: {stage:?}"),
        };
        let before = s.resolve_assets(&scene.layers);
        s.resolver = resolver;
        let after = s.resolve_assets(&scene.layers);
        for ((object, name), resolved) in &after {
            if before.get(&(object.clone(), name.clone())) != Some(resolved) {
                s.tracker.mark_asset(object, name);
            }
        }
    }

    // -- Flushing --

    /// Turns pending layer changes and stage events into notices.
    fn flush_changes(&mut self) {
        let changes = self.layers.drain_changes();
        let changed_layers: BTreeSet<LayerId> = changes.iter().map(|(l, _)| *l).collect();
        for idx in 0..self.stages.len() {
            let generation = self.stage_generation[idx];
            let Some(stage) = self.stages[idx].as_mut() else {
                continue;
            };
            let touched = changed_layers.iter().any(|&l| stage.uses_layer(l));
            if !touched && !stage.needs_recompose && stage.tracker.is_empty() {
                continue;
            }
            if touched || stage.needs_recompose {
                let before = stage.recompose(&self.layers);
                for (layer, change) in &changes {
                    map_change(&mut stage.tracker, &before, *layer, change);
                    map_change(&mut stage.tracker, &stage.composition, *layer, change);
                }
                report_error_changes(&before, &stage.composition);
            }
            let id = StageId {
                idx: u32::try_from(idx).unwrap_or(u32::MAX),
                generation,
            };
            if let Some(notice) = stage.tracker.take_notice(id) {
                tracing::debug!(
                    stage = ?id,
                    resynced = notice.resynced().len(),
                    info = notice.changed_info_only().len(),
                    "objects changed"
                );
                for sink in &mut stage.sinks {
                    sink.on_objects_changed(&notice);
                }
            }
        }
    }

    fn validate_stage(&self, id: StageId) {
        assert!(
            self.is_open(id),
            "stale StageId: {id:?} (current gen: {})",
            self.stage_generation
                .get(id.idx as usize)
                .copied()
                .unwrap_or(u32::MAX)
        );
    }
}

fn report_error_changes(before: &Composition, after: &Composition) {
    for error in after.errors() {
        if !before.errors().contains(error) {
            tracing::warn!(%error, "composition error");
        }
    }
}

/// How a field change on a spec is reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Significance {
    Structural,
    InfoOnly,
}

/// Maps one layer change onto stage paths through `composition`.
fn map_change(
    tracker: &mut ChangeTracker,
    composition: &Composition,
    layer: LayerId,
    change: &LayerChange,
) {
    match change {
        LayerChange::SpecAdded(path) | LayerChange::SpecRemoved(path) => {
            for p in stage_paths(composition, layer, path, Significance::Structural) {
                tracker.mark_resync(&p, None);
            }
        }
        LayerChange::Field { path, name } => {
            let significance = if path.is_prim_path() && field::is_structural_prim_field(name) {
                Significance::Structural
            } else {
                Significance::InfoOnly
            };
            for p in stage_paths(composition, layer, path, significance) {
                match significance {
                    Significance::Structural => tracker.mark_resync(&p, Some(name)),
                    Significance::InfoOnly => tracker.mark_info(&p, name),
                }
            }
        }
        LayerChange::Sublayers | LayerChange::Relocates => {
            if composition
                .root_stack()
                .is_some_and(|s| s.contains(layer))
            {
                tracker.mark_resync(&Path::absolute_root(), None);
                return;
            }
            for index in composition.prims() {
                let uses = index.nodes().iter().any(|n| {
                    composition
                        .stack(n.stack)
                        .is_some_and(|s| s.contains(layer))
                });
                if uses {
                    tracker.mark_resync(index.path(), None);
                }
            }
        }
        LayerChange::DefaultPrim => {
            for index in composition.prims() {
                let uses = index.nodes().iter().any(|n| {
                    n.origin
                        .as_ref()
                        .is_some_and(|o| o.via_default_prim && o.target_stack.root == layer)
                });
                if uses {
                    tracker.mark_resync(index.path(), None);
                }
            }
        }
    }
}

/// Stage paths whose composed opinions come from `path` in `layer`.
fn stage_paths(
    composition: &Composition,
    layer: LayerId,
    path: &Path,
    significance: Significance,
) -> BTreeSet<Path> {
    let mut out = BTreeSet::new();
    for index in composition.prims() {
        for node in index.nodes() {
            if !composition
                .stack(node.stack)
                .is_some_and(|s| s.contains(layer))
            {
                continue;
            }
            if let Some(mapped) = path.replace_prefix(&node.path, index.path()) {
                out.insert(mapped);
            } else if significance == Significance::Structural && path.is_ancestor_of(&node.path) {
                out.insert(index.path().clone());
            }
        }
    }
    out
}
