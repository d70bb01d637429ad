// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Edit plans: the layer mutations one namespace edit expands into.
//!
//! Planning is a worklist over `(layer stack, old path, new path)` items.
//! The first item is the requested edit on the base stage's layer stack.
//! Processing an item moves or deletes the specs at the old path in every
//! layer of its stack, then scans the cached prim indices of the watched
//! stages for nodes that reach the edited specs:
//!
//! - another layer stack sharing an edited layer gets the same edit;
//! - an arc whose target is at or under the old path is rewritten (or its
//!   entry removed on delete);
//! - an arc whose target is an ancestor of the old path maps the edit onto
//!   the arc's authoring site, so overs there follow the edit.
//!
//! Nothing is mutated while planning. [`EditPlan::execute`] applies field
//! rewrites first (on pre-edit paths), then namespace operations in order.

use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
use alloc::string::String;
use alloc::vec::Vec;

use super::error::EditWarning;
use crate::compose::{ArcEntry, ArcOrigin, LayerStack, LayerStackKey, UnloadedPayload};
use crate::config::{DeletePolicy, EditorConfig};
use crate::layer::{ArcKind, Layer, LayerId, LayerStore, SpecError, SpecKind, Specifier, Value, field};
use crate::path::Path;
use crate::scene::ChangeBlock;
use crate::stage::{Stage, StageId};

/// Mutable access to layers by handle.
pub(crate) trait LayerAccess {
    fn layer_mut(&mut self, id: LayerId) -> &mut Layer;
}

impl LayerAccess for LayerStore {
    fn layer_mut(&mut self, id: LayerId) -> &mut Layer {
        Self::layer_mut(self, id)
    }
}

impl LayerAccess for ChangeBlock<'_> {
    fn layer_mut(&mut self, id: LayerId) -> &mut Layer {
        ChangeBlock::layer_mut(self, id)
    }
}

/// A rewrite of one field value on one spec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum FieldEdit {
    /// Replace (or remove) one arc list-op item.
    ReplaceArc {
        layer: LayerId,
        spec: Path,
        field: &'static str,
        entry: ArcEntry,
        replacement: Option<ArcEntry>,
    },
    /// Map relationship targets or connections at or under `old`.
    RetargetPaths {
        layer: LayerId,
        spec: Path,
        field: &'static str,
        old: Path,
        new: Option<Path>,
    },
    /// Map relocation pairs at or under `old`.
    Relocates {
        layer: LayerId,
        old: Path,
        new: Option<Path>,
    },
}

impl FieldEdit {
    fn layer(&self) -> LayerId {
        match self {
            Self::ReplaceArc { layer, .. }
            | Self::RetargetPaths { layer, .. }
            | Self::Relocates { layer, .. } => *layer,
        }
    }

    fn apply(&self, layer: &mut Layer) -> Result<bool, SpecError> {
        match self {
            Self::ReplaceArc {
                spec,
                field,
                entry,
                replacement,
                ..
            } => match entry {
                ArcEntry::Target(target) => {
                    let replacement = match replacement {
                        Some(ArcEntry::Target(t)) => Some(t.clone()),
                        _ => None,
                    };
                    tracing::trace!(layer = layer.identifier(), %spec, %target, ?replacement, "rewriting arc");
                    layer.modify_arc_list(spec, field, |item| {
                        if item == target {
                            replacement.clone()
                        } else {
                            Some(item.clone())
                        }
                    })
                }
                ArcEntry::Path(target) => {
                    let replacement = match replacement {
                        Some(ArcEntry::Path(p)) => Some(p.clone()),
                        _ => None,
                    };
                    tracing::trace!(layer = layer.identifier(), %spec, %target, ?replacement, "rewriting arc");
                    layer.modify_path_list(spec, field, |item| {
                        if item == target {
                            replacement.clone()
                        } else {
                            Some(item.clone())
                        }
                    })
                }
            },
            Self::RetargetPaths {
                spec,
                field,
                old,
                new,
                ..
            } => layer.modify_path_list(spec, field, |item| map_path(item, old, new.as_ref())),
            Self::Relocates { old, new, .. } => {
                let relocates = layer
                    .relocates()
                    .iter()
                    .filter_map(|(source, target)| {
                        Some((
                            map_path(source, old, new.as_ref())?,
                            map_path(target, old, new.as_ref())?,
                        ))
                    })
                    .collect();
                layer.set_relocates(relocates)
            }
        }
    }
}

/// Maps `path` through the edit `old -> new`; `None` if the edit removes it.
fn map_path(path: &Path, old: &Path, new: Option<&Path>) -> Option<Path> {
    if path.has_prefix(old) {
        new.and_then(|n| path.replace_prefix(old, n))
    } else {
        Some(path.clone())
    }
}

/// A namespace operation on one layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum NamespaceOp {
    CreateOverChain { layer: LayerId, path: Path },
    Move { layer: LayerId, old: Path, new: Path },
    Delete { layer: LayerId, path: Path },
}

impl NamespaceOp {
    fn layer(&self) -> LayerId {
        match self {
            Self::CreateOverChain { layer, .. }
            | Self::Move { layer, .. }
            | Self::Delete { layer, .. } => *layer,
        }
    }

    /// The spec a move or delete takes away.
    fn source(&self) -> Option<(LayerId, &Path)> {
        match self {
            Self::CreateOverChain { .. } => None,
            Self::Move { layer, old, .. } => Some((*layer, old)),
            Self::Delete { layer, path } => Some((*layer, path)),
        }
    }
}

/// Every mutation a namespace edit needs, plus what planning found.
#[derive(Clone, Debug, Default)]
pub(crate) struct EditPlan {
    pub(crate) fields: Vec<FieldEdit>,
    pub(crate) ops: Vec<NamespaceOp>,
    pub(crate) conflicts: Vec<(LayerId, Path)>,
    pub(crate) warnings: Vec<EditWarning>,
}

impl EditPlan {
    /// Layers the plan mutates.
    pub(crate) fn layers(&self) -> BTreeSet<LayerId> {
        self.fields
            .iter()
            .map(FieldEdit::layer)
            .chain(self.ops.iter().map(NamespaceOp::layer))
            .collect()
    }

    /// Applies the plan. Stops at the first failure and reports the layer.
    pub(crate) fn execute(&self, access: &mut impl LayerAccess) -> Result<(), (LayerId, SpecError)> {
        for edit in &self.fields {
            let id = edit.layer();
            edit.apply(access.layer_mut(id)).map_err(|e| (id, e))?;
        }
        let mut moved: Vec<(LayerId, Path, Path)> = Vec::new();
        let mut removed: Vec<(LayerId, Path)> = Vec::new();
        for op in &self.ops {
            let id = op.layer();
            let layer = access.layer_mut(id);
            match op {
                NamespaceOp::CreateOverChain { path, .. } => {
                    if let Some(path) = remap(id, path, &moved, &removed) {
                        layer.ensure_over_chain(&path).map_err(|e| (id, e))?;
                    }
                }
                NamespaceOp::Move { old, new, .. } => {
                    let (Some(old), Some(new)) = (
                        remap(id, old, &moved, &removed),
                        remap(id, new, &moved, &removed),
                    ) else {
                        continue;
                    };
                    if !layer.has_spec(&old) {
                        continue;
                    }
                    layer.move_spec(&old, &new).map_err(|e| (id, e))?;
                    moved.push((id, old, new));
                }
                NamespaceOp::Delete { path, .. } => {
                    let Some(path) = remap(id, path, &moved, &removed) else {
                        continue;
                    };
                    if layer.remove_spec(&path).map_err(|e| (id, e))? {
                        removed.push((id, path));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Maps a pre-edit path in `layer` through the operations already applied.
fn remap(
    layer: LayerId,
    path: &Path,
    moved: &[(LayerId, Path, Path)],
    removed: &[(LayerId, Path)],
) -> Option<Path> {
    let mut path = path.clone();
    for (l, old, new) in moved {
        if *l == layer {
            if let Some(p) = path.replace_prefix(old, new) {
                path = p;
            }
        }
    }
    if removed.iter().any(|(l, d)| *l == layer && path.has_prefix(d)) {
        return None;
    }
    Some(path)
}

/// One worklist item.
#[derive(Clone, Debug)]
struct StackEdit {
    key: LayerStackKey,
    old: Path,
    new: Option<Path>,
    /// Only delete if every prim spec in the subtree is an `over`.
    only_overs: bool,
}

/// Expands one edit into an [`EditPlan`].
pub(crate) struct Planner<'a> {
    store: &'a LayerStore,
    config: EditorConfig,
    stages: Vec<(StageId, &'a Stage)>,
    muted: &'a BTreeSet<String>,
    stacks: BTreeMap<LayerStackKey, Vec<LayerId>>,
    queue: VecDeque<StackEdit>,
    seen: BTreeSet<(LayerStackKey, Path)>,
    plan: EditPlan,
}

impl<'a> Planner<'a> {
    /// `stages[0]` is the base stage; the rest are registered dependents.
    pub(crate) fn new(
        store: &'a LayerStore,
        config: EditorConfig,
        stages: Vec<(StageId, &'a Stage)>,
        muted: &'a BTreeSet<String>,
    ) -> Self {
        Self {
            store,
            config,
            stages,
            muted,
            stacks: BTreeMap::new(),
            queue: VecDeque::new(),
            seen: BTreeSet::new(),
            plan: EditPlan::default(),
        }
    }

    pub(crate) fn plan(mut self, base: LayerStackKey, old: &Path, new: Option<&Path>) -> EditPlan {
        self.enqueue(StackEdit {
            key: base,
            old: old.clone(),
            new: new.cloned(),
            only_overs: false,
        });
        while let Some(item) = self.queue.pop_front() {
            self.process(&item);
        }
        self.plan
    }

    fn enqueue(&mut self, item: StackEdit) {
        if self.seen.insert((item.key, item.old.clone())) {
            self.queue.push_back(item);
        }
    }

    fn push_op(&mut self, op: NamespaceOp) {
        if self.plan.ops.contains(&op) {
            return;
        }
        if let Some(source) = op.source() {
            if self.plan.ops.iter().any(|o| o.source() == Some(source)) {
                return;
            }
        }
        tracing::trace!(?op, "planned");
        self.plan.ops.push(op);
    }

    fn push_field(&mut self, edit: FieldEdit) {
        if !self.plan.fields.contains(&edit) {
            tracing::trace!(?edit, "planned");
            self.plan.fields.push(edit);
        }
    }

    fn push_warning(&mut self, warning: EditWarning) {
        if !self.plan.warnings.contains(&warning) {
            self.plan.warnings.push(warning);
        }
    }

    fn layers_of(&mut self, key: LayerStackKey) -> Vec<LayerId> {
        if let Some(layers) = self.stacks.get(&key) {
            return layers.clone();
        }
        let cached = self
            .stages
            .iter()
            .find_map(|(_, s)| s.composition().stack(key))
            .map(|s| s.layers().to_vec());
        let layers =
            cached.unwrap_or_else(|| LayerStack::build(self.store, key, self.muted).layers().to_vec());
        self.stacks.insert(key, layers.clone());
        layers
    }

    fn process(&mut self, item: &StackEdit) {
        let layers = self.layers_of(item.key);
        if item.only_overs && !self.only_overs_at(&layers, &item.old) {
            return;
        }
        let store = self.store;

        for &id in &layers {
            let layer = store.layer(id);
            if !layer.has_spec(&item.old) {
                continue;
            }
            match &item.new {
                Some(new) => {
                    if layer.has_spec(new) {
                        self.plan.conflicts.push((id, new.clone()));
                        continue;
                    }
                    let parent = new.parent().unwrap_or_default();
                    if !parent.is_absolute_root() {
                        self.push_op(NamespaceOp::CreateOverChain {
                            layer: id,
                            path: parent,
                        });
                    }
                    self.push_op(NamespaceOp::Move {
                        layer: id,
                        old: item.old.clone(),
                        new: new.clone(),
                    });
                }
                None => self.push_op(NamespaceOp::Delete {
                    layer: id,
                    path: item.old.clone(),
                }),
            }
        }

        if self.config.retarget_relationships {
            self.retarget(&layers, item);
        }

        let edited: BTreeSet<LayerId> = layers.iter().copied().collect();
        let stages = self.stages.clone();
        let old_prim = item.old.prim_path();
        for (stage_id, stage) in stages {
            let composition = stage.composition();
            let shares = |key: LayerStackKey| {
                composition
                    .stack(key)
                    .is_some_and(|s| s.layers().iter().any(|l| edited.contains(l)))
            };
            for index in composition.prims() {
                for payload in index.unloaded_payloads() {
                    self.check_unloaded_payload(stage_id, &edited, &old_prim, payload);
                }
                for node in index.nodes() {
                    if node.stack != item.key && node.path.has_prefix(&old_prim) && shares(node.stack)
                    {
                        self.enqueue(StackEdit {
                            key: node.stack,
                            old: item.old.clone(),
                            new: item.new.clone(),
                            only_overs: item.only_overs,
                        });
                    }
                    if let Some(origin) = &node.origin {
                        if shares(origin.target_stack) {
                            self.dependent_arc(origin, item);
                        }
                    }
                }
            }
        }
    }

    /// Handles one arc whose target layer stack shares an edited layer.
    fn dependent_arc(&mut self, origin: &ArcOrigin, item: &StackEdit) {
        if origin.kind == ArcKind::Root {
            return;
        }
        let target = &origin.target_path;
        if !origin.via_default_prim && target.has_prefix(&item.old) {
            let replacement = item
                .new
                .as_ref()
                .and_then(|n| target.replace_prefix(&item.old, n))
                .map(|p| match &origin.entry {
                    ArcEntry::Target(t) => ArcEntry::Target(t.with_prim_path(p)),
                    ArcEntry::Path(_) => ArcEntry::Path(p),
                });
            let name = origin.field_name();
            let store = self.store;
            for id in self.layers_of(origin.site_stack) {
                let authored = store.layer(id).field(&origin.site_path, name);
                if authored.is_some_and(|v| mentions(v, &origin.entry)) {
                    self.push_field(FieldEdit::ReplaceArc {
                        layer: id,
                        spec: origin.site_path.clone(),
                        field: name,
                        entry: origin.entry.clone(),
                        replacement: replacement.clone(),
                    });
                }
            }
            if item.new.is_some() {
                return;
            }
            match self.config.delete_policy {
                DeletePolicy::DeleteReferencingPrims => self.enqueue(StackEdit {
                    key: origin.site_stack,
                    old: origin.site_path.clone(),
                    new: None,
                    only_overs: false,
                }),
                DeletePolicy::ClearArcs if self.config.prune_orphaned_overs => {
                    for child in self.children_of(origin.target_stack, target) {
                        self.enqueue(StackEdit {
                            key: origin.site_stack,
                            old: origin.site_path.append_child(&child),
                            new: None,
                            only_overs: true,
                        });
                    }
                }
                DeletePolicy::ClearArcs => {}
            }
        } else if item.old.has_prefix(target) && item.old != *target {
            let Some(old) = item.old.replace_prefix(target, &origin.site_path) else {
                return;
            };
            let new = item
                .new
                .as_ref()
                .and_then(|n| n.replace_prefix(target, &origin.site_path));
            if new.is_none() && !self.config.prune_orphaned_overs {
                return;
            }
            let only_overs = new.is_none();
            self.enqueue(StackEdit {
                key: origin.site_stack,
                old,
                new,
                only_overs,
            });
        }
    }

    fn check_unloaded_payload(
        &mut self,
        stage: StageId,
        edited: &BTreeSet<LayerId>,
        old: &Path,
        payload: &UnloadedPayload,
    ) {
        let key = if payload.entry.is_internal() {
            payload.site_stack
        } else {
            match self.store.find(&payload.entry.asset_path) {
                Some(root) => LayerStackKey::rooted_at(root),
                None => return,
            }
        };
        let layers = self.layers_of(key);
        if !layers.iter().any(|l| edited.contains(l)) {
            return;
        }
        let target = payload
            .entry
            .prim_path
            .clone()
            .or_else(|| self.store.layer(key.root).default_prim_path().cloned());
        let Some(target) = target else {
            return;
        };
        if target.has_prefix(old) || old.has_prefix(&target) {
            self.push_warning(EditWarning::UnloadedPayloadNotUpdated {
                stage,
                prim: payload.stage_path.clone(),
                target: payload.entry.clone(),
            });
        }
    }

    fn retarget(&mut self, layers: &[LayerId], item: &StackEdit) {
        let store = self.store;
        for &id in layers {
            let layer = store.layer(id);
            for (spec_path, spec) in layer.traverse(&Path::absolute_root()) {
                if !spec.kind().is_property() {
                    continue;
                }
                for name in [field::TARGET_PATHS, field::CONNECTION_PATHS] {
                    let hit = spec
                        .field(name)
                        .and_then(Value::as_path_list)
                        .is_some_and(|op| op.all_items().any(|p| p.has_prefix(&item.old)));
                    if hit {
                        self.push_field(FieldEdit::RetargetPaths {
                            layer: id,
                            spec: spec_path.clone(),
                            field: name,
                            old: item.old.clone(),
                            new: item.new.clone(),
                        });
                    }
                }
            }
            let relocated = layer
                .relocates()
                .iter()
                .any(|(s, t)| s.has_prefix(&item.old) || t.has_prefix(&item.old));
            if relocated {
                self.push_field(FieldEdit::Relocates {
                    layer: id,
                    old: item.old.clone(),
                    new: item.new.clone(),
                });
            }
        }
    }

    /// Child prim names authored at `path` in the layer stack `key`.
    fn children_of(&mut self, key: LayerStackKey, path: &Path) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for id in self.layers_of(key) {
            let Some(spec) = self.store.layer(id).spec(path) else {
                continue;
            };
            for child in spec.children() {
                if !names.contains(child) {
                    names.push(child.clone());
                }
            }
        }
        names
    }

    /// Whether every prim spec at or under `path` is an `over`.
    fn only_overs_at(&self, layers: &[LayerId], path: &Path) -> bool {
        layers.iter().all(|&id| {
            self.store
                .layer(id)
                .traverse(path)
                .all(|(_, spec)| spec.kind() != SpecKind::Prim || spec.specifier() == Specifier::Over)
        })
    }
}

fn mentions(value: &Value, entry: &ArcEntry) -> bool {
    match entry {
        ArcEntry::Target(t) => value.as_arc_list().is_some_and(|op| op.mentions(t)),
        ArcEntry::Path(p) => value.as_path_list().is_some_and(|op| op.mentions(p)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::ListOp;
    use alloc::vec;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[test]
    fn execute_remaps_later_ops_through_earlier_moves() {
        let mut store = LayerStore::new();
        let l = store.create_layer("l").unwrap();
        store
            .layer_mut(l)
            .create_prim_spec(&p("/A/B/C"), Specifier::Over, "")
            .unwrap();
        let plan = EditPlan {
            ops: vec![
                NamespaceOp::Move {
                    layer: l,
                    old: p("/A"),
                    new: p("/X"),
                },
                NamespaceOp::Delete {
                    layer: l,
                    path: p("/A/B/C"),
                },
            ],
            ..EditPlan::default()
        };
        plan.execute(&mut store).unwrap();
        let layer = store.layer(l);
        assert!(layer.has_spec(&p("/X/B")));
        assert!(!layer.has_spec(&p("/X/B/C")));
        assert!(!layer.has_spec(&p("/A")));
    }

    #[test]
    fn retargeting_maps_and_drops_paths() {
        let mut layer = Layer::new("l");
        layer
            .create_property_spec(&p("/P.rel"), SpecKind::Relationship, "")
            .unwrap();
        layer
            .set_field(
                &p("/P.rel"),
                field::TARGET_PATHS,
                Value::PathList(ListOp::explicit(vec![p("/A/B"), p("/A.x"), p("/C")])),
            )
            .unwrap();
        let moved = FieldEdit::RetargetPaths {
            layer: LayerId { idx: 0, generation: 0 },
            spec: p("/P.rel"),
            field: field::TARGET_PATHS,
            old: p("/A"),
            new: Some(p("/Z")),
        };
        assert!(moved.apply(&mut layer).unwrap());
        let targets = layer.field(&p("/P.rel"), field::TARGET_PATHS).unwrap();
        assert_eq!(
            targets.as_path_list().unwrap().explicit_items(),
            &[p("/Z/B"), p("/Z.x"), p("/C")]
        );

        let deleted = FieldEdit::RetargetPaths {
            layer: LayerId { idx: 0, generation: 0 },
            spec: p("/P.rel"),
            field: field::TARGET_PATHS,
            old: p("/Z"),
            new: None,
        };
        assert!(deleted.apply(&mut layer).unwrap());
        let targets = layer.field(&p("/P.rel"), field::TARGET_PATHS).unwrap();
        assert_eq!(targets.as_path_list().unwrap().explicit_items(), &[p("/C")]);
    }
}
