// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition: layer stacks, prim indices and the per-stage cache.
//!
//! [`compose_stage`] walks a stage's namespace from `/` and builds a
//! [`PrimIndex`] for every composed prim. The result is a [`Composition`]:
//! an immutable snapshot the stage keeps until the next change batch.
//!
//! Arcs are expanded in `inherit, reference, payload, specialize` order,
//! arcs declared directly on a prim before arcs declared on its ancestors.
//! Cycles (sublayer or arc) and unresolvable targets are recorded as
//! [`CompositionError`]s and never abort composition.

mod error;
mod layer_stack;
mod load;
mod prim_index;

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;

pub use error::CompositionError;
pub use layer_stack::{LayerStack, LayerStackKey};
pub use load::LoadRules;
pub use prim_index::{ArcEntry, ArcOrigin, Node, PrimIndex, UnloadedPayload};

pub(crate) use prim_index::field_for;

use crate::layer::{LayerId, LayerStore};
use crate::path::Path;
use prim_index::Composer;

/// Every prim index of a stage plus the layer stacks they use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Composition {
    root: LayerStackKey,
    stacks: BTreeMap<LayerStackKey, LayerStack>,
    prims: BTreeMap<Path, PrimIndex>,
    errors: Vec<CompositionError>,
}

impl Composition {
    /// The stage's own layer stack key.
    #[must_use]
    pub fn root_key(&self) -> LayerStackKey {
        self.root
    }

    /// The stage's own layer stack.
    #[must_use]
    pub fn root_stack(&self) -> Option<&LayerStack> {
        self.stacks.get(&self.root)
    }

    /// A layer stack met during composition.
    #[must_use]
    pub fn stack(&self, key: LayerStackKey) -> Option<&LayerStack> {
        self.stacks.get(&key)
    }

    /// All layer stacks met during composition.
    pub fn stacks(&self) -> impl Iterator<Item = &LayerStack> + '_ {
        self.stacks.values()
    }

    /// The index of the prim at `path`, if it is composed. `/` is always present.
    #[must_use]
    pub fn prim(&self, path: &Path) -> Option<&PrimIndex> {
        self.prims.get(path)
    }

    /// All composed prim indices in path order, starting with `/`.
    pub fn prims(&self) -> impl Iterator<Item = &PrimIndex> + '_ {
        self.prims.values()
    }

    /// Deduplicated composition errors of the whole stage.
    #[must_use]
    pub fn errors(&self) -> &[CompositionError] {
        &self.errors
    }

    /// Whether any layer stack of the stage includes `layer`.
    #[must_use]
    pub fn uses_layer(&self, layer: LayerId) -> bool {
        self.stacks.values().any(|s| s.contains(layer))
    }
}

/// Composes every prim reachable from `/` in the stage rooted at `root`.
#[must_use]
pub fn compose_stage(
    store: &LayerStore,
    root: LayerStackKey,
    muted: &BTreeSet<String>,
    loads: &LoadRules,
) -> Composition {
    let mut composer = Composer::new(store, muted, loads);
    let mut prims = BTreeMap::new();
    let mut queue = alloc::vec![Path::absolute_root()];
    while let Some(path) = queue.pop() {
        let index = composer.compose(root, &path);
        for child in index.children() {
            queue.push(path.append_child(child));
        }
        prims.insert(path, index);
    }
    // Make sure the root stack is present even for an empty stage.
    let _ = composer.stack(root);
    let stacks = composer.into_stacks();

    let mut errors: BTreeSet<CompositionError> = BTreeSet::new();
    if let Some(stack) = stacks.get(&root) {
        errors.extend(stack.errors().iter().cloned());
    }
    for index in prims.values() {
        errors.extend(index.errors().iter().cloned());
    }
    Composition {
        root,
        stacks,
        prims,
        errors: errors.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InitialLoadSet;
    use crate::layer::{ArcKind, ArcTarget, Specifier};
    use alloc::string::ToString;
    use alloc::vec;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    fn compose(store: &LayerStore, root: LayerId) -> Composition {
        compose_stage(
            store,
            LayerStackKey::rooted_at(root),
            &BTreeSet::new(),
            &LoadRules::new(InitialLoadSet::LoadAll),
        )
    }

    /// `layer1` holds `/Ref/Child/GrandChild`; `layer2` references it.
    fn two_layers() -> (LayerStore, LayerId, LayerId) {
        let mut store = LayerStore::new();
        let l1 = store.create_layer("layer1").unwrap();
        let l2 = store.create_layer("layer2").unwrap();
        let layer1 = store.layer_mut(l1);
        layer1
            .create_prim_spec(&p("/Ref/Child/GrandChild"), Specifier::Def, "")
            .unwrap();
        layer1.set_default_prim("Ref").unwrap();
        let layer2 = store.layer_mut(l2);
        layer2.create_prim_spec(&p("/Prim1"), Specifier::Def, "").unwrap();
        layer2
            .set_references(&p("/Prim1"), vec![ArcTarget::external("layer1", p("/Ref"))])
            .unwrap();
        layer2
            .create_prim_spec(&p("/Prim1/LocalChild"), Specifier::Over, "")
            .unwrap();
        layer2.create_prim_spec(&p("/Prim2"), Specifier::Def, "").unwrap();
        layer2
            .set_references(&p("/Prim2"), vec![ArcTarget::default_prim("layer1")])
            .unwrap();
        (store, l1, l2)
    }

    #[test]
    fn references_bring_in_children() {
        let (store, _, l2) = two_layers();
        let comp = compose(&store, l2);
        let prim1 = comp.prim(&p("/Prim1")).unwrap();
        assert_eq!(prim1.children(), &["LocalChild".to_string(), "Child".to_string()]);
        assert!(comp.prim(&p("/Prim1/Child/GrandChild")).is_some());
        assert!(comp.errors().is_empty());
    }

    #[test]
    fn ancestral_nodes_record_the_authoring_site() {
        let (store, _, l2) = two_layers();
        let comp = compose(&store, l2);
        let grand = comp.prim(&p("/Prim1/Child/GrandChild")).unwrap();
        let node = &grand.nodes()[1];
        assert_eq!(node.path, p("/Ref/Child/GrandChild"));
        assert_eq!(node.arc, ArcKind::Reference);
        let origin = node.origin.as_ref().unwrap();
        assert_eq!(origin.site_path, p("/Prim1"));
        assert_eq!(origin.target_path, p("/Ref"));
        assert!(!origin.via_default_prim);
    }

    #[test]
    fn default_prim_arcs_resolve_through_the_target_layer() {
        let (store, _, l2) = two_layers();
        let comp = compose(&store, l2);
        let prim2 = comp.prim(&p("/Prim2")).unwrap();
        let origin = prim2.nodes()[1].origin.as_ref().unwrap();
        assert!(origin.via_default_prim);
        assert_eq!(origin.target_path, p("/Ref"));
        assert!(comp.prim(&p("/Prim2/Child")).is_some());
    }

    #[test]
    fn missing_targets_and_cycles_are_errors() {
        let mut store = LayerStore::new();
        let l = store.create_layer("l").unwrap();
        let layer = store.layer_mut(l);
        layer.create_prim_spec(&p("/A"), Specifier::Def, "").unwrap();
        layer.create_prim_spec(&p("/B"), Specifier::Def, "").unwrap();
        layer.create_prim_spec(&p("/C"), Specifier::Def, "").unwrap();
        layer
            .set_references(&p("/A"), vec![ArcTarget::internal(p("/B"))])
            .unwrap();
        layer
            .set_references(&p("/B"), vec![ArcTarget::internal(p("/A"))])
            .unwrap();
        layer
            .set_references(&p("/C"), vec![ArcTarget::internal(p("/Missing"))])
            .unwrap();
        let comp = compose(&store, l);
        assert!(comp.errors().iter().any(CompositionError::is_cycle));
        assert!(comp.errors().iter().any(|e| matches!(
            e,
            CompositionError::UnresolvedArcTarget { site, .. } if *site == p("/C")
        )));
    }

    #[test]
    fn unloaded_payloads_contribute_nothing() {
        let (mut store, _, l2) = two_layers();
        store
            .layer_mut(l2)
            .set_payloads(&p("/Prim1"), vec![ArcTarget::external("layer1", p("/Ref"))])
            .unwrap();
        store
            .layer_mut(l2)
            .set_field(
                &p("/Prim1"),
                crate::layer::field::REFERENCES,
                crate::layer::Value::References(crate::layer::ListOp::default()),
            )
            .unwrap();
        let mut loads = LoadRules::new(InitialLoadSet::LoadAll);
        loads.unload(&p("/Prim1"));
        let comp = compose_stage(&store, LayerStackKey::rooted_at(l2), &BTreeSet::new(), &loads);
        let prim1 = comp.prim(&p("/Prim1")).unwrap();
        assert_eq!(prim1.children(), &["LocalChild".to_string()]);
        assert_eq!(prim1.unloaded_payloads().len(), 1);
        assert_eq!(prim1.unloaded_payloads()[0].stage_path, p("/Prim1"));
    }
}
