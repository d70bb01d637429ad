// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Prim indices: the strength-ordered sources of opinions for one prim.
//!
//! Composition starts at the stage's own layer stack and follows every arc
//! declared at the prim and at its ancestors, recursively. Each visited
//! `(layer stack, path)` site becomes a [`Node`] that records the arc that
//! introduced it. Those records are what dependent-edit discovery walks.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;

use super::error::CompositionError;
use super::layer_stack::{LayerStack, LayerStackKey};
use super::load::LoadRules;
use crate::layer::{ArcKind, ArcTarget, LayerId, LayerStore, ListOp, SpecKind, Specifier, Value, field};
use crate::path::Path;

/// Upper bound on nested arcs followed for a single prim.
const MAX_ARC_DEPTH: usize = 64;

/// The list-op item an arc was authored with.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArcEntry {
    /// A reference or payload item.
    Target(ArcTarget),
    /// An inherit or specialize path.
    Path(Path),
}

impl ArcEntry {
    /// The authored target prim path, if one was written.
    #[must_use]
    pub fn authored_path(&self) -> Option<&Path> {
        match self {
            Self::Target(t) => t.prim_path.as_ref(),
            Self::Path(p) => Some(p),
        }
    }
}

/// Where an arc was authored and where it resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArcOrigin {
    /// Arc kind.
    pub kind: ArcKind,
    /// Layer stack holding the authoring spec.
    pub site_stack: LayerStackKey,
    /// Prim the arc is authored on. For ancestral arcs this is an ancestor
    /// of the node's own site.
    pub site_path: Path,
    /// The authored list-op item.
    pub entry: ArcEntry,
    /// Layer stack the arc targets.
    pub target_stack: LayerStackKey,
    /// Resolved target prim of the arc at `site_path`.
    pub target_path: Path,
    /// Whether `target_path` came from the target layer's default prim.
    pub via_default_prim: bool,
}

impl ArcOrigin {
    /// The composition field the entry lives in.
    #[must_use]
    pub fn field_name(&self) -> &'static str {
        field_for(self.kind)
    }
}

/// One source of opinions in a [`PrimIndex`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    /// Layer stack contributing opinions.
    pub stack: LayerStackKey,
    /// Path within that layer stack.
    pub path: Path,
    /// Kind of the arc that introduced this node.
    pub arc: ArcKind,
    /// The introducing arc; `None` for the root node.
    pub origin: Option<ArcOrigin>,
    /// Whether any layer of the stack has a prim spec at `path`.
    pub has_specs: bool,
}

/// A payload that did not contribute because its prim is unloaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnloadedPayload {
    /// Layer stack holding the payload field.
    pub site_stack: LayerStackKey,
    /// Prim the payload is authored on.
    pub site_path: Path,
    /// The authored payload item.
    pub entry: ArcTarget,
    /// Stage prim whose load state gates the payload.
    pub stage_path: Path,
}

/// The composed sources of one stage prim, strongest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrimIndex {
    path: Path,
    nodes: Vec<Node>,
    errors: Vec<CompositionError>,
    unloaded_payloads: Vec<UnloadedPayload>,
    children: Vec<String>,
    properties: Vec<String>,
    specifier: Specifier,
    type_name: String,
}

impl PrimIndex {
    fn empty(path: &Path) -> Self {
        Self {
            path: path.clone(),
            nodes: Vec::new(),
            errors: Vec::new(),
            unloaded_payloads: Vec::new(),
            children: Vec::new(),
            properties: Vec::new(),
            specifier: Specifier::Over,
            type_name: String::new(),
        }
    }

    /// Stage path of the prim.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Nodes, strongest first. The first node is always the root node.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Composition errors found while building this index.
    #[must_use]
    pub fn errors(&self) -> &[CompositionError] {
        &self.errors
    }

    /// Payloads skipped because their prim is unloaded.
    #[must_use]
    pub fn unloaded_payloads(&self) -> &[UnloadedPayload] {
        &self.unloaded_payloads
    }

    /// Composed child prim names in strength order.
    #[must_use]
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// Composed property names in strength order.
    #[must_use]
    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    /// The strongest defining specifier, or `Over` if every opinion is an over.
    #[must_use]
    pub fn specifier(&self) -> Specifier {
        self.specifier
    }

    /// The strongest authored type name; empty when untyped.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Whether any node contributes a spec.
    #[must_use]
    pub fn has_specs(&self) -> bool {
        self.nodes.iter().any(|n| n.has_specs)
    }
}

/// Composition field name for an arc kind.
pub(crate) fn field_for(kind: ArcKind) -> &'static str {
    match kind {
        ArcKind::Inherit => field::INHERIT_PATHS,
        ArcKind::Reference | ArcKind::InternalReference => field::REFERENCES,
        ArcKind::Payload => field::PAYLOAD,
        ArcKind::Specialize => field::SPECIALIZES,
        ArcKind::Root => "",
    }
}

/// Builds prim indices for one stage, caching the layer stacks it meets.
#[derive(Debug)]
pub(crate) struct Composer<'a> {
    store: &'a LayerStore,
    muted: &'a BTreeSet<String>,
    loads: &'a LoadRules,
    stacks: BTreeMap<LayerStackKey, LayerStack>,
}

type Site = (LayerStackKey, Path);

impl<'a> Composer<'a> {
    pub(crate) fn new(
        store: &'a LayerStore,
        muted: &'a BTreeSet<String>,
        loads: &'a LoadRules,
    ) -> Self {
        Self {
            store,
            muted,
            loads,
            stacks: BTreeMap::new(),
        }
    }

    pub(crate) fn stack(&mut self, key: LayerStackKey) -> &LayerStack {
        let (store, muted) = (self.store, self.muted);
        self.stacks
            .entry(key)
            .or_insert_with(|| LayerStack::build(store, key, muted))
    }

    pub(crate) fn into_stacks(self) -> BTreeMap<LayerStackKey, LayerStack> {
        self.stacks
    }

    fn layers_of(&mut self, key: LayerStackKey) -> Vec<LayerId> {
        self.stack(key).layers().to_vec()
    }

    /// Composes the prim at `path` in the stage rooted at `root`.
    pub(crate) fn compose(&mut self, root: LayerStackKey, path: &Path) -> PrimIndex {
        let mut index = PrimIndex::empty(path);
        let mut visiting = BTreeSet::new();
        if path.is_absolute_root() {
            let layers = self.layers_of(root);
            index.nodes.push(Node {
                stack: root,
                path: path.clone(),
                arc: ArcKind::Root,
                origin: None,
                has_specs: true,
            });
            self.collect_names(&mut index, &[(root, layers)]);
        } else {
            self.add_node(&mut index, &mut visiting, root, path.clone(), ArcKind::Root, None);
            let stacks: Vec<(LayerStackKey, Vec<LayerId>)> = index
                .nodes
                .iter()
                .map(|n| n.stack)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(|k| (k, self.layers_of(k)))
                .collect();
            self.collect_names(&mut index, &stacks);
        }
        let stack_errors: Vec<CompositionError> = index
            .nodes
            .iter()
            .map(|n| n.stack)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .flat_map(|k| self.stack(k).errors().to_vec())
            .collect();
        index.errors.extend(stack_errors);
        index.errors.sort();
        index.errors.dedup();
        index
    }

    fn add_node(
        &mut self,
        index: &mut PrimIndex,
        visiting: &mut BTreeSet<Site>,
        stack: LayerStackKey,
        path: Path,
        arc: ArcKind,
        origin: Option<ArcOrigin>,
    ) {
        let site = (stack, path.clone());
        if visiting.contains(&site) || visiting.len() >= MAX_ARC_DEPTH {
            if let Some(o) = &origin {
                index.errors.push(CompositionError::ArcCycle {
                    kind: o.kind,
                    site: o.site_path.clone(),
                    target: o.target_path.clone(),
                });
            }
            return;
        }
        visiting.insert(site.clone());

        let layers = self.layers_of(stack);
        let has_specs = layers
            .iter()
            .any(|&l| self.store.layer(l).has_prim_spec(&path));
        index.nodes.push(Node {
            stack,
            path: path.clone(),
            arc,
            origin,
            has_specs,
        });

        // Arcs at `path` outrank ancestral ones; the nearest ancestor wins
        // among those.
        let sites: Vec<Path> = core::iter::once(path.clone())
            .chain(path.prim_ancestors())
            .collect();
        for arc_site in &sites {
            for kind in [
                ArcKind::Inherit,
                ArcKind::Reference,
                ArcKind::Payload,
                ArcKind::Specialize,
            ] {
                for entry in self.arcs_at(&layers, arc_site, kind) {
                    self.follow_arc(index, visiting, stack, &path, arc_site, kind, entry);
                }
            }
        }

        visiting.remove(&site);
    }

    fn follow_arc(
        &mut self,
        index: &mut PrimIndex,
        visiting: &mut BTreeSet<Site>,
        site_stack: LayerStackKey,
        node_path: &Path,
        site_path: &Path,
        kind: ArcKind,
        entry: ArcEntry,
    ) {
        let store = self.store;
        let (kind, target_stack, authored) = match &entry {
            ArcEntry::Path(p) => (kind, site_stack, Some(p.clone())),
            ArcEntry::Target(t) if t.is_internal() => {
                let kind = if kind == ArcKind::Reference {
                    ArcKind::InternalReference
                } else {
                    kind
                };
                (kind, site_stack, t.prim_path.clone())
            }
            ArcEntry::Target(t) => {
                if self.muted.contains(&t.asset_path) {
                    return;
                }
                let Some(layer) = store.find(&t.asset_path) else {
                    index.errors.push(CompositionError::UnresolvedLayer {
                        kind,
                        site: site_path.clone(),
                        asset_path: t.asset_path.clone(),
                    });
                    return;
                };
                (kind, LayerStackKey::rooted_at(layer), t.prim_path.clone())
            }
        };

        if kind == ArcKind::Payload {
            let below_site = node_path.prim_depth() - site_path.prim_depth();
            let stage_site = index
                .path
                .ancestor_at_depth(index.path.prim_depth().saturating_sub(below_site))
                .unwrap_or_default();
            if !self.loads.is_loaded(&stage_site) {
                if let ArcEntry::Target(t) = entry {
                    index.unloaded_payloads.push(UnloadedPayload {
                        site_stack,
                        site_path: site_path.clone(),
                        entry: t,
                        stage_path: stage_site,
                    });
                }
                return;
            }
        }

        let via_default_prim = authored.is_none();
        let target = match authored {
            Some(p) => p,
            None => {
                let root_layer = store.layer(target_stack.root);
                match root_layer.default_prim_path() {
                    Some(p) => p.clone(),
                    None => {
                        index.errors.push(CompositionError::UnresolvedDefaultPrim {
                            kind,
                            site: site_path.clone(),
                            layer: root_layer.identifier().into(),
                        });
                        return;
                    }
                }
            }
        };

        let ancestral = site_path != node_path;
        let target_exists = self.stack(target_stack).has_prim_spec(store, &target);
        if !target_exists {
            if !ancestral {
                index.errors.push(CompositionError::UnresolvedArcTarget {
                    kind,
                    site: site_path.clone(),
                    target,
                });
            }
            return;
        }
        if target_stack == site_stack && (target.has_prefix(site_path) || site_path.has_prefix(&target))
        {
            if !ancestral {
                index.errors.push(CompositionError::ArcCycle {
                    kind,
                    site: site_path.clone(),
                    target,
                });
            }
            return;
        }
        let Some(mapped) = node_path.replace_prefix(site_path, &target) else {
            return;
        };
        tracing::trace!(%kind, site = %site_path, %target, node = %mapped, "following arc");
        let origin = ArcOrigin {
            kind,
            site_stack,
            site_path: site_path.clone(),
            entry,
            target_stack,
            target_path: target,
            via_default_prim,
        };
        self.add_node(index, visiting, target_stack, mapped, kind, Some(origin));
    }

    /// The composed list of arcs of `kind` authored at `site`, weakest
    /// layer's list op applied first.
    fn arcs_at(&self, layers: &[LayerId], site: &Path, kind: ArcKind) -> Vec<ArcEntry> {
        let name = field_for(kind);
        let values = layers
            .iter()
            .rev()
            .filter_map(|&l| self.store.layer(l).field(site, name));
        match kind {
            ArcKind::Inherit | ArcKind::Specialize => {
                compose_list(values.filter_map(Value::as_path_list))
                    .into_iter()
                    .map(ArcEntry::Path)
                    .collect()
            }
            _ => compose_list(values.filter_map(Value::as_arc_list))
                .into_iter()
                .map(ArcEntry::Target)
                .collect(),
        }
    }

    fn collect_names(&self, index: &mut PrimIndex, stacks: &[(LayerStackKey, Vec<LayerId>)]) {
        let mut specifier = None;
        for node in &index.nodes {
            if !node.has_specs {
                continue;
            }
            let Some((_, layers)) = stacks.iter().find(|(k, _)| *k == node.stack) else {
                continue;
            };
            for &l in layers {
                let Some(spec) = self.store.layer(l).spec(&node.path) else {
                    continue;
                };
                if !matches!(spec.kind(), SpecKind::Prim | SpecKind::PseudoRoot) {
                    continue;
                }
                push_unique(&mut index.children, spec.children());
                push_unique(&mut index.properties, spec.properties());
                if specifier.is_none() && spec.specifier() != Specifier::Over {
                    specifier = Some(spec.specifier());
                }
                if index.type_name.is_empty() && !spec.type_name().is_empty() {
                    index.type_name = spec.type_name().into();
                }
            }
        }
        index.specifier = specifier.unwrap_or(Specifier::Over);
    }
}

fn push_unique(out: &mut Vec<String>, names: &[String]) {
    for name in names {
        if !out.contains(name) {
            out.push(name.clone());
        }
    }
}

/// Folds list ops from weakest to strongest.
fn compose_list<'v, T: Clone + PartialEq + 'v>(ops: impl Iterator<Item = &'v ListOp<T>>) -> Vec<T> {
    let mut items = Vec::new();
    for op in ops {
        op.apply_operations(&mut items);
    }
    items
}
