// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stages: a composed view over a root layer stack.
//!
//! A [`Stage`] owns its load rules, muted layer set, asset resolver and the
//! cached [`Composition`] of its namespace. Stages live in a
//! [`Scene`](crate::scene::Scene) and are addressed by [`StageId`]; every
//! mutation goes through the scene so that changes are batched and noticed.

use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::compose::{
    Composition, CompositionError, LayerStack, LayerStackKey, LoadRules, PrimIndex, compose_stage,
};
use crate::config::StageConfig;
use crate::layer::{LayerId, LayerStore, Specifier};
use crate::notice::{ChangeTracker, NoticeSink};
use crate::path::Path;

/// A handle to a stage in a [`Scene`](crate::scene::Scene).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl StageId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }
}

impl fmt::Debug for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StageId({}@gen{})", self.idx, self.generation)
    }
}

/// Resolves asset paths authored in asset-valued fields.
///
/// Layer identifiers used by arcs and sublayers are matched exactly and never
/// pass through the resolver.
pub trait AssetResolver {
    /// Resolves `asset_path`, or returns `None` if it cannot be found.
    fn resolve(&self, asset_path: &str) -> Option<String>;
}

/// A resolver that returns every asset path unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityResolver;

impl AssetResolver for IdentityResolver {
    fn resolve(&self, asset_path: &str) -> Option<String> {
        Some(asset_path.to_string())
    }
}

/// Resolved value of one asset-path field, keyed by (object, field).
pub(crate) type ResolvedAssets = BTreeMap<(Path, String), Option<String>>;

/// A composed view of a root layer stack.
pub struct Stage {
    pub(crate) key: LayerStackKey,
    pub(crate) config: StageConfig,
    pub(crate) loads: LoadRules,
    pub(crate) muted: BTreeSet<String>,
    pub(crate) resolver: Box<dyn AssetResolver>,
    pub(crate) composition: Composition,
    pub(crate) tracker: ChangeTracker,
    pub(crate) sinks: Vec<Box<dyn NoticeSink>>,
    pub(crate) needs_recompose: bool,
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("key", &self.key)
            .field("config", &self.config)
            .field("muted", &self.muted)
            .field("prims", &self.composition.prims().count())
            .field("sinks", &self.sinks.len())
            .finish_non_exhaustive()
    }
}

impl Stage {
    pub(crate) fn open(store: &LayerStore, key: LayerStackKey, config: StageConfig) -> Self {
        let loads = LoadRules::new(config.initial_load);
        let muted = BTreeSet::new();
        let composition = compose_stage(store, key, &muted, &loads);
        for error in composition.errors() {
            tracing::warn!(%error, "composition error");
        }
        Self {
            key,
            config,
            loads,
            muted,
            resolver: Box::new(IdentityResolver),
            composition,
            tracker: ChangeTracker::default(),
            sinks: Vec::new(),
            needs_recompose: false,
        }
    }

    /// Recomposes against the current layers and returns the previous
    /// composition.
    pub(crate) fn recompose(&mut self, store: &LayerStore) -> Composition {
        let next = compose_stage(store, self.key, &self.muted, &self.loads);
        self.needs_recompose = false;
        core::mem::replace(&mut self.composition, next)
    }

    /// Composes against `store` without touching the cached composition.
    pub(crate) fn compose_against(&self, store: &LayerStore) -> Composition {
        compose_stage(store, self.key, &self.muted, &self.loads)
    }

    /// Every asset-path field on every composed object, resolved with the
    /// stage's current resolver.
    pub(crate) fn resolve_assets(&self, store: &LayerStore) -> ResolvedAssets {
        let mut out = ResolvedAssets::new();
        for index in self.composition.prims() {
            for node in index.nodes() {
                let Some(stack) = self.composition.stack(node.stack) else {
                    continue;
                };
                for &layer in stack.layers() {
                    let layer = store.layer(layer);
                    for spec_path in layer.subtree_paths(&node.path) {
                        let object = if spec_path == node.path {
                            index.path().clone()
                        } else if spec_path.is_property_path()
                            && spec_path.prim_path() == node.path
                            && index.path().is_prim_path()
                        {
                            index.path().append_property(spec_path.name())
                        } else {
                            continue;
                        };
                        let Some(spec) = layer.spec(&spec_path) else {
                            continue;
                        };
                        for (name, value) in spec.fields() {
                            if let Some(asset) = value.as_asset_path() {
                                out.entry((object.clone(), name.to_string()))
                                    .or_insert_with(|| self.resolver.resolve(asset));
                            }
                        }
                    }
                }
            }
        }
        out
    }

    // -- Queries --

    /// The stage's root layer.
    #[must_use]
    pub fn root_layer(&self) -> LayerId {
        self.key.root
    }

    /// The stage's session layer, if any.
    #[must_use]
    pub fn session_layer(&self) -> Option<LayerId> {
        self.key.session
    }

    /// The stage's own layer stack key.
    #[must_use]
    pub fn layer_stack_key(&self) -> LayerStackKey {
        self.key
    }

    /// The stage's own layer stack.
    #[must_use]
    pub fn layer_stack(&self) -> Option<&LayerStack> {
        self.composition.root_stack()
    }

    /// The configuration the stage was opened with.
    #[must_use]
    pub fn config(&self) -> StageConfig {
        self.config
    }

    /// The cached composition.
    #[must_use]
    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// The prim index at `path`, if the prim is composed.
    #[must_use]
    pub fn prim(&self, path: &Path) -> Option<&PrimIndex> {
        self.composition.prim(path)
    }

    /// Whether a prim is composed at `path`.
    #[must_use]
    pub fn has_prim(&self, path: &Path) -> bool {
        path.is_prim_path() && self.composition.prim(path).is_some()
    }

    /// Whether a property is composed at `path`.
    #[must_use]
    pub fn has_property(&self, path: &Path) -> bool {
        path.is_property_path()
            && self
                .composition
                .prim(&path.prim_path())
                .is_some_and(|i| i.properties().iter().any(|n| n == path.name()))
    }

    /// Composed child prim names of `path`; empty if the prim is not composed.
    #[must_use]
    pub fn children_names(&self, path: &Path) -> &[String] {
        self.composition
            .prim(path)
            .map(PrimIndex::children)
            .unwrap_or_default()
    }

    /// Composed property names of `path`; empty if the prim is not composed.
    #[must_use]
    pub fn property_names(&self, path: &Path) -> &[String] {
        self.composition
            .prim(path)
            .map(PrimIndex::properties)
            .unwrap_or_default()
    }

    /// Composed type name of the prim at `path`.
    #[must_use]
    pub fn type_name(&self, path: &Path) -> Option<&str> {
        self.composition.prim(path).map(PrimIndex::type_name)
    }

    /// Composed specifier of the prim at `path`.
    #[must_use]
    pub fn specifier(&self, path: &Path) -> Option<Specifier> {
        self.composition.prim(path).map(PrimIndex::specifier)
    }

    /// Whether payloads on the prim at `path` are loaded.
    #[must_use]
    pub fn is_loaded(&self, path: &Path) -> bool {
        self.loads.is_loaded(path)
    }

    /// Identifiers of layers muted on this stage.
    pub fn muted_layers(&self) -> impl Iterator<Item = &str> + '_ {
        self.muted.iter().map(String::as_str)
    }

    /// Deduplicated composition errors.
    #[must_use]
    pub fn composition_errors(&self) -> &[CompositionError] {
        self.composition.errors()
    }

    /// Whether any layer stack of the stage includes `layer`.
    #[must_use]
    pub fn uses_layer(&self, layer: LayerId) -> bool {
        self.composition.uses_layer(layer)
    }

    /// The prim indices whose unloaded payloads were skipped.
    pub fn prims_with_unloaded_payloads(&self) -> impl Iterator<Item = &PrimIndex> + '_ {
        self.composition
            .prims()
            .filter(|i| !i.unloaded_payloads().is_empty())
    }
}
