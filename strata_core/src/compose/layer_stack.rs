// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer stacks: a root layer flattened with its sublayers.

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

use super::error::CompositionError;
use crate::layer::{LayerId, LayerStore};
use crate::path::Path;

/// Identity of a layer stack: its root layer plus an optional session layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerStackKey {
    /// Root layer.
    pub root: LayerId,
    /// Session layer, stronger than the root.
    pub session: Option<LayerId>,
}

impl LayerStackKey {
    /// A stack rooted at `root` with no session layer.
    #[must_use]
    pub const fn rooted_at(root: LayerId) -> Self {
        Self {
            root,
            session: None,
        }
    }
}

/// An ordered list of layers, strongest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerStack {
    key: LayerStackKey,
    layers: Vec<LayerId>,
    errors: Vec<CompositionError>,
}

impl LayerStack {
    /// Flattens `key`'s session and root layers with their sublayers.
    ///
    /// Sublayers are visited depth-first in authored order. Identifiers in
    /// `muted` are skipped along with everything beneath them. A sublayer
    /// already on the current ancestry is reported as a cycle and skipped.
    #[must_use]
    pub fn build(store: &LayerStore, key: LayerStackKey, muted: &BTreeSet<String>) -> Self {
        let mut stack = Self {
            key,
            layers: Vec::new(),
            errors: Vec::new(),
        };
        let mut ancestry = Vec::new();
        if let Some(session) = key.session {
            stack.add(store, session, muted, &mut ancestry);
        }
        stack.add(store, key.root, muted, &mut ancestry);
        stack
    }

    fn add(
        &mut self,
        store: &LayerStore,
        id: LayerId,
        muted: &BTreeSet<String>,
        ancestry: &mut Vec<LayerId>,
    ) {
        if !self.layers.contains(&id) {
            self.layers.push(id);
        }
        ancestry.push(id);
        let layer = store.layer(id);
        for sublayer in layer.sublayers() {
            if muted.contains(sublayer) {
                continue;
            }
            let Some(sub_id) = store.find(sublayer) else {
                self.errors.push(CompositionError::UnresolvedSublayer {
                    layer: layer.identifier().into(),
                    sublayer: sublayer.clone(),
                });
                continue;
            };
            if ancestry.contains(&sub_id) {
                tracing::warn!(layer = layer.identifier(), %sublayer, "sublayer cycle");
                self.errors.push(CompositionError::SublayerCycle {
                    layer: layer.identifier().into(),
                    sublayer: sublayer.clone(),
                });
                continue;
            }
            self.add(store, sub_id, muted, ancestry);
        }
        ancestry.pop();
    }

    /// The stack's identity.
    #[must_use]
    pub fn key(&self) -> LayerStackKey {
        self.key
    }

    /// Layers, strongest first.
    #[must_use]
    pub fn layers(&self) -> &[LayerId] {
        &self.layers
    }

    /// Errors found while flattening sublayers.
    #[must_use]
    pub fn errors(&self) -> &[CompositionError] {
        &self.errors
    }

    /// Whether `layer` contributes to this stack.
    #[must_use]
    pub fn contains(&self, layer: LayerId) -> bool {
        self.layers.contains(&layer)
    }

    /// Whether any layer in the stack has a spec at `path`.
    #[must_use]
    pub fn has_spec(&self, store: &LayerStore, path: &Path) -> bool {
        self.layers.iter().any(|&l| store.layer(l).has_spec(path))
    }

    /// Whether any layer in the stack has a prim spec at `path`.
    #[must_use]
    pub fn has_prim_spec(&self, store: &LayerStore, path: &Path) -> bool {
        self.layers
            .iter()
            .any(|&l| store.layer(l).has_prim_spec(path))
    }
}
