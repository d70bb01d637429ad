// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arena storage for layers with generational handles.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use super::change::LayerChange;
use super::contents::Layer;
use super::id::LayerId;

/// Error returned when registering a layer.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayerStoreError {
    /// Another live layer already uses the identifier.
    #[error("a layer with identifier `{0}` already exists")]
    DuplicateIdentifier(String),
}

/// Storage for all layers of a scene.
///
/// Layers are addressed by [`LayerId`] handles. Released slots are recycled
/// via a free list, and generation counters catch stale handles. Layers are
/// also indexed by identifier, which is how arcs and sublayer lists name
/// them.
#[derive(Clone, Debug, Default)]
pub struct LayerStore {
    slots: Vec<Option<Layer>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
    by_identifier: BTreeMap<String, LayerId>,
    anonymous_counter: u32,
}

impl LayerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Allocation API --

    /// Creates an empty layer with the given identifier.
    pub fn create_layer(&mut self, identifier: &str) -> Result<LayerId, LayerStoreError> {
        if self.by_identifier.contains_key(identifier) {
            return Err(LayerStoreError::DuplicateIdentifier(identifier.to_string()));
        }
        let layer = Layer::new(identifier);
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a released slot.
            self.generation[idx as usize] += 1;
            self.slots[idx as usize] = Some(layer);
            idx
        } else {
            let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Some(layer));
            self.generation.push(0);
            idx
        };
        let id = LayerId {
            idx,
            generation: self.generation[idx as usize],
        };
        self.by_identifier.insert(identifier.to_string(), id);
        Ok(id)
    }

    /// Creates a layer with a fresh unique identifier derived from `tag`.
    pub fn create_anonymous_layer(&mut self, tag: &str) -> LayerId {
        loop {
            self.anonymous_counter += 1;
            let identifier = format!("anon:{:04}:{tag}", self.anonymous_counter);
            if let Ok(id) = self.create_layer(&identifier) {
                return id;
            }
        }
    }

    /// Releases a layer, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn release_layer(&mut self, id: LayerId) {
        self.validate(id);
        if let Some(layer) = self.slots[id.idx as usize].take() {
            self.by_identifier.remove(layer.identifier());
        }
        // Bump generation so old handles immediately fail validation.
        self.generation[id.idx as usize] += 1;
        self.free_list.push(id.idx);
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerId) -> bool {
        (id.idx as usize) < self.slots.len()
            && self.generation[id.idx as usize] == id.generation
            && self.slots[id.idx as usize].is_some()
    }

    /// Looks up a live layer by identifier.
    #[must_use]
    pub fn find(&self, identifier: &str) -> Option<LayerId> {
        self.by_identifier.get(identifier).copied()
    }

    /// Iterates the handles of all live layers.
    pub fn ids(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.by_identifier.values().copied()
    }

    // -- Access --

    /// Borrows a layer.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn layer(&self, id: LayerId) -> &Layer {
        self.validate(id);
        match &self.slots[id.idx as usize] {
            Some(layer) => layer,
            None => unreachable!("validated slot is occupied"),
        }
    }

    /// Mutably borrows a layer; reachable through change blocks only.
    pub(crate) fn layer_mut(&mut self, id: LayerId) -> &mut Layer {
        self.validate(id);
        match &mut self.slots[id.idx as usize] {
            Some(layer) => layer,
            None => unreachable!("validated slot is occupied"),
        }
    }

    /// The identifier of a layer.
    #[must_use]
    pub fn identifier(&self, id: LayerId) -> &str {
        self.layer(id).identifier()
    }

    /// Marks a layer read-only (or writable again).
    pub fn set_read_only(&mut self, id: LayerId, read_only: bool) {
        self.layer_mut(id).set_read_only(read_only);
    }

    /// Replaces a layer's contents with a snapshot taken earlier.
    pub(crate) fn restore(&mut self, id: LayerId, snapshot: Layer) {
        *self.layer_mut(id) = snapshot;
    }

    /// Drains the pending change records of every layer.
    pub(crate) fn drain_changes(&mut self) -> Vec<(LayerId, LayerChange)> {
        let ids: Vec<LayerId> = self.ids().collect();
        let mut out = Vec::new();
        for id in ids {
            for change in self.layer_mut(id).drain_changes() {
                out.push((id, change));
            }
        }
        out
    }

    // -- Internals --

    fn validate(&self, id: LayerId) {
        assert!(
            (id.idx as usize) < self.slots.len()
                && self.generation[id.idx as usize] == id.generation
                && self.slots[id.idx as usize].is_some(),
            "stale LayerId: {id:?} (current gen: {})",
            if (id.idx as usize) < self.slots.len() {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }
}
