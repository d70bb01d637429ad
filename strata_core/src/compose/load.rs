// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Payload load rules.

use alloc::collections::BTreeMap;

use crate::config::InitialLoadSet;
use crate::path::Path;

/// Per-stage record of which prims have their payloads loaded.
///
/// The most specific rule covering a path wins; with no rule the initial
/// load set decides. Loading or unloading a prim replaces every rule beneath
/// it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRules {
    initial: InitialLoadSet,
    rules: BTreeMap<Path, bool>,
}

impl LoadRules {
    /// Rules with no overrides.
    #[must_use]
    pub fn new(initial: InitialLoadSet) -> Self {
        Self {
            initial,
            rules: BTreeMap::new(),
        }
    }

    /// Whether payloads on the prim at `path` contribute.
    #[must_use]
    pub fn is_loaded(&self, path: &Path) -> bool {
        let own = core::iter::once(path.prim_path());
        for candidate in own.chain(path.prim_ancestors()) {
            if let Some(&loaded) = self.rules.get(&candidate) {
                return loaded;
            }
        }
        matches!(self.initial, InitialLoadSet::LoadAll)
    }

    /// Loads `path` and everything beneath it. Returns `true` if the rules
    /// changed.
    pub fn load(&mut self, path: &Path) -> bool {
        self.set(path, true)
    }

    /// Unloads `path` and everything beneath it. Returns `true` if the rules
    /// changed.
    pub fn unload(&mut self, path: &Path) -> bool {
        self.set(path, false)
    }

    fn set(&mut self, path: &Path, loaded: bool) -> bool {
        let before = self.rules.clone();
        self.rules.retain(|p, _| !p.has_prefix(path));
        let inherited = self.is_loaded(path);
        if inherited != loaded {
            self.rules.insert(path.clone(), loaded);
        }
        self.rules != before
    }
}
