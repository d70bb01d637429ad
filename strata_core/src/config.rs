// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stage and editor configuration.

/// What happens to arcs whose target prim is deleted.
///
/// Passed to the [`NamespaceEditor`](crate::edit::NamespaceEditor) via
/// [`EditorConfig::delete_policy`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DeletePolicy {
    /// Remove the arc's list-op entry but keep the field and the referencing
    /// prim. The field stays authored with an empty list.
    #[default]
    ClearArcs,
    /// Delete the referencing prim's specs along with the target.
    DeleteReferencingPrims,
}

/// Configuration for a [`NamespaceEditor`](crate::edit::NamespaceEditor).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditorConfig {
    /// Policy for arcs that target a deleted prim.
    pub delete_policy: DeletePolicy,
    /// Delete child overs at a referencing site that would be orphaned when
    /// the arc target (or the part of it they override) goes away.
    pub prune_orphaned_overs: bool,
    /// Rewrite relationship targets and attribute connections that point at
    /// moved or deleted objects.
    pub retarget_relationships: bool,
}

impl EditorConfig {
    /// Clears dependent arcs, prunes orphaned overs, retargets relationships.
    pub const DEFAULT: Self = Self {
        delete_policy: DeletePolicy::ClearArcs,
        prune_orphaned_overs: true,
        retarget_relationships: true,
    };

    /// Like [`DEFAULT`](Self::DEFAULT) but deletes referencing prims along
    /// with a deleted target.
    #[must_use]
    pub const fn cascading() -> Self {
        Self {
            delete_policy: DeletePolicy::DeleteReferencingPrims,
            ..Self::DEFAULT
        }
    }

    /// Only rewrites arcs; leaves overs and relationship targets alone.
    #[must_use]
    pub const fn arcs_only() -> Self {
        Self {
            delete_policy: DeletePolicy::ClearArcs,
            prune_orphaned_overs: false,
            retarget_relationships: false,
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Which payloads are loaded when a stage is opened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InitialLoadSet {
    /// Every payload is loaded.
    #[default]
    LoadAll,
    /// No payload is loaded until explicitly requested.
    LoadNone,
}

/// Configuration for a [`Stage`](crate::stage::Stage).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageConfig {
    /// Initial payload load state.
    pub initial_load: InitialLoadSet,
}

impl StageConfig {
    /// Opens with every payload loaded.
    #[must_use]
    pub const fn load_all() -> Self {
        Self {
            initial_load: InitialLoadSet::LoadAll,
        }
    }

    /// Opens with every payload unloaded.
    #[must_use]
    pub const fn load_none() -> Self {
        Self {
            initial_load: InitialLoadSet::LoadNone,
        }
    }
}
