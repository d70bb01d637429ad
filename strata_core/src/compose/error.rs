// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition errors.

use alloc::string::String;

use crate::layer::ArcKind;
use crate::path::Path;

/// A non-fatal problem found while composing a stage.
///
/// The offending arc or sublayer contributes nothing; composition carries on.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, thiserror::Error)]
pub enum CompositionError {
    /// A layer appears in its own sublayer ancestry.
    #[error("sublayer cycle: `{sublayer}` is already an ancestor of `{layer}`")]
    SublayerCycle {
        /// Layer whose sublayer list closes the cycle.
        layer: String,
        /// The repeated sublayer.
        sublayer: String,
    },
    /// A sublayer identifier names no known layer.
    #[error("`{layer}` names unknown sublayer `{sublayer}`")]
    UnresolvedSublayer {
        /// Layer holding the sublayer list.
        layer: String,
        /// The unresolved identifier.
        sublayer: String,
    },
    /// Following an arc revisits a site already being composed.
    #[error("{kind} cycle at {site}: {target} is already being composed")]
    ArcCycle {
        /// Arc kind.
        kind: ArcKind,
        /// Prim the arc is authored on.
        site: Path,
        /// Target that closes the cycle.
        target: Path,
    },
    /// An arc names an unknown layer.
    #[error("{kind} at {site} names unknown layer `{asset_path}`")]
    UnresolvedLayer {
        /// Arc kind.
        kind: ArcKind,
        /// Prim the arc is authored on.
        site: Path,
        /// The unresolved identifier.
        asset_path: String,
    },
    /// An arc without a target path points at a layer with no default prim.
    #[error("{kind} at {site} needs a default prim in `{layer}`")]
    UnresolvedDefaultPrim {
        /// Arc kind.
        kind: ArcKind,
        /// Prim the arc is authored on.
        site: Path,
        /// Root layer of the target layer stack.
        layer: String,
    },
    /// An arc's target prim has no spec in the target layer stack.
    #[error("{kind} at {site} targets {target}, which does not exist")]
    UnresolvedArcTarget {
        /// Arc kind.
        kind: ArcKind,
        /// Prim the arc is authored on.
        site: Path,
        /// The missing target.
        target: Path,
    },
}

impl CompositionError {
    /// Whether this error describes a cycle of either kind.
    #[must_use]
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::SublayerCycle { .. } | Self::ArcCycle { .. })
    }
}
