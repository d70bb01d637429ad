// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change records accumulated by a layer until the enclosing batch closes.

use alloc::string::String;

use crate::path::Path;

/// One recorded mutation of a layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerChange {
    /// A spec now exists at the path (created or moved in).
    SpecAdded(Path),
    /// The spec at the path and its subtree are gone (deleted or moved away).
    SpecRemoved(Path),
    /// A field on the spec at `path` changed.
    Field {
        /// Spec path.
        path: Path,
        /// Field name.
        name: String,
    },
    /// The sublayer list changed.
    Sublayers,
    /// The default prim changed.
    DefaultPrim,
    /// The layer relocates changed.
    Relocates,
}
