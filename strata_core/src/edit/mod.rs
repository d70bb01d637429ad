// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Namespace editing with dependent-edit propagation.
//!
//! A [`NamespaceEditor`] moves, renames, reparents and deletes prims and
//! properties on a base stage. Each edit is planned against the cached
//! compositions of the base stage and of every registered dependent stage,
//! then committed as a single change batch:
//!
//! ```text
//!   request ──► validate ──► plan ──► dry run ──► execute ──► notices
//!     │            │           │          │           │
//!     │            │           │          │           └─ rollback on failure
//!     │            │           │          └─ reject new cycles on the base stage
//!     │            │           └─ specs to move, arcs to rewrite, overs to prune
//!     │            └─ source exists, destination free, parent exists
//!     └─ Idle ──────────► Validated ─────────────────────► Committed
//! ```
//!
//! Arcs whose target is left empty (resolved through a layer's default
//! prim) are never rewritten; they follow the default prim, which layers
//! update on their own. Payloads of unloaded prims are not composed, so
//! they are never rewritten either; the editor reports them as
//! [`EditWarning::UnloadedPayloadNotUpdated`].

mod editor;
mod error;
mod plan;

pub use editor::{EditorState, NamespaceEdit, NamespaceEditor};
pub use error::{EditApplyError, EditValidationError, EditWarning};
