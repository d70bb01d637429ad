// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer data model.
//!
//! A *layer* is a tree of [`Spec`]s keyed by [`Path`](crate::path::Path).
//! Each spec carries:
//!
//! - A kind ([`SpecKind`]) and, for prims, a [`Specifier`] and type name.
//! - A field map of [`Value`]s. The list-op fields (`references`,
//!   `payload`, `inheritPaths`, `specializes`) drive composition;
//!   `targetPaths` and `connectionPaths` name other objects; everything else
//!   is opaque metadata.
//! - Ordered child prim names and property names.
//!
//! Layer-level metadata holds the sublayer list, the default prim and
//! relocates. Layers live in a [`LayerStore`] and are addressed by
//! generational [`LayerId`] handles.
//!
//! # Change recording
//!
//! Every mutation appends a [`LayerChange`]. The owning
//! [`Scene`](crate::scene::Scene) drains these when a change block closes and
//! turns them into per-stage notices.

mod arc;
mod change;
mod contents;
mod id;
mod list_op;
mod spec;
mod store;
mod traverse;
mod value;

pub use arc::{ArcKind, ArcTarget, ArcTargetError};
pub use change::LayerChange;
pub use contents::{Layer, SpecError};
pub use id::LayerId;
pub use list_op::ListOp;
pub use spec::{Spec, SpecKind, Specifier};
pub use store::{LayerStore, LayerStoreError};
pub use traverse::{CompositionFields, Traverse, composition_fields};
pub use value::{Value, field};
