// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layered scene description with namespace editing.
//!
//! `strata_core` holds layers of prim and property specs, composes them
//! into stages through sublayers, references, payloads, inherits and
//! specializes, and edits namespace so that every registered stage whose
//! arcs reach an edited prim stays consistent. It is `no_std` compatible
//! (with `alloc`) and addresses layers and stages through generational
//! handles.
//!
//! # Architecture
//!
//! All state lives in a [`Scene`](scene::Scene). Mutations are batched by
//! change blocks and turned into one notice per affected stage:
//!
//! ```text
//!   NamespaceEditor::apply_edits() ─┐
//!   Scene::set_field() etc. ────────┤
//!                                   ▼
//!   ChangeBlock ──► Layer mutations ──► LayerChange records
//!                                               │
//!                 ┌─────────────────────────────┘
//!                 ▼
//!   compose_stage() ──► Composition ──► ChangeTracker
//!                                             │
//!                 ┌───────────────────────────┘
//!                 ▼
//!   ObjectsChanged ──► NoticeSink::on_objects_changed()
//! ```
//!
//! **[`path`]**: Absolute prim and property paths with prefix algebra.
//!
//! **[`layer`]**: Spec trees, list ops, arc values and the arena
//! [`LayerStore`](layer::LayerStore). Layers record every mutation and keep
//! their default prim in step with moves and deletes.
//!
//! **[`compose`]**: Layer stacks and prim indices. Each composed node
//! remembers the arc that introduced it, which is what dependent-edit
//! discovery walks.
//!
//! **[`stage`]**: A composed view of a root layer stack with load rules,
//! muted layers and an asset resolver.
//!
//! **[`scene`]**: Arena of layers and stages; change blocks and notice
//! dispatch.
//!
//! **[`edit`]**: The [`NamespaceEditor`](edit::NamespaceEditor).
//!
//! **[`dirty`]** / **[`notice`]**: Change channels via `understory_dirty`
//! and the [`NoticeSink`](notice::NoticeSink) trait.
//!
//! **[`config`]**: Editor and stage configuration.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//!   A [`ChangeBlock`](scene::ChangeBlock) dropped while the thread is
//!   panicking then leaves its changes pending instead of notifying.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod compose;
pub mod config;
pub mod dirty;
pub mod edit;
pub mod layer;
pub mod notice;
pub mod path;
pub mod scene;
pub mod stage;
