// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change-tracking channel constants.
//!
//! Each stage collects the effects of a change batch in a multi-channel
//! dirty tracker (via [`understory_dirty`]), keyed by interned stage paths.
//! The channels map one-to-one onto the three path sets of an
//! [`ObjectsChanged`](crate::notice::ObjectsChanged) notice.
//!
//! All channels are local-only: a path is listed exactly as marked, and the
//! notice reduces resynced paths to their minimal roots when it drains. No
//! dependency edges are added, since a resync of a prim already implies its
//! whole subtree.

use understory_dirty::Channel;

/// Composed namespace or composition structure changed at the path.
pub const RESYNC: Channel = Channel::new(0);

/// Only non-structural field values changed at the path.
pub const INFO: Channel = Channel::new(1);

/// An asset-path field at the path resolves differently.
pub const ASSET: Channel = Channel::new(2);
