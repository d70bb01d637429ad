// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Printing, recording, and JSON dumps for strata diagnostics.
//!
//! This crate provides [`NoticeSink`](strata_core::notice::NoticeSink)
//! implementations for development and tests, plus a JSON view of layers:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-path output.
//! - [`recorder::RecorderSink`]: keeps every notice behind a shared handle
//!   for later inspection.
//! - [`json`]: composition fields and notices as `serde_json` values.

pub mod json;
pub mod pretty;
pub mod recorder;
