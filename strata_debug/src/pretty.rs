// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable notice output.
//!
//! [`PrettyPrintSink`] implements [`NoticeSink`] and writes one line per
//! listed path to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use strata_core::notice::{ChangedFields, NoticeSink, ObjectsChanged};

/// Writes human-readable notice lines to a [`Write`](std::io::Write) destination.
///
/// ```text
/// [StageId(0@gen0)] resync /Prim1 (references)
/// [StageId(0@gen0)] info   /Prim1.attr (default)
/// ```
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    fn write_set(&mut self, stage: &str, label: &str, set: &ChangedFields) {
        for (path, fields) in set {
            if fields.is_empty() {
                let _ = writeln!(self.writer, "[{stage}] {label:<6} {path}");
            } else {
                let _ = writeln!(
                    self.writer,
                    "[{stage}] {label:<6} {path} ({})",
                    fields.join(", ")
                );
            }
        }
    }
}

impl<W: Write> NoticeSink for PrettyPrintSink<W> {
    fn on_objects_changed(&mut self, notice: &ObjectsChanged) {
        let stage = notice
            .stage()
            .map_or_else(|| String::from("?"), |s| format!("{s:?}"));
        self.write_set(&stage, "resync", notice.resynced());
        self.write_set(&stage, "info", notice.changed_info_only());
        self.write_set(&stage, "asset", notice.resolved_asset_paths_resynced());
    }
}
