// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Notice recording.
//!
//! [`RecorderSink`] implements [`NoticeSink`] and keeps every notice it
//! receives. Clones share one log, so a test can subscribe a clone to a
//! stage and inspect the log through the original.

use std::cell::RefCell;
use std::rc::Rc;

use strata_core::notice::{NoticeSink, ObjectsChanged};

/// A [`NoticeSink`] that records notices in a shared log.
#[derive(Clone, Debug, Default)]
pub struct RecorderSink {
    log: Rc<RefCell<Vec<ObjectsChanged>>>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notices recorded since the last [`take`](Self::take).
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    /// Whether nothing was recorded since the last [`take`](Self::take).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }

    /// A copy of the recorded notices.
    #[must_use]
    pub fn notices(&self) -> Vec<ObjectsChanged> {
        self.log.borrow().clone()
    }

    /// The most recent notice.
    #[must_use]
    pub fn last(&self) -> Option<ObjectsChanged> {
        self.log.borrow().last().cloned()
    }

    /// Removes and returns every recorded notice.
    pub fn take(&self) -> Vec<ObjectsChanged> {
        core::mem::take(&mut *self.log.borrow_mut())
    }
}

impl NoticeSink for RecorderSink {
    fn on_objects_changed(&mut self, notice: &ObjectsChanged) {
        self.log.borrow_mut().push(notice.clone());
    }
}
