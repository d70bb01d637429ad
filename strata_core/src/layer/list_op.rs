// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composable list edits.
//!
//! A [`ListOp`] is either *explicit* (a full replacement list) or a set of
//! deletions, prepends and appends applied, in that order, to the list
//! composed from weaker opinions. Duplicates are dropped: prepended and
//! explicit items keep their first occurrence, appended items their last.

use alloc::vec::Vec;

/// An ordered list edit over items of type `T`.
#[derive(Clone, Debug, PartialEq)]
pub struct ListOp<T> {
    explicit: bool,
    explicit_items: Vec<T>,
    prepended: Vec<T>,
    appended: Vec<T>,
    deleted: Vec<T>,
}

impl<T> Default for ListOp<T> {
    fn default() -> Self {
        Self {
            explicit: false,
            explicit_items: Vec::new(),
            prepended: Vec::new(),
            appended: Vec::new(),
            deleted: Vec::new(),
        }
    }
}

impl<T: Clone + PartialEq> ListOp<T> {
    /// An explicit list that replaces anything weaker.
    #[must_use]
    pub fn explicit(items: Vec<T>) -> Self {
        Self {
            explicit: true,
            explicit_items: items,
            ..Self::default()
        }
    }

    /// A list op that prepends `items`.
    #[must_use]
    pub fn prepended(items: Vec<T>) -> Self {
        Self {
            prepended: items,
            ..Self::default()
        }
    }

    /// A list op that appends `items`.
    #[must_use]
    pub fn appended(items: Vec<T>) -> Self {
        Self {
            appended: items,
            ..Self::default()
        }
    }

    /// Adds deletions to a non-explicit list op.
    #[must_use]
    pub fn with_deleted(mut self, items: Vec<T>) -> Self {
        self.deleted = items;
        self
    }

    /// Whether this op is in explicit mode.
    #[must_use]
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    /// Items of the explicit list.
    #[must_use]
    pub fn explicit_items(&self) -> &[T] {
        &self.explicit_items
    }

    /// Prepended items.
    #[must_use]
    pub fn prepended_items(&self) -> &[T] {
        &self.prepended
    }

    /// Appended items.
    #[must_use]
    pub fn appended_items(&self) -> &[T] {
        &self.appended
    }

    /// Deleted items.
    #[must_use]
    pub fn deleted_items(&self) -> &[T] {
        &self.deleted
    }

    /// Returns `true` if any of the sub-lists mentions `item`.
    #[must_use]
    pub fn mentions(&self, item: &T) -> bool {
        self.explicit_items.contains(item)
            || self.prepended.contains(item)
            || self.appended.contains(item)
            || self.deleted.contains(item)
    }

    /// Iterates every item in every sub-list.
    pub fn all_items(&self) -> impl Iterator<Item = &T> + '_ {
        self.explicit_items
            .iter()
            .chain(&self.prepended)
            .chain(&self.appended)
            .chain(&self.deleted)
    }

    /// Applies this op on top of a list composed from weaker opinions.
    pub fn apply_operations(&self, items: &mut Vec<T>) {
        if self.explicit {
            *items = dedup_keep_first(&self.explicit_items);
            return;
        }
        items.retain(|i| !self.deleted.contains(i));
        if !self.prepended.is_empty() {
            items.retain(|i| !self.prepended.contains(i));
            let mut front = dedup_keep_first(&self.prepended);
            front.append(items);
            *items = front;
        }
        if !self.appended.is_empty() {
            items.retain(|i| !self.appended.contains(i));
            items.extend(dedup_keep_last(&self.appended));
        }
    }

    /// The list this op produces on its own.
    #[must_use]
    pub fn applied_items(&self) -> Vec<T> {
        let mut items = Vec::new();
        self.apply_operations(&mut items);
        items
    }

    /// Maps every item through `f`; `None` removes the item.
    ///
    /// Duplicates introduced by the mapping are removed with the same
    /// first/last rule as composition. Explicit mode is preserved even when
    /// the explicit list becomes empty. Returns `true` if anything changed.
    pub fn modify_operations(&mut self, mut f: impl FnMut(&T) -> Option<T>) -> bool {
        let before = self.clone();
        let mut map = |list: &[T]| list.iter().filter_map(&mut f).collect::<Vec<_>>();
        let explicit = map(self.explicit_items.as_slice());
        let prepended = map(self.prepended.as_slice());
        let appended = map(self.appended.as_slice());
        let deleted = map(self.deleted.as_slice());
        self.explicit_items = dedup_keep_first(&explicit);
        self.prepended = dedup_keep_first(&prepended);
        self.appended = dedup_keep_last(&appended);
        self.deleted = dedup_keep_first(&deleted);
        *self != before
    }
}

fn dedup_keep_first<T: Clone + PartialEq>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

fn dedup_keep_last<T: Clone + PartialEq>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items.iter().rev() {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn explicit_replaces_weaker() {
        let mut items = vec![1, 2];
        ListOp::explicit(vec![3, 4, 3]).apply_operations(&mut items);
        assert_eq!(items, vec![3, 4]);
    }

    #[test]
    fn delete_then_prepend_then_append() {
        let mut items = vec![1, 2, 3];
        let op = ListOp {
            prepended: vec![3, 5],
            appended: vec![1, 6],
            ..ListOp::default()
        }
        .with_deleted(vec![2]);
        op.apply_operations(&mut items);
        assert_eq!(items, vec![3, 5, 1, 6]);
    }

    #[test]
    fn duplicate_rules() {
        assert_eq!(ListOp::prepended(vec![1, 2, 1]).applied_items(), vec![1, 2]);
        assert_eq!(ListOp::appended(vec![1, 2, 1]).applied_items(), vec![2, 1]);
    }

    #[test]
    fn modify_removes_and_keeps_explicit_mode() {
        let mut op = ListOp::explicit(vec![1]);
        assert!(op.modify_operations(|_| None));
        assert!(op.is_explicit());
        assert!(op.applied_items().is_empty());
        assert!(!op.modify_operations(|i| Some(*i)));
    }

    #[test]
    fn modify_collapses_duplicates() {
        let mut op = ListOp::prepended(vec![1, 2, 3]);
        assert!(op.modify_operations(|i| Some(if *i == 2 { 1 } else { *i })));
        assert_eq!(op.prepended_items(), &[1, 3]);
    }
}
