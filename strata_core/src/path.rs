// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical namespace paths.
//!
//! A [`Path`] is either the absolute root `/`, an absolute prim path such as
//! `/World/Ref/Child`, or a property path such as `/World/Ref.attr`. Paths are
//! immutable values; every operation here is pure.
//!
//! Ordering is lexicographic over prim elements, with a prim sorting before
//! its own properties and before its children. That makes a
//! [`BTreeMap`](alloc::collections::BTreeMap) keyed by [`Path`] iterate a
//! subtree contiguously.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

/// Error produced when parsing a path string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The string does not start with `/`.
    #[error("path `{0}` is not absolute")]
    NotAbsolute(String),
    /// An element is not a valid identifier.
    #[error("path `{path}` has invalid element `{element}`")]
    InvalidElement {
        /// The full input.
        path: String,
        /// The offending element.
        element: String,
    },
}

/// An absolute namespace path.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Path {
    prims: Vec<String>,
    property: Option<String>,
}

impl Path {
    /// The absolute root `/`.
    #[must_use]
    pub const fn absolute_root() -> Self {
        Self {
            prims: Vec::new(),
            property: None,
        }
    }

    /// Parses an absolute path string such as `/A/B` or `/A/B.attr`.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let Some(rest) = s.strip_prefix('/') else {
            return Err(PathError::NotAbsolute(s.to_string()));
        };
        if rest.is_empty() {
            return Ok(Self::absolute_root());
        }
        let (prim_part, property) = match rest.split_once('.') {
            Some((prims, prop)) => (prims, Some(prop)),
            None => (rest, None),
        };
        let invalid = |element: &str| PathError::InvalidElement {
            path: s.to_string(),
            element: element.to_string(),
        };
        let mut prims = Vec::new();
        for element in prim_part.split('/') {
            if !is_valid_prim_name(element) {
                return Err(invalid(element));
            }
            prims.push(element.to_string());
        }
        let property = match property {
            Some(p) if is_valid_property_name(p) => Some(p.to_string()),
            Some(p) => return Err(invalid(p)),
            None => None,
        };
        Ok(Self { prims, property })
    }

    /// Returns `true` for `/`.
    #[must_use]
    pub fn is_absolute_root(&self) -> bool {
        self.prims.is_empty() && self.property.is_none()
    }

    /// Returns `true` if this path names a prim (not the root, not a property).
    #[must_use]
    pub fn is_prim_path(&self) -> bool {
        !self.prims.is_empty() && self.property.is_none()
    }

    /// Returns `true` if this path names a direct child of `/`.
    #[must_use]
    pub fn is_root_prim_path(&self) -> bool {
        self.prims.len() == 1 && self.property.is_none()
    }

    /// Returns `true` if this path names a property.
    #[must_use]
    pub fn is_property_path(&self) -> bool {
        self.property.is_some()
    }

    /// Number of prim elements; `/` has depth zero.
    #[must_use]
    pub fn prim_depth(&self) -> usize {
        self.prims.len()
    }

    /// The final element: the property name for property paths, the prim
    /// name otherwise, and an empty string for `/`.
    #[must_use]
    pub fn name(&self) -> &str {
        match &self.property {
            Some(p) => p,
            None => self.prims.last().map_or("", String::as_str),
        }
    }

    /// The parent path. A property's parent is its owning prim; `/` has none.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.property.is_some() {
            return Some(self.prim_path());
        }
        if self.prims.is_empty() {
            return None;
        }
        Some(Self {
            prims: self.prims[..self.prims.len() - 1].to_vec(),
            property: None,
        })
    }

    /// Strips the property element, if any.
    #[must_use]
    pub fn prim_path(&self) -> Self {
        Self {
            prims: self.prims.clone(),
            property: None,
        }
    }

    /// The ancestor (or self) with exactly `depth` prim elements.
    ///
    /// Returns `None` if `depth` exceeds this path's prim depth.
    #[must_use]
    pub fn ancestor_at_depth(&self, depth: usize) -> Option<Self> {
        (depth <= self.prims.len()).then(|| Self {
            prims: self.prims[..depth].to_vec(),
            property: None,
        })
    }

    /// Appends a child prim element.
    ///
    /// # Panics
    ///
    /// Panics if this is a property path or `name` is not a valid identifier.
    #[must_use]
    pub fn append_child(&self, name: &str) -> Self {
        assert!(
            self.property.is_none(),
            "cannot append child `{name}` to property path {self}"
        );
        assert!(is_valid_prim_name(name), "invalid prim name `{name}`");
        let mut prims = self.prims.clone();
        prims.push(name.to_string());
        Self {
            prims,
            property: None,
        }
    }

    /// Appends a property element.
    ///
    /// # Panics
    ///
    /// Panics if this is already a property path, is `/`, or `name` is not a
    /// valid property name.
    #[must_use]
    pub fn append_property(&self, name: &str) -> Self {
        assert!(
            self.is_prim_path(),
            "cannot append property `{name}` to {self}"
        );
        assert!(is_valid_property_name(name), "invalid property name `{name}`");
        Self {
            prims: self.prims.clone(),
            property: Some(name.to_string()),
        }
    }

    /// Returns `true` if `prefix` equals this path or is one of its ancestors.
    #[must_use]
    pub fn has_prefix(&self, prefix: &Self) -> bool {
        if prefix.property.is_some() {
            return self == prefix;
        }
        self.prims.len() >= prefix.prims.len() && self.prims[..prefix.prims.len()] == prefix.prims
    }

    /// Returns `true` if this path is a strict ancestor of `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        other != self && other.has_prefix(self)
    }

    /// Substitutes the leading `old` prefix with `new`.
    ///
    /// Returns `None` when `old` is not a prefix of this path, or when the
    /// result would hang elements below a property path.
    #[must_use]
    pub fn replace_prefix(&self, old: &Self, new: &Self) -> Option<Self> {
        if !self.has_prefix(old) {
            return None;
        }
        if self == old {
            return Some(new.clone());
        }
        if new.property.is_some() {
            return None;
        }
        let mut prims = new.prims.clone();
        prims.extend_from_slice(&self.prims[old.prims.len()..]);
        Some(Self {
            prims,
            property: self.property.clone(),
        })
    }

    /// Iterates the prim elements from the root down.
    pub fn prim_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.prims.iter().map(String::as_str)
    }

    /// Iterates the strict prim ancestors of this path, nearest first, not
    /// including `/`.
    pub fn prim_ancestors(&self) -> impl Iterator<Item = Self> + '_ {
        let own = if self.property.is_some() {
            self.prims.len()
        } else {
            self.prims.len().saturating_sub(1)
        };
        (1..=own).rev().map(move |d| Self {
            prims: self.prims[..d].to_vec(),
            property: None,
        })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prims.is_empty() {
            f.write_str("/")?;
        }
        for p in &self.prims {
            write!(f, "/{p}")?;
        }
        if let Some(prop) = &self.property {
            write!(f, ".{prop}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Returns `true` if `name` is a valid prim name.
#[must_use]
pub fn is_valid_prim_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Returns `true` if `name` is a valid property name (namespaced with `:`).
#[must_use]
pub fn is_valid_property_name(name: &str) -> bool {
    !name.is_empty() && name.split(':').all(is_valid_prim_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(p("/").to_string(), "/");
        assert_eq!(p("/A/B").to_string(), "/A/B");
        assert_eq!(p("/A/B.attr:ns").to_string(), "/A/B.attr:ns");
        assert!(p("/A.x").is_property_path());
        assert!(Path::parse("A/B").is_err());
        assert!(Path::parse("/A//B").is_err());
        assert!(Path::parse("/1A").is_err());
    }

    #[test]
    fn parents() {
        assert_eq!(p("/A/B").parent(), Some(p("/A")));
        assert_eq!(p("/A").parent(), Some(p("/")));
        assert_eq!(p("/A.x").parent(), Some(p("/A")));
        assert_eq!(p("/").parent(), None);
    }

    #[test]
    fn prefix_relations() {
        assert!(p("/A/B").has_prefix(&p("/A")));
        assert!(p("/A/B").has_prefix(&p("/A/B")));
        assert!(p("/A.x").has_prefix(&p("/A")));
        assert!(!p("/AB").has_prefix(&p("/A")));
        assert!(p("/A").is_ancestor_of(&p("/A/B")));
        assert!(!p("/A").is_ancestor_of(&p("/A")));
        assert!(p("/").is_ancestor_of(&p("/A")));
    }

    #[test]
    fn replace_prefix_cases() {
        assert_eq!(
            p("/Ref/Child/GrandChild").replace_prefix(&p("/Ref/Child"), &p("/Ref/Renamed")),
            Some(p("/Ref/Renamed/GrandChild"))
        );
        assert_eq!(
            p("/Ref/Child.attr").replace_prefix(&p("/Ref"), &p("/Other")),
            Some(p("/Other/Child.attr"))
        );
        assert_eq!(p("/Other").replace_prefix(&p("/Ref"), &p("/X")), None);
        assert_eq!(
            p("/A.x").replace_prefix(&p("/A.x"), &p("/B.y")),
            Some(p("/B.y"))
        );
        assert_eq!(p("/A/B").replace_prefix(&p("/A"), &p("/C.x")), None);
    }

    #[test]
    fn ordering_keeps_subtrees_contiguous() {
        let mut v = alloc::vec![p("/B"), p("/A/C"), p("/A.x"), p("/A"), p("/")];
        v.sort();
        assert_eq!(v, alloc::vec![p("/"), p("/A"), p("/A.x"), p("/A/C"), p("/B")]);
    }

    #[test]
    fn ancestors_nearest_first() {
        let anc: Vec<Path> = p("/A/B/C").prim_ancestors().collect();
        assert_eq!(anc, alloc::vec![p("/A/B"), p("/A")]);
        let anc: Vec<Path> = p("/A/B.x").prim_ancestors().collect();
        assert_eq!(anc, alloc::vec![p("/A/B"), p("/A")]);
        assert_eq!(p("/A/B").ancestor_at_depth(1), Some(p("/A")));
    }
}
