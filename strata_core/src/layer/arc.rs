// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition arc values.

use alloc::string::{String, ToString};
use core::fmt;
use core::str::FromStr;

use crate::path::{Path, PathError};

/// The kind of composition arc that introduced a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArcKind {
    /// The stage's own layer stack at the prim's path.
    Root,
    /// An inherit arc.
    Inherit,
    /// A reference into another layer.
    Reference,
    /// A reference with no asset path, resolved in the authoring layer stack.
    InternalReference,
    /// A payload arc; only contributes while the owning prim is loaded.
    Payload,
    /// A specialize arc.
    Specialize,
}

impl fmt::Display for ArcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Root => "root",
            Self::Inherit => "inherit",
            Self::Reference => "reference",
            Self::InternalReference => "internal reference",
            Self::Payload => "payload",
            Self::Specialize => "specialize",
        })
    }
}

/// A reference or payload list item: an asset identifier and a target prim.
///
/// An empty `asset_path` targets the layer stack the arc is authored in. A
/// missing `prim_path` targets the target layer's default prim.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArcTarget {
    /// Layer identifier; empty for internal arcs.
    pub asset_path: String,
    /// Target prim, or `None` for the default prim.
    pub prim_path: Option<Path>,
}

impl ArcTarget {
    /// An arc to `prim_path` in the authoring layer stack.
    #[must_use]
    pub fn internal(prim_path: Path) -> Self {
        Self {
            asset_path: String::new(),
            prim_path: Some(prim_path),
        }
    }

    /// An arc to `prim_path` in the layer identified by `asset_path`.
    #[must_use]
    pub fn external(asset_path: &str, prim_path: Path) -> Self {
        Self {
            asset_path: asset_path.to_string(),
            prim_path: Some(prim_path),
        }
    }

    /// An arc to the default prim of the layer identified by `asset_path`.
    #[must_use]
    pub fn default_prim(asset_path: &str) -> Self {
        Self {
            asset_path: asset_path.to_string(),
            prim_path: None,
        }
    }

    /// Whether this arc resolves in its authoring layer stack.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.asset_path.is_empty()
    }

    /// Returns a copy targeting `prim_path` in the same asset.
    #[must_use]
    pub fn with_prim_path(&self, prim_path: Path) -> Self {
        Self {
            asset_path: self.asset_path.clone(),
            prim_path: Some(prim_path),
        }
    }
}

/// Error produced when parsing an arc target string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArcTargetError {
    /// The string is not of the form `@asset@<path>`, `@asset@` or `<path>`.
    #[error("`{0}` is not of the form `@asset@<path>`")]
    Malformed(String),
    /// The bracketed prim path is invalid.
    #[error(transparent)]
    Path(#[from] PathError),
}

impl FromStr for ArcTarget {
    type Err = ArcTargetError;

    /// Parses `@asset@<path>`, `@asset@` (default prim) or `<path>` (internal).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ArcTargetError::Malformed(s.to_string());
        let (asset_path, rest) = match s.strip_prefix('@') {
            Some(tail) => {
                let end = tail.find('@').ok_or_else(malformed)?;
                (&tail[..end], &tail[end + 1..])
            }
            None => ("", s),
        };
        if rest.is_empty() {
            if asset_path.is_empty() {
                return Err(malformed());
            }
            return Ok(Self::default_prim(asset_path));
        }
        let inner = rest
            .strip_prefix('<')
            .and_then(|r| r.strip_suffix('>'))
            .ok_or_else(malformed)?;
        let prim_path = if inner.is_empty() {
            None
        } else {
            Some(Path::parse(inner)?)
        };
        Ok(Self {
            asset_path: asset_path.to_string(),
            prim_path,
        })
    }
}

impl fmt::Debug for ArcTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for ArcTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.asset_path.is_empty() {
            write!(f, "@{}@", self.asset_path)?;
        }
        match &self.prim_path {
            Some(p) => write!(f, "<{p}>"),
            None if self.asset_path.is_empty() => f.write_str("<>"),
            None => Ok(()),
        }
    }
}
