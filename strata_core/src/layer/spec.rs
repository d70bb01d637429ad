// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Specs: the per-layer opinions stored at each path.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use super::value::Value;

/// How a prim spec participates in composition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Specifier {
    /// Defines the prim.
    Def,
    /// Only overrides opinions of a prim defined elsewhere.
    #[default]
    Over,
    /// An abstract class prim.
    Class,
}

/// What a spec describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpecKind {
    /// The layer's root `/`.
    PseudoRoot,
    /// A prim.
    Prim,
    /// An attribute.
    Attribute,
    /// A relationship.
    Relationship,
}

impl SpecKind {
    /// Returns `true` for attributes and relationships.
    #[must_use]
    pub const fn is_property(self) -> bool {
        matches!(self, Self::Attribute | Self::Relationship)
    }
}

/// The opinions a single layer holds at a single path.
#[derive(Clone, Debug, PartialEq)]
pub struct Spec {
    pub(crate) kind: SpecKind,
    pub(crate) specifier: Specifier,
    pub(crate) type_name: String,
    pub(crate) fields: BTreeMap<String, Value>,
    pub(crate) children: Vec<String>,
    pub(crate) properties: Vec<String>,
}

impl Spec {
    pub(crate) fn new(kind: SpecKind, specifier: Specifier, type_name: &str) -> Self {
        Self {
            kind,
            specifier,
            type_name: type_name.into(),
            fields: BTreeMap::new(),
            children: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// What this spec describes.
    #[must_use]
    pub fn kind(&self) -> SpecKind {
        self.kind
    }

    /// The prim specifier (meaningless on properties).
    #[must_use]
    pub fn specifier(&self) -> Specifier {
        self.specifier
    }

    /// The type name; empty when untyped.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Looks up a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// All authored fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Ordered child prim names.
    #[must_use]
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// Ordered property names.
    #[must_use]
    pub fn properties(&self) -> &[String] {
        &self.properties
    }
}
