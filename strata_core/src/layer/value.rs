// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Field values and well-known field names.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use super::arc::ArcTarget;
use super::list_op::ListOp;
use crate::path::Path;

/// A field value stored on a spec.
///
/// Composition only interprets the list-op variants; everything else is
/// opaque metadata carried through edits unchanged.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A double.
    Double(f64),
    /// A free-form string.
    String(String),
    /// An interned-style token.
    Token(String),
    /// An asset path, resolved through the stage's resolver.
    AssetPath(String),
    /// An ordered token list (`apiSchemas`, `primOrder`, `propertyOrder`).
    TokenList(Vec<String>),
    /// A reference list op.
    References(ListOp<ArcTarget>),
    /// A payload list op.
    Payloads(ListOp<ArcTarget>),
    /// A path list op (`inheritPaths`, `specializes`, `targetPaths`,
    /// `connectionPaths`).
    PathList(ListOp<Path>),
    /// A nested dictionary (`customData`).
    Dictionary(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the path list op, if this is one.
    #[must_use]
    pub fn as_path_list(&self) -> Option<&ListOp<Path>> {
        match self {
            Self::PathList(op) => Some(op),
            _ => None,
        }
    }

    /// Returns the reference or payload list op, if this is one.
    #[must_use]
    pub fn as_arc_list(&self) -> Option<&ListOp<ArcTarget>> {
        match self {
            Self::References(op) | Self::Payloads(op) => Some(op),
            _ => None,
        }
    }

    /// Returns the asset path string, if this is one.
    #[must_use]
    pub fn as_asset_path(&self) -> Option<&str> {
        match self {
            Self::AssetPath(s) => Some(s),
            _ => None,
        }
    }
}

/// Well-known field names.
pub mod field {
    /// Prim specifier.
    pub const SPECIFIER: &str = "specifier";
    /// Prim or attribute type name.
    pub const TYPE_NAME: &str = "typeName";
    /// Prim activation.
    pub const ACTIVE: &str = "active";
    /// Model kind.
    pub const KIND: &str = "kind";
    /// Applied API schemas.
    pub const API_SCHEMAS: &str = "apiSchemas";
    /// Child ordering.
    pub const PRIM_ORDER: &str = "primOrder";
    /// Property ordering.
    pub const PROPERTY_ORDER: &str = "propertyOrder";
    /// Reference list op.
    pub const REFERENCES: &str = "references";
    /// Payload list op.
    pub const PAYLOAD: &str = "payload";
    /// Inherit list op.
    pub const INHERIT_PATHS: &str = "inheritPaths";
    /// Specialize list op.
    pub const SPECIALIZES: &str = "specializes";
    /// Variant selections.
    pub const VARIANT_SELECTION: &str = "variantSelection";
    /// Relationship targets.
    pub const TARGET_PATHS: &str = "targetPaths";
    /// Attribute connections.
    pub const CONNECTION_PATHS: &str = "connectionPaths";
    /// Attribute default value.
    pub const DEFAULT: &str = "default";
    /// Free-form comment.
    pub const COMMENT: &str = "comment";
    /// Custom data dictionary.
    pub const CUSTOM_DATA: &str = "customData";
    /// Property display group.
    pub const DISPLAY_GROUP: &str = "displayGroup";
    /// Whether a property is custom.
    pub const CUSTOM: &str = "custom";
    /// Attribute variability.
    pub const VARIABILITY: &str = "variability";

    /// Prim fields whose change alters composed namespace or composition.
    pub const STRUCTURAL_PRIM_FIELDS: &[&str] = &[
        SPECIFIER,
        TYPE_NAME,
        ACTIVE,
        KIND,
        API_SCHEMAS,
        PRIM_ORDER,
        REFERENCES,
        PAYLOAD,
        INHERIT_PATHS,
        SPECIALIZES,
        VARIANT_SELECTION,
    ];

    /// Whether changing `name` on a prim spec requires a resync.
    #[must_use]
    pub fn is_structural_prim_field(name: &str) -> bool {
        STRUCTURAL_PRIM_FIELDS.contains(&name)
    }
}
