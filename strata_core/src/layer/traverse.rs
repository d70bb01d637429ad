// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spec tree traversal utilities.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use super::contents::Layer;
use super::spec::Spec;
use super::value::{Value, field};
use crate::path::Path;

/// A pre-order iterator over a layer's spec tree.
///
/// Properties of a prim are visited before its children; both in authored
/// order. Created by [`Layer::traverse`].
#[derive(Debug)]
pub struct Traverse<'a> {
    layer: &'a Layer,
    stack: Vec<Path>,
}

impl<'a> Traverse<'a> {
    pub(crate) fn new(layer: &'a Layer, root: &Path) -> Self {
        let stack = if layer.has_spec(root) {
            alloc::vec![root.clone()]
        } else {
            Vec::new()
        };
        Self { layer, stack }
    }
}

impl<'a> Iterator for Traverse<'a> {
    type Item = (Path, &'a Spec);

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.stack.pop()?;
        let spec = self.layer.spec(&path)?;
        if !path.is_property_path() {
            for child in spec.children().iter().rev() {
                self.stack.push(path.append_child(child));
            }
            if !path.is_absolute_root() {
                for prop in spec.properties().iter().rev() {
                    self.stack.push(path.append_property(prop));
                }
            }
        }
        Some((path, spec))
    }
}

/// Composition-relevant fields of one prim spec.
pub type CompositionFields<'a> = BTreeMap<&'static str, &'a Value>;

const COMPOSITION_FIELDS: &[&str] = &[
    field::REFERENCES,
    field::PAYLOAD,
    field::INHERIT_PATHS,
    field::SPECIALIZES,
];

/// Collects every authored composition field in the layer, keyed by prim path.
#[must_use]
pub fn composition_fields(layer: &Layer) -> BTreeMap<Path, CompositionFields<'_>> {
    let mut out = BTreeMap::new();
    for (path, spec) in layer.traverse(&Path::absolute_root()) {
        let found: CompositionFields<'_> = COMPOSITION_FIELDS
            .iter()
            .filter_map(|name| spec.field(name).map(|v| (*name, v)))
            .collect();
        if !found.is_empty() {
            out.insert(path, found);
        }
    }
    out
}
