// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single layer: a tree of specs plus layer-level metadata.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use super::arc::ArcTarget;
use super::change::LayerChange;
use super::list_op::ListOp;
use super::spec::{Spec, SpecKind, Specifier};
use super::traverse::Traverse;
use super::value::{Value, field};
use crate::path::Path;

/// Error returned by spec-level mutations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    /// The layer rejects mutation.
    #[error("layer `{0}` is read-only")]
    ReadOnly(String),
    /// There is no spec at the path.
    #[error("no spec at {0}")]
    NotFound(Path),
    /// A spec already exists at the destination.
    #[error("a spec already exists at {0}")]
    AlreadyExists(Path),
    /// The destination's parent spec does not exist.
    #[error("no parent spec for {0}")]
    MissingParent(Path),
    /// The move would place a spec under itself or change its kind.
    #[error("cannot move {from} to {to}")]
    InvalidMove {
        /// Source path.
        from: Path,
        /// Destination path.
        to: Path,
    },
    /// The path cannot hold this kind of spec.
    #[error("{0} cannot hold this kind of spec")]
    InvalidPath(Path),
}

/// A layer: specs keyed by path, sublayers, default prim and relocates.
///
/// Every mutation is recorded as a [`LayerChange`] until the owning scene
/// drains it at the end of a change block.
#[derive(Clone, Debug)]
pub struct Layer {
    identifier: String,
    specs: BTreeMap<Path, Spec>,
    sublayers: Vec<String>,
    default_prim: Option<Path>,
    relocates: Vec<(Path, Path)>,
    read_only: bool,
    pending: Vec<LayerChange>,
}

impl Layer {
    /// Creates an empty layer holding only its pseudo-root.
    #[must_use]
    pub fn new(identifier: &str) -> Self {
        let mut specs = BTreeMap::new();
        specs.insert(
            Path::absolute_root(),
            Spec::new(SpecKind::PseudoRoot, Specifier::Def, ""),
        );
        Self {
            identifier: identifier.to_string(),
            specs,
            sublayers: Vec::new(),
            default_prim: None,
            relocates: Vec::new(),
            read_only: false,
            pending: Vec::new(),
        }
    }

    /// The identifier other layers use to refer to this one.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Whether mutations are rejected.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Marks the layer read-only (or writable again).
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// The spec at `path`, if any.
    #[must_use]
    pub fn spec(&self, path: &Path) -> Option<&Spec> {
        self.specs.get(path)
    }

    /// Whether a spec exists at `path`.
    #[must_use]
    pub fn has_spec(&self, path: &Path) -> bool {
        self.specs.contains_key(path)
    }

    /// Whether a prim spec exists at `path`.
    #[must_use]
    pub fn has_prim_spec(&self, path: &Path) -> bool {
        self.specs
            .get(path)
            .is_some_and(|s| s.kind == SpecKind::Prim)
    }

    /// Looks up a field on the spec at `path`.
    #[must_use]
    pub fn field(&self, path: &Path, name: &str) -> Option<&Value> {
        self.specs.get(path).and_then(|s| s.fields.get(name))
    }

    /// Pre-order traversal of the spec tree rooted at `root`.
    #[must_use]
    pub fn traverse(&self, root: &Path) -> Traverse<'_> {
        Traverse::new(self, root)
    }

    /// All spec paths at or under `root`, in path order.
    #[must_use]
    pub fn subtree_paths(&self, root: &Path) -> Vec<Path> {
        self.specs
            .range(root.clone()..)
            .take_while(|(p, _)| p.has_prefix(root))
            .map(|(p, _)| p.clone())
            .collect()
    }

    /// All spec paths in the layer.
    pub fn spec_paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.specs.keys()
    }

    // -- Spec creation and removal --

    /// Creates a prim spec, synthesizing `over` ancestors as needed.
    ///
    /// Returns `Ok(false)` if a prim spec already exists at `path`.
    pub fn create_prim_spec(
        &mut self,
        path: &Path,
        specifier: Specifier,
        type_name: &str,
    ) -> Result<bool, SpecError> {
        self.check_writable()?;
        if !path.is_prim_path() {
            return Err(SpecError::InvalidPath(path.clone()));
        }
        if self.has_prim_spec(path) {
            return Ok(false);
        }
        if self.has_spec(path) {
            return Err(SpecError::AlreadyExists(path.clone()));
        }
        self.ensure_over_chain(&path.prim_path().parent().unwrap_or_default())?;
        self.insert_spec(path, Spec::new(SpecKind::Prim, specifier, type_name));
        self.record_field(path, field::SPECIFIER);
        if !type_name.is_empty() {
            self.record_field(path, field::TYPE_NAME);
        }
        Ok(true)
    }

    /// Ensures a prim spec exists at `path`, creating `over`s for it and any
    /// missing ancestors.
    pub fn ensure_over_chain(&mut self, path: &Path) -> Result<(), SpecError> {
        if path.is_absolute_root() || self.has_prim_spec(path) {
            return Ok(());
        }
        self.check_writable()?;
        if let Some(parent) = path.parent() {
            self.ensure_over_chain(&parent)?;
        }
        if self.has_spec(path) {
            return Err(SpecError::AlreadyExists(path.clone()));
        }
        self.insert_spec(path, Spec::new(SpecKind::Prim, Specifier::Over, ""));
        self.record_field(path, field::SPECIFIER);
        Ok(())
    }

    /// Creates an attribute or relationship spec, synthesizing an `over`
    /// for its owning prim if needed.
    pub fn create_property_spec(
        &mut self,
        path: &Path,
        kind: SpecKind,
        type_name: &str,
    ) -> Result<bool, SpecError> {
        self.check_writable()?;
        if !path.is_property_path() || !kind.is_property() {
            return Err(SpecError::InvalidPath(path.clone()));
        }
        if let Some(existing) = self.specs.get(path) {
            return if existing.kind == kind {
                Ok(false)
            } else {
                Err(SpecError::AlreadyExists(path.clone()))
            };
        }
        self.ensure_over_chain(&path.prim_path())?;
        self.insert_spec(path, Spec::new(kind, Specifier::Def, type_name));
        if !type_name.is_empty() {
            self.record_field(path, field::TYPE_NAME);
        }
        Ok(true)
    }

    /// Removes the spec at `path` and everything beneath it.
    ///
    /// Returns `Ok(false)` if there was nothing to remove.
    pub fn remove_spec(&mut self, path: &Path) -> Result<bool, SpecError> {
        self.check_writable()?;
        if path.is_absolute_root() {
            return Err(SpecError::InvalidPath(path.clone()));
        }
        if !self.has_spec(path) {
            return Ok(false);
        }
        for p in self.subtree_paths(path) {
            self.specs.remove(&p);
        }
        self.unlink_from_parent(path);
        self.pending.push(LayerChange::SpecRemoved(path.clone()));
        self.fix_default_prim(path, None);
        tracing::trace!(layer = %self.identifier, %path, "removed spec");
        Ok(true)
    }

    /// Moves the spec at `old` (and its subtree) to `new`.
    ///
    /// The destination must not exist and its parent must. Renames within
    /// the same parent keep the name's position in the parent's ordering.
    pub fn move_spec(&mut self, old: &Path, new: &Path) -> Result<(), SpecError> {
        self.check_writable()?;
        let invalid = || SpecError::InvalidMove {
            from: old.clone(),
            to: new.clone(),
        };
        if old.is_absolute_root()
            || old.is_property_path() != new.is_property_path()
            || old.has_prefix(new)
            || new.has_prefix(old)
        {
            return Err(invalid());
        }
        if !self.has_spec(old) {
            return Err(SpecError::NotFound(old.clone()));
        }
        if self.has_spec(new) {
            return Err(SpecError::AlreadyExists(new.clone()));
        }
        let new_parent = new.parent().ok_or_else(invalid)?;
        if !self.has_spec(&new_parent) {
            return Err(SpecError::MissingParent(new.clone()));
        }

        let moved: Vec<(Path, Spec)> = self
            .subtree_paths(old)
            .into_iter()
            .filter_map(|p| self.specs.remove(&p).map(|s| (p, s)))
            .collect();
        for (p, spec) in moved {
            if let Some(dest) = p.replace_prefix(old, new) {
                self.specs.insert(dest, spec);
            }
        }

        let old_parent = old.parent().unwrap_or_default();
        if old_parent == new_parent {
            let is_property = new.is_property_path();
            if let Some(parent) = self.specs.get_mut(&new_parent) {
                let names = if is_property {
                    &mut parent.properties
                } else {
                    &mut parent.children
                };
                if let Some(slot) = names.iter_mut().find(|n| n.as_str() == old.name()) {
                    *slot = new.name().to_string();
                }
            }
        } else {
            self.unlink_from_parent(old);
            self.link_to_parent(new);
        }

        self.pending.push(LayerChange::SpecRemoved(old.clone()));
        self.pending.push(LayerChange::SpecAdded(new.clone()));
        self.fix_default_prim(old, Some(new));
        tracing::trace!(layer = %self.identifier, %old, %new, "moved spec");
        Ok(())
    }

    // -- Fields --

    /// Sets a field. Returns `Ok(false)` if the value was already present.
    pub fn set_field(&mut self, path: &Path, name: &str, value: Value) -> Result<bool, SpecError> {
        self.check_writable()?;
        let spec = self
            .specs
            .get_mut(path)
            .ok_or_else(|| SpecError::NotFound(path.clone()))?;
        if spec.fields.get(name) == Some(&value) {
            return Ok(false);
        }
        spec.fields.insert(name.to_string(), value);
        self.record_field(path, name);
        Ok(true)
    }

    /// Clears a field. Returns `Ok(false)` if it was not authored.
    ///
    /// A spec left inert stays in place; [`prune_inert`](Self::prune_inert)
    /// removes it. The namespace editor prunes orphaned overs itself.
    pub fn clear_field(&mut self, path: &Path, name: &str) -> Result<bool, SpecError> {
        self.check_writable()?;
        let spec = self
            .specs
            .get_mut(path)
            .ok_or_else(|| SpecError::NotFound(path.clone()))?;
        if spec.fields.remove(name).is_none() {
            return Ok(false);
        }
        self.record_field(path, name);
        Ok(true)
    }

    /// Whether the prim spec at `path` is an `over` with no fields, type
    /// name, children or properties that is not the default prim.
    #[must_use]
    pub fn is_inert(&self, path: &Path) -> bool {
        let Some(spec) = self.specs.get(path) else {
            return false;
        };
        spec.kind == SpecKind::Prim
            && spec.specifier == Specifier::Over
            && spec.type_name.is_empty()
            && spec.fields.is_empty()
            && spec.children.is_empty()
            && spec.properties.is_empty()
            && self.default_prim.as_ref() != Some(path)
    }

    /// Removes the spec at `path` if it is inert, then each ancestor that
    /// became inert. Returns how many specs were removed.
    pub fn prune_inert(&mut self, path: &Path) -> Result<usize, SpecError> {
        self.check_writable()?;
        let mut removed = 0;
        let mut current = Some(path.clone());
        while let Some(p) = current {
            if p.is_absolute_root() || !self.is_inert(&p) {
                break;
            }
            self.remove_spec(&p)?;
            removed += 1;
            current = p.parent();
        }
        Ok(removed)
    }

    /// Sets the specifier of the prim spec at `path`.
    pub fn set_specifier(&mut self, path: &Path, specifier: Specifier) -> Result<bool, SpecError> {
        self.check_writable()?;
        let spec = self.prim_spec_mut(path)?;
        if spec.specifier == specifier {
            return Ok(false);
        }
        spec.specifier = specifier;
        self.record_field(path, field::SPECIFIER);
        Ok(true)
    }

    /// Sets the type name of the spec at `path`.
    pub fn set_type_name(&mut self, path: &Path, type_name: &str) -> Result<bool, SpecError> {
        self.check_writable()?;
        let spec = self
            .specs
            .get_mut(path)
            .ok_or_else(|| SpecError::NotFound(path.clone()))?;
        if spec.type_name == type_name {
            return Ok(false);
        }
        spec.type_name = type_name.to_string();
        self.record_field(path, field::TYPE_NAME);
        Ok(true)
    }

    /// Rewrites every item of the reference or payload list op `name` on
    /// the spec at `path`. `f` returning `None` drops the item.
    pub fn modify_arc_list(
        &mut self,
        path: &Path,
        name: &str,
        f: impl FnMut(&ArcTarget) -> Option<ArcTarget>,
    ) -> Result<bool, SpecError> {
        self.check_writable()?;
        let changed = match self
            .specs
            .get_mut(path)
            .and_then(|s| s.fields.get_mut(name))
        {
            Some(Value::References(op) | Value::Payloads(op)) => op.modify_operations(f),
            _ => false,
        };
        if changed {
            self.record_field(path, name);
        }
        Ok(changed)
    }

    /// Rewrites every item of the path list op `name` on the spec at `path`.
    pub fn modify_path_list(
        &mut self,
        path: &Path,
        name: &str,
        f: impl FnMut(&Path) -> Option<Path>,
    ) -> Result<bool, SpecError> {
        self.check_writable()?;
        let changed = match self
            .specs
            .get_mut(path)
            .and_then(|s| s.fields.get_mut(name))
        {
            Some(Value::PathList(op)) => op.modify_operations(f),
            _ => false,
        };
        if changed {
            self.record_field(path, name);
        }
        Ok(changed)
    }

    /// Convenience: authors an explicit reference list.
    pub fn set_references(&mut self, path: &Path, items: Vec<ArcTarget>) -> Result<bool, SpecError> {
        self.set_field(path, field::REFERENCES, Value::References(ListOp::explicit(items)))
    }

    /// Convenience: authors an explicit payload list.
    pub fn set_payloads(&mut self, path: &Path, items: Vec<ArcTarget>) -> Result<bool, SpecError> {
        self.set_field(path, field::PAYLOAD, Value::Payloads(ListOp::explicit(items)))
    }

    // -- Layer metadata --

    /// Sublayer identifiers, strongest first.
    #[must_use]
    pub fn sublayers(&self) -> &[String] {
        &self.sublayers
    }

    /// Replaces the sublayer list.
    pub fn set_sublayers(&mut self, sublayers: Vec<String>) -> Result<bool, SpecError> {
        self.check_writable()?;
        if self.sublayers == sublayers {
            return Ok(false);
        }
        self.sublayers = sublayers;
        self.pending.push(LayerChange::Sublayers);
        Ok(true)
    }

    /// Inserts a sublayer at `index` (clamped to the list length).
    pub fn insert_sublayer(&mut self, index: usize, identifier: &str) -> Result<(), SpecError> {
        self.check_writable()?;
        let index = index.min(self.sublayers.len());
        self.sublayers.insert(index, identifier.to_string());
        self.pending.push(LayerChange::Sublayers);
        Ok(())
    }

    /// Removes the sublayer at `index`, if present.
    pub fn remove_sublayer(&mut self, index: usize) -> Result<bool, SpecError> {
        self.check_writable()?;
        if index >= self.sublayers.len() {
            return Ok(false);
        }
        self.sublayers.remove(index);
        self.pending.push(LayerChange::Sublayers);
        Ok(true)
    }

    /// The default prim as authored: a bare name for root prims, an
    /// absolute path string otherwise.
    #[must_use]
    pub fn default_prim(&self) -> Option<String> {
        self.default_prim.as_ref().map(|p| {
            if p.is_root_prim_path() {
                p.name().to_string()
            } else {
                p.to_string()
            }
        })
    }

    /// The default prim as a path.
    #[must_use]
    pub fn default_prim_path(&self) -> Option<&Path> {
        self.default_prim.as_ref()
    }

    /// Whether a default prim is authored.
    #[must_use]
    pub fn has_default_prim(&self) -> bool {
        self.default_prim.is_some()
    }

    /// Sets the default prim from a bare root-prim name or an absolute path.
    pub fn set_default_prim(&mut self, value: &str) -> Result<(), SpecError> {
        self.check_writable()?;
        let path = if value.starts_with('/') {
            Path::parse(value).ok()
        } else if crate::path::is_valid_prim_name(value) {
            Some(Path::absolute_root().append_child(value))
        } else {
            None
        };
        let Some(path) = path.filter(Path::is_prim_path) else {
            return Err(SpecError::InvalidPath(Path::absolute_root()));
        };
        if self.default_prim.as_ref() != Some(&path) {
            self.default_prim = Some(path);
            self.pending.push(LayerChange::DefaultPrim);
        }
        Ok(())
    }

    /// Clears the default prim.
    pub fn clear_default_prim(&mut self) -> Result<(), SpecError> {
        self.check_writable()?;
        if self.default_prim.take().is_some() {
            self.pending.push(LayerChange::DefaultPrim);
        }
        Ok(())
    }

    /// Relocation pairs `(source, target)`.
    #[must_use]
    pub fn relocates(&self) -> &[(Path, Path)] {
        &self.relocates
    }

    /// Replaces the relocation pairs.
    pub fn set_relocates(&mut self, relocates: Vec<(Path, Path)>) -> Result<bool, SpecError> {
        self.check_writable()?;
        if self.relocates == relocates {
            return Ok(false);
        }
        self.relocates = relocates;
        self.pending.push(LayerChange::Relocates);
        Ok(true)
    }

    // -- Change recording --

    /// Whether mutations are waiting to be drained.
    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    pub(crate) fn drain_changes(&mut self) -> Vec<LayerChange> {
        core::mem::take(&mut self.pending)
    }

    // -- Internals --

    fn check_writable(&self) -> Result<(), SpecError> {
        if self.read_only {
            return Err(SpecError::ReadOnly(self.identifier.clone()));
        }
        Ok(())
    }

    fn prim_spec_mut(&mut self, path: &Path) -> Result<&mut Spec, SpecError> {
        match self.specs.get_mut(path) {
            Some(s) if s.kind == SpecKind::Prim => Ok(s),
            _ => Err(SpecError::NotFound(path.clone())),
        }
    }

    fn record_field(&mut self, path: &Path, name: &str) {
        self.pending.push(LayerChange::Field {
            path: path.clone(),
            name: name.to_string(),
        });
    }

    fn insert_spec(&mut self, path: &Path, spec: Spec) {
        self.specs.insert(path.clone(), spec);
        self.link_to_parent(path);
        self.pending.push(LayerChange::SpecAdded(path.clone()));
    }

    fn link_to_parent(&mut self, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        if let Some(parent) = self.specs.get_mut(&parent) {
            let names = if path.is_property_path() {
                &mut parent.properties
            } else {
                &mut parent.children
            };
            if !names.iter().any(|n| n.as_str() == path.name()) {
                names.push(path.name().to_string());
            }
        }
    }

    fn unlink_from_parent(&mut self, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        if let Some(parent) = self.specs.get_mut(&parent) {
            let names = if path.is_property_path() {
                &mut parent.properties
            } else {
                &mut parent.children
            };
            names.retain(|n| n.as_str() != path.name());
        }
    }

    /// Keeps the default prim pointing at the same spec after a namespace
    /// edit, clearing it when the spec is gone.
    fn fix_default_prim(&mut self, old: &Path, new: Option<&Path>) {
        let Some(current) = &self.default_prim else {
            return;
        };
        if !current.has_prefix(old) {
            return;
        }
        let moved = new
            .and_then(|n| current.replace_prefix(old, n))
            .filter(|p| p.is_prim_path() && self.has_prim_spec(p));
        self.default_prim = moved;
        self.pending.push(LayerChange::DefaultPrim);
    }
}
