// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test support for strata stages.
//!
//! - [`Contents`] is the set of composed object paths a test expects on a
//!   stage; [`stage_contents`] reads the actual set and
//!   [`verify_stage_contents`] compares the two.
//! - [`LayerBuilder`] authors a layer from path and arc strings inside one
//!   change block.
//!
//! The end-to-end scenarios live under `tests/`.

use std::collections::BTreeSet;
use std::fmt;

use strata_core::layer::{
    ArcTarget, ArcTargetError, Layer, LayerId, LayerStoreError, ListOp, SpecError, SpecKind,
    Specifier, Value, field,
};
use strata_core::path::{Path, PathError};
use strata_core::scene::{ChangeBlock, Scene};
use strata_core::stage::StageId;

/// Composed prim and property paths of a stage, excluding `/`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Contents {
    objects: BTreeSet<Path>,
}

impl fmt::Debug for Contents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.objects.iter().map(ToString::to_string))
            .finish()
    }
}

impl Contents {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses every path in `paths`.
    pub fn from_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Result<Self, PathError> {
        let objects = paths
            .into_iter()
            .map(Path::parse)
            .collect::<Result<_, _>>()?;
        Ok(Self { objects })
    }

    /// Adds a path.
    pub fn insert(&mut self, path: Path) {
        self.objects.insert(path);
    }

    /// Whether `path` is listed.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.objects.contains(path)
    }

    /// Listed paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.objects.iter()
    }

    /// Number of listed paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether nothing is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// What `actual` lacks and adds relative to `self`.
    #[must_use]
    pub fn diff(&self, actual: &Self) -> ContentsDiff {
        ContentsDiff {
            missing: self.objects.difference(&actual.objects).cloned().collect(),
            unexpected: actual.objects.difference(&self.objects).cloned().collect(),
        }
    }
}

/// Difference between expected and actual stage contents.
#[derive(Clone, Debug, Default, PartialEq, Eq, thiserror::Error)]
#[error("stage contents differ: missing {missing:?}, unexpected {unexpected:?}")]
pub struct ContentsDiff {
    /// Expected but not composed.
    pub missing: Vec<Path>,
    /// Composed but not expected.
    pub unexpected: Vec<Path>,
}

impl ContentsDiff {
    /// Whether the two sets were equal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

/// Every composed prim and property of `stage`.
#[must_use]
pub fn stage_contents(scene: &Scene, stage: StageId) -> Contents {
    let mut contents = Contents::new();
    for index in scene.stage(stage).composition().prims() {
        let path = index.path();
        if path.is_absolute_root() {
            continue;
        }
        contents.insert(path.clone());
        for property in index.properties() {
            contents.insert(path.append_property(property));
        }
    }
    contents
}

/// Compares the composed contents of `stage` against `expected`.
pub fn verify_stage_contents(
    scene: &Scene,
    stage: StageId,
    expected: &Contents,
) -> Result<(), ContentsDiff> {
    let diff = expected.diff(&stage_contents(scene, stage));
    if diff.is_empty() { Ok(()) } else { Err(diff) }
}

/// Failure while building a layer.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The identifier is taken.
    #[error(transparent)]
    Store(#[from] LayerStoreError),
    /// A path string did not parse.
    #[error(transparent)]
    Path(#[from] PathError),
    /// An arc string did not parse.
    #[error(transparent)]
    Arc(#[from] ArcTargetError),
    /// A spec edit failed.
    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// Authors one layer inside a single change block.
///
/// The first failure is kept and reported by [`build`](Self::build); later
/// calls are skipped.
///
/// ```text
/// LayerBuilder::new(&mut scene, "layer2")?
///     .def("/Prim1")
///     .references("/Prim1", &["@layer1@</Ref>"])
///     .build()?
/// ```
#[derive(Debug)]
pub struct LayerBuilder<'s> {
    block: ChangeBlock<'s>,
    layer: LayerId,
    error: Option<BuildError>,
}

impl<'s> LayerBuilder<'s> {
    /// Creates the layer `identifier` and opens a change block.
    pub fn new(scene: &'s mut Scene, identifier: &str) -> Result<Self, BuildError> {
        let layer = scene.create_layer(identifier)?;
        Ok(Self {
            block: scene.change_block(),
            layer,
            error: None,
        })
    }

    fn with(mut self, f: impl FnOnce(&mut Layer) -> Result<(), BuildError>) -> Self {
        if self.error.is_none() {
            if let Err(e) = f(self.block.layer_mut(self.layer)) {
                self.error = Some(e);
            }
        }
        self
    }

    fn prim(self, path: &str, specifier: Specifier, type_name: &str) -> Self {
        self.with(|l| {
            l.create_prim_spec(&path.parse()?, specifier, type_name)?;
            Ok(())
        })
    }

    /// Defines an untyped prim.
    #[must_use]
    pub fn def(self, path: &str) -> Self {
        self.prim(path, Specifier::Def, "")
    }

    /// Defines a typed prim.
    #[must_use]
    pub fn def_typed(self, path: &str, type_name: &str) -> Self {
        self.prim(path, Specifier::Def, type_name)
    }

    /// Adds an `over`.
    #[must_use]
    pub fn over(self, path: &str) -> Self {
        self.prim(path, Specifier::Over, "")
    }

    /// Adds a `class`.
    #[must_use]
    pub fn class(self, path: &str) -> Self {
        self.prim(path, Specifier::Class, "")
    }

    /// Adds an attribute spec.
    #[must_use]
    pub fn attribute(self, path: &str, type_name: &str) -> Self {
        self.with(|l| {
            l.create_property_spec(&path.parse()?, SpecKind::Attribute, type_name)?;
            Ok(())
        })
    }

    /// Adds a relationship spec with explicit targets.
    #[must_use]
    pub fn relationship(self, path: &str, targets: &[&str]) -> Self {
        self.with(|l| {
            let path: Path = path.parse()?;
            let targets = parse_paths(targets)?;
            l.create_property_spec(&path, SpecKind::Relationship, "")?;
            l.set_field(
                &path,
                field::TARGET_PATHS,
                Value::PathList(ListOp::explicit(targets)),
            )?;
            Ok(())
        })
    }

    /// Authors an explicit reference list.
    #[must_use]
    pub fn references(self, path: &str, targets: &[&str]) -> Self {
        self.with(|l| {
            l.set_references(&path.parse()?, parse_arcs(targets)?)?;
            Ok(())
        })
    }

    /// Authors an explicit payload list.
    #[must_use]
    pub fn payload(self, path: &str, targets: &[&str]) -> Self {
        self.with(|l| {
            l.set_payloads(&path.parse()?, parse_arcs(targets)?)?;
            Ok(())
        })
    }

    /// Authors an explicit inherit list.
    #[must_use]
    pub fn inherits(self, path: &str, targets: &[&str]) -> Self {
        self.path_list(path, field::INHERIT_PATHS, targets)
    }

    /// Authors an explicit specialize list.
    #[must_use]
    pub fn specializes(self, path: &str, targets: &[&str]) -> Self {
        self.path_list(path, field::SPECIALIZES, targets)
    }

    fn path_list(self, path: &str, name: &'static str, targets: &[&str]) -> Self {
        self.with(|l| {
            l.set_field(
                &path.parse()?,
                name,
                Value::PathList(ListOp::explicit(parse_paths(targets)?)),
            )?;
            Ok(())
        })
    }

    /// Authors any field.
    #[must_use]
    pub fn field(self, path: &str, name: &str, value: Value) -> Self {
        self.with(|l| {
            l.set_field(&path.parse()?, name, value)?;
            Ok(())
        })
    }

    /// Sets the default prim.
    #[must_use]
    pub fn default_prim(self, value: &str) -> Self {
        self.with(|l| Ok(l.set_default_prim(value)?))
    }

    /// Replaces the sublayer list.
    #[must_use]
    pub fn sublayers(self, identifiers: &[&str]) -> Self {
        self.with(|l| {
            l.set_sublayers(identifiers.iter().map(ToString::to_string).collect())?;
            Ok(())
        })
    }

    /// Closes the change block and returns the layer.
    pub fn build(self) -> Result<LayerId, BuildError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.layer),
        }
    }
}

fn parse_paths(paths: &[&str]) -> Result<Vec<Path>, PathError> {
    paths.iter().map(|p| Path::parse(p)).collect()
}

fn parse_arcs(targets: &[&str]) -> Result<Vec<ArcTarget>, ArcTargetError> {
    targets.iter().map(|t| t.parse()).collect()
}
