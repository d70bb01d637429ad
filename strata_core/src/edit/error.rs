// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use core::fmt;

use crate::compose::CompositionError;
use crate::layer::{ArcTarget, SpecError};
use crate::path::Path;
use crate::stage::StageId;

/// Why an edit request or a pending edit cannot be applied.
///
/// Returned before anything is mutated.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EditValidationError {
    /// No edit has been requested.
    #[error("no edit is pending")]
    NothingPending,
    /// The source path does not name a composed prim.
    #[error("no prim at `{0}`")]
    NoSuchPrim(Path),
    /// The source path does not name a composed property.
    #[error("no property at `{0}`")]
    NoSuchProperty(Path),
    /// The source is composed only through arcs; there is nothing local to edit.
    #[error("`{0}` has no specs in the stage's layer stack")]
    NotLocallyDefined(Path),
    /// The destination's parent is not composed.
    #[error("parent of `{0}` does not exist")]
    MissingParent(Path),
    /// Something is already composed at the destination.
    #[error("`{0}` already exists")]
    DestinationExists(Path),
    /// The destination is not a valid target for the source.
    #[error("cannot move `{from}` to `{to}`")]
    InvalidDestination {
        /// Source path.
        from: Path,
        /// Requested destination.
        to: Path,
    },
    /// A rename was given a name that is not a valid identifier.
    #[error("`{0}` is not a valid name")]
    InvalidName(String),
    /// A layer that must change is read-only.
    #[error("layer `{0}` is read-only")]
    ReadOnlyLayer(String),
    /// A dependent edit would land on existing specs.
    #[error("`{path}` already has specs in layer `{layer}`")]
    Conflict {
        /// Layer holding the conflicting spec.
        layer: String,
        /// Destination of the dependent edit.
        path: Path,
    },
    /// Applying the edit would create a composition cycle on the base stage.
    #[error("edit would introduce a cycle: {0}")]
    IntroducesCycle(CompositionError),
}

/// Why a validated edit could not be committed.
///
/// Every layer the edit touched has been restored when this is returned.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EditApplyError {
    /// The edit failed validation.
    #[error(transparent)]
    Invalid(#[from] EditValidationError),
    /// A primitive layer operation failed partway through the batch.
    #[error("editing layer `{layer}` failed")]
    Layer {
        /// Identifier of the failing layer.
        layer: String,
        /// The underlying failure.
        #[source]
        source: SpecError,
    },
}

/// Advisory diagnostics produced while applying an edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditWarning {
    /// A payload in an unloaded prim points at an edited path and was left
    /// untouched.
    UnloadedPayloadNotUpdated {
        /// Stage the payload was found on.
        stage: StageId,
        /// Stage prim whose load state gates the payload.
        prim: Path,
        /// The stale payload item.
        target: ArcTarget,
    },
    /// A composition cycle appeared on a stage after the edit.
    CycleIntroduced {
        /// Affected stage.
        stage: StageId,
        /// The new error.
        error: CompositionError,
    },
    /// A composition cycle disappeared from a stage after the edit.
    CycleRemoved {
        /// Affected stage.
        stage: StageId,
        /// The error that no longer occurs.
        error: CompositionError,
    },
}

impl fmt::Display for EditWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnloadedPayloadNotUpdated {
                stage,
                prim,
                target,
            } => write!(
                f,
                "payload {target} on unloaded prim `{prim}` of {stage:?} was not updated"
            ),
            Self::CycleIntroduced { stage, error } => {
                write!(f, "{stage:?}: cycle introduced: {error}")
            }
            Self::CycleRemoved { stage, error } => write!(f, "{stage:?}: cycle removed: {error}"),
        }
    }
}
