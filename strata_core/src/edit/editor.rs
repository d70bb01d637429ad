// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::ToString;
use alloc::vec::Vec;

use super::error::{EditApplyError, EditValidationError, EditWarning};
use super::plan::{EditPlan, Planner};
use crate::compose::CompositionError;
use crate::config::EditorConfig;
use crate::layer::{Layer, LayerId};
use crate::path::{Path, is_valid_prim_name, is_valid_property_name};
use crate::scene::Scene;
use crate::stage::{Stage, StageId};

/// A namespace edit request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NamespaceEdit {
    /// Move (rename and/or reparent) a prim or property.
    Move {
        /// Current path.
        old: Path,
        /// Destination path.
        new: Path,
    },
    /// Delete a prim or property.
    Delete {
        /// Path to delete.
        path: Path,
    },
}

impl NamespaceEdit {
    /// The edited object.
    #[must_use]
    pub fn source(&self) -> &Path {
        match self {
            Self::Move { old, .. } => old,
            Self::Delete { path } => path,
        }
    }

    /// Where the object goes; `None` for deletes.
    #[must_use]
    pub fn destination(&self) -> Option<&Path> {
        match self {
            Self::Move { new, .. } => Some(new),
            Self::Delete { .. } => None,
        }
    }
}

/// Where the editor is in its request/apply cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditorState {
    /// Nothing requested, or the last request was rejected.
    #[default]
    Idle,
    /// A request passed validation and is waiting for `apply_edits`.
    Validated,
    /// The last request was applied.
    Committed,
}

/// Edits namespace on a base stage and keeps registered dependent stages
/// consistent with it.
///
/// Usage is two-phase: request an edit (`move_prim_at_path`,
/// `delete_prim_at_path`, ...), which validates it against the base stage,
/// then call [`apply_edits`](Self::apply_edits). Applying rewrites the specs
/// of the base stage's layer stack, then every arc in the base and dependent
/// stages that reaches the edited specs, as one change batch. On any failure
/// every touched layer is restored.
///
/// The editor only holds stage handles; the [`Scene`] is passed to each
/// call.
#[derive(Clone, Debug)]
pub struct NamespaceEditor {
    base: StageId,
    dependents: Vec<StageId>,
    config: EditorConfig,
    pending: Option<NamespaceEdit>,
    state: EditorState,
    warnings: Vec<EditWarning>,
}

impl NamespaceEditor {
    /// Creates an editor for `stage` with the default configuration.
    #[must_use]
    pub fn new(stage: StageId) -> Self {
        Self::with_config(stage, EditorConfig::DEFAULT)
    }

    /// Creates an editor for `stage`.
    #[must_use]
    pub fn with_config(stage: StageId, config: EditorConfig) -> Self {
        Self {
            base: stage,
            dependents: Vec::new(),
            config,
            pending: None,
            state: EditorState::Idle,
            warnings: Vec::new(),
        }
    }

    /// The stage edits are requested against.
    #[must_use]
    pub fn base_stage(&self) -> StageId {
        self.base
    }

    /// Registered dependent stages.
    #[must_use]
    pub fn dependent_stages(&self) -> &[StageId] {
        &self.dependents
    }

    /// The editor's configuration.
    #[must_use]
    pub fn config(&self) -> EditorConfig {
        self.config
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> EditorState {
        self.state
    }

    /// The validated request waiting to be applied.
    #[must_use]
    pub fn pending(&self) -> Option<&NamespaceEdit> {
        self.pending.as_ref()
    }

    /// Advisory diagnostics from the last successful `apply_edits`.
    #[must_use]
    pub fn warnings(&self) -> &[EditWarning] {
        &self.warnings
    }

    // -- Dependent stages --

    /// Registers a stage whose arcs must follow edits made here.
    /// No-op if already registered.
    pub fn add_dependent_stage(&mut self, stage: StageId) {
        if stage != self.base && !self.dependents.contains(&stage) {
            self.dependents.push(stage);
        }
    }

    /// Unregisters a dependent stage.
    pub fn remove_dependent_stage(&mut self, stage: StageId) {
        self.dependents.retain(|s| *s != stage);
    }

    // -- Requests --

    /// Requests an edit, replacing any pending one.
    ///
    /// On failure nothing is pending and the editor is idle.
    pub fn request(&mut self, scene: &Scene, edit: NamespaceEdit) -> Result<(), EditValidationError> {
        self.warnings.clear();
        match self.validate(scene, &edit) {
            Ok(()) => {
                tracing::debug!(?edit, "namespace edit validated");
                self.pending = Some(edit);
                self.state = EditorState::Validated;
                Ok(())
            }
            Err(error) => {
                tracing::debug!(?edit, %error, "namespace edit rejected");
                self.pending = None;
                self.state = EditorState::Idle;
                Err(error)
            }
        }
    }

    /// Requests moving the prim at `old` to `new`.
    pub fn move_prim_at_path(&mut self, scene: &Scene, old: &Path, new: &Path) -> bool {
        if !old.is_prim_path() || !new.is_prim_path() {
            return self.reject(EditValidationError::InvalidDestination {
                from: old.clone(),
                to: new.clone(),
            });
        }
        self.request_move(scene, old, new)
    }

    /// Requests deleting the prim at `path`.
    pub fn delete_prim_at_path(&mut self, scene: &Scene, path: &Path) -> bool {
        if !path.is_prim_path() {
            return self.reject(EditValidationError::NoSuchPrim(path.clone()));
        }
        self.request(scene, NamespaceEdit::Delete { path: path.clone() })
            .is_ok()
    }

    /// Requests renaming the prim at `path` within its parent.
    pub fn rename_prim(&mut self, scene: &Scene, path: &Path, new_name: &str) -> bool {
        if !is_valid_prim_name(new_name) {
            return self.reject(EditValidationError::InvalidName(new_name.to_string()));
        }
        let Some(parent) = path.parent().filter(|_| path.is_prim_path()) else {
            return self.reject(EditValidationError::NoSuchPrim(path.clone()));
        };
        self.move_prim_at_path(scene, path, &parent.append_child(new_name))
    }

    /// Requests moving the prim at `path` under `new_parent`, keeping its name.
    pub fn reparent_prim(&mut self, scene: &Scene, path: &Path, new_parent: &Path) -> bool {
        if !path.is_prim_path() || new_parent.is_property_path() {
            return self.reject(EditValidationError::InvalidDestination {
                from: path.clone(),
                to: new_parent.clone(),
            });
        }
        self.move_prim_at_path(scene, path, &new_parent.append_child(path.name()))
    }

    /// Requests moving the property at `old` to `new`.
    pub fn move_property_at_path(&mut self, scene: &Scene, old: &Path, new: &Path) -> bool {
        if !old.is_property_path() || !new.is_property_path() {
            return self.reject(EditValidationError::InvalidDestination {
                from: old.clone(),
                to: new.clone(),
            });
        }
        self.request_move(scene, old, new)
    }

    /// Requests deleting the property at `path`.
    pub fn delete_property(&mut self, scene: &Scene, path: &Path) -> bool {
        if !path.is_property_path() {
            return self.reject(EditValidationError::NoSuchProperty(path.clone()));
        }
        self.request(scene, NamespaceEdit::Delete { path: path.clone() })
            .is_ok()
    }

    /// Requests renaming the property at `path` on its prim.
    pub fn rename_property(&mut self, scene: &Scene, path: &Path, new_name: &str) -> bool {
        if !path.is_property_path() {
            return self.reject(EditValidationError::NoSuchProperty(path.clone()));
        }
        if !is_valid_property_name(new_name) {
            return self.reject(EditValidationError::InvalidName(new_name.to_string()));
        }
        self.request_move(scene, path, &path.prim_path().append_property(new_name))
    }

    /// Requests moving the property at `path` onto the prim `new_parent`.
    pub fn reparent_property(&mut self, scene: &Scene, path: &Path, new_parent: &Path) -> bool {
        if !path.is_property_path() || !new_parent.is_prim_path() {
            return self.reject(EditValidationError::InvalidDestination {
                from: path.clone(),
                to: new_parent.clone(),
            });
        }
        self.request_move(scene, path, &new_parent.append_property(path.name()))
    }

    fn request_move(&mut self, scene: &Scene, old: &Path, new: &Path) -> bool {
        self.request(
            scene,
            NamespaceEdit::Move {
                old: old.clone(),
                new: new.clone(),
            },
        )
        .is_ok()
    }

    fn reject(&mut self, error: EditValidationError) -> bool {
        tracing::debug!(%error, "namespace edit rejected");
        self.pending = None;
        self.state = EditorState::Idle;
        false
    }

    // -- Validation --

    fn validate(&self, scene: &Scene, edit: &NamespaceEdit) -> Result<(), EditValidationError> {
        let stage = scene.stage(self.base);
        let old = edit.source();
        let is_property = old.is_property_path();
        let exists = |p: &Path| {
            if p.is_property_path() {
                stage.has_property(p)
            } else {
                stage.has_prim(p)
            }
        };
        if old.is_absolute_root() || !exists(old) {
            return Err(if is_property {
                EditValidationError::NoSuchProperty(old.clone())
            } else {
                EditValidationError::NoSuchPrim(old.clone())
            });
        }
        let local = stage
            .layer_stack()
            .is_some_and(|s| s.has_spec(scene.layers(), old));
        if !local {
            return Err(EditValidationError::NotLocallyDefined(old.clone()));
        }
        let Some(new) = edit.destination() else {
            return Ok(());
        };
        if new.is_absolute_root()
            || new.is_property_path() != is_property
            || new == old
            || new.has_prefix(old)
        {
            return Err(EditValidationError::InvalidDestination {
                from: old.clone(),
                to: new.clone(),
            });
        }
        let parent = new.parent().unwrap_or_default();
        if !parent.is_absolute_root() && !stage.has_prim(&parent) {
            return Err(EditValidationError::MissingParent(new.clone()));
        }
        if exists(new) {
            return Err(EditValidationError::DestinationExists(new.clone()));
        }
        Ok(())
    }

    /// Open stages watched by this editor, base first.
    fn watched<'s>(&self, scene: &'s Scene) -> Vec<(StageId, &'s Stage)> {
        core::iter::once(self.base)
            .chain(self.dependents.iter().copied())
            .filter(|&id| scene.is_open(id))
            .map(|id| (id, scene.stage(id)))
            .collect()
    }

    fn prepare(&self, scene: &Scene, check_read_only: bool) -> Result<EditPlan, EditValidationError> {
        let edit = self
            .pending
            .as_ref()
            .ok_or(EditValidationError::NothingPending)?;
        self.validate(scene, edit)?;
        let base = scene.stage(self.base);
        let plan = Planner::new(scene.layers(), self.config, self.watched(scene), &base.muted)
            .plan(base.layer_stack_key(), edit.source(), edit.destination());

        if let Some((layer, path)) = plan.conflicts.first() {
            return Err(EditValidationError::Conflict {
                layer: scene.layer(*layer).identifier().to_string(),
                path: path.clone(),
            });
        }
        if check_read_only {
            if let Some(layer) = plan
                .layers()
                .into_iter()
                .map(|l| scene.layer(l))
                .find(|l| l.is_read_only())
            {
                return Err(EditValidationError::ReadOnlyLayer(
                    layer.identifier().to_string(),
                ));
            }
        }

        let mut dry_run = scene.layers().clone();
        if plan.execute(&mut dry_run).is_ok() {
            let after = base.compose_against(&dry_run);
            if let Some(error) = after
                .errors()
                .iter()
                .find(|e| e.is_cycle() && !base.composition_errors().contains(e))
            {
                return Err(EditValidationError::IntroducesCycle(error.clone()));
            }
        }
        Ok(plan)
    }

    /// Whether the pending edit can be applied right now.
    #[must_use]
    pub fn can_apply_edits(&self, scene: &Scene) -> bool {
        self.check_edits(scene).is_ok()
    }

    /// Like [`can_apply_edits`](Self::can_apply_edits), with the reason.
    ///
    /// Re-validates the request against the current scene, plans every
    /// dependent edit, rejects read-only layers and conflicting specs, and
    /// dry-runs the plan to make sure the base stage gains no cycle.
    pub fn check_edits(&self, scene: &Scene) -> Result<(), EditValidationError> {
        self.prepare(scene, true).map(|_| ())
    }

    // -- Applying --

    /// Applies the pending edit. Returns `false` (with nothing changed) if it
    /// could not be applied.
    pub fn apply_edits(&mut self, scene: &mut Scene) -> bool {
        match self.try_apply_edits(scene) {
            Ok(()) => true,
            Err(error) => {
                tracing::debug!(%error, "namespace edit not applied");
                false
            }
        }
    }

    /// Like [`apply_edits`](Self::apply_edits), with the reason for failure.
    pub fn try_apply_edits(&mut self, scene: &mut Scene) -> Result<(), EditApplyError> {
        let plan = self.prepare(scene, false)?;
        let before: Vec<(StageId, Vec<CompositionError>)> = self
            .watched(scene)
            .into_iter()
            .map(|(id, stage)| (id, cycles(stage)))
            .collect();

        {
            let mut block = scene.change_block();
            let snapshots: Vec<(LayerId, Layer)> = plan
                .layers()
                .into_iter()
                .map(|id| (id, block.snapshot_layer(id)))
                .collect();
            if let Err((failed, source)) = plan.execute(&mut block) {
                for (id, snapshot) in snapshots {
                    block.restore_layer(id, snapshot);
                }
                let layer = block.layer(failed).identifier().to_string();
                tracing::warn!(%layer, error = %source, "namespace edit rolled back");
                return Err(EditApplyError::Layer { layer, source });
            }
        }

        let mut warnings = plan.warnings;
        for (id, before) in before {
            if !scene.is_open(id) {
                continue;
            }
            let after = cycles(scene.stage(id));
            for error in after.iter().filter(|e| !before.contains(e)) {
                warnings.push(EditWarning::CycleIntroduced {
                    stage: id,
                    error: error.clone(),
                });
            }
            for error in before.iter().filter(|e| !after.contains(e)) {
                warnings.push(EditWarning::CycleRemoved {
                    stage: id,
                    error: error.clone(),
                });
            }
        }
        for warning in &warnings {
            tracing::warn!(%warning, "namespace edit");
        }
        tracing::debug!(edit = ?self.pending, "namespace edit committed");
        self.warnings = warnings;
        self.pending = None;
        self.state = EditorState::Committed;
        Ok(())
    }
}

fn cycles(stage: &Stage) -> Vec<CompositionError> {
    stage
        .composition_errors()
        .iter()
        .filter(|e| e.is_cycle())
        .cloned()
        .collect()
}
