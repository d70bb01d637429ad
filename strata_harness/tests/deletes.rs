// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deleting arc targets, and the over-pruning asymmetry of move round trips.

use pretty_assertions::assert_eq;

use strata_core::config::{EditorConfig, StageConfig};
use strata_core::edit::NamespaceEditor;
use strata_core::layer::{ArcTarget, LayerId, ListOp, Value, field};
use strata_core::path::Path;
use strata_core::scene::Scene;
use strata_core::stage::StageId;
use strata_harness::{Contents, LayerBuilder, stage_contents, verify_stage_contents};

fn p(s: &str) -> Path {
    Path::parse(s).unwrap()
}

fn contents(paths: &[&str]) -> Contents {
    Contents::from_paths(paths.iter().copied()).unwrap()
}

struct Fixture {
    scene: Scene,
    layer2: LayerId,
    stage1: StageId,
    stage2: StageId,
}

/// `layer2`'s `/Prim1` references `/Ref` and overrides `/Prim1/Child`;
/// `/Prim4` references both `/Ref` and `/Other`.
fn fixture() -> Fixture {
    let _ = tracing_subscriber::fmt::try_init();
    let mut scene = Scene::new();
    let layer1 = LayerBuilder::new(&mut scene, "layer1")
        .unwrap()
        .def("/Ref/Child")
        .def("/Ref2")
        .def("/Other")
        .build()
        .unwrap();
    let layer2 = LayerBuilder::new(&mut scene, "layer2")
        .unwrap()
        .def("/Prim1")
        .references("/Prim1", &["@layer1@</Ref>"])
        .over("/Prim1/Child")
        .attribute("/Prim1/Child.x", "float")
        .def("/Prim1/Own")
        .def("/Prim4")
        .references("/Prim4", &["@layer1@</Ref>", "@layer1@</Other>"])
        .build()
        .unwrap();
    let stage1 = scene.open_stage(layer1, StageConfig::default());
    let stage2 = scene.open_stage(layer2, StageConfig::default());
    assert_eq!(
        verify_stage_contents(
            &scene,
            stage2,
            &contents(&[
                "/Prim1",
                "/Prim1/Child",
                "/Prim1/Child.x",
                "/Prim1/Own",
                "/Prim4",
                "/Prim4/Child",
            ])
        ),
        Ok(())
    );
    Fixture {
        scene,
        layer2,
        stage1,
        stage2,
    }
}

#[test]
fn deleting_a_target_clears_arcs_and_prunes_overs() {
    let Fixture {
        mut scene,
        layer2,
        stage1,
        stage2,
    } = fixture();
    let mut editor = NamespaceEditor::new(stage1);
    editor.add_dependent_stage(stage2);
    assert!(editor.delete_prim_at_path(&scene, &p("/Ref")));
    assert!(editor.apply_edits(&mut scene));

    let layer = scene.layer(layer2);
    assert_eq!(
        layer.field(&p("/Prim1"), field::REFERENCES),
        Some(&Value::References(ListOp::explicit(Vec::new())))
    );
    assert_eq!(
        layer.field(&p("/Prim4"), field::REFERENCES),
        Some(&Value::References(ListOp::explicit(vec![ArcTarget::external(
            "layer1",
            p("/Other")
        )])))
    );
    assert!(!layer.has_spec(&p("/Prim1/Child")));
    assert!(layer.has_spec(&p("/Prim1/Own")));
    assert_eq!(
        verify_stage_contents(&scene, stage2, &contents(&["/Prim1", "/Prim1/Own", "/Prim4"])),
        Ok(())
    );
    assert!(scene.stage(stage2).composition_errors().is_empty());
}

#[test]
fn cascading_delete_removes_referencing_prims() {
    let Fixture {
        mut scene,
        layer2,
        stage1,
        stage2,
    } = fixture();
    let mut editor = NamespaceEditor::with_config(stage1, EditorConfig::cascading());
    editor.add_dependent_stage(stage2);
    assert!(editor.delete_prim_at_path(&scene, &p("/Ref")));
    assert!(editor.apply_edits(&mut scene));

    assert!(!scene.layer(layer2).has_spec(&p("/Prim1")));
    assert!(!scene.layer(layer2).has_spec(&p("/Prim4")));
    assert!(stage_contents(&scene, stage2).is_empty());
}

#[test]
fn move_round_trip_loses_orphaned_overs() {
    let Fixture {
        mut scene,
        layer2,
        stage1,
        stage2,
    } = fixture();
    let before = stage_contents(&scene, stage1);
    let mut editor = NamespaceEditor::new(stage1);
    editor.add_dependent_stage(stage2);

    // Out from under `/Ref`: `/Prim1/Child` loses its target and is pruned.
    assert!(editor.reparent_prim(&scene, &p("/Ref/Child"), &p("/Ref2")));
    assert!(editor.apply_edits(&mut scene));
    assert!(!scene.layer(layer2).has_spec(&p("/Prim1/Child")));
    assert_eq!(
        verify_stage_contents(&scene, stage2, &contents(&["/Prim1", "/Prim1/Own", "/Prim4"])),
        Ok(())
    );

    // And back: the referenced child returns, the override does not.
    assert!(editor.reparent_prim(&scene, &p("/Ref2/Child"), &p("/Ref")));
    assert!(editor.apply_edits(&mut scene));
    assert_eq!(stage_contents(&scene, stage1), before);
    assert_eq!(
        verify_stage_contents(
            &scene,
            stage2,
            &contents(&["/Prim1", "/Prim1/Child", "/Prim1/Own", "/Prim4", "/Prim4/Child"])
        ),
        Ok(())
    );
}

#[test]
fn deleting_a_prim_with_overs_elsewhere_keeps_defs() {
    let Fixture {
        mut scene,
        layer2,
        stage1,
        stage2,
    } = fixture();
    let mut editor = NamespaceEditor::new(stage1);
    editor.add_dependent_stage(stage2);
    assert!(editor.delete_prim_at_path(&scene, &p("/Ref/Child")));
    assert!(editor.apply_edits(&mut scene));

    // The arcs still resolve; only the override of the deleted child goes.
    assert_eq!(
        scene.layer(layer2).field(&p("/Prim1"), field::REFERENCES),
        Some(&Value::References(ListOp::explicit(vec![ArcTarget::external(
            "layer1",
            p("/Ref")
        )])))
    );
    assert_eq!(
        verify_stage_contents(&scene, stage2, &contents(&["/Prim1", "/Prim1/Own", "/Prim4"])),
        Ok(())
    );
}
