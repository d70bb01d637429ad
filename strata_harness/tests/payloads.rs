// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Payload load state and namespace edits.

use pretty_assertions::assert_eq;

use strata_core::compose::CompositionError;
use strata_core::config::StageConfig;
use strata_core::edit::{EditWarning, NamespaceEditor};
use strata_core::layer::{ArcKind, ArcTarget, LayerId, Value, field};
use strata_core::path::Path;
use strata_core::scene::Scene;
use strata_debug::recorder::RecorderSink;
use strata_harness::{Contents, LayerBuilder, verify_stage_contents};

fn p(s: &str) -> Path {
    Path::parse(s).unwrap()
}

fn contents(paths: &[&str]) -> Contents {
    Contents::from_paths(paths.iter().copied()).unwrap()
}

fn payload(scene: &Scene, layer: LayerId, path: &str) -> Vec<String> {
    scene
        .layer(layer)
        .field(&p(path), field::PAYLOAD)
        .and_then(Value::as_arc_list)
        .map(|op| op.all_items().map(ToString::to_string).collect())
        .unwrap_or_default()
}

/// `layer2`'s `/Prim3` payloads `@layer1@</Ref/Child/GrandChild>`.
fn setup() -> (Scene, LayerId, LayerId) {
    let _ = tracing_subscriber::fmt::try_init();
    let mut scene = Scene::new();
    let layer1 = LayerBuilder::new(&mut scene, "layer1")
        .unwrap()
        .def("/Ref/Child/GrandChild/Leaf")
        .build()
        .unwrap();
    let layer2 = LayerBuilder::new(&mut scene, "layer2")
        .unwrap()
        .def("/Prim3")
        .payload("/Prim3", &["@layer1@</Ref/Child/GrandChild>"])
        .build()
        .unwrap();
    (scene, layer1, layer2)
}

#[test]
fn load_and_unload_resync_the_prim() {
    let (mut scene, _, layer2) = setup();
    let stage = scene.open_stage(layer2, StageConfig::load_none());
    let recorder = RecorderSink::new();
    scene.subscribe(stage, Box::new(recorder.clone()));
    assert!(!scene.stage(stage).is_loaded(&p("/Prim3")));
    assert_eq!(verify_stage_contents(&scene, stage, &contents(&["/Prim3"])), Ok(()));

    scene.load(stage, &p("/Prim3"));
    assert!(scene.stage(stage).is_loaded(&p("/Prim3")));
    assert_eq!(
        verify_stage_contents(&scene, stage, &contents(&["/Prim3", "/Prim3/Leaf"])),
        Ok(())
    );
    let notice = recorder.last().unwrap();
    assert_eq!(notice.resynced_paths().collect::<Vec<_>>(), vec![&p("/Prim3")]);

    scene.unload(stage, &p("/Prim3"));
    assert_eq!(verify_stage_contents(&scene, stage, &contents(&["/Prim3"])), Ok(()));
    assert_eq!(recorder.len(), 2);
}

#[test]
fn unloaded_payloads_are_not_rewritten() {
    let (mut scene, layer1, layer2) = setup();
    let stage1 = scene.open_stage(layer1, StageConfig::default());
    let stage2 = scene.open_stage(layer2, StageConfig::default());
    scene.unload(stage2, &p("/Prim3"));

    let mut editor = NamespaceEditor::new(stage1);
    editor.add_dependent_stage(stage2);
    assert!(editor.rename_prim(&scene, &p("/Ref/Child/GrandChild"), "Renamed"));
    assert!(editor.apply_edits(&mut scene));

    assert_eq!(
        editor.warnings(),
        &[EditWarning::UnloadedPayloadNotUpdated {
            stage: stage2,
            prim: p("/Prim3"),
            target: ArcTarget::external("layer1", p("/Ref/Child/GrandChild")),
        }]
    );
    assert_eq!(
        payload(&scene, layer2, "/Prim3"),
        vec!["@layer1@</Ref/Child/GrandChild>"]
    );

    scene.load(stage2, &p("/Prim3"));
    assert_eq!(verify_stage_contents(&scene, stage2, &contents(&["/Prim3"])), Ok(()));
    assert_eq!(
        scene.stage(stage2).composition_errors(),
        &[CompositionError::UnresolvedArcTarget {
            kind: ArcKind::Payload,
            site: p("/Prim3"),
            target: p("/Ref/Child/GrandChild"),
        }]
    );
}

#[test]
fn loaded_payloads_follow_the_rename() {
    let (mut scene, layer1, layer2) = setup();
    let stage1 = scene.open_stage(layer1, StageConfig::default());
    let stage2 = scene.open_stage(layer2, StageConfig::default());

    let mut editor = NamespaceEditor::new(stage1);
    editor.add_dependent_stage(stage2);
    assert!(editor.rename_prim(&scene, &p("/Ref/Child/GrandChild"), "Renamed"));
    assert!(editor.apply_edits(&mut scene));

    assert!(editor.warnings().is_empty());
    assert_eq!(
        payload(&scene, layer2, "/Prim3"),
        vec!["@layer1@</Ref/Child/Renamed>"]
    );
    assert_eq!(
        verify_stage_contents(&scene, stage2, &contents(&["/Prim3", "/Prim3/Leaf"])),
        Ok(())
    );
}
