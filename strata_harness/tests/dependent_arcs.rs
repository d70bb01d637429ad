// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arc rewriting across registered and unregistered dependent stages.

use pretty_assertions::assert_eq;

use strata_core::compose::CompositionError;
use strata_core::config::{EditorConfig, StageConfig};
use strata_core::edit::NamespaceEditor;
use strata_core::layer::{ArcKind, LayerId, Value, field};
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

fn arc_list(scene: &Scene, layer: LayerId, path: &str, name: &str) -> Vec<String> {
    scene
        .layer(layer)
        .field(&p(path), name)
        .and_then(Value::as_arc_list)
        .map(|op| op.all_items().map(ToString::to_string).collect())
        .unwrap_or_default()
}

fn path_list(scene: &Scene, layer: LayerId, path: &str, name: &str) -> Vec<Path> {
    scene
        .layer(layer)
        .field(&p(path), name)
        .and_then(Value::as_path_list)
        .map(|op| op.all_items().cloned().collect())
        .unwrap_or_default()
}

/// `layer1` holds `/Ref/Child/GrandChild`; `layer2` references
/// `@layer1@</Ref/Child>` from `/Prim2`.
fn child_reference() -> (Scene, LayerId, LayerId) {
    let _ = tracing_subscriber::fmt::try_init();
    let mut scene = Scene::new();
    let layer1 = LayerBuilder::new(&mut scene, "layer1")
        .unwrap()
        .def("/Ref/Child/GrandChild")
        .build()
        .unwrap();
    let layer2 = LayerBuilder::new(&mut scene, "layer2")
        .unwrap()
        .def("/Prim2")
        .references("/Prim2", &["@layer1@</Ref/Child>"])
        .build()
        .unwrap();
    (scene, layer1, layer2)
}

#[test]
fn rename_updates_references_on_registered_stages() {
    let (mut scene, layer1, layer2) = child_reference();
    let stage1 = scene.open_stage(layer1, StageConfig::default());
    let stage2 = scene.open_stage(layer2, StageConfig::default());
    let prim2 = contents(&["/Prim2", "/Prim2/GrandChild"]);
    assert_eq!(verify_stage_contents(&scene, stage2, &prim2), Ok(()));

    let mut editor = NamespaceEditor::new(stage1);
    editor.add_dependent_stage(stage2);
    assert!(editor.rename_prim(&scene, &p("/Ref/Child"), "RenamedChild"));
    assert!(editor.can_apply_edits(&scene));
    assert!(editor.apply_edits(&mut scene));

    assert_eq!(
        arc_list(&scene, layer2, "/Prim2", field::REFERENCES),
        vec!["@layer1@</Ref/RenamedChild>"]
    );
    assert_eq!(
        verify_stage_contents(
            &scene,
            stage1,
            &contents(&["/Ref", "/Ref/RenamedChild", "/Ref/RenamedChild/GrandChild"])
        ),
        Ok(())
    );
    assert_eq!(verify_stage_contents(&scene, stage2, &prim2), Ok(()));
    assert!(scene.stage(stage2).composition_errors().is_empty());
}

#[test]
fn rename_leaves_unregistered_stages_alone() {
    let (mut scene, layer1, layer2) = child_reference();
    let stage1 = scene.open_stage(layer1, StageConfig::default());
    let stage2 = scene.open_stage(layer2, StageConfig::default());

    let mut editor = NamespaceEditor::new(stage1);
    assert!(editor.rename_prim(&scene, &p("/Ref/Child"), "RenamedChild"));
    assert!(editor.apply_edits(&mut scene));

    assert_eq!(
        arc_list(&scene, layer2, "/Prim2", field::REFERENCES),
        vec!["@layer1@</Ref/Child>"]
    );
    assert_eq!(
        verify_stage_contents(&scene, stage2, &contents(&["/Prim2"])),
        Ok(())
    );
    assert_eq!(
        scene.stage(stage2).composition_errors(),
        &[CompositionError::UnresolvedArcTarget {
            kind: ArcKind::Reference,
            site: p("/Prim2"),
            target: p("/Ref/Child"),
        }]
    );
}

/// `layer1` has default prim `/Ref`, referenced internally from `/Local`.
/// `layer2` references `/Ref` both explicitly and through the default prim.
fn default_prim_references() -> (Scene, LayerId, LayerId) {
    let _ = tracing_subscriber::fmt::try_init();
    let mut scene = Scene::new();
    let layer1 = LayerBuilder::new(&mut scene, "layer1")
        .unwrap()
        .def("/Ref/Child")
        .default_prim("Ref")
        .def("/Local")
        .references("/Local", &["<>"])
        .build()
        .unwrap();
    let layer2 = LayerBuilder::new(&mut scene, "layer2")
        .unwrap()
        .def("/Prim1")
        .references("/Prim1", &["@layer1@</Ref>"])
        .def("/Prim2")
        .references("/Prim2", &["@layer1@"])
        .build()
        .unwrap();
    (scene, layer1, layer2)
}

#[test]
fn default_prim_arcs_follow_the_moved_default_prim() {
    let (mut scene, layer1, layer2) = default_prim_references();
    let stage1 = scene.open_stage(layer1, StageConfig::default());
    let stage2 = scene.open_stage(layer2, StageConfig::default());

    let mut editor = NamespaceEditor::new(stage1);
    assert!(editor.rename_prim(&scene, &p("/Ref"), "RenamedRef"));
    assert!(editor.apply_edits(&mut scene));

    assert_eq!(
        scene.layer(layer1).default_prim().as_deref(),
        Some("RenamedRef")
    );
    assert_eq!(arc_list(&scene, layer1, "/Local", field::REFERENCES), vec!["<>"]);
    assert_eq!(
        verify_stage_contents(
            &scene,
            stage1,
            &contents(&["/Local", "/Local/Child", "/RenamedRef", "/RenamedRef/Child"])
        ),
        Ok(())
    );

    // Not registered: the explicit path goes stale, the default prim arc
    // keeps resolving.
    assert_eq!(
        arc_list(&scene, layer2, "/Prim1", field::REFERENCES),
        vec!["@layer1@</Ref>"]
    );
    assert_eq!(arc_list(&scene, layer2, "/Prim2", field::REFERENCES), vec!["@layer1@"]);
    assert_eq!(
        verify_stage_contents(&scene, stage2, &contents(&["/Prim1", "/Prim2", "/Prim2/Child"])),
        Ok(())
    );
}

#[test]
fn registered_stages_rewrite_only_explicit_paths() {
    let (mut scene, layer1, layer2) = default_prim_references();
    let stage1 = scene.open_stage(layer1, StageConfig::default());
    let stage2 = scene.open_stage(layer2, StageConfig::default());

    let mut editor = NamespaceEditor::new(stage1);
    editor.add_dependent_stage(stage2);
    assert!(editor.rename_prim(&scene, &p("/Ref"), "RenamedRef"));
    assert!(editor.apply_edits(&mut scene));

    assert_eq!(
        arc_list(&scene, layer2, "/Prim1", field::REFERENCES),
        vec!["@layer1@</RenamedRef>"]
    );
    assert_eq!(arc_list(&scene, layer2, "/Prim2", field::REFERENCES), vec!["@layer1@"]);
    assert_eq!(
        verify_stage_contents(
            &scene,
            stage2,
            &contents(&["/Prim1", "/Prim1/Child", "/Prim2", "/Prim2/Child"])
        ),
        Ok(())
    );
}

#[test]
fn edits_reach_every_layer_of_the_stack() {
    let _ = tracing_subscriber::fmt::try_init();
    let mut scene = Scene::new();
    let sub = LayerBuilder::new(&mut scene, "sub")
        .unwrap()
        .def("/A/B")
        .build()
        .unwrap();
    let root = LayerBuilder::new(&mut scene, "root")
        .unwrap()
        .sublayers(&["sub"])
        .over("/A")
        .attribute("/A.x", "int")
        .build()
        .unwrap();
    let stage = scene.open_stage(root, StageConfig::default());
    assert_eq!(
        verify_stage_contents(&scene, stage, &contents(&["/A", "/A.x", "/A/B"])),
        Ok(())
    );

    let mut editor = NamespaceEditor::new(stage);
    assert!(editor.rename_prim(&scene, &p("/A"), "C"));
    assert!(editor.apply_edits(&mut scene));

    assert!(scene.layer(sub).has_spec(&p("/C/B")));
    assert!(scene.layer(root).has_spec(&p("/C.x")));
    assert!(!scene.layer(root).has_spec(&p("/A")));
    assert_eq!(
        verify_stage_contents(&scene, stage, &contents(&["/C", "/C.x", "/C/B"])),
        Ok(())
    );
}

#[test]
fn inherit_paths_follow_the_class() {
    let _ = tracing_subscriber::fmt::try_init();
    let mut scene = Scene::new();
    let layer = LayerBuilder::new(&mut scene, "layer")
        .unwrap()
        .class("/Class")
        .attribute("/Class.size", "double")
        .def("/Instance")
        .inherits("/Instance", &["/Class"])
        .build()
        .unwrap();
    let stage = scene.open_stage(layer, StageConfig::default());
    assert_eq!(
        verify_stage_contents(
            &scene,
            stage,
            &contents(&["/Class", "/Class.size", "/Instance", "/Instance.size"])
        ),
        Ok(())
    );

    let mut editor = NamespaceEditor::new(stage);
    assert!(editor.rename_prim(&scene, &p("/Class"), "Base"));
    assert!(editor.apply_edits(&mut scene));

    assert_eq!(
        path_list(&scene, layer, "/Instance", field::INHERIT_PATHS),
        vec![p("/Base")]
    );
    assert_eq!(
        verify_stage_contents(
            &scene,
            stage,
            &contents(&["/Base", "/Base.size", "/Instance", "/Instance.size"])
        ),
        Ok(())
    );
}

#[test]
fn direct_arcs_outrank_ancestral_ones() {
    let _ = tracing_subscriber::fmt::try_init();
    let mut scene = Scene::new();
    let layer = LayerBuilder::new(&mut scene, "layer")
        .unwrap()
        .class("/C")
        .def_typed("/C/Kid", "FromInherit")
        .def_typed("/R", "FromRef")
        .def("/Parent")
        .inherits("/Parent", &["/C"])
        .def("/Parent/Kid")
        .references("/Parent/Kid", &["</R>"])
        .build()
        .unwrap();
    let stage = scene.open_stage(layer, StageConfig::default());

    let kid = scene.stage(stage).prim(&p("/Parent/Kid")).unwrap();
    assert_eq!(
        kid.nodes().iter().map(|n| n.path.clone()).collect::<Vec<_>>(),
        vec![p("/Parent/Kid"), p("/R"), p("/C/Kid")]
    );
    assert_eq!(scene.stage(stage).type_name(&p("/Parent/Kid")), Some("FromRef"));
}

/// `layer2`'s `/Prim2` references `@layer1@</Ref/Child>`; `layer3`
/// references `/Prim2` and its child back out of `layer2`.
fn nested_references() -> (Scene, LayerId, LayerId, LayerId) {
    let _ = tracing_subscriber::fmt::try_init();
    let mut scene = Scene::new();
    let layer1 = LayerBuilder::new(&mut scene, "layer1")
        .unwrap()
        .def("/Ref/Child/GrandChild")
        .build()
        .unwrap();
    let layer2 = LayerBuilder::new(&mut scene, "layer2")
        .unwrap()
        .def("/Prim2")
        .references("/Prim2", &["@layer1@</Ref/Child>"])
        .over("/Prim2/GrandChild")
        .attribute("/Prim2/GrandChild.over2", "int")
        .build()
        .unwrap();
    let layer3 = LayerBuilder::new(&mut scene, "layer3")
        .unwrap()
        .def("/Prim5")
        .references("/Prim5", &["@layer2@</Prim2>"])
        .def("/Prim5_A")
        .references("/Prim5_A", &["@layer2@</Prim2/GrandChild>"])
        .build()
        .unwrap();
    (scene, layer1, layer2, layer3)
}

#[test]
fn nested_references_rewrite_the_intermediate_layer() {
    let (mut scene, layer1, layer2, layer3) = nested_references();
    let stage1 = scene.open_stage(layer1, StageConfig::default());
    let stage2 = scene.open_stage(layer2, StageConfig::default());
    let stage3 = scene.open_stage(layer3, StageConfig::default());
    let stage2_contents = contents(&["/Prim2", "/Prim2/GrandChild", "/Prim2/GrandChild.over2"]);
    let stage3_contents = contents(&[
        "/Prim5",
        "/Prim5/GrandChild",
        "/Prim5/GrandChild.over2",
        "/Prim5_A",
        "/Prim5_A.over2",
    ]);
    assert_eq!(verify_stage_contents(&scene, stage3, &stage3_contents), Ok(()));

    // Only stage3 is registered; it reaches layer1 through layer2.
    let mut editor = NamespaceEditor::new(stage1);
    editor.add_dependent_stage(stage3);
    assert!(editor.rename_prim(&scene, &p("/Ref/Child"), "RenamedChild"));
    assert!(editor.apply_edits(&mut scene));

    assert_eq!(
        arc_list(&scene, layer2, "/Prim2", field::REFERENCES),
        vec!["@layer1@</Ref/RenamedChild>"]
    );
    assert_eq!(
        arc_list(&scene, layer3, "/Prim5", field::REFERENCES),
        vec!["@layer2@</Prim2>"]
    );
    assert_eq!(
        arc_list(&scene, layer3, "/Prim5_A", field::REFERENCES),
        vec!["@layer2@</Prim2/GrandChild>"]
    );
    assert_eq!(verify_stage_contents(&scene, stage2, &stage2_contents), Ok(()));
    assert_eq!(verify_stage_contents(&scene, stage3, &stage3_contents), Ok(()));
    assert!(scene.stage(stage3).composition_errors().is_empty());
}

#[test]
fn sublayer_dependents_follow_registered_stages_only() {
    let _ = tracing_subscriber::fmt::try_init();
    let mut scene = Scene::new();
    let layer1 = LayerBuilder::new(&mut scene, "layer1")
        .unwrap()
        .def("/Ref/Child")
        .attribute("/Ref/Child.childAttr", "int")
        .build()
        .unwrap();
    let layer2 = LayerBuilder::new(&mut scene, "layer2")
        .unwrap()
        .sublayers(&["layer1"])
        .over("/Ref/Child")
        .attribute("/Ref/Child.over2", "int")
        .build()
        .unwrap();
    let layer3_sub = LayerBuilder::new(&mut scene, "layer3Sub")
        .unwrap()
        .over("/Ref/Child")
        .attribute("/Ref/Child.overSub3", "int")
        .build()
        .unwrap();
    let layer3 = LayerBuilder::new(&mut scene, "layer3")
        .unwrap()
        .sublayers(&["layer2", "layer3Sub"])
        .over("/Ref/Child")
        .attribute("/Ref/Child.over3", "int")
        .build()
        .unwrap();
    let layer4 = LayerBuilder::new(&mut scene, "layer4")
        .unwrap()
        .sublayers(&["layer3"])
        .over("/Ref/Child")
        .attribute("/Ref/Child.over4", "int")
        .build()
        .unwrap();
    let stage1 = scene.open_stage(layer1, StageConfig::default());
    let stage2 = scene.open_stage(layer2, StageConfig::default());
    let stage3 = scene.open_stage(layer3, StageConfig::default());
    let stage4 = scene.open_stage(layer4, StageConfig::default());

    let mut editor = NamespaceEditor::new(stage1);
    editor.add_dependent_stage(stage3);
    assert!(editor.rename_prim(&scene, &p("/Ref/Child"), "RenamedChild"));
    assert!(editor.apply_edits(&mut scene));

    for layer in [layer1, layer2, layer3, layer3_sub] {
        assert!(scene.layer(layer).has_spec(&p("/Ref/RenamedChild")));
        assert!(!scene.layer(layer).has_spec(&p("/Ref/Child")));
    }
    assert!(scene.layer(layer4).has_spec(&p("/Ref/Child")));
    assert!(!scene.layer(layer4).has_spec(&p("/Ref/RenamedChild")));

    assert_eq!(
        verify_stage_contents(
            &scene,
            stage2,
            &contents(&[
                "/Ref",
                "/Ref/RenamedChild",
                "/Ref/RenamedChild.childAttr",
                "/Ref/RenamedChild.over2",
            ])
        ),
        Ok(())
    );
    let renamed = [
        "/Ref",
        "/Ref/RenamedChild",
        "/Ref/RenamedChild.childAttr",
        "/Ref/RenamedChild.over2",
        "/Ref/RenamedChild.over3",
        "/Ref/RenamedChild.overSub3",
    ];
    assert_eq!(verify_stage_contents(&scene, stage3, &contents(&renamed)), Ok(()));

    // layer4 was not edited, so its opinions stay at the old path.
    let mut stage4_contents = contents(&renamed);
    stage4_contents.insert(p("/Ref/Child"));
    stage4_contents.insert(p("/Ref/Child.over4"));
    assert_eq!(verify_stage_contents(&scene, stage4, &stage4_contents), Ok(()));
}

#[test]
fn relationship_targets_are_retargeted() {
    let _ = tracing_subscriber::fmt::try_init();
    let mut scene = Scene::new();
    let layer = LayerBuilder::new(&mut scene, "layer")
        .unwrap()
        .def("/A/B")
        .def("/P")
        .relationship("/P.rel", &["/A/B", "/Other"])
        .build()
        .unwrap();
    let stage = scene.open_stage(layer, StageConfig::default());
    let recorder = RecorderSink::new();
    scene.subscribe(stage, Box::new(recorder.clone()));

    let mut editor = NamespaceEditor::new(stage);
    assert!(editor.rename_prim(&scene, &p("/A"), "Z"));
    assert!(editor.apply_edits(&mut scene));

    assert_eq!(
        path_list(&scene, layer, "/P.rel", field::TARGET_PATHS),
        vec![p("/Z/B"), p("/Other")]
    );
    let notices = recorder.take();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].changed_fields(&p("/P.rel")), ["targetPaths"]);
    assert!(notices[0].resynced_object(&p("/Z/B")));
}

#[test]
fn arcs_only_config_leaves_relationships() {
    let _ = tracing_subscriber::fmt::try_init();
    let mut scene = Scene::new();
    let layer = LayerBuilder::new(&mut scene, "layer")
        .unwrap()
        .def("/A")
        .def("/P")
        .relationship("/P.rel", &["/A"])
        .build()
        .unwrap();
    let stage = scene.open_stage(layer, StageConfig::default());

    let mut editor = NamespaceEditor::with_config(stage, EditorConfig::arcs_only());
    assert!(editor.rename_prim(&scene, &p("/A"), "Z"));
    assert!(editor.apply_edits(&mut scene));

    assert_eq!(
        path_list(&scene, layer, "/P.rel", field::TARGET_PATHS),
        vec![p("/A")]
    );
}

#[test]
fn property_edits_move_and_retarget_properties() {
    let _ = tracing_subscriber::fmt::try_init();
    let mut scene = Scene::new();
    let layer = LayerBuilder::new(&mut scene, "layer")
        .unwrap()
        .def("/A")
        .attribute("/A.x", "int")
        .def("/B")
        .relationship("/B.rel", &["/A.x"])
        .build()
        .unwrap();
    let stage = scene.open_stage(layer, StageConfig::default());
    let mut editor = NamespaceEditor::new(stage);

    assert!(editor.rename_property(&scene, &p("/A.x"), "y"));
    assert!(editor.apply_edits(&mut scene));
    assert_eq!(
        path_list(&scene, layer, "/B.rel", field::TARGET_PATHS),
        vec![p("/A.y")]
    );

    assert!(editor.reparent_property(&scene, &p("/A.y"), &p("/B")));
    assert!(editor.apply_edits(&mut scene));
    assert_eq!(
        verify_stage_contents(&scene, stage, &contents(&["/A", "/B", "/B.rel", "/B.y"])),
        Ok(())
    );

    assert!(editor.delete_property(&scene, &p("/B.y")));
    assert!(editor.apply_edits(&mut scene));
    assert_eq!(
        verify_stage_contents(&scene, stage, &contents(&["/A", "/B", "/B.rel"])),
        Ok(())
    );
    assert!(path_list(&scene, layer, "/B.rel", field::TARGET_PATHS).is_empty());
}
