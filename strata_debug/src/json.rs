// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON views of layers and notices.
//!
//! [`layer_json`] renders a layer's composition-relevant contents: default
//! prim, sublayers and every authored `references`, `payload`,
//! `inheritPaths` and `specializes` list op, keyed by prim path. List ops in
//! explicit mode render as arrays; other list ops as objects with
//! `prepend`, `append` and `delete` members. Arc items use the
//! `@asset@<path>` form.

use std::fmt::Display;
use std::io::{self, Write};

use serde_json::{Map, Value as Json, json};

use strata_core::layer::{Layer, ListOp, Value, composition_fields};
use strata_core::notice::{ChangedFields, ObjectsChanged};

/// Composition fields of every prim spec in `layer`, keyed by path.
#[must_use]
pub fn composition_fields_json(layer: &Layer) -> Json {
    let mut prims = Map::new();
    for (path, fields) in composition_fields(layer) {
        let mut out = Map::new();
        for (name, value) in fields {
            out.insert(name.to_string(), value_json(value));
        }
        prims.insert(path.to_string(), Json::Object(out));
    }
    Json::Object(prims)
}

/// Layer metadata plus [`composition_fields_json`].
#[must_use]
pub fn layer_json(layer: &Layer) -> Json {
    json!({
        "identifier": layer.identifier(),
        "defaultPrim": layer.default_prim(),
        "subLayers": layer.sublayers(),
        "prims": composition_fields_json(layer),
    })
}

/// The three path sets of a notice with their changed fields.
#[must_use]
pub fn notice_json(notice: &ObjectsChanged) -> Json {
    json!({
        "stage": notice.stage().map(|s| format!("{s:?}")),
        "resynced": changed_fields_json(notice.resynced()),
        "changedInfoOnly": changed_fields_json(notice.changed_info_only()),
        "resolvedAssetPathsResynced": changed_fields_json(notice.resolved_asset_paths_resynced()),
    })
}

/// Writes [`layer_json`] to `writer`, pretty-printed.
pub fn export_layer(layer: &Layer, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &layer_json(layer))?;
    writeln!(writer)
}

fn changed_fields_json(set: &ChangedFields) -> Json {
    let map: Map<String, Json> = set
        .iter()
        .map(|(path, fields)| (path.to_string(), json!(fields)))
        .collect();
    Json::Object(map)
}

fn value_json(value: &Value) -> Json {
    match value {
        Value::References(op) | Value::Payloads(op) => list_op_json(op),
        Value::PathList(op) => list_op_json(op),
        other => Json::String(format!("{other:?}")),
    }
}

fn list_op_json<T: Display + Clone + PartialEq>(op: &ListOp<T>) -> Json {
    let items = |items: &[T]| items.iter().map(ToString::to_string).collect::<Vec<_>>();
    if op.is_explicit() {
        return json!(items(op.explicit_items()));
    }
    let mut out = Map::new();
    for (name, list) in [
        ("delete", op.deleted_items()),
        ("prepend", op.prepended_items()),
        ("append", op.appended_items()),
    ] {
        if !list.is_empty() {
            out.insert(name.into(), json!(items(list)));
        }
    }
    Json::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::layer::{ArcTarget, Specifier, field};
    use strata_core::path::Path;

    fn p(s: &str) -> Path {
        s.parse().unwrap()
    }

    #[test]
    fn layer_json_shape() {
        let mut layer = Layer::new("layer2");
        layer
            .create_prim_spec(&p("/Prim1"), Specifier::Def, "")
            .unwrap();
        layer
            .set_references(
                &p("/Prim1"),
                vec![
                    ArcTarget::external("layer1", p("/Ref")),
                    ArcTarget::default_prim("layer1"),
                ],
            )
            .unwrap();
        layer
            .set_field(
                &p("/Prim1"),
                field::INHERIT_PATHS,
                Value::PathList(ListOp::prepended(vec![p("/Class")])),
            )
            .unwrap();
        layer.set_default_prim("Prim1").unwrap();

        let value = layer_json(&layer);
        assert_eq!(
            value,
            json!({
                "identifier": "layer2",
                "defaultPrim": "Prim1",
                "subLayers": [],
                "prims": {
                    "/Prim1": {
                        "inheritPaths": { "prepend": ["/Class"] },
                        "references": ["@layer1@</Ref>", "@layer1@"],
                    }
                }
            })
        );
    }

    #[test]
    fn export_writes_valid_json() {
        let layer = Layer::new("empty");
        let mut buf = Vec::new();
        export_layer(&layer, &mut buf).unwrap();
        let parsed: Json = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["identifier"], "empty");
        assert_eq!(parsed["prims"], json!({}));
    }
}
