use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::model::{CellId, CellKind, CellTree};
use crate::view::GraphView;

#[derive(Debug, Serialize)]
pub struct GeometryDump {
    pub scale: f32,
    pub translate: [f32; 2],
    pub bounds: BoundsDump,
    pub cells: Vec<CellStateDump>,
}

#[derive(Debug, Serialize)]
pub struct BoundsDump {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct CellStateDump {
    pub id: String,
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub origin: [f32; 2],
    pub absolute_offset: [f32; 2],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<[f32; 2]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_distance: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl GeometryDump {
    /// Project every live cell state in document order. `names` maps
    /// cell handles back to the scene's string ids.
    pub fn from_view(
        view: &GraphView,
        model: &CellTree,
        names: &BTreeMap<CellId, String>,
    ) -> Self {
        let bounds = view.graph_bounds();
        let mut cells = Vec::new();
        for (&id, name) in names {
            let Some(state) = view.state(id) else {
                continue;
            };
            let is_edge = model.cell(id).is_some_and(|cell| cell.kind == CellKind::Edge);
            let terminal_name = |terminal: Option<CellId>| {
                terminal.and_then(|t| names.get(&t).cloned())
            };
            cells.push(CellStateDump {
                id: name.clone(),
                kind: if is_edge { "edge" } else { "vertex" }.to_string(),
                x: state.x,
                y: state.y,
                width: state.width,
                height: state.height,
                origin: [state.origin.0, state.origin.1],
                absolute_offset: [state.absolute_offset.0, state.absolute_offset.1],
                points: state
                    .absolute_points
                    .iter()
                    .copied()
                    .flatten()
                    .map(|(x, y)| [x, y])
                    .collect(),
                segments: state.segments.clone(),
                length: is_edge.then_some(state.length),
                terminal_distance: is_edge.then_some(state.terminal_distance),
                source: terminal_name(state.visible_source),
                target: terminal_name(state.visible_target),
            });
        }
        GeometryDump {
            scale: view.scale(),
            translate: [view.translate().0, view.translate().1],
            bounds: BoundsDump {
                x: bounds.x,
                y: bounds.y,
                width: bounds.width,
                height: bounds.height,
            },
            cells,
        }
    }
}

pub fn write_geometry_dump(
    path: &Path,
    view: &GraphView,
    model: &CellTree,
    names: &BTreeMap<CellId, String>,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = GeometryDump::from_view(view, model, names);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
