use crate::ir::{CoreData, Node, NodeKind, Visibility};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub monitor: String,
    pub format_version: f64,
    pub graph_layout: String,
    pub map_width: f64,
    pub map_height: f64,
    pub min_x: f64,
    pub min_y: f64,
    pub sources: Vec<String>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub kind: String,
    /// Node type code as stored in view files.
    pub kind_code: i32,
    pub name: String,
    pub icon: String,
    pub parent: Option<String>,
    pub child_nodes: String,
    pub weight: f64,
    pub x: f64,
    pub y: f64,
    pub text_width: f64,
    pub text_height: f64,
    pub visible: bool,
    pub expanded: bool,
    pub thresholds: Vec<[f64; 2]>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
}

impl NodeDump {
    fn from_node(node: &Node) -> Self {
        let kind = match node.kind {
            NodeKind::BusinessService => "business",
            NodeKind::ITService => "itService",
            NodeKind::ExternalService => "external",
        };
        NodeDump {
            id: node.id.clone(),
            kind: kind.to_string(),
            kind_code: node.kind.code(),
            name: node.name.clone(),
            icon: node.icon.clone(),
            parent: (!node.parent.is_empty()).then(|| node.parent.clone()),
            child_nodes: node.child_nodes.clone(),
            weight: node.weight,
            x: node.pos_x,
            y: node.pos_y,
            text_width: node.text_w,
            text_height: node.text_h,
            visible: node.visibility.contains(Visibility::VISIBLE),
            expanded: node.visibility.contains(Visibility::EXPANDED),
            thresholds: node
                .thresholds
                .iter()
                .map(|t| [t.weight, f64::from(t.severity.code())])
                .collect(),
        }
    }
}

impl LayoutDump {
    pub fn from_data(data: &CoreData) -> Self {
        LayoutDump {
            monitor: format!("{:?}", data.monitor),
            format_version: data.format_version,
            graph_layout: data.graph_layout.as_str().to_string(),
            map_width: data.map_width,
            map_height: data.map_height,
            min_x: data.min_x,
            min_y: data.min_y,
            sources: data.sources.iter().cloned().collect(),
            nodes: data.nodes().map(NodeDump::from_node).collect(),
            edges: data
                .edges
                .iter()
                .map(|(from, to)| EdgeDump {
                    from: from.clone(),
                    to: to.clone(),
                })
                .collect(),
        }
    }
}

/// Writes the dump as pretty JSON to `path`, or stdout when `None`.
pub fn write_layout_dump(path: Option<&Path>, data: &CoreData) -> anyhow::Result<()> {
    let dump = LayoutDump::from_data(data);
    match path {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &dump)?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}
