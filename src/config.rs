use crate::ir::GraphLayout;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Connection settings of one monitoring backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceInfo {
    pub id: String,
    pub monitor_type: i32,
    pub mon_url: String,
    pub verify_ssl_peer: bool,
    pub auth_string: String,
}

/// Per-axis factors applied to Graphviz plain coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactors {
    pub fn for_layout(layout: GraphLayout) -> Self {
        match layout {
            GraphLayout::Dot => Self { x: 72.0, y: 100.0 },
            GraphLayout::Neato => Self { x: 90.0, y: 90.0 },
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub graph_layout: GraphLayout,
    pub dot_binary: String,
    pub neato_binary: String,
    pub timeout: Duration,
    pub temp_dir: PathBuf,
    pub dot_scale: ScaleFactors,
    pub neato_scale: ScaleFactors,
    /// Horizontal margin added around the map.
    pub border_width: f64,
    pub border_height: f64,
    /// Fraction of the widest label neato coordinates are pulled out by.
    pub neato_anchor_ratio: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            graph_layout: GraphLayout::default(),
            dot_binary: "dot".to_string(),
            neato_binary: "neato".to_string(),
            timeout: Duration::from_secs(60),
            temp_dir: std::env::temp_dir(),
            dot_scale: ScaleFactors::for_layout(GraphLayout::Dot),
            neato_scale: ScaleFactors::for_layout(GraphLayout::Neato),
            border_width: 200.0,
            border_height: 50.0,
            neato_anchor_ratio: 0.6,
        }
    }
}

impl LayoutConfig {
    pub fn binary(&self, layout: GraphLayout) -> &str {
        match layout {
            GraphLayout::Dot => &self.dot_binary,
            GraphLayout::Neato => &self.neato_binary,
        }
    }

    pub fn scale(&self, layout: GraphLayout) -> ScaleFactors {
        match layout {
            GraphLayout::Dot => self.dot_scale,
            GraphLayout::Neato => self.neato_scale,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub sources: BTreeMap<String, SourceInfo>,
}

/// What the view parser needs to know about the running installation.
pub trait Settings {
    fn load_source(&self, source_id: &str) -> Option<SourceInfo>;
    fn graph_layout(&self) -> GraphLayout;
}

impl Settings for Config {
    fn load_source(&self, source_id: &str) -> Option<SourceInfo> {
        self.sources.get(source_id).cloned()
    }

    fn graph_layout(&self) -> GraphLayout {
        self.layout.graph_layout
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    dot_binary: Option<String>,
    neato_binary: Option<String>,
    timeout_secs: Option<u64>,
    temp_dir: Option<PathBuf>,
    dot_scale: Option<[f64; 2]>,
    neato_scale: Option<[f64; 2]>,
    border_width: Option<f64>,
    border_height: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    graph_layout: Option<String>,
    layout: Option<LayoutConfigFile>,
    sources: Option<BTreeMap<String, SourceInfo>>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = match serde_json::from_str(&contents) {
        Ok(parsed) => parsed,
        Err(json_err) => json5::from_str(&contents)
            .map_err(|_| anyhow::anyhow!("invalid config {}: {json_err}", path.display()))?,
    };

    if let Some(name) = parsed.graph_layout.as_deref() {
        config.layout.graph_layout = GraphLayout::from_token(name)
            .ok_or_else(|| anyhow::anyhow!("unknown graph layout '{name}'"))?;
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.dot_binary {
            config.layout.dot_binary = v;
        }
        if let Some(v) = layout.neato_binary {
            config.layout.neato_binary = v;
        }
        if let Some(v) = layout.timeout_secs {
            config.layout.timeout = Duration::from_secs(v);
        }
        if let Some(v) = layout.temp_dir {
            config.layout.temp_dir = v;
        }
        if let Some([x, y]) = layout.dot_scale {
            config.layout.dot_scale = ScaleFactors { x, y };
        }
        if let Some([x, y]) = layout.neato_scale {
            config.layout.neato_scale = ScaleFactors { x, y };
        }
        if let Some(v) = layout.border_width {
            config.layout.border_width = v;
        }
        if let Some(v) = layout.border_height {
            config.layout.border_height = v;
        }
    }

    if let Some(sources) = parsed.sources {
        for (id, mut info) in sources {
            if info.id.is_empty() {
                info.id = id.clone();
            }
            config.sources.insert(id, info);
        }
    }

    Ok(config)
}
