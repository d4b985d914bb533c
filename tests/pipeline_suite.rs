use std::path::{Path, PathBuf};

use svcmap::config::{Config, LayoutConfig, SourceInfo};
use svcmap::ir::{CoreData, GraphLayout, NodeKind, Visibility};
use svcmap::layout::{GraphvizEngine, LayoutEngine, process_rendering_data};
use svcmap::namespace::{NoNamespaceLoader, SnapshotNamespaceLoader};
use svcmap::{ParsingMode, ViewError, ViewParser, ViewResult, load_view};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn parse_fixture(name: &str, mode: ParsingMode) -> ViewResult<CoreData> {
    let config = Config::default();
    let parser = ViewParser::new(&config, &NoNamespaceLoader, mode);
    let mut data = CoreData::new();
    parser.parse(&fixture(name), &mut data)?;
    Ok(data)
}

/// Lays nodes out on a line in description order, echoing every edge.
struct LineEngine;

impl LayoutEngine for LineEngine {
    fn run(&self, _layout: GraphLayout, description: &Path, output: &Path) -> ViewResult<()> {
        let dot = std::fs::read_to_string(description).expect("description readable");
        let mut ids = Vec::new();
        let mut edges = Vec::new();
        for line in dot.lines().map(str::trim) {
            if let Some((id, _)) = line.split_once("[label=") {
                ids.push(id.to_string());
            } else if let Some((from, to)) = line.split_once("--") {
                edges.push((from.to_string(), to.to_string()));
            }
        }
        let mut plain = format!("graph 1 {} 3\n", ids.len() + 1);
        for (idx, id) in ids.iter().enumerate() {
            plain.push_str(&format!(
                "node {id} {} 1.5 0.75 0.5 {id} solid plaintext black lightgrey\n",
                idx + 1
            ));
        }
        for (from, to) in &edges {
            plain.push_str(&format!("edge {from} {to} 4 0 0 1 1 2 2 3 3 solid black\n"));
        }
        plain.push_str("stop\n");
        std::fs::write(output, plain).expect("plain writable");
        Ok(())
    }
}

struct GarbageEngine;

impl LayoutEngine for GarbageEngine {
    fn run(&self, _layout: GraphLayout, _description: &Path, output: &Path) -> ViewResult<()> {
        std::fs::write(output, "not a layout\n").expect("plain writable");
        Ok(())
    }
}

fn config_in(dir: &Path, layout: GraphLayout) -> Config {
    Config {
        layout: LayoutConfig {
            temp_dir: dir.to_path_buf(),
            graph_layout: layout,
            ..LayoutConfig::default()
        },
        ..Config::default()
    }
}

#[test]
fn basic_view_links_leaf_to_business_node() {
    let mut data = parse_fixture("basic.ms.xml", ParsingMode::Editor).expect("parse failed");
    let b = &data.cnodes["B"];
    assert_eq!(b.kind, NodeKind::ITService);
    assert!(data.sources.contains("src1"));
    assert!(data.hosts["src1"].contains("cpu.load"));

    let description = svcmap::layout::fixup_graph(&mut data);
    assert_eq!(data.cnodes["B"].parent, "A");
    assert_eq!(description.edges, vec!["\tA--B\n".to_string()]);
}

#[test]
fn enterprise_view_lays_out_every_node() {
    let dir = tempfile::tempdir().unwrap();
    let mut data =
        parse_fixture("enterprise.ms.xml", ParsingMode::Dashboard).expect("parse failed");
    assert_eq!(data.bpnodes.len(), 4);
    assert_eq!(data.cnodes.len(), 4);
    assert_eq!(
        data.sources.iter().cloned().collect::<Vec<_>>(),
        vec!["Source0", "Source1", "Source2"]
    );
    assert_eq!(data.cnodes["cache01"].child_nodes, "Source0:cache01/redis");
    let weights: Vec<f64> = data.bpnodes["root"].thresholds.iter().map(|t| t.weight).collect();
    assert_eq!(weights, vec![0.2, 0.5, 0.9]);

    let config = config_in(dir.path(), GraphLayout::Dot);
    process_rendering_data(&mut data, &config, &config.layout, &LineEngine).expect("layout failed");

    for node in data.nodes() {
        assert!(node.pos_x.is_finite() && node.pos_y.is_finite(), "{}", node.id);
        assert!(node.pos_x > 0.0, "{} was not positioned", node.id);
        assert!(node.visibility.contains(Visibility::VISIBLE));
    }
    assert_eq!(data.cnodes["web01 http"].parent, "web-tier");
    assert_eq!(data.bpnodes["payment"].parent, "root");
    assert!(data.edges.contains(&("web-tier".to_string(), "web01 http".to_string())));
    assert!(!data.edges.iter().any(|(from, _)| from == "payment"));
    assert!(!data.edges.iter().any(|(_, to)| to == "ghost"));
    assert_eq!(data.edges.len(), 7);
    assert!(data.find_node("ghost").is_none());

    assert_eq!(data.min_x, 200.0);
    assert_eq!(data.min_y, 50.0);
    assert_eq!(data.map_width, 9.0 * 72.0 + 200.0);
    assert_eq!(data.map_height, 3.0 * 100.0 + 50.0);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn failed_layout_keeps_plain_output_for_inspection() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = parse_fixture("basic.ms.xml", ParsingMode::Editor).unwrap();
    let config = config_in(dir.path(), GraphLayout::Neato);
    let err =
        process_rendering_data(&mut data, &config, &config.layout, &GarbageEngine).unwrap_err();
    assert!(matches!(err, ViewError::InvalidLayoutFormat(_)));
    let left: Vec<PathBuf> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(left.len(), 1);
    assert!(left[0].to_string_lossy().ends_with(".dot.plain"));
}

#[test]
fn kubernetes_view_with_two_services_is_structural_error() {
    let err = parse_fixture("k8s_two_services.ms.xml", ParsingMode::Dashboard).unwrap_err();
    assert!(matches!(err, ViewError::Structural(_)));
    assert!(err.to_string().contains('2'));
}

#[test]
fn kubernetes_view_imports_namespace_snapshot() {
    let mut config = Config::default();
    config.sources.insert(
        "Source1".into(),
        SourceInfo {
            id: "Source1".into(),
            monitor_type: 6,
            mon_url: format!("file://{}", fixture("k8s_snapshot.json").display()),
            ..SourceInfo::default()
        },
    );
    let parser = ViewParser::new(&config, &SnapshotNamespaceLoader, ParsingMode::Dashboard);
    let mut data = CoreData::new();
    parser.parse(&fixture("k8s.ms.xml"), &mut data).expect("namespace import failed");

    assert_eq!(
        data.bpnodes["ns_prod"].child_nodes,
        "svc_prod_frontend,svc_prod_api,pod_prod_api_55c2"
    );
    assert_eq!(data.bpnodes["svc_prod_api"].child_nodes, "pod_prod_api_55c1");
    assert_eq!(data.cnodes.len(), 3);
    assert!(data.sources.contains("Source1"));

    let dir = tempfile::tempdir().unwrap();
    config.layout.temp_dir = dir.path().to_path_buf();
    process_rendering_data(&mut data, &config, &config.layout, &LineEngine).expect("layout failed");
    assert_eq!(data.cnodes["pod_prod_api_55c2"].parent, "ns_prod");
}

#[test]
fn malformed_fixture_is_rejected() {
    let err = parse_fixture("malformed.ms.xml", ParsingMode::Editor).unwrap_err();
    assert!(matches!(err, ViewError::MalformedDocument { .. }));
}

#[test]
fn load_view_chains_parse_and_layout() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), GraphLayout::Dot);
    let data = load_view(
        &fixture("basic.ms.xml"),
        &config,
        ParsingMode::Editor,
        &NoNamespaceLoader,
        &LineEngine,
    )
    .expect("load failed");
    assert_eq!(data.edges, vec![("A".to_string(), "B".to_string())]);
    assert_eq!(data.graph_layout, GraphLayout::Dot);
}

#[test]
fn graphviz_engine_when_installed() {
    let available = std::process::Command::new("dot")
        .arg("-V")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false);
    if !available {
        eprintln!("dot not installed, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), GraphLayout::Dot);
    let engine = GraphvizEngine::new(&config.layout);
    let mut data = parse_fixture("enterprise.ms.xml", ParsingMode::Dashboard).unwrap();
    process_rendering_data(&mut data, &config, &config.layout, &engine).expect("dot failed");
    assert!(data.nodes().all(|n| n.text_w > 0.0));
    assert_eq!(data.edges.len(), 7);
    assert!(data.map_width > data.min_x);
}
