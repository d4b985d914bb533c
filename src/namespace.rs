//! Namespace views built from a container orchestrator instead of per-node XML.

use crate::config::SourceInfo;
use crate::error::{RC_GENERIC_FAILURE, RC_SUCCESS};
use crate::ir::{CHILD_SEP, CoreData, Node, NodeKind, Severity, real_check_id};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

pub trait NamespaceLoader {
    /// Populates `data` with the view of `namespace`; returns messages and a status code.
    fn load_namespace_view(
        &self,
        source: &SourceInfo,
        namespace: &str,
        data: &mut CoreData,
    ) -> (Vec<String>, i32);
}

/// Rejects every namespace; used when no orchestrator backend is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNamespaceLoader;

impl NamespaceLoader for NoNamespaceLoader {
    fn load_namespace_view(
        &self,
        source: &SourceInfo,
        namespace: &str,
        _data: &mut CoreData,
    ) -> (Vec<String>, i32) {
        (
            vec![format!(
                "No namespace backend configured for source {} (namespace {namespace})",
                source.id
            )],
            RC_GENERIC_FAILURE,
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Metadata {
    name: String,
    namespace: String,
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServiceSpec {
    selector: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServiceItem {
    metadata: Metadata,
    spec: ServiceSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PodStatus {
    phase: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PodItem {
    metadata: Metadata,
    status: PodStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Snapshot {
    services: Vec<ServiceItem>,
    pods: Vec<PodItem>,
}

/// Reads a `{"services": [...], "pods": [...]}` dump located at the source's `monUrl`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SnapshotNamespaceLoader;

impl SnapshotNamespaceLoader {
    fn snapshot_path(source: &SourceInfo) -> PathBuf {
        let url = source.mon_url.trim();
        PathBuf::from(url.strip_prefix("file://").unwrap_or(url))
    }
}

impl NamespaceLoader for SnapshotNamespaceLoader {
    fn load_namespace_view(
        &self,
        source: &SourceInfo,
        namespace: &str,
        data: &mut CoreData,
    ) -> (Vec<String>, i32) {
        let path = Self::snapshot_path(source);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                return (
                    vec![format!("Failed to read namespace snapshot {}: {err}", path.display())],
                    RC_GENERIC_FAILURE,
                );
            }
        };
        let snapshot: Snapshot = match serde_json::from_str(&contents) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                return (
                    vec![format!("Invalid namespace snapshot {}: {err}", path.display())],
                    RC_GENERIC_FAILURE,
                );
            }
        };
        build_namespace_view(&snapshot, &source.id, namespace, data)
    }
}

fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}

fn phase_severity(phase: &str) -> Severity {
    match phase {
        "Running" | "Succeeded" => Severity::Normal,
        "Pending" => Severity::Minor,
        "Failed" => Severity::Critical,
        _ => Severity::Unknown,
    }
}

fn join_children(ids: &[String]) -> String {
    ids.join(&CHILD_SEP.to_string())
}

fn build_namespace_view(
    snapshot: &Snapshot,
    source_id: &str,
    namespace: &str,
    data: &mut CoreData,
) -> (Vec<String>, i32) {
    let services: Vec<&ServiceItem> = snapshot
        .services
        .iter()
        .filter(|svc| svc.metadata.namespace == namespace)
        .collect();
    let pods: Vec<&PodItem> = snapshot
        .pods
        .iter()
        .filter(|pod| pod.metadata.namespace == namespace)
        .collect();
    if services.is_empty() && pods.is_empty() {
        return (
            vec![format!("Namespace not found or empty: {namespace}")],
            RC_GENERIC_FAILURE,
        );
    }

    let ns_token = sanitize(namespace);
    let root_id = format!("ns_{ns_token}");
    let mut root_children = Vec::new();
    let mut claimed = vec![false; pods.len()];
    let pod_node_ids = pod_ids(&ns_token, &pods);

    for svc in &services {
        let svc_id = format!("svc_{ns_token}_{}", sanitize(&svc.metadata.name));
        let mut children = Vec::new();
        if !svc.spec.selector.is_empty() {
            for (idx, pod) in pods.iter().enumerate() {
                let selected = svc
                    .spec
                    .selector
                    .iter()
                    .all(|(key, value)| pod.metadata.labels.get(key) == Some(value));
                if selected {
                    claimed[idx] = true;
                    children.push(pod_node_ids[idx].clone());
                }
            }
        }
        let mut node = Node::new(svc_id.clone(), NodeKind::BusinessService);
        node.name = svc.metadata.name.clone();
        node.child_nodes = join_children(&children);
        data.bpnodes.insert(svc_id.clone(), node);
        root_children.push(svc_id);
    }

    for (idx, (pod, id)) in pods.iter().zip(pod_node_ids).enumerate() {
        if !claimed[idx] {
            root_children.push(id.clone());
        }
        let data_point = format!("{namespace}/{}", pod.metadata.name);
        let mut node = Node::new(id.clone(), NodeKind::ITService);
        node.name = pod.metadata.name.clone();
        node.child_nodes = real_check_id(source_id, &data_point);
        node.sev = phase_severity(&pod.status.phase);
        node.check.host = pod.metadata.name.clone();
        data.hosts
            .entry(source_id.to_string())
            .or_default()
            .insert(data_point);
        data.cnodes.insert(id, node);
    }

    let mut root = Node::new(root_id.clone(), NodeKind::BusinessService);
    root.name = namespace.to_string();
    root.child_nodes = join_children(&root_children);
    data.bpnodes.insert(root_id, root);
    data.sources.insert(source_id.to_string());

    tracing::info!(
        namespace,
        services = services.len(),
        pods = pods.len(),
        "loaded namespace view"
    );
    (Vec::new(), RC_SUCCESS)
}

fn pod_id(ns_token: &str, pod: &str) -> String {
    format!("pod_{ns_token}_{}", sanitize(pod))
}

/// Node ids for `pods`, in order. Names that sanitize to a taken id get a `_<n>` suffix.
fn pod_ids(ns_token: &str, pods: &[&PodItem]) -> Vec<String> {
    let mut taken = BTreeSet::new();
    pods.iter()
        .map(|pod| {
            let base = pod_id(ns_token, &pod.metadata.name);
            if taken.insert(base.clone()) {
                return base;
            }
            let mut suffix = 2;
            loop {
                let candidate = format!("{base}_{suffix}");
                if taken.insert(candidate.clone()) {
                    tracing::warn!(
                        pod = %pod.metadata.name,
                        id = %candidate,
                        "pod id collision, renaming"
                    );
                    return candidate;
                }
                suffix += 1;
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "services": [
            { "metadata": { "name": "web", "namespace": "prod" }, "spec": { "selector": { "app": "web" } } },
            { "metadata": { "name": "db", "namespace": "staging" }, "spec": { "selector": { "app": "db" } } }
        ],
        "pods": [
            { "metadata": { "name": "web-1", "namespace": "prod", "labels": { "app": "web" } }, "status": { "phase": "Running" } },
            { "metadata": { "name": "web-2", "namespace": "prod", "labels": { "app": "web" } }, "status": { "phase": "Failed" } },
            { "metadata": { "name": "batch", "namespace": "prod", "labels": { "app": "cron" } }, "status": { "phase": "Pending" } }
        ]
    }"#;

    fn load(namespace: &str) -> (CoreData, Vec<String>, i32) {
        let snapshot: Snapshot = serde_json::from_str(SNAPSHOT).unwrap();
        let mut data = CoreData::new();
        let (messages, code) = build_namespace_view(&snapshot, "Source3", namespace, &mut data);
        (data, messages, code)
    }

    #[test]
    fn builds_namespace_tree() {
        let (data, messages, code) = load("prod");
        assert_eq!(code, RC_SUCCESS);
        assert!(messages.is_empty());
        assert_eq!(data.bpnodes["ns_prod"].child_nodes, "svc_prod_web,pod_prod_batch");
        assert_eq!(
            data.bpnodes["svc_prod_web"].child_nodes,
            "pod_prod_web_1,pod_prod_web_2"
        );
        assert_eq!(data.cnodes.len(), 3);
        assert_eq!(data.cnodes["pod_prod_web_2"].sev, Severity::Critical);
        assert_eq!(data.cnodes["pod_prod_web_1"].child_nodes, "Source3:prod/web-1");
        assert!(data.hosts["Source3"].contains("prod/batch"));
        assert!(data.sources.contains("Source3"));
    }

    #[test]
    fn colliding_pod_names_get_distinct_ids() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{
                "pods": [
                    { "metadata": { "name": "web-1", "namespace": "qa" } },
                    { "metadata": { "name": "web_1", "namespace": "qa" } }
                ]
            }"#,
        )
        .unwrap();
        let mut data = CoreData::new();
        let (_, code) = build_namespace_view(&snapshot, "Source3", "qa", &mut data);
        assert_eq!(code, RC_SUCCESS);
        assert_eq!(data.cnodes.len(), 2);
        assert_eq!(data.bpnodes["ns_qa"].child_nodes, "pod_qa_web_1,pod_qa_web_1_2");
        assert_eq!(data.cnodes["pod_qa_web_1"].name, "web-1");
        assert_eq!(data.cnodes["pod_qa_web_1_2"].child_nodes, "Source3:qa/web_1");
    }

    #[test]
    fn missing_namespace_fails() {
        let (data, messages, code) = load("dev");
        assert_eq!(code, RC_GENERIC_FAILURE);
        assert!(messages[0].contains("dev"));
        assert_eq!(data.node_count(), 0);
    }

    #[test]
    fn unreadable_snapshot_reports_path() {
        let source = SourceInfo {
            id: "Source3".into(),
            mon_url: "file:///nonexistent/snapshot.json".into(),
            ..SourceInfo::default()
        };
        let mut data = CoreData::new();
        let (messages, code) =
            SnapshotNamespaceLoader.load_namespace_view(&source, "prod", &mut data);
        assert_eq!(code, RC_GENERIC_FAILURE);
        assert!(messages[0].contains("/nonexistent/snapshot.json"));
    }
}
