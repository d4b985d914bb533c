use crate::ir::{CoreData, NodeKind, Visibility};
use std::collections::BTreeMap;

/// Graphviz statements derived from a view, plus the escaped ids that need mapping back.
#[derive(Debug, Default, Clone)]
pub struct GraphDescription {
    pub labels: Vec<String>,
    pub edges: Vec<String>,
    /// Escaped graph id to view id, only for ids the escaping changed.
    pub aliases: BTreeMap<String, String>,
}

impl GraphDescription {
    fn graph_id(&mut self, id: &str) -> String {
        let escaped = escape_id(id);
        if escaped != id {
            match self.aliases.get(&escaped) {
                Some(existing) if existing != id => {
                    tracing::debug!(
                        id,
                        existing = %existing,
                        escaped = %escaped,
                        "escaped ids collide"
                    );
                }
                Some(_) => {}
                None => {
                    self.aliases.insert(escaped.clone(), id.to_string());
                }
            }
        }
        escaped
    }

    pub fn add_label(&mut self, id: &str, label: &str) {
        let graph_id = self.graph_id(id);
        self.labels
            .push(format!("\t{}[label=\"{}\"];\n", graph_id, escape_label(label)));
    }

    pub fn add_edge(&mut self, parent: &str, child: &str) {
        let parent = self.graph_id(parent);
        let child = self.graph_id(child);
        self.edges.push(format!("\t{parent}--{child}\n"));
    }

    /// Maps an escaped graph id back to the view id it was derived from.
    ///
    /// Ids that escaping left alone come back unchanged.
    pub fn resolve<'a>(&'a self, graph_id: &'a str) -> &'a str {
        self.aliases
            .get(graph_id)
            .map(String::as_str)
            .unwrap_or(graph_id)
    }

    pub fn to_dot(&self) -> String {
        let mut out = String::from("strict graph\n{\n node[shape=plaintext]\n");
        for label in &self.labels {
            out.push_str(label);
        }
        out.push('\n');
        for edge in &self.edges {
            out.push_str(edge);
        }
        out.push('}');
        out
    }
}

pub fn escape_id(id: &str) -> String {
    id.chars()
        .map(|ch| match ch {
            '\'' | '"' | '-' | ' ' | '#' => '_',
            other => other,
        })
        .collect()
}

pub fn escape_label(label: &str) -> String {
    label
        .chars()
        .map(|ch| match ch {
            '\'' | '-' | '"' | ' ' => '#',
            ';' | '&' | '$' => '_',
            other => other,
        })
        .collect()
}

/// Marks nodes visible, resolves parent links from child lists and collects the graph statements.
///
/// A child referenced by several parents keeps the last parent seen. Missing children are
/// logged and dropped.
pub fn fixup_graph(data: &mut CoreData) -> GraphDescription {
    let mut description = GraphDescription::default();
    let mut links: Vec<(String, String)> = Vec::new();

    for node in data.bpnodes.values_mut() {
        node.visibility = Visibility::VISIBLE | Visibility::EXPANDED;
        description.add_label(&node.id, &node.name);
        match node.kind {
            NodeKind::ExternalService => continue,
            NodeKind::BusinessService | NodeKind::ITService => {}
        }
        for child in node.child_ids() {
            links.push((node.id.clone(), child.to_string()));
        }
    }

    for (parent, child) in links {
        match data.find_node_mut(&child) {
            Some(node) => {
                node.parent = parent.clone();
                description.add_edge(&parent, &node.id);
            }
            None => {
                tracing::debug!(
                    parent = %parent,
                    child = %child,
                    "failed to find parent-child dependency"
                );
            }
        }
    }

    for node in data.cnodes.values_mut() {
        node.visibility = Visibility::VISIBLE;
        description.add_label(&node.id, &node.name);
    }

    description
}
