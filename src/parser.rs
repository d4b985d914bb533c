use crate::config::Settings;
use crate::error::{RC_SUCCESS, ViewError, ViewResult};
use crate::ir::{
    CalcRule, CoreData, DEFAULT_ICON, MonitorKind, Node, NodeKind, PropRule, WEIGHT_SINCE_VERSION,
    WEIGHT_UNIT, real_check_id, source_id, split_data_point_info,
};
use crate::namespace::NamespaceLoader;
use crate::threshold::parse_thresholds;
use std::path::Path;

/// Dashboards resolve default sources into the stored check ids; editors keep what the user typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParsingMode {
    #[default]
    Editor,
    Dashboard,
}

pub struct ViewParser<'a> {
    settings: &'a dyn Settings,
    loader: &'a dyn NamespaceLoader,
    mode: ParsingMode,
}

impl<'a> ViewParser<'a> {
    pub fn new(
        settings: &'a dyn Settings,
        loader: &'a dyn NamespaceLoader,
        mode: ParsingMode,
    ) -> Self {
        Self {
            settings,
            loader,
            mode,
        }
    }

    pub fn mode(&self) -> ParsingMode {
        self.mode
    }

    pub fn parse(&self, path: &Path, data: &mut CoreData) -> ViewResult<()> {
        data.clear();
        let contents = std::fs::read_to_string(path).map_err(|source| ViewError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_document(&contents, path, data)
    }

    pub fn parse_str(&self, contents: &str, data: &mut CoreData) -> ViewResult<()> {
        data.clear();
        self.parse_document(contents, Path::new("<memory>"), data)
    }

    fn parse_document(&self, contents: &str, path: &Path, data: &mut CoreData) -> ViewResult<()> {
        let doc = roxmltree::Document::parse(contents).map_err(|err| {
            ViewError::MalformedDocument {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
        })?;
        let root = doc.root_element();
        data.monitor = MonitorKind::from_code(attr_i32(&root, "monitor"));
        data.format_version = attr_f64(&root, "compat");

        let services: Vec<roxmltree::Node> = root
            .descendants()
            .skip(1)
            .filter(|node| node.is_element() && node.has_tag_name("Service"))
            .collect();

        if data.monitor == MonitorKind::Kubernetes {
            return self.load_namespace_view(&services, data);
        }

        for element in &services {
            let node = self.read_node(element, data.format_version);
            match node.kind {
                NodeKind::ITService => self.insert_it_service_node(node, data),
                NodeKind::BusinessService | NodeKind::ExternalService => {
                    if data.cnodes.remove(&node.id).is_some() {
                        tracing::warn!(
                            id = %node.id,
                            "duplicate node id, keeping the last definition"
                        );
                    }
                    data.bpnodes.insert(node.id.clone(), node);
                }
            }
        }

        tracing::info!(
            path = %path.display(),
            business = data.bpnodes.len(),
            it_services = data.cnodes.len(),
            sources = data.sources.len(),
            "parsed view"
        );
        Ok(())
    }

    fn read_node(&self, element: &roxmltree::Node, format_version: f64) -> Node {
        let id = element.attribute("id").unwrap_or_default().trim().to_string();
        let mut node = Node::new(id, NodeKind::from_code(attr_i32(element, "type")));
        node.sev_crule = CalcRule::from_code(attr_i32(element, "statusCalcRule"));
        node.sev_prule = PropRule::from_code(attr_i32(element, "statusPropRule"));
        node.icon = child_text(element, "Icon");
        if node.icon.is_empty() {
            node.icon = DEFAULT_ICON.to_string();
        }
        node.name = child_text(element, "Name");
        node.description = child_text(element, "Description");
        node.alarm_msg = child_text(element, "AlarmMsg");
        node.notification_msg = child_text(element, "NotificationMsg");
        node.child_nodes = child_text(element, "SubServices");
        node.weight = if format_version >= WEIGHT_SINCE_VERSION {
            attr_f64(element, "weight")
        } else {
            WEIGHT_UNIT
        };
        if node.sev_crule == CalcRule::WeightedAverageWithThresholds {
            node.thresholds = parse_thresholds(&child_text(element, "Thresholds"));
        }
        node
    }

    fn insert_it_service_node(&self, mut node: Node, data: &mut CoreData) {
        let (source, data_point) = split_data_point_info(&node.child_nodes);
        let (mut source, data_point) = (source.to_string(), data_point.to_string());
        if source.is_empty() {
            source = source_id(0);
            if self.mode == ParsingMode::Dashboard {
                node.child_nodes = real_check_id(&source, &data_point);
            }
        }
        data.hosts
            .entry(source.clone())
            .or_default()
            .insert(data_point);
        data.sources.insert(source);
        if data.bpnodes.remove(&node.id).is_some() {
            tracing::warn!(id = %node.id, "duplicate node id, keeping the last definition");
        }
        data.cnodes.insert(node.id.clone(), node);
    }

    fn load_namespace_view(
        &self,
        services: &[roxmltree::Node],
        data: &mut CoreData,
    ) -> ViewResult<()> {
        let [element] = services else {
            return Err(ViewError::Structural(format!(
                "Unexpected number of nodes in Kubernetes service file: {}",
                services.len()
            )));
        };
        let source_id = element.attribute("id").unwrap_or_default().trim().to_string();
        let namespace = child_text(element, "Name");
        data.sources.insert(source_id.clone());

        let source = self
            .settings
            .load_source(&source_id)
            .ok_or_else(|| ViewError::SourceNotFound(source_id.clone()))?;

        let (messages, code) = self.loader.load_namespace_view(&source, &namespace, data);
        if code != RC_SUCCESS {
            let message = messages.into_iter().next().unwrap_or_else(|| {
                format!("Unexpected failure loading namespace {namespace}")
            });
            return Err(ViewError::NamespaceImport { code, message });
        }
        Ok(())
    }
}

/// Concatenated text of the first `tag` child, trimmed.
fn child_text(element: &roxmltree::Node, tag: &str) -> String {
    let Some(child) = element
        .children()
        .find(|node| node.is_element() && node.has_tag_name(tag))
    else {
        return String::new();
    };
    let mut text = String::new();
    for piece in child.descendants().filter(|node| node.is_text()) {
        text.push_str(piece.text().unwrap_or(""));
    }
    text.trim().to_string()
}

fn attr_i32(element: &roxmltree::Node, name: &str) -> i32 {
    element
        .attribute(name)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

fn attr_f64(element: &roxmltree::Node, name: &str) -> f64 {
    element
        .attribute(name)
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}
