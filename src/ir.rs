use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_ICON: &str = "Business Process";
pub const WEIGHT_UNIT: f64 = 1.0;
pub const CHILD_SEP: char = ',';
pub const SOURCE_SEP: char = ':';

/// Format version from which the `weight` attribute is honoured.
pub const WEIGHT_SINCE_VERSION: f64 = 3.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    BusinessService,
    ITService,
    ExternalService,
}

impl NodeKind {
    /// Unknown codes fall back to a business service.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::ITService,
            2 => Self::ExternalService,
            _ => Self::BusinessService,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::BusinessService => 0,
            Self::ITService => 1,
            Self::ExternalService => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Normal,
    Minor,
    Major,
    Critical,
    Unknown,
}

impl Severity {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Normal),
            1 => Some(Self::Minor),
            2 => Some(Self::Major),
            3 => Some(Self::Critical),
            4 => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Normal => 0,
            Self::Minor => 1,
            Self::Major => 2,
            Self::Critical => 3,
            Self::Unknown => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcRule {
    Worst,
    Average,
    WeightedAverageWithThresholds,
    Unknown(i32),
}

impl CalcRule {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Worst,
            1 => Self::Average,
            2 => Self::WeightedAverageWithThresholds,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropRule {
    Unchanged,
    Decreased,
    Increased,
    Unknown(i32),
}

impl PropRule {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Unchanged,
            1 => Self::Decreased,
            2 => Self::Increased,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorKind {
    Auto,
    Nagios,
    Zabbix,
    Zenoss,
    Pandora,
    OpManager,
    Kubernetes,
    Unknown(i32),
}

impl MonitorKind {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Auto,
            1 => Self::Nagios,
            2 => Self::Zabbix,
            3 => Self::Zenoss,
            4 => Self::Pandora,
            5 => Self::OpManager,
            6 => Self::Kubernetes,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphLayout {
    Dot,
    #[default]
    Neato,
}

impl GraphLayout {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "dot" => Some(Self::Dot),
            "neato" => Some(Self::Neato),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::Neato => "neato",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Visibility(u8);

impl Visibility {
    pub const HIDDEN: Self = Self(0);
    pub const VISIBLE: Self = Self(0x1);
    pub const EXPANDED: Self = Self(0x2);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Visibility {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub weight: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckStatus {
    /// `-1` until a monitoring backend reports.
    pub status: i32,
    pub host: String,
    pub last_state_change: String,
    pub alarm_msg: String,
}

impl Default for CheckStatus {
    fn default() -> Self {
        Self {
            status: -1,
            host: String::new(),
            last_state_change: String::new(),
            alarm_msg: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub alarm_msg: String,
    pub notification_msg: String,
    pub child_nodes: String,
    pub weight: f64,
    pub sev_crule: CalcRule,
    pub sev_prule: PropRule,
    pub thresholds: Vec<Threshold>,
    pub parent: String,
    pub visibility: Visibility,
    pub pos_x: f64,
    pub pos_y: f64,
    pub text_w: f64,
    pub text_h: f64,
    pub sev: Severity,
    pub sev_prop: Severity,
    pub check: CheckStatus,
    pub monitored: bool,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            name: String::new(),
            icon: DEFAULT_ICON.to_string(),
            description: String::new(),
            alarm_msg: String::new(),
            notification_msg: String::new(),
            child_nodes: String::new(),
            weight: WEIGHT_UNIT,
            sev_crule: CalcRule::Worst,
            sev_prule: PropRule::Unchanged,
            thresholds: Vec::new(),
            parent: String::new(),
            visibility: Visibility::HIDDEN,
            pos_x: 0.0,
            pos_y: 0.0,
            text_w: 0.0,
            text_h: 0.0,
            sev: Severity::Unknown,
            sev_prop: Severity::Unknown,
            check: CheckStatus::default(),
            monitored: false,
        }
    }

    /// Child ids listed in `child_nodes`, skipping blanks.
    pub fn child_ids(&self) -> impl Iterator<Item = &str> {
        self.child_nodes
            .split(CHILD_SEP)
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Result of loading one view.
#[derive(Debug, Clone)]
pub struct CoreData {
    pub bpnodes: BTreeMap<String, Node>,
    pub cnodes: BTreeMap<String, Node>,
    pub sources: BTreeSet<String>,
    pub hosts: BTreeMap<String, BTreeSet<String>>,
    pub monitor: MonitorKind,
    pub format_version: f64,
    pub graph_layout: GraphLayout,
    pub map_width: f64,
    pub map_height: f64,
    pub min_x: f64,
    pub min_y: f64,
    /// Parent to child pairs in layout order; a parent may repeat.
    pub edges: Vec<(String, String)>,
}

impl CoreData {
    pub fn new() -> Self {
        Self {
            bpnodes: BTreeMap::new(),
            cnodes: BTreeMap::new(),
            sources: BTreeSet::new(),
            hosts: BTreeMap::new(),
            monitor: MonitorKind::Auto,
            format_version: 0.0,
            graph_layout: GraphLayout::default(),
            map_width: 0.0,
            map_height: 0.0,
            min_x: 0.0,
            min_y: 0.0,
            edges: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.bpnodes.get(id).or_else(|| self.cnodes.get(id))
    }

    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut Node> {
        match self.bpnodes.get_mut(id) {
            Some(node) => Some(node),
            None => self.cnodes.get_mut(id),
        }
    }

    pub fn node_count(&self) -> usize {
        self.bpnodes.len() + self.cnodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.bpnodes.values().chain(self.cnodes.values())
    }

    pub fn children_of<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |(from, _)| from == parent)
            .map(|(_, to)| to.as_str())
    }
}

impl Default for CoreData {
    fn default() -> Self {
        Self::new()
    }
}

pub fn source_id(index: usize) -> String {
    format!("Source{index}")
}

/// Splits `source:datapoint` at the first separator; no separator means no source.
pub fn split_data_point_info(info: &str) -> (&str, &str) {
    match info.split_once(SOURCE_SEP) {
        Some((source, data_point)) => (source.trim(), data_point.trim()),
        None => ("", info.trim()),
    }
}

pub fn real_check_id(source: &str, data_point: &str) -> String {
    format!("{source}{SOURCE_SEP}{data_point}")
}
