#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod namespace;
pub mod parser;
pub mod threshold;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, Settings, SourceInfo, load_config};
pub use error::{ViewError, ViewResult};
pub use ir::{CoreData, GraphLayout, Node, NodeKind};
pub use layout::{GraphvizEngine, LayoutEngine, load_view, process_rendering_data};
pub use parser::{ParsingMode, ViewParser};
