use crate::config::load_config;
use crate::ir::{CoreData, GraphLayout};
use crate::layout::{GraphvizEngine, process_rendering_data};
use crate::layout_dump::write_layout_dump;
use crate::namespace::SnapshotNamespaceLoader;
use crate::parser::{ParsingMode, ViewParser};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "svcmap", version, about = "Parse a service view and lay it out with Graphviz")]
pub struct Args {
    /// View file (XML)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// JSON dump of the laid out view. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file (sources, layout engine)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Layout engine, overrides the config file
    #[arg(short = 'l', long = "layout", value_enum)]
    pub layout: Option<LayoutArg>,

    /// Resolve default sources into check ids like the dashboard does
    #[arg(long = "dashboard")]
    pub dashboard: bool,

    /// Stop after parsing
    #[arg(long = "no-layout")]
    pub no_layout: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum LayoutArg {
    Dot,
    Neato,
}

impl From<LayoutArg> for GraphLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Dot => GraphLayout::Dot,
            LayoutArg::Neato => GraphLayout::Neato,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(layout) = args.layout {
        config.layout.graph_layout = layout.into();
    }
    let mode = if args.dashboard {
        ParsingMode::Dashboard
    } else {
        ParsingMode::Editor
    };

    let mut data = CoreData::new();
    let parser = ViewParser::new(&config, &SnapshotNamespaceLoader, mode);
    tracing::info!(input = %args.input.display(), mode = ?parser.mode(), "parsing view");
    parser.parse(&args.input, &mut data)?;
    if !args.no_layout {
        let engine = GraphvizEngine::new(&config.layout);
        process_rendering_data(&mut data, &config, &config.layout, &engine)?;
    }

    write_layout_dump(args.output.as_deref(), &data)
}
