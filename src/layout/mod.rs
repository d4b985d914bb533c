pub mod dot;
pub mod engine;
pub mod plain;

pub use dot::{GraphDescription, escape_id, escape_label, fixup_graph};
pub use engine::{GraphvizEngine, LayoutEngine};
pub use plain::{apply_plain_layout, apply_plain_layout_file, read_plain_layout};

use crate::config::{Config, LayoutConfig, Settings};
use crate::error::{ViewError, ViewResult};
use crate::ir::CoreData;
use crate::namespace::NamespaceLoader;
use crate::parser::{ParsingMode, ViewParser};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};

/// Writes the description to a fresh `svcmap-gen-<time>-<random>.dot` file under `dir`.
///
/// The file is deleted when the returned handle is dropped.
pub fn write_description(description: &GraphDescription, dir: &Path) -> ViewResult<NamedTempFile> {
    let stamp = chrono::Local::now().format("%H%M%S%3f");
    let mut file = tempfile::Builder::new()
        .prefix(&format!("svcmap-gen-{stamp}-"))
        .suffix(".dot")
        .tempfile_in(dir)
        .map_err(|source| ViewError::DescriptionWrite {
            path: dir.to_path_buf(),
            source,
        })?;
    file.write_all(description.to_dot().as_bytes())
        .and_then(|()| file.flush())
        .map_err(|source| ViewError::DescriptionWrite {
            path: file.path().to_path_buf(),
            source,
        })?;
    Ok(file)
}

/// Companion `<description>.plain` path, deleted on drop unless kept.
fn plain_output_for(description: &Path) -> TempPath {
    let mut name = description.as_os_str().to_owned();
    name.push(".plain");
    TempPath::from_path(PathBuf::from(name))
}

/// Resolves dependencies, runs the layout engine and stores coordinates and map geometry.
///
/// `settings` picks the engine; `config` supplies binaries, scale factors and borders.
/// The description file is always removed; the plain output is left on disk when the run fails.
pub fn process_rendering_data(
    data: &mut CoreData,
    settings: &dyn Settings,
    config: &LayoutConfig,
    engine: &dyn LayoutEngine,
) -> ViewResult<()> {
    let description = fixup_graph(data);
    let dot_file = write_description(&description, &config.temp_dir)?;
    let plain_file = plain_output_for(dot_file.path());
    let layout = settings.graph_layout();

    let result = engine
        .run(layout, dot_file.path(), &plain_file)
        .and_then(|()| apply_plain_layout_file(data, &plain_file, layout, config, &description));

    if let Err(err) = &result {
        match plain_file.keep() {
            Ok(path) if path.exists() => {
                tracing::warn!(path = %path.display(), %err, "keeping layout output");
            }
            Ok(_) => {}
            Err(keep_err) => tracing::debug!(%keep_err, "could not keep layout output"),
        }
    }
    result
}

/// Parses a view file and lays it out in one go.
pub fn load_view(
    path: &Path,
    config: &Config,
    mode: ParsingMode,
    loader: &dyn NamespaceLoader,
    engine: &dyn LayoutEngine,
) -> ViewResult<CoreData> {
    let mut data = CoreData::new();
    ViewParser::new(config, loader, mode).parse(path, &mut data)?;
    process_rendering_data(&mut data, config, &config.layout, engine)?;
    Ok(data)
}
