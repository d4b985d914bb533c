use crate::config::LayoutConfig;
use crate::error::{ViewError, ViewResult};
use crate::ir::GraphLayout;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Computes node coordinates for a Graphviz description, writing `-Tplain` output to `output`.
pub trait LayoutEngine {
    fn run(&self, layout: GraphLayout, description: &Path, output: &Path) -> ViewResult<()>;
}

/// Runs `dot` or `neato` as a subprocess.
#[derive(Debug, Clone)]
pub struct GraphvizEngine {
    dot_binary: String,
    neato_binary: String,
    timeout: Duration,
}

impl GraphvizEngine {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            dot_binary: config.binary(GraphLayout::Dot).to_string(),
            neato_binary: config.binary(GraphLayout::Neato).to_string(),
            timeout: config.timeout,
        }
    }

    fn binary(&self, layout: GraphLayout) -> &str {
        match layout {
            GraphLayout::Dot => &self.dot_binary,
            GraphLayout::Neato => &self.neato_binary,
        }
    }
}

impl LayoutEngine for GraphvizEngine {
    fn run(&self, layout: GraphLayout, description: &Path, output: &Path) -> ViewResult<()> {
        let binary = self.binary(layout);
        let engine_error = |reason: String| ViewError::LayoutEngine {
            path: description.to_path_buf(),
            reason,
        };

        tracing::info!(engine = binary, input = %description.display(), "running layout engine");
        let mut child = Command::new(binary)
            .arg("-Tplain")
            .arg("-o")
            .arg(output)
            .arg(description)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|err| engine_error(format!("failed to start {binary}: {err}")))?;

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(engine_error(format!(
                        "timed out after {}s",
                        self.timeout.as_secs()
                    )));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(err) => return Err(engine_error(format!("wait failed: {err}"))),
            }
        };

        if !status.success() {
            let code = status
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(engine_error(format!("code: {code}")));
        }
        Ok(())
    }
}
