//! Engine settings, loadable from JSON.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, ensure};
use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;

use crate::logging;

pub const DEFAULT_MAX_CYCLES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Upper bound on rewrite cycles per tree. Must be at least 1.
    pub max_cycles: usize,
    /// Process independent trees on the rayon thread pool in `Engine::run_all`.
    pub parallel: bool,
    /// Stderr log filter directive, e.g. `"debug"`. Applied by
    /// [`init_logging`](Self::init_logging); `None` defers to `RUST_LOG`.
    pub log_level: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig { max_cycles: DEFAULT_MAX_CYCLES, parallel: true, log_level: None }
    }
}

impl EngineConfig {
    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.max_cycles >= 1, "max_cycles must be at least 1, got {}", self.max_cycles);
        Ok(())
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(text).context("Failed to parse engine configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| {
                format!("Failed to read engine configuration from {}", path.display())
            })?;
        Self::from_json(&text)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Installs the global subscriber with this configuration's log level.
    pub fn init_logging(
        &self,
        no_color: bool,
        log_dir: Option<&Path>,
    ) -> io::Result<Option<WorkerGuard>> {
        logging::init_logger(no_color, self.log_level.as_deref(), log_dir)
    }
}
