use imo_engine::EngineConfig;
use imo_logger::LogSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_STORE_PATH: &str = ".imo/store.json";

/// Full configuration file of the tool: engine keys at the top level plus `[log]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    #[serde(flatten)]
    pub engine: EngineConfig,
    pub log: LogSettings,
    /// Override store snapshot.
    pub store: Option<PathBuf>,
}

impl InspectConfig {
    /// Store path from the command line, then the file, then the built-in default.
    #[must_use]
    pub fn store_path(&self, cli: Option<&Path>) -> PathBuf {
        cli.map(Path::to_path_buf)
            .or_else(|| self.store.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH))
    }
}
