use crate::document::SourceKind;
use crate::error::{EngineError, EngineErrorExt};
use crate::gate::DomainGate;
use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

const DEFAULT_LOCATION: &str = "http://localhost/";
const DEFAULT_QUERY_PARAM: &str = "imo";

/// Which kind of declarative source the page uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MapType {
    #[default]
    Importmap,
    SystemjsImportmap,
    ImportmapShim,
    /// The map is rendered by a server; overrides are mirrored instead of injected.
    Server,
}

impl MapType {
    #[must_use]
    pub const fn source_kind(self) -> SourceKind {
        match self {
            Self::Importmap | Self::Server => SourceKind::Importmap,
            Self::SystemjsImportmap => SourceKind::SystemjsImportmap,
            Self::ImportmapShim => SourceKind::ImportmapShim,
        }
    }

    #[must_use]
    pub const fn is_server(self) -> bool {
        matches!(self, Self::Server)
    }
}

/// Engine settings, usually loaded with [`load_config`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub map_type: MapType,
    pub domains: DomainGate,
    /// Name of the page query parameter carrying ad-hoc overrides.
    pub query_param: String,
    pub page: PageConfig,
}

/// Where the engine is running.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub location: String,
    /// Document base; the location is used when absent.
    pub base_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            map_type: MapType::default(),
            domains: DomainGate::default(),
            query_param: DEFAULT_QUERY_PARAM.to_owned(),
            page: PageConfig::default(),
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self { location: DEFAULT_LOCATION.to_owned(), base_url: None }
    }
}

impl PageConfig {
    pub fn location_url(&self) -> Result<Url, EngineError> {
        Url::parse(&self.location).map_err(|e| EngineError::Configuration {
            message: format!("Invalid page location '{}': {e}", self.location).into(),
            context: None,
        })
    }

    pub fn base(&self) -> Result<Url, EngineError> {
        let location = self.location_url()?;
        let Some(base) = &self.base_url else {
            return Ok(location);
        };
        location.join(base).map_err(|e| EngineError::Configuration {
            message: format!("Invalid document base '{base}': {e}").into(),
            context: None,
        })
    }
}

/// Loads a configuration file layered with `IMO__`-prefixed environment variables.
///
/// The file defaults to `imo` (any supported extension) in the working directory.
/// Nested keys use double underscores: `IMO__PAGE__LOCATION` sets `page.location`.
///
/// # Example
/// ```rust
/// use imo_engine::{EngineConfig, load_config};
///
/// let cfg: EngineConfig = load_config(Some("config/local")).unwrap_or_default();
/// assert_eq!(cfg.query_param, "imo");
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, EngineError>
where
    T: DeserializeOwned,
{
    let effective_path = path.map_or_else(|| PathBuf::from("imo"), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(Environment::with_prefix("IMO").separator("__").convert_case(config::Case::Snake));

    info!("Loading config from {}", effective_path.display());

    builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")
}
