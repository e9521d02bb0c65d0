use crate::{LevelFilter, Logger, LoggerError, Rotation};
use serde::Deserialize;
use std::path::PathBuf;

/// The `[log]` section of a tool configuration file.
///
/// Every field is optional so an empty section means console logging at `info`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    pub console: bool,
    pub level: String,
    pub filter: Option<String>,
    pub dir: Option<PathBuf>,
    pub rotation: RotationKind,
    pub max_files: usize,
    pub json: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationKind {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            console: true,
            level: "info".to_owned(),
            filter: None,
            dir: None,
            rotation: RotationKind::Daily,
            max_files: crate::DEFAULT_MAX_FILES,
            json: false,
        }
    }
}

impl From<RotationKind> for Rotation {
    fn from(kind: RotationKind) -> Self {
        match kind {
            RotationKind::Minutely => Self::MINUTELY,
            RotationKind::Hourly => Self::HOURLY,
            RotationKind::Daily => Self::DAILY,
            RotationKind::Never => Self::NEVER,
        }
    }
}

impl LogSettings {
    /// Parses the textual level (`trace`, `debug`, ..., `off`).
    pub fn level_filter(&self) -> Result<LevelFilter, LoggerError> {
        self.level.parse::<LevelFilter>().map_err(|e| LoggerError::InvalidConfiguration {
            message: format!("Unknown log level '{}': {e}", self.level).into(),
            context: None,
        })
    }

    /// Installs the global subscriber described by these settings.
    pub fn init(&self, name: &str) -> Result<Logger, LoggerError> {
        let mut builder =
            Logger::builder().name(name).console(self.console).level(self.level_filter()?);
        if let Some(filter) = &self.filter {
            builder = builder.env_filter(filter);
        }

        match &self.dir {
            Some(dir) => {
                let builder = builder
                    .path(dir)
                    .rotation(self.rotation.into())
                    .max_files(self.max_files);
                if self.json { builder.json().init() } else { builder.init() }
            },
            None => builder.init(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_section_uses_defaults() {
        let settings: LogSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, LogSettings::default());
        assert_eq!(settings.level_filter().unwrap(), LevelFilter::INFO);
    }

    #[test]
    fn test_partial_section() {
        let settings: LogSettings =
            serde_json::from_str(r#"{"level":"debug","dir":"logs","rotation":"hourly"}"#).unwrap();
        assert_eq!(settings.level_filter().unwrap(), LevelFilter::DEBUG);
        assert_eq!(settings.rotation, RotationKind::Hourly);
        assert!(settings.console);
    }

    #[test]
    fn test_unknown_level_rejected() {
        let settings = LogSettings { level: "loud".to_owned(), ..LogSettings::default() };
        assert!(matches!(settings.level_filter(), Err(LoggerError::InvalidConfiguration { .. })));
    }
}
