use anyhow::Context;
use imo_engine::{DeclarativeSource, MemoryDocument, PageConfig};
use serde::Deserialize;
use std::path::Path;

/// A page as the engine would see it: where it lives and the map sources it declares.
///
/// ```json
/// {
///   "location": "https://app.example.com/?imo=%7B%7D",
///   "sources": [
///     { "kind": "importmap", "content": { "inline": "{\"imports\":{}}" } },
///     { "kind": "importmap", "content": { "reference": "/maps/shared.json" } }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageDescription {
    pub location: Option<String>,
    pub base_url: Option<String>,
    pub sources: Vec<DeclarativeSource>,
}

impl PageDescription {
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read page description {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Malformed page description {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Overlays the described location and base on top of configured ones.
    pub fn apply_to(&self, page: &mut PageConfig) {
        if let Some(location) = &self.location {
            page.location.clone_from(location);
        }
        if self.base_url.is_some() {
            page.base_url.clone_from(&self.base_url);
        }
    }

    #[must_use]
    pub fn document(&self) -> MemoryDocument {
        MemoryDocument::new(self.sources.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imo_engine::{SourceContent, SourceKind};

    #[test]
    fn test_parse_sources() {
        let page = PageDescription::parse(
            r#"{
                "location": "https://app.example.com/shell/",
                "sources": [
                    { "kind": "systemjs-importmap", "content": { "reference": "/maps/a.json" } },
                    { "kind": "overridable-importmap", "content": { "inline": "{}" } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(page.sources.len(), 2);
        assert_eq!(page.sources[0].kind, SourceKind::SystemjsImportmap);
        assert_eq!(page.sources[1].content, SourceContent::Inline("{}".into()));
        assert!(!page.sources[1].is_override);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(PageDescription::parse(r#"{"locaton": "http://x/"}"#).is_err());
    }

    #[test]
    fn test_apply_keeps_unset_values() {
        let mut config = PageConfig { location: "http://localhost/".into(), base_url: Some("/base/".into()) };
        PageDescription { location: Some("https://app.example.com/".into()), ..Default::default() }
            .apply_to(&mut config);

        assert_eq!(config.location, "https://app.example.com/");
        assert_eq!(config.base_url.as_deref(), Some("/base/"));
    }
}
