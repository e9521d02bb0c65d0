use imo_engine::{DomainGate, EngineConfig, EngineError, MapType, load_config};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_config_from_toml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("imo.toml");
    fs::write(
        &path,
        r#"
map_type = "systemjs-importmap"
domains = "allowlist:localhost,*.dev.test"

[page]
location = "https://shell.dev.test/app/index.html"
base_url = "/static/"
"#,
    )
    .unwrap();

    let config: EngineConfig = load_config(Some(&path)).unwrap();

    assert_eq!(config.map_type, MapType::SystemjsImportmap);
    assert_eq!(config.query_param, "imo");
    assert_eq!(
        config.domains,
        DomainGate::AllowList(vec!["localhost".to_owned(), "*.dev.test".to_owned()])
    );
    assert_eq!(config.page.base().unwrap().as_str(), "https://shell.dev.test/static/");
}

#[test]
fn test_missing_config_file_is_an_error() {
    let temp = TempDir::new().unwrap();

    let result = load_config::<EngineConfig>(Some(temp.path().join("absent.toml")));

    assert!(matches!(result, Err(EngineError::Config { .. })));
}

#[test]
fn test_defaults() {
    let config = EngineConfig::default();

    assert_eq!(config.map_type, MapType::Importmap);
    assert_eq!(config.domains, DomainGate::Disabled);
    assert_eq!(config.page.location_url().unwrap().host_str(), Some("localhost"));
}
