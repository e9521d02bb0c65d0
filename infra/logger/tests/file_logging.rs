use imo_logger::{LevelFilter, LogSettings, Logger, LoggerError, RotationKind};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn settings_with_dir_write_json_lines_and_block_second_init() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let settings = LogSettings {
        console: false,
        dir: Some(log_dir.clone()),
        rotation: RotationKind::Never,
        json: true,
        ..LogSettings::default()
    };
    let logger = settings.init("imo-file-logging")?;
    assert!(logger.writes_file());

    tracing::info!(specifier = "react", "override written");

    let err = Logger::builder()
        .name("imo-second")
        .level(LevelFilter::INFO)
        .init()
        .expect_err("second init should fail");
    assert!(matches!(err, LoggerError::Subscriber { .. }));

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(&log_file)?;
    let line = contents.lines().find(|l| l.contains("override written")).expect("event logged");
    let parsed: serde_json::Value = serde_json::from_str(line)?;
    assert_eq!(parsed["fields"]["specifier"], "react");

    Ok(())
}
