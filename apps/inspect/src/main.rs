use anyhow::Context;
use clap::Parser;
use imo_engine::load_config;
use imo_inspect::{Cli, InspectConfig, execute};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg: InspectConfig = match &cli.config {
        Some(path) => load_config(Some(path)).context("Critical: Configuration is malformed")?,
        None => InspectConfig::default(),
    };
    if cli.verbose {
        "debug".clone_into(&mut cfg.log.level);
    }

    let _log = cfg.log.init(env!("CARGO_PKG_NAME"))?;

    execute(&cli, &cfg, &mut std::io::stdout()).await
}
