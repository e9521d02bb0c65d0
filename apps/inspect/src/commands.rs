use crate::args::{Cli, Command, ExternalAction, OverrideAction};
use crate::config::InspectConfig;
use crate::mirror::LogSink;
use crate::page::PageDescription;
use crate::retriever::FsRetriever;
use anyhow::{Context, bail};
use imo_engine::{
    Document, EngineInfo, Host, ImportMapOverrides, apply_overrides, parse_overrides_from_mirror,
};
use imo_event_bus::TokioQueue;
use imo_storage::FileStore;
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

/// Boots an engine for the described page and runs one command against it.
///
/// Results are written to `out` as pretty JSON.
pub async fn execute(cli: &Cli, config: &InspectConfig, out: &mut (impl Write + Send)) -> anyhow::Result<()> {
    let page = match &cli.page {
        Some(path) => PageDescription::load(path).await?,
        None => PageDescription::default(),
    };
    let mut engine_config = config.engine.clone();
    page.apply_to(&mut engine_config.page);

    let store_path = config.store_path(cli.store.as_deref());
    let store = FileStore::builder()
        .path(&store_path)
        .create(true)
        .open()
        .with_context(|| format!("Failed to open override store {}", store_path.display()))?;

    let document = Arc::new(page.document());
    let shared: Arc<dyn Document> = document.clone();
    let mut host = Host::new(Arc::new(store), Arc::new(FsRetriever), shared, Arc::new(TokioQueue::current()?));
    if engine_config.map_type.is_server() {
        host = host.with_mirror(Arc::new(LogSink));
    }

    let startup = ImportMapOverrides::boot(&engine_config, host)?;
    if matches!(cli.command, Command::Info {}) {
        return write_json(out, &info_json(&startup.info()));
    }
    let Some(engine) = startup.into_active() else {
        bail!("Import map overrides are disabled for {}", engine_config.page.location);
    };
    debug!(command = ?cli.command, "Engine ready");

    match &cli.command {
        Command::Info {} => write_json(out, &info_json(&engine.info())),
        Command::Default {} => write_json(out, &engine.get_default_map().await?),
        Command::Current {} => write_json(out, &engine.get_current_page_map().await?),
        Command::Next {} => write_json(out, &engine.get_next_page_map().await?),
        Command::Document {} => write_json(out, &document.sources()),
        Command::Override { action } => run_override(&engine, action, out),
        Command::External { action } => run_external(&engine, action, out).await,
        Command::DevLibs {} => {
            let added = engine.add_dev_lib_overrides().await?;
            let others = engine.overrides_besides_dev_libs()?;
            write_json(out, &json!({ "added": added, "other_overrides": others }))
        },
        Command::ApplyCookie { cookie, protocol } => {
            let defaults = engine.get_default_map().await?;
            write_json(out, &apply_overrides(&defaults, &parse_overrides_from_mirror(cookie, protocol)))
        },
    }
}

fn run_override(engine: &ImportMapOverrides, action: &OverrideAction, out: &mut impl Write) -> anyhow::Result<()> {
    let overrides = engine.overrides();
    match action {
        OverrideAction::Add { specifier, url_or_port } => {
            write_json(out, &overrides.add_override(specifier, url_or_port)?)
        },
        OverrideAction::Remove { specifier } => {
            write_json(out, &changed(specifier, overrides.remove_override(specifier)?))
        },
        OverrideAction::Disable { specifier } => {
            write_json(out, &changed(specifier, overrides.disable_override(specifier)?))
        },
        OverrideAction::Enable { specifier } => {
            write_json(out, &changed(specifier, overrides.enable_override(specifier)?))
        },
        OverrideAction::List { all } => {
            let map = overrides.get_override_map(*all)?;
            let disabled = overrides.get_disabled_overrides()?;
            write_json(out, &json!({ "imports": map.imports, "disabled": disabled }))
        },
        OverrideAction::Reset {} => write_json(out, &overrides.reset_overrides()?),
    }
}

async fn run_external(
    engine: &ImportMapOverrides,
    action: &ExternalAction,
    out: &mut (impl Write + Send),
) -> anyhow::Result<()> {
    let registry = engine.external_maps();
    match action {
        ExternalAction::Add { url } => write_json(out, &changed(url, registry.add_external_override(url)?)),
        ExternalAction::Remove { url } => write_json(out, &changed(url, registry.remove_external_override(url)?)),
        ExternalAction::List {} => {
            let mut listed = Vec::new();
            for url in registry.get_external_overrides()? {
                let valid = registry.is_external_map_valid(&url).await;
                let current = engine.current_page_external_overrides().contains(&url);
                listed.push(json!({ "url": url, "valid": valid, "current_page": current }));
            }
            write_json(out, &listed)
        },
    }
}

fn changed(subject: &str, changed: bool) -> serde_json::Value {
    json!({ "subject": subject, "changed": changed })
}

fn info_json(info: &EngineInfo) -> serde_json::Value {
    json!({
        "map_type": info.map_type,
        "disabled": info.disabled,
        "query_param_overrides_name": info.query_param_overrides_name,
    })
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
