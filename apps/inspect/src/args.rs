//! Command-line interface of `imo-inspect`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Boots the override engine against a described page and a file-backed store.
#[derive(Debug, Parser)]
#[command(name = "imo-inspect")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Inspect and edit import map overrides for a page")]
pub struct Cli {
    /// Configuration file (TOML, JSON, YAML...). Defaults apply when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON page description: `{"location": ..., "base_url": ..., "sources": [...]}`.
    #[arg(short, long, global = true)]
    pub page: Option<PathBuf>,

    /// Override store snapshot; takes precedence over the config file.
    #[arg(short, long, global = true)]
    pub store: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the engine status
    Info {},
    /// Print the merged page-authored map
    Default {},
    /// Print the map in effect for this load
    Current {},
    /// Print the map a reload would produce
    Next {},
    /// Print the page sources after the engine wrote its artifacts
    Document {},
    /// Manage per-specifier overrides
    Override {
        #[command(subcommand)]
        action: OverrideAction,
    },
    /// Manage external override maps
    External {
        #[command(subcommand)]
        action: ExternalAction,
    },
    /// Override known libraries in the current map with development builds
    DevLibs {},
    /// Apply overrides carried by a Cookie header to the default map
    ApplyCookie {
        /// Raw `Cookie` header value
        #[arg(long)]
        cookie: String,
        /// Protocol used to expand ports and protocol-relative URLs
        #[arg(long, default_value = "http")]
        protocol: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum OverrideAction {
    /// Point a specifier at a URL, or at a localhost port when given digits only
    Add { specifier: String, url_or_port: String },
    /// Delete an override
    Remove { specifier: String },
    /// Keep an override but stop applying it
    Disable { specifier: String },
    /// Apply a disabled override again
    Enable { specifier: String },
    /// List overrides
    List {
        /// Include disabled overrides
        #[arg(short, long)]
        all: bool,
    },
    /// Remove every override
    Reset {},
}

#[derive(Debug, Subcommand)]
pub enum ExternalAction {
    /// Register an external map URL
    Add { url: String },
    /// Unregister an external map URL
    Remove { url: String },
    /// List external maps and whether they load
    List {},
}
