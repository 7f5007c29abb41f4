//! Command-line interface for the annuaire directory.
//!
//! Three subcommands cover the operational surface: `serve` runs the HTTP
//! API, `sync` runs one ingestion pass against the external source, and
//! `seed` writes the category taxonomy. Arguments merge from CLI flags,
//! `ANNUAIRE_*` environment variables, and configuration files.
#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use geo::Coord;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use annuaire_data::{
    ClientBuildError, DirectoryStore, OverpassClient, OverpassConfig, StoreError, SyncError,
    run_sync,
};
use annuaire_server::{AppState, build_router};

const DEFAULT_DATABASE: &str = "annuaire.db";
const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Run the annuaire CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    init_logging();
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Serve(args) => serve(args.into_config()?),
        Command::Sync(args) => sync(&args.into_config()?),
        Command::Seed(args) => seed(&args.into_config()?),
    }
}

/// Bridge `log` records from the library crates into the tracing
/// subscriber. Both initialisations are no-ops when already set up, which
/// keeps `run` callable from tests.
fn init_logging() {
    let _ = tracing_log::LogTracer::init();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[derive(Debug, Parser)]
#[command(
    name = "annuaire",
    about = "Local business directory: API server and ingestion tooling",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP/JSON API.
    Serve(ServeArgs),
    /// Run one ingestion pass against the external source.
    Sync(SyncArgs),
    /// Write the built-in category taxonomy into the store.
    Seed(SeedArgs),
}

/// CLI arguments for the `serve` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Serve the directory API over HTTP")]
#[ortho_config(prefix = "ANNUAIRE")]
struct ServeArgs {
    /// Path to the SQLite database file.
    #[arg(long = "database", value_name = "path")]
    #[serde(default)]
    database: Option<PathBuf>,
    /// Socket address to bind, host:port.
    #[arg(long = "bind", value_name = "addr")]
    #[serde(default)]
    bind: Option<String>,
    /// Overpass interpreter endpoint used by the sync trigger.
    #[arg(long = "overpass-url", value_name = "url")]
    #[serde(default)]
    overpass_url: Option<String>,
}

impl ServeArgs {
    fn into_config(self) -> Result<ServeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ServeConfig::try_from(merged)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ServeConfig {
    database: PathBuf,
    bind: SocketAddr,
    overpass_url: Option<String>,
}

impl TryFrom<ServeArgs> for ServeConfig {
    type Error = CliError;

    fn try_from(args: ServeArgs) -> Result<Self, Self::Error> {
        let bind_text = args.bind.unwrap_or_else(|| DEFAULT_BIND.to_owned());
        let bind = bind_text
            .parse()
            .map_err(|source| CliError::InvalidBindAddress {
                value: bind_text,
                source,
            })?;
        Ok(Self {
            database: args
                .database
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            bind,
            overpass_url: args.overpass_url,
        })
    }
}

/// CLI arguments for the `sync` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Fetch the external source and reconcile the store")]
#[ortho_config(prefix = "ANNUAIRE")]
struct SyncArgs {
    /// Path to the SQLite database file.
    #[arg(long = "database", value_name = "path")]
    #[serde(default)]
    database: Option<PathBuf>,
    /// Overpass interpreter endpoint.
    #[arg(long = "overpass-url", value_name = "url")]
    #[serde(default)]
    overpass_url: Option<String>,
    /// Query centre latitude in decimal degrees.
    #[arg(long = "lat", value_name = "degrees")]
    #[serde(default)]
    lat: Option<f64>,
    /// Query centre longitude in decimal degrees.
    #[arg(long = "lng", value_name = "degrees")]
    #[serde(default)]
    lng: Option<f64>,
    /// Query radius in metres.
    #[arg(long = "radius", value_name = "metres")]
    #[serde(default)]
    radius: Option<u32>,
}

impl SyncArgs {
    fn into_config(self) -> Result<SyncConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(SyncConfig::from(merged))
    }
}

#[derive(Debug, Clone)]
struct SyncConfig {
    database: PathBuf,
    overpass: OverpassConfig,
}

impl From<SyncArgs> for SyncConfig {
    fn from(args: SyncArgs) -> Self {
        let mut overpass = args
            .overpass_url
            .map_or_else(OverpassConfig::default, OverpassConfig::new);
        if let Some(radius) = args.radius {
            overpass = overpass.with_radius_meters(radius);
        }
        if args.lat.is_some() || args.lng.is_some() {
            let current = overpass.center;
            overpass = overpass.with_center(Coord {
                x: args.lng.unwrap_or(current.x),
                y: args.lat.unwrap_or(current.y),
            });
        }
        Self {
            database: args
                .database
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            overpass,
        }
    }
}

/// CLI arguments for the `seed` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Seed the category taxonomy")]
#[ortho_config(prefix = "ANNUAIRE")]
struct SeedArgs {
    /// Path to the SQLite database file.
    #[arg(long = "database", value_name = "path")]
    #[serde(default)]
    database: Option<PathBuf>,
}

impl SeedArgs {
    fn into_config(self) -> Result<PathBuf, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(merged
            .database
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)))
    }
}

fn seed(database: &Path) -> Result<(), CliError> {
    let mut store = DirectoryStore::open(database)?;
    let written = store.seed_categories()?;
    store.close()?;
    info!("seeded {written} categories into {}", database.display());
    Ok(())
}

fn sync(config: &SyncConfig) -> Result<(), CliError> {
    let mut store = DirectoryStore::open(&config.database)?;
    let client = OverpassClient::with_config(config.overpass.clone())?;
    let report = run_sync(&mut store, &client, annuaire_data::DEFAULT_SYNC_KIND)?;
    store.close()?;
    info!(
        "sync {} finished: {} added, {} updated",
        report.sync_id, report.added, report.updated
    );
    Ok(())
}

fn serve(config: ServeConfig) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    runtime.block_on(serve_async(config))
}

async fn serve_async(config: ServeConfig) -> Result<(), CliError> {
    let store = DirectoryStore::open(&config.database)?;
    let overpass = config
        .overpass_url
        .map_or_else(OverpassConfig::default, OverpassConfig::new);
    let client = OverpassClient::with_config(overpass)?;
    let state = AppState::new(store, Arc::new(client));
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|source| CliError::Bind {
            addr: config.bind,
            source,
        })?;
    info!("listening on http://{}", config.bind);

    axum::serve(listener, router)
        .await
        .map_err(CliError::Serve)?;
    Ok(())
}

/// Errors emitted by the annuaire CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// The bind address did not parse as host:port.
    #[error("invalid bind address {value:?}")]
    InvalidBindAddress {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    /// The directory store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The Overpass client could not be constructed.
    #[error(transparent)]
    Client(#[from] ClientBuildError),
    /// The sync run failed.
    #[error(transparent)]
    Sync(#[from] SyncError),
    /// The Tokio runtime could not be built.
    #[error("failed to build Tokio runtime")]
    Runtime(#[source] std::io::Error),
    /// Binding the listen socket failed.
    #[error("failed to bind {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// The HTTP server terminated with an error.
    #[error("server terminated unexpectedly")]
    Serve(#[source] std::io::Error),
}
