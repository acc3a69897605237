//! MedSafe interaction checker
//!
//! Seeds (if needed) a SQLite fallback store, resolves every pair in the
//! given medication list and prints the report as JSON.

use anyhow::{bail, Result};
use clap::Parser;
use medsafe_core::{
    backend_from_config, init_logging, load_env, load_env_from_path, GraphConfig,
    InteractionResolver, ResolverConfig, StoreConfig,
};
use medsafe_storage_sql::SqliteInteractionStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database connection string
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:medsafe.db")]
    database_url: String,

    /// Seed dataset used when the store holds too few rows
    #[arg(long, default_value = "data/drug_interactions.json")]
    seed: PathBuf,

    /// Base URL of an interaction graph service (overrides MEDSAFE_GRAPH_URL)
    #[arg(long)]
    graph_url: Option<String>,

    /// Give up on pairs still unresolved after this many milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Also print store, backend and cache health to stderr
    #[arg(long)]
    health: bool,

    /// Drug names to check against each other
    #[arg(required = true)]
    drugs: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = match std::env::var_os("MEDSAFE_ENV_FILE") {
        Some(path) => {
            load_env_from_path(&path)?;
            Some(PathBuf::from(path))
        }
        None => load_env()?,
    };
    init_logging();
    if let Some(path) = &env_file {
        info!(path = %path.display(), "Loaded environment file");
    }
    let cli = Cli::parse();

    if cli.drugs.iter().all(|d| d.trim().is_empty()) {
        bail!("no drug names given");
    }

    let resolver_config = ResolverConfig::from_env()?;
    let store_config = StoreConfig::from_env()?;
    let mut graph_config = GraphConfig::from_env();
    if cli.graph_url.is_some() {
        graph_config.base_url = cli.graph_url.clone();
    }

    // A missing seed only matters if the database is not already populated
    let seed = match tokio::fs::read(&cli.seed).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %cli.seed.display(), error = %e, "Seed dataset unreadable");
            Vec::new()
        }
    };

    let store = Arc::new(SqliteInteractionStore::connect(&cli.database_url, store_config).await?);
    let init = store.clone().spawn_initialization(seed);

    let backend = backend_from_config(&graph_config, &resolver_config)?;
    let resolver = InteractionResolver::new(store, resolver_config).with_backend(backend);

    let deadline = cli
        .deadline_ms
        .map(|ms| tokio::time::Instant::now() + Duration::from_millis(ms));
    let report = resolver
        .check_interactions_with_deadline(cli.drugs.as_slice(), deadline)
        .await;

    match init.await? {
        Ok(outcome) => info!(?outcome, "Store initialization finished"),
        Err(e) => warn!(error = %e, "Store initialization failed"),
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    if cli.health {
        eprintln!("{}", serde_json::to_string_pretty(&resolver.health())?);
    }
    Ok(())
}
