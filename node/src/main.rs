//! Binary entry point: CLI parsing, tracing setup, and wiring the engine
//! orchestrator, seed cache, and safety classifier into the transport router
//! (§6 "Command line").

mod reference_engine;
mod reference_safety;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wg_config::{SeedListPolicy, SeedPaths, ServerConfig};
use wg_engine::EngineOrchestrator;
use wg_persistence::SeedCache;
use wg_safety::SafetyClassifier;
use wg_transport::AppState;

#[derive(Parser, Debug)]
#[command(name = "world-engine-gateway", about = "Gateway fronting a GPU-resident generative world engine")]
struct Cli {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value_t = wg_config::DEFAULT_PORT)]
    port: u16,

    /// Root directory under which `world_engine/` state is persisted (§6).
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Include unsafe seeds in `GET /seeds/list` by default.
    #[arg(long)]
    include_unsafe_by_default: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = ServerConfig::new(cli.host, cli.port, cli.root);
    if cli.include_unsafe_by_default {
        config.default_seed_list_policy = SeedListPolicy::IncludeUnsafe;
    }

    let seed_paths = SeedPaths::new(config.seeds.root.clone());
    std::fs::create_dir_all(seed_paths.default_dir())?;
    std::fs::create_dir_all(seed_paths.uploads_dir())?;

    let safety = Arc::new(SafetyClassifier::new(Arc::new(reference_safety::ReferenceClassifierBackend)));
    let seed_cache = Arc::new(SeedCache::load(seed_paths, safety.clone()));

    tracing::info!("performing initial seed rescan");
    match seed_cache.rescan().await {
        Ok(totals) => tracing::info!(total = totals.total, safe = totals.safe, unsafe_count = totals.unsafe_count, "initial seed rescan complete"),
        Err(err) => tracing::warn!(error = %err, "initial seed rescan failed; starting with an empty cache"),
    }

    let orchestrator = Arc::new(EngineOrchestrator::new(Arc::new(reference_engine::ReferenceEngineFactory)));

    let state = AppState {
        orchestrator,
        seed_cache,
        safety,
        default_seed_list_policy: config.default_seed_list_policy,
    };

    let router = wg_transport::router(state);
    let bind_addr: std::net::SocketAddr = config.bind_addr().parse()?;
    tracing::info!(address = %bind_addr, "starting world-engine-gateway");

    axum::Server::bind(&bind_addr).serve(router.into_make_service()).await?;
    Ok(())
}
