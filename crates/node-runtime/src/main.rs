//! # Rollup-Dispatch Node Runtime
//!
//! Runs the demo echo application in host mode.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file named by `RD_CONFIG`, then `RD_*` overrides)
//! 2. Install logging
//! 3. Register application routes and validate the wiring
//! 4. Open storage and the output index (both file-backed when a storage
//!    path is configured; the index lives beside the state file)
//! 5. Process JSON-lines requests from stdin until end of input

use anyhow::{Context, Result};
use node_runtime::{config::RuntimeConfig, driver, echo, logging, JsonLinesRollup};
use rd_03_output_index::prelude::{FileBackedIndexStore, InMemoryIndexStore, IndexStore};
use rd_04_dispatch::prelude::{
    DispatchEngine, DispatchEngineBuilder, FileBackedKVStore, InMemoryKVStore, KeyValueStore,
};
use tracing::info;

fn main() -> Result<()> {
    let config = RuntimeConfig::from_env()?;
    logging::init(&config.log)?;
    info!(
        version = rd_04_dispatch::VERSION,
        config = ?config.source,
        "Starting rollup-dispatch node runtime"
    );

    let storage = config
        .engine
        .effective_storage_path()
        .context("resolving storage path")?;
    let builder = echo::register(DispatchEngine::builder(config.engine))
        .context("registering echo routes")?;

    match storage {
        Some(path) => {
            info!(path = %path.display(), "Using file-backed storage");
            let store = FileBackedKVStore::open(&path)
                .with_context(|| format!("opening storage at {}", path.display()))?;
            let index_path = path.with_extension("index");
            let index = FileBackedIndexStore::open(&index_path)
                .with_context(|| format!("opening index at {}", index_path.display()))?;
            serve(builder, store, index)
        }
        None => {
            info!("Using volatile in-memory storage");
            serve(builder, InMemoryKVStore::new(), InMemoryIndexStore::new())
        }
    }
}

fn serve<S: KeyValueStore, I: IndexStore>(
    builder: DispatchEngineBuilder,
    store: S,
    index: I,
) -> Result<()> {
    let mut engine = builder
        .build(store, index, JsonLinesRollup::new(std::io::stdout()))
        .context("building dispatch engine")?;
    for route in engine.routes() {
        info!(route = %route.key, identity = %route.identity, "Route available");
    }

    let stdin = std::io::stdin();
    let summary = driver::run(&mut engine, stdin.lock(), &mut std::io::stdout())?;

    let stats = engine.stats();
    info!(
        processed = summary.total(),
        reports = stats.reports,
        notices = stats.notices,
        vouchers = stats.vouchers,
        "Node runtime finished"
    );
    Ok(())
}
