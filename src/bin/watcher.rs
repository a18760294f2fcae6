//! memory-sync watcher
//!
//! Run with: memsync-watcher --root ./src

use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;

use memsync::client::{MemoryApiClient, DEFAULT_API_URL};
use memsync::config::{FileConfig, WatcherConfig};
use memsync::error::Result;
use memsync::extract::Extractor;
use memsync::logging::init_tracing;
use memsync::pipeline::SyncPipeline;
use memsync::watch::{initial_scan, FileEvent, FileWatcher};

#[derive(Parser, Debug)]
#[command(name = "memsync-watcher")]
#[command(about = "Watch a source tree and push code summaries to a memory service")]
#[command(version)]
struct Args {
    /// Root directory to watch
    #[arg(long)]
    root: String,

    /// Memory service base URL
    #[arg(long, env = "MEMORY_API_URL", default_value = DEFAULT_API_URL)]
    api: String,

    /// API key sent to the memory service
    #[arg(long, env = "MEMORY_API_KEY")]
    api_key: Option<String>,

    /// Tags attached to every summary (comma-separated)
    #[arg(long, default_value = "code")]
    tags: String,

    /// Category attached to every summary
    #[arg(long, default_value = "code")]
    category: String,

    /// Quiet period before a batch is uploaded, in ms
    #[arg(long = "debounceMs", alias = "debounce-ms", default_value = "1500")]
    debounce_ms: u64,

    /// TOML file with extraction limits and ignore list
    #[arg(long, env = "MEMORY_SYNC_CONFIG")]
    config: Option<String>,

    /// Scan once, upload, and exit instead of watching
    #[arg(long)]
    once: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let file_config = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let config = WatcherConfig::resolve(
        &args.root,
        args.api,
        args.api_key,
        &args.tags,
        &args.category,
        args.debounce_ms,
        file_config,
    )?;

    let client = MemoryApiClient::new(&config.api_url, config.api_key.clone())?;
    tracing::info!(
        "Syncing {} to {} (debounce {}ms)",
        config.root.display(),
        client.base_url(),
        config.debounce.as_millis()
    );

    let extractor = Extractor::new(&config.root, config.limits.clone());
    let pipeline = SyncPipeline::new(
        extractor,
        config.debounce,
        config.defaults.clone(),
        Arc::new(client),
    );
    let (tx, rx) = mpsc::unbounded_channel();

    if args.once {
        for path in initial_scan(&config.root, &config.ignore_dirs) {
            let _ = tx.send(FileEvent::Added(path));
        }
        drop(tx);
        pipeline.run(rx, std::future::pending()).await;
        return Ok(());
    }

    let _watcher = FileWatcher::start(&config.root, config.ignore_dirs.clone(), tx)?;
    pipeline
        .run(rx, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    Ok(())
}
