//! This module handles the initial setup of the application.
use super::args::AppArgs;
use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use xc_logger::adapters::{
    BeaconQueue, GlobalErrorHub, KeepaliveClient, ReqwestKeepalive, SledKeyValueStore,
    StaticPageInfo,
};
use xc_logger::{HostCapabilities, Logger, LoggerConfig, RuntimeMode};

const COLLECTOR_ENV: &str = "XC_COLLECTOR_URL";
const BEACON_QUEUE_CAPACITY: usize = 64;
/// Roughly the per-origin budget browsers give local storage.
const STORAGE_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Contains all the components the application runs with.
pub struct PreparedApp {
    /// The command-line arguments.
    pub args: AppArgs,
    /// The process-wide logger.
    pub logger: &'static Logger,
    /// The store backing the persisted snapshot.
    pub store: Arc<SledKeyValueStore>,
    /// The priority channel, if a collector is configured.
    pub beacons: Option<Arc<BeaconQueue>>,
}

/// Prepares the application for running.
///
/// This function performs the following steps:
/// 1. Configures diagnostics output.
/// 2. Creates the data directory and opens the database.
/// 3. Resolves the configuration from arguments and the environment.
/// 4. Sets up delivery to the collector, if one is configured.
/// 5. Creates the process-wide logger.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// This function will return an error if any of the setup steps fail.
pub fn prepare(args: AppArgs) -> Result<PreparedApp> {
    configure_logging();

    std::fs::create_dir_all(&args.data_dir)?;
    let db = sled::open(format!("{}/db", args.data_dir))?;
    let store = Arc::new(SledKeyValueStore::new(db)?.with_quota(STORAGE_QUOTA_BYTES));

    let mut config = LoggerConfig::from_env()?;
    if args.production {
        config.mode = RuntimeMode::Production;
    }
    if let Some(level) = args.level {
        config.min_level = level;
    }

    let page = match &args.url {
        Some(url) => StaticPageInfo::new(url.clone(), StaticPageInfo::default_user_agent()),
        None => StaticPageInfo::default(),
    };

    let hub = GlobalErrorHub::new();
    if args.capture_panics {
        hub.install_panic_hook();
    }

    let mut host = HostCapabilities::detached()
        .with_store(store.clone())
        .with_page(Arc::new(page))
        .with_global_errors(hub);

    let mut beacons = None;
    if let Some(base_url) = resolve_collector(&args) {
        let client: Arc<dyn KeepaliveClient> = Arc::new(ReqwestKeepalive::new(base_url));
        let queue = Arc::new(BeaconQueue::spawn(client.clone(), BEACON_QUEUE_CAPACITY));
        host = host
            .with_keepalive(client)
            .with_priority_channel(queue.clone());
        beacons = Some(queue);
    }

    let logger = xc_logger::init(config, host);

    Ok(PreparedApp {
        args,
        logger,
        store,
        beacons,
    })
}

/// Configures diagnostics output, honouring `RUST_LOG`.
fn configure_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resolves the collector URL.
///
/// The URL can be provided via a command-line argument or an environment variable.
fn resolve_collector(args: &AppArgs) -> Option<String> {
    args.collector
        .clone()
        .or_else(|| std::env::var(COLLECTOR_ENV).ok())
        .filter(|url| !url.trim().is_empty())
}
