use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use coop_cache::{CacheStore, DiskStorage};
use coop_node::{
    cli::{Cli, Commands},
    config::{init_config, load_config, NodeConfig, OriginConfig},
    metrics::setup_metrics_handler,
    source::{ContentSource, DirOrigin, HttpClient, HttpSource, Scope},
    PeerNode, Server,
};
use coop_telemetry::TelemetryConfig;
use coop_utils::ShutdownController;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        log,
        config,
        command,
    } = Cli::parse();
    let config_path = config.parse::<PathBuf>()?;

    match command {
        Commands::Init => init_config(&config_path),
        Commands::Clear => {
            let mut node_config = load_config(&config_path)?;
            node_config.merge_log_level(log);
            init_telemetry(&node_config)?;
            // opening the cache directory wipes it
            DiskStorage::open(&node_config.cache.dir)
                .await
                .with_context(|| format!("Failed to clear {:?}", node_config.cache.dir))?;
            info!("Cleared cache at {:?}", node_config.cache.dir);
            Ok(())
        }
        Commands::Daemon(opts) => {
            init_config(&config_path)?;
            let mut node_config = load_config(&config_path)?;
            node_config.merge_log_level(log);
            node_config.merge_daemon_opts(opts);
            node_config.validate()?;
            init_telemetry(&node_config)?;

            if let Err(e) = run(node_config).await {
                error!("{e:?}");
                return Err(e);
            }
            Ok(())
        }
    }
}

fn init_telemetry(config: &NodeConfig) -> Result<()> {
    TelemetryConfig::new(&config.name)
        .with_log_level(&config.log_level)
        .with_json_log(config.json_log)
        .with_tree_trace(config.tree_trace)
        .init()
}

async fn run(config: NodeConfig) -> Result<()> {
    let storage = DiskStorage::open(&config.cache.dir)
        .await
        .with_context(|| format!("Failed to open cache dir {:?}", config.cache.dir))?;
    let policy = config
        .cache
        .policy
        .build(config.capacity()?, config.cache.region.clone());
    info!(
        "[{}] {} cache, capacity {}, region {}, at {:?}",
        config.name,
        config.cache.policy,
        config.cache.capacity,
        config.cache.region.as_deref().unwrap_or("-"),
        config.cache.dir
    );
    let store = CacheStore::new(policy, storage);

    let client = HttpClient::new();
    let siblings = config
        .siblings
        .iter()
        .map(|sibling| {
            Arc::new(HttpSource::sibling(&sibling.name, &sibling.url, client.clone()))
                as Arc<dyn ContentSource>
        })
        .collect::<Vec<_>>();
    let origin: Arc<dyn ContentSource> = match &config.origin {
        OriginConfig::Dir(dir) => Arc::new(DirOrigin::new(dir)),
        OriginConfig::Http(url) => Arc::new(HttpSource::with_client(
            "origin",
            url,
            Scope::Full,
            client.clone(),
        )),
    };

    let node = Arc::new(PeerNode::new(
        &config.name,
        store,
        siblings,
        origin,
        config.timeout(),
    ));
    let metrics = setup_metrics_handler(&config.name)?;

    let shutdown = ShutdownController::new();
    shutdown.install_ctrl_c_handler();

    Server::new(node, config.server_addr()?, config.admin_addr()?)
        .with_metrics(metrics)
        .start(shutdown)
        .await
}
