use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use coop_cache::PolicyKind;
use tracing::Level;

use crate::config::{SiblingConfig, DEFAULT_COOP_NODE_CONFIG_PATH};

#[derive(Parser)]
#[command(author, version, about, long_about = None)] // Read from `Cargo.toml`
#[command(propagate_version = true)]
pub struct Cli {
    /// log level
    #[arg(long)]
    pub log: Option<Level>,

    /// config path
    #[arg(long, default_value_t = format!("{}/{}", env!("HOME"), DEFAULT_COOP_NODE_CONFIG_PATH))]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run cache node daemon
    Daemon(DaemonCmdOpts),
    /// Write the default config file if none exists
    Init,
    /// Remove every cached payload from the cache directory
    Clear,
}

/// Override config
#[derive(Args, Debug, Default)]
pub struct DaemonCmdOpts {
    /// node name
    #[arg(long)]
    pub name: Option<String>,
    /// json log output
    #[arg(long)]
    pub json_log: bool,
    /// hierarchical span output
    #[arg(long)]
    pub tree_trace: bool,
    /// server port
    #[arg(long)]
    pub port: Option<u16>,
    /// server address
    #[arg(long)]
    pub addr: Option<String>,
    /// admin server port
    #[arg(long)]
    pub admin_port: Option<u16>,
    /// replacement policy: lru, lfu or green
    #[arg(long)]
    pub policy: Option<PolicyKind>,
    /// maximum number of resident entries
    #[arg(long)]
    pub capacity: Option<usize>,
    /// cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
    /// region label, reported by the green policy
    #[arg(long)]
    pub region: Option<String>,
    /// sibling and origin timeout in milliseconds
    #[arg(long)]
    pub timeout: Option<u64>,
    /// serve the origin from this directory
    #[arg(long, conflicts_with = "origin_url")]
    pub origin_dir: Option<PathBuf>,
    /// serve the origin from this base url
    #[arg(long)]
    pub origin_url: Option<String>,
    /// sibling as name=url, in lookup order; replaces the configured list
    #[arg(long = "sibling", value_parser = parse_sibling)]
    pub siblings: Vec<SiblingConfig>,
}

fn parse_sibling(s: &str) -> Result<SiblingConfig, String> {
    let (name, url) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=url, got `{s}`"))?;
    if name.is_empty() || url.is_empty() {
        return Err(format!("expected name=url, got `{s}`"));
    }
    Ok(SiblingConfig {
        name: name.to_string(),
        url: url.to_string(),
    })
}
