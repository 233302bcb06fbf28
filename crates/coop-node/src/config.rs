use std::{
    fs::{create_dir_all, read_to_string, File},
    io::Write,
    net::{IpAddr, SocketAddr},
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use coop_cache::PolicyKind;
use serde::{Deserialize, Serialize};
use tracing::{info, Level};

use crate::cli::DaemonCmdOpts;

pub const DEFAULT_COOP_NODE_PATH: &str = ".coop/node";
pub const DEFAULT_COOP_NODE_CONFIG_PATH: &str = ".coop/node/config.toml";

fn home() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Writes the default config to `path` unless a file is already there.
pub fn init_config(path: &Path) -> Result<()> {
    if !path.exists() {
        info!("Create config at: {path:?}");
        let parent_dir = path
            .parent()
            .with_context(|| format!("Couldn't get parent dir from: {path:?}"))?;
        create_dir_all(parent_dir)?;
        let node_config = NodeConfig::default();
        let mut file = File::create(path)?;
        let toml = toml::to_string(&node_config)?;
        file.write_all(toml.as_bytes())?;
    }
    Ok(())
}

pub fn load_config(path: &Path) -> Result<NodeConfig> {
    info!("Load config at: {path:?}");
    if !path.exists() {
        bail!("Could not find config file at {path:?}")
    }
    let toml = read_to_string(path)?;
    toml::from_str(&toml).context("Failed to deserialize")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
    pub name: String,
    pub log_level: String,
    /// Emit logs as json lines.
    #[serde(default)]
    pub json_log: bool,
    /// Hierarchical span output instead of flat lines.
    #[serde(default)]
    pub tree_trace: bool,
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub cache: CacheConfig,
    pub remote: RemoteConfig,
    pub origin: OriginConfig,
    #[serde(default)]
    pub siblings: Vec<SiblingConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub addr: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminConfig {
    pub addr: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    pub policy: PolicyKind,
    pub capacity: usize,
    pub dir: PathBuf,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Per-call timeout for sibling and origin lookups, in milliseconds.
    pub timeout: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginConfig {
    Dir(PathBuf),
    Http(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SiblingConfig {
    pub name: String,
    pub url: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "peer1".into(),
            log_level: "INFO".into(),
            json_log: false,
            tree_trace: false,
            server: ServerConfig {
                addr: "0.0.0.0".into(),
                port: 5001,
            },
            admin: AdminConfig {
                addr: "0.0.0.0".into(),
                port: 6001,
            },
            cache: CacheConfig {
                policy: PolicyKind::Lru,
                capacity: 2,
                dir: home().join(DEFAULT_COOP_NODE_PATH).join("cache"),
                region: None,
            },
            remote: RemoteConfig {
                timeout: 10_000, // 10s
            },
            origin: OriginConfig::Dir(home().join(DEFAULT_COOP_NODE_PATH).join("origin")),
            siblings: Vec::new(),
        }
    }
}

impl NodeConfig {
    pub fn merge_log_level(&mut self, log_level: Option<Level>) {
        if let Some(log_level) = log_level {
            self.log_level = log_level.to_string();
        }
    }

    pub fn merge_daemon_opts(&mut self, opts: DaemonCmdOpts) {
        if let Some(name) = opts.name {
            self.name = name;
        }
        if opts.json_log {
            self.json_log = true;
        }
        if opts.tree_trace {
            self.tree_trace = true;
        }
        if let Some(port) = opts.port {
            self.server.port = port;
        }
        if let Some(addr) = opts.addr {
            self.server.addr = addr;
        }
        if let Some(port) = opts.admin_port {
            self.admin.port = port;
        }
        if let Some(policy) = opts.policy {
            self.cache.policy = policy;
        }
        if let Some(capacity) = opts.capacity {
            self.cache.capacity = capacity;
        }
        if let Some(dir) = opts.cache_dir {
            self.cache.dir = dir;
        }
        if let Some(region) = opts.region {
            self.cache.region = Some(region);
        }
        if let Some(timeout) = opts.timeout {
            self.remote.timeout = timeout;
        }
        if let Some(dir) = opts.origin_dir {
            self.origin = OriginConfig::Dir(dir);
        }
        if let Some(url) = opts.origin_url {
            self.origin = OriginConfig::Http(url);
        }
        if !opts.siblings.is_empty() {
            self.siblings = opts.siblings;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.capacity == 0 {
            bail!("cache.capacity must be a positive integer");
        }
        if self.remote.timeout == 0 {
            bail!("remote.timeout must be a positive number of milliseconds");
        }
        for sibling in &self.siblings {
            if sibling.name == self.name {
                bail!("sibling list must not contain the node itself ({})", self.name);
            }
        }
        Ok(())
    }

    pub fn capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.cache.capacity).context("cache.capacity must be positive")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.remote.timeout)
    }

    pub fn server_addr(&self) -> Result<SocketAddr> {
        socket_addr(&self.server.addr, self.server.port)
    }

    pub fn admin_addr(&self) -> Result<SocketAddr> {
        socket_addr(&self.admin.addr, self.admin.port)
    }
}

fn socket_addr(addr: &str, port: u16) -> Result<SocketAddr> {
    let ip = addr
        .parse::<IpAddr>()
        .with_context(|| format!("Invalid binding address {addr}"))?;
    Ok(SocketAddr::from((ip, port)))
}
