use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Devnet account credited in the in-memory bank at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FundedAccount {
    pub address: String,
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub chain_id: String,
    pub listen: String,
    /// Genesis JSON; the built-in devnet genesis when unset.
    pub genesis: Option<PathBuf>,
    pub block_time_ms: u64,
    /// `EnvFilter` directive, e.g. `info,truedemocracy=debug`.
    pub log: Option<String>,
    pub accounts: Vec<FundedAccount>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            chain_id: "truedemocracy-devnet".into(),
            listen: "127.0.0.1:7070".into(),
            genesis: None,
            block_time_ms: 1_000,
            log: None,
            accounts: Vec::new(),
        }
    }
}

impl NodeConfig {
    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// YAML file named by `TD_CONFIG` (if any), then `TD_*` overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match env::var("TD_CONFIG") {
            Ok(path) => {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("reading config {path}"))?;
                Self::from_yaml(&raw).with_context(|| format!("parsing config {path}"))?
            }
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<()> {
        if let Some(listen) = lookup("TD_LISTEN") {
            self.listen = listen;
        }
        if let Some(path) = lookup("TD_GENESIS") {
            self.genesis = Some(PathBuf::from(path));
        }
        if let Some(ms) = lookup("TD_BLOCK_TIME_MS") {
            self.block_time_ms = ms
                .parse()
                .with_context(|| format!("TD_BLOCK_TIME_MS={ms} is not a number"))?;
        }
        if let Some(filter) = lookup("TD_LOG") {
            self.log = Some(filter);
        }
        if let Some(chain_id) = lookup("TD_CHAIN_ID") {
            self.chain_id = chain_id;
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listen
            .parse()
            .with_context(|| format!("invalid listen address {}", self.listen))
    }

    /// Configured directive, else `RUST_LOG`, else `info`.
    pub fn log_filter(&self) -> EnvFilter {
        self.log
            .as_deref()
            .and_then(|directive| EnvFilter::try_new(directive).ok())
            .or_else(|| EnvFilter::try_from_default_env().ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    }
}
