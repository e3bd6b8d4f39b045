use serde::Deserialize;

use bundler_rpc_core::error::{BundlerRpcError, Result};
use bundler_rpc_core::protocol::bundler::Address;
use bundler_rpc_core::ApiVersion;

use crate::policy::MethodAllowList;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub rpc: RpcSection,

    #[serde(default)]
    pub chain: ChainSection,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(BundlerRpcError::UnsupportedConfigVersion(self.version));
        }

        self.server.validate()?;
        self.rpc.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-route HTTP timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Accept WebSocket upgrades on `GET /:version/rpc`.
    #[serde(default)]
    pub websocket: bool,

    #[serde(default = "default_websocket_max_payload_size")]
    pub websocket_max_payload_size: usize,

    /// Fallback tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_ms: default_timeout_ms(),
            websocket: false,
            websocket_max_payload_size: default_websocket_max_payload_size(),
            log_level: default_log_level(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=600_000).contains(&self.timeout_ms) {
            return Err(BundlerRpcError::InvalidConfig(
                "server.timeout_ms must be between 100 and 600000".into(),
            ));
        }
        if !(1..=16 * 1024 * 1024).contains(&self.websocket_max_payload_size) {
            return Err(BundlerRpcError::InvalidConfig(
                "server.websocket_max_payload_size must be between 1 and 16777216".into(),
            ));
        }
        if self.host.trim().is_empty() {
            return Err(BundlerRpcError::InvalidConfig("server.host must not be empty".into()));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_websocket_max_payload_size() -> usize {
    256 * 1024
}
fn default_log_level() -> String {
    "info".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpcSection {
    #[serde(default = "default_api_version")]
    pub default_api_version: ApiVersion,

    #[serde(default = "default_api_versions")]
    pub api_versions: Vec<ApiVersion>,

    /// Method allow-list; `None` permits every bundler method.
    #[serde(default)]
    pub methods: Option<Vec<String>>,
}

impl Default for RpcSection {
    fn default() -> Self {
        Self {
            default_api_version: default_api_version(),
            api_versions: default_api_versions(),
            methods: None,
        }
    }
}

impl RpcSection {
    pub fn validate(&self) -> Result<()> {
        if self.api_versions.is_empty() {
            return Err(BundlerRpcError::InvalidConfig("rpc.api_versions must not be empty".into()));
        }
        if !self.api_versions.contains(&self.default_api_version) {
            return Err(BundlerRpcError::InvalidConfig(format!(
                "rpc.default_api_version {} is not listed in rpc.api_versions",
                self.default_api_version
            )));
        }
        MethodAllowList::compile(self.methods.as_deref())?;
        Ok(())
    }
}

fn default_api_version() -> ApiVersion {
    ApiVersion::V1
}
fn default_api_versions() -> Vec<ApiVersion> {
    ApiVersion::ALL.to_vec()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainSection {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    #[serde(default = "default_entry_points")]
    pub entry_points: Vec<Address>,
}

impl Default for ChainSection {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            entry_points: default_entry_points(),
        }
    }
}

fn default_chain_id() -> u64 {
    1
}
fn default_entry_points() -> Vec<Address> {
    // canonical EntryPoint v0.7
    "0x0000000071727De22E5E9d8BAf0edAc6f37da032"
        .parse()
        .map(|a| vec![a])
        .unwrap_or_default()
}
