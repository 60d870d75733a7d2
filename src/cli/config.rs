//! yip210 configuration file handling
//!
//! Operator settings for the fork node, contract layout, governance voters,
//! rebalance band, deployment artifacts and logging. TOML, stored under the
//! platform config directory unless `--config` points elsewhere. A missing
//! file means built-in defaults: a local node forking mainnet.

use alloy::primitives::{utils::parse_ether, Address};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use yip210::contracts::ContractAddresses;
use yip210::governance::GovernanceSettings;
use yip210::treasury::AllocationBand;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
const DEFAULT_NETWORK_NAME: &str = "localhost";
const DEFAULT_CHAIN_ID: u64 = 31337;
/// Mainnet block the YIP210 test suite forks from.
const DEFAULT_FORK_BLOCK: u64 = 17_153_676;
const DEFAULT_ARTIFACT: &str = "artifacts/contracts/YIP210.sol/YIP210.json";
const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write config file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid governance.voter_funding_eth {value:?}: {reason}")]
    InvalidFunding { value: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Yip210Config {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub contracts: ContractAddresses,

    #[serde(default)]
    pub governance: GovernanceConfig,

    #[serde(default)]
    pub rebalance: RebalanceConfig,

    #[serde(default)]
    pub deploy: DeployConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Fork node settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network name, used as the deployments subdirectory
    pub name: String,

    /// JSON-RPC endpoint of a running Anvil or Hardhat node
    pub rpc_url: String,

    pub chain_id: u64,

    /// Spawn Anvil forking `fork_url` instead of connecting to `rpc_url`
    pub spawn_anvil: bool,

    /// Archive node to fork from (required when spawn_anvil is set)
    pub fork_url: Option<String>,

    pub fork_block_number: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NETWORK_NAME.to_string(),
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            spawn_anvil: false,
            fork_url: None,
            fork_block_number: DEFAULT_FORK_BLOCK,
        }
    }
}

/// Accounts that vote proposals through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Delegates holding enough votes together to reach quorum.
    /// The first one is the proposer.
    pub voters: Vec<Address>,

    /// ETH sent to each voter for gas, as a decimal string
    pub voter_funding_eth: String,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            voters: Vec::new(),
            voter_funding_eth: "100".to_string(),
        }
    }
}

impl GovernanceConfig {
    pub fn settings(&self) -> Result<GovernanceSettings, ConfigError> {
        let funding =
            parse_ether(&self.voter_funding_eth).map_err(|e| ConfigError::InvalidFunding {
                value: self.voter_funding_eth.clone(),
                reason: e.to_string(),
            })?;
        Ok(GovernanceSettings::new(self.voters.clone()).with_funding(funding))
    }
}

/// Allocation band a rebalance must land in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceConfig {
    pub target_steth_pct: u64,
    pub tolerance_pct: u64,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        let band = AllocationBand::default();
        Self {
            target_steth_pct: band.target_steth_pct,
            tolerance_pct: band.tolerance_pct,
        }
    }
}

impl RebalanceConfig {
    pub fn band(&self) -> AllocationBand {
        AllocationBand {
            target_steth_pct: self.target_steth_pct,
            tolerance_pct: self.tolerance_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Hardhat or Foundry artifact holding the YIP210 creation bytecode
    pub artifact: PathBuf,

    /// Deployment records live in `<deployments_dir>/<network.name>/`
    pub deployments_dir: PathBuf,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            artifact: PathBuf::from(DEFAULT_ARTIFACT),
            deployments_dir: PathBuf::from(DEFAULT_DEPLOYMENTS_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). RUST_LOG wins if set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl Yip210Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml() -> String {
        let contracts = ContractAddresses::default();
        format!(
            r#"# yip210 configuration
#
# Settings for driving the YIP210 proposals through YAM governance on a
# mainnet fork (Anvil or Hardhat node).

[network]
# Name of the deployments subdirectory
name = "{name}"

# JSON-RPC endpoint of a running fork node
rpc_url = "{rpc_url}"
chain_id = {chain_id}

# Spawn anvil ourselves instead of connecting to rpc_url
spawn_anvil = false
# fork_url = "https://eth-mainnet.g.alchemy.com/v2/<key>"
fork_block_number = {fork_block}

[contracts]
# Ethereum mainnet addresses
governor = "{governor}"
timelock = "{timelock}"
reserves = "{reserves}"
usdc = "{usdc}"
steth = "{steth}"
weth = "{weth}"
steth_usd_feed = "{steth_usd_feed}"
usdc_usd_feed = "{usdc_usd_feed}"

[governance]
# Delegates with enough votes to reach quorum together.
# The first voter proposes, queues and executes. Required for proposal flows.
voters = []
# ETH sent to each voter for gas
voter_funding_eth = "100"

[rebalance]
# Post-rebalance allocation must be strictly within target +/- tolerance
target_steth_pct = 70
tolerance_pct = 5

[deploy]
# Hardhat or Foundry compiler artifact with the YIP210 creation bytecode
artifact = "{artifact}"
deployments_dir = "{deployments_dir}"

[logging]
# Log level: trace, debug, info, warn, error (RUST_LOG takes precedence)
level = "info"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/yip210.log"
"#,
            name = DEFAULT_NETWORK_NAME,
            rpc_url = DEFAULT_RPC_URL,
            chain_id = DEFAULT_CHAIN_ID,
            fork_block = DEFAULT_FORK_BLOCK,
            governor = contracts.governor,
            timelock = contracts.timelock,
            reserves = contracts.reserves,
            usdc = contracts.usdc,
            steth = contracts.steth,
            weth = contracts.weth,
            steth_usd_feed = contracts.steth_usd_feed,
            usdc_usd_feed = contracts.usdc_usd_feed,
            artifact = DEFAULT_ARTIFACT,
            deployments_dir = DEFAULT_DEPLOYMENTS_DIR,
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(config_path: &Path) -> Result<(), ConfigError> {
        write_file(config_path, &Self::generate_default_toml())
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, contents).map_err(write_err)
}

/// `<config_dir>/yip210/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("yip210")
        .join("config.toml")
}
