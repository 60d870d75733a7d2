use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use yip210::deploy::{ensure_deployed, record_path};
use yip210::node::RpcForkClient;
use yip210::scenario::Yip210Scenario;

pub mod allocation;
pub mod call_execute;
pub mod config;
pub mod deploy;
pub mod deposit_weth;
pub mod encode;
pub mod init_config;
pub mod logging;
pub mod rebalance;
pub mod version;
pub mod warp;
pub mod whitelist;

use config::Yip210Config;

#[derive(Parser)]
#[command(name = "yip210")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for the YIP210 treasury rebalancing proposal", long_about = None)]
pub struct Cli {
    /// Path to config file (default: <config_dir>/yip210/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Fork node JSON-RPC endpoint (overrides network.rpc_url)
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a commented default configuration file
    InitConfig {
        /// Where to write it (default: the --config path)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the governance parameters of a YIP210 action (offline)
    Encode {
        #[arg(value_enum)]
        action: encode::EncodeAction,

        /// Deployed YIP210 contract address
        #[arg(long)]
        yip210: Address,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Deploy YIP210 unless a recorded deployment is still live
    Deploy,

    /// Pass the proposal whitelisting YIP210 withdrawals from the reserves
    Whitelist {
        /// YIP210 address (default: deploy or reuse the recorded one)
        #[arg(long)]
        yip210: Option<Address>,
    },

    /// Call YIP210.execute() directly from the deployer
    CallExecute {
        #[arg(long)]
        yip210: Option<Address>,
    },

    /// Pass the execute() proposal and report the new allocation
    Rebalance {
        #[arg(long)]
        yip210: Option<Address>,

        /// Expect the timelock to revert because no rebalance is due
        #[arg(long, conflicts_with = "inflow_steth")]
        expect_noop: bool,

        /// Stake this much ETH with Lido and move the stETH into the
        /// reserves first
        #[arg(long, value_name = "ETH")]
        inflow_steth: Option<String>,
    },

    /// Pass the depositWETHIntoStETH() proposal
    DepositWeth {
        #[arg(long)]
        yip210: Option<Address>,
    },

    /// Show the reserves allocation and whether it is within the band
    Allocation,

    /// Advance node time and mine one block
    Warp {
        /// How far, e.g. "2days" or "30d"
        #[arg(long)]
        by: humantime::Duration,
    },

    /// Display version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let Cli {
        config: config_override,
        rpc_url,
        command,
    } = cli;
    let config_path = config_override.unwrap_or_else(config::default_config_path);
    let load = || load_config(&config_path, rpc_url.clone());

    match command {
        Commands::InitConfig { path, force } => {
            init_config::execute(&path.unwrap_or_else(|| config_path.clone()), force)
        }
        Commands::Encode {
            action,
            yip210,
            json,
        } => encode::execute(&load()?, action, yip210, json),
        Commands::Deploy => deploy::execute(&load()?).await,
        Commands::Whitelist { yip210 } => whitelist::execute(&load()?, yip210).await,
        Commands::CallExecute { yip210 } => call_execute::execute(&load()?, yip210).await,
        Commands::Rebalance {
            yip210,
            expect_noop,
            inflow_steth,
        } => rebalance::execute(&load()?, yip210, expect_noop, inflow_steth).await,
        Commands::DepositWeth { yip210 } => deposit_weth::execute(&load()?, yip210).await,
        Commands::Allocation => allocation::execute(&load()?).await,
        Commands::Warp { by } => warp::execute(&load()?, by.into()).await,
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

/// Config file (or defaults) with CLI overrides applied and logging set up.
fn load_config(
    path: &Path,
    rpc_url: Option<String>,
) -> Result<Yip210Config, Box<dyn std::error::Error>> {
    let mut config = Yip210Config::load_or_default(path)?;
    if let Some(rpc_url) = rpc_url {
        config.network.rpc_url = rpc_url;
    }
    logging::init(&config.logging)?;
    Ok(config)
}

/// Connect to the configured node, spawning an Anvil fork if asked to.
pub async fn connect(config: &Yip210Config) -> Result<RpcForkClient, Box<dyn std::error::Error>> {
    let network = &config.network;
    if network.spawn_anvil {
        let fork_url = network
            .fork_url
            .as_deref()
            .ok_or("network.spawn_anvil is set but network.fork_url is missing")?;
        return Ok(RpcForkClient::spawn_fork(
            fork_url,
            network.fork_block_number,
            network.chain_id,
        )?);
    }
    Ok(RpcForkClient::connect(&network.rpc_url).await?)
}

/// `explicit` if given, otherwise the recorded (or freshly deployed) YIP210.
pub async fn resolve_yip210(
    client: &RpcForkClient,
    config: &Yip210Config,
    explicit: Option<Address>,
) -> Result<Address, Box<dyn std::error::Error>> {
    if let Some(address) = explicit {
        return Ok(address);
    }

    let deployment = ensure_deployed(
        client,
        &config.deploy.artifact,
        &config.deploy.deployments_dir,
        &config.network.name,
    )
    .await?;

    if !deployment.reused {
        println!(
            "Deployed YIP210 at {} (recorded in {})",
            deployment.record.address,
            record_path(&config.deploy.deployments_dir, &config.network.name).display()
        );
    }
    Ok(deployment.record.address)
}

pub fn scenario<'a>(
    client: &'a RpcForkClient,
    config: &Yip210Config,
) -> Result<Yip210Scenario<'a, RpcForkClient>, Box<dyn std::error::Error>> {
    Ok(Yip210Scenario::new(
        client,
        config.contracts,
        config.governance.settings()?,
        config.rebalance.band(),
    ))
}
