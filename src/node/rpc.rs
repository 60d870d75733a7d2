//! JSON-RPC fork client backed by an alloy provider.
//!
//! Cheatcodes use the `hardhat_*`/`evm_*` method names, which both Hardhat
//! Network and Anvil accept.
//!
//! The provider carries no fillers. Transactions go out unsigned through
//! `eth_sendTransaction` and the node assigns nonce and fees for the
//! unlocked or impersonated sender, so a send whose gas estimate reverts
//! leaves the sender's next nonce untouched.

use super::traits::*;
use alloy::eips::BlockNumberOrTag;
use alloy::node_bindings::{Anvil, AnvilInstance};
use alloy::primitives::{Address, Bytes, TxKind};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

/// Fork client over HTTP JSON-RPC.
pub struct RpcForkClient {
    provider: DynProvider,
    // Keeps a spawned Anvil alive for as long as the client exists.
    _anvil: Option<AnvilInstance>,
}

impl RpcForkClient {
    /// Connect to an already running node (e.g. `anvil --fork-url ...`).
    pub async fn connect(rpc_url: &str) -> ForkResult<Self> {
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect(rpc_url)
            .await
            .map_err(|e| ForkError::Rpc(format!("failed to connect to {}: {}", rpc_url, e)))?
            .erased();

        info!(rpc_url, "connected to fork node");

        Ok(Self {
            provider,
            _anvil: None,
        })
    }

    /// Spawn Anvil forking `fork_url` at `fork_block` and connect to it.
    pub fn spawn_fork(fork_url: &str, fork_block: u64, chain_id: u64) -> ForkResult<Self> {
        let anvil = Anvil::new()
            .fork(fork_url)
            .fork_block_number(fork_block)
            .chain_id(chain_id)
            .try_spawn()
            .map_err(|e| ForkError::Spawn(e.to_string()))?;

        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(anvil.endpoint_url())
            .erased();

        info!(
            endpoint = %anvil.endpoint(),
            fork_block,
            chain_id,
            "spawned anvil fork"
        );

        Ok(Self {
            provider,
            _anvil: Some(anvil),
        })
    }

    async fn cheat(&self, method: &'static str, params: Value) -> ForkResult<Value> {
        debug!(method, %params, "cheatcode");
        self.provider
            .raw_request::<_, Value>(method.into(), params)
            .await
            .map_err(|e| ForkError::Rpc(format!("{} failed: {}", method, e)))
    }
}

/// Map a node error message to [`ForkError`], extracting the revert reason
/// from the Anvil and Hardhat message formats.
pub fn classify_error(message: &str) -> ForkError {
    match revert_reason(message) {
        Some(reason) => ForkError::Reverted(reason),
        None => ForkError::Rpc(message.to_string()),
    }
}

fn revert_reason(message: &str) -> Option<String> {
    // Hardhat: "... reverted with reason string 'Timelock::...'"
    const HARDHAT: &str = "reverted with reason string '";
    if let Some(start) = message.find(HARDHAT) {
        let rest = &message[start + HARDHAT.len()..];
        let end = rest.find('\'').unwrap_or(rest.len());
        return Some(rest[..end].to_string());
    }

    // Anvil: "... execution reverted: Timelock::..., data: \"0x08c3...\""
    const ANVIL: &str = "execution reverted: ";
    if let Some(start) = message.find(ANVIL) {
        let rest = &message[start + ANVIL.len()..];
        let end = rest.find(", data:").unwrap_or(rest.len());
        return Some(rest[..end].trim().to_string());
    }

    if message.contains("revert") {
        return Some(String::new());
    }

    None
}

#[async_trait]
impl ForkClient for RpcForkClient {
    async fn accounts(&self) -> ForkResult<Vec<Address>> {
        self.provider
            .get_accounts()
            .await
            .map_err(|e| ForkError::Rpc(e.to_string()))
    }

    async fn block_number(&self) -> ForkResult<u64> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ForkError::Rpc(e.to_string()))
    }

    async fn timestamp(&self) -> ForkResult<u64> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| ForkError::Rpc(e.to_string()))?
            .ok_or_else(|| ForkError::Rpc("node has no latest block".to_string()))?;

        Ok(block.header.timestamp)
    }

    async fn impersonate(&self, account: Address) -> ForkResult<()> {
        self.cheat("hardhat_impersonateAccount", json!([account]))
            .await
            .map(|_| ())
    }

    async fn mine(&self, blocks: u64) -> ForkResult<()> {
        if blocks == 0 {
            return Ok(());
        }
        self.cheat("hardhat_mine", json!([format!("{:#x}", blocks)]))
            .await
            .map(|_| ())
    }

    async fn increase_time(&self, seconds: u64) -> ForkResult<()> {
        self.cheat("evm_increaseTime", json!([seconds]))
            .await
            .map(|_| ())
    }

    async fn send(&self, tx: TxCall) -> ForkResult<TxOutcome> {
        let mut request = TransactionRequest::default()
            .from(tx.from)
            .value(tx.value)
            .input(tx.data.into());
        request.to = Some(match tx.to {
            Some(to) => TxKind::Call(to),
            None => TxKind::Create,
        });

        // Estimate first so a revert surfaces with its reason instead of a
        // mined failed transaction.
        let gas = self
            .provider
            .estimate_gas(request.clone())
            .await
            .map_err(|e| classify_error(&e.to_string()))?;

        let pending = self
            .provider
            .send_transaction(request.gas_limit(gas))
            .await
            .map_err(|e| classify_error(&e.to_string()))?;

        // Forks automine, so the receipt is usually there already
        let hash = *pending.tx_hash();
        let receipt = match self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| ForkError::Rpc(e.to_string()))?
        {
            Some(receipt) => receipt,
            None => pending
                .get_receipt()
                .await
                .map_err(|e| ForkError::Rpc(e.to_string()))?,
        };

        if !receipt.status() {
            return Err(ForkError::Reverted(format!(
                "transaction {} failed",
                receipt.transaction_hash
            )));
        }

        Ok(TxOutcome {
            hash: receipt.transaction_hash,
            block_number: receipt.block_number.unwrap_or_default(),
            contract_address: receipt.contract_address,
        })
    }

    async fn call(&self, to: Address, data: Bytes) -> ForkResult<Bytes> {
        let request = TransactionRequest::default().to(to).input(data.into());
        self.provider
            .call(request)
            .await
            .map_err(|e| classify_error(&e.to_string()))
    }

    async fn code_at(&self, address: Address) -> ForkResult<Bytes> {
        self.provider
            .get_code_at(address)
            .await
            .map_err(|e| ForkError::Rpc(e.to_string()))
    }
}
