//! Trait abstraction for the fork node.
//!
//! Every interaction with the chain (cheatcodes included) goes through
//! [`ForkClient`], so the governance walker and scenarios run unchanged
//! against a live Anvil/Hardhat fork or against `MockForkClient`.

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;

/// A transaction sent from an unlocked (or impersonated) account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxCall {
    pub from: Address,
    /// `None` creates a contract from `data`.
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
}

impl TxCall {
    /// Contract call with no ETH attached.
    pub fn call(from: Address, to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            from,
            to: Some(to),
            value: U256::ZERO,
            data: data.into(),
        }
    }

    /// Plain ETH transfer.
    pub fn transfer(from: Address, to: Address, value: U256) -> Self {
        Self {
            from,
            to: Some(to),
            value,
            data: Bytes::new(),
        }
    }

    /// Contract creation.
    pub fn create(from: Address, init_code: impl Into<Bytes>) -> Self {
        Self {
            from,
            to: None,
            value: U256::ZERO,
            data: init_code.into(),
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Mined transaction summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub hash: B256,
    pub block_number: u64,
    pub contract_address: Option<Address>,
}

/// Result type for fork node operations.
pub type ForkResult<T> = Result<T, ForkError>;

/// Fork node errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForkError {
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The transaction or call reverted; carries the revert reason when the
    /// node reported one.
    #[error("execution reverted: {0}")]
    Reverted(String),

    #[error("failed to decode return data: {0}")]
    Decode(String),

    #[error("account {0} is not unlocked on the node")]
    NotUnlocked(Address),

    #[error("failed to spawn fork node: {0}")]
    Spawn(String),
}

impl ForkError {
    /// Revert reason, if this error is a revert.
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            Self::Reverted(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Fork node operations used by the proposal tooling.
#[async_trait]
pub trait ForkClient: Send + Sync {
    /// Accounts the node holds keys for (`eth_accounts`).
    async fn accounts(&self) -> ForkResult<Vec<Address>>;

    /// Latest block number.
    async fn block_number(&self) -> ForkResult<u64>;

    /// Timestamp of the latest block.
    async fn timestamp(&self) -> ForkResult<u64>;

    /// Let the node sign for `account` without its key.
    async fn impersonate(&self, account: Address) -> ForkResult<()>;

    /// Mine `blocks` empty blocks. Mining zero blocks is a no-op.
    async fn mine(&self, blocks: u64) -> ForkResult<()>;

    /// Move the node clock forward; takes effect on the next mined block.
    async fn increase_time(&self, seconds: u64) -> ForkResult<()>;

    /// Send a transaction and wait for it to be mined.
    async fn send(&self, tx: TxCall) -> ForkResult<TxOutcome>;

    /// Read-only call against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> ForkResult<Bytes>;

    /// Deployed code at `address` (empty for EOAs).
    async fn code_at(&self, address: Address) -> ForkResult<Bytes>;
}
