//! Fork node access.
//!
//! [`ForkClient`] is the seam between the YIP210 flows and the chain:
//! [`RpcForkClient`] talks JSON-RPC to Anvil or Hardhat, [`MockForkClient`]
//! models the governor, timelock and token contracts in memory.

pub mod mock;
pub mod rpc;
pub mod traits;

pub use mock::{BalanceChange, MockForkClient};
pub use rpc::RpcForkClient;
pub use traits::{ForkClient, ForkError, ForkResult, TxCall, TxOutcome};

use alloy::primitives::Address;
use alloy::sol_types::SolCall;

/// Typed read-only call.
pub async fn view<F, C>(client: &F, to: Address, call: &C) -> ForkResult<C::Return>
where
    F: ForkClient + ?Sized,
    C: SolCall + Sync,
{
    let data = client.call(to, call.abi_encode().into()).await?;
    C::abi_decode_returns(&data).map_err(|e| {
        ForkError::Decode(format!("{} returned {} bytes: {}", C::SIGNATURE, data.len(), e))
    })
}

/// Typed state-changing call from `from`, waiting for it to be mined.
pub async fn transact<F, C>(client: &F, from: Address, to: Address, call: &C) -> ForkResult<TxOutcome>
where
    F: ForkClient + ?Sized,
    C: SolCall + Sync,
{
    client.send(TxCall::call(from, to, call.abi_encode())).await
}

/// First unlocked account, used as funder and deployer like Hardhat's
/// `getSigners()[0]`.
pub async fn default_account<F: ForkClient + ?Sized>(client: &F) -> ForkResult<Address> {
    client
        .accounts()
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ForkError::Rpc("node exposes no unlocked accounts".to_string()))
}
