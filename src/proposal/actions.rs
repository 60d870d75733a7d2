//! The YIP210 action catalogue.
//!
//! Three calls make up the YIP210 rollout:
//! 1. Reserves `whitelistWithdrawals` granting YIP210 unlimited withdrawals of
//!    USDC, stETH and WETH
//! 2. YIP210 `execute()` to run one rebalancing pass
//! 3. YIP210 `depositWETHIntoStETH()` to convert the WETH held by the reserves

use super::{Proposal, ProposalAction};
use crate::contracts::ContractAddresses;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolValue;

pub const WHITELIST_SIGNATURE: &str = "whitelistWithdrawals(address[],uint256[],address[])";
pub const EXECUTE_SIGNATURE: &str = "execute()";
pub const DEPOSIT_WETH_SIGNATURE: &str = "depositWETHIntoStETH()";

pub const WHITELIST_DESCRIPTION: &str = "YIP210: whitelist proposal";
// Spelling matches the description already used on-chain.
pub const REBALANCE_DESCRIPTION: &str = "YIP210: rebalacing framework";
pub const DEPOSIT_WETH_DESCRIPTION: &str = "YIP210: depositing weth into steth";

/// Reserves call whitelisting `yip210` to withdraw an unlimited amount of
/// each of `tokens`.
///
/// Arguments are `abi.encode(whos, amounts, tokens)` where every `whos[i]`
/// is `yip210` and every `amounts[i]` is `type(uint256).max`.
pub fn whitelist_withdrawals(reserves: Address, yip210: Address, tokens: &[Address]) -> ProposalAction {
    let whos = vec![yip210; tokens.len()];
    let amounts = vec![U256::MAX; tokens.len()];
    let calldata = (whos, amounts, tokens.to_vec()).abi_encode_params();

    ProposalAction {
        target: reserves,
        value: U256::ZERO,
        signature: WHITELIST_SIGNATURE.to_string(),
        calldata: calldata.into(),
    }
}

/// YIP210 `execute()`: one rebalancing pass.
pub fn call_execute(yip210: Address) -> ProposalAction {
    ProposalAction {
        target: yip210,
        value: U256::ZERO,
        signature: EXECUTE_SIGNATURE.to_string(),
        calldata: Bytes::new(),
    }
}

/// YIP210 `depositWETHIntoStETH()`.
pub fn deposit_weth_into_steth(yip210: Address) -> ProposalAction {
    ProposalAction {
        target: yip210,
        value: U256::ZERO,
        signature: DEPOSIT_WETH_SIGNATURE.to_string(),
        calldata: Bytes::new(),
    }
}

pub fn whitelist_proposal(contracts: &ContractAddresses, yip210: Address) -> Proposal {
    Proposal::single(
        WHITELIST_DESCRIPTION,
        whitelist_withdrawals(contracts.reserves, yip210, &contracts.whitelisted_tokens()),
    )
}

pub fn rebalance_proposal(yip210: Address) -> Proposal {
    Proposal::single(REBALANCE_DESCRIPTION, call_execute(yip210))
}

pub fn deposit_weth_proposal(yip210: Address) -> Proposal {
    Proposal::single(DEPOSIT_WETH_DESCRIPTION, deposit_weth_into_steth(yip210))
}
