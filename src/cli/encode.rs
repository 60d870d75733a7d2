use super::config::Yip210Config;
use alloy::primitives::Address;
use clap::ValueEnum;
use serde_json::json;
use std::fmt::Write;
use yip210::contracts::ContractAddresses;
use yip210::proposal::actions::{deposit_weth_proposal, rebalance_proposal, whitelist_proposal};
use yip210::proposal::Proposal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EncodeAction {
    /// Reserves.whitelistWithdrawals for USDC, stETH and WETH
    Whitelist,
    /// YIP210.execute()
    Execute,
    /// YIP210.depositWETHIntoStETH()
    DepositWeth,
}

impl EncodeAction {
    pub fn proposal(self, contracts: &ContractAddresses, yip210: Address) -> Proposal {
        match self {
            Self::Whitelist => whitelist_proposal(contracts, yip210),
            Self::Execute => rebalance_proposal(yip210),
            Self::DepositWeth => deposit_weth_proposal(yip210),
        }
    }
}

/// Print the (target, value, signature, calldata) tuple of a YIP210 action
pub fn execute(
    config: &Yip210Config,
    action: EncodeAction,
    yip210: Address,
    as_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let proposal = action.proposal(&config.contracts, yip210);
    print!("{}", render(&proposal, as_json)?);
    Ok(())
}

fn render(proposal: &Proposal, as_json: bool) -> Result<String, Box<dyn std::error::Error>> {
    if as_json {
        let actions: Vec<_> = proposal
            .actions
            .iter()
            .map(|a| {
                json!({
                    "target": a.target,
                    "value": a.value.to_string(),
                    "signature": a.signature,
                    "calldata": a.calldata,
                    "fullCalldata": a.full_calldata(),
                })
            })
            .collect();
        let out = json!({
            "description": proposal.description,
            "actions": actions,
        });
        return Ok(format!("{}\n", serde_json::to_string_pretty(&out)?));
    }

    let mut out = String::new();
    writeln!(out, "description:   {}", proposal.description)?;
    for action in &proposal.actions {
        writeln!(out)?;
        writeln!(out, "target:        {}", action.target)?;
        writeln!(out, "value:         {}", action.value)?;
        writeln!(out, "signature:     {}", action.signature)?;
        writeln!(out, "calldata:      {}", action.calldata)?;
        writeln!(out, "full calldata: {}", action.full_calldata())?;
    }
    Ok(out)
}
