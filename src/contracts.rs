//! Contract interfaces and mainnet addresses touched by YIP210.
//!
//! Only the ABI surface the proposal tooling needs is declared here. The
//! governor, timelock, reserves and YIP210 contracts themselves are external.

use alloy::primitives::{address, Address};
use alloy::sol;
use serde::{Deserialize, Serialize};

sol! {
    /// YAM GovernorAlpha.
    interface IGovernorAlpha {
        function propose(
            address[] targets,
            uint256[] values,
            string[] signatures,
            bytes[] calldatas,
            string description
        ) external returns (uint256);
        function castVote(uint256 proposalId, bool support) external;
        function queue(uint256 proposalId) external;
        function execute(uint256 proposalId) external payable;
        function state(uint256 proposalId) external view returns (uint8);
        function latestProposalIds(address proposer) external view returns (uint256);
        function votingDelay() external view returns (uint256);
        function votingPeriod() external view returns (uint256);
    }

    /// Compound-style timelock owned by the governor.
    interface ITimelock {
        function delay() external view returns (uint256);
        function GRACE_PERIOD() external view returns (uint256);
    }

    /// YAM Reserves withdrawal permissions.
    interface IReserves {
        function whitelistWithdrawals(
            address[] whos,
            uint256[] amounts,
            address[] tokens
        ) external;
    }

    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
    }

    interface ILido {
        function submit(address referral) external payable returns (uint256);
    }

    interface AggregatorV3Interface {
        function latestRoundData()
            external
            view
            returns (
                uint80 roundId,
                int256 answer,
                uint256 startedAt,
                uint256 updatedAt,
                uint80 answeredInRound
            );
    }

    /// The YIP210 proposal contract.
    interface IYIP210 {
        function execute() external;
        function depositWETHIntoStETH() external;
    }
}

/// Addresses of every contract the YIP210 flows read from or call into.
///
/// Defaults are Ethereum mainnet, so a fork of mainnet works without a
/// `[contracts]` section in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractAddresses {
    pub governor: Address,
    pub timelock: Address,
    pub reserves: Address,
    pub usdc: Address,
    pub steth: Address,
    pub weth: Address,
    pub steth_usd_feed: Address,
    pub usdc_usd_feed: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            governor: address!("2da253835967d6e721c6c077157f9c9742934aea"),
            timelock: address!("8b4f1616751117c38a0f84f9a146cca191ea3ec5"),
            reserves: address!("97990b693835da58a281636296d2bf02787dea17"),
            usdc: address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
            steth: address!("ae7ab96520de3a18e5e111b5eaab095312d7fe84"),
            weth: address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
            steth_usd_feed: address!("cfe54b5cd566ab89272946f602d76ea879cab4a8"),
            usdc_usd_feed: address!("8fffffd4afb6115b954bd326cbe7b4ba576818f6"),
        }
    }
}

impl ContractAddresses {
    /// Tokens YIP210 is allowed to withdraw from the reserves, in whitelist order.
    pub fn whitelisted_tokens(&self) -> [Address; 3] {
        [self.usdc, self.steth, self.weth]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolCall;

    #[test]
    fn test_whitelisted_tokens_order() {
        let contracts = ContractAddresses::default();
        assert_eq!(
            contracts.whitelisted_tokens(),
            [contracts.usdc, contracts.steth, contracts.weth]
        );
    }

    #[test]
    fn test_default_addresses_are_distinct() {
        let c = ContractAddresses::default();
        let all = [
            c.governor,
            c.timelock,
            c.reserves,
            c.usdc,
            c.steth,
            c.weth,
            c.steth_usd_feed,
            c.usdc_usd_feed,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_yip210_execute_selector() {
        // Well-known selector of `execute()`
        assert_eq!(IYIP210::executeCall::SELECTOR, [0x61, 0x46, 0x19, 0x54]);
    }

    #[test]
    fn test_governor_signatures() {
        assert_eq!(
            IGovernorAlpha::castVoteCall::SIGNATURE,
            "castVote(uint256,bool)"
        );
        assert_eq!(
            IGovernorAlpha::proposeCall::SIGNATURE,
            "propose(address[],uint256[],string[],bytes[],string)"
        );
    }
}
