//! YIP210 end-to-end flows on a fork.
//!
//! The YIP210 contract does the actual rebalancing. These flows only set up
//! the chain, push the proposals through governance and read the reserves
//! before and after.

use crate::contracts::{ContractAddresses, IERC20, ILido, IYIP210};
use crate::governance::{
    GovernanceError, GovernanceSettings, GovernanceWalker, PassedProposal, ProposalId,
    TIMELOCK_EXECUTION_REVERTED,
};
use crate::node::{default_account, transact, ForkClient, ForkError, TxCall, TxOutcome};
use crate::proposal::actions::{deposit_weth_proposal, rebalance_proposal, whitelist_proposal};
use crate::treasury::{
    read_balance, read_snapshot, Allocation, AllocationBand, ReservesSnapshot, TreasuryError,
};
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use tracing::info;

/// Time skipped before a rebalance that should not trigger: one second
/// short of 30 days.
pub const NOOP_WARP_SECONDS: u64 = 2_591_999;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error(transparent)]
    Treasury(#[from] TreasuryError),

    #[error(transparent)]
    Fork(#[from] ForkError),

    #[error("proposal {0} executed but the rebalance was expected to revert")]
    UnexpectedExecution(ProposalId),

    #[error("execution reverted with {found:?}, expected {expected:?}")]
    WrongRevert { expected: String, found: String },
}

type Result<T> = std::result::Result<T, ScenarioError>;

/// Reserves before and after a rebalance proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebalanceReport {
    pub passed: PassedProposal,
    pub before: ReservesSnapshot,
    pub after: ReservesSnapshot,
    pub allocation_after: Allocation,
    pub within_band: bool,
}

impl RebalanceReport {
    /// USDC went out, stETH came in.
    pub fn sold_usdc(&self) -> bool {
        self.after.usdc_balance < self.before.usdc_balance
            && self.after.steth_balance > self.before.steth_balance
    }

    /// stETH went out, USDC came in.
    pub fn sold_steth(&self) -> bool {
        self.after.steth_balance < self.before.steth_balance
            && self.after.usdc_balance > self.before.usdc_balance
    }
}

/// Reserves balances after `depositWETHIntoStETH()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositReport {
    pub passed: PassedProposal,
    pub steth_balance: U256,
    pub weth_balance: U256,
}

/// The YIP210 flows, bound to one fork and contract layout.
pub struct Yip210Scenario<'a, C: ForkClient + ?Sized> {
    client: &'a C,
    contracts: ContractAddresses,
    walker: GovernanceWalker<'a, C>,
    band: AllocationBand,
}

impl<'a, C: ForkClient + ?Sized> Yip210Scenario<'a, C> {
    pub fn new(
        client: &'a C,
        contracts: ContractAddresses,
        settings: GovernanceSettings,
        band: AllocationBand,
    ) -> Self {
        Self {
            client,
            contracts,
            walker: GovernanceWalker::new(client, &contracts, settings),
            band,
        }
    }

    pub fn walker(&self) -> &GovernanceWalker<'a, C> {
        &self.walker
    }

    /// Grant YIP210 unlimited withdrawals of USDC, stETH and WETH.
    pub async fn whitelist(&self, yip210: Address) -> Result<PassedProposal> {
        let passed = self
            .walker
            .pass(&whitelist_proposal(&self.contracts, yip210))
            .await?;
        info!(proposal = %passed.id, %yip210, "withdrawals whitelisted");
        Ok(passed)
    }

    /// Pass the `execute()` proposal and compare the reserves.
    pub async fn rebalance(&self, yip210: Address) -> Result<RebalanceReport> {
        let before = read_snapshot(self.client, &self.contracts).await?;
        let passed = self.walker.pass(&rebalance_proposal(yip210)).await?;
        let after = read_snapshot(self.client, &self.contracts).await?;

        let allocation_after = after.allocation()?;
        let within_band = self.band.contains(&allocation_after);

        info!(
            proposal = %passed.id,
            allocation = %allocation_after,
            band = %self.band,
            within_band,
            "rebalance executed"
        );

        Ok(RebalanceReport {
            passed,
            before,
            after,
            allocation_after,
            within_band,
        })
    }

    /// Skip ahead, queue a rebalance and expect the timelock to revert it
    /// because the reserves are already close to target.
    pub async fn rebalance_expect_noop(&self, yip210: Address) -> Result<ProposalId> {
        self.client.increase_time(NOOP_WARP_SECONDS).await?;
        self.client.mine(1).await?;

        let id = self
            .walker
            .pass_until_queued(&rebalance_proposal(yip210))
            .await?;

        match self.walker.execute(id).await {
            Ok(_) => Err(ScenarioError::UnexpectedExecution(id)),
            Err(e) => {
                let reason = e.revert_reason().map(str::to_string);
                match reason.as_deref() {
                    Some(TIMELOCK_EXECUTION_REVERTED) => {
                        info!(proposal = %id, "rebalance reverted as expected");
                        Ok(id)
                    }
                    Some(other) => Err(ScenarioError::WrongRevert {
                        expected: TIMELOCK_EXECUTION_REVERTED.to_string(),
                        found: other.to_string(),
                    }),
                    None => Err(e.into()),
                }
            }
        }
    }

    /// Stake `amount` wei with Lido from the funder and move all of the
    /// funder's stETH into the reserves. Returns the amount moved.
    pub async fn inflow_steth(&self, amount: U256) -> Result<U256> {
        let funder = default_account(self.client).await?;

        let submit = ILido::submitCall {
            referral: Address::ZERO,
        };
        self.client
            .send(TxCall::call(funder, self.contracts.steth, submit.abi_encode()).with_value(amount))
            .await?;

        let balance = read_balance(self.client, self.contracts.steth, funder).await?;
        transact(
            self.client,
            funder,
            self.contracts.steth,
            &IERC20::transferCall {
                to: self.contracts.reserves,
                amount: balance,
            },
        )
        .await?;

        info!(%funder, steth = %balance, "stETH moved into reserves");
        Ok(balance)
    }

    /// Pass the `depositWETHIntoStETH()` proposal.
    pub async fn deposit_weth(&self, yip210: Address) -> Result<DepositReport> {
        let passed = self.walker.pass(&deposit_weth_proposal(yip210)).await?;

        let steth_balance =
            read_balance(self.client, self.contracts.steth, self.contracts.reserves).await?;
        let weth_balance =
            read_balance(self.client, self.contracts.weth, self.contracts.reserves).await?;

        info!(
            proposal = %passed.id,
            steth = %steth_balance,
            weth = %weth_balance,
            "WETH deposited into stETH"
        );

        Ok(DepositReport {
            passed,
            steth_balance,
            weth_balance,
        })
    }

    /// Call `YIP210.execute()` straight from the deployer, outside governance.
    pub async fn call_execute_directly(&self, yip210: Address) -> Result<TxOutcome> {
        let deployer = default_account(self.client).await?;
        let outcome = transact(self.client, deployer, yip210, &IYIP210::executeCall {}).await?;
        info!(%yip210, block = outcome.block_number, "YIP210.execute() called");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{BalanceChange, MockForkClient};
    use alloy::primitives::{address, I256};

    const WHALE_1: Address = address!("00000000000000000000000000000000000a11ce");
    const WHALE_2: Address = address!("0000000000000000000000000000000000000b0b");
    const YIP210: Address = address!("5fbdb2315678afecb367f032d93f642f64180aa3");

    fn ether(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18))
    }

    fn usdc(n: u64) -> U256 {
        U256::from(n) * U256::from(1_000_000u64)
    }

    fn setup() -> (MockForkClient, ContractAddresses) {
        let contracts = ContractAddresses::default();
        let client = MockForkClient::new(contracts);
        client.set_voting_power(WHALE_1, ether(150_000));
        client.set_voting_power(WHALE_2, ether(150_000));

        // $700k stETH, $300k USDC
        client.set_token_balance(contracts.steth, contracts.reserves, ether(400));
        client.set_token_balance(contracts.usdc, contracts.reserves, usdc(300_000));
        client.set_price(contracts.steth_usd_feed, I256::try_from(175_000_000_000i64).unwrap());
        client.set_price(contracts.usdc_usd_feed, I256::try_from(100_000_000i64).unwrap());
        (client, contracts)
    }

    fn scenario(client: &MockForkClient, contracts: ContractAddresses) -> Yip210Scenario<'_, MockForkClient> {
        Yip210Scenario::new(
            client,
            contracts,
            GovernanceSettings::new(vec![WHALE_1, WHALE_2]),
            AllocationBand::default(),
        )
    }

    #[tokio::test]
    async fn test_whitelist_targets_reserves() {
        let (client, contracts) = setup();
        let passed = scenario(&client, contracts).whitelist(YIP210).await.unwrap();

        assert_eq!(passed.description, "YIP210: whitelist proposal");
        let executed = client.executed_actions();
        assert_eq!(executed[0].target, contracts.reserves);
    }

    #[tokio::test]
    async fn test_rebalance_report() {
        let (client, contracts) = setup();
        let report = scenario(&client, contracts).rebalance(YIP210).await.unwrap();

        assert_eq!(report.passed.description, "YIP210: rebalacing framework");
        assert_eq!(report.allocation_after.steth_pct, 70);
        assert!(report.within_band);
        // Nothing queued with on_execute, so the balances stay put
        assert!(!report.sold_usdc());
        assert!(!report.sold_steth());
        assert_eq!(client.executed_actions()[0].target, YIP210);
    }

    #[tokio::test]
    async fn test_rebalance_sells_usdc_into_band() {
        let (client, contracts) = setup();
        // $525k stETH, $475k USDC
        client.set_token_balance(contracts.steth, contracts.reserves, ether(300));
        client.set_token_balance(contracts.usdc, contracts.reserves, usdc(475_000));
        client.on_execute(
            "execute()",
            vec![
                BalanceChange::debit(contracts.usdc, contracts.reserves, usdc(175_000)),
                BalanceChange::credit(contracts.steth, contracts.reserves, ether(100)),
            ],
        );

        let report = scenario(&client, contracts).rebalance(YIP210).await.unwrap();

        assert_eq!(report.before.allocation().unwrap().steth_pct, 52);
        assert!(report.sold_usdc());
        assert!(!report.sold_steth());
        assert_eq!(report.allocation_after, Allocation { steth_pct: 70, usdc_pct: 30 });
        assert!(report.within_band);
    }

    #[tokio::test]
    async fn test_rebalance_sells_steth_into_band() {
        let (client, contracts) = setup();
        // $4.2M stETH, $300k USDC
        client.set_token_balance(contracts.steth, contracts.reserves, ether(2400));
        client.on_execute(
            "execute()",
            vec![
                BalanceChange::debit(contracts.steth, contracts.reserves, ether(600)),
                BalanceChange::credit(contracts.usdc, contracts.reserves, usdc(1_050_000)),
            ],
        );

        let report = scenario(&client, contracts).rebalance(YIP210).await.unwrap();

        assert!(report.sold_steth());
        assert!(!report.sold_usdc());
        assert_eq!(report.allocation_after, Allocation { steth_pct: 70, usdc_pct: 30 });
        assert!(report.within_band);
    }

    #[tokio::test]
    async fn test_rebalance_reports_allocation_outside_band() {
        let (client, contracts) = setup();
        // Overshoots: $525k stETH left against $475k USDC
        client.on_execute(
            "execute()",
            vec![
                BalanceChange::debit(contracts.steth, contracts.reserves, ether(100)),
                BalanceChange::credit(contracts.usdc, contracts.reserves, usdc(175_000)),
            ],
        );

        let report = scenario(&client, contracts).rebalance(YIP210).await.unwrap();

        assert!(report.sold_steth());
        assert_eq!(report.allocation_after, Allocation { steth_pct: 52, usdc_pct: 47 });
        assert!(!report.within_band);
    }

    #[tokio::test]
    async fn test_rebalance_overdraw_reverts_in_timelock() {
        let (client, contracts) = setup();
        client.on_execute(
            "execute()",
            vec![BalanceChange::debit(contracts.usdc, contracts.reserves, usdc(300_001))],
        );

        let err = scenario(&client, contracts).rebalance(YIP210).await.unwrap_err();

        assert!(err.to_string().contains(TIMELOCK_EXECUTION_REVERTED));
        assert_eq!(
            client.token_balance(contracts.usdc, contracts.reserves),
            usdc(300_000)
        );
        assert!(client.executed_actions().is_empty());
    }

    #[tokio::test]
    async fn test_rebalance_expect_noop() {
        let (client, contracts) = setup();
        client.revert_on_signature("execute()");
        let start = client.timestamp().await.unwrap();

        let id = scenario(&client, contracts)
            .rebalance_expect_noop(YIP210)
            .await
            .unwrap();

        assert_eq!(id, ProposalId(U256::from(1)));
        assert!(client.timestamp().await.unwrap() >= start + NOOP_WARP_SECONDS);
        assert!(client.executed_actions().is_empty());
    }

    #[tokio::test]
    async fn test_rebalance_expect_noop_fails_when_executed() {
        let (client, contracts) = setup();
        let result = scenario(&client, contracts).rebalance_expect_noop(YIP210).await;
        assert!(matches!(result, Err(ScenarioError::UnexpectedExecution(_))));
    }

    #[tokio::test]
    async fn test_inflow_steth_moves_everything_to_reserves() {
        let (client, contracts) = setup();
        let funder = default_account(&client).await.unwrap();

        let moved = scenario(&client, contracts).inflow_steth(ether(2000)).await.unwrap();

        assert_eq!(moved, ether(2000));
        assert_eq!(client.token_balance(contracts.steth, funder), U256::ZERO);
        assert_eq!(
            client.token_balance(contracts.steth, contracts.reserves),
            ether(2400)
        );
    }

    #[tokio::test]
    async fn test_deposit_weth_reports_balances() {
        let (client, contracts) = setup();
        let report = scenario(&client, contracts).deposit_weth(YIP210).await.unwrap();

        assert_eq!(report.steth_balance, ether(400));
        assert_eq!(report.weth_balance, U256::ZERO);
        assert_eq!(
            client.executed_actions()[0].signature,
            "depositWETHIntoStETH()"
        );
    }

    #[tokio::test]
    async fn test_call_execute_directly_sends_selector() {
        let (client, contracts) = setup();
        scenario(&client, contracts)
            .call_execute_directly(YIP210)
            .await
            .unwrap();

        let sent = client.sent_transactions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, Some(YIP210));
        assert_eq!(&sent[0].data[..], IYIP210::executeCall::SELECTOR.as_slice());
    }
}
