//! Reserves valuation and the 70/30 allocation band.
//!
//! Values are USD scaled by 1e18. Chainlink answers carry 8 decimals,
//! stETH 18 and USDC 6.

use crate::contracts::{AggregatorV3Interface, ContractAddresses, IERC20};
use crate::node::{view, ForkClient, ForkError};
use alloy::primitives::{Address, I256, U256};
use std::fmt;

/// Treasury errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreasuryError {
    #[error("reserves hold neither USDC nor stETH")]
    EmptyReserves,

    #[error("price feed {0} returned a negative answer")]
    NegativePrice(Address),

    #[error("valuation overflowed")]
    Overflow,

    #[error(transparent)]
    Fork(#[from] ForkError),
}

type Result<T> = std::result::Result<T, TreasuryError>;

/// Balances and prices read from the fork at one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservesSnapshot {
    pub usdc_balance: U256,
    pub steth_balance: U256,
    /// Chainlink USDC/USD answer (8 decimals).
    pub usdc_price: U256,
    /// Chainlink stETH/USD answer (8 decimals).
    pub steth_price: U256,
}

impl ReservesSnapshot {
    /// `steth_price / 1e8 * steth_balance`
    ///
    /// The price is truncated to whole dollars before scaling, matching
    /// how the rebalance thresholds were calibrated.
    pub fn steth_value(&self) -> Result<U256> {
        (self.steth_price / U256::from(100_000_000u64))
            .checked_mul(self.steth_balance)
            .ok_or(TreasuryError::Overflow)
    }

    /// `usdc_price * 1e4 * usdc_balance`
    pub fn usdc_value(&self) -> Result<U256> {
        self.usdc_price
            .checked_mul(U256::from(10_000u64))
            .and_then(|v| v.checked_mul(self.usdc_balance))
            .ok_or(TreasuryError::Overflow)
    }

    pub fn allocation(&self) -> Result<Allocation> {
        Allocation::from_values(self.steth_value()?, self.usdc_value()?)
    }
}

/// Percentage split of the reserves between stETH and USDC.
///
/// Both percentages are floored, so they may sum to 99.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub steth_pct: u64,
    pub usdc_pct: u64,
}

impl Allocation {
    pub fn from_values(steth_value: U256, usdc_value: U256) -> Result<Self> {
        let total = steth_value
            .checked_add(usdc_value)
            .ok_or(TreasuryError::Overflow)?;
        if total.is_zero() {
            return Err(TreasuryError::EmptyReserves);
        }

        let pct = |value: U256| -> Result<u64> {
            let scaled = value
                .checked_mul(U256::from(100u64))
                .ok_or(TreasuryError::Overflow)?;
            // value <= total, so the quotient is at most 100
            Ok(u64::try_from(scaled / total).unwrap_or(100))
        };

        Ok(Self {
            steth_pct: pct(steth_value)?,
            usdc_pct: pct(usdc_value)?,
        })
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}% stETH / {}% USDC", self.steth_pct, self.usdc_pct)
    }
}

/// Target stETH share and the tolerance around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationBand {
    pub target_steth_pct: u64,
    pub tolerance_pct: u64,
}

impl Default for AllocationBand {
    fn default() -> Self {
        Self {
            target_steth_pct: 70,
            tolerance_pct: 5,
        }
    }
}

impl AllocationBand {
    /// Both shares strictly inside their target ± tolerance.
    pub fn contains(&self, allocation: &Allocation) -> bool {
        let tolerance = self.tolerance_pct as i64;
        let steth_target = self.target_steth_pct as i64;
        let usdc_target = 100 - steth_target;

        let within = |pct: u64, target: i64| {
            let pct = pct as i64;
            pct > target - tolerance && pct < target + tolerance
        };

        within(allocation.steth_pct, steth_target) && within(allocation.usdc_pct, usdc_target)
    }

    /// Signed distance of the stETH share from the target, in percent.
    pub fn drift(&self, allocation: &Allocation) -> i64 {
        allocation.steth_pct as i64 - self.target_steth_pct as i64
    }
}

impl fmt::Display for AllocationBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ± {}",
            self.target_steth_pct,
            100u64.saturating_sub(self.target_steth_pct),
            self.tolerance_pct
        )
    }
}

/// ERC-20 balance of `holder`.
pub async fn read_balance<C: ForkClient + ?Sized>(
    client: &C,
    token: Address,
    holder: Address,
) -> Result<U256> {
    Ok(view(client, token, &IERC20::balanceOfCall { account: holder }).await?)
}

async fn read_price<C: ForkClient + ?Sized>(client: &C, feed: Address) -> Result<U256> {
    let round = view(client, feed, &AggregatorV3Interface::latestRoundDataCall {}).await?;
    price_from_answer(feed, round.answer)
}

fn price_from_answer(feed: Address, answer: I256) -> Result<U256> {
    if answer.is_negative() {
        return Err(TreasuryError::NegativePrice(feed));
    }
    Ok(answer.into_raw())
}

/// Reserves USDC and stETH balances plus both Chainlink prices.
pub async fn read_snapshot<C: ForkClient + ?Sized>(
    client: &C,
    contracts: &ContractAddresses,
) -> Result<ReservesSnapshot> {
    let usdc_balance = read_balance(client, contracts.usdc, contracts.reserves).await?;
    let steth_balance = read_balance(client, contracts.steth, contracts.reserves).await?;
    let usdc_price = read_price(client, contracts.usdc_usd_feed).await?;
    let steth_price = read_price(client, contracts.steth_usd_feed).await?;

    Ok(ReservesSnapshot {
        usdc_balance,
        steth_balance,
        usdc_price,
        steth_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::MockForkClient;
    use proptest::prelude::*;

    fn ether(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18))
    }

    fn usdc(n: u64) -> U256 {
        U256::from(n) * U256::from(1_000_000u64)
    }

    fn price(dollars: u64) -> U256 {
        U256::from(dollars) * U256::from(100_000_000u64)
    }

    #[test]
    fn test_values_share_scale() {
        // 1 stETH at $1000 and 1000 USDC at $1 are worth the same
        let snapshot = ReservesSnapshot {
            usdc_balance: usdc(1000),
            steth_balance: ether(1),
            usdc_price: price(1),
            steth_price: price(1000),
        };

        assert_eq!(snapshot.steth_value().unwrap(), ether(1000));
        assert_eq!(snapshot.usdc_value().unwrap(), ether(1000));
        assert_eq!(
            snapshot.allocation().unwrap(),
            Allocation {
                steth_pct: 50,
                usdc_pct: 50
            }
        );
    }

    #[test]
    fn test_steth_price_truncated_to_whole_dollars() {
        // $1750.99 counts as $1750: 700,000 vs 360,700 lands on 65%, outside the band
        let snapshot = ReservesSnapshot {
            usdc_balance: usdc(360_700),
            steth_balance: ether(400),
            usdc_price: price(1),
            steth_price: U256::from(175_099_000_000u64),
        };

        assert_eq!(snapshot.steth_value().unwrap(), ether(700_000));
        let alloc = snapshot.allocation().unwrap();
        assert_eq!(alloc, Allocation { steth_pct: 65, usdc_pct: 34 });
        assert!(!AllocationBand::default().contains(&alloc));
    }

    #[test]
    fn test_allocation_floors() {
        let alloc = Allocation::from_values(U256::from(2), U256::from(1)).unwrap();
        assert_eq!(alloc.steth_pct, 66);
        assert_eq!(alloc.usdc_pct, 33);
    }

    #[test]
    fn test_empty_reserves() {
        assert_eq!(
            Allocation::from_values(U256::ZERO, U256::ZERO),
            Err(TreasuryError::EmptyReserves)
        );
    }

    #[test]
    fn test_overflow_detected() {
        let snapshot = ReservesSnapshot {
            usdc_balance: U256::MAX,
            steth_balance: U256::ZERO,
            usdc_price: price(1),
            steth_price: U256::ZERO,
        };
        assert_eq!(snapshot.usdc_value(), Err(TreasuryError::Overflow));
    }

    #[test]
    fn test_band_is_strict() {
        let band = AllocationBand::default();
        let alloc = |steth_pct, usdc_pct| Allocation {
            steth_pct,
            usdc_pct,
        };

        assert!(band.contains(&alloc(70, 30)));
        assert!(band.contains(&alloc(74, 26)));
        assert!(band.contains(&alloc(66, 33)));
        assert!(!band.contains(&alloc(75, 25)));
        assert!(!band.contains(&alloc(65, 35)));
        assert!(!band.contains(&alloc(50, 50)));
    }

    #[test]
    fn test_drift() {
        let band = AllocationBand::default();
        let over = Allocation {
            steth_pct: 82,
            usdc_pct: 18,
        };
        let under = Allocation {
            steth_pct: 61,
            usdc_pct: 39,
        };
        assert_eq!(band.drift(&over), 12);
        assert_eq!(band.drift(&under), -9);
        assert_eq!(band.to_string(), "70/30 ± 5");
    }

    #[test]
    fn test_negative_price_rejected() {
        let feed = Address::with_last_byte(1);
        assert_eq!(
            price_from_answer(feed, I256::MINUS_ONE),
            Err(TreasuryError::NegativePrice(feed))
        );
        assert_eq!(price_from_answer(feed, I256::ONE), Ok(U256::from(1)));
    }

    #[tokio::test]
    async fn test_read_snapshot_from_fork() {
        let contracts = ContractAddresses::default();
        let client = MockForkClient::new(contracts);
        client.set_token_balance(contracts.usdc, contracts.reserves, usdc(300_000));
        client.set_token_balance(contracts.steth, contracts.reserves, ether(400));
        client.set_price(contracts.usdc_usd_feed, I256::try_from(100_000_000i64).unwrap());
        client.set_price(
            contracts.steth_usd_feed,
            I256::try_from(175_000_000_000i64).unwrap(),
        );

        let snapshot = read_snapshot(&client, &contracts).await.unwrap();
        assert_eq!(snapshot.usdc_balance, usdc(300_000));
        assert_eq!(snapshot.steth_balance, ether(400));
        assert_eq!(snapshot.steth_price, price(1750));

        // $700k stETH vs $300k USDC
        let alloc = snapshot.allocation().unwrap();
        assert_eq!(alloc, Allocation { steth_pct: 70, usdc_pct: 30 });
        assert!(AllocationBand::default().contains(&alloc));
    }

    #[tokio::test]
    async fn test_missing_feed_is_fork_error() {
        let contracts = ContractAddresses::default();
        let client = MockForkClient::new(contracts);
        let result = read_snapshot(&client, &contracts).await;
        assert!(matches!(result, Err(TreasuryError::Fork(ForkError::Reverted(_)))));
    }

    proptest! {
        #[test]
        fn prop_shares_never_exceed_100(steth in 0u64..u64::MAX, usdc in 0u64..u64::MAX) {
            prop_assume!(steth > 0 || usdc > 0);
            let alloc = Allocation::from_values(U256::from(steth), U256::from(usdc)).unwrap();
            prop_assert!(alloc.steth_pct <= 100);
            prop_assert!(alloc.usdc_pct <= 100);
            prop_assert!(alloc.steth_pct + alloc.usdc_pct >= 99);
            prop_assert!(alloc.steth_pct + alloc.usdc_pct <= 100);
        }

        #[test]
        fn prop_drift_matches_band_center(steth_pct in 0u64..=100) {
            let band = AllocationBand::default();
            let alloc = Allocation { steth_pct, usdc_pct: 100 - steth_pct };
            prop_assert_eq!(band.contains(&alloc), band.drift(&alloc).abs() < 5);
        }
    }
}
