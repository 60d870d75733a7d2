use super::allocation::{print_allocation, print_snapshot};
use super::config::Yip210Config;
use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::Address;

/// Pass the execute() proposal and check the resulting allocation
///
/// With `expect_noop`, succeeds only if the timelock reverts the execution
/// because the reserves are already near target.
pub async fn execute(
    config: &Yip210Config,
    yip210: Option<Address>,
    expect_noop: bool,
    inflow_steth: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let inflow = inflow_steth
        .as_deref()
        .map(parse_ether)
        .transpose()
        .map_err(|e| format!("invalid --inflow-steth: {}", e))?;

    let client = super::connect(config).await?;
    let yip210 = super::resolve_yip210(&client, config, yip210).await?;
    let scenario = super::scenario(&client, config)?;

    if expect_noop {
        let id = scenario.rebalance_expect_noop(yip210).await?;
        println!("✅ Proposal {} reverted in the timelock: no rebalance due", id);
        return Ok(());
    }

    if let Some(amount) = inflow {
        let moved = scenario.inflow_steth(amount).await?;
        println!("Moved {} stETH into the reserves", format_ether(moved));
    }

    let report = scenario.rebalance(yip210).await?;

    println!(
        "✅ Proposal {} executed: {}",
        report.passed.id, report.passed.description
    );
    print_snapshot("Before", &report.before);
    print_snapshot("After", &report.after);

    let direction = if report.sold_usdc() {
        "sold USDC for stETH"
    } else if report.sold_steth() {
        "sold stETH for USDC"
    } else {
        "balances unchanged"
    };
    println!("  Direction: {}", direction);

    if !print_allocation(&report.after, &config.rebalance.band())? {
        return Err("allocation after rebalance is outside the band".into());
    }
    Ok(())
}
