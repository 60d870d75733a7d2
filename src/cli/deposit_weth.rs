use super::config::Yip210Config;
use alloy::primitives::utils::format_ether;
use alloy::primitives::Address;

/// Pass the depositWETHIntoStETH() proposal and show the reserves balances
pub async fn execute(
    config: &Yip210Config,
    yip210: Option<Address>,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = super::connect(config).await?;
    let yip210 = super::resolve_yip210(&client, config, yip210).await?;

    let report = super::scenario(&client, config)?.deposit_weth(yip210).await?;

    println!(
        "✅ Proposal {} executed: {}",
        report.passed.id, report.passed.description
    );
    println!("  Reserves stETH: {}", format_ether(report.steth_balance));
    println!("  Reserves WETH:  {}", format_ether(report.weth_balance));

    if report.steth_balance.is_zero() || !report.weth_balance.is_zero() {
        return Err("reserves still hold WETH or no stETH after the deposit".into());
    }
    Ok(())
}
