use super::config::Yip210Config;
use alloy::primitives::utils::{format_ether, format_units};
use alloy::primitives::U256;
use yip210::treasury::{read_snapshot, AllocationBand, ReservesSnapshot};

/// Show the reserves allocation against the configured band
pub async fn execute(config: &Yip210Config) -> Result<(), Box<dyn std::error::Error>> {
    let client = super::connect(config).await?;
    let snapshot = read_snapshot(&client, &config.contracts).await?;

    print_snapshot("Reserves", &snapshot);
    print_allocation(&snapshot, &config.rebalance.band())?;
    Ok(())
}

fn usd(answer: U256) -> String {
    format_units(answer, 8).unwrap_or_else(|_| answer.to_string())
}

pub fn print_snapshot(title: &str, snapshot: &ReservesSnapshot) {
    println!("{}:", title);
    println!(
        "  USDC:  {} (@ ${})",
        format_units(snapshot.usdc_balance, 6).unwrap_or_else(|_| snapshot.usdc_balance.to_string()),
        usd(snapshot.usdc_price)
    );
    println!(
        "  stETH: {} (@ ${})",
        format_ether(snapshot.steth_balance),
        usd(snapshot.steth_price)
    );
}

pub fn print_allocation(
    snapshot: &ReservesSnapshot,
    band: &AllocationBand,
) -> Result<bool, Box<dyn std::error::Error>> {
    let allocation = snapshot.allocation()?;
    let within = band.contains(&allocation);

    println!("  Allocation: {}", allocation);
    println!(
        "  Band {}: {} (drift {:+}%)",
        band,
        if within { "✅ within" } else { "❌ outside" },
        band.drift(&allocation)
    );
    Ok(within)
}
