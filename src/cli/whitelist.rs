use super::config::Yip210Config;
use alloy::primitives::Address;

/// Pass the whitelist proposal for YIP210
pub async fn execute(
    config: &Yip210Config,
    yip210: Option<Address>,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = super::connect(config).await?;
    let yip210 = super::resolve_yip210(&client, config, yip210).await?;

    let passed = super::scenario(&client, config)?.whitelist(yip210).await?;

    println!("✅ Proposal {} executed: {}", passed.id, passed.description);
    println!("  YIP210 at {}", yip210);
    println!(
        "  Blocks: proposed {} / executed {}",
        passed.proposed_at_block, passed.executed_at_block
    );
    Ok(())
}
