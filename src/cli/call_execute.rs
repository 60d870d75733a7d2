use super::config::Yip210Config;
use alloy::primitives::Address;

/// Call YIP210.execute() from the deployer, bypassing governance
pub async fn execute(
    config: &Yip210Config,
    yip210: Option<Address>,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = super::connect(config).await?;
    let yip210 = super::resolve_yip210(&client, config, yip210).await?;

    let outcome = super::scenario(&client, config)?
        .call_execute_directly(yip210)
        .await?;

    println!(
        "✅ YIP210.execute() mined in block {} ({})",
        outcome.block_number, outcome.hash
    );
    Ok(())
}
