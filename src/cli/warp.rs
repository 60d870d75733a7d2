use super::config::Yip210Config;
use std::time::Duration;
use yip210::node::ForkClient;

/// Increase node time by `by` and mine one block
pub async fn execute(
    config: &Yip210Config,
    by: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = super::connect(config).await?;

    let before = client.timestamp().await?;
    client.increase_time(by.as_secs()).await?;
    client.mine(1).await?;

    println!(
        "⏩ Advanced {} ({} -> {}), now at block {}",
        humantime::format_duration(by),
        before,
        client.timestamp().await?,
        client.block_number().await?
    );
    Ok(())
}
