use super::config::Yip210Config;
use yip210::deploy::{ensure_deployed, record_path};

/// Deploy YIP210, or report the live recorded deployment
pub async fn execute(config: &Yip210Config) -> Result<(), Box<dyn std::error::Error>> {
    let client = super::connect(config).await?;
    let deployment = ensure_deployed(
        &client,
        &config.deploy.artifact,
        &config.deploy.deployments_dir,
        &config.network.name,
    )
    .await?;

    let record = &deployment.record;
    if deployment.reused {
        println!("YIP210 already deployed at {}", record.address);
    } else {
        println!("✅ YIP210 deployed at {}", record.address);
    }
    println!("  Deployer: {}", record.deployer);
    println!("  Transaction: {}", record.transaction_hash);
    println!("  Block: {}", record.block_number);
    println!(
        "  Record: {}",
        record_path(&config.deploy.deployments_dir, &config.network.name).display()
    );
    Ok(())
}
