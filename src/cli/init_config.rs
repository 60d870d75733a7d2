use super::config::Yip210Config;
use std::path::Path;

/// Write a commented default configuration file
pub fn execute(path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!(
            "config file '{}' already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }

    Yip210Config::create_default(path)?;

    println!("✅ Wrote default configuration to {}", path.display());
    println!();
    println!("Set [governance].voters before running proposal flows.");
    Ok(())
}
