//! `docweave init` - Write a default configuration file.

use docweave_config::AppConfig;
use std::path::Path;

pub async fn run(config: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let config_path = match config {
        Some(p) => p.to_path_buf(),
        None => AppConfig::config_dir().join("config.toml"),
    };

    println!("DocWeave — Setup");
    println!("================\n");

    if let Some(dir) = config_path.parent()
        && !dir.as_os_str().is_empty()
        && !dir.exists()
    {
        tokio::fs::create_dir_all(dir).await?;
        println!("  Created {}", dir.display());
    }

    if config_path.exists() && !force {
        println!("  Config already exists: {}", config_path.display());
        println!("  Run with --force to overwrite it.");
        return Ok(());
    }

    tokio::fs::write(&config_path, AppConfig::default_toml()).await?;
    println!("  Wrote {}", config_path.display());
    println!();
    println!("  Next steps:");
    println!("    1. Set DOCWEAVE_API_KEY (or OPENAI_API_KEY)");
    println!("    2. docweave ingest --data-dir <scraped docs>");
    println!("    3. docweave generate \"a landing page for a bakery\"");
    Ok(())
}
