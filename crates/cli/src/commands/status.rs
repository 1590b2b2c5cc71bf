//! `docweave status` - Show system status.

use crate::runtime;
use docweave_config::AppConfig;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = runtime::load_config(config_path)?;

    println!("DocWeave Status");
    println!("===============");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Provider:     {}", config.provider.base_url);
    println!("  Model:        {}", config.provider.model);
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "missing" });
    println!(
        "  Embeddings:   {:?} ({})",
        config.embedding.provider, config.embedding.model
    );
    println!(
        "  History:      {:?} at {}",
        config.storage.history_backend,
        config.storage.history_path.display()
    );
    println!(
        "  Profiles:     {} (default: {})",
        config.profiles.len(),
        config.default_profile.as_deref().unwrap_or("none")
    );

    match runtime::open_corpus(&config).await? {
        Some(corpus) => {
            let counts = corpus.label_counts().await;
            let total: usize = counts.iter().map(|(_, n)| n).sum();
            println!("\n  Corpus:       {} chunks", total);
            for (label, n) in counts {
                let marker = if label.is_known() { "" } else { " (unrecognised)" };
                println!("    {label:<24} {n:>6}{marker}");
            }
        }
        None => {
            println!("\n  No corpus at {} — run `docweave ingest`", config.storage.corpus_path.display());
        }
    }

    let file = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    if file.exists() {
        println!("\n  Config file found: {}", file.display());
    } else {
        println!("\n  No config file — run `docweave init` first");
    }
    Ok(())
}
