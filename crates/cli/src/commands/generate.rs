//! `docweave generate` - Run one generation request.

use crate::runtime;
use anyhow::{Context, bail};
use docweave_core::{GenerationMode, SessionId};
use docweave_pipeline::{GenerationRequest, GenerationStatus};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub struct GenerateArgs {
    pub prompt: String,
    pub profile: Option<String>,
    pub session: String,
    pub image: Option<PathBuf>,
    pub mode: Option<GenerationMode>,
    pub json: bool,
}

pub async fn run(config: Option<&Path>, args: GenerateArgs) -> anyhow::Result<()> {
    let config = runtime::load_config(config)?;
    let profile = config.profile(args.profile.as_deref())?;

    if !config.has_api_key() {
        warn!("No API key configured; hosted providers will reject the request");
    }

    let mut request = GenerationRequest::new(profile, SessionId::new(args.session), args.prompt);
    if let Some(mode) = args.mode {
        request = request.with_mode(mode);
    }
    if let Some(path) = &args.image {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        request = request.with_image(bytes);
    }

    let orchestrator =
        runtime::build_orchestrator(&config, &request.profile, request.mode).await?;

    // Ctrl+C abandons the request without recording it.
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    eprint!("  Generating...");
    let outcome = orchestrator.generate_cancellable(request, cancel).await;
    eprint!("\r               \r");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    match outcome.status {
        GenerationStatus::Succeeded => {
            if !args.json {
                println!("{}", outcome.content.unwrap_or_default());
            }
            Ok(())
        }
        GenerationStatus::NoCorpus => {
            if !args.json {
                eprintln!("  {}", outcome.content.unwrap_or_default());
                eprintln!("  Run `docweave ingest` first.");
            }
            Ok(())
        }
        GenerationStatus::Failed => match outcome.error {
            Some(err) => bail!("{}: {}", err.kind, err.message),
            None => bail!("generation failed"),
        },
    }
}
