//! DocWeave CLI - the main entry point.
//!
//! Commands:
//! - `init`      - Write a default config file
//! - `ingest`    - Build the corpus snapshot from scraped documentation
//! - `generate`  - Generate an app from a prompt (and optionally a screenshot)
//! - `history`   - Show or clear a session's conversation
//! - `profiles`  - List generation profiles
//! - `status`    - Show configuration and corpus status

use clap::{Parser, Subcommand, ValueEnum};
use docweave_core::GenerationMode;
use std::path::PathBuf;

mod commands;
mod runtime;

#[derive(Parser)]
#[command(
    name = "docweave",
    about = "DocWeave — documentation-grounded React code generation",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.docweave/config.toml)
    #[arg(long, global = true, env = "DOCWEAVE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Split, embed and store the scraped documentation files
    Ingest {
        /// Directory of Extracted_<Label>_*.txt files
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Replace an existing corpus snapshot
        #[arg(long)]
        force: bool,
    },

    /// Generate an app for a prompt
    Generate {
        /// What to build
        prompt: String,

        /// Generation profile (see `docweave profiles`)
        #[arg(short, long)]
        profile: Option<String>,

        /// Conversation session id
        #[arg(short, long, default_value = "default")]
        session: String,

        /// Screenshot or mockup to rebuild
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Override the profile's generation mode
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or reset a session's conversation history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// List available generation profiles
    Profiles,

    /// Show system status
    Status,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Print every recorded turn
    Show {
        #[arg(short, long, default_value = "default")]
        session: String,
    },
    /// Delete every recorded turn
    Clear {
        #[arg(short, long, default_value = "default")]
        session: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Text,
    Multimodal,
}

impl From<ModeArg> for GenerationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Text => GenerationMode::Text,
            ModeArg::Multimodal => GenerationMode::Multimodal,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Init { force } => commands::init::run(config, force).await?,
        Commands::Ingest { data_dir, force } => {
            commands::ingest::run(config, data_dir, force).await?
        }
        Commands::Generate {
            prompt,
            profile,
            session,
            image,
            mode,
            json,
        } => {
            let args = commands::generate::GenerateArgs {
                prompt,
                profile,
                session,
                image,
                mode: mode.map(Into::into),
                json,
            };
            commands::generate::run(config, args).await?
        }
        Commands::History { action } => match action {
            HistoryAction::Show { session } => commands::history::show(config, &session).await?,
            HistoryAction::Clear { session } => commands::history::clear(config, &session).await?,
        },
        Commands::Profiles => commands::profiles::run(config).await?,
        Commands::Status => commands::status::run(config).await?,
    }

    Ok(())
}
