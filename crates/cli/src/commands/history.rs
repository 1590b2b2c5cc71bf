//! `docweave history` - Inspect or reset a session.

use crate::runtime;
use docweave_core::{ConversationLog, SessionId};
use std::path::Path;

pub async fn show(config: Option<&Path>, session: &str) -> anyhow::Result<()> {
    let config = runtime::load_config(config)?;
    let log = runtime::open_log(&config).await?;
    let turns = log.read(&SessionId::from(session)).await?;

    if turns.is_empty() {
        println!("  No history for session '{session}'.");
        return Ok(());
    }
    for turn in &turns {
        println!("[{}] {}", turn.timestamp.format("%Y-%m-%d %H:%M:%S"), turn.render());
    }
    println!("\n  {} turns ({} backend)", turns.len(), log.name());
    Ok(())
}

pub async fn clear(config: Option<&Path>, session: &str) -> anyhow::Result<()> {
    let config = runtime::load_config(config)?;
    let log = runtime::open_log(&config).await?;
    log.clear(&SessionId::from(session)).await?;
    println!("  Cleared history for session '{session}'.");
    Ok(())
}
