//! `docweave profiles` - List generation profiles.

use crate::runtime;
use std::path::Path;

pub async fn run(config: Option<&Path>) -> anyhow::Result<()> {
    let config = runtime::load_config(config)?;
    let default = config.default_profile.as_deref();

    println!(
        "  {:<2}{:<16} {:<20} {:<11} {:>5} {:>7} {:>6}",
        "", "NAME", "MODEL", "MODE", "TOP-K", "BUDGET", "KEEP"
    );
    for name in config.profiles.keys() {
        let profile = config.profile(Some(name))?;
        let marker = if Some(name.as_str()) == default { "*" } else { "" };
        println!(
            "  {:<2}{:<16} {:<20} {:<11} {:>5} {:>7} {:>6}",
            marker,
            profile.name,
            profile.model.as_deref().unwrap_or(&config.provider.model),
            profile.mode.to_string(),
            profile.policy.top_k(),
            profile.history.token_budget,
            profile.history.keep_last_n,
        );
    }
    Ok(())
}
