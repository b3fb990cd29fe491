use anyhow::Context;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use tcflow_config::{Credentials, ServerSettings};
use tcflow_core::{ActionType, ApplyResult, Manifest, Plan, StateManager};
use tcflow_teamcity::{Auth, TeamCityClient};

/// Client for the server named by `TEAMCITY_ADDR`
pub fn connect() -> anyhow::Result<TeamCityClient> {
    let settings = ServerSettings::from_env()?;
    let auth = match settings.credentials {
        Credentials::Token(token) => Auth::Token(token),
        Credentials::Basic { username, password } => Auth::Basic { username, password },
        Credentials::Anonymous => Auth::Guest,
    };
    Ok(TeamCityClient::new(settings.address, auth)?)
}

pub async fn load_manifest(path: Option<PathBuf>) -> anyhow::Result<Manifest> {
    let path = match path {
        Some(path) => path,
        None => tcflow_config::find_manifest()?,
    };
    println!("{} {}", "Manifest:".dimmed(), path.display());

    Manifest::load(&path)
        .await
        .with_context(|| format!("failed to load {}", path.display()))
}

pub fn state_manager(state_dir: Option<PathBuf>) -> anyhow::Result<StateManager> {
    Ok(match state_dir {
        Some(dir) => StateManager::with_state_dir(dir),
        None => StateManager::new(std::env::current_dir()?),
    })
}

/// Ask a yes/no question on the terminal
pub fn confirm(question: &str) -> anyhow::Result<bool> {
    print!("{} [y/N]: ", question);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

pub fn print_plan(plan: &Plan) {
    if !plan.has_changes {
        println!("{}", "No changes. TeamCity matches the manifest.".green());
        return;
    }

    println!();
    for action in &plan.actions {
        let line = match action.action_type {
            ActionType::Create => format!("  + {}", action.address).green(),
            ActionType::Replace => format!("-/+ {}", action.address).yellow(),
            ActionType::Delete => format!("  - {}", action.address).red(),
            ActionType::NoOp => continue,
        };
        println!("{}", line);
        println!("      {}", action.description.dimmed());
    }
    println!();
    println!("{} {}", "Plan:".bold(), plan.summary());
}

pub fn print_apply_result(result: &ApplyResult) {
    println!();
    for ok in &result.succeeded {
        println!("  {} {}: {}", "✓".green(), ok.address, ok.message);
    }
    for failed in &result.failed {
        println!(
            "  {} {}: {}",
            "✗".red(),
            failed.address,
            failed.error.as_deref().unwrap_or_default()
        );
    }
    println!();
    println!(
        "{} {} succeeded, {} failed ({} ms)",
        "Done:".bold(),
        result.succeeded.len(),
        result.failed.len(),
        result.duration_ms
    );
}
