use crate::utils;
use colored::Colorize;
use tcflow_core::{Engine, StateManager};
use tcflow_teamcity::TeamCityClient;

pub async fn handle(
    client: &TeamCityClient,
    store: &StateManager,
    address: Option<String>,
    yes: bool,
) -> anyhow::Result<()> {
    let lock = store.acquire_lock().await?;
    let mut state = store.load().await?;

    let targets: Vec<String> = match &address {
        Some(address) => vec![address.clone()],
        None => state.resources.keys().cloned().collect(),
    };
    if targets.is_empty() {
        println!("{}", "Nothing to destroy.".green());
        lock.release().await?;
        return Ok(());
    }

    println!();
    for target in &targets {
        println!("  {}", format!("- {}", target).red());
    }
    println!();

    if !yes && !utils::confirm("Destroy these resources?")? {
        println!("{}", "Destroy cancelled.".yellow());
        lock.release().await?;
        return Ok(());
    }

    let engine = Engine::new(client);
    match address {
        Some(address) => {
            let outcome = engine.destroy(&address, &mut state).await;
            store.save(&state).await?;
            lock.release().await?;
            outcome?;
            println!("  {} {}", "✓".green(), address);
        }
        None => {
            let result = engine.destroy_all(&mut state, store).await?;
            lock.release().await?;
            utils::print_apply_result(&result);
            if !result.is_success() {
                anyhow::bail!("{} resources could not be destroyed", result.failed.len());
            }
        }
    }
    Ok(())
}
