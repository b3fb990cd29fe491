use crate::utils;
use colored::Colorize;
use tcflow_core::{Engine, Manifest, StateManager};
use tcflow_teamcity::TeamCityClient;

pub async fn handle(
    client: &TeamCityClient,
    manifest: &Manifest,
    store: &StateManager,
    yes: bool,
) -> anyhow::Result<()> {
    let lock = store.acquire_lock().await?;
    let engine = Engine::new(client);

    println!("{}", "Refreshing state...".blue());
    let mut state = store.load().await?;
    let plan = engine.plan(manifest, &mut state).await?;
    utils::print_plan(&plan);

    if !plan.has_changes {
        // Still persist what the refresh dropped
        store.save(&state).await?;
        lock.release().await?;
        return Ok(());
    }

    if !yes && !utils::confirm("Apply these changes?")? {
        println!("{}", "Apply cancelled.".yellow());
        lock.release().await?;
        return Ok(());
    }

    let result = engine.apply(&plan, manifest, &mut state, store).await?;
    lock.release().await?;

    utils::print_apply_result(&result);
    if !result.is_success() {
        anyhow::bail!(
            "{} of {} actions failed",
            result.failed.len(),
            result.failed.len() + result.succeeded.len()
        );
    }
    Ok(())
}
