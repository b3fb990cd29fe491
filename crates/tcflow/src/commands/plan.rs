use crate::utils;
use colored::Colorize;
use tcflow_core::{Engine, Manifest, StateManager};
use tcflow_teamcity::TeamCityClient;

pub async fn handle(
    client: &TeamCityClient,
    manifest: &Manifest,
    store: &StateManager,
) -> anyhow::Result<()> {
    println!("{}", "Refreshing state...".blue());

    // Refreshed state is only used for planning, never saved
    let mut state = store.load().await?;
    let plan = Engine::new(client).plan(manifest, &mut state).await?;

    utils::print_plan(&plan);
    Ok(())
}
