use colored::Colorize;
use tcflow_core::{Engine, StateManager};
use tcflow_teamcity::TeamCityClient;

pub async fn handle(client: &TeamCityClient, store: &StateManager) -> anyhow::Result<()> {
    let lock = store.acquire_lock().await?;

    let mut state = store.load().await?;
    let report = Engine::new(client).refresh(&mut state).await?;
    store.save(&state).await?;
    lock.release().await?;

    println!("Checked {} resources", report.checked);
    for address in &report.removed {
        println!("  {} {} (deleted outside of tcflow)", "-".red(), address);
    }
    for address in &report.drifted {
        println!("  {} {} (changed outside of tcflow)", "~".yellow(), address);
    }
    if report.removed.is_empty() && report.drifted.is_empty() {
        println!("{}", "Everything is in sync.".green());
    }
    Ok(())
}
