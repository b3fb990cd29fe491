use colored::Colorize;
use tcflow_core::{ResourceKind, StateManager, state::address};

pub async fn handle(store: &StateManager, json: bool) -> anyhow::Result<()> {
    let state = store.load().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    if state.resources.is_empty() {
        println!("{}", "No resources in state.".dimmed());
        return Ok(());
    }

    for kind in ResourceKind::ALL {
        for (name, resource) in state.by_kind(kind) {
            println!("{}", address(kind, name).bold());
            println!("    id:      {}", resource.id);
            println!(
                "    updated: {}",
                resource.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }
    Ok(())
}
