use super::store::unlock;
use crate::error::CliResult;
use bioself_core::{get_dashboard, get_recovery_summary, get_timeline, StoreConfig};

pub fn run_summary(config: &StoreConfig) -> CliResult<()> {
    let store = unlock(config)?;
    let dashboard = get_dashboard(&store.get());
    println!("{}", serde_json::to_string_pretty(&dashboard)?);
    Ok(())
}

pub fn run_timeline(config: &StoreConfig, limit: usize) -> CliResult<()> {
    let store = unlock(config)?;
    for event in get_timeline(&store.get()).into_iter().take(limit) {
        match &event.subtitle {
            Some(subtitle) => println!(
                "{}  {:<9} {} ({})",
                event.date.format("%Y-%m-%d %H:%M"),
                event.kind.as_str(),
                event.title,
                subtitle
            ),
            None => println!(
                "{}  {:<9} {}",
                event.date.format("%Y-%m-%d %H:%M"),
                event.kind.as_str(),
                event.title
            ),
        }
    }
    Ok(())
}

pub fn run_recovery(config: &StoreConfig, days: u32) -> CliResult<()> {
    let store = unlock(config)?;
    let summary = get_recovery_summary(&store.get(), days);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
