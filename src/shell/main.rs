// Command line entry point.
//
// Usage: time_entries summary <entries.json> [offset_minutes]
//
// Reads a JSON array of stored time entries and prints the worked time of today, this
// week and this month as JSON. `RUST_LOG` overrides the configured log filter.

use anyhow::{Context, bail};
use std::env;
use time_entries::config::Settings;
use time_entries::modules::time_entries::core::time_entry::TimeEntry;
use time_entries::modules::time_entries::core::worked_time::summary;
use time_entries::shared::core::time::{Clock, SystemClock};
use tracing_subscriber::{EnvFilter, fmt};

const USAGE: &str = "usage: time_entries summary <entries.json> [offset_minutes]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (path, offset) = match args.as_slice() {
        [command, path] if command == "summary" => (path, None),
        [command, path, offset] if command == "summary" => {
            let offset: i32 = offset
                .parse()
                .with_context(|| format!("invalid offset in minutes: {offset}"))?;
            (path, Some(offset))
        }
        _ => bail!(USAGE),
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {path}"))?;
    let entries: Vec<TimeEntry> =
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {path}"))?;
    let visible: Vec<_> = entries
        .iter()
        .filter(|entry| entry.deleted.is_none())
        .map(TimeEntry::interval)
        .collect();
    tracing::info!(entries = entries.len(), visible = visible.len(), "summarising worked time");

    let offset = offset.or(Some(settings.default_timezone_offset));
    let worked = summary(&visible, offset, SystemClock.now());
    println!("{}", serde_json::to_string_pretty(&worked)?);
    Ok(())
}
