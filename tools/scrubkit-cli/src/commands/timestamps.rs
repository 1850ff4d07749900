//! Print the activity timestamp list.

use anyhow::Context;
use scrubkit_model::{filter_entries, parse_activities, timestamp_entries};

use super::{fetch, source};

pub async fn run(
    location: &str,
    at: f64,
    search: Option<&str>,
    offset: f64,
) -> anyhow::Result<()> {
    let source = source()?;
    let bytes = fetch(source.as_ref(), location).await?;
    let text = String::from_utf8(bytes).context("Activities feed is not UTF-8")?;
    let activities =
        parse_activities(&text).with_context(|| format!("Invalid activities feed at {location}"))?;

    let entries = timestamp_entries(&activities, at, offset);
    let shown = filter_entries(&entries, search.unwrap_or(""));
    if shown.is_empty() {
        println!("No matching activities");
        return Ok(());
    }

    for entry in shown {
        let marker = if entry.current { ">" } else { " " };
        match &entry.path {
            Some(path) => println!(
                "{marker} {:>8}  {:<12} {}  [{path}]",
                entry.time, entry.app, entry.title
            ),
            None => println!("{marker} {:>8}  {:<12} {}", entry.time, entry.app, entry.title),
        }
    }
    Ok(())
}
