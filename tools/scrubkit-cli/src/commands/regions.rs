//! List skip-silence playable regions.

use scrubkit_model::{format_clock, PlayableRegions};

use super::{load_metadata, source};

pub async fn run(location: &str, margin: f64) -> anyhow::Result<()> {
    let source = source()?;
    let meta = load_metadata(source.as_ref(), location).await?;
    let regions = PlayableRegions::from_metadata(&meta, margin);

    if regions.rejected() > 0 {
        tracing::warn!(rejected = regions.rejected(), "Malformed speech segments skipped");
    }

    for (i, region) in regions.regions().iter().enumerate() {
        println!(
            "{:>3}  {} - {}  ({:.1}s)",
            i + 1,
            format_clock(region.start),
            format_clock(region.end),
            region.len()
        );
    }
    println!(
        "{:.1}s playable of {:.1}s",
        regions.playable_secs(),
        meta.duration
    );
    Ok(())
}
