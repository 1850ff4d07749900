//! Show metadata information.

use scrubkit_model::{format_clock, PlayableRegions};

use super::{load_metadata, source};

pub async fn run(location: &str, margin: f64) -> anyhow::Result<()> {
    let source = source()?;
    let meta = load_metadata(source.as_ref(), location).await?;

    println!("Metadata: {location}");
    println!(
        "  Duration: {} ({:.2}s)",
        format_clock(meta.duration),
        meta.duration
    );
    println!("  Frames: {}", meta.frame_count);
    match meta.frame_times() {
        Some(times) => println!("  Sampling: explicit ({} sample times)", times.len()),
        None => println!("  Sampling: every {}s", meta.interval),
    }
    println!();

    println!("Preview sheets:");
    println!("  Sheets: {}", meta.num_sheets);
    println!(
        "  Layout: {} frames per sheet, {} columns",
        meta.frames_per_sheet, meta.sheet_cols
    );
    println!(
        "  Tile: {}x{}",
        meta.preview_size.width, meta.preview_size.height
    );
    println!();

    println!("Filmstrip:");
    println!(
        "  Thumbnail: {}x{}, {} columns",
        meta.thumbnail_size.width, meta.thumbnail_size.height, meta.thumbnail_cols
    );
    println!();

    let regions = PlayableRegions::from_metadata(&meta, margin);
    println!("Speech:");
    println!("  Segments: {}", meta.speech_segments().len());
    if regions.rejected() > 0 {
        println!("  Rejected: {}", regions.rejected());
    }
    println!(
        "  Playable: {:.1}s of {:.1}s in {} region(s) (margin {margin}s)",
        regions.playable_secs(),
        meta.duration,
        regions.regions().len()
    );

    Ok(())
}
