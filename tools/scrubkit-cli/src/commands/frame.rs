//! Resolve a time or frame index.

use anyhow::bail;
use scrubkit_model::format_clock;

use super::{load_metadata, source};

pub async fn run(location: &str, time: Option<f64>, index: Option<usize>) -> anyhow::Result<()> {
    let source = source()?;
    let meta = load_metadata(source.as_ref(), location).await?;

    let frame = match (time, index) {
        (Some(t), _) => meta.frame_at(t),
        (None, Some(i)) => {
            if i > meta.last_frame() {
                bail!("Frame {i} out of range (last frame is {})", meta.last_frame());
            }
            i
        }
        (None, None) => bail!("Pass --time or --index"),
    };

    let at = meta.time_at(frame);
    let sheet = meta.sheet_position(frame);
    let thumb = meta.thumbnail_position(frame);

    println!("Frame {frame} of {}", meta.frame_count);
    println!("  Time: {} ({at:.3}s)", format_clock(at));
    println!(
        "  Preview: sheet {} col {} row {} at ({}, {})",
        sheet.sheet, sheet.col, sheet.row, sheet.x, sheet.y
    );
    println!(
        "  Thumbnail: col {} row {} at ({}, {})",
        thumb.col, thumb.row, thumb.x, thumb.y
    );
    println!("  Progress: {:.4}", meta.progress_of_frame(frame));

    Ok(())
}
