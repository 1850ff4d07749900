//! Build and read shareable links.

use anyhow::bail;
use scrubkit_engine::{incoming_range, share_url};
use scrubkit_model::{format_clock, ShareSelection};

pub fn build(
    page_url: &str,
    start: &str,
    end: Option<&str>,
    duration: Option<f64>,
    default_span: f64,
) -> anyhow::Result<()> {
    let duration = duration.unwrap_or(f64::INFINITY);
    let mut selection = ShareSelection::open_with_span(0.0, duration, default_span);

    if !selection.set_start_input(start) {
        bail!("Invalid start {start:?}: expected a token like 1m30s within the recording");
    }
    if let Some(end) = end {
        selection.enable_end();
        if !selection.set_end_input(end) {
            bail!("Invalid end {end:?}: must decode and not precede the start");
        }
    }

    println!("{}", share_url(page_url, &selection)?);
    Ok(())
}

pub fn follow(link: &str, offset: f64) -> anyhow::Result<()> {
    let Some(range) = incoming_range(link)? else {
        println!("No range in link");
        return Ok(());
    };

    println!("Start: {} ({}s)", format_clock(range.start), range.start);
    match range.end {
        Some(end) => println!("End: {} ({end}s)", format_clock(end)),
        None => println!("End: none (point in time)"),
    }
    println!("Seek to: {:.3}s", range.seek_time(offset));
    Ok(())
}
