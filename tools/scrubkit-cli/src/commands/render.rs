//! Render preview frames and the filmstrip to PNG.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{bail, Context};
use scrubkit_render::{
    load_sprite, rgb, Filmstrip, PresentOutcome, PreviewRenderer, RasterSurface, Rect,
    SheetLoader, Surface,
};

use super::{assets_for, load_metadata, source};

const PLAYHEAD_WIDTH: f64 = 2.0;

pub async fn frame(
    location: &str,
    frame: Option<usize>,
    time: Option<f64>,
    prefix: Option<String>,
    output: PathBuf,
) -> anyhow::Result<()> {
    let source = source()?;
    let meta = Arc::new(load_metadata(source.as_ref(), location).await?);

    let prefix = match prefix.or_else(|| assets_for(location).map(|a| a.preview_sprite_path_prefix)) {
        Some(prefix) => prefix,
        None => bail!("Cannot derive the preview prefix from {location}; pass --prefix"),
    };
    let index = match (frame, time) {
        (Some(i), _) => i.min(meta.last_frame()),
        (None, Some(t)) => meta.frame_at(t),
        (None, None) => 0,
    };

    let size = meta.preview_size;
    let surface = Arc::new(Mutex::new(RasterSurface::new(size.width, size.height)));
    let loader = Arc::new(SheetLoader::new(source, prefix, meta.num_sheets));
    let renderer = PreviewRenderer::new(Arc::clone(&meta), loader, Arc::clone(&surface))?;

    let outcome = renderer.render(index).await;
    tracing::debug!(frame = index, ?outcome, "Preview rendered");
    if let PresentOutcome::Placeholder { sheet } = outcome {
        tracing::warn!(sheet, "Sheet unavailable, wrote placeholder");
    }

    surface
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .save_png(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Frame {index} -> {}", output.display());
    Ok(())
}

pub async fn filmstrip(
    location: &str,
    sprite: Option<String>,
    width: u32,
    height: u32,
    playhead: Option<usize>,
    output: PathBuf,
) -> anyhow::Result<()> {
    let source = source()?;
    let meta = load_metadata(source.as_ref(), location).await?;

    let sprite_location =
        match sprite.or_else(|| assets_for(location).map(|a| a.timeline_sprite_path)) {
            Some(sprite) => sprite,
            None => bail!("Cannot derive the timeline sprite from {location}; pass --sprite"),
        };
    let sprite = load_sprite(source.as_ref(), &sprite_location).await?;

    let strip = Filmstrip::new(&meta, sprite, width as f64, height as f64);
    let mut surface = RasterSurface::new(width, height);
    strip.draw(&mut surface);

    if let Some(frame) = playhead {
        let x = strip.playhead_x(&meta, frame);
        surface.fill_rect(
            Rect::new(x - PLAYHEAD_WIDTH / 2.0, 0.0, PLAYHEAD_WIDTH, height as f64),
            rgb(0xff, 0xff, 0xff),
        );
    }

    surface
        .save_png(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "{} tiles -> {}",
        strip.layout().tiles.len(),
        output.display()
    );
    Ok(())
}
