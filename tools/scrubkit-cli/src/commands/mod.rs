pub mod codec;
pub mod frame;
pub mod info;
pub mod regions;
pub mod render;
pub mod share;
pub mod timestamps;

use std::sync::Arc;

use anyhow::Context;
use scrubkit_common::config::VideoScrubberConfig;
use scrubkit_model::SpriteMetadata;
use scrubkit_render::{default_source, AssetSource};

pub fn source() -> anyhow::Result<Arc<dyn AssetSource>> {
    default_source().context("Failed to set up asset source")
}

pub async fn fetch(source: &dyn AssetSource, location: &str) -> anyhow::Result<Vec<u8>> {
    source
        .fetch(location)
        .await
        .with_context(|| format!("Failed to fetch {location}"))
}

pub async fn load_metadata(
    source: &dyn AssetSource,
    location: &str,
) -> anyhow::Result<SpriteMetadata> {
    let bytes = fetch(source, location).await?;
    SpriteMetadata::from_slice(&bytes).with_context(|| format!("Invalid metadata at {location}"))
}

/// Conventional asset layout for a metadata location named `<id>-meta.json`.
pub fn assets_for(metadata: &str) -> Option<VideoScrubberConfig> {
    let stem = metadata.strip_suffix("-meta.json")?;
    let (base, id) = stem.rsplit_once('/').unwrap_or((".", stem));
    let mut assets = VideoScrubberConfig::for_base_url(base, id);
    assets.metadata_path = metadata.to_string();
    Some(assets)
}
