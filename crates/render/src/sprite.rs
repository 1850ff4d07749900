//! Decoded sprite images.

use std::sync::Arc;

use image::RgbaImage;
use scrubkit_common::error::{ScrubError, ScrubResult};

use crate::source::AssetSource;

/// A decoded sprite sheet or filmstrip sprite.
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    location: String,
    image: RgbaImage,
}

impl SpriteSheet {
    /// Decode JPEG/PNG bytes fetched from `location`.
    pub fn decode(location: &str, bytes: &[u8]) -> ScrubResult<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| ScrubError::asset(location, format!("decoding sprite: {e}")))?
            .to_rgba8();
        Ok(Self {
            location: location.to_string(),
            image,
        })
    }

    pub fn from_image(location: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            location: location.into(),
            image,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Fetch and decode a single sprite.
pub async fn load_sprite(source: &dyn AssetSource, location: &str) -> ScrubResult<SpriteSheet> {
    let bytes = source.fetch(location).await?;
    let location_owned = location.to_string();
    tokio::task::spawn_blocking(move || SpriteSheet::decode(&location_owned, &bytes))
        .await
        .map_err(|e| ScrubError::asset(location, format!("decode task failed: {e}")))?
}

/// Shared handle to a decoded sprite.
pub type SharedSprite = Arc<SpriteSheet>;
