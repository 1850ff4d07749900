//! Sprite metadata published alongside a recording.
//!
//! The document is produced by the sprite-sheet generator and fetched once per
//! session. Field names follow the generator's camelCase JSON.

use serde::{Deserialize, Serialize};

/// Pixel dimensions of a sprite tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height; 1.0 for degenerate sizes.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f64 / self.height as f64
    }
}

/// A span of detected speech, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeechSegment {
    pub start: f64,
    pub end: f64,
}

impl SpeechSegment {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Finite bounds with `start <= end`.
    pub fn is_well_formed(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start <= self.end
    }
}

/// Immutable description of the preview sprite sheets and filmstrip sprite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteMetadata {
    /// Number of sampled frames across the whole recording.
    pub frame_count: usize,

    /// Preview frames tiled into each sheet.
    pub frames_per_sheet: usize,

    /// Number of preview sheets published.
    pub num_sheets: usize,

    /// Columns per preview sheet.
    pub sheet_cols: usize,

    /// Size of one preview tile.
    pub preview_size: Size,

    /// Size of one filmstrip thumbnail.
    pub thumbnail_size: Size,

    /// Columns in the filmstrip sprite.
    pub thumbnail_cols: usize,

    /// Seconds between samples when sampling is uniform.
    pub interval: f64,

    /// Recording length in seconds.
    pub duration: f64,

    /// Explicit sample times, one per frame, strictly increasing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_times: Option<Vec<f64>>,

    /// Detected speech, in no particular order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_segments: Option<Vec<SpeechSegment>>,
}

impl SpriteMetadata {
    /// Uniformly sampled metadata with a single column layout; handy for
    /// fixtures and for recordings without a generator document.
    pub fn uniform(frame_count: usize, interval: f64, duration: f64) -> Self {
        Self {
            frame_count,
            frames_per_sheet: 100,
            num_sheets: frame_count.div_ceil(100).max(1),
            sheet_cols: 10,
            preview_size: Size::new(320, 180),
            thumbnail_size: Size::new(160, 90),
            thumbnail_cols: 10,
            interval,
            duration,
            frame_times: None,
            speech_segments: None,
        }
    }

    /// Parse and validate a metadata document.
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        let metadata: SpriteMetadata = serde_json::from_str(json)?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// Parse and validate a metadata document from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MetadataError> {
        let metadata: SpriteMetadata = serde_json::from_slice(bytes)?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// Check the structural invariants the resolver depends on.
    pub fn validate(&self) -> Result<(), MetadataError> {
        if self.frame_count == 0 {
            return Err(MetadataError::ZeroFrameCount);
        }
        if !(self.interval.is_finite() && self.interval > 0.0) {
            return Err(MetadataError::NonPositiveInterval(self.interval));
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(MetadataError::InvalidDuration(self.duration));
        }
        for (field, value) in [
            ("framesPerSheet", self.frames_per_sheet),
            ("sheetCols", self.sheet_cols),
            ("thumbnailCols", self.thumbnail_cols),
        ] {
            if value == 0 {
                return Err(MetadataError::ZeroField { field });
            }
        }

        let needed = self.frame_count.div_ceil(self.frames_per_sheet);
        if self.num_sheets < needed {
            return Err(MetadataError::TooFewSheets {
                needed,
                declared: self.num_sheets,
            });
        }

        if let Some(times) = &self.frame_times {
            if times.len() != self.frame_count {
                return Err(MetadataError::FrameTimesLength {
                    expected: self.frame_count,
                    actual: times.len(),
                });
            }
            if let Some(index) = times.iter().position(|t| !t.is_finite() || *t < 0.0) {
                return Err(MetadataError::FrameTimesNotIncreasing { index });
            }
            if let Some(index) = times.windows(2).position(|pair| pair[1] <= pair[0]) {
                return Err(MetadataError::FrameTimesNotIncreasing { index: index + 1 });
            }
        }

        Ok(())
    }

    /// Speech segments, empty when the generator found none.
    pub fn speech_segments(&self) -> &[SpeechSegment] {
        self.speech_segments.as_deref().unwrap_or(&[])
    }

    /// Explicit sample times, if published and non-empty.
    pub fn frame_times(&self) -> Option<&[f64]> {
        self.frame_times.as_deref().filter(|times| !times.is_empty())
    }

    /// Index of the last frame.
    pub fn last_frame(&self) -> usize {
        self.frame_count.saturating_sub(1)
    }
}

/// Reasons a metadata document is rejected.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("metadata is not valid JSON for the expected shape: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("frameCount must be at least 1")]
    ZeroFrameCount,

    #[error("interval must be positive, got {0}")]
    NonPositiveInterval(f64),

    #[error("duration must be finite and non-negative, got {0}")]
    InvalidDuration(f64),

    #[error("{field} must be at least 1")]
    ZeroField { field: &'static str },

    #[error("{declared} sheets declared but {needed} are needed")]
    TooFewSheets { needed: usize, declared: usize },

    #[error("frameTimes has {actual} entries, expected {expected}")]
    FrameTimesLength { expected: usize, actual: usize },

    #[error("frameTimes must be non-negative and strictly increasing (index {index})")]
    FrameTimesNotIncreasing { index: usize },
}
