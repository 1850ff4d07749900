//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default playback and scrubbing parameters.
    pub playback: PlaybackDefaults,

    /// Where onboarding progress is persisted.
    pub tutorial: TutorialConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default playback parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackDefaults {
    /// Padding added on both sides of each speech segment (seconds).
    pub region_margin_secs: f64,

    /// Added to external timestamp links to compensate for recording latency.
    pub timestamp_offset_secs: f64,

    /// Position poll interval used when the media surface has no
    /// per-frame callback (milliseconds).
    pub poll_interval_ms: u64,

    /// Default length of a shared range when the end is first enabled.
    pub share_default_span_secs: f64,

    /// Initial playback speed.
    pub speed: f64,

    /// Whether skip-silence starts enabled.
    pub skip_silence: bool,
}

/// Tutorial persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorialConfig {
    /// Directory holding persisted key/value records.
    pub store_dir: PathBuf,

    /// Key under which tutorial progress is stored.
    pub key: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "scrubkit_engine=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

/// Asset locations for a single recorded session.
///
/// Locations are either `http(s)://` URLs or filesystem paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoScrubberConfig {
    /// The full-quality video file.
    pub video_path: String,

    /// Prefix for preview sheets; sheet `n` lives at `{prefix}-{n}.jpg`.
    pub preview_sprite_path_prefix: String,

    /// The single filmstrip sprite.
    pub timeline_sprite_path: String,

    /// The sprite metadata document.
    pub metadata_path: String,
}

impl VideoScrubberConfig {
    /// Build the conventional asset layout for a hosted session.
    pub fn for_base_url(base: &str, video_id: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            video_path: format!("{base}/{video_id}.mp4"),
            preview_sprite_path_prefix: format!("{base}/{video_id}-preview"),
            timeline_sprite_path: format!("{base}/{video_id}-timeline.jpg"),
            metadata_path: format!("{base}/{video_id}-meta.json"),
        }
    }

    /// Location of preview sheet `index`.
    pub fn preview_sheet_path(&self, index: usize) -> String {
        format!("{}-{index}.jpg", self.preview_sprite_path_prefix)
    }

    /// Activities feed published next to the metadata document, if the
    /// metadata follows the `{id}-meta.json` convention.
    pub fn activities_path(&self) -> Option<String> {
        self.metadata_path
            .strip_suffix("-meta.json")
            .map(|stem| format!("{stem}-activities.json"))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackDefaults::default(),
            tutorial: TutorialConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PlaybackDefaults {
    fn default() -> Self {
        Self {
            region_margin_secs: 5.0,
            timestamp_offset_secs: 0.3,
            poll_interval_ms: 100,
            share_default_span_secs: 30.0,
            speed: 1.0,
            skip_silence: false,
        }
    }
}

impl Default for TutorialConfig {
    fn default() -> Self {
        Self {
            store_dir: data_dir(),
            key: "video-scrubber-tutorial".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("scrubkit").join("config.json")
}

/// Default directory for persisted UI state.
fn data_dir() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("scrubkit").join("state")
}
