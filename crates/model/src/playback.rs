//! Playback speed model.
//!
//! Speeds come either from the preset buttons or from an exponential slider
//! spanning 1x to 16x, rounded to one decimal.

use serde::{Deserialize, Serialize};

/// Speeds offered as one-click presets.
pub const SPEED_PRESETS: [f64; 4] = [0.5, 1.0, 1.5, 2.0];

/// Upper end of the custom speed slider.
pub const MAX_SPEED: f64 = 16.0;

/// Lowest accepted playback speed.
pub const MIN_SPEED: f64 = 0.1;

/// Map a slider position in `[0, 100]` to a speed in `[1, 16]`.
pub fn slider_to_speed(slider: f64) -> f64 {
    let slider = if slider.is_nan() {
        0.0
    } else {
        slider.clamp(0.0, 100.0)
    };
    let speed = (MAX_SPEED.ln() * slider / 100.0).exp();
    (speed * 10.0).round() / 10.0
}

/// Inverse of [`slider_to_speed`], clamping the speed to the slider range.
pub fn speed_to_slider(speed: f64) -> f64 {
    let speed = if speed.is_nan() {
        1.0
    } else {
        speed.clamp(1.0, MAX_SPEED)
    };
    100.0 * speed.ln() / MAX_SPEED.ln()
}

/// Whether `speed` was chosen on the custom slider rather than a preset.
pub fn is_custom_speed(speed: f64) -> bool {
    !SPEED_PRESETS.contains(&speed) && speed > 2.0
}

/// A validated playback speed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Speed(f64);

impl Speed {
    pub const NORMAL: Speed = Speed(1.0);

    /// Accept finite speeds in `[MIN_SPEED, MAX_SPEED]`.
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && (MIN_SPEED..=MAX_SPEED).contains(&value)).then_some(Self(value))
    }

    /// Clamp any input into the accepted range; NaN becomes normal speed.
    pub fn saturating(value: f64) -> Self {
        if value.is_nan() {
            return Self::NORMAL;
        }
        Self(value.clamp(MIN_SPEED, MAX_SPEED))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Rate handed to the media surface.
    pub fn playback_rate(self) -> f64 {
        self.0
    }

    pub fn is_custom(self) -> bool {
        is_custom_speed(self.0)
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl TryFrom<f64> for Speed {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Speed::new(value).ok_or_else(|| format!("speed {value} outside [{MIN_SPEED}, {MAX_SPEED}]"))
    }
}

impl From<Speed> for f64 {
    fn from(speed: Speed) -> f64 {
        speed.0
    }
}

impl std::fmt::Display for Speed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x", self.0)
    }
}
