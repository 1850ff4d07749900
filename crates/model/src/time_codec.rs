//! Compact time tokens for shareable links.
//!
//! Whole seconds are written with only the units present: `0s`, `45s`,
//! `3m6s`, `1h2m30s`. Decoding accepts exactly `([0-9]+h)?([0-9]+m)?([0-9]+s)?` and
//! nothing else.

use std::sync::OnceLock;

use regex::Regex;

/// Why a token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeCodecError {
    #[error("empty time token")]
    Empty,

    #[error("unparseable time token {0:?}")]
    Unparseable(String),

    #[error("time token {0:?} is out of range")]
    Overflow(String),
}

fn grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(r"^(?:([0-9]+)h)?(?:([0-9]+)m)?(?:([0-9]+)s)?$").expect("time token grammar is valid")
    })
}

/// Encode a whole number of seconds.
pub fn encode(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if seconds > 0 || out.is_empty() {
        out.push_str(&format!("{seconds}s"));
    }
    out
}

/// Encode a playback position, dropping the fractional part.
pub fn encode_secs(time_secs: f64) -> String {
    if !time_secs.is_finite() || time_secs <= 0.0 {
        return encode(0);
    }
    encode(time_secs.floor() as u64)
}

/// Decode a token back to whole seconds.
pub fn decode(token: &str) -> Result<u64, TimeCodecError> {
    if token.is_empty() {
        return Err(TimeCodecError::Empty);
    }

    let captures = grammar()
        .captures(token)
        .ok_or_else(|| TimeCodecError::Unparseable(token.to_string()))?;

    let unit = |index: usize, scale: u64| -> Result<u64, TimeCodecError> {
        match captures.get(index) {
            None => Ok(0),
            Some(digits) => digits
                .as_str()
                .parse::<u64>()
                .ok()
                .and_then(|value| value.checked_mul(scale))
                .ok_or_else(|| TimeCodecError::Overflow(token.to_string())),
        }
    };

    let hours = unit(1, 3600)?;
    let minutes = unit(2, 60)?;
    let seconds = unit(3, 1)?;

    hours
        .checked_add(minutes)
        .and_then(|sum| sum.checked_add(seconds))
        .ok_or_else(|| TimeCodecError::Overflow(token.to_string()))
}

/// Decode a token, treating anything malformed as time zero.
pub fn decode_or_zero(token: &str) -> u64 {
    match decode(token) {
        Ok(secs) => secs,
        Err(e) => {
            tracing::debug!(error = %e, "Falling back to time zero");
            0
        }
    }
}

/// Human clock label: `MM:SS`, or `HH:MM:SS` past the first hour.
pub fn format_clock(time_secs: f64) -> String {
    let total = if time_secs.is_finite() && time_secs > 0.0 {
        time_secs.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
