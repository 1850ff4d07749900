//! Share-link range selection.
//!
//! A selection starts at the current playback position and optionally
//! carries an end. Edits arrive as raw text in compact time format; text
//! that does not decode, or falls outside the recording, is kept as typed
//! but leaves the committed time unchanged.

use serde::{Deserialize, Serialize};

use crate::time_codec::{decode, decode_or_zero, encode_secs};

/// Query parameter holding the start token.
pub const START_PARAM: &str = "t";
/// Query parameter holding the optional end token.
pub const END_PARAM: &str = "e";

/// Default span of a shared range when the end is first enabled.
pub const DEFAULT_SHARE_SPAN_SECS: f64 = 30.0;

/// Ephemeral state of the share dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareSelection {
    pub start_time: f64,
    pub end_time: Option<f64>,
    pub include_end: bool,
    pub start_input: String,
    pub end_input: String,
    duration: f64,
    default_span: f64,
}

impl ShareSelection {
    /// Open the dialog at the current playback position.
    pub fn open(current_time: f64, duration: f64) -> Self {
        Self::open_with_span(current_time, duration, DEFAULT_SHARE_SPAN_SECS)
    }

    pub fn open_with_span(current_time: f64, duration: f64, default_span: f64) -> Self {
        Self {
            start_time: current_time,
            end_time: None,
            include_end: false,
            start_input: encode_secs(current_time),
            end_input: String::new(),
            duration,
            default_span,
        }
    }

    /// Edit the start text. Returns whether the committed start changed.
    pub fn set_start_input(&mut self, text: &str) -> bool {
        self.start_input = text.to_string();
        match decode(text) {
            Ok(secs) if secs as f64 <= self.duration => {
                self.start_time = secs as f64;
                true
            }
            _ => false,
        }
    }

    /// Edit the end text. Returns whether the committed end changed.
    pub fn set_end_input(&mut self, text: &str) -> bool {
        self.end_input = text.to_string();
        match decode(text) {
            Ok(secs) if secs as f64 >= self.start_time && secs as f64 <= self.duration => {
                self.end_time = Some(secs as f64);
                true
            }
            _ => false,
        }
    }

    /// Turn the end on. The first time, it defaults to
    /// `min(start + span, duration)`.
    pub fn enable_end(&mut self) {
        if self.include_end {
            return;
        }
        self.include_end = true;
        if self.end_time.is_none() {
            let end = (self.start_time + self.default_span).min(self.duration);
            self.end_time = Some(end);
            self.end_input = encode_secs(end);
        }
    }

    pub fn disable_end(&mut self) {
        self.include_end = false;
    }

    /// The committed range as query parameters, start first.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![(START_PARAM, encode_secs(self.start_time))];
        if let (true, Some(end)) = (self.include_end, self.end_time) {
            pairs.push((END_PARAM, encode_secs(end)));
        }
        pairs
    }

    /// `t=…` or `t=…&e=…`.
    pub fn query_fragment(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// A range decoded from an incoming link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SharedRange {
    pub start: f64,
    /// `None` means a point in time.
    pub end: Option<f64>,
}

impl SharedRange {
    /// Decode the `t`/`e` values of an incoming link. A malformed start
    /// falls back to zero; a malformed end is dropped.
    pub fn from_params(start: Option<&str>, end: Option<&str>) -> Self {
        let start = start.map_or(0, decode_or_zero) as f64;
        let end = end
            .and_then(|token| decode(token).ok())
            .map(|secs| secs as f64)
            .filter(|&secs| secs >= start);
        Self { start, end }
    }

    /// Decode from an iterator of query pairs, e.g. a parsed URL.
    pub fn from_query<'a, I>(pairs: I) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut start = None;
        let mut end = None;
        for (key, value) in pairs {
            match key {
                START_PARAM => start = Some(value),
                END_PARAM => end = Some(value),
                _ => {}
            }
        }
        if start.is_none() && end.is_none() {
            return None;
        }
        Some(Self::from_params(start, end))
    }

    /// Position to seek to when following an external link, compensating
    /// for recording latency.
    pub fn seek_time(&self, offset_secs: f64) -> f64 {
        self.start + offset_secs
    }
}
