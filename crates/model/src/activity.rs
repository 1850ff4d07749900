//! Timestamped activity annotations.
//!
//! A recording is published with a feed of `{app, title, path?, startTime}`
//! entries describing which application was in focus. The feed is shown as a
//! navigable list; a handful of well-known apps are relabelled for display.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::time_codec::format_clock;

/// One annotation from the activities feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub app: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Seconds from the start of the recording.
    pub start_time: f64,
}

impl Activity {
    pub fn new(app: impl Into<String>, title: impl Into<String>, start_time: f64) -> Self {
        Self {
            app: app.into(),
            title: title.into(),
            path: None,
            start_time,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Apply the display relabel rules. The first matching rule wins.
    pub fn relabelled(&self) -> Activity {
        let mut out = self.clone();
        match self.app.as_str() {
            "Arc" => {
                let chat = self
                    .path
                    .as_deref()
                    .is_some_and(|p| p.to_lowercase().starts_with("chatgpt"));
                if chat {
                    out.app = "ChatGPT".to_string();
                } else if book_genius().is_match(&self.title) {
                    out.app = "BookGenius".to_string();
                }
            }
            "Warp" => {
                if let Some(rest) = self.title.strip_prefix('✳') {
                    out.app = "Claude Code".to_string();
                    out.title = rest.trim().to_string();
                }
            }
            _ => {}
        }
        out
    }
}

fn book_genius() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)bookgeniusz?").expect("relabel pattern is valid"))
}

/// Parse an activities feed document.
pub fn parse_activities(json: &str) -> Result<Vec<Activity>, serde_json::Error> {
    serde_json::from_str(json)
}

/// A row of the timestamp list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampEntry {
    /// Position in the unfiltered feed.
    pub index: usize,
    /// `MM:SS` or `HH:MM:SS` label.
    pub time: String,
    pub app: String,
    pub title: String,
    pub path: Option<String>,
    pub start_time: f64,
    /// Whether playback is currently inside this entry's span.
    pub current: bool,
}

impl TimestampEntry {
    /// Case-insensitive substring match over app, title and path.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.app.to_lowercase().contains(&query)
            || self.title.to_lowercase().contains(&query)
            || self
                .path
                .as_deref()
                .is_some_and(|p| p.to_lowercase().contains(&query))
    }
}

/// Build the timestamp list for the given playback position.
///
/// Entry `i` is current when `current_time` lies in
/// `[start_i + offset, start_{i+1} + offset)`; the last entry is open-ended.
pub fn timestamp_entries(
    activities: &[Activity],
    current_time: f64,
    offset_secs: f64,
) -> Vec<TimestampEntry> {
    activities
        .iter()
        .enumerate()
        .map(|(index, activity)| {
            let lo = activity.start_time + offset_secs;
            let hi = activities
                .get(index + 1)
                .map_or(f64::INFINITY, |next| next.start_time + offset_secs);
            let shown = activity.relabelled();
            TimestampEntry {
                index,
                time: format_clock(activity.start_time),
                app: shown.app,
                title: shown.title,
                path: shown.path,
                start_time: activity.start_time,
                current: current_time >= lo && current_time < hi,
            }
        })
        .collect()
}

/// Index of the current entry, if any.
pub fn current_index(entries: &[TimestampEntry]) -> Option<usize> {
    entries.iter().position(|entry| entry.current)
}

/// Entries matching a search query. An empty query keeps everything.
pub fn filter_entries<'a>(entries: &'a [TimestampEntry], query: &str) -> Vec<&'a TimestampEntry> {
    entries.iter().filter(|entry| entry.matches(query)).collect()
}
