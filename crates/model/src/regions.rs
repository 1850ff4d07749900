//! Playable regions for skip-silence playback.
//!
//! Speech segments are padded by a margin, clamped to the recording, sorted
//! and sweep-merged into the minimal set of disjoint windows. Playback under
//! skip-silence only ever lingers inside these windows.

use serde::{Deserialize, Serialize};

use crate::metadata::{SpeechSegment, SpriteMetadata};

/// Default padding around each speech segment, in seconds.
pub const DEFAULT_REGION_MARGIN_SECS: f64 = 5.0;

/// A window of time eligible for playback under skip-silence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayableRegion {
    pub start: f64,
    pub end: f64,
}

impl PlayableRegion {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Inclusive containment.
    pub fn contains(&self, time_secs: f64) -> bool {
        time_secs >= self.start && time_secs <= self.end
    }

    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0.0
    }
}

/// Sorted, pairwise disjoint playable windows for one recording.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayableRegions {
    regions: Vec<PlayableRegion>,
    /// Segments dropped because `start > end` or a bound was not finite.
    rejected: usize,
}

impl PlayableRegions {
    /// Merge speech segments into playable regions.
    ///
    /// With no usable segments the whole recording is playable.
    pub fn compute(segments: &[SpeechSegment], duration: f64, margin: f64) -> Self {
        let duration = duration.max(0.0);
        let margin = if margin.is_finite() { margin.max(0.0) } else { 0.0 };

        let mut rejected = 0;
        let mut buffered: Vec<PlayableRegion> = segments
            .iter()
            .filter(|seg| {
                let ok = seg.is_well_formed();
                if !ok {
                    rejected += 1;
                    tracing::warn!(
                        start = seg.start,
                        end = seg.end,
                        "Rejecting malformed speech segment"
                    );
                }
                ok
            })
            .map(|seg| {
                PlayableRegion::new(
                    (seg.start - margin).clamp(0.0, duration),
                    (seg.end + margin).clamp(0.0, duration),
                )
            })
            .collect();

        if buffered.is_empty() {
            return Self {
                regions: vec![PlayableRegion::new(0.0, duration)],
                rejected,
            };
        }

        buffered.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut merged: Vec<PlayableRegion> = Vec::with_capacity(buffered.len());
        for region in buffered {
            match merged.last_mut() {
                Some(last) if region.start <= last.end => {
                    last.end = last.end.max(region.end);
                }
                _ => merged.push(region),
            }
        }

        tracing::debug!(
            segments = segments.len(),
            regions = merged.len(),
            rejected,
            "Computed playable regions"
        );

        Self {
            regions: merged,
            rejected,
        }
    }

    /// Regions for a metadata document using the given margin.
    pub fn from_metadata(metadata: &SpriteMetadata, margin: f64) -> Self {
        Self::compute(metadata.speech_segments(), metadata.duration, margin)
    }

    pub fn regions(&self) -> &[PlayableRegion] {
        &self.regions
    }

    /// Number of input segments that were dropped as malformed.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Whether `time_secs` falls inside any region.
    pub fn contains(&self, time_secs: f64) -> bool {
        self.regions.iter().any(|region| region.contains(time_secs))
    }

    /// `time_secs` itself when already playable, otherwise the start of the
    /// first region after it, or `None` when nothing playable remains.
    pub fn next_playable_time(&self, time_secs: f64) -> Option<f64> {
        for region in &self.regions {
            if region.start > time_secs {
                return Some(region.start);
            }
            if region.contains(time_secs) {
                return Some(time_secs);
            }
        }
        None
    }

    /// Total playable seconds.
    pub fn playable_secs(&self) -> f64 {
        self.regions.iter().map(PlayableRegion::len).sum()
    }
}
