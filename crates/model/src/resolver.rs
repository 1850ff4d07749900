//! Frame-index resolution.
//!
//! Maps playback time to the nearest sampled frame and back, and addresses a
//! frame inside the preview sprite sheets and the filmstrip sprite. All
//! functions are pure over [`SpriteMetadata`].

use serde::{Deserialize, Serialize};

use crate::metadata::SpriteMetadata;

/// Where a frame lives inside the preview sprite sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetPosition {
    /// Which sheet holds the frame.
    pub sheet: usize,
    /// Column within the sheet.
    pub col: usize,
    /// Row within the sheet.
    pub row: usize,
    /// Left edge of the tile in sheet pixels.
    pub x: u32,
    /// Top edge of the tile in sheet pixels.
    pub y: u32,
}

/// Where a frame lives inside the filmstrip sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPosition {
    pub col: usize,
    pub row: usize,
    pub x: u32,
    pub y: u32,
}

impl SpriteMetadata {
    /// Upper bound for resolvable times.
    ///
    /// Normally `duration`; extended to the last explicit sample time when a
    /// generator published samples past the reported duration, so that every
    /// sample stays addressable.
    pub fn time_span(&self) -> f64 {
        match self.frame_times().and_then(|times| times.last()) {
            Some(&last) => self.duration.max(last),
            None => self.duration,
        }
    }

    /// Clamp a time into the resolvable range. NaN maps to zero.
    pub fn clamp_time(&self, time_secs: f64) -> f64 {
        if time_secs.is_nan() {
            return 0.0;
        }
        time_secs.clamp(0.0, self.time_span())
    }

    /// Index of the sampled frame nearest to `time_secs`.
    ///
    /// With an explicit time table the two neighbours around `time_secs` are
    /// compared and ties go to the earlier frame. Without one, the time is
    /// divided by the sampling interval and rounded.
    pub fn frame_at(&self, time_secs: f64) -> usize {
        let t = self.clamp_time(time_secs);

        if let Some(times) = self.frame_times() {
            let lo = times.partition_point(|&sample| sample < t);
            if lo == 0 {
                return 0;
            }
            if lo >= times.len() {
                return times.len() - 1;
            }
            return if t - times[lo - 1] <= times[lo] - t {
                lo - 1
            } else {
                lo
            };
        }

        let index = (t / self.interval).round();
        (index as usize).min(self.last_frame())
    }

    /// Sample time of frame `index` (clamped to the last frame).
    pub fn time_at(&self, index: usize) -> f64 {
        let index = index.min(self.last_frame());
        match self.frame_times() {
            Some(times) => times[index],
            None => index as f64 * self.interval,
        }
    }

    /// Locate a frame in the preview sprite sheets.
    pub fn sheet_position(&self, index: usize) -> SheetPosition {
        let sheet = index / self.frames_per_sheet;
        let in_sheet = index % self.frames_per_sheet;
        let col = in_sheet % self.sheet_cols;
        let row = in_sheet / self.sheet_cols;
        SheetPosition {
            sheet,
            col,
            row,
            x: col as u32 * self.preview_size.width,
            y: row as u32 * self.preview_size.height,
        }
    }

    /// Locate a frame in the filmstrip sprite, which uses its own denser
    /// tiling.
    pub fn thumbnail_position(&self, index: usize) -> GridPosition {
        let col = index % self.thumbnail_cols;
        let row = index / self.thumbnail_cols;
        GridPosition {
            col,
            row,
            x: col as u32 * self.thumbnail_size.width,
            y: row as u32 * self.thumbnail_size.height,
        }
    }

    /// Frame under a scrub position, `progress` in `[0, 1]` (rounded).
    pub fn frame_for_progress(&self, progress: f64) -> usize {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        ((progress * self.last_frame() as f64).round() as usize).min(self.last_frame())
    }

    /// Frame shown by a filmstrip tile starting at `progress` (floored).
    pub fn filmstrip_frame(&self, progress: f64) -> usize {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        ((progress * self.last_frame() as f64).floor() as usize).min(self.last_frame())
    }

    /// Timeline position of a frame in `[0, 1]`.
    pub fn progress_of_frame(&self, index: usize) -> f64 {
        let last = self.last_frame();
        if last == 0 {
            return 0.0;
        }
        index.min(last) as f64 / last as f64
    }
}
