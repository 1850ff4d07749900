//! Test doubles shared by the engine integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use image::{ImageFormat, Rgba, RgbaImage};
use scrubkit_common::error::{ScrubError, ScrubResult};
use scrubkit_engine::{MediaSurface, Player, PlayerOptions, SeekTicket};
use scrubkit_model::{Size, SpeechSegment, SpriteMetadata};
use scrubkit_render::{FramePresenter, MemoryAssetSource};

#[derive(Debug, Default)]
pub struct MediaState {
    pub ready: bool,
    pub time: f64,
    pub playing: bool,
    pub rate: f64,
    pub refuse_play: bool,
    pub seeks: Vec<(SeekTicket, f64)>,
}

/// Media surface whose seeks land instantly but only complete when the
/// test says so.
#[derive(Clone, Default)]
pub struct FakeMedia(pub Arc<Mutex<MediaState>>);

impl FakeMedia {
    pub fn ready() -> Self {
        let media = Self::default();
        media.state().ready = true;
        media
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, MediaState> {
        self.0.lock().unwrap()
    }

    pub fn last_seek(&self) -> Option<(SeekTicket, f64)> {
        self.state().seeks.last().copied()
    }

    pub fn seek_count(&self) -> usize {
        self.state().seeks.len()
    }

    /// Let playback run for `secs`.
    pub fn advance(&self, secs: f64) {
        let mut state = self.state();
        if state.playing {
            state.time += secs * state.rate.max(0.0);
        }
    }
}

impl MediaSurface for FakeMedia {
    fn is_ready(&self) -> bool {
        self.state().ready
    }

    fn seek(&mut self, ticket: SeekTicket, time_secs: f64) {
        let mut state = self.state();
        state.time = time_secs;
        state.seeks.push((ticket, time_secs));
    }

    fn play(&mut self) -> ScrubResult<()> {
        let mut state = self.state();
        if state.refuse_play {
            return Err(ScrubError::playback("autoplay blocked"));
        }
        state.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.state().playing = false;
    }

    fn current_time(&self) -> f64 {
        self.state().time
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.state().rate = rate;
    }
}

/// Records every frame handed to the preview.
#[derive(Default)]
pub struct RecordingPresenter {
    frames: Mutex<Vec<usize>>,
}

impl RecordingPresenter {
    pub fn frames(&self) -> Vec<usize> {
        self.frames.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.frames.lock().unwrap().clear();
    }
}

impl FramePresenter for RecordingPresenter {
    fn present(&self, frame: usize) {
        self.frames.lock().unwrap().push(frame);
    }
}

/// A loaded player over 101 frames, one per second.
pub fn loaded_player(media: &FakeMedia) -> (Player, Arc<RecordingPresenter>) {
    loaded_player_with(media, SpriteMetadata::uniform(101, 1.0, 100.0))
}

pub fn loaded_player_with(
    media: &FakeMedia,
    metadata: SpriteMetadata,
) -> (Player, Arc<RecordingPresenter>) {
    let presenter = Arc::new(RecordingPresenter::default());
    let mut player = Player::new(
        Arc::new(metadata),
        Box::new(media.clone()),
        PlayerOptions::default(),
    )
    .with_presenter(presenter.clone());
    player.finish_loading().unwrap();
    (player, presenter)
}

/// Complete the most recent seek.
pub fn settle(player: &mut Player, media: &FakeMedia) -> bool {
    match media.last_seek() {
        Some((ticket, _)) => player.on_seek_complete(ticket),
        None => false,
    }
}

/// Loaded, revealed and playing.
pub fn playing_player(media: &FakeMedia, metadata: SpriteMetadata) -> Player {
    let (mut player, _) = loaded_player_with(media, metadata);
    settle(&mut player, media);
    player.play();
    assert!(player.is_playing());
    player
}

pub fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Small-tiled metadata for 101 one-second frames with two speech bursts.
pub fn demo_metadata() -> SpriteMetadata {
    let mut metadata = SpriteMetadata::uniform(101, 1.0, 100.0);
    metadata.preview_size = Size::new(8, 4);
    metadata.thumbnail_size = Size::new(8, 4);
    metadata.speech_segments = Some(vec![
        SpeechSegment::new(10.0, 20.0),
        SpeechSegment::new(60.0, 70.0),
    ]);
    metadata
}

/// Assets for a recording called `demo` under `https://cdn.test`.
pub fn demo_source(metadata: &SpriteMetadata) -> Arc<MemoryAssetSource> {
    let source = Arc::new(MemoryAssetSource::new());
    source.insert(
        "https://cdn.test/demo-meta.json",
        serde_json::to_vec(metadata).unwrap(),
    );

    let rows = metadata.frames_per_sheet.div_ceil(metadata.sheet_cols) as u32;
    let sheet_w = metadata.sheet_cols as u32 * metadata.preview_size.width;
    let sheet_h = rows * metadata.preview_size.height;
    for sheet in 0..metadata.num_sheets {
        source.insert(
            format!("https://cdn.test/demo-preview-{sheet}.jpg"),
            png(sheet_w, sheet_h, [sheet as u8 * 20, 90, 160, 255]),
        );
    }

    let thumb_rows = metadata.frame_count.div_ceil(metadata.thumbnail_cols) as u32;
    source.insert(
        "https://cdn.test/demo-timeline.jpg",
        png(
            metadata.thumbnail_cols as u32 * metadata.thumbnail_size.width,
            thumb_rows * metadata.thumbnail_size.height,
            [10, 200, 10, 255],
        ),
    );
    source
}
