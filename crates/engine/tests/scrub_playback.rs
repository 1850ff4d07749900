//! Scrubbing and playback scenarios against a fake media surface.

mod common;

use std::sync::{Arc, Mutex};

use common::{loaded_player, loaded_player_with, playing_player, settle, FakeMedia};
use proptest::prelude::*;
use scrubkit_common::logging::init_test_logging;
use scrubkit_engine::{
    handle_key, CaptureFlag, FrameScheduler, FrameToken, Key, Phase, ScrubController, SeekPurpose,
    StripGeometry, SyncOutcome,
};
use scrubkit_model::{SpeechSegment, SpriteMetadata, TutorialAction};

#[derive(Clone, Default)]
struct ManualScheduler {
    requested: Arc<Mutex<Vec<FrameToken>>>,
    cancelled: Arc<Mutex<Vec<FrameToken>>>,
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameToken {
        let mut requested = self.requested.lock().unwrap();
        let token = FrameToken(requested.len() as u64 + 1);
        requested.push(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.cancelled.lock().unwrap().push(token);
    }
}

fn controller() -> (ScrubController, ManualScheduler, CaptureFlag) {
    let scheduler = ManualScheduler::default();
    let capture = CaptureFlag::new();
    let controller = ScrubController::new(
        Box::new(scheduler.clone()),
        Box::new(capture.clone()),
        StripGeometry {
            left: 0.0,
            width: 200.0,
        },
    );
    (controller, scheduler, capture)
}

#[test]
fn test_click_without_drag_resolves_frame_once() {
    init_test_logging();
    let media = FakeMedia::ready();
    let (mut player, presenter) = loaded_player(&media);
    settle(&mut player, &media);
    presenter.clear();

    let (mut scrub, _scheduler, capture) = controller();
    assert_eq!(
        scrub.pointer_down(&mut player, 100.0),
        Some(TutorialAction::Scrub)
    );
    assert!(!player.show_video());
    scrub.pointer_up(&mut player);

    assert_eq!(presenter.frames(), vec![50]);
    assert!(!capture.is_captured());
    let pending = player.pending_seek().copied().unwrap();
    assert_eq!(pending.purpose, SeekPurpose::ScrubRelease { resume: false });
    assert_eq!(pending.target, 50.0);

    assert!(settle(&mut player, &media));
    assert!(player.show_video());
    assert!(!player.is_playing());
}

#[test]
fn test_last_pointer_position_wins() {
    let media = FakeMedia::ready();
    let (mut player, presenter) = loaded_player(&media);
    presenter.clear();

    let (mut scrub, scheduler, _capture) = controller();
    scrub.pointer_down(&mut player, 20.0);
    scrub.pointer_move(60.0);
    scrub.pointer_move(180.0);
    scrub.pointer_up(&mut player);

    assert_eq!(presenter.frames(), vec![90]);
    assert_eq!(scheduler.requested.lock().unwrap().len(), 1);
    assert_eq!(
        *scheduler.cancelled.lock().unwrap(),
        vec![FrameToken(1)]
    );
    assert_eq!(media.last_seek().map(|(_, target)| target), Some(90.0));
}

#[test]
fn test_animation_frames_resolve_during_drag() {
    let media = FakeMedia::ready();
    let (mut player, presenter) = loaded_player(&media);
    presenter.clear();
    let seeks_before = media.seek_count();

    let (mut scrub, _scheduler, _capture) = controller();
    scrub.pointer_down(&mut player, 20.0);
    scrub.on_animation_frame(&mut player, FrameToken(1));
    scrub.pointer_move(100.0);
    scrub.on_animation_frame(&mut player, FrameToken(2));
    scrub.pointer_move(140.0);
    scrub.pointer_up(&mut player);

    assert_eq!(presenter.frames(), vec![10, 50, 70]);
    // The surface is only seeked once the drag ends.
    assert_eq!(media.seek_count(), seeks_before + 1);
}

#[test]
fn test_scrub_resumes_playback() {
    let media = FakeMedia::ready();
    let mut player = playing_player(&media, SpriteMetadata::uniform(101, 1.0, 100.0));

    let (mut scrub, _scheduler, _capture) = controller();
    scrub.pointer_down(&mut player, 60.0);
    assert_eq!(player.phase(), Phase::Scrubbing { resume: true });
    assert!(!media.state().playing);
    assert!(!player.show_video());

    scrub.pointer_up(&mut player);
    assert!(!player.is_playing());
    assert!(player.wants_playback());

    assert!(settle(&mut player, &media));
    assert!(player.is_playing());
    assert!(player.show_video());
    assert!(media.state().playing);
    assert_eq!(player.current_frame(), 30);
}

#[test]
fn test_reveal_completing_mid_scrub_keeps_preview() {
    let media = FakeMedia::ready();
    let (mut player, _presenter) = loaded_player(&media);
    let (reveal, _) = media.last_seek().unwrap();

    let (mut scrub, _scheduler, _capture) = controller();
    scrub.pointer_down(&mut player, 40.0);
    assert!(!player.on_seek_complete(reveal));
    assert!(!player.show_video());
}

#[test]
fn test_play_during_scrub_starts_after_release() {
    let media = FakeMedia::ready();
    let (mut player, _presenter) = loaded_player(&media);
    settle(&mut player, &media);

    let (mut scrub, _scheduler, _capture) = controller();
    scrub.pointer_down(&mut player, 40.0);
    handle_key(&mut player, Key::Space);
    assert_eq!(player.phase(), Phase::Scrubbing { resume: true });
    scrub.pointer_up(&mut player);
    settle(&mut player, &media);
    assert!(player.is_playing());
}

#[test]
fn test_refused_play_stays_paused() {
    let media = FakeMedia::ready();
    media.state().refuse_play = true;
    let (mut player, _presenter) = loaded_player(&media);
    settle(&mut player, &media);

    player.play();
    assert_eq!(player.phase(), Phase::Paused);
    assert!(!player.is_playing());
}

#[test]
fn test_pause_reads_back_surface_time() {
    let media = FakeMedia::ready();
    let mut player = playing_player(&media, SpriteMetadata::uniform(101, 1.0, 100.0));
    media.advance(12.4);
    handle_key(&mut player, Key::Space);

    assert_eq!(player.phase(), Phase::Paused);
    assert_eq!(player.current_frame(), 12);
    assert!((player.current_time() - 12.4).abs() < 1e-9);
}

#[test]
fn test_arrow_keys_step_and_pause() {
    let media = FakeMedia::ready();
    let mut player = playing_player(&media, SpriteMetadata::uniform(101, 1.0, 100.0));
    media.advance(5.0);

    assert_eq!(
        handle_key(&mut player, Key::ArrowRight),
        Some(TutorialAction::Arrows)
    );
    assert!(!player.is_playing());
    assert_eq!(player.current_frame(), 6);

    for _ in 0..10 {
        handle_key(&mut player, Key::ArrowLeft);
    }
    assert_eq!(player.current_frame(), 0);
    assert_eq!(handle_key(&mut player, Key::Other), None);
}

#[test]
fn test_exact_time_seek_applies_offset() {
    let media = FakeMedia::ready();
    let (mut player, presenter) = loaded_player(&media);
    settle(&mut player, &media);
    presenter.clear();

    player.seek_to_exact_time(42.0);
    let (_, target) = media.last_seek().unwrap();
    assert!((target - 42.3).abs() < 1e-9);
    assert_eq!(player.current_frame(), 42);
    assert_eq!(presenter.frames(), vec![42]);
}

#[test]
fn test_speed_survives_loading_and_scrubbing() {
    let media = FakeMedia::ready();
    let (mut player, _presenter) = loaded_player(&media);
    player.set_speed(3.0);
    assert_eq!(media.state().rate, 3.0);

    let (mut scrub, _scheduler, _capture) = controller();
    scrub.pointer_down(&mut player, 10.0);
    player.set_speed(0.01);
    assert_eq!(media.state().rate, 0.1);
}

#[test]
fn test_skip_silence_jumps_then_ends() {
    let mut metadata = SpriteMetadata::uniform(101, 1.0, 100.0);
    metadata.speech_segments = Some(vec![SpeechSegment::new(10.0, 20.0)]);
    let media = FakeMedia::ready();
    let mut player = playing_player(&media, metadata);
    player.set_skip_silence(true);

    assert_eq!(player.sync_from_surface(), SyncOutcome::Skipped { to: 5.0 });
    assert_eq!(player.current_frame(), 5);
    assert_eq!(media.state().time, 5.0);

    media.advance(10.0);
    assert_eq!(
        player.sync_from_surface(),
        SyncOutcome::Tracked { frame: 15 }
    );

    media.advance(15.0);
    assert_eq!(player.sync_from_surface(), SyncOutcome::Ended);
    assert!(!player.is_playing());
    assert_eq!(player.sync_from_surface(), SyncOutcome::Idle);
}

#[test]
fn test_deferred_seek_waits_for_media() {
    let media = FakeMedia::default();
    let (mut player, _presenter) = loaded_player_with(&media, SpriteMetadata::uniform(11, 1.0, 10.0));
    player.seek_to_frame(4);
    player.play();
    assert_eq!(media.seek_count(), 0);
    assert_eq!(
        player.pending_seek().map(|p| p.purpose),
        Some(SeekPurpose::StartPlayback)
    );

    media.state().ready = true;
    player.on_media_ready();
    assert_eq!(media.last_seek().map(|(_, t)| t), Some(4.0));
    settle(&mut player, &media);
    assert!(player.is_playing());
}

proptest! {
    #[test]
    fn skip_silence_never_plays_silence(
        segments in prop::collection::vec((0.0f64..100.0, 0.0f64..8.0), 0..6),
        steps in prop::collection::vec(0.05f64..3.0, 1..80),
    ) {
        let mut metadata = SpriteMetadata::uniform(101, 1.0, 100.0);
        metadata.speech_segments = Some(
            segments
                .iter()
                .map(|(start, len)| SpeechSegment::new(*start, start + len))
                .collect(),
        );
        let media = FakeMedia::ready();
        let mut player = playing_player(&media, metadata);
        player.set_skip_silence(true);

        for dt in steps {
            media.advance(dt);
            player.sync_from_surface();
            if !player.is_playing() {
                break;
            }
            prop_assert!(player.regions().contains(player.current_time()));
        }
    }
}
