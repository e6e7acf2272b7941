//! End-to-end controller behaviour against the simulated resource.

use assert_matches::assert_matches;

use learnpath_core::types::{LessonId, SessionId};
use learnpath_events::Subscription;
use learnpath_playback::{
    Dispatch, MediaCommand, MediaErrorKind, MediaSignal, PlaybackConfig, PlaybackController,
    PlaybackEventKind, PlaybackState, SimulatedMedia,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn drain<E>(rx: &mut Subscription<E>) -> Vec<E> {
    std::iter::from_fn(|| rx.try_recv().ok())
        .map(|envelope| envelope.payload)
        .collect()
}

/// Open a lesson and walk it to `Ready` with the given duration.
fn ready(
    controller: &mut PlaybackController<SimulatedMedia>,
    lesson: &str,
    config: PlaybackConfig,
    duration: f64,
) -> SessionId {
    let id = controller.open(LessonId::new(lesson), config).unwrap();
    controller.handle_signal(id, MediaSignal::LoadStart);
    controller.handle_signal(id, MediaSignal::LoadedMetadata { duration });
    controller.handle_signal(id, MediaSignal::CanPlay);
    id
}

// ---------------------------------------------------------------------------
// Clamping
// ---------------------------------------------------------------------------

/// Seeking before the start or past the end lands on the nearest boundary.
#[test]
fn seek_clamps_to_media_bounds() {
    let mut controller = PlaybackController::new(SimulatedMedia::new());
    ready(&mut controller, "l1", PlaybackConfig::new("a.mp4"), 1800.0);

    assert_eq!(controller.seek(-5.0), Dispatch::Applied);
    assert_eq!(controller.snapshot().unwrap().current_time, 0.0);

    assert_eq!(controller.seek(5000.0), Dispatch::Applied);
    assert_eq!(controller.snapshot().unwrap().current_time, 1800.0);
    assert_eq!(
        controller.resource().last_command(),
        Some(&MediaCommand::SetCurrentTime { seconds: 1800.0 })
    );
}

#[test]
fn volume_clamps_to_unit_interval() {
    let mut controller = PlaybackController::new(SimulatedMedia::new());
    ready(&mut controller, "l1", PlaybackConfig::new("a.mp4"), 60.0);

    for (requested, stored) in [(-1.0, 0.0), (-0.01, 0.0), (1.5, 1.0), (42.0, 1.0), (0.3, 0.3)] {
        controller.set_volume(requested);
        assert_eq!(controller.snapshot().unwrap().volume, stored, "volume {requested}");
    }
}

#[test]
fn zero_volume_reports_muted() {
    let mut controller = PlaybackController::new(SimulatedMedia::new());
    ready(&mut controller, "l1", PlaybackConfig::new("a.mp4"), 60.0);

    controller.set_volume(-3.0);
    let snapshot = controller.snapshot().unwrap();
    assert!(snapshot.is_muted);
    assert_eq!(
        controller.resource().last_command(),
        Some(&MediaCommand::SetMuted { muted: true })
    );

    controller.set_volume(0.5);
    assert!(!controller.snapshot().unwrap().is_muted);
}

// ---------------------------------------------------------------------------
// Error and retry
// ---------------------------------------------------------------------------

/// error → retry → Loading, then can_play → Ready with loading cleared.
#[test]
fn retry_after_error_reloads_and_recovers() {
    let mut controller = PlaybackController::new(SimulatedMedia::new());
    let mut events = controller.subscribe_events();
    let id = ready(&mut controller, "l1", PlaybackConfig::new("a.mp4"), 300.0);

    controller.handle_signal(
        id,
        MediaSignal::Error {
            kind: MediaErrorKind::Network,
            message: Some("connection reset".into()),
        },
    );
    let failed = controller.snapshot().unwrap();
    assert_eq!(failed.state, PlaybackState::Error);
    assert!(failed.has_error);
    assert!(!failed.is_loading);
    assert_eq!(failed.error_message.as_deref(), Some("connection reset"));
    assert_eq!(failed.error_kind, Some(MediaErrorKind::Network));

    assert_eq!(controller.play(), Dispatch::Ignored);

    assert_eq!(controller.retry(), Dispatch::Applied);
    let retried = controller.snapshot().unwrap();
    assert_eq!(retried.state, PlaybackState::Loading);
    assert!(!retried.has_error);
    assert!(retried.error_message.is_none());
    assert_matches!(
        controller.resource().last_command(),
        Some(MediaCommand::Load { source, .. }) if source == "a.mp4"
    );

    // The resource's own load_start after the reload is a duplicate.
    assert_eq!(controller.handle_signal(id, MediaSignal::LoadStart), Dispatch::Ignored);

    controller.handle_signal(id, MediaSignal::CanPlay);
    let recovered = controller.snapshot().unwrap();
    assert_eq!(recovered.state, PlaybackState::Ready);
    assert!(!recovered.is_loading);

    let kinds: Vec<_> = drain(&mut events).into_iter().map(|e| e.kind).collect();
    assert_eq!(kinds.len(), 1);
    assert_matches!(&kinds[0], PlaybackEventKind::Error { error } if error.message == "connection reset");
}

#[test]
fn errors_without_message_use_the_kind_default() {
    let mut controller = PlaybackController::new(SimulatedMedia::new());
    let id = controller
        .open(LessonId::new("l1"), PlaybackConfig::new("a.webm"))
        .unwrap();
    controller.handle_signal(id, MediaSignal::LoadStart);
    controller.handle_signal(
        id,
        MediaSignal::Error {
            kind: MediaErrorKind::UnsupportedSource,
            message: None,
        },
    );

    let snapshot = controller.snapshot().unwrap();
    assert_eq!(
        snapshot.error_message.as_deref(),
        Some(MediaErrorKind::UnsupportedSource.default_message())
    );
    assert!(snapshot.error().is_some());
}

// ---------------------------------------------------------------------------
// Streams
// ---------------------------------------------------------------------------

/// One snapshot per accepted transition, in acceptance order; ignored
/// signals publish nothing.
#[test]
fn snapshots_follow_accepted_transitions_in_order() {
    let mut controller = PlaybackController::new(SimulatedMedia::new());
    let mut snapshots = controller.subscribe_snapshots();
    let id = ready(&mut controller, "l1", PlaybackConfig::new("a.mp4"), 120.0);

    controller.play();
    controller.play(); // no-op
    controller.handle_signal(id, MediaSignal::TimeUpdate { current_time: 1.0 });
    controller.pause();
    controller.pause(); // no-op

    let states: Vec<PlaybackState> = drain(&mut snapshots).iter().map(|s| s.state).collect();
    assert_eq!(
        states,
        vec![
            PlaybackState::Idle,
            PlaybackState::Loading,
            PlaybackState::Loading, // duration learned
            PlaybackState::Ready,
            PlaybackState::Playing,
            PlaybackState::Playing, // time update
            PlaybackState::Paused,
        ]
    );
}

#[test]
fn time_updates_forward_raw_positions() {
    let mut controller = PlaybackController::new(SimulatedMedia::new());
    let mut ticks = controller.subscribe_time_updates();
    let id = ready(&mut controller, "l1", PlaybackConfig::new("a.mp4"), 120.0);
    controller.play();

    for t in [0.25, 0.5, 0.75] {
        controller.handle_signal(id, MediaSignal::TimeUpdate { current_time: t });
    }

    let positions: Vec<f64> = drain(&mut ticks).iter().map(|t| t.current_time).collect();
    assert_eq!(positions, vec![0.25, 0.5, 0.75]);
    assert_eq!(controller.snapshot().unwrap().progress_percentage(), 0.75 / 120.0 * 100.0);
}

#[test]
fn play_pause_and_end_emit_discrete_events() {
    let mut controller = PlaybackController::new(SimulatedMedia::new());
    let mut events = controller.subscribe_events();
    let id = ready(&mut controller, "l1", PlaybackConfig::new("a.mp4"), 90.0);

    controller.play();
    controller.pause();
    controller.play();
    controller.handle_signal(id, MediaSignal::Ended);

    let kinds: Vec<_> = drain(&mut events).into_iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            PlaybackEventKind::Play,
            PlaybackEventKind::Pause,
            PlaybackEventKind::Play,
            PlaybackEventKind::Ended { position: 90.0 },
        ]
    );

    let ended = controller.snapshot().unwrap();
    assert_eq!(ended.state, PlaybackState::Ended);
    assert!(!ended.is_playing);
    assert_eq!(ended.current_time, 90.0);
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Signals still in flight for a replaced lesson must not touch the new one.
#[test]
fn late_signals_from_a_replaced_session_are_ignored() {
    let mut controller = PlaybackController::new(SimulatedMedia::new());
    let old = ready(&mut controller, "l1", PlaybackConfig::new("a.mp4"), 60.0);
    let new = controller
        .open(LessonId::new("l2"), PlaybackConfig::new("b.mp4"))
        .unwrap();
    assert_ne!(old, new);

    assert_eq!(controller.handle_signal(old, MediaSignal::Ended), Dispatch::Stale);
    assert_eq!(
        controller.handle_signal(old, MediaSignal::TimeUpdate { current_time: 30.0 }),
        Dispatch::Stale
    );

    let snapshot = controller.snapshot().unwrap();
    assert_eq!(snapshot.lesson_id, LessonId::new("l2"));
    assert_eq!(snapshot.state, PlaybackState::Idle);
    assert_eq!(snapshot.current_time, 0.0);
}

#[test]
fn autoplay_starts_once_the_resource_is_ready() {
    let mut controller = PlaybackController::new(SimulatedMedia::new());
    let mut events = controller.subscribe_events();
    ready(
        &mut controller,
        "l1",
        PlaybackConfig::new("a.mp4").with_autoplay(true),
        60.0,
    );

    let snapshot = controller.snapshot().unwrap();
    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert!(snapshot.is_playing);
    assert_eq!(controller.resource().last_command(), Some(&MediaCommand::Play));
    assert_eq!(drain(&mut events).len(), 1);
}

#[test]
fn play_while_loading_is_deferred() {
    let mut controller = PlaybackController::new(SimulatedMedia::new());
    let id = controller
        .open(LessonId::new("l1"), PlaybackConfig::new("a.mp4"))
        .unwrap();
    controller.handle_signal(id, MediaSignal::LoadStart);

    assert_eq!(controller.play(), Dispatch::Deferred);
    assert_eq!(controller.seek(20.0), Dispatch::Deferred);
    assert_eq!(controller.state(), Some(PlaybackState::Loading));

    controller.handle_signal(id, MediaSignal::LoadedMetadata { duration: 60.0 });
    controller.handle_signal(id, MediaSignal::CanPlay);

    let snapshot = controller.snapshot().unwrap();
    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert_eq!(snapshot.current_time, 20.0);
}

#[test]
fn looping_restarts_after_reporting_the_end() {
    let mut controller = PlaybackController::new(SimulatedMedia::new());
    let mut events = controller.subscribe_events();
    let id = ready(
        &mut controller,
        "l1",
        PlaybackConfig::new("a.mp4").with_looping(true),
        30.0,
    );
    controller.play();
    controller.handle_signal(id, MediaSignal::Ended);

    let snapshot = controller.snapshot().unwrap();
    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert_eq!(snapshot.current_time, 0.0);

    let kinds: Vec<_> = drain(&mut events).into_iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            PlaybackEventKind::Play,
            PlaybackEventKind::Ended { position: 30.0 },
            PlaybackEventKind::Play,
        ]
    );
}

#[test]
fn rate_changes_apply_in_any_state() {
    let mut controller = PlaybackController::new(SimulatedMedia::new());
    controller
        .open(LessonId::new("l1"), PlaybackConfig::new("a.mp4"))
        .unwrap();

    assert_eq!(controller.set_playback_rate(1.75).unwrap(), Dispatch::Applied);
    assert_eq!(controller.snapshot().unwrap().playback_rate, 1.75);
    assert!(controller.set_playback_rate(0.0).is_err());
    assert_eq!(controller.snapshot().unwrap().playback_rate, 1.75);
}
