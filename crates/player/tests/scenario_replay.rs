//! Integration tests for scenario replay.
//!
//! Drives the fixture scenario end to end and checks the final report.

use assert_matches::assert_matches;

use learnpath_core::types::{CourseId, LessonId, PathId};
use learnpath_playback::{MediaErrorKind, MediaSignal, PlaybackConfig, PlaybackState};
use learnpath_player::replay::{self, Player};
use learnpath_player::scenario::{Scenario, Step, TimeSpec, MAX_WATCH_TICKS};
use learnpath_progress::{Catalog, CourseDef, LessonDef, ProgressAggregator};

const RUST_BASICS: &str = include_str!("fixtures/rust_basics.json");

fn single_lesson_player() -> Player {
    let aggregator = ProgressAggregator::from_catalog(Catalog {
        courses: vec![CourseDef {
            id: CourseId::new("c1"),
            title: "Solo".into(),
            lessons: vec![LessonDef {
                id: LessonId::new("L1"),
                title: String::new(),
                order: 1,
                duration: 120.0,
                completed: false,
                watch_position: 0.0,
            }],
        }],
        paths: vec![],
    })
    .unwrap();
    Player::new(aggregator, false)
}

fn open(lesson: &str) -> Step {
    Step::Open {
        lesson_id: LessonId::new(lesson),
        config: PlaybackConfig::new(format!("{lesson}.mp4")),
        resume: false,
    }
}

// ---------------------------------------------------------------------------
// Fixture replay
// ---------------------------------------------------------------------------

#[test]
fn fixture_replay_rolls_up_progress() {
    let scenario = Scenario::from_json(RUST_BASICS).unwrap();
    let report = replay::run(scenario, false).unwrap();

    assert_eq!(report.steps, 15);
    assert_eq!(report.tally.failed, 0);
    assert_eq!(report.tally.stale, 0);
    assert_eq!(report.sync.ticks_applied, 10);
    assert_eq!(report.sync.lessons_completed, 1);
    assert_eq!(report.sync.not_found, 0);

    let course = &report.courses[0];
    assert_eq!(course.course.course_id, CourseId::new("c1"));
    assert_eq!(course.course.progress, 67);
    assert_eq!(course.course.completed_lessons, 2);

    let l1 = &course.lessons[0];
    assert!(l1.is_completed);
    assert_eq!(l1.bookmarks.len(), 1);
    assert_eq!(l1.bookmarks[0].timestamp, 150.0);
    assert_eq!(l1.notes.len(), 1);

    let l3 = &course.lessons[2];
    assert_eq!(l3.watch_position, 900.0);
    assert_eq!(l3.progress, 50);
    assert!(!l3.is_completed);

    let path = &report.paths[0];
    assert_eq!(path.path_id, PathId::new("p1"));
    assert_eq!(path.progress, 0);
    assert!(!path.is_completed);

    let playback = report.playback.as_ref().unwrap();
    assert_eq!(playback.lesson_id, LessonId::new("L3"));
    assert_eq!(playback.state, PlaybackState::Playing);
    assert_eq!(playback.current_time, 900.0);
}

#[test]
fn pretty_report_lists_lessons() {
    let scenario = Scenario::from_json(RUST_BASICS).unwrap();
    let text = replay::run(scenario, false).unwrap().render_pretty();

    assert!(text.starts_with("Replayed 15 steps"));
    assert!(text.contains("Course c1 \"Rust basics\": 67% (2/3 lessons)"));
    assert!(text.contains("[x] L1"));
    assert!(text.contains("[ ] L3"));
    assert!(text.contains("watched 15:00 of 30m"));
    assert!(text.contains("(1 bookmarks, 1 notes)"));
}

#[test]
fn json_report_flattens_course_progress() {
    let scenario = Scenario::from_json(RUST_BASICS).unwrap();
    let report = replay::run(scenario, false).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["courses"][0]["course_id"], "c1");
    assert_eq!(json["courses"][0]["progress"], 67);
    assert_eq!(json["courses"][0]["lessons"][1]["lesson_id"], "L2");
    assert_eq!(json["playback"]["state"], "playing");
}

#[test]
fn invalid_catalog_fails_the_replay() {
    let raw = r#"{"catalog": {"paths": [{"id": "p1", "courses": ["missing"]}]}}"#;
    let scenario = Scenario::from_json(raw).unwrap();
    assert!(replay::run(scenario, false).unwrap_err().is_not_found());
}

// ---------------------------------------------------------------------------
// Step handling
// ---------------------------------------------------------------------------

#[test]
fn signals_without_a_session_are_ignored() {
    let mut player = single_lesson_player();
    player.apply(Step::Signal(MediaSignal::LoadStart));
    player.apply(Step::Play);

    let report = player.finish();
    assert_eq!(report.tally.ignored, 2);
    assert!(report.playback.is_none());
}

#[test]
fn error_then_retry_recovers() {
    let mut player = single_lesson_player();
    player.apply(open("L1"));
    player.apply(Step::Signal(MediaSignal::LoadStart));
    player.apply(Step::Signal(MediaSignal::Error {
        kind: MediaErrorKind::Network,
        message: None,
    }));

    let snapshot = player.controller().snapshot().unwrap();
    assert_eq!(snapshot.state, PlaybackState::Error);
    assert!(snapshot.has_error);

    player.apply(Step::Play);
    player.apply(Step::Retry);
    assert_eq!(player.controller().state(), Some(PlaybackState::Loading));

    let report = player.finish();
    assert_eq!(report.tally.ignored, 1);
    assert_eq!(report.tally.failed, 0);
}

#[test]
fn bad_timestamps_and_rates_are_counted_as_failures() {
    let mut player = single_lesson_player();
    player.apply(open("L1"));
    player.apply(Step::Seek {
        to: TimeSpec::Clock("1:75".into()),
    });
    player.apply(Step::SetPlaybackRate { rate: 0.0 });
    player.apply(Step::Note {
        lesson_id: LessonId::new("L1"),
        at: TimeSpec::Seconds(3.0),
        text: "  ".into(),
    });
    player.apply(Step::CompleteLesson {
        lesson_id: LessonId::new("nope"),
    });

    assert_eq!(player.finish().tally.failed, 4);
}

#[test]
fn watch_stops_at_the_media_duration() {
    let mut player = single_lesson_player();
    player.apply(open("L1"));
    player.apply(Step::Signal(MediaSignal::LoadStart));
    player.apply(Step::Signal(MediaSignal::LoadedMetadata { duration: 120.0 }));
    player.apply(Step::Signal(MediaSignal::CanPlay));
    player.apply(Step::Play);
    player.apply(Step::Watch {
        until: TimeSpec::Seconds(1e300),
        interval: None,
    });

    assert_eq!(player.controller().snapshot().unwrap().current_time, 120.0);
    let report = player.finish();
    // 15, 30, ... 120
    assert_eq!(report.sync.ticks_applied, 8);
    assert_eq!(report.courses[0].lessons[0].progress, 100);
}

#[test]
fn watch_with_unknown_duration_is_bounded() {
    let mut player = single_lesson_player();
    player.apply(open("L1"));
    player.apply(Step::Signal(MediaSignal::LoadStart));
    player.apply(Step::Watch {
        until: TimeSpec::Seconds(1e300),
        interval: Some(1e250),
    });

    let position = player.controller().snapshot().unwrap().current_time;
    assert!(position > 0.0);
    assert!(position < 1e300);
    assert_eq!(player.finish().sync.ticks_applied, MAX_WATCH_TICKS);
}

#[test]
fn resume_opens_at_the_stored_position() {
    let mut player = single_lesson_player();
    player.apply(open("L1"));
    player.apply(Step::Signal(MediaSignal::LoadStart));
    player.apply(Step::Signal(MediaSignal::LoadedMetadata { duration: 120.0 }));
    player.apply(Step::Signal(MediaSignal::CanPlay));
    player.apply(Step::Play);
    player.apply(Step::Watch {
        until: TimeSpec::Seconds(45.0),
        interval: None,
    });
    player.apply(Step::Close);

    player.apply(Step::Open {
        lesson_id: LessonId::new("L1"),
        config: PlaybackConfig::new("L1.mp4"),
        resume: true,
    });
    player.apply(Step::Signal(MediaSignal::LoadStart));
    player.apply(Step::Signal(MediaSignal::LoadedMetadata { duration: 120.0 }));
    player.apply(Step::Signal(MediaSignal::CanPlay));

    assert_matches!(
        player.controller().snapshot(),
        Some(snapshot) if snapshot.current_time == 45.0
    );
    assert_eq!(
        player
            .aggregator()
            .lesson_state(&LessonId::new("L1"))
            .unwrap()
            .progress,
        37
    );
}
