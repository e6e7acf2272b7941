//! Scenario replay against a simulated media resource.
//!
//! A [`Player`] owns one [`PlaybackController`] over [`SimulatedMedia`],
//! one [`ProgressAggregator`] and the [`PlaybackSync`] between them. Each
//! step is applied in order; playback output is drained into the
//! aggregator after every step, so the report always reflects the whole
//! script.

use serde::Serialize;

use learnpath_core::time_format::{format_duration, format_timestamp};
use learnpath_core::types::Seconds;
use learnpath_core::CoreError;
use learnpath_events::Subscription;
use learnpath_playback::{
    Dispatch, MediaSignal, PlaybackController, PlaybackSnapshot, SimulatedMedia,
};
use learnpath_progress::{
    CourseProgress, LessonState, PathProgress, PlaybackSync, ProgressAggregator, SyncReport,
};

use crate::scenario::{Scenario, Step, DEFAULT_TICK_INTERVAL, MAX_WATCH_TICKS};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// How many steps ended in each outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepTally {
    pub applied: usize,
    pub deferred: usize,
    pub ignored: usize,
    pub stale: usize,
    /// Steps rejected with an error.
    pub failed: usize,
}

impl StepTally {
    fn record(&mut self, dispatch: Dispatch) {
        match dispatch {
            Dispatch::Applied => self.applied += 1,
            Dispatch::Deferred => self.deferred += 1,
            Dispatch::Ignored => self.ignored += 1,
            Dispatch::Stale => self.stale += 1,
        }
    }
}

/// A course with its lessons, in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseReport {
    #[serde(flatten)]
    pub course: CourseProgress,
    pub lessons: Vec<LessonState>,
}

/// Final state after a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub steps: usize,
    pub tally: StepTally,
    pub sync: SyncReport,
    /// Last playback snapshot, if a session is still open.
    pub playback: Option<PlaybackSnapshot>,
    pub courses: Vec<CourseReport>,
    pub paths: Vec<PathProgress>,
}

impl Report {
    /// Human-readable summary.
    pub fn render_pretty(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "Replayed {} steps: {} applied, {} deferred, {} ignored, {} stale, {} failed\n",
            self.steps,
            self.tally.applied,
            self.tally.deferred,
            self.tally.ignored,
            self.tally.stale,
            self.tally.failed,
        ));

        if let Some(snapshot) = &self.playback {
            out.push_str(&format!(
                "\nPlayback: {} [{}] {} / {}\n",
                snapshot.lesson_id,
                snapshot.state.as_str(),
                format_timestamp(snapshot.current_time),
                format_timestamp(snapshot.duration),
            ));
            if let Some(message) = &snapshot.error_message {
                out.push_str(&format!("  error: {message}\n"));
            }
        }

        for path in &self.paths {
            out.push_str(&format!(
                "\nPath {} \"{}\": {}% ({}/{} courses){}{}\n",
                path.path_id,
                path.title,
                path.progress,
                path.completed_courses,
                path.total_courses,
                if path.is_completed { " completed" } else { "" },
                if path.recommendation_eligible {
                    " recommended"
                } else {
                    ""
                },
            ));
        }

        for report in &self.courses {
            let course = &report.course;
            out.push_str(&format!(
                "\nCourse {} \"{}\": {}% ({}/{} lessons)\n",
                course.course_id,
                course.title,
                course.progress,
                course.completed_lessons,
                course.total_lessons,
            ));
            for lesson in &report.lessons {
                out.push_str(&format!(
                    "  {} {:<12} {:>3}%  watched {} of {}{}\n",
                    if lesson.is_completed { "[x]" } else { "[ ]" },
                    lesson.lesson_id.as_str(),
                    lesson.progress,
                    format_timestamp(lesson.watch_position),
                    format_duration(lesson.duration),
                    annotation_summary(lesson),
                ));
            }
        }

        out
    }
}

fn finite(secs: Seconds) -> Result<Seconds, CoreError> {
    if secs.is_finite() {
        Ok(secs)
    } else {
        Err(CoreError::Validation(format!("Watch target must be finite, got {secs}")))
    }
}

fn annotation_summary(lesson: &LessonState) -> String {
    match (lesson.bookmarks.len(), lesson.notes.len()) {
        (0, 0) => String::new(),
        (b, n) => format!("  ({b} bookmarks, {n} notes)"),
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

pub struct Player {
    controller: PlaybackController<SimulatedMedia>,
    aggregator: ProgressAggregator,
    sync: PlaybackSync,
    snapshots: Subscription<PlaybackSnapshot>,
    echo_snapshots: bool,
    tally: StepTally,
    sync_totals: SyncReport,
    steps: usize,
}

impl Player {
    pub fn new(aggregator: ProgressAggregator, echo_snapshots: bool) -> Self {
        let mut controller =
            PlaybackController::new(SimulatedMedia::new().with_capabilities(true, true));
        let sync = PlaybackSync::attach(&mut controller);
        let snapshots = controller.subscribe_snapshots();
        Self {
            controller,
            aggregator,
            sync,
            snapshots,
            echo_snapshots,
            tally: StepTally::default(),
            sync_totals: SyncReport::default(),
            steps: 0,
        }
    }

    pub fn controller(&self) -> &PlaybackController<SimulatedMedia> {
        &self.controller
    }

    pub fn aggregator(&self) -> &ProgressAggregator {
        &self.aggregator
    }

    /// Apply one step, then flush playback output into the aggregator.
    pub fn apply(&mut self, step: Step) {
        self.steps += 1;
        let name = step.name();
        tracing::debug!(step = name, index = self.steps, "Applying step");

        match step {
            Step::Open {
                lesson_id,
                mut config,
                resume,
            } => {
                if resume && config.start_time == 0.0 {
                    if let Ok(position) = self.aggregator.resume_position(&lesson_id) {
                        config.start_time = position;
                    }
                }
                match self.controller.open(lesson_id, config) {
                    Ok(_) => self.tally.applied += 1,
                    Err(e) => {
                        tracing::warn!(error = %e, "Could not open lesson");
                        self.tally.failed += 1;
                    }
                }
            }
            Step::Close => {
                let dispatch = match self.controller.close() {
                    Some(_) => Dispatch::Applied,
                    None => Dispatch::Ignored,
                };
                self.tally.record(dispatch);
            }
            Step::Signal(signal) => {
                let dispatch = self.signal(signal);
                self.tally.record(dispatch);
            }
            Step::Watch { until, interval } => match until.resolve().and_then(finite) {
                Ok(until) => {
                    let interval = interval
                        .filter(|i| i.is_finite() && *i > 0.0)
                        .unwrap_or(DEFAULT_TICK_INTERVAL);
                    self.watch(until, interval);
                    self.tally.applied += 1;
                }
                Err(e) => self.fail(name, e),
            },
            Step::Play => {
                let dispatch = self.controller.play();
                self.tally.record(dispatch);
            }
            Step::Pause => {
                let dispatch = self.controller.pause();
                self.tally.record(dispatch);
            }
            Step::Seek { to } => match to.resolve() {
                Ok(seconds) => {
                    let dispatch = self.controller.seek(seconds);
                    self.tally.record(dispatch);
                }
                Err(e) => self.fail(name, e),
            },
            Step::SetVolume { volume } => {
                let dispatch = self.controller.set_volume(volume);
                self.tally.record(dispatch);
            }
            Step::ToggleMute => {
                let dispatch = self.controller.toggle_mute();
                self.tally.record(dispatch);
            }
            Step::SetPlaybackRate { rate } => match self.controller.set_playback_rate(rate) {
                Ok(dispatch) => self.tally.record(dispatch),
                Err(e) => self.fail(name, e),
            },
            Step::Retry => {
                let dispatch = self.controller.retry();
                self.tally.record(dispatch);
            }
            Step::Fullscreen => {
                let dispatch = if self.controller.request_fullscreen() {
                    Dispatch::Applied
                } else {
                    Dispatch::Ignored
                };
                self.tally.record(dispatch);
            }
            Step::PictureInPicture => {
                let dispatch = if self.controller.request_picture_in_picture() {
                    Dispatch::Applied
                } else {
                    Dispatch::Ignored
                };
                self.tally.record(dispatch);
            }
            Step::CompleteLesson { lesson_id } => {
                let result = self.aggregator.complete_lesson(&lesson_id).map(|_| ());
                self.settle(name, result);
            }
            Step::CompleteCourse { course_id } => {
                let result = self.aggregator.complete_course(&course_id).map(|_| ());
                self.settle(name, result);
            }
            Step::SetProgress { entity, value } => {
                let result = self.aggregator.set_progress(&entity, value);
                self.settle(name, result);
            }
            Step::SetRecommendation { path_id, eligible } => {
                let result = self
                    .aggregator
                    .set_recommendation_eligible(&path_id, eligible)
                    .map(|_| ());
                self.settle(name, result);
            }
            Step::Bookmark {
                lesson_id,
                at,
                label,
            } => {
                let result = at
                    .resolve()
                    .and_then(|t| self.aggregator.add_bookmark(&lesson_id, t, label))
                    .map(|_| ());
                self.settle(name, result);
            }
            Step::Note {
                lesson_id,
                at,
                text,
            } => {
                let result = at
                    .resolve()
                    .and_then(|t| self.aggregator.add_note(&lesson_id, t, text))
                    .map(|_| ());
                self.settle(name, result);
            }
        }

        self.flush();
    }

    /// Consume the player and describe where everything ended up.
    pub fn finish(mut self) -> Report {
        self.flush();

        let courses = self
            .aggregator
            .courses()
            .into_iter()
            .map(|course| {
                let lessons = self
                    .aggregator
                    .course_lessons(&course.course_id)
                    .unwrap_or_default();
                CourseReport { course, lessons }
            })
            .collect();

        Report {
            steps: self.steps,
            tally: self.tally,
            sync: self.sync_totals,
            playback: self.controller.snapshot(),
            courses,
            paths: self.aggregator.paths(),
        }
    }

    fn signal(&mut self, signal: MediaSignal) -> Dispatch {
        match self.controller.session_id() {
            Some(session_id) => self.controller.handle_signal(session_id, signal),
            None => {
                tracing::warn!(signal = signal.name(), "Signal with no open session");
                Dispatch::Ignored
            }
        }
    }

    /// Tick from the current position up to `until`, flushing as we go so
    /// the aggregator sees every tick.
    ///
    /// `until` is capped at the media duration once it is known, and no
    /// more than [`MAX_WATCH_TICKS`] ticks are generated.
    fn watch(&mut self, until: Seconds, interval: Seconds) {
        let Some((mut position, duration)) = self
            .controller
            .snapshot()
            .map(|s| (s.current_time, s.duration))
        else {
            tracing::warn!("Watch step with no open session");
            return;
        };
        let until = if duration > 0.0 { until.min(duration) } else { until };

        let mut ticks = 0;
        while position < until && ticks < MAX_WATCH_TICKS {
            let next = (position + interval).min(until);
            if next <= position {
                break;
            }
            position = next;
            self.signal(MediaSignal::TimeUpdate {
                current_time: position,
            });
            self.flush();
            ticks += 1;
        }

        if position < until {
            tracing::warn!(ticks, position, until, "Watch step stopped short of its target");
        }
    }

    fn settle(&mut self, step: &'static str, result: Result<(), CoreError>) {
        match result {
            Ok(()) => self.tally.applied += 1,
            Err(e) => self.fail(step, e),
        }
    }

    fn fail(&mut self, step: &'static str, error: CoreError) {
        tracing::warn!(step, error = %error, "Step failed");
        self.tally.failed += 1;
    }

    fn flush(&mut self) {
        while let Ok(envelope) = self.snapshots.try_recv() {
            let snapshot = envelope.payload;
            if self.echo_snapshots {
                tracing::info!(
                    lesson_id = %snapshot.lesson_id,
                    state = snapshot.state.as_str(),
                    current_time = snapshot.current_time,
                    "Playback snapshot",
                );
            } else {
                tracing::debug!(
                    lesson_id = %snapshot.lesson_id,
                    state = snapshot.state.as_str(),
                    current_time = snapshot.current_time,
                    "Playback snapshot",
                );
            }
        }

        let report = self.sync.drain(&mut self.aggregator);
        self.sync_totals.ticks_applied += report.ticks_applied;
        self.sync_totals.lessons_completed += report.lessons_completed;
        self.sync_totals.not_found += report.not_found;
    }
}

/// Build the aggregator from the scenario's catalog and replay every step.
pub fn run(scenario: Scenario, echo_snapshots: bool) -> Result<Report, CoreError> {
    let aggregator = ProgressAggregator::from_catalog(scenario.catalog)?;
    let mut player = Player::new(aggregator, echo_snapshots);

    for step in scenario.steps {
        player.apply(step);
    }

    let report = player.finish();
    tracing::info!(
        steps = report.steps,
        applied = report.tally.applied,
        failed = report.tally.failed,
        lessons_completed = report.sync.lessons_completed,
        "Scenario replayed",
    );
    Ok(report)
}
