//! Bridge from playback output to lesson progress.
//!
//! [`PlaybackSync`] holds subscriptions on a controller's time-update and
//! event streams. Each [`drain`](PlaybackSync::drain) feeds whatever has
//! been published since the last call into a [`ProgressAggregator`]:
//! position ticks become `record_lesson_progress`, and `ended` records the
//! full duration and completes the lesson.

use serde::Serialize;

use learnpath_core::types::LessonId;
use learnpath_core::CoreError;
use learnpath_events::Subscription;
use learnpath_playback::{
    MediaResource, PlaybackController, PlaybackEvent, PlaybackEventKind, TimeUpdate,
};

use crate::aggregator::ProgressAggregator;

/// Counters for one [`PlaybackSync::drain`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub ticks_applied: usize,
    pub lessons_completed: usize,
    /// Playback output for lessons the aggregator does not know.
    pub not_found: usize,
}

impl SyncReport {
    fn absorb(&mut self, result: Result<bool, CoreError>, lesson_id: &LessonId) {
        match result {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                tracing::warn!(lesson_id = %lesson_id, "Playback for a lesson outside the catalog");
                self.not_found += 1;
            }
            Err(e) => {
                tracing::error!(lesson_id = %lesson_id, error = %e, "Failed to apply playback progress");
            }
        }
    }
}

pub struct PlaybackSync {
    time_updates: Subscription<TimeUpdate>,
    events: Subscription<PlaybackEvent>,
}

impl PlaybackSync {
    /// Subscribe to `controller`. Only output published after this call is
    /// seen.
    pub fn attach<R: MediaResource>(controller: &mut PlaybackController<R>) -> Self {
        Self {
            time_updates: controller.subscribe_time_updates(),
            events: controller.subscribe_events(),
        }
    }

    /// Apply everything queued so far. Ticks go first, then events, so a
    /// lesson's last position is recorded before it is completed.
    pub fn drain(&mut self, aggregator: &mut ProgressAggregator) -> SyncReport {
        let mut report = SyncReport::default();

        while let Ok(envelope) = self.time_updates.try_recv() {
            let update = envelope.payload;
            let result = aggregator.apply_time_update(&update).map(|_| true);
            if result.is_ok() {
                report.ticks_applied += 1;
            }
            report.absorb(result, &update.lesson_id);
        }

        while let Ok(envelope) = self.events.try_recv() {
            let event = envelope.payload;
            let result = aggregator.apply_playback_event(&event);
            if matches!(result, Ok(true)) {
                report.lessons_completed += 1;
            }
            report.absorb(result, &event.lesson_id);
        }

        report
    }
}

impl std::fmt::Debug for PlaybackSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSync").finish_non_exhaustive()
    }
}

impl ProgressAggregator {
    /// Record a position tick from playback.
    pub fn apply_time_update(&mut self, update: &TimeUpdate) -> Result<(), CoreError> {
        self.record_lesson_progress(&update.lesson_id, update.current_time)
            .map(|_| ())
    }

    /// React to a discrete playback event. Returns `true` when the event
    /// completed a lesson that was not complete before.
    pub fn apply_playback_event(&mut self, event: &PlaybackEvent) -> Result<bool, CoreError> {
        match &event.kind {
            PlaybackEventKind::Ended { position } => {
                let before = self.lesson_state(&event.lesson_id)?;
                if before.is_completed {
                    return Ok(false);
                }
                self.record_lesson_progress(&event.lesson_id, *position)?;
                self.complete_lesson(&event.lesson_id)?;
                Ok(true)
            }
            PlaybackEventKind::Play | PlaybackEventKind::Pause | PlaybackEventKind::Error { .. } => {
                Ok(false)
            }
        }
    }
}
