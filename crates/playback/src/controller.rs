//! Playback controller.
//!
//! [`PlaybackController`] owns the media resource and at most one
//! [`Session`]. Commands and resource signals go through the session's
//! state machine; every accepted transition is applied to the resource
//! and published on three ordered streams:
//!
//! - snapshots ([`PlaybackSnapshot`]), one per accepted transition;
//! - raw time updates ([`TimeUpdate`]), one per accepted position tick;
//! - discrete events ([`PlaybackEvent`]): play, pause, ended, error.

use learnpath_core::types::{LessonId, Seconds, SessionId};
use learnpath_core::CoreError;
use learnpath_events::{EventBus, Subscription};

use crate::config::PlaybackConfig;
use crate::resource::{apply_command, MediaResource};
use crate::session::{Session, Step, Transition};
use crate::signal::MediaSignal;
use crate::state::{PlaybackEvent, PlaybackSnapshot, PlaybackState, TimeUpdate};

/// What happened to a command or signal offered to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Accepted; a snapshot was published.
    Applied,
    /// Remembered until the resource is ready (e.g. `seek` while loading).
    Deferred,
    /// Not valid in the current state, or no session is open.
    Ignored,
    /// Signal from a session that has since been replaced or closed.
    Stale,
}

pub struct PlaybackController<R: MediaResource> {
    resource: R,
    session: Option<Session>,
    snapshots: EventBus<PlaybackSnapshot>,
    time_updates: EventBus<TimeUpdate>,
    events: EventBus<PlaybackEvent>,
}

impl<R: MediaResource> PlaybackController<R> {
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            session: None,
            snapshots: EventBus::new("playback.snapshots"),
            time_updates: EventBus::new("playback.time_updates"),
            events: EventBus::new("playback.events"),
        }
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn resource_mut(&mut self) -> &mut R {
        &mut self.resource
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    pub fn subscribe_snapshots(&mut self) -> Subscription<PlaybackSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn subscribe_time_updates(&mut self) -> Subscription<TimeUpdate> {
        self.time_updates.subscribe()
    }

    pub fn subscribe_events(&mut self) -> Subscription<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Current state of the open session.
    pub fn snapshot(&self) -> Option<PlaybackSnapshot> {
        self.session.as_ref().map(Session::snapshot)
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn lesson_id(&self) -> Option<&LessonId> {
        self.session.as_ref().map(|s| &s.lesson_id)
    }

    pub fn state(&self) -> Option<PlaybackState> {
        self.session.as_ref().map(|s| s.state)
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Open `lesson_id` with `config`, discarding any current session.
    ///
    /// The resource is told to load the source; the session stays `Idle`
    /// until the resource reports `load_start`. Signals tagged with the
    /// previous session id are ignored from here on.
    pub fn open(
        &mut self,
        lesson_id: LessonId,
        config: PlaybackConfig,
    ) -> Result<SessionId, CoreError> {
        config.validate()?;

        if let Some(previous) = self.session.take() {
            tracing::info!(
                session_id = %previous.id,
                lesson_id = %previous.lesson_id,
                "Playback session superseded",
            );
            self.resource.unload();
        }

        let session = Session::new(lesson_id, config);
        for command in session.initial_commands() {
            apply_command(&mut self.resource, &command);
        }

        let session_id = session.id;
        tracing::info!(
            %session_id,
            lesson_id = %session.lesson_id,
            source = %session.config.source,
            preload = session.config.preload.as_str(),
            "Playback session opened",
        );

        self.snapshots.publish(session.snapshot());
        self.session = Some(session);
        Ok(session_id)
    }

    /// Tear the current session down. Returns the id that was closed.
    pub fn close(&mut self) -> Option<SessionId> {
        let session = self.session.take()?;
        self.resource.unload();
        tracing::info!(session_id = %session.id, "Playback session closed");
        Some(session.id)
    }

    // -----------------------------------------------------------------------
    // Resource signals
    // -----------------------------------------------------------------------

    /// Feed a lifecycle signal from the resource.
    pub fn handle_signal(&mut self, session_id: SessionId, signal: MediaSignal) -> Dispatch {
        match &self.session {
            Some(session) if session.id == session_id => {}
            _ => {
                tracing::debug!(
                    %session_id,
                    signal = signal.name(),
                    "Ignoring signal from a stale playback session",
                );
                return Dispatch::Stale;
            }
        }

        let name = signal.name();
        let ended = matches!(signal, MediaSignal::Ended);
        let dispatch = self.run(|session| session.apply_signal(signal));

        if dispatch != Dispatch::Applied {
            tracing::trace!(signal = name, "Signal did not change the session");
            return dispatch;
        }

        let (autoplay, restart) = match self.session.as_mut() {
            Some(session) => (
                session.take_play_request(),
                ended && session.config.looping,
            ),
            None => return dispatch,
        };

        if autoplay {
            tracing::debug!("Resource ready, issuing requested play");
            self.play();
        } else if restart {
            tracing::debug!("Looping back to the start");
            self.play();
        }

        dispatch
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    pub fn play(&mut self) -> Dispatch {
        self.run(Session::play)
    }

    pub fn pause(&mut self) -> Dispatch {
        self.run(Session::pause)
    }

    /// Seek to `seconds`, clamped to `[0, duration]`.
    pub fn seek(&mut self, seconds: Seconds) -> Dispatch {
        self.run(|session| session.seek(seconds))
    }

    /// Set the volume, clamped to `[0, 1]`.
    pub fn set_volume(&mut self, volume: f64) -> Dispatch {
        self.run(|session| session.set_volume(volume))
    }

    pub fn toggle_mute(&mut self) -> Dispatch {
        self.run(Session::toggle_mute)
    }

    /// Change the playback rate. Non-positive or non-finite rates are
    /// rejected with [`CoreError::Validation`].
    pub fn set_playback_rate(&mut self, rate: f64) -> Result<Dispatch, CoreError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(Dispatch::Ignored);
        };
        match session.set_playback_rate(rate) {
            Ok(step) => Ok(self.finish(step)),
            Err(e) => {
                tracing::warn!(rate, error = %e, "Rejected playback rate");
                Err(e)
            }
        }
    }

    /// Recover from `Error`: clears the error and reloads the source.
    pub fn retry(&mut self) -> Dispatch {
        let dispatch = self.run(Session::retry);
        if dispatch == Dispatch::Applied {
            tracing::info!(session_id = ?self.session_id(), "Retrying media load");
        }
        dispatch
    }

    /// Ask the resource to go fullscreen. Returns whether it did; an
    /// unsupported platform is not an error.
    pub fn request_fullscreen(&mut self) -> bool {
        if self.session.is_none() {
            return false;
        }
        match self.resource.request_fullscreen() {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Fullscreen request not honoured");
                false
            }
        }
    }

    /// Ask the resource for picture-in-picture. Same contract as
    /// [`request_fullscreen`](Self::request_fullscreen).
    pub fn request_picture_in_picture(&mut self) -> bool {
        if self.session.is_none() {
            return false;
        }
        match self.resource.request_picture_in_picture() {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Picture-in-picture request not honoured");
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn run(&mut self, op: impl FnOnce(&mut Session) -> Step) -> Dispatch {
        let Some(session) = self.session.as_mut() else {
            return Dispatch::Ignored;
        };
        let step = op(session);
        self.finish(step)
    }

    fn finish(&mut self, step: Step) -> Dispatch {
        match step {
            Step::Ignored => Dispatch::Ignored,
            Step::Deferred => Dispatch::Deferred,
            Step::Applied(transition) => {
                self.commit(transition);
                Dispatch::Applied
            }
        }
    }

    /// Apply a transition's commands, then publish the snapshot, the time
    /// tick and the discrete events, in that order.
    fn commit(&mut self, transition: Transition) {
        let Some(session) = self.session.as_ref() else {
            return;
        };

        for command in &transition.commands {
            apply_command(&mut self.resource, command);
        }

        self.snapshots.publish(session.snapshot());

        if transition.time_update {
            self.time_updates.publish(session.time_update());
        }

        for kind in transition.events {
            tracing::debug!(event = ?kind, lesson_id = %session.lesson_id, "Playback event");
            self.events.publish(PlaybackEvent {
                session_id: session.id,
                lesson_id: session.lesson_id.clone(),
                kind,
            });
        }
    }
}

impl<R: MediaResource + std::fmt::Debug> std::fmt::Debug for PlaybackController<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("resource", &self.resource)
            .field("session", &self.session)
            .finish()
    }
}
