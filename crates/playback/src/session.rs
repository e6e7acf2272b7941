//! Playback session state machine.
//!
//! [`Session`] holds the ephemeral state of one opened lesson and decides
//! every transition. It performs no I/O: each accepted transition is
//! returned as a [`Transition`] listing the media commands to issue and
//! the discrete events to publish, and the controller carries them out.

use learnpath_core::types::{LessonId, Seconds, SessionId};

use crate::config::{clamp_volume, validate_playback_rate, PlaybackConfig, DEFAULT_VOLUME};
use crate::error::MediaLoadError;
use crate::resource::MediaCommand;
use crate::signal::MediaSignal;
use crate::state::{PlaybackEventKind, PlaybackSnapshot, PlaybackState, TimeUpdate};

// ---------------------------------------------------------------------------
// Step / Transition
// ---------------------------------------------------------------------------

/// Side effects of one accepted transition.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Transition {
    pub commands: Vec<MediaCommand>,
    pub events: Vec<PlaybackEventKind>,
    /// Forward the new position on the raw time-update stream.
    pub time_update: bool,
}

impl Transition {
    fn command(command: MediaCommand) -> Self {
        Self {
            commands: vec![command],
            ..Self::default()
        }
    }
}

/// Result of offering a signal or command to the session.
#[derive(Debug, PartialEq)]
pub(crate) enum Step {
    /// Not valid in the current state, or would change nothing.
    Ignored,
    /// Remembered and applied once the resource is ready.
    Deferred,
    Applied(Transition),
}

impl Step {
    fn applied() -> Self {
        Self::Applied(Transition::default())
    }
}

// ---------------------------------------------------------------------------
// Mute bookkeeping
// ---------------------------------------------------------------------------

/// Why the session is muted.
///
/// Only a volume-driven mute is lifted by raising the volume again; an
/// explicit mute stays until the next `toggle_mute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MuteSource {
    Unmuted,
    Volume,
    Explicit,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub(crate) struct Session {
    pub id: SessionId,
    pub lesson_id: LessonId,
    pub config: PlaybackConfig,
    pub state: PlaybackState,
    pub current_time: Seconds,
    pub duration: Seconds,
    pub volume: f64,
    pub playback_rate: f64,
    pub is_playing: bool,
    pub is_loading: bool,
    pub error: Option<MediaLoadError>,
    mute: MuteSource,
    /// Volume restored when a volume-driven mute is toggled off.
    last_audible_volume: f64,
    pending_seek: Option<Seconds>,
    play_requested: bool,
    /// State that was interrupted by buffering or a resource seek.
    interrupted_from: Option<PlaybackState>,
}

impl Session {
    pub fn new(lesson_id: LessonId, config: PlaybackConfig) -> Self {
        let volume = clamp_volume(config.volume).unwrap_or(DEFAULT_VOLUME);
        let mute = if config.muted {
            MuteSource::Explicit
        } else if volume == 0.0 {
            MuteSource::Volume
        } else {
            MuteSource::Unmuted
        };

        Self {
            id: SessionId::generate(),
            lesson_id,
            state: PlaybackState::Idle,
            current_time: 0.0,
            duration: 0.0,
            volume,
            playback_rate: config.playback_rate,
            is_playing: false,
            is_loading: false,
            error: None,
            mute,
            last_audible_volume: if volume > 0.0 { volume } else { DEFAULT_VOLUME },
            pending_seek: (config.start_time > 0.0).then_some(config.start_time),
            play_requested: config.autoplay,
            interrupted_from: None,
            config,
        }
    }

    /// Commands that bring a fresh resource in line with this session.
    pub fn initial_commands(&self) -> Vec<MediaCommand> {
        vec![
            self.load_command(),
            MediaCommand::SetVolume {
                volume: self.volume,
            },
            MediaCommand::SetMuted {
                muted: self.is_muted(),
            },
            MediaCommand::SetPlaybackRate {
                rate: self.playback_rate,
            },
        ]
    }

    fn load_command(&self) -> MediaCommand {
        MediaCommand::Load {
            source: self.config.source.clone(),
            preload: self.config.preload,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.mute != MuteSource::Unmuted
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            session_id: self.id,
            lesson_id: self.lesson_id.clone(),
            state: self.state,
            current_time: self.current_time,
            duration: self.duration,
            volume: self.volume,
            playback_rate: self.playback_rate,
            is_playing: self.is_playing,
            is_muted: self.is_muted(),
            is_loading: self.is_loading,
            has_error: self.error.is_some(),
            error_kind: self.error.as_ref().map(|e| e.kind),
            error_message: self.error.as_ref().map(|e| e.message.clone()),
        }
    }

    pub fn time_update(&self) -> TimeUpdate {
        TimeUpdate {
            session_id: self.id,
            lesson_id: self.lesson_id.clone(),
            current_time: self.current_time,
            duration: self.duration,
        }
    }

    /// Consume a play request made before the resource was ready.
    pub fn take_play_request(&mut self) -> bool {
        if self.state == PlaybackState::Ready && self.play_requested {
            self.play_requested = false;
            true
        } else {
            false
        }
    }

    /// Clamp into `[0, duration]`; only the lower bound applies while the
    /// duration is unknown.
    fn clamp_position(&self, seconds: Seconds) -> Seconds {
        if self.duration > 0.0 {
            seconds.clamp(0.0, self.duration)
        } else {
            seconds.max(0.0)
        }
    }

    /// Where to go once a stall or resource seek is over.
    fn resume_state(&self) -> PlaybackState {
        if self.is_playing {
            return PlaybackState::Playing;
        }
        match self.interrupted_from {
            Some(PlaybackState::Ready) => PlaybackState::Ready,
            _ => PlaybackState::Paused,
        }
    }

    fn start_playing(&mut self, mut transition: Transition) -> Step {
        self.state = PlaybackState::Playing;
        self.is_playing = true;
        transition.commands.push(MediaCommand::Play);
        transition.events.push(PlaybackEventKind::Play);
        Step::Applied(transition)
    }

    // -----------------------------------------------------------------------
    // Resource signals
    // -----------------------------------------------------------------------

    pub fn apply_signal(&mut self, signal: MediaSignal) -> Step {
        use PlaybackState as S;

        // Until `retry`, nothing the resource says is acted on.
        if self.state == S::Error {
            return Step::Ignored;
        }

        match signal {
            MediaSignal::LoadStart => {
                if self.state != S::Idle {
                    return Step::Ignored;
                }
                self.state = S::Loading;
                self.is_loading = true;
                self.error = None;
                Step::applied()
            }

            MediaSignal::LoadedMetadata { duration } | MediaSignal::DurationChange { duration } => {
                if !duration.is_finite() || duration < 0.0 || duration == self.duration {
                    return Step::Ignored;
                }
                self.duration = duration;
                self.current_time = self.clamp_position(self.current_time);
                Step::applied()
            }

            MediaSignal::LoadedData | MediaSignal::CanPlay | MediaSignal::CanPlayThrough => {
                match self.state {
                    S::Loading => {
                        self.state = S::Ready;
                        self.is_loading = false;
                        let mut transition = Transition::default();
                        if let Some(target) = self.pending_seek.take() {
                            let target = self.clamp_position(target);
                            self.current_time = target;
                            transition
                                .commands
                                .push(MediaCommand::SetCurrentTime { seconds: target });
                        }
                        Step::Applied(transition)
                    }
                    S::Buffering => {
                        self.is_loading = false;
                        self.state = self.resume_state();
                        self.interrupted_from = None;
                        Step::applied()
                    }
                    _ => Step::Ignored,
                }
            }

            MediaSignal::Waiting => match self.state {
                S::Ready | S::Playing | S::Paused | S::Seeking => {
                    if self.state != S::Seeking {
                        self.interrupted_from = Some(self.state);
                    }
                    self.state = S::Buffering;
                    self.is_loading = true;
                    Step::applied()
                }
                _ => Step::Ignored,
            },

            MediaSignal::Seeking => match self.state {
                S::Ready | S::Playing | S::Paused | S::Ended | S::Buffering => {
                    if self.state != S::Buffering {
                        self.interrupted_from = Some(self.state);
                    }
                    self.state = S::Seeking;
                    Step::applied()
                }
                _ => Step::Ignored,
            },

            MediaSignal::Seeked => {
                if self.state != S::Seeking {
                    return Step::Ignored;
                }
                self.is_loading = false;
                self.state = self.resume_state();
                self.interrupted_from = None;
                Step::applied()
            }

            MediaSignal::TimeUpdate { current_time } => {
                if self.state == S::Idle || !current_time.is_finite() {
                    return Step::Ignored;
                }
                self.current_time = self.clamp_position(current_time);
                Step::Applied(Transition {
                    time_update: true,
                    ..Transition::default()
                })
            }

            MediaSignal::Ended => match self.state {
                S::Idle | S::Loading | S::Ended => Step::Ignored,
                _ => {
                    if self.duration > 0.0 {
                        self.current_time = self.duration;
                    }
                    self.state = S::Ended;
                    self.is_playing = false;
                    self.is_loading = false;
                    self.interrupted_from = None;
                    Step::Applied(Transition {
                        events: vec![PlaybackEventKind::Ended {
                            position: self.current_time,
                        }],
                        ..Transition::default()
                    })
                }
            },

            MediaSignal::Error { kind, message } => {
                if self.state == S::Ended {
                    return Step::Ignored;
                }
                let error = MediaLoadError::new(kind, message);
                self.state = S::Error;
                self.is_loading = false;
                self.is_playing = false;
                self.play_requested = false;
                self.interrupted_from = None;
                self.error = Some(error.clone());
                Step::Applied(Transition {
                    events: vec![PlaybackEventKind::Error { error }],
                    ..Transition::default()
                })
            }
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    pub fn play(&mut self) -> Step {
        use PlaybackState as S;

        match self.state {
            S::Error | S::Playing => Step::Ignored,
            S::Idle | S::Loading => {
                if self.play_requested {
                    Step::Ignored
                } else {
                    self.play_requested = true;
                    Step::Deferred
                }
            }
            S::Ready | S::Paused => self.start_playing(Transition::default()),
            S::Ended => {
                self.current_time = 0.0;
                self.start_playing(Transition::command(MediaCommand::SetCurrentTime {
                    seconds: 0.0,
                }))
            }
            S::Buffering | S::Seeking => {
                if self.is_playing {
                    return Step::Ignored;
                }
                self.is_playing = true;
                Step::Applied(Transition {
                    commands: vec![MediaCommand::Play],
                    events: vec![PlaybackEventKind::Play],
                    ..Transition::default()
                })
            }
        }
    }

    pub fn pause(&mut self) -> Step {
        use PlaybackState as S;

        match self.state {
            S::Playing | S::Buffering | S::Seeking if self.is_playing => {
                if self.state == S::Playing {
                    self.state = S::Paused;
                }
                self.is_playing = false;
                Step::Applied(Transition {
                    commands: vec![MediaCommand::Pause],
                    events: vec![PlaybackEventKind::Pause],
                    ..Transition::default()
                })
            }
            S::Idle | S::Loading if self.play_requested => {
                self.play_requested = false;
                Step::Deferred
            }
            _ => Step::Ignored,
        }
    }

    pub fn seek(&mut self, target: Seconds) -> Step {
        use PlaybackState as S;

        if !target.is_finite() {
            return Step::Ignored;
        }

        match self.state {
            S::Error => Step::Ignored,
            S::Idle | S::Loading => {
                self.pending_seek = Some(target.max(0.0));
                Step::Deferred
            }
            _ => {
                let target = self.clamp_position(target);
                self.current_time = target;
                if self.state == S::Ended && (self.duration <= 0.0 || target < self.duration) {
                    self.state = S::Paused;
                }
                Step::Applied(Transition::command(MediaCommand::SetCurrentTime {
                    seconds: target,
                }))
            }
        }
    }

    pub fn set_volume(&mut self, volume: f64) -> Step {
        if self.state == PlaybackState::Error {
            return Step::Ignored;
        }
        let Some(volume) = clamp_volume(volume) else {
            return Step::Ignored;
        };

        self.volume = volume;
        if volume == 0.0 {
            if self.mute == MuteSource::Unmuted {
                self.mute = MuteSource::Volume;
            }
        } else {
            self.last_audible_volume = volume;
            if self.mute == MuteSource::Volume {
                self.mute = MuteSource::Unmuted;
            }
        }

        Step::Applied(Transition {
            commands: vec![
                MediaCommand::SetVolume { volume },
                MediaCommand::SetMuted {
                    muted: self.is_muted(),
                },
            ],
            ..Transition::default()
        })
    }

    pub fn toggle_mute(&mut self) -> Step {
        if self.state == PlaybackState::Error {
            return Step::Ignored;
        }

        let mut transition = Transition::default();
        if self.is_muted() {
            self.mute = MuteSource::Unmuted;
            if self.volume == 0.0 {
                self.volume = self.last_audible_volume;
                transition.commands.push(MediaCommand::SetVolume {
                    volume: self.volume,
                });
            }
        } else {
            self.mute = MuteSource::Explicit;
        }
        transition.commands.push(MediaCommand::SetMuted {
            muted: self.is_muted(),
        });
        Step::Applied(transition)
    }

    /// Rate changes apply in every state except `Error`; invalid rates are
    /// an error for the caller rather than a silent no-op.
    pub fn set_playback_rate(&mut self, rate: f64) -> Result<Step, learnpath_core::CoreError> {
        if self.state == PlaybackState::Error {
            return Ok(Step::Ignored);
        }
        validate_playback_rate(rate)?;
        self.playback_rate = rate;
        Ok(Step::Applied(Transition::command(
            MediaCommand::SetPlaybackRate { rate },
        )))
    }

    pub fn retry(&mut self) -> Step {
        if self.state != PlaybackState::Error {
            return Step::Ignored;
        }

        self.error = None;
        self.state = PlaybackState::Loading;
        self.is_loading = true;
        self.is_playing = false;
        self.play_requested = self.config.autoplay;
        if self.current_time > 0.0 {
            self.pending_seek = Some(self.current_time);
        }
        Step::Applied(Transition::command(self.load_command()))
    }
}
