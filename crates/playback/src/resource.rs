//! The media resource seam.
//!
//! The controller never touches a real player. It issues
//! [`MediaCommand`]s through the [`MediaResource`] trait and learns what
//! happened from the [`MediaSignal`](crate::signal::MediaSignal)s the
//! resource reports back.

use serde::{Deserialize, Serialize};

use learnpath_core::types::Seconds;

use crate::config::Preload;
use crate::error::CapabilityError;

/// Fullscreen capability name, used in [`CapabilityError`].
pub const CAPABILITY_FULLSCREEN: &str = "fullscreen";
/// Picture-in-picture capability name, used in [`CapabilityError`].
pub const CAPABILITY_PICTURE_IN_PICTURE: &str = "picture-in-picture";

/// An instruction the controller sends to the media resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "command")]
pub enum MediaCommand {
    Load { source: String, preload: Preload },
    Unload,
    Play,
    Pause,
    SetCurrentTime { seconds: Seconds },
    SetVolume { volume: f64 },
    SetMuted { muted: bool },
    SetPlaybackRate { rate: f64 },
}

/// A single underlying media element.
///
/// Implementations apply commands and report lifecycle changes
/// asynchronously as signals; none of these calls block.
pub trait MediaResource {
    fn load(&mut self, source: &str, preload: Preload);

    /// Release the current source.
    fn unload(&mut self);

    fn play(&mut self);

    fn pause(&mut self);

    fn set_current_time(&mut self, seconds: Seconds);

    fn set_volume(&mut self, volume: f64);

    fn set_muted(&mut self, muted: bool);

    fn set_playback_rate(&mut self, rate: f64);

    fn request_fullscreen(&mut self) -> Result<(), CapabilityError> {
        Err(CapabilityError::Unsupported(CAPABILITY_FULLSCREEN))
    }

    fn request_picture_in_picture(&mut self) -> Result<(), CapabilityError> {
        Err(CapabilityError::Unsupported(CAPABILITY_PICTURE_IN_PICTURE))
    }
}

/// Dispatch a [`MediaCommand`] to the matching trait method.
pub fn apply_command<R: MediaResource + ?Sized>(resource: &mut R, command: &MediaCommand) {
    match command {
        MediaCommand::Load { source, preload } => resource.load(source, *preload),
        MediaCommand::Unload => resource.unload(),
        MediaCommand::Play => resource.play(),
        MediaCommand::Pause => resource.pause(),
        MediaCommand::SetCurrentTime { seconds } => resource.set_current_time(*seconds),
        MediaCommand::SetVolume { volume } => resource.set_volume(*volume),
        MediaCommand::SetMuted { muted } => resource.set_muted(*muted),
        MediaCommand::SetPlaybackRate { rate } => resource.set_playback_rate(*rate),
    }
}

// ---------------------------------------------------------------------------
// SimulatedMedia
// ---------------------------------------------------------------------------

/// In-memory resource that records every command it receives.
///
/// Used by the scenario player and by tests; signals are fed to the
/// controller by hand.
#[derive(Debug, Default, Clone)]
pub struct SimulatedMedia {
    commands: Vec<MediaCommand>,
    supports_fullscreen: bool,
    supports_picture_in_picture: bool,
    fullscreen: bool,
    picture_in_picture: bool,
}

impl SimulatedMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report fullscreen and picture-in-picture as available.
    pub fn with_capabilities(mut self, fullscreen: bool, picture_in_picture: bool) -> Self {
        self.supports_fullscreen = fullscreen;
        self.supports_picture_in_picture = picture_in_picture;
        self
    }

    /// Commands received so far, oldest first.
    pub fn commands(&self) -> &[MediaCommand] {
        &self.commands
    }

    pub fn last_command(&self) -> Option<&MediaCommand> {
        self.commands.last()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_picture_in_picture(&self) -> bool {
        self.picture_in_picture
    }
}

impl MediaResource for SimulatedMedia {
    fn load(&mut self, source: &str, preload: Preload) {
        self.commands.push(MediaCommand::Load {
            source: source.to_string(),
            preload,
        });
    }

    fn unload(&mut self) {
        self.fullscreen = false;
        self.picture_in_picture = false;
        self.commands.push(MediaCommand::Unload);
    }

    fn play(&mut self) {
        self.commands.push(MediaCommand::Play);
    }

    fn pause(&mut self) {
        self.commands.push(MediaCommand::Pause);
    }

    fn set_current_time(&mut self, seconds: Seconds) {
        self.commands.push(MediaCommand::SetCurrentTime { seconds });
    }

    fn set_volume(&mut self, volume: f64) {
        self.commands.push(MediaCommand::SetVolume { volume });
    }

    fn set_muted(&mut self, muted: bool) {
        self.commands.push(MediaCommand::SetMuted { muted });
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.commands.push(MediaCommand::SetPlaybackRate { rate });
    }

    fn request_fullscreen(&mut self) -> Result<(), CapabilityError> {
        if !self.supports_fullscreen {
            return Err(CapabilityError::Unsupported(CAPABILITY_FULLSCREEN));
        }
        self.fullscreen = true;
        Ok(())
    }

    fn request_picture_in_picture(&mut self) -> Result<(), CapabilityError> {
        if !self.supports_picture_in_picture {
            return Err(CapabilityError::Unsupported(CAPABILITY_PICTURE_IN_PICTURE));
        }
        self.picture_in_picture = true;
        Ok(())
    }
}
