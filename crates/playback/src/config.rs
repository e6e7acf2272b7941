//! Playback session configuration.

use serde::{Deserialize, Serialize};

use learnpath_core::types::Seconds;
use learnpath_core::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Rates offered by the speed menu. Any positive rate is accepted by the
/// controller; this list is only what the UI presents.
pub const PLAYBACK_RATES: &[f64] = &[0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

/// Default volume for a fresh session.
pub const DEFAULT_VOLUME: f64 = 1.0;

/// Default playback rate for a fresh session.
pub const DEFAULT_PLAYBACK_RATE: f64 = 1.0;

// ---------------------------------------------------------------------------
// Preload
// ---------------------------------------------------------------------------

/// How much of the source the media resource should fetch up front.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preload {
    None,
    #[default]
    Metadata,
    Auto,
}

impl Preload {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Metadata => "metadata",
            Self::Auto => "auto",
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackConfig
// ---------------------------------------------------------------------------

/// Options recognised when a lesson's media is opened.
///
/// Only `source` is required; everything else falls back to the defaults
/// below when omitted from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Media URL or path.
    pub source: String,
    /// Poster image shown before the first frame.
    #[serde(default)]
    pub poster: Option<String>,
    /// Start playing as soon as the resource is ready (default: `false`).
    #[serde(default)]
    pub autoplay: bool,
    /// Start explicitly muted (default: `false`).
    #[serde(default)]
    pub muted: bool,
    /// Restart from the beginning after the end is reached (default: `false`).
    #[serde(default, rename = "loop")]
    pub looping: bool,
    #[serde(default)]
    pub preload: Preload,
    /// Initial volume, clamped to `[0, 1]` (default: `1.0`).
    #[serde(default = "default_volume")]
    pub volume: f64,
    /// Initial rate, must be positive (default: `1.0`).
    #[serde(default = "default_playback_rate")]
    pub playback_rate: f64,
    /// Position to seek to once the resource is ready (default: `0`).
    #[serde(default)]
    pub start_time: Seconds,
}

fn default_volume() -> f64 {
    DEFAULT_VOLUME
}

fn default_playback_rate() -> f64 {
    DEFAULT_PLAYBACK_RATE
}

impl PlaybackConfig {
    /// Config for `source` with every option at its default.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            poster: None,
            autoplay: false,
            muted: false,
            looping: false,
            preload: Preload::default(),
            volume: DEFAULT_VOLUME,
            playback_rate: DEFAULT_PLAYBACK_RATE,
            start_time: 0.0,
        }
    }

    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    pub fn with_muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_playback_rate(mut self, rate: f64) -> Self {
        self.playback_rate = rate;
        self
    }

    pub fn with_start_time(mut self, start_time: Seconds) -> Self {
        self.start_time = start_time;
        self
    }

    /// Reject configurations the controller cannot start from.
    ///
    /// Volume is not checked here; out-of-range values are clamped the
    /// same way `set_volume` clamps them.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.source.trim().is_empty() {
            return Err(CoreError::Validation(
                "Playback source must not be empty".to_string(),
            ));
        }
        validate_playback_rate(self.playback_rate)?;
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err(CoreError::Validation(format!(
                "Start time must be a non-negative number of seconds, got {}",
                self.start_time
            )));
        }
        if self.volume.is_nan() {
            return Err(CoreError::Validation("Volume must be a number".to_string()));
        }
        Ok(())
    }
}

/// Validate a playback rate: finite and strictly positive.
pub fn validate_playback_rate(rate: f64) -> Result<(), CoreError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Playback rate must be a positive number, got {rate}"
        )))
    }
}

/// Clamp a volume into `[0, 1]`. `NaN` has no nearest boundary and is
/// returned as `None`.
pub fn clamp_volume(volume: f64) -> Option<f64> {
    if volume.is_nan() {
        None
    } else {
        Some(volume.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_options_take_defaults() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{"source": "https://cdn.example/intro.mp4"}"#).unwrap();
        assert_eq!(config, PlaybackConfig::new("https://cdn.example/intro.mp4"));
        assert_eq!(config.preload, Preload::Metadata);
        assert!(!config.autoplay);
        assert!(!config.looping);
    }

    #[test]
    fn loop_is_read_from_the_loop_key() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{"source": "a.mp4", "loop": true, "preload": "auto"}"#)
                .unwrap();
        assert!(config.looping);
        assert_eq!(config.preload, Preload::Auto);
    }

    #[test]
    fn empty_source_rejected() {
        let result = PlaybackConfig::new("  ").validate();
        assert!(result.unwrap_err().to_string().contains("source"));
    }

    #[test]
    fn non_positive_rate_rejected() {
        assert!(PlaybackConfig::new("a.mp4").with_playback_rate(0.0).validate().is_err());
        assert!(PlaybackConfig::new("a.mp4").with_playback_rate(-1.0).validate().is_err());
        assert!(PlaybackConfig::new("a.mp4")
            .with_playback_rate(f64::INFINITY)
            .validate()
            .is_err());
        assert!(PlaybackConfig::new("a.mp4").with_playback_rate(3.0).validate().is_ok());
    }

    #[test]
    fn negative_start_time_rejected() {
        assert!(PlaybackConfig::new("a.mp4").with_start_time(-1.0).validate().is_err());
    }

    #[test]
    fn out_of_range_volume_is_allowed_and_clamped_later() {
        assert!(PlaybackConfig::new("a.mp4").with_volume(3.0).validate().is_ok());
        assert_eq!(clamp_volume(3.0), Some(1.0));
        assert_eq!(clamp_volume(-0.5), Some(0.0));
        assert_eq!(clamp_volume(f64::NAN), None);
    }

    #[test]
    fn menu_rates_are_all_valid() {
        for rate in PLAYBACK_RATES {
            assert!(validate_playback_rate(*rate).is_ok());
        }
    }

    #[test]
    fn preload_names_match_serialized_form() {
        for preload in [Preload::None, Preload::Metadata, Preload::Auto] {
            let json = serde_json::to_value(preload).unwrap();
            assert_eq!(json, preload.as_str());
        }
    }
}
