//! Media load failure taxonomy.
//!
//! A [`MediaLoadError`] is never returned from a controller call. It is
//! captured into the session and surfaced through snapshots and the
//! `Error` event; recovery is the caller's `retry`.

use serde::{Deserialize, Serialize};

/// Load was aborted by the user agent.
pub const MEDIA_ERR_ABORTED: &str = "aborted";
/// A network failure interrupted the fetch.
pub const MEDIA_ERR_NETWORK: &str = "network";
/// The resource was fetched but could not be decoded.
pub const MEDIA_ERR_DECODE: &str = "decode";
/// The source format or URL is not supported.
pub const MEDIA_ERR_UNSUPPORTED_SOURCE: &str = "unsupported_source";
/// Anything the resource could not classify.
pub const MEDIA_ERR_UNKNOWN: &str = "unknown";

/// Category of a media load failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaErrorKind {
    Aborted,
    Network,
    Decode,
    UnsupportedSource,
    Unknown,
}

impl MediaErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aborted => MEDIA_ERR_ABORTED,
            Self::Network => MEDIA_ERR_NETWORK,
            Self::Decode => MEDIA_ERR_DECODE,
            Self::UnsupportedSource => MEDIA_ERR_UNSUPPORTED_SOURCE,
            Self::Unknown => MEDIA_ERR_UNKNOWN,
        }
    }

    /// Message shown when the resource did not supply one.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::Aborted => "Video loading was aborted",
            Self::Network => "A network error prevented the video from loading",
            Self::Decode => "The video could not be decoded",
            Self::UnsupportedSource => "The video format is not supported",
            Self::Unknown => "An unknown error occurred while loading the video",
        }
    }
}

/// A failed media load, as recorded in the playback session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} ({})", .kind.as_str())]
pub struct MediaLoadError {
    pub kind: MediaErrorKind,
    pub message: String,
}

impl MediaLoadError {
    /// Build an error, falling back to the kind's default message when
    /// `message` is missing or blank.
    pub fn new(kind: MediaErrorKind, message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| kind.default_message().to_string());
        Self { kind, message }
    }
}

/// A platform capability (fullscreen, picture-in-picture) the media
/// resource could not provide.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    #[error("{capability} request was denied: {reason}")]
    Denied {
        capability: &'static str,
        reason: String,
    },
}
