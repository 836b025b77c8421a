//! Interfaces to the external RTC SDK
//!
//! The controller never talks to a concrete SDK. It drives these traits,
//! which mirror the SDK surface it depends on:
//!
//! - [`RtcEngine`] is the SDK entry point (`createClient`,
//!   `createMicrophoneAudioTrack`)
//! - [`RtcClient`] is one client instance (`join`, `publish`, `subscribe`,
//!   `leave`, event registration)
//! - [`LocalAudioTrack`] is a captured microphone track
//!
//! [`loopback`] provides an in-process implementation with fault injection.

pub mod loopback;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{ClientConfig, EncoderConfig};
use crate::events::{EventSink, MediaKind, RemoteUser};

/// Result type for SDK calls
pub type SdkResult<T> = Result<T, SdkError>;

/// An error raised by the SDK or by the platform's media APIs
///
/// `name` carries the platform error name when there is one (for example
/// `NotAllowedError`), `message` the human readable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkError {
    pub name: String,
    pub message: String,
}

impl SdkError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// An error with no platform name
    pub fn message(message: impl Into<String>) -> Self {
        Self::new("", message)
    }
}

impl std::fmt::Display for SdkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

impl std::error::Error for SdkError {}

/// SDK entry point
#[async_trait]
pub trait RtcEngine: Send + Sync {
    /// Create a client instance
    fn create_client(&self, config: &ClientConfig) -> SdkResult<Arc<dyn RtcClient>>;

    /// Capture the microphone
    async fn create_microphone_track(
        &self,
        encoder: &EncoderConfig,
    ) -> SdkResult<Arc<dyn LocalAudioTrack>>;
}

/// One SDK client
#[async_trait]
pub trait RtcClient: Send + Sync {
    /// Register the sink every client event is delivered to
    fn on_event(&self, sink: EventSink);

    /// Join a channel, returning the uid the SDK settled on
    async fn join(
        &self,
        app_id: &str,
        channel: &str,
        token: Option<&str>,
        uid: Option<u32>,
    ) -> SdkResult<u32>;

    /// Publish a local track to the channel
    async fn publish(&self, track: Arc<dyn LocalAudioTrack>) -> SdkResult<()>;

    /// Subscribe to a remote user's published media
    async fn subscribe(&self, user: &RemoteUser, media: MediaKind) -> SdkResult<()>;

    /// Leave the channel
    async fn leave(&self) -> SdkResult<()>;
}

/// A captured microphone track
#[async_trait]
pub trait LocalAudioTrack: Send + Sync {
    /// Enable or disable sending audio
    async fn set_enabled(&self, enabled: bool) -> SdkResult<()>;

    /// Stop capturing
    fn stop(&self);

    /// Release the capture device
    fn close(&self);
}
