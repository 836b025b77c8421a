//! Configuration for the session controller
//!
//! [`SessionConfig`] collects everything the controller needs that is not
//! supplied by the caller at join time: the App ID, the credential token,
//! the transport mode handed to `createClient`, the microphone encoder preset
//! and the local user id strategy. It can be built in code with the `with_*`
//! methods or loaded from TOML.
//!
//! # Examples
//!
//! ```rust
//! use roomcall_core::config::{SessionConfig, ChannelMode, UidStrategy};
//!
//! let config = SessionConfig::new()
//!     .with_app_id("0123456789abcdef")
//!     .with_uid_strategy(UidStrategy::RandomInRange { min: 1, max: 10_000 });
//! assert_eq!(config.client.mode, ChannelMode::Rtc);
//! assert!(config.validate().is_ok());
//! ```
//!
//! ```rust
//! use roomcall_core::config::SessionConfig;
//!
//! let config = SessionConfig::from_toml_str(r#"
//!     app_id = "abc"
//!     start_muted = true
//!
//!     [client]
//!     mode = "live"
//!     role = "host"
//! "#).unwrap();
//! assert!(config.start_muted);
//! ```

use std::path::Path;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};

/// Default bound on App ID bootstrap
pub const DEFAULT_BOOTSTRAP_TIMEOUT_MS: u64 = 5_000;

/// Default interval between bootstrap polls
pub const DEFAULT_BOOTSTRAP_POLL_MS: u64 = 100;

/// Default lifetime of a status banner
pub const DEFAULT_STATUS_TTL_MS: u64 = 5_000;

/// Channel profile passed to the SDK when creating a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    /// Peer-to-peer communication; every participant publishes
    Rtc,
    /// Broadcast; participants are hosts or audience
    Live,
}

/// Participant role in [`ChannelMode::Live`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientRole {
    Host,
    Audience,
}

/// Video codec the SDK client negotiates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    Vp8,
    H264,
}

/// Client configuration handed to `create_client`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub mode: ChannelMode,
    pub role: ClientRole,
    pub codec: VideoCodec,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            mode: ChannelMode::Rtc,
            role: ClientRole::Host,
            codec: VideoCodec::Vp8,
        }
    }
}

/// Microphone encoder presets understood by the SDK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioPreset {
    SpeechLowQuality,
    SpeechStandard,
    MusicStandard,
    HighQuality,
}

/// Encoder configuration for `create_microphone_track`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub preset: AudioPreset,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            preset: AudioPreset::SpeechStandard,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// How the local user id passed to `join` is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UidStrategy {
    /// Let the SDK assign one
    None,
    /// Pick uniformly from `min..=max` on every join attempt
    RandomInRange { min: u32, max: u32 },
    /// Always use this id
    CallerSupplied { uid: u32 },
}

impl Default for UidStrategy {
    fn default() -> Self {
        UidStrategy::None
    }
}

impl UidStrategy {
    /// Choose the id for one join attempt
    pub fn pick(&self) -> Option<u32> {
        self.pick_with(&mut rand::thread_rng())
    }

    pub fn pick_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<u32> {
        match *self {
            UidStrategy::None => None,
            UidStrategy::RandomInRange { min, max } => Some(rng.gen_range(min..=max)),
            UidStrategy::CallerSupplied { uid } => Some(uid),
        }
    }
}

/// Session controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Application/tenant identifier; may be resolved later by bootstrap
    pub app_id: Option<String>,
    /// Opaque credential token passed through to `join`
    pub token: Option<String>,
    pub client: ClientConfig,
    pub encoder: EncoderConfig,
    pub uid_strategy: UidStrategy,
    /// Mute the microphone as soon as it is published
    pub start_muted: bool,
    pub bootstrap_timeout_ms: u64,
    pub bootstrap_poll_interval_ms: u64,
    pub status_ttl_ms: u64,
    /// Origin the front end is served from, used for the secure-context check
    pub page_origin: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            token: None,
            client: ClientConfig::default(),
            encoder: EncoderConfig::default(),
            uid_strategy: UidStrategy::default(),
            start_muted: false,
            bootstrap_timeout_ms: DEFAULT_BOOTSTRAP_TIMEOUT_MS,
            bootstrap_poll_interval_ms: DEFAULT_BOOTSTRAP_POLL_MS,
            status_ttl_ms: DEFAULT_STATUS_TTL_MS,
            page_origin: None,
        }
    }
}

impl SessionConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document
    pub fn from_toml_str(input: &str) -> SessionResult<Self> {
        let config: SessionConfig = toml::from_str(input)
            .map_err(|e| SessionError::config(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> SessionResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SessionError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    pub fn with_encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_uid_strategy(mut self, strategy: UidStrategy) -> Self {
        self.uid_strategy = strategy;
        self
    }

    pub fn with_start_muted(mut self, muted: bool) -> Self {
        self.start_muted = muted;
        self
    }

    pub fn with_bootstrap_timeout(mut self, timeout: Duration) -> Self {
        self.bootstrap_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_page_origin(mut self, origin: impl Into<String>) -> Self {
        self.page_origin = Some(origin.into());
        self
    }

    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_millis(self.bootstrap_timeout_ms)
    }

    pub fn bootstrap_poll_interval(&self) -> Duration {
        Duration::from_millis(self.bootstrap_poll_interval_ms)
    }

    pub fn status_ttl(&self) -> Duration {
        Duration::from_millis(self.status_ttl_ms)
    }

    /// App ID if present and non-blank
    pub fn app_id(&self) -> Option<&str> {
        self.app_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Validate the configuration
    pub fn validate(&self) -> SessionResult<()> {
        if let UidStrategy::RandomInRange { min, max } = self.uid_strategy {
            if min > max {
                return Err(SessionError::config(format!(
                    "uid range is empty: {}..={}",
                    min, max
                )));
            }
        }

        if self.bootstrap_timeout_ms == 0 {
            return Err(SessionError::config("bootstrap timeout must be non-zero"));
        }

        if self.bootstrap_poll_interval_ms == 0 {
            return Err(SessionError::config("bootstrap poll interval must be non-zero"));
        }

        if let Some(origin) = &self.page_origin {
            url::Url::parse(origin)
                .map_err(|e| SessionError::config(format!("invalid page origin {}: {}", origin, e)))?;
        }

        Ok(())
    }
}
