//! Platform capability checks consulted before capture
//!
//! Browsers only expose microphone capture on secure origins, and some
//! runtimes lack the media APIs entirely. [`CapabilityProbe`] answers those
//! questions for the controller; [`StaticProbe`] answers them from fixed
//! values and a page origin.

use async_trait::async_trait;
use url::Url;

use crate::sdk::{SdkError, SdkResult};

/// Platform capability probe
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    /// Whether the page runs in a secure context
    fn is_secure_context(&self) -> bool;

    /// Whether the runtime exposes the media capture APIs
    fn supports_media_capture(&self) -> bool;

    /// Ask for (or confirm) microphone permission
    ///
    /// Errors use the platform names (`NotAllowedError`, `NotFoundError`)
    /// so they classify the same way SDK capture errors do.
    async fn request_microphone(&self) -> SdkResult<()>;
}

/// Whether an origin counts as secure
///
/// HTTPS origins are secure, and so are loopback hosts regardless of scheme.
pub fn is_secure_origin(origin: &str) -> bool {
    let Ok(url) = Url::parse(origin) else {
        return false;
    };
    if url.scheme() == "https" {
        return true;
    }
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<std::net::IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false),
        None => false,
    }
}

/// Probe answering from fixed values
#[derive(Debug, Clone)]
pub struct StaticProbe {
    secure: bool,
    media_capture: bool,
    microphone: Result<(), SdkError>,
}

impl Default for StaticProbe {
    fn default() -> Self {
        Self::permissive()
    }
}

impl StaticProbe {
    /// Secure, capable, permission granted
    pub fn permissive() -> Self {
        Self {
            secure: true,
            media_capture: true,
            microphone: Ok(()),
        }
    }

    /// Derive the secure-context flag from a page origin
    pub fn for_origin(origin: &str) -> Self {
        Self {
            secure: is_secure_origin(origin),
            ..Self::permissive()
        }
    }

    pub fn with_secure_context(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_media_capture(mut self, supported: bool) -> Self {
        self.media_capture = supported;
        self
    }

    /// Make microphone requests fail with `err`
    pub fn with_microphone_error(mut self, err: SdkError) -> Self {
        self.microphone = Err(err);
        self
    }
}

#[async_trait]
impl CapabilityProbe for StaticProbe {
    fn is_secure_context(&self) -> bool {
        self.secure
    }

    fn supports_media_capture(&self) -> bool {
        self.media_capture
    }

    async fn request_microphone(&self) -> SdkResult<()> {
        self.microphone.clone()
    }
}
