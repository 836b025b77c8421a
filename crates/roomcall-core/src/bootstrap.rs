//! App ID bootstrap
//!
//! The App ID may not be known when the front end starts: a deployment can
//! inject it late (a config script that loads after the page, an environment
//! that is filled in by a sidecar). Resolution is a bounded wait that fails
//! with a single [`SessionError::Configuration`] once the bound passes,
//! whether the value is polled through an [`AppIdSource`] or observed on a
//! `watch` channel.
//!
//! ```rust
//! use std::time::Duration;
//! use roomcall_core::bootstrap::{resolve_app_id, StaticAppId};
//!
//! # tokio_test::block_on(async {
//! let id = resolve_app_id(
//!     &StaticAppId::new("abc"),
//!     Duration::from_secs(5),
//!     Duration::from_millis(100),
//! ).await.unwrap();
//! assert_eq!(id, "abc");
//! # });
//! ```

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{SessionError, SessionResult};

/// Environment variable consulted by [`EnvAppId::default`]
pub const APP_ID_ENV: &str = "ROOMCALL_APP_ID";

/// Something that may currently know the App ID
pub trait AppIdSource: Send + Sync {
    /// The App ID if it is available now
    fn current(&self) -> Option<String>;
}

/// An App ID fixed at construction
#[derive(Debug, Clone, Default)]
pub struct StaticAppId(Option<String>);

impl StaticAppId {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self(Some(app_id.into()))
    }

    pub fn missing() -> Self {
        Self(None)
    }
}

impl AppIdSource for StaticAppId {
    fn current(&self) -> Option<String> {
        self.0.clone()
    }
}

/// An App ID read from an environment variable on every poll
#[derive(Debug, Clone)]
pub struct EnvAppId {
    var: String,
}

impl EnvAppId {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvAppId {
    fn default() -> Self {
        Self::new(APP_ID_ENV)
    }
}

impl AppIdSource for EnvAppId {
    fn current(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }
}

/// An App ID read from a file on every poll
///
/// A missing or unreadable file counts as not available yet, so a deployment
/// can drop the file in after the front end started.
#[derive(Debug, Clone)]
pub struct FileAppId {
    path: PathBuf,
}

impl FileAppId {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AppIdSource for FileAppId {
    fn current(&self) -> Option<String> {
        std::fs::read_to_string(&self.path).ok()
    }
}

impl AppIdSource for watch::Receiver<Option<String>> {
    fn current(&self) -> Option<String> {
        self.borrow().clone()
    }
}

fn usable(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn timed_out(timeout: Duration) -> SessionError {
    SessionError::config(format!(
        "App ID not available after {} ms",
        timeout.as_millis()
    ))
}

/// Poll `source` until it yields a non-blank App ID or `timeout` passes
pub async fn resolve_app_id(
    source: &dyn AppIdSource,
    timeout: Duration,
    poll_interval: Duration,
) -> SessionResult<String> {
    let poll = async {
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            ticker.tick().await;
            if let Some(id) = usable(source.current()) {
                return id;
            }
            debug!("App ID not available yet, polling again");
        }
    };

    match tokio::time::timeout(timeout, poll).await {
        Ok(id) => Ok(id),
        Err(_) => {
            warn!("App ID bootstrap timed out after {:?}", timeout);
            Err(timed_out(timeout))
        }
    }
}

/// Wait for a late-injected App ID on a watch channel
///
/// Returns immediately if the channel already holds a value. A sender that
/// goes away without ever publishing fails the same way a timeout does.
pub async fn resolve_from_watch(
    mut rx: watch::Receiver<Option<String>>,
    timeout: Duration,
) -> SessionResult<String> {
    let wait = async {
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(id) = usable(current) {
                return Ok(id);
            }
            if rx.changed().await.is_err() {
                return Err(SessionError::config("App ID source closed before providing a value"));
            }
        }
    };

    match tokio::time::timeout(timeout, wait).await {
        Ok(result) => result,
        Err(_) => {
            warn!("App ID bootstrap timed out after {:?}", timeout);
            Err(timed_out(timeout))
        }
    }
}
