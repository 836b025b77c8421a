//! The session lifecycle controller
//!
//! [`SessionController`] is the single owner of a [`CallSession`]. It is the
//! only code that creates an SDK client, captures the microphone, or changes
//! the connection/track/mute state. Operations are split by concern:
//!
//! - [`calls`]: `join`, `leave`, `cleanup`
//! - [`controls`]: `toggle_mute`
//! - [`events`]: reflecting SDK events into the session
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  join/leave/mute   ┌─────────────────────┐
//! │  Front end   │ ─────────────────► │  SessionController  │
//! │ (UiSurface)  │ ◄───────────────── │   Mutex<CallSession> │
//! └──────────────┘  banners, views    └──────┬───────▲──────┘
//!                                            │       │ EventEnvelope
//!                                  RtcEngine │       │ (mpsc, one consumer)
//!                                  RtcClient ▼       │
//!                                     ┌──────────────┴──┐
//!                                     │     RTC SDK     │
//!                                     └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use roomcall_core::{SessionConfig, SessionController, ConnectionState};
//! use roomcall_core::sdk::loopback::LoopbackEngine;
//!
//! # tokio_test::block_on(async {
//! let engine = Arc::new(LoopbackEngine::new());
//! let controller = SessionController::builder(engine)
//!     .config(SessionConfig::new().with_app_id("demo-app"))
//!     .build()
//!     .unwrap();
//!
//! controller.join("alice", "room1").await.unwrap();
//! assert_eq!(controller.state(), ConnectionState::Connected);
//!
//! assert!(controller.toggle_mute().await);
//! controller.leave().await.unwrap();
//! assert_eq!(controller.state(), ConnectionState::Idle);
//! # });
//! ```

pub mod builder;
pub mod calls;
pub mod controls;
pub mod events;


use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::debug;

pub use builder::SessionControllerBuilder;

use crate::bootstrap::{self, AppIdSource};
use crate::capability::CapabilityProbe;
use crate::config::SessionConfig;
use crate::error::SessionResult;
use crate::events::{EventEnvelope, SessionNotice};
use crate::sdk::RtcEngine;
use crate::session::{CallSession, ConnectionState, SessionSnapshot};
use crate::ui::UiSurface;

/// Capacity of the notice broadcast channel
const NOTICE_CAPACITY: usize = 64;

/// Collaborator told when the credential token is about to expire
///
/// Renewal itself is up to the implementor; the controller only forwards
/// the SDK's warning along with the current room.
#[async_trait]
pub trait TokenExpiryHook: Send + Sync {
    async fn token_will_expire(&self, room: Option<&str>);
}

pub(crate) struct ControllerInner {
    pub(crate) config: SessionConfig,
    pub(crate) engine: Arc<dyn RtcEngine>,
    pub(crate) probe: Arc<dyn CapabilityProbe>,
    pub(crate) ui: Arc<dyn UiSurface>,
    pub(crate) session: Mutex<CallSession>,
    pub(crate) app_id: RwLock<Option<String>>,
    pub(crate) start_muted: AtomicBool,
    pub(crate) token_hook: RwLock<Option<Arc<dyn TokenExpiryHook>>>,
    pub(crate) events_tx: mpsc::UnboundedSender<EventEnvelope>,
    pub(crate) events_rx: Mutex<Option<mpsc::UnboundedReceiver<EventEnvelope>>>,
    pub(crate) notices: broadcast::Sender<SessionNotice>,
}

/// Session lifecycle controller
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionController {
    pub(crate) inner: Arc<ControllerInner>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("session", &*self.inner.session.lock())
            .finish()
    }
}

impl SessionController {
    /// Start building a controller around an SDK engine
    pub fn builder(engine: Arc<dyn RtcEngine>) -> SessionControllerBuilder {
        SessionControllerBuilder::new(engine)
    }

    pub(crate) fn from_parts(
        config: SessionConfig,
        engine: Arc<dyn RtcEngine>,
        probe: Arc<dyn CapabilityProbe>,
        ui: Arc<dyn UiSurface>,
        token_hook: Option<Arc<dyn TokenExpiryHook>>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let app_id = config.app_id().map(str::to_string);
        let start_muted = config.start_muted;

        Self {
            inner: Arc::new(ControllerInner {
                config,
                engine,
                probe,
                ui,
                session: Mutex::new(CallSession::new()),
                app_id: RwLock::new(app_id),
                start_muted: AtomicBool::new(start_muted),
                token_hook: RwLock::new(token_hook),
                events_tx,
                events_rx: Mutex::new(Some(events_rx)),
                notices,
            }),
        }
    }

    /// Run `f` on the session under the lock
    ///
    /// A state change made by `f` is broadcast once the lock is released.
    pub(crate) fn with_session<R>(&self, f: impl FnOnce(&mut CallSession) -> R) -> R {
        let (result, previous, current) = {
            let mut session = self.inner.session.lock();
            let previous = session.state;
            let result = f(&mut session);
            (result, previous, session.state)
        };

        if previous != current {
            debug!("session state {} -> {}", previous, current);
            self.notify(SessionNotice::StateChanged { previous, current });
        }
        result
    }

    /// Apply `f` only if no teardown happened since `epoch`
    pub(crate) fn commit(&self, epoch: u64, f: impl FnOnce(&mut CallSession)) -> bool {
        self.with_session(|session| {
            if session.is_current(epoch) {
                f(session);
                true
            } else {
                false
            }
        })
    }

    pub(crate) fn notify(&self, notice: SessionNotice) {
        // no receivers is fine
        let _ = self.inner.notices.send(notice);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.session.lock().state
    }

    pub fn is_muted(&self) -> bool {
        self.inner.session.lock().muted
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.session.lock().snapshot()
    }

    /// Subscribe to state, mute and participant notices
    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotice> {
        self.inner.notices.subscribe()
    }

    /// Currently known App ID
    pub fn app_id(&self) -> Option<String> {
        self.inner.app_id.read().clone()
    }

    /// Provide the App ID after construction
    pub fn set_app_id(&self, app_id: impl Into<String>) {
        *self.inner.app_id.write() = Some(app_id.into());
    }

    /// Resolve the App ID from `source` within the configured bound
    pub async fn bootstrap_app_id(&self, source: &dyn AppIdSource) -> SessionResult<String> {
        let config = &self.inner.config;
        let app_id = bootstrap::resolve_app_id(
            source,
            config.bootstrap_timeout(),
            config.bootstrap_poll_interval(),
        )
        .await?;
        self.set_app_id(app_id.clone());
        self.inner.ui.debug("App ID is set");
        Ok(app_id)
    }

    /// Whether the next session starts with the microphone muted
    pub fn start_muted(&self) -> bool {
        self.inner.start_muted.load(Ordering::SeqCst)
    }

    /// Pre-set the mute state applied to the next published track
    pub fn set_start_muted(&self, muted: bool) {
        self.inner.start_muted.store(muted, Ordering::SeqCst);
    }

    /// Attach a token expiry collaborator
    pub fn set_token_hook(&self, hook: Arc<dyn TokenExpiryHook>) {
        *self.inner.token_hook.write() = Some(hook);
    }

    /// Emit startup diagnostics to the debug panel
    ///
    /// Returns whether the controller is ready to join, i.e. an App ID is
    /// known and the page runs in a secure context.
    pub fn startup_report(&self) -> bool {
        let ui = &self.inner.ui;
        let secure = self.inner.probe.is_secure_context();

        ui.debug("Application starting...");
        ui.debug(&format!("Secure context: {}", secure));
        if let Some(origin) = &self.inner.config.page_origin {
            ui.debug(&format!("URL: {}", origin));
        }

        let has_app_id = self.app_id().is_some();
        if has_app_id {
            ui.debug("App ID is set");
        } else {
            ui.debug("App ID not found");
        }

        let ready = has_app_id && secure;
        if ready {
            ui.debug("Initialization complete");
        }
        ready
    }

    /// Spawn the task that drains SDK events into [`handle_event`](Self::handle_event)
    ///
    /// Returns `None` if the loop was already started. The task ends once
    /// every controller clone has been dropped.
    pub fn spawn_event_loop(&self) -> Option<JoinHandle<()>> {
        let mut rx = self.inner.events_rx.lock().take()?;
        let weak = Arc::downgrade(&self.inner);

        Some(tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                SessionController { inner }.handle_event(envelope).await;
            }
            debug!("session event loop stopped");
        }))
    }
}
