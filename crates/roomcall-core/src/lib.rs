//! # roomcall-core
//!
//! Call session lifecycle for one participant in a voice room.
//!
//! A [`SessionController`] joins a named room through an RTC SDK, captures
//! and publishes the microphone, reflects remote participant activity,
//! toggles mute and tears everything down again, while keeping its
//! [`CallSession`](session::CallSession) consistent no matter how SDK
//! callbacks interleave with user actions.
//!
//! The SDK itself sits behind the traits in [`sdk`]; [`sdk::loopback`]
//! provides an in-process implementation for demos and tests. The front end
//! is reached through [`ui::UiSurface`].
//!
//! ```rust
//! use std::sync::Arc;
//! use roomcall_core::{ConnectionState, SessionConfig, SessionController};
//! use roomcall_core::sdk::loopback::LoopbackEngine;
//!
//! # tokio_test::block_on(async {
//! let controller = SessionController::builder(Arc::new(LoopbackEngine::new()))
//!     .config(SessionConfig::new().with_app_id("demo-app"))
//!     .build()
//!     .unwrap();
//!
//! let joined = controller.join("alice", "room1").await.unwrap();
//! assert_eq!(joined.room_name, "room1");
//! assert_eq!(controller.state(), ConnectionState::Connected);
//! # });
//! ```

pub mod bootstrap;
pub mod capability;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod sdk;
pub mod session;
pub mod ui;

// Re-export main types
pub use bootstrap::{AppIdSource, EnvAppId, FileAppId, StaticAppId};
pub use capability::{CapabilityProbe, StaticProbe};
pub use client::{SessionController, SessionControllerBuilder, TokenExpiryHook};
pub use config::{ClientConfig, EncoderConfig, SessionConfig, UidStrategy};
pub use error::{ErrorCategory, SessionError, SessionResult};
pub use events::{EventEnvelope, EventSink, MediaKind, RemoteUser, SdkEvent, SessionNotice, TransportState};
pub use logging::{LoggingConfig, setup_logging};
pub use session::{ConnectionState, JoinedSession, SessionSnapshot};
pub use ui::{DebugLog, NullUi, StatusBoard, UiSurface};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
