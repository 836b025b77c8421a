//! Reflecting SDK events into the session
//!
//! Events arrive as [`EventEnvelope`]s, tagged with the epoch of the client
//! that raised them. An envelope is applied only while that client is still
//! the session's client; anything older belongs to a torn-down session and
//! is dropped.
//!
//! | Event | Effect |
//! |-------|--------|
//! | `UserPublished` | subscribe to the remote media, banner on success |
//! | `UserUnpublished` | debug log |
//! | `UserLeft` | banner, [`SessionNotice::RemoteUserLeft`] |
//! | `ConnectionStateChanged` to `Disconnected` | cleanup, disconnected view |
//! | `Error` | error banner |
//! | `TokenPrivilegeWillExpire` | [`TokenExpiryHook`](super::TokenExpiryHook) |
//! | `VolumeIndicator` | trace log |

use tracing::{debug, info, trace, warn};

use super::SessionController;
use crate::error::SessionError;
use crate::events::{EventEnvelope, MediaKind, RemoteUser, SdkEvent, SessionNotice};

impl SessionController {
    /// Apply one SDK event
    ///
    /// [`spawn_event_loop`](Self::spawn_event_loop) feeds every envelope
    /// through here; callers that drive their own loop can call it directly.
    pub async fn handle_event(&self, envelope: EventEnvelope) {
        let EventEnvelope { epoch, event } = envelope;

        let live = self.with_session(|s| s.is_current(epoch) && s.client.is_some());
        if !live {
            debug!("dropping stale {} event (epoch {})", event.name(), epoch);
            return;
        }

        let disconnect = event.is_disconnect();
        match event {
            SdkEvent::UserPublished { user, media } => self.on_user_published(epoch, user, media).await,
            SdkEvent::UserUnpublished { user, media } => {
                debug!("User {} unpublished {}", user.uid, media);
                self.inner
                    .ui
                    .debug(&format!("User {} unpublished {}", user.uid, media));
            }
            SdkEvent::UserLeft { user, reason } => {
                info!("User {} left ({})", user.uid, reason.as_deref().unwrap_or("quit"));
                self.inner.ui.report_status("A user left the room", false);
                self.notify(SessionNotice::RemoteUserLeft { uid: user.uid });
            }
            SdkEvent::ConnectionStateChanged {
                previous,
                current,
                reason,
            } => {
                debug!("connection state {:?} -> {:?} ({:?})", previous, current, reason);
                self.inner
                    .ui
                    .debug(&format!("Connection state changed: {:?} -> {:?}", previous, current));
                if disconnect {
                    self.on_disconnected(reason).await;
                }
            }
            SdkEvent::Error { code, message } => {
                warn!("SDK error {}: {}", code, message);
                self.inner
                    .ui
                    .report_status(&format!("Error: {} ({})", message, code), true);
            }
            SdkEvent::TokenPrivilegeWillExpire => {
                info!("Token privilege will expire soon");
                self.inner.ui.debug("Token privilege will expire soon");
                let room = self.with_session(|s| s.room_name.clone());
                let hook = self.inner.token_hook.read().clone();
                if let Some(hook) = hook {
                    hook.token_will_expire(room.as_deref()).await;
                }
            }
            SdkEvent::VolumeIndicator(levels) => {
                for level in &levels {
                    trace!("uid {} volume {:.1}", level.uid, level.level);
                }
            }
        }
    }

    async fn on_user_published(&self, epoch: u64, user: RemoteUser, media: MediaKind) {
        let client = self.with_session(|s| s.client.clone().filter(|_| s.is_current(epoch)));
        let Some(client) = client else {
            return;
        };

        match client.subscribe(&user, media).await {
            Ok(()) => {
                info!("Subscribed to {} of user {}", media, user.uid);
                self.inner.ui.report_status("Another user joined the room", false);
                self.notify(SessionNotice::RemoteUserSubscribed {
                    uid: user.uid,
                    media,
                });
            }
            Err(e) => {
                let err = SessionError::from_sdk("subscribe", e);
                warn!("Subscribing to user {} failed: {}", user.uid, err);
                self.report_error(&err);
            }
        }
    }

    async fn on_disconnected(&self, reason: Option<String>) {
        warn!(
            "Disconnected from the room ({})",
            reason.as_deref().unwrap_or("no reason given")
        );
        self.cleanup().await;

        let ui = &self.inner.ui;
        ui.set_disconnected_view();
        ui.set_mute_label(false);
        ui.report_status("Disconnected from the room", true);
    }
}
