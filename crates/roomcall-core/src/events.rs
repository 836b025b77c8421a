//! Inbound SDK events and the channel that carries them to the controller
//!
//! The RTC SDK pushes callbacks (`user-published`, `connection-state-change`,
//! ...) at arbitrary times. Rather than letting those callbacks mutate session
//! state directly, each client is handed an [`EventSink`] that forwards
//! [`SdkEvent`]s into a single channel. One consumer drains that channel and
//! applies the events in order through
//! [`SessionController::handle_event`](crate::client::SessionController::handle_event).
//!
//! Every envelope carries the session epoch of the client that produced it,
//! so events from a client that has since been torn down can be dropped.

use tokio::sync::mpsc;

/// Kind of media a remote user published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Audio track
    Audio,
    /// Video track
    Video,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// A remote participant as reported by the SDK
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUser {
    /// SDK-assigned user id
    pub uid: u32,
}

impl RemoteUser {
    pub fn new(uid: u32) -> Self {
        Self { uid }
    }
}

/// Transport connectivity as reported by `connection-state-change`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Disconnecting,
}

/// Audio level of one participant from `volume-indicator`
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeLevel {
    pub uid: u32,
    /// Level in the SDK's 0-100 scale
    pub level: f32,
}

/// Events the RTC SDK can raise on a client
#[derive(Debug, Clone, PartialEq)]
pub enum SdkEvent {
    /// A remote user published a track
    UserPublished { user: RemoteUser, media: MediaKind },
    /// A remote user stopped publishing a track
    UserUnpublished { user: RemoteUser, media: MediaKind },
    /// A remote user left the channel
    UserLeft { user: RemoteUser, reason: Option<String> },
    /// The transport changed connectivity
    ConnectionStateChanged {
        previous: TransportState,
        current: TransportState,
        reason: Option<String>,
    },
    /// The SDK reported an asynchronous error
    Error { code: String, message: String },
    /// The credential token is about to expire
    TokenPrivilegeWillExpire,
    /// Periodic audio level report
    VolumeIndicator(Vec<VolumeLevel>),
}

impl SdkEvent {
    /// SDK event name this variant corresponds to
    pub fn name(&self) -> &'static str {
        match self {
            SdkEvent::UserPublished { .. } => "user-published",
            SdkEvent::UserUnpublished { .. } => "user-unpublished",
            SdkEvent::UserLeft { .. } => "user-left",
            SdkEvent::ConnectionStateChanged { .. } => "connection-state-change",
            SdkEvent::Error { .. } => "error",
            SdkEvent::TokenPrivilegeWillExpire => "token-privilege-will-expire",
            SdkEvent::VolumeIndicator(_) => "volume-indicator",
        }
    }

    /// Whether this event reports that the transport went away
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            SdkEvent::ConnectionStateChanged {
                current: TransportState::Disconnected,
                ..
            }
        )
    }
}

/// An event tagged with the epoch of the client that raised it
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    pub epoch: u64,
    pub event: SdkEvent,
}

/// Handle given to an SDK client for delivering its events
///
/// Cloning is cheap; sending never blocks. Sends after the controller has
/// been dropped are discarded.
#[derive(Debug, Clone)]
pub struct EventSink {
    epoch: u64,
    tx: mpsc::UnboundedSender<EventEnvelope>,
}

impl EventSink {
    pub(crate) fn new(epoch: u64, tx: mpsc::UnboundedSender<EventEnvelope>) -> Self {
        Self { epoch, tx }
    }

    /// Epoch this sink tags events with
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Forward an event to the controller
    ///
    /// Returns `false` if nobody is listening anymore.
    pub fn emit(&self, event: SdkEvent) -> bool {
        tracing::trace!("sdk event {} (epoch {})", event.name(), self.epoch);
        self.tx
            .send(EventEnvelope {
                epoch: self.epoch,
                event,
            })
            .is_ok()
    }
}

/// Notifications the controller broadcasts to observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// The connection state changed
    StateChanged {
        previous: crate::session::ConnectionState,
        current: crate::session::ConnectionState,
    },
    /// The microphone mute state changed
    MuteChanged { muted: bool },
    /// A remote user's media was subscribed
    RemoteUserSubscribed { uid: u32, media: MediaKind },
    /// A remote user left the channel
    RemoteUserLeft { uid: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_tags_events_with_epoch() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(7, tx);
        assert!(sink.emit(SdkEvent::TokenPrivilegeWillExpire));

        let envelope = rx.try_recv().unwrap();
        assert_eq!(envelope.epoch, 7);
        assert_eq!(envelope.event.name(), "token-privilege-will-expire");
    }

    #[test]
    fn emit_reports_closed_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(1, tx);
        drop(rx);
        assert!(!sink.emit(SdkEvent::TokenPrivilegeWillExpire));
    }

    #[test]
    fn only_disconnected_counts_as_disconnect() {
        let lost = SdkEvent::ConnectionStateChanged {
            previous: TransportState::Connected,
            current: TransportState::Disconnected,
            reason: Some("NETWORK_ERROR".into()),
        };
        let reconnecting = SdkEvent::ConnectionStateChanged {
            previous: TransportState::Connected,
            current: TransportState::Reconnecting,
            reason: None,
        };
        assert!(lost.is_disconnect());
        assert!(!reconnecting.is_disconnect());
    }
}
