//! The call session entity
//!
//! A [`CallSession`] records what a controller currently holds: the SDK
//! client, the microphone track, the mute flag and the room metadata. It is
//! owned by exactly one controller and only mutated under that controller's
//! lock, which is never held across an `.await`.
//!
//! # Epochs
//!
//! Every teardown bumps [`CallSession::epoch`]. A join remembers the epoch it
//! started in and re-checks it after each suspension point; if it changed,
//! a concurrent cleanup released the session and the join must not write
//! anything back.

use std::sync::Arc;

use uuid::Uuid;

use crate::sdk::{LocalAudioTrack, RtcClient};

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No session; initial and terminal state
    Idle,
    /// Client created, join/capture/publish in progress
    Joining,
    /// Joined with the microphone published
    Connected,
    /// Tearing down; waiting for the SDK leave call
    Leaving,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Joining => "joining",
            ConnectionState::Connected => "connected",
            ConnectionState::Leaving => "leaving",
        };
        f.write_str(name)
    }
}

/// Mutable session state owned by a controller
pub struct CallSession {
    pub(crate) session_id: Option<Uuid>,
    pub(crate) state: ConnectionState,
    pub(crate) client: Option<Arc<dyn RtcClient>>,
    pub(crate) track: Option<Arc<dyn LocalAudioTrack>>,
    pub(crate) muted: bool,
    pub(crate) local_uid: Option<u32>,
    pub(crate) room_name: Option<String>,
    pub(crate) display_name: Option<String>,
    pub(crate) channel_joined: bool,
    pub(crate) epoch: u64,
}

impl std::fmt::Debug for CallSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSession")
            .field("session_id", &self.session_id)
            .field("state", &self.state)
            .field("client", &self.client.as_ref().map(|_| "<client>"))
            .field("track", &self.track.as_ref().map(|_| "<track>"))
            .field("muted", &self.muted)
            .field("local_uid", &self.local_uid)
            .field("room_name", &self.room_name)
            .field("channel_joined", &self.channel_joined)
            .field("epoch", &self.epoch)
            .finish()
    }
}

/// Resources a teardown has to release outside the lock
pub(crate) struct Teardown {
    pub track: Option<Arc<dyn LocalAudioTrack>>,
    pub leave: Option<Arc<dyn RtcClient>>,
    pub epoch: u64,
}

impl Default for CallSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CallSession {
    pub fn new() -> Self {
        Self {
            session_id: None,
            state: ConnectionState::Idle,
            client: None,
            track: None,
            muted: false,
            local_uid: None,
            room_name: None,
            display_name: None,
            channel_joined: false,
            epoch: 0,
        }
    }

    /// Return to Idle with nothing held; the epoch is kept
    pub(crate) fn reset(&mut self) {
        self.session_id = None;
        self.state = ConnectionState::Idle;
        self.client = None;
        self.track = None;
        self.muted = false;
        self.local_uid = None;
        self.room_name = None;
        self.display_name = None;
        self.channel_joined = false;
    }

    pub(crate) fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    /// Hand a freshly created client to the session
    pub(crate) fn attach_client(
        &mut self,
        client: Arc<dyn RtcClient>,
        session_id: Uuid,
        room_name: &str,
        display_name: &str,
    ) {
        self.session_id = Some(session_id);
        self.client = Some(client);
        self.state = ConnectionState::Joining;
        self.room_name = Some(room_name.to_string());
        self.display_name = Some(display_name.to_string());
    }

    /// Start a teardown
    ///
    /// The track is always taken. If the channel was joined and no other
    /// teardown is already leaving it, the client is returned for the leave
    /// call and the session sits in Leaving until
    /// [`finish_teardown`](Self::finish_teardown); otherwise the session is
    /// reset to Idle right away.
    pub(crate) fn begin_teardown(&mut self) -> Teardown {
        let track = self.track.take();
        let leave = if self.channel_joined && self.state != ConnectionState::Leaving {
            self.client.clone()
        } else {
            None
        };

        self.epoch += 1;
        if leave.is_some() {
            self.state = ConnectionState::Leaving;
            self.channel_joined = false;
            self.muted = false;
        } else {
            self.reset();
        }

        Teardown {
            track,
            leave,
            epoch: self.epoch,
        }
    }

    /// Complete a teardown started at `epoch` unless a newer one took over
    pub(crate) fn finish_teardown(&mut self, epoch: u64) {
        if self.is_current(epoch) {
            self.reset();
        }
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            state: self.state,
            has_client: self.client.is_some(),
            has_track: self.track.is_some(),
            muted: self.muted,
            local_uid: self.local_uid,
            room_name: self.room_name.clone(),
            display_name: self.display_name.clone(),
            channel_joined: self.channel_joined,
            epoch: self.epoch,
        }
    }
}

/// Point-in-time copy of a session, safe to hand out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: Option<Uuid>,
    pub state: ConnectionState,
    pub has_client: bool,
    pub has_track: bool,
    pub muted: bool,
    pub local_uid: Option<u32>,
    pub room_name: Option<String>,
    pub display_name: Option<String>,
    pub channel_joined: bool,
    pub epoch: u64,
}

impl SessionSnapshot {
    /// Idle with no handles held
    pub fn is_released(&self) -> bool {
        self.state == ConnectionState::Idle && !self.has_client && !self.has_track
    }
}

/// Result of a successful join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedSession {
    pub session_id: Uuid,
    pub room_name: String,
    pub display_name: String,
    /// Uid the SDK joined with
    pub local_uid: u32,
    pub muted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, EncoderConfig};
    use crate::sdk::RtcEngine;
    use crate::sdk::loopback::LoopbackEngine;

    async fn joined_session(engine: &LoopbackEngine) -> CallSession {
        let mut session = CallSession::new();
        let client = engine.create_client(&ClientConfig::default()).unwrap();
        session.attach_client(client, Uuid::new_v4(), "room1", "alice");
        session.channel_joined = true;
        session.track = Some(
            engine
                .create_microphone_track(&EncoderConfig::default())
                .await
                .unwrap(),
        );
        session.state = ConnectionState::Connected;
        session.muted = true;
        session
    }

    #[test]
    fn new_session_is_released() {
        let session = CallSession::new();
        assert!(session.snapshot().is_released());
        assert_eq!(session.epoch, 0);
    }

    #[tokio::test]
    async fn teardown_of_joined_session_goes_through_leaving() {
        let engine = LoopbackEngine::new();
        let mut session = joined_session(&engine).await;

        let teardown = session.begin_teardown();
        assert!(teardown.track.is_some());
        assert!(teardown.leave.is_some());
        assert_eq!(session.state, ConnectionState::Leaving);
        assert!(session.client.is_some());
        assert!(session.track.is_none());
        assert!(!session.muted);

        session.finish_teardown(teardown.epoch);
        assert!(session.snapshot().is_released());
    }

    #[tokio::test]
    async fn second_teardown_while_leaving_resets_immediately() {
        let engine = LoopbackEngine::new();
        let mut session = joined_session(&engine).await;

        let first = session.begin_teardown();
        let second = session.begin_teardown();
        assert!(second.leave.is_none());
        assert!(second.track.is_none());
        assert!(session.snapshot().is_released());

        // the first teardown finishing late must not touch newer state
        session.state = ConnectionState::Joining;
        session.finish_teardown(first.epoch);
        assert_eq!(session.state, ConnectionState::Joining);
    }

    #[test]
    fn teardown_of_idle_session_only_bumps_epoch() {
        let mut session = CallSession::new();
        let teardown = session.begin_teardown();
        assert!(teardown.track.is_none());
        assert!(teardown.leave.is_none());
        assert_eq!(teardown.epoch, 1);
        assert!(session.snapshot().is_released());
    }
}
