//! Join, leave and cleanup
//!
//! # Join sequence
//!
//! 1. validate the display name and room (no SDK interaction on failure)
//! 2. `cleanup()` whatever a previous session left behind
//! 3. App ID, secure context, capture support, microphone permission
//! 4. create the client and register its event sink
//! 5. join the channel
//! 6. capture and publish the microphone, apply the start-muted pre-set
//! 7. hand the track to the session and go Connected
//!
//! Any failure from step 3 on ends in Idle with every handle released. A
//! disconnect (or an explicit leave) that tears the session down while the
//! join is suspended is detected through the session epoch; the join then
//! releases what it acquired but never handed over, and fails with an
//! interrupted [`SessionError::Transport`].

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::SessionController;
use crate::error::{SessionError, SessionResult};
use crate::events::EventSink;
use crate::sdk::{LocalAudioTrack, RtcClient};
use crate::session::{ConnectionState, JoinedSession};

impl SessionController {
    /// Join `room_name` as `display_name`
    ///
    /// On success the session is Connected and the UI shows the in-call
    /// view. On failure the session is Idle, the error has been reported to
    /// the UI and is returned.
    pub async fn join(&self, display_name: &str, room_name: &str) -> SessionResult<JoinedSession> {
        let ui = &self.inner.ui;
        match self.try_join(display_name.trim(), room_name.trim()).await {
            Ok(joined) => {
                info!(
                    "Joined room {} as {} (uid {}, session {})",
                    joined.room_name, joined.display_name, joined.local_uid, joined.session_id
                );
                ui.set_connected_view(&joined.room_name, &joined.display_name);
                ui.set_mute_label(joined.muted);
                ui.report_status("Successfully joined the room!", false);
                Ok(joined)
            }
            Err(err) => {
                warn!("Join failed: {}", err);
                ui.debug(&format!("Error joining call: {}", err));
                if !matches!(err, SessionError::Validation { .. }) {
                    ui.set_disconnected_view();
                }
                self.report_error(&err);
                Err(err)
            }
        }
    }

    async fn try_join(&self, display_name: &str, room_name: &str) -> SessionResult<JoinedSession> {
        if display_name.is_empty() || room_name.is_empty() {
            return Err(SessionError::validation(
                "Please enter both username and room name",
            ));
        }

        self.cleanup().await;
        let epoch = self.with_session(|s| s.epoch);

        let app_id = self
            .app_id()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| SessionError::config("App ID is not set"))?;

        self.check_capture().await?;

        let inner = &self.inner;
        let client = inner
            .engine
            .create_client(&inner.config.client)
            .map_err(|e| SessionError::from_sdk("join", e))?;
        client.on_event(EventSink::new(epoch, inner.events_tx.clone()));
        inner.ui.debug("Client initialized successfully");

        let session_id = Uuid::new_v4();
        if !self.commit(epoch, |s| {
            s.attach_client(client.clone(), session_id, room_name, display_name)
        }) {
            return Err(SessionError::interrupted());
        }

        let requested_uid = inner.config.uid_strategy.pick();
        let token = inner.config.token.as_deref();
        debug!("joining channel {} (uid {:?})", room_name, requested_uid);
        let local_uid = match client.join(&app_id, room_name, token, requested_uid).await {
            Ok(uid) => uid,
            Err(e) => return Err(self.abort_join(epoch, SessionError::from_sdk("join", e)).await),
        };
        if !self.commit(epoch, |s| {
            s.channel_joined = true;
            s.local_uid = Some(local_uid);
        }) {
            // nobody else knows we are in the channel
            release_orphans(None, Some(&client)).await;
            return Err(SessionError::interrupted());
        }
        inner.ui.debug(&format!("Joined channel: {}", room_name));

        let track = match inner.engine.create_microphone_track(&inner.config.encoder).await {
            Ok(track) => track,
            Err(e) => return Err(self.abort_join(epoch, SessionError::from_sdk("capture", e)).await),
        };
        // the track stays private to this join until it is published
        if let Err(e) = client.publish(track.clone()).await {
            release_orphans(Some(&track), None).await;
            return Err(self.abort_join(epoch, SessionError::from_sdk("publish", e)).await);
        }
        inner.ui.debug("Local audio track published");

        let muted = self.apply_start_mute(&track).await;

        let connected = self.commit(epoch, |s| {
            s.track = Some(track.clone());
            s.muted = muted;
            s.state = ConnectionState::Connected;
        });
        if !connected {
            // the racing teardown already left the channel
            release_orphans(Some(&track), None).await;
            return Err(SessionError::interrupted());
        }

        Ok(JoinedSession {
            session_id,
            room_name: room_name.to_string(),
            display_name: display_name.to_string(),
            local_uid,
            muted,
        })
    }

    /// Secure context, capture support and microphone permission
    async fn check_capture(&self) -> SessionResult<()> {
        let probe = &self.inner.probe;
        if !probe.is_secure_context() {
            return Err(SessionError::InsecureContext);
        }
        if !probe.supports_media_capture() {
            return Err(SessionError::capability(
                "this runtime does not expose microphone capture",
            ));
        }
        probe
            .request_microphone()
            .await
            .map_err(|e| match SessionError::from_sdk("capture", e) {
                SessionError::Transport { message, .. } => SessionError::Capability { message },
                other => other,
            })
    }

    /// Disable a fresh track if the next session was pre-set to muted
    async fn apply_start_mute(&self, track: &Arc<dyn LocalAudioTrack>) -> bool {
        if !self.start_muted() {
            return false;
        }
        match track.set_enabled(false).await {
            Ok(()) => true,
            Err(e) => {
                let err = SessionError::from_sdk("mute", e);
                warn!("Could not apply start-muted: {}", err);
                self.inner.ui.report_status(&err.user_message(), true);
                false
            }
        }
    }

    /// Fail a join, cleaning up if the session is still ours
    async fn abort_join(&self, epoch: u64, err: SessionError) -> SessionError {
        if self.with_session(|s| s.is_current(epoch)) {
            if let Some(leave_err) = self.cleanup_inner().await {
                debug!("leave after failed join also failed: {}", leave_err);
            }
        }
        err
    }

    /// Leave the current session
    ///
    /// Safe to call in any state. The session is Idle afterwards even when
    /// the SDK leave call fails; that failure is reported and returned.
    pub async fn leave(&self) -> SessionResult<()> {
        let failure = self.cleanup_inner().await;

        let ui = &self.inner.ui;
        ui.set_disconnected_view();
        ui.set_mute_label(false);

        match failure {
            None => {
                info!("Left the room");
                ui.debug("Left the channel");
                ui.report_status("Successfully left the room", false);
                Ok(())
            }
            Some(err) => {
                ui.debug(&format!("Error leaving call: {}", err));
                self.report_error(&err);
                Err(err)
            }
        }
    }

    /// Release everything the session holds and return to Idle
    ///
    /// Idempotent and safe from any state, including while a join is in
    /// flight. Never fails; SDK errors are logged.
    pub async fn cleanup(&self) {
        if let Some(err) = self.cleanup_inner().await {
            debug!("cleanup swallowed: {}", err);
        }
    }

    /// Cleanup that hands back a failed leave for [`leave`](Self::leave)
    pub(crate) async fn cleanup_inner(&self) -> Option<SessionError> {
        let teardown = self.with_session(|s| s.begin_teardown());

        if let Some(track) = &teardown.track {
            track.stop();
            track.close();
            debug!("local audio track released");
        }

        let client = teardown.leave.as_ref()?;
        let failure = match client.leave().await {
            Ok(()) => None,
            Err(e) => {
                let err = SessionError::from_sdk("leave", e);
                warn!("Leaving the channel failed during cleanup: {}", err);
                Some(err)
            }
        };
        self.with_session(|s| s.finish_teardown(teardown.epoch));
        failure
    }

    pub(crate) fn report_error(&self, err: &SessionError) {
        let ui = &self.inner.ui;
        ui.report_status(&err.user_message(), true);
        if let Some(guidance) = err.guidance() {
            ui.report_status(guidance, true);
        }
    }
}

/// Release resources a torn-down join acquired but never handed over
async fn release_orphans(track: Option<&Arc<dyn LocalAudioTrack>>, client: Option<&Arc<dyn RtcClient>>) {
    if let Some(track) = track {
        track.stop();
        track.close();
    }
    if let Some(client) = client {
        if let Err(e) = client.leave().await {
            warn!("Leaving an abandoned channel failed: {}", e);
        }
    }
}
