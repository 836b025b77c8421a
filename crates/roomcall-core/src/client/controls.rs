//! In-call controls

use std::sync::Arc;

use tracing::{info, warn};

use super::SessionController;
use crate::error::SessionError;
use crate::events::SessionNotice;

impl SessionController {
    /// Flip the microphone mute state
    ///
    /// Without a published track this does nothing and returns the current
    /// value. If the SDK refuses, the error is reported and the previous
    /// value is returned unchanged.
    pub async fn toggle_mute(&self) -> bool {
        let (track, muted) = self.with_session(|s| (s.track.clone(), s.muted));
        let Some(track) = track else {
            return muted;
        };

        let target = !muted;
        if let Err(e) = track.set_enabled(!target).await {
            let err = SessionError::from_sdk("mute", e);
            warn!("Toggling mute failed: {}", err);
            self.report_error(&err);
            return muted;
        }

        // a teardown during set_enabled may have replaced the track
        let applied = self.with_session(|s| match &s.track {
            Some(current) if same_track(current, &track) => {
                s.muted = target;
                true
            }
            _ => false,
        });
        if !applied {
            return self.is_muted();
        }

        info!("Microphone {}", if target { "muted" } else { "unmuted" });
        let ui = &self.inner.ui;
        ui.set_mute_label(target);
        ui.report_status(
            if target {
                "Microphone muted"
            } else {
                "Microphone unmuted"
            },
            false,
        );
        self.notify(SessionNotice::MuteChanged { muted: target });
        target
    }
}

fn same_track<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
