//! In-process RTC SDK
//!
//! [`LoopbackEngine`] implements the SDK traits without any network. A
//! channel "join" always succeeds unless a fault is planned, captured tracks
//! produce no audio, and remote activity is simulated by pushing events in
//! with [`LoopbackEngine::emit`]. Every call is counted so callers can check
//! exactly what the controller asked the SDK to do.
//!
//! ```rust
//! use roomcall_core::sdk::loopback::LoopbackEngine;
//! use roomcall_core::sdk::SdkError;
//!
//! let engine = LoopbackEngine::new();
//! engine.fail_publish(SdkError::new("PUBLISH_FAILED", "no route"));
//! assert_eq!(engine.counts().publishes, 0);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};
use tracing::debug;

use super::{LocalAudioTrack, RtcClient, RtcEngine, SdkError, SdkResult};
use crate::config::{ClientConfig, EncoderConfig};
use crate::events::{EventSink, MediaKind, RemoteUser, SdkEvent};

/// First uid handed out when the caller lets the SDK choose
const FIRST_ASSIGNED_UID: u32 = 1000;

/// Planned failures; each stays in effect until cleared
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    pub create_client: Option<SdkError>,
    pub join: Option<SdkError>,
    pub microphone: Option<SdkError>,
    pub publish: Option<SdkError>,
    pub subscribe: Option<SdkError>,
    pub leave: Option<SdkError>,
    pub set_enabled: Option<SdkError>,
}

/// Number of times each SDK entry point was invoked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub clients_created: usize,
    pub joins: usize,
    pub tracks_created: usize,
    pub publishes: usize,
    pub subscribes: usize,
    pub leaves: usize,
    pub track_stops: usize,
    pub track_closes: usize,
}

/// Arguments of the most recent join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRecord {
    pub app_id: String,
    pub channel: String,
    pub token: Option<String>,
    pub requested_uid: Option<u32>,
    pub uid: u32,
}

#[derive(Debug)]
struct Shared {
    faults: Mutex<FaultPlan>,
    counts: Mutex<CallCounts>,
    enabled_calls: Mutex<Vec<bool>>,
    sink: Mutex<Option<EventSink>>,
    last_join: Mutex<Option<JoinRecord>>,
    last_client_config: Mutex<Option<ClientConfig>>,
    in_channel: AtomicBool,
    next_uid: AtomicU32,
    publish_gate: Mutex<Option<Arc<Semaphore>>>,
    publish_started: Notify,
}

/// Loopback SDK entry point
#[derive(Debug, Clone)]
pub struct LoopbackEngine {
    shared: Arc<Shared>,
}

impl Default for LoopbackEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackEngine {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                faults: Mutex::new(FaultPlan::default()),
                counts: Mutex::new(CallCounts::default()),
                enabled_calls: Mutex::new(Vec::new()),
                sink: Mutex::new(None),
                last_join: Mutex::new(None),
                last_client_config: Mutex::new(None),
                in_channel: AtomicBool::new(false),
                next_uid: AtomicU32::new(FIRST_ASSIGNED_UID),
                publish_gate: Mutex::new(None),
                publish_started: Notify::new(),
            }),
        }
    }

    /// Replace the fault plan
    pub fn set_faults(&self, plan: FaultPlan) {
        *self.shared.faults.lock() = plan;
    }

    pub fn clear_faults(&self) {
        self.set_faults(FaultPlan::default());
    }

    pub fn fail_create_client(&self, err: SdkError) {
        self.shared.faults.lock().create_client = Some(err);
    }

    pub fn fail_join(&self, err: SdkError) {
        self.shared.faults.lock().join = Some(err);
    }

    pub fn fail_microphone(&self, err: SdkError) {
        self.shared.faults.lock().microphone = Some(err);
    }

    pub fn fail_publish(&self, err: SdkError) {
        self.shared.faults.lock().publish = Some(err);
    }

    pub fn fail_subscribe(&self, err: SdkError) {
        self.shared.faults.lock().subscribe = Some(err);
    }

    pub fn fail_leave(&self, err: SdkError) {
        self.shared.faults.lock().leave = Some(err);
    }

    pub fn fail_set_enabled(&self, err: SdkError) {
        self.shared.faults.lock().set_enabled = Some(err);
    }

    /// Make every publish wait until [`release_publish`](Self::release_publish)
    pub fn hold_publish(&self) {
        *self.shared.publish_gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let one held publish complete
    pub fn release_publish(&self) {
        if let Some(gate) = self.shared.publish_gate.lock().as_ref() {
            gate.add_permits(1);
        }
    }

    /// Wait until a publish call has started
    pub async fn publish_started(&self) {
        self.shared.publish_started.notified().await;
    }

    /// Deliver an event through the sink of the most recent client
    ///
    /// Returns `false` if no client registered a sink or the controller is
    /// gone.
    pub fn emit(&self, event: SdkEvent) -> bool {
        let sink = self.shared.sink.lock().clone();
        match sink {
            Some(sink) => sink.emit(event),
            None => false,
        }
    }

    pub fn counts(&self) -> CallCounts {
        self.shared.counts.lock().clone()
    }

    /// Every `set_enabled` argument in call order
    pub fn enabled_calls(&self) -> Vec<bool> {
        self.shared.enabled_calls.lock().clone()
    }

    pub fn last_join(&self) -> Option<JoinRecord> {
        self.shared.last_join.lock().clone()
    }

    pub fn last_client_config(&self) -> Option<ClientConfig> {
        self.shared.last_client_config.lock().clone()
    }

    /// Whether a client is currently joined to a channel
    pub fn in_channel(&self) -> bool {
        self.shared.in_channel.load(Ordering::SeqCst)
    }

    /// Whether every captured track has been both stopped and closed
    pub fn all_tracks_released(&self) -> bool {
        let counts = self.counts();
        counts.track_stops >= counts.tracks_created && counts.track_closes >= counts.tracks_created
    }
}

#[async_trait]
impl RtcEngine for LoopbackEngine {
    fn create_client(&self, config: &ClientConfig) -> SdkResult<Arc<dyn RtcClient>> {
        if let Some(err) = self.shared.faults.lock().create_client.clone() {
            return Err(err);
        }
        self.shared.counts.lock().clients_created += 1;
        *self.shared.last_client_config.lock() = Some(config.clone());
        debug!("loopback client created ({:?})", config.mode);
        Ok(Arc::new(LoopbackClient {
            shared: self.shared.clone(),
        }))
    }

    async fn create_microphone_track(
        &self,
        encoder: &EncoderConfig,
    ) -> SdkResult<Arc<dyn LocalAudioTrack>> {
        if let Some(err) = self.shared.faults.lock().microphone.clone() {
            return Err(err);
        }
        self.shared.counts.lock().tracks_created += 1;
        debug!("loopback microphone track created ({:?})", encoder.preset);
        Ok(Arc::new(LoopbackTrack {
            shared: self.shared.clone(),
            enabled: AtomicBool::new(true),
        }))
    }
}

/// Loopback SDK client
#[derive(Debug)]
pub struct LoopbackClient {
    shared: Arc<Shared>,
}

#[async_trait]
impl RtcClient for LoopbackClient {
    fn on_event(&self, sink: EventSink) {
        *self.shared.sink.lock() = Some(sink);
    }

    async fn join(
        &self,
        app_id: &str,
        channel: &str,
        token: Option<&str>,
        uid: Option<u32>,
    ) -> SdkResult<u32> {
        self.shared.counts.lock().joins += 1;
        if let Some(err) = self.shared.faults.lock().join.clone() {
            return Err(err);
        }
        let assigned = uid.unwrap_or_else(|| self.shared.next_uid.fetch_add(1, Ordering::SeqCst));
        *self.shared.last_join.lock() = Some(JoinRecord {
            app_id: app_id.to_string(),
            channel: channel.to_string(),
            token: token.map(str::to_string),
            requested_uid: uid,
            uid: assigned,
        });
        self.shared.in_channel.store(true, Ordering::SeqCst);
        Ok(assigned)
    }

    async fn publish(&self, _track: Arc<dyn LocalAudioTrack>) -> SdkResult<()> {
        self.shared.counts.lock().publishes += 1;
        self.shared.publish_started.notify_one();

        let gate = self.shared.publish_gate.lock().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        match self.shared.faults.lock().publish.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn subscribe(&self, user: &RemoteUser, media: MediaKind) -> SdkResult<()> {
        self.shared.counts.lock().subscribes += 1;
        if let Some(err) = self.shared.faults.lock().subscribe.clone() {
            return Err(err);
        }
        debug!("loopback subscribed to {} of user {}", media, user.uid);
        Ok(())
    }

    async fn leave(&self) -> SdkResult<()> {
        self.shared.counts.lock().leaves += 1;
        self.shared.in_channel.store(false, Ordering::SeqCst);
        match self.shared.faults.lock().leave.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Loopback microphone track
#[derive(Debug)]
pub struct LoopbackTrack {
    shared: Arc<Shared>,
    enabled: AtomicBool,
}

impl LoopbackTrack {
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalAudioTrack for LoopbackTrack {
    async fn set_enabled(&self, enabled: bool) -> SdkResult<()> {
        self.shared.enabled_calls.lock().push(enabled);
        if let Some(err) = self.shared.faults.lock().set_enabled.clone() {
            return Err(err);
        }
        self.enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.shared.counts.lock().track_stops += 1;
    }

    fn close(&self) {
        self.shared.counts.lock().track_closes += 1;
    }
}
