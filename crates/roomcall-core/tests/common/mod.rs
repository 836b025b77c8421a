//! Shared fixtures for controller integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use roomcall_core::sdk::loopback::LoopbackEngine;
use roomcall_core::{ConnectionState, SessionConfig, SessionController, StaticProbe, UiSurface};

pub const APP_ID: &str = "integration-app";

/// One call the controller made on the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCall {
    Status { text: String, is_error: bool },
    ConnectedView { room: String, display_name: String },
    DisconnectedView,
    MuteLabel { muted: bool },
}

/// UI surface that records every call in order
#[derive(Debug, Default)]
pub struct RecordingUi {
    calls: Mutex<Vec<UiCall>>,
    debug: Mutex<Vec<String>>,
}

impl RecordingUi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<UiCall> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    pub fn statuses(&self) -> Vec<(String, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                UiCall::Status { text, is_error } => Some((text, is_error)),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.statuses()
            .into_iter()
            .filter(|(_, is_error)| *is_error)
            .map(|(text, _)| text)
            .collect()
    }

    pub fn last_mute_label(&self) -> Option<&'static str> {
        self.calls().into_iter().rev().find_map(|call| match call {
            UiCall::MuteLabel { muted } => Some(roomcall_core::ui::mute_label(muted)),
            _ => None,
        })
    }

    pub fn debug_lines(&self) -> Vec<String> {
        self.debug.lock().clone()
    }
}

impl UiSurface for RecordingUi {
    fn report_status(&self, message: &str, is_error: bool) {
        self.calls.lock().push(UiCall::Status {
            text: message.to_string(),
            is_error,
        });
    }

    fn set_connected_view(&self, room: &str, display_name: &str) {
        self.calls.lock().push(UiCall::ConnectedView {
            room: room.to_string(),
            display_name: display_name.to_string(),
        });
    }

    fn set_disconnected_view(&self) {
        self.calls.lock().push(UiCall::DisconnectedView);
    }

    fn set_mute_label(&self, muted: bool) {
        self.calls.lock().push(UiCall::MuteLabel { muted });
    }

    fn debug(&self, message: &str) {
        self.debug.lock().push(message.to_string());
    }
}

/// A loopback engine, a recording UI and a controller wired to both
pub struct Harness {
    pub engine: LoopbackEngine,
    pub ui: Arc<RecordingUi>,
    pub controller: SessionController,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::new().with_app_id(APP_ID))
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self::build(config, None)
    }

    pub fn with_probe(probe: StaticProbe) -> Self {
        Self::build(SessionConfig::new().with_app_id(APP_ID), Some(probe))
    }

    fn build(config: SessionConfig, probe: Option<StaticProbe>) -> Self {
        let engine = LoopbackEngine::new();
        let ui = RecordingUi::new();
        let mut builder = SessionController::builder(Arc::new(engine.clone()))
            .config(config)
            .ui(ui.clone());
        if let Some(probe) = probe {
            builder = builder.probe(Arc::new(probe));
        }
        let controller = builder.build().expect("valid test config");
        Self { engine, ui, controller }
    }

    /// Wait until the controller reaches `state`, failing after a second
    pub async fn wait_for_state(&self, state: ConnectionState) {
        let reached = tokio::time::timeout(Duration::from_secs(1), async {
            while self.controller.state() != state {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(reached.is_ok(), "controller never reached {}", state);
    }
}
