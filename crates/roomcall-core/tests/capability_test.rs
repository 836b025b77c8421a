//! Platform checks run before any client is created

mod common;

use common::Harness;
use roomcall_core::error::MICROPHONE_GUIDANCE;
use roomcall_core::sdk::SdkError;
use roomcall_core::{ErrorCategory, SessionConfig, SessionError, StaticProbe};

#[tokio::test]
async fn test_insecure_context_aborts_join() {
    let h = Harness::with_probe(StaticProbe::permissive().with_secure_context(false));

    let err = h.controller.join("alice", "room1").await.unwrap_err();
    assert_eq!(err, SessionError::InsecureContext);
    assert_eq!(err.category(), ErrorCategory::Platform);
    assert_eq!(h.engine.counts().clients_created, 0);
    assert!(h.controller.snapshot().is_released());
}

#[tokio::test]
async fn test_http_page_origin_is_insecure() {
    let h = Harness::with_config(
        SessionConfig::new()
            .with_app_id(common::APP_ID)
            .with_page_origin("http://calls.example.com"),
    );

    let err = h.controller.join("alice", "room1").await.unwrap_err();
    assert_eq!(err, SessionError::InsecureContext);
}

#[tokio::test]
async fn test_missing_media_api_is_capability_error() {
    let h = Harness::with_probe(StaticProbe::permissive().with_media_capture(false));

    let err = h.controller.join("alice", "room1").await.unwrap_err();
    assert!(matches!(err, SessionError::Capability { .. }));
    assert_eq!(h.engine.counts().clients_created, 0);
}

#[tokio::test]
async fn test_permission_denial_shows_guidance() {
    let h = Harness::with_probe(
        StaticProbe::permissive()
            .with_microphone_error(SdkError::new("NotAllowedError", "Permission denied")),
    );

    let err = h.controller.join("alice", "room1").await.unwrap_err();
    assert!(matches!(err, SessionError::PermissionDenied { .. }));
    assert_eq!(h.engine.counts().clients_created, 0);

    let errors = h.ui.errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[1], MICROPHONE_GUIDANCE);
}

#[tokio::test]
async fn test_unclassified_probe_failure_is_capability_error() {
    let h = Harness::with_probe(
        StaticProbe::permissive().with_microphone_error(SdkError::new("AbortError", "capture aborted")),
    );

    let err = h.controller.join("alice", "room1").await.unwrap_err();
    assert!(matches!(err, SessionError::Capability { .. }));
}
