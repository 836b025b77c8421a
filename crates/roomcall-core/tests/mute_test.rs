//! Microphone mute behaviour

mod common;

use common::{APP_ID, Harness, UiCall};
use roomcall_core::sdk::SdkError;
use roomcall_core::{ConnectionState, SessionConfig, SessionNotice};

#[tokio::test]
async fn test_toggle_without_track_is_noop() {
    let h = Harness::new();

    assert!(!h.controller.toggle_mute().await);
    assert!(h.ui.calls().is_empty());
    assert!(h.engine.enabled_calls().is_empty());
}

#[tokio::test]
async fn test_alice_room1_mute_round_trip() {
    let h = Harness::new();
    h.controller.join("alice", "room1").await.unwrap();
    h.ui.clear();

    assert!(h.controller.toggle_mute().await);
    assert!(h.controller.is_muted());
    assert_eq!(h.ui.last_mute_label(), Some("Unmute"));
    assert!(h.ui.statuses().contains(&("Microphone muted".to_string(), false)));

    assert!(!h.controller.toggle_mute().await);
    assert!(!h.controller.is_muted());
    assert_eq!(h.ui.last_mute_label(), Some("Mute"));
    assert!(h.ui.statuses().contains(&("Microphone unmuted".to_string(), false)));

    assert_eq!(h.engine.enabled_calls(), vec![false, true]);
}

#[tokio::test]
async fn test_failed_toggle_keeps_state() {
    let h = Harness::new();
    h.controller.join("alice", "room1").await.unwrap();
    h.engine.fail_set_enabled(SdkError::new("TRACK_IS_DISABLED", "track unavailable"));
    h.ui.clear();

    assert!(!h.controller.toggle_mute().await);
    assert!(!h.controller.is_muted());
    assert!(!h.ui.calls().iter().any(|c| matches!(c, UiCall::MuteLabel { .. })));
    assert_eq!(h.ui.errors().len(), 1);
}

#[tokio::test]
async fn test_mute_state_resets_after_leave() {
    let h = Harness::new();
    h.controller.join("alice", "room1").await.unwrap();
    assert!(h.controller.toggle_mute().await);

    h.controller.leave().await.unwrap();
    assert!(!h.controller.is_muted());
    assert_eq!(h.ui.last_mute_label(), Some("Mute"));

    // toggling after leave has no track to act on
    assert!(!h.controller.toggle_mute().await);
    assert_eq!(h.engine.enabled_calls(), vec![false]);
}

#[tokio::test]
async fn test_start_muted_disables_fresh_track() {
    let h = Harness::with_config(SessionConfig::new().with_app_id(APP_ID).with_start_muted(true));

    let joined = h.controller.join("alice", "room1").await.unwrap();
    assert!(joined.muted);
    assert!(h.controller.is_muted());
    assert_eq!(h.engine.enabled_calls(), vec![false]);
    assert_eq!(h.ui.last_mute_label(), Some("Unmute"));

    assert!(!h.controller.toggle_mute().await);
    assert_eq!(h.engine.enabled_calls(), vec![false, true]);
}

#[tokio::test]
async fn test_start_muted_can_be_set_before_join() {
    let h = Harness::new();
    h.controller.set_start_muted(true);

    h.controller.join("alice", "room1").await.unwrap();
    assert!(h.controller.is_muted());
}

#[tokio::test]
async fn test_mute_changes_are_broadcast() {
    let h = Harness::new();
    h.controller.join("alice", "room1").await.unwrap();
    let mut notices = h.controller.subscribe();

    h.controller.toggle_mute().await;
    h.controller.toggle_mute().await;

    let mut mutes = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        if let SessionNotice::MuteChanged { muted } = notice {
            mutes.push(muted);
        }
    }
    assert_eq!(mutes, vec![true, false]);
}

#[tokio::test]
async fn test_toggle_while_publish_pending_leaves_track_alone() {
    let h = Harness::new();
    h.engine.hold_publish();

    let controller = h.controller.clone();
    let join = tokio::spawn(async move { controller.join("alice", "room1").await });
    h.engine.publish_started().await;

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.state, ConnectionState::Joining);
    assert!(!snapshot.has_track);
    assert!(!h.controller.toggle_mute().await);
    assert!(h.engine.enabled_calls().is_empty());

    h.engine.release_publish();
    let joined = join.await.unwrap().unwrap();

    assert!(!joined.muted);
    assert!(!h.controller.is_muted());
    assert!(h.controller.snapshot().has_track);
    assert!(h.engine.enabled_calls().is_empty());
    assert_eq!(h.ui.last_mute_label(), Some("Mute"));

    // the published track is now the one toggled
    assert!(h.controller.toggle_mute().await);
    assert_eq!(h.engine.enabled_calls(), vec![false]);
}
