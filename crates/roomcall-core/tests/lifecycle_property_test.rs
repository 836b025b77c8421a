//! Random join/leave/cleanup sequences against the loopback SDK

mod common;

use common::Harness;
use proptest::prelude::*;
use roomcall_core::ConnectionState;
use roomcall_core::sdk::SdkError;

#[derive(Debug, Clone)]
enum Op {
    Join,
    Leave,
    Cleanup,
    ToggleMute,
    FailJoin,
    FailMicrophone,
    FailPublish,
    FailLeave,
    ClearFaults,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Join),
        2 => Just(Op::Leave),
        2 => Just(Op::Cleanup),
        1 => Just(Op::ToggleMute),
        1 => Just(Op::FailJoin),
        1 => Just(Op::FailMicrophone),
        1 => Just(Op::FailPublish),
        1 => Just(Op::FailLeave),
        2 => Just(Op::ClearFaults),
    ]
}

async fn run(ops: Vec<Op>) {
    let h = Harness::new();

    for op in ops {
        match op {
            Op::Join => match h.controller.join("alice", "room1").await {
                Ok(joined) => {
                    let snapshot = h.controller.snapshot();
                    assert_eq!(snapshot.state, ConnectionState::Connected);
                    assert!(snapshot.has_track);
                    assert_eq!(snapshot.muted, joined.muted);
                }
                Err(_) => {
                    assert!(h.controller.snapshot().is_released());
                    assert!(h.engine.all_tracks_released());
                }
            },
            Op::Leave => {
                // a failing SDK leave still ends released
                let _ = h.controller.leave().await;
                assert!(h.controller.snapshot().is_released());
                assert!(h.engine.all_tracks_released());
            }
            Op::Cleanup => {
                h.controller.cleanup().await;
                assert!(h.controller.snapshot().is_released());
                assert!(h.engine.all_tracks_released());
            }
            Op::ToggleMute => {
                let muted = h.controller.toggle_mute().await;
                assert_eq!(muted, h.controller.is_muted());
            }
            Op::FailJoin => h.engine.fail_join(SdkError::new("CAN_NOT_GET_GATEWAY_SERVER", "down")),
            Op::FailMicrophone => {
                h.engine.fail_microphone(SdkError::new("NOT_READABLE", "device busy"))
            }
            Op::FailPublish => h.engine.fail_publish(SdkError::new("PUBLISH_FAILED", "rejected")),
            Op::FailLeave => h.engine.fail_leave(SdkError::new("LEAVE_FAILED", "timeout")),
            Op::ClearFaults => h.engine.clear_faults(),
        }
    }

    h.engine.clear_faults();
    h.controller.cleanup().await;
    assert!(h.controller.snapshot().is_released());
    assert!(h.engine.all_tracks_released());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_any_op_sequence_ends_released(ops in proptest::collection::vec(op(), 1..24)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(run(ops));
    }
}
