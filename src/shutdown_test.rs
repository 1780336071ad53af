use super::*;
use serial_test::serial;

#[test]
#[serial]
fn test_shutdown_flag_transitions() {
    reset_for_test();

    // Initially not shutting down
    assert!(!is_shutting_down());

    // After signal, should be shutting down
    signal_shutdown();
    assert!(is_shutting_down());

    // Should remain true
    assert!(is_shutting_down());

    reset_for_test();
}

#[test]
#[serial]
fn test_replay_stops_between_actions_after_shutdown() {
    use crate::replay::{run_plan, ReplayError, ReplayPlan, ReplayTimings};
    use crate::shortcuts::Action;
    use crate::test_support::RecordingFactory;

    reset_for_test();
    let factory = RecordingFactory::new();
    let mut output = factory.output();
    let plan = ReplayPlan::new(vec![
        Action::Type {
            text: "first".to_string(),
        },
        Action::Type {
            text: "second".to_string(),
        },
    ]);

    signal_shutdown();
    let result = run_plan(&mut output, &plan, &ReplayTimings::immediate());
    reset_for_test();

    assert_eq!(result, Err(ReplayError::ShuttingDown));
    assert!(factory.calls().is_empty(), "no action may start after shutdown");
}

#[tokio::test]
#[serial]
async fn test_consumer_exits_on_shutdown() {
    use crate::popup::{channel, run_consumer, PopupEmitter, PopupEvent};
    use crate::test_support::CapturingDispatcher;
    use std::sync::Arc;

    reset_for_test();
    let (emitter, receiver) = channel();
    let dispatcher = Arc::new(CapturingDispatcher::default());
    let consumer = tokio::spawn(run_consumer(receiver, dispatcher.clone()));

    signal_shutdown();
    emitter.emit(PopupEvent::InsertText {
        text: "late".to_string(),
        backspaces: 3,
    });

    tokio::time::timeout(std::time::Duration::from_secs(2), consumer)
        .await
        .expect("consumer should stop")
        .unwrap();
    reset_for_test();

    assert!(dispatcher.plans().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn test_queued_replay_skips_erase_after_shutdown() {
    use crate::replay::{ReplayEngine, ReplayError, ReplayPlan, ReplayTimings};
    use crate::shortcuts::Action;
    use crate::test_support::RecordingFactory;
    use std::sync::Arc;
    use std::time::Duration;

    reset_for_test();
    let factory = Arc::new(RecordingFactory::new());
    let engine = ReplayEngine::new(
        factory.clone(),
        ReplayTimings::immediate(),
        1,
        tokio::runtime::Handle::current(),
    );

    let running = engine.execute(vec![Action::Sleep { ms: 200 }]);
    tokio::time::sleep(Duration::from_millis(30)).await;
    let queued = engine.execute_plan(ReplayPlan::replace_text(3, "late"));
    tokio::time::sleep(Duration::from_millis(30)).await;

    signal_shutdown();
    let _ = running.await.unwrap();
    let result = queued.await.unwrap();
    reset_for_test();

    assert_eq!(result, Err(ReplayError::ShuttingDown));
    assert!(factory.calls().is_empty(), "queued plan must not erase");
}
