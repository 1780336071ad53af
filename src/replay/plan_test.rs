use super::*;
use crate::test_support::{Call, RecordingFactory};
use serial_test::parallel;
use std::time::Instant;

fn run(factory: &RecordingFactory, plan: &ReplayPlan) -> Result<(), ReplayError> {
    let mut output = factory.output();
    run_plan(&mut output, plan, &ReplayTimings::immediate())
}

#[test]
#[parallel]
fn test_drag_order_with_settle_delays() {
    let factory = RecordingFactory::new();
    let timings = ReplayTimings {
        drag_settle_ms: 20,
        ..ReplayTimings::immediate()
    };
    let plan = ReplayPlan::new(vec![Action::Drag {
        x1: 10,
        y1: 10,
        x2: 200,
        y2: 200,
    }]);

    run_plan(&mut factory.output(), &plan, &timings).unwrap();

    let timed = factory.timed_calls();
    let calls: Vec<Call> = timed.iter().map(|(c, _)| c.clone()).collect();
    assert_eq!(
        calls,
        vec![
            Call::Move(10, 10),
            Call::MousePress(MouseButton::Left),
            Call::Move(200, 200),
            Call::MouseRelease(MouseButton::Left),
        ]
    );
    for pair in timed.windows(2) {
        assert!(
            pair[1].1.duration_since(pair[0].1) >= Duration::from_millis(20),
            "missing settle between {:?} and {:?}",
            pair[0].0,
            pair[1].0
        );
    }
}

#[test]
#[parallel]
fn test_click_count_and_button() {
    let factory = RecordingFactory::new();
    let plan = ReplayPlan::new(vec![Action::Click {
        x: 3,
        y: 4,
        button: MouseButton::Middle,
        count: 3,
    }]);

    run(&factory, &plan).unwrap();

    assert_eq!(
        factory.calls(),
        vec![
            Call::Move(3, 4),
            Call::Click(MouseButton::Middle),
            Call::Click(MouseButton::Middle),
            Call::Click(MouseButton::Middle),
        ]
    );
}

#[test]
#[parallel]
fn test_zero_click_count_still_clicks_once() {
    let factory = RecordingFactory::new();
    run(
        &factory,
        &ReplayPlan::new(vec![Action::Click {
            x: 0,
            y: 0,
            button: MouseButton::Left,
            count: 0,
        }]),
    )
    .unwrap();
    assert_eq!(factory.calls().len(), 2);
}

#[test]
#[parallel]
fn test_multiline_text_uses_shift_enter() {
    let factory = RecordingFactory::new();
    run(
        &factory,
        &ReplayPlan::new(vec![Action::Type {
            text: "Dear team,\r\n\nThanks".to_string(),
        }]),
    )
    .unwrap();

    let soft_break = [
        Call::Press(SynthKey::Shift),
        Call::Press(SynthKey::Enter),
        Call::Release(SynthKey::Enter),
        Call::Release(SynthKey::Shift),
    ];
    let mut expected = vec![Call::Type("Dear team,".to_string())];
    expected.extend(soft_break.clone());
    expected.extend(soft_break);
    expected.push(Call::Type("Thanks".to_string()));
    assert_eq!(factory.calls(), expected);
}

#[test]
#[parallel]
fn test_erase_runs_before_actions() {
    let factory = RecordingFactory::new();
    run(&factory, &ReplayPlan::replace_text(2, "ok")).unwrap();

    assert_eq!(
        factory.calls(),
        vec![
            Call::Press(SynthKey::Backspace),
            Call::Release(SynthKey::Backspace),
            Call::Press(SynthKey::Backspace),
            Call::Release(SynthKey::Backspace),
            Call::Type("ok".to_string()),
        ]
    );
}

#[test]
#[parallel]
fn test_failure_aborts_remaining_actions() {
    // Third attempt is rejected: the click of action 1
    let factory = RecordingFactory::failing_at(2);
    let plan = ReplayPlan::new(vec![
        Action::Type {
            text: "a".to_string(),
        },
        Action::Click {
            x: 1,
            y: 1,
            button: MouseButton::Left,
            count: 1,
        },
        Action::Type {
            text: "b".to_string(),
        },
        Action::Type {
            text: "c".to_string(),
        },
    ]);

    let result = run(&factory, &plan);

    assert!(matches!(result, Err(ReplayError::Action { index: 1, .. })), "got {:?}", result);
    assert_eq!(factory.calls(), vec![Call::Type("a".to_string()), Call::Move(1, 1)]);
}

#[test]
#[parallel]
fn test_failed_drag_releases_button() {
    // Third attempt is the move to the drop point
    let factory = RecordingFactory::failing_at(2);
    let plan = ReplayPlan::new(vec![
        Action::Drag {
            x1: 1,
            y1: 2,
            x2: 3,
            y2: 4,
        },
        Action::Type {
            text: "after".to_string(),
        },
    ]);

    let result = run(&factory, &plan);

    assert!(matches!(result, Err(ReplayError::Action { index: 0, .. })), "got {:?}", result);
    assert_eq!(
        factory.calls(),
        vec![
            Call::Move(1, 2),
            Call::MousePress(MouseButton::Left),
            Call::MouseRelease(MouseButton::Left),
        ]
    );
}

#[test]
#[parallel]
fn test_erase_failure_skips_actions() {
    let factory = RecordingFactory::failing_at(0);
    let result = run(&factory, &ReplayPlan::replace_text(3, "never"));

    assert!(matches!(result, Err(ReplayError::Erase(_))));
    assert!(factory.calls().is_empty());
}

#[test]
#[parallel]
fn test_sleep_waits() {
    let factory = RecordingFactory::new();
    let started = Instant::now();
    run(&factory, &ReplayPlan::new(vec![Action::Sleep { ms: 60 }])).unwrap();
    assert!(started.elapsed() >= Duration::from_millis(60));
    assert!(factory.calls().is_empty());
}

#[test]
fn test_default_timings() {
    let timings = ReplayTimings::default();
    assert_eq!(timings.settle_ms, 100);
    assert_eq!(timings.click_interval_ms, 80);
    assert_eq!(timings.inter_action_ms, 50);
}
