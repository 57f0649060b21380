use history::{CoalescingHistory, History, ManualClock, MAX_HISTORY_SIZE};
use settings::GenerationSettings;
use std::time::Duration;

fn settings_with_steps(steps: u32) -> GenerationSettings {
    GenerationSettings {
        steps,
        ..Default::default()
    }
}

#[test]
fn undo_then_redo_round_trips() {
    let initial = settings_with_steps(1);
    let mut history = History::new(initial.clone());
    for steps in 2..=11 {
        history.commit(settings_with_steps(steps));
    }
    assert!(history.can_undo());

    for _ in 0..10 {
        assert!(history.undo());
    }
    assert_eq!(history.present(), &initial);
    assert!(!history.can_undo());

    for _ in 0..10 {
        assert!(history.redo());
    }
    assert_eq!(history.present().steps, 11);
    assert!(!history.can_redo());
}

#[test]
fn identical_commit_never_changes_size() {
    let mut history = History::new(settings_with_steps(20));
    history.commit(settings_with_steps(30));
    let size = history.size();

    // structurally equal, separately constructed
    assert!(!history.commit(settings_with_steps(30)));
    assert_eq!(history.size(), size);
}

#[test]
fn capacity_bounds_size_and_drops_oldest() {
    let mut history = History::new(settings_with_steps(0));
    for steps in 1..=40 {
        history.commit(settings_with_steps(steps));
        assert!(history.size() <= MAX_HISTORY_SIZE + 1);
    }
    assert_eq!(history.undo_len(), MAX_HISTORY_SIZE);

    while history.undo() {}
    // 40 commits, 25 kept: the oldest reachable value is steps = 15
    assert_eq!(history.present().steps, 15);
}

#[test]
fn commit_after_undo_invalidates_redo() {
    let mut history = History::new(settings_with_steps(0));
    history.commit(settings_with_steps(1));
    history.commit(settings_with_steps(2));
    history.commit(settings_with_steps(3));

    history.undo();
    assert_eq!(history.present().steps, 2);
    assert_eq!(history.redo_len(), 1);

    history.commit(settings_with_steps(4));
    assert!(!history.can_redo());
    assert_eq!(
        history.past().map(|s| s.steps).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[test]
fn history_state_serializes() {
    let mut history = History::new(settings_with_steps(10));
    history.commit(settings_with_steps(12));
    history.undo();

    let json = serde_json::to_string(&history).unwrap();
    let restored: History<GenerationSettings> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, history);
    assert!(restored.can_redo());
}

#[test]
fn stored_history_is_trimmed_to_capacity() {
    let restored: History<u32> =
        serde_json::from_str(r#"{"past":[1,2,3,4],"present":5,"future":[6,7,8],"capacity":2}"#)
            .unwrap();
    assert_eq!(restored.capacity(), 2);
    assert_eq!(restored.past().copied().collect::<Vec<_>>(), vec![3, 4]);
    assert_eq!(restored.future().copied().collect::<Vec<_>>(), vec![6, 7]);
    assert_eq!(*restored.present(), 5);
}

#[test]
fn stored_zero_capacity_still_undoes() {
    let mut restored: History<u32> =
        serde_json::from_str(r#"{"past":[],"present":0,"future":[],"capacity":0}"#).unwrap();
    assert_eq!(restored.capacity(), 1);

    restored.commit(1);
    assert!(restored.can_undo());
    assert!(restored.undo());
    assert_eq!(*restored.present(), 0);
}

#[test]
fn stored_history_without_capacity_uses_default() {
    let restored: History<u32> = serde_json::from_str(r#"{"present":7}"#).unwrap();
    assert_eq!(restored.capacity(), MAX_HISTORY_SIZE);
    assert_eq!(restored.size(), 1);
}

#[test]
fn prompt_typing_records_single_entry() {
    let clock = ManualClock::new();
    let mut history = CoalescingHistory::with_clock(
        History::new(GenerationSettings::default()),
        Duration::from_millis(150),
        clock.clone(),
    );

    let mut draft = GenerationSettings::default();
    for ch in "a red fox".chars() {
        draft.prompt.push(ch);
        history.commit(draft.clone());
        clock.advance(Duration::from_millis(30));
        history.poll();
    }
    clock.advance(Duration::from_millis(150));
    assert!(history.poll());

    assert_eq!(history.present().prompt, "a red fox");
    assert_eq!(history.history().undo_len(), 1);
}

#[test]
fn dropping_discards_pending_commit() {
    let clock = ManualClock::new();
    let mut history = CoalescingHistory::with_clock(
        History::new(settings_with_steps(20)),
        Duration::from_millis(150),
        clock,
    );
    history.commit(settings_with_steps(25));
    let recorded = history.into_history();
    assert_eq!(recorded.present().steps, 20);
    assert_eq!(recorded.size(), 1);
}
