//! Property-based tests for the dispatcher
//!
//! These tests verify key invariants hold across arbitrary interleavings of
//! submissions, resolutions and cancellation.

use super::*;
use crate::message::MessageStatus;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Submit(String),
    Succeed(String),
    Fail,
    /// Resolution for a request that was never issued
    Stray,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => "[a-zA-Z ]{1,20}".prop_map(Op::Submit),
        2 => "[a-zA-Z ]{0,20}".prop_map(Op::Succeed),
        1 => Just(Op::Fail),
        1 => Just(Op::Stray),
    ]
}

fn arb_state() -> impl Strategy<Value = DispatchState> {
    prop_oneof![
        Just(DispatchState::Idle),
        Just(()).prop_map(|()| DispatchState::Sending {
            placeholder: MessageId::new()
        }),
    ]
}

fn event_for(op: &Op, dispatcher: &ReplyDispatcher) -> Option<Event> {
    match op {
        Op::Submit(text) => Some(Event::submit(text.clone())),
        Op::Succeed(text) => dispatcher
            .state()
            .outstanding()
            .map(|placeholder| Event::ReplyReceived {
                placeholder,
                text: text.clone(),
            }),
        Op::Fail => dispatcher
            .state()
            .outstanding()
            .map(|placeholder| Event::ReplyFailed {
                placeholder,
                reason: "boom".to_string(),
            }),
        Op::Stray => Some(Event::ReplyReceived {
            placeholder: MessageId::new(),
            text: "stray".to_string(),
        }),
    }
}

fn step(
    dispatcher: &mut ReplyDispatcher,
    session: &SessionId,
    store: &mut MessageStore,
    event: Event,
) -> Result<Applied, DispatchError> {
    match event {
        Event::Submit { user, .. } => dispatcher.submit(session, store, user.text),
        other => dispatcher.resolve(session, store, other),
    }
}

proptest! {
    #[test]
    fn prop_at_most_one_pending_placeholder(ops in proptest::collection::vec(arb_op(), 1..50)) {
        let session = SessionId::new();
        let mut store = MessageStore::new();
        let mut dispatcher = ReplyDispatcher::new();

        for op in &ops {
            if let Some(event) = event_for(op, &dispatcher) {
                let _ = step(&mut dispatcher, &session, &mut store, event);
            }

            prop_assert!(store.pending_count() <= 1);
            prop_assert_eq!(dispatcher.is_sending(), store.pending_count() == 1);
            if let Some(placeholder) = dispatcher.state().outstanding() {
                prop_assert_eq!(
                    store.get(placeholder).map(|m| m.status),
                    Some(MessageStatus::Pending)
                );
            }
        }
    }

    #[test]
    fn prop_store_only_grows_at_the_end(ops in proptest::collection::vec(arb_op(), 1..50)) {
        let session = SessionId::new();
        let mut store = MessageStore::new();
        let mut dispatcher = ReplyDispatcher::new();

        for op in &ops {
            let before: Vec<MessageId> = store.snapshot().iter().map(|m| m.id).collect();
            if let Some(event) = event_for(op, &dispatcher) {
                let _ = step(&mut dispatcher, &session, &mut store, event);
            }
            let after: Vec<MessageId> = store.snapshot().iter().map(|m| m.id).collect();
            prop_assert!(after.starts_with(&before));
        }
    }

    #[test]
    fn prop_rejected_events_change_nothing(ops in proptest::collection::vec(arb_op(), 1..50)) {
        let session = SessionId::new();
        let mut store = MessageStore::new();
        let mut dispatcher = ReplyDispatcher::new();

        for op in &ops {
            let Some(event) = event_for(op, &dispatcher) else { continue };
            let state = dispatcher.state();
            let snapshot = store.snapshot();

            let result = step(&mut dispatcher, &session, &mut store, event);

            if result.is_err() {
                prop_assert_eq!(dispatcher.state(), state);
                let after = store.snapshot();
                prop_assert_eq!(after, snapshot);
            }
        }
    }

    #[test]
    fn prop_submit_only_accepted_when_idle(state in arb_state(), text in "[a-z]{1,10}") {
        let result = transition(&state, Event::submit(text));
        match state {
            DispatchState::Idle => {
                let result = result.unwrap();
                prop_assert!(result.new_state.is_sending());
                prop_assert_eq!(result.effects.len(), 3);
            }
            DispatchState::Sending { .. } => {
                prop_assert!(matches!(result, Err(TransitionError::RequestInFlight)));
            }
        }
    }

    #[test]
    fn prop_resolution_always_returns_to_idle(text in "[a-zA-Z ]{0,30}", success in any::<bool>()) {
        let placeholder = MessageId::new();
        let state = DispatchState::Sending { placeholder };
        let event = if success {
            Event::ReplyReceived { placeholder, text }
        } else {
            Event::ReplyFailed { placeholder, reason: text }
        };

        let result = transition(&state, event).unwrap();
        prop_assert_eq!(result.new_state, DispatchState::Idle);
        let is_terminal_resolve = matches!(
            &result.effects[..],
            [Effect::Resolve { status, .. }] if status.is_terminal()
        );
        prop_assert!(is_terminal_resolve);
    }
}
