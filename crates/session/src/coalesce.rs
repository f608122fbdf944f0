//! Control-message coalescing (§4.5): between frames, drain everything
//! pending non-blockingly. Non-control messages are handled in arrival
//! order; among consecutive `control` messages, only the most recent
//! survives.

use crate::event::SessionEvent;
use tokio::sync::mpsc::UnboundedReceiver;

/// Pulls every event currently buffered in `rx` without waiting for more.
pub fn try_drain_all(rx: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = rx.try_recv() {
        drained.push(event);
    }
    drained
}

/// Applies the coalescing rule to an already-drained batch. Pure and
/// order-preserving except that a run of consecutive `Control` events
/// collapses to its last member.
pub fn coalesce(events: Vec<SessionEvent>) -> Vec<SessionEvent> {
    let mut result: Vec<SessionEvent> = Vec::with_capacity(events.len());
    for event in events {
        if event.is_control() && matches!(result.last(), Some(last) if last.is_control()) {
            result.pop();
        }
        result.push(event);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use wg_core::ControlInput;

    fn control(ts: i64) -> SessionEvent {
        SessionEvent::Control(ControlInput::new(vec![], 0.0, 0.0, ts))
    }

    #[test]
    fn consecutive_controls_collapse_to_the_last() {
        let events = vec![control(1), control(2), control(3)];
        let result = coalesce(events);
        assert_eq!(result.len(), 1);
        match &result[0] {
            SessionEvent::Control(input) => assert_eq!(input.client_ts, 3),
            _ => panic!("expected control"),
        }
    }

    #[test]
    fn non_control_events_interrupt_coalescing_and_keep_order() {
        let events = vec![control(1), control(2), SessionEvent::Pause, control(3), control(4)];
        let result = coalesce(events);
        assert_eq!(result.len(), 3);
        assert!(matches!(result[0], SessionEvent::Control(_)));
        assert!(matches!(result[1], SessionEvent::Pause));
        assert!(matches!(result[2], SessionEvent::Control(_)));
        match &result[0] {
            SessionEvent::Control(input) => assert_eq!(input.client_ts, 2),
            _ => unreachable!(),
        }
        match &result[2] {
            SessionEvent::Control(input) => assert_eq!(input.client_ts, 4),
            _ => unreachable!(),
        }
    }

    #[test]
    fn empty_batch_stays_empty() {
        assert!(coalesce(Vec::new()).is_empty());
    }
}
