//! Keyed one-shot deadlines driven by the main loop

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Periodic probe/subscription re-assert
    Reassert,
    /// Re-handshake after a session load
    SessionReload,
    /// Re-query the session list after a save
    SessionList,
}

/// At most one pending deadline per kind
#[derive(Debug, Default)]
pub struct Timers {
    deadlines: HashMap<TimerKind, Instant>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` at `now + after`, replacing any pending deadline
    pub fn schedule(&mut self, kind: TimerKind, now: Instant, after: Duration) {
        self.deadlines.insert(kind, now + after);
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.deadlines.remove(&kind);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return every kind whose deadline has passed, earliest first
    pub fn due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut due: Vec<(Instant, TimerKind)> = self
            .deadlines
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(kind, at)| (*at, *kind))
            .collect();
        due.sort_by_key(|(at, _)| *at);
        for (_, kind) in &due {
            self.deadlines.remove(kind);
        }
        due.into_iter().map(|(_, kind)| kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reschedule_replaces() {
        let mut timers = Timers::new();
        let t0 = Instant::now();

        timers.schedule(TimerKind::Reassert, t0, Duration::from_millis(100));
        timers.schedule(TimerKind::Reassert, t0, Duration::from_millis(500));

        assert!(timers.due(t0 + Duration::from_millis(200)).is_empty());
        assert_eq!(
            timers.due(t0 + Duration::from_millis(500)),
            vec![TimerKind::Reassert]
        );
        assert_eq!(timers.next_deadline(), None);
    }

    #[test]
    fn test_due_in_deadline_order() {
        let mut timers = Timers::new();
        let t0 = Instant::now();

        timers.schedule(TimerKind::SessionList, t0, Duration::from_millis(20));
        timers.schedule(TimerKind::Reassert, t0, Duration::from_millis(10));

        assert_eq!(timers.next_deadline(), Some(t0 + Duration::from_millis(10)));
        assert_eq!(
            timers.due(t0 + Duration::from_millis(30)),
            vec![TimerKind::Reassert, TimerKind::SessionList]
        );
        assert_eq!(timers.next_deadline(), None);
    }

    #[test]
    fn test_cancel() {
        let mut timers = Timers::new();
        let t0 = Instant::now();
        timers.schedule(TimerKind::SessionReload, t0, Duration::ZERO);
        timers.cancel(TimerKind::SessionReload);

        assert!(timers.due(t0).is_empty());
    }
}
