//! Tap/hold latch for dual-purpose buttons
//!
//! A quick tap turns the latch on and leaves it on; pressing again turns it off.
//! A press held past the hold window behaves like a momentary button: the
//! release clears it.

use crate::midi::EventKind;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default tap window
pub const DEFAULT_HOLD_MS: u64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LatchError {
    #[error("latch button {button} fed a {kind:?} event (expected press or release)")]
    InvalidEventKind { button: u8, kind: EventKind },
}

/// Latch state per button, keyed by note number
#[derive(Debug, Clone)]
pub struct LatchDetector {
    hold: Duration,
    // Press instant of every currently latched button
    latched: HashMap<u8, Instant>,
}

impl LatchDetector {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            latched: HashMap::new(),
        }
    }

    pub fn set_hold(&mut self, hold: Duration) {
        self.hold = hold;
    }

    /// Feed a press or release; returns whether the button is latched afterwards
    pub fn feed(&mut self, button: u8, kind: EventKind, now: Instant) -> Result<bool, LatchError> {
        match kind {
            EventKind::Press => {
                if self.latched.remove(&button).is_some() {
                    return Ok(false);
                }
                self.latched.insert(button, now);
                Ok(true)
            }
            EventKind::Release => {
                let pressed_at = match self.latched.get(&button) {
                    Some(ts) => *ts,
                    None => return Ok(false),
                };
                if now.saturating_duration_since(pressed_at) < self.hold {
                    return Ok(true);
                }
                self.latched.remove(&button);
                Ok(false)
            }
            EventKind::Control => Err(LatchError::InvalidEventKind { button, kind }),
        }
    }

    pub fn is_latched(&self, button: u8) -> bool {
        self.latched.contains_key(&button)
    }
}

impl Default for LatchDetector {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_HOLD_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_press_unlatches() {
        let mut latch = LatchDetector::default();
        let t0 = Instant::now();

        assert_eq!(latch.feed(1, EventKind::Press, t0), Ok(true));
        assert_eq!(latch.feed(1, EventKind::Press, t0 + Duration::from_millis(50)), Ok(false));
        assert!(!latch.is_latched(1));
    }

    #[test]
    fn test_quick_release_keeps_latch() {
        let mut latch = LatchDetector::default();
        let t0 = Instant::now();

        latch.feed(1, EventKind::Press, t0).unwrap();
        assert_eq!(latch.feed(1, EventKind::Release, t0 + Duration::from_millis(120)), Ok(true));
        assert!(latch.is_latched(1));
    }

    #[test]
    fn test_held_release_clears_latch() {
        let mut latch = LatchDetector::default();
        let t0 = Instant::now();

        latch.feed(1, EventKind::Press, t0).unwrap();
        assert_eq!(latch.feed(1, EventKind::Release, t0 + Duration::from_millis(300)), Ok(false));
        assert!(!latch.is_latched(1));
    }

    #[test]
    fn test_release_without_press() {
        let mut latch = LatchDetector::default();

        assert_eq!(latch.feed(7, EventKind::Release, Instant::now()), Ok(false));
    }

    #[test]
    fn test_control_event_fails_fast() {
        let mut latch = LatchDetector::default();

        assert_eq!(
            latch.feed(85, EventKind::Control, Instant::now()),
            Err(LatchError::InvalidEventKind {
                button: 85,
                kind: EventKind::Control
            })
        );
    }
}
