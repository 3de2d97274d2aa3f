//! Relative encoder easing
//!
//! The APC knobs emit a burst of small relative ticks per detent and jitter when
//! turned slowly. Ticks are accumulated per knob and only let through once the
//! accumulated travel reaches the step threshold.

use crate::midi::relative_tick;
use std::collections::HashMap;

/// Default number of ticks before a delta is emitted
pub const DEFAULT_STEPS: i32 = 3;
/// Threshold used while the shift modifier is held (coarser, slower)
pub const DEFAULT_STEPS_SHIFTED: i32 = 8;

/// Per-knob accumulating decoder for 7-bit relative encoders
#[derive(Debug, Clone)]
pub struct KnobDecoder {
    steps_normal: i32,
    steps_shifted: i32,
    // Signed travel accumulated per knob since the last emitted delta
    ease: HashMap<u8, i32>,
}

impl KnobDecoder {
    pub fn new(steps_normal: i32, steps_shifted: i32) -> Self {
        Self {
            steps_normal: steps_normal.max(1),
            steps_shifted: steps_shifted.max(1),
            ease: HashMap::new(),
        }
    }

    /// Update thresholds (config hot reload); accumulators are kept
    pub fn set_steps(&mut self, steps_normal: i32, steps_shifted: i32) {
        self.steps_normal = steps_normal.max(1);
        self.steps_shifted = steps_shifted.max(1);
    }

    /// Feed one raw tick for `knob`
    ///
    /// Returns the raw tick delta once the accumulated travel reaches the
    /// threshold, `None` while still under it. A tick against the current
    /// direction discards the accumulated travel first.
    pub fn feed(&mut self, knob: u8, raw_tick: u8, accelerated: bool) -> Option<i32> {
        let delta = relative_tick(raw_tick);
        let steps = if accelerated {
            self.steps_shifted
        } else {
            self.steps_normal
        };

        let count = self.ease.entry(knob).or_insert(0);
        if (delta < 0 && *count > 0) || (delta > 0 && *count < 0) {
            *count = 0;
        }
        *count += delta;

        if count.abs() < steps {
            return None;
        }

        *count = 0;
        Some(delta)
    }

    /// Current accumulated travel for a knob
    pub fn pending(&self, knob: u8) -> i32 {
        self.ease.get(&knob).copied().unwrap_or(0)
    }
}

impl Default for KnobDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_STEPS, DEFAULT_STEPS_SHIFTED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tick(delta: i32) -> u8 {
        if delta < 0 {
            (delta + 128) as u8
        } else {
            delta as u8
        }
    }

    #[test]
    fn test_emits_raw_delta_at_threshold() {
        let mut knobs = KnobDecoder::default();

        assert_eq!(knobs.feed(48, tick(2), false), None);
        assert_eq!(knobs.pending(48), 2);

        // 4 >= 3: the raw tick (not the accumulator) comes out
        assert_eq!(knobs.feed(48, tick(2), false), Some(2));
        assert_eq!(knobs.pending(48), 0);
    }

    #[test]
    fn test_direction_reversal_resets_accumulator() {
        let mut knobs = KnobDecoder::default();

        assert_eq!(knobs.feed(48, tick(1), false), None);
        assert_eq!(knobs.feed(48, tick(1), false), None);
        assert_eq!(knobs.pending(48), 2);

        assert_eq!(knobs.feed(48, tick(-1), false), None);
        assert_eq!(knobs.pending(48), -1);
    }

    #[test]
    fn test_shift_widens_threshold() {
        let mut knobs = KnobDecoder::default();

        for _ in 0..7 {
            assert_eq!(knobs.feed(50, tick(1), true), None);
        }
        assert_eq!(knobs.feed(50, tick(1), true), Some(1));
    }

    #[test]
    fn test_knobs_are_independent() {
        let mut knobs = KnobDecoder::default();

        knobs.feed(48, tick(2), false);
        assert_eq!(knobs.feed(49, tick(2), false), None);
        assert_eq!(knobs.pending(48), 2);
        assert_eq!(knobs.pending(49), 2);
    }

    proptest! {
        #[test]
        fn prop_same_sign_run_emits_once(steps in 1i32..8, ticks in prop::collection::vec(1i32..4, 1..12)) {
            let mut knobs = KnobDecoder::new(steps, 8);
            let mut emitted = 0;
            let mut travel = 0;
            for t in &ticks {
                travel += t;
                match knobs.feed(48, tick(*t), false) {
                    Some(delta) => {
                        prop_assert_eq!(delta, *t);
                        prop_assert!(travel >= steps);
                        prop_assert_eq!(knobs.pending(48), 0);
                        emitted += 1;
                        travel = 0;
                    }
                    None => prop_assert!(travel < steps),
                }
            }
            prop_assert!(emitted <= ticks.len());
        }
    }
}
