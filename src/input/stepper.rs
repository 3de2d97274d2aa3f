//! Wrap-around stepping over an inclusive integer range

/// Advance `current` by one, wrapping from `high` back to `low` (both inclusive)
///
/// Negative bounds are fine: `cycle(-3, 1, 1) == -3`.
pub fn cycle(low: i32, high: i32, current: i32) -> i32 {
    if high <= low {
        return low;
    }
    let span = high - low + 1;
    (current + 1 - low).rem_euclid(span) + low
}
