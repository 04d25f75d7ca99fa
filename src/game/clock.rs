use serde::Serialize;
use std::time::Instant;

use crate::models::Side;

/// Per-side remaining time with a Fischer increment.
///
/// Only the side to move loses time, and remaining time never drops below zero.
#[derive(Debug, Clone)]
pub struct Clock {
    remaining_white_ms: i64,
    remaining_black_ms: i64,
    increment_ms: i64,
    last_tick_at: Instant,
}

/// Remaining time as shown to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClockReading {
    pub white_ms: i64,
    pub black_ms: i64,
    pub increment_ms: i64,
}

impl Clock {
    pub fn new(initial_ms: i64, increment_ms: i64, now: Instant) -> Self {
        let initial_ms = initial_ms.max(0);
        Self {
            remaining_white_ms: initial_ms,
            remaining_black_ms: initial_ms,
            increment_ms: increment_ms.max(0),
            last_tick_at: now,
        }
    }

    pub fn remaining(&self, side: Side) -> i64 {
        match side {
            Side::White => self.remaining_white_ms,
            Side::Black => self.remaining_black_ms,
        }
    }

    pub fn increment_ms(&self) -> i64 {
        self.increment_ms
    }

    pub fn last_tick_at(&self) -> Instant {
        self.last_tick_at
    }

    pub fn reading(&self) -> ClockReading {
        ClockReading {
            white_ms: self.remaining_white_ms,
            black_ms: self.remaining_black_ms,
            increment_ms: self.increment_ms,
        }
    }

    /// Charges the time elapsed since the previous tick to `to_move`.
    ///
    /// Returns true when `to_move` has no time left. A `now` older than the
    /// previous tick charges nothing.
    pub fn tick(&mut self, now: Instant, to_move: Side) -> bool {
        let elapsed = now.saturating_duration_since(self.last_tick_at);
        let elapsed_ms = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);
        self.last_tick_at = self.last_tick_at.max(now);

        let remaining = self.remaining_mut(to_move);
        *remaining = remaining.saturating_sub(elapsed_ms).max(0);
        *remaining == 0
    }

    /// Credits the increment to the side that just completed a move.
    pub fn apply_increment(&mut self, side: Side) {
        let increment = self.increment_ms;
        let remaining = self.remaining_mut(side);
        *remaining = remaining.saturating_add(increment);
    }

    fn remaining_mut(&mut self, side: Side) -> &mut i64 {
        match side {
            Side::White => &mut self.remaining_white_ms,
            Side::Black => &mut self.remaining_black_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn only_the_side_to_move_is_charged() {
        let t0 = Instant::now();
        let mut clock = Clock::new(60_000, 0, t0);
        assert!(!clock.tick(t0 + Duration::from_millis(1_500), Side::White));
        assert_eq!(clock.remaining(Side::White), 58_500);
        assert_eq!(clock.remaining(Side::Black), 60_000);

        assert!(!clock.tick(t0 + Duration::from_millis(2_000), Side::Black));
        assert_eq!(clock.remaining(Side::White), 58_500);
        assert_eq!(clock.remaining(Side::Black), 59_500);
    }

    #[test]
    fn clamps_at_zero_and_signals_timeout() {
        let t0 = Instant::now();
        let mut clock = Clock::new(60, 0, t0);
        assert!(clock.tick(t0 + Duration::from_millis(100), Side::White));
        assert_eq!(clock.remaining(Side::White), 0);

        // Further ticks keep reporting the flag without going negative.
        assert!(clock.tick(t0 + Duration::from_millis(500), Side::White));
        assert_eq!(clock.remaining(Side::White), 0);
    }

    #[test]
    fn stale_tick_charges_nothing() {
        let t0 = Instant::now();
        let mut clock = Clock::new(1_000, 0, t0 + Duration::from_millis(200));
        assert!(!clock.tick(t0, Side::White));
        assert_eq!(clock.remaining(Side::White), 1_000);
        assert_eq!(clock.last_tick_at(), t0 + Duration::from_millis(200));
    }

    #[test]
    fn increment_goes_to_the_named_side_only() {
        let t0 = Instant::now();
        let mut clock = Clock::new(10_000, 2_000, t0);
        clock.apply_increment(Side::Black);
        assert_eq!(clock.remaining(Side::Black), 12_000);
        assert_eq!(clock.remaining(Side::White), 10_000);
        assert_eq!(
            clock.reading(),
            ClockReading {
                white_ms: 10_000,
                black_ms: 12_000,
                increment_ms: 2_000
            }
        );
    }
}
