use std::time::{Duration, Instant};

/// Forfeits boards that never got going.
///
/// A board with at most one ply played forfeits once nothing has happened on
/// it for longer than the threshold, whatever the clocks say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InactivityMonitor {
    threshold: Duration,
}

impl InactivityMonitor {
    /// Boards with more plies than this are never forfeited for inactivity.
    pub const MAX_PLIES: usize = 1;

    pub const fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    pub const fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn is_forfeit(&self, plies: usize, last_activity_at: Instant, now: Instant) -> bool {
        plies <= Self::MAX_PLIES && now.saturating_duration_since(last_activity_at) > self.threshold
    }
}

impl Default for InactivityMonitor {
    fn default() -> Self {
        Self::new(Duration::from_secs(20))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forfeits_only_early_idle_boards() {
        let monitor = InactivityMonitor::default();
        let t0 = Instant::now();
        let late = t0 + Duration::from_secs(21);

        assert!(monitor.is_forfeit(0, t0, late));
        assert!(monitor.is_forfeit(1, t0, late));
        assert!(!monitor.is_forfeit(2, t0, late));
        assert!(!monitor.is_forfeit(0, t0, t0 + Duration::from_secs(20)));
    }
}
