use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::game::oracle::OracleMove;

/// Random-mover opponent with a human-looking thinking delay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotAgent {
    min_delay: Duration,
    jitter: Duration,
    draw_acceptance: f64,
}

impl BotAgent {
    pub const fn new(min_delay: Duration, jitter: Duration) -> Self {
        Self {
            min_delay,
            jitter,
            draw_acceptance: 0.5,
        }
    }

    /// Probability of accepting a draw offer, clamped to `[0, 1]`.
    pub fn with_draw_acceptance(mut self, probability: f64) -> Self {
        self.draw_acceptance = if probability.is_nan() {
            0.5
        } else {
            probability.clamp(0.0, 1.0)
        };
        self
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.bot_min_delay, config.bot_jitter)
            .with_draw_acceptance(config.draw_acceptance)
    }

    /// Uniform in `[min_delay, min_delay + jitter]`, millisecond resolution.
    pub fn think_time<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        self.min_delay + Duration::from_millis(rng.gen_range(0..=jitter_ms))
    }

    pub fn pick<'a, R: Rng + ?Sized>(
        &self,
        legal: &'a [OracleMove],
        rng: &mut R,
    ) -> Option<&'a OracleMove> {
        legal.choose(rng)
    }

    /// Coin flip on a draw offer, weighted by the configured acceptance.
    pub fn accepts_draw<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen_bool(self.draw_acceptance)
    }
}

impl Default for BotAgent {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
