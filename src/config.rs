use crate::error::ConfigError;
use std::time::Duration;

/// Timing knobs for the session engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Period of the global scheduler tick. Default: 100ms.
    pub tick_period: Duration,
    /// Grace window for the first reply before an inactivity forfeit. Default: 20s.
    pub inactivity_threshold: Duration,
    /// Shortest bot thinking time. Default: 500ms.
    pub bot_min_delay: Duration,
    /// Random extra thinking time on top of `bot_min_delay`. Default: 1500ms.
    pub bot_jitter: Duration,
    /// How long the bot takes to answer a draw offer. Default: 1s.
    pub draw_response_delay: Duration,
    /// Chance that the bot accepts a draw offer, in `[0, 1]`. Default: 0.5.
    pub draw_acceptance: f64,
    /// Most boards the pool holds at once. Default: 64.
    pub max_boards: usize,
    /// Fixed seed for bot randomness; entropy when absent.
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(100),
            inactivity_threshold: Duration::from_secs(20),
            bot_min_delay: Duration::from_millis(500),
            bot_jitter: Duration::from_millis(1500),
            draw_response_delay: Duration::from_millis(1000),
            draw_acceptance: 0.5,
            max_boards: 64,
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    /// Reads `SIMUL_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let tick_period = millis(&lookup, "SIMUL_TICK_MS", defaults.tick_period)?;
        if tick_period.is_zero() {
            return Err(ConfigError::NotPositive {
                key: "SIMUL_TICK_MS",
            });
        }

        let max_boards = match lookup("SIMUL_MAX_BOARDS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "SIMUL_MAX_BOARDS",
                value: raw,
            })?,
            None => defaults.max_boards,
        };
        if max_boards == 0 {
            return Err(ConfigError::NotPositive {
                key: "SIMUL_MAX_BOARDS",
            });
        }

        let draw_acceptance = match lookup("SIMUL_DRAW_ACCEPT") {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(p) if (0.0..=1.0).contains(&p) => p,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "SIMUL_DRAW_ACCEPT",
                        value: raw,
                    })
                }
            },
            None => defaults.draw_acceptance,
        };

        let rng_seed = match lookup("SIMUL_RNG_SEED") {
            Some(raw) => Some(raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "SIMUL_RNG_SEED",
                value: raw,
            })?),
            None => None,
        };

        Ok(Self {
            tick_period,
            inactivity_threshold: millis(
                &lookup,
                "SIMUL_INACTIVITY_MS",
                defaults.inactivity_threshold,
            )?,
            bot_min_delay: millis(&lookup, "SIMUL_BOT_MIN_DELAY_MS", defaults.bot_min_delay)?,
            bot_jitter: millis(&lookup, "SIMUL_BOT_JITTER_MS", defaults.bot_jitter)?,
            draw_response_delay: millis(
                &lookup,
                "SIMUL_DRAW_DELAY_MS",
                defaults.draw_response_delay,
            )?,
            draw_acceptance,
            max_boards,
            rng_seed,
        })
    }
}

fn millis<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(default),
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        match std::env::var("SIMUL_BIND") {
            Ok(bind_addr) if !bind_addr.trim().is_empty() => Self { bind_addr },
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = EngineConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.tick_period, Duration::from_millis(100));
        assert_eq!(config.inactivity_threshold, Duration::from_secs(20));
    }

    #[test]
    fn overrides_are_parsed_as_millis() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("SIMUL_TICK_MS", "10"),
            ("SIMUL_BOT_JITTER_MS", " 0 "),
            ("SIMUL_RNG_SEED", "42"),
        ]))
        .unwrap();
        assert_eq!(config.tick_period, Duration::from_millis(10));
        assert_eq!(config.bot_jitter, Duration::ZERO);
        assert_eq!(config.rng_seed, Some(42));
        assert_eq!(config.bot_min_delay, Duration::from_millis(500));
    }

    #[test]
    fn garbage_values_are_rejected() {
        let err = EngineConfig::from_lookup(lookup_from(&[("SIMUL_INACTIVITY_MS", "soon")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "SIMUL_INACTIVITY_MS",
                value: "soon".to_string()
            }
        );

        let err = EngineConfig::from_lookup(lookup_from(&[("SIMUL_TICK_MS", "0")])).unwrap_err();
        assert_eq!(err, ConfigError::NotPositive { key: "SIMUL_TICK_MS" });
    }

    #[test]
    fn board_limit_and_draw_acceptance() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("SIMUL_MAX_BOARDS", "12"),
            ("SIMUL_DRAW_ACCEPT", "1"),
        ]))
        .unwrap();
        assert_eq!(config.max_boards, 12);
        assert_eq!(config.draw_acceptance, 1.0);

        let err =
            EngineConfig::from_lookup(lookup_from(&[("SIMUL_MAX_BOARDS", "0")])).unwrap_err();
        assert_eq!(err, ConfigError::NotPositive { key: "SIMUL_MAX_BOARDS" });

        let err =
            EngineConfig::from_lookup(lookup_from(&[("SIMUL_DRAW_ACCEPT", "1.5")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "SIMUL_DRAW_ACCEPT",
                value: "1.5".to_string()
            }
        );
    }
}
