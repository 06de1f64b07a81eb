//! Voice-net layer configuration.
//!
//! Configuration is loaded from environment variables with documented
//! defaults. The connection mode is deliberately part of this object rather
//! than ambient global state so tests can construct engines deterministically.

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::session::ConnectionMode;

/// Default connection mode when `NET_MODE` is unset.
pub const DEFAULT_MODE: ConnectionMode = ConnectionMode::Sim;

/// Default lower bound for the simulated participant roster (inclusive).
pub const DEFAULT_SIM_PARTICIPANTS_MIN: u8 = 2;

/// Default upper bound for the simulated participant roster (inclusive).
pub const DEFAULT_SIM_PARTICIPANTS_MAX: u8 = 8;

/// Default variance for simulated activity levels, in `0.0..=1.0`.
pub const DEFAULT_SIM_ACTIVITY_VARIANCE: f32 = 0.35;

/// Default presence heartbeat interval in seconds.
pub const DEFAULT_HEARTBEAT_INTERVAL_SECONDS: u64 = 25;

/// Default presence cleanup sweep interval in seconds.
pub const DEFAULT_CLEANUP_INTERVAL_SECONDS: u64 = 60;

/// Default staleness threshold in seconds; older records count as offline.
pub const DEFAULT_PRESENCE_STALENESS_SECONDS: u64 = 120;

/// Default latency above which a joined session reports degraded, in ms.
pub const DEFAULT_LATENCY_DEGRADED_MS: u64 = 250;

/// Default TTL for the cached global connection mode in seconds.
pub const DEFAULT_MODE_CACHE_TTL_SECONDS: u64 = 30;

/// Default bounded wait for the degraded governance read path in ms.
pub const DEFAULT_GOVERNANCE_FALLBACK_TIMEOUT_MS: u64 = 2000;

/// Voice-net layer configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Global connection mode; all rooms obey the same mode.
    pub mode: ConnectionMode,

    /// Inclusive range for simulated roster sizes.
    pub sim_participants_min: u8,
    pub sim_participants_max: u8,

    /// Variance applied to simulated activity levels (`0.0..=1.0`).
    pub sim_activity_variance: f32,

    /// Presence heartbeat interval.
    pub heartbeat_interval: Duration,

    /// Presence cleanup sweep interval.
    pub cleanup_interval: Duration,

    /// Staleness threshold; a record older than this is treated as offline.
    pub presence_staleness: Duration,

    /// Latency threshold for reporting a joined session as degraded.
    pub latency_degraded: Duration,

    /// How long a fetched connection mode stays cached.
    pub mode_cache_ttl: Duration,

    /// Bounded wait for the degraded governance list path.
    pub governance_fallback_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: DEFAULT_MODE,
            sim_participants_min: DEFAULT_SIM_PARTICIPANTS_MIN,
            sim_participants_max: DEFAULT_SIM_PARTICIPANTS_MAX,
            sim_activity_variance: DEFAULT_SIM_ACTIVITY_VARIANCE,
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_INTERVAL_SECONDS),
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECONDS),
            presence_staleness: Duration::from_secs(DEFAULT_PRESENCE_STALENESS_SECONDS),
            latency_degraded: Duration::from_millis(DEFAULT_LATENCY_DEGRADED_MS),
            mode_cache_ttl: Duration::from_secs(DEFAULT_MODE_CACHE_TTL_SECONDS),
            governance_fallback_timeout: Duration::from_millis(
                DEFAULT_GOVERNANCE_FALLBACK_TIMEOUT_MS,
            ),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mode = match vars.get("NET_MODE").map(|s| s.trim().to_lowercase()) {
            None => DEFAULT_MODE,
            Some(ref s) if s == "sim" => ConnectionMode::Sim,
            Some(ref s) if s == "live" => ConnectionMode::Live,
            Some(other) => {
                return Err(ConfigError::InvalidValue(format!(
                    "NET_MODE must be 'sim' or 'live', got '{other}'"
                )))
            }
        };

        let sim_participants_min =
            parse_var(vars, "NET_SIM_PARTICIPANTS_MIN", DEFAULT_SIM_PARTICIPANTS_MIN)?;
        let sim_participants_max =
            parse_var(vars, "NET_SIM_PARTICIPANTS_MAX", DEFAULT_SIM_PARTICIPANTS_MAX)?;

        if sim_participants_min > sim_participants_max {
            return Err(ConfigError::InvalidValue(format!(
                "NET_SIM_PARTICIPANTS_MIN ({sim_participants_min}) exceeds \
                 NET_SIM_PARTICIPANTS_MAX ({sim_participants_max})"
            )));
        }
        if sim_participants_min == 0 {
            return Err(ConfigError::InvalidValue(
                "NET_SIM_PARTICIPANTS_MIN must be at least 1".to_string(),
            ));
        }

        let sim_activity_variance: f32 = parse_var(
            vars,
            "NET_SIM_ACTIVITY_VARIANCE",
            DEFAULT_SIM_ACTIVITY_VARIANCE,
        )?;
        if !(0.0..=1.0).contains(&sim_activity_variance) {
            return Err(ConfigError::InvalidValue(format!(
                "NET_SIM_ACTIVITY_VARIANCE must be within 0.0..=1.0, got {sim_activity_variance}"
            )));
        }

        let heartbeat_interval_seconds: u64 = parse_var(
            vars,
            "NET_HEARTBEAT_INTERVAL_SECONDS",
            DEFAULT_HEARTBEAT_INTERVAL_SECONDS,
        )?;
        let cleanup_interval_seconds: u64 = parse_var(
            vars,
            "NET_PRESENCE_CLEANUP_INTERVAL_SECONDS",
            DEFAULT_CLEANUP_INTERVAL_SECONDS,
        )?;
        let presence_staleness_seconds: u64 = parse_var(
            vars,
            "NET_PRESENCE_STALENESS_SECONDS",
            DEFAULT_PRESENCE_STALENESS_SECONDS,
        )?;

        for (name, value) in [
            ("NET_HEARTBEAT_INTERVAL_SECONDS", heartbeat_interval_seconds),
            (
                "NET_PRESENCE_CLEANUP_INTERVAL_SECONDS",
                cleanup_interval_seconds,
            ),
            (
                "NET_PRESENCE_STALENESS_SECONDS",
                presence_staleness_seconds,
            ),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue(format!(
                    "{name} must be greater than zero"
                )));
            }
        }

        let latency_degraded_ms: u64 =
            parse_var(vars, "NET_LATENCY_DEGRADED_MS", DEFAULT_LATENCY_DEGRADED_MS)?;
        let mode_cache_ttl_seconds: u64 = parse_var(
            vars,
            "NET_MODE_CACHE_TTL_SECONDS",
            DEFAULT_MODE_CACHE_TTL_SECONDS,
        )?;
        let governance_fallback_timeout_ms: u64 = parse_var(
            vars,
            "NET_GOVERNANCE_FALLBACK_TIMEOUT_MS",
            DEFAULT_GOVERNANCE_FALLBACK_TIMEOUT_MS,
        )?;

        Ok(Config {
            mode,
            sim_participants_min,
            sim_participants_max,
            sim_activity_variance,
            heartbeat_interval: Duration::from_secs(heartbeat_interval_seconds),
            cleanup_interval: Duration::from_secs(cleanup_interval_seconds),
            presence_staleness: Duration::from_secs(presence_staleness_seconds),
            latency_degraded: Duration::from_millis(latency_degraded_ms),
            mode_cache_ttl: Duration::from_secs(mode_cache_ttl_seconds),
            governance_fallback_timeout: Duration::from_millis(governance_fallback_timeout_ms),
        })
    }
}

/// Parse an optional env var, falling back to the default when unset.
/// Unlike a silent `.ok()` fallback, a present-but-unparseable value is an
/// error: a typo in an interval must not quietly become the default.
fn parse_var<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            ConfigError::InvalidValue(format!("{name} could not be parsed from '{raw}'"))
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(&HashMap::new()).expect("defaults should load");

        assert_eq!(config.mode, ConnectionMode::Sim);
        assert_eq!(config.sim_participants_min, 2);
        assert_eq!(config.sim_participants_max, 8);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(25));
        assert_eq!(config.cleanup_interval, Duration::from_secs(60));
        assert_eq!(config.presence_staleness, Duration::from_secs(120));
        assert_eq!(config.latency_degraded, Duration::from_millis(250));
        assert_eq!(config.mode_cache_ttl, Duration::from_secs(30));
        assert_eq!(
            config.governance_fallback_timeout,
            Duration::from_millis(2000)
        );
    }

    #[test]
    fn test_custom_values() {
        let vars = HashMap::from([
            ("NET_MODE".to_string(), "live".to_string()),
            ("NET_SIM_PARTICIPANTS_MIN".to_string(), "3".to_string()),
            ("NET_SIM_PARTICIPANTS_MAX".to_string(), "5".to_string()),
            (
                "NET_HEARTBEAT_INTERVAL_SECONDS".to_string(),
                "10".to_string(),
            ),
        ]);

        let config = Config::from_vars(&vars).expect("config should load");
        assert_eq!(config.mode, ConnectionMode::Live);
        assert_eq!(config.sim_participants_min, 3);
        assert_eq!(config.sim_participants_max, 5);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_mode_is_case_insensitive() {
        let vars = HashMap::from([("NET_MODE".to_string(), "LIVE".to_string())]);
        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(config.mode, ConnectionMode::Live);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let vars = HashMap::from([("NET_MODE".to_string(), "demo".to_string())]);
        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_inverted_sim_range_rejected() {
        let vars = HashMap::from([
            ("NET_SIM_PARTICIPANTS_MIN".to_string(), "6".to_string()),
            ("NET_SIM_PARTICIPANTS_MAX".to_string(), "4".to_string()),
        ]);
        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let vars = HashMap::from([(
            "NET_HEARTBEAT_INTERVAL_SECONDS".to_string(),
            "0".to_string(),
        )]);
        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_unparseable_value_is_an_error_not_default() {
        let vars = HashMap::from([(
            "NET_PRESENCE_STALENESS_SECONDS".to_string(),
            "two minutes".to_string(),
        )]);
        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_variance_bounds() {
        let vars = HashMap::from([("NET_SIM_ACTIVITY_VARIANCE".to_string(), "1.5".to_string())]);
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
