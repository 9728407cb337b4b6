//! Checkout configuration.
//!
//! Timer defaults, tick period and expiry policy. A configuration can come
//! from `Default`, JSON, environment variables or [`CheckoutConfigBuilder`].
//! Every source is validated with stillwater's `Validation`, so a bad
//! configuration reports all of its problems at once instead of the first.
//!
//! # Example
//!
//! ```rust
//! use checkout_state::config::CheckoutConfigBuilder;
//!
//! let config = CheckoutConfigBuilder::new()
//!     .timer_minutes(10)
//!     .pix_timer_minutes(5)
//!     .expire_on_timeout(false)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.timer_minutes, 10);
//! assert!(!config.expire_on_timeout);
//! ```

pub mod builder;
pub mod error;

pub use builder::CheckoutConfigBuilder;
pub use error::{ConfigError, ConfigViolation};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

pub const ENV_TIMER_MINUTES: &str = "CHECKOUT_TIMER_MINUTES";
pub const ENV_PIX_TIMER_MINUTES: &str = "CHECKOUT_PIX_TIMER_MINUTES";
pub const ENV_TICK_INTERVAL_MS: &str = "CHECKOUT_TICK_INTERVAL_MS";
pub const ENV_EXPIRE_ON_TIMEOUT: &str = "CHECKOUT_EXPIRE_ON_TIMEOUT";
pub const ENV_EXPIRE_ON_PIX_TIMEOUT: &str = "CHECKOUT_EXPIRE_ON_PIX_TIMEOUT";

/// Session-wide checkout settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Default length of the general countdown, used by `begin()`.
    pub timer_minutes: u32,
    /// Default length of the PIX countdown.
    pub pix_timer_minutes: u32,
    /// Period between countdown ticks. One tick removes one second.
    pub tick_interval_ms: u64,
    /// Move a pending session to `expired` when the general timer runs out.
    pub expire_on_timeout: bool,
    /// Move a pending session to `expired` when the PIX timer runs out.
    pub expire_on_pix_timeout: bool,
    pub expired_message: String,
    pub pix_expired_message: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            timer_minutes: 15,
            pix_timer_minutes: 30,
            tick_interval_ms: 1000,
            expire_on_timeout: true,
            expire_on_pix_timeout: true,
            expired_message: "Checkout session expired".to_string(),
            pix_expired_message: "PIX payment window expired".to_string(),
        }
    }
}

impl CheckoutConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Parse a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    /// Defaults overridden by `CHECKOUT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_TIMER_MINUTES) {
            config.timer_minutes = parse_var(ENV_TIMER_MINUTES, value)?;
        }
        if let Some(value) = lookup(ENV_PIX_TIMER_MINUTES) {
            config.pix_timer_minutes = parse_var(ENV_PIX_TIMER_MINUTES, value)?;
        }
        if let Some(value) = lookup(ENV_TICK_INTERVAL_MS) {
            config.tick_interval_ms = parse_var(ENV_TICK_INTERVAL_MS, value)?;
        }
        if let Some(value) = lookup(ENV_EXPIRE_ON_TIMEOUT) {
            config.expire_on_timeout = parse_var(ENV_EXPIRE_ON_TIMEOUT, value)?;
        }
        if let Some(value) = lookup(ENV_EXPIRE_ON_PIX_TIMEOUT) {
            config.expire_on_pix_timeout = parse_var(ENV_EXPIRE_ON_PIX_TIMEOUT, value)?;
        }
        config.validated()
    }

    /// Check every rule, accumulating all violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigViolation>> {
        let checks = vec![
            rule(self.timer_minutes > 0, ConfigViolation::ZeroTimerMinutes),
            rule(self.pix_timer_minutes > 0, ConfigViolation::ZeroPixTimerMinutes),
            rule(self.tick_interval_ms > 0, ConfigViolation::ZeroTickInterval),
            rule(
                !self.expired_message.trim().is_empty(),
                ConfigViolation::EmptyMessage {
                    field: "expired_message",
                },
            ),
            rule(
                !self.pix_expired_message.trim().is_empty(),
                ConfigViolation::EmptyMessage {
                    field: "pix_expired_message",
                },
            ),
        ];

        Validation::all_vec(checks).map(|_| ())
    }

    /// Consume the config, returning it only if it passes validation.
    pub fn validated(self) -> Result<Self, ConfigError> {
        match self.validate() {
            Validation::Success(()) => Ok(self),
            Validation::Failure(violations) => Err(ConfigError::Invalid(
                violations.iter().cloned().collect(),
            )),
        }
    }
}

fn rule(ok: bool, violation: ConfigViolation) -> Validation<(), NonEmptyVec<ConfigViolation>> {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation)
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = CheckoutConfig::default();
        assert!(config.validate().is_success());
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn validation_accumulates_all_violations() {
        let config = CheckoutConfig {
            timer_minutes: 0,
            pix_timer_minutes: 0,
            tick_interval_ms: 0,
            expired_message: "  ".to_string(),
            ..CheckoutConfig::default()
        };

        match config.validate() {
            Validation::Failure(violations) => {
                assert_eq!(violations.len(), 4);
                assert!(violations
                    .iter()
                    .any(|v| matches!(v, ConfigViolation::ZeroTickInterval)));
                assert!(violations.iter().any(|v| matches!(
                    v,
                    ConfigViolation::EmptyMessage {
                        field: "expired_message"
                    }
                )));
            }
            Validation::Success(_) => panic!("Expected failures, got success"),
        }
    }

    #[test]
    fn from_json_fills_defaults() {
        let config = CheckoutConfig::from_json(r#"{"timer_minutes": 5}"#).unwrap();

        assert_eq!(config.timer_minutes, 5);
        assert_eq!(config.pix_timer_minutes, 30);
        assert!(config.expire_on_pix_timeout);
    }

    #[test]
    fn from_json_rejects_invalid_values() {
        let result = CheckoutConfig::from_json(r#"{"pix_timer_minutes": 0}"#);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid(ref v)) if v == &vec![ConfigViolation::ZeroPixTimerMinutes]
        ));

        let result = CheckoutConfig::from_json("{not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn from_lookup_overrides_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_TIMER_MINUTES, "20"),
            (ENV_EXPIRE_ON_TIMEOUT, "false"),
            (ENV_TICK_INTERVAL_MS, " 250 "),
        ]);

        let config = CheckoutConfig::from_lookup(|var| vars.get(var).map(|v| v.to_string())).unwrap();

        assert_eq!(config.timer_minutes, 20);
        assert!(!config.expire_on_timeout);
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
        assert_eq!(config.pix_timer_minutes, 30);
    }

    #[test]
    fn from_lookup_reports_bad_values() {
        let result = CheckoutConfig::from_lookup(|var| {
            (var == ENV_PIX_TIMER_MINUTES).then(|| "soon".to_string())
        });

        match result {
            Err(ConfigError::Env { var, value }) => {
                assert_eq!(var, ENV_PIX_TIMER_MINUTES);
                assert_eq!(value, "soon");
            }
            other => panic!("Expected Env error, got {other:?}"),
        }
    }
}
