//! Configuration errors.

use thiserror::Error;

/// A single rule a configuration broke.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigViolation {
    #[error("timer_minutes must be positive")]
    ZeroTimerMinutes,

    #[error("pix_timer_minutes must be positive")]
    ZeroPixTimerMinutes,

    #[error("tick_interval_ms must be positive")]
    ZeroTickInterval,

    #[error("{field} must not be empty")]
    EmptyMessage { field: &'static str },
}

/// Errors that can occur when loading or building a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {}", render(.0))]
    Invalid(Vec<ConfigViolation>),

    #[error("Environment variable {var} has invalid value '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Configuration parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}

fn render(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
