//! Builder for checkout configurations.

use crate::config::error::ConfigError;
use crate::config::CheckoutConfig;

/// Fluent builder starting from [`CheckoutConfig::default`].
#[derive(Clone, Debug, Default)]
pub struct CheckoutConfigBuilder {
    config: CheckoutConfig,
}

impl CheckoutConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn from_config(config: CheckoutConfig) -> Self {
        Self { config }
    }

    pub fn timer_minutes(mut self, minutes: u32) -> Self {
        self.config.timer_minutes = minutes;
        self
    }

    pub fn pix_timer_minutes(mut self, minutes: u32) -> Self {
        self.config.pix_timer_minutes = minutes;
        self
    }

    pub fn tick_interval_ms(mut self, millis: u64) -> Self {
        self.config.tick_interval_ms = millis;
        self
    }

    pub fn expire_on_timeout(mut self, enabled: bool) -> Self {
        self.config.expire_on_timeout = enabled;
        self
    }

    pub fn expire_on_pix_timeout(mut self, enabled: bool) -> Self {
        self.config.expire_on_pix_timeout = enabled;
        self
    }

    pub fn expired_message(mut self, message: impl Into<String>) -> Self {
        self.config.expired_message = message.into();
        self
    }

    pub fn pix_expired_message(mut self, message: impl Into<String>) -> Self {
        self.config.pix_expired_message = message.into();
        self
    }

    /// Build the configuration.
    /// Returns every violated rule if validation fails.
    pub fn build(self) -> Result<CheckoutConfig, ConfigError> {
        self.config.validated()
    }
}
