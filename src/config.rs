use anyhow::Result;
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Runtime configuration for the scheduling engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minutes before the effective start at which `start()` is allowed.
    pub start_grace_minutes: u32,
    /// Upper bound applied to each outbound side-effect handler call.
    pub handler_timeout: Duration,
    /// Stricter deployments gate session start on settled payment.
    pub require_payment_before_start: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_grace_minutes: 0,
            handler_timeout: Duration::from_secs(10),
            require_payment_before_start: false,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Self {
            start_grace_minutes: env::var("START_GRACE_MINUTES")
                .unwrap_or_else(|_| "0".to_string())
                .parse()?,
            handler_timeout: Duration::from_secs(
                env::var("HANDLER_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            ),
            require_payment_before_start: env::var("REQUIRE_PAYMENT_BEFORE_START")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.start_grace_minutes, 0);
        assert_eq!(config.handler_timeout, Duration::from_secs(10));
        assert!(!config.require_payment_before_start);
    }
}
