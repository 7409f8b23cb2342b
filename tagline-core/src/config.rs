use std::env;

use crate::errors::{ConfigError, TaglineError};

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn from_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

/// Global configuration shared across the services.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub environment: Environment,
    pub service_name: String,
    pub log_level: Option<String>,
}

impl CoreConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = env::var("TAGLINE_ENV")
            .map(|raw| Environment::from_str(&raw))
            .unwrap_or_default();

        let service_name =
            env::var("TAGLINE_SERVICE_NAME").unwrap_or_else(|_| "tagline".to_string());
        let log_level = env::var("TAGLINE_LOG").ok();

        Ok(Self {
            environment,
            service_name,
            log_level,
        })
    }

    /// Loads configuration from env vars prefixed with the provided value (e.g. `TAGGING_`).
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);

        let env_key = key("ENV");
        let environment = env::var(&env_key)
            .map(|raw| Environment::from_str(&raw))
            .unwrap_or_default();

        let name_key = key("SERVICE_NAME");
        let service_name = env::var(&name_key).unwrap_or_else(|_| "tagline".to_string());

        let log_key = key("LOG");
        let log_level = env::var(&log_key).ok();

        Ok(Self {
            environment,
            service_name,
            log_level,
        })
    }

    /// Whether the service is running in production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }

    /// Log filter directive to hand to the tracing subscriber.
    pub fn log_level(&self) -> Option<&str> {
        self.log_level.as_deref()
    }
}

/// Helper that loads config and converts to the canonical Tagline error type.
pub fn load_core_config() -> Result<CoreConfig, TaglineError> {
    Ok(CoreConfig::from_env()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_default_environment() {
        std::env::remove_var("TAGLINE_ENV");
        let cfg = CoreConfig::from_env().expect("config should load");
        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(cfg.service_name, "tagline");
    }

    #[test]
    fn prefixed_variables_take_effect() {
        std::env::set_var("TAGGING_ENV", "production");
        std::env::set_var("TAGGING_SERVICE_NAME", "tagging-worker");
        let cfg = CoreConfig::from_env_with_prefix("TAGGING_").expect("config should load");
        assert!(cfg.is_production());
        assert_eq!(cfg.service_name, "tagging-worker");
        std::env::remove_var("TAGGING_ENV");
        std::env::remove_var("TAGGING_SERVICE_NAME");
    }
}
