//! Configuration types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entry::CacheDefaults;
use crate::error::ConfigError;

/// Environment variable selecting the default engine.
pub const ENGINE_ENV_VAR: &str = "LAZYCACHE_DOUBLE_ENGINE";

/// Which double-engine backs a mocked cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Records every call; unmatched calls are resolved by inspecting the
    /// invocation history after the fact.
    #[default]
    History,
    /// Routes every unmatched call through a handler before a value is produced.
    Routing,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::History => "history",
            EngineKind::Routing => "routing",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "history" | "recording" => Ok(EngineKind::History),
            "routing" | "router" => Ok(EngineKind::Routing),
            other => Err(ConfigError::InvalidValue {
                field: "engine".to_string(),
                value: other.to_string(),
                reason: "expected 'history' or 'routing'".to_string(),
            }),
        }
    }
}

/// Configuration for a mocked caching service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoubleConfig {
    /// Engine used when the caller does not pick one explicitly.
    pub engine: EngineKind,
    /// Value returned by the double's default cache policy.
    pub cache_defaults: CacheDefaults,
    /// Emit a debug event for every call that had no prior configuration.
    pub log_unmatched_calls: bool,
}

impl Default for DoubleConfig {
    fn default() -> Self {
        let engine = match std::env::var(ENGINE_ENV_VAR) {
            Ok(raw) => raw.parse().unwrap_or_else(|err: ConfigError| {
                tracing::warn!(
                    var = ENGINE_ENV_VAR,
                    value = %raw,
                    error = %err,
                    "Ignoring invalid engine selection"
                );
                EngineKind::default()
            }),
            Err(_) => EngineKind::default(),
        };
        Self {
            engine,
            cache_defaults: CacheDefaults::default(),
            log_unmatched_calls: true,
        }
    }
}

impl DoubleConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Set the engine.
    pub fn with_engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    /// Set the cache defaults.
    pub fn with_cache_defaults(mut self, defaults: CacheDefaults) -> Self {
        self.cache_defaults = defaults;
        self
    }

    /// Enable or disable unmatched-call logging.
    pub fn with_unmatched_call_logging(mut self, enabled: bool) -> Self {
        self.log_unmatched_calls = enabled;
        self
    }

    /// Check the config for values the double cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_defaults.default_cache_duration_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache_defaults.default_cache_duration_seconds".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
