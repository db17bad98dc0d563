//! Error types for cache contract operations

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse configuration: {reason}")]
    Parse { reason: String },
}

/// Master error type for cache contract and test double operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// A required argument was empty or otherwise unusable.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// A required value was absent. Mirrors the contract's argument-null failure.
    #[error("Value cannot be null. (Parameter '{name}')")]
    ArgumentNull { name: &'static str },

    /// A caller-supplied factory failed.
    #[error("Factory for '{key}' failed: {reason}")]
    Factory { key: String, reason: String },

    #[error("Test double lock poisoned")]
    LockPoisoned,

    /// An invocation expectation did not hold.
    #[error("Expected {operation} on '{key}' {expected}, but it was invoked {actual} time(s)")]
    VerificationFailed {
        operation: String,
        key: String,
        expected: String,
        actual: usize,
    },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl CacheError {
    /// Build a factory failure for `key`.
    pub fn factory(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Factory {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_null_display_names_parameter() {
        let err = CacheError::ArgumentNull { name: "item" };
        let msg = format!("{}", err);
        assert!(msg.contains("Value cannot be null"));
        assert!(msg.contains("item"));
    }

    #[test]
    fn test_invalid_argument_display() {
        let err = CacheError::InvalidArgument {
            name: "key",
            reason: "must not be empty".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("key"));
        assert!(msg.contains("must not be empty"));
    }

    #[test]
    fn test_verification_failed_display() {
        let err = CacheError::VerificationFailed {
            operation: "Add".to_string(),
            key: "SomethingInTheCache".to_string(),
            expected: "exactly once".to_string(),
            actual: 2,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Add"));
        assert!(msg.contains("SomethingInTheCache"));
        assert!(msg.contains("exactly once"));
        assert!(msg.contains('2'));
    }

    #[test]
    fn test_cache_error_from_config_error() {
        let err = CacheError::from(ConfigError::MissingRequired {
            field: "engine".to_string(),
        });
        assert!(matches!(err, CacheError::Config(_)));
    }

    #[test]
    fn test_factory_helper() {
        let err = CacheError::factory("k", "boom");
        assert_eq!(
            err,
            CacheError::Factory {
                key: "k".to_string(),
                reason: "boom".to_string()
            }
        );
    }
}
