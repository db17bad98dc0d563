//! Construction of mocked caching services.
//!
//! Every constructor returns a fresh double with the no-setup adapter for
//! its engine attached and the default cache policy answered from
//! configuration. Doubles are never shared; build one per test.

use std::sync::Arc;

use lazycache_core::{CacheResult, DoubleConfig, EngineKind};

use crate::engine::{AnyDouble, RecordingDouble, RoutingDouble};
use crate::intercept::{HistoryInterceptor, NoSetUpHandler};
use crate::mock::MockCache;
use crate::substrate::{DoubleCore, Operation, Setup};

fn seeded_core(config: &DoubleConfig) -> DoubleCore {
    DoubleCore::new()
        .with_setup(Setup::new(Operation::DefaultCachePolicy).returns(config.cache_defaults.clone()))
}

/// Post-call engine with the history adapter attached.
pub fn history_double(config: &DoubleConfig) -> RecordingDouble {
    let interceptor =
        Arc::new(HistoryInterceptor::new().with_unmatched_call_logging(config.log_unmatched_calls));
    RecordingDouble::with_core(seeded_core(config))
        .with_default_value_provider(interceptor.clone())
        .with_observer(interceptor)
}

/// Pre-call routing engine with the routing adapter attached.
pub fn routing_double(config: &DoubleConfig) -> RoutingDouble {
    let handler =
        Arc::new(NoSetUpHandler::new().with_unmatched_call_logging(config.log_unmatched_calls));
    RoutingDouble::with_core(seeded_core(config)).with_handler(handler)
}

fn build(config: &DoubleConfig) -> MockCache {
    let engine = match config.engine {
        EngineKind::History => AnyDouble::from(history_double(config)),
        EngineKind::Routing => AnyDouble::from(routing_double(config)),
    };
    tracing::debug!(engine = %config.engine, "Created mocked caching service");
    MockCache::new(engine)
}

/// Mocked caching service on the default engine.
///
/// The engine comes from `LAZYCACHE_DOUBLE_ENGINE` when set, otherwise the
/// history engine is used.
pub fn mocked_caching_service() -> MockCache {
    build(&DoubleConfig::default())
}

/// Mocked caching service built from `config`.
pub fn from_config(config: &DoubleConfig) -> CacheResult<MockCache> {
    config.validate()?;
    Ok(build(config))
}

/// Mocked caching service on the post-call engine.
pub fn history_mock() -> MockCache<RecordingDouble> {
    MockCache::new(history_double(&DoubleConfig::default()))
}

/// Mocked caching service on the pre-call routing engine.
pub fn routing_mock() -> MockCache<RoutingDouble> {
    MockCache::new(routing_double(&DoubleConfig::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DoubleEngine;
    use lazycache_core::{AppCache, CacheDefaults, CacheError, ConfigError};

    #[test]
    fn test_from_config_selects_engine() {
        let history = from_config(&DoubleConfig::new().with_engine(EngineKind::History)).unwrap();
        let routing = from_config(&DoubleConfig::new().with_engine(EngineKind::Routing)).unwrap();

        assert_eq!(history.engine().kind(), EngineKind::History);
        assert_eq!(routing.engine().kind(), EngineKind::Routing);
    }

    #[test]
    fn test_default_policy_comes_from_config() {
        let defaults = CacheDefaults {
            default_cache_duration_seconds: 45,
        };
        let cache = from_config(&DoubleConfig::new().with_cache_defaults(defaults.clone())).unwrap();

        assert_eq!(cache.default_cache_policy().unwrap(), defaults);
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let config = DoubleConfig::new().with_cache_defaults(CacheDefaults {
            default_cache_duration_seconds: 0,
        });
        assert!(matches!(
            from_config(&config),
            Err(CacheError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_fresh_doubles_are_independent() {
        let first = mocked_caching_service();
        let second = mocked_caching_service();

        first.add("k", 1u32).unwrap();

        assert_eq!(first.get::<u32>("k").unwrap(), 1);
        assert_eq!(second.get::<u32>("k").unwrap(), 0);
    }
}
