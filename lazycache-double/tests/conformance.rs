//! Contract conformance for every way of building a mocked caching service.

use lazycache_core::{DoubleConfig, EngineKind};
use lazycache_double::MockCache;
use lazycache_test_utils::conformance_suite;

conformance_suite!(history_engine, lazycache_double::history_mock());

conformance_suite!(routing_engine, lazycache_double::routing_mock());

conformance_suite!(configured_history, super::history_from_config());

conformance_suite!(configured_routing, super::routing_from_config());

fn configured(engine: EngineKind) -> MockCache {
    lazycache_test_utils::init_test_logging();
    lazycache_double::from_config(&DoubleConfig::new().with_engine(engine))
        .expect("default config is valid")
}

fn history_from_config() -> MockCache {
    configured(EngineKind::History)
}

fn routing_from_config() -> MockCache {
    configured(EngineKind::Routing)
}
