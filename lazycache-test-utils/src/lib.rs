//! LazyCache Test Utilities
//!
//! Shared test infrastructure for the LazyCache workspace:
//! - Fixtures for common cache values
//! - Proptest generators for keys, values and operation sequences
//! - A reference model of the cache contract to check doubles against
//! - Custom assertions
//! - The conformance suite every double-engine must pass
//! - Test logging bootstrap

pub use lazycache_core::{
    AppCache, CacheDefaults, CacheEntry, CacheError, CacheResult, CacheValue, EntryOptions,
};
pub use uuid::Uuid;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::Lazy;

// ============================================================================
// LOGGING
// ============================================================================

static TEST_LOGGING: Lazy<()> = Lazy::new(|| {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lazycache_double=debug,lazycache_core=debug"));

    // Another subscriber may already be installed by the test binary.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
});

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; defaults to debug output for the LazyCache crates.
pub fn init_test_logging() {
    Lazy::force(&TEST_LOGGING);
}

// ============================================================================
// FIXTURES
// ============================================================================

/// A user-defined value type, as a consumer of the cache would store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestObject {
    pub id: Uuid,
    pub name: String,
    pub tags: Vec<String>,
}

impl CacheValue for TestObject {}

pub mod fixtures {
    //! Pre-built values for common testing scenarios.

    use super::*;

    /// The key used throughout the conformance suite.
    pub const CACHE_KEY: &str = "SomethingInTheCache";

    pub fn test_object() -> TestObject {
        TestObject {
            id: Uuid::new_v4(),
            name: "Test Object".to_string(),
            tags: vec!["fixture".to_string()],
        }
    }

    pub fn named_object(name: &str) -> TestObject {
        TestObject {
            id: Uuid::new_v4(),
            name: name.to_string(),
            tags: Vec::new(),
        }
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for keys, values and operation sequences.

    use super::*;
    use proptest::prelude::*;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Generate a non-empty cache key.
    pub fn arb_key() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9_.:-]{0,24}"
    }

    /// Generate a key from a small pool, so sequences collide on keys.
    pub fn arb_pooled_key() -> impl Strategy<Value = String> {
        prop_oneof![Just("alpha"), Just("beta"), Just("gamma")].prop_map(str::to_string)
    }

    /// Generate a TestObject.
    pub fn arb_test_object() -> impl Strategy<Value = TestObject> {
        (
            arb_uuid(),
            "[a-z ]{0,16}",
            prop::collection::vec("[a-z]{1,6}", 0..3),
        )
            .prop_map(|(id, name, tags)| TestObject { id, name, tags })
    }

    /// Generate a single cache operation over the pooled keys.
    pub fn arb_cache_op() -> impl Strategy<Value = CacheOp> {
        prop_oneof![
            (arb_pooled_key(), any::<u32>()).prop_map(|(key, value)| CacheOp::AddNumber { key, value }),
            (arb_pooled_key(), "[a-z]{0,8}").prop_map(|(key, value)| CacheOp::AddText { key, value }),
            arb_pooled_key().prop_map(|key| CacheOp::AddAbsent { key }),
            arb_pooled_key().prop_map(|key| CacheOp::GetNumber { key }),
            arb_pooled_key().prop_map(|key| CacheOp::GetText { key }),
            (arb_pooled_key(), any::<u32>())
                .prop_map(|(key, value)| CacheOp::GetOrAddNumber { key, value }),
            (arb_pooled_key(), "[a-z]{0,8}")
                .prop_map(|(key, value)| CacheOp::GetOrAddText { key, value }),
            arb_pooled_key().prop_map(|key| CacheOp::GetOrAddFailing { key }),
            arb_pooled_key().prop_map(|key| CacheOp::Remove { key }),
        ]
    }

    /// Generate a sequence of cache operations.
    pub fn arb_cache_ops(max_len: usize) -> impl Strategy<Value = Vec<CacheOp>> {
        prop::collection::vec(arb_cache_op(), 0..max_len)
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

/// One step of a generated scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp {
    AddNumber { key: String, value: u32 },
    AddText { key: String, value: String },
    AddAbsent { key: String },
    GetNumber { key: String },
    GetText { key: String },
    GetOrAddNumber { key: String, value: u32 },
    GetOrAddText { key: String, value: String },
    GetOrAddFailing { key: String },
    Remove { key: String },
}

/// What a step produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Number(u32),
    Text(String),
    Failed(CacheError),
}

impl Outcome {
    fn from_unit(result: CacheResult<()>) -> Self {
        match result {
            Ok(()) => Outcome::Done,
            Err(err) => Outcome::Failed(err),
        }
    }

    fn from_number(result: CacheResult<u32>) -> Self {
        match result {
            Ok(value) => Outcome::Number(value),
            Err(err) => Outcome::Failed(err),
        }
    }

    fn from_text(result: CacheResult<String>) -> Self {
        match result {
            Ok(value) => Outcome::Text(value),
            Err(err) => Outcome::Failed(err),
        }
    }
}

/// Error every failing factory returns.
pub fn scenario_failure(key: &str) -> CacheError {
    CacheError::factory(key, "scenario factory failure")
}

/// Apply `op` to `cache`, counting factory invocations in `factory_runs`.
pub fn apply<C: AppCache>(cache: &C, op: &CacheOp, factory_runs: &AtomicUsize) -> Outcome {
    match op {
        CacheOp::AddNumber { key, value } => Outcome::from_unit(cache.add(key, *value)),
        CacheOp::AddText { key, value } => Outcome::from_unit(cache.add(key, value.clone())),
        CacheOp::AddAbsent { key } => Outcome::from_unit(cache.add(key, None::<String>)),
        CacheOp::GetNumber { key } => Outcome::from_number(cache.get::<u32>(key)),
        CacheOp::GetText { key } => Outcome::from_text(cache.get::<String>(key)),
        CacheOp::GetOrAddNumber { key, value } => {
            let value = *value;
            Outcome::from_number(cache.get_or_add(key, || {
                factory_runs.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            }))
        }
        CacheOp::GetOrAddText { key, value } => {
            let value = value.clone();
            Outcome::from_text(cache.get_or_add(key, || {
                factory_runs.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            }))
        }
        CacheOp::GetOrAddFailing { key } => {
            Outcome::from_number(cache.get_or_add(key, || -> CacheResult<u32> {
                factory_runs.fetch_add(1, Ordering::SeqCst);
                Err(scenario_failure(key))
            }))
        }
        CacheOp::Remove { key } => Outcome::from_unit(cache.remove(key)),
    }
}

/// Result of running a scenario: per-step outcomes and factory invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioRun {
    pub outcomes: Vec<Outcome>,
    pub factory_runs: usize,
}

/// Run every step of `ops` against `cache` in order.
pub fn run_scenario<C: AppCache>(cache: &C, ops: &[CacheOp]) -> ScenarioRun {
    let factory_runs = AtomicUsize::new(0);
    let outcomes = ops.iter().map(|op| apply(cache, op, &factory_runs)).collect();
    ScenarioRun {
        outcomes,
        factory_runs: factory_runs.load(Ordering::SeqCst),
    }
}

// ============================================================================
// REFERENCE MODEL
// ============================================================================

/// A cell as the model sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelCell {
    Number(u32),
    Text(String),
}

/// Plain in-memory model of the contract as a self-configuring double
/// honours it. A removed cell keeps its type and reads as that type's zero
/// value; reads of any other type miss.
#[derive(Debug, Clone, Default)]
pub struct CacheModel {
    cells: HashMap<String, ModelCell>,
    factory_runs: usize,
}

impl CacheModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, key: &str) -> Option<&ModelCell> {
        self.cells.get(key)
    }

    pub fn apply(&mut self, op: &CacheOp) -> Outcome {
        match op {
            CacheOp::AddNumber { key, value } => {
                self.cells.insert(key.clone(), ModelCell::Number(*value));
                Outcome::Done
            }
            CacheOp::AddText { key, value } => {
                self.cells.insert(key.clone(), ModelCell::Text(value.clone()));
                Outcome::Done
            }
            CacheOp::AddAbsent { .. } => Outcome::Failed(CacheError::ArgumentNull { name: "item" }),
            CacheOp::GetNumber { key } => Outcome::Number(self.number(key).unwrap_or_default()),
            CacheOp::GetText { key } => Outcome::Text(self.text(key).unwrap_or_default()),
            CacheOp::GetOrAddNumber { key, value } => match self.number(key) {
                Some(existing) => Outcome::Number(existing),
                None => {
                    self.factory_runs += 1;
                    self.cells.insert(key.clone(), ModelCell::Number(*value));
                    Outcome::Number(*value)
                }
            },
            CacheOp::GetOrAddText { key, value } => match self.text(key) {
                Some(existing) => Outcome::Text(existing),
                None => {
                    self.factory_runs += 1;
                    self.cells.insert(key.clone(), ModelCell::Text(value.clone()));
                    Outcome::Text(value.clone())
                }
            },
            CacheOp::GetOrAddFailing { key } => match self.number(key) {
                Some(existing) => Outcome::Number(existing),
                None => {
                    self.factory_runs += 1;
                    Outcome::Failed(scenario_failure(key))
                }
            },
            CacheOp::Remove { key } => {
                if let Some(cell) = self.cells.get_mut(key) {
                    *cell = match cell {
                        ModelCell::Number(_) => ModelCell::Number(0),
                        ModelCell::Text(_) => ModelCell::Text(String::new()),
                    };
                }
                Outcome::Done
            }
        }
    }

    pub fn run(ops: &[CacheOp]) -> ScenarioRun {
        let mut model = Self::new();
        let outcomes = ops.iter().map(|op| model.apply(op)).collect();
        ScenarioRun {
            outcomes,
            factory_runs: model.factory_runs,
        }
    }

    fn number(&self, key: &str) -> Option<u32> {
        match self.cells.get(key) {
            Some(ModelCell::Number(value)) => Some(*value),
            _ => None,
        }
    }

    fn text(&self, key: &str) -> Option<String> {
        match self.cells.get(key) {
            Some(ModelCell::Text(value)) => Some(value.clone()),
            _ => None,
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for cache contract results.

    use super::*;

    /// Assert that a CacheResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &CacheResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a CacheResult is an argument-null failure.
    #[track_caller]
    pub fn assert_argument_null<T: std::fmt::Debug>(result: &CacheResult<T>) {
        match result {
            Err(CacheError::ArgumentNull { .. }) => {}
            other => panic!("Expected ArgumentNull error, got: {:?}", other),
        }
    }

    /// Assert that a CacheResult is an invalid-argument failure for `name`.
    #[track_caller]
    pub fn assert_invalid_argument<T: std::fmt::Debug>(result: &CacheResult<T>, name: &str) {
        match result {
            Err(CacheError::InvalidArgument { name: actual, .. }) if *actual == name => {}
            other => panic!("Expected InvalidArgument for '{}', got: {:?}", name, other),
        }
    }

    /// Assert that a CacheResult is the factory failure for `key`.
    #[track_caller]
    pub fn assert_factory_failure<T: std::fmt::Debug>(result: &CacheResult<T>, key: &str) {
        match result {
            Err(CacheError::Factory { key: actual, .. }) if actual == key => {}
            other => panic!("Expected factory failure for '{}', got: {:?}", key, other),
        }
    }
}

// ============================================================================
// CONFORMANCE SUITE
// ============================================================================

/// Generate the contract conformance suite for a mocked caching service.
///
/// `$make` must evaluate to a fresh `AppCache` on every use. Async tests use
/// `#[tokio::test]`, so the calling crate needs `tokio` with the `macros`
/// and `rt` features.
///
/// ```ignore
/// lazycache_test_utils::conformance_suite!(history, lazycache_double::history_mock());
/// ```
#[macro_export]
macro_rules! conformance_suite {
    ($suite:ident, $make:expr) => {
        mod $suite {
            use ::std::sync::atomic::{AtomicUsize, Ordering};
            use $crate::assertions::*;
            use $crate::fixtures::CACHE_KEY;
            use $crate::{AppCache, CacheEntry, CacheError, CacheResult, TestObject, Uuid};

            #[test]
            fn miss_returns_zero_value() {
                let cache = $make;
                assert_eq!(cache.get::<Uuid>(CACHE_KEY).unwrap(), Uuid::nil());
                assert_eq!(cache.get::<u64>(CACHE_KEY).unwrap(), 0);
                assert_eq!(cache.get::<Option<String>>(CACHE_KEY).unwrap(), None);
                assert_eq!(cache.get::<TestObject>(CACHE_KEY).unwrap(), TestObject::default());
            }

            #[test]
            fn added_value_is_returned() {
                let cache = $make;
                let object = $crate::fixtures::test_object();
                assert_ok(&cache.add(CACHE_KEY, object.clone()));
                assert_eq!(cache.get::<TestObject>(CACHE_KEY).unwrap(), object);
            }

            #[test]
            fn last_write_wins() {
                let cache = $make;
                cache.add(CACHE_KEY, 1u32).unwrap();
                cache.add(CACHE_KEY, 2u32).unwrap();
                assert_eq!(cache.get::<u32>(CACHE_KEY).unwrap(), 2);
            }

            #[test]
            fn last_write_wins_across_types() {
                let cache = $make;
                cache.add(CACHE_KEY, 1u32).unwrap();
                cache.add(CACHE_KEY, "one".to_string()).unwrap();
                assert_eq!(cache.get::<String>(CACHE_KEY).unwrap(), "one");
                assert_eq!(cache.get::<u32>(CACHE_KEY).unwrap(), 0);
            }

            #[test]
            fn get_or_add_invokes_factory_once() {
                let cache = $make;
                let runs = AtomicUsize::new(0);
                let factory = || {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(Uuid::new_v4())
                };

                let first = cache.get_or_add(CACHE_KEY, factory).unwrap();
                let second = cache.get_or_add(CACHE_KEY, factory).unwrap();

                assert_eq!(first, second);
                assert_eq!(runs.load(Ordering::SeqCst), 1);
                assert_eq!(cache.get::<Uuid>(CACHE_KEY).unwrap(), first);
            }

            #[test]
            fn get_or_add_returns_added_value_without_factory() {
                let cache = $make;
                cache.add(CACHE_KEY, 7i32).unwrap();
                let value = cache
                    .get_or_add(CACHE_KEY, || -> CacheResult<i32> {
                        panic!("factory must not run when the key holds a value")
                    })
                    .unwrap();
                assert_eq!(value, 7);
            }

            #[test]
            fn add_after_get_or_add_overwrites() {
                let cache = $make;
                cache.get_or_add(CACHE_KEY, || Ok(1u32)).unwrap();
                cache.add(CACHE_KEY, 5u32).unwrap();
                assert_eq!(cache.get::<u32>(CACHE_KEY).unwrap(), 5);
                assert_eq!(cache.get_or_add(CACHE_KEY, || Ok(9u32)).unwrap(), 5);
            }

            #[test]
            fn factory_receives_entry_for_key() {
                let cache = $make;
                let value = cache
                    .get_or_add_with_entry(
                        CACHE_KEY,
                        |entry: &mut CacheEntry| {
                            entry.sliding_expiration = Some(::std::time::Duration::from_secs(1));
                            Ok(entry.key().to_string())
                        },
                        None,
                    )
                    .unwrap();
                assert_eq!(value, CACHE_KEY);
            }

            #[test]
            fn remove_resets_to_zero_value() {
                let cache = $make;
                let id = Uuid::new_v4();
                cache.add(CACHE_KEY, id).unwrap();
                assert_eq!(cache.get::<Uuid>(CACHE_KEY).unwrap(), id);

                cache.remove(CACHE_KEY).unwrap();

                assert_eq!(cache.get::<Uuid>(CACHE_KEY).unwrap(), Uuid::nil());
            }

            #[test]
            fn remove_then_read_other_type_returns_its_zero() {
                let cache = $make;
                cache.add(CACHE_KEY, 3u32).unwrap();
                cache.remove(CACHE_KEY).unwrap();
                assert_eq!(cache.get::<String>(CACHE_KEY).unwrap(), "");
            }

            #[test]
            fn remove_of_untouched_key_is_noop() {
                let cache = $make;
                cache.remove(CACHE_KEY).unwrap();
                assert_eq!(cache.get::<u32>(CACHE_KEY).unwrap(), 0);
            }

            #[test]
            fn add_rejects_absent_value() {
                let cache = $make;
                assert_argument_null(&cache.add(CACHE_KEY, None::<String>));
                assert_eq!(cache.get::<Option<String>>(CACHE_KEY).unwrap(), None);
            }

            #[test]
            fn empty_key_is_rejected() {
                let cache = $make;
                assert_invalid_argument(&cache.get::<u32>(""), "key");
                assert_invalid_argument(&cache.add("", 1u32), "key");
                assert_invalid_argument(&cache.remove(""), "key");
            }

            #[test]
            fn factory_error_propagates_and_installs_nothing() {
                let cache = $make;
                let failed = cache.get_or_add(CACHE_KEY, || -> CacheResult<u32> {
                    Err($crate::scenario_failure(CACHE_KEY))
                });
                assert_factory_failure(&failed, CACHE_KEY);

                assert_eq!(cache.get::<u32>(CACHE_KEY).unwrap(), 0);
                assert_eq!(cache.get_or_add(CACHE_KEY, || Ok(4u32)).unwrap(), 4);
            }

            #[test]
            fn default_cache_policy_is_available() {
                let cache = $make;
                let policy = cache.default_cache_policy().unwrap();
                assert!(policy.default_cache_duration_seconds > 0);
            }

            #[tokio::test]
            async fn get_or_add_async_invokes_factory_once() {
                let cache = $make;
                let counter = AtomicUsize::new(0);
                let runs = &counter;

                let first = cache
                    .get_or_add_async(CACHE_KEY, move || async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, CacheError>("computed".to_string())
                    })
                    .await
                    .unwrap();
                let second = cache
                    .get_or_add_async(CACHE_KEY, move || async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, CacheError>("recomputed".to_string())
                    })
                    .await
                    .unwrap();

                assert_eq!(first, "computed");
                assert_eq!(second, "computed");
                assert_eq!(counter.load(Ordering::SeqCst), 1);
            }

            #[tokio::test]
            async fn async_and_sync_share_the_cell() {
                let cache = $make;
                let value = cache
                    .get_or_add_async(CACHE_KEY, || async { Ok::<_, CacheError>(11u64) })
                    .await
                    .unwrap();

                let sync = cache
                    .get_or_add(CACHE_KEY, || -> CacheResult<u64> {
                        panic!("sync factory must not run after the async one stored a value")
                    })
                    .unwrap();
                assert_eq!(sync, value);
                assert_eq!(cache.get_async::<u64>(CACHE_KEY).await.unwrap(), value);
            }

            #[tokio::test]
            async fn async_factory_error_propagates() {
                let cache = $make;
                let failed = cache
                    .get_or_add_async(CACHE_KEY, || async {
                        Err::<u32, _>($crate::scenario_failure(CACHE_KEY))
                    })
                    .await;
                assert_factory_failure(&failed, CACHE_KEY);
                assert_eq!(cache.get_async::<u32>(CACHE_KEY).await.unwrap(), 0);
            }
        }
    };
}

// ============================================================================
// TESTS
// ============================================================================
