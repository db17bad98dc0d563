//! Async `get_or_add` behaves like its sync counterpart on both engines.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use lazycache_core::{AppCache, CacheEntry, CacheError, CacheItemPriority, EntryOptions};
use lazycache_double::{history_mock, routing_mock, DoubleEngine, MockCache, Operation, Times};
use lazycache_test_utils::fixtures::{self, CACHE_KEY};
use lazycache_test_utils::{init_test_logging, TestObject};

async fn async_value_matches_sync<E: DoubleEngine>(async_cache: MockCache<E>, sync_cache: MockCache<E>) {
    let object = fixtures::named_object("parity");

    let from_async = {
        let object = object.clone();
        async_cache
            .get_or_add_async(CACHE_KEY, move || async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok::<_, CacheError>(object)
            })
            .await
            .unwrap()
    };
    let from_sync = sync_cache
        .get_or_add(CACHE_KEY, || Ok(object.clone()))
        .unwrap();

    assert_eq!(from_async, from_sync);
    assert_eq!(async_cache.get::<TestObject>(CACHE_KEY).unwrap(), object);
    assert_eq!(sync_cache.get_async::<TestObject>(CACHE_KEY).await.unwrap(), object);
}

#[tokio::test]
async fn test_async_result_matches_sync_history() {
    init_test_logging();
    async_value_matches_sync(history_mock(), history_mock()).await;
}

#[tokio::test]
async fn test_async_result_matches_sync_routing() {
    init_test_logging();
    async_value_matches_sync(routing_mock(), routing_mock()).await;
}

async fn async_factory_runs_once<E: DoubleEngine>(cache: MockCache<E>) {
    let counter = AtomicUsize::new(0);
    let runs = &counter;

    for attempt in 0..3u32 {
        let value = cache
            .get_or_add_async(CACHE_KEY, move || async move {
                runs.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                Ok::<_, CacheError>(attempt)
            })
            .await
            .unwrap();
        assert_eq!(value, 0);
    }

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    cache
        .verify(Operation::GetOrAddAsync, CACHE_KEY, Times::Exactly(3))
        .unwrap();
}

#[tokio::test]
async fn test_async_factory_runs_once_history() {
    async_factory_runs_once(history_mock()).await;
}

#[tokio::test]
async fn test_async_factory_runs_once_routing() {
    async_factory_runs_once(routing_mock()).await;
}

async fn async_factory_sees_entry<E: DoubleEngine>(cache: MockCache<E>) {
    let options = EntryOptions::new().with_priority(CacheItemPriority::NeverRemove);
    let key = cache
        .get_or_add_async_with_entry(
            CACHE_KEY,
            |mut entry: CacheEntry| async move {
                entry.priority = CacheItemPriority::Low;
                Ok::<_, CacheError>(entry.key().to_string())
            },
            Some(options.clone()),
        )
        .await
        .unwrap();

    assert_eq!(key, CACHE_KEY);
    let logged = cache.invocations().unwrap();
    let call = logged
        .iter()
        .find(|invocation| invocation.operation == Operation::GetOrAddAsync)
        .unwrap();
    assert_eq!(call.options(), Some(&options));
}

#[tokio::test]
async fn test_async_factory_sees_entry_history() {
    async_factory_sees_entry(history_mock()).await;
}

#[tokio::test]
async fn test_async_factory_sees_entry_routing() {
    async_factory_sees_entry(routing_mock()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_add_then_get_async() {
    for cache in [
        lazycache_double::from_config(
            &lazycache_core::DoubleConfig::new().with_engine(lazycache_core::EngineKind::History),
        )
        .unwrap(),
        lazycache_double::from_config(
            &lazycache_core::DoubleConfig::new().with_engine(lazycache_core::EngineKind::Routing),
        )
        .unwrap(),
    ] {
        let object = fixtures::test_object();
        cache.add(CACHE_KEY, object.clone()).unwrap();
        assert_eq!(cache.get_async::<TestObject>(CACHE_KEY).await.unwrap(), object);

        cache.remove(CACHE_KEY).unwrap();
        assert_eq!(
            cache.get_async::<TestObject>(CACHE_KEY).await.unwrap(),
            TestObject::default()
        );
    }
}
