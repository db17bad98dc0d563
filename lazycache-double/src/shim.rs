//! Factory invocation shim.
//!
//! A `get_or_add` factory written against a real cache expects the pending
//! entry as its argument. The shim hands it a placeholder carrying only the
//! key; whatever the factory sets on it is dropped with it.

use lazycache_core::{CacheEntry, CacheResult};

use crate::substrate::{AsyncFactory, BoxedValue, SyncFactory};

/// Run a synchronous factory against a placeholder handle for `key`.
pub fn invoke_factory(key: &str, factory: SyncFactory<'_>) -> CacheResult<BoxedValue> {
    let mut handle = CacheEntry::placeholder(key);
    tracing::trace!(key, "Invoking factory");
    factory(&mut handle)
}

/// Run an asynchronous factory against a placeholder handle for `key` and
/// wait for it to settle.
pub async fn invoke_async_factory(key: &str, factory: AsyncFactory<'_>) -> CacheResult<BoxedValue> {
    tracing::trace!(key, "Invoking async factory");
    factory(CacheEntry::placeholder(key)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::{downcast, erase};
    use futures_util::FutureExt;
    use lazycache_core::{CacheError, CacheItemPriority};
    use std::time::Duration;

    #[test]
    fn test_factory_sees_key_and_may_mutate_handle() {
        let value = invoke_factory(
            "SomethingInTheCache",
            Box::new(|entry: &mut CacheEntry| {
                assert_eq!(entry.key(), "SomethingInTheCache");
                entry.sliding_expiration = Some(Duration::from_secs(5));
                entry.priority = CacheItemPriority::High;
                Ok(erase(entry.key().len()))
            }),
        )
        .unwrap();

        assert_eq!(downcast::<usize>(value).unwrap(), "SomethingInTheCache".len());
    }

    #[test]
    fn test_factory_error_is_returned_unmodified() {
        let result = invoke_factory(
            "k",
            Box::new(|_entry: &mut CacheEntry| Err(CacheError::factory("k", "boom"))),
        );
        assert_eq!(result.unwrap_err(), CacheError::factory("k", "boom"));
    }

    #[tokio::test]
    async fn test_async_factory_is_awaited() {
        let value = invoke_async_factory(
            "k",
            Box::new(|entry: CacheEntry| {
                async move {
                    tokio::task::yield_now().await;
                    Ok(erase(format!("{}-computed", entry.key())))
                }
                .boxed()
            }),
        )
        .await
        .unwrap();

        assert_eq!(downcast::<String>(value).unwrap(), "k-computed");
    }
}
