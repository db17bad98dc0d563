//! The lazy compute-once cache contract.
//!
//! Every operation addresses a single logical entry per key. Storage is
//! untyped; the accessors are typed per call, so a key written as one type
//! and read as another simply misses.

use std::future::Future;

use async_trait::async_trait;

use crate::entry::{CacheDefaults, CacheEntry, EntryOptions};
use crate::error::{CacheError, CacheResult};
use crate::value::CacheValue;

/// Reject empty keys before anything else happens.
pub fn validate_key(key: &str) -> CacheResult<()> {
    if key.trim().is_empty() {
        return Err(CacheError::InvalidArgument {
            name: "key",
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Reject absent values on write.
pub fn validate_value<T: CacheValue>(value: &T) -> CacheResult<()> {
    if value.is_absent() {
        return Err(CacheError::ArgumentNull { name: "item" });
    }
    Ok(())
}

/// Lazy compute-once keyed cache.
///
/// # Semantics
///
/// - `add` overwrites the entry for a key (last write wins)
/// - `get` returns the entry's value when present and of the requested type,
///   otherwise the type's zero value
/// - `get_or_add` returns the existing value or invokes the factory exactly
///   once, stores the result and returns it
/// - `remove` resets the entry so later reads see the zero value
///
/// Factory errors are returned to the caller unmodified and leave no entry
/// behind.
#[async_trait]
pub trait AppCache: Send + Sync {
    /// Store `value` under `key` with explicit options.
    fn add_with_options<T: CacheValue>(
        &self,
        key: &str,
        value: T,
        options: EntryOptions,
    ) -> CacheResult<()>;

    /// Read the value stored under `key`.
    fn get<T: CacheValue>(&self, key: &str) -> CacheResult<T>;

    /// Read the value stored under `key` asynchronously.
    async fn get_async<T: CacheValue>(&self, key: &str) -> CacheResult<T>;

    /// Return the value under `key`, computing it with `factory` on a miss.
    fn get_or_add_with_entry<T, F>(
        &self,
        key: &str,
        factory: F,
        options: Option<EntryOptions>,
    ) -> CacheResult<T>
    where
        T: CacheValue,
        F: FnOnce(&mut CacheEntry) -> CacheResult<T> + Send;

    /// Async counterpart of [`AppCache::get_or_add_with_entry`].
    async fn get_or_add_async_with_entry<T, F, Fut>(
        &self,
        key: &str,
        factory: F,
        options: Option<EntryOptions>,
    ) -> CacheResult<T>
    where
        T: CacheValue,
        F: FnOnce(CacheEntry) -> Fut + Send,
        Fut: Future<Output = CacheResult<T>> + Send;

    /// Reset the entry under `key`.
    fn remove(&self, key: &str) -> CacheResult<()>;

    /// Cache-wide defaults applied by the convenience methods.
    fn default_cache_policy(&self) -> CacheResult<CacheDefaults>;

    // === Convenience surface ===

    /// Store `value` under `key` using the default cache policy.
    ///
    /// Fails with [`CacheError::ArgumentNull`] when `value` is absent.
    fn add<T: CacheValue>(&self, key: &str, value: T) -> CacheResult<()> {
        validate_key(key)?;
        validate_value(&value)?;
        let options = self.default_cache_policy()?.build_options();
        self.add_with_options(key, value, options)
    }

    /// Return the value under `key`, computing it with `factory` on a miss.
    fn get_or_add<T, F>(&self, key: &str, factory: F) -> CacheResult<T>
    where
        T: CacheValue,
        F: FnOnce() -> CacheResult<T> + Send,
    {
        self.get_or_add_with_entry(key, move |_entry: &mut CacheEntry| factory(), None)
    }

    /// [`AppCache::get_or_add`] with explicit options.
    fn get_or_add_with_options<T, F>(
        &self,
        key: &str,
        factory: F,
        options: EntryOptions,
    ) -> CacheResult<T>
    where
        T: CacheValue,
        F: FnOnce() -> CacheResult<T> + Send,
    {
        self.get_or_add_with_entry(key, move |_entry: &mut CacheEntry| factory(), Some(options))
    }

    /// Async counterpart of [`AppCache::get_or_add`].
    async fn get_or_add_async<T, F, Fut>(&self, key: &str, factory: F) -> CacheResult<T>
    where
        T: CacheValue,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = CacheResult<T>> + Send,
    {
        self.get_or_add_async_with_entry(key, move |_entry: CacheEntry| factory(), None)
            .await
    }

    /// Async counterpart of [`AppCache::get_or_add_with_options`].
    async fn get_or_add_async_with_options<T, F, Fut>(
        &self,
        key: &str,
        factory: F,
        options: EntryOptions,
    ) -> CacheResult<T>
    where
        T: CacheValue,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = CacheResult<T>> + Send,
    {
        self.get_or_add_async_with_entry(key, move |_entry: CacheEntry| factory(), Some(options))
            .await
    }
}
