//! Explicit cell seeding for tests that prefer to configure state up front.

use lazycache_core::{CacheResult, CacheValue};

use crate::cell::installer;
use crate::engine::DoubleEngine;
use crate::mock::MockCache;

/// Pre-seed `key` with `value`, exactly as a first `add` would.
///
/// Reads of `T` return `value` without invoking factories, a later `add` of
/// a `T` overwrites it and `remove` resets it to `T::default()`.
pub fn set_up_cell<T, E>(cache: &MockCache<E>, key: &str, value: T) -> CacheResult<()>
where
    T: CacheValue,
    E: DoubleEngine,
{
    installer::install_cell(cache.double(), key, value)
}

/// Only make a later `add` of a `T` for `key` update the cell.
pub fn set_up_cell_add<T, E>(cache: &MockCache<E>, key: &str) -> CacheResult<()>
where
    T: CacheValue,
    E: DoubleEngine,
{
    lazycache_core::validate_key(key)?;
    cache.double().types().register::<T>()?;
    installer::install_add::<T>(cache.double(), key)
}

/// Only answer reads of `T` for `key` with `value`.
pub fn set_up_cell_get<T, E>(cache: &MockCache<E>, key: &str, value: T) -> CacheResult<()>
where
    T: CacheValue,
    E: DoubleEngine,
{
    lazycache_core::validate_key(key)?;
    cache.double().types().register::<T>()?;
    installer::install_get_family(cache.double(), key, value)
}

/// Only make `remove` of `key` reset reads of `T` to `T::default()`.
pub fn set_up_cell_remove<T, E>(cache: &MockCache<E>, key: &str) -> CacheResult<()>
where
    T: CacheValue,
    E: DoubleEngine,
{
    lazycache_core::validate_key(key)?;
    cache.double().types().register::<T>()?;
    installer::install_remove::<T>(cache.double(), key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create::{history_mock, routing_mock};
    use crate::substrate::Operation;
    use crate::verify::Times;
    use lazycache_core::{AppCache, CacheError};
    use uuid::Uuid;

    #[test]
    fn test_seeded_cell_skips_factory() {
        let cache = history_mock();
        let id = Uuid::new_v4();
        set_up_cell(&cache, "SomethingInTheCache", id).unwrap();

        let value = cache
            .get_or_add("SomethingInTheCache", || -> CacheResult<Uuid> {
                panic!("factory must not run for a seeded cell")
            })
            .unwrap();

        assert_eq!(value, id);
        cache
            .verify(Operation::GetOrAdd, "SomethingInTheCache", Times::Once)
            .unwrap();
    }

    #[test]
    fn test_seeded_cell_resets_on_remove() {
        let cache = routing_mock();
        set_up_cell(&cache, "k", 42i64).unwrap();

        cache.remove("k").unwrap();

        assert_eq!(cache.get::<i64>("k").unwrap(), 0);
    }

    #[test]
    fn test_get_only_seed_ignores_remove() {
        let cache = history_mock();
        set_up_cell_get(&cache, "k", "kept".to_string()).unwrap();

        cache.remove("k").unwrap();

        assert_eq!(cache.get::<String>("k").unwrap(), "kept");
    }

    #[test]
    fn test_partial_seeds_compose() {
        let cache = routing_mock();
        set_up_cell_add::<u32, _>(&cache, "k").unwrap();
        set_up_cell_remove::<u32, _>(&cache, "k").unwrap();

        cache.add("k", 3u32).unwrap();
        assert_eq!(cache.get::<u32>("k").unwrap(), 3);

        cache.remove("k").unwrap();
        assert_eq!(cache.get::<u32>("k").unwrap(), 0);
    }

    #[test]
    fn test_seed_rejects_empty_key() {
        let cache = history_mock();
        assert!(matches!(
            set_up_cell(&cache, "", 1u8),
            Err(CacheError::InvalidArgument { name: "key", .. })
        ));
    }
}
