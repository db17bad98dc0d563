//! Values that can live in a cache cell.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entry::CacheDefaults;

/// Marker trait for types that can be stored in and read from the cache.
///
/// The contract is untyped storage with typed accessors, so a value must be
/// able to describe its zero value (`Default`) and be handed out repeatedly
/// (`Clone`). `Any` lets the test double carry it across erased call
/// boundaries and recover the concrete type afterwards.
///
/// # Implementation Requirements
///
/// - `Default` must produce the value a miss returns (`Uuid::nil()`, `0`,
///   `None`, an empty string)
/// - `is_absent()` returns `true` only for values that represent "no value"
///   (the contract rejects those on `add`)
pub trait CacheValue: Any + Clone + Default + Debug + Send + Sync {
    /// Whether this value stands for "nothing".
    fn is_absent(&self) -> bool {
        false
    }
}

macro_rules! impl_cache_value {
    ($($ty:ty),* $(,)?) => {
        $(impl CacheValue for $ty {})*
    };
}

impl_cache_value!(
    bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
    String, Uuid, DateTime<Utc>, CacheDefaults, (),
);

impl<T: CacheValue> CacheValue for Option<T> {
    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

impl<T: CacheValue> CacheValue for Vec<T> {}

impl<K, V> CacheValue for HashMap<K, V>
where
    K: CacheValue + Eq + Hash,
    V: CacheValue,
{
}

impl<K, V> CacheValue for BTreeMap<K, V>
where
    K: CacheValue + Ord,
    V: CacheValue,
{
}

impl CacheValue for serde_json::Value {
    fn is_absent(&self) -> bool {
        self.is_null()
    }
}
