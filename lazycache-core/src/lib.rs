//! LazyCache Core - Contract Types
//!
//! The lazy compute-once keyed cache contract (`add`, `get`, `get_or_add`,
//! `remove`, sync and async) and the data types it passes around.
//! This crate contains no cache implementation and no test double; both live
//! downstream and depend on this.

pub mod config;
pub mod contract;
pub mod entry;
pub mod error;
pub mod value;

pub use config::{DoubleConfig, EngineKind, ENGINE_ENV_VAR};
pub use contract::{validate_key, validate_value, AppCache};
pub use entry::{CacheDefaults, CacheEntry, CacheItemPriority, EntryOptions};
pub use error::{CacheError, CacheResult, ConfigError};
pub use value::CacheValue;
