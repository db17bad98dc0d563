//! LazyCache Double - Self-Configuring Test Double
//!
//! A mocked caching service that keeps the cache contract's observable
//! semantics for calls nobody configured: last write wins, `get_or_add`
//! computes once, misses return the zero value, and `remove` resets.
//!
//! # Architecture
//!
//! ```text
//! MockCache (typed AppCache front end)
//!     │
//!     ▼
//! DoubleEngine ── RecordingDouble (post-call hooks)
//!     │        └─ RoutingDouble  (pre-call routing)
//!     │ unmatched call
//!     ▼
//! intercept ── HistoryInterceptor / NoSetUpHandler
//!     │
//!     ├─ shim      (runs get_or_add factories on a placeholder entry)
//!     ├─ resolver  (runtime type tag → typed installer)
//!     └─ installer (Add / Get family / Remove setups for one key)
//! ```
//!
//! ```ignore
//! use lazycache_core::AppCache;
//! use lazycache_double::create::mocked_caching_service;
//!
//! let cache = mocked_caching_service();
//! let first = cache.get_or_add("answer", || Ok(42u32))?;
//! let second = cache.get_or_add("answer", || Ok(0u32))?;
//! assert_eq!(first, second);
//! ```

pub mod cell;
pub mod create;
pub mod engine;
pub mod intercept;
pub mod mock;
pub mod seed;
pub mod shim;
pub mod substrate;
pub mod verify;

pub use cell::{install_cell, Resolution, TypeRegistry};
pub use create::{from_config, history_mock, mocked_caching_service, routing_mock};
pub use engine::{
    AnyDouble, CallHandler, CallObserver, DefaultValueProvider, DoubleEngine, RecordingDouble,
    RouteAction, RoutingDouble,
};
pub use intercept::{CallClass, HistoryInterceptor, NoSetUpHandler};
pub use mock::MockCache;
pub use seed::{set_up_cell, set_up_cell_add, set_up_cell_get, set_up_cell_remove};
pub use substrate::{DoubleCore, Invocation, Operation, Setup};
pub use verify::Times;
