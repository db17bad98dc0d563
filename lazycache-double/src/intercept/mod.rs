//! No-setup interception.
//!
//! When a call reaches the double with no configured response, it is
//! classified by operation name and answered so that the cache contract keeps
//! holding:
//!
//! | Class            | Action                                           | Reply                 |
//! |------------------|--------------------------------------------------|-----------------------|
//! | `Add*`           | install a cell from the key and value arguments  | declared zero         |
//! | `GetOrAdd`       | run the factory, install a cell from its result  | the factory result    |
//! | `GetOrAddAsync`  | await the factory, install a cell from its result| the factory result    |
//! | anything else    | nothing                                          | declared zero         |
//!
//! Factory errors propagate unmodified and install nothing. Both adapters
//! share this logic and differ only in how their engine hands them the call.

pub mod history;
pub mod routing;

use lazycache_core::CacheResult;

use crate::cell::{resolve_and_install, Resolution};
use crate::shim::{invoke_async_factory, invoke_factory};
use crate::substrate::{BoxedValue, Call, DoubleCore, Operation, Reply, ReturnShape};

pub use history::HistoryInterceptor;
pub use routing::NoSetUpHandler;

/// Classification of an unmatched call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallClass {
    Add,
    GetOrAdd,
    GetOrAddAsync,
    Other,
}

impl CallClass {
    /// Classify by case-insensitive operation name prefix.
    pub fn classify(operation: Operation) -> Self {
        let name = operation.name().to_ascii_lowercase();
        if name.starts_with("getoradd") {
            if operation.is_async() {
                CallClass::GetOrAddAsync
            } else {
                CallClass::GetOrAdd
            }
        } else if name.starts_with("add") {
            CallClass::Add
        } else {
            CallClass::Other
        }
    }
}

/// Install a cell from an unmatched `add`.
pub(crate) fn install_from_add(
    core: &DoubleCore,
    key: Option<&str>,
    value: Option<&BoxedValue>,
) -> CacheResult<()> {
    let (Some(key), Some(value)) = (key, value) else {
        tracing::warn!(?key, "Unmatched add without key or value arguments");
        return Ok(());
    };
    resolve_and_install(core, key, value)?;
    Ok(())
}

/// Run the synchronous factory of an unmatched `get_or_add` and install its
/// result.
pub(crate) fn complete_get_or_add(core: &DoubleCore, call: &mut Call<'_>) -> CacheResult<Reply> {
    let declared = call.declared();
    let Some(key) = call.key().map(str::to_owned) else {
        return Ok(declared.zero_reply());
    };
    let Some(factory) = call.take_factory() else {
        tracing::warn!(key = %key, "Unmatched get_or_add without a factory");
        return Ok(declared.zero_reply());
    };

    let value = invoke_factory(&key, factory)?;
    settle(core, &key, declared, value)
}

/// Async counterpart of [`complete_get_or_add`]. Suspends only while the
/// factory's own future is pending.
pub(crate) async fn complete_get_or_add_async(
    core: &DoubleCore,
    call: &mut Call<'_>,
) -> CacheResult<Reply> {
    let declared = call.declared();
    let Some(key) = call.key().map(str::to_owned) else {
        return Ok(declared.zero_reply());
    };
    let Some(factory) = call.take_async_factory() else {
        tracing::warn!(key = %key, "Unmatched get_or_add_async without a factory");
        return Ok(declared.zero_reply());
    };

    let value = invoke_async_factory(&key, factory).await?;
    settle(core, &key, declared, value)
}

fn settle(
    core: &DoubleCore,
    key: &str,
    declared: ReturnShape,
    value: BoxedValue,
) -> CacheResult<Reply> {
    match resolve_and_install(core, key, &value)? {
        Resolution::Installed(_) => Ok(Reply::Value(value)),
        Resolution::Unresolved => Ok(declared.zero_reply()),
    }
}

fn log_unmatched(enabled: bool, operation: Operation, key: Option<&str>, class: CallClass) {
    if enabled {
        tracing::debug!(%operation, ?key, ?class, "Call had no setup");
    }
}
