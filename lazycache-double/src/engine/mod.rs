//! Double-engines.
//!
//! Two engines with structurally different hooks for calls nobody set up:
//! [`RecordingDouble`] only lets you look back at the history after a call,
//! [`RoutingDouble`] hands you the call before a value exists. [`AnyDouble`]
//! puts either behind one type.

pub mod recording;
pub mod routing;

use async_trait::async_trait;
use lazycache_core::{CacheResult, EngineKind};

use crate::substrate::{Call, DoubleCore, Reply};

pub use recording::{CallObserver, DefaultValueProvider, RecordingDouble};
pub use routing::{CallHandler, RouteAction, RoutingDouble};

/// Uniform interface over the double-engines.
#[async_trait]
pub trait DoubleEngine: Send + Sync {
    fn kind(&self) -> EngineKind;

    /// Setup table, invocation history and type registry.
    fn core(&self) -> &DoubleCore;

    /// Record and answer a synchronous call.
    fn invoke(&self, call: Call<'_>) -> CacheResult<Reply>;

    /// Record and answer an asynchronous call.
    async fn invoke_async<'c>(&self, call: Call<'c>) -> CacheResult<Reply>;
}

/// Either engine.
#[derive(Debug)]
pub enum AnyDouble {
    History(RecordingDouble),
    Routing(RoutingDouble),
}

impl From<RecordingDouble> for AnyDouble {
    fn from(double: RecordingDouble) -> Self {
        AnyDouble::History(double)
    }
}

impl From<RoutingDouble> for AnyDouble {
    fn from(double: RoutingDouble) -> Self {
        AnyDouble::Routing(double)
    }
}

#[async_trait]
impl DoubleEngine for AnyDouble {
    fn kind(&self) -> EngineKind {
        match self {
            AnyDouble::History(double) => double.kind(),
            AnyDouble::Routing(double) => double.kind(),
        }
    }

    fn core(&self) -> &DoubleCore {
        match self {
            AnyDouble::History(double) => double.core(),
            AnyDouble::Routing(double) => double.core(),
        }
    }

    fn invoke(&self, call: Call<'_>) -> CacheResult<Reply> {
        match self {
            AnyDouble::History(double) => double.invoke(call),
            AnyDouble::Routing(double) => double.invoke(call),
        }
    }

    async fn invoke_async<'c>(&self, call: Call<'c>) -> CacheResult<Reply> {
        match self {
            AnyDouble::History(double) => double.invoke_async(call).await,
            AnyDouble::Routing(double) => double.invoke_async(call).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_double_reports_kind() {
        assert_eq!(AnyDouble::from(RecordingDouble::new()).kind(), EngineKind::History);
        assert_eq!(AnyDouble::from(RoutingDouble::new()).kind(), EngineKind::Routing);
    }
}
