//! No-setup adapter for the post-call engine.
//!
//! [`RecordingDouble`](crate::engine::RecordingDouble) never hands a void
//! call to a hook, so an unmatched `add` is only noticed afterwards: the
//! observer looks at the invocation the finished call logged and installs the
//! cell if that was an unmatched `add`. Value-returning calls go through the
//! default value provider, which classifies the same logged invocation.

use async_trait::async_trait;

use lazycache_core::CacheResult;

use super::{complete_get_or_add, complete_get_or_add_async, install_from_add, log_unmatched, CallClass};
use crate::engine::{CallObserver, DefaultValueProvider};
use crate::substrate::{Call, DoubleCore, Invocation, Reply};

/// Inspects logged invocations to keep the double contract-consistent.
#[derive(Debug, Clone)]
pub struct HistoryInterceptor {
    log_unmatched: bool,
}

impl Default for HistoryInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryInterceptor {
    pub fn new() -> Self {
        Self {
            log_unmatched: true,
        }
    }

    pub fn with_unmatched_call_logging(mut self, enabled: bool) -> Self {
        self.log_unmatched = enabled;
        self
    }

    /// Class of `invocation` when no setup answered it.
    fn unmatched_class(&self, invocation: &Invocation) -> Option<CallClass> {
        if invocation.matched {
            return None;
        }
        let class = CallClass::classify(invocation.operation);
        log_unmatched(self.log_unmatched, invocation.operation, invocation.key(), class);
        Some(class)
    }
}

#[async_trait]
impl DefaultValueProvider for HistoryInterceptor {
    fn default_value(
        &self,
        core: &DoubleCore,
        invocation: &Invocation,
        call: &mut Call<'_>,
    ) -> CacheResult<Reply> {
        match self.unmatched_class(invocation) {
            Some(CallClass::GetOrAdd) => complete_get_or_add(core, call),
            _ => Ok(call.declared().zero_reply()),
        }
    }

    async fn default_value_async<'c>(
        &self,
        core: &DoubleCore,
        invocation: &Invocation,
        call: &mut Call<'c>,
    ) -> CacheResult<Reply> {
        match self.unmatched_class(invocation) {
            Some(CallClass::GetOrAddAsync) => complete_get_or_add_async(core, call).await,
            Some(CallClass::GetOrAdd) => complete_get_or_add(core, call),
            _ => Ok(call.declared().zero_reply()),
        }
    }
}

impl CallObserver for HistoryInterceptor {
    fn call_completed(&self, core: &DoubleCore, invocation: &Invocation) -> CacheResult<()> {
        if invocation.matched || CallClass::classify(invocation.operation) != CallClass::Add {
            return Ok(());
        }
        log_unmatched(self.log_unmatched, invocation.operation, invocation.key(), CallClass::Add);
        install_from_add(core, invocation.key(), invocation.value())
    }
}
