//! Double-engine with a post-call hook shape.
//!
//! Unmatched calls that expect a value are answered by a
//! [`DefaultValueProvider`]. Unmatched void calls return straight away with
//! no hook at all; the only way to react to them is a [`CallObserver`], which
//! runs after every recorded call and is handed the invocation that call
//! logged.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use lazycache_core::{CacheResult, EngineKind};

use super::DoubleEngine;
use crate::substrate::{Call, DoubleCore, Invocation, Reply};

/// Produces the return value of an unmatched, non-void call.
///
/// `invocation` is the history record of `call` itself.
#[async_trait]
pub trait DefaultValueProvider: Send + Sync {
    fn default_value(
        &self,
        core: &DoubleCore,
        invocation: &Invocation,
        call: &mut Call<'_>,
    ) -> CacheResult<Reply>;

    async fn default_value_async<'c>(
        &self,
        core: &DoubleCore,
        invocation: &Invocation,
        call: &mut Call<'c>,
    ) -> CacheResult<Reply>;
}

/// Runs after every recorded call on the double, matched or not, failed or
/// not, with the invocation that call logged.
pub trait CallObserver: Send + Sync {
    fn call_completed(&self, core: &DoubleCore, invocation: &Invocation) -> CacheResult<()>;
}

/// Records every call, answers from setups, defers the rest to hooks.
pub struct RecordingDouble {
    core: DoubleCore,
    provider: Option<Arc<dyn DefaultValueProvider>>,
    observers: Vec<Arc<dyn CallObserver>>,
}

impl Default for RecordingDouble {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDouble {
    pub fn new() -> Self {
        Self::with_core(DoubleCore::new())
    }

    pub fn with_core(core: DoubleCore) -> Self {
        Self {
            core,
            provider: None,
            observers: Vec::new(),
        }
    }

    /// Replace the provider consulted for unmatched non-void calls.
    pub fn with_default_value_provider(mut self, provider: Arc<dyn DefaultValueProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Add an observer run after every call.
    pub fn with_observer(mut self, observer: Arc<dyn CallObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    fn answer(
        &self,
        invocation: &Invocation,
        matched: Option<Reply>,
        call: &mut Call<'_>,
    ) -> CacheResult<Reply> {
        if let Some(reply) = matched {
            return Ok(reply);
        }
        if call.declared().is_void() {
            return Ok(Reply::Void);
        }
        match &self.provider {
            Some(provider) => provider.default_value(&self.core, invocation, call),
            None => Ok(call.declared().zero_reply()),
        }
    }

    async fn answer_async(
        &self,
        invocation: &Invocation,
        matched: Option<Reply>,
        call: &mut Call<'_>,
    ) -> CacheResult<Reply> {
        if let Some(reply) = matched {
            return Ok(reply);
        }
        let declared = call.declared();
        if declared.is_void() {
            return Ok(Reply::Void);
        }
        match &self.provider {
            Some(provider) => provider.default_value_async(&self.core, invocation, call).await,
            None => Ok(declared.zero_reply()),
        }
    }

    /// Run every observer. An observer failure only surfaces when the call
    /// itself succeeded.
    fn notify(&self, invocation: &Invocation, result: CacheResult<Reply>) -> CacheResult<Reply> {
        let mut result = result;
        for observer in &self.observers {
            if let Err(err) = observer.call_completed(&self.core, invocation) {
                if result.is_ok() {
                    result = Err(err);
                } else {
                    tracing::warn!(error = %err, "Call observer failed after a failed call");
                }
            }
        }
        result
    }
}

#[async_trait]
impl DoubleEngine for RecordingDouble {
    fn kind(&self) -> EngineKind {
        EngineKind::History
    }

    fn core(&self) -> &DoubleCore {
        &self.core
    }

    fn invoke(&self, mut call: Call<'_>) -> CacheResult<Reply> {
        let (invocation, matched) = self.core.record(&call)?;
        let result = self.answer(&invocation, matched, &mut call);
        self.notify(&invocation, result)
    }

    async fn invoke_async<'c>(&self, mut call: Call<'c>) -> CacheResult<Reply> {
        let (invocation, matched) = self.core.record(&call)?;
        let result = self.answer_async(&invocation, matched, &mut call).await;
        self.notify(&invocation, result)
    }
}

impl fmt::Debug for RecordingDouble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingDouble")
            .field("core", &self.core)
            .field("has_provider", &self.provider.is_some())
            .field("observers", &self.observers.len())
            .finish()
    }
}
