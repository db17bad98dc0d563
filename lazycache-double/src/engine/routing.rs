//! Double-engine with a pre-call routing hook shape.
//!
//! Every unmatched call, void or not, is offered to the registered
//! [`CallHandler`]s before any value is produced. The first handler that
//! returns [`RouteAction::Return`] decides the reply.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use lazycache_core::{CacheResult, EngineKind};

use super::DoubleEngine;
use crate::substrate::{Call, DoubleCore, Reply};

/// What a handler decided for a routed call.
#[derive(Debug, Clone)]
pub enum RouteAction {
    /// Answer the call with this reply.
    Return(Reply),
    /// Not handled here; try the next handler.
    Continue,
}

/// Receives unmatched calls before a return value exists.
#[async_trait]
pub trait CallHandler: Send + Sync {
    fn handle(&self, core: &DoubleCore, call: &mut Call<'_>) -> CacheResult<RouteAction>;

    async fn handle_async<'c>(
        &self,
        core: &DoubleCore,
        call: &mut Call<'c>,
    ) -> CacheResult<RouteAction>;
}

/// Records every call, answers from setups, routes the rest.
pub struct RoutingDouble {
    core: DoubleCore,
    handlers: Vec<Arc<dyn CallHandler>>,
}

impl Default for RoutingDouble {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutingDouble {
    pub fn new() -> Self {
        Self::with_core(DoubleCore::new())
    }

    pub fn with_core(core: DoubleCore) -> Self {
        Self {
            core,
            handlers: Vec::new(),
        }
    }

    /// Route unmatched calls through `handler` after the ones already added.
    pub fn with_handler(mut self, handler: Arc<dyn CallHandler>) -> Self {
        self.handlers.push(handler);
        self
    }
}

#[async_trait]
impl DoubleEngine for RoutingDouble {
    fn kind(&self) -> EngineKind {
        EngineKind::Routing
    }

    fn core(&self) -> &DoubleCore {
        &self.core
    }

    fn invoke(&self, mut call: Call<'_>) -> CacheResult<Reply> {
        if let Some(reply) = self.core.dispatch(&call)? {
            return Ok(reply);
        }
        for handler in &self.handlers {
            if let RouteAction::Return(reply) = handler.handle(&self.core, &mut call)? {
                return Ok(reply);
            }
        }
        Ok(call.declared().zero_reply())
    }

    async fn invoke_async<'c>(&self, mut call: Call<'c>) -> CacheResult<Reply> {
        let matched = self.core.dispatch(&call)?;
        if let Some(reply) = matched {
            return Ok(reply);
        }
        for handler in &self.handlers {
            let action = handler.handle_async(&self.core, &mut call).await?;
            if let RouteAction::Return(reply) = action {
                return Ok(reply);
            }
        }
        Ok(call.declared().zero_reply())
    }
}

impl fmt::Debug for RoutingDouble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingDouble")
            .field("core", &self.core)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::{downcast, erase, Argument, Operation, ReturnShape, Setup};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers only `Remove`, counting what it sees.
    #[derive(Default)]
    struct RemoveOnly {
        seen: AtomicUsize,
    }

    #[async_trait]
    impl CallHandler for RemoveOnly {
        fn handle(&self, _core: &DoubleCore, call: &mut Call<'_>) -> CacheResult<RouteAction> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            if call.operation() == Operation::Remove {
                return Ok(RouteAction::Return(Reply::Void));
            }
            Ok(RouteAction::Continue)
        }

        async fn handle_async<'c>(
            &self,
            core: &DoubleCore,
            call: &mut Call<'c>,
        ) -> CacheResult<RouteAction> {
            self.handle(core, call)
        }
    }

    struct Fixed(u32);

    #[async_trait]
    impl CallHandler for Fixed {
        fn handle(&self, _core: &DoubleCore, _call: &mut Call<'_>) -> CacheResult<RouteAction> {
            Ok(RouteAction::Return(Reply::Value(erase(self.0))))
        }

        async fn handle_async<'c>(
            &self,
            core: &DoubleCore,
            call: &mut Call<'c>,
        ) -> CacheResult<RouteAction> {
            self.handle(core, call)
        }
    }

    fn get_call(key: &str) -> Call<'static> {
        Call::new(Operation::Get, ReturnShape::of::<u32>())
            .with_type_arg::<u32>()
            .arg(Argument::Key(key.to_string()))
    }

    fn value_of(reply: Reply) -> u32 {
        downcast::<u32>(reply.into_value().unwrap()).unwrap()
    }

    #[test]
    fn test_void_calls_are_routed_too() {
        let handler = Arc::new(RemoveOnly::default());
        let double = RoutingDouble::new().with_handler(handler.clone());

        let remove =
            Call::new(Operation::Remove, ReturnShape::Void).arg(Argument::Key("k".to_string()));
        assert!(matches!(double.invoke(remove).unwrap(), Reply::Void));
        assert_eq!(handler.seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_first_returning_handler_wins() {
        let first = Arc::new(RemoveOnly::default());
        let double = RoutingDouble::new()
            .with_handler(first.clone())
            .with_handler(Arc::new(Fixed(3)))
            .with_handler(Arc::new(Fixed(4)));

        assert_eq!(value_of(double.invoke(get_call("k")).unwrap()), 3);
        assert_eq!(first.seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_all_continue_yields_zero() {
        let double = RoutingDouble::new().with_handler(Arc::new(RemoveOnly::default()));
        assert_eq!(value_of(double.invoke(get_call("k")).unwrap()), 0);
    }

    #[tokio::test]
    async fn test_matched_calls_skip_handlers() {
        let handler = Arc::new(RemoveOnly::default());
        let core = DoubleCore::new().with_setup(
            Setup::new(Operation::GetAsync).for_key("k").of_type::<u32>().returns(8u32),
        );
        let double = RoutingDouble::with_core(core).with_handler(handler.clone());

        let call = Call::new(Operation::GetAsync, ReturnShape::of::<u32>())
            .with_type_arg::<u32>()
            .arg(Argument::Key("k".to_string()));
        assert_eq!(value_of(double.invoke_async(call).await.unwrap()), 8);
        assert_eq!(handler.seen.load(Ordering::SeqCst), 0);
    }
}
