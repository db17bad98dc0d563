//! No-setup adapter for the pre-call routing engine.

use async_trait::async_trait;
use lazycache_core::CacheResult;

use super::{complete_get_or_add, complete_get_or_add_async, install_from_add, log_unmatched, CallClass};
use crate::engine::{CallHandler, RouteAction};
use crate::substrate::{Call, DoubleCore};

/// Decides the reply of every unmatched call before it returns.
#[derive(Debug, Clone)]
pub struct NoSetUpHandler {
    log_unmatched: bool,
}

impl Default for NoSetUpHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl NoSetUpHandler {
    pub fn new() -> Self {
        Self {
            log_unmatched: true,
        }
    }

    pub fn with_unmatched_call_logging(mut self, enabled: bool) -> Self {
        self.log_unmatched = enabled;
        self
    }

    fn classify(&self, call: &Call<'_>) -> CallClass {
        let class = CallClass::classify(call.operation());
        log_unmatched(self.log_unmatched, call.operation(), call.key(), class);
        class
    }
}

#[async_trait]
impl CallHandler for NoSetUpHandler {
    fn handle(&self, core: &DoubleCore, call: &mut Call<'_>) -> CacheResult<RouteAction> {
        let class = self.classify(call);
        route(core, call, class)
    }

    async fn handle_async<'c>(
        &self,
        core: &DoubleCore,
        call: &mut Call<'c>,
    ) -> CacheResult<RouteAction> {
        let class = self.classify(call);
        if class == CallClass::GetOrAddAsync {
            let reply = complete_get_or_add_async(core, call).await?;
            return Ok(RouteAction::Return(reply));
        }
        route(core, call, class)
    }
}

fn route(core: &DoubleCore, call: &mut Call<'_>, class: CallClass) -> CacheResult<RouteAction> {
    match class {
        CallClass::Add => {
            install_from_add(core, call.key(), call.value())?;
            Ok(RouteAction::Return(call.declared().zero_reply()))
        }
        CallClass::GetOrAdd => Ok(RouteAction::Return(complete_get_or_add(core, call)?)),
        CallClass::GetOrAddAsync | CallClass::Other => Ok(RouteAction::Continue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{DoubleEngine, RoutingDouble};
    use crate::substrate::{downcast, erase, Argument, Operation, Reply, ReturnShape};
    use futures_util::FutureExt;
    use lazycache_core::{CacheEntry, CacheError};
    use std::sync::Arc;

    fn double() -> RoutingDouble {
        let double = RoutingDouble::new().with_handler(Arc::new(NoSetUpHandler::new()));
        double.core().types().register::<String>().unwrap();
        double
    }

    fn get(double: &RoutingDouble, key: &str) -> String {
        let call = Call::new(Operation::Get, ReturnShape::of::<String>())
            .with_type_arg::<String>()
            .arg(Argument::Key(key.to_string()));
        downcast::<String>(double.invoke(call).unwrap().into_value().unwrap()).unwrap()
    }

    #[test]
    fn test_unmatched_add_installs_cell_before_returning() {
        let double = double();
        let add = Call::new(Operation::Add, ReturnShape::Void)
            .with_type_arg::<String>()
            .arg(Argument::Key("k".to_string()))
            .arg(Argument::Value(erase("v".to_string())));

        assert!(matches!(double.invoke(add).unwrap(), Reply::Void));
        assert_eq!(get(&double, "k"), "v");
    }

    #[test]
    fn test_factory_error_installs_nothing() {
        let double = double();
        let call = Call::new(Operation::GetOrAdd, ReturnShape::of::<String>())
            .with_type_arg::<String>()
            .arg(Argument::Key("k".to_string()))
            .arg(Argument::Factory(Some(Box::new(|_: &mut CacheEntry| {
                Err(CacheError::factory("k", "boom"))
            }))));

        assert_eq!(double.invoke(call).unwrap_err(), CacheError::factory("k", "boom"));
        assert!(double.core().patterns().unwrap().is_empty());
        assert_eq!(get(&double, "k"), "");
    }

    #[tokio::test]
    async fn test_async_factory_result_is_installed() {
        let double = double();
        let call = Call::new(Operation::GetOrAddAsync, ReturnShape::of::<String>())
            .with_type_arg::<String>()
            .arg(Argument::Key("k".to_string()))
            .arg(Argument::AsyncFactory(Some(Box::new(|entry: CacheEntry| {
                async move { Ok(erase(entry.key().to_uppercase())) }.boxed()
            }))));

        let reply = double.invoke_async(call).await.unwrap();
        assert_eq!(downcast::<String>(reply.into_value().unwrap()).unwrap(), "K");
        assert_eq!(get(&double, "k"), "K");
    }
}
