//! Typed front end: a [`MockCache`] is an [`AppCache`] backed by a
//! double-engine.
//!
//! Every operation validates its key before the double sees anything,
//! registers the value type with the resolver, and downcasts the engine's
//! erased reply back to the requested type.

use std::future::Future;

use async_trait::async_trait;
use futures_util::{FutureExt, TryFutureExt};
use lazycache_core::{
    validate_key, validate_value, AppCache, CacheDefaults, CacheEntry, CacheResult, CacheValue,
    EntryOptions,
};

use crate::engine::{AnyDouble, DoubleEngine};
use crate::substrate::{
    downcast, erase, Argument, AsyncFactory, Call, DoubleCore, Invocation, Operation, Reply,
    ReturnShape, SyncFactory,
};
use crate::verify::{self, Times};

/// A mocked caching service.
#[derive(Debug)]
pub struct MockCache<E: DoubleEngine = AnyDouble> {
    engine: E,
}

impl<E: DoubleEngine> MockCache<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Setups, history and type registry of the underlying double.
    pub fn double(&self) -> &DoubleCore {
        self.engine.core()
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Every call the double has seen so far.
    pub fn invocations(&self) -> CacheResult<Vec<Invocation>> {
        self.double().invocations()
    }

    /// How many times `operation` was invoked for `key`.
    pub fn invocation_count(&self, operation: Operation, key: &str) -> CacheResult<usize> {
        self.double().invocation_count(operation, key)
    }

    /// Fail with [`lazycache_core::CacheError::VerificationFailed`] unless
    /// `operation` was invoked for `key` the expected number of times.
    pub fn verify(&self, operation: Operation, key: &str, times: Times) -> CacheResult<()> {
        verify::verify(self.double(), operation, key, times)
    }

    fn typed_call<'c, T: CacheValue>(&self, operation: Operation, key: &str) -> CacheResult<Call<'c>> {
        validate_key(key)?;
        self.double().types().register::<T>()?;
        Ok(Call::new(operation, ReturnShape::of::<T>())
            .with_type_arg::<T>()
            .arg(Argument::Key(key.to_owned())))
    }
}

/// Recover a `T` from an engine reply. Anything else reads as a miss.
fn typed_reply<T: CacheValue>(operation: Operation, key: &str, reply: Reply) -> T {
    match reply {
        Reply::Value(value) => downcast::<T>(value).unwrap_or_else(|other| {
            tracing::warn!(
                %operation,
                key,
                expected = std::any::type_name::<T>(),
                actual = other.type_tag().name(),
                "Reply of unexpected type, returning zero value"
            );
            T::default()
        }),
        Reply::Void => {
            tracing::warn!(%operation, key, "Void reply to a value call, returning zero value");
            T::default()
        }
    }
}

#[async_trait]
impl<E: DoubleEngine> AppCache for MockCache<E> {
    fn add_with_options<T: CacheValue>(
        &self,
        key: &str,
        value: T,
        options: EntryOptions,
    ) -> CacheResult<()> {
        validate_key(key)?;
        validate_value(&value)?;
        self.double().types().register::<T>()?;

        let call = Call::new(Operation::Add, ReturnShape::Void)
            .with_type_arg::<T>()
            .arg(Argument::Key(key.to_owned()))
            .arg(Argument::Value(erase(value)))
            .arg(Argument::Options(Some(options)));
        self.engine.invoke(call)?;
        Ok(())
    }

    fn get<T: CacheValue>(&self, key: &str) -> CacheResult<T> {
        let call = self.typed_call::<T>(Operation::Get, key)?;
        let reply = self.engine.invoke(call)?;
        Ok(typed_reply(Operation::Get, key, reply))
    }

    async fn get_async<T: CacheValue>(&self, key: &str) -> CacheResult<T> {
        let call = self.typed_call::<T>(Operation::GetAsync, key)?;
        let reply = self.engine.invoke_async(call).await?;
        Ok(typed_reply(Operation::GetAsync, key, reply))
    }

    fn get_or_add_with_entry<T, F>(
        &self,
        key: &str,
        factory: F,
        options: Option<EntryOptions>,
    ) -> CacheResult<T>
    where
        T: CacheValue,
        F: FnOnce(&mut CacheEntry) -> CacheResult<T> + Send,
    {
        let factory: SyncFactory<'_> =
            Box::new(move |entry: &mut CacheEntry| factory(entry).map(erase::<T>));
        let call = self
            .typed_call::<T>(Operation::GetOrAdd, key)?
            .arg(Argument::Factory(Some(factory)))
            .arg(Argument::Options(options));
        let reply = self.engine.invoke(call)?;
        Ok(typed_reply(Operation::GetOrAdd, key, reply))
    }

    async fn get_or_add_async_with_entry<T, F, Fut>(
        &self,
        key: &str,
        factory: F,
        options: Option<EntryOptions>,
    ) -> CacheResult<T>
    where
        T: CacheValue,
        F: FnOnce(CacheEntry) -> Fut + Send,
        Fut: Future<Output = CacheResult<T>> + Send,
    {
        let factory: AsyncFactory<'_> =
            Box::new(move |entry: CacheEntry| factory(entry).map_ok(erase::<T>).boxed());
        let call = self
            .typed_call::<T>(Operation::GetOrAddAsync, key)?
            .arg(Argument::AsyncFactory(Some(factory)))
            .arg(Argument::Options(options));
        let reply = self.engine.invoke_async(call).await?;
        Ok(typed_reply(Operation::GetOrAddAsync, key, reply))
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        validate_key(key)?;
        let call =
            Call::new(Operation::Remove, ReturnShape::Void).arg(Argument::Key(key.to_owned()));
        self.engine.invoke(call)?;
        Ok(())
    }

    fn default_cache_policy(&self) -> CacheResult<CacheDefaults> {
        let call = Call::new(Operation::DefaultCachePolicy, ReturnShape::of::<CacheDefaults>());
        let reply = self.engine.invoke(call)?;
        Ok(typed_reply(Operation::DefaultCachePolicy, "", reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create::{history_mock, routing_mock};
    use lazycache_core::CacheError;
    use uuid::Uuid;

    #[test]
    fn test_empty_key_fails_before_touching_double() {
        let cache = history_mock();

        assert!(matches!(cache.get::<Uuid>(""), Err(CacheError::InvalidArgument { .. })));
        assert!(matches!(cache.remove("  "), Err(CacheError::InvalidArgument { .. })));
        assert!(matches!(
            cache.get_or_add("", || Ok(1u32)),
            Err(CacheError::InvalidArgument { .. })
        ));
        assert!(cache.invocations().unwrap().is_empty());
    }

    #[test]
    fn test_add_rejects_absent_value_before_touching_double() {
        let cache = routing_mock();

        let err = cache.add("k", None::<String>).unwrap_err();
        assert_eq!(err, CacheError::ArgumentNull { name: "item" });
        assert!(cache.invocations().unwrap().is_empty());
        assert_eq!(cache.get::<Option<String>>("k").unwrap(), None);
    }

    #[test]
    fn test_add_uses_default_policy_options() {
        let cache = history_mock();
        cache.add("k", 5u32).unwrap();

        let add = cache
            .invocations()
            .unwrap()
            .into_iter()
            .find(|invocation| invocation.operation == Operation::Add)
            .unwrap();
        assert_eq!(
            add.options().cloned(),
            Some(CacheDefaults::default().build_options())
        );
    }

    #[test]
    fn test_type_mismatch_reads_as_miss() {
        let cache = history_mock();
        cache.add("k", "text".to_string()).unwrap();

        assert_eq!(cache.get::<Uuid>("k").unwrap(), Uuid::nil());
        assert_eq!(cache.get::<String>("k").unwrap(), "text");
    }

    #[tokio::test]
    async fn test_get_async_reads_cell() {
        let cache = routing_mock();
        let id = Uuid::new_v4();
        cache.add("k", id).unwrap();

        assert_eq!(cache.get_async::<Uuid>("k").await.unwrap(), id);
        assert_eq!(cache.get_async::<Uuid>("missing").await.unwrap(), Uuid::nil());
    }
}
