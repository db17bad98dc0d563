//! State shared by every double-engine: setups, invocation history and the
//! type registry.

use std::sync::{Mutex, MutexGuard, PoisonError};

use lazycache_core::{CacheError, CacheResult};

use super::call::{Call, Invocation, Operation, Reply};
use super::setup::{Setup, SetupPattern, SetupTable};
use crate::cell::resolver::TypeRegistry;

/// Configuration table, invocation log and type registry of one double.
///
/// One instance per test. Every mutation happens through short-lived locks
/// that are never held while a setup callback or a factory runs, so callbacks
/// are free to install further setups.
#[derive(Debug, Default)]
pub struct DoubleCore {
    setups: Mutex<SetupTable>,
    invocations: Mutex<Vec<Invocation>>,
    types: TypeRegistry,
}

fn lock<T>(mutex: &Mutex<T>) -> CacheResult<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| CacheError::LockPoisoned)
}

impl DoubleCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`DoubleCore::install`] for a core nobody shares yet.
    pub fn with_setup(mut self, setup: Setup) -> Self {
        self.setups
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .install(setup);
        self
    }

    /// Install a canned response. Identical patterns are replaced.
    pub fn install(&self, setup: Setup) -> CacheResult<()> {
        tracing::trace!(pattern = ?setup.pattern(), "Installing setup");
        lock(&self.setups)?.install(setup);
        Ok(())
    }

    /// Drop every setup bound to exactly `key`.
    pub fn retire_key(&self, key: &str) -> CacheResult<usize> {
        let retired = lock(&self.setups)?.retire_key(key);
        if retired > 0 {
            tracing::trace!(key, retired, "Retired setups");
        }
        Ok(retired)
    }

    /// Patterns of every installed setup, oldest first.
    pub fn patterns(&self) -> CacheResult<Vec<SetupPattern>> {
        Ok(lock(&self.setups)?.patterns())
    }

    /// Patterns bound to exactly `key`, oldest first.
    pub fn patterns_for(&self, key: &str) -> CacheResult<Vec<SetupPattern>> {
        Ok(self
            .patterns()?
            .into_iter()
            .filter(|pattern| pattern.key.is_exactly(key))
            .collect())
    }

    /// Snapshot of the invocation history.
    pub fn invocations(&self) -> CacheResult<Vec<Invocation>> {
        Ok(lock(&self.invocations)?.clone())
    }

    /// Most recent invocation, if any.
    pub fn last_invocation(&self) -> CacheResult<Option<Invocation>> {
        Ok(lock(&self.invocations)?.last().cloned())
    }

    /// Number of recorded invocations of `operation` for `key`.
    pub fn invocation_count(&self, operation: Operation, key: &str) -> CacheResult<usize> {
        Ok(lock(&self.invocations)?
            .iter()
            .filter(|invocation| invocation.operation == operation && invocation.key() == Some(key))
            .count())
    }

    /// Forget the invocation history. Setups are kept.
    pub fn clear_invocations(&self) -> CacheResult<()> {
        lock(&self.invocations)?.clear();
        Ok(())
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Record `call` and answer it from the setup table.
    ///
    /// Returns `None` when no setup matched; the engine decides what an
    /// unmatched call produces. A matched setup's callback runs after the
    /// invocation is logged and before the reply is handed back.
    pub fn dispatch(&self, call: &Call<'_>) -> CacheResult<Option<Reply>> {
        self.record(call).map(|(_, reply)| reply)
    }

    /// [`DoubleCore::dispatch`], also handing back the invocation this call
    /// logged. Hooks that run later must act on this record rather than on
    /// the tail of the history, which nested calls may have extended.
    pub fn record(&self, call: &Call<'_>) -> CacheResult<(Invocation, Option<Reply>)> {
        let answer = lock(&self.setups)?.find(call).map(Setup::answer);

        let invocation = {
            let mut invocations = lock(&self.invocations)?;
            let invocation =
                Invocation::capture(invocations.len() as u64, call, answer.is_some());
            invocations.push(invocation.clone());
            invocation
        };

        let Some((reply, callback)) = answer else {
            return Ok((invocation, None));
        };

        tracing::trace!(
            operation = %invocation.operation,
            key = invocation.key(),
            "Call answered by setup"
        );

        if let Some(callback) = callback {
            callback(self, &invocation)?;
        }
        Ok((invocation, Some(reply)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::call::{Argument, ReturnShape};
    use crate::substrate::value::{downcast_ref, erase};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn remove_call(key: &str) -> Call<'static> {
        Call::new(Operation::Remove, ReturnShape::Void).arg(Argument::Key(key.to_string()))
    }

    #[test]
    fn test_unmatched_call_is_logged() {
        let core = DoubleCore::new();
        let reply = core.dispatch(&remove_call("k")).unwrap();

        assert!(reply.is_none());
        let history = core.invocations().unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].matched);
        assert_eq!(history[0].operation, Operation::Remove);
    }

    #[test]
    fn test_matched_call_runs_callback() {
        let core = DoubleCore::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        core.install(Setup::new(Operation::Remove).for_key("k").callback(move |_, invocation| {
            assert_eq!(invocation.key(), Some("k"));
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
        .unwrap();

        assert!(core.dispatch(&remove_call("k")).unwrap().is_some());
        assert!(core.dispatch(&remove_call("other")).unwrap().is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(core.last_invocation().unwrap().map(|i| !i.matched).unwrap());
    }

    #[test]
    fn test_callback_can_install_setups() {
        let core = DoubleCore::new();
        core.install(Setup::new(Operation::Remove).for_key("k").callback(|core, _| {
            core.install(Setup::new(Operation::Get).for_key("k").of_type::<u32>().returns(9u32))
        }))
        .unwrap();

        core.dispatch(&remove_call("k")).unwrap();

        let get = Call::new(Operation::Get, ReturnShape::of::<u32>())
            .with_type_arg::<u32>()
            .arg(Argument::Key("k".to_string()));
        let reply = core.dispatch(&get).unwrap().and_then(Reply::into_value).unwrap();
        assert_eq!(downcast_ref::<u32>(&reply), Some(&9));
    }

    #[test]
    fn test_record_returns_own_invocation() {
        let core = DoubleCore::new();
        core.dispatch(&remove_call("a")).unwrap();

        let (invocation, reply) = core.record(&remove_call("b")).unwrap();
        assert!(reply.is_none());
        assert_eq!(invocation.sequence, 1);
        assert_eq!(invocation.key(), Some("b"));
    }

    #[test]
    fn test_invocation_count_and_clear() {
        let core = DoubleCore::new();
        core.dispatch(&remove_call("a")).unwrap();
        core.dispatch(&remove_call("a")).unwrap();
        core.dispatch(&remove_call("b")).unwrap();

        let add = Call::new(Operation::Add, ReturnShape::Void)
            .with_type_arg::<u32>()
            .arg(Argument::Key("a".to_string()))
            .arg(Argument::Value(erase(1u32)));
        core.dispatch(&add).unwrap();

        assert_eq!(core.invocation_count(Operation::Remove, "a").unwrap(), 2);
        assert_eq!(core.invocation_count(Operation::Add, "a").unwrap(), 1);

        core.clear_invocations().unwrap();
        assert!(core.invocations().unwrap().is_empty());
    }
}
