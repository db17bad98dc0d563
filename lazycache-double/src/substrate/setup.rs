//! Canned responses ("setups") and the table that holds them.

use std::fmt;
use std::sync::Arc;

use lazycache_core::{CacheResult, CacheValue};

use super::call::{Call, Invocation, Operation, Reply};
use super::core::DoubleCore;
use super::value::{erase, BoxedValue, TypeTag};

/// Side effect run when a setup answers a call.
pub type SetupCallback = Arc<dyn Fn(&DoubleCore, &Invocation) -> CacheResult<()> + Send + Sync>;

/// Which keys a setup answers for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyMatcher {
    Any,
    Exact(String),
}

impl KeyMatcher {
    pub fn matches(&self, key: Option<&str>) -> bool {
        match self {
            KeyMatcher::Any => true,
            KeyMatcher::Exact(expected) => key == Some(expected.as_str()),
        }
    }

    pub fn is_exactly(&self, key: &str) -> bool {
        matches!(self, KeyMatcher::Exact(expected) if expected == key)
    }
}

/// The call pattern a setup answers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SetupPattern {
    pub operation: Operation,
    pub key: KeyMatcher,
    /// `None` matches calls of any (or no) generic type.
    pub type_arg: Option<TypeTag>,
}

impl SetupPattern {
    pub fn matches(&self, call: &Call<'_>) -> bool {
        self.operation == call.operation()
            && self.key.matches(call.key())
            && self.type_arg.map_or(true, |tag| call.type_arg() == Some(tag))
    }
}

/// A canned response for a call pattern.
#[derive(Clone)]
pub struct Setup {
    pattern: SetupPattern,
    response: Reply,
    callback: Option<SetupCallback>,
}

impl Setup {
    /// A setup for `operation` on any key, returning nothing.
    pub fn new(operation: Operation) -> Self {
        Self {
            pattern: SetupPattern {
                operation,
                key: KeyMatcher::Any,
                type_arg: None,
            },
            response: Reply::Void,
            callback: None,
        }
    }

    /// Only answer calls for `key`.
    pub fn for_key(mut self, key: impl Into<String>) -> Self {
        self.pattern.key = KeyMatcher::Exact(key.into());
        self
    }

    /// Only answer calls instantiated with `T`.
    pub fn of_type<T: CacheValue>(mut self) -> Self {
        self.pattern.type_arg = Some(TypeTag::of::<T>());
        self
    }

    /// Return `value` from matched calls.
    pub fn returns<T: CacheValue>(self, value: T) -> Self {
        self.returns_boxed(erase(value))
    }

    pub fn returns_boxed(mut self, value: BoxedValue) -> Self {
        self.response = Reply::Value(value);
        self
    }

    /// Run `callback` whenever the setup answers a call.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&DoubleCore, &Invocation) -> CacheResult<()> + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn pattern(&self) -> &SetupPattern {
        &self.pattern
    }

    pub fn response(&self) -> &Reply {
        &self.response
    }

    pub(crate) fn answer(&self) -> (Reply, Option<SetupCallback>) {
        (self.response.clone(), self.callback.clone())
    }
}

impl fmt::Debug for Setup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setup")
            .field("pattern", &self.pattern)
            .field("response", &self.response)
            .field("callback", &self.callback.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Ordered collection of setups. Newer setups shadow older ones.
#[derive(Debug, Default)]
pub struct SetupTable {
    setups: Vec<Setup>,
}

impl SetupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `setup`, replacing any setup with the identical pattern.
    pub fn install(&mut self, setup: Setup) {
        self.setups.retain(|existing| existing.pattern != setup.pattern);
        self.setups.push(setup);
    }

    /// Newest setup answering `call`.
    pub fn find(&self, call: &Call<'_>) -> Option<&Setup> {
        self.setups.iter().rev().find(|setup| setup.pattern.matches(call))
    }

    /// Drop every setup bound to exactly `key`. Returns how many were dropped.
    pub fn retire_key(&mut self, key: &str) -> usize {
        let before = self.setups.len();
        self.setups.retain(|setup| !setup.pattern.key.is_exactly(key));
        before - self.setups.len()
    }

    pub fn patterns(&self) -> Vec<SetupPattern> {
        self.setups.iter().map(|setup| setup.pattern.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.setups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.setups.is_empty()
    }
}
