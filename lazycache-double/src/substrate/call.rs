//! Call records: what the double sees when test code invokes it.
//!
//! A [`Call`] is the live, in-flight invocation (it still owns the factory,
//! if any). An [`Invocation`] is the snapshot kept in the history once the
//! call has been recorded.

use std::fmt;

use futures_util::future::BoxFuture;
use lazycache_core::{CacheEntry, CacheResult, CacheValue, EntryOptions};

use super::value::{erase, BoxedValue, TypeTag};

/// Operations of the cache contract, as seen by the double.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Get,
    GetAsync,
    GetOrAdd,
    GetOrAddAsync,
    Remove,
    DefaultCachePolicy,
}

impl Operation {
    /// Contract-level operation name.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Add => "Add",
            Operation::Get => "Get",
            Operation::GetAsync => "GetAsync",
            Operation::GetOrAdd => "GetOrAdd",
            Operation::GetOrAddAsync => "GetOrAddAsync",
            Operation::Remove => "Remove",
            Operation::DefaultCachePolicy => "DefaultCachePolicy",
        }
    }

    /// Whether the operation completes asynchronously.
    pub fn is_async(&self) -> bool {
        self.name().ends_with("Async")
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of a declared return type: nothing, or a value with a known zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    Void,
    Value(ValueShape),
}

/// A declared value return type and how to produce its zero value.
#[derive(Clone, Copy)]
pub struct ValueShape {
    tag: TypeTag,
    zero: fn() -> BoxedValue,
}

fn zero_of<T: CacheValue>() -> BoxedValue {
    erase(T::default())
}

impl ValueShape {
    pub fn of<T: CacheValue>() -> Self {
        Self {
            tag: TypeTag::of::<T>(),
            zero: zero_of::<T>,
        }
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn zero(&self) -> BoxedValue {
        (self.zero)()
    }
}

impl PartialEq for ValueShape {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
    }
}

impl Eq for ValueShape {}

impl fmt::Debug for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueShape").field(&self.tag).finish()
    }
}

impl ReturnShape {
    pub fn of<T: CacheValue>() -> Self {
        ReturnShape::Value(ValueShape::of::<T>())
    }

    pub fn is_void(&self) -> bool {
        matches!(self, ReturnShape::Void)
    }

    /// The reply an unconfigured call with this return shape produces.
    pub fn zero_reply(&self) -> Reply {
        match self {
            ReturnShape::Void => Reply::Void,
            ReturnShape::Value(shape) => Reply::Value(shape.zero()),
        }
    }
}

/// What a call produced.
#[derive(Debug, Clone)]
pub enum Reply {
    Void,
    Value(BoxedValue),
}

impl Reply {
    pub fn into_value(self) -> Option<BoxedValue> {
        match self {
            Reply::Void => None,
            Reply::Value(value) => Some(value),
        }
    }
}

/// Factory handed to a synchronous `get_or_add`.
pub type SyncFactory<'c> =
    Box<dyn FnOnce(&mut CacheEntry) -> CacheResult<BoxedValue> + Send + 'c>;

/// Factory handed to an asynchronous `get_or_add`.
pub type AsyncFactory<'c> =
    Box<dyn FnOnce(CacheEntry) -> BoxFuture<'c, CacheResult<BoxedValue>> + Send + 'c>;

/// A positional runtime argument of a live call.
pub enum Argument<'c> {
    Key(String),
    Value(BoxedValue),
    Options(Option<EntryOptions>),
    /// Taken (left `None`) once the factory has been invoked.
    Factory(Option<SyncFactory<'c>>),
    AsyncFactory(Option<AsyncFactory<'c>>),
}

impl fmt::Debug for Argument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Argument::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Argument::Options(options) => f.debug_tuple("Options").field(options).finish(),
            Argument::Factory(factory) => f
                .debug_tuple("Factory")
                .field(&factory.as_ref().map(|_| "<fn>"))
                .finish(),
            Argument::AsyncFactory(factory) => f
                .debug_tuple("AsyncFactory")
                .field(&factory.as_ref().map(|_| "<async fn>"))
                .finish(),
        }
    }
}

/// A live invocation on the double.
#[derive(Debug)]
pub struct Call<'c> {
    operation: Operation,
    arguments: Vec<Argument<'c>>,
    type_arg: Option<TypeTag>,
    declared: ReturnShape,
}

impl<'c> Call<'c> {
    pub fn new(operation: Operation, declared: ReturnShape) -> Self {
        Self {
            operation,
            arguments: Vec::new(),
            type_arg: None,
            declared,
        }
    }

    /// Record the generic type the call was instantiated with.
    pub fn with_type_arg<T: CacheValue>(mut self) -> Self {
        self.type_arg = Some(TypeTag::of::<T>());
        self
    }

    pub fn arg(mut self, argument: Argument<'c>) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn arguments(&self) -> &[Argument<'c>] {
        &self.arguments
    }

    pub fn type_arg(&self) -> Option<TypeTag> {
        self.type_arg
    }

    pub fn declared(&self) -> ReturnShape {
        self.declared
    }

    /// The key argument, always in position 0 when present.
    pub fn key(&self) -> Option<&str> {
        match self.arguments.first() {
            Some(Argument::Key(key)) => Some(key),
            _ => None,
        }
    }

    /// The value argument of an `add`, always in position 1 when present.
    pub fn value(&self) -> Option<&BoxedValue> {
        match self.arguments.get(1) {
            Some(Argument::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Take the synchronous factory out of position 1.
    pub fn take_factory(&mut self) -> Option<SyncFactory<'c>> {
        match self.arguments.get_mut(1) {
            Some(Argument::Factory(slot)) => slot.take(),
            _ => None,
        }
    }

    /// Take the asynchronous factory out of position 1.
    pub fn take_async_factory(&mut self) -> Option<AsyncFactory<'c>> {
        match self.arguments.get_mut(1) {
            Some(Argument::AsyncFactory(slot)) => slot.take(),
            _ => None,
        }
    }
}

/// A logged argument. Factories are recorded by shape only.
#[derive(Debug, Clone)]
pub enum LoggedArgument {
    Key(String),
    Value(BoxedValue),
    Options(Option<EntryOptions>),
    Factory,
    AsyncFactory,
}

impl From<&Argument<'_>> for LoggedArgument {
    fn from(argument: &Argument<'_>) -> Self {
        match argument {
            Argument::Key(key) => LoggedArgument::Key(key.clone()),
            Argument::Value(value) => LoggedArgument::Value(value.clone()),
            Argument::Options(options) => LoggedArgument::Options(options.clone()),
            Argument::Factory(_) => LoggedArgument::Factory,
            Argument::AsyncFactory(_) => LoggedArgument::AsyncFactory,
        }
    }
}

/// A recorded invocation in the double's history.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub sequence: u64,
    pub operation: Operation,
    pub arguments: Vec<LoggedArgument>,
    pub type_arg: Option<TypeTag>,
    pub declared: ReturnShape,
    /// Whether a configured response answered the call.
    pub matched: bool,
}

impl Invocation {
    pub fn capture(sequence: u64, call: &Call<'_>, matched: bool) -> Self {
        Self {
            sequence,
            operation: call.operation(),
            arguments: call.arguments().iter().map(LoggedArgument::from).collect(),
            type_arg: call.type_arg(),
            declared: call.declared(),
            matched,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self.arguments.first() {
            Some(LoggedArgument::Key(key)) => Some(key),
            _ => None,
        }
    }

    /// The value argument, always in position 1 when present.
    pub fn value(&self) -> Option<&BoxedValue> {
        match self.arguments.get(1) {
            Some(LoggedArgument::Value(value)) => Some(value),
            _ => None,
        }
    }

    pub fn options(&self) -> Option<&EntryOptions> {
        self.arguments.iter().find_map(|argument| match argument {
            LoggedArgument::Options(options) => options.as_ref(),
            _ => None,
        })
    }
}
