//! Minimal mocking substrate.
//!
//! Provides exactly what the no-setup engine consumes from a double: a way
//! to install canned responses for a call pattern (with an optional side
//! effect), a record of every invocation, and the erased call/value types
//! that flow through both.

pub mod call;
pub mod core;
pub mod setup;
pub mod value;

pub use self::call::{
    Argument, AsyncFactory, Call, Invocation, LoggedArgument, Operation, Reply, ReturnShape,
    SyncFactory, ValueShape,
};
pub use self::core::DoubleCore;
pub use self::setup::{KeyMatcher, Setup, SetupCallback, SetupPattern, SetupTable};
pub use self::value::{downcast, downcast_ref, erase, BoxedValue, ErasedValue, TypeTag};
