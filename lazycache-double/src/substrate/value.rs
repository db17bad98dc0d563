//! Type-erased cache values.
//!
//! The interception point only ever sees boxed arguments. [`ErasedValue`] is
//! the dynamic face of a [`CacheValue`]: it can report its runtime type,
//! clone itself and be downcast back once the concrete type is known again.

use std::any::{type_name, Any, TypeId};
use std::fmt;

use lazycache_core::CacheValue;

/// Runtime type tag for an erased value.
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl std::hash::Hash for TypeTag {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Object-safe view of a [`CacheValue`].
pub trait ErasedValue: Any + fmt::Debug + Send + Sync {
    fn type_tag(&self) -> TypeTag;

    fn clone_boxed(&self) -> BoxedValue;

    fn is_absent(&self) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

/// An owned, type-erased value.
pub type BoxedValue = Box<dyn ErasedValue>;

impl<T: CacheValue> ErasedValue for T {
    fn type_tag(&self) -> TypeTag {
        TypeTag::of::<T>()
    }

    fn clone_boxed(&self) -> BoxedValue {
        Box::new(self.clone())
    }

    fn is_absent(&self) -> bool {
        CacheValue::is_absent(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

impl Clone for BoxedValue {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

/// Box a typed value.
pub fn erase<T: CacheValue>(value: T) -> BoxedValue {
    Box::new(value)
}

/// Borrow the concrete value if it is a `T`.
pub fn downcast_ref<T: CacheValue>(value: &BoxedValue) -> Option<&T> {
    value.as_any().downcast_ref::<T>()
}

/// Recover the concrete value, handing the box back on a type mismatch.
pub fn downcast<T: CacheValue>(value: BoxedValue) -> Result<T, BoxedValue> {
    if value.type_tag() != TypeTag::of::<T>() {
        return Err(value);
    }
    match value.into_any().downcast::<T>() {
        Ok(typed) => Ok(*typed),
        // Unreachable after the tag check; the original box is gone, so the
        // zero value stands in for it.
        Err(_) => Err(erase(T::default())),
    }
}
