//! Type dispatch resolver.
//!
//! The interception point only sees boxed arguments, but a cell has to be
//! installed for a concrete `T` so that later typed accessors match it. The
//! registry maps a runtime [`TypeTag`] to an installer monomorphised for that
//! type; the typed front end registers every `T` it is called with.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use lazycache_core::{CacheError, CacheResult, CacheValue};

use super::installer;
use crate::substrate::{downcast, BoxedValue, DoubleCore, TypeTag};

/// Installer specialised for one concrete value type.
pub type InstallFn = fn(&DoubleCore, &str, BoxedValue) -> CacheResult<()>;

/// Outcome of resolving an erased value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A cell of this type was installed.
    Installed(TypeTag),
    /// The runtime type could not be determined; nothing was installed.
    Unresolved,
}

fn install_erased<T: CacheValue>(core: &DoubleCore, key: &str, value: BoxedValue) -> CacheResult<()> {
    match downcast::<T>(value) {
        Ok(value) => installer::install_cell(core, key, value),
        Err(other) => {
            tracing::warn!(
                key,
                expected = std::any::type_name::<T>(),
                actual = other.type_tag().name(),
                "Registered installer received a value of another type"
            );
            Ok(())
        }
    }
}

/// Runtime type tag → specialised installer.
#[derive(Default)]
pub struct TypeRegistry {
    installers: RwLock<HashMap<TypeId, (TypeTag, InstallFn)>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `T` resolvable. Returns `true` the first time `T` is seen.
    pub fn register<T: CacheValue>(&self) -> CacheResult<bool> {
        let tag = TypeTag::of::<T>();
        {
            let installers = self.installers.read().map_err(|_| CacheError::LockPoisoned)?;
            if installers.contains_key(&tag.id()) {
                return Ok(false);
            }
        }

        let mut installers = self.installers.write().map_err(|_| CacheError::LockPoisoned)?;
        let inserted = installers
            .insert(tag.id(), (tag, install_erased::<T> as InstallFn))
            .is_none();
        if inserted {
            tracing::trace!(value_type = tag.name(), "Registered value type");
        }
        Ok(inserted)
    }

    pub fn contains(&self, tag: TypeTag) -> CacheResult<bool> {
        let installers = self.installers.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(installers.contains_key(&tag.id()))
    }

    /// Specialised installer for `tag`, if registered.
    pub fn lookup(&self, tag: TypeTag) -> CacheResult<Option<InstallFn>> {
        let installers = self.installers.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(installers.get(&tag.id()).map(|(_, install)| *install))
    }

    /// Every registered type.
    pub fn registered(&self) -> CacheResult<Vec<TypeTag>> {
        let installers = self.installers.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(installers.values().map(|(tag, _)| *tag).collect())
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = match self.installers.read() {
            Ok(installers) => installers.values().map(|(tag, _)| tag.name()).collect(),
            Err(_) => Vec::new(),
        };
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}

/// Determine the runtime type of `value` and install a cell of that type.
///
/// Absent values and types nobody registered resolve to
/// [`Resolution::Unresolved`]; the caller then answers with the declared
/// zero value instead.
pub fn resolve_and_install(
    core: &DoubleCore,
    key: &str,
    value: &BoxedValue,
) -> CacheResult<Resolution> {
    if value.is_absent() {
        tracing::debug!(key, value_type = value.type_tag().name(), "Absent value, no cell installed");
        return Ok(Resolution::Unresolved);
    }

    let tag = value.type_tag();
    let Some(install) = core.types().lookup(tag)? else {
        tracing::debug!(key, value_type = tag.name(), "Unregistered value type, no cell installed");
        return Ok(Resolution::Unresolved);
    };

    install(core, key, value.clone())?;
    Ok(Resolution::Installed(tag))
}
