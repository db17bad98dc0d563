//! Virtual cell installer.
//!
//! A cell is never stored as a struct. It exists only as a coherent set of
//! canned responses on the double: an `Add` response that re-points the cell
//! at a new value, a `Get` family that answers with the current value, and a
//! `Remove` response that resets the family to the zero value.

use std::any::type_name;

use lazycache_core::{validate_key, CacheResult, CacheValue};

use crate::substrate::{downcast_ref, DoubleCore, Operation, Setup};

/// Operations answered with the cell's current value.
pub const GET_FAMILY: [Operation; 4] = [
    Operation::Get,
    Operation::GetAsync,
    Operation::GetOrAdd,
    Operation::GetOrAddAsync,
];

/// Install a cell holding `value` for `key`.
///
/// Every setup previously bound to `key` is retired first, so at most one
/// cell per key is ever effective. From here on, typed reads of `T` for
/// `key` return `value` (factories are not invoked), a later `add` of a `T`
/// replaces the value and `remove` resets it to `T::default()`.
pub fn install_cell<T: CacheValue>(core: &DoubleCore, key: &str, value: T) -> CacheResult<()> {
    validate_key(key)?;
    core.types().register::<T>()?;

    let retired = core.retire_key(key)?;
    install_add::<T>(core, key)?;
    install_get_family(core, key, value)?;
    install_remove::<T>(core, key)?;

    tracing::debug!(key, value_type = type_name::<T>(), retired, "Installed cell");
    Ok(())
}

/// Answer every read of `T` for `key` with `value`.
pub fn install_get_family<T: CacheValue>(
    core: &DoubleCore,
    key: &str,
    value: T,
) -> CacheResult<()> {
    for operation in GET_FAMILY {
        core.install(
            Setup::new(operation)
                .for_key(key)
                .of_type::<T>()
                .returns(value.clone()),
        )?;
    }
    Ok(())
}

/// Re-point the `T` cell for `key` at whatever a later `add` stores.
pub fn install_add<T: CacheValue>(core: &DoubleCore, key: &str) -> CacheResult<()> {
    core.install(
        Setup::new(Operation::Add)
            .for_key(key)
            .of_type::<T>()
            .callback(|core, invocation| {
                let (Some(key), Some(value)) = (
                    invocation.key(),
                    invocation.value().and_then(downcast_ref::<T>),
                ) else {
                    return Ok(());
                };
                tracing::trace!(key, value_type = type_name::<T>(), "Cell overwritten by add");
                install_get_family(core, key, value.clone())
            }),
    )
}

/// Reset the `T` cell for `key` to `T::default()` on `remove`.
///
/// The reset type is the one captured here. A later read of some other type
/// for the same key is not covered and falls through to the unmatched-call
/// path.
pub fn install_remove<T: CacheValue>(core: &DoubleCore, key: &str) -> CacheResult<()> {
    core.install(
        Setup::new(Operation::Remove)
            .for_key(key)
            .callback(|core, invocation| {
                let Some(key) = invocation.key() else {
                    return Ok(());
                };
                tracing::trace!(key, value_type = type_name::<T>(), "Cell reset by remove");
                install_get_family(core, key, T::default())
            }),
    )
}
