//! Cells: installation of coherent per-key responses and the runtime type
//! dispatch that feeds it.

pub mod installer;
pub mod resolver;

pub use installer::{install_add, install_cell, install_get_family, install_remove, GET_FAMILY};
pub use resolver::{resolve_and_install, InstallFn, Resolution, TypeRegistry};
