//! Extensions shipped with the crate
//!
//! Each extension module exposes a `register` function adding its hooks to an
//! [`ExtensionRegistry`]. The materials extension is decoded natively and needs no
//! registration.

pub mod production;

use crate::extension::ExtensionRegistry;

/// Register every extension of this module
pub fn register_all(registry: &mut ExtensionRegistry) {
    production::register(registry);
}
