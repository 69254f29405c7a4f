//! Managed properties: synthesized accessors with defaults, change detection,
//! re-entrancy guards, and pre/post write hooks.
//!
//! - [`ManagedProperty`]: the accessor pair over private backing storage.
//! - [`PropertyOptions`]: flags and hooks, built with chainable setters.
//! - [`descriptor`]: per-owner-type installation ledger for accessor-style
//!   declarations.

pub mod ledger;
pub mod managed;
pub mod options;

pub use ledger::{descriptor, installed_names, is_installed};
pub use managed::{Accessor, ManagedProperty};
pub use options::{Fallback, Hook, Initial, PropertyOptions};
