//! MVC orchestration: an element's view, model, bus and logic units.
//!
//! An [`Orchestrator`] is built from [`MvcOptions`]. Each collaborator comes
//! from a [`Provider`], either a ready instance or a factory receiving
//! [`UnitProps`]. Logic units are grouped by [`Role`] in a [`UnitRegistry`]
//! and keyed explicitly or by [`derive_key`].

pub mod naming;
pub mod options;
pub mod orchestrator;
pub mod provider;
pub mod registry;
pub mod unit;

pub use naming::derive_key;
pub use options::{MvcOptions, UnitEntry};
pub use orchestrator::Orchestrator;
pub use provider::{Factory, Provider};
pub use registry::UnitRegistry;
pub use unit::{LogicUnit, Role, UnitContext, UnitProps, View};
