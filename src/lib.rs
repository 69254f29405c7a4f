//! # gilt-mvc
//!
//! Component-state plumbing for UI elements: managed properties, attribute
//! reflection, block-structured data models, a block-scoped event bus, and an
//! MVC orchestrator that wires logic units to all of them.
//!
//! ## Core Systems
//!
//! - **[`property`]**: managed properties with defaults, change detection,
//!   re-entrancy guards and write hooks
//! - **[`attribute`]**: string reflection of properties onto a host's attributes
//! - **[`model`]**: data blocks in array or map storage with change delegates
//! - **[`event`]**: publish/subscribe scoped by block key
//! - **[`mvc`]**: the orchestrator, logic-unit roles, key derivation
//! - **[`element`]**: static element classes standing in for inheritance
//! - **[`testing`]**: recording helpers for assertions on call order

// Foundation
pub mod element;
pub mod error;

// State
pub mod attribute;
pub mod property;

// Data and events
pub mod event;
pub mod model;

// Composition
pub mod mvc;

// Test support
pub mod testing;

pub use element::ElementClass;
pub use error::{Error, Result};
