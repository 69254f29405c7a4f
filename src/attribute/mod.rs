//! Attribute reflection: properties mirrored to and from string attributes.
//!
//! - [`ReflectedProperty`]: managed property that reflects every stored write.
//! - [`AttributeBridge`]: routes external attribute changes back in.
//! - [`observed_attributes`]: per-class attribute sets, unioned over ancestors.
//! - [`AttributeMap`]: in-memory [`AttributeHost`].

pub mod bridge;
pub mod codec;
pub mod host;
pub mod mirror;
pub mod name;
pub mod registry;

pub use bridge::{register, AttributeBridge, Registration};
pub use codec::{parse, stringify};
pub use host::{AttributeHost, AttributeListener, AttributeMap};
pub use mirror::ReflectedProperty;
pub use name::{attribute_name, property_name};
pub use registry::{declared_attributes, observed_attributes, register_attribute};
