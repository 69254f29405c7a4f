//! Event system: a block-scoped publish/subscribe bus.
//!
//! [`EventBus`] buckets [`Listener`]s by block key and event name. A model
//! bound to the bus supplies the default block key.

pub mod bus;

pub use bus::{EventBus, Listener};
