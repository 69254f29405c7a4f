//! Data models: keyed blocks of fields with change notification.
//!
//! - [`Model`]: owner of blocks, in array or map [`StorageMode`].
//! - [`DataBlock`]: one block of named fields plus an optional identifier.
//! - [`BlockKey`] / [`BlockScope`]: addressing for single blocks and scans.

pub mod block;
pub mod index;
pub mod key;
#[allow(clippy::module_inception)]
pub mod model;

pub use block::{BlockInput, DataBlock, ModelId};
pub use index::{BlockId, StorageMode};
pub use key::{BlockKey, BlockScope};
pub use model::{ChangeCallback, Model, ModelConsumer, SubscriptionId};
