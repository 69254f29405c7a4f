//! Block keys and aggregate scopes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name used for the default block of a map-mode model and by an unbound bus.
pub(crate) const DEFAULT_BLOCK_NAME: &str = "__default_block__";

/// Key of a block inside a [`Model`](super::Model) or an
/// [`EventBus`](crate::event::EventBus).
///
/// Array-mode models use `Index`; map-mode models accept either variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockKey {
    Index(i64),
    Name(String),
}

impl BlockKey {
    /// A key is valid unless it is an empty name.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Index(_) => true,
            Self::Name(name) => !name.is_empty(),
        }
    }

    /// The index, for `Index` keys.
    pub fn as_index(&self) -> Option<i64> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Name(_) => None,
        }
    }

    /// The name, for `Name` keys.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Index(_) => None,
            Self::Name(name) => Some(name),
        }
    }

    /// The private default-block name.
    pub(crate) fn default_name() -> Self {
        Self::Name(DEFAULT_BLOCK_NAME.to_owned())
    }

    /// Whether this is the private default-block name.
    pub fn is_default_name(&self) -> bool {
        self.as_name() == Some(DEFAULT_BLOCK_NAME)
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for BlockKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for BlockKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&String> for BlockKey {
    fn from(name: &String) -> Self {
        Self::Name(name.clone())
    }
}

impl From<i64> for BlockKey {
    fn from(index: i64) -> Self {
        Self::Index(index)
    }
}

impl From<i32> for BlockKey {
    fn from(index: i32) -> Self {
        Self::Index(i64::from(index))
    }
}

impl From<u32> for BlockKey {
    fn from(index: u32) -> Self {
        Self::Index(i64::from(index))
    }
}

impl From<usize> for BlockKey {
    fn from(index: usize) -> Self {
        Self::Index(i64::try_from(index).unwrap_or(i64::MAX))
    }
}

/// Which blocks an aggregate reader scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockScope {
    One(BlockKey),
    All,
}
