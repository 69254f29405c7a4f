//! BlockIndex: the one routine that maps block keys to arena slots.
//!
//! Array mode keeps an ordered `Vec` of slots; inserting or deleting at an
//! index shifts every later block by one. Map mode keeps an insertion-ordered
//! map. Every model entry point resolves keys through here so the shifting
//! rules live in exactly one place.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use super::key::BlockKey;

new_key_type! {
    /// Arena slot of a block inside a model.
    pub struct BlockId;
}

/// How a model organizes its blocks. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Blocks in an ordered sequence, keyed `0..len`.
    Array,
    /// Blocks keyed by arbitrary valid keys.
    Map,
}

#[derive(Debug, Clone)]
pub(crate) enum BlockIndex {
    Array(Vec<BlockId>),
    Map(IndexMap<BlockKey, BlockId>),
}

impl BlockIndex {
    pub(crate) fn new(mode: StorageMode) -> Self {
        match mode {
            StorageMode::Array => Self::Array(Vec::new()),
            StorageMode::Map => Self::Map(IndexMap::new()),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Array(slots) => slots.len(),
            Self::Map(slots) => slots.len(),
        }
    }

    /// In-range array position for `key`, if any.
    fn position(&self, key: &BlockKey, len: usize) -> Option<usize> {
        let index = usize::try_from(key.as_index()?).ok()?;
        (index < len).then_some(index)
    }

    /// Slot for an existing block.
    pub(crate) fn resolve(&self, key: &BlockKey) -> Option<BlockId> {
        if !key.is_valid() {
            return None;
        }
        match self {
            Self::Array(slots) => self.position(key, slots.len()).map(|i| slots[i]),
            Self::Map(slots) => slots.get(key).copied(),
        }
    }

    /// Current key of the block in `id`.
    pub(crate) fn key_of(&self, id: BlockId) -> Option<BlockKey> {
        match self {
            Self::Array(slots) => slots.iter().position(|s| *s == id).map(BlockKey::from),
            Self::Map(slots) => slots
                .iter()
                .find_map(|(k, s)| (*s == id).then(|| k.clone())),
        }
    }

    /// Whether [`set`](Self::set) would accept `key`. Array mode accepts
    /// `0..=len` (`len` appends).
    pub(crate) fn accepts(&self, key: &BlockKey) -> bool {
        if !key.is_valid() {
            return false;
        }
        match self {
            Self::Array(slots) => self.position(key, slots.len() + 1).is_some(),
            Self::Map(_) => true,
        }
    }

    /// Place `id` at `key`, returning the slot it displaced.
    ///
    /// Callers check [`accepts`](Self::accepts) first; a rejected key leaves
    /// the index untouched and returns `Err(id)`.
    pub(crate) fn set(&mut self, key: &BlockKey, id: BlockId) -> Result<Option<BlockId>, BlockId> {
        if !self.accepts(key) {
            return Err(id);
        }
        match self {
            Self::Array(slots) => {
                let Some(index) = key.as_index().and_then(|i| usize::try_from(i).ok()) else {
                    return Err(id);
                };
                if index == slots.len() {
                    slots.push(id);
                    Ok(None)
                } else {
                    Ok(Some(std::mem::replace(&mut slots[index], id)))
                }
            }
            Self::Map(slots) => Ok(slots.insert(key.clone(), id)),
        }
    }

    /// Insert `id`, shifting later array blocks up. Array mode inserts at an
    /// in-range index and appends otherwise. Map mode behaves like `set`.
    ///
    /// Returns the final key and any displaced slot (map mode only).
    pub(crate) fn insert(
        &mut self,
        key: Option<&BlockKey>,
        id: BlockId,
    ) -> (BlockKey, Option<BlockId>) {
        match self {
            Self::Array(slots) => {
                let len = slots.len();
                let at = key
                    .and_then(|k| k.as_index())
                    .and_then(|i| usize::try_from(i).ok())
                    .filter(|i| *i < len);
                match at {
                    Some(index) => {
                        slots.insert(index, id);
                        (BlockKey::from(index), None)
                    }
                    None => {
                        slots.push(id);
                        (BlockKey::from(len), None)
                    }
                }
            }
            Self::Map(slots) => {
                let key = key.cloned().unwrap_or_else(BlockKey::default_name);
                let displaced = slots.insert(key.clone(), id);
                (key, displaced)
            }
        }
    }

    /// Remove the block at `key`, shifting later array blocks down.
    pub(crate) fn remove(&mut self, key: &BlockKey) -> Option<BlockId> {
        if !key.is_valid() {
            return None;
        }
        match self {
            Self::Array(slots) => {
                let index = usize::try_from(key.as_index()?).ok()?;
                (index < slots.len()).then(|| slots.remove(index))
            }
            Self::Map(slots) => slots.shift_remove(key),
        }
    }

    /// Keys in order.
    pub(crate) fn keys(&self) -> Vec<BlockKey> {
        match self {
            Self::Array(slots) => (0..slots.len()).map(BlockKey::from).collect(),
            Self::Map(slots) => slots.keys().cloned().collect(),
        }
    }

    /// `(key, slot)` pairs in order.
    pub(crate) fn entries(&self) -> Vec<(BlockKey, BlockId)> {
        match self {
            Self::Array(slots) => slots
                .iter()
                .enumerate()
                .map(|(i, s)| (BlockKey::from(i), *s))
                .collect(),
            Self::Map(slots) => slots.iter().map(|(k, s)| (k.clone(), *s)).collect(),
        }
    }
}
