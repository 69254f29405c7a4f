//! DataBlock: one named unit of model data.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Identity of a [`Model`](super::Model), used as a block's non-owning
/// back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(pub(crate) u64);

/// A keyed payload plus an optional identifier and a notification switch.
///
/// A block is linked to at most one model at a time. Once
/// [`clear`](DataBlock::clear)ed it is retired: it holds no data, is unlinked,
/// and ignores writes.
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlock {
    id: Option<Value>,
    data: IndexMap<String, Value>,
    notifications: bool,
    model: Option<ModelId>,
    cleared: bool,
}

impl DataBlock {
    /// Create an unlinked block from fields.
    pub fn new(data: IndexMap<String, Value>, id: Option<Value>) -> Self {
        Self {
            id,
            data,
            notifications: true,
            model: None,
            cleared: false,
        }
    }

    /// Create an empty unlinked block.
    pub fn empty() -> Self {
        Self::new(IndexMap::new(), None)
    }

    /// Wrap raw data. Objects become fields, arrays become index-named
    /// fields; anything else is not block data.
    pub fn from_value(value: Value, id: Option<Value>) -> Option<Self> {
        let data: IndexMap<String, Value> = match value {
            Value::Object(map) => map.into_iter().collect(),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            _ => return None,
        };
        Some(Self::new(data, id))
    }

    /// The block identifier.
    pub fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    /// Replace the block identifier.
    pub fn set_id(&mut self, id: Value) {
        self.id = Some(id);
    }

    /// The fields.
    pub fn data(&self) -> &IndexMap<String, Value> {
        &self.data
    }

    /// The fields as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.data
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Write a field. Returns `false` only for a cleared block.
    pub fn set(&mut self, field: &str, value: Value) -> bool {
        if self.cleared {
            return false;
        }
        self.data.insert(field.to_owned(), value);
        true
    }

    pub fn has(&self, field: &str) -> bool {
        self.data.contains_key(field)
    }

    /// Remove a field, keeping the order of the rest.
    pub fn delete(&mut self, field: &str) -> Option<Value> {
        self.data.shift_remove(field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.data.values()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Turn this block's change notifications on or off.
    pub fn enable_notifications(&mut self, enabled: bool) {
        self.notifications = enabled;
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications
    }

    /// The model this block is linked to.
    pub fn linked_model(&self) -> Option<ModelId> {
        self.model
    }

    pub(crate) fn link(&mut self, model: ModelId) {
        self.model = Some(model);
    }

    /// Empty the block, unlink it, and retire it for good.
    pub fn clear(&mut self) {
        self.data.clear();
        self.model = None;
        self.cleared = true;
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }
}

impl Default for DataBlock {
    fn default() -> Self {
        Self::empty()
    }
}

/// What a model accepts when installing a block: raw data or a ready block.
#[derive(Debug, Clone)]
pub enum BlockInput {
    Raw(Value),
    Block(DataBlock),
}

impl From<Value> for BlockInput {
    fn from(value: Value) -> Self {
        Self::Raw(value)
    }
}

impl From<DataBlock> for BlockInput {
    fn from(block: DataBlock) -> Self {
        Self::Block(block)
    }
}
