//! Model: blocks of keyed data with per-field change notification.
//!
//! A model is always shared (`Rc<Model>`) and every method takes `&self`.
//! Internal state lives in a `RefCell` that is never held across a callback:
//! notifications collect their targets first, release the borrow, then call
//! out, so subscribers may freely read (or write) the model they observe.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexSet;
use serde_json::Value;
use slotmap::{new_key_type, SlotMap};
use tracing::{debug, trace};

use super::block::{BlockInput, DataBlock, ModelId};
use super::index::{BlockId, BlockIndex, StorageMode};
use super::key::{BlockKey, BlockScope};
use crate::error::{Error, Result};
use crate::mvc::registry::UnitRegistry;
use crate::mvc::unit::{LogicUnit, Role};

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

new_key_type! {
    /// Handle for a change-delegate subscription.
    pub struct SubscriptionId;
}

/// Change delegate, called as `(field, block_key, value)`.
pub type ChangeCallback = Rc<dyn Fn(&str, &BlockKey, &Value)>;

// ---------------------------------------------------------------------------
// ModelConsumer
// ---------------------------------------------------------------------------

/// Object that wants dirty tracking for every successful field write.
pub trait ModelConsumer {
    fn on_dirty(&self, _field: &str, _block: &BlockKey) {}
    fn on_change(&self, _field: &str, _value: &Value, _block: &BlockKey) {}
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

struct ModelState {
    blocks: SlotMap<BlockId, DataBlock>,
    index: BlockIndex,
}

struct Delegates {
    callbacks: SlotMap<SubscriptionId, ChangeCallback>,
    order: Vec<SubscriptionId>,
    consumers: Vec<Weak<dyn ModelConsumer>>,
}

/// Owner of data blocks organized as an array or a map.
pub struct Model {
    id: ModelId,
    mode: StorageMode,
    this: Weak<Model>,
    state: RefCell<ModelState>,
    delegates: RefCell<Delegates>,
    handlers: RefCell<Rc<UnitRegistry>>,
}

impl Model {
    /// Create an empty model. The storage mode never changes afterwards.
    pub fn new(mode: StorageMode) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            id: ModelId(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed)),
            mode,
            this: this.clone(),
            state: RefCell::new(ModelState {
                blocks: SlotMap::with_key(),
                index: BlockIndex::new(mode),
            }),
            delegates: RefCell::new(Delegates {
                callbacks: SlotMap::with_key(),
                order: Vec::new(),
                consumers: Vec::new(),
            }),
            handlers: RefCell::new(Rc::new(UnitRegistry::new(Role::Handler, None))),
        })
    }

    /// Create a model holding `data` in its default block.
    pub fn with_data(mode: StorageMode, data: Value) -> Rc<Self> {
        let model = Self::new(mode);
        model.set_block(data, None, None, false);
        model
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    // -- keys --------------------------------------------------------------

    /// `0` in array mode, the private default name in map mode.
    pub fn default_block_key(&self) -> BlockKey {
        match self.mode {
            StorageMode::Array => BlockKey::Index(0),
            StorageMode::Map => BlockKey::default_name(),
        }
    }

    /// Scope used by aggregate readers: the default block key when exactly
    /// one block exists, otherwise every block.
    pub fn default_computation_block_key(&self) -> BlockScope {
        if self.state.borrow().index.len() == 1 {
            BlockScope::One(self.default_block_key())
        } else {
            BlockScope::All
        }
    }

    fn resolve_key(&self, key: Option<BlockKey>) -> BlockKey {
        key.unwrap_or_else(|| self.default_block_key())
    }

    /// Number of blocks.
    pub fn block_count(&self) -> usize {
        self.state.borrow().index.len()
    }

    /// Block keys in order.
    pub fn block_keys(&self) -> Vec<BlockKey> {
        self.state.borrow().index.keys()
    }

    // -- blocks ------------------------------------------------------------

    /// Wrap `input` into a block linked to this model (not yet installed).
    ///
    /// Returns `None` for null or non-keyed data and for retired blocks.
    pub fn create_block(
        &self,
        input: impl Into<BlockInput>,
        id: Option<Value>,
    ) -> Option<DataBlock> {
        let mut block = match input.into() {
            BlockInput::Raw(value) => DataBlock::from_value(value, None)?,
            BlockInput::Block(block) if block.is_cleared() => return None,
            BlockInput::Block(block) => block,
        };
        if let Some(id) = id {
            block.set_id(id);
        }
        block.link(self.id);
        Some(block)
    }

    /// Install a block at `key` (default key when `None`), clearing whatever
    /// was there. With `initialize`, every field of the new block is
    /// announced to the change delegate.
    ///
    /// Invalid keys and unusable data are silent no-ops returning `false`.
    pub fn set_block(
        &self,
        input: impl Into<BlockInput>,
        id: Option<Value>,
        key: Option<BlockKey>,
        initialize: bool,
    ) -> bool {
        let key = self.resolve_key(key);
        if !self.state.borrow().index.accepts(&key) {
            trace!(%key, "set_block ignored: invalid key");
            return false;
        }
        let Some(block) = self.create_block(input, id) else {
            trace!(%key, "set_block ignored: no usable data");
            return false;
        };

        {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let slot = state.blocks.insert(block);
            match state.index.set(&key, slot) {
                Ok(Some(previous)) => {
                    if let Some(mut old) = state.blocks.remove(previous) {
                        old.clear();
                    }
                }
                Ok(None) => {}
                Err(slot) => {
                    state.blocks.remove(slot);
                    return false;
                }
            }
        }
        debug!(%key, "block installed");

        if initialize {
            self.initialize(Some(key));
        }
        true
    }

    /// Add a block. Map mode behaves like [`set_block`](Self::set_block);
    /// array mode inserts at an in-range `key` (shifting later blocks up) or
    /// appends. Returns the key the block ended up at.
    pub fn add_block(
        &self,
        input: impl Into<BlockInput>,
        id: Option<Value>,
        key: Option<BlockKey>,
        initialize: bool,
    ) -> Option<BlockKey> {
        if self.mode == StorageMode::Map {
            let key = self.resolve_key(key);
            return self
                .set_block(input, id, Some(key.clone()), initialize)
                .then_some(key);
        }

        let block = self.create_block(input, id)?;
        let key = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let slot = state.blocks.insert(block);
            let (key, _) = state.index.insert(key.as_ref(), slot);
            key
        };
        debug!(%key, "block added");

        if initialize {
            self.initialize(Some(key.clone()));
        }
        Some(key)
    }

    /// Snapshot of the block at `key`.
    pub fn get_block(&self, key: Option<BlockKey>) -> Option<DataBlock> {
        self.with_block(key, DataBlock::clone)
    }

    /// Borrow the block at `key` for the duration of `f`.
    ///
    /// `f` must not call back into this model.
    pub fn with_block<R>(
        &self,
        key: Option<BlockKey>,
        f: impl FnOnce(&DataBlock) -> R,
    ) -> Option<R> {
        let key = self.resolve_key(key);
        let state = self.state.borrow();
        let slot = state.index.resolve(&key)?;
        state.blocks.get(slot).map(f)
    }

    /// Like [`get_block`](Self::get_block) but explains a miss.
    pub fn require_block(&self, key: Option<BlockKey>) -> Result<DataBlock> {
        let key = self.resolve_key(key);
        if !key.is_valid() {
            return Err(Error::InvalidBlockKey(key.to_string()));
        }
        self.get_block(Some(key.clone()))
            .ok_or_else(|| Error::MissingBlock(key.to_string()))
    }

    /// The block's fields as a JSON object.
    pub fn get_block_data(&self, key: Option<BlockKey>) -> Option<Value> {
        self.with_block(key, DataBlock::to_value)
    }

    /// The block's identifier.
    pub fn get_block_id(&self, key: Option<BlockKey>) -> Option<Value> {
        self.with_block(key, |b| b.id().cloned()).flatten()
    }

    pub fn has_block(&self, key: Option<BlockKey>) -> bool {
        self.with_block(key, |_| ()).is_some()
    }

    /// Remove and clear the block at `key`. Array mode shifts later blocks
    /// down by one.
    pub fn delete_block(&self, key: Option<BlockKey>) -> bool {
        let key = self.resolve_key(key);
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let Some(slot) = state.index.remove(&key) else {
            return false;
        };
        if let Some(mut block) = state.blocks.remove(slot) {
            block.clear();
        }
        debug!(%key, "block deleted");
        true
    }

    /// Turn change notifications for one block on or off.
    pub fn set_block_notifications(&self, key: Option<BlockKey>, enabled: bool) -> bool {
        let key = self.resolve_key(key);
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let Some(slot) = state.index.resolve(&key) else {
            return false;
        };
        match state.blocks.get_mut(slot) {
            Some(block) => {
                block.enable_notifications(enabled);
                true
            }
            None => false,
        }
    }

    // -- fields ------------------------------------------------------------

    pub fn get_data(&self, field: &str, key: Option<BlockKey>) -> Option<Value> {
        self.with_block(key, |b| b.get(field).cloned()).flatten()
    }

    pub fn has_data(&self, field: &str, key: Option<BlockKey>) -> bool {
        self.with_block(key, |b| b.has(field)).unwrap_or(false)
    }

    /// Write a field and notify. Missing blocks are a silent no-op.
    pub fn set_data(&self, field: &str, value: Value, key: Option<BlockKey>) -> bool {
        let key = self.resolve_key(key);
        let notify = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let Some(slot) = state.index.resolve(&key) else {
                trace!(%key, field, "set_data ignored: no block");
                return false;
            };
            let Some(block) = state.blocks.get_mut(slot) else {
                return false;
            };
            if !block.set(field, value.clone()) {
                return false;
            }
            block.notifications_enabled()
        };
        if notify {
            self.notify(field, &key, &value);
        }
        true
    }

    /// Remove a field. The change is announced with a `null` value.
    pub fn delete_data(&self, field: &str, key: Option<BlockKey>) -> Option<Value> {
        let key = self.resolve_key(key);
        let (removed, notify) = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let slot = state.index.resolve(&key)?;
            let block = state.blocks.get_mut(slot)?;
            (block.delete(field)?, block.notifications_enabled())
        };
        if notify {
            self.notify(field, &key, &Value::Null);
        }
        Some(removed)
    }

    /// Announce every field of a block to the change delegate, so observers
    /// attached late can catch up.
    pub fn initialize(&self, key: Option<BlockKey>) {
        let key = self.resolve_key(key);
        let fields: Vec<(String, Value)> = self
            .with_block(Some(key.clone()), |b| {
                if b.notifications_enabled() {
                    b.data().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
                } else {
                    Vec::new()
                }
            })
            .unwrap_or_default();
        let callbacks = self.callbacks();
        trace!(%key, fields = fields.len(), "model initialize");
        for (field, value) in &fields {
            for callback in &callbacks {
                callback(field, &key, value);
            }
        }
    }

    // -- aggregates --------------------------------------------------------

    fn scoped_slots(&self, scope: &BlockScope) -> Vec<BlockId> {
        let state = self.state.borrow();
        match scope {
            BlockScope::One(key) => state.index.resolve(key).into_iter().collect(),
            BlockScope::All => state.index.entries().into_iter().map(|(_, s)| s).collect(),
        }
    }

    /// Field names in `scope`, deduplicated, in first-seen order.
    pub fn get_all_keys(&self, scope: BlockScope) -> Vec<String> {
        let slots = self.scoped_slots(&scope);
        let state = self.state.borrow();
        let mut keys = IndexSet::new();
        for slot in slots {
            if let Some(block) = state.blocks.get(slot) {
                keys.extend(block.keys().map(str::to_owned));
            }
        }
        keys.into_iter().collect()
    }

    /// Field values in `scope`, block by block.
    pub fn get_all_values(&self, scope: BlockScope) -> Vec<Value> {
        let slots = self.scoped_slots(&scope);
        let state = self.state.borrow();
        slots
            .into_iter()
            .filter_map(|slot| state.blocks.get(slot))
            .flat_map(|block| block.values().cloned())
            .collect()
    }

    /// Snapshots of the blocks in `scope`.
    pub fn get_all_blocks(&self, scope: BlockScope) -> Vec<DataBlock> {
        let slots = self.scoped_slots(&scope);
        let state = self.state.borrow();
        slots
            .into_iter()
            .filter_map(|slot| state.blocks.get(slot).cloned())
            .collect()
    }

    // -- delegates ---------------------------------------------------------

    /// Subscribe to field changes.
    pub fn subscribe(
        &self,
        callback: impl Fn(&str, &BlockKey, &Value) + 'static,
    ) -> SubscriptionId {
        let mut delegates = self.delegates.borrow_mut();
        let id = delegates.callbacks.insert(Rc::new(callback));
        delegates.order.push(id);
        id
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut delegates = self.delegates.borrow_mut();
        delegates.order.retain(|s| *s != id);
        delegates.callbacks.remove(id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.delegates.borrow().order.len()
    }

    /// Register a consumer for dirty/change hooks. Held weakly.
    pub fn attach_consumer(&self, consumer: Weak<dyn ModelConsumer>) {
        self.delegates.borrow_mut().consumers.push(consumer);
    }

    /// Remove a consumer registered with
    /// [`attach_consumer`](Self::attach_consumer).
    pub fn detach_consumer(&self, consumer: &Rc<dyn ModelConsumer>) {
        let target = Rc::as_ptr(consumer);
        self.delegates
            .borrow_mut()
            .consumers
            .retain(|c| !std::ptr::addr_eq(c.as_ptr(), target));
    }

    fn callbacks(&self) -> Vec<ChangeCallback> {
        let delegates = self.delegates.borrow();
        delegates
            .order
            .iter()
            .filter_map(|id| delegates.callbacks.get(*id).cloned())
            .collect()
    }

    fn notify(&self, field: &str, key: &BlockKey, value: &Value) {
        let consumers: Vec<Rc<dyn ModelConsumer>> = {
            let mut delegates = self.delegates.borrow_mut();
            delegates.consumers.retain(|c| c.strong_count() > 0);
            delegates.consumers.iter().filter_map(Weak::upgrade).collect()
        };
        for consumer in &consumers {
            consumer.on_dirty(field, key);
            consumer.on_change(field, value, key);
        }
        for callback in self.callbacks() {
            callback(field, key, value);
        }
    }

    // -- handlers ----------------------------------------------------------

    /// Register a handler, linking it to this model. Returns the key it was
    /// registered under (explicit, preset on the unit, or derived from its
    /// class name).
    pub fn add_handler(&self, handler: Rc<dyn LogicUnit>, key: Option<&str>) -> String {
        handler.context().link_model(self.this.clone());
        let registry = self.handlers.borrow().clone();
        registry.add(handler, key)
    }

    pub fn get_handler(&self, key: &str) -> Option<Rc<dyn LogicUnit>> {
        self.handlers.borrow().get(key)
    }

    /// The registry handlers are added to.
    pub fn handlers(&self) -> Rc<UnitRegistry> {
        self.handlers.borrow().clone()
    }

    /// Route future `add_handler` calls into `registry`, moving the handlers
    /// registered so far along with them.
    pub fn route_handlers(&self, registry: Rc<UnitRegistry>) {
        let previous = self.handlers.replace(Rc::clone(&registry));
        if Rc::ptr_eq(&previous, &registry) {
            return;
        }
        for (key, handler) in previous.entries() {
            registry.add(handler, Some(&key));
        }
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("blocks", &self.block_keys())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
