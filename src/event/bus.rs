//! EventBus: block-scoped publish/subscribe.
//!
//! Listeners are bucketed first by block key, then by event name. Firing is
//! synchronous and runs listeners in registration order. The bucket's
//! listener list is cloned before dispatch, so a listener may add or remove
//! listeners (including itself) without disturbing the current round.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::trace;

use crate::model::{BlockKey, Model};

/// Subscriber callback. Receives the fired arguments.
pub type Listener = Rc<dyn Fn(&[Value])>;

type Buckets = IndexMap<BlockKey, IndexMap<String, Vec<Listener>>>;

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Block-scoped event dispatcher.
pub struct EventBus {
    buckets: RefCell<Buckets>,
    model: RefCell<Weak<Model>>,
}

impl EventBus {
    /// Create a bus with no bound model.
    pub fn new() -> Self {
        Self {
            buckets: RefCell::new(IndexMap::new()),
            model: RefCell::new(Weak::new()),
        }
    }

    /// Create a bus ready to be shared.
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    /// Take the default block key from `model` from now on. Held weakly.
    pub fn bind_model(&self, model: &Rc<Model>) {
        *self.model.borrow_mut() = Rc::downgrade(model);
    }

    pub fn unbind_model(&self) {
        *self.model.borrow_mut() = Weak::new();
    }

    /// The bound model, if it is still alive.
    pub fn model(&self) -> Option<Rc<Model>> {
        self.model.borrow().upgrade()
    }

    /// The bound model's default block key. Unbound, it is the same private
    /// name a map-mode model uses for its default block.
    pub fn default_block_key(&self) -> BlockKey {
        match self.model() {
            Some(model) => model.default_block_key(),
            None => BlockKey::default_name(),
        }
    }

    // -- subscribe -----------------------------------------------------------

    /// Subscribe to `key` on the default block.
    pub fn add(&self, key: &str, listener: Listener) {
        self.add_with_block(key, self.default_block_key(), listener);
    }

    /// Subscribe to `key` on `block`. Invalid block keys are ignored.
    pub fn add_with_block(&self, key: &str, block: impl Into<BlockKey>, listener: Listener) {
        let block = block.into();
        if !block.is_valid() {
            trace!(%block, key, "add ignored: invalid block key");
            return;
        }
        self.buckets
            .borrow_mut()
            .entry(block)
            .or_default()
            .entry(key.to_owned())
            .or_default()
            .push(listener);
    }

    /// Wrap `f` into a [`Listener`], subscribe it on the default block, and
    /// return it so it can later be removed.
    pub fn on(&self, key: &str, f: impl Fn(&[Value]) + 'static) -> Listener {
        let listener: Listener = Rc::new(f);
        self.add(key, Rc::clone(&listener));
        listener
    }

    // -- unsubscribe ---------------------------------------------------------

    /// Remove `listener` from `key` on the default block, or the whole bucket
    /// when `listener` is `None`.
    pub fn remove(&self, key: &str, listener: Option<&Listener>) -> bool {
        self.remove_with_block(key, self.default_block_key(), listener)
    }

    /// Block-scoped [`remove`](Self::remove). Returns whether anything was
    /// removed.
    pub fn remove_with_block(
        &self,
        key: &str,
        block: impl Into<BlockKey>,
        listener: Option<&Listener>,
    ) -> bool {
        let block = block.into();
        let mut buckets = self.buckets.borrow_mut();
        let Some(events) = buckets.get_mut(&block) else {
            return false;
        };
        match listener {
            None => events.shift_remove(key).is_some(),
            Some(target) => {
                let Some(list) = events.get_mut(key) else {
                    return false;
                };
                match list
                    .iter()
                    .position(|l| std::ptr::addr_eq(Rc::as_ptr(l), Rc::as_ptr(target)))
                {
                    Some(pos) => {
                        list.remove(pos);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Drop every listener on every block.
    pub fn clear(&self) {
        self.buckets.borrow_mut().clear();
    }

    // -- fire ----------------------------------------------------------------

    /// Fire `key` on the default block.
    pub fn fire(&self, key: &str, args: &[Value]) -> usize {
        self.fire_with_block(key, self.default_block_key(), args)
    }

    /// Fire `key` on `block`. Returns the number of listeners run; unknown
    /// blocks and keys run none.
    pub fn fire_with_block(&self, key: &str, block: impl Into<BlockKey>, args: &[Value]) -> usize {
        let block = block.into();
        let listeners: Vec<Listener> = self
            .buckets
            .borrow()
            .get(&block)
            .and_then(|events| events.get(key))
            .cloned()
            .unwrap_or_default();
        trace!(%block, key, listeners = listeners.len(), "fire");
        for listener in &listeners {
            listener(args);
        }
        listeners.len()
    }

    // -- queries -------------------------------------------------------------

    /// Whether `key` has at least one listener on `block`.
    pub fn has(&self, key: &str, block: impl Into<BlockKey>) -> bool {
        self.listener_count(key, block) > 0
    }

    pub fn listener_count(&self, key: &str, block: impl Into<BlockKey>) -> usize {
        self.buckets
            .borrow()
            .get(&block.into())
            .and_then(|events| events.get(key))
            .map_or(0, Vec::len)
    }

    /// Blocks that have ever had a listener added, in first-use order.
    pub fn block_keys(&self) -> Vec<BlockKey> {
        self.buckets.borrow().keys().cloned().collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("blocks", &self.block_keys())
            .field("bound", &self.model().is_some())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
