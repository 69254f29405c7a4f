//! ManagedProperty<T>: a synthesized accessor pair over private backing storage.
//!
//! Reads and writes run through [`PropertyOptions`]: defaults are computed on
//! first read, writes are pre-processed, compared, forwarded to the user
//! setter and hooks. Two independent re-entrancy flags keep callbacks that
//! touch the same property from recursing:
//!
//! - while reading, a nested read returns the baseline value directly, so a
//!   default callback that reads its own property sees "undefined" instead of
//!   recomputing the default;
//! - while writing, a nested write goes straight to backing storage, so a
//!   user setter that assigns its own property does not loop.
//!
//! Single-threaded and synchronous, like the reactive runtime it feeds.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use super::options::{Fallback, Initial, PropertyOptions};

// ---------------------------------------------------------------------------
// Accessor
// ---------------------------------------------------------------------------

/// A readable, writable property slot. Implemented by [`ManagedProperty`] so
/// one property can override (delegate to) another.
pub trait Accessor<T> {
    /// Read the current value (`None` = undefined).
    fn read(&self) -> Option<T>;
    /// Write a value; returns whether it was stored.
    fn write(&self, value: T) -> bool;
}

// ---------------------------------------------------------------------------
// Flag guard
// ---------------------------------------------------------------------------

/// Raises a flag for the lifetime of the guard.
struct FlagGuard<'a>(&'a Cell<bool>);

impl<'a> FlagGuard<'a> {
    fn raise(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// ---------------------------------------------------------------------------
// ManagedProperty
// ---------------------------------------------------------------------------

/// A property whose read/write behavior is synthesized from options.
pub struct ManagedProperty<T: 'static> {
    options: Rc<PropertyOptions<T>>,
    slot: RefCell<Option<T>>,
    reading: Cell<bool>,
    writing: Cell<bool>,
}

impl<T: Clone + PartialEq + 'static> ManagedProperty<T> {
    /// Create a property that owns its options (field form without an
    /// initializer expression).
    pub fn new(options: PropertyOptions<T>) -> Self {
        Self::from_descriptor(Rc::new(options))
    }

    /// Create a property seeded from a field initializer.
    ///
    /// The initializer wins over any configured initial value.
    pub fn with_initializer(value: T, options: PropertyOptions<T>) -> Self {
        let property = Self::unseeded(Rc::new(options));
        property.seed(Some(value));
        property
    }

    /// Create a property from shared options (accessor form). See
    /// [`descriptor`](super::ledger::descriptor).
    pub fn from_descriptor(options: Rc<PropertyOptions<T>>) -> Self {
        let property = Self::unseeded(options);
        property.seed(None);
        property
    }

    fn unseeded(options: Rc<PropertyOptions<T>>) -> Self {
        Self {
            options,
            slot: RefCell::new(None),
            reading: Cell::new(false),
            writing: Cell::new(false),
        }
    }

    /// Seed backing storage at construction if it is still undefined.
    fn seed(&self, field_initializer: Option<T>) {
        if self.slot.borrow().is_some() {
            return;
        }
        let initial = field_initializer.or_else(|| match &self.options.initial {
            Some(Initial::Value(v)) => Some(v.clone()),
            Some(Initial::With(f)) => Some(f()),
            None => None,
        });
        let Some(value) = initial else {
            return;
        };
        let value = match &self.options.pre_process {
            Some(f) => f(self, value),
            None => value,
        };
        *self.slot.borrow_mut() = Some(value);
    }

    /// The shared options this property was built from.
    pub fn options(&self) -> &Rc<PropertyOptions<T>> {
        &self.options
    }

    // -- read path ---------------------------------------------------------

    /// The value without defaulting: the user getter (when configured to
    /// serve reads), else the overridden parent, else backing storage.
    fn baseline(&self) -> Option<T> {
        if self.options.return_getter_value {
            if let Some(getter) = &self.options.getter {
                return getter(self);
            }
        }
        if let Some(parent) = &self.options.parent {
            return parent.read();
        }
        self.slot.borrow().clone()
    }

    /// Read the property, resolving a configured default if undefined.
    pub fn get(&self) -> Option<T> {
        if self.reading.get() {
            return self.baseline();
        }
        let _guard = FlagGuard::raise(&self.reading);

        let current = self.baseline();
        if current.is_some() {
            return current;
        }
        let value = match &self.options.default {
            Some(Fallback::Value(v)) => v.clone(),
            Some(Fallback::With(f)) => f(self),
            None => return None,
        };
        if self.options.stores_default() {
            self.set(value);
            self.baseline()
        } else {
            Some(value)
        }
    }

    /// Raw backing storage, bypassing getters, parents, and defaults.
    pub fn stored(&self) -> Option<T> {
        self.slot.borrow().clone()
    }

    // -- write path --------------------------------------------------------

    /// Write the property. Returns `true` when the value was stored.
    pub fn set(&self, value: T) -> bool {
        if self.writing.get() {
            *self.slot.borrow_mut() = Some(value);
            return true;
        }
        let _guard = FlagGuard::raise(&self.writing);

        if let Some(hook) = &self.options.before_write {
            hook(self, &value);
        }
        let value = match &self.options.pre_process {
            Some(f) => f(self, value),
            None => value,
        };
        if self.options.cancel_if_unchanged && self.baseline().as_ref() == Some(&value) {
            trace!("managed property write cancelled: value unchanged");
            return false;
        }

        if self.options.fire_setter_before_storing {
            self.call_setter(&value);
            self.store(value.clone());
        } else {
            self.store(value.clone());
            self.call_setter(&value);
        }

        for hook in &self.options.after_write {
            hook(self, &value);
        }
        true
    }

    fn store(&self, value: T) {
        *self.slot.borrow_mut() = Some(value.clone());
        if let Some(parent) = &self.options.parent {
            parent.write(value);
        }
    }

    fn call_setter(&self, value: &T) {
        if let Some(setter) = &self.options.setter {
            setter(self, value);
        }
    }

    /// Reset backing storage to undefined without running any hook.
    pub fn clear(&self) {
        *self.slot.borrow_mut() = None;
    }

    /// Whether backing storage holds a value.
    pub fn is_defined(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Whether a read is in progress on this property.
    pub fn is_reading(&self) -> bool {
        self.reading.get()
    }

    /// Whether a write is in progress on this property.
    pub fn is_writing(&self) -> bool {
        self.writing.get()
    }
}

impl<T: Clone + PartialEq + 'static> Accessor<T> for ManagedProperty<T> {
    fn read(&self) -> Option<T> {
        self.get()
    }

    fn write(&self, value: T) -> bool {
        self.set(value)
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for ManagedProperty<T> {
    fn default() -> Self {
        Self::new(PropertyOptions::new().with_default(T::default()))
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for ManagedProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedProperty")
            .field("value", &self.slot.borrow())
            .field("options", &self.options)
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
