//! PropertyOptions: the configuration record for a managed property.
//!
//! Options are built with chainable setters and then shared (behind an `Rc`)
//! by every [`ManagedProperty`] created from them. Accessor-style
//! declarations share one options record per owner type through the
//! [`ledger`](super::ledger); field-style declarations own theirs.

use std::fmt;
use std::rc::Rc;

use super::managed::{Accessor, ManagedProperty};

/// Callback observing a value about to be, or just, written.
pub type Hook<T> = Rc<dyn Fn(&ManagedProperty<T>, &T)>;
/// Callback transforming an incoming value before it is compared and stored.
pub type PreProcess<T> = Rc<dyn Fn(&ManagedProperty<T>, T) -> T>;
/// User getter. Returning `None` means "undefined".
pub type Getter<T> = Rc<dyn Fn(&ManagedProperty<T>) -> Option<T>>;
/// Callback producing a default value on first read.
pub type DefaultFn<T> = Rc<dyn Fn(&ManagedProperty<T>) -> T>;
/// Callback producing an initial value at construction.
pub type InitialFn<T> = Rc<dyn Fn() -> T>;

/// Where a default value comes from.
pub enum Fallback<T: 'static> {
    Value(T),
    With(DefaultFn<T>),
}

/// Where an initial value comes from.
pub enum Initial<T: 'static> {
    Value(T),
    With(InitialFn<T>),
}

/// Behavior flags and hooks for a [`ManagedProperty`].
pub struct PropertyOptions<T: 'static> {
    pub(crate) cancel_if_unchanged: bool,
    pub(crate) return_getter_value: bool,
    pub(crate) fire_setter_before_storing: bool,
    pub(crate) set_if_undefined: Option<bool>,
    pub(crate) default: Option<Fallback<T>>,
    pub(crate) initial: Option<Initial<T>>,
    pub(crate) pre_process: Option<PreProcess<T>>,
    pub(crate) before_write: Option<Hook<T>>,
    pub(crate) after_write: Vec<Hook<T>>,
    pub(crate) getter: Option<Getter<T>>,
    pub(crate) setter: Option<Hook<T>>,
    pub(crate) parent: Option<Rc<dyn Accessor<T>>>,
}

impl<T: 'static> Default for PropertyOptions<T> {
    fn default() -> Self {
        Self {
            cancel_if_unchanged: true,
            return_getter_value: false,
            fire_setter_before_storing: false,
            set_if_undefined: None,
            default: None,
            initial: None,
            pre_process: None,
            before_write: None,
            after_write: Vec::new(),
            getter: None,
            setter: None,
            parent: None,
        }
    }
}

impl<T: 'static> PropertyOptions<T> {
    /// Options with every flag at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the write (and every hook) when the pre-processed value equals the
    /// current one. On by default.
    pub fn cancel_if_unchanged(mut self, cancel: bool) -> Self {
        self.cancel_if_unchanged = cancel;
        self
    }

    /// Serve reads from the user getter instead of backing storage.
    pub fn return_getter_value(mut self, enabled: bool) -> Self {
        self.return_getter_value = enabled;
        self
    }

    /// Call the user setter before the value reaches backing storage.
    pub fn fire_setter_before_storing(mut self, enabled: bool) -> Self {
        self.fire_setter_before_storing = enabled;
        self
    }

    /// Whether a computed default is written through the write path.
    ///
    /// Defaults to `true` once a default is configured. With `false` the
    /// default is returned from the read but never stored.
    pub fn set_if_undefined(mut self, enabled: bool) -> Self {
        self.set_if_undefined = Some(enabled);
        self
    }

    /// Default value served when the property is undefined on read.
    pub fn with_default(mut self, value: T) -> Self {
        self.default = Some(Fallback::Value(value));
        self
    }

    /// Default computed on read when the property is undefined.
    pub fn default_with(mut self, f: impl Fn(&ManagedProperty<T>) -> T + 'static) -> Self {
        self.default = Some(Fallback::With(Rc::new(f)));
        self
    }

    /// Value seeded into backing storage at construction.
    pub fn with_initial(mut self, value: T) -> Self {
        self.initial = Some(Initial::Value(value));
        self
    }

    /// Callback producing the value seeded at construction.
    pub fn initial_with(mut self, f: impl Fn() -> T + 'static) -> Self {
        self.initial = Some(Initial::With(Rc::new(f)));
        self
    }

    /// Transform every incoming value (including initial values).
    pub fn pre_process(mut self, f: impl Fn(&ManagedProperty<T>, T) -> T + 'static) -> Self {
        self.pre_process = Some(Rc::new(f));
        self
    }

    /// Observe the raw incoming value before pre-processing.
    pub fn before_write(mut self, f: impl Fn(&ManagedProperty<T>, &T) + 'static) -> Self {
        self.before_write = Some(Rc::new(f));
        self
    }

    /// Observe the final value after it has been stored.
    ///
    /// Multiple hooks run in the order they were added.
    pub fn after_write(mut self, f: impl Fn(&ManagedProperty<T>, &T) + 'static) -> Self {
        self.after_write.push(Rc::new(f));
        self
    }

    /// User getter captured at setup time.
    pub fn getter(mut self, f: impl Fn(&ManagedProperty<T>) -> Option<T> + 'static) -> Self {
        self.getter = Some(Rc::new(f));
        self
    }

    /// User setter captured at setup time.
    pub fn setter(mut self, f: impl Fn(&ManagedProperty<T>, &T) + 'static) -> Self {
        self.setter = Some(Rc::new(f));
        self
    }

    /// Delegate reads to `parent` and mirror writes into it.
    pub fn overriding(mut self, parent: Rc<dyn Accessor<T>>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Whether a computed default is written back on read.
    pub(crate) fn stores_default(&self) -> bool {
        self.set_if_undefined.unwrap_or(true)
    }

    /// Whether any defaulting option applies.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

impl<T: Clone + 'static> Clone for Fallback<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(v) => Self::Value(v.clone()),
            Self::With(f) => Self::With(Rc::clone(f)),
        }
    }
}

impl<T: Clone + 'static> Clone for Initial<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(v) => Self::Value(v.clone()),
            Self::With(f) => Self::With(Rc::clone(f)),
        }
    }
}

impl<T: Clone + 'static> Clone for PropertyOptions<T> {
    fn clone(&self) -> Self {
        Self {
            cancel_if_unchanged: self.cancel_if_unchanged,
            return_getter_value: self.return_getter_value,
            fire_setter_before_storing: self.fire_setter_before_storing,
            set_if_undefined: self.set_if_undefined,
            default: self.default.clone(),
            initial: self.initial.clone(),
            pre_process: self.pre_process.clone(),
            before_write: self.before_write.clone(),
            after_write: self.after_write.clone(),
            getter: self.getter.clone(),
            setter: self.setter.clone(),
            parent: self.parent.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for PropertyOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyOptions")
            .field("cancel_if_unchanged", &self.cancel_if_unchanged)
            .field("return_getter_value", &self.return_getter_value)
            .field("fire_setter_before_storing", &self.fire_setter_before_storing)
            .field("set_if_undefined", &self.set_if_undefined)
            .field("has_default", &self.default.is_some())
            .field("has_initial", &self.initial.is_some())
            .field("after_write_hooks", &self.after_write.len())
            .field("overrides", &self.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = PropertyOptions::<u32>::new();
        assert!(opts.cancel_if_unchanged);
        assert!(!opts.return_getter_value);
        assert!(!opts.fire_setter_before_storing);
        assert!(!opts.has_default());
        assert!(opts.stores_default());
    }

    #[test]
    fn builder_chains() {
        let opts = PropertyOptions::<u32>::new()
            .cancel_if_unchanged(false)
            .fire_setter_before_storing(true)
            .with_default(3)
            .set_if_undefined(false)
            .after_write(|_, _| {})
            .after_write(|_, _| {});
        assert!(!opts.cancel_if_unchanged);
        assert!(opts.fire_setter_before_storing);
        assert!(opts.has_default());
        assert!(!opts.stores_default());
        assert_eq!(opts.after_write.len(), 2);
    }

    #[test]
    fn sources_hold_callbacks() {
        let fallback: Fallback<String> =
            Fallback::With(Rc::new(|_: &ManagedProperty<String>| "computed".to_owned()));
        let initial: Initial<String> = Initial::With(Rc::new(|| "seed".to_owned()));
        assert!(matches!(fallback, Fallback::With(_)));
        assert!(matches!(initial, Initial::With(ref f) if f() == "seed"));

        let prop = ManagedProperty::new(
            PropertyOptions::<String>::new().default_with(|_| "computed".to_owned()),
        );
        assert_eq!(prop.get().as_deref(), Some("computed"));
    }

    #[test]
    fn debug_hides_closures() {
        let opts = PropertyOptions::<u32>::new().setter(|_, _| {});
        let dbg = format!("{opts:?}");
        assert!(dbg.contains("PropertyOptions"));
        assert!(dbg.contains("cancel_if_unchanged: true"));
    }
}
