//! Provider: a ready instance or a factory producing one from [`UnitProps`].

use std::fmt;
use std::rc::Rc;

use super::unit::{LogicUnit, UnitProps, View};
use crate::event::EventBus;
use crate::model::Model;

/// Factory signature shared by every provider.
pub type Factory<T> = Rc<dyn Fn(UnitProps) -> Rc<T>>;

/// Either a ready instance (used as-is) or a factory.
pub enum Provider<T: ?Sized> {
    Instance(Rc<T>),
    Factory(Factory<T>),
}

impl<T: ?Sized> Provider<T> {
    /// Wrap a ready instance.
    pub fn instance(value: Rc<T>) -> Self {
        Self::Instance(value)
    }

    /// Wrap a factory closure.
    pub fn factory(f: impl Fn(UnitProps) -> Rc<T> + 'static) -> Self {
        Self::Factory(Rc::new(f))
    }

    /// Produce the instance. Factories receive a shallow copy of `props`.
    pub fn generate(&self, props: &UnitProps) -> Rc<T> {
        match self {
            Self::Instance(value) => Rc::clone(value),
            Self::Factory(f) => f(props.clone()),
        }
    }

    pub fn is_factory(&self) -> bool {
        matches!(self, Self::Factory(_))
    }
}

impl<T: ?Sized> Clone for Provider<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Instance(value) => Self::Instance(Rc::clone(value)),
            Self::Factory(f) => Self::Factory(Rc::clone(f)),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Provider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(_) => f.write_str("Provider::Instance"),
            Self::Factory(_) => f.write_str("Provider::Factory"),
        }
    }
}

impl Provider<dyn LogicUnit> {
    /// Factory for a concrete unit type.
    pub fn of<U: LogicUnit>(f: impl Fn(UnitProps) -> U + 'static) -> Self {
        Self::Factory(Rc::new(move |props| Rc::new(f(props)) as Rc<dyn LogicUnit>))
    }

    /// A ready concrete unit.
    pub fn ready<U: LogicUnit>(unit: U) -> Self {
        Self::Instance(Rc::new(unit))
    }
}

impl Provider<dyn View> {
    /// Factory for a concrete view type.
    pub fn of<V: View>(f: impl Fn(UnitProps) -> V + 'static) -> Self {
        Self::Factory(Rc::new(move |props| Rc::new(f(props)) as Rc<dyn View>))
    }

    /// A ready concrete view.
    pub fn ready<V: View>(view: V) -> Self {
        Self::Instance(Rc::new(view))
    }
}

impl From<Rc<Model>> for Provider<Model> {
    fn from(model: Rc<Model>) -> Self {
        Self::Instance(model)
    }
}

impl From<Rc<EventBus>> for Provider<EventBus> {
    fn from(bus: Rc<EventBus>) -> Self {
        Self::Instance(bus)
    }
}
