//! Logic units and views: the objects an [`Orchestrator`](super::Orchestrator)
//! wires to its element, view, model and bus.
//!
//! Every unit carries a [`UnitContext`] holding weak back-references to its
//! collaborators. The orchestrator owns the collaborators and re-links every
//! context whenever one of them is replaced.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::event::EventBus;
use crate::model::Model;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The part a logic unit plays for its orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Controller,
    Handler,
    Interactor,
    Tool,
    Substrate,
}

impl Role {
    /// Every role, in initialization order.
    pub const ALL: [Role; 5] = [
        Role::Controller,
        Role::Handler,
        Role::Interactor,
        Role::Tool,
        Role::Substrate,
    ];

    /// Class-name suffix stripped during key derivation.
    pub fn suffix(self) -> &'static str {
        match self {
            Role::Controller => "Controller",
            Role::Handler => "Handler",
            Role::Interactor => "Interactor",
            Role::Tool => "Tool",
            Role::Substrate => "Substrate",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Controller => "controller",
            Role::Handler => "handler",
            Role::Interactor => "interactor",
            Role::Tool => "tool",
            Role::Substrate => "substrate",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// UnitProps
// ---------------------------------------------------------------------------

/// Properties record handed to unit and view factories.
///
/// `Clone` is the shallow copy: collaborators are shared, not duplicated.
#[derive(Clone, Default)]
pub struct UnitProps {
    pub element: Option<Weak<dyn Any>>,
    pub view: Option<Rc<dyn View>>,
    pub model: Option<Rc<Model>>,
    pub bus: Option<Rc<EventBus>>,
}

impl UnitProps {
    pub fn new() -> Self {
        Self::default()
    }

    /// The subset handlers receive: the model and nothing else.
    pub fn model_only(&self) -> Self {
        Self {
            model: self.model.clone(),
            ..Self::default()
        }
    }

    pub fn with_element(mut self, element: Weak<dyn Any>) -> Self {
        self.element = Some(element);
        self
    }

    pub fn with_view(mut self, view: Rc<dyn View>) -> Self {
        self.view = Some(view);
        self
    }

    pub fn with_model(mut self, model: Rc<Model>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_bus(mut self, bus: Rc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }
}

impl fmt::Debug for UnitProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitProps")
            .field("element", &self.element.is_some())
            .field("view", &self.view.is_some())
            .field("model", &self.model.as_ref().map(|m| m.id()))
            .field("bus", &self.bus.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// UnitContext
// ---------------------------------------------------------------------------

/// Back-references and registration key of one unit or view.
#[derive(Default)]
pub struct UnitContext {
    element: RefCell<Option<Weak<dyn Any>>>,
    view: RefCell<Option<Weak<dyn View>>>,
    model: RefCell<Weak<Model>>,
    bus: RefCell<Weak<EventBus>>,
    key: RefCell<Option<String>>,
}

impl UnitContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context linked to everything in `props`.
    pub fn from_props(props: &UnitProps) -> Self {
        let context = Self::new();
        context.relink(props);
        context
    }

    /// Preset the registration key (builder).
    pub fn with_key(self, key: impl Into<String>) -> Self {
        self.set_key_name(key);
        self
    }

    /// Point every back-reference at the collaborators in `props`.
    pub fn relink(&self, props: &UnitProps) {
        *self.element.borrow_mut() = props.element.clone();
        *self.view.borrow_mut() = props.view.as_ref().map(Rc::downgrade);
        *self.model.borrow_mut() = props.model.as_ref().map(Rc::downgrade).unwrap_or_default();
        *self.bus.borrow_mut() = props.bus.as_ref().map(Rc::downgrade).unwrap_or_default();
    }

    pub(crate) fn link_model(&self, model: Weak<Model>) {
        *self.model.borrow_mut() = model;
    }

    pub fn element(&self) -> Option<Rc<dyn Any>> {
        self.element.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn view(&self) -> Option<Rc<dyn View>> {
        self.view.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn model(&self) -> Option<Rc<Model>> {
        self.model.borrow().upgrade()
    }

    pub fn bus(&self) -> Option<Rc<EventBus>> {
        self.bus.borrow().upgrade()
    }

    /// The key this unit is registered under.
    pub fn key_name(&self) -> Option<String> {
        self.key.borrow().clone()
    }

    pub fn set_key_name(&self, key: impl Into<String>) {
        *self.key.borrow_mut() = Some(key.into());
    }
}

impl fmt::Debug for UnitContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitContext")
            .field("key", &self.key.borrow())
            .field("view", &self.view().is_some())
            .field("model", &self.model().map(|m| m.id()))
            .field("bus", &self.bus().is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// The presentation side of an orchestrator.
pub trait View: Any {
    fn context(&self) -> &UnitContext;

    /// Called first during orchestrator initialization.
    fn initialize(&self) {}

    fn as_any(&self) -> &dyn Any;
}

/// A controller, handler, interactor, tool or substrate.
pub trait LogicUnit: Any {
    fn context(&self) -> &UnitContext;

    /// The role this unit is written for.
    fn role(&self) -> Role;

    /// Called once during orchestrator initialization, in role order.
    fn initialize(&self) {}

    /// Short type name used for key derivation.
    fn class_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    fn as_any(&self) -> &dyn Any;
}

/// `a::b::Thing<c::D>` becomes `Thing`.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl fmt::Debug for dyn LogicUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicUnit")
            .field("class", &self.class_name())
            .field("role", &self.role())
            .field("key", &self.context().key_name())
            .finish()
    }
}

impl fmt::Debug for dyn View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("context", self.context())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StorageMode;

    struct PanelTool {
        context: UnitContext,
    }

    impl LogicUnit for PanelTool {
        fn context(&self) -> &UnitContext {
            &self.context
        }
        fn role(&self) -> Role {
            Role::Tool
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn role_display_and_suffix() {
        assert_eq!(Role::Interactor.to_string(), "interactor");
        assert_eq!(Role::Interactor.suffix(), "Interactor");
    }

    #[test]
    fn class_name_is_short() {
        let tool = PanelTool {
            context: UnitContext::new(),
        };
        let unit: &dyn LogicUnit = &tool;
        assert_eq!(unit.class_name(), "PanelTool");
        assert_eq!(short_type_name("x::y::Foo<z::Bar>"), "Foo");
    }

    #[test]
    fn context_links_weakly() {
        let model = Model::new(StorageMode::Map);
        let bus = EventBus::shared();
        let props = UnitProps::new().with_model(model.clone()).with_bus(bus.clone());
        let context = UnitContext::from_props(&props).with_key("panel");

        assert!(Rc::ptr_eq(&context.model().unwrap(), &model));
        assert!(Rc::ptr_eq(&context.bus().unwrap(), &bus));
        assert!(context.view().is_none());
        assert_eq!(context.key_name().as_deref(), Some("panel"));

        drop(props);
        drop(model);
        assert!(context.model().is_none());
    }

    #[test]
    fn model_only_props() {
        let props = UnitProps::new()
            .with_model(Model::new(StorageMode::Map))
            .with_bus(EventBus::shared());
        let handler_props = props.model_only();
        assert!(handler_props.model.is_some());
        assert!(handler_props.bus.is_none());
    }
}
