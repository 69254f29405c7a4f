//! Orchestrator: the composition root binding one element to a view, a model,
//! an event bus and five registries of logic units.
//!
//! Construction order is fixed: bus, model, view, then units role by role
//! (handlers first, since they attach to the model). Whenever the view, model
//! or bus is replaced, every registered unit is re-linked to the new
//! instances. The model's field changes are forwarded to the bus as
//! block-scoped events named after the field.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use tracing::debug;

use super::options::MvcOptions;
use super::provider::Provider;
use super::registry::UnitRegistry;
use super::unit::{LogicUnit, Role, UnitProps, View};
use crate::element::ElementClass;
use crate::error::{Error, Result};
use crate::event::EventBus;
use crate::model::{Model, SubscriptionId};

/// Order in which queued units are generated during construction.
const CONSTRUCTION_ORDER: [Role; 5] = [
    Role::Handler,
    Role::Controller,
    Role::Interactor,
    Role::Tool,
    Role::Substrate,
];

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Binds an element class to its view, model, bus and logic units.
pub struct Orchestrator {
    this: Weak<Orchestrator>,
    class: &'static ElementClass,
    element: Option<Weak<dyn Any>>,
    view: RefCell<Option<Rc<dyn View>>>,
    model: RefCell<Option<Rc<Model>>>,
    bus: RefCell<Option<Rc<EventBus>>>,
    forwarding: Cell<Option<SubscriptionId>>,
    registries: IndexMap<Role, Rc<UnitRegistry>>,
}

impl Orchestrator {
    /// Build an orchestrator for `class` from `options`.
    ///
    /// A bus is created when none is supplied. Initial data goes into the
    /// model's default block without notifications; with
    /// `options.initialize` the initialization sequence runs last.
    pub fn new(class: &'static ElementClass, options: MvcOptions) -> Rc<Self> {
        let orchestrator = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            class,
            element: options.element.clone(),
            view: RefCell::new(None),
            model: RefCell::new(None),
            bus: RefCell::new(None),
            forwarding: Cell::new(None),
            registries: Role::ALL
                .into_iter()
                .map(|role| (role, Rc::new(UnitRegistry::new(role, Some(class)))))
                .collect(),
        });

        let bus = options
            .bus
            .unwrap_or_else(|| Provider::Instance(EventBus::shared()));
        orchestrator.set_bus(bus);
        if let Some(model) = options.model {
            orchestrator.set_model(model);
        }
        if let Some(view) = options.view {
            orchestrator.set_view(view);
        }
        for role in CONSTRUCTION_ORDER {
            for entry in options.units.get(&role).into_iter().flatten() {
                orchestrator.add_unit(role, &entry.provider, entry.key.as_deref());
            }
        }

        if let Some(data) = options.data {
            match orchestrator.model() {
                Some(model) => {
                    model.set_block(data, None, None, false);
                }
                None => debug!(class = class.name(), "initial data dropped: no model"),
            }
        }

        debug!(
            class = class.name(),
            units = orchestrator.registries.values().map(|r| r.len()).sum::<usize>(),
            "orchestrator constructed"
        );

        if options.initialize {
            orchestrator.initialize();
        }
        orchestrator
    }

    pub fn class(&self) -> &'static ElementClass {
        self.class
    }

    /// The owning element, if it is still alive.
    pub fn element(&self) -> Option<Rc<dyn Any>> {
        self.element.as_ref().and_then(Weak::upgrade)
    }

    /// Properties record describing the current collaborators.
    pub fn props(&self) -> UnitProps {
        UnitProps {
            element: self.element.clone(),
            view: self.view(),
            model: self.model(),
            bus: self.bus(),
        }
    }

    /// Resolve `provider` against the current collaborators.
    pub fn generate<T: ?Sized>(&self, provider: &Provider<T>) -> Rc<T> {
        provider.generate(&self.props())
    }

    // -- collaborators -------------------------------------------------------

    pub fn view(&self) -> Option<Rc<dyn View>> {
        self.view.borrow().clone()
    }

    pub fn model(&self) -> Option<Rc<Model>> {
        self.model.borrow().clone()
    }

    pub fn bus(&self) -> Option<Rc<EventBus>> {
        self.bus.borrow().clone()
    }

    /// Install a view and re-link every unit.
    pub fn set_view(&self, view: Provider<dyn View>) -> Rc<dyn View> {
        let view = self.generate(&view);
        *self.view.borrow_mut() = Some(Rc::clone(&view));
        self.relink();
        view
    }

    /// Install a model: drop the forwarding subscription on the previous one,
    /// forward the new model's changes to the bus, route its handler registry
    /// into this orchestrator, and re-link every unit.
    pub fn set_model(&self, model: impl Into<Provider<Model>>) -> Rc<Model> {
        let model = self.generate(&model.into());
        let previous = self.model.replace(Some(Rc::clone(&model)));
        if let (Some(previous), Some(id)) = (previous, self.forwarding.take()) {
            previous.unsubscribe(id);
        }

        let this = self.this.clone();
        let id = model.subscribe(move |field, block, value| {
            let Some(bus) = this.upgrade().and_then(|o| o.bus()) else {
                return;
            };
            bus.fire_with_block(field, block.clone(), std::slice::from_ref(value));
        });
        self.forwarding.set(Some(id));

        model.route_handlers(self.registry(Role::Handler));
        if let Some(bus) = self.bus() {
            bus.bind_model(&model);
        }
        self.relink();
        debug!(class = self.class.name(), model = ?model.id(), "model installed");
        model
    }

    /// Install a bus, bind it to the current model, and re-link every unit.
    pub fn set_bus(&self, bus: impl Into<Provider<EventBus>>) -> Rc<EventBus> {
        let bus = self.generate(&bus.into());
        if let Some(previous) = self.bus.replace(Some(Rc::clone(&bus))) {
            previous.unbind_model();
        }
        if let Some(model) = self.model() {
            bus.bind_model(&model);
        }
        self.relink();
        bus
    }

    fn relink(&self) {
        let props = self.props();
        let handler_props = props.model_only();
        if let Some(view) = &props.view {
            view.context().relink(&props);
        }
        for (role, registry) in &self.registries {
            let props = if *role == Role::Handler { &handler_props } else { &props };
            for unit in registry.units() {
                unit.context().relink(props);
            }
        }
    }

    // -- units ---------------------------------------------------------------

    fn registry(&self, role: Role) -> Rc<UnitRegistry> {
        match self.registries.get(&role) {
            Some(registry) => Rc::clone(registry),
            None => Rc::new(UnitRegistry::new(role, Some(self.class))),
        }
    }

    /// Generate a unit from `provider`, link it, and register it under
    /// `key` (derived when `None`). Handlers see only the model and are
    /// registered through it when one is installed.
    pub fn add_unit(
        &self,
        role: Role,
        provider: &Provider<dyn LogicUnit>,
        key: Option<&str>,
    ) -> String {
        let props = match role {
            Role::Handler => self.props().model_only(),
            _ => self.props(),
        };
        let unit = provider.generate(&props);
        unit.context().relink(&props);
        match (role, self.model()) {
            (Role::Handler, Some(model)) => model.add_handler(unit, key),
            _ => self.registry(role).add(unit, key),
        }
    }

    /// The unit registered for `role` under `key`.
    pub fn unit(&self, role: Role, key: &str) -> Option<Rc<dyn LogicUnit>> {
        self.registry(role).get(key)
    }

    /// Like [`unit`](Self::unit), but a miss is an error naming the role and
    /// key.
    pub fn require(&self, role: Role, key: &str) -> Result<Rc<dyn LogicUnit>> {
        self.unit(role, key).ok_or_else(|| Error::MissingUnit {
            role,
            key: key.to_owned(),
        })
    }

    /// Units registered for `role`, in registration order.
    pub fn units(&self, role: Role) -> Vec<Rc<dyn LogicUnit>> {
        self.registry(role).units()
    }

    /// Registration keys for `role`, in registration order.
    pub fn unit_keys(&self, role: Role) -> Vec<String> {
        self.registry(role).keys()
    }

    pub fn remove_unit(&self, role: Role, key: &str) -> Option<Rc<dyn LogicUnit>> {
        self.registry(role).remove(key)
    }

    /// Run the initialization sequence: view, controllers, model catch-up,
    /// interactors, tools, substrates.
    pub fn initialize(&self) {
        debug!(class = self.class.name(), "initializing");
        if let Some(view) = self.view() {
            view.initialize();
        }
        for unit in self.units(Role::Controller) {
            unit.initialize();
        }
        if let Some(model) = self.model() {
            model.initialize(None);
        }
        for role in [Role::Interactor, Role::Tool, Role::Substrate] {
            for unit in self.units(role) {
                unit.initialize();
            }
        }
    }
}

macro_rules! role_accessors {
    ($($role:ident => $add:ident, $get:ident, $all:ident;)*) => {
        impl Orchestrator {
            $(
                #[doc = concat!("Register a unit as `Role::", stringify!($role), "`.")]
                pub fn $add(&self, provider: Provider<dyn LogicUnit>, key: Option<&str>) -> String {
                    self.add_unit(Role::$role, &provider, key)
                }

                #[doc = concat!("Look up a `Role::", stringify!($role), "` unit.")]
                pub fn $get(&self, key: &str) -> Option<Rc<dyn LogicUnit>> {
                    self.unit(Role::$role, key)
                }

                #[doc = concat!(
                    "Every `Role::", stringify!($role), "` unit, in registration order."
                )]
                pub fn $all(&self) -> Vec<Rc<dyn LogicUnit>> {
                    self.units(Role::$role)
                }
            )*
        }
    };
}

role_accessors! {
    Controller => add_controller, controller, controllers;
    Handler => add_handler, handler, handlers;
    Interactor => add_interactor, interactor, interactors;
    Tool => add_tool, tool, tools;
    Substrate => add_substrate, substrate, substrates;
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("class", &self.class.name())
            .field("model", &self.model().map(|m| m.id()))
            .field("view", &self.view().is_some())
            .field("registries", &self.registries.values().collect::<Vec<_>>())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockKey, StorageMode};
    use crate::mvc::unit::UnitContext;
    use crate::testing::{Recorder, RecordingUnit, RecordingView};
    use serde_json::{json, Value};
    use std::cell::RefCell;

    static WIDGET: ElementClass = ElementClass::root("Widget");
    static PICKER: ElementClass = ElementClass::extends("ColorPicker", &WIDGET);

    struct WidgetColorController {
        context: UnitContext,
    }

    impl LogicUnit for WidgetColorController {
        fn context(&self) -> &UnitContext {
            &self.context
        }
        fn role(&self) -> Role {
            Role::Controller
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn color_controller() -> Provider<dyn LogicUnit> {
        Provider::<dyn LogicUnit>::of(|props| WidgetColorController {
            context: UnitContext::from_props(&props),
        })
    }

    // ── Construction ─────────────────────────────────────────────────

    #[test]
    fn bus_is_created_when_missing() {
        let orchestrator = Orchestrator::new(&WIDGET, MvcOptions::new());
        assert!(orchestrator.bus().is_some());
        assert!(orchestrator.model().is_none());
        assert!(orchestrator.view().is_none());
    }

    #[test]
    fn derived_controller_key() {
        let orchestrator =
            Orchestrator::new(&WIDGET, MvcOptions::new().with_controller(color_controller()));
        assert_eq!(orchestrator.unit_keys(Role::Controller), vec!["color"]);
        assert!(orchestrator.controller("color").is_some());
    }

    #[test]
    fn derived_key_walks_ancestors() {
        let orchestrator = Orchestrator::new(&PICKER, MvcOptions::new());
        orchestrator.add_controller(color_controller(), None);
        assert!(orchestrator.controller("color").is_some());
    }

    #[test]
    fn initial_data_lands_in_default_block() {
        let orchestrator = Orchestrator::new(
            &WIDGET,
            MvcOptions::new()
                .with_model(Model::new(StorageMode::Map))
                .with_data(json!({"hue": 120}))
                .with_initialize(false),
        );
        let model = orchestrator.model().unwrap();
        assert_eq!(model.get_data("hue", None), Some(json!(120)));
    }

    #[test]
    fn initialization_order() {
        let recorder = Recorder::new();
        let model = Model::new(StorageMode::Map);
        let rec = recorder.clone();
        model.subscribe(move |field, _, _| rec.record(format!("model:{field}")));

        let _orchestrator = Orchestrator::new(
            &WIDGET,
            MvcOptions::new()
                .with_model(model)
                .with_data(json!({"x": 1}))
                .with_view(RecordingView::provider(&recorder, "view"))
                .with_tool(RecordingUnit::provider(&recorder, Role::Tool, "tool"))
                .with_substrate(RecordingUnit::provider(&recorder, Role::Substrate, "substrate"))
                .with_interactor(RecordingUnit::provider(&recorder, Role::Interactor, "interactor"))
                .with_controller(RecordingUnit::provider(
                    &recorder,
                    Role::Controller,
                    "controller",
                )),
        );

        assert_eq!(
            recorder.entries(),
            vec!["view", "controller", "model:x", "interactor", "tool", "substrate"]
        );
    }

    #[test]
    fn initialize_flag_off_runs_nothing() {
        let recorder = Recorder::new();
        let orchestrator = Orchestrator::new(
            &WIDGET,
            MvcOptions::new()
                .with_view(RecordingView::provider(&recorder, "view"))
                .with_initialize(false),
        );
        assert!(recorder.entries().is_empty());
        orchestrator.initialize();
        assert_eq!(recorder.entries(), vec!["view"]);
    }

    // ── Wiring ───────────────────────────────────────────────────────

    #[test]
    fn set_model_relinks_units() {
        let orchestrator = Orchestrator::new(
            &WIDGET,
            MvcOptions::new()
                .with_model(Model::new(StorageMode::Map))
                .with_controller(color_controller()),
        );
        let replacement = orchestrator.set_model(Model::new(StorageMode::Array));
        let unit = orchestrator.controller("color").unwrap();
        assert!(Rc::ptr_eq(&unit.context().model().unwrap(), &replacement));
        assert!(Rc::ptr_eq(&unit.context().bus().unwrap(), &orchestrator.bus().unwrap()));
    }

    #[test]
    fn model_changes_forward_to_bus() {
        let orchestrator = Orchestrator::new(
            &WIDGET,
            MvcOptions::new()
                .with_model(Model::new(StorageMode::Map))
                .with_data(json!({})),
        );
        let bus = orchestrator.bus().unwrap();
        let seen: Rc<RefCell<Vec<Value>>> = Rc::new(RefCell::new(Vec::new()));
        let seen_c = seen.clone();
        bus.on("hue", move |args| seen_c.borrow_mut().extend(args.iter().cloned()));

        orchestrator.model().unwrap().set_data("hue", json!(200), None);
        assert_eq!(*seen.borrow(), vec![json!(200)]);
    }

    #[test]
    fn replaced_model_stops_forwarding() {
        let first = Model::new(StorageMode::Map);
        first.set_block(json!({}), None, None, false);
        let orchestrator = Orchestrator::new(&WIDGET, MvcOptions::new().with_model(first.clone()));
        assert_eq!(first.subscriber_count(), 1);

        orchestrator.set_model(Model::new(StorageMode::Map));
        assert_eq!(first.subscriber_count(), 0);

        let bus = orchestrator.bus().unwrap();
        let count = Rc::new(Cell::new(0));
        let count_c = count.clone();
        bus.add_with_block(
            "a",
            BlockKey::default_name(),
            Rc::new(move |_| count_c.set(count_c.get() + 1)),
        );
        first.set_data("a", json!(1), None);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn set_bus_binds_model() {
        let orchestrator = Orchestrator::new(
            &WIDGET,
            MvcOptions::new().with_model(Model::new(StorageMode::Array)),
        );
        let bus = orchestrator.set_bus(EventBus::shared());
        assert_eq!(bus.default_block_key(), BlockKey::Index(0));
    }

    #[test]
    fn handlers_route_through_model() {
        let model = Model::new(StorageMode::Map);
        let orchestrator = Orchestrator::new(&WIDGET, MvcOptions::new().with_model(model.clone()));
        orchestrator.add_handler(
            Provider::<dyn LogicUnit>::of(|props| {
                assert!(props.bus.is_none());
                WidgetColorController {
                    context: UnitContext::from_props(&props),
                }
            }),
            Some("swatch"),
        );
        assert!(model.get_handler("swatch").is_some());
        assert!(orchestrator.handler("swatch").is_some());

        let late = Rc::new(WidgetColorController {
            context: UnitContext::new(),
        });
        model.add_handler(late, Some("late"));
        assert!(orchestrator.handler("late").is_some());
    }

    #[test]
    fn handlers_added_before_model_move_over() {
        let model = Model::new(StorageMode::Map);
        model.add_handler(
            Rc::new(WidgetColorController {
                context: UnitContext::new(),
            }),
            Some("early"),
        );
        let orchestrator = Orchestrator::new(&WIDGET, MvcOptions::new().with_model(model));
        assert!(orchestrator.handler("early").is_some());
    }

    // ── Lookup ───────────────────────────────────────────────────────

    #[test]
    fn missing_unit_is_none_or_error() {
        let orchestrator = Orchestrator::new(&WIDGET, MvcOptions::new());
        assert!(orchestrator.tool("nope").is_none());
        let err = orchestrator.require(Role::Tool, "nope").unwrap_err();
        assert!(matches!(err, Error::MissingUnit { role: Role::Tool, .. }));
    }

    #[test]
    fn remove_unit() {
        let orchestrator =
            Orchestrator::new(&WIDGET, MvcOptions::new().with_controller(color_controller()));
        assert!(orchestrator.remove_unit(Role::Controller, "color").is_some());
        assert!(orchestrator.controllers().is_empty());
    }
}
