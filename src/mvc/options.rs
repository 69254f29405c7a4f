//! MvcOptions: everything an orchestrator is built from.

use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde_json::Value;

use super::provider::Provider;
use super::unit::{LogicUnit, Role, View};
use crate::event::EventBus;
use crate::model::Model;

// ---------------------------------------------------------------------------
// UnitEntry
// ---------------------------------------------------------------------------

/// A logic unit to register, with an optional explicit key.
#[derive(Clone, Debug)]
pub struct UnitEntry {
    pub provider: Provider<dyn LogicUnit>,
    pub key: Option<String>,
}

// ---------------------------------------------------------------------------
// MvcOptions
// ---------------------------------------------------------------------------

/// Construction options for an [`Orchestrator`](super::Orchestrator).
#[derive(Clone)]
pub struct MvcOptions {
    pub element: Option<Weak<dyn Any>>,
    pub view: Option<Provider<dyn View>>,
    pub model: Option<Provider<Model>>,
    pub bus: Option<Provider<EventBus>>,
    pub units: IndexMap<Role, Vec<UnitEntry>>,
    /// Installed into the model's default block after construction.
    pub data: Option<Value>,
    /// Run the initialization sequence at the end of construction.
    pub initialize: bool,
}

impl Default for MvcOptions {
    fn default() -> Self {
        Self {
            element: None,
            view: None,
            model: None,
            bus: None,
            units: IndexMap::new(),
            data: None,
            initialize: true,
        }
    }
}

impl MvcOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owning element (builder). Held weakly.
    pub fn with_element(mut self, element: &Rc<dyn Any>) -> Self {
        self.element = Some(Rc::downgrade(element));
        self
    }

    pub fn with_view(mut self, view: Provider<dyn View>) -> Self {
        self.view = Some(view);
        self
    }

    pub fn with_model(mut self, model: impl Into<Provider<Model>>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_bus(mut self, bus: impl Into<Provider<EventBus>>) -> Self {
        self.bus = Some(bus.into());
        self
    }

    /// Add a unit for `role`, keyed by derivation.
    pub fn with_unit(self, role: Role, provider: Provider<dyn LogicUnit>) -> Self {
        self.with_unit_entry(role, UnitEntry { provider, key: None })
    }

    /// Add a unit for `role` under an explicit key.
    pub fn with_keyed_unit(
        self,
        role: Role,
        key: impl Into<String>,
        provider: Provider<dyn LogicUnit>,
    ) -> Self {
        self.with_unit_entry(
            role,
            UnitEntry {
                provider,
                key: Some(key.into()),
            },
        )
    }

    fn with_unit_entry(mut self, role: Role, entry: UnitEntry) -> Self {
        self.units.entry(role).or_default().push(entry);
        self
    }

    pub fn with_controller(self, provider: Provider<dyn LogicUnit>) -> Self {
        self.with_unit(Role::Controller, provider)
    }

    pub fn with_handler(self, provider: Provider<dyn LogicUnit>) -> Self {
        self.with_unit(Role::Handler, provider)
    }

    pub fn with_interactor(self, provider: Provider<dyn LogicUnit>) -> Self {
        self.with_unit(Role::Interactor, provider)
    }

    pub fn with_tool(self, provider: Provider<dyn LogicUnit>) -> Self {
        self.with_unit(Role::Tool, provider)
    }

    pub fn with_substrate(self, provider: Provider<dyn LogicUnit>) -> Self {
        self.with_unit(Role::Substrate, provider)
    }

    /// Initial data for the model's default block (builder).
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Whether construction ends with initialization (builder).
    pub fn with_initialize(mut self, initialize: bool) -> Self {
        self.initialize = initialize;
        self
    }

    /// Entries queued for `role`.
    pub fn entries(&self, role: Role) -> &[UnitEntry] {
        self.units.get(&role).map(Vec::as_slice).unwrap_or_default()
    }
}

impl fmt::Debug for MvcOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<(Role, usize)> = self.units.iter().map(|(r, u)| (*r, u.len())).collect();
        f.debug_struct("MvcOptions")
            .field("view", &self.view)
            .field("model", &self.model)
            .field("bus", &self.bus)
            .field("units", &counts)
            .field("data", &self.data)
            .field("initialize", &self.initialize)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StorageMode;
    use serde_json::json;

    #[test]
    fn defaults() {
        let opts = MvcOptions::new();
        assert!(opts.initialize);
        assert!(opts.model.is_none());
        assert!(opts.entries(Role::Controller).is_empty());
    }

    #[test]
    fn builder_collects_units_per_role() {
        let noop = || Provider::<dyn LogicUnit>::factory(|_| unreachable!());
        let opts = MvcOptions::new()
            .with_model(Model::new(StorageMode::Map))
            .with_data(json!({"a": 1}))
            .with_initialize(false)
            .with_controller(noop())
            .with_keyed_unit(Role::Controller, "named", noop())
            .with_tool(noop());

        assert!(!opts.initialize);
        assert_eq!(opts.entries(Role::Controller).len(), 2);
        assert_eq!(opts.entries(Role::Controller)[1].key.as_deref(), Some("named"));
        assert_eq!(opts.entries(Role::Tool).len(), 1);
        assert!(opts.entries(Role::Handler).is_empty());
        assert_eq!(opts.data, Some(json!({"a": 1})));
    }
}
