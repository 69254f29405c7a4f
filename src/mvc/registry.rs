//! UnitRegistry: keyed, insertion-ordered storage for one role's units.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use super::naming::derive_key;
use super::unit::{LogicUnit, Role};
use crate::element::ElementClass;

/// Logic units of a single [`Role`], keyed by registration key.
pub struct UnitRegistry {
    role: Role,
    owner: Option<&'static ElementClass>,
    units: RefCell<IndexMap<String, Rc<dyn LogicUnit>>>,
}

impl UnitRegistry {
    /// An empty registry. `owner` supplies the ancestor chain for key
    /// derivation.
    pub fn new(role: Role, owner: Option<&'static ElementClass>) -> Self {
        Self {
            role,
            owner,
            units: RefCell::new(IndexMap::new()),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The key `unit` would be registered under without an explicit key.
    pub fn key_for(&self, unit: &dyn LogicUnit) -> String {
        if let Some(key) = unit.context().key_name() {
            return key;
        }
        let chain = self.owner.into_iter().flat_map(|class| class.lineage());
        derive_key(chain, unit.class_name(), self.role.suffix())
    }

    /// Register `unit` and record the key on its context. An explicit `key`
    /// wins over a preset key name, which wins over a derived one. A unit
    /// already registered under the same key is replaced.
    pub fn add(&self, unit: Rc<dyn LogicUnit>, key: Option<&str>) -> String {
        let key = match key {
            Some(key) => key.to_owned(),
            None => self.key_for(unit.as_ref()),
        };
        if unit.role() != self.role {
            debug!(
                class = unit.class_name(),
                written_for = %unit.role(),
                registered_as = %self.role,
                "unit registered under a different role"
            );
        }
        unit.context().set_key_name(key.clone());
        self.units.borrow_mut().insert(key.clone(), unit);
        key
    }

    pub fn get(&self, key: &str) -> Option<Rc<dyn LogicUnit>> {
        self.units.borrow().get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<Rc<dyn LogicUnit>> {
        self.units.borrow_mut().shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.units.borrow().contains_key(key)
    }

    /// Keys in registration order.
    pub fn keys(&self) -> Vec<String> {
        self.units.borrow().keys().cloned().collect()
    }

    /// Units in registration order.
    pub fn units(&self) -> Vec<Rc<dyn LogicUnit>> {
        self.units.borrow().values().cloned().collect()
    }

    /// `(key, unit)` pairs in registration order.
    pub fn entries(&self) -> Vec<(String, Rc<dyn LogicUnit>)> {
        self.units
            .borrow()
            .iter()
            .map(|(k, u)| (k.clone(), Rc::clone(u)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.units.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.borrow().is_empty()
    }
}

impl fmt::Debug for UnitRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitRegistry")
            .field("role", &self.role)
            .field("owner", &self.owner.map(ElementClass::name))
            .field("keys", &self.keys())
            .finish()
    }
}
