//! Attribute -> property bridge and the explicit registration record.
//!
//! The hosting runtime reports observed attribute changes as
//! `(name, old, new)`. [`AttributeBridge`] routes each one to the reflected
//! property bound under that attribute name. Changes where old and new are
//! identical are dropped, which (together with the property's own
//! unchanged-value check) breaks the property -> attribute -> property loop.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use super::host::AttributeMap;
use super::mirror::ReflectedProperty;
use super::name::property_name;
use super::registry::observed_attributes;
use crate::element::ElementClass;
use crate::error::Result;

type Apply = Rc<dyn Fn(Option<&str>) -> Result<bool>>;

// ---------------------------------------------------------------------------
// AttributeBridge
// ---------------------------------------------------------------------------

/// Routes external attribute changes into reflected properties.
#[derive(Default)]
pub struct AttributeBridge {
    bindings: RefCell<IndexMap<String, Apply>>,
}

impl AttributeBridge {
    /// Create a bridge with no bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route changes of `property`'s attribute into it.
    ///
    /// The bridge holds the property weakly; once it is dropped, changes to
    /// its attribute are ignored.
    pub fn bind<T>(&self, property: &Rc<ReflectedProperty<T>>)
    where
        T: Clone + PartialEq + Serialize + DeserializeOwned + 'static,
    {
        let weak: Weak<ReflectedProperty<T>> = Rc::downgrade(property);
        let apply: Apply = Rc::new(move |raw| match weak.upgrade() {
            Some(property) => property.apply_attribute(raw),
            None => Ok(false),
        });
        self.bindings
            .borrow_mut()
            .insert(property.attribute().to_owned(), apply);
    }

    /// Remove the binding for `attribute`.
    pub fn unbind(&self, attribute: &str) -> bool {
        self.bindings.borrow_mut().shift_remove(attribute).is_some()
    }

    /// Whether `attribute` is bound.
    pub fn is_bound(&self, attribute: &str) -> bool {
        self.bindings.borrow().contains_key(attribute)
    }

    /// Bound attribute names in binding order.
    pub fn bound_attributes(&self) -> Vec<String> {
        self.bindings.borrow().keys().cloned().collect()
    }

    /// Handle an observed change. Returns whether a property was written.
    pub fn attribute_changed(
        &self,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<bool> {
        if old == new {
            trace!(attribute = name, "attribute change ignored: identical value");
            return Ok(false);
        }
        let apply = self.bindings.borrow().get(name).cloned();
        let Some(apply) = apply else {
            trace!(
                attribute = name,
                property = %property_name(name),
                "attribute change ignored: no bound property"
            );
            return Ok(false);
        };
        apply(new)
    }

    /// Subscribe to `host` so its changes flow through this bridge.
    ///
    /// Parse failures are logged at debug level and dropped.
    pub fn connect(self: &Rc<Self>, host: &AttributeMap) {
        let bridge = Rc::downgrade(self);
        host.set_listener(move |name, old, new| {
            let Some(bridge) = bridge.upgrade() else {
                return;
            };
            if let Err(err) = bridge.attribute_changed(name, old, new) {
                debug!(%err, "attribute change rejected");
            }
        });
    }
}

impl fmt::Debug for AttributeBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeBridge")
            .field("bound", &self.bound_attributes())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// What a hosting runtime needs to drive one element class: the merged list
/// of attributes to watch and the bridge to call when one changes.
#[derive(Debug, Clone)]
pub struct Registration {
    pub class: &'static ElementClass,
    pub observed_attributes: Vec<String>,
    pub bridge: Rc<AttributeBridge>,
}

impl Registration {
    /// Snapshot the observed attributes for `class` and pair them with
    /// `bridge`.
    pub fn new(class: &'static ElementClass, bridge: Rc<AttributeBridge>) -> Self {
        let observed_attributes = observed_attributes(class);
        debug!(
            class = class.name(),
            count = observed_attributes.len(),
            "element class registered"
        );
        Self {
            class,
            observed_attributes,
            bridge,
        }
    }

    /// Whether the runtime should report changes to `attribute`.
    pub fn observes(&self, attribute: &str) -> bool {
        self.observed_attributes.iter().any(|a| a == attribute)
    }

    /// Forward an observed change to the bridge; unobserved names are ignored.
    pub fn attribute_changed(
        &self,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<bool> {
        if !self.observes(name) {
            return Ok(false);
        }
        self.bridge.attribute_changed(name, old, new)
    }
}

/// Register `class` with a fresh bridge.
pub fn register(class: &'static ElementClass) -> Registration {
    Registration::new(class, Rc::new(AttributeBridge::new()))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::host::AttributeHost;
    use crate::property::PropertyOptions;
    use std::cell::Cell;

    static BASE: ElementClass = ElementClass::root("BridgeBase");
    static DIAL: ElementClass = ElementClass::extends("BridgeDial", &BASE);

    struct Dial {
        host: Rc<AttributeMap>,
        bridge: Rc<AttributeBridge>,
        value: Rc<ReflectedProperty<i64>>,
        disabled: Rc<ReflectedProperty<bool>>,
    }

    impl Dial {
        fn new() -> Self {
            let host = AttributeMap::shared();
            let dyn_host: Rc<dyn AttributeHost> = host.clone();
            let disabled = Rc::new(ReflectedProperty::new(
                &BASE,
                "disabled",
                dyn_host.clone(),
                PropertyOptions::new().with_default(false),
            ));
            let value = Rc::new(ReflectedProperty::new(
                &DIAL,
                "currentValue",
                dyn_host,
                PropertyOptions::new(),
            ));
            let bridge = Rc::new(AttributeBridge::new());
            bridge.bind(&value);
            bridge.bind(&disabled);
            bridge.connect(&host);
            Self {
                host,
                bridge,
                value,
                disabled,
            }
        }
    }

    #[test]
    fn attribute_change_writes_property() {
        let dial = Dial::new();
        dial.host.set_attribute("current-value", "42");
        assert_eq!(dial.value.get(), Some(42));
    }

    #[test]
    fn property_write_round_trips_without_loop() {
        let dial = Dial::new();
        let changes = Rc::new(Cell::new(0));
        let changes_c = changes.clone();
        let bridge = dial.bridge.clone();
        dial.host.set_listener(move |name, old, new| {
            changes_c.set(changes_c.get() + 1);
            let _ = bridge.attribute_changed(name, old, new);
        });
        dial.value.set(7);
        assert_eq!(dial.host.get_attribute("current-value").as_deref(), Some("7"));
        assert_eq!(dial.value.get(), Some(7));
        assert_eq!(changes.get(), 1);
    }

    #[test]
    fn identical_old_and_new_ignored() {
        let dial = Dial::new();
        assert!(!dial.bridge.attribute_changed("current-value", Some("1"), Some("1")).unwrap());
        assert_eq!(dial.value.get(), None);
    }

    #[test]
    fn unknown_attribute_ignored() {
        let dial = Dial::new();
        assert!(!dial.bridge.attribute_changed("aria-label", None, Some("x")).unwrap());
    }

    #[test]
    fn malformed_value_is_dropped_by_connected_host() {
        let dial = Dial::new();
        dial.value.set(3);
        dial.host.set_attribute("current-value", "three");
        assert_eq!(dial.value.get(), Some(3));
    }

    #[test]
    fn dropped_property_is_ignored() {
        let dial = Dial::new();
        let Dial { bridge, value, .. } = dial;
        drop(value);
        assert!(!bridge.attribute_changed("current-value", None, Some("5")).unwrap());
    }

    #[test]
    fn registration_merges_ancestor_attributes() {
        let dial = Dial::new();
        let registration = Registration::new(&DIAL, dial.bridge.clone());
        assert!(registration.observes("disabled"));
        assert!(registration.observes("current-value"));
        assert!(!registration.observes("tabindex"));
        assert!(registration
            .attribute_changed("disabled", None, Some("true"))
            .unwrap());
        assert_eq!(dial.disabled.get(), Some(true));
    }

    #[test]
    fn unbind_stops_routing() {
        let dial = Dial::new();
        assert!(dial.bridge.unbind("disabled"));
        assert!(!dial.bridge.is_bound("disabled"));
        assert_eq!(dial.bridge.bound_attributes(), vec!["current-value"]);
    }
}
