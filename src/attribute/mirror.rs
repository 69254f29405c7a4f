//! ReflectedProperty<T>: a managed property mirrored to a string attribute.
//!
//! Construction derives the attribute name, records it in the declaring
//! class's observed set, and appends a reflection hook after any user
//! `after_write` hooks. Every stored write (including a default written on
//! first read) serializes the value and updates the host attribute unless the
//! text is already current.

use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use super::codec;
use super::host::AttributeHost;
use super::name::attribute_name;
use super::registry::register_attribute;
use crate::element::ElementClass;
use crate::error::{Error, Result};
use crate::property::{ManagedProperty, PropertyOptions};

/// A managed property whose value is reflected to a host attribute.
pub struct ReflectedProperty<T: 'static> {
    name: String,
    attribute: String,
    host: Rc<dyn AttributeHost>,
    property: ManagedProperty<T>,
}

impl<T> ReflectedProperty<T>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned + 'static,
{
    /// Declare property `name` on `class`, reflecting into `host`.
    pub fn new(
        class: &'static ElementClass,
        name: &str,
        host: Rc<dyn AttributeHost>,
        options: PropertyOptions<T>,
    ) -> Self {
        let attribute = Self::declare(class, name);
        let options = Self::reflecting(options, &host, &attribute);
        Self {
            name: name.to_owned(),
            attribute,
            host,
            property: ManagedProperty::new(options),
        }
    }

    /// Like [`new`](Self::new), seeded from a field initializer.
    pub fn with_initializer(
        class: &'static ElementClass,
        name: &str,
        host: Rc<dyn AttributeHost>,
        value: T,
        options: PropertyOptions<T>,
    ) -> Self {
        let attribute = Self::declare(class, name);
        let options = Self::reflecting(options, &host, &attribute);
        Self {
            name: name.to_owned(),
            attribute,
            host,
            property: ManagedProperty::with_initializer(value, options),
        }
    }

    fn declare(class: &'static ElementClass, name: &str) -> String {
        let attribute = attribute_name(name);
        register_attribute(class, &attribute);
        attribute
    }

    fn reflecting(
        options: PropertyOptions<T>,
        host: &Rc<dyn AttributeHost>,
        attribute: &str,
    ) -> PropertyOptions<T> {
        let host = Rc::clone(host);
        let attribute = attribute.to_owned();
        options.after_write(move |_, value| reflect(host.as_ref(), &attribute, value))
    }

    /// The property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The reflected attribute name.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// The underlying managed property.
    pub fn property(&self) -> &ManagedProperty<T> {
        &self.property
    }

    /// Read the property.
    pub fn get(&self) -> Option<T> {
        self.property.get()
    }

    /// Write the property; reflects on success.
    pub fn set(&self, value: T) -> bool {
        self.property.set(value)
    }

    /// Push the current value to the host even if no write happened yet
    /// (e.g. after seeding from an initializer).
    pub fn reflect_now(&self) {
        if let Some(value) = self.property.get() {
            reflect(self.host.as_ref(), &self.attribute, &value);
        }
    }

    /// Apply an external attribute change to the property.
    ///
    /// `None` means the attribute was removed; the property takes the type's
    /// null form if it has one (e.g. `Option::None`), otherwise it is left
    /// alone. Returns whether the property was written.
    pub fn apply_attribute(&self, raw: Option<&str>) -> Result<bool> {
        let Some(raw) = raw else {
            return Ok(match codec::parse_absent::<T>() {
                Some(value) => self.property.set(value),
                None => false,
            });
        };
        let value = codec::parse::<T>(raw).map_err(|e| Error::AttributeParse {
            attribute: self.attribute.clone(),
            value: raw.to_owned(),
            message: e.to_string(),
        })?;
        Ok(self.property.set(value))
    }
}

/// Write the serialized value to `host` unless the attribute already holds it.
fn reflect<T: Serialize>(host: &dyn AttributeHost, attribute: &str, value: &T) {
    match codec::stringify(value) {
        Some(text) => {
            if host.get_attribute(attribute).as_deref() == Some(text.as_str()) {
                trace!(attribute, "attribute already current");
                return;
            }
            host.set_attribute(attribute, &text);
        }
        None => {
            if host.has_attribute(attribute) {
                host.remove_attribute(attribute);
            }
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for ReflectedProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectedProperty")
            .field("name", &self.name)
            .field("attribute", &self.attribute)
            .field("property", &self.property)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::host::AttributeMap;
    use crate::attribute::registry::observed_attributes;
    use std::cell::Cell;

    static FIELD: ElementClass = ElementClass::root("MirrorField");

    fn host() -> (Rc<AttributeMap>, Rc<dyn AttributeHost>) {
        let map = AttributeMap::shared();
        let dyn_host: Rc<dyn AttributeHost> = map.clone();
        (map, dyn_host)
    }

    #[test]
    fn write_reflects_kebab_attribute() {
        let (map, host) = host();
        let prop = ReflectedProperty::new(&FIELD, "maxLength", host, PropertyOptions::<u32>::new());
        assert_eq!(prop.attribute(), "max-length");
        prop.set(12);
        assert_eq!(map.get_attribute("max-length").as_deref(), Some("12"));
    }

    #[test]
    fn declaration_registers_observed_attribute() {
        let (_map, host) = host();
        let _prop = ReflectedProperty::new(
            &FIELD,
            "placeholderText",
            host,
            PropertyOptions::<String>::new(),
        );
        assert!(observed_attributes(&FIELD).contains(&"placeholder-text".to_owned()));
    }

    #[test]
    fn unchanged_attribute_not_rewritten() {
        let (map, host) = host();
        let writes = Rc::new(Cell::new(0));
        let writes_c = writes.clone();
        map.set_listener(move |_, _, _| writes_c.set(writes_c.get() + 1));
        let prop = ReflectedProperty::new(
            &FIELD,
            "mode",
            host,
            PropertyOptions::<String>::new().cancel_if_unchanged(false),
        );
        prop.set("dark".into());
        prop.set("dark".into());
        assert_eq!(writes.get(), 1);
    }

    #[test]
    fn user_after_write_runs_before_reflection() {
        let (map, host) = host();
        let seen = Rc::new(Cell::new(false));
        let seen_c = seen.clone();
        let map_c = map.clone();
        let prop = ReflectedProperty::new(
            &FIELD,
            "open",
            host,
            PropertyOptions::<bool>::new().after_write(move |_, _| {
                seen_c.set(map_c.get_attribute("open").is_none());
            }),
        );
        prop.set(true);
        assert!(seen.get());
        assert_eq!(map.get_attribute("open").as_deref(), Some("true"));
    }

    #[test]
    fn default_written_on_read_is_reflected() {
        let (map, host) = host();
        let prop = ReflectedProperty::new(
            &FIELD,
            "tone",
            host,
            PropertyOptions::new().with_default(String::from("neutral")),
        );
        assert!(map.get_attribute("tone").is_none());
        assert_eq!(prop.get().as_deref(), Some("neutral"));
        assert_eq!(map.get_attribute("tone").as_deref(), Some("neutral"));
    }

    #[test]
    fn none_removes_attribute() {
        let (map, host) = host();
        let prop = ReflectedProperty::new(
            &FIELD,
            "hint",
            host,
            PropertyOptions::<Option<String>>::new(),
        );
        prop.set(Some("x".into()));
        assert!(map.has_attribute("hint"));
        prop.set(None);
        assert!(!map.has_attribute("hint"));
    }

    #[test]
    fn apply_attribute_parses_value() {
        let (_map, host) = host();
        let prop = ReflectedProperty::new(&FIELD, "step", host, PropertyOptions::<f64>::new());
        assert!(prop.apply_attribute(Some("0.5")).unwrap());
        assert_eq!(prop.get(), Some(0.5));
    }

    #[test]
    fn apply_attribute_reports_parse_error() {
        let (_map, host) = host();
        let prop = ReflectedProperty::new(&FIELD, "count", host, PropertyOptions::<u32>::new());
        let err = prop.apply_attribute(Some("many")).unwrap_err();
        assert!(matches!(err, Error::AttributeParse { ref attribute, .. } if attribute == "count"));
    }

    #[test]
    fn removed_attribute_clears_optional() {
        let (_map, host) = host();
        let prop = ReflectedProperty::with_initializer(
            &FIELD,
            "caption",
            host,
            Some(String::from("hi")),
            PropertyOptions::new(),
        );
        assert!(prop.apply_attribute(None).unwrap());
        assert_eq!(prop.get(), Some(None));
    }

    #[test]
    fn removed_attribute_leaves_required_value() {
        let (_map, host) = host();
        let prop =
            ReflectedProperty::with_initializer(&FIELD, "level", host, 3u8, PropertyOptions::new());
        assert!(!prop.apply_attribute(None).unwrap());
        assert_eq!(prop.get(), Some(3));
    }

    #[test]
    fn reflect_now_pushes_initializer() {
        let (map, host) = host();
        let prop = ReflectedProperty::with_initializer(
            &FIELD,
            "variant",
            host,
            String::from("ghost"),
            PropertyOptions::new(),
        );
        assert!(map.get_attribute("variant").is_none());
        prop.reflect_now();
        assert_eq!(map.get_attribute("variant").as_deref(), Some("ghost"));
    }
}
