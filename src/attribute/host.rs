//! Attribute hosts: where reflected properties store their string form.
//!
//! [`AttributeHost`] abstracts the platform element. [`AttributeMap`] is the
//! in-memory host used by headless components and tests; it reports every
//! change to an optional listener, the way a hosting runtime reports observed
//! attribute changes.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// Something that stores string attributes.
pub trait AttributeHost {
    fn get_attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&self, name: &str, value: &str);
    fn remove_attribute(&self, name: &str);

    fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }
}

/// Listener invoked as `(name, old, new)` after an attribute changes.
pub type AttributeListener = Rc<dyn Fn(&str, Option<&str>, Option<&str>)>;

/// Insertion-ordered in-memory attribute storage.
#[derive(Default)]
pub struct AttributeMap {
    attributes: RefCell<IndexMap<String, String>>,
    listener: RefCell<Option<AttributeListener>>,
}

impl AttributeMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty map behind an `Rc`, ready to hand to properties.
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    /// Report every subsequent change to `listener`. Replaces any previous one.
    pub fn set_listener(&self, listener: impl Fn(&str, Option<&str>, Option<&str>) + 'static) {
        *self.listener.borrow_mut() = Some(Rc::new(listener));
    }

    /// Stop reporting changes.
    pub fn clear_listener(&self) {
        self.listener.borrow_mut().take();
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.borrow().len()
    }

    /// Whether there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.borrow().is_empty()
    }

    /// All `(name, value)` pairs in insertion order.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        self.attributes
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn notify(&self, name: &str, old: Option<&str>, new: Option<&str>) {
        // Clone out so the listener may touch this map again.
        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            listener(name, old, new);
        }
    }
}

impl AttributeHost for AttributeMap {
    fn get_attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        let old = self
            .attributes
            .borrow_mut()
            .insert(name.to_owned(), value.to_owned());
        self.notify(name, old.as_deref(), Some(value));
    }

    fn remove_attribute(&self, name: &str) {
        let old = self.attributes.borrow_mut().shift_remove(name);
        if old.is_some() {
            self.notify(name, old.as_deref(), None);
        }
    }
}

impl fmt::Debug for AttributeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeMap")
            .field("attributes", &self.attributes.borrow())
            .field("listening", &self.listener.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let map = AttributeMap::new();
        map.set_attribute("label", "OK");
        assert_eq!(map.get_attribute("label").as_deref(), Some("OK"));
        assert!(map.has_attribute("label"));
        map.remove_attribute("label");
        assert!(!map.has_attribute("label"));
        assert!(map.is_empty());
    }

    #[test]
    fn snapshot_keeps_insertion_order() {
        let map = AttributeMap::new();
        map.set_attribute("b", "2");
        map.set_attribute("a", "1");
        assert_eq!(
            map.snapshot(),
            vec![("b".into(), "2".into()), ("a".into(), "1".into())]
        );
    }

    #[test]
    fn listener_sees_old_and_new() {
        let map = AttributeMap::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_c = log.clone();
        map.set_listener(move |name, old, new| {
            log_c
                .borrow_mut()
                .push((name.to_owned(), old.map(str::to_owned), new.map(str::to_owned)));
        });
        map.set_attribute("x", "1");
        map.set_attribute("x", "2");
        map.remove_attribute("x");
        map.remove_attribute("x");
        assert_eq!(
            *log.borrow(),
            vec![
                ("x".into(), None, Some("1".into())),
                ("x".into(), Some("1".into()), Some("2".into())),
                ("x".into(), Some("2".into()), None),
            ]
        );
    }

    #[test]
    fn listener_may_write_back() {
        let map = AttributeMap::shared();
        let weak = Rc::downgrade(&map);
        map.set_listener(move |name, _, new| {
            if name == "source" {
                if let (Some(map), Some(new)) = (weak.upgrade(), new) {
                    map.set_attribute("mirror", new);
                }
            }
        });
        map.set_attribute("source", "v");
        assert_eq!(map.get_attribute("mirror").as_deref(), Some("v"));
    }

    #[test]
    fn clear_listener_stops_reports() {
        let map = AttributeMap::new();
        let count = Rc::new(std::cell::Cell::new(0));
        let count_c = count.clone();
        map.set_listener(move |_, _, _| count_c.set(count_c.get() + 1));
        map.set_attribute("a", "1");
        map.clear_listener();
        map.set_attribute("a", "2");
        assert_eq!(count.get(), 1);
    }
}
