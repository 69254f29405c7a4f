//! Per-class observed-attribute metadata.
//!
//! Each reflected property records its attribute name against the class that
//! declares it. The set a hosting runtime must watch for a class is the union
//! of its own set and every ancestor's, merged at lookup time.
//!
//! Sets are keyed by the address of the class `static`, not its name, so two
//! classes that happen to share a name keep separate sets.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ptr;

use indexmap::IndexSet;

use crate::element::ElementClass;

type Declared = HashMap<*const ElementClass, IndexSet<String>>;

thread_local! {
    static DECLARED: RefCell<Declared> = RefCell::new(HashMap::new());
}

fn identity(class: &'static ElementClass) -> *const ElementClass {
    ptr::from_ref(class)
}

/// Record `attribute` as declared by `class`. Returns `false` if it was
/// already recorded.
pub fn register_attribute(class: &'static ElementClass, attribute: &str) -> bool {
    DECLARED.with(|declared| {
        declared
            .borrow_mut()
            .entry(identity(class))
            .or_default()
            .insert(attribute.to_owned())
    })
}

/// Attributes declared directly by `class`, in declaration order.
pub fn declared_attributes(class: &'static ElementClass) -> Vec<String> {
    DECLARED.with(|declared| {
        declared
            .borrow()
            .get(&identity(class))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    })
}

/// Attributes observed by `class`: ancestors' first (root outward), then its
/// own, without duplicates.
pub fn observed_attributes(class: &'static ElementClass) -> Vec<String> {
    let lineage: Vec<&'static ElementClass> = class.chain().collect();
    let mut merged = IndexSet::new();
    DECLARED.with(|declared| {
        let declared = declared.borrow();
        for ancestor in lineage.iter().rev() {
            if let Some(set) = declared.get(&identity(ancestor)) {
                merged.extend(set.iter().cloned());
            }
        }
    });
    merged.into_iter().collect()
}
