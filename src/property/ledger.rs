//! Installation ledger for accessor-style property declarations.
//!
//! A getter/setter declaration is installed once per owner type, not once per
//! instance: the first call to [`descriptor`] for a given `(owner, name)` pair
//! builds the [`PropertyOptions`] and every later call (from any instance)
//! receives the same shared record. The ledger is an identity-keyed side table
//! from the owner's `TypeId` to the set of names already processed.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use super::options::PropertyOptions;

type LedgerKey = (TypeId, &'static str);

thread_local! {
    static LEDGER: RefCell<HashMap<LedgerKey, Rc<dyn Any>>> = RefCell::new(HashMap::new());
}

/// The shared options for property `name` on owner type `O`, built with
/// `build` the first time it is requested.
///
/// `build` runs outside the ledger borrow, so it may itself request other
/// descriptors.
pub fn descriptor<O: 'static, T: 'static>(
    name: &'static str,
    build: impl FnOnce() -> PropertyOptions<T>,
) -> Rc<PropertyOptions<T>> {
    let key = (TypeId::of::<O>(), name);
    let existing = LEDGER.with(|ledger| ledger.borrow().get(&key).cloned());
    if let Some(any) = existing {
        match any.downcast::<PropertyOptions<T>>() {
            Ok(options) => return options,
            Err(_) => debug!(
                owner = std::any::type_name::<O>(),
                name, "property descriptor redeclared with a different value type"
            ),
        }
    }

    let options = Rc::new(build());
    LEDGER.with(|ledger| {
        ledger
            .borrow_mut()
            .insert(key, Rc::clone(&options) as Rc<dyn Any>);
    });
    debug!(owner = std::any::type_name::<O>(), name, "property descriptor installed");
    options
}

/// Whether property `name` has been installed for owner type `O`.
pub fn is_installed<O: 'static>(name: &'static str) -> bool {
    LEDGER.with(|ledger| ledger.borrow().contains_key(&(TypeId::of::<O>(), name)))
}

/// Names installed for owner type `O`, sorted.
pub fn installed_names<O: 'static>() -> Vec<&'static str> {
    let owner = TypeId::of::<O>();
    let mut names: Vec<&'static str> = LEDGER.with(|ledger| {
        ledger
            .borrow()
            .keys()
            .filter(|(ty, _)| *ty == owner)
            .map(|(_, name)| *name)
            .collect()
    });
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::ManagedProperty;
    use std::cell::Cell;

    struct Owner;
    struct OtherOwner;

    #[test]
    fn builds_once_per_owner_and_name() {
        let builds = Cell::new(0);
        let build = || {
            builds.set(builds.get() + 1);
            PropertyOptions::<u32>::new().with_default(1)
        };
        let a = descriptor::<Owner, u32>("count", build);
        let b = descriptor::<Owner, u32>("count", || {
            builds.set(builds.get() + 1);
            PropertyOptions::new()
        });
        assert_eq!(builds.get(), 1);
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn owners_are_independent() {
        let a = descriptor::<Owner, u32>("size", PropertyOptions::new);
        let b = descriptor::<OtherOwner, u32>("size", PropertyOptions::new);
        assert!(!Rc::ptr_eq(&a, &b));
        assert!(is_installed::<Owner>("size"));
        assert!(is_installed::<OtherOwner>("size"));
        assert!(!is_installed::<OtherOwner>("missing"));
    }

    #[test]
    fn instances_share_hooks_but_not_storage() {
        struct Gauge;
        let make = || {
            ManagedProperty::from_descriptor(descriptor::<Gauge, i32>("level", || {
                PropertyOptions::new().pre_process(|_, v: i32| v.max(0))
            }))
        };
        let first = make();
        let second = make();
        first.set(-5);
        second.set(7);
        assert_eq!(first.get(), Some(0));
        assert_eq!(second.get(), Some(7));
        assert!(Rc::ptr_eq(first.options(), second.options()));
    }

    #[test]
    fn installed_names_sorted() {
        struct Panel;
        descriptor::<Panel, bool>("open", PropertyOptions::new);
        descriptor::<Panel, String>("label", PropertyOptions::new);
        assert_eq!(installed_names::<Panel>(), vec!["label", "open"]);
    }
}
