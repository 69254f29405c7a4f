//! Element classes: an explicit, static stand-in for an inheritance chain.
//!
//! Component types declare an [`ElementClass`] as a `static`, optionally
//! extending another one. The chain is walked by the observed-attribute
//! registry (to union attribute names across ancestors) and by logic-unit
//! key derivation (to strip an ancestor's name from a unit's class name).
//!
//! ```ignore
//! static WIDGET: ElementClass = ElementClass::root("Widget");
//! static COLOR_PICKER: ElementClass = ElementClass::extends("ColorPicker", &WIDGET);
//! ```

use std::fmt;

/// A named element class with an optional parent class.
#[derive(Clone, Copy)]
pub struct ElementClass {
    name: &'static str,
    parent: Option<&'static ElementClass>,
}

impl ElementClass {
    /// A class with no parent.
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// A class extending `parent`.
    pub const fn extends(name: &'static str, parent: &'static ElementClass) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    /// The class name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The parent class, if any.
    pub fn parent(&self) -> Option<&'static ElementClass> {
        self.parent
    }

    /// Iterate from this class up through every ancestor.
    pub fn chain(&self) -> Chain<'_> {
        Chain { next: Some(self) }
    }

    /// Class names from this class up to the root.
    pub fn lineage(&self) -> Vec<&'static str> {
        self.chain().map(ElementClass::name).collect()
    }

    /// Whether `ancestor` appears in this class's chain (including itself).
    pub fn is_a(&self, ancestor: &ElementClass) -> bool {
        self.chain().any(|c| c.name == ancestor.name)
    }
}

impl fmt::Debug for ElementClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementClass")
            .field("name", &self.name)
            .field("parent", &self.parent.map(ElementClass::name))
            .finish()
    }
}

impl PartialEq for ElementClass {
    fn eq(&self, other: &Self) -> bool {
        self.lineage() == other.lineage()
    }
}

impl Eq for ElementClass {}

/// Iterator over an [`ElementClass`] and its ancestors.
pub struct Chain<'a> {
    next: Option<&'a ElementClass>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a ElementClass;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static BASE: ElementClass = ElementClass::root("Base");
    static WIDGET: ElementClass = ElementClass::extends("Widget", &BASE);
    static SLIDER: ElementClass = ElementClass::extends("Slider", &WIDGET);

    #[test]
    fn root_has_no_parent() {
        assert!(BASE.parent().is_none());
        assert_eq!(BASE.lineage(), vec!["Base"]);
    }

    #[test]
    fn chain_walks_to_root() {
        assert_eq!(SLIDER.lineage(), vec!["Slider", "Widget", "Base"]);
    }

    #[test]
    fn is_a_checks_ancestors() {
        assert!(SLIDER.is_a(&WIDGET));
        assert!(SLIDER.is_a(&SLIDER));
        assert!(!WIDGET.is_a(&SLIDER));
    }

    #[test]
    fn debug_shows_parent_name() {
        let dbg = format!("{:?}", SLIDER);
        assert!(dbg.contains("Slider"));
        assert!(dbg.contains("Widget"));
    }
}
