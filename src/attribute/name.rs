//! Property-name <-> attribute-name case conversion.
//!
//! `fooBar` and `foo_bar` both reflect to the `foo-bar` attribute; the reverse
//! direction yields camelCase.

/// Attribute name for a property name: kebab case, all lower.
pub fn attribute_name(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);
    for ch in property.chars() {
        if ch == '_' || ch == '-' {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
        } else if ch.is_uppercase() {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Property name for an attribute name: camelCase.
pub fn property_name(attribute: &str) -> String {
    let mut out = String::with_capacity(attribute.len());
    let mut upper_next = false;
    for ch in attribute.chars() {
        if ch == '-' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}
