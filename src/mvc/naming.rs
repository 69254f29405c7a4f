//! Registration-key derivation for logic units.
//!
//! A unit named `<Element><Essence><Role>` owned by element class `Element`
//! registers under `essence`. The owning class's whole ancestor chain is
//! tried, and the longest matching ancestor name wins.

/// Derive a registration key from a unit's class name.
///
/// 1. Strip the longest prefix equal to an ancestor name in `chain` (with
///    underscores removed from the ancestor name).
/// 2. Strip a trailing `suffix`.
/// 3. Lower-case the first character.
///
/// When nothing is left, the key is the lower-cased suffix.
pub fn derive_key<'a>(
    chain: impl IntoIterator<Item = &'a str>,
    class_name: &str,
    suffix: &str,
) -> String {
    let prefix_len = chain
        .into_iter()
        .map(|ancestor| ancestor.replace('_', ""))
        .filter(|ancestor| !ancestor.is_empty() && class_name.starts_with(ancestor.as_str()))
        .map(|ancestor| ancestor.len())
        .max()
        .unwrap_or(0);

    let rest = &class_name[prefix_len..];
    let essence = if suffix.is_empty() {
        rest
    } else {
        rest.strip_suffix(suffix).unwrap_or(rest)
    };

    let essence = if essence.is_empty() { suffix } else { essence };
    lower_first(essence)
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
