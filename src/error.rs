//! Crate-wide error type.
//!
//! Most data-shape problems (bad block keys, missing payloads, lookup misses)
//! are silent no-ops and never reach this type. [`Error`] is reserved for the
//! `try_*` / `require*` entry points, where the caller explicitly demanded a
//! result and silence would hide a wiring bug.

use crate::mvc::unit::Role;

/// Errors raised by the explicit, failing entry points.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no {role} registered under key {key:?}")]
    MissingUnit { role: Role, key: String },
    #[error("invalid block key: {0}")]
    InvalidBlockKey(String),
    #[error("no block at key {0}")]
    MissingBlock(String),
    #[error("cannot parse attribute {attribute}={value:?}: {message}")]
    AttributeParse {
        attribute: String,
        value: String,
        message: String,
    },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_unit_names_role_and_key() {
        let err = Error::MissingUnit {
            role: Role::Controller,
            key: "color".into(),
        };
        assert_eq!(err.to_string(), "no controller registered under key \"color\"");
    }

    #[test]
    fn attribute_parse_message() {
        let err = Error::AttributeParse {
            attribute: "max-count".into(),
            value: "lots".into(),
            message: "expected u32".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot parse attribute max-count=\"lots\": expected u32"
        );
    }
}
