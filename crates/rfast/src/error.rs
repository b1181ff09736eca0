//! Error types for value construction and decimal text conversion.
//!
//! The raw storage layer itself never fails; these errors come from the
//! checked surfaces built on top of it.

use thiserror::Error;

/// Error while parsing decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecimalParseError {
    #[error("empty decimal string")]
    Empty,

    #[error("invalid character {ch:?} at position {position}")]
    InvalidCharacter { ch: char, position: usize },

    #[error("decimal string has no digits")]
    MissingDigits,

    #[error("mantissa does not fit in a signed 64-bit integer")]
    MantissaOverflow,

    #[error("exponent does not fit in a signed 16-bit integer")]
    ExponentOverflow,
}

/// Error from a kind-checked value operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("{operation} requires a {expected} value, found {actual}")]
    KindMismatch {
        operation: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{what} index {index} out of bounds (size: {size})")]
    IndexOutOfBounds {
        what: &'static str,
        index: usize,
        size: usize,
    },

    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("ascii value has non-ascii byte at position {position}")]
    NonAscii { position: usize },

    #[error("value content is not valid UTF-8")]
    InvalidUtf8,

    #[error("{what} has no content")]
    NoContent { what: &'static str },

    #[error("template {id} is not registered")]
    UnknownTemplate { id: u32 },

    #[error("template {id} is already registered")]
    DuplicateTemplate { id: u32 },

    #[error("template reference has no template selected")]
    NoTemplate,
}
