use thiserror::Error;

use crate::item::ItemKind;

/// Errors produced while decoding, checking an arena, or writing segments.
///
/// Lookups and builders never return this type: a missing key, a type
/// mismatch or an exhausted arena all surface as `None` there, and the
/// allocation failure is reported once through [`Arena::check`](crate::Arena::check).
#[derive(Debug, Error)]
pub enum BencodeError {
    /// The input ended before the current value was complete.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// An integer was malformed (leading zeros, `-0`, no digits) or overflowed `i64`.
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// A string length prefix was malformed or too large.
    #[error("invalid string length")]
    InvalidStringLength,

    /// A byte that cannot start or continue a value at this position.
    #[error("unexpected character: {0:?}")]
    UnexpectedChar(char),

    /// A dictionary key was not a byte string.
    #[error("dictionary key is not a string")]
    NonStringKey,

    /// Lists and dictionaries were nested deeper than the configured limit.
    #[error("nesting too deep")]
    NestingTooDeep,

    /// Bytes remained after a complete value where none were allowed.
    #[error("trailing data after value")]
    TrailingData,

    /// The decoded root was not of the requested kind.
    #[error("expected {expected:?}, found {found:?}")]
    UnexpectedType { expected: ItemKind, found: ItemKind },

    /// The arena could not satisfy an allocation; the failure is sticky.
    #[error("arena allocation failed")]
    AllocationFailed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BencodeError {
    /// Returns `true` if more input could turn this failure into a success.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, BencodeError::UnexpectedEof)
    }
}
