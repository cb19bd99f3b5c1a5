use tracing::debug;

use super::{scan_integer, scan_string};
use crate::constants::MAX_DEPTH;
use crate::error::BencodeError;

/// Outcome of [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// A complete value occupies the first `n` bytes.
    Complete(usize),
    /// Everything seen so far is well formed but the value isn't finished.
    Incomplete,
    /// The input can never become valid, whatever follows.
    Invalid,
}

impl Validity {
    pub fn is_complete(&self) -> bool {
        matches!(self, Validity::Complete(_))
    }

    /// Bytes taken by the complete value, if any.
    pub fn consumed(&self) -> Option<usize> {
        match self {
            Validity::Complete(n) => Some(*n),
            _ => None,
        }
    }
}

/// Checks the grammar of the value at the start of `input` without building
/// a tree.
///
/// Meant for framing messages on a byte stream: keep reading while the
/// result is [`Validity::Incomplete`], then split off `n` bytes on
/// [`Validity::Complete`]. A truncated prefix of a valid document is never
/// reported as [`Validity::Invalid`].
///
/// # Examples
///
/// ```
/// use bentree::{validate, Validity};
///
/// assert_eq!(validate(b"d3:cow3:mooe"), Validity::Complete(12));
/// assert_eq!(validate(b"d3:cow3:mo"), Validity::Incomplete);
/// assert_eq!(validate(b"i03e"), Validity::Invalid);
/// assert_eq!(validate(b"i42eextra"), Validity::Complete(4));
/// ```
pub fn validate(input: &[u8]) -> Validity {
    validate_with_depth(input, MAX_DEPTH)
}

/// Like [`validate`], with a custom nesting limit.
pub fn validate_with_depth(input: &[u8], max_depth: usize) -> Validity {
    match skip_value(input, 0, 0, max_depth) {
        Ok(end) => Validity::Complete(end),
        Err(e) if e.is_incomplete() => Validity::Incomplete,
        Err(e) => {
            debug!(error = %e, "invalid bencode");
            Validity::Invalid
        }
    }
}

/// Returns the offset just past the value starting at `pos`.
fn skip_value(
    input: &[u8],
    pos: usize,
    depth: usize,
    max_depth: usize,
) -> Result<usize, BencodeError> {
    if depth > max_depth {
        return Err(BencodeError::NestingTooDeep);
    }

    match input.get(pos) {
        None => Err(BencodeError::UnexpectedEof),
        Some(b'i') => scan_integer(input, pos).map(|(_, end)| end),
        Some(b'0'..=b'9') => scan_string(input, pos).map(|(_, end)| end),
        Some(&lead @ (b'l' | b'd')) => {
            let mut pos = pos + 1;
            loop {
                match input.get(pos) {
                    None => return Err(BencodeError::UnexpectedEof),
                    Some(b'e') => return Ok(pos + 1),
                    Some(b'0'..=b'9') if lead == b'd' => {
                        let (_, key_end) = scan_string(input, pos)?;
                        pos = skip_value(input, key_end, depth + 1, max_depth)?;
                    }
                    Some(_) if lead == b'd' => return Err(BencodeError::NonStringKey),
                    Some(_) => pos = skip_value(input, pos, depth + 1, max_depth)?,
                }
            }
        }
        Some(&c) => Err(BencodeError::UnexpectedChar(c as char)),
    }
}
