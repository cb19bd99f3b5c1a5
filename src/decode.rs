//! Recursive-descent bencode decoder.
//!
//! Decoding builds the tree inside an [`Arena`] without copying any string:
//! both the framing and the payload of each string (and the whole text of
//! each integer) are borrowed from the input, so re-encoding a decoded
//! document is zero-copy as well.

mod validate;

pub use validate::{validate, validate_with_depth, Validity};

use tracing::debug;

use crate::arena::Arena;
use crate::error::BencodeError;
use crate::item::{Blob, ItemId, ItemKind, Node, Payload};

impl<'a> Arena<'a> {
    /// Decodes one value from the start of `input`.
    ///
    /// The root's [`encoded_len`](crate::Item::encoded_len) is the number of
    /// bytes consumed; compare it with `input.len()` to detect trailing bytes,
    /// or use [`Arena::decode_exact`]. On failure nodes created so far stay in
    /// the arena until it is released, but no id to them is handed out.
    ///
    /// Lists and dictionaries nested deeper than the configured
    /// [`max_depth`](crate::ArenaConfig::with_max_depth) fail with
    /// [`BencodeError::NestingTooDeep`]. The default is
    /// [`MAX_DEPTH`](crate::constants::MAX_DEPTH). The builders have no such
    /// limit, so a deeper built tree encodes fine but only decodes again in an
    /// arena configured with a larger `with_max_depth`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bentree::Arena;
    ///
    /// let mut arena = Arena::new();
    /// let root = arena.decode(b"l4:spami42eetrailing").unwrap();
    /// let list = arena.item(root).unwrap();
    /// assert_eq!(list.encoded_len(), 12);
    /// assert_eq!(list.first_child().unwrap().as_str(), Some("spam"));
    ///
    /// assert!(arena.decode(b"i03e").is_err());
    /// assert!(arena.decode(b"3:ab").unwrap_err().is_incomplete());
    /// ```
    pub fn decode(&mut self, input: &'a [u8]) -> Result<ItemId, BencodeError> {
        let mut decoder = Decoder {
            input,
            pos: 0,
            max_depth: self.config().max_depth,
        };
        decoder.value(self, 0).inspect_err(|e| {
            debug!(error = %e, offset = decoder.pos, "bencode decode failed");
        })
    }

    /// Decodes like [`Arena::decode`] and requires the root to be of `kind`.
    pub fn decode_expect(
        &mut self,
        input: &'a [u8],
        kind: ItemKind,
    ) -> Result<ItemId, BencodeError> {
        let root = self.decode(input)?;
        let found = self
            .node(root)
            .map(Node::kind)
            .ok_or(BencodeError::AllocationFailed)?;
        if found != kind {
            return Err(BencodeError::UnexpectedType {
                expected: kind,
                found,
            });
        }
        Ok(root)
    }

    /// Decodes like [`Arena::decode`] and rejects bytes after the value.
    pub fn decode_exact(&mut self, input: &'a [u8]) -> Result<ItemId, BencodeError> {
        let root = self.decode(input)?;
        if self.decoded_len(root) != Some(input.len()) {
            return Err(BencodeError::TrailingData);
        }
        Ok(root)
    }

    /// Bytes the decoder consumed for `root`; `None` if `root` isn't ours.
    pub fn decoded_len(&self, root: ItemId) -> Option<usize> {
        self.node(root).map(|node| node.encoded_len)
    }
}

struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    fn value(&mut self, arena: &mut Arena<'a>, depth: usize) -> Result<ItemId, BencodeError> {
        if depth > self.max_depth {
            return Err(BencodeError::NestingTooDeep);
        }

        match self.input.get(self.pos) {
            None => Err(BencodeError::UnexpectedEof),
            Some(b'i') => self.integer(arena),
            Some(b'l') => self.list(arena, depth),
            Some(b'd') => self.dictionary(arena, depth),
            Some(b'0'..=b'9') => self.string(arena),
            Some(&c) => Err(BencodeError::UnexpectedChar(c as char)),
        }
    }

    fn string(&mut self, arena: &mut Arena<'a>) -> Result<ItemId, BencodeError> {
        let start = self.pos;
        let (payload, end) = scan_string(self.input, start)?;
        let node = Node::new(
            Payload::String(Blob::Borrowed(&self.input[payload..end])),
            Blob::Borrowed(&self.input[start..payload]),
        );
        let id = alloc(arena, node, end - start)?;
        self.pos = end;
        Ok(id)
    }

    fn integer(&mut self, arena: &mut Arena<'a>) -> Result<ItemId, BencodeError> {
        let start = self.pos;
        let (value, end) = scan_integer(self.input, start)?;
        let node = Node::new(
            Payload::Integer(value),
            Blob::Borrowed(&self.input[start..end]),
        );
        let id = alloc(arena, node, end - start)?;
        self.pos = end;
        Ok(id)
    }

    fn list(&mut self, arena: &mut Arena<'a>, depth: usize) -> Result<ItemId, BencodeError> {
        let start = self.pos;
        let list = self.container(arena, Payload::List)?;

        loop {
            match self.input.get(self.pos) {
                None => return Err(BencodeError::UnexpectedEof),
                Some(b'e') => break,
                Some(_) => {
                    let child = self.value(arena, depth + 1)?;
                    arena
                        .link(list, child)
                        .ok_or(BencodeError::AllocationFailed)?;
                }
            }
        }

        self.pos += 1;
        self.finish(arena, list, start)
    }

    fn dictionary(&mut self, arena: &mut Arena<'a>, depth: usize) -> Result<ItemId, BencodeError> {
        let start = self.pos;
        let dict = self.container(arena, Payload::Dictionary(None))?;

        loop {
            match self.input.get(self.pos) {
                None => return Err(BencodeError::UnexpectedEof),
                Some(b'e') => break,
                Some(b'0'..=b'9') => {
                    let key = self.string(arena)?;
                    let value = self.value(arena, depth + 1)?;
                    arena
                        .link(dict, key)
                        .and_then(|_| arena.link(dict, value))
                        .ok_or(BencodeError::AllocationFailed)?;
                }
                Some(_) => return Err(BencodeError::NonStringKey),
            }
        }

        self.pos += 1;
        let dict = self.finish(arena, dict, start)?;
        arena
            .build_index(dict)
            .ok_or(BencodeError::AllocationFailed)?;
        Ok(dict)
    }

    /// Creates a list or dictionary node and steps over its opening byte.
    fn container(
        &mut self,
        arena: &mut Arena<'a>,
        payload: Payload<'a>,
    ) -> Result<ItemId, BencodeError> {
        let head = Blob::Borrowed(&self.input[self.pos..self.pos + 1]);
        let id = alloc(arena, Node::new(payload, head), 0)?;
        self.pos += 1;
        Ok(id)
    }

    fn finish(
        &self,
        arena: &mut Arena<'a>,
        id: ItemId,
        start: usize,
    ) -> Result<ItemId, BencodeError> {
        let node = arena.node_mut(id).ok_or(BencodeError::AllocationFailed)?;
        node.encoded_len = self.pos - start;
        Ok(id)
    }
}

fn alloc<'a>(
    arena: &mut Arena<'a>,
    mut node: Node<'a>,
    consumed: usize,
) -> Result<ItemId, BencodeError> {
    node.encoded_len = consumed;
    arena.alloc_node(node).ok_or(BencodeError::AllocationFailed)
}

/// Scans `<len>:<bytes>` starting at `start`.
///
/// Returns the offsets of the payload and of the first byte after it.
pub(crate) fn scan_string(input: &[u8], start: usize) -> Result<(usize, usize), BencodeError> {
    let mut pos = start;
    let mut len: usize = 0;

    loop {
        match input.get(pos) {
            None => return Err(BencodeError::UnexpectedEof),
            Some(&c @ b'0'..=b'9') => {
                len = len
                    .checked_mul(10)
                    .and_then(|len| len.checked_add(usize::from(c - b'0')))
                    .ok_or(BencodeError::InvalidStringLength)?;
                pos += 1;
            }
            Some(b':') if pos > start => break,
            Some(&c) => return Err(BencodeError::UnexpectedChar(c as char)),
        }
    }

    let payload = pos + 1;
    let end = payload
        .checked_add(len)
        .ok_or(BencodeError::InvalidStringLength)?;
    if end > input.len() {
        return Err(BencodeError::UnexpectedEof);
    }
    Ok((payload, end))
}

/// Scans `i<digits>e` starting at `start`.
///
/// Rejects `-0`, leading zeros, an empty number and values outside `i64` as
/// soon as the offending byte is seen, so a truncated prefix of a valid
/// integer is only ever reported as incomplete.
pub(crate) fn scan_integer(input: &[u8], start: usize) -> Result<(i64, usize), BencodeError> {
    let invalid = |pos: usize| {
        let end = (pos + 1).min(input.len());
        BencodeError::InvalidInteger(String::from_utf8_lossy(&input[start + 1..end]).into_owned())
    };

    let mut pos = start + 1;
    let negative = input.get(pos) == Some(&b'-');
    if negative {
        pos += 1;
    }
    let limit = if negative {
        i64::MIN.unsigned_abs()
    } else {
        i64::MAX as u64
    };

    let digits = pos;
    let mut magnitude: u64 = 0;
    loop {
        match input.get(pos) {
            None => return Err(BencodeError::UnexpectedEof),
            Some(&c @ b'0'..=b'9') => {
                if pos > digits && input[digits] == b'0' {
                    return Err(invalid(pos));
                }
                if negative && c == b'0' && pos == digits {
                    return Err(invalid(pos));
                }
                magnitude = magnitude
                    .checked_mul(10)
                    .and_then(|m| m.checked_add(u64::from(c - b'0')))
                    .filter(|m| *m <= limit)
                    .ok_or_else(|| invalid(pos))?;
                pos += 1;
            }
            Some(b'e') if pos > digits => break,
            Some(b'e') => return Err(invalid(pos)),
            Some(&c) => return Err(BencodeError::UnexpectedChar(c as char)),
        }
    }

    let value = if negative {
        (magnitude as i64).wrapping_neg()
    } else {
        magnitude as i64
    };
    Ok((value, pos + 1))
}

#[cfg(test)]
mod tests;
