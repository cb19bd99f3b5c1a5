use std::cmp::Ordering;
use std::fmt;

use bytes::Bytes;

use super::{Blob, ItemId, ItemKind, Node, Payload};
use crate::arena::Arena;

/// Borrowed view of one item, for traversal and typed access.
///
/// Typed accessors don't distinguish a missing key from a value of the wrong
/// kind: both give `None`, or the caller's default.
///
/// # Examples
///
/// ```
/// use bentree::Arena;
///
/// let mut arena = Arena::new();
/// let root = arena.decode(b"d3:cow3:moo4:spami7ee").unwrap();
/// let dict = arena.item(root).unwrap();
///
/// assert_eq!(dict.get_str(b"cow"), Some("moo"));
/// assert_eq!(dict.get_integer(b"spam", -1), 7);
/// assert_eq!(dict.get_integer(b"cow", -1), -1);
/// assert!(dict.get(b"missing").is_none());
/// ```
#[derive(Clone, Copy)]
pub struct Item<'s, 'a> {
    arena: &'s Arena<'a>,
    id: ItemId,
    node: &'s Node<'a>,
}

impl<'s, 'a> Item<'s, 'a> {
    pub(crate) fn new(arena: &'s Arena<'a>, id: ItemId, node: &'s Node<'a>) -> Self {
        Self { arena, id, node }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn kind(&self) -> ItemKind {
        self.node.kind()
    }

    pub fn parent(&self) -> Option<Item<'s, 'a>> {
        self.arena.item(self.node.parent?)
    }

    pub fn first_child(&self) -> Option<Item<'s, 'a>> {
        self.arena.item(self.node.first_child?)
    }

    pub fn last_child(&self) -> Option<Item<'s, 'a>> {
        self.arena.item(self.node.last_child?)
    }

    pub fn next_sibling(&self) -> Option<Item<'s, 'a>> {
        self.arena.item(self.node.next_sibling?)
    }

    /// Direct children in order. For a dictionary these alternate key, value.
    pub fn children(&self) -> Children<'s, 'a> {
        Children {
            arena: self.arena,
            next: self.node.first_child,
        }
    }

    /// Key/value pairs of a dictionary, in insertion order. Empty for other kinds.
    pub fn pairs(&self) -> Pairs<'s, 'a> {
        let children = match self.node.payload {
            Payload::Dictionary(_) => self.children(),
            _ => Children {
                arena: self.arena,
                next: None,
            },
        };
        Pairs { children }
    }

    /// Number of elements of a list or pairs of a dictionary; zero otherwise.
    pub fn len(&self) -> usize {
        match self.node.payload {
            Payload::List => self.children().count(),
            Payload::Dictionary(_) => self.pairs().count(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.node.first_child.is_none()
    }

    /// Encoded size as recorded by the decoder or the last encoder pass.
    ///
    /// For a freshly decoded root this is the number of input bytes consumed;
    /// anything past it in the input was not part of the document.
    pub fn encoded_len(&self) -> usize {
        self.node.encoded_len
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self.node.payload {
            Payload::Integer(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&'s [u8]> {
        match &self.node.payload {
            Payload::String(body) => self.arena.resolve(body),
            _ => None,
        }
    }

    /// Returns the string payload if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&'s str> {
        std::str::from_utf8(self.as_bytes()?).ok()
    }

    pub fn str_or(&self, default: &'s str) -> &'s str {
        self.as_str().unwrap_or(default)
    }

    /// Returns `true` for string items that reference caller memory.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.node.payload, Payload::String(Blob::Borrowed(_)))
    }

    /// Heap copy of the string payload that outlives the arena.
    pub fn to_bytes_owned(&self) -> Option<Bytes> {
        self.as_bytes().map(Bytes::copy_from_slice)
    }

    pub fn integer_or(&self, default: i64) -> i64 {
        self.as_integer().unwrap_or(default)
    }

    /// Integer value, also accepting a string that holds a decimal integer.
    ///
    /// The string may start with ASCII whitespace and a sign. Out of range
    /// values saturate at `i64::MIN` or `i64::MAX`. A string without digits,
    /// or with anything after them, gives `default`.
    pub fn integer_or_parse(&self, default: i64) -> i64 {
        if let Some(value) = self.as_integer() {
            return value;
        }
        self.as_bytes()
            .and_then(parse_saturating)
            .unwrap_or(default)
    }

    /// Compares the string payload against `other`: shorter strings order
    /// first, equal lengths compare bytewise. `None` if not a string.
    pub fn str_cmp(&self, other: &[u8]) -> Option<Ordering> {
        let bytes = self.as_bytes()?;
        Some(
            bytes
                .len()
                .cmp(&other.len())
                .then_with(|| bytes.cmp(other)),
        )
    }

    /// Looks up `key` in a dictionary. The first matching pair wins.
    pub fn get(&self, key: &[u8]) -> Option<Item<'s, 'a>> {
        let Payload::Dictionary(index) = self.node.payload else {
            return None;
        };
        let value = match index {
            Some(index) => self.arena.index(index)?.lookup(self.arena, key)?,
            None => {
                self.pairs()
                    .find(|(k, _)| k.as_bytes() == Some(key))?
                    .1
                    .id
            }
        };
        self.arena.item(value)
    }

    pub fn get_expect(&self, key: &[u8], kind: ItemKind) -> Option<Item<'s, 'a>> {
        self.get(key).filter(|item| item.kind() == kind)
    }

    pub fn get_bytes(&self, key: &[u8]) -> Option<&'s [u8]> {
        self.get(key)?.as_bytes()
    }

    pub fn get_str(&self, key: &[u8]) -> Option<&'s str> {
        self.get(key)?.as_str()
    }

    pub fn get_bytes_owned(&self, key: &[u8]) -> Option<Bytes> {
        self.get(key)?.to_bytes_owned()
    }

    pub fn get_integer(&self, key: &[u8], default: i64) -> i64 {
        self.get(key)
            .map_or(default, |item| item.integer_or(default))
    }

    /// Like [`Item::get_integer`], but a string value holding a decimal
    /// integer is accepted too.
    pub fn get_int_str(&self, key: &[u8], default: i64) -> i64 {
        self.get(key)
            .map_or(default, |item| item.integer_or_parse(default))
    }

    pub fn get_str_cmp(&self, key: &[u8], other: &[u8]) -> Option<Ordering> {
        self.get(key)?.str_cmp(other)
    }
}

fn parse_saturating(text: &[u8]) -> Option<i64> {
    let start = text.iter().position(|b| !b.is_ascii_whitespace())?;
    let (negative, digits) = match &text[start..] {
        [b'-', rest @ ..] => (true, rest),
        [b'+', rest @ ..] => (false, rest),
        rest => (false, rest),
    };
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let value = digits.iter().try_fold(0i64, |acc, &digit| {
        let digit = i64::from(digit - b'0');
        let acc = acc.checked_mul(10)?;
        if negative {
            acc.checked_sub(digit)
        } else {
            acc.checked_add(digit)
        }
    });
    Some(value.unwrap_or(if negative { i64::MIN } else { i64::MAX }))
}

impl fmt::Debug for Item<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Item");
        out.field("id", &self.id).field("kind", &self.kind());
        match self.node.payload {
            Payload::Integer(value) => out.field("value", &value),
            Payload::String(_) => out.field("value", &self.as_bytes().map(String::from_utf8_lossy)),
            _ => out.field("children", &self.children().count()),
        };
        out.finish()
    }
}

/// Iterator over the direct children of an item.
#[derive(Clone)]
pub struct Children<'s, 'a> {
    arena: &'s Arena<'a>,
    next: Option<ItemId>,
}

impl<'s, 'a> Iterator for Children<'s, 'a> {
    type Item = Item<'s, 'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.arena.item(self.next?)?;
        self.next = item.node.next_sibling;
        Some(item)
    }
}

/// Iterator over the key/value pairs of a dictionary.
#[derive(Clone)]
pub struct Pairs<'s, 'a> {
    children: Children<'s, 'a>,
}

impl<'s, 'a> Iterator for Pairs<'s, 'a> {
    type Item = (Item<'s, 'a>, Item<'s, 'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.children.next()?;
        let value = self.children.next()?;
        Some((key, value))
    }
}
