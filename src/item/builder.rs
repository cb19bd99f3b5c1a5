use std::io::Write;

use bytes::Bytes;

use super::{Blob, ItemId, ItemKind, Node, Payload};
use crate::arena::{Arena, Span};

/// Building documents.
///
/// Every constructor returns `None` once the arena has failed, and every
/// linking call accepts `Option<ItemId>` and does nothing when handed `None`.
/// A document can therefore be built without checking each step, followed by
/// one [`Arena::check`].
///
/// An item must be added to at most one container. Adding it a second time
/// corrupts the sibling chain of the first container.
///
/// # Examples
///
/// ```
/// use bentree::Arena;
///
/// let mut arena = Arena::new();
/// let root = arena.dictionary();
/// arena.dictionary_add_string(root, b"cow", b"moo");
/// let list = arena.dictionary_add_list(root, b"spam");
/// arena.list_add_integer(list, 42);
/// arena.check().unwrap();
///
/// let encoded = arena.collapse(root.unwrap()).unwrap();
/// assert_eq!(encoded, b"d3:cow3:moo4:spamli42eee");
/// ```
impl<'a> Arena<'a> {
    pub fn dictionary(&mut self) -> Option<ItemId> {
        self.alloc_node(Node::new(Payload::Dictionary(None), Blob::Borrowed(b"d")))
    }

    pub fn list(&mut self) -> Option<ItemId> {
        self.alloc_node(Node::new(Payload::List, Blob::Borrowed(b"l")))
    }

    /// Creates a string item referencing `value` without copying it.
    pub fn string(&mut self, value: &'a [u8]) -> Option<ItemId> {
        self.string_node(Blob::Borrowed(value))
    }

    /// Creates a string item holding an arena copy of `value`.
    pub fn string_dup(&mut self, value: &[u8]) -> Option<ItemId> {
        let body = self.alloc_copy(value)?;
        self.string_node(Blob::Owned(body))
    }

    /// Creates a string item that takes ownership of a heap buffer; the
    /// buffer is released together with the arena.
    pub fn string_attached(&mut self, value: Bytes) -> Option<ItemId> {
        let body = self.attach(value)?;
        self.string_node(Blob::Owned(body))
    }

    pub fn integer(&mut self, value: i64) -> Option<ItemId> {
        let head = self.render(format_args!("i{}e", value))?;
        self.alloc_node(Node::new(Payload::Integer(value), Blob::Owned(head)))
    }

    /// Appends `item` to `list`. Returns `item`.
    pub fn list_add(
        &mut self,
        list: impl Into<Option<ItemId>>,
        item: impl Into<Option<ItemId>>,
    ) -> Option<ItemId> {
        let (list, item) = (list.into()?, item.into()?);
        if self.node(list)?.kind() != ItemKind::List {
            return None;
        }
        self.node(item)?;
        self.link(list, item)?;
        Some(item)
    }

    /// Appends the pair `key`/`value` to `dict`. Returns `value`.
    ///
    /// The key is referenced, not copied. Keys are neither deduplicated nor
    /// sorted: pairs are encoded in insertion order and lookups return the
    /// first match.
    pub fn dictionary_add(
        &mut self,
        dict: impl Into<Option<ItemId>>,
        key: &'a [u8],
        value: impl Into<Option<ItemId>>,
    ) -> Option<ItemId> {
        let (dict, value) = (dict.into()?, value.into()?);
        self.expect_pair_target(dict, value)?;
        let key = self.string(key)?;
        self.add_pair(dict, key, value)
    }

    /// Like [`Arena::dictionary_add`], but copies `key` into the arena.
    pub fn dictionary_add_dup(
        &mut self,
        dict: impl Into<Option<ItemId>>,
        key: &[u8],
        value: impl Into<Option<ItemId>>,
    ) -> Option<ItemId> {
        let (dict, value) = (dict.into()?, value.into()?);
        self.expect_pair_target(dict, value)?;
        let key = self.string_dup(key)?;
        self.add_pair(dict, key, value)
    }

    pub fn dictionary_add_string(
        &mut self,
        dict: impl Into<Option<ItemId>>,
        key: &'a [u8],
        value: &'a [u8],
    ) -> Option<ItemId> {
        let dict = dict.into()?;
        let value = self.string(value);
        self.dictionary_add(dict, key, value)
    }

    pub fn dictionary_add_string_dup(
        &mut self,
        dict: impl Into<Option<ItemId>>,
        key: &'a [u8],
        value: &[u8],
    ) -> Option<ItemId> {
        let dict = dict.into()?;
        let value = self.string_dup(value);
        self.dictionary_add(dict, key, value)
    }

    pub fn dictionary_add_integer(
        &mut self,
        dict: impl Into<Option<ItemId>>,
        key: &'a [u8],
        value: i64,
    ) -> Option<ItemId> {
        let dict = dict.into()?;
        let value = self.integer(value);
        self.dictionary_add(dict, key, value)
    }

    /// Adds a new, empty dictionary under `key` and returns it.
    pub fn dictionary_add_dictionary(
        &mut self,
        dict: impl Into<Option<ItemId>>,
        key: &'a [u8],
    ) -> Option<ItemId> {
        let dict = dict.into()?;
        let value = self.dictionary();
        self.dictionary_add(dict, key, value)
    }

    /// Adds a new, empty list under `key` and returns it.
    pub fn dictionary_add_list(
        &mut self,
        dict: impl Into<Option<ItemId>>,
        key: &'a [u8],
    ) -> Option<ItemId> {
        let dict = dict.into()?;
        let value = self.list();
        self.dictionary_add(dict, key, value)
    }

    pub fn list_add_string(
        &mut self,
        list: impl Into<Option<ItemId>>,
        value: &'a [u8],
    ) -> Option<ItemId> {
        let list = list.into()?;
        let item = self.string(value);
        self.list_add(list, item)
    }

    pub fn list_add_string_dup(
        &mut self,
        list: impl Into<Option<ItemId>>,
        value: &[u8],
    ) -> Option<ItemId> {
        let list = list.into()?;
        let item = self.string_dup(value);
        self.list_add(list, item)
    }

    pub fn list_add_integer(
        &mut self,
        list: impl Into<Option<ItemId>>,
        value: i64,
    ) -> Option<ItemId> {
        let list = list.into()?;
        let item = self.integer(value);
        self.list_add(list, item)
    }

    pub fn list_add_list(&mut self, list: impl Into<Option<ItemId>>) -> Option<ItemId> {
        let list = list.into()?;
        let item = self.list();
        self.list_add(list, item)
    }

    pub fn list_add_dictionary(&mut self, list: impl Into<Option<ItemId>>) -> Option<ItemId> {
        let list = list.into()?;
        let item = self.dictionary();
        self.list_add(list, item)
    }

    fn string_node(&mut self, body: Blob<'a>) -> Option<ItemId> {
        let head = self.render(format_args!("{}:", body.len()))?;
        self.alloc_node(Node::new(Payload::String(body), Blob::Owned(head)))
    }

    fn expect_pair_target(&self, dict: ItemId, value: ItemId) -> Option<()> {
        if self.node(dict)?.kind() != ItemKind::Dictionary {
            return None;
        }
        self.node(value).map(|_| ())
    }

    fn add_pair(&mut self, dict: ItemId, key: ItemId, value: ItemId) -> Option<ItemId> {
        self.link(dict, key)?;
        self.link(dict, value)?;
        self.index_pair(dict, key, value)?;
        Some(value)
    }

    /// Renders framing bytes into arena scratch.
    fn render(&mut self, args: std::fmt::Arguments<'_>) -> Option<Span> {
        let mut scratch = [0u8; 32];
        let remaining = {
            let mut cursor = &mut scratch[..];
            cursor.write_fmt(args).ok()?;
            cursor.len()
        };
        self.alloc_copy(&scratch[..scratch.len() - remaining])
    }
}
