//! Tree nodes of a bencode document.
//!
//! Items live inside an [`Arena`](crate::Arena) and are addressed by
//! [`ItemId`]. Each node keeps parent, first-child, last-child and
//! next-sibling links, so appending to a container is O(1) and a dictionary
//! is simply a container whose children alternate key, value, key, value.

mod access;
mod builder;

pub use access::{Children, Item, Pairs};

use crate::arena::{Arena, Span};
use crate::index::IndexId;

/// Stable handle of an item inside an [`Arena`](crate::Arena).
///
/// Ids survive [`Arena::merge`](crate::Arena::merge); they are meaningless
/// for any arena that neither created nor absorbed the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId {
    pub(crate) region: u32,
    pub(crate) index: u32,
}

/// The four bencode value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    String,
    Integer,
    List,
    Dictionary,
}

/// Bytes referenced by a node: caller memory or an arena allocation.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Blob<'a> {
    Borrowed(&'a [u8]),
    Owned(Span),
}

impl Blob<'_> {
    pub(crate) fn len(&self) -> usize {
        match self {
            Blob::Borrowed(bytes) => bytes.len(),
            Blob::Owned(span) => span.len(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Payload<'a> {
    String(Blob<'a>),
    Integer(i64),
    List,
    Dictionary(Option<IndexId>),
}

#[derive(Debug)]
pub(crate) struct Node<'a> {
    pub(crate) payload: Payload<'a>,
    /// Encoded framing: `<len>:` for strings, `i<n>e` for integers, `l` or `d`.
    pub(crate) head: Blob<'a>,
    pub(crate) parent: Option<ItemId>,
    pub(crate) first_child: Option<ItemId>,
    pub(crate) last_child: Option<ItemId>,
    pub(crate) next_sibling: Option<ItemId>,
    /// Set by the decoder and refreshed by every encoder measure pass.
    pub(crate) encoded_len: usize,
}

impl<'a> Node<'a> {
    pub(crate) fn new(payload: Payload<'a>, head: Blob<'a>) -> Self {
        Self {
            payload,
            head,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            encoded_len: 0,
        }
    }

    pub(crate) fn kind(&self) -> ItemKind {
        match self.payload {
            Payload::String(_) => ItemKind::String,
            Payload::Integer(_) => ItemKind::Integer,
            Payload::List => ItemKind::List,
            Payload::Dictionary(_) => ItemKind::Dictionary,
        }
    }
}

impl<'a> Arena<'a> {
    /// Returns a read-only view of `id`, or `None` if this arena doesn't own it.
    pub fn item(&self, id: ItemId) -> Option<Item<'_, 'a>> {
        let node = self.node(id)?;
        Some(Item::new(self, id, node))
    }

    pub(crate) fn resolve<'s>(&'s self, blob: &Blob<'a>) -> Option<&'s [u8]> {
        match *blob {
            Blob::Borrowed(bytes) => Some(bytes),
            Blob::Owned(span) => self.bytes(span),
        }
    }

    /// Appends `child` to `parent`'s child chain.
    pub(crate) fn link(&mut self, parent: ItemId, child: ItemId) -> Option<()> {
        let last = self.node(parent)?.last_child;
        {
            let node = self.node_mut(child)?;
            debug_assert!(node.parent.is_none(), "item is already linked");
            node.parent = Some(parent);
            node.next_sibling = None;
        }
        match last {
            Some(last) => self.node_mut(last)?.next_sibling = Some(child),
            None => self.node_mut(parent)?.first_child = Some(child),
        }
        self.node_mut(parent)?.last_child = Some(child);
        Some(())
    }
}
