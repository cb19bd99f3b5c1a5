//! Two-pass zero-copy encoder.
//!
//! The measure pass walks the tree bottom-up, records every item's encoded
//! length and counts the output segments. The emit pass walks it again in
//! the same pre-order (dictionary pairs key first, in insertion order) and
//! hands out slices of bytes that already exist: framing rendered when the
//! item was built, borrowed input, or arena copies. No payload is copied
//! unless a contiguous buffer is requested.

mod segments;

pub use segments::Segments;

use std::mem;

use bytes::Bytes;

use crate::arena::Arena;
use crate::item::{ItemId, Payload};

const END: &[u8] = b"e";

impl<'a> Arena<'a> {
    /// Measures the document under `root`, memoizing each item's encoded
    /// length. Returns the total encoded length and the segment count.
    pub fn measure(&mut self, root: ItemId) -> Option<(usize, usize)> {
        let node = self.node(root)?;
        let (payload, head, mut child) = (node.payload, node.head, node.first_child);

        let (len, count) = match payload {
            Payload::String(body) => (head.len() + body.len(), 2),
            Payload::Integer(_) => (head.len(), 1),
            Payload::List | Payload::Dictionary(_) => {
                let (mut len, mut count) = (head.len() + END.len(), 2);
                while let Some(id) = child {
                    let (child_len, child_count) = self.measure(id)?;
                    len += child_len;
                    count += child_count;
                    child = self.node(id)?.next_sibling;
                }
                (len, count)
            }
        };

        self.node_mut(root)?.encoded_len = len;
        Some((len, count))
    }

    /// Encodes `root` into a segment array with `head` empty slots before the
    /// document and `tail` empty slots after it, for the caller's framing.
    ///
    /// # Examples
    ///
    /// ```
    /// use bentree::Arena;
    ///
    /// let mut arena = Arena::new();
    /// let list = arena.list();
    /// arena.list_add_string(list, b"spam");
    /// arena.list_add_integer(list, 42);
    ///
    /// let mut segments = arena.segments(list.unwrap(), 1, 0).unwrap();
    /// assert_eq!(segments.count(), 5);
    /// assert_eq!(segments.encoded_len(), 12);
    ///
    /// segments.head_mut()[0] = &b"cookie "[..];
    /// assert_eq!(segments.to_vec(), b"cookie l4:spami42ee");
    /// ```
    pub fn segments(&mut self, root: ItemId, head: usize, tail: usize) -> Option<Segments<'_>> {
        let (len, count) = self.measure(root)?;
        let total = head
            .checked_add(count)
            .and_then(|n| n.checked_add(tail));
        let bytes = total.and_then(|n| n.checked_mul(mem::size_of::<&[u8]>()));
        let (Some(total), Some(bytes)) = (total, bytes) else {
            self.fail(usize::MAX);
            return None;
        };
        if !self.charge(bytes) {
            return None;
        }
        let mut slots: Vec<&[u8]> = Vec::new();
        if slots.try_reserve_exact(total).is_err() {
            self.fail(bytes);
            return None;
        }

        let this: &Self = self;
        slots.resize(head, &[]);
        this.emit(root, &mut |segment| slots.push(segment))?;
        debug_assert_eq!(slots.len(), head + count);
        slots.resize(total, &[]);

        Some(Segments::new(slots, head, count, len))
    }

    /// Encodes `root` into one contiguous arena buffer.
    ///
    /// Unlike [`Arena::segments`] this copies every payload. The returned slice
    /// carries the exact length; the document may contain zero bytes.
    pub fn collapse(&mut self, root: ItemId) -> Option<&[u8]> {
        let (len, _) = self.measure(root)?;
        if !self.charge(len) {
            return None;
        }
        let mut buf = Vec::new();
        if buf.try_reserve_exact(len).is_err() {
            self.fail(len);
            return None;
        }
        self.emit(root, &mut |segment| buf.extend_from_slice(segment))?;
        let span = self.adopt(buf);
        self.bytes(span)
    }

    /// Encodes `root` into a heap buffer that outlives the arena.
    pub fn collapse_owned(&mut self, root: ItemId) -> Option<Bytes> {
        let (len, _) = self.measure(root)?;
        let mut buf = Vec::with_capacity(len);
        self.emit(root, &mut |segment| buf.extend_from_slice(segment))?;
        Some(Bytes::from(buf))
    }

    fn emit<'s, F>(&'s self, id: ItemId, sink: &mut F) -> Option<()>
    where
        F: FnMut(&'s [u8]),
    {
        let node = self.node(id)?;
        sink(self.resolve(&node.head)?);
        match node.payload {
            Payload::String(body) => sink(self.resolve(&body)?),
            Payload::Integer(_) => {}
            Payload::List | Payload::Dictionary(_) => {
                let mut child = node.first_child;
                while let Some(id) = child {
                    self.emit(id, sink)?;
                    child = self.node(id)?.next_sibling;
                }
                sink(END);
            }
        }
        Some(())
    }
}
