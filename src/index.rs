//! Hash index over the keys of a decoded dictionary.
//!
//! Keys hash into [`HASH_BUCKETS`] buckets. Each bucket is a chain of
//! key/value entries in insertion order, so a lookup scans only one short
//! chain and still returns the first of several duplicate keys.

use std::mem;

use tracing::trace;

use crate::arena::Arena;
use crate::constants::HASH_BUCKETS;
use crate::item::{ItemId, Payload};

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct IndexId {
    pub(crate) region: u32,
    pub(crate) index: u32,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    key: ItemId,
    value: ItemId,
    next: Option<u32>,
}

#[derive(Debug)]
pub(crate) struct HashIndex {
    heads: [Option<u32>; HASH_BUCKETS],
    tails: [Option<u32>; HASH_BUCKETS],
    entries: Vec<Entry>,
}

impl HashIndex {
    pub(crate) fn with_capacity(pairs: usize) -> Self {
        Self {
            heads: [None; HASH_BUCKETS],
            tails: [None; HASH_BUCKETS],
            entries: Vec::with_capacity(pairs),
        }
    }

    /// Appends an entry to the tail of its bucket's chain.
    pub(crate) fn insert(&mut self, key_bytes: &[u8], key: ItemId, value: ItemId) {
        self.push(bucket_of(key_bytes), key, value);
    }

    fn push(&mut self, bucket: usize, key: ItemId, value: ItemId) {
        let slot = self.entries.len() as u32;
        self.entries.push(Entry {
            key,
            value,
            next: None,
        });
        match self.tails[bucket] {
            Some(tail) => self.entries[tail as usize].next = Some(slot),
            None => self.heads[bucket] = Some(slot),
        }
        self.tails[bucket] = Some(slot);
    }

    pub(crate) fn lookup(&self, arena: &Arena<'_>, key: &[u8]) -> Option<ItemId> {
        let mut cursor = self.heads[bucket_of(key)];
        while let Some(slot) = cursor {
            let entry = self.entries.get(slot as usize)?;
            if arena.item(entry.key)?.as_bytes() == Some(key) {
                return Some(entry.value);
            }
            cursor = entry.next;
        }
        None
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Bytes charged to the arena for this index.
    pub(crate) fn footprint(&self) -> usize {
        mem::size_of::<Self>() + self.entries.capacity() * mem::size_of::<Entry>()
    }
}

pub(crate) fn bucket_of(key: &[u8]) -> usize {
    let hash = key.iter().fold(FNV_OFFSET, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    });
    hash as usize % HASH_BUCKETS
}

impl<'a> Arena<'a> {
    /// Attaches a hash index to a dictionary whose children are complete.
    ///
    /// Dictionaries above the configured pair limit are left unindexed.
    /// Returns `None` only if the arena could not hold the index.
    pub(crate) fn build_index(&mut self, dict: ItemId) -> Option<()> {
        let index = {
            let item = self.item(dict)?;
            let pairs = item.len();
            if pairs == 0 || pairs > self.config().hash_index_max_pairs {
                return Some(());
            }
            let mut index = HashIndex::with_capacity(pairs);
            for (key, value) in item.pairs() {
                index.insert(key.as_bytes()?, key.id(), value.id());
            }
            index
        };
        trace!(pairs = index.len(), "indexing decoded dictionary");
        let id = self.alloc_index(index)?;
        if let Payload::Dictionary(slot) = &mut self.node_mut(dict)?.payload {
            *slot = Some(id);
        }
        Some(())
    }

    /// Appends a pair linked after decoding to the dictionary's index, if it
    /// has one. When the entry can't be charged the index is dropped, so
    /// lookups fall back to scanning the pairs, and `None` is returned.
    pub(crate) fn index_pair(&mut self, dict: ItemId, key: ItemId, value: ItemId) -> Option<()> {
        let Payload::Dictionary(Some(index)) = self.node(dict)?.payload else {
            return Some(());
        };
        let bucket = self.item(key).and_then(|key| key.as_bytes()).map(bucket_of);
        let appended = match bucket {
            Some(bucket) if self.charge(mem::size_of::<Entry>()) => self
                .index_mut(index)
                .map(|index| index.push(bucket, key, value))
                .is_some(),
            _ => false,
        };
        if appended {
            return Some(());
        }
        if let Payload::Dictionary(slot) = &mut self.node_mut(dict)?.payload {
            *slot = None;
        }
        None
    }

    /// Returns `true` if lookups on `dict` go through a hash index.
    pub fn is_indexed(&self, dict: ItemId) -> bool {
        matches!(
            self.node(dict).map(|node| node.payload),
            Some(Payload::Dictionary(Some(_)))
        )
    }
}
