//! Bump arena backing every allocation of a bencode document.
//!
//! An [`Arena`] groups many small allocations (item nodes, rendered framing
//! bytes, copied strings, hash indexes, segment arrays) into a few large
//! pieces and releases them all at once. Allocation failures are sticky: once
//! the arena has refused an allocation it refuses every later one, so a whole
//! document can be built speculatively and checked once with [`Arena::check`].
//!
//! # Examples
//!
//! ```
//! use bentree::{Arena, ArenaConfig};
//!
//! let config = ArenaConfig::default()
//!     .with_piece_size(16)
//!     .with_byte_limit(64);
//! let mut arena = Arena::with_config(config);
//! let span = arena.alloc_copy(b"hello").unwrap();
//! assert_eq!(arena.bytes(span), Some(&b"hello"[..]));
//!
//! // A request larger than the limit fails and poisons the arena.
//! assert!(arena.allocate(4096).is_none());
//! assert!(arena.alloc_copy(b"x").is_none());
//! assert!(arena.check().is_err());
//! ```

use std::mem;
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::Bytes;
use tracing::{trace, warn};

use crate::constants::{DEFAULT_PIECE_SIZE, HASH_INDEX_MAX_PAIRS, MAX_DEPTH};
use crate::error::BencodeError;
use crate::index::{HashIndex, IndexId};
use crate::item::{ItemId, Node};

static NEXT_REGION: AtomicU32 = AtomicU32::new(1);

/// Tuning knobs of an [`Arena`] and of the decoder running on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Minimum capacity of each new piece.
    pub piece_size: usize,
    /// Upper bound on the bytes the arena may reserve, `None` for unbounded.
    pub byte_limit: Option<usize>,
    /// Maximum nesting depth accepted by [`Arena::decode`].
    pub max_depth: usize,
    /// Decoded dictionaries with more pairs than this get no hash index.
    pub hash_index_max_pairs: usize,
}

impl ArenaConfig {
    pub fn with_piece_size(mut self, piece_size: usize) -> Self {
        self.piece_size = piece_size.max(1);
        self
    }

    pub fn with_byte_limit(mut self, limit: usize) -> Self {
        self.byte_limit = Some(limit);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_hash_index_max_pairs(mut self, pairs: usize) -> Self {
        self.hash_index_max_pairs = pairs;
        self
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            piece_size: DEFAULT_PIECE_SIZE,
            byte_limit: None,
            max_depth: MAX_DEPTH,
            hash_index_max_pairs: HASH_INDEX_MAX_PAIRS,
        }
    }
}

/// Handle to a byte range allocated from an [`Arena`].
///
/// A span stays valid for as long as the arena that allocated it, or the
/// arena it was merged into, is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    region: u32,
    piece: u32,
    start: usize,
    len: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug)]
enum Piece {
    /// Arena-owned block with a fixed capacity; `len()` is the bump offset.
    Bump(Vec<u8>),
    /// Heap buffer handed over by the caller, released with the arena.
    Attached(Bytes),
}

impl Piece {
    fn as_slice(&self) -> &[u8] {
        match self {
            Piece::Bump(buf) => buf,
            Piece::Attached(bytes) => bytes,
        }
    }
}

/// Storage contributed by one arena. Merging moves regions, never their contents.
#[derive(Debug)]
pub(crate) struct Region<'a> {
    id: u32,
    pieces: Vec<Piece>,
    current: Option<usize>,
    nodes: Vec<Node<'a>>,
    indexes: Vec<HashIndex>,
}

impl Region<'_> {
    fn new() -> Self {
        Self {
            id: NEXT_REGION.fetch_add(1, Ordering::Relaxed),
            pieces: Vec::new(),
            current: None,
            nodes: Vec::new(),
            indexes: Vec::new(),
        }
    }
}

/// Owner of every item, string copy and index of one or more documents.
///
/// `'a` is the lifetime of caller memory that string items may borrow: the
/// input handed to [`Arena::decode`], or slices passed to [`Arena::string`].
///
/// The arena is not synchronized. Use one arena per task, or lock around it.
#[derive(Debug)]
pub struct Arena<'a> {
    /// `regions[0]` is this arena's own region; the rest were merged in.
    regions: Vec<Region<'a>>,
    config: ArenaConfig,
    allocated: usize,
    failed: bool,
}

impl<'a> Arena<'a> {
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::default())
    }

    pub fn with_config(config: ArenaConfig) -> Self {
        Self {
            regions: vec![Region::new()],
            config,
            allocated: 0,
            failed: false,
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Returns `true` once any allocation on this arena has failed.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Single status check after a sequence of builder calls.
    pub fn check(&self) -> Result<(), BencodeError> {
        if self.failed {
            Err(BencodeError::AllocationFailed)
        } else {
            Ok(())
        }
    }

    /// Bytes reserved so far, including merged arenas.
    pub fn allocated_bytes(&self) -> usize {
        self.allocated
    }

    pub fn piece_count(&self) -> usize {
        self.regions.iter().map(|r| r.pieces.len()).sum()
    }

    /// Carves `size` bytes out of the current piece, opening a new piece when
    /// it lacks room. The returned bytes are zeroed.
    pub fn allocate(&mut self, size: usize) -> Option<Span> {
        if self.failed {
            return None;
        }

        let fits = {
            let region = &self.regions[0];
            match region.current.and_then(|i| region.pieces.get(i)) {
                Some(Piece::Bump(buf)) => buf.capacity() - buf.len() >= size,
                _ => false,
            }
        };
        if !fits {
            self.grow(size)?;
        }

        let region = &mut self.regions[0];
        let piece = region.current?;
        match region.pieces.get_mut(piece) {
            Some(Piece::Bump(buf)) => {
                let start = buf.len();
                buf.resize(start + size, 0);
                Some(Span {
                    region: region.id,
                    piece: piece as u32,
                    start,
                    len: size,
                })
            }
            _ => None,
        }
    }

    /// Allocates a copy of `data`.
    pub fn alloc_copy(&mut self, data: &[u8]) -> Option<Span> {
        let span = self.allocate(data.len())?;
        self.bytes_mut(span)?.copy_from_slice(data);
        Some(span)
    }

    /// Registers an externally allocated buffer to be released with the arena.
    pub fn attach(&mut self, data: Bytes) -> Option<Span> {
        if !self.charge(mem::size_of::<Piece>()) {
            return None;
        }
        let len = data.len();
        Some(self.push_piece(Piece::Attached(data), len))
    }

    pub fn bytes(&self, span: Span) -> Option<&[u8]> {
        let piece = self.region(span.region)?.pieces.get(span.piece as usize)?;
        piece.as_slice().get(span.start..span.start + span.len)
    }

    /// Mutable access to arena-owned bytes. Attached buffers are read-only.
    pub fn bytes_mut(&mut self, span: Span) -> Option<&mut [u8]> {
        let piece = self
            .region_mut(span.region)?
            .pieces
            .get_mut(span.piece as usize)?;
        match piece {
            Piece::Bump(buf) => buf.get_mut(span.start..span.start + span.len),
            Piece::Attached(_) => None,
        }
    }

    /// Takes over everything `other` owns. Items, spans and indexes of
    /// `other` stay valid and are now released together with `self`.
    pub fn merge(&mut self, mut other: Arena<'a>) {
        trace!(
            regions = self.regions.len(),
            merged = other.regions.len(),
            "merging arenas"
        );
        self.failed |= other.failed;
        self.allocated = self.allocated.saturating_add(other.allocated);
        self.regions.append(&mut other.regions);
    }

    /// Releases every piece, item, index and attached buffer.
    pub fn free(self) {
        trace!(
            pieces = self.piece_count(),
            bytes = self.allocated,
            "releasing arena"
        );
    }

    pub(crate) fn node(&self, id: ItemId) -> Option<&Node<'a>> {
        self.region(id.region)?.nodes.get(id.index as usize)
    }

    pub(crate) fn node_mut(&mut self, id: ItemId) -> Option<&mut Node<'a>> {
        self.region_mut(id.region)?.nodes.get_mut(id.index as usize)
    }

    pub(crate) fn alloc_node(&mut self, node: Node<'a>) -> Option<ItemId> {
        if !self.charge(mem::size_of::<Node<'a>>()) {
            return None;
        }
        if self.regions[0].nodes.try_reserve(1).is_err() {
            self.fail(mem::size_of::<Node<'a>>());
            return None;
        }
        let region = &mut self.regions[0];
        let index = region.nodes.len() as u32;
        region.nodes.push(node);
        Some(ItemId {
            region: region.id,
            index,
        })
    }

    pub(crate) fn index(&self, id: IndexId) -> Option<&HashIndex> {
        self.region(id.region)?.indexes.get(id.index as usize)
    }

    pub(crate) fn index_mut(&mut self, id: IndexId) -> Option<&mut HashIndex> {
        self.region_mut(id.region)?.indexes.get_mut(id.index as usize)
    }

    pub(crate) fn alloc_index(&mut self, index: HashIndex) -> Option<IndexId> {
        if !self.charge(index.footprint()) {
            return None;
        }
        let region = &mut self.regions[0];
        let slot = region.indexes.len() as u32;
        region.indexes.push(index);
        Some(IndexId {
            region: region.id,
            index: slot,
        })
    }

    /// Reserves `bytes` against the budget, setting the sticky flag on failure.
    pub(crate) fn charge(&mut self, bytes: usize) -> bool {
        if self.failed {
            return false;
        }
        let total = self.allocated.saturating_add(bytes);
        if self.config.byte_limit.is_some_and(|limit| total > limit) {
            self.fail(bytes);
            return false;
        }
        self.allocated = total;
        true
    }

    pub(crate) fn fail(&mut self, requested: usize) {
        if !self.failed {
            warn!(
                requested,
                allocated = self.allocated,
                "arena allocation failed, refusing further allocations"
            );
        }
        self.failed = true;
    }

    /// Stores an already filled, already charged buffer as a piece of its own.
    /// The current bump piece is left as it is.
    pub(crate) fn adopt(&mut self, buf: Vec<u8>) -> Span {
        let len = buf.len();
        self.push_piece(Piece::Bump(buf), len)
    }

    fn push_piece(&mut self, piece: Piece, len: usize) -> Span {
        let region = &mut self.regions[0];
        region.pieces.push(piece);
        Span {
            region: region.id,
            piece: (region.pieces.len() - 1) as u32,
            start: 0,
            len,
        }
    }

    fn grow(&mut self, size: usize) -> Option<()> {
        let capacity = size.max(self.config.piece_size);
        if !self.charge(capacity) {
            return None;
        }
        let mut buf = Vec::new();
        if buf.try_reserve_exact(capacity).is_err() {
            self.fail(capacity);
            return None;
        }
        let region = &mut self.regions[0];
        region.pieces.push(Piece::Bump(buf));
        region.current = Some(region.pieces.len() - 1);
        trace!(capacity, pieces = region.pieces.len(), "new arena piece");
        Some(())
    }

    fn region(&self, id: u32) -> Option<&Region<'a>> {
        self.regions.iter().find(|r| r.id == id)
    }

    fn region_mut(&mut self, id: u32) -> Option<&mut Region<'a>> {
        self.regions.iter_mut().find(|r| r.id == id)
    }
}

impl Default for Arena<'_> {
    fn default() -> Self {
        Self::new()
    }
}
