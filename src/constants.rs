//! Codec constants and tuning parameters.
//!
//! This module contains the defaults used by [`ArenaConfig`](crate::ArenaConfig)
//! and the fixed parameters of the dictionary hash index and the decoder.

// ============================================================================
// Arena
// ============================================================================

/// Minimum capacity of a freshly created arena piece, in bytes.
///
/// Requests larger than this get a piece of exactly their own size.
pub const DEFAULT_PIECE_SIZE: usize = 512;

// ============================================================================
// Dictionary hash index
// ============================================================================

/// Number of buckets in a dictionary hash index (prime numbers spread best)
pub const HASH_BUCKETS: usize = 31;

/// Decoded dictionaries with more key/value pairs than this are not indexed
/// and fall back to a linear scan.
pub const HASH_INDEX_MAX_PAIRS: usize = 64;

// ============================================================================
// Decoder
// ============================================================================

/// Maximum nesting depth of lists and dictionaries accepted by the decoder
pub const MAX_DEPTH: usize = 64;

