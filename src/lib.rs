//! bentree - arena-backed, zero-copy bencode
//!
//! Bencode is a compact, self-delimiting serialization format for byte
//! strings, integers, lists and dictionaries. This crate decodes and encodes
//! it without copying string data: a decoded tree borrows from the input,
//! and encoding produces scatter-gather segments referencing existing bytes.
//!
//! # Data Types
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Integer | `i<number>e` | `i42e` → 42 |
//! | Byte String | `<length>:<data>` | `4:spam` → "spam" |
//! | List | `l<items>e` | `l4:spami42ee` → ["spam", 42] |
//! | Dictionary | `d<key><value>...e` | `d3:foo3:bare` → {"foo": "bar"} |
//!
//! Dictionaries keep their pairs in insertion order. Keys are neither sorted
//! nor deduplicated; lookups return the first matching pair.
//!
//! # Modules
//!
//! - [`Arena`] - bump allocator owning every item of one or more documents
//! - [`Item`] - traversal and typed access to decoded or built items
//! - [`Arena::decode`] / [`validate`] - parsing and stream framing
//! - [`Arena::segments`] / [`Arena::collapse`] - encoding
//!
//! # Examples
//!
//! ## Decoding
//!
//! ```
//! use bentree::{Arena, ItemKind};
//!
//! let input = b"d3:cow3:moo4:spam4:eggse";
//! let mut arena = Arena::new();
//! let root = arena.decode(input).unwrap();
//!
//! let dict = arena.item(root).unwrap();
//! assert_eq!(dict.kind(), ItemKind::Dictionary);
//! assert_eq!(dict.get_str(b"cow"), Some("moo"));
//! assert_eq!(dict.encoded_len(), input.len());
//! ```
//!
//! ## Building and encoding
//!
//! ```
//! use bentree::Arena;
//!
//! let mut arena = Arena::new();
//! let root = arena.dictionary();
//! arena.dictionary_add_string(root, b"command", b"ping");
//! arena.dictionary_add_integer(root, b"seq", 7);
//! arena.check().unwrap();
//!
//! let root = root.unwrap();
//! let segments = arena.segments(root, 0, 0).unwrap();
//! let mut wire = Vec::new();
//! segments.write_to(&mut wire).unwrap();
//! assert_eq!(wire, b"d7:command4:ping3:seqi7ee");
//! ```
//!
//! # Error Handling
//!
//! Builders and lookups return `Option`: a failed allocation, a missing key
//! or a value of the wrong kind all give `None`, and builders handed `None`
//! do nothing. Allocation failure is sticky, so it is enough to call
//! [`Arena::check`] once after building. Decoding returns a
//! [`BencodeError`]:
//!
//! - [`BencodeError::UnexpectedEof`] - input ended inside a value
//! - [`BencodeError::InvalidInteger`] - leading zeros, `-0`, or overflow
//! - [`BencodeError::UnexpectedChar`] - a byte that cannot appear here
//! - [`BencodeError::NonStringKey`] - a dictionary key that isn't a string
//! - [`BencodeError::NestingTooDeep`] - recursion limit exceeded

pub mod constants;

mod arena;
mod decode;
mod encode;
mod error;
mod index;
mod item;

pub use arena::{Arena, ArenaConfig, Span};
pub use decode::{validate, validate_with_depth, Validity};
pub use encode::Segments;
pub use error::BencodeError;
pub use item::{Children, Item, ItemId, ItemKind, Pairs};
