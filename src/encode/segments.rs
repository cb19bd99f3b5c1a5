use std::io::{self, IoSlice, Write};

use crate::error::BencodeError;

/// Scatter-gather view of an encoded document.
///
/// Holds `head` reserved slots, then the document's segments, then `tail`
/// reserved slots. Reserved slots start out empty and may be filled with the
/// caller's own framing, e.g. a message cookie or a length prefix. Empty
/// slots are skipped when writing.
#[derive(Debug, Clone)]
pub struct Segments<'s> {
    slots: Vec<&'s [u8]>,
    head: usize,
    count: usize,
    len: usize,
}

impl<'s> Segments<'s> {
    pub(crate) fn new(slots: Vec<&'s [u8]>, head: usize, count: usize, len: usize) -> Self {
        Self {
            slots,
            head,
            count,
            len,
        }
    }

    /// Number of segments making up the document itself.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Encoded length of the document, reserved slots excluded.
    pub fn encoded_len(&self) -> usize {
        self.len
    }

    /// Total length of all slots, reserved slots included.
    pub fn total_len(&self) -> usize {
        self.slots.iter().map(|s| s.len()).sum()
    }

    pub fn document(&self) -> &[&'s [u8]] {
        &self.slots[self.head..self.head + self.count]
    }

    pub fn head_mut(&mut self) -> &mut [&'s [u8]] {
        &mut self.slots[..self.head]
    }

    pub fn tail_mut(&mut self) -> &mut [&'s [u8]] {
        &mut self.slots[self.head + self.count..]
    }

    /// Every slot: head reserve, document, tail reserve.
    pub fn slots(&self) -> &[&'s [u8]] {
        &self.slots
    }

    pub fn io_slices(&self) -> Vec<IoSlice<'s>> {
        self.slots
            .iter()
            .copied()
            .filter(|s| !s.is_empty())
            .map(IoSlice::new)
            .collect()
    }

    /// Writes every slot with vectored writes, retrying short writes.
    /// Returns the number of bytes written.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, BencodeError> {
        let mut slices = self.io_slices();
        let mut remaining = &mut slices[..];
        let mut written = 0;

        while !remaining.is_empty() {
            match writer.write_vectored(remaining) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(n) => {
                    written += n;
                    IoSlice::advance_slices(&mut remaining, n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(written)
    }

    /// Concatenates every slot into a new buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        self.slots.concat()
    }
}
