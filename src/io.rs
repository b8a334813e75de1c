use crate::error::{PngError, Result};

/// Sequential, bounds-checked reads over an in-memory PNG stream.
#[derive(Debug, Clone)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}
impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Takes the next `n` bytes, failing without moving if fewer remain.
    pub(crate) fn read(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining().len() < n {
            return Err(PngError::CorruptData(format!(
                "data not enough: wanted {n} bytes at offset {}, {} left",
                self.pos,
                self.remaining().len()
            )));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub(crate) fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining().is_empty()
    }

    /// Moves the cursor past bytes a parser consumed from [`Self::remaining`].
    pub(crate) fn advance_to(&mut self, rest: &'a [u8]) {
        debug_assert!(rest.len() <= self.remaining().len());
        self.pos = self.data.len() - rest.len();
    }
}

/// Growable output buffer. Everything is held in memory until the caller
/// takes the finished stream.
#[derive(Debug, Default)]
pub(crate) struct ByteWriter {
    buf: Vec<u8>,
}
impl ByteWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
