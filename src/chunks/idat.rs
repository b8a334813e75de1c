use super::ParseableChunk;
use crate::error::Result;

/// Largest data field written per IDAT chunk.
pub(crate) const MAX_IDAT_SIZE: usize = 8192;

/// One slice of the zlib stream. Consecutive IDAT chunks are concatenated
/// before inflating.
#[derive(Debug)]
pub(crate) struct IDATChunk<'a> {
    pub(crate) data: &'a [u8],
}
impl<'a> ParseableChunk<'a> for IDATChunk<'a> {
    const HEADER: &'static [u8; 4] = b"IDAT";

    fn from_bytes(chunk_data: &'a [u8]) -> Result<Self> {
        Ok(IDATChunk { data: chunk_data })
    }

    fn data_bytes(&self) -> Vec<u8> {
        self.data.to_vec()
    }
}

/// Splits a compressed stream into IDAT chunks of at most [`MAX_IDAT_SIZE`] bytes.
pub(crate) fn split_stream(stream: &[u8]) -> impl Iterator<Item = IDATChunk<'_>> {
    stream
        .chunks(MAX_IDAT_SIZE)
        .map(|data| IDATChunk { data })
}
