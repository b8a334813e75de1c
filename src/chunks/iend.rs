use super::ParseableChunk;
use crate::error::{PngError, Result};

/// Marks the end of the datastream. Always empty.
#[derive(Debug)]
pub(crate) struct IENDChunk;
impl<'a> ParseableChunk<'a> for IENDChunk {
    const HEADER: &'static [u8; 4] = b"IEND";

    fn from_bytes(chunk_data: &'a [u8]) -> Result<Self> {
        if !chunk_data.is_empty() {
            return Err(PngError::CorruptData(format!(
                "IEND carries {} data bytes",
                chunk_data.len()
            )));
        }
        Ok(Self)
    }

    fn data_bytes(&self) -> Vec<u8> {
        Vec::new()
    }
}
