use super::ParseableChunk;
use crate::error::Result;

/// Transparency information. How the bytes read depends on the image's
/// colour type, so interpretation is deferred to the accessors.
#[allow(non_camel_case_types)]
#[derive(Debug)]
pub(crate) struct tRNSChunk<'a> {
    inner: &'a [u8],
}
impl<'a> tRNSChunk<'a> {
    fn sample(&self, index: usize) -> Option<u16> {
        let bytes = self.inner.get(index * 2..index * 2 + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Grey level that is fully transparent.
    pub(crate) fn as_greyscale(&self) -> Option<u16> {
        self.sample(0)
    }

    /// RGB value that is fully transparent.
    pub(crate) fn as_truecolor(&self) -> Option<(u16, u16, u16)> {
        Some((self.sample(0)?, self.sample(1)?, self.sample(2)?))
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }

    /// Alpha of palette entry `index`; entries past the end are opaque.
    pub(crate) fn as_palette(&self, index: u8) -> u8 {
        *self.inner.get(index as usize).unwrap_or(&255)
    }
}
impl<'a> ParseableChunk<'a> for tRNSChunk<'a> {
    const HEADER: &'static [u8; 4] = b"tRNS";

    fn from_bytes(chunk_data: &'a [u8]) -> Result<Self> {
        Ok(tRNSChunk { inner: chunk_data })
    }

    fn data_bytes(&self) -> Vec<u8> {
        self.inner.to_vec()
    }
}
