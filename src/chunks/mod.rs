use nom::{
    bytes::complete::{tag, take},
    number::complete::be_u32,
    sequence::tuple,
    IResult,
};

use crate::{
    error::{PngError, Result},
    io::{ByteReader, ByteWriter},
};

mod crc;
pub(crate) mod gama;
pub(crate) mod idat;
pub(crate) mod iend;
pub(crate) mod ihdr;
pub(crate) mod plte;
pub(crate) mod text;
pub(crate) mod time;
pub(crate) mod trns;

pub(crate) const SIGNATURE: &[u8; 8] = b"\x89PNG\x0d\x0a\x1a\x0a";

/// Largest value a PNG four-byte unsigned integer may hold.
pub(crate) const PNG_UINT_MAX: u32 = 0x7fff_ffff;

#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug)]
pub(crate) enum Chunk<'a> {
    IHDR(ihdr::IHDRChunk),
    PLTE(plte::PLTEChunk),
    IDAT(idat::IDATChunk<'a>),
    IEND,
    gAMA(gama::gAMAChunk),
    tIME(time::tIMEChunk),
    tRNS(trns::tRNSChunk<'a>),
    Text(text::TextChunk),
    Unknown(RawChunk<'a>),
}

/// A framed chunk whose length and CRC have been checked but whose payload
/// has not been interpreted yet.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawChunk<'a> {
    pub(crate) chunk_type: [u8; 4],
    pub(crate) data: &'a [u8],
}
impl<'a> RawChunk<'a> {
    pub(crate) fn name(&self) -> String {
        String::from_utf8_lossy(&self.chunk_type).into_owned()
    }

    /// Critical chunks have an upper-case first letter.
    pub(crate) fn is_critical(&self) -> bool {
        self.chunk_type[0] & 0x20 == 0
    }

    pub(crate) fn parse(self) -> Result<Chunk<'a>> {
        let chunk = match &self.chunk_type {
            ihdr::IHDRChunk::HEADER => Chunk::IHDR(ihdr::IHDRChunk::from_bytes(self.data)?),
            plte::PLTEChunk::HEADER => Chunk::PLTE(plte::PLTEChunk::from_bytes(self.data)?),
            idat::IDATChunk::HEADER => Chunk::IDAT(idat::IDATChunk::from_bytes(self.data)?),
            iend::IENDChunk::HEADER => {
                iend::IENDChunk::from_bytes(self.data)?;
                Chunk::IEND
            }
            gama::gAMAChunk::HEADER => Chunk::gAMA(gama::gAMAChunk::from_bytes(self.data)?),
            time::tIMEChunk::HEADER => Chunk::tIME(time::tIMEChunk::from_bytes(self.data)?),
            trns::tRNSChunk::HEADER => Chunk::tRNS(trns::tRNSChunk::from_bytes(self.data)?),
            text::TextChunk::HEADER => Chunk::Text(text::TextChunk::from_bytes(self.data)?),
            text::ZTXT_HEADER => Chunk::Text(text::parse_ztxt(self.data)?),
            text::ITXT_HEADER => Chunk::Text(text::parse_itxt(self.data)?),
            _ => Chunk::Unknown(self),
        };
        Ok(chunk)
    }
}

pub(crate) trait ParseableChunk<'a>: Sized {
    const HEADER: &'static [u8; 4];

    fn from_bytes(chunk_data: &'a [u8]) -> Result<Self>;

    /// The chunk's data field, without length, type or CRC.
    fn data_bytes(&self) -> Vec<u8>;

    fn to_bytes(&self) -> Vec<u8> {
        frame_chunk(Self::HEADER, &self.data_bytes())
    }

    fn write_to(&self, writer: &mut ByteWriter) {
        writer.append(&self.to_bytes());
    }
}

/// Wraps `data` in the length, type and CRC fields of a chunk.
pub(crate) fn frame_chunk(chunk_type: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(data.len() + 12);
    bytes.extend((data.len() as u32).to_be_bytes());
    bytes.extend(chunk_type);
    bytes.extend(data);
    bytes.extend(crc::chunk_crc(chunk_type, data).to_be_bytes());
    bytes
}

fn parse_signature(input: &[u8]) -> IResult<&[u8], &[u8]> {
    tag(SIGNATURE)(input)
}

/// Consumes the eight signature bytes, rejecting anything that is not a PNG.
pub(crate) fn read_signature(reader: &mut ByteReader) -> Result<()> {
    let bytes = reader
        .read(SIGNATURE.len())
        .map_err(|_| PngError::InvalidFormat("data too short".into()))?;
    parse_signature(bytes)
        .map_err(|_| PngError::InvalidFormat("invalid PNG signature".into()))?;
    Ok(())
}

pub(crate) fn write_signature(writer: &mut ByteWriter) {
    writer.append(SIGNATURE);
}

fn chunk_frame(input: &[u8]) -> IResult<&[u8], (u32, &[u8])> {
    tuple((be_u32, take(4usize)))(input)
}

fn chunk_body(input: &[u8], length: u32) -> IResult<&[u8], (&[u8], u32)> {
    tuple((take(length), be_u32))(input)
}

fn read_chunk<'a>(reader: &mut ByteReader<'a>) -> Result<RawChunk<'a>> {
    let (rest, (length, chunk_type)) = chunk_frame(reader.remaining())?;
    let chunk_type: [u8; 4] = chunk_type
        .try_into()
        .map_err(|_| PngError::CorruptData("short chunk type".into()))?;
    if length > PNG_UINT_MAX {
        return Err(PngError::CorruptData(format!(
            "{} chunk length {length} out of range",
            String::from_utf8_lossy(&chunk_type)
        )));
    }
    let (rest, (data, claimed)) = chunk_body(rest, length)?;
    let actual = crc::chunk_crc(&chunk_type, data);
    if actual != claimed {
        return Err(PngError::CorruptData(format!(
            "{} chunk CRC mismatch: stored {claimed:08x}, computed {actual:08x}",
            String::from_utf8_lossy(&chunk_type)
        )));
    }
    reader.advance_to(rest);
    Ok(RawChunk { chunk_type, data })
}

pub(crate) fn iter_chunks<'a>(reader: ByteReader<'a>) -> ChunkIter<'a> {
    ChunkIter {
        reader,
        finished: false,
    }
}

pub(crate) struct ChunkIter<'a> {
    reader: ByteReader<'a>,
    finished: bool,
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = Result<RawChunk<'a>>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.reader.is_empty() {
            return None;
        }
        match read_chunk(&mut self.reader) {
            Ok(chunk) => {
                if &chunk.chunk_type == iend::IENDChunk::HEADER {
                    self.finished = true;
                    if !self.reader.is_empty() {
                        log::debug!(
                            "ignoring {} bytes after IEND at offset {}",
                            self.reader.remaining().len(),
                            self.reader.position()
                        );
                    }
                }
                Some(Ok(chunk))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
