use nom::{
    bytes::complete::{tag, take_until},
    combinator::rest,
    number::complete::u8 as byte,
    sequence::{terminated, tuple},
    IResult,
};

use super::ParseableChunk;
use crate::{
    error::{PngError, Result, Warnings},
    image_data::inflate,
};

pub(crate) const ZTXT_HEADER: &[u8; 4] = b"zTXt";
pub(crate) const ITXT_HEADER: &[u8; 4] = b"iTXt";

/// Longest keyword a text chunk may carry, in bytes.
pub const MAX_KEYWORD_LEN: usize = 79;

/// A decoded text chunk of any of the three kinds, or an uncompressed one
/// about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextChunk {
    pub(crate) keyword: Vec<u8>,
    pub(crate) text: Vec<u8>,
}

fn null_terminated(input: &[u8]) -> IResult<&[u8], &[u8]> {
    terminated(take_until("\0"), tag("\0"))(input)
}

fn check_keyword(keyword: &[u8]) -> Result<()> {
    if keyword.is_empty() || keyword.len() > MAX_KEYWORD_LEN {
        return Err(PngError::CorruptData(format!(
            "text keyword length {} outside 1 to {MAX_KEYWORD_LEN}",
            keyword.len()
        )));
    }
    Ok(())
}

impl<'a> ParseableChunk<'a> for TextChunk {
    const HEADER: &'static [u8; 4] = b"tEXt";

    fn from_bytes(chunk_data: &'a [u8]) -> Result<Self> {
        let (text, keyword) = null_terminated(chunk_data)?;
        check_keyword(keyword)?;
        Ok(TextChunk {
            keyword: keyword.to_vec(),
            text: text.to_vec(),
        })
    }

    fn data_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.keyword.len() + 1 + self.text.len());
        bytes.extend(&self.keyword);
        bytes.push(0);
        bytes.extend(&self.text);
        bytes
    }
}

fn ztxt_fields(input: &[u8]) -> IResult<&[u8], (&[u8], u8, &[u8])> {
    tuple((null_terminated, byte, rest))(input)
}

fn check_compression_method(method: u8) -> Result<()> {
    if method != 0 {
        return Err(PngError::CorruptData(format!(
            "unknown text compression method {method}"
        )));
    }
    Ok(())
}

pub(crate) fn parse_ztxt(chunk_data: &[u8]) -> Result<TextChunk> {
    let (_, (keyword, method, compressed)) = ztxt_fields(chunk_data)?;
    check_keyword(keyword)?;
    check_compression_method(method)?;
    Ok(TextChunk {
        keyword: keyword.to_vec(),
        text: inflate(compressed)?,
    })
}

#[allow(clippy::type_complexity)]
fn itxt_fields(input: &[u8]) -> IResult<&[u8], (&[u8], u8, u8, &[u8], &[u8], &[u8])> {
    tuple((
        null_terminated,
        byte,
        byte,
        null_terminated,
        null_terminated,
        rest,
    ))(input)
}

/// International text. Language tag and translated keyword are skipped.
pub(crate) fn parse_itxt(chunk_data: &[u8]) -> Result<TextChunk> {
    let (_, (keyword, flag, method, _language, _translated, text)) = itxt_fields(chunk_data)?;
    check_keyword(keyword)?;
    let text = match flag {
        0 => text.to_vec(),
        1 => {
            check_compression_method(method)?;
            inflate(text)?
        }
        f => {
            return Err(PngError::CorruptData(format!(
                "invalid iTXt compression flag {f}"
            )))
        }
    };
    Ok(TextChunk {
        keyword: keyword.to_vec(),
        text,
    })
}

/// Turns `my_key` or `MY KEY` into `My Key` / `My key` style keywords:
/// split on underscores, drop empty trailing pieces, capitalise each piece
/// and join with single spaces.
pub(crate) fn normalize_keyword(key: &str) -> String {
    let mut segments: Vec<&str> = key.split('_').collect();
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }
    segments
        .into_iter()
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Keyword as exposed after decoding: lowercase with spaces turned into
/// underscores. Latin-1 is assumed when the bytes are not UTF-8.
pub(crate) fn expose_keyword(keyword: &[u8]) -> String {
    let keyword = match std::str::from_utf8(keyword) {
        Ok(s) => s.to_owned(),
        Err(_) => keyword.iter().map(|&b| b as char).collect(),
    };
    keyword.to_lowercase().replace(' ', "_")
}

fn is_printable_latin1(c: char) -> bool {
    matches!(c as u32, 0x20..=0x7e | 0xa1..=0xff)
}

/// A key/value pair destined for an uncompressed text chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
    keyword: String,
    value: Vec<u8>,
}
impl TextEntry {
    /// Normalises `key` and checks it fits a text chunk keyword.
    pub fn new(key: &str, value: impl Into<Vec<u8>>) -> Result<Self> {
        let keyword = normalize_keyword(key);
        if keyword.is_empty() {
            return Err(PngError::InvalidArgument(format!(
                "text key {key:?} is empty after normalization"
            )));
        }
        if keyword.contains('\0') {
            return Err(PngError::InvalidArgument(format!(
                "text key {key:?} contains a NUL byte"
            )));
        }
        if keyword.len() > MAX_KEYWORD_LEN {
            return Err(PngError::InvalidArgument(format!(
                "text key {key:?} is {} bytes, longer than {MAX_KEYWORD_LEN}",
                keyword.len()
            )));
        }
        Ok(Self {
            keyword,
            value: value.into(),
        })
    }

    /// The normalised keyword, as it will be written.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub(crate) fn to_chunk(&self, warnings: &mut Warnings) -> TextChunk {
        if !self.keyword.chars().all(is_printable_latin1) {
            warnings.push(format!(
                "text keyword {:?} has characters outside printable Latin-1",
                self.keyword
            ));
        }
        let keyword = if self.keyword.chars().all(|c| (c as u32) <= 0xff) {
            self.keyword.chars().map(|c| c as u8).collect()
        } else {
            self.keyword.as_bytes().to_vec()
        };
        TextChunk {
            keyword,
            text: self.value.clone(),
        }
    }
}
