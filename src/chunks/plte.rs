use nom::{bytes::complete::take, combinator::map, multi::count, IResult};

use super::ParseableChunk;
use crate::error::{PngError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Entry(pub u8, pub u8, pub u8);

#[derive(Debug)]
pub(crate) struct PLTEChunk {
    colors: Vec<Entry>,
}
impl PLTEChunk {
    pub(crate) fn get_color(&self, index: u8) -> Option<&Entry> {
        self.colors.get(index as usize)
    }

    pub(crate) fn len(&self) -> usize {
        self.colors.len()
    }
}

fn entries(input: &[u8], entry_count: usize) -> IResult<&[u8], Vec<Entry>> {
    count(
        map(take(3usize), |i: &[u8]| Entry(i[0], i[1], i[2])),
        entry_count,
    )(input)
}

impl<'a> ParseableChunk<'a> for PLTEChunk {
    const HEADER: &'static [u8; 4] = b"PLTE";

    fn from_bytes(chunk_data: &'a [u8]) -> Result<Self> {
        let entry_count = chunk_data.len() / 3;
        if chunk_data.len() % 3 != 0 || !(1..=256).contains(&entry_count) {
            return Err(PngError::CorruptData(format!(
                "PLTE length {} is not 1 to 256 RGB entries",
                chunk_data.len()
            )));
        }
        let (_, colors) = entries(chunk_data, entry_count)?;
        Ok(PLTEChunk { colors })
    }

    fn data_bytes(&self) -> Vec<u8> {
        self.colors
            .iter()
            .flat_map(|Entry(r, g, b)| [*r, *g, *b])
            .collect()
    }
}
