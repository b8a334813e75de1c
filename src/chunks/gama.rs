use nom::{combinator::all_consuming, number::complete::be_u32, IResult};

use super::{ParseableChunk, PNG_UINT_MAX};
use crate::error::{PngError, Result};

/// Gamma values travel as integers scaled by this factor.
pub(crate) const GAMMA_SCALE: f64 = 100_000.0;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct gAMAChunk {
    scaled: u32,
}
impl gAMAChunk {
    /// Returns `None` when `gamma` cannot be stored as a positive fixed-point value.
    pub(crate) fn from_gamma(gamma: f64) -> Option<Self> {
        let scaled = (gamma * GAMMA_SCALE).round();
        if !scaled.is_finite() || scaled < 1.0 || scaled > PNG_UINT_MAX as f64 {
            return None;
        }
        Some(Self {
            scaled: scaled as u32,
        })
    }

    pub(crate) fn gamma(&self) -> f64 {
        self.scaled as f64 / GAMMA_SCALE
    }
}

fn gamma_field(input: &[u8]) -> IResult<&[u8], u32> {
    all_consuming(be_u32)(input)
}

impl<'a> ParseableChunk<'a> for gAMAChunk {
    const HEADER: &'static [u8; 4] = b"gAMA";

    fn from_bytes(chunk_data: &'a [u8]) -> Result<Self> {
        let (_, scaled) = gamma_field(chunk_data)
            .map_err(|_| PngError::CorruptData("gAMA must hold exactly 4 bytes".into()))?;
        if scaled == 0 || scaled > PNG_UINT_MAX {
            return Err(PngError::CorruptData(format!("gAMA value {scaled} out of range")));
        }
        Ok(Self { scaled })
    }

    fn data_bytes(&self) -> Vec<u8> {
        self.scaled.to_be_bytes().to_vec()
    }
}
