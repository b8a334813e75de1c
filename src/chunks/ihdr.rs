use std::fmt;

use nom::{bytes::complete::take, number::complete::be_u32, sequence::tuple, IResult};

use super::{ParseableChunk, PNG_UINT_MAX};
use crate::error::{PngError, Result};

/// The only sample depth this codec reads and writes.
pub(crate) const BIT_DEPTH: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IHDRChunk {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub compression_method: CompressionMethod,
    pub filter_method: FilterMethod,
    pub interlace_method: InterlaceMethod,
}
impl IHDRChunk {
    pub(crate) fn new(
        width: u32,
        height: u32,
        color_type: ColorType,
        interlace_method: InterlaceMethod,
    ) -> Self {
        Self {
            width,
            height,
            bit_depth: BIT_DEPTH,
            color_type,
            compression_method: CompressionMethod::Base,
            filter_method: FilterMethod::Base,
            interlace_method,
        }
    }

    /// Bytes per complete pixel, which is also the filter distance at depth 8.
    pub(crate) fn filter_width(&self) -> usize {
        self.color_type.channel_count() as usize
    }

    /// Unfiltered bytes in one full-width row.
    pub(crate) fn row_bytes(&self) -> usize {
        self.width as usize * self.filter_width()
    }

    pub(crate) fn is_interlaced(&self) -> bool {
        self.interlace_method == InterlaceMethod::Adam7
    }
}

fn header_fields(input: &[u8]) -> IResult<&[u8], (u32, u32, &[u8])> {
    tuple((be_u32, be_u32, take(5usize)))(input)
}

impl<'a> ParseableChunk<'a> for IHDRChunk {
    const HEADER: &'static [u8; 4] = b"IHDR";

    fn from_bytes(chunk_data: &'a [u8]) -> Result<Self> {
        if chunk_data.len() != 13 {
            return Err(PngError::CorruptData(format!(
                "IHDR has length {}, expected 13",
                chunk_data.len()
            )));
        }
        let (_, (width, height, other_bytes)) = header_fields(chunk_data)?;
        for (name, value) in [("width", width), ("height", height)] {
            if value == 0 {
                return Err(PngError::CorruptData(format!("image {name} is zero")));
            }
            if value > PNG_UINT_MAX {
                return Err(PngError::CorruptData(format!(
                    "image {name} {value} exceeds the PNG limit"
                )));
            }
        }
        let bit_depth = other_bytes[0];
        let color_type = ColorType::try_from(other_bytes[1])?;
        if !color_type.allowed_bit_depths().contains(&bit_depth) {
            return Err(PngError::CorruptData(format!(
                "bit depth {bit_depth} is invalid for {color_type} images"
            )));
        }
        if bit_depth != BIT_DEPTH {
            return Err(PngError::Unsupported(format!("bit depth {bit_depth}")));
        }
        Ok(IHDRChunk {
            width,
            height,
            bit_depth,
            color_type,
            compression_method: CompressionMethod::try_from(other_bytes[2])?,
            filter_method: FilterMethod::try_from(other_bytes[3])?,
            interlace_method: InterlaceMethod::try_from(other_bytes[4])?,
        })
    }

    fn data_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(13);
        bytes.extend(&self.width.to_be_bytes());
        bytes.extend(&self.height.to_be_bytes());
        bytes.extend(&[
            self.bit_depth,
            self.color_type as u8,
            self.compression_method as u8,
            self.filter_method as u8,
            self.interlace_method as u8,
        ]);
        bytes
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorType {
    #[default]
    Greyscale = 0,
    Truecolor = 2,
    IndexedColor = 3,
    GreyscaleWithAlpha = 4,
    TruecolorWithAlpha = 6,
}
impl TryFrom<u8> for ColorType {
    type Error = PngError;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Greyscale),
            2 => Ok(Self::Truecolor),
            3 => Ok(Self::IndexedColor),
            4 => Ok(Self::GreyscaleWithAlpha),
            6 => Ok(Self::TruecolorWithAlpha),
            i => Err(PngError::CorruptData(format!("invalid color type {i}"))),
        }
    }
}
impl ColorType {
    pub fn channel_count(&self) -> u8 {
        match self {
            Self::Greyscale => 1,
            Self::IndexedColor => 1,
            Self::GreyscaleWithAlpha => 2,
            Self::Truecolor => 3,
            Self::TruecolorWithAlpha => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Greyscale => "GRAY",
            Self::IndexedColor => "PALETTE",
            Self::GreyscaleWithAlpha => "GA",
            Self::Truecolor => "RGB",
            Self::TruecolorWithAlpha => "RGBA",
        }
    }

    pub(crate) fn is_color(&self) -> bool {
        matches!(
            self,
            Self::Truecolor | Self::IndexedColor | Self::TruecolorWithAlpha
        )
    }

    fn allowed_bit_depths(&self) -> &'static [u8] {
        match self {
            Self::Greyscale => &[1, 2, 4, 8, 16],
            Self::IndexedColor => &[1, 2, 4, 8],
            Self::Truecolor | Self::GreyscaleWithAlpha | Self::TruecolorWithAlpha => &[8, 16],
        }
    }
}
impl fmt::Display for ColorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterlaceMethod {
    #[default]
    None = 0,
    Adam7 = 1,
}
impl TryFrom<u8> for InterlaceMethod {
    type Error = PngError;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Adam7),
            i => Err(PngError::CorruptData(format!("unknown interlace method {i}"))),
        }
    }
}
impl fmt::Display for InterlaceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "NONE",
            Self::Adam7 => "ADAM7",
        })
    }
}

/// Zlib deflate, the single compression method PNG defines.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    #[default]
    Base = 0,
}
impl TryFrom<u8> for CompressionMethod {
    type Error = PngError;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Base),
            i => Err(PngError::CorruptData(format!("unknown compression method {i}"))),
        }
    }
}
impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BASE")
    }
}

/// Adaptive filtering with the five basic filter types.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMethod {
    #[default]
    Base = 0,
}
impl TryFrom<u8> for FilterMethod {
    type Error = PngError;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Base),
            i => Err(PngError::CorruptData(format!("unknown filter method {i}"))),
        }
    }
}
impl fmt::Display for FilterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BASE")
    }
}
