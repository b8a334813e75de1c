use std::collections::BTreeMap;

use time::OffsetDateTime;

use crate::{
    chunks::ihdr::{ColorType, CompressionMethod, FilterMethod, IHDRChunk, InterlaceMethod},
    pixel::PixelFormat,
};

/// Header fields reported by classic decodes and `read_header`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderDetails {
    pub color_type: ColorType,
    pub interlace_method: InterlaceMethod,
    pub compression_method: CompressionMethod,
    pub filter_method: FilterMethod,
}
impl From<&IHDRChunk> for HeaderDetails {
    fn from(header: &IHDRChunk) -> Self {
        Self {
            color_type: header.color_type,
            interlace_method: header.interlace_method,
            compression_method: header.compression_method,
            filter_method: header.filter_method,
        }
    }
}

/// What a decode learned about an image. Built once, never changed.
///
/// Simplified decodes fill in the size, layout and pixel format of the
/// output buffer. Classic decodes and `read_header` describe the stream
/// itself: header details, native layout and whichever of text, time and
/// gamma it carried.
#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    width: u32,
    height: u32,
    stride: usize,
    bit_depth: u8,
    pixel_format: PixelFormat,
    details: Option<HeaderDetails>,
    text: Option<BTreeMap<String, Vec<u8>>>,
    time: Option<OffsetDateTime>,
    file_gamma: Option<f64>,
    warnings: Vec<String>,
}
impl Meta {
    pub(crate) fn simplified(header: &IHDRChunk, pixel_format: PixelFormat) -> Self {
        Self {
            width: header.width,
            height: header.height,
            stride: header.width as usize * pixel_format.channel_count() as usize,
            bit_depth: header.bit_depth,
            pixel_format,
            details: None,
            text: None,
            time: None,
            file_gamma: None,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn classic(header: &IHDRChunk) -> Self {
        Self {
            width: header.width,
            height: header.height,
            stride: header.row_bytes(),
            bit_depth: header.bit_depth,
            pixel_format: PixelFormat::from_color_type(header.color_type),
            details: Some(header.into()),
            text: None,
            time: None,
            file_gamma: None,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn with_ancillary(
        mut self,
        text: Option<BTreeMap<String, Vec<u8>>>,
        time: Option<OffsetDateTime>,
        file_gamma: Option<f64>,
    ) -> Self {
        self.text = text;
        self.time = time;
        self.file_gamma = file_gamma;
        self
    }

    pub(crate) fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row of the decoded buffer.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    /// Layout of the decoded buffer. For classic decodes this is the stream's
    /// own sample order, and palette images report one index per pixel as
    /// [`PixelFormat::Gray`].
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    pub fn channel_count(&self) -> u8 {
        self.pixel_format.channel_count()
    }

    pub fn details(&self) -> Option<&HeaderDetails> {
        self.details.as_ref()
    }

    pub fn color_type(&self) -> Option<ColorType> {
        self.details.map(|d| d.color_type)
    }

    pub fn interlace_method(&self) -> Option<InterlaceMethod> {
        self.details.map(|d| d.interlace_method)
    }

    pub fn compression_method(&self) -> Option<CompressionMethod> {
        self.details.map(|d| d.compression_method)
    }

    pub fn filter_method(&self) -> Option<FilterMethod> {
        self.details.map(|d| d.filter_method)
    }

    /// Text chunks keyed by lower-snake-case keyword. Later chunks win when
    /// keywords repeat.
    pub fn text(&self) -> Option<&BTreeMap<String, Vec<u8>>> {
        self.text.as_ref()
    }

    /// Last modification time, in the local offset when it is known.
    pub fn time(&self) -> Option<OffsetDateTime> {
        self.time
    }

    pub fn file_gamma(&self) -> Option<f64> {
        self.file_gamma
    }

    /// Non-fatal problems met by the call that built this record. After a
    /// decode these match [`crate::DecodedImage::warnings`].
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
