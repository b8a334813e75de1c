use std::fmt;

use time::OffsetDateTime;

use crate::{
    chunks::text::TextEntry,
    error::{PngError, Result},
    filters::FilterStrategy,
    pixel::PixelFormat,
};

/// zlib effort for the pixel data stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    NoCompression,
    BestSpeed,
    #[default]
    Default,
    BestCompression,
    /// An explicit level from 0 to 9. Larger values are treated as 9.
    Level(u8),
}
impl Compression {
    const PRESETS: [(&'static str, Compression); 4] = [
        ("NO_COMPRESSION", Compression::NoCompression),
        ("BEST_SPEED", Compression::BestSpeed),
        ("BEST_COMPRESSION", Compression::BestCompression),
        ("DEFAULT", Compression::Default),
    ];

    /// Checked constructor for numeric levels.
    pub fn from_level(level: i64) -> Result<Self> {
        match u8::try_from(level) {
            Ok(level) if level <= 9 => Ok(Compression::Level(level)),
            _ => Err(PngError::OutOfRange(format!(
                "compression level {level} outside 0 to 9"
            ))),
        }
    }

    /// Looks up a preset by name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::PRESETS
            .iter()
            .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
            .map(|(_, compression)| *compression)
            .ok_or_else(|| {
                PngError::InvalidArgument(format!("unknown compression preset {name:?}"))
            })
    }

    pub fn level(&self) -> u8 {
        match self {
            Compression::NoCompression => 0,
            Compression::BestSpeed => 1,
            Compression::Default => 6,
            Compression::BestCompression => 9,
            Compression::Level(level) => (*level).min(9),
        }
    }

    pub(crate) fn filter_strategy(&self) -> FilterStrategy {
        if self.level() == 0 {
            FilterStrategy::Unfiltered
        } else {
            FilterStrategy::MinimumSum
        }
    }
}
impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::Level(level) => write!(f, "{level}"),
            preset => {
                let name = Self::PRESETS
                    .iter()
                    .find(|(_, p)| p == preset)
                    .map_or("DEFAULT", |(name, _)| name);
                f.write_str(name)
            }
        }
    }
}

/// Everything an [`Encoder`](crate::Encoder) needs besides the image size.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    /// Layout of the raw buffer handed to `encode`.
    pub pixel_format: PixelFormat,
    pub interlace: bool,
    pub compression: Compression,
    /// Bytes per input row. `None` means rows are tightly packed.
    pub stride: Option<usize>,
    /// Written as uncompressed tEXt chunks, in order.
    pub text: Vec<TextEntry>,
    /// Whether to write a tIME chunk.
    pub time: bool,
    /// Modification time written when `time` is set; now when absent.
    pub timestamp: Option<OffsetDateTime>,
    /// Source gamma for a gAMA chunk. No chunk is written when absent.
    pub gamma: Option<f64>,
}
impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            pixel_format: PixelFormat::Rgb,
            interlace: false,
            compression: Compression::Default,
            stride: None,
            text: Vec::new(),
            time: true,
            timestamp: None,
            gamma: None,
        }
    }
}
impl EncoderConfig {
    pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.pixel_format = pixel_format;
        self
    }

    pub fn with_interlace(mut self, interlace: bool) -> Self {
        self.interlace = interlace;
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = Some(stride);
        self
    }

    /// Adds one text entry, normalising and validating its key.
    pub fn with_text(mut self, key: &str, value: impl Into<Vec<u8>>) -> Result<Self> {
        self.text.push(TextEntry::new(key, value)?);
        Ok(self)
    }

    pub fn with_time(mut self, time: bool) -> Self {
        self.time = time;
        self
    }

    pub fn with_timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.time = true;
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }
}

/// How much of the PNG machinery a decode exposes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiType {
    /// Pixels converted to the requested format, header-level metadata only.
    #[default]
    Simplified,
    /// Pixels in the stream's own layout, every ancillary chunk reported.
    Classic,
}
impl ApiType {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "simplified" => Ok(ApiType::Simplified),
            "classic" => Ok(ApiType::Classic),
            _ => Err(PngError::InvalidArgument(format!("unknown api type {name:?}"))),
        }
    }
}
impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApiType::Simplified => "simplified",
            ApiType::Classic => "classic",
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DecoderConfig {
    /// Output layout for simplified decodes. Classic decodes ignore it.
    pub pixel_format: PixelFormat,
    pub without_meta: bool,
    pub api_type: ApiType,
    /// Target display gamma for classic decodes.
    pub display_gamma: Option<f64>,
}
impl DecoderConfig {
    pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.pixel_format = pixel_format;
        self
    }

    pub fn with_without_meta(mut self, without_meta: bool) -> Self {
        self.without_meta = without_meta;
        self
    }

    pub fn with_api_type(mut self, api_type: ApiType) -> Self {
        self.api_type = api_type;
        self
    }

    /// Requests gamma correction for a display with the given exponent.
    pub fn with_display_gamma(mut self, display_gamma: f64) -> Result<Self> {
        check_display_gamma(display_gamma)?;
        self.display_gamma = Some(display_gamma);
        Ok(self)
    }
}

pub(crate) fn check_display_gamma(gamma: f64) -> Result<()> {
    if !gamma.is_finite() || gamma <= 0.0 {
        return Err(PngError::OutOfRange(format!(
            "display gamma {gamma} must be finite and positive"
        )));
    }
    Ok(())
}
