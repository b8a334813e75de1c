use std::{fmt, str::FromStr};

use crate::{chunks::ihdr::ColorType, error::PngError};

/// A single sample slot within a pixel.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Channel {
    Gray,
    Red,
    Green,
    Blue,
    Alpha,
}

/// Layout of one pixel in a caller-side raw buffer. Every sample is one byte.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
pub enum PixelFormat {
    Gray,
    GrayAlpha,
    AlphaGray,
    #[default]
    Rgb,
    Bgr,
    Rgba,
    Argb,
    Bgra,
    Abgr,
}

const ALIASES: [(&str, PixelFormat); 12] = [
    ("GRAY", PixelFormat::Gray),
    ("GRAYSCALE", PixelFormat::Gray),
    ("GA", PixelFormat::GrayAlpha),
    ("GRAY_ALPHA", PixelFormat::GrayAlpha),
    ("AG", PixelFormat::AlphaGray),
    ("ALPHA_GRAY", PixelFormat::AlphaGray),
    ("RGB", PixelFormat::Rgb),
    ("BGR", PixelFormat::Bgr),
    ("RGBA", PixelFormat::Rgba),
    ("ARGB", PixelFormat::Argb),
    ("BGRA", PixelFormat::Bgra),
    ("ABGR", PixelFormat::Abgr),
];

impl PixelFormat {
    pub const ALL: [PixelFormat; 9] = [
        Self::Gray,
        Self::GrayAlpha,
        Self::AlphaGray,
        Self::Rgb,
        Self::Bgr,
        Self::Rgba,
        Self::Argb,
        Self::Bgra,
        Self::Abgr,
    ];

    /// Looks a format up by name. Matching ignores ASCII case and accepts the
    /// long-form aliases (`GRAYSCALE`, `GRAY_ALPHA`, `ALPHA_GRAY`).
    pub fn resolve(name: &str) -> Result<Self, PngError> {
        ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
            .map(|(_, format)| *format)
            .ok_or_else(|| PngError::InvalidArgument(format!("unknown pixel format {name:?}")))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gray => "GRAY",
            Self::GrayAlpha => "GA",
            Self::AlphaGray => "AG",
            Self::Rgb => "RGB",
            Self::Bgr => "BGR",
            Self::Rgba => "RGBA",
            Self::Argb => "ARGB",
            Self::Bgra => "BGRA",
            Self::Abgr => "ABGR",
        }
    }

    /// Sample order within one pixel, first byte first.
    pub fn channels(&self) -> &'static [Channel] {
        use Channel::*;
        match self {
            Self::Gray => &[Gray],
            Self::GrayAlpha => &[Gray, Alpha],
            Self::AlphaGray => &[Alpha, Gray],
            Self::Rgb => &[Red, Green, Blue],
            Self::Bgr => &[Blue, Green, Red],
            Self::Rgba => &[Red, Green, Blue, Alpha],
            Self::Argb => &[Alpha, Red, Green, Blue],
            Self::Bgra => &[Blue, Green, Red, Alpha],
            Self::Abgr => &[Alpha, Blue, Green, Red],
        }
    }

    pub fn channel_count(&self) -> u8 {
        self.channels().len() as u8
    }

    pub fn has_alpha(&self) -> bool {
        self.alpha_index().is_some()
    }

    pub fn alpha_index(&self) -> Option<usize> {
        self.channels().iter().position(|c| *c == Channel::Alpha)
    }

    pub fn is_color(&self) -> bool {
        !matches!(self, Self::Gray | Self::GrayAlpha | Self::AlphaGray)
    }

    /// The PNG colour type a buffer in this format is stored as.
    pub fn color_type(&self) -> ColorType {
        match (self.is_color(), self.has_alpha()) {
            (false, false) => ColorType::Greyscale,
            (false, true) => ColorType::GreyscaleWithAlpha,
            (true, false) => ColorType::Truecolor,
            (true, true) => ColorType::TruecolorWithAlpha,
        }
    }

    /// The format whose byte order matches PNG scanlines for the same colour type.
    pub fn native(&self) -> PixelFormat {
        Self::from_color_type(self.color_type())
    }

    pub(crate) fn from_color_type(color_type: ColorType) -> PixelFormat {
        match color_type {
            ColorType::Greyscale | ColorType::IndexedColor => Self::Gray,
            ColorType::GreyscaleWithAlpha => Self::GrayAlpha,
            ColorType::Truecolor => Self::Rgb,
            ColorType::TruecolorWithAlpha => Self::Rgba,
        }
    }
}

impl FromStr for PixelFormat {
    type Err = PngError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pixel widened to straight RGBA, used as the pivot for format conversion.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Pixel {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}
impl Pixel {
    pub fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub(crate) fn read(format: PixelFormat, samples: &[u8]) -> Self {
        let mut pixel = Pixel::new(0, 0, 0, u8::MAX);
        for (channel, sample) in format.channels().iter().zip(samples) {
            match channel {
                Channel::Gray => {
                    pixel.red = *sample;
                    pixel.green = *sample;
                    pixel.blue = *sample;
                }
                Channel::Red => pixel.red = *sample,
                Channel::Green => pixel.green = *sample,
                Channel::Blue => pixel.blue = *sample,
                Channel::Alpha => pixel.alpha = *sample,
            }
        }
        pixel
    }

    /// Writes this pixel in `format`. Formats without alpha receive the pixel
    /// composited over black.
    pub(crate) fn write(&self, format: PixelFormat, out: &mut [u8]) {
        let visible = if format.has_alpha() {
            *self
        } else {
            self.over_black()
        };
        for (channel, sample) in format.channels().iter().zip(out.iter_mut()) {
            *sample = match channel {
                Channel::Gray => visible.luma(),
                Channel::Red => visible.red,
                Channel::Green => visible.green,
                Channel::Blue => visible.blue,
                Channel::Alpha => visible.alpha,
            };
        }
    }

    /// Rec. 709 luma with the integer weights libpng uses for rgb-to-gray.
    pub(crate) fn luma(&self) -> u8 {
        if self.red == self.green && self.green == self.blue {
            return self.red;
        }
        let weighted =
            6968 * self.red as u32 + 23434 * self.green as u32 + 2366 * self.blue as u32;
        ((weighted + 16384) >> 15) as u8
    }

    fn over_black(&self) -> Self {
        let scale = |v: u8| ((v as u32 * self.alpha as u32 + 127) / 255) as u8;
        Self::new(scale(self.red), scale(self.green), scale(self.blue), u8::MAX)
    }
}

/// Rewrites a row of `width` pixels from one format into another.
pub(crate) fn convert_row(src: &[u8], from: PixelFormat, dst: &mut [u8], to: PixelFormat) {
    if from == to {
        dst.copy_from_slice(&src[..dst.len()]);
        return;
    }
    let (src_bpp, dst_bpp) = (from.channel_count() as usize, to.channel_count() as usize);
    for (src_px, dst_px) in src.chunks_exact(src_bpp).zip(dst.chunks_exact_mut(dst_bpp)) {
        Pixel::read(from, src_px).write(to, dst_px);
    }
}
