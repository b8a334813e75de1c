//! In-memory PNG encoding and decoding.
//!
//! Whole buffers go in and whole buffers come out: an [`Encoder`] turns raw
//! 8-bit pixel rows into a PNG stream and a [`Decoder`] turns a PNG stream
//! back into pixel rows plus a [`Meta`] record.

use std::path::Path;

mod chunks;
mod config;
mod decoder;
mod encoder;
mod error;
mod filters;
mod image_data;
mod interlacing;
mod io;
mod meta;
pub mod options;
mod pixel;
mod utils;

pub use chunks::{
    ihdr::{ColorType, CompressionMethod, FilterMethod, InterlaceMethod},
    text::{TextEntry, MAX_KEYWORD_LEN},
};
pub use config::{ApiType, Compression, DecoderConfig, EncoderConfig};
pub use decoder::{DecodedImage, Decoder};
pub use encoder::{Encoded, Encoder};
pub use error::{PngError, Result};
pub use meta::{HeaderDetails, Meta};
pub use pixel::{Channel, Pixel, PixelFormat};

/// Encodes one image with a throwaway [`Encoder`].
pub fn encode(width: u32, height: u32, raw: &[u8], config: EncoderConfig) -> Result<Encoded> {
    Encoder::new(width, height, config)?.encode(raw)
}

/// Decodes one image with a throwaway [`Decoder`].
pub fn decode(png: &[u8], config: DecoderConfig) -> Result<DecodedImage> {
    Decoder::new(config)?.decode(png)
}

/// Reads the header of a PNG stream with the default settings.
pub fn read_header(png: &[u8]) -> Result<Meta> {
    Decoder::new(DecoderConfig::default())?.read_header(png)
}

/// Decodes the PNG file at `path`.
pub fn decode_file(path: impl AsRef<Path>, config: DecoderConfig) -> Result<DecodedImage> {
    let png = std::fs::read(path)?;
    decode(&png, config)
}

/// Encodes the raw pixel rows stored in the file at `path`.
pub fn encode_file(
    width: u32,
    height: u32,
    path: impl AsRef<Path>,
    config: EncoderConfig,
) -> Result<Encoded> {
    let raw = std::fs::read(path)?;
    encode(width, height, &raw, config)
}
