use std::collections::BTreeMap;

use crate::{
    chunks::{
        gama::gAMAChunk,
        ihdr::{ColorType, IHDRChunk},
        iter_chunks,
        plte::PLTEChunk,
        read_signature,
        text::{expose_keyword, TextChunk},
        time::tIMEChunk,
        trns::tRNSChunk,
        Chunk, ChunkIter, RawChunk,
    },
    config::{check_display_gamma, ApiType, DecoderConfig},
    error::{alloc_buffer, PngError, Result, Warnings},
    image_data::decompress_data,
    io::ByteReader,
    meta::Meta,
    pixel::{Channel, Pixel, PixelFormat},
    utils::buffer_size,
};

/// File gamma assumed when a stream carries no gAMA chunk.
pub(crate) const DEFAULT_FILE_GAMMA: f64 = 0.45;

/// Corrections this close to identity are not worth a table pass.
const GAMMA_THRESHOLD: f64 = 0.05;

/// Walks a PNG stream in the order the format requires: signature, IHDR,
/// ancillary chunks, pixel data, trailing chunks, IEND.
struct ChunkReader<'a, State> {
    chunks: ChunkIter<'a>,
    state: State,
}

struct Start;
struct Header {
    header: IHDRChunk,
}
struct Data<'a> {
    header: IHDRChunk,
    ancillary: Ancillary<'a>,
    first_idat: &'a [u8],
}

/// Everything read from a stream apart from the header and pixel data.
#[derive(Default)]
struct Ancillary<'a> {
    palette: Option<PLTEChunk>,
    transparency: Option<tRNSChunk<'a>>,
    gamma: Option<gAMAChunk>,
    time: Option<tIMEChunk>,
    text: Vec<TextChunk>,
}

/// The pieces of a fully read stream, before pixel decoding.
struct Stream<'a> {
    header: IHDRChunk,
    ancillary: Ancillary<'a>,
    compressed: Vec<u8>,
}

impl<'a> ChunkReader<'a, Start> {
    fn new(png: &'a [u8]) -> Result<Self> {
        let mut reader = ByteReader::new(png);
        read_signature(&mut reader)?;
        Ok(Self {
            chunks: iter_chunks(reader),
            state: Start,
        })
    }

    fn read_ihdr(mut self) -> Result<ChunkReader<'a, Header>> {
        let raw = self
            .chunks
            .next()
            .ok_or_else(|| PngError::CorruptData("missing IHDR".into()))??;
        let header = match raw.parse()? {
            Chunk::IHDR(header) => header,
            _ => {
                return Err(PngError::CorruptData(format!(
                    "first chunk is {}, expected IHDR",
                    raw.name()
                )))
            }
        };
        log::debug!(
            "IHDR: {}x{} {} depth {} interlace {}",
            header.width,
            header.height,
            header.color_type,
            header.bit_depth,
            header.interlace_method
        );
        Ok(ChunkReader {
            chunks: self.chunks,
            state: Header { header },
        })
    }
}

impl<'a> ChunkReader<'a, Header> {
    /// Reads up to and including the first IDAT chunk.
    fn read_to_data(mut self, warnings: &mut Warnings) -> Result<ChunkReader<'a, Data<'a>>> {
        let header = self.state.header;
        let mut ancillary = Ancillary::default();
        let first_idat = loop {
            let raw = self.chunks.next().ok_or_else(|| {
                PngError::CorruptData("chunk stream ended before IDAT".into())
            })??;
            match raw.parse_critical()? {
                Some(Chunk::IDAT(idat)) => break idat.data,
                Some(Chunk::IEND) => return Err(PngError::CorruptData("missing IDAT".into())),
                _ => read_ancillary(raw, &header, &mut ancillary, false, warnings)?,
            }
        };
        if header.color_type == ColorType::IndexedColor && ancillary.palette.is_none() {
            return Err(PngError::CorruptData("palette image without PLTE".into()));
        }
        Ok(ChunkReader {
            chunks: self.chunks,
            state: Data {
                header,
                ancillary,
                first_idat,
            },
        })
    }
}

impl<'a> ChunkReader<'a, Data<'a>> {
    /// Gathers the rest of the pixel data and the chunks after it.
    fn read_to_end(mut self, warnings: &mut Warnings) -> Result<Stream<'a>> {
        let Data {
            header,
            mut ancillary,
            first_idat,
        } = self.state;
        let mut compressed = Vec::new();
        compressed.try_reserve(first_idat.len())?;
        compressed.extend_from_slice(first_idat);
        let mut in_data = true;
        let mut idat_count = 1;
        loop {
            let raw = self
                .chunks
                .next()
                .ok_or_else(|| PngError::CorruptData("missing IEND".into()))??;
            match raw.parse_critical()? {
                Some(Chunk::IDAT(idat)) if in_data => {
                    compressed.try_reserve(idat.data.len())?;
                    compressed.extend_from_slice(idat.data);
                    idat_count += 1;
                }
                Some(Chunk::IDAT(_)) => {
                    return Err(PngError::CorruptData("non-consecutive IDAT chunks".into()))
                }
                Some(Chunk::IEND) => break,
                _ => {
                    in_data = false;
                    read_ancillary(raw, &header, &mut ancillary, true, warnings)?;
                }
            }
        }
        log::debug!(
            "read {idat_count} IDAT chunks, {} compressed bytes",
            compressed.len()
        );
        Ok(Stream {
            header,
            ancillary,
            compressed,
        })
    }
}

impl<'a> RawChunk<'a> {
    /// Parses IDAT and IEND, which decide the reader's control flow. Any
    /// other chunk is left for [`read_ancillary`].
    fn parse_critical(&self) -> Result<Option<Chunk<'a>>> {
        match &self.chunk_type {
            b"IDAT" | b"IEND" => self.parse().map(Some),
            _ => Ok(None),
        }
    }
}

fn read_ancillary<'a>(
    raw: RawChunk<'a>,
    header: &IHDRChunk,
    ancillary: &mut Ancillary<'a>,
    after_data: bool,
    warnings: &mut Warnings,
) -> Result<()> {
    let chunk = match raw.parse() {
        Ok(chunk) => chunk,
        Err(e) if raw.is_critical() || matches!(e, PngError::OutOfMemory) => return Err(e),
        Err(e) => {
            warnings.push(format!("{} chunk dropped: {e}", raw.name()));
            return Ok(());
        }
    };
    match chunk {
        Chunk::IHDR(_) => return Err(PngError::CorruptData("duplicate IHDR".into())),
        Chunk::IDAT(_) | Chunk::IEND => {
            return Err(PngError::CorruptData(format!("misplaced {} chunk", raw.name())))
        }
        Chunk::PLTE(_) if after_data => {
            return Err(PngError::CorruptData("PLTE after IDAT".into()))
        }
        Chunk::PLTE(_) if ancillary.palette.is_some() => {
            return Err(PngError::CorruptData("duplicate PLTE".into()))
        }
        Chunk::PLTE(_) if !header.color_type.is_color() => {
            warnings.push(format!("PLTE in {} image ignored", header.color_type));
        }
        Chunk::PLTE(palette) => ancillary.palette = Some(palette),
        Chunk::tRNS(_) if after_data => warnings.push("tRNS after IDAT ignored"),
        Chunk::tRNS(_) if ancillary.transparency.is_some() => {
            warnings.push("duplicate tRNS ignored")
        }
        Chunk::tRNS(trns) => match check_transparency(&trns, header, ancillary.palette.as_ref()) {
            Ok(()) => ancillary.transparency = Some(trns),
            Err(reason) => warnings.push(format!("tRNS dropped: {reason}")),
        },
        Chunk::gAMA(_) if after_data => warnings.push("gAMA after IDAT ignored"),
        Chunk::gAMA(_) if ancillary.gamma.is_some() => warnings.push("duplicate gAMA ignored"),
        Chunk::gAMA(gamma) => ancillary.gamma = Some(gamma),
        Chunk::tIME(_) if ancillary.time.is_some() => warnings.push("duplicate tIME ignored"),
        Chunk::tIME(time) => ancillary.time = Some(time),
        Chunk::Text(text) => ancillary.text.push(text),
        Chunk::Unknown(raw) if raw.is_critical() => {
            return Err(PngError::CorruptData(format!(
                "unknown critical chunk {}",
                raw.name()
            )))
        }
        Chunk::Unknown(raw) => {
            log::debug!("skipping {} chunk ({} bytes)", raw.name(), raw.data.len())
        }
    }
    Ok(())
}

fn check_transparency(
    trns: &tRNSChunk,
    header: &IHDRChunk,
    palette: Option<&PLTEChunk>,
) -> std::result::Result<(), String> {
    let expected = match header.color_type {
        ColorType::Greyscale => 2,
        ColorType::Truecolor => 6,
        ColorType::IndexedColor => {
            let palette = palette.ok_or("appears before PLTE")?;
            if trns.len() > palette.len() {
                return Err(format!(
                    "{} entries for a palette of {}",
                    trns.len(),
                    palette.len()
                ));
            }
            return Ok(());
        }
        other => return Err(format!("not allowed in {other} images")),
    };
    if trns.len() != expected {
        return Err(format!("length {} instead of {expected}", trns.len()));
    }
    Ok(())
}

/// Options resolved once per decoder; each variant carries only what its
/// pipeline reads.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DecodeMode {
    Simplified {
        pixel_format: PixelFormat,
        without_meta: bool,
    },
    Classic {
        without_meta: bool,
        display_gamma: Option<f64>,
    },
}
impl DecodeMode {
    fn from_config(config: &DecoderConfig) -> Result<Self> {
        Ok(match config.api_type {
            ApiType::Simplified => DecodeMode::Simplified {
                pixel_format: config.pixel_format,
                without_meta: config.without_meta,
            },
            ApiType::Classic => {
                if let Some(gamma) = config.display_gamma {
                    check_display_gamma(gamma)?;
                }
                DecodeMode::Classic {
                    without_meta: config.without_meta,
                    display_gamma: config.display_gamma,
                }
            }
        })
    }
}

/// Pixels and metadata produced by [`Decoder::decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    data: Vec<u8>,
    meta: Option<Meta>,
    warnings: Vec<String>,
}
impl DecodedImage {
    /// Row-major pixel rows with no padding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// `None` when the decoder was configured `without_meta`.
    pub fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// A configured decode pipeline. Holds no per-stream state, so a failed
/// decode leaves it ready for the next input.
#[derive(Debug, Clone)]
pub struct Decoder {
    config: DecoderConfig,
    mode: DecodeMode,
}
impl Decoder {
    pub fn new(config: DecoderConfig) -> Result<Self> {
        let mode = DecodeMode::from_config(&config)?;
        Ok(Self { config, mode })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Reads metadata without touching pixel data. Whatever the API type,
    /// the record describes the stream itself: its colour type, native row
    /// layout and the text, time and gamma chunks placed before the first
    /// IDAT. Chunks after the image are not reached. Warnings met on the way
    /// are on [`Meta::warnings`].
    pub fn read_header(&self, png: &[u8]) -> Result<Meta> {
        let mut warnings = Warnings::default();
        let reader = ChunkReader::new(png)?
            .read_ihdr()?
            .read_to_data(&mut warnings)?;
        let Data {
            header, ancillary, ..
        } = reader.state;
        let meta = classic_meta(&header, &ancillary, &mut warnings);
        Ok(meta.with_warnings(warnings.into_vec()))
    }

    pub fn decode(&self, png: &[u8]) -> Result<DecodedImage> {
        let mut warnings = Warnings::default();
        let Stream {
            header,
            ancillary,
            compressed,
        } = ChunkReader::new(png)?
            .read_ihdr()?
            .read_to_data(&mut warnings)?
            .read_to_end(&mut warnings)?;
        let image = decompress_data(&compressed, &header, &mut warnings)?;
        let (data, meta) = match self.mode {
            DecodeMode::Simplified {
                pixel_format,
                without_meta,
            } => {
                let data = convert_image(&image, &header, &ancillary, pixel_format)?;
                let meta = (!without_meta).then(|| Meta::simplified(&header, pixel_format));
                (data, meta)
            }
            DecodeMode::Classic {
                without_meta,
                display_gamma,
            } => {
                let mut image = image;
                if let Some(palette) = &ancillary.palette {
                    if header.color_type == ColorType::IndexedColor {
                        check_palette_indices(&image, palette)?;
                    }
                }
                if let Some(display_gamma) = display_gamma {
                    let file_gamma = ancillary.gamma.map_or(DEFAULT_FILE_GAMMA, |g| g.gamma());
                    correct_gamma(&mut image, &header, file_gamma, display_gamma);
                }
                let meta =
                    (!without_meta).then(|| classic_meta(&header, &ancillary, &mut warnings));
                (image, meta)
            }
        };
        let warnings = warnings.into_vec();
        Ok(DecodedImage {
            data,
            meta: meta.map(|meta| meta.with_warnings(warnings.clone())),
            warnings,
        })
    }
}

fn classic_meta(header: &IHDRChunk, ancillary: &Ancillary, warnings: &mut Warnings) -> Meta {
    let text = (!ancillary.text.is_empty()).then(|| {
        ancillary
            .text
            .iter()
            .map(|chunk| (expose_keyword(&chunk.keyword), chunk.text.clone()))
            .collect::<BTreeMap<_, _>>()
    });
    let time = ancillary.time.and_then(|time| match time.to_local() {
        Ok(time) => Some(time),
        Err(e) => {
            warnings.push(format!("tIME dropped: {e}"));
            None
        }
    });
    Meta::classic(header).with_ancillary(text, time, ancillary.gamma.map(|g| g.gamma()))
}

fn check_palette_indices(image: &[u8], palette: &PLTEChunk) -> Result<()> {
    match image.iter().find(|&&index| palette.get_color(index).is_none()) {
        Some(index) => Err(PngError::CorruptData(format!(
            "palette index {index} out of range for {} entries",
            palette.len()
        ))),
        None => Ok(()),
    }
}

/// 256-entry lookup for raising normalised samples to `exponent`.
fn gamma_table(exponent: f64) -> [u8; 256] {
    std::array::from_fn(|i| ((i as f64 / 255.0).powf(exponent) * 255.0).round() as u8)
}

fn correct_gamma(image: &mut [u8], header: &IHDRChunk, file_gamma: f64, display_gamma: f64) {
    let product = file_gamma * display_gamma;
    if header.color_type == ColorType::IndexedColor || (product - 1.0).abs() < GAMMA_THRESHOLD {
        return;
    }
    log::debug!("gamma correction: file {file_gamma}, display {display_gamma}");
    let table = gamma_table(1.0 / product);
    let channels = PixelFormat::from_color_type(header.color_type).channels();
    for pixel in image.chunks_exact_mut(channels.len()) {
        for (sample, channel) in pixel.iter_mut().zip(channels) {
            if *channel != Channel::Alpha {
                *sample = table[*sample as usize];
            }
        }
    }
}

/// Colour made fully transparent by a gray or RGB tRNS chunk.
fn color_key(header: &IHDRChunk, trns: Option<&tRNSChunk>) -> Option<[u16; 3]> {
    let trns = trns?;
    match header.color_type {
        ColorType::Greyscale => trns.as_greyscale().map(|g| [g; 3]),
        ColorType::Truecolor => trns.as_truecolor().map(|(r, g, b)| [r, g, b]),
        _ => None,
    }
}

/// Converts native rows into `format`, expanding palettes and applying
/// transparency on the way.
fn convert_image(
    image: &[u8],
    header: &IHDRChunk,
    ancillary: &Ancillary,
    format: PixelFormat,
) -> Result<Vec<u8>> {
    let native = PixelFormat::from_color_type(header.color_type);
    let out_bpp = format.channel_count() as usize;
    let mut out = alloc_buffer(buffer_size(
        header.width as usize * out_bpp,
        header.height,
    )?)?;
    let key = if format.has_alpha() {
        color_key(header, ancillary.transparency.as_ref())
    } else {
        None
    };
    let palette = match header.color_type {
        ColorType::IndexedColor => ancillary.palette.as_ref(),
        _ => None,
    };
    let pixels = image
        .chunks_exact(header.filter_width())
        .zip(out.chunks_exact_mut(out_bpp));
    for (src, dst) in pixels {
        let pixel = match palette {
            Some(palette) => {
                let index = src[0];
                let entry = palette.get_color(index).ok_or_else(|| {
                    PngError::CorruptData(format!(
                        "palette index {index} out of range for {} entries",
                        palette.len()
                    ))
                })?;
                let alpha = ancillary
                    .transparency
                    .as_ref()
                    .map_or(u8::MAX, |trns| trns.as_palette(index));
                Pixel::new(entry.0, entry.1, entry.2, alpha)
            }
            None => {
                let mut pixel = Pixel::read(native, src);
                let rgb = [pixel.red, pixel.green, pixel.blue].map(u16::from);
                if key == Some(rgb) {
                    pixel.alpha = 0;
                }
                pixel
            }
        };
        pixel.write(format, dst);
    }
    Ok(out)
}
