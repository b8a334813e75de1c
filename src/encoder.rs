use std::borrow::Cow;

use crate::{
    chunks::{
        gama::gAMAChunk,
        iend::IENDChunk,
        ihdr::{IHDRChunk, InterlaceMethod},
        idat::split_stream,
        time::tIMEChunk,
        write_signature, ParseableChunk, PNG_UINT_MAX,
    },
    config::EncoderConfig,
    error::{alloc_buffer, PngError, Result, Warnings},
    image_data::compress_data,
    io::ByteWriter,
    pixel::convert_row,
    utils::buffer_size,
};

/// A configured encode pipeline for images of one size and layout.
///
/// Configuration is validated once by [`Encoder::new`]; after that every call
/// to [`Encoder::encode`] is independent and leaves the encoder reusable.
#[derive(Debug, Clone)]
pub struct Encoder {
    header: IHDRChunk,
    config: EncoderConfig,
    stride: usize,
    data_size: usize,
}

/// A finished PNG stream plus whatever non-fatal problems came up writing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    bytes: Vec<u8>,
    warnings: Vec<String>,
}
impl Encoded {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

fn check_dimension(name: &str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(PngError::OutOfRange(format!("image {name} is zero")));
    }
    if value > PNG_UINT_MAX {
        return Err(PngError::OutOfRange(format!(
            "image {name} {value} exceeds {PNG_UINT_MAX}"
        )));
    }
    Ok(())
}

impl Encoder {
    pub fn new(width: u32, height: u32, config: EncoderConfig) -> Result<Self> {
        check_dimension("width", width)?;
        check_dimension("height", height)?;
        let min_stride = width as usize * config.pixel_format.channel_count() as usize;
        let stride = match config.stride {
            Some(stride) if stride < min_stride => {
                return Err(PngError::InvalidArgument(format!(
                    "stride {stride} is less than {min_stride} bytes per row"
                )));
            }
            Some(stride) => stride,
            None => min_stride,
        };
        let data_size = buffer_size(stride, height)?;
        let interlace = if config.interlace {
            InterlaceMethod::Adam7
        } else {
            InterlaceMethod::None
        };
        let header = IHDRChunk::new(width, height, config.pixel_format.color_type(), interlace);
        log::debug!(
            "encoder for {width}x{height} {} ({} stride, {data_size} bytes)",
            config.pixel_format,
            stride
        );
        Ok(Self {
            header,
            config,
            stride,
            data_size,
        })
    }

    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Bytes per row of the buffers `encode` accepts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Exact length of the buffers `encode` accepts.
    pub fn data_size(&self) -> usize {
        self.data_size
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn encode(&self, raw: &[u8]) -> Result<Encoded> {
        if raw.len() < self.data_size {
            return Err(PngError::InvalidArgument(format!(
                "image data too short: {} of {} bytes",
                raw.len(),
                self.data_size
            )));
        }
        if raw.len() > self.data_size {
            return Err(PngError::InvalidArgument(format!(
                "image data too large: {} of {} bytes",
                raw.len(),
                self.data_size
            )));
        }
        let mut warnings = Warnings::default();
        let image = self.native_rows(raw)?;
        let compressed = compress_data(&image, &self.header, self.config.compression)?;

        let mut writer = ByteWriter::new();
        write_signature(&mut writer);
        self.header.write_to(&mut writer);
        for entry in &self.config.text {
            entry.to_chunk(&mut warnings).write_to(&mut writer);
        }
        if self.config.time {
            let time = match self.config.timestamp {
                Some(timestamp) => tIMEChunk::from_datetime(timestamp)?,
                None => tIMEChunk::now()?,
            };
            time.write_to(&mut writer);
        }
        if let Some(gamma) = self.config.gamma {
            match gAMAChunk::from_gamma(gamma) {
                Some(chunk) => chunk.write_to(&mut writer),
                None => warnings.push(format!("gamma {gamma} cannot be stored, gAMA omitted")),
            }
        }
        for idat in split_stream(&compressed) {
            idat.write_to(&mut writer);
        }
        IENDChunk.write_to(&mut writer);
        log::debug!("encoded {} bytes", writer.len());

        Ok(Encoded {
            bytes: writer.into_inner(),
            warnings: warnings.into_vec(),
        })
    }

    /// Drops row padding and reorders samples into PNG channel order.
    fn native_rows<'a>(&self, raw: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        let format = self.config.pixel_format;
        let native = format.native();
        let row_bytes = self.header.row_bytes();
        if format == native && self.stride == row_bytes {
            return Ok(Cow::Borrowed(raw));
        }
        let mut image = alloc_buffer(row_bytes * self.header.height as usize)?;
        for (src, dst) in raw
            .chunks_exact(self.stride)
            .zip(image.chunks_exact_mut(row_bytes))
        {
            convert_row(&src[..row_bytes], format, dst, native);
        }
        Ok(Cow::Owned(image))
    }
}
