use miniz_oxide::{
    deflate::core::{
        compress, create_comp_flags_from_zip_params, CompressorOxide, TDEFLFlush, TDEFLStatus,
    },
    inflate::decompress_to_vec_zlib,
};

use crate::{
    chunks::ihdr::IHDRChunk,
    config::Compression,
    error::{alloc_buffer, PngError, Result, Warnings},
    filters::{filter_scanlines, reconstruct_scanlines},
    interlacing::{gather, scatter, sub_images},
};

/// zlib window size used for every stream this crate writes.
const WINDOW_BITS: i32 = 15;

/// Compresses `data` into a zlib stream at `level` (0 to 9).
pub(crate) fn deflate(data: &[u8], level: u8) -> Result<Vec<u8>> {
    let flags = create_comp_flags_from_zip_params(level.into(), WINDOW_BITS, 0);
    let mut compressor = CompressorOxide::new(flags);
    let mut output = vec![0; usize::max(data.len() / 2, 64)];
    let (mut in_pos, mut out_pos) = (0, 0);
    loop {
        let (status, bytes_in, bytes_out) = compress(
            &mut compressor,
            &data[in_pos..],
            &mut output[out_pos..],
            TDEFLFlush::Finish,
        );
        in_pos += bytes_in;
        out_pos += bytes_out;
        match status {
            TDEFLStatus::Done => {
                output.truncate(out_pos);
                return Ok(output);
            }
            TDEFLStatus::Okay => {
                if output.len() - out_pos < 30 {
                    output.try_reserve(output.len())?;
                    output.resize(output.len() * 2, 0);
                }
            }
            status => {
                return Err(PngError::Encode(format!("deflate failed: {status:?}")));
            }
        }
    }
}

/// Expands a zlib stream.
pub(crate) fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    decompress_to_vec_zlib(data)
        .map_err(|e| PngError::Decode(format!("inflate failed: {:?}", e.status)))
}

/// Filters and compresses a whole image given as tightly packed native rows.
pub(crate) fn compress_data(
    image: &[u8],
    header: &IHDRChunk,
    compression: Compression,
) -> Result<Vec<u8>> {
    let bpp = header.filter_width();
    let strategy = compression.filter_strategy();
    let subs = sub_images(
        header.width as usize,
        header.height as usize,
        header.is_interlaced(),
    );
    let mut filtered = Vec::new();
    filtered.try_reserve_exact(subs.iter().map(|s| s.filtered_len(bpp)).sum())?;
    for sub in subs {
        log::debug!("filtering pass {} ({}x{})", sub.pass, sub.width, sub.height);
        let row_len = sub.width * bpp;
        if sub.pass == 0 {
            filter_scanlines(image, row_len, bpp, strategy, &mut filtered);
        } else {
            let mut packed = Vec::with_capacity(row_len * sub.height);
            gather(image, sub, bpp, &mut packed);
            filter_scanlines(&packed, row_len, bpp, strategy, &mut filtered);
        }
    }
    let compressed = deflate(&filtered, compression.level())?;
    log::debug!(
        "compressed {} filtered bytes to {} at level {}",
        filtered.len(),
        compressed.len(),
        compression.level()
    );
    Ok(compressed)
}

/// Inflates, unfilters and de-interlaces pixel data into tightly packed
/// native rows.
pub(crate) fn decompress_data(
    compressed_data: &[u8],
    header: &IHDRChunk,
    warnings: &mut Warnings,
) -> Result<Vec<u8>> {
    let mut data = inflate(compressed_data)?;
    let bpp = header.filter_width();
    let subs = sub_images(
        header.width as usize,
        header.height as usize,
        header.is_interlaced(),
    );
    let expected: usize = subs.iter().map(|s| s.filtered_len(bpp)).sum();
    if data.len() < expected {
        return Err(PngError::CorruptData(format!(
            "not enough image data: {} of {expected} bytes",
            data.len()
        )));
    }
    if data.len() > expected {
        warnings.push(format!(
            "extra compressed data: {} bytes past the last scanline",
            data.len() - expected
        ));
        data.truncate(expected);
    }

    let mut image = alloc_buffer(header.row_bytes() * header.height as usize)?;
    let mut offset = 0;
    for sub in subs {
        let len = sub.filtered_len(bpp);
        let row_len = sub.width * bpp;
        let scanlines = &mut data[offset..offset + len];
        reconstruct_scanlines(scanlines, row_len, bpp)?;
        let rows = scanlines.chunks_exact(row_len + 1).map(|r| &r[1..]);
        if sub.pass == 0 {
            for (dst, src) in image.chunks_exact_mut(row_len).zip(rows) {
                dst.copy_from_slice(src);
            }
        } else {
            scatter(rows.flatten().copied(), sub, bpp, &mut image);
        }
        offset += len;
    }
    Ok(image)
}
