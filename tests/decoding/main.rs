use mempng::{
    options::OptionValue, ApiType, ColorType, Decoder, DecoderConfig, EncoderConfig,
    InterlaceMethod, PngError, PixelFormat,
};

fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &byte in bytes {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xedb8_8320
            } else {
                crc >> 1
            };
        }
    }
    !crc
}

fn chunk(chunk_type: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut bytes = (data.len() as u32).to_be_bytes().to_vec();
    bytes.extend(chunk_type);
    bytes.extend(data);
    let mut crc_input = chunk_type.to_vec();
    crc_input.extend(data);
    bytes.extend(crc32(&crc_input).to_be_bytes());
    bytes
}

/// Inserts `chunks` just before IEND.
fn splice_before_iend(png: &[u8], chunks: &[Vec<u8>]) -> Vec<u8> {
    let (body, iend) = png.split_at(png.len() - 12);
    let mut out = body.to_vec();
    for chunk in chunks {
        out.extend(chunk);
    }
    out.extend(iend);
    out
}

fn encode(width: u32, height: u32, raw: &[u8], config: EncoderConfig) -> Vec<u8> {
    mempng::encode(width, height, raw, config)
        .unwrap()
        .into_bytes()
}

fn simplified(format: PixelFormat) -> Decoder {
    Decoder::new(DecoderConfig::default().with_pixel_format(format)).unwrap()
}

fn classic() -> Decoder {
    Decoder::new(DecoderConfig::default().with_api_type(ApiType::Classic)).unwrap()
}

#[test]
fn signature_gate() {
    for input in [&b"GIF89a0123456789"[..], &b"\x89PNG"[..], &b""[..]] {
        assert!(matches!(
            classic().decode(input),
            Err(PngError::InvalidFormat(_))
        ));
        assert!(matches!(
            mempng::read_header(input),
            Err(PngError::InvalidFormat(_))
        ));
    }
}

#[test]
fn truncated_input_then_reuse() {
    let png = encode(8, 8, &[128; 192], EncoderConfig::default());
    let decoder = classic();
    assert!(matches!(
        decoder.decode(&png[..png.len() - 20]),
        Err(PngError::CorruptData(_))
    ));
    let image = decoder.decode(&png).unwrap();
    assert_eq!(image.data(), [128; 192]);
}

#[test]
fn crc_corruption_is_detected() {
    let mut png = encode(2, 2, &[0; 12], EncoderConfig::default());
    png[16] ^= 0x01;
    assert!(matches!(
        classic().decode(&png),
        Err(PngError::CorruptData(msg)) if msg.contains("CRC")
    ));
}

#[test]
fn simplified_color_conversions() {
    let rgb = encode(3, 1, &[255, 0, 0, 0, 255, 0, 0, 0, 255], EncoderConfig::default());
    let gray = simplified(PixelFormat::Gray).decode(&rgb).unwrap();
    assert_eq!(gray.data(), [54, 182, 18]);
    let bgra = simplified(PixelFormat::Bgra).decode(&rgb).unwrap();
    assert_eq!(&bgra.data()[..4], [0, 0, 255, 255]);

    let rgba = encode(
        1,
        1,
        &[200, 100, 50, 128],
        EncoderConfig::default().with_pixel_format(PixelFormat::Rgba),
    );
    let dropped = simplified(PixelFormat::Rgb).decode(&rgba).unwrap();
    assert_eq!(dropped.data(), [100, 50, 25]);

    let ga = encode(
        1,
        1,
        &[90, 30],
        EncoderConfig::default().with_pixel_format(PixelFormat::GrayAlpha),
    );
    let expanded = simplified(PixelFormat::Rgba).decode(&ga).unwrap();
    assert_eq!(expanded.data(), [90, 90, 90, 30]);
    let meta = expanded.meta().unwrap();
    assert_eq!(meta.stride(), 4);
    assert_eq!(meta.channel_count(), 4);
}

#[test]
fn without_meta_drops_metadata() {
    let png = encode(1, 1, &[1, 2, 3], EncoderConfig::default());
    for api_type in [ApiType::Simplified, ApiType::Classic] {
        let config = DecoderConfig::default()
            .with_api_type(api_type)
            .with_without_meta(true);
        let image = mempng::decode(&png, config).unwrap();
        assert!(image.meta().is_none());
        assert_eq!(image.data(), [1, 2, 3]);
    }
}

#[test]
fn classic_gamma_correction() {
    let config = EncoderConfig::default()
        .with_pixel_format(PixelFormat::GrayAlpha)
        .with_gamma(1.0);
    let png = encode(2, 1, &[64, 10, 200, 20], config);
    let decoder = Decoder::new(
        DecoderConfig::default()
            .with_api_type(ApiType::Classic)
            .with_display_gamma(2.2)
            .unwrap(),
    )
    .unwrap();
    let image = decoder.decode(&png).unwrap();
    assert!(image.data()[0] > 64);
    assert!(image.data()[2] > 200);
    assert_eq!((image.data()[1], image.data()[3]), (10, 20));

    // Without gAMA the file is assumed to be 0.45, which cancels 2.2.
    let png = encode(
        2,
        1,
        &[64, 10, 200, 20],
        EncoderConfig::default().with_pixel_format(PixelFormat::GrayAlpha),
    );
    assert_eq!(decoder.decode(&png).unwrap().data(), [64, 10, 200, 20]);

    let simplified = Decoder::new(
        DecoderConfig::default()
            .with_pixel_format(PixelFormat::GrayAlpha)
            .with_display_gamma(2.2)
            .unwrap(),
    )
    .unwrap();
    let png = encode(
        2,
        1,
        &[64, 10, 200, 20],
        EncoderConfig::default()
            .with_pixel_format(PixelFormat::GrayAlpha)
            .with_gamma(1.0),
    );
    assert_eq!(simplified.decode(&png).unwrap().data(), [64, 10, 200, 20]);
}

#[test]
fn chunks_after_pixel_data() {
    let png = encode(1, 1, &[0; 3], EncoderConfig::default().with_time(false));
    let mut ztxt = b"Packed\0\0".to_vec();
    ztxt.extend(miniz_oxide::deflate::compress_to_vec_zlib(b"squeezed", 6));
    let png = splice_before_iend(
        &png,
        &[
            chunk(b"tEXt", b"Late Note\0after"),
            chunk(b"zTXt", &ztxt),
            chunk(b"tIME", &[0x07, 0xe4, 2, 29, 12, 0, 0]),
        ],
    );

    let image = classic().decode(&png).unwrap();
    let meta = image.meta().unwrap();
    let text = meta.text().unwrap();
    assert_eq!(text["late_note"], b"after");
    assert_eq!(text["packed"], b"squeezed");
    assert_eq!(
        meta.time().unwrap().to_offset(time::UtcOffset::UTC),
        time::macros::datetime!(2020-02-29 12:00:00 UTC)
    );

    let header = classic().read_header(&png).unwrap();
    assert_eq!(header.text(), None);
    assert_eq!(header.time(), None);
}

#[test]
fn read_header_modes() {
    let png = encode(
        6,
        4,
        &[0; 96],
        EncoderConfig::default()
            .with_pixel_format(PixelFormat::Argb)
            .with_text("comment", "hi")
            .unwrap(),
    );
    let meta = mempng::read_header(&png).unwrap();
    assert_eq!((meta.width(), meta.height()), (6, 4));
    assert_eq!(meta.pixel_format(), PixelFormat::Rgba);
    assert_eq!(meta.stride(), 24);
    assert_eq!(meta.color_type(), Some(ColorType::TruecolorWithAlpha));
    assert_eq!(meta.text().unwrap()["comment"], b"hi");
    assert_eq!(classic().read_header(&png).unwrap(), meta);

    let decoded = simplified(PixelFormat::Rgb).decode(&png).unwrap();
    let meta = decoded.meta().unwrap();
    assert_eq!(meta.pixel_format(), PixelFormat::Rgb);
    assert_eq!(meta.stride(), 18);
    assert_eq!(meta.color_type(), None);
}

#[test]
fn read_header_describes_the_stream() {
    let png = encode(
        4,
        4,
        &[7; 64],
        EncoderConfig::default()
            .with_pixel_format(PixelFormat::Rgba)
            .with_interlace(true),
    );
    let meta = simplified(PixelFormat::Rgb).read_header(&png).unwrap();
    assert_eq!(meta.color_type(), Some(ColorType::TruecolorWithAlpha));
    assert_eq!(meta.interlace_method(), Some(InterlaceMethod::Adam7));
    assert_eq!(meta.pixel_format(), PixelFormat::Rgba);
    assert_eq!(meta.stride(), 16);
}

#[test]
fn read_header_returns_warnings() {
    let png = encode(1, 1, &[0; 3], EncoderConfig::default().with_time(false));
    let (signature_and_ihdr, rest) = png.split_at(33);
    let mut png = signature_and_ihdr.to_vec();
    png.extend(chunk(b"tIME", &[0x07, 0xe4, 13, 1, 0, 0, 0]));
    png.extend(rest);

    let meta = mempng::read_header(&png).unwrap();
    assert_eq!(meta.time(), None);
    assert_eq!(meta.warnings().len(), 1);
    assert!(meta.warnings()[0].contains("tIME"));

    let image = classic().decode(&png).unwrap();
    assert_eq!(image.warnings(), meta.warnings());
}

#[test]
fn iend_with_payload_is_rejected() {
    let png = encode(1, 1, &[1, 2, 3], EncoderConfig::default());
    let mut png = png[..png.len() - 12].to_vec();
    png.extend(chunk(b"IEND", b"junk"));
    assert!(matches!(
        classic().decode(&png),
        Err(PngError::CorruptData(_))
    ));
}

#[test]
fn unknown_ancillary_chunks_are_skipped() {
    let png = encode(1, 1, &[5, 6, 7], EncoderConfig::default());
    let png = splice_before_iend(&png, &[chunk(b"teSt", b"private")]);
    let image = simplified(PixelFormat::Rgb).decode(&png).unwrap();
    assert_eq!(image.data(), [5, 6, 7]);
    assert!(image.warnings().is_empty());
}

#[test]
fn keyed_decoder_options() {
    let png = encode(1, 1, &[10, 20, 30], EncoderConfig::default());
    let config = DecoderConfig::from_options([
        ("pixel_format", OptionValue::from("bgr")),
        ("api_type", OptionValue::from("simplified")),
    ])
    .unwrap();
    let image = mempng::decode(&png, config).unwrap();
    assert_eq!(image.data(), [30, 20, 10]);

    assert!(matches!(
        DecoderConfig::from_options([("pixel_format", OptionValue::Bool(true))]),
        Err(PngError::TypeMismatch(_))
    ));
    assert!(matches!(
        DecoderConfig::from_options([("speed", OptionValue::Int(1))]),
        Err(PngError::InvalidArgument(_))
    ));
}

#[test]
fn file_helpers() {
    let dir = std::env::temp_dir().join(format!("mempng-file-helpers-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let raw_path = dir.join("pixels.raw");
    std::fs::write(&raw_path, [9, 8, 7, 6, 5, 4]).unwrap();

    let encoded = mempng::encode_file(2, 1, &raw_path, EncoderConfig::default()).unwrap();
    let png_path = dir.join("pixels.png");
    std::fs::write(&png_path, encoded.as_bytes()).unwrap();
    let image = mempng::decode_file(&png_path, DecoderConfig::default()).unwrap();
    assert_eq!(image.data(), [9, 8, 7, 6, 5, 4]);

    assert!(matches!(
        mempng::decode_file(dir.join("missing.png"), DecoderConfig::default()),
        Err(PngError::Io(_))
    ));
    std::fs::remove_dir_all(&dir).unwrap();
}
