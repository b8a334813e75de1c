use mempng::{
    options::OptionValue, ApiType, Compression, Decoder, DecoderConfig, Encoder, EncoderConfig,
    PngError, PixelFormat,
};
use time::macros::datetime;

fn chunk_names(png: &[u8]) -> Vec<String> {
    let mut names = vec![];
    let mut pos = 8;
    while pos + 8 <= png.len() {
        let len = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
        names.push(String::from_utf8_lossy(&png[pos + 4..pos + 8]).into_owned());
        pos += len + 12;
    }
    names
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 253) as u8).collect()
}

fn classic() -> DecoderConfig {
    DecoderConfig::default().with_api_type(ApiType::Classic)
}

#[test]
fn every_pixel_format_round_trips() {
    for format in PixelFormat::ALL {
        let (width, height) = (7, 5);
        let raw = pattern(width * height * format.channel_count() as usize);
        let config = EncoderConfig::default().with_pixel_format(format);
        let png = mempng::encode(width as u32, height as u32, &raw, config).unwrap();
        let decoded = mempng::decode(
            png.as_bytes(),
            DecoderConfig::default().with_pixel_format(format),
        )
        .unwrap();
        assert_eq!(decoded.data(), raw, "{format}");
        let meta = decoded.meta().unwrap();
        assert_eq!(meta.pixel_format(), format);
        assert_eq!(meta.stride(), width * format.channel_count() as usize);
    }
}

#[test]
fn interlaced_round_trip() {
    let raw = pattern(13 * 9 * 4);
    let config = EncoderConfig::default()
        .with_pixel_format(PixelFormat::Rgba)
        .with_interlace(true);
    let png = mempng::encode(13, 9, &raw, config).unwrap();
    let decoded = mempng::decode(png.as_bytes(), classic()).unwrap();
    assert_eq!(decoded.data(), raw);
    let meta = decoded.meta().unwrap();
    insta::assert_snapshot!(
        format!(
            "{}x{} stride={} depth={} {} {} {} {}",
            meta.width(),
            meta.height(),
            meta.stride(),
            meta.bit_depth(),
            meta.color_type().unwrap(),
            meta.interlace_method().unwrap(),
            meta.compression_method().unwrap(),
            meta.filter_method().unwrap(),
        ),
        @"13x9 stride=52 depth=8 RGBA ADAM7 BASE BASE"
    );
}

#[test]
fn row_padding_is_skipped() {
    let (width, height, stride) = (4, 3, 17);
    let mut raw = vec![0xee; stride * height];
    let mut expected = vec![];
    for y in 0..height {
        let row: Vec<u8> = (0..width * 3).map(|x| (y * 40 + x) as u8).collect();
        raw[y * stride..y * stride + width * 3].copy_from_slice(&row);
        expected.extend(row);
    }
    let encoder = Encoder::new(4, 3, EncoderConfig::default().with_stride(stride)).unwrap();
    assert_eq!(encoder.data_size(), 51);
    let png = encoder.encode(&raw).unwrap();
    let decoded = mempng::decode(png.as_bytes(), DecoderConfig::default()).unwrap();
    assert_eq!(decoded.data(), expected);
}

#[test]
fn buffer_size_must_be_exact() {
    let encoder = Encoder::new(3, 3, EncoderConfig::default()).unwrap();
    for len in [26, 28] {
        assert!(matches!(
            encoder.encode(&vec![0; len]),
            Err(PngError::InvalidArgument(_))
        ));
    }
    assert!(encoder.encode(&[0; 27]).is_ok());
}

#[test]
fn chunk_order() {
    let config = EncoderConfig::default()
        .with_text("title", "x")
        .unwrap()
        .with_text("author", "y")
        .unwrap()
        .with_gamma(0.45455);
    let png = mempng::encode(2, 2, &[0; 12], config).unwrap();
    insta::assert_snapshot!(
        chunk_names(png.as_bytes()).join(" "),
        @"IHDR tEXt tEXt tIME gAMA IDAT IEND"
    );

    let config = EncoderConfig::default().with_time(false);
    let png = mempng::encode(2, 2, &[0; 12], config).unwrap();
    insta::assert_snapshot!(chunk_names(png.as_bytes()).join(" "), @"IHDR IDAT IEND");
}

#[test]
fn large_images_split_pixel_data() {
    let raw = pattern(200 * 100 * 3);
    let config = EncoderConfig::default()
        .with_compression(Compression::NoCompression)
        .with_time(false);
    let png = mempng::encode(200, 100, &raw, config).unwrap();
    let names = chunk_names(png.as_bytes());
    assert!(names.iter().filter(|n| *n == "IDAT").count() > 1);
    let decoded = mempng::decode(png.as_bytes(), DecoderConfig::default()).unwrap();
    assert_eq!(decoded.data(), raw);
}

#[test]
fn every_compression_level_decodes() {
    let raw = pattern(16 * 16 * 3);
    for level in 0..=9 {
        let config =
            EncoderConfig::default().with_compression(Compression::from_level(level).unwrap());
        let png = mempng::encode(16, 16, &raw, config).unwrap();
        let decoded = mempng::decode(png.as_bytes(), DecoderConfig::default()).unwrap();
        assert_eq!(decoded.data(), raw, "level {level}");
    }
}

#[test]
fn text_round_trip() {
    for key in ["My Key", "my_key"] {
        let config = EncoderConfig::default()
            .with_text(key, "hello")
            .unwrap()
            .with_text("binary", b"nul\0inside".to_vec())
            .unwrap();
        let png = mempng::encode(1, 1, &[1, 2, 3], config).unwrap();
        let decoded = mempng::decode(png.as_bytes(), classic()).unwrap();
        let text = decoded.meta().unwrap().text().unwrap();
        assert_eq!(text["my_key"], b"hello");
        assert_eq!(text["binary"], b"nul\0inside");
    }
}

#[test]
fn text_key_length_limit() {
    let text = |key: String| {
        EncoderConfig::from_options([(
            "text",
            OptionValue::Map(vec![(key, OptionValue::from("v"))]),
        )])
    };
    assert!(text("k".repeat(79)).is_ok());
    assert!(matches!(
        text("k".repeat(80)),
        Err(PngError::InvalidArgument(_))
    ));
}

#[test]
fn gamma_is_reported_only_when_written() {
    let config = EncoderConfig::default().with_gamma(0.45455);
    let png = mempng::encode(1, 1, &[0; 3], config).unwrap();
    let decoded = mempng::decode(png.as_bytes(), classic()).unwrap();
    assert_eq!(decoded.meta().unwrap().file_gamma(), Some(0.45455));

    let png = mempng::encode(1, 1, &[0; 3], EncoderConfig::default()).unwrap();
    let decoded = mempng::decode(png.as_bytes(), classic()).unwrap();
    assert_eq!(decoded.meta().unwrap().file_gamma(), None);
}

#[test]
fn timestamp_round_trip() {
    let when = datetime!(2020-02-29 12:34:56 UTC);
    let config = EncoderConfig::default().with_timestamp(when);
    let png = mempng::encode(1, 1, &[0; 3], config).unwrap();
    let decoded = mempng::decode(png.as_bytes(), classic()).unwrap();
    assert_eq!(decoded.meta().unwrap().time(), Some(when));

    let config = EncoderConfig::default().with_time(false);
    let png = mempng::encode(1, 1, &[0; 3], config).unwrap();
    let decoded = mempng::decode(png.as_bytes(), classic()).unwrap();
    assert_eq!(decoded.meta().unwrap().time(), None);
}

#[test]
fn encoder_is_reusable() {
    let encoder = Encoder::new(2, 1, EncoderConfig::default().with_time(false)).unwrap();
    assert!(encoder.encode(&[0; 5]).is_err());
    let first = encoder.encode(&[1, 2, 3, 4, 5, 6]).unwrap();
    let second = encoder.encode(&[1, 2, 3, 4, 5, 6]).unwrap();
    assert_eq!(first, second);
}

#[test]
fn keyed_options_drive_the_encoder() {
    let config = EncoderConfig::from_options([
        ("pixel_format", OptionValue::from("GA")),
        ("compression", OptionValue::from("BEST_COMPRESSION")),
        ("interlace", OptionValue::Bool(true)),
        ("time", OptionValue::Bool(false)),
    ])
    .unwrap();
    let png = mempng::encode(3, 3, &pattern(18), config).unwrap();
    let meta = mempng::read_header(png.as_bytes()).unwrap();
    assert_eq!((meta.width(), meta.height()), (3, 3));
    let decoded = mempng::decode(png.as_bytes(), classic()).unwrap();
    assert_eq!(decoded.data(), pattern(18));
}

#[test]
fn identical_options_build_identical_pipelines() {
    let options = || {
        [
            ("pixel_format", OptionValue::from("BGRA")),
            ("compression", OptionValue::Int(3)),
            ("interlace", OptionValue::Bool(true)),
            ("stride", OptionValue::Int(24)),
            ("time", OptionValue::Bool(false)),
            ("gamma", OptionValue::Float(0.5)),
        ]
    };
    let first = Encoder::new(5, 4, EncoderConfig::from_options(options()).unwrap()).unwrap();
    let second = Encoder::new(5, 4, EncoderConfig::from_options(options()).unwrap()).unwrap();
    assert_eq!(first.config(), second.config());
    assert_eq!(first.stride(), second.stride());
    assert_eq!(first.data_size(), second.data_size());
    let raw = pattern(first.data_size());
    let png = first.encode(&raw).unwrap();
    assert_eq!(png, second.encode(&raw).unwrap());

    let options = || {
        [
            ("pixel_format", OptionValue::from("AG")),
            ("api_type", OptionValue::from("simplified")),
        ]
    };
    let first = Decoder::new(DecoderConfig::from_options(options()).unwrap()).unwrap();
    let second = Decoder::new(DecoderConfig::from_options(options()).unwrap()).unwrap();
    assert_eq!(first.config(), second.config());
    assert_eq!(
        first.decode(png.as_bytes()).unwrap(),
        second.decode(png.as_bytes()).unwrap()
    );
}
