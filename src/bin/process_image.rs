use anyhow::{bail, Context};
use mempng::{options::OptionValue, DecoderConfig, Encoder, EncoderConfig, PixelFormat};

/// `key=value` arguments, with `text.<key>=<value>` gathered into one map.
fn parse_options<'a>(
    args: impl Iterator<Item = &'a String>,
) -> anyhow::Result<Vec<(String, OptionValue)>> {
    let mut options = vec![];
    let mut text = vec![];
    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            bail!("expected key=value, got {arg:?}");
        };
        match key.strip_prefix("text.") {
            Some(text_key) => text.push((text_key.to_owned(), OptionValue::from(value))),
            None => options.push((key.to_owned(), OptionValue::parse(value))),
        }
    }
    if !text.is_empty() {
        options.push(("text".to_owned(), OptionValue::Map(text)));
    }
    Ok(options)
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<_> = std::env::args().skip(1).collect();
    let verbosity = if args.first().map(String::as_str) == Some("-v") {
        args.remove(0);
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Error
    };
    pretty_env_logger::formatted_builder()
        .filter_level(verbosity)
        .init();
    if args.len() < 2 {
        bail!("usage: process-image [-v] <in.png> <out.png> [key=value ...]");
    }
    let (input_name, output_name) = (&args[0], &args[1]);

    let encoder_config = EncoderConfig::from_options(parse_options(args[2..].iter())?)
        .context("Invalid encoder options")?;
    let pixel_format: PixelFormat = encoder_config.pixel_format;

    let input = std::fs::read(input_name).context(format!("Failed to read {input_name}"))?;
    let decoder_config = DecoderConfig::default().with_pixel_format(pixel_format);
    let image = mempng::decode(&input, decoder_config)
        .context(format!("Failed to decode {input_name}"))?;
    let meta = image
        .meta()
        .context("Decoder returned no metadata")?
        .clone();
    for warning in image.warnings() {
        log::info!("decode warning: {warning}");
    }

    let encoder = Encoder::new(meta.width(), meta.height(), encoder_config)?;
    let encoded = encoder
        .encode(image.data())
        .context(format!("Failed to encode {output_name}"))?;
    for warning in encoded.warnings() {
        log::info!("encode warning: {warning}");
    }
    std::fs::write(output_name, encoded.as_bytes())
        .context(format!("Failed to write {output_name}"))?;
    log::info!(
        "{input_name} -> {output_name}: {}x{} {pixel_format}, {} -> {} bytes",
        meta.width(),
        meta.height(),
        input.len(),
        encoded.as_bytes().len()
    );
    Ok(())
}
