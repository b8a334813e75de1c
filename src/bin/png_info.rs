use anyhow::{bail, Context};
use mempng::{options::OptionValue, ApiType, Decoder, DecoderConfig, Meta};
use time::format_description::well_known::Rfc3339;

fn meta_json(meta: &Meta) -> anyhow::Result<serde_json::Value> {
    let mut json = serde_json::json!({
        "width": meta.width(),
        "height": meta.height(),
        "stride": meta.stride(),
        "bit_depth": meta.bit_depth(),
        "pixel_format": meta.pixel_format().name(),
        "channels": meta.channel_count(),
    });
    if let Some(details) = meta.details() {
        json["color_type"] = details.color_type.name().into();
        json["interlace_method"] = details.interlace_method.to_string().into();
        json["compression_method"] = details.compression_method.to_string().into();
        json["filter_method"] = details.filter_method.to_string().into();
    }
    if let Some(text) = meta.text() {
        let text: serde_json::Map<String, serde_json::Value> = text
            .iter()
            .map(|(key, value)| (key.clone(), String::from_utf8_lossy(value).into()))
            .collect();
        json["text"] = text.into();
    }
    if let Some(time) = meta.time() {
        json["time"] = time.format(&Rfc3339)?.into();
    }
    if let Some(gamma) = meta.file_gamma() {
        json["file_gamma"] = gamma.into();
    }
    Ok(json)
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
    let Some(file_name) = args.first() else {
        bail!("usage: png-info [-v] <file.png> [decode=true] [key=value ...]");
    };

    let mut full_decode = false;
    let mut options = vec![("api_type".to_owned(), OptionValue::from("classic"))];
    for arg in &args[1..] {
        let Some((key, value)) = arg.split_once('=') else {
            bail!("expected key=value, got {arg:?}");
        };
        if key == "decode" {
            full_decode = OptionValue::parse(value).is_truthy();
        } else {
            options.push((key.to_owned(), OptionValue::parse(value)));
        }
    }
    let config = DecoderConfig::from_options(options).context("Invalid decoder options")?;
    let decoder = Decoder::new(config)?;
    let input = std::fs::read(file_name).context(format!("Failed to read {file_name}"))?;

    let mut report = if full_decode {
        let image = decoder
            .decode(&input)
            .context(format!("Failed to decode {file_name}"))?;
        let mut json = match image.meta() {
            Some(meta) => meta_json(meta)?,
            None => serde_json::json!({}),
        };
        json["decoded_bytes"] = image.data().len().into();
        json["warnings"] = image.warnings().into();
        json
    } else {
        let meta = decoder
            .read_header(&input)
            .context(format!("Failed to read header of {file_name}"))?;
        let mut json = meta_json(&meta)?;
        json["warnings"] = meta.warnings().into();
        json
    };
    report["file"] = file_name.as_str().into();
    report["api_type"] = decoder.config().api_type.to_string().into();
    if full_decode && decoder.config().api_type == ApiType::Simplified {
        log::info!("simplified decode: ancillary chunks not reported");
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
