//! Keyed configuration, for callers that receive options as loosely typed
//! name/value pairs (command lines, scripting bindings) rather than building
//! [`EncoderConfig`] or [`DecoderConfig`] directly.
//!
//! Each recognised key checks the type of its value first and its content
//! second, so a wrong type is always [`PngError::TypeMismatch`] while a bad
//! value of the right type is [`PngError::InvalidArgument`] or
//! [`PngError::OutOfRange`]. Parsing stops at the first failure and no
//! configuration is returned.

use std::fmt;

use crate::{
    chunks::text::TextEntry,
    config::{check_display_gamma, ApiType, Compression, DecoderConfig, EncoderConfig},
    error::{PngError, Result},
    pixel::PixelFormat,
};

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Ordered key/value pairs.
    Map(Vec<(String, OptionValue)>),
}
impl OptionValue {
    /// Only `Nil` and `Bool(false)` are false.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, OptionValue::Nil | OptionValue::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Nil => "nil",
            OptionValue::Bool(_) => "bool",
            OptionValue::Int(_) => "integer",
            OptionValue::Float(_) => "float",
            OptionValue::Str(_) => "string",
            OptionValue::Map(_) => "map",
        }
    }

    /// Reads a command-line style value: `true`/`false`, integers and
    /// decimals become the matching variants, anything else a string.
    pub fn parse(text: &str) -> Self {
        match text {
            "true" => return OptionValue::Bool(true),
            "false" => return OptionValue::Bool(false),
            "nil" => return OptionValue::Nil,
            _ => {}
        }
        if let Ok(int) = text.parse::<i64>() {
            OptionValue::Int(int)
        } else if let Ok(float) = text.parse::<f64>() {
            OptionValue::Float(float)
        } else {
            OptionValue::Str(text.to_owned())
        }
    }
}
impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Nil => f.write_str("nil"),
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Float(x) => write!(f, "{x}"),
            OptionValue::Str(s) => write!(f, "{s:?}"),
            OptionValue::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}
impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}
impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}
impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}
impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_owned())
    }
}

fn type_mismatch(key: &str, value: &OptionValue) -> PngError {
    PngError::TypeMismatch(format!("{key} cannot be a {}", value.type_name()))
}

fn pixel_format(key: &str, value: &OptionValue) -> Result<PixelFormat> {
    match value {
        OptionValue::Str(name) => PixelFormat::resolve(name),
        other => Err(type_mismatch(key, other)),
    }
}

fn compression(key: &str, value: &OptionValue) -> Result<Compression> {
    match value {
        OptionValue::Int(level) => Compression::from_level(*level),
        OptionValue::Str(name) => Compression::from_name(name),
        other => Err(type_mismatch(key, other)),
    }
}

fn number(key: &str, value: &OptionValue) -> Result<f64> {
    match value {
        OptionValue::Int(i) => Ok(*i as f64),
        OptionValue::Float(x) => Ok(*x),
        other => Err(type_mismatch(key, other)),
    }
}

fn text(key: &str, value: &OptionValue) -> Result<Vec<TextEntry>> {
    let OptionValue::Map(entries) = value else {
        return Err(type_mismatch(key, value));
    };
    entries
        .iter()
        .map(|(name, value)| match value {
            OptionValue::Str(text) => TextEntry::new(name, text.as_bytes()),
            other => Err(PngError::InvalidArgument(format!(
                "text value for {name:?} must be a string, not a {}",
                other.type_name()
            ))),
        })
        .collect()
}

fn stride(key: &str, value: &OptionValue) -> Result<usize> {
    match value {
        OptionValue::Int(stride) => usize::try_from(*stride)
            .map_err(|_| PngError::InvalidArgument(format!("stride {stride} is negative"))),
        other => Err(type_mismatch(key, other)),
    }
}

impl EncoderConfig {
    /// Builds a configuration from `pixel_format`, `interlace`,
    /// `compression`, `text`, `time`, `gamma` and `stride` options. Keys not
    /// given keep their defaults; a repeated key takes its last value.
    ///
    /// The stride is checked against the row width by [`crate::Encoder::new`].
    pub fn from_options<K: AsRef<str>>(
        options: impl IntoIterator<Item = (K, OptionValue)>,
    ) -> Result<Self> {
        let mut config = Self::default();
        for (key, value) in options {
            let key = key.as_ref();
            match key {
                "pixel_format" => config.pixel_format = pixel_format(key, &value)?,
                "interlace" => config.interlace = value.is_truthy(),
                "compression" => config.compression = compression(key, &value)?,
                "text" => config.text = text(key, &value)?,
                "time" => config.time = value.is_truthy(),
                "gamma" => config.gamma = Some(number(key, &value)?),
                "stride" => config.stride = Some(stride(key, &value)?),
                other => {
                    return Err(PngError::InvalidArgument(format!(
                        "unknown encoder option {other:?}"
                    )))
                }
            }
        }
        Ok(config)
    }
}

impl DecoderConfig {
    /// Builds a configuration from `pixel_format`, `without_meta`,
    /// `api_type` and `display_gamma` options.
    pub fn from_options<K: AsRef<str>>(
        options: impl IntoIterator<Item = (K, OptionValue)>,
    ) -> Result<Self> {
        let mut config = Self::default();
        for (key, value) in options {
            let key = key.as_ref();
            match key {
                "pixel_format" => config.pixel_format = pixel_format(key, &value)?,
                "without_meta" => config.without_meta = value.is_truthy(),
                "api_type" => {
                    config.api_type = match &value {
                        OptionValue::Str(name) => ApiType::from_name(name)?,
                        other => return Err(type_mismatch(key, other)),
                    }
                }
                "display_gamma" => {
                    let gamma = number(key, &value)?;
                    check_display_gamma(gamma)?;
                    config.display_gamma = Some(gamma);
                }
                other => {
                    return Err(PngError::InvalidArgument(format!(
                        "unknown decoder option {other:?}"
                    )))
                }
            }
        }
        Ok(config)
    }
}
