use std::collections::TryReserveError;

/// Everything that can go wrong while configuring, encoding or decoding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PngError {
    /// An option carried a value of the right type but the wrong content.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An option carried a value of the wrong type.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A numeric option fell outside its valid domain.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// The input does not start with the PNG signature.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// The chunk stream is structurally broken.
    #[error("corrupt data: {0}")]
    CorruptData(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("decode error: {0}")]
    Decode(String),

    /// A legal PNG feature this codec does not handle.
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("out of memory")]
    OutOfMemory,

    /// Reading an input file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PngError>;

impl From<TryReserveError> for PngError {
    fn from(_: TryReserveError) -> Self {
        PngError::OutOfMemory
    }
}

impl<'a> From<nom::Err<nom::error::Error<&'a [u8]>>> for PngError {
    fn from(value: nom::Err<nom::error::Error<&'a [u8]>>) -> Self {
        match value {
            nom::Err::Incomplete(_) => PngError::CorruptData("truncated chunk stream".into()),
            nom::Err::Error(e) | nom::Err::Failure(e) => match e.code {
                nom::error::ErrorKind::Eof => {
                    PngError::CorruptData("truncated chunk stream".into())
                }
                code => PngError::CorruptData(format!(
                    "malformed chunk ({}) with {} bytes left",
                    code.description(),
                    e.input.len()
                )),
            },
        }
    }
}

/// Non-fatal conditions met during one encode or decode call. Each one is
/// logged as it is recorded and handed back to the caller with the result.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Warnings(Vec<String>);
impl Warnings {
    pub(crate) fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.0.push(message);
    }

    pub(crate) fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Allocates a zeroed buffer, reporting allocation failure instead of aborting.
pub(crate) fn alloc_buffer(size: usize) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(size)?;
    buffer.resize(size, 0);
    Ok(buffer)
}
