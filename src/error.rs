use std::io;

/// Errors surfaced by the batch reader.
///
/// Out-of-range batch requests are not errors; they come back as `Ok(None)`.
#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum ReaderError {
    #[error("IO Error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("Encoding not set: select an encoding before reading")]
    EncodingNotSet,
    #[error("Reader closed")]
    Closed,
    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),
    #[error("Unsupported Encoding: {0}")]
    UnsupportedEncoding(String),
}

impl ReaderError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        ReaderError::Io {
            context: context.into(),
            source,
        }
    }

    /// Underlying `io::ErrorKind` for I/O failures.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            ReaderError::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

impl From<io::Error> for ReaderError {
    fn from(e: io::Error) -> Self {
        ReaderError::io("accessing source", e)
    }
}

pub type Result<T> = std::result::Result<T, ReaderError>;
