#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Packet header is malformed or describes an unsupported layout.
    #[error("framing error: {reason}")]
    Framing { reason: String },

    /// Stream ended before the header-computed number of bytes was available.
    #[error("truncated packet: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("checksum mismatch: residue {computed:#06x}, stored trailer {stored:#06x}")]
    ChecksumMismatch { computed: u16, stored: u16 },

    /// A valid packet that carries no GPS time field.
    #[error("packet has no GPS time reference")]
    MissingTimeReference,

    #[error("invalid config: {0}")]
    Config(String),

    #[error("usage: {0}")]
    Usage(String),

    #[error("timestamp overflow at sample {index}")]
    TimestampOverflow { index: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub(crate) fn framing<S: Into<String>>(reason: S) -> Self {
        Self::Framing {
            reason: reason.into(),
        }
    }

    /// True for errors that mean no packet could be framed from the stream.
    #[must_use]
    pub fn is_framing(&self) -> bool {
        matches!(self, Self::Framing { .. } | Self::Truncated { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
