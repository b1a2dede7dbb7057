use thiserror::Error;

pub type Result<T> = std::result::Result<T, WavError>;

#[derive(Error, Debug)]
pub enum WavError {
    #[error("Malformed WAV header: {reason}")]
    MalformedHeader { reason: String },

    #[error("Unsupported WAV format: {reason}")]
    UnsupportedFormat { reason: String },

    #[error("Truncated data chunk: declares {declared} bytes, only {available} available")]
    TruncatedData { declared: usize, available: usize },

    #[error("Invalid transform input: {reason}")]
    InvalidTransformInput { reason: String },

    /// The block does not address this container's buffer.
    #[error("Memory block [{offset}, {offset}+{len}) lies outside the wave buffer")]
    BlockOutOfBounds { offset: usize, len: usize },

    #[error("Invalid parameter: {reason}")]
    InvalidParameter { reason: String },
}

impl WavError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        WavError::MalformedHeader {
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        WavError::UnsupportedFormat {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        WavError::InvalidTransformInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_parameter(reason: impl Into<String>) -> Self {
        WavError::InvalidParameter {
            reason: reason.into(),
        }
    }
}
