use thiserror::Error;

/// Failures reported by the inspector.
///
/// Every variant is structural: the call that produced it returned no partial
/// result. Per-instruction decode failures are not errors, they show up in the
/// instruction stream as `(bad)` entries.
#[derive(Error, Debug)]
pub enum InspectError {
    /// The buffer is too short for the requested operation.
    #[error("buffer too short: need at least {needed} bytes, got {actual}")]
    InvalidInput { needed: usize, actual: usize },

    /// The buffer is not in the expected format.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// No decoder is registered for the requested architecture.
    #[error("unsupported architecture: {0}")]
    UnsupportedArchitecture(String),

    /// A digest string is not 64 hex characters.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// A decoding engine could not be initialised.
    #[error("decoder engine error: {0}")]
    Engine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InspectError>;
