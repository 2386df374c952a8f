//! Error types for the audio converter.

use crate::negotiation::NegotiationError;
use thiserror::Error;

/// Result type alias using the converter's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for caps handling and conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// A format descriptor is malformed (missing field, depth > width, ...).
    #[error("invalid caps: {0}")]
    InvalidCaps(String),

    /// A fixed descriptor was required but the given one still has freedom.
    #[error("caps are not fixed: {0}")]
    NotFixed(String),

    /// Caps negotiation failed.
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    /// A buffer is smaller than the negotiated formats require.
    #[error("buffer of wrong size: in {in_len} < {in_required} or out {out_len} < {out_required}")]
    BufferSize {
        /// Actual input buffer length.
        in_len: usize,
        /// Input bytes required for the sample count.
        in_required: usize,
        /// Actual output buffer length.
        out_len: usize,
        /// Output bytes required for the sample count.
        out_required: usize,
    },

    /// The sample conversion engine failed.
    #[error("conversion failed: {0}")]
    Conversion(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A caps string could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}
