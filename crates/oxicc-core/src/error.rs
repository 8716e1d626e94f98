//! Error types for oxicc

use thiserror::Error;

use crate::icc::TagSignature;
use crate::verify::Issue;

/// Result type for oxicc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in oxicc operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A read or write ran past the end of a buffer
    #[error("Out of bounds: {width} bytes at offset {offset} exceed buffer of {len} bytes")]
    OutOfBounds {
        offset: usize,
        width: usize,
        len: usize,
    },

    /// The 128-byte profile header is invalid
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// The tag table is invalid
    #[error("Malformed tag table: {0}")]
    MalformedTagTable(String),

    /// A tag's contents could not be decoded
    #[error("Malformed tag {signature}: {reason}")]
    MalformedTag {
        signature: TagSignature,
        reason: String,
    },

    /// A tag required for the requested operation is absent
    #[error("Missing tag: {0}")]
    MissingTag(TagSignature),

    /// Transform stages do not form a connected chain
    #[error("Incompatible chain: {0}")]
    IncompatibleChain(String),

    /// Gamma could not be estimated from the tone curves
    #[error("Gamma estimation failed: {0}")]
    EstimationFailed(String),

    /// Transform execution was rejected before any pixel was written
    #[error("Transform error: {0}")]
    Transform(String),

    /// Profile verification found hard errors
    #[error("Verification failed with {} error(s) and {} warning(s)", errors.len(), warnings.len())]
    VerificationFailed {
        errors: Vec<Issue>,
        warnings: Vec<Issue>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed_tag(signature: TagSignature, reason: impl Into<String>) -> Self {
        Self::MalformedTag {
            signature,
            reason: reason.into(),
        }
    }
}
