//! Error types for decoding platform payloads.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtoError`].
pub type Result<T, E = ProtoError> = std::result::Result<T, E>;

/// Errors raised while decoding wire payloads.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// The payload was not valid JSON or did not match the expected shape.
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A field required for the payload's type was absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The interaction or component type is not one this crate understands.
    #[error("unsupported {what} type: {value}")]
    Unsupported {
        /// Which discriminator was unsupported.
        what: &'static str,
        /// The raw discriminator value.
        value: u8,
    },
}
