//! # Error Types
//!
//! Errors raised by the foundational types. Higher layers wrap these in
//! their own `thiserror` enums.

use thiserror::Error;

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Decoded numerics are integers or scaled-decimal strings.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Errors parsing textual forms of core values (hex digests, decimals).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Hex input was malformed.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// A digest string did not have the `<algorithm>:<64 hex>` shape.
    #[error("invalid digest \"{value}\": {reason}")]
    InvalidDigest {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A decimal string did not parse as a scaled decimal.
    #[error("invalid decimal \"{0}\"")]
    InvalidDecimal(String),
}
