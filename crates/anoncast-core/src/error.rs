//! # Error Hierarchy
//!
//! Structured error types for the foundational layer, built with
//! `thiserror`. Each variant carries enough context (index, offending
//! value, limit) for an operator to diagnose a malformed submission
//! without re-running it.

use thiserror::Error;

/// Errors raised while decoding public inputs into [`DecodedInputs`].
///
/// Decoding failures are permanent: resubmitting the same inputs will
/// always fail the same way.
///
/// [`DecodedInputs`]: crate::inputs::DecodedInputs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer public inputs than the fixed header plus one text byte.
    #[error("expected at least {expected_min} public inputs, got {actual}")]
    TooFewInputs {
        /// Minimum number of inputs.
        expected_min: usize,
        /// Number of inputs received.
        actual: usize,
    },

    /// More text slots than the maximum message length.
    #[error("message text has {actual} byte slots, maximum is {max}")]
    TextTooLong {
        /// Maximum number of text bytes.
        max: usize,
        /// Number of text slots received.
        actual: usize,
    },

    /// A text slot does not hold a single byte.
    #[error("public input {index} is not a byte value")]
    InvalidTextByte {
        /// Absolute index of the offending public input.
        index: usize,
    },

    /// Message text is empty once trailing padding is removed.
    #[error("message text is empty")]
    EmptyText,

    /// Message text is not valid UTF-8 or contains interior NUL bytes.
    #[error("message text is invalid: {0}")]
    InvalidText(String),

    /// Timestamp slot does not hold a positive 63-bit integer.
    #[error("timestamp is not a positive unix time")]
    InvalidTimestamp,

    /// Reply slot is non-zero but does not encode a 20-byte cast hash.
    #[error("reply target does not encode a 20-byte cast hash")]
    InvalidReplyTarget,

    /// Channel slot is non-zero but does not encode a channel identifier.
    #[error("channel tag is invalid: {0}")]
    InvalidChannel(String),
}

/// Validation errors for the primitive newtypes.
///
/// Raised when parsing wire representations (hex strings, identifiers)
/// into typed values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Hex string contains non-hex characters or has an odd length.
    #[error("invalid hex: \"{value}\" ({reason})")]
    InvalidHex {
        /// The rejected string.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Field element encoding is longer than 32 bytes.
    #[error("field element \"{0}\" exceeds 32 bytes")]
    FieldTooLong(String),

    /// Field element is not below the BN254 scalar modulus.
    #[error("field element \"{0}\" is not below the BN254 scalar modulus")]
    NonCanonicalField(String),

    /// Cast hash is not exactly 20 bytes.
    #[error("invalid cast hash \"{0}\" (expected 0x followed by 40 hex digits)")]
    InvalidCastHash(String),

    /// Channel identifier has invalid characters or length.
    #[error("invalid channel id \"{0}\" (expected 1-31 chars of [a-z0-9-])")]
    InvalidChannel(String),

    /// External hash returned by the feed is empty.
    #[error("external hash must not be empty")]
    EmptyExternalHash,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_messages_carry_context() {
        let err = DecodeError::TooFewInputs {
            expected_min: 5,
            actual: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains('5'));
        assert!(msg.contains('2'));

        let err = DecodeError::InvalidTextByte { index: 17 };
        assert!(err.to_string().contains("17"));
    }

    #[test]
    fn validation_error_messages_carry_value() {
        let err = ValidationError::InvalidCastHash("0xzz".into());
        assert!(err.to_string().contains("0xzz"));

        let err = ValidationError::InvalidHex {
            value: "abc".into(),
            reason: "odd length".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("abc"));
        assert!(msg.contains("odd length"));
    }
}
