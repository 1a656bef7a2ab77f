//! # Field Elements and Feed Identifiers
//!
//! Public inputs of a membership proof are elements of the BN254 scalar
//! field. [`FieldElement`] stores the canonical 32-byte big-endian encoding
//! and can only be constructed from values strictly below the modulus, so
//! two distinct encodings of the same scalar never coexist.
//!
//! [`CastHash`] and [`ChannelId`] are the two feed identifiers that travel
//! inside public inputs; both convert to and from a single field element.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// BN254 scalar field modulus, big-endian.
///
/// r = 21888242871839275222246405745257275088548364400416034343698204186575808495617
const BN254_MODULUS: [u8; 32] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58,
    0x5d, 0x28, 0x33, 0xe8, 0x48, 0x79, 0xb9, 0x70, 0x91, 0x43, 0xe1, 0xf5, 0x93, 0xf0, 0x00,
    0x00, 0x01,
];

/// Maximum channel identifier length; one byte of a field element is
/// always left zero so the value stays below the modulus.
const MAX_CHANNEL_LEN: usize = 31;

/// Length of a cast hash in bytes.
const CAST_HASH_LEN: usize = 20;

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decode an even-length hex string (optional `0x` prefix) into bytes.
pub fn hex_decode(s: &str) -> Result<Vec<u8>, ValidationError> {
    let raw = s.trim();
    let digits = strip_hex_prefix(raw);
    if digits.len() % 2 != 0 {
        return Err(ValidationError::InvalidHex {
            value: raw.to_string(),
            reason: format!("odd length {}", digits.len()),
        });
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| ValidationError::InvalidHex {
                    value: raw.to_string(),
                    reason: format!("invalid hex digit at position {i}"),
                })
        })
        .collect()
}

/// Encode bytes as lowercase hex with a `0x` prefix.
pub fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

// -- FieldElement -------------------------------------------------------------

/// A canonical BN254 scalar, stored big-endian.
///
/// Serializes as a `0x`-prefixed, zero-padded 64-digit hex string. Parsing
/// accepts shorter hex strings (left-padded) with or without the prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldElement([u8; 32]);

impl FieldElement {
    /// The additive identity.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Construct from a big-endian byte array, rejecting non-canonical values.
    pub fn from_bytes_be(bytes: [u8; 32]) -> Result<Self, ValidationError> {
        if bytes >= BN254_MODULUS {
            return Err(ValidationError::NonCanonicalField(hex_encode(&bytes)));
        }
        Ok(Self(bytes))
    }

    /// Construct from a small integer. Always canonical.
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Construct from at most 31 right-aligned bytes. Always canonical
    /// because the leading byte stays zero.
    pub(crate) fn from_short_bytes(tail: &[u8]) -> Option<Self> {
        if tail.len() > MAX_CHANNEL_LEN {
            return None;
        }
        let mut bytes = [0u8; 32];
        bytes[32 - tail.len()..].copy_from_slice(tail);
        Some(Self(bytes))
    }

    /// Borrow the big-endian encoding.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether this is the zero element.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The value as a `u64`, if it fits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.0[..24].iter().any(|b| *b != 0) {
            return None;
        }
        let mut tail = [0u8; 8];
        tail.copy_from_slice(&self.0[24..]);
        Some(u64::from_be_bytes(tail))
    }

    /// Canonical `0x`-prefixed 64-digit hex form.
    pub fn to_hex(&self) -> String {
        hex_encode(&self.0)
    }

    /// Bytes with leading zeros stripped.
    pub(crate) fn significant_bytes(&self) -> &[u8] {
        let first = self.0.iter().position(|b| *b != 0).unwrap_or(32);
        &self.0[first..]
    }
}

impl FromStr for FieldElement {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let digits = strip_hex_prefix(raw);
        if digits.is_empty() {
            return Err(ValidationError::InvalidHex {
                value: raw.to_string(),
                reason: "empty".to_string(),
            });
        }
        if digits.len() > 64 {
            return Err(ValidationError::FieldTooLong(raw.to_string()));
        }
        let padded = format!("{digits:0>64}");
        let decoded = hex_decode(&padded).map_err(|_| ValidationError::InvalidHex {
            value: raw.to_string(),
            reason: "non-hex character".to_string(),
        })?;
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        Self::from_bytes_be(bytes).map_err(|_| ValidationError::NonCanonicalField(raw.to_string()))
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_hex())
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// -- CastHash -----------------------------------------------------------------

/// A 20-byte Farcaster cast hash, displayed as `0x` + 40 lowercase hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastHash([u8; CAST_HASH_LEN]);

impl CastHash {
    /// Construct from raw bytes.
    pub fn from_bytes(bytes: [u8; CAST_HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; CAST_HASH_LEN] {
        &self.0
    }

    /// Encode into a public-input slot (right-aligned).
    pub fn to_field(&self) -> FieldElement {
        let mut bytes = [0u8; 32];
        bytes[32 - CAST_HASH_LEN..].copy_from_slice(&self.0);
        FieldElement(bytes)
    }

    /// Decode from a public-input slot. Returns `None` if any of the
    /// leading 12 bytes is set.
    pub fn from_field(field: &FieldElement) -> Option<Self> {
        let (head, tail) = field.as_bytes().split_at(32 - CAST_HASH_LEN);
        if head.iter().any(|b| *b != 0) {
            return None;
        }
        let mut bytes = [0u8; CAST_HASH_LEN];
        bytes.copy_from_slice(tail);
        Some(Self(bytes))
    }
}

impl FromStr for CastHash {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let bytes = hex_decode(raw).map_err(|_| ValidationError::InvalidCastHash(raw.to_string()))?;
        let bytes: [u8; CAST_HASH_LEN] = bytes
            .try_into()
            .map_err(|_| ValidationError::InvalidCastHash(raw.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for CastHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex_encode(&self.0))
    }
}

impl fmt::Debug for CastHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CastHash({self})")
    }
}

impl Serialize for CastHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CastHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// -- ChannelId ----------------------------------------------------------------

/// A feed channel identifier: 1–31 characters of `[a-z0-9-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    /// Validate and construct a channel identifier.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let valid_len = !s.is_empty() && s.len() <= MAX_CHANNEL_LEN;
        let valid_chars = s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
        if !valid_len || !valid_chars {
            return Err(ValidationError::InvalidChannel(s));
        }
        Ok(Self(s))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encode into a public-input slot (ASCII bytes, right-aligned).
    pub fn to_field(&self) -> FieldElement {
        // Length is bounded by construction.
        FieldElement::from_short_bytes(self.0.as_bytes()).unwrap_or(FieldElement::ZERO)
    }

    /// Decode from a public-input slot.
    pub fn from_field(field: &FieldElement) -> Result<Self, ValidationError> {
        let bytes = field.significant_bytes();
        let s = std::str::from_utf8(bytes)
            .map_err(|_| ValidationError::InvalidChannel(hex_encode(bytes)))?;
        Self::new(s)
    }
}

impl TryFrom<String> for ChannelId {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ChannelId> for String {
    fn from(c: ChannelId) -> Self {
        c.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
