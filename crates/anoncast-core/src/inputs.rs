//! # Submissions and Public-Input Decoding
//!
//! A [`Submission`] is what a client sends: an opaque proof plus the public
//! inputs the proof commits to. The inputs carry everything the server
//! learns about the message, laid out in fixed slots:
//!
//! | index | meaning |
//! |-------|---------|
//! | 0 | membership root |
//! | 1 | timestamp, unix seconds |
//! | 2 | reply target (0 = none, else a 20-byte cast hash) |
//! | 3 | channel tag (0 = none, else right-aligned ASCII) |
//! | 4.. | message text, one UTF-8 byte per slot, zero padded |
//!
//! [`decode_public_inputs`] is pure: no clock, no I/O.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::DecodeError;
use crate::field::{hex_decode, hex_encode, CastHash, ChannelId, FieldElement};

/// Index of the membership root.
pub const ROOT_INDEX: usize = 0;
/// Index of the timestamp.
pub const TIMESTAMP_INDEX: usize = 1;
/// Index of the reply target.
pub const REPLY_INDEX: usize = 2;
/// Index of the channel tag.
pub const CHANNEL_INDEX: usize = 3;
/// Index of the first message text byte.
pub const TEXT_OFFSET: usize = 4;
/// Maximum message length in bytes.
pub const MAX_TEXT_BYTES: usize = 320;

/// Raw proof bytes. Hex on the wire.
#[derive(Clone, PartialEq, Eq)]
pub struct ProofBytes(Vec<u8>);

impl ProofBytes {
    /// Wrap raw proof bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Borrow the bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the proof is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `0x`-prefixed hex form.
    pub fn to_hex(&self) -> String {
        hex_encode(&self.0)
    }
}

impl fmt::Debug for ProofBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProofBytes({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for ProofBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Serialize for ProofBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ProofBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex_decode(&s).map(Self).map_err(serde::de::Error::custom)
    }
}

/// A proof submission as received from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Opaque proof bytes.
    pub proof: ProofBytes,
    /// Public inputs the proof commits to.
    pub public_inputs: Vec<FieldElement>,
}

impl Submission {
    /// Construct a submission.
    pub fn new(proof: impl Into<ProofBytes>, public_inputs: Vec<FieldElement>) -> Self {
        Self {
            proof: proof.into(),
            public_inputs,
        }
    }

    /// SHA-256 of the proof bytes as 64 lowercase hex digits.
    pub fn proof_digest(&self) -> String {
        sha256_hex(self.proof.as_bytes())
    }

    /// SHA-256 of [`Self::public_input_bytes`] as 64 lowercase hex digits.
    ///
    /// Identifies the statement being proven independently of the proof
    /// encoding, so a second proof of the same message shares this digest.
    pub fn statement_digest(&self) -> String {
        sha256_hex(&self.public_input_bytes())
    }

    /// Public inputs flattened into 32-byte big-endian words.
    pub fn public_input_bytes(&self) -> Vec<u8> {
        self.public_inputs
            .iter()
            .flat_map(|f| f.as_bytes().iter().copied())
            .collect()
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().map(|b| format!("{b:02x}")).collect()
}

/// The message-level content extracted from public inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedInputs {
    /// Message body.
    pub text: String,
    /// Proof creation time, unix seconds.
    pub timestamp_unix: i64,
    /// Membership root the proof was generated against.
    pub root: FieldElement,
    /// Cast being replied to, if any.
    pub reply_to: Option<CastHash>,
    /// Channel to post into, if any.
    pub channel: Option<ChannelId>,
}

/// Decode public inputs into message content.
///
/// Deterministic: the same slice always yields the same result.
pub fn decode_public_inputs(inputs: &[FieldElement]) -> Result<DecodedInputs, DecodeError> {
    let expected_min = TEXT_OFFSET + 1;
    if inputs.len() < expected_min {
        return Err(DecodeError::TooFewInputs {
            expected_min,
            actual: inputs.len(),
        });
    }

    let root = inputs[ROOT_INDEX];
    let timestamp_unix = decode_timestamp(&inputs[TIMESTAMP_INDEX])?;

    let reply_slot = &inputs[REPLY_INDEX];
    let reply_to = if reply_slot.is_zero() {
        None
    } else {
        Some(CastHash::from_field(reply_slot).ok_or(DecodeError::InvalidReplyTarget)?)
    };

    let channel_slot = &inputs[CHANNEL_INDEX];
    let channel = if channel_slot.is_zero() {
        None
    } else {
        Some(
            ChannelId::from_field(channel_slot)
                .map_err(|e| DecodeError::InvalidChannel(e.to_string()))?,
        )
    };

    let text = decode_text(&inputs[TEXT_OFFSET..])?;

    Ok(DecodedInputs {
        text,
        timestamp_unix,
        root,
        reply_to,
        channel,
    })
}

fn decode_timestamp(slot: &FieldElement) -> Result<i64, DecodeError> {
    slot.to_u64()
        .and_then(|v| i64::try_from(v).ok())
        .filter(|v| *v > 0)
        .ok_or(DecodeError::InvalidTimestamp)
}

fn decode_text(slots: &[FieldElement]) -> Result<String, DecodeError> {
    let mut bytes = Vec::with_capacity(slots.len());
    for (offset, slot) in slots.iter().enumerate() {
        let byte = slot
            .to_u64()
            .and_then(|v| u8::try_from(v).ok())
            .ok_or(DecodeError::InvalidTextByte {
                index: TEXT_OFFSET + offset,
            })?;
        bytes.push(byte);
    }

    let len = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    bytes.truncate(len);

    if bytes.is_empty() {
        return Err(DecodeError::EmptyText);
    }
    if bytes.len() > MAX_TEXT_BYTES {
        return Err(DecodeError::TextTooLong {
            max: MAX_TEXT_BYTES,
            actual: bytes.len(),
        });
    }
    if bytes.contains(&0) {
        return Err(DecodeError::InvalidText("interior NUL byte".to_string()));
    }
    String::from_utf8(bytes).map_err(|e| DecodeError::InvalidText(e.to_string()))
}

/// Lay decoded content back out as public inputs. Text bytes are not padded.
///
/// Non-positive timestamps encode as zero, which decoding rejects.
pub fn encode_public_inputs(decoded: &DecodedInputs) -> Vec<FieldElement> {
    let timestamp = u64::try_from(decoded.timestamp_unix).unwrap_or(0);
    let mut inputs = Vec::with_capacity(TEXT_OFFSET + decoded.text.len());
    inputs.push(decoded.root);
    inputs.push(FieldElement::from_u64(timestamp));
    inputs.push(
        decoded
            .reply_to
            .as_ref()
            .map_or(FieldElement::ZERO, CastHash::to_field),
    );
    inputs.push(
        decoded
            .channel
            .as_ref()
            .map_or(FieldElement::ZERO, ChannelId::to_field),
    );
    inputs.extend(
        decoded
            .text
            .bytes()
            .map(|b| FieldElement::from_u64(u64::from(b))),
    );
    inputs
}
