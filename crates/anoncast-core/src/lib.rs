#![deny(missing_docs)]

//! # anoncast-core: Foundational Types for anoncast
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies, only `serde`, `serde_json`,
//! `thiserror`, `chrono`, `uuid`, and `sha2` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Canonical field elements.** Every public input is a [`FieldElement`]
//!    that has already been range-checked against the BN254 scalar modulus.
//!    Non-canonical encodings cannot be represented.
//!
//! 2. **Decoding is a pure function.** [`decode_public_inputs`] maps a slice
//!    of field elements to [`DecodedInputs`] with no I/O and no clock, so the
//!    same inputs always decode to the same value.
//!
//! 3. **Immutable artifacts.** [`Submission`], [`DecodedInputs`] and
//!    [`PublicationResult`] are produced once per stage and never mutated.
//!
//! 4. **Structured errors.** [`DecodeError`] and [`ValidationError`] are
//!    `thiserror` enums. No `Box<dyn Error>` and no `.unwrap()` outside tests.

pub mod eligibility;
pub mod error;
pub mod field;
pub mod inputs;
pub mod message;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use eligibility::EligibleCredentialSet;
pub use error::{DecodeError, ValidationError};
pub use field::{CastHash, ChannelId, FieldElement};
pub use inputs::{
    decode_public_inputs, encode_public_inputs, DecodedInputs, ProofBytes, Submission,
    MAX_TEXT_BYTES, TEXT_OFFSET,
};
pub use message::{ExternalHash, MessageRecord, PublicationResult, MESSAGE_VERSION};
pub use temporal::iso8601_from_unix;
