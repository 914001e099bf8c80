use thiserror::Error;

/// Errors surfaced to callers of the bit codec and packet builders.
///
/// `BadChecksum`, `BadEndFlag` and `TruncatedFrame` name failure kinds the
/// frame synchronizer (see [`crate::sync`]) detects and discards internally
/// rather than propagating: a bad frame just means the scan resumes one bit
/// later, so those checks are expressed as `Option`, not `Result`, in that
/// module. They stay part of this enum because they are still meaningful
/// failure kinds at the bit-codec level this module documents.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CoreError {
    #[error("bit stream length {0} is not a multiple of 8")]
    MalformedBits(usize),

    #[error("checksum mismatch: expected {expected:#04x}, computed {computed:#04x}")]
    BadChecksum { expected: u8, computed: u8 },

    #[error("end flag did not match 0b11111111, found {0:#010b}")]
    BadEndFlag(u8),

    #[error("input ended before declared length of {declared} bytes could be read")]
    TruncatedFrame { declared: usize },

    #[error("payload too large: body is {0} bytes, maximum is 255")]
    PayloadTooLarge(usize),

    #[error("AEAD authentication failed - wrong password or corrupted cipher-blob")]
    AuthFailure,

    /// Named for completeness; an AUTH mismatch is surfaced to callers as
    /// `DecodeResult::AuthOk(unit_id, false)`, not this variant, so that
    /// "access denied" can be distinguished from "no packet found" without
    /// unwrapping a `Result`.
    #[error("auth token does not match the expected secret")]
    AccessDenied,
}
