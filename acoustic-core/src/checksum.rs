//! 8-bit additive checksum over a packet body.
//!
//! Weak by design: this detects accidental corruption in transit, not
//! tampering. Integrity of ENCRYPTED packet bodies comes from the AES-GCM
//! authentication tag (see [`crate::crypto`]), not from this checksum.

/// `(sum of bytes) mod 256`, computed over the body only: payload bytes,
/// the 4-byte auth token, or the cipher-blob - never the preamble, start
/// flag, length, or end flag.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}
