//! Packet construction and parsing for the three wire variants: DATA, AUTH
//! and ENCRYPTED.
//!
//! Build functions turn a payload (or secret, or payload+password) into a
//! complete bit sequence ready for [`crate::modem::modulate_packet`]. The
//! top-level [`decode`] function chains the demodulator, the frame
//! synchronizer and (for ENCRYPTED/AUTH) the crypto module into the single
//! entry point a caller is expected to use.

use crate::bits::{bytes_to_bits, push_uint};
use crate::checksum::checksum;
use crate::crypto;
use crate::demod::decode_samples;
use crate::error::CoreError;
use crate::sync::{find_frames, Frame};

/// Alternating preamble, transmitter-side only - never matched against by
/// the receiver's frame sync.
pub const PREAMBLE: [u8; 32] = [
    1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0,
];
/// Start flag shared by the DATA and AUTH variants.
pub const START_DATA_AUTH: [u8; 8] = [1, 1, 0, 0, 1, 1, 0, 0];
/// Start flag for the ENCRYPTED variant.
pub const START_ENCRYPTED: [u8; 8] = [1, 1, 1, 1, 0, 0, 0, 0];
/// End flag shared by all three variants.
pub const END_FLAG: [u8; 8] = [1, 1, 1, 1, 1, 1, 1, 1];

/// Caller hint resolving the DATA/AUTH ambiguity on the wire: both variants
/// share [`START_DATA_AUTH`], so the mode must be negotiated out of band
/// rather than auto-detected (spec.md, design note in section 9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Data,
    Auth,
}

/// Which of the three wire layouts a decoded frame actually was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PacketKind {
    Data,
    Auth,
    Encrypted,
}

/// Build a DATA packet's bit sequence for `payload` addressed to `unit_id`.
///
/// `unit_id` is truncated to its low 4 bits. Fails with
/// [`CoreError::PayloadTooLarge`] if `payload` is longer than 255 bytes.
pub fn build_data(payload: &[u8], unit_id: u8) -> Result<Vec<u8>, CoreError> {
    if payload.len() > 255 {
        return Err(CoreError::PayloadTooLarge(payload.len()));
    }

    let mut bits = Vec::new();
    bits.extend(PREAMBLE);
    bits.extend(START_DATA_AUTH);
    push_uint(&mut bits, unit_id as u32, 4);
    push_uint(&mut bits, payload.len() as u32, 8);
    bits.extend(bytes_to_bits(payload));
    push_uint(&mut bits, checksum(payload) as u32, 8);
    bits.extend(END_FLAG);
    Ok(bits)
}

/// Build an AUTH packet's bit sequence proving knowledge of `secret`.
pub fn build_auth(secret: &str, unit_id: u8) -> Vec<u8> {
    let token = crypto::auth_token(secret);

    let mut bits = Vec::new();
    bits.extend(PREAMBLE);
    bits.extend(START_DATA_AUTH);
    push_uint(&mut bits, unit_id as u32, 4);
    bits.extend(bytes_to_bits(&token));
    push_uint(&mut bits, checksum(&token) as u32, 8);
    bits.extend(END_FLAG);
    bits
}

/// Build an ENCRYPTED packet's bit sequence for `payload` under `password`.
///
/// Fails with [`CoreError::PayloadTooLarge`] if the resulting cipher-blob
/// (salt + nonce + ciphertext + tag) exceeds 255 bytes, or with
/// [`CoreError::AuthFailure`] if `password` is empty.
pub fn build_encrypted(payload: &[u8], password: &str, unit_id: u8) -> Result<Vec<u8>, CoreError> {
    let blob = crypto::encrypt(password, payload)?;
    if blob.len() > 255 {
        return Err(CoreError::PayloadTooLarge(blob.len()));
    }

    let mut bits = Vec::new();
    bits.extend(PREAMBLE);
    bits.extend(START_ENCRYPTED);
    push_uint(&mut bits, unit_id as u32, 4);
    push_uint(&mut bits, blob.len() as u32, 8);
    bits.extend(bytes_to_bits(&blob));
    push_uint(&mut bits, checksum(&blob) as u32, 8);
    bits.extend(END_FLAG);
    Ok(bits)
}

/// Caller-supplied context for [`decode`].
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Resolves the DATA/AUTH wire ambiguity. Defaults to [`Mode::Data`].
    pub expected_mode: Option<Mode>,
    /// Password to attempt on any ENCRYPTED frame found.
    pub password: Option<String>,
    /// Secret to verify any AUTH frame's token against.
    pub expected_secret: Option<String>,
}

/// Outcome of decoding a single frame found in the sample buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    DataOk(u8, Vec<u8>),
    AuthOk(u8, bool),
    EncryptedOk(u8, Vec<u8>),
    EncryptedLocked(u8),
    EncryptedFailed(u8),
    Invalid,
}

/// Demodulate, frame-synchronize and interpret every packet found in
/// `samples`, in the order their start flags appear.
///
/// Returns `[DecodeResult::Invalid]` if no valid frame was found at all,
/// otherwise one [`DecodeResult`] per frame (spec.md section 9, open
/// question (b): all packets are returned, not just the first).
pub fn decode(samples: &[i16], opts: &DecodeOptions) -> Vec<DecodeResult> {
    let bits = decode_samples(samples);
    let expected_mode = opts.expected_mode.unwrap_or(Mode::Data);
    let frames = find_frames(&bits, expected_mode);

    if frames.is_empty() {
        return vec![DecodeResult::Invalid];
    }

    frames.into_iter().map(|frame| interpret(frame, opts)).collect()
}

fn interpret(frame: Frame, opts: &DecodeOptions) -> DecodeResult {
    match frame.kind {
        PacketKind::Data => DecodeResult::DataOk(frame.unit_id, frame.body),
        PacketKind::Auth => {
            let mut token = [0u8; crypto::TOKEN_LEN];
            token.copy_from_slice(&frame.body);
            let granted = opts
                .expected_secret
                .as_deref()
                .is_some_and(|secret| crypto::auth_verify(&token, secret));
            DecodeResult::AuthOk(frame.unit_id, granted)
        }
        PacketKind::Encrypted => match &opts.password {
            None => DecodeResult::EncryptedLocked(frame.unit_id),
            Some(password) => match crypto::decrypt(password, &frame.body) {
                Ok(plaintext) => DecodeResult::EncryptedOk(frame.unit_id, plaintext),
                Err(_) => DecodeResult::EncryptedFailed(frame.unit_id),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modem::modulate_packet;

    fn decode_one(bits: Vec<u8>, opts: DecodeOptions) -> DecodeResult {
        let samples = modulate_packet(&bits);
        let mut results = decode(&samples, &opts);
        assert_eq!(results.len(), 1);
        results.remove(0)
    }

    #[test]
    fn data_round_trips() {
        let bits = build_data(b"Hi", 1).unwrap();
        let result = decode_one(
            bits,
            DecodeOptions {
                expected_mode: Some(Mode::Data),
                ..Default::default()
            },
        );
        assert_eq!(result, DecodeResult::DataOk(1, b"Hi".to_vec()));
    }

    #[test]
    fn empty_and_max_size_data_payloads() {
        let bits = build_data(&[], 0).unwrap();
        assert_eq!(
            decode_one(bits, DecodeOptions::default()),
            DecodeResult::DataOk(0, Vec::new())
        );

        let big = vec![0x42u8; 255];
        let bits = build_data(&big, 7).unwrap();
        assert_eq!(
            decode_one(bits, DecodeOptions::default()),
            DecodeResult::DataOk(7, big)
        );
    }

    #[test]
    fn data_payload_over_255_rejected() {
        let payload = vec![0u8; 256];
        assert_eq!(
            build_data(&payload, 0),
            Err(CoreError::PayloadTooLarge(256))
        );
    }

    #[test]
    fn auth_grants_matching_secret_and_denies_others() {
        let bits = build_auth("door_key_123", 0);
        let opts = DecodeOptions {
            expected_mode: Some(Mode::Auth),
            expected_secret: Some("door_key_123".to_string()),
            ..Default::default()
        };
        assert_eq!(decode_one(bits.clone(), opts), DecodeResult::AuthOk(0, true));

        let opts_wrong = DecodeOptions {
            expected_mode: Some(Mode::Auth),
            expected_secret: Some("wrong".to_string()),
            ..Default::default()
        };
        assert_eq!(
            decode_one(bits, opts_wrong),
            DecodeResult::AuthOk(0, false)
        );
    }

    #[test]
    fn auth_with_all_zero_secret() {
        let bits = build_auth("\0\0\0\0", 3);
        let opts = DecodeOptions {
            expected_mode: Some(Mode::Auth),
            expected_secret: Some("\0\0\0\0".to_string()),
            ..Default::default()
        };
        assert_eq!(decode_one(bits, opts), DecodeResult::AuthOk(3, true));
    }

    #[test]
    fn encrypted_round_trips_and_reports_lock_states() {
        let bits = build_encrypted(b"Secret Message", "password123", 5).unwrap();

        let ok = decode_one(
            bits.clone(),
            DecodeOptions {
                password: Some("password123".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(ok, DecodeResult::EncryptedOk(5, b"Secret Message".to_vec()));

        let wrong = decode_one(
            bits.clone(),
            DecodeOptions {
                password: Some("wrongpass".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(wrong, DecodeResult::EncryptedFailed(5));

        let locked = decode_one(bits, DecodeOptions::default());
        assert_eq!(locked, DecodeResult::EncryptedLocked(5));
    }

    #[test]
    fn encrypted_empty_plaintext_blob_is_minimum_length() {
        let bits = build_encrypted(b"", "k", 0).unwrap();
        let result = decode_one(
            bits,
            DecodeOptions {
                password: Some("k".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(result, DecodeResult::EncryptedOk(0, Vec::new()));
    }

    #[test]
    fn no_start_flag_is_invalid() {
        // 2 seconds of silence: no tone energy resembling a start flag.
        let samples = vec![0i16; 44100 * 2];
        let result = decode(&samples, &DecodeOptions::default());
        assert_eq!(result, vec![DecodeResult::Invalid]);
    }

    #[test]
    fn silence_padding_around_packet_does_not_change_result() {
        let bits = build_data(b"Hi", 1).unwrap();
        let mut samples = vec![0i16; 5000];
        samples.extend(modulate_packet(&bits));
        samples.extend(vec![0i16; 5000]);

        let result = decode(&samples, &DecodeOptions::default());
        assert_eq!(result, vec![DecodeResult::DataOk(1, b"Hi".to_vec())]);
    }

    #[test]
    fn multiple_packets_in_one_buffer_all_decode_in_order() {
        let mut samples = Vec::new();
        for (id, text) in [(0u8, "one"), (1u8, "two"), (2u8, "three")] {
            let bits = build_data(text.as_bytes(), id).unwrap();
            samples.extend(modulate_packet(&bits));
        }

        let results = decode(&samples, &DecodeOptions::default());
        assert_eq!(
            results,
            vec![
                DecodeResult::DataOk(0, b"one".to_vec()),
                DecodeResult::DataOk(1, b"two".to_vec()),
                DecodeResult::DataOk(2, b"three".to_vec()),
            ]
        );
    }
}
