//! Frame synchronization: locate packet start flags in a raw bit stream.
//!
//! The demodulator has no byte alignment, so the scan is bit-by-bit rather
//! than byte-by-byte. The preamble is never matched against - it only exists
//! to give the original transmitter's receiver time to settle; the start
//! flag alone defines where a frame begins.

use log::debug;

use crate::bits::read_uint;
use crate::checksum::checksum;
use crate::crypto::MIN_BLOB_LEN;
use crate::packet::{Mode, PacketKind, END_FLAG, START_DATA_AUTH, START_ENCRYPTED};

/// A successfully validated frame extracted from the bit stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    pub kind: PacketKind,
    pub unit_id: u8,
    /// Payload bytes (DATA), 4-byte token (AUTH), or cipher-blob (ENCRYPTED).
    pub body: Vec<u8>,
}

/// Scan `bits` left to right for every valid frame, returning them in the
/// order their start flags appear. `expected_mode` resolves the DATA/AUTH
/// ambiguity, since both variants share the same start flag on the wire.
pub(crate) fn find_frames(bits: &[u8], expected_mode: Mode) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut i = 0;

    while i + 8 <= bits.len() {
        if bits[i..i + 8] == START_DATA_AUTH {
            match parse_data_or_auth(bits, i + 8, expected_mode) {
                Some((frame, consumed)) => {
                    debug!("found {:?} frame at bit {i}, unit {}", frame.kind, frame.unit_id);
                    frames.push(frame);
                    i += 8 + consumed;
                    continue;
                }
                None => {
                    i += 1;
                    continue;
                }
            }
        }
        if bits[i..i + 8] == START_ENCRYPTED {
            match parse_encrypted(bits, i + 8) {
                Some((frame, consumed)) => {
                    debug!("found {:?} frame at bit {i}, unit {}", frame.kind, frame.unit_id);
                    frames.push(frame);
                    i += 8 + consumed;
                    continue;
                }
                None => {
                    i += 1;
                    continue;
                }
            }
        }
        i += 1;
    }

    frames
}

fn parse_data_or_auth(bits: &[u8], mut cursor: usize, expected_mode: Mode) -> Option<(Frame, usize)> {
    let start = cursor;
    if cursor + 4 > bits.len() {
        return None;
    }
    let unit_id = read_uint(bits, cursor, 4) as u8;
    cursor += 4;

    match expected_mode {
        Mode::Data => {
            if cursor + 8 > bits.len() {
                return None;
            }
            let len = read_uint(bits, cursor, 8) as usize;
            cursor += 8;

            let body_bits = len * 8;
            if cursor + body_bits + 8 + 8 > bits.len() {
                return None;
            }
            let payload = bits_to_owned_bytes(bits, cursor, len)?;
            cursor += body_bits;

            let found_checksum = read_uint(bits, cursor, 8) as u8;
            cursor += 8;
            if found_checksum != checksum(&payload) {
                return None;
            }

            let end = read_uint(bits, cursor, 8) as u8;
            cursor += 8;
            if end != 0b1111_1111 {
                return None;
            }

            Some((
                Frame {
                    kind: PacketKind::Data,
                    unit_id,
                    body: payload,
                },
                cursor - start,
            ))
        }
        Mode::Auth => {
            if cursor + 32 + 8 + 8 > bits.len() {
                return None;
            }
            let token = bits_to_owned_bytes(bits, cursor, 4)?;
            cursor += 32;

            let found_checksum = read_uint(bits, cursor, 8) as u8;
            cursor += 8;
            if found_checksum != checksum(&token) {
                return None;
            }

            let end = read_uint(bits, cursor, 8) as u8;
            cursor += 8;
            if end != 0b1111_1111 {
                return None;
            }

            Some((
                Frame {
                    kind: PacketKind::Auth,
                    unit_id,
                    body: token,
                },
                cursor - start,
            ))
        }
    }
}

fn parse_encrypted(bits: &[u8], mut cursor: usize) -> Option<(Frame, usize)> {
    let start = cursor;
    if cursor + 4 + 8 > bits.len() {
        return None;
    }
    let unit_id = read_uint(bits, cursor, 4) as u8;
    cursor += 4;

    let len = read_uint(bits, cursor, 8) as usize;
    cursor += 8;
    if !(MIN_BLOB_LEN..=255).contains(&len) {
        return None;
    }

    let body_bits = len * 8;
    if cursor + body_bits + 8 + 8 > bits.len() {
        return None;
    }
    let blob = bits_to_owned_bytes(bits, cursor, len)?;
    cursor += body_bits;

    let found_checksum = read_uint(bits, cursor, 8) as u8;
    cursor += 8;
    if found_checksum != checksum(&blob) {
        return None;
    }

    let end = read_uint(bits, cursor, 8) as u8;
    cursor += 8;
    if end != 0b1111_1111 {
        return None;
    }

    Some((
        Frame {
            kind: PacketKind::Encrypted,
            unit_id,
            body: blob,
        },
        cursor - start,
    ))
}

fn bits_to_owned_bytes(bits: &[u8], offset: usize, len: usize) -> Option<Vec<u8>> {
    if offset + len * 8 > bits.len() {
        return None;
    }
    Some((0..len).map(|i| read_uint(bits, offset + i * 8, 8) as u8).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::push_uint;

    fn bits_for(pattern: [u8; 8]) -> Vec<u8> {
        pattern.to_vec()
    }

    #[test]
    fn finds_simple_data_frame() {
        let mut bits = bits_for(START_DATA_AUTH);
        push_uint(&mut bits, 1, 4); // unit id
        push_uint(&mut bits, 2, 8); // length
        bits.extend(crate::bits::bytes_to_bits(b"Hi"));
        push_uint(&mut bits, checksum(b"Hi") as u32, 8);
        bits.extend(END_FLAG);

        let frames = find_frames(&bits, Mode::Data);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, PacketKind::Data);
        assert_eq!(frames[0].unit_id, 1);
        assert_eq!(frames[0].body, b"Hi");
    }

    #[test]
    fn start_flag_pattern_inside_preamble_does_not_mis_sync() {
        // Preamble is 10101010 repeated; it never contains 11001100 or
        // 11110000 as a sub-sequence, so a scan across it should find
        // nothing until the real start flag.
        let mut bits = Vec::new();
        for _ in 0..4 {
            bits.extend([1, 0, 1, 0, 1, 0, 1, 0]);
        }
        bits.extend(START_DATA_AUTH);
        push_uint(&mut bits, 0, 4);
        push_uint(&mut bits, 0, 8);
        push_uint(&mut bits, checksum(&[]) as u32, 8);
        bits.extend(END_FLAG);

        let frames = find_frames(&bits, Mode::Data);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].body, Vec::<u8>::new());
    }

    #[test]
    fn bad_checksum_is_discarded_and_scan_continues() {
        let mut bits = bits_for(START_DATA_AUTH);
        push_uint(&mut bits, 0, 4);
        push_uint(&mut bits, 2, 8);
        bits.extend(crate::bits::bytes_to_bits(b"Hi"));
        push_uint(&mut bits, 0x00, 8); // wrong checksum
        bits.extend(END_FLAG);

        // Followed by a second, valid frame.
        bits.extend(START_DATA_AUTH);
        push_uint(&mut bits, 2, 4);
        push_uint(&mut bits, 2, 8);
        bits.extend(crate::bits::bytes_to_bits(b"Hi"));
        push_uint(&mut bits, checksum(b"Hi") as u32, 8);
        bits.extend(END_FLAG);

        let frames = find_frames(&bits, Mode::Data);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].unit_id, 2);
    }

    #[test]
    fn truncated_frame_is_discarded() {
        let mut bits = bits_for(START_DATA_AUTH);
        push_uint(&mut bits, 0, 4);
        push_uint(&mut bits, 10, 8); // claims 10 bytes but none follow
        let frames = find_frames(&bits, Mode::Data);
        assert!(frames.is_empty());
    }

    #[test]
    fn returns_multiple_frames_in_order() {
        let mut bits = Vec::new();
        for id in 0..3u32 {
            bits.extend(START_DATA_AUTH);
            push_uint(&mut bits, id, 4);
            push_uint(&mut bits, 1, 8);
            bits.extend(crate::bits::bytes_to_bits(&[id as u8]));
            push_uint(&mut bits, checksum(&[id as u8]) as u32, 8);
            bits.extend(END_FLAG);
        }
        let frames = find_frames(&bits, Mode::Data);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].unit_id, 0);
        assert_eq!(frames[1].unit_id, 1);
        assert_eq!(frames[2].unit_id, 2);
    }

    #[test]
    fn no_start_flag_yields_no_frames() {
        let bits = vec![0u8; 64];
        assert!(find_frames(&bits, Mode::Data).is_empty());
    }
}
