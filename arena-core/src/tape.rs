//! Recorded play sessions.
//!
//! Layout, integers little-endian:
//! `magic:u32 | version:u8 | 0u8 x3 | seed:u32 | ticks:u32`, one input byte
//! per tick, then `score:u32 | rng_state:u32 | crc32:u32`. The checksum
//! covers the header and the inputs.

use serde::{Deserialize, Serialize};

use crate::constants::{TAPE_FOOTER_SIZE, TAPE_HEADER_SIZE, TAPE_MAGIC, TAPE_VERSION};
use crate::error::TapeError;

/// Bit 7 is never produced by [`encode_input_byte`].
const INPUT_RESERVED_BITS: u8 = 0x80;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeHeader {
    pub magic: u32,
    pub version: u8,
    pub seed: u32,
    pub tick_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeFooter {
    pub final_score: u32,
    pub final_rng_state: u32,
    pub checksum: u32,
}

/// A parsed tape borrowing its inputs from the source buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TapeView<'a> {
    pub header: TapeHeader,
    pub inputs: &'a [u8],
    pub footer: TapeFooter,
}

/// Operator input sampled once per play tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    pub left: bool,
    pub right: bool,
    pub fire: bool,
    pub toggle_autopilot: bool,
    pub quit: bool,
    pub restart: bool,
    pub view_leaderboard: bool,
}

impl InputFrame {
    /// Flags in bit order, lowest first.
    fn flags(self) -> [bool; 7] {
        [
            self.left,
            self.right,
            self.fire,
            self.toggle_autopilot,
            self.quit,
            self.restart,
            self.view_leaderboard,
        ]
    }
}

pub fn encode_input_byte(input: InputFrame) -> u8 {
    input
        .flags()
        .into_iter()
        .enumerate()
        .fold(0, |byte, (bit, set)| byte | (u8::from(set) << bit))
}

pub fn decode_input_byte(byte: u8) -> InputFrame {
    let bit = |n: u8| byte & (1 << n) != 0;
    InputFrame {
        left: bit(0),
        right: bit(1),
        fire: bit(2),
        toggle_autopilot: bit(3),
        quit: bit(4),
        restart: bit(5),
        view_leaderboard: bit(6),
    }
}

pub fn parse_tape(bytes: &[u8], max_ticks: u32) -> Result<TapeView<'_>, TapeError> {
    let min = TAPE_HEADER_SIZE + TAPE_FOOTER_SIZE;
    if bytes.len() < min {
        return Err(TapeError::TapeTooShort {
            actual: bytes.len(),
            min,
        });
    }

    let header = TapeHeader {
        magic: le_u32(bytes, 0),
        version: bytes[4],
        seed: le_u32(bytes, 8),
        tick_count: le_u32(bytes, 12),
    };
    if header.magic != TAPE_MAGIC {
        return Err(TapeError::InvalidMagic {
            found: header.magic,
        });
    }
    if header.version != TAPE_VERSION {
        return Err(TapeError::UnsupportedVersion {
            found: header.version,
        });
    }
    if bytes[5..8].iter().any(|byte| *byte != 0) {
        return Err(TapeError::HeaderReservedNonZero);
    }
    if header.tick_count == 0 || header.tick_count > max_ticks {
        return Err(TapeError::TickCountOutOfRange {
            tick_count: header.tick_count,
            max_ticks,
        });
    }

    let body_end = TAPE_HEADER_SIZE + header.tick_count as usize;
    if bytes.len() != body_end + TAPE_FOOTER_SIZE {
        return Err(TapeError::TapeLengthMismatch {
            expected: body_end + TAPE_FOOTER_SIZE,
            actual: bytes.len(),
        });
    }

    let inputs = &bytes[TAPE_HEADER_SIZE..body_end];
    if let Some(tick) = inputs
        .iter()
        .position(|byte| byte & INPUT_RESERVED_BITS != 0)
    {
        return Err(TapeError::ReservedInputBitsNonZero {
            tick: tick as u32,
            byte: inputs[tick],
        });
    }

    let footer = TapeFooter {
        final_score: le_u32(bytes, body_end),
        final_rng_state: le_u32(bytes, body_end + 4),
        checksum: le_u32(bytes, body_end + 8),
    };
    let computed = crc32(&bytes[..body_end]);
    if footer.checksum != computed {
        return Err(TapeError::CrcMismatch {
            stored: footer.checksum,
            computed,
        });
    }

    Ok(TapeView {
        header,
        inputs,
        footer,
    })
}

pub fn serialize_tape(seed: u32, inputs: &[u8], final_score: u32, final_rng_state: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(TAPE_HEADER_SIZE + inputs.len() + TAPE_FOOTER_SIZE);
    data.extend_from_slice(&TAPE_MAGIC.to_le_bytes());
    data.extend_from_slice(&[TAPE_VERSION, 0, 0, 0]);
    data.extend_from_slice(&seed.to_le_bytes());
    data.extend_from_slice(&(inputs.len() as u32).to_le_bytes());
    data.extend_from_slice(inputs);
    let checksum = crc32(&data);
    for word in [final_score, final_rng_state, checksum] {
        data.extend_from_slice(&word.to_le_bytes());
    }
    data
}

/// Reflected CRC-32 (polynomial `0xEDB88320`), bitwise.
pub fn crc32(data: &[u8]) -> u32 {
    !data.iter().fold(!0u32, |crc, &byte| {
        (0..8).fold(crc ^ u32::from(byte), |c, _| {
            (c >> 1) ^ (0xEDB8_8320 & 0u32.wrapping_sub(c & 1))
        })
    })
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: u32 = 0xABCD_1234;

    fn tape(inputs: &[u8]) -> Vec<u8> {
        serialize_tape(SEED, inputs, 31, 0x1111_2222)
    }

    #[test]
    fn crc_matches_the_standard_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn input_bits_follow_the_frame_fields() {
        let frame = InputFrame {
            fire: true,
            view_leaderboard: true,
            ..InputFrame::default()
        };
        assert_eq!(encode_input_byte(frame), 0x44);
        assert_eq!(decode_input_byte(0x44), frame);
        for byte in 0u8..=0x7F {
            assert_eq!(encode_input_byte(decode_input_byte(byte)), byte);
        }
    }

    #[test]
    fn serialized_tape_parses_back() {
        let inputs = [0x00u8, 0x05, 0x0A, 0x40];
        let bytes = tape(&inputs);
        assert_eq!(bytes.len(), TAPE_HEADER_SIZE + inputs.len() + TAPE_FOOTER_SIZE);

        let view = parse_tape(&bytes, 100).unwrap();
        assert_eq!(view.header.seed, SEED);
        assert_eq!(view.header.tick_count, 4);
        assert_eq!(view.inputs, inputs);
        assert_eq!(view.footer.final_score, 31);
        assert_eq!(view.footer.final_rng_state, 0x1111_2222);
        assert_eq!(view.footer.checksum, crc32(&bytes[..TAPE_HEADER_SIZE + 4]));
    }

    #[test]
    fn malformed_tapes_name_what_is_wrong() {
        let short = [0u8; TAPE_HEADER_SIZE + TAPE_FOOTER_SIZE - 1];
        assert!(matches!(
            parse_tape(&short, 100),
            Err(TapeError::TapeTooShort { .. })
        ));

        let mut bytes = tape(&[0]);
        bytes[0] ^= 0x01;
        assert!(matches!(
            parse_tape(&bytes, 100),
            Err(TapeError::InvalidMagic { .. })
        ));

        let mut bytes = tape(&[0]);
        bytes[4] = TAPE_VERSION + 1;
        assert_eq!(
            parse_tape(&bytes, 100),
            Err(TapeError::UnsupportedVersion {
                found: TAPE_VERSION + 1
            })
        );

        let mut bytes = tape(&[0]);
        bytes[6] = 1;
        assert_eq!(parse_tape(&bytes, 100), Err(TapeError::HeaderReservedNonZero));

        let mut longer = tape(&[0]);
        longer.push(0);
        assert!(matches!(
            parse_tape(&longer, 100),
            Err(TapeError::TapeLengthMismatch { .. })
        ));
    }

    #[test]
    fn tick_count_must_be_positive_and_bounded() {
        let mut bytes = tape(&[0]);
        bytes[12..16].copy_from_slice(&0u32.to_le_bytes());
        assert_eq!(
            parse_tape(&bytes, 100),
            Err(TapeError::TickCountOutOfRange {
                tick_count: 0,
                max_ticks: 100
            })
        );

        assert_eq!(
            parse_tape(&tape(&[0, 0]), 1),
            Err(TapeError::TickCountOutOfRange {
                tick_count: 2,
                max_ticks: 1
            })
        );
    }

    #[test]
    fn reserved_input_bit_is_caught_before_the_checksum() {
        let mut bytes = tape(&[0, 0]);
        bytes[TAPE_HEADER_SIZE + 1] = 0x81;
        assert_eq!(
            parse_tape(&bytes, 100),
            Err(TapeError::ReservedInputBitsNonZero { tick: 1, byte: 0x81 })
        );
    }

    #[test]
    fn corrupted_checksum_is_reported() {
        let mut bytes = tape(&[0x01]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(matches!(
            parse_tape(&bytes, 100),
            Err(TapeError::CrcMismatch { .. })
        ));
    }
}
