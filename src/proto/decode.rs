use thiserror::Error;

use super::CHAR_PAYLOADSEP;
use super::command::{Command, CommandId};
use super::parser::RawFrame;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unrecognized command byte 0x{0:02X}")]
    UnknownCommand(u8),
    #[error("{cmd:?}: expected {expected} payload bytes, got {got}")]
    BadLength {
        cmd: CommandId,
        expected: usize,
        got: usize,
    },
    #[error("{cmd:?}: payload too short ({got} bytes)")]
    TooShort { cmd: CommandId, got: usize },
    #[error("{cmd:?}: missing ',' separator at offset {offset}")]
    BadSeparator { cmd: CommandId, offset: usize },
    #[error("sweep step size must be non-zero")]
    ZeroStep,
}

/// Validate the identifier and decode the payload into a typed command.
///
/// Multi-byte integers travel as 4 raw bytes, MSB first — a binary
/// sub-protocol inside the text-delimited frame. Length and separator
/// positions are checked exactly; there is no partial decode.
pub fn decode(frame: &RawFrame) -> Result<Command, DecodeError> {
    let cmd =
        CommandId::from_byte(frame.command()).ok_or(DecodeError::UnknownCommand(frame.command()))?;
    let p = frame.payload();

    match cmd {
        CommandId::Battery => {
            expect_len(cmd, p, 0)?;
            Ok(Command::Battery)
        }
        CommandId::DisplayClear => {
            expect_len(cmd, p, 0)?;
            Ok(Command::DisplayClear)
        }
        CommandId::TurnLeft => {
            expect_len(cmd, p, 4)?;
            Ok(Command::TurnLeft { degrees: be_i32(p) })
        }
        CommandId::TurnRight => {
            expect_len(cmd, p, 4)?;
            Ok(Command::TurnRight { degrees: be_i32(p) })
        }
        CommandId::MoveForward => {
            expect_len(cmd, p, 4)?;
            Ok(Command::MoveForward {
                millimeters: be_i32(p),
            })
        }
        CommandId::MoveBackward => {
            expect_len(cmd, p, 4)?;
            Ok(Command::MoveBackward {
                millimeters: be_i32(p),
            })
        }
        CommandId::SonarPing => {
            expect_len(cmd, p, 4)?;
            Ok(Command::SonarPing { angle: be_i32(p) })
        }
        CommandId::DisplayWrite => {
            // 4-byte x, ',', 4-byte y, ',', then at least one text byte
            if p.len() <= 10 {
                return Err(DecodeError::TooShort { cmd, got: p.len() });
            }
            expect_sep(cmd, p, 4)?;
            expect_sep(cmd, p, 9)?;
            Ok(Command::DisplayWrite {
                x: be_i32(&p[0..4]) as u8,
                y: be_i32(&p[5..9]) as u8,
                text: p[10..].to_vec(),
            })
        }
        CommandId::SonarSweep => {
            // 4-byte start, ',', 4-byte end, ',', 1-byte step
            expect_len(cmd, p, 11)?;
            expect_sep(cmd, p, 4)?;
            expect_sep(cmd, p, 9)?;
            let step = p[10] as i8;
            if step == 0 {
                return Err(DecodeError::ZeroStep);
            }
            Ok(Command::SonarSweep {
                start_angle: be_i32(&p[0..4]),
                end_angle: be_i32(&p[5..9]),
                step,
            })
        }
    }
}

fn be_i32(bytes: &[u8]) -> i32 {
    i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn expect_len(cmd: CommandId, payload: &[u8], expected: usize) -> Result<(), DecodeError> {
    if payload.len() != expected {
        return Err(DecodeError::BadLength {
            cmd,
            expected,
            got: payload.len(),
        });
    }
    Ok(())
}

fn expect_sep(cmd: CommandId, payload: &[u8], offset: usize) -> Result<(), DecodeError> {
    if payload[offset] != CHAR_PAYLOADSEP {
        return Err(DecodeError::BadSeparator { cmd, offset });
    }
    Ok(())
}

/* ---------- tests ---------- */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::parser::FrameParser;

    fn frame(bytes: &[u8]) -> RawFrame {
        let mut p = FrameParser::new();
        for &b in bytes {
            p.offer(b).unwrap();
        }
        p.frame().expect("frame not complete").clone()
    }

    #[test]
    fn battery_takes_no_payload() {
        assert_eq!(decode(&frame(b"#b:\n")).unwrap(), Command::Battery);
        assert!(matches!(
            decode(&frame(b"#b:\x01\n")),
            Err(DecodeError::BadLength {
                cmd: CommandId::Battery,
                expected: 0,
                got: 1,
            })
        ));
    }

    #[test]
    fn turn_angles_are_big_endian() {
        assert_eq!(
            decode(&frame(b"#l:\x00\x00\x00\x2D\n")).unwrap(),
            Command::TurnLeft { degrees: 45 }
        );
        assert_eq!(
            decode(&frame(b"#r:\x00\x00\x01\x00\n")).unwrap(),
            Command::TurnRight { degrees: 256 }
        );
    }

    #[test]
    fn negative_angles_decode() {
        // 0xFFFFFFC4 == -60
        assert_eq!(
            decode(&frame(b"#p:\xFF\xFF\xFF\xC4\n")).unwrap(),
            Command::SonarPing { angle: -60 }
        );
    }

    #[test]
    fn move_distances_decode() {
        assert_eq!(
            decode(&frame(b"#m:\x00\x00\x03\xE8\n")).unwrap(),
            Command::MoveForward { millimeters: 1000 }
        );
        assert_eq!(
            decode(&frame(b"#e:\x00\x00\x00\x64\n")).unwrap(),
            Command::MoveBackward { millimeters: 100 }
        );
    }

    #[test]
    fn wrong_length_is_rejected_for_every_fixed_layout() {
        for cmd in [b'l', b'r', b'm', b'e', b'p'] {
            let mut short = vec![b'#', cmd, b':'];
            short.extend_from_slice(b"\x00\x00\x2D\n");
            assert!(matches!(
                decode(&frame(&short)),
                Err(DecodeError::BadLength { .. })
            ));

            let mut long = vec![b'#', cmd, b':'];
            long.extend_from_slice(b"\x00\x00\x00\x00\x2D\n");
            assert!(matches!(
                decode(&frame(&long)),
                Err(DecodeError::BadLength { .. })
            ));
        }
    }

    #[test]
    fn display_write_splits_positions_and_text() {
        let cmd = decode(&frame(
            b"#w:\x00\x00\x00\x02,\x00\x00\x00\x01,hi there\n",
        ))
        .unwrap();
        assert_eq!(
            cmd,
            Command::DisplayWrite {
                x: 2,
                y: 1,
                text: b"hi there".to_vec(),
            }
        );
    }

    #[test]
    fn display_write_truncates_wide_positions() {
        let cmd = decode(&frame(b"#w:\x00\x00\x01\x07,\x00\x00\x00\x00,A\n")).unwrap();
        // 0x107 addresses a byte-sized cell: truncates to 0x07
        assert_eq!(
            cmd,
            Command::DisplayWrite {
                x: 7,
                y: 0,
                text: b"A".to_vec(),
            }
        );
    }

    #[test]
    fn display_write_needs_both_separators() {
        let bad = frame(b"#w:\x00\x00\x00\x02;\x00\x00\x00\x01,hi there\n");
        assert!(matches!(
            decode(&bad),
            Err(DecodeError::BadSeparator {
                cmd: CommandId::DisplayWrite,
                offset: 4,
            })
        ));
        let bad = frame(b"#w:\x00\x00\x00\x02,\x00\x00\x00\x01;hi there\n");
        assert!(matches!(
            decode(&bad),
            Err(DecodeError::BadSeparator { offset: 9, .. })
        ));
    }

    #[test]
    fn display_write_rejects_short_payload() {
        // 10 bytes: positions and separators but no text
        let bad = frame(b"#w:\x00\x00\x00\x02,\x00\x00\x00\x01,\n");
        assert!(matches!(
            decode(&bad),
            Err(DecodeError::TooShort { got: 10, .. })
        ));
    }

    #[test]
    fn sweep_decodes_signed_fields() {
        let cmd = decode(&frame(b"#s:\xFF\xFF\xFF\xC4,\x00\x00\x00\x3C,\x02\n")).unwrap();
        assert_eq!(
            cmd,
            Command::SonarSweep {
                start_angle: -60,
                end_angle: 60,
                step: 2,
            }
        );
        let cmd = decode(&frame(b"#s:\x00\x00\x00\x3C,\xFF\xFF\xFF\xC4,\xFE\n")).unwrap();
        assert_eq!(
            cmd,
            Command::SonarSweep {
                start_angle: 60,
                end_angle: -60,
                step: -2,
            }
        );
    }

    #[test]
    fn sweep_is_exactly_eleven_bytes() {
        let bad = frame(b"#s:\xFF\xFF\xFF\xC4,\x00\x00\x00\x3C,\n");
        assert!(matches!(
            decode(&bad),
            Err(DecodeError::BadLength {
                cmd: CommandId::SonarSweep,
                expected: 11,
                got: 10,
            })
        ));
    }

    #[test]
    fn sweep_zero_step_is_rejected() {
        let bad = frame(b"#s:\xFF\xFF\xFF\xC4,\x00\x00\x00\x3C,\x00\n");
        assert!(matches!(decode(&bad), Err(DecodeError::ZeroStep)));
    }

    #[test]
    fn unknown_identifier_fails_validation() {
        assert!(matches!(
            decode(&frame(b"#x:\n")),
            Err(DecodeError::UnknownCommand(b'x'))
        ));
        // even with a payload that would decode under another command's shape
        assert!(matches!(
            decode(&frame(b"#x:\x00\x00\x00\x2D\n")),
            Err(DecodeError::UnknownCommand(b'x'))
        ));
    }
}
