pub mod command;
pub mod decode;
pub mod encode;
pub mod parser;

/// Sent at the beginning of each frame, request and response alike.
pub const CHAR_START: u8 = b'#';
/// Separates the command byte from the payload.
pub const CHAR_CMDSEP: u8 = b':';
/// Separates individual payload fields.
pub const CHAR_PAYLOADSEP: u8 = b',';
/// Terminates a frame.
pub const CHAR_END: u8 = b'\n';

use thiserror::Error;

/// Anything that can go wrong between the wire and a dispatchable command.
///
/// None of these are reported back to the sender; the protocol stays silent
/// on malformed input and the engine recovers by delay + reset.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error(transparent)]
    Frame(#[from] parser::FrameError),
    #[error(transparent)]
    Decode(#[from] decode::DecodeError),
}
