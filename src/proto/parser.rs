use thiserror::Error;

use super::{CHAR_CMDSEP, CHAR_END, CHAR_START};

/// Fixed capacity of the payload buffer, in bytes.
pub const PAYLOAD_CAPACITY: usize = 20;

/// Protocol state across one full command cycle.
///
/// Declaration order is the progression order: the parser owns everything
/// strictly below `FrameComplete`, the command loop owns `FrameComplete`
/// and later. `Error` sorts above all regular states so that a faulted
/// parser also stops accepting input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProtocolState {
    /// Ready for a new frame.
    #[default]
    Idle,
    /// Got the start marker, expecting the command byte.
    AwaitingCommandByte,
    /// Got the command byte, expecting the ':' separator.
    CommandByteReceived,
    /// Collecting payload bytes until the terminator.
    AwaitingPayload,
    /// Terminator seen; frame is ready for the command loop.
    FrameComplete,
    /// Payload decoded into a typed command.
    Decoded,
    /// Handler ran to completion.
    Dispatched,
    /// Unexpected input; cleared only by the loop's recovery path.
    Error,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("unexpected byte 0x{byte:02X} in state {state:?}")]
    UnexpectedByte { state: ProtocolState, byte: u8 },
    #[error("payload byte 0x{byte:02X} past capacity of {capacity}")]
    Overflow { byte: u8, capacity: usize },
}

/// One collected frame: the command identifier byte plus the raw payload
/// bytes found between ':' and the terminator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFrame {
    command: u8,
    payload: Vec<u8>,
}

impl RawFrame {
    pub fn command(&self) -> u8 {
        self.command
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Append-only; signals overflow instead of growing past capacity.
    fn push(&mut self, byte: u8) -> Result<(), FrameError> {
        if self.payload.len() >= PAYLOAD_CAPACITY {
            return Err(FrameError::Overflow {
                byte,
                capacity: PAYLOAD_CAPACITY,
            });
        }
        self.payload.push(byte);
        Ok(())
    }

    fn clear(&mut self) {
        self.command = 0;
        self.payload.clear();
    }
}

/// Byte-at-a-time frame delimiter.
///
/// `offer` never blocks and is a no-op once the state reaches
/// `FrameComplete` or `Error`; the caller must hold further input until
/// the frame has been consumed and `reset` was called.
#[derive(Debug, Default)]
pub struct FrameParser {
    state: ProtocolState,
    frame: RawFrame,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ProtocolState {
        self.state
    }

    /// True while the parser still wants input for the current frame.
    pub fn accepting(&self) -> bool {
        self.state < ProtocolState::FrameComplete
    }

    /// Feed the next input byte and advance the state machine.
    ///
    /// Returns the new state, or the structured framing error that moved
    /// the parser into `Error`. Bytes offered while not accepting are
    /// ignored.
    pub fn offer(&mut self, byte: u8) -> Result<ProtocolState, FrameError> {
        use ProtocolState::*;

        if !self.accepting() {
            return Ok(self.state);
        }

        match self.state {
            Idle => {
                if byte == CHAR_START {
                    self.state = AwaitingCommandByte;
                } else {
                    return self.fail(byte);
                }
            }
            AwaitingCommandByte => {
                self.frame.command = byte;
                self.state = CommandByteReceived;
            }
            CommandByteReceived => {
                if byte == CHAR_CMDSEP {
                    self.state = AwaitingPayload;
                } else {
                    return self.fail(byte);
                }
            }
            AwaitingPayload => {
                if byte == CHAR_END {
                    self.state = FrameComplete;
                } else if let Err(e) = self.frame.push(byte) {
                    self.state = Error;
                    return Err(e);
                }
            }
            // accepting() excludes everything from FrameComplete up
            FrameComplete | Decoded | Dispatched | Error => unreachable!(),
        }

        Ok(self.state)
    }

    /// The completed frame, available from `FrameComplete` onwards.
    pub fn frame(&self) -> Option<&RawFrame> {
        (self.state >= ProtocolState::FrameComplete && self.state != ProtocolState::Error)
            .then_some(&self.frame)
    }

    /// Loop-side transitions for the synchronous half of the cycle.
    pub fn mark_decoded(&mut self) {
        debug_assert_eq!(self.state, ProtocolState::FrameComplete);
        self.state = ProtocolState::Decoded;
    }

    pub fn mark_dispatched(&mut self) {
        debug_assert_eq!(self.state, ProtocolState::Decoded);
        self.state = ProtocolState::Dispatched;
    }

    /// Discard the current frame and return to `Idle`. Called exactly once
    /// per completed or aborted cycle.
    pub fn reset(&mut self) {
        self.frame.clear();
        self.state = ProtocolState::Idle;
    }

    fn fail(&mut self, byte: u8) -> Result<ProtocolState, FrameError> {
        let err = FrameError::UnexpectedByte {
            state: self.state,
            byte,
        };
        self.state = ProtocolState::Error;
        Err(err)
    }
}

/* ---------- tests ---------- */
