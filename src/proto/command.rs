/// The fixed set of recognized command identifier bytes.
///
/// Membership here is the whole of command validation: an identifier
/// outside this set never reaches the decoder, whatever its payload
/// happens to look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandId {
    Battery,
    TurnLeft,
    TurnRight,
    MoveForward,
    MoveBackward,
    DisplayClear,
    DisplayWrite,
    SonarPing,
    SonarSweep,
}

impl CommandId {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'b' => Some(CommandId::Battery),
            b'l' => Some(CommandId::TurnLeft),
            b'r' => Some(CommandId::TurnRight),
            b'm' => Some(CommandId::MoveForward),
            b'e' => Some(CommandId::MoveBackward),
            b'c' => Some(CommandId::DisplayClear),
            b'w' => Some(CommandId::DisplayWrite),
            b'p' => Some(CommandId::SonarPing),
            b's' => Some(CommandId::SonarSweep),
            _ => None,
        }
    }
}

/// One decoded, dispatchable command. Produced once per frame, consumed
/// once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `#b:\n` — report battery voltage.
    Battery,
    /// `#l:[angle]\n` — turn left by `degrees`.
    TurnLeft { degrees: i32 },
    /// `#r:[angle]\n` — turn right by `degrees`.
    TurnRight { degrees: i32 },
    /// `#m:[distance]\n` — drive forward by `millimeters`.
    MoveForward { millimeters: i32 },
    /// `#e:[distance]\n` — drive backward by `millimeters`.
    MoveBackward { millimeters: i32 },
    /// `#c:\n` — clear the display.
    DisplayClear,
    /// `#w:[x],[y],[text]\n` — write `text` at display cell (x, y).
    ///
    /// x and y travel as 32-bit fields but address byte-sized display
    /// cells; the decoder truncates them.
    DisplayWrite { x: u8, y: u8, text: Vec<u8> },
    /// `#p:[angle]\n` — point the sensor and take one averaged reading.
    SonarPing { angle: i32 },
    /// `#s:[start],[end],[step]\n` — ping every `step` degrees from
    /// `start_angle` to `end_angle` inclusive.
    ///
    /// The step's sign must match the sweep direction; this is a caller
    /// contract, not validated here.
    SonarSweep {
        start_angle: i32,
        end_angle: i32,
        step: i8,
    },
}

/// One outbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// `#K\n` — the queued command has been executed.
    Done,
    /// `#B:[f32]\n` — battery voltage in millivolts.
    Battery { millivolts: f32 },
    /// `#P:[angle],[range]\n` — one ranging measurement, range in mm.
    Ping { angle: i32, range_mm: i32 },
    /// `#RST\n` — the link has been (re)initialized.
    LinkReset,
}
