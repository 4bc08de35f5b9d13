use std::io::{self, Write};

use super::command::Response;
use super::{CHAR_CMDSEP, CHAR_END, CHAR_PAYLOADSEP, CHAR_START};

/// Serialize one response into its wire bytes.
///
/// Same framing as requests: start marker, one-letter tag, ':' where a
/// payload follows, raw big-endian fields, terminator.
pub fn encode(resp: &Response) -> Vec<u8> {
    let mut out = Vec::with_capacity(16);
    out.push(CHAR_START);
    match resp {
        Response::Done => out.push(b'K'),
        Response::Battery { millivolts } => {
            out.push(b'B');
            out.push(CHAR_CMDSEP);
            out.extend_from_slice(&millivolts.to_be_bytes());
        }
        Response::Ping { angle, range_mm } => {
            out.push(b'P');
            out.push(CHAR_CMDSEP);
            out.extend_from_slice(&angle.to_be_bytes());
            out.push(CHAR_PAYLOADSEP);
            out.extend_from_slice(&range_mm.to_be_bytes());
        }
        Response::LinkReset => out.extend_from_slice(b"RST"),
    }
    out.push(CHAR_END);
    out
}

pub fn write_response<W: Write>(w: &mut W, resp: &Response) -> io::Result<()> {
    w.write_all(&encode(resp))?;
    w.flush()
}

/* ---------- tests ---------- */
