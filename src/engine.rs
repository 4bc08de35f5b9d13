use std::io::{self, Read, Write};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info, trace, warn};
use serialport::SerialPort as _;

use crate::actuator::{Actuator, SimActuator, Turn};
use crate::cli::{ServeOpts, SweepOpts};
use crate::port::open_port;
use crate::proto::ProtocolError;
use crate::proto::command::{Command, Response};
use crate::proto::decode::decode;
use crate::proto::encode::write_response;
use crate::proto::parser::{FrameError, FrameParser, ProtocolState, RawFrame};

// Calibrated ms of actuation per requested unit. The chassis has slightly
// asymmetric motors, hence the per-direction values.
const TURN_LEFT_MS_PER_DEG: f64 = 440.0 / 45.0;
const TURN_RIGHT_MS_PER_DEG: f64 = 460.0 / 45.0;
const FORWARD_MS_PER_MM: f64 = 2730.0 / 200.0;
const BACKWARD_MS_PER_MM: f64 = 2550.0 / 200.0;

/// Servo settle time before sampling, so servo noise stays out of the
/// reading.
const SONAR_SETTLE: Duration = Duration::from_millis(10);
const SAMPLES_PER_PING: i32 = 5;

/// The synchronous half of the protocol: validates, decodes, dispatches
/// one command at a time and writes the response frames.
///
/// Handlers block for the duration of the physical action; no input is
/// serviced meanwhile. Handlers have no failure mode of their own — only
/// response I/O can fail, and that tears down the serving loop.
pub struct Engine<A, W> {
    actuator: A,
    out: W,
    recovery: Duration,
}

impl<A: Actuator, W: Write> Engine<A, W> {
    pub fn new(actuator: A, out: W, recovery: Duration) -> Self {
        Self {
            actuator,
            out,
            recovery,
        }
    }

    /// Run exactly one command to completion and emit its responses.
    pub fn dispatch(&mut self, cmd: Command) -> Result<()> {
        info!("dispatch {:?}", cmd);
        match cmd {
            Command::Battery => {
                let millivolts = self.actuator.battery_level();
                self.respond(&Response::Battery { millivolts })?;
                self.respond(&Response::Done)
            }
            Command::TurnLeft { degrees } => {
                self.actuator
                    .turn(Turn::Left, scaled(TURN_LEFT_MS_PER_DEG, degrees));
                self.actuator.stop();
                self.respond(&Response::Done)
            }
            Command::TurnRight { degrees } => {
                self.actuator
                    .turn(Turn::Right, scaled(TURN_RIGHT_MS_PER_DEG, degrees));
                self.actuator.stop();
                self.respond(&Response::Done)
            }
            Command::MoveForward { millimeters } => {
                self.actuator
                    .drive_forward(scaled(FORWARD_MS_PER_MM, millimeters));
                self.actuator.stop();
                self.respond(&Response::Done)
            }
            Command::MoveBackward { millimeters } => {
                self.actuator
                    .drive_backward(scaled(BACKWARD_MS_PER_MM, millimeters));
                self.actuator.stop();
                self.respond(&Response::Done)
            }
            Command::DisplayClear => {
                self.actuator.display_clear();
                self.respond(&Response::Done)
            }
            Command::DisplayWrite { x, y, text } => {
                self.actuator.display_write_at(x, y, &text);
                self.respond(&Response::Done)
            }
            Command::SonarPing { angle } => {
                self.ping(angle)?;
                self.respond(&Response::Done)
            }
            Command::SonarSweep {
                start_angle,
                end_angle,
                step,
            } => {
                // Truncating division; a step sign that fights the sweep
                // direction yields a non-positive count and degenerates to
                // a bare ack (caller contract, kept unvalidated).
                let steps = sweep_steps(start_angle, end_angle, step);
                let mut angle = start_angle as i64;
                for _ in 0..steps.max(0) {
                    self.ping(angle as i32)?;
                    angle += step as i64;
                }
                self.respond(&Response::Done)
            }
        }
    }

    /// Point the sensor, settle, average a burst of samples and report.
    fn ping(&mut self, angle: i32) -> Result<()> {
        self.actuator.point_sensor(angle);
        thread::sleep(SONAR_SETTLE);

        let mut sum: i64 = 0;
        for _ in 0..SAMPLES_PER_PING {
            sum += self.actuator.sample_range() as i64;
        }
        let range_mm = (sum / SAMPLES_PER_PING as i64) as i32;

        self.respond(&Response::Ping { angle, range_mm })?;

        let line = format!("{} {} mm ", angle, range_mm);
        self.actuator.display_write_at(0, 0, line.as_bytes());
        Ok(())
    }

    /// Fixed-delay error recovery. Nothing goes out on the wire for any
    /// of the error kinds; the sender only notices the silence.
    pub fn recover(&mut self, err: ProtocolError) {
        warn!("protocol error: {err}; resetting in {:?}", self.recovery);
        thread::sleep(self.recovery);
    }

    /// One-shot `#RST` notice when the link comes up, so the remote host
    /// can resynchronize.
    pub fn announce_link_reset(&mut self) -> Result<()> {
        self.respond(&Response::LinkReset)
    }

    fn respond(&mut self, resp: &Response) -> Result<()> {
        debug!("tx {:?}", resp);
        write_response(&mut self.out, resp).context("serial write")
    }
}

fn scaled(ms_per_unit: f64, amount: i32) -> Duration {
    Duration::from_millis((ms_per_unit * amount as f64).max(0.0) as u64)
}

/// Number of pings in a sweep, start and end inclusive.
///
/// Computed in i64: wire angles span the full i32 range, so the span
/// subtraction (and `i32::MIN / -1`) would otherwise overflow.
fn sweep_steps(start_angle: i32, end_angle: i32, step: i8) -> i64 {
    1 + (end_angle as i64 - start_angle as i64) / step as i64
}

/* ---------- shared protocol state ---------- */

/// The single `ProtocolState` shared between the asynchronous byte
/// producer and the command loop.
///
/// The producer may only feed the parser while the state is strictly
/// earlier than `FrameComplete`; it blocks on the condvar otherwise, which
/// is what enforces one-frame-at-a-time and pushes back-pressure onto the
/// transport. The consumer picks the cycle up at `FrameComplete` (or
/// `Error`) and hands it back by resetting to `Idle`.
#[derive(Default)]
struct Shared {
    inner: Mutex<Inner>,
    cond: Condvar,
}

#[derive(Default)]
struct Inner {
    parser: FrameParser,
    fault: Option<FrameError>,
}

impl Shared {
    /// Producer side: feed one byte, waiting for the parser to be ready.
    fn offer(&self, byte: u8) {
        let mut inner = self.inner.lock().unwrap();
        while !inner.parser.accepting() {
            inner = self.cond.wait(inner).unwrap();
        }
        trace!("rx byte 0x{byte:02X}");
        match inner.parser.offer(byte) {
            Ok(ProtocolState::FrameComplete) => self.cond.notify_all(),
            Ok(_) => {}
            Err(e) => {
                inner.fault = Some(e);
                self.cond.notify_all();
            }
        }
    }

    /// Consumer side: block until a frame is complete or the parser
    /// faulted.
    fn wait_complete(&self) -> Result<RawFrame, FrameError> {
        let mut inner = self.inner.lock().unwrap();
        loop {
            match inner.parser.state() {
                ProtocolState::FrameComplete => {
                    return Ok(inner.parser.frame().cloned().unwrap_or_default());
                }
                ProtocolState::Error => {
                    // offer() records the fault before it notifies
                    return Err(inner
                        .fault
                        .take()
                        .expect("Error state always records a fault"));
                }
                _ => inner = self.cond.wait(inner).unwrap(),
            }
        }
    }

    fn mark_decoded(&self) {
        self.inner.lock().unwrap().parser.mark_decoded();
    }

    fn mark_dispatched(&self) {
        self.inner.lock().unwrap().parser.mark_dispatched();
    }

    /// End of cycle: back to `Idle`, wake the producer.
    fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.parser.reset();
        inner.fault = None;
        self.cond.notify_all();
    }
}

fn pump_bytes<R: Read>(mut reader: R, shared: Arc<Shared>) {
    let mut buf = [0u8; 64];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                warn!("serial read: end of stream; stopping byte pump");
                return;
            }
            Ok(n) => {
                for &b in &buf[..n] {
                    shared.offer(b);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) => {
                warn!("serial read: {e}; stopping byte pump");
                return;
            }
        }
    }
}

/* ---------- entry points ---------- */

/// Serve the command protocol on a serial device, driving the simulated
/// actuator. Bytes arrive on a pump thread; commands run on this one.
pub fn serve(opts: ServeOpts) -> Result<()> {
    let port = open_port(&opts.ser)?;
    let reader = port.try_clone().context("cloning serial port")?;

    let shared = Arc::new(Shared::default());
    let producer = Arc::clone(&shared);
    thread::spawn(move || pump_bytes(reader, producer));

    let mut engine = Engine::new(
        SimActuator::default(),
        port,
        Duration::from_millis(opts.recovery_ms),
    );
    engine.announce_link_reset()?;
    info!("serving on {} at {} baud", opts.ser.dev, opts.ser.baud);

    loop {
        match shared.wait_complete() {
            Ok(frame) => match decode(&frame) {
                Ok(cmd) => {
                    shared.mark_decoded();
                    engine.dispatch(cmd)?;
                    shared.mark_dispatched();
                }
                Err(e) => engine.recover(e.into()),
            },
            Err(e) => engine.recover(e.into()),
        }
        shared.reset();
    }
}

/// Run one local sweep against the simulated actuator, writing the framed
/// reports to stdout. Handy for eyeballing the wire format.
pub fn sweep_demo(opts: SweepOpts) -> Result<()> {
    let mut engine = Engine::new(SimActuator::default(), io::stdout(), Duration::ZERO);
    engine.dispatch(Command::SonarSweep {
        start_angle: opts.start,
        end_angle: opts.end,
        step: opts.step,
    })
}

/* ---------- tests ---------- */
