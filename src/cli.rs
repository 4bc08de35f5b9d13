use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "sonarbot", about = "Serial command bridge for the sonar robot")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// Serve the command protocol on a serial link
    Serve(ServeOpts),
    /// Run one local sonar sweep against the simulated actuator
    Sweep(SweepOpts),
}

#[derive(Args, Debug, Clone)]
pub struct SerialOpts {
    /// Serial device path
    #[arg(long, default_value = "/dev/ttyS0")]
    pub dev: String,
    /// Baud rate
    #[arg(long, default_value_t = 115_200)]
    pub baud: u32,
}

#[derive(Args, Debug, Clone)]
pub struct ServeOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
    /// Blocking hold before recovering from a protocol error, in ms
    #[arg(long, default_value_t = 5_000)]
    pub recovery_ms: u64,
}

#[derive(Args, Debug, Clone)]
pub struct SweepOpts {
    /// Start angle in degrees (90 = straight ahead)
    #[arg(long, default_value_t = -60, allow_hyphen_values = true)]
    pub start: i32,
    /// End angle in degrees
    #[arg(long, default_value_t = 60, allow_hyphen_values = true)]
    pub end: i32,
    /// Step size in degrees; sign must match the sweep direction
    #[arg(long, default_value_t = 2, allow_hyphen_values = true)]
    pub step: i8,
}
