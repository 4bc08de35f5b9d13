use anyhow::Result;
use clap::Parser;

mod actuator;
mod cli;
mod engine;
mod port;
mod proto;

fn main() -> Result<()> {
    env_logger::init();
    let args = cli::Cli::parse();
    match args.cmd {
        cli::Cmd::Serve(opts) => engine::serve(opts),
        cli::Cmd::Sweep(opts) => engine::sweep_demo(opts),
    }
}
