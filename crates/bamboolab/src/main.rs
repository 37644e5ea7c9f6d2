#![forbid(unsafe_code)]

//! # bamboolab
//!
//! Headless runner for BambooLab physics scenarios.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p bamboolab -- presets
//! cargo run -p bamboolab -- preset collision-lab --steps 120 --every 30
//! cargo run -p bamboolab -- run scenario.yaml --format json
//! ```

use std::io::{self, Write};
use std::process::ExitCode;

use bamboolab::cli::Cli;
use clap::Parser;
use tracing::error;

fn main() -> ExitCode {
    let cli = Cli::parse();
    bamboolab::init_tracing(cli.log_level());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let outcome = bamboolab::execute(&cli, &mut out).and_then(|()| Ok(out.flush()?));

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
