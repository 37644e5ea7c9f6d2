//! Command-line interface for `bamboolab`.
//!
//! # Examples
//!
//! ```bash
//! # Run a scenario file for ten simulated seconds at 60 fps
//! bamboolab run drop.yaml --steps 600 --every 60
//!
//! # Fire the projectile preset and print JSON snapshots
//! bamboolab preset projectile-motion --fire --format json
//!
//! # Show what the tutor would be told after two seconds of swinging
//! bamboolab context pendulum-lab --steps 125
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// BambooLab - headless runner for point-mass physics scenarios.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "bamboolab",
    author,
    version,
    about = "Run BambooLab physics scenarios and presets headless"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    ///
    /// `RUST_LOG` takes precedence when set
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a scenario file (.yaml, .yml or .toml)
    Run {
        /// Scenario file
        file: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Run a built-in preset
    Preset {
        /// Preset name (see `bamboolab presets`)
        name: String,

        #[command(flatten)]
        run: RunArgs,
    },

    /// List built-in presets
    Presets,

    /// Print the tutor context for a preset after some steps
    Context {
        /// Preset name
        name: String,

        /// Steps to run before capturing the context
        #[arg(long, short = 'n', default_value_t = 0)]
        steps: usize,

        /// Fire the preset's launch instead of just starting it
        #[arg(long)]
        fire: bool,

        /// Output format
        #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Options shared by `run` and `preset`.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Number of steps to simulate
    #[arg(long, short = 'n', default_value_t = 600)]
    pub steps: usize,

    /// Print a snapshot every K steps (0 prints only the final state)
    #[arg(long, short = 'e', default_value_t = 60)]
    pub every: usize,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Fire the configured launch instead of just starting
    #[arg(long)]
    pub fire: bool,
}

/// Snapshot output formats.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Log level for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub const fn directive(self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl Cli {
    /// Create CLI from iterator (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if argument parsing fails.
    pub fn try_parse_from<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Get log level based on verbosity.
    #[must_use]
    pub const fn log_level(&self) -> LogLevel {
        match self.verbose {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_run_defaults() {
        let cli = Cli::try_parse_from(["bamboolab", "run", "drop.yaml"]).unwrap();
        let Command::Run { file, run } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(file, PathBuf::from("drop.yaml"));
        assert_eq!(run.steps, 600);
        assert_eq!(run.every, 60);
        assert_eq!(run.format, OutputFormat::Text);
        assert!(!run.fire);
    }

    #[test]
    fn cli_parses_preset_options() {
        let cli = Cli::try_parse_from([
            "bamboolab",
            "preset",
            "projectile-motion",
            "--steps",
            "100",
            "--every",
            "0",
            "--format",
            "json",
            "--fire",
        ])
        .unwrap();
        let Command::Preset { name, run } = cli.command else {
            panic!("expected preset");
        };
        assert_eq!(name, "projectile-motion");
        assert_eq!(run.steps, 100);
        assert_eq!(run.every, 0);
        assert_eq!(run.format, OutputFormat::Json);
        assert!(run.fire);
    }

    #[test]
    fn cli_parses_context() {
        let cli = Cli::try_parse_from(["bamboolab", "context", "hookes-law", "-n", "30"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Context { ref name, steps: 30, fire: false, format: OutputFormat::Text } if name == "hookes-law"
        ));
    }

    #[test]
    fn cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["bamboolab"]).is_err());
    }

    #[test]
    fn cli_parses_verbose() {
        let cli = Cli::try_parse_from(["bamboolab", "presets"]).unwrap();
        assert_eq!(cli.log_level(), LogLevel::Warn);

        let cli = Cli::try_parse_from(["bamboolab", "-v", "presets"]).unwrap();
        assert_eq!(cli.log_level(), LogLevel::Info);

        let cli = Cli::try_parse_from(["bamboolab", "presets", "-vv"]).unwrap();
        assert_eq!(cli.log_level(), LogLevel::Debug);

        let cli = Cli::try_parse_from(["bamboolab", "-vvvv", "presets"]).unwrap();
        assert_eq!(cli.log_level(), LogLevel::Trace);
        assert_eq!(cli.log_level().directive(), "trace");
    }
}
