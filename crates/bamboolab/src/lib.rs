#![forbid(unsafe_code)]

//! # BambooLab CLI
//!
//! Runs `bamboo_sim` scenarios without a screen: loads a scenario file or a
//! built-in preset, drives it for a number of fixed steps and prints
//! snapshots as text or JSON lines.
//!
//! The binary is a thin shell over [`execute`], which writes to any
//! [`std::io::Write`] so the commands can be exercised in tests.

pub mod cli;
pub mod output;

use std::io::Write;

use anyhow::{Context, Result, anyhow};
use bamboo_sim::tutor::PromptContext;
use bamboo_sim::{Driver, PresetKind, ScenarioConfig};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, LogLevel, OutputFormat, RunArgs};
use crate::output::SnapshotWriter;

/// Installs the stderr log subscriber. `RUST_LOG` overrides `level`.
pub fn init_tracing(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Runs one parsed command, writing its output to `out`.
///
/// # Errors
///
/// Fails on unreadable or invalid scenarios, unknown presets and write
/// errors.
pub fn execute(cli: &Cli, out: &mut impl Write) -> Result<()> {
    match &cli.command {
        Command::Run { file, run } => {
            let scenario = ScenarioConfig::load(file)
                .with_context(|| format!("failed to load scenario {}", file.display()))?;
            let driver = scenario
                .to_driver()
                .with_context(|| format!("scenario {:?} is not runnable", scenario.name))?;
            simulate(driver, &scenario.name, run, out)
        }
        Command::Preset { name, run } => {
            let kind = parse_preset(name)?;
            simulate(kind.build()?.driver()?, kind.name(), run, out)
        }
        Command::Presets => list_presets(out),
        Command::Context {
            name,
            steps,
            fire,
            format,
        } => print_context(parse_preset(name)?, *steps, *fire, *format, out),
    }
}

fn parse_preset(name: &str) -> Result<PresetKind> {
    name.parse::<PresetKind>().map_err(|err| {
        let known: Vec<&str> = PresetKind::ALL.iter().map(|k| k.name()).collect();
        anyhow!("{err} (available: {})", known.join(", "))
    })
}

/// Drives `driver` for up to `args.steps` ticks, printing every
/// `args.every`-th step and always the first and last.
fn simulate(mut driver: Driver, name: &str, args: &RunArgs, out: &mut impl Write) -> Result<()> {
    if args.fire {
        driver.fire();
    } else {
        driver.start();
    }
    info!(scenario = name, steps = args.steps, dt = driver.dt(), "simulation started");

    let mut writer = SnapshotWriter::new(args.format, out);
    writer.header(name, &driver)?;

    let mut last = driver.snapshot();
    writer.snapshot(&last)?;
    let mut printed = last.step;
    let mut warnings = 0;

    for _ in 0..args.steps {
        let result = driver.tick();
        if !result.advanced {
            debug!(step = result.step, "no movable bodies left");
            break;
        }
        warnings += result.warnings.len();
        if args.every > 0 && result.step % args.every as u64 == 0 {
            writer.snapshot(&result)?;
            printed = result.step;
        }
        last = result;
    }
    if printed != last.step {
        writer.snapshot(&last)?;
    }

    writer.summary(&driver, warnings)?;
    info!(scenario = name, steps = last.step, time = last.time, "simulation finished");
    Ok(())
}

fn list_presets(out: &mut impl Write) -> Result<()> {
    for kind in PresetKind::ALL {
        writeln!(out, "{:<20} {}", kind.name(), kind.title())?;
    }
    Ok(())
}

fn print_context(
    kind: PresetKind,
    steps: usize,
    fire: bool,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let mut driver = kind.build()?.driver()?;
    if fire {
        driver.fire();
    } else if steps > 0 {
        driver.start();
    }
    driver.run(steps);

    let context = kind.context(&driver);
    match format {
        OutputFormat::Text => {
            let prompt = PromptContext {
                simulation: context,
                history: Vec::new(),
            };
            writeln!(out, "{}", prompt.priming())?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &context)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> Result<String> {
        let mut argv = vec!["bamboolab"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();
        let mut out = Vec::new();
        execute(&cli, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn presets_listing() {
        insta::assert_snapshot!(run(&["presets"]).unwrap(), @r"
        pendulum-lab         Pendulum Lab
        hookes-law           Hooke's Law & Harmonic Motion
        collision-lab        Collision Lab (Momentum)
        projectile-motion    Projectile Motion Lab
        ballistic-pendulum   Ballistic Pendulum (Integrated Lab)
        solar-system         Kepler's Laws & Orbital Gravity
        binary-star          Kepler's Laws & Orbital Gravity
        gravity-force-lab    Gravity Force Lab
        coulomb              Coulomb's Law (Electrostatics)
        gas-properties       Gas Properties (Ideal Gas Law)
        friction-ramp        Friction Ramp
        charged-spring       Charged Spring (Integrated Lab)
        ");
    }

    #[test]
    fn unknown_preset_lists_alternatives() {
        let err = run(&["preset", "skate-park"]).unwrap_err().to_string();
        assert!(err.contains("skate-park"));
        assert!(err.contains("pendulum-lab"));
    }

    #[test]
    fn preset_prints_first_and_last_step() {
        let text = run(&["preset", "pendulum-lab", "--steps", "10", "--every", "0"]).unwrap();
        assert!(text.contains("step 0 "));
        assert!(text.contains("step 10 "));
        assert!(!text.contains("step 5 "));
    }

    #[test]
    fn json_lines_parse() {
        let text = run(&[
            "preset",
            "collision-lab",
            "--steps",
            "20",
            "--every",
            "10",
            "--format",
            "json",
        ])
        .unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        // Initial, two periodic snapshots and the summary.
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["step"], 0);
        assert_eq!(lines[2]["step"], 20);
        assert_eq!(lines[3]["summary"]["steps"], 20);
    }

    #[test]
    fn context_text_is_the_tutor_prompt() {
        let text = run(&["context", "pendulum-lab"]).unwrap();
        assert!(text.contains("- Simulation: Pendulum Lab"));
        assert!(text.contains("\"String Length\": \"1.5 m\""));
        assert!(text.contains("\"Status\": \"Paused\""));
    }

    #[test]
    fn context_json_after_firing() {
        let text = run(&["context", "ballistic-pendulum", "--fire", "-n", "5", "-f", "json"]).unwrap();
        let context: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(context["parameters"]["Collision Velocity"], "9.52 m/s");
    }
}
