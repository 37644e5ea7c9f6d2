//! Snapshot rendering for `run` and `preset`.

use std::fmt::Debug;
use std::io::{self, Write};

use bamboo_sim::{Body, Driver, Integrator, StepEvent, StepResult, StepWarning};
use serde_json::json;

use crate::cli::OutputFormat;

/// Writes snapshots in one [`OutputFormat`].
///
/// Text output is meant for people. JSON output is one [`StepResult`] per
/// line followed by a final `{"summary": ...}` line.
pub struct SnapshotWriter<'a, W: Write> {
    format: OutputFormat,
    out: &'a mut W,
    scenario: String,
}

impl<'a, W: Write> SnapshotWriter<'a, W> {
    pub fn new(format: OutputFormat, out: &'a mut W) -> Self {
        Self {
            format,
            out,
            scenario: String::new(),
        }
    }

    pub fn header(&mut self, scenario: &str, driver: &Driver) -> io::Result<()> {
        self.scenario = scenario.to_owned();
        if self.format == OutputFormat::Json {
            return Ok(());
        }
        let system = driver.system();
        writeln!(
            self.out,
            "scenario {scenario}: {} bodies, dt={}s, {}",
            system.bodies().len(),
            driver.dt(),
            integrator_label(system.integrator())
        )
    }

    pub fn snapshot(&mut self, result: &StepResult) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut *self.out, result)?;
                writeln!(self.out)
            }
            OutputFormat::Text => {
                writeln!(
                    self.out,
                    "step {} t={:.3}s {} shot={}",
                    result.step,
                    result.time,
                    label(result.state),
                    label(result.shot)
                )?;
                for body in &result.bodies {
                    write_body(&mut *self.out, body)?;
                }
                for event in &result.events {
                    writeln!(self.out, "  event: {}", event_label(event))?;
                }
                for warning in &result.warnings {
                    let StepWarning::NumericInstability { body, time } = warning;
                    writeln!(self.out, "  warning: numeric instability on {body} at t={time:.3}s")?;
                }
                Ok(())
            }
        }
    }

    pub fn summary(&mut self, driver: &Driver, warnings: usize) -> io::Result<()> {
        let system = driver.system();
        let momentum = system.momentum();
        match self.format {
            OutputFormat::Json => {
                let summary = json!({
                    "summary": {
                        "scenario": self.scenario,
                        "steps": driver.clock().steps(),
                        "time": driver.time(),
                        "shot": driver.shot(),
                        "total_energy": system.total_energy(),
                        "momentum": momentum,
                        "warnings": warnings,
                    }
                });
                serde_json::to_writer(&mut *self.out, &summary)?;
                writeln!(self.out)
            }
            OutputFormat::Text => writeln!(
                self.out,
                "finished after {} steps, t={:.3}s, energy={:.3} J, momentum=({:.3}, {:.3}), warnings={warnings}",
                driver.clock().steps(),
                driver.time(),
                system.total_energy(),
                momentum.x,
                momentum.y
            ),
        }
    }
}

fn write_body(out: &mut impl Write, body: &Body) -> io::Result<()> {
    write!(
        out,
        "  {} pos=({:.3}, {:.3}) vel=({:.3}, {:.3})",
        body.id, body.position.x, body.position.y, body.velocity.x, body.velocity.y
    )?;
    if let Some(theta) = body.theta() {
        write!(out, " theta={:.2}°", theta.to_degrees())?;
    }
    if body.fixed {
        write!(out, " fixed")?;
    }
    writeln!(out, " {}", label(body.status))
}

/// Lower-case variant name of a unit enum.
fn label(value: impl Debug) -> String {
    format!("{value:?}").to_lowercase()
}

const fn integrator_label(integrator: Integrator) -> &'static str {
    match integrator {
        Integrator::ExplicitEuler => "explicit euler",
        Integrator::SemiImplicitEuler => "semi-implicit euler",
    }
}

fn event_label(event: &StepEvent) -> String {
    match event {
        StepEvent::WallContact { body, axis } => format!("{body} hit a {} wall", label(axis)),
        StepEvent::Landed { body } => format!("{body} landed"),
        StepEvent::Collision { a, b } => format!("{a} collided with {b}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bamboo_sim::{BodyId, BoundaryPolicy, ForceLaw, System, Vector2};

    fn dropping_driver() -> Driver {
        let system = System::builder()
            .body(
                Body::new(BodyId(7), Vector2::new(0.0, 0.05), 2.0)
                    .with_velocity(Vector2::new(0.0, -1.0)),
            )
            .force(ForceLaw::gravity(-9.8))
            .boundary(BoundaryPolicy::ClampToGround { y: 0.0 })
            .build()
            .unwrap();
        Driver::new(system, 0.1).unwrap()
    }

    #[test]
    fn text_snapshot_lists_bodies_and_events() {
        let mut driver = dropping_driver();
        driver.start();
        let result = driver.tick();

        let mut out = Vec::new();
        let mut writer = SnapshotWriter::new(OutputFormat::Text, &mut out);
        writer.header("drop", &driver).unwrap();
        writer.snapshot(&result).unwrap();

        let text = String::from_utf8(out).unwrap();
        insta::assert_snapshot!(text, @r"
        scenario drop: 1 bodies, dt=0.1s, explicit euler
        step 1 t=0.100s running shot=ready
          #7 pos=(0.000, 0.000) vel=(0.000, 0.000) landed
          event: #7 landed
        ");
    }

    #[test]
    fn json_writer_skips_header() {
        let driver = dropping_driver();
        let mut out = Vec::new();
        let mut writer = SnapshotWriter::new(OutputFormat::Json, &mut out);
        writer.header("drop", &driver).unwrap();
        writer.summary(&driver, 0).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        let summary: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(summary["summary"]["scenario"], "drop");
        assert_eq!(summary["summary"]["steps"], 0);
        assert_eq!(summary["summary"]["shot"], "ready");
    }

    #[test]
    fn labels() {
        assert_eq!(label(bamboo_sim::RunState::Paused), "paused");
        assert_eq!(
            event_label(&StepEvent::Collision {
                a: BodyId(1),
                b: BodyId(2)
            }),
            "#1 collided with #2"
        );
    }
}
