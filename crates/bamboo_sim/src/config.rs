//! Scenario files.
//!
//! A scenario describes a whole simulation declaratively and can be written
//! in YAML or TOML:
//!
//! ```yaml
//! name: drop
//! dt: 0.01
//! bodies:
//!   - id: 1
//!     position: { x: 0.0, y: 10.0 }
//!     mass: 1.0
//! forces:
//!   - law: constant_gravity
//!     acceleration: { x: 0.0, y: -9.8 }
//! boundaries:
//!   - policy: clamp_to_ground
//!     y: 0.0
//! ```

use crate::body::{Body, BodyId};
use crate::boundary::BoundaryPolicy;
use crate::driver::{Driver, Launch};
use crate::error::{Error, Result};
use crate::force::ForceTerm;
use crate::integrator::Integrator;
use crate::system::{System, SystemBuilder};
use crate::vector::Vector2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Time step used when a scenario does not set one (roughly 60 fps).
pub const DEFAULT_DT: f64 = 0.016;

const fn default_dt() -> f64 {
    DEFAULT_DT
}

/// Serialization format of a scenario file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioFormat {
    Yaml,
    Toml,
}

impl ScenarioFormat {
    /// Picks the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for anything other than `.yaml`,
    /// `.yml` or `.toml`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Pendulum arm for a body that swings instead of moving freely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendulumConfig {
    #[serde(default)]
    pub pivot: Vector2,
    pub length: f64,
    /// Initial angle from straight down, radians.
    #[serde(default)]
    pub theta: f64,
    #[serde(default)]
    pub omega: f64,
}

/// One body in a scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    pub id: BodyId,
    #[serde(default)]
    pub position: Vector2,
    #[serde(default)]
    pub velocity: Vector2,
    pub mass: f64,
    #[serde(default)]
    pub radius: f64,
    #[serde(default)]
    pub charge: f64,
    #[serde(default)]
    pub fixed: bool,
    /// When set, `position` and `velocity` are derived from the arm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pendulum: Option<PendulumConfig>,
}

impl BodyConfig {
    pub fn to_body(&self) -> Body {
        let mut body = match self.pendulum {
            Some(arm) => Body::pendulum(self.id, arm.pivot, arm.length, arm.theta, arm.omega, self.mass),
            None => Body::new(self.id, self.position, self.mass).with_velocity(self.velocity),
        };
        body.radius = self.radius;
        body.charge = self.charge;
        body.fixed = self.fixed;
        body
    }
}

/// A complete declarative simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default)]
    pub integrator: Integrator,
    pub bodies: Vec<BodyConfig>,
    #[serde(default)]
    pub forces: Vec<ForceTerm>,
    #[serde(default)]
    pub boundaries: Vec<BoundaryPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch: Option<Launch>,
}

impl ScenarioConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Parses `source` in the given format.
    pub fn parse(source: &str, format: ScenarioFormat) -> Result<Self> {
        match format {
            ScenarioFormat::Yaml => Self::from_yaml_str(source),
            ScenarioFormat::Toml => Self::from_toml_str(source),
        }
    }

    /// Reads a scenario file, choosing the parser from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ScenarioFormat::from_path(path)?;
        let source = fs::read_to_string(path)?;
        let scenario = Self::parse(&source, format)?;
        debug!(
            path = %path.display(),
            name = %scenario.name,
            bodies = scenario.bodies.len(),
            "scenario loaded"
        );
        Ok(scenario)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Builds and validates the system described by this scenario.
    pub fn build_system(&self) -> Result<System> {
        let builder = System::builder()
            .bodies(self.bodies.iter().map(BodyConfig::to_body))
            .integrator(self.integrator);
        let builder = self.forces.iter().cloned().fold(builder, SystemBuilder::term);
        self.boundaries
            .iter()
            .copied()
            .fold(builder, SystemBuilder::boundary)
            .build()
    }

    /// Builds a validated driver, including the optional launch.
    pub fn to_driver(&self) -> Result<Driver> {
        let driver = Driver::new(self.build_system()?, self.dt)?;
        match self.launch {
            Some(launch) => driver.with_launch(launch),
            None => Ok(driver),
        }
    }
}
