//! Error types for simulation assembly and scenario loading.

use crate::body::BodyId;
use std::io;
use thiserror::Error;

/// A rejected simulation configuration.
///
/// Raised when a [`System`](crate::System), [`Driver`](crate::Driver) or
/// scenario is assembled. Never raised while stepping.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Body mass must be finite and strictly positive.
    #[error("body {id} has non-positive mass {mass}")]
    NonPositiveMass { id: BodyId, mass: f64 },

    /// Body radius must be finite and non-negative.
    #[error("body {id} has negative radius {radius}")]
    NegativeRadius { id: BodyId, radius: f64 },

    /// Two bodies share an id.
    #[error("duplicate body id {0}")]
    DuplicateBodyId(BodyId),

    /// A force law, launch or lookup names a body that is not in the system.
    #[error("unknown body id {0}")]
    UnknownBody(BodyId),

    /// Restitution coefficients live in `[0, 1]`.
    #[error("restitution {0} is outside [0, 1]")]
    InvalidRestitution(f64),

    /// Pendulum arm length must be positive.
    #[error("body {id} has non-positive pendulum length {length}")]
    InvalidLength { id: BodyId, length: f64 },

    /// A reflecting box must be at least as wide and tall as every body in it.
    #[error("body {id} with radius {radius} does not fit inside the bounds")]
    BodyExceedsBounds { id: BodyId, radius: f64 },

    /// Time step must be finite and positive.
    #[error("time step {0} must be finite and positive")]
    InvalidTimeStep(f64),

    /// Any other out-of-range numeric parameter.
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// Errors produced by this crate.
///
/// # Recovery Strategies
///
/// | Error Variant | Recovery Strategy |
/// |--------------|-------------------|
/// | [`InvalidConfiguration`](Error::InvalidConfiguration) | Fix the scenario; never retried automatically |
/// | [`Io`](Error::Io) | Check the scenario path |
/// | [`Yaml`](Error::Yaml) / [`Toml`](Error::Toml) | Fix the scenario syntax |
/// | [`UnsupportedFormat`](Error::UnsupportedFormat) | Use a `.yaml`, `.yml` or `.toml` file |
/// | [`UnknownPreset`](Error::UnknownPreset) | Pick one of [`PresetKind::ALL`](crate::presets::PresetKind::ALL) |
#[derive(Error, Debug)]
pub enum Error {
    /// The simulation was assembled from invalid parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationError),

    /// Reading a scenario file failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// YAML scenario could not be parsed.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML scenario could not be parsed.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Scenario file extension is not recognized.
    #[error("unsupported scenario format: {0:?}")]
    UnsupportedFormat(String),

    /// No preset with this name exists.
    #[error("unknown preset: {0:?}")]
    UnknownPreset(String),
}

/// A specialized [`Result`] type for simulation operations.
pub type Result<T> = std::result::Result<T, Error>;
