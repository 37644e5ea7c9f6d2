#![forbid(unsafe_code)]
// Allow these clippy lints for physics/math code readability
#![allow(clippy::must_use_candidate)]
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::use_self)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]

//! # Bamboo Sim
//!
//! A two-dimensional, fixed-timestep point-mass simulator behind the
//! BambooLab physics widgets.
//!
//! Bamboo Sim provides:
//! - **System**: bodies, pluggable force laws and boundary policies
//! - **Driver**: an Idle/Running/Paused lifecycle with a simulation clock
//! - **Presets**: the widgets (pendulum, springs, collisions, orbits, ...)
//!   as ready-to-run scenarios
//! - **Tutor**: simulation context for an opaque text completion service
//!
//! The world is y-up: Earth gravity is `ForceLaw::gravity(-9.8)`.
//!
//! ## Example
//!
//! ```rust
//! use bamboo_sim::prelude::*;
//!
//! let system = System::builder()
//!     .body(Body::new(BodyId(1), Vector2::new(0.0, 10.0), 1.0))
//!     .force(ForceLaw::gravity(-9.8))
//!     .boundary(BoundaryPolicy::ClampToGround { y: 0.0 })
//!     .build()
//!     .unwrap();
//!
//! let mut driver = Driver::new(system, 0.016).unwrap();
//! driver.start();
//!
//! // Fall for one simulated second.
//! let result = driver.run(62);
//! let ball = result.body(BodyId(1)).unwrap();
//! assert!(ball.position.y < 10.0);
//! assert!(ball.velocity.y < 0.0);
//! ```
//!
//! ## Integration order
//!
//! The default integrator is explicit Euler: positions advance with the
//! velocity from *before* the step. Springs and pendula therefore gain a
//! little energy each step, which the widgets show on purpose.
//! [`Integrator::SemiImplicitEuler`] is available when that drift matters.

pub mod body;
pub mod boundary;
pub mod config;
pub mod driver;
pub mod error;
pub mod force;
pub mod integrator;
pub mod oscillator;
pub mod presets;
pub mod system;
pub mod tutor;
pub mod vector;

pub use body::{Body, BodyId, BodyStatus, Motion};
pub use boundary::{Axis, BoundaryPolicy, StepEvent};
pub use config::{ScenarioConfig, ScenarioFormat};
pub use driver::{Driver, Launch, RunState, ShotState, SimulationClock, StepObserver, StepResult};
pub use error::{ConfigurationError, Error, Result};
pub use force::{Anchor, ForceLaw, ForceTerm, Source};
pub use integrator::Integrator;
pub use oscillator::{fps, DampedOscillator};
pub use presets::{Preset, PresetKind};
pub use system::{StepReport, StepWarning, System, SystemBuilder};
pub use tutor::{SimContext, TextCompletionService, Tutor};
pub use vector::Vector2;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::body::{Body, BodyId, BodyStatus, Motion};
    pub use crate::boundary::BoundaryPolicy;
    pub use crate::driver::{Driver, Launch, RunState, ShotState, StepResult};
    pub use crate::force::{ForceLaw, ForceTerm};
    pub use crate::integrator::Integrator;
    pub use crate::system::System;
    pub use crate::vector::Vector2;
}
