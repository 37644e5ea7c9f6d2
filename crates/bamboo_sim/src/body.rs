//! Point-mass bodies.
//!
//! A [`Body`] is either free to move in the plane ([`Motion::Cartesian`]) or
//! swings on a rigid arm around a pivot ([`Motion::Angular`]). Angular bodies
//! keep their `position` and `velocity` in sync with `(θ, ω)` so observers
//! can treat every body the same way.

use crate::error::ConfigurationError;
use crate::vector::Vector2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a body, unique within one [`System`](crate::System).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for BodyId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// How a body moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Motion {
    /// Free motion driven by Cartesian forces.
    Cartesian,
    /// One degree of freedom: angle `theta` (radians from the hanging
    /// direction) and angular velocity `omega` around `pivot`.
    Angular {
        pivot: Vector2,
        length: f64,
        theta: f64,
        omega: f64,
    },
}

/// Per-body lifecycle. Terminal statuses freeze integration for that body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyStatus {
    #[default]
    Active,
    /// Came to rest on the ground.
    Landed,
    /// Left the domain or was otherwise destroyed.
    Crashed,
}

impl BodyStatus {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// A point mass.
///
/// # Example
///
/// ```rust
/// use bamboo_sim::{Body, BodyId, Vector2};
///
/// let ball = Body::new(BodyId(1), Vector2::new(0.0, 10.0), 2.0)
///     .with_velocity(Vector2::new(5.0, 0.0))
///     .with_radius(0.3);
/// assert_eq!(ball.momentum(), Vector2::new(10.0, 0.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub position: Vector2,
    pub velocity: Vector2,
    pub mass: f64,
    pub radius: f64,
    /// Signed charge used by Coulomb-style laws and uniform fields.
    pub charge: f64,
    /// Fixed bodies (pivots, anchors) never integrate.
    pub fixed: bool,
    pub motion: Motion,
    pub status: BodyStatus,
}

impl Body {
    /// Creates a free body at rest.
    pub const fn new(id: BodyId, position: Vector2, mass: f64) -> Self {
        Self {
            id,
            position,
            velocity: Vector2::ZERO,
            mass,
            radius: 0.0,
            charge: 0.0,
            fixed: false,
            motion: Motion::Cartesian,
            status: BodyStatus::Active,
        }
    }

    /// Creates a pendulum bob hanging from `pivot` on an arm of `length`,
    /// displaced by `theta` radians and swinging at `omega` rad/s.
    pub fn pendulum(id: BodyId, pivot: Vector2, length: f64, theta: f64, omega: f64, mass: f64) -> Self {
        let mut body = Self::new(id, pivot, mass);
        body.motion = Motion::Angular {
            pivot,
            length,
            theta,
            omega,
        };
        body.sync_angular();
        body
    }

    pub const fn with_velocity(mut self, velocity: Vector2) -> Self {
        self.velocity = velocity;
        self
    }

    pub const fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub const fn with_charge(mut self, charge: f64) -> Self {
        self.charge = charge;
        self
    }

    /// Marks the body as fixed in place.
    pub const fn pinned(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// Whether the integrator should advance this body.
    pub const fn is_movable(&self) -> bool {
        !self.fixed && !self.status.is_terminal()
    }

    pub const fn is_angular(&self) -> bool {
        matches!(self.motion, Motion::Angular { .. })
    }

    /// Pendulum angle, if this is an angular body.
    pub const fn theta(&self) -> Option<f64> {
        match self.motion {
            Motion::Angular { theta, .. } => Some(theta),
            Motion::Cartesian => None,
        }
    }

    /// Pendulum angular velocity, if this is an angular body.
    pub const fn omega(&self) -> Option<f64> {
        match self.motion {
            Motion::Angular { omega, .. } => Some(omega),
            Motion::Cartesian => None,
        }
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.length_squared()
    }

    pub fn momentum(&self) -> Vector2 {
        self.velocity * self.mass
    }

    /// Recomputes `position` and `velocity` from the angular state.
    ///
    /// `position = pivot + L·(sin θ, −cos θ)`, `velocity = L·ω·(cos θ, sin θ)`.
    pub fn sync_angular(&mut self) {
        if let Motion::Angular {
            pivot,
            length,
            theta,
            omega,
        } = self.motion
        {
            let (sin, cos) = theta.sin_cos();
            self.position = pivot + Vector2::new(sin, -cos) * length;
            self.velocity = Vector2::new(cos, sin) * (length * omega);
        }
    }

    /// Checks the invariants that must hold before a body joins a system.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(ConfigurationError::NonPositiveMass {
                id: self.id,
                mass: self.mass,
            });
        }
        if !(self.radius.is_finite() && self.radius >= 0.0) {
            return Err(ConfigurationError::NegativeRadius {
                id: self.id,
                radius: self.radius,
            });
        }
        if !self.position.is_finite() || !self.velocity.is_finite() {
            return Err(ConfigurationError::InvalidParameter {
                name: "body state",
                value: f64::NAN,
            });
        }
        if let Motion::Angular { length, .. } = self.motion {
            if !(length.is_finite() && length > 0.0) {
                return Err(ConfigurationError::InvalidLength { id: self.id, length });
            }
        }
        Ok(())
    }
}
