//! Fixed-step time integrators.
//!
//! [`Integrator::ExplicitEuler`] is the default and reproduces the widgets'
//! behaviour exactly: the position update uses the velocity from *before*
//! the step, which gives the energy drift the spring and pendulum demos
//! visualize.
//!
//! ```text
//! x(t+dt) = x(t) + v(t)·dt
//! v(t+dt) = v(t) + (F/m)·dt
//! ```
//!
//! [`Integrator::SemiImplicitEuler`] updates velocity first and is
//! available for scenarios that need bounded long-run energy.

use crate::body::{Body, Motion};
use crate::vector::Vector2;
use serde::{Deserialize, Serialize};

/// Integration scheme used by a [`System`](crate::System).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Integrator {
    /// Forward Euler, position from the pre-step velocity.
    #[default]
    #[serde(rename = "explicit_euler", alias = "euler")]
    ExplicitEuler,

    /// Symplectic Euler, position from the post-step velocity.
    #[serde(rename = "semi_implicit_euler", alias = "symplectic_euler")]
    SemiImplicitEuler,
}

impl Integrator {
    /// Advances a Cartesian body by one step under `net_force`.
    ///
    /// Fixed bodies and angular bodies are returned unchanged.
    pub fn step(self, body: &Body, net_force: Vector2, dt: f64) -> Body {
        let mut next = body.clone();
        if body.fixed || body.is_angular() {
            return next;
        }
        let acceleration = net_force * (1.0 / body.mass);
        match self {
            Self::ExplicitEuler => {
                next.position = body.position + body.velocity * dt;
                next.velocity = body.velocity + acceleration * dt;
            }
            Self::SemiImplicitEuler => {
                next.velocity = body.velocity + acceleration * dt;
                next.position = body.position + next.velocity * dt;
            }
        }
        next
    }

    /// Advances an angular body by one step under angular acceleration
    /// `alpha`, then refreshes its Cartesian position and velocity.
    pub fn step_angular(self, body: &Body, alpha: f64, dt: f64) -> Body {
        let mut next = body.clone();
        if body.fixed {
            return next;
        }
        if let Motion::Angular {
            pivot,
            length,
            theta,
            omega,
        } = body.motion
        {
            let (theta, omega) = match self {
                Self::ExplicitEuler => (theta + omega * dt, omega + alpha * dt),
                Self::SemiImplicitEuler => {
                    let omega = omega + alpha * dt;
                    (theta + omega * dt, omega)
                }
            };
            next.motion = Motion::Angular {
                pivot,
                length,
                theta,
                omega,
            };
            next.sync_angular();
        }
        next
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::ExplicitEuler => "explicit_euler",
            Self::SemiImplicitEuler => "semi_implicit_euler",
        }
    }
}
