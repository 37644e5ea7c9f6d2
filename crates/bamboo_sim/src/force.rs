//! Pluggable force laws.
//!
//! Every law is a pure function of the system state. Cartesian laws return a
//! force vector for a body; the [`ForceLaw::Pendulum`] law instead returns an
//! angular acceleration for bodies with [`Motion::Angular`]. A law that does
//! not apply to a body's motion kind contributes nothing.
//!
//! Laws are attached to a [`System`] through [`ForceTerm`]s, which scope a
//! law to every body or to a listed subset.

use crate::body::{Body, BodyId, Motion};
use crate::error::ConfigurationError;
use crate::system::System;
use crate::vector::Vector2;
use serde::{Deserialize, Serialize};

/// Speed below which friction is treated as static.
pub const STATIC_SPEED_THRESHOLD: f64 = 0.01;

/// Default minimum separation for inverse-square laws.
pub const DEFAULT_SOFTENING: f64 = 1e-3;

/// Standard gravitational acceleration magnitude used by the widgets.
pub const STANDARD_GRAVITY: f64 = 9.8;

/// What a spring is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// A fixed point in the plane.
    Point(Vector2),
    /// Another body; the spring follows its position and velocity.
    Body(BodyId),
}

/// Which body property feeds an inverse-square law.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Newtonian gravity: always attractive.
    #[default]
    Mass,
    /// Coulomb's law: like charges repel, unlike charges attract.
    Charge,
}

/// A force (or, for pendula, an equation of motion) acting on bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "law", rename_all = "snake_case")]
pub enum ForceLaw {
    /// `F = m·a` for a constant acceleration field.
    ConstantGravity { acceleration: Vector2 },

    /// Hooke spring with linear damping:
    /// `F = −k(|d| − L0)·d̂ − c·(v − v_anchor)`.
    Spring {
        anchor: Anchor,
        stiffness: f64,
        #[serde(default)]
        rest_length: f64,
        #[serde(default)]
        damping: f64,
    },

    /// Pairwise `C·s_i·s_j / d²`, with `d` floored at `softening`.
    InverseSquare {
        constant: f64,
        #[serde(default)]
        source: Source,
        #[serde(default = "default_softening")]
        softening: f64,
    },

    /// Linear drag `F = −c·v`.
    Drag { coefficient: f64 },

    /// Coulomb friction against a surface pressing with
    /// `m·normal_acceleration`. Evaluated after every other law.
    Friction {
        coefficient: f64,
        normal_acceleration: f64,
    },

    /// Uniform electric field, `F = q·E`.
    UniformField { field: Vector2 },

    /// Simple pendulum: `α = −(g/L)·sin θ − damping·ω`.
    Pendulum {
        gravity: f64,
        #[serde(default)]
        damping: f64,
    },
}

const fn default_softening() -> f64 {
    DEFAULT_SOFTENING
}

impl ForceLaw {
    /// Constant gravity of `g` along the y axis.
    ///
    /// The world is y-up, so Earth gravity is `ForceLaw::gravity(-9.8)`.
    pub const fn gravity(g: f64) -> Self {
        Self::ConstantGravity {
            acceleration: Vector2::new(0.0, g),
        }
    }

    /// Undamped zero-length spring to a fixed point.
    pub const fn spring_to(anchor: Vector2, stiffness: f64) -> Self {
        Self::Spring {
            anchor: Anchor::Point(anchor),
            stiffness,
            rest_length: 0.0,
            damping: 0.0,
        }
    }

    /// Newtonian gravity between all bodies in scope.
    pub const fn newtonian(constant: f64) -> Self {
        Self::InverseSquare {
            constant,
            source: Source::Mass,
            softening: DEFAULT_SOFTENING,
        }
    }

    /// Coulomb interaction between all charged bodies in scope.
    pub const fn coulomb(constant: f64) -> Self {
        Self::InverseSquare {
            constant,
            source: Source::Charge,
            softening: DEFAULT_SOFTENING,
        }
    }

    pub const fn is_friction(&self) -> bool {
        matches!(self, Self::Friction { .. })
    }

    /// Cartesian force on `body`, taking every other body as a partner.
    pub fn force(&self, system: &System, body: &Body, t: f64) -> Vector2 {
        match self {
            Self::Friction { .. } => {
                let applied = system.applied_force(body, t);
                self.friction_response(body, applied)
            }
            _ => self.force_among(system.bodies(), body, t, |_| true),
        }
    }

    /// Cartesian force on `body` from partners accepted by `partner`.
    ///
    /// Friction contributes nothing here; see [`ForceLaw::friction_response`].
    pub(crate) fn force_among(
        &self,
        bodies: &[Body],
        body: &Body,
        _t: f64,
        partner: impl Fn(&Body) -> bool,
    ) -> Vector2 {
        if body.is_angular() {
            return Vector2::ZERO;
        }
        match *self {
            Self::ConstantGravity { acceleration } => acceleration * body.mass,
            Self::Spring {
                anchor,
                stiffness,
                rest_length,
                damping,
            } => {
                let (anchor_pos, anchor_vel) = match anchor {
                    Anchor::Point(p) => (p, Vector2::ZERO),
                    Anchor::Body(id) => match bodies.iter().find(|b| b.id == id) {
                        Some(b) => (b.position, b.velocity),
                        None => return Vector2::ZERO,
                    },
                };
                let d = body.position - anchor_pos;
                let stretch = d.length() - rest_length;
                d.normalized() * (-stiffness * stretch) - (body.velocity - anchor_vel) * damping
            }
            Self::InverseSquare {
                constant,
                source,
                softening,
            } => {
                let strength = |b: &Body| match source {
                    Source::Mass => b.mass,
                    Source::Charge => b.charge,
                };
                let s_i = strength(body);
                let mut total = Vector2::ZERO;
                for other in bodies.iter().filter(|b| b.id != body.id && partner(*b)) {
                    let r = other.position - body.position;
                    let d = r.length().max(softening);
                    let magnitude = constant * s_i * strength(other) / (d * d);
                    match source {
                        Source::Mass => total += r.normalized() * magnitude,
                        Source::Charge => total -= r.normalized() * magnitude,
                    }
                }
                total
            }
            Self::Drag { coefficient } => body.velocity * -coefficient,
            Self::UniformField { field } => field * body.charge,
            Self::Friction { .. } | Self::Pendulum { .. } => Vector2::ZERO,
        }
    }

    /// Friction force given the sum of every other force on the body.
    ///
    /// A moving body feels `μN` against its velocity. A body at rest is held
    /// in place until the applied force exceeds `μN`.
    pub fn friction_response(&self, body: &Body, applied: Vector2) -> Vector2 {
        if !self.is_friction() {
            return Vector2::ZERO;
        }
        let limit = self.friction_limit(body);
        if body.velocity.length() > STATIC_SPEED_THRESHOLD {
            return body.velocity.normalized() * -limit;
        }
        if applied.length() > limit {
            applied.normalized() * -limit
        } else {
            -applied
        }
    }

    /// Largest friction force `μ·m·|a_n|` this law can exert on `body`.
    /// Zero for every other law.
    pub fn friction_limit(&self, body: &Body) -> f64 {
        match *self {
            Self::Friction {
                coefficient,
                normal_acceleration,
            } => coefficient * body.mass * normal_acceleration.abs(),
            _ => 0.0,
        }
    }

    /// Angular acceleration for a 1-DOF body. Zero for Cartesian bodies and
    /// for every law other than [`ForceLaw::Pendulum`].
    pub fn angular_acceleration(&self, body: &Body, _t: f64) -> f64 {
        match (self, body.motion) {
            (
                Self::Pendulum { gravity, damping },
                Motion::Angular {
                    length,
                    theta,
                    omega,
                    ..
                },
            ) => -(gravity / length) * theta.sin() - damping * omega,
            _ => 0.0,
        }
    }

    /// Rejects non-finite or out-of-range parameters.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ConfigurationError::InvalidParameter { name, value })
            }
        }
        fn finite(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
            if value.is_finite() {
                Ok(())
            } else {
                Err(ConfigurationError::InvalidParameter { name, value })
            }
        }

        match *self {
            Self::ConstantGravity { acceleration } => {
                finite("gravity x", acceleration.x)?;
                finite("gravity y", acceleration.y)
            }
            Self::Spring {
                anchor,
                stiffness,
                rest_length,
                damping,
            } => {
                if let Anchor::Point(p) = anchor {
                    finite("spring anchor x", p.x)?;
                    finite("spring anchor y", p.y)?;
                }
                non_negative("spring stiffness", stiffness)?;
                non_negative("spring rest length", rest_length)?;
                non_negative("spring damping", damping)
            }
            Self::InverseSquare {
                constant,
                softening,
                ..
            } => {
                finite("inverse-square constant", constant)?;
                if softening.is_finite() && softening > 0.0 {
                    Ok(())
                } else {
                    Err(ConfigurationError::InvalidParameter {
                        name: "softening",
                        value: softening,
                    })
                }
            }
            Self::Drag { coefficient } => non_negative("drag coefficient", coefficient),
            Self::Friction {
                coefficient,
                normal_acceleration,
            } => {
                non_negative("friction coefficient", coefficient)?;
                finite("normal acceleration", normal_acceleration)
            }
            Self::UniformField { field } => {
                finite("field x", field.x)?;
                finite("field y", field.y)
            }
            Self::Pendulum { gravity, damping } => {
                finite("pendulum gravity", gravity)?;
                non_negative("pendulum damping", damping)
            }
        }
    }

    /// Body ids this law refers to.
    pub(crate) fn referenced_body(&self) -> Option<BodyId> {
        match self {
            Self::Spring {
                anchor: Anchor::Body(id),
                ..
            } => Some(*id),
            _ => None,
        }
    }
}

/// A force law scoped to some bodies of a system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceTerm {
    #[serde(flatten)]
    pub law: ForceLaw,
    /// Bodies the law acts on (and, for pairwise laws, interacts between).
    /// `None` means every body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<BodyId>>,
}

impl ForceTerm {
    /// Applies `law` to every body.
    pub const fn global(law: ForceLaw) -> Self {
        Self { law, targets: None }
    }

    /// Applies `law` only to the listed bodies.
    pub fn only(law: ForceLaw, targets: impl IntoIterator<Item = BodyId>) -> Self {
        Self {
            law,
            targets: Some(targets.into_iter().collect()),
        }
    }

    pub fn applies_to(&self, id: BodyId) -> bool {
        self.targets.as_ref().is_none_or(|t| t.contains(&id))
    }
}

impl From<ForceLaw> for ForceTerm {
    fn from(law: ForceLaw) -> Self {
        Self::global(law)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-10;

    fn ball(id: u32, x: f64, y: f64, mass: f64) -> Body {
        Body::new(BodyId(id), Vector2::new(x, y), mass)
    }

    #[test]
    fn test_gravity_scales_with_mass() {
        let b = ball(1, 0.0, 0.0, 2.0);
        let f = ForceLaw::gravity(-9.8).force_among(&[], &b, 0.0, |_| true);
        assert!((f.y + 19.6).abs() < TOLERANCE);
        assert!(f.x.abs() < TOLERANCE);
    }

    #[test]
    fn test_spring_restoring_and_damping() {
        let b = ball(1, 2.0, 0.0, 1.0).with_velocity(Vector2::new(1.0, 0.0));
        let law = ForceLaw::Spring {
            anchor: Anchor::Point(Vector2::ZERO),
            stiffness: 10.0,
            rest_length: 0.5,
            damping: 0.2,
        };
        let f = law.force_among(&[], &b, 0.0, |_| true);
        // −10·(2 − 0.5) − 0.2·1
        assert!((f.x + 15.2).abs() < TOLERANCE);
    }

    #[test]
    fn test_spring_at_anchor_is_finite() {
        let b = ball(1, 0.0, 0.0, 1.0);
        let law = ForceLaw::Spring {
            anchor: Anchor::Point(Vector2::ZERO),
            stiffness: 10.0,
            rest_length: 1.0,
            damping: 0.0,
        };
        assert_eq!(law.force_among(&[], &b, 0.0, |_| true), Vector2::ZERO);
    }

    #[test]
    fn test_inverse_square_attracts_masses() {
        let bodies = [ball(1, 0.0, 0.0, 1000.0), ball(2, 150.0, 0.0, 100.0)];
        let law = ForceLaw::newtonian(0.5);
        let f1 = law.force_among(&bodies, &bodies[0], 0.0, |_| true);
        let f2 = law.force_among(&bodies, &bodies[1], 0.0, |_| true);
        let expected = 0.5 * 1000.0 * 100.0 / (150.0 * 150.0);
        assert!((f1.x - expected).abs() < 1e-9);
        assert!((f2.x + expected).abs() < 1e-9);
    }

    #[test]
    fn test_coulomb_like_charges_repel() {
        let bodies = [
            ball(1, 0.0, 0.0, 1.0).with_charge(5.0),
            ball(2, 2.0, 0.0, 1.0).with_charge(5.0),
        ];
        let f = ForceLaw::coulomb(9.0).force_among(&bodies, &bodies[0], 0.0, |_| true);
        assert!(f.x < 0.0, "like charges push body 1 away from body 2");
        assert!((f.x + 9.0 * 25.0 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_coincident_bodies_do_not_explode() {
        let bodies = [ball(1, 1.0, 1.0, 5.0), ball(2, 1.0, 1.0, 5.0)];
        let f = ForceLaw::newtonian(1.0).force_among(&bodies, &bodies[0], 0.0, |_| true);
        assert!(f.is_finite());
        assert_eq!(f, Vector2::ZERO);
    }

    #[test]
    fn test_softening_caps_force() {
        let bodies = [ball(1, 0.0, 0.0, 1.0), ball(2, 1e-9, 0.0, 1.0)];
        let law = ForceLaw::InverseSquare {
            constant: 1.0,
            source: Source::Mass,
            softening: 0.1,
        };
        let f = law.force_among(&bodies, &bodies[0], 0.0, |_| true);
        assert!((f.x - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_friction_static_hold_and_slip() {
        let law = ForceLaw::Friction {
            coefficient: 0.5,
            normal_acceleration: 10.0,
        };
        let resting = ball(1, 0.0, 0.0, 2.0);
        // Limit is 0.5 · 2 · 10 = 10.
        let held = law.friction_response(&resting, Vector2::new(4.0, 0.0));
        assert_eq!(held, Vector2::new(-4.0, 0.0));
        let slipping = law.friction_response(&resting, Vector2::new(15.0, 0.0));
        assert!((slipping.x + 10.0).abs() < TOLERANCE);

        let moving = resting.with_velocity(Vector2::new(0.0, -3.0));
        let kinetic = law.friction_response(&moving, Vector2::ZERO);
        assert!((kinetic.y - 10.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_pendulum_angular_acceleration() {
        let bob = Body::pendulum(BodyId(1), Vector2::ZERO, 2.0, 0.5, 1.0, 1.0);
        let law = ForceLaw::Pendulum {
            gravity: 9.8,
            damping: 0.1,
        };
        let alpha = law.angular_acceleration(&bob, 0.0);
        assert!((alpha - (-(9.8 / 2.0) * 0.5_f64.sin() - 0.1)).abs() < TOLERANCE);
        // Cartesian laws ignore angular bodies and vice versa.
        assert_eq!(
            ForceLaw::gravity(-9.8).force_among(&[], &bob, 0.0, |_| true),
            Vector2::ZERO
        );
        assert!(law.angular_acceleration(&ball(2, 0.0, 0.0, 1.0), 0.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_validate() {
        assert!(ForceLaw::Drag { coefficient: -1.0 }.validate().is_err());
        let law = ForceLaw::InverseSquare {
            constant: 1.0,
            source: Source::Mass,
            softening: 0.0,
        };
        assert!(law.validate().is_err());
        assert!(ForceLaw::newtonian(6.674e-11).validate().is_ok());
    }

    #[test]
    fn test_term_scope() {
        let term = ForceTerm::only(ForceLaw::gravity(-9.8), [BodyId(2)]);
        assert!(term.applies_to(BodyId(2)));
        assert!(!term.applies_to(BodyId(1)));
        assert!(ForceTerm::global(ForceLaw::gravity(-9.8)).applies_to(BodyId(1)));
    }
}
