//! Body collections, net force and the two-phase step.

use crate::body::{Body, BodyId, Motion};
use crate::boundary::{BoundaryPolicy, StepEvent};
use crate::error::{ConfigurationError, Result};
use crate::force::{Anchor, ForceLaw, ForceTerm, Source};
use crate::integrator::Integrator;
use crate::vector::Vector2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{trace, warn};

/// A recoverable problem detected while stepping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum StepWarning {
    /// Integration produced NaN or infinity. The body kept its last finite
    /// position and its velocity was zeroed for this step.
    NumericInstability { body: BodyId, time: f64 },
}

/// Everything that happened during one [`System::step`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub events: Vec<StepEvent>,
    pub warnings: Vec<StepWarning>,
}

/// An ordered set of bodies with the laws and boundaries that act on them.
///
/// Insertion order is iteration order, which keeps collision resolution
/// deterministic.
///
/// # Example
///
/// ```rust
/// use bamboo_sim::{Body, BodyId, ForceLaw, System, Vector2};
///
/// let system = System::builder()
///     .body(Body::new(BodyId(1), Vector2::new(0.0, 10.0), 1.0))
///     .force(ForceLaw::gravity(-9.8))
///     .build()
///     .unwrap();
/// let ball = system.body(BodyId(1)).unwrap();
/// assert_eq!(system.net_force(ball, 0.0), Vector2::new(0.0, -9.8));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct System {
    bodies: Vec<Body>,
    forces: Vec<ForceTerm>,
    boundaries: Vec<BoundaryPolicy>,
    integrator: Integrator,
}

impl System {
    /// Assembles and validates a system.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`](crate::Error::InvalidConfiguration)
    /// for a non-positive mass, a duplicate body id, restitution outside
    /// `[0, 1]`, a law that names a body not in `bodies`, or a body too wide
    /// for a reflecting box.
    pub fn new(
        bodies: Vec<Body>,
        forces: Vec<ForceTerm>,
        boundaries: Vec<BoundaryPolicy>,
    ) -> Result<Self> {
        let mut ids = HashSet::with_capacity(bodies.len());
        for body in &bodies {
            body.validate()?;
            if !ids.insert(body.id) {
                return Err(ConfigurationError::DuplicateBodyId(body.id).into());
            }
        }
        for term in &forces {
            term.law.validate()?;
            let named = term.targets.iter().flatten().copied();
            for id in named.chain(term.law.referenced_body()) {
                if !ids.contains(&id) {
                    return Err(ConfigurationError::UnknownBody(id).into());
                }
            }
        }
        for policy in &boundaries {
            policy.validate()?;
            if let Some(body) = bodies.iter().find(|b| !policy.fits(b)) {
                return Err(ConfigurationError::BodyExceedsBounds {
                    id: body.id,
                    radius: body.radius,
                }
                .into());
            }
        }

        Ok(Self {
            bodies,
            forces,
            boundaries,
            integrator: Integrator::default(),
        })
    }

    pub fn builder() -> SystemBuilder {
        SystemBuilder::default()
    }

    /// Replaces the integration scheme.
    pub const fn with_integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    /// Mutable access for callers that drag bodies around between ticks.
    ///
    /// Must not be used while a [`Driver`](crate::Driver) is running; mass
    /// and radius are not re-validated.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    pub fn forces(&self) -> &[ForceTerm] {
        &self.forces
    }

    pub fn boundaries(&self) -> &[BoundaryPolicy] {
        &self.boundaries
    }

    pub const fn integrator(&self) -> Integrator {
        self.integrator
    }

    /// Number of bodies that will still integrate.
    pub fn active_count(&self) -> usize {
        self.bodies.iter().filter(|b| b.is_movable()).count()
    }

    /// Sum of every in-scope law except friction.
    pub fn applied_force(&self, body: &Body, t: f64) -> Vector2 {
        if !body.is_movable() {
            return Vector2::ZERO;
        }
        self.forces
            .iter()
            .filter(|term| !term.law.is_friction() && term.applies_to(body.id))
            .fold(Vector2::ZERO, |acc, term| {
                acc + term
                    .law
                    .force_among(&self.bodies, body, t, |p| term.applies_to(p.id))
            })
    }

    /// Net Cartesian force on `body` at time `t`. Fixed and terminal bodies
    /// feel nothing.
    pub fn net_force(&self, body: &Body, t: f64) -> Vector2 {
        if !body.is_movable() {
            return Vector2::ZERO;
        }
        let applied = self.applied_force(body, t);
        self.forces
            .iter()
            .filter(|term| term.law.is_friction() && term.applies_to(body.id))
            .fold(applied, |acc, term| acc + term.law.friction_response(body, applied))
    }

    /// Net angular acceleration on an angular `body`.
    pub fn angular_acceleration(&self, body: &Body, t: f64) -> f64 {
        if !body.is_movable() {
            return 0.0;
        }
        self.forces
            .iter()
            .filter(|term| term.applies_to(body.id))
            .map(|term| term.law.angular_acceleration(body, t))
            .sum()
    }

    /// Whether friction stops `body` within `dt` and then holds it: the
    /// speed is within one step of kinetic deceleration and the other forces
    /// cannot overcome the static limit.
    fn friction_arrests(&self, body: &Body, t: f64, dt: f64) -> bool {
        let limit: f64 = self
            .forces
            .iter()
            .filter(|term| term.applies_to(body.id))
            .map(|term| term.law.friction_limit(body))
            .sum();
        limit > 0.0
            && body.velocity.length() <= limit / body.mass * dt
            && self.applied_force(body, t).length() <= limit
    }

    /// Advances the system from `t` to `t + dt`.
    ///
    /// Forces are evaluated for every body from the pre-step state, then all
    /// bodies integrate, then boundary policies run in order.
    pub fn step(&mut self, t: f64, dt: f64) -> StepReport {
        let mut report = StepReport::default();

        let next: Vec<Option<Body>> = self
            .bodies
            .iter()
            .map(|body| {
                if !body.is_movable() {
                    None
                } else if body.is_angular() {
                    let alpha = self.angular_acceleration(body, t);
                    Some(self.integrator.step_angular(body, alpha, dt))
                } else {
                    let force = self.net_force(body, t);
                    let mut next = self.integrator.step(body, force, dt);
                    if self.friction_arrests(body, t, dt) {
                        next.velocity = Vector2::ZERO;
                    }
                    Some(next)
                }
            })
            .collect();

        for (slot, candidate) in self.bodies.iter_mut().zip(next) {
            let Some(mut candidate) = candidate else {
                continue;
            };
            if !is_finite_state(&candidate) {
                warn!(body = %slot.id, time = t, "numeric instability, velocity zeroed");
                report.warnings.push(StepWarning::NumericInstability { body: slot.id, time: t });
                candidate = slot.clone();
                stall(&mut candidate);
            }
            *slot = candidate;
        }

        for policy in &self.boundaries {
            policy.apply(&mut self.bodies, &mut report.events);
        }

        trace!(
            time = t + dt,
            events = report.events.len(),
            "system stepped"
        );
        report
    }

    /// Total kinetic energy of non-fixed bodies.
    pub fn kinetic_energy(&self) -> f64 {
        self.bodies
            .iter()
            .filter(|b| !b.fixed)
            .map(Body::kinetic_energy)
            .sum()
    }

    /// Total linear momentum of non-fixed bodies.
    pub fn momentum(&self) -> Vector2 {
        self.bodies
            .iter()
            .filter(|b| !b.fixed)
            .fold(Vector2::ZERO, |acc, b| acc + b.momentum())
    }

    /// Elastic energy stored in every spring term, `½·k·(|d| − L0)²`.
    pub fn spring_potential_energy(&self) -> f64 {
        let mut energy = 0.0;
        for term in &self.forces {
            let ForceLaw::Spring {
                anchor,
                stiffness,
                rest_length,
                ..
            } = term.law
            else {
                continue;
            };
            let anchor_pos = match anchor {
                Anchor::Point(p) => Some(p),
                Anchor::Body(id) => self.body(id).map(|b| b.position),
            };
            let Some(anchor_pos) = anchor_pos else {
                continue;
            };
            for body in self.cartesian_in_scope(term) {
                let stretch = (body.position - anchor_pos).length() - rest_length;
                energy += 0.5 * stiffness * stretch * stretch;
            }
        }
        energy
    }

    /// Potential energy of gravity, inverse-square, field and pendulum
    /// terms. Zero levels: the origin for uniform fields, infinity for
    /// inverse-square pairs, the hanging position for pendula.
    pub fn potential_energy(&self) -> f64 {
        let mut energy = 0.0;
        for term in &self.forces {
            match term.law {
                ForceLaw::ConstantGravity { acceleration } => {
                    for body in self.cartesian_in_scope(term).filter(|b| !b.fixed) {
                        energy -= body.mass * acceleration.dot(body.position);
                    }
                }
                ForceLaw::UniformField { field } => {
                    for body in self.cartesian_in_scope(term).filter(|b| !b.fixed) {
                        energy -= body.charge * field.dot(body.position);
                    }
                }
                ForceLaw::InverseSquare {
                    constant,
                    source,
                    softening,
                } => {
                    let members: Vec<&Body> = self
                        .bodies
                        .iter()
                        .filter(|b| term.applies_to(b.id))
                        .collect();
                    for (i, a) in members.iter().enumerate() {
                        for b in &members[i + 1..] {
                            let d = a.position.distance(b.position).max(softening);
                            energy += match source {
                                Source::Mass => -constant * a.mass * b.mass / d,
                                Source::Charge => constant * a.charge * b.charge / d,
                            };
                        }
                    }
                }
                ForceLaw::Pendulum { gravity, .. } => {
                    for body in self.bodies.iter().filter(|b| term.applies_to(b.id)) {
                        if let Motion::Angular { length, theta, .. } = body.motion {
                            energy += body.mass * gravity * length * (1.0 - theta.cos());
                        }
                    }
                }
                _ => {}
            }
        }
        energy
    }

    /// Kinetic plus spring plus field potential energy.
    pub fn total_energy(&self) -> f64 {
        self.kinetic_energy() + self.spring_potential_energy() + self.potential_energy()
    }

    fn cartesian_in_scope<'a>(&'a self, term: &'a ForceTerm) -> impl Iterator<Item = &'a Body> + 'a {
        self.bodies
            .iter()
            .filter(move |b| !b.is_angular() && term.applies_to(b.id))
    }
}

fn is_finite_state(body: &Body) -> bool {
    let angular_ok = match body.motion {
        Motion::Angular { theta, omega, .. } => theta.is_finite() && omega.is_finite(),
        Motion::Cartesian => true,
    };
    angular_ok && body.position.is_finite() && body.velocity.is_finite()
}

fn stall(body: &mut Body) {
    if let Motion::Angular { ref mut omega, .. } = body.motion {
        *omega = 0.0;
        body.sync_angular();
    }
    body.velocity = Vector2::ZERO;
}

/// Incremental [`System`] construction.
#[derive(Debug, Clone, Default)]
pub struct SystemBuilder {
    bodies: Vec<Body>,
    forces: Vec<ForceTerm>,
    boundaries: Vec<BoundaryPolicy>,
    integrator: Integrator,
}

impl SystemBuilder {
    pub fn body(mut self, body: Body) -> Self {
        self.bodies.push(body);
        self
    }

    pub fn bodies(mut self, bodies: impl IntoIterator<Item = Body>) -> Self {
        self.bodies.extend(bodies);
        self
    }

    /// Adds a law acting on every body.
    pub fn force(mut self, law: ForceLaw) -> Self {
        self.forces.push(ForceTerm::global(law));
        self
    }

    /// Adds a law acting only on `targets`.
    pub fn force_on(mut self, targets: impl IntoIterator<Item = BodyId>, law: ForceLaw) -> Self {
        self.forces.push(ForceTerm::only(law, targets));
        self
    }

    pub fn term(mut self, term: ForceTerm) -> Self {
        self.forces.push(term);
        self
    }

    pub fn boundary(mut self, policy: BoundaryPolicy) -> Self {
        self.boundaries.push(policy);
        self
    }

    pub const fn integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    /// Validates and builds the system.
    ///
    /// # Errors
    ///
    /// See [`System::new`].
    pub fn build(self) -> Result<System> {
        Ok(System::new(self.bodies, self.forces, self.boundaries)?.with_integrator(self.integrator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn ball(id: u32, x: f64, y: f64) -> Body {
        Body::new(BodyId(id), Vector2::new(x, y), 1.0)
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = System::builder()
            .body(ball(1, 0.0, 0.0))
            .body(ball(1, 1.0, 0.0))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidConfiguration(ConfigurationError::DuplicateBodyId(BodyId(1)))
        ));
    }

    #[test]
    fn test_unknown_target_rejected() {
        let err = System::builder()
            .body(ball(1, 0.0, 0.0))
            .force_on([BodyId(9)], ForceLaw::gravity(-9.8))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidConfiguration(ConfigurationError::UnknownBody(BodyId(9)))
        ));
    }

    #[test]
    fn test_body_larger_than_box_rejected() {
        let err = System::builder()
            .body(ball(1, 2.0, 2.0).with_radius(3.0))
            .boundary(BoundaryPolicy::ReflectAtBounds {
                min: Vector2::ZERO,
                max: Vector2::new(4.0, 4.0),
                restitution: 1.0,
            })
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidConfiguration(ConfigurationError::BodyExceedsBounds { id: BodyId(1), .. })
        ));
    }

    #[test]
    fn test_scoped_force_only_hits_targets() {
        let system = System::builder()
            .body(ball(1, 0.0, 0.0))
            .body(ball(2, 5.0, 0.0))
            .force_on([BodyId(2)], ForceLaw::gravity(-9.8))
            .build()
            .unwrap();
        assert_eq!(system.net_force(&system.bodies()[0], 0.0), Vector2::ZERO);
        assert_eq!(
            system.net_force(&system.bodies()[1], 0.0),
            Vector2::new(0.0, -9.8)
        );
    }

    #[test]
    fn test_fixed_body_skipped() {
        let mut system = System::builder()
            .body(ball(1, 0.0, 0.0).pinned())
            .force(ForceLaw::gravity(-9.8))
            .build()
            .unwrap();
        assert_eq!(system.net_force(&system.bodies()[0], 0.0), Vector2::ZERO);
        system.step(0.0, 0.1);
        assert_eq!(system.bodies()[0].position, Vector2::ZERO);
    }

    #[test]
    fn test_forces_use_pre_step_state() {
        // Two equal masses attract symmetrically only if both forces are
        // computed before either body moves.
        let mut system = System::builder()
            .body(ball(1, -1.0, 0.0))
            .body(ball(2, 1.0, 0.0))
            .force(ForceLaw::newtonian(1.0))
            .build()
            .unwrap();
        system.step(0.0, 0.1);
        let p = system.momentum();
        assert!(p.length() < 1e-12, "momentum should stay zero, got {p:?}");
    }

    #[test]
    fn test_instability_zeroes_velocity() {
        let mut system = System::builder()
            .body(ball(1, 0.0, 0.0).with_velocity(Vector2::new(1.0, 0.0)))
            .force(ForceLaw::ConstantGravity {
                acceleration: Vector2::new(f64::MAX, 0.0),
            })
            .build()
            .unwrap();
        let report = system.step(0.0, 10.0);
        assert_eq!(report.warnings.len(), 1);
        let body = &system.bodies()[0];
        assert_eq!(body.velocity, Vector2::ZERO);
        assert_eq!(body.position, Vector2::ZERO);
    }

    #[test]
    fn test_friction_brings_slide_to_rest() {
        let mut system = System::builder()
            .body(ball(1, 0.0, 0.0).with_velocity(Vector2::new(1.0, 0.0)))
            .force(ForceLaw::Friction {
                coefficient: 0.3,
                normal_acceleration: 9.8,
            })
            .build()
            .unwrap();
        for _ in 0..2000 {
            system.step(0.0, 0.05);
        }
        let block = &system.bodies()[0];
        assert_eq!(block.velocity, Vector2::ZERO);
        assert!(block.position.x > 0.15 && block.position.x < 0.25, "x={}", block.position.x);
    }

    #[test]
    fn test_friction_runs_after_applied_forces() {
        let system = System::builder()
            .body(ball(1, 0.0, 0.0))
            .force(ForceLaw::ConstantGravity {
                acceleration: Vector2::new(2.0, 0.0),
            })
            .force(ForceLaw::Friction {
                coefficient: 0.5,
                normal_acceleration: 9.8,
            })
            .build()
            .unwrap();
        // Pull of 2 N is below the static limit of 4.9 N.
        assert_eq!(system.net_force(&system.bodies()[0], 0.0), Vector2::ZERO);
        let law = &system.forces()[1].law;
        let body = &system.bodies()[0];
        assert_eq!(law.force(&system, body, 0.0), Vector2::new(-2.0, 0.0));
    }

    #[test]
    fn test_pendulum_potential_energy() {
        let system = System::builder()
            .body(Body::pendulum(BodyId(1), Vector2::ZERO, 2.0, core::f64::consts::FRAC_PI_2, 0.0, 3.0))
            .force(ForceLaw::Pendulum {
                gravity: 9.8,
                damping: 0.0,
            })
            .build()
            .unwrap();
        assert!((system.potential_energy() - 3.0 * 9.8 * 2.0).abs() < 1e-9);
    }
}
