//! Boundary and contact policies, applied after every body has integrated.

use crate::body::{Body, BodyId, BodyStatus};
use crate::error::ConfigurationError;
use crate::vector::Vector2;
use serde::{Deserialize, Serialize};

/// Axis of a wall contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
}

/// Something a boundary policy did during a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StepEvent {
    /// A body bounced off a wall of a [`BoundaryPolicy::ReflectAtBounds`] box.
    WallContact { body: BodyId, axis: Axis },
    /// A body reached the ground and stopped.
    Landed { body: BodyId },
    /// Two bodies collided and exchanged momentum.
    Collision { a: BodyId, b: BodyId },
}

/// Rule for what happens at domain edges or between touching bodies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Axis-aligned box. Bodies are clamped inside and bounce with
    /// coefficient `restitution`.
    ReflectAtBounds {
        min: Vector2,
        max: Vector2,
        restitution: f64,
    },
    /// Bodies that reach height `y` stop there and become
    /// [`BodyStatus::Landed`].
    ClampToGround { y: f64 },
    /// One-dimensional collision response along the line of centres.
    PairwiseCollision { restitution: f64 },
}

impl BoundaryPolicy {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match *self {
            Self::ReflectAtBounds {
                min,
                max,
                restitution,
            } => {
                check_restitution(restitution)?;
                if !(min.is_finite() && max.is_finite() && min.x < max.x && min.y < max.y) {
                    return Err(ConfigurationError::InvalidParameter {
                        name: "bounds",
                        value: max.x - min.x,
                    });
                }
                Ok(())
            }
            Self::ClampToGround { y } => {
                if y.is_finite() {
                    Ok(())
                } else {
                    Err(ConfigurationError::InvalidParameter {
                        name: "ground height",
                        value: y,
                    })
                }
            }
            Self::PairwiseCollision { restitution } => check_restitution(restitution),
        }
    }

    /// Whether `body` has room inside a reflecting box. Angular and fixed
    /// bodies are never clamped, so they always fit.
    pub fn fits(&self, body: &Body) -> bool {
        match *self {
            Self::ReflectAtBounds { min, max, .. } => {
                let diameter = 2.0 * body.radius;
                body.fixed
                    || body.is_angular()
                    || (diameter <= max.x - min.x && diameter <= max.y - min.y)
            }
            Self::ClampToGround { .. } | Self::PairwiseCollision { .. } => true,
        }
    }

    /// Applies the policy to every Cartesian body. Angular bodies are
    /// constrained by their arm and are left alone.
    pub fn apply(&self, bodies: &mut [Body], events: &mut Vec<StepEvent>) {
        match *self {
            Self::ReflectAtBounds {
                min,
                max,
                restitution,
            } => {
                for body in bodies.iter_mut().filter(|b| b.is_movable() && !b.is_angular()) {
                    let r = body.radius;
                    if reflect_axis(&mut body.position.x, &mut body.velocity.x, min.x, max.x, r, restitution) {
                        events.push(StepEvent::WallContact {
                            body: body.id,
                            axis: Axis::X,
                        });
                    }
                    if reflect_axis(&mut body.position.y, &mut body.velocity.y, min.y, max.y, r, restitution) {
                        events.push(StepEvent::WallContact {
                            body: body.id,
                            axis: Axis::Y,
                        });
                    }
                }
            }
            Self::ClampToGround { y } => {
                for body in bodies.iter_mut().filter(|b| b.is_movable() && !b.is_angular()) {
                    if body.position.y - body.radius <= y {
                        body.position.y = y + body.radius;
                        body.velocity = Vector2::ZERO;
                        body.status = BodyStatus::Landed;
                        events.push(StepEvent::Landed { body: body.id });
                    }
                }
            }
            Self::PairwiseCollision { restitution } => collide_pairs(bodies, restitution, events),
        }
    }
}

fn check_restitution(e: f64) -> Result<(), ConfigurationError> {
    if (0.0..=1.0).contains(&e) {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidRestitution(e))
    }
}

/// Clamps one coordinate into `[lo + r, hi − r]` and flips the velocity if
/// the body is still heading into the wall. Returns whether it flipped.
fn reflect_axis(pos: &mut f64, vel: &mut f64, lo: f64, hi: f64, radius: f64, e: f64) -> bool {
    if *pos - radius <= lo {
        *pos = lo + radius;
        if *vel < 0.0 {
            *vel = -*vel * e;
            return true;
        }
    } else if *pos + radius >= hi {
        *pos = hi - radius;
        if *vel > 0.0 {
            *vel = -*vel * e;
            return true;
        }
    }
    false
}

/// Post-collision velocities of two bodies on a line.
///
/// ```text
/// v1 = (e·m2·(u2−u1) + m1·u1 + m2·u2) / (m1+m2)
/// v2 = (e·m1·(u1−u2) + m1·u1 + m2·u2) / (m1+m2)
/// ```
///
/// `e = 1` conserves kinetic energy; `e = 0` leaves both bodies moving
/// with the common centre-of-mass velocity.
///
/// # Example
///
/// ```rust
/// use bamboo_sim::boundary::resolve_collision;
///
/// let (v1, v2) = resolve_collision(2.0, 5.0, 2.0, -5.0, 1.0);
/// assert_eq!((v1, v2), (-5.0, 5.0));
/// ```
pub fn resolve_collision(m1: f64, u1: f64, m2: f64, u2: f64, e: f64) -> (f64, f64) {
    let total = m1 + m2;
    let momentum = m1 * u1 + m2 * u2;
    let v1 = (e * m2 * (u2 - u1) + momentum) / total;
    let v2 = (e * m1 * (u1 - u2) + momentum) / total;
    (v1, v2)
}

/// Resolves at most one contact per body, scanning pairs in insertion order.
fn collide_pairs(bodies: &mut [Body], e: f64, events: &mut Vec<StepEvent>) {
    let n = bodies.len();
    let mut engaged = vec![false; n];

    for i in 0..n {
        for j in (i + 1)..n {
            if engaged[i] || engaged[j] {
                continue;
            }
            let (left, right) = bodies.split_at_mut(j);
            let a = &mut left[i];
            let b = &mut right[0];

            if a.is_angular() || b.is_angular() || (!a.is_movable() && !b.is_movable()) {
                continue;
            }

            let delta = b.position - a.position;
            let dist = delta.length();
            let overlap = (a.radius + b.radius) - dist;
            if overlap < 0.0 {
                continue;
            }
            let normal = if dist > 0.0 {
                delta * (1.0 / dist)
            } else {
                Vector2::new(1.0, 0.0)
            };
            let u1 = a.velocity.dot(normal);
            let u2 = b.velocity.dot(normal);
            let closing = u1 > u2;
            // Bodies merely touching at rest are not a contact.
            if overlap <= 0.0 && !closing {
                continue;
            }

            // Separate proportionally to the partner's mass; an immovable
            // partner behaves as infinitely heavy.
            let (share_a, share_b) = match (a.is_movable(), b.is_movable()) {
                (true, true) => {
                    let total = a.mass + b.mass;
                    (b.mass / total, a.mass / total)
                }
                (true, false) => (1.0, 0.0),
                _ => (0.0, 1.0),
            };
            a.position -= normal * (overlap * share_a);
            b.position += normal * (overlap * share_b);

            if closing {
                let (v1, v2) = match (a.is_movable(), b.is_movable()) {
                    (true, true) => resolve_collision(a.mass, u1, b.mass, u2, e),
                    (true, false) => (e * (u2 - u1) + u2, u2),
                    _ => (u1, e * (u1 - u2) + u1),
                };
                a.velocity = a.velocity - normal * u1 + normal * v1;
                b.velocity = b.velocity - normal * u2 + normal * v2;
            }

            engaged[i] = true;
            engaged[j] = true;
            events.push(StepEvent::Collision { a: a.id, b: b.id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn ball(id: u32, x: f64, vx: f64, mass: f64, radius: f64) -> Body {
        Body::new(BodyId(id), Vector2::new(x, 0.0), mass)
            .with_velocity(Vector2::new(vx, 0.0))
            .with_radius(radius)
    }

    #[test]
    fn test_elastic_equal_mass_swap() {
        let (v1, v2) = resolve_collision(2.0, 5.0, 2.0, -3.0, 1.0);
        assert!((v1 + 3.0).abs() < TOLERANCE);
        assert!((v2 - 5.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_inelastic_common_velocity() {
        let (v1, v2) = resolve_collision(1.0, 4.0, 3.0, 0.0, 0.0);
        assert!((v1 - 1.0).abs() < TOLERANCE);
        assert!((v2 - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_overlap_split_by_partner_mass() {
        let mut bodies = vec![ball(1, 0.0, 1.0, 1.0, 1.0), ball(2, 1.5, -1.0, 3.0, 1.0)];
        let mut events = Vec::new();
        BoundaryPolicy::PairwiseCollision { restitution: 1.0 }.apply(&mut bodies, &mut events);
        // Overlap 0.5: the light ball moves 3/4 of it, the heavy one 1/4.
        assert!((bodies[0].position.x + 0.375).abs() < TOLERANCE);
        assert!((bodies[1].position.x - 1.625).abs() < TOLERANCE);
        assert_eq!(
            events,
            vec![StepEvent::Collision {
                a: BodyId(1),
                b: BodyId(2)
            }]
        );
    }

    #[test]
    fn test_separating_bodies_keep_velocity() {
        let mut bodies = vec![ball(1, 0.0, -1.0, 1.0, 1.0), ball(2, 1.5, 1.0, 1.0, 1.0)];
        let mut events = Vec::new();
        BoundaryPolicy::PairwiseCollision { restitution: 1.0 }.apply(&mut bodies, &mut events);
        assert!((bodies[0].velocity.x + 1.0).abs() < TOLERANCE);
        assert!((bodies[1].velocity.x - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_one_contact_per_body() {
        let mut bodies = vec![
            ball(1, 0.0, 1.0, 1.0, 1.0),
            ball(2, 1.9, 0.0, 1.0, 1.0),
            ball(3, 3.8, -1.0, 1.0, 1.0),
        ];
        let mut events = Vec::new();
        BoundaryPolicy::PairwiseCollision { restitution: 1.0 }.apply(&mut bodies, &mut events);
        assert_eq!(events.len(), 1);
        // Body 3 was left for a later step.
        assert!((bodies[2].velocity.x + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_fixed_partner_reflects() {
        let mut bodies = vec![ball(1, 0.0, 2.0, 1.0, 1.0), ball(2, 1.5, 0.0, 1.0, 1.0).pinned()];
        let mut events = Vec::new();
        BoundaryPolicy::PairwiseCollision { restitution: 0.5 }.apply(&mut bodies, &mut events);
        assert!((bodies[0].velocity.x + 1.0).abs() < TOLERANCE);
        assert!((bodies[0].position.x + 0.5).abs() < TOLERANCE);
        assert!((bodies[1].position.x - 1.5).abs() < TOLERANCE);
    }

    #[test]
    fn test_wall_reflection_clamps() {
        let mut bodies = vec![ball(1, 9.5, 3.0, 1.0, 1.0)];
        let mut events = Vec::new();
        let policy = BoundaryPolicy::ReflectAtBounds {
            min: Vector2::new(0.0, -10.0),
            max: Vector2::new(10.0, 10.0),
            restitution: 1.0,
        };
        policy.apply(&mut bodies, &mut events);
        assert_eq!(bodies[0].position.x, 9.0);
        assert_eq!(bodies[0].velocity.x, -3.0);
        assert_eq!(
            events,
            vec![StepEvent::WallContact {
                body: BodyId(1),
                axis: Axis::X
            }]
        );
    }

    #[test]
    fn test_body_resting_on_wall_is_not_a_hit() {
        let mut bodies = vec![ball(1, 9.0, 0.0, 1.0, 1.0), ball(2, 1.0, 2.0, 1.0, 1.0)];
        let mut events = Vec::new();
        let policy = BoundaryPolicy::ReflectAtBounds {
            min: Vector2::new(0.0, -10.0),
            max: Vector2::new(10.0, 10.0),
            restitution: 1.0,
        };
        policy.apply(&mut bodies, &mut events);
        assert!(events.is_empty());
        assert_eq!(bodies[0].position.x, 9.0);
        // Touching the left wall while moving away from it.
        assert_eq!(bodies[1].velocity.x, 2.0);
    }

    #[test]
    fn test_touching_bodies_at_rest_do_not_collide() {
        let mut bodies = vec![ball(1, 0.0, 0.0, 1.0, 1.0), ball(2, 2.0, 0.0, 1.0, 1.0)];
        let mut events = Vec::new();
        BoundaryPolicy::PairwiseCollision { restitution: 1.0 }.apply(&mut bodies, &mut events);
        assert!(events.is_empty());
        assert_eq!(bodies[0].position.x, 0.0);
        assert_eq!(bodies[1].position.x, 2.0);
    }

    #[test]
    fn test_resting_pair_leaves_room_for_a_third_contact() {
        let mut bodies = vec![
            ball(1, 0.0, 0.0, 1.0, 1.0),
            ball(2, 2.0, 0.0, 1.0, 1.0),
            ball(3, 3.9, -1.0, 1.0, 1.0),
        ];
        let mut events = Vec::new();
        BoundaryPolicy::PairwiseCollision { restitution: 1.0 }.apply(&mut bodies, &mut events);
        assert_eq!(
            events,
            vec![StepEvent::Collision {
                a: BodyId(2),
                b: BodyId(3)
            }]
        );
        assert!((bodies[1].velocity.x + 1.0).abs() < TOLERANCE);
        assert!(bodies[2].velocity.x.abs() < TOLERANCE);
    }

    #[test]
    fn test_ground_lands_body() {
        let mut bodies = vec![Body::new(BodyId(1), Vector2::new(4.0, -0.2), 1.0)
            .with_velocity(Vector2::new(3.0, -5.0))];
        let mut events = Vec::new();
        BoundaryPolicy::ClampToGround { y: 0.0 }.apply(&mut bodies, &mut events);
        assert_eq!(bodies[0].position, Vector2::new(4.0, 0.0));
        assert_eq!(bodies[0].velocity, Vector2::ZERO);
        assert_eq!(bodies[0].status, BodyStatus::Landed);
    }

    #[test]
    fn test_validate_restitution() {
        assert!(BoundaryPolicy::PairwiseCollision { restitution: 1.2 }.validate().is_err());
        assert!(BoundaryPolicy::PairwiseCollision { restitution: -0.1 }.validate().is_err());
        assert!(BoundaryPolicy::PairwiseCollision { restitution: 0.0 }.validate().is_ok());
    }
}
