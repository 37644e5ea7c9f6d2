//! Closed-form damped harmonic oscillator.
//!
//! The stepper integrates springs numerically. This module gives the exact
//! answer for a single mass on a linear damped spring, which the tutor
//! context reports and the tests use as a reference trajectory.
//!
//! The propagation coefficients follow Ryan Juckett's damped spring
//! derivation: <https://www.ryanjuckett.com/damped-springs/>
//!
//! ```text
//! m·x'' + c·x' + k·x = 0
//! ω₀ = √(k/m)        ζ = c / (2·√(k·m))
//! ```

use crate::error::{ConfigurationError, Result};
use serde::{Deserialize, Serialize};

const EPSILON: f64 = 1e-9;

/// Returns the time step for a given number of frames per second.
///
/// ```rust
/// use bamboo_sim::oscillator::fps;
///
/// assert!((fps(60) - 0.016_666).abs() < 1e-5);
/// ```
#[inline]
pub fn fps(n: u32) -> f64 {
    1.0 / f64::from(n)
}

/// Qualitative behaviour of a damped oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// No restoring force. The mass coasts, slowed only by damping.
    Free,
    /// ζ < 1. Oscillates with decaying amplitude.
    UnderDamped,
    /// ζ = 1. Fastest return without overshoot.
    CriticallyDamped,
    /// ζ > 1. Creeps back without oscillating.
    OverDamped,
}

/// Physical parameters of a mass on a damped linear spring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DampedOscillator {
    pub mass: f64,
    pub stiffness: f64,
    pub damping: f64,
}

impl DampedOscillator {
    /// # Errors
    ///
    /// Mass must be positive, stiffness and damping non-negative.
    pub fn new(mass: f64, stiffness: f64, damping: f64) -> Result<Self> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(ConfigurationError::InvalidParameter { name: "mass", value: mass }.into());
        }
        if !(stiffness.is_finite() && stiffness >= 0.0) {
            return Err(ConfigurationError::InvalidParameter {
                name: "stiffness",
                value: stiffness,
            }
            .into());
        }
        if !(damping.is_finite() && damping >= 0.0) {
            return Err(ConfigurationError::InvalidParameter {
                name: "damping",
                value: damping,
            }
            .into());
        }
        Ok(Self {
            mass,
            stiffness,
            damping,
        })
    }

    /// Undamped angular frequency ω₀.
    pub fn natural_frequency(&self) -> f64 {
        (self.stiffness / self.mass).sqrt()
    }

    /// ζ. Infinite when there is no spring.
    pub fn damping_ratio(&self) -> f64 {
        let critical = 2.0 * (self.stiffness * self.mass).sqrt();
        if critical < EPSILON {
            f64::INFINITY
        } else {
            self.damping / critical
        }
    }

    pub fn regime(&self) -> Regime {
        if self.natural_frequency() < EPSILON {
            return Regime::Free;
        }
        let zeta = self.damping_ratio();
        if zeta < 1.0 - EPSILON {
            Regime::UnderDamped
        } else if zeta > 1.0 + EPSILON {
            Regime::OverDamped
        } else {
            Regime::CriticallyDamped
        }
    }

    /// Undamped period 2π/ω₀, or `None` without a spring.
    pub fn period(&self) -> Option<f64> {
        let omega = self.natural_frequency();
        (omega >= EPSILON).then(|| std::f64::consts::TAU / omega)
    }

    /// Total mechanical energy at displacement `x` and velocity `v`.
    pub fn energy(&self, x: f64, v: f64) -> f64 {
        0.5 * self.mass * v * v + 0.5 * self.stiffness * x * x
    }

    /// Precomputes the exact map over one step of `dt`.
    pub fn propagator(&self, dt: f64) -> Propagator {
        let omega = self.natural_frequency();
        match self.regime() {
            Regime::Free => Propagator::free(dt, self.damping / self.mass),
            Regime::UnderDamped => Propagator::under_damped(dt, omega, self.damping_ratio()),
            Regime::CriticallyDamped => Propagator::critically_damped(dt, omega),
            Regime::OverDamped => Propagator::over_damped(dt, omega, self.damping_ratio()),
        }
    }

    /// Displacement and velocity at time `t` from `(x0, v0)` at `t = 0`.
    pub fn state_at(&self, x0: f64, v0: f64, t: f64) -> (f64, f64) {
        self.propagator(t).apply(x0, v0)
    }
}

/// Linear map `(x, v) → (x', v')` for a fixed time step.
///
/// Build once, apply every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Propagator {
    xx: f64,
    xv: f64,
    vx: f64,
    vv: f64,
}

impl Propagator {
    fn free(dt: f64, decay: f64) -> Self {
        if decay < EPSILON {
            return Self {
                xx: 1.0,
                xv: dt,
                vx: 0.0,
                vv: 1.0,
            };
        }
        let e = (-decay * dt).exp();
        Self {
            xx: 1.0,
            xv: (1.0 - e) / decay,
            vx: 0.0,
            vv: e,
        }
    }

    fn under_damped(dt: f64, omega: f64, zeta: f64) -> Self {
        let decay = omega * zeta;
        let alpha = omega * (1.0 - zeta * zeta).sqrt();

        let e = (-decay * dt).exp();
        let (sin, cos) = (alpha * dt).sin_cos();
        let e_sin_over_alpha = e * sin / alpha;

        Self {
            xx: e * cos + decay * e_sin_over_alpha,
            xv: e_sin_over_alpha,
            vx: -e * sin * alpha - decay * decay * e_sin_over_alpha,
            vv: e * cos - decay * e_sin_over_alpha,
        }
    }

    fn critically_damped(dt: f64, omega: f64) -> Self {
        let e = (-omega * dt).exp();
        let te = dt * e;
        let wte = te * omega;

        Self {
            xx: wte + e,
            xv: te,
            vx: -omega * wte,
            vv: e - wte,
        }
    }

    fn over_damped(dt: f64, omega: f64, zeta: f64) -> Self {
        let root = omega * (zeta * zeta - 1.0).sqrt();
        let z1 = -omega * zeta - root;
        let z2 = -omega * zeta + root;

        let e1 = (z1 * dt).exp();
        let e2 = (z2 * dt).exp();
        let span = z2 - z1;

        Self {
            xx: (z2 * e1 - z1 * e2) / span,
            xv: (e2 - e1) / span,
            vx: z1 * z2 * (e1 - e2) / span,
            vv: (z2 * e2 - z1 * e1) / span,
        }
    }

    /// Advances displacement `x` and velocity `v` by one step.
    pub fn apply(&self, x: f64, v: f64) -> (f64, f64) {
        (self.xx * x + self.xv * v, self.vx * x + self.vv * v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(DampedOscillator::new(0.0, 1.0, 0.0).is_err());
        assert!(DampedOscillator::new(1.0, -1.0, 0.0).is_err());
        assert!(DampedOscillator::new(1.0, 1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_regimes() {
        assert_eq!(DampedOscillator::new(1.0, 4.0, 1.0).unwrap().regime(), Regime::UnderDamped);
        assert_eq!(DampedOscillator::new(1.0, 4.0, 4.0).unwrap().regime(), Regime::CriticallyDamped);
        assert_eq!(DampedOscillator::new(1.0, 4.0, 10.0).unwrap().regime(), Regime::OverDamped);
        assert_eq!(DampedOscillator::new(1.0, 0.0, 1.0).unwrap().regime(), Regime::Free);
    }

    #[test]
    fn test_undamped_matches_cosine() {
        let osc = DampedOscillator::new(2.0, 8.0, 0.0).unwrap();
        let omega = osc.natural_frequency();
        for t in [0.1, 0.7, 2.3] {
            let (x, v) = osc.state_at(1.5, 0.0, t);
            assert!((x - 1.5 * (omega * t).cos()).abs() < TOLERANCE);
            assert!((v + 1.5 * omega * (omega * t).sin()).abs() < TOLERANCE);
        }
    }

    #[test]
    fn test_undamped_conserves_energy() {
        let osc = DampedOscillator::new(1.0, 50.0, 0.0).unwrap();
        let step = osc.propagator(fps(60));
        let (mut x, mut v) = (2.0, 0.0);
        let e0 = osc.energy(x, v);
        for _ in 0..10_000 {
            (x, v) = step.apply(x, v);
        }
        assert!((osc.energy(x, v) - e0).abs() / e0 < 1e-6);
    }

    #[test]
    fn test_steps_compose() {
        for damping in [0.5, 2.0 * 5.0_f64.sqrt(), 12.0] {
            let osc = DampedOscillator::new(1.0, 5.0, damping).unwrap();
            let step = osc.propagator(0.01);
            let (mut x, mut v) = (1.0, -0.5);
            for _ in 0..100 {
                (x, v) = step.apply(x, v);
            }
            let (ex, ev) = osc.state_at(1.0, -0.5, 1.0);
            assert!((x - ex).abs() < 1e-9, "damping {damping}");
            assert!((v - ev).abs() < 1e-9, "damping {damping}");
        }
    }

    #[test]
    fn test_damped_settles() {
        for damping in [1.0, 4.0, 10.0] {
            let osc = DampedOscillator::new(1.0, 4.0, damping).unwrap();
            let (x, v) = osc.state_at(1.0, 0.0, 30.0);
            assert!(x.abs() < 1e-3 && v.abs() < 1e-3, "damping {damping}");
        }
    }

    #[test]
    fn test_free_coasts() {
        let osc = DampedOscillator::new(1.0, 0.0, 0.0).unwrap();
        assert_eq!(osc.state_at(0.0, 2.0, 3.0), (6.0, 2.0));
        assert!(osc.period().is_none());
    }
}
