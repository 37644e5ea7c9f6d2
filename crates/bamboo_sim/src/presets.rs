//! Built-in scenarios reproducing the BambooLab physics widgets.
//!
//! Every preset is an ordinary [`System`] plus a time step. The widgets'
//! screen coordinates are y-down; presets are expressed in the y-up world
//! used everywhere else in this crate.

use crate::body::{Body, BodyId};
use crate::boundary::{resolve_collision, BoundaryPolicy};
use crate::driver::{Driver, Launch, RunState, ShotState};
use crate::error::{Error, Result};
use crate::force::{ForceLaw, Source, STANDARD_GRAVITY};
use crate::integrator::Integrator;
use crate::oscillator::DampedOscillator;
use crate::system::System;
use crate::tutor::SimContext;
use crate::vector::Vector2;
use std::f64::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;

const PENDULUM_LENGTH: f64 = 1.5;

const SPRING_MASS: f64 = 5.0;
const SPRING_STIFFNESS: f64 = 50.0;
/// The widget scales its damping slider by five before applying it.
const SPRING_DAMPING: f64 = 0.5 * 5.0;

const LAUNCH_SPEED: f64 = 15.0;
const LAUNCH_ANGLE_DEGREES: f64 = 45.0;

const BULLET_MASS: f64 = 0.05;
const BLOCK_MASS: f64 = 1.0;
const BULLET_SPEED: f64 = 200.0;
const BALLISTIC_LENGTH: f64 = 2.5;

const ORBIT_CONSTANT: f64 = 0.5;
const ORBIT_SOFTENING: f64 = 5.0;

const GRAVITY_LAB_CONSTANT: f64 = 6.674e-8;
const GRAVITY_LAB_DISPLAY_SCALE: f64 = 1e9;
const COULOMB_CONSTANT: f64 = 9000.0;
const COULOMB_DISPLAY_SCALE: f64 = 0.05;
const LAB_SEPARATION: f64 = 4.0;

const GAS_PARTICLES: u32 = 50;
const GAS_WIDTH: f64 = 500.0;
const GAS_HEIGHT: f64 = 400.0;
const GAS_TEMPERATURE: f64 = 300.0;

const RAMP_ANGLE_DEGREES: f64 = 20.0;
const RAMP_LENGTH: f64 = 10.0;
const RAMP_MASS: f64 = 10.0;
const RAMP_FRICTION: f64 = 0.3;

const CHARGED_MASS: f64 = 5.0;
const CHARGED_STIFFNESS: f64 = 20.0;
const CHARGED_CHARGE: f64 = 2.0;
const CHARGED_FIELD: f64 = 10.0;
const CHARGED_DAMPING: f64 = 0.2;

/// Names of the built-in scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresetKind {
    PendulumLab,
    HookesLaw,
    CollisionLab,
    ProjectileMotion,
    BallisticPendulum,
    SolarSystem,
    BinaryStar,
    GravityForceLab,
    Coulomb,
    GasProperties,
    FrictionRamp,
    ChargedSpring,
}

impl PresetKind {
    pub const ALL: [Self; 12] = [
        Self::PendulumLab,
        Self::HookesLaw,
        Self::CollisionLab,
        Self::ProjectileMotion,
        Self::BallisticPendulum,
        Self::SolarSystem,
        Self::BinaryStar,
        Self::GravityForceLab,
        Self::Coulomb,
        Self::GasProperties,
        Self::FrictionRamp,
        Self::ChargedSpring,
    ];

    /// Command-line name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::PendulumLab => "pendulum-lab",
            Self::HookesLaw => "hookes-law",
            Self::CollisionLab => "collision-lab",
            Self::ProjectileMotion => "projectile-motion",
            Self::BallisticPendulum => "ballistic-pendulum",
            Self::SolarSystem => "solar-system",
            Self::BinaryStar => "binary-star",
            Self::GravityForceLab => "gravity-force-lab",
            Self::Coulomb => "coulomb",
            Self::GasProperties => "gas-properties",
            Self::FrictionRamp => "friction-ramp",
            Self::ChargedSpring => "charged-spring",
        }
    }

    /// Display title, as shown to the tutor.
    pub const fn title(self) -> &'static str {
        match self {
            Self::PendulumLab => "Pendulum Lab",
            Self::HookesLaw => "Hooke's Law & Harmonic Motion",
            Self::CollisionLab => "Collision Lab (Momentum)",
            Self::ProjectileMotion => "Projectile Motion Lab",
            Self::BallisticPendulum => "Ballistic Pendulum (Integrated Lab)",
            Self::SolarSystem | Self::BinaryStar => "Kepler's Laws & Orbital Gravity",
            Self::GravityForceLab => "Gravity Force Lab",
            Self::Coulomb => "Coulomb's Law (Electrostatics)",
            Self::GasProperties => "Gas Properties (Ideal Gas Law)",
            Self::FrictionRamp => "Friction Ramp",
            Self::ChargedSpring => "Charged Spring (Integrated Lab)",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::PendulumLab => "Simulates a simple pendulum. Observe the period of oscillation.",
            Self::HookesLaw => {
                "Explore the relationship between force, spring constant, and displacement (F = -kx). \
                 Observe damped harmonic motion."
            }
            Self::CollisionLab => {
                "Explore conservation of momentum and energy in 1D collisions. \
                 Adjust mass, velocity, and elasticity."
            }
            Self::ProjectileMotion => {
                "Simulates projectile motion under gravity. Users can adjust initial velocity, \
                 launch angle, gravity, and launch height."
            }
            Self::BallisticPendulum => {
                "Combine Momentum and Energy principles. A bullet strikes a block, transferring \
                 momentum, then the system swings, converting Kinetic Energy to Potential Energy."
            }
            Self::SolarSystem | Self::BinaryStar => {
                "Simulate gravitational N-body interactions using Newton's Law of Universal \
                 Gravitation. Observe Kepler's laws of planetary motion (Orbits, Areas, Periods)."
            }
            Self::GravityForceLab => {
                "Visualize gravitational force between two masses (F = G m1m2 / r²)."
            }
            Self::Coulomb => "Visualize electrostatic force between two charges (F = k q1q2 / r²).",
            Self::GasProperties => {
                "Observe gas particles in a container. Relate Pressure, Volume, and Temperature (PV = nRT)."
            }
            Self::FrictionRamp => "Analyze forces on a ramp. Adjust angle, mass, and friction.",
            Self::ChargedSpring => {
                "A charged mass on a spring inside an electric field. \
                 Combines Hooke's Law with Electrostatics."
            }
        }
    }

    /// Assembles the preset with the widget's default parameters.
    pub fn build(self) -> Result<Preset> {
        match self {
            Self::PendulumLab => pendulum_lab(),
            Self::HookesLaw => hookes_law(),
            Self::CollisionLab => collision_lab(),
            Self::ProjectileMotion => projectile_motion(),
            Self::BallisticPendulum => ballistic_pendulum(),
            Self::SolarSystem => solar_system(),
            Self::BinaryStar => binary_star(),
            Self::GravityForceLab => two_body_lab(self, Source::Mass),
            Self::Coulomb => two_body_lab(self, Source::Charge),
            Self::GasProperties => gas_properties(),
            Self::FrictionRamp => friction_ramp(),
            Self::ChargedSpring => charged_spring(),
        }
    }

    /// Tutor context for the current state of a driver running this preset.
    pub fn context(self, driver: &Driver) -> SimContext {
        let base = SimContext::new(self.title(), self.description());
        let system = driver.system();
        match self {
            Self::PendulumLab => pendulum_context(base, driver),
            Self::HookesLaw => hookes_context(base, system),
            Self::CollisionLab => collision_context(base, driver),
            Self::ProjectileMotion => projectile_context(base, driver),
            Self::BallisticPendulum => ballistic_context(base, driver),
            Self::SolarSystem | Self::BinaryStar => orbit_context(base, self, system),
            Self::GravityForceLab | Self::Coulomb => two_body_context(base, self, system),
            Self::GasProperties => gas_context(base, system),
            Self::FrictionRamp => ramp_context(base, system),
            Self::ChargedSpring => charged_spring_context(base, system),
        }
    }
}

impl fmt::Display for PresetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PresetKind {
    type Err = Error;

    /// Accepts the command-line name, case-insensitively, with `_` or `-`.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| Error::UnknownPreset(s.to_owned()))
    }
}

/// A ready-to-run scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub kind: PresetKind,
    pub system: System,
    pub dt: f64,
    pub launch: Option<Launch>,
}

impl Preset {
    /// A fresh driver over a copy of the preset.
    pub fn driver(&self) -> Result<Driver> {
        let driver = Driver::new(self.system.clone(), self.dt)?;
        match self.launch {
            Some(launch) => driver.with_launch(launch),
            None => Ok(driver),
        }
    }
}

// ============================================================================
// Builders
// ============================================================================

fn preset(kind: PresetKind, system: System, dt: f64) -> Preset {
    Preset {
        kind,
        system,
        dt,
        launch: None,
    }
}

fn pendulum_lab() -> Result<Preset> {
    let system = System::builder()
        .body(Body::pendulum(BodyId(1), Vector2::ZERO, PENDULUM_LENGTH, PI / 4.0, 0.0, 1.0))
        .force(ForceLaw::Pendulum {
            gravity: STANDARD_GRAVITY,
            damping: 0.0,
        })
        .build()?;
    Ok(preset(PresetKind::PendulumLab, system, 0.016))
}

fn hookes_law() -> Result<Preset> {
    let system = System::builder()
        .body(Body::new(BodyId(1), Vector2::new(1.0, 0.0), SPRING_MASS))
        .force(ForceLaw::Spring {
            anchor: crate::force::Anchor::Point(Vector2::ZERO),
            stiffness: SPRING_STIFFNESS,
            rest_length: 0.0,
            damping: SPRING_DAMPING,
        })
        .build()?;
    Ok(preset(PresetKind::HookesLaw, system, 0.016))
}

/// Ball radius grows with mass, as drawn by the widget.
fn ball_radius(mass: f64) -> f64 {
    20.0 + 5.0 * mass
}

fn collision_lab() -> Result<Preset> {
    let system = System::builder()
        .body(
            Body::new(BodyId(1), Vector2::new(200.0, 0.0), 2.0)
                .with_velocity(Vector2::new(5.0, 0.0))
                .with_radius(ball_radius(2.0)),
        )
        .body(
            Body::new(BodyId(2), Vector2::new(600.0, 0.0), 2.0)
                .with_velocity(Vector2::new(-3.0, 0.0))
                .with_radius(ball_radius(2.0)),
        )
        .boundary(BoundaryPolicy::ReflectAtBounds {
            min: Vector2::new(0.0, -100.0),
            max: Vector2::new(800.0, 100.0),
            restitution: 1.0,
        })
        .boundary(BoundaryPolicy::PairwiseCollision { restitution: 1.0 })
        .build()?;
    Ok(preset(PresetKind::CollisionLab, system, 1.0))
}

fn projectile_motion() -> Result<Preset> {
    let system = System::builder()
        .body(Body::new(BodyId(1), Vector2::ZERO, 1.0))
        .force(ForceLaw::gravity(-STANDARD_GRAVITY))
        .boundary(BoundaryPolicy::ClampToGround { y: 0.0 })
        .build()?;
    let mut preset = preset(PresetKind::ProjectileMotion, system, 0.05);
    preset.launch = Some(Launch::at_angle(
        BodyId(1),
        LAUNCH_SPEED,
        LAUNCH_ANGLE_DEGREES.to_radians(),
    ));
    Ok(preset)
}

/// The bullet embeds instantly; the combined bob is launched with the
/// perfectly inelastic capture velocity.
fn ballistic_pendulum() -> Result<Preset> {
    let (capture, _) = resolve_collision(BULLET_MASS, BULLET_SPEED, BLOCK_MASS, 0.0, 0.0);
    let system = System::builder()
        .body(Body::pendulum(
            BodyId(1),
            Vector2::ZERO,
            BALLISTIC_LENGTH,
            0.0,
            0.0,
            BULLET_MASS + BLOCK_MASS,
        ))
        .force(ForceLaw::Pendulum {
            gravity: STANDARD_GRAVITY,
            damping: 0.0,
        })
        .build()?;
    let mut preset = preset(PresetKind::BallisticPendulum, system, 0.016);
    preset.launch = Some(Launch {
        body: BodyId(1),
        velocity: Vector2::new(capture, 0.0),
    });
    Ok(preset)
}

fn orbiter(id: u32, x: f64, y: f64, vx: f64, vy: f64, mass: f64, radius: f64) -> Body {
    Body::new(BodyId(id), Vector2::new(x, y), mass)
        .with_velocity(Vector2::new(vx, vy))
        .with_radius(radius)
}

fn orbits(kind: PresetKind, bodies: Vec<Body>) -> Result<Preset> {
    let system = System::builder()
        .bodies(bodies)
        .force(ForceLaw::InverseSquare {
            constant: ORBIT_CONSTANT,
            source: Source::Mass,
            softening: ORBIT_SOFTENING,
        })
        .integrator(Integrator::SemiImplicitEuler)
        .build()?;
    Ok(preset(kind, system, 1.0))
}

fn solar_system() -> Result<Preset> {
    orbits(
        PresetKind::SolarSystem,
        vec![
            orbiter(1, 0.0, 0.0, 0.0, 0.0, 2000.0, 25.0),
            orbiter(2, 150.0, 0.0, 0.0, 2.5, 100.0, 10.0),
            orbiter(3, 250.0, 0.0, 0.0, 1.8, 300.0, 15.0),
            orbiter(4, 60.0, 0.0, 0.0, 4.5, 20.0, 5.0),
        ],
    )
}

fn binary_star() -> Result<Preset> {
    orbits(
        PresetKind::BinaryStar,
        vec![
            orbiter(1, -100.0, 0.0, 0.0, 1.5, 1000.0, 20.0),
            orbiter(2, 100.0, 0.0, 0.0, -1.5, 1000.0, 20.0),
            orbiter(3, 0.0, 0.0, 2.0, 0.0, 50.0, 8.0),
        ],
    )
}

/// Two spheres held `LAB_SEPARATION` apart. Masses are heavy enough that
/// the pull is visible over seconds, not a single step.
fn two_body_lab(kind: PresetKind, source: Source) -> Result<Preset> {
    let half = LAB_SEPARATION / 2.0;
    let (constant, first, second) = match source {
        Source::Mass => (GRAVITY_LAB_CONSTANT, (100.0, 0.0), (400.0, 0.0)),
        Source::Charge => (COULOMB_CONSTANT, (1000.0, 5.0), (1000.0, -5.0)),
    };
    let system = System::builder()
        .body(
            Body::new(BodyId(1), Vector2::new(-half, 0.0), first.0)
                .with_charge(first.1)
                .with_radius(0.25),
        )
        .body(
            Body::new(BodyId(2), Vector2::new(half, 0.0), second.0)
                .with_charge(second.1)
                .with_radius(0.25),
        )
        .force(ForceLaw::InverseSquare {
            constant,
            source,
            softening: crate::force::DEFAULT_SOFTENING,
        })
        .boundary(BoundaryPolicy::PairwiseCollision { restitution: 0.5 })
        .build()?;
    Ok(preset(kind, system, 0.016))
}

/// Particle speed for a temperature, in widget units per frame.
fn gas_speed(temperature: f64) -> f64 {
    temperature.sqrt() / 5.0
}

fn gas_properties() -> Result<Preset> {
    const COLUMNS: u32 = 10;
    let rows = GAS_PARTICLES.div_ceil(COLUMNS);
    let speed = gas_speed(GAS_TEMPERATURE);
    let golden_angle = PI * (3.0 - 5.0_f64.sqrt());
    let dx = GAS_WIDTH / f64::from(COLUMNS);
    let dy = GAS_HEIGHT / f64::from(rows);

    let particles = (0..GAS_PARTICLES).map(|i| {
        let (col, row) = (i % COLUMNS, i / COLUMNS);
        let position = Vector2::new(
            dx * (f64::from(col) + 0.5),
            dy * (f64::from(row) + 0.5),
        );
        Body::new(BodyId(i + 1), position, 1.0)
            .with_velocity(Vector2::from_angle(golden_angle * f64::from(i)) * speed)
    });

    let system = System::builder()
        .bodies(particles)
        .boundary(BoundaryPolicy::ReflectAtBounds {
            min: Vector2::ZERO,
            max: Vector2::new(GAS_WIDTH, GAS_HEIGHT),
            restitution: 1.0,
        })
        .build()?;
    Ok(preset(PresetKind::GasProperties, system, 1.0))
}

/// The ramp is unrolled onto the y axis: the block starts `RAMP_LENGTH`
/// up the slope and lands at the bottom.
fn friction_ramp() -> Result<Preset> {
    let angle = RAMP_ANGLE_DEGREES.to_radians();
    let system = System::builder()
        .body(Body::new(BodyId(1), Vector2::new(0.0, RAMP_LENGTH), RAMP_MASS))
        .force(ForceLaw::gravity(-STANDARD_GRAVITY * angle.sin()))
        .force(ForceLaw::Friction {
            coefficient: RAMP_FRICTION,
            normal_acceleration: STANDARD_GRAVITY * angle.cos(),
        })
        .boundary(BoundaryPolicy::ClampToGround { y: 0.0 })
        .build()?;
    Ok(preset(PresetKind::FrictionRamp, system, 0.05))
}

fn charged_spring() -> Result<Preset> {
    let system = System::builder()
        .body(Body::new(BodyId(1), Vector2::ZERO, CHARGED_MASS).with_charge(CHARGED_CHARGE))
        .force(ForceLaw::Spring {
            anchor: crate::force::Anchor::Point(Vector2::ZERO),
            stiffness: CHARGED_STIFFNESS,
            rest_length: 0.0,
            damping: CHARGED_DAMPING,
        })
        .force(ForceLaw::gravity(-STANDARD_GRAVITY))
        .force(ForceLaw::UniformField {
            field: Vector2::new(0.0, -CHARGED_FIELD),
        })
        .build()?;
    Ok(preset(PresetKind::ChargedSpring, system, 0.05))
}

// ============================================================================
// Tutor contexts
// ============================================================================

fn find_law<T>(system: &System, pick: impl Fn(&ForceLaw) -> Option<T>) -> Option<T> {
    system.forces().iter().find_map(|term| pick(&term.law))
}

fn first_body(system: &System) -> Option<&Body> {
    system.bodies().first()
}

fn pendulum_context(base: SimContext, driver: &Driver) -> SimContext {
    let system = driver.system();
    let gravity = find_law(system, |law| match *law {
        ForceLaw::Pendulum { gravity, .. } => Some(gravity),
        _ => None,
    })
    .unwrap_or(STANDARD_GRAVITY);
    let damping = find_law(system, |law| match *law {
        ForceLaw::Pendulum { damping, .. } => Some(damping),
        _ => None,
    })
    .unwrap_or(0.0);
    let Some(bob) = first_body(system) else {
        return base;
    };
    let length = match bob.motion {
        crate::body::Motion::Angular { length, .. } => length,
        crate::body::Motion::Cartesian => PENDULUM_LENGTH,
    };
    let period = TAU * (length / gravity).sqrt();
    let status = if driver.state() == RunState::Running {
        "Swinging"
    } else {
        "Paused"
    };

    base.with("String Length", format!("{length} m"))
        .with("Gravity", format!("{gravity} m/s²"))
        .with("Mass", format!("{} kg", bob.mass))
        .with("Friction/Damping", if damping > 0.0 { "On" } else { "Off" })
        .with(
            "Current Angle",
            format!("{:.1}°", bob.theta().unwrap_or(0.0).to_degrees()),
        )
        .with("Theoretical Period", format!("{period:.2} s"))
        .with("Status", status)
}

fn hookes_context(base: SimContext, system: &System) -> SimContext {
    let Some((stiffness, damping)) = find_law(system, |law| match *law {
        ForceLaw::Spring {
            stiffness, damping, ..
        } => Some((stiffness, damping)),
        _ => None,
    }) else {
        return base;
    };
    let Some(block) = first_body(system) else {
        return base;
    };
    let x = block.position.x;
    let status = if block.velocity.length() > 0.1 {
        "Oscillating"
    } else {
        "Equilibrium"
    };

    let mut context = base
        .with("Spring Constant (k)", format!("{stiffness} N/m"))
        .with("Mass (m)", format!("{} kg", block.mass))
        .with("Damping", format!("{damping:.2}"))
        .with("Displacement (x)", format!("{x:.2} m"))
        .with("Spring Force", format!("{:.1} N", -stiffness * x))
        .with("Status", status);
    if let Ok(oscillator) = DampedOscillator::new(block.mass, stiffness, damping) {
        if let Some(period) = oscillator.period() {
            context = context.with("Natural Period", format!("{period:.2} s"));
        }
        context = context.with_rounded("Damping Ratio", oscillator.damping_ratio(), 3);
    }
    context
}

fn collision_context(base: SimContext, driver: &Driver) -> SimContext {
    let system = driver.system();
    let restitution = system
        .boundaries()
        .iter()
        .find_map(|policy| match *policy {
            BoundaryPolicy::PairwiseCollision { restitution } => Some(restitution),
            _ => None,
        })
        .unwrap_or(1.0);
    let mut context = base.with("Elasticity", format!("{:.0}%", restitution * 100.0));
    for (label, body) in ["Red Ball", "Blue Ball"].into_iter().zip(system.bodies()) {
        context = context
            .with(format!("{label} Mass"), format!("{} kg", body.mass))
            .with(format!("{label} Vel"), format!("{:.2} m/s", body.velocity.x));
    }
    let status = if driver.state() == RunState::Running {
        "Simulating"
    } else {
        "Paused"
    };
    context
        .with("Total Momentum", format!("{:.2} kg·m/s", system.momentum().x))
        .with("Total Kinetic Energy", format!("{:.2} J", system.kinetic_energy()))
        .with("Status", status)
}

fn projectile_context(base: SimContext, driver: &Driver) -> SimContext {
    let system = driver.system();
    let gravity = find_law(system, |law| match *law {
        ForceLaw::ConstantGravity { acceleration } => Some(-acceleration.y),
        _ => None,
    })
    .unwrap_or(STANDARD_GRAVITY);
    let (speed, angle) = driver.launch().map_or((0.0, 0.0), |launch| {
        (
            launch.velocity.length(),
            launch.velocity.y.atan2(launch.velocity.x).to_degrees(),
        )
    });
    let height = driver.launch().and_then(|l| system.body(l.body)).map_or(0.0, |b| b.position.y);
    let status = if driver.shot() == ShotState::Flying {
        "In Flight"
    } else {
        "Stopped"
    };
    let distance = match driver.shot() {
        ShotState::Ready => "N/A".to_owned(),
        ShotState::Flying | ShotState::Landed => first_body(system)
            .map_or_else(|| "N/A".to_owned(), |b| format!("{:.2} m", b.position.x)),
    };

    base.with("Initial Velocity", format!("{speed:.0} m/s"))
        .with("Launch Angle", format!("{angle:.0} degrees"))
        .with("Gravity", format!("{gravity} m/s²"))
        .with("Current Height", format!("{height:.2} m"))
        .with("Current Status", status)
        .with("Last Distance", distance)
}

fn ballistic_context(base: SimContext, driver: &Driver) -> SimContext {
    let (capture, _) = resolve_collision(BULLET_MASS, BULLET_SPEED, BLOCK_MASS, 0.0, 0.0);
    let fired = driver.shot() != ShotState::Ready;
    let collision = if fired {
        format!("{capture:.2} m/s")
    } else {
        "N/A".to_owned()
    };
    let height = first_body(driver.system())
        .and_then(|bob| bob.theta())
        .map_or(0.0, |theta| BALLISTIC_LENGTH * (1.0 - theta.cos()));
    let predicted = if fired {
        capture * capture / (2.0 * STANDARD_GRAVITY)
    } else {
        0.0
    };

    base.with("Bullet Mass", format!("{BULLET_MASS} kg"))
        .with("Block Mass", format!("{BLOCK_MASS} kg"))
        .with("Bullet Velocity", format!("{BULLET_SPEED} m/s"))
        .with("Collision Velocity", collision)
        .with("Current Height", format!("{height:.3} m"))
        .with("Max Height (h)", format!("{predicted:.3} m"))
        .with("Principle 1", "Momentum (Inelastic Collision)")
        .with("Principle 2", "Conservation of Energy")
}

fn orbit_context(base: SimContext, kind: PresetKind, system: &System) -> SimContext {
    let constant = find_law(system, |law| match *law {
        ForceLaw::InverseSquare { constant, .. } => Some(constant),
        _ => None,
    })
    .unwrap_or(ORBIT_CONSTANT);
    let system_type = if kind == PresetKind::BinaryStar {
        "Binary Star"
    } else {
        "Dynamic N-Body"
    };

    base.with("Bodies Count", system.bodies().len())
        .with("Gravitational Constant", constant)
        .with("System Type", system_type)
        .with("Simulation Speed", "1x")
        .with_rounded("Total Energy", system.total_energy(), 2)
}

fn two_body_context(base: SimContext, kind: PresetKind, system: &System) -> SimContext {
    let [a, b] = system.bodies() else {
        return base;
    };
    let coulomb = kind == PresetKind::Coulomb;
    let (constant, scale, label, unit) = if coulomb {
        (COULOMB_CONSTANT, COULOMB_DISPLAY_SCALE, "Charge", "µC")
    } else {
        (GRAVITY_LAB_CONSTANT, GRAVITY_LAB_DISPLAY_SCALE, "Mass", "kg")
    };
    let (s1, s2) = if coulomb {
        (a.charge, b.charge)
    } else {
        (a.mass, b.mass)
    };
    let distance = a.position.distance(b.position);
    let force = constant * (s1 * s2).abs() / (distance * distance);
    let repulsive = coulomb && s1.signum() == s2.signum();

    base.with(format!("{label} 1"), format!("{s1} {unit}"))
        .with(format!("{label} 2"), format!("{s2} {unit}"))
        .with("Distance", format!("{distance:.2} m"))
        .with("Force Magnitude", format!("{:.2} N", force * scale))
        .with("Interaction", if repulsive { "Repulsive" } else { "Attractive" })
}

fn gas_context(base: SimContext, system: &System) -> SimContext {
    let (width, height) = system
        .boundaries()
        .iter()
        .find_map(|policy| match *policy {
            BoundaryPolicy::ReflectAtBounds { min, max, .. } => Some((max.x - min.x, max.y - min.y)),
            _ => None,
        })
        .unwrap_or((GAS_WIDTH, GAS_HEIGHT));
    let bodies = system.bodies();
    #[allow(clippy::cast_precision_loss)]
    let count = bodies.len().max(1) as f64;
    let mean_square = bodies.iter().map(|b| b.velocity.length_squared()).sum::<f64>() / count;
    let temperature = 25.0 * mean_square;
    // Expected wall hits per frame, the widget's pressure reading.
    let pressure: f64 = bodies
        .iter()
        .map(|b| b.velocity.x.abs() / width + b.velocity.y.abs() / height)
        .sum();

    base.with("Temperature", format!("{temperature:.0} K"))
        .with("Volume (Width)", format!("{width} nm"))
        .with("Pressure", format!("{pressure:.1} atm"))
        .with("Number of Particles", bodies.len().to_string())
}

fn ramp_context(base: SimContext, system: &System) -> SimContext {
    let parallel = find_law(system, |law| match *law {
        ForceLaw::ConstantGravity { acceleration } => Some(-acceleration.y),
        _ => None,
    })
    .unwrap_or(0.0);
    let Some((mu, normal)) = find_law(system, |law| match *law {
        ForceLaw::Friction {
            coefficient,
            normal_acceleration,
        } => Some((coefficient, normal_acceleration)),
        _ => None,
    }) else {
        return base;
    };
    let Some(block) = first_body(system) else {
        return base;
    };
    let mass = block.mass;
    let gravity_force = mass * parallel;
    let max_friction = mu * mass * normal;
    let moving = block.velocity.length() > crate::force::STATIC_SPEED_THRESHOLD;
    let net = if moving || gravity_force > max_friction {
        gravity_force - max_friction
    } else {
        0.0
    };
    let angle = parallel.atan2(normal).to_degrees();

    base.with("Angle", format!("{angle:.0}°"))
        .with("Mass", format!("{mass} kg"))
        .with("Friction Coeff", mu)
        .with("Gravity Force (Parallel)", format!("{gravity_force:.1} N"))
        .with("Friction Force", format!("{:.1} N", gravity_force.min(max_friction)))
        .with("Net Force", format!("{net:.1} N"))
        .with("Acceleration", format!("{:.2} m/s²", net / mass))
        .with(
            "Distance Travelled",
            format!("{:.2} m", RAMP_LENGTH - block.position.y),
        )
}

fn charged_spring_context(base: SimContext, system: &System) -> SimContext {
    let Some(stiffness) = find_law(system, |law| match *law {
        ForceLaw::Spring { stiffness, .. } => Some(stiffness),
        _ => None,
    }) else {
        return base;
    };
    let field = find_law(system, |law| match *law {
        ForceLaw::UniformField { field } => Some(-field.y),
        _ => None,
    })
    .unwrap_or(0.0);
    let Some(mass) = first_body(system) else {
        return base;
    };
    let electric = mass.charge * field;
    let equilibrium = (mass.mass * STANDARD_GRAVITY + electric) / stiffness;

    base.with("Mass", format!("{} kg", mass.mass))
        .with("Spring Constant (k)", format!("{stiffness} N/m"))
        .with("Charge (q)", format!("{} C", mass.charge))
        .with("Electric Field (E)", format!("{field} N/C"))
        .with("Electric Force (qE)", format!("{electric:.1} N"))
        .with("New Equilibrium", format!("{equilibrium:.2} m"))
        .with("Displacement", format!("{:.2} m", -mass.position.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_builds() {
        for kind in PresetKind::ALL {
            let preset = kind.build().unwrap();
            assert_eq!(preset.kind, kind);
            assert!(preset.driver().is_ok(), "{kind}");
        }
    }

    #[test]
    fn test_names_round_trip() {
        for kind in PresetKind::ALL {
            assert_eq!(kind.name().parse::<PresetKind>().unwrap(), kind);
        }
        assert_eq!("Hookes_Law".parse::<PresetKind>().unwrap(), PresetKind::HookesLaw);
        assert!(matches!(
            "skate-park".parse::<PresetKind>(),
            Err(Error::UnknownPreset(name)) if name == "skate-park"
        ));
    }

    #[test]
    fn test_contexts_have_parameters() {
        for kind in PresetKind::ALL {
            let mut driver = kind.build().unwrap().driver().unwrap();
            driver.fire();
            driver.run(10);
            let context = kind.context(&driver);
            assert_eq!(context.name, kind.title());
            assert!(!context.parameters.is_empty(), "{kind}");
        }
    }

    #[test]
    fn test_ballistic_capture_velocity() {
        let preset = PresetKind::BallisticPendulum.build().unwrap();
        let launch = preset.launch.unwrap();
        assert!((launch.velocity.x - 0.05 * 200.0 / 1.05).abs() < 1e-12);

        let mut driver = preset.driver().unwrap();
        driver.fire();
        let omega = driver.system().bodies()[0].omega().unwrap();
        assert!((omega - launch.velocity.x / BALLISTIC_LENGTH).abs() < 1e-12);
    }

    #[test]
    fn test_projectile_lands() {
        let mut driver = PresetKind::ProjectileMotion.build().unwrap().driver().unwrap();
        driver.fire();
        let result = driver.run(1_000);
        assert_eq!(result.shot, ShotState::Landed);
        // Range v²·sin(2θ)/g is about 22.96 m; explicit Euler overshoots slightly.
        let range = result.bodies[0].position.x;
        assert!((range - 22.96).abs() < 1.5, "range {range}");
    }

    #[test]
    fn test_friction_ramp_slides_to_bottom() {
        let mut driver = PresetKind::FrictionRamp.build().unwrap().driver().unwrap();
        driver.start();
        driver.run(2_000);
        assert_eq!(driver.system().active_count(), 0);
        let context = PresetKind::FrictionRamp.context(&driver);
        assert_eq!(context.parameters["Angle"], "20°");
    }

    #[test]
    fn test_coulomb_context_reports_attraction() {
        let driver = PresetKind::Coulomb.build().unwrap().driver().unwrap();
        let context = PresetKind::Coulomb.context(&driver);
        assert_eq!(context.parameters["Interaction"], "Attractive");
        // 9000·25/16 scaled by 0.05 is 703.125 N.
        let force = context.parameters["Force Magnitude"].as_str().unwrap();
        assert!(force.starts_with("703.1"), "{force}");
    }

    #[test]
    fn test_gas_particles_stay_in_box() {
        let mut driver = PresetKind::GasProperties.build().unwrap().driver().unwrap();
        driver.start();
        driver.run(500);
        for particle in driver.system().bodies() {
            assert!((0.0..=GAS_WIDTH).contains(&particle.position.x));
            assert!((0.0..=GAS_HEIGHT).contains(&particle.position.y));
        }
        let context = PresetKind::GasProperties.context(&driver);
        assert_eq!(context.parameters["Temperature"], "300 K");
    }
}
