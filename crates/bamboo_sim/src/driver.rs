//! Fixed-timestep lifecycle around a [`System`].
//!
//! The driver is pulled, not pushed: each [`Driver::tick`] advances exactly
//! one `dt` of simulated time while running. The caller's frame loop owns
//! the cadence, so simulated time is independent of frame rate.
//!
//! ```text
//! Idle ──start──▶ Running ◀──start── Paused
//!   ▲               │  └────pause────▶  │
//!   └─────reset─────┴──────reset────────┘
//!
//! Ready ──fire──▶ Flying ──(launched body lands)──▶ Landed
//!   ▲                                                 │
//!   └──────────────────────reset──────────────────────┘
//! ```

use crate::body::{Body, BodyId, Motion};
use crate::boundary::StepEvent;
use crate::error::{ConfigurationError, Result};
use crate::system::{StepWarning, System};
use crate::vector::Vector2;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// Lifecycle of the simulation loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Paused,
}

/// One-shot launch sub-state used by the projectile and ballistic demos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotState {
    #[default]
    Ready,
    Flying,
    Landed,
}

/// Velocity given to a body when the driver fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Launch {
    pub body: BodyId,
    pub velocity: Vector2,
}

impl Launch {
    /// Launch at `speed` along `angle` radians above the +x axis.
    pub fn at_angle(body: BodyId, speed: f64, angle: f64) -> Self {
        Self {
            body,
            velocity: Vector2::from_angle(angle) * speed,
        }
    }
}

/// Simulated time. Monotonic until reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationClock {
    time: f64,
    dt: f64,
    steps: u64,
}

impl SimulationClock {
    fn new(dt: f64) -> Result<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ConfigurationError::InvalidTimeStep(dt).into());
        }
        Ok(Self {
            time: 0.0,
            dt,
            steps: 0,
        })
    }

    pub const fn time(&self) -> f64 {
        self.time
    }

    pub const fn dt(&self) -> f64 {
        self.dt
    }

    pub const fn steps(&self) -> u64 {
        self.steps
    }

    fn advance(&mut self) {
        self.steps += 1;
        // Multiply rather than accumulate so long runs do not drift.
        #[allow(clippy::cast_precision_loss)]
        let steps = self.steps as f64;
        self.time = steps * self.dt;
    }

    fn reset(&mut self) {
        self.time = 0.0;
        self.steps = 0;
    }
}

/// State reported after every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Simulated time after the tick.
    pub time: f64,
    /// Number of steps taken since the last reset.
    pub step: u64,
    pub state: RunState,
    pub shot: ShotState,
    /// Whether this tick advanced the clock.
    pub advanced: bool,
    pub bodies: Vec<Body>,
    pub events: Vec<StepEvent>,
    pub warnings: Vec<StepWarning>,
}

impl StepResult {
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }
}

/// Receives every advancing [`StepResult`].
///
/// Implemented for any `FnMut(&StepResult) + Send` closure.
pub trait StepObserver: Send {
    fn on_step(&mut self, result: &StepResult);
}

impl<F> StepObserver for F
where
    F: FnMut(&StepResult) + Send,
{
    fn on_step(&mut self, result: &StepResult) {
        self(result);
    }
}

/// Owns one [`System`], its initial snapshot and the simulation clock.
///
/// # Example
///
/// ```rust
/// use bamboo_sim::{Body, BodyId, Driver, ForceLaw, RunState, System, Vector2};
///
/// let system = System::builder()
///     .body(Body::new(BodyId(1), Vector2::new(0.0, 100.0), 1.0))
///     .force(ForceLaw::gravity(-9.8))
///     .build()
///     .unwrap();
/// let mut driver = Driver::new(system, 0.016).unwrap();
///
/// // Nothing moves until the driver is started.
/// assert!(!driver.tick().advanced);
///
/// driver.start();
/// let result = driver.tick();
/// assert_eq!(result.state, RunState::Running);
/// assert_eq!(result.step, 1);
/// ```
pub struct Driver {
    system: System,
    initial: System,
    clock: SimulationClock,
    state: RunState,
    shot: ShotState,
    launch: Option<Launch>,
    observers: Vec<Box<dyn StepObserver>>,
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("system", &self.system)
            .field("clock", &self.clock)
            .field("state", &self.state)
            .field("shot", &self.shot)
            .field("launch", &self.launch)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Driver {
    /// Wraps `system`, stepping `dt` seconds per tick.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidTimeStep`] if `dt` is not a
    /// finite positive number.
    pub fn new(system: System, dt: f64) -> Result<Self> {
        let clock = SimulationClock::new(dt)?;
        Ok(Self {
            initial: system.clone(),
            system,
            clock,
            state: RunState::Idle,
            shot: ShotState::Ready,
            launch: None,
            observers: Vec::new(),
        })
    }

    /// Configures the velocity applied by [`Driver::fire`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownBody`] if the launched body is not
    /// part of the system.
    pub fn with_launch(mut self, launch: Launch) -> Result<Self> {
        if self.system.body(launch.body).is_none() {
            return Err(ConfigurationError::UnknownBody(launch.body).into());
        }
        if !launch.velocity.is_finite() {
            return Err(ConfigurationError::InvalidParameter {
                name: "launch velocity",
                value: launch.velocity.length(),
            }
            .into());
        }
        self.launch = Some(launch);
        Ok(self)
    }

    /// Registers an observer notified after every advancing tick.
    pub fn observe(&mut self, observer: impl StepObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub const fn state(&self) -> RunState {
        self.state
    }

    pub const fn shot(&self) -> ShotState {
        self.shot
    }

    pub const fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub const fn time(&self) -> f64 {
        self.clock.time
    }

    pub const fn dt(&self) -> f64 {
        self.clock.dt
    }

    pub const fn launch(&self) -> Option<Launch> {
        self.launch
    }

    pub const fn system(&self) -> &System {
        &self.system
    }

    /// Mutable access for between-tick edits such as dragging a body.
    ///
    /// Callers must not mutate bodies while the driver is running.
    pub fn system_mut(&mut self) -> &mut System {
        &mut self.system
    }

    /// Idle or Paused → Running. No-op when already running.
    pub fn start(&mut self) {
        if self.state == RunState::Running {
            debug!("start ignored: already running");
            return;
        }
        debug!(from = ?self.state, "driver running");
        self.state = RunState::Running;
    }

    /// Running → Paused. No-op otherwise.
    pub fn pause(&mut self) {
        if self.state != RunState::Running {
            debug!(state = ?self.state, "pause ignored: not running");
            return;
        }
        debug!("driver paused");
        self.state = RunState::Paused;
    }

    /// Any state → Idle, with the clock at zero and every body restored.
    pub fn reset(&mut self) {
        self.system = self.initial.clone();
        self.clock.reset();
        self.state = RunState::Idle;
        self.shot = ShotState::Ready;
        debug!("driver reset");
    }

    /// Launches the configured body and starts running.
    ///
    /// Only valid from [`ShotState::Ready`]; once fired, the driver must be
    /// reset before firing again. Redundant calls are ignored.
    pub fn fire(&mut self) {
        if self.shot != ShotState::Ready {
            debug!(shot = ?self.shot, "fire ignored: already fired");
            return;
        }
        if let Some(launch) = self.launch {
            if let Some(body) = self.system.body_mut(launch.body) {
                apply_launch(body, launch.velocity);
            }
        }
        self.shot = ShotState::Flying;
        self.state = RunState::Running;
        debug!(launch = ?self.launch, "driver fired");
    }

    /// Advances one `dt` if running and any body can still move.
    pub fn tick(&mut self) -> StepResult {
        if self.state != RunState::Running || self.system.active_count() == 0 {
            return self.result(false, Vec::new(), Vec::new());
        }

        let report = self.system.step(self.clock.time, self.clock.dt);
        self.clock.advance();

        if self.shot == ShotState::Flying && self.launch_finished() {
            debug!(time = self.clock.time, "shot landed");
            self.shot = ShotState::Landed;
        }

        let result = self.result(true, report.events, report.warnings);
        trace!(time = result.time, step = result.step, "tick");
        for observer in &mut self.observers {
            observer.on_step(&result);
        }
        result
    }

    /// Ticks `n` times and returns the last result.
    pub fn run(&mut self, n: usize) -> StepResult {
        let mut last = self.snapshot();
        for _ in 0..n {
            last = self.tick();
        }
        last
    }

    /// Current state without advancing.
    pub fn snapshot(&self) -> StepResult {
        self.result(false, Vec::new(), Vec::new())
    }

    fn launch_finished(&self) -> bool {
        match self.launch {
            Some(launch) => self
                .system
                .body(launch.body)
                .is_none_or(|b| b.status.is_terminal()),
            None => self.system.active_count() == 0,
        }
    }

    fn result(&self, advanced: bool, events: Vec<StepEvent>, warnings: Vec<StepWarning>) -> StepResult {
        StepResult {
            time: self.clock.time,
            step: self.clock.steps,
            state: self.state,
            shot: self.shot,
            advanced,
            bodies: self.system.bodies().to_vec(),
            events,
            warnings,
        }
    }
}

/// Cartesian bodies take the velocity directly; pendulum bobs take its
/// component along the swing direction.
fn apply_launch(body: &mut Body, velocity: Vector2) {
    match body.motion {
        Motion::Cartesian => body.velocity = velocity,
        Motion::Angular {
            pivot,
            length,
            theta,
            ..
        } => {
            let tangent = Vector2::new(theta.cos(), theta.sin());
            body.motion = Motion::Angular {
                pivot,
                length,
                theta,
                omega: velocity.dot(tangent) / length,
            };
            body.sync_angular();
        }
    }
}
