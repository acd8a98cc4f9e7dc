//! # Controllers module
//!
//! Feedback controllers shared by trajectory control and the actuator closed loops.
//!
//! All controllers take the cycle period explicitly rather than measuring wall-clock time, so that
//! they behave identically in the fixed-period control loop, in simulation and in tests.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use util::maths::input_modulus;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gains of a PID controller, as loaded from parameter files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    #[serde(default)]
    pub k_i: f64,

    /// Derivative gain
    #[serde(default)]
    pub k_d: f64,
}

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Derivative gain
    k_d: f64,

    /// If set the input is continuous over the given `(min, max)` range and errors are taken the
    /// short way round it.
    continuous_range: Option<(f64, f64)>,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

/// Velocity and acceleration limits of a trapezoid profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub max_velocity: f64,
    pub max_acceleration: f64,
}

/// A point on a motion profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProfileState {
    pub position: f64,
    pub velocity: f64,
}

/// A trapezoid motion profile.
///
/// The profile is stateless, each call computes where a system starting at `current` should be
/// after `t` seconds on its way to `goal`. Called once per cycle with the previous output as
/// `current` it steps the setpoint along the profile.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrapezoidProfile {
    constraints: Constraints,
}

/// A PID controller whose setpoint follows a trapezoid profile towards the goal.
#[derive(Debug, Clone, Serialize)]
pub struct ProfiledPidController {
    pid: PidController,
    profile: TrapezoidProfile,
    setpoint: ProfileState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given gains.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            continuous_range: None,
            prev_error: None,
            integral: 0f64,
        }
    }

    /// Create a new controller from a set of gains.
    pub fn from_gains(gains: &PidGains) -> Self {
        Self::new(gains.k_p, gains.k_i, gains.k_d)
    }

    /// Treat the input as continuous over `[min, max)`, so the error between a measurement near
    /// `max` and a setpoint near `min` is small.
    pub fn with_continuous_input(mut self, min: f64, max: f64) -> Self {
        self.continuous_range = Some((min, max));
        self
    }

    /// The error from `measurement` to `setpoint`, wrapped if the input is continuous.
    pub fn error_between(&self, measurement: f64, setpoint: f64) -> f64 {
        match self.continuous_range {
            Some((min, max)) => {
                let error_bound = (max - min) / 2.0;
                input_modulus(setpoint - measurement, -error_bound, error_bound)
            }
            None => setpoint - measurement,
        }
    }

    /// Get the controller output for a measurement and setpoint.
    pub fn calculate(&mut self, measurement: f64, setpoint: f64, dt_s: f64) -> f64 {
        let error = self.error_between(measurement, setpoint);
        self.get(error, dt_s)
    }

    /// Get the value of the controller for the given error.
    ///
    /// `dt_s` is the time since the previous call. On the first call, or with a non-positive
    /// `dt_s`, neither the integral nor the derivative term contribute.
    pub fn get(&mut self, error: f64, dt_s: f64) -> f64 {
        let valid_dt = dt_s > 0.0;

        // Accumulate the integral term.
        if valid_dt {
            self.integral += error * dt_s;
        }

        // Calculate the derivative.
        let deriv = match self.prev_error {
            Some(e) if valid_dt => (error - e) / dt_s,
            _ => 0f64,
        };

        // Remember the previous error
        self.prev_error = Some(error);

        self.k_p * error + self.k_i * self.integral + self.k_d * deriv
    }

    /// Clear the integral and derivative history.
    pub fn reset(&mut self) {
        self.prev_error = None;
        self.integral = 0f64;
    }

    /// The most recent error passed to the controller.
    pub fn prev_error(&self) -> Option<f64> {
        self.prev_error
    }
}

impl Constraints {
    pub fn new(max_velocity: f64, max_acceleration: f64) -> Self {
        Self {
            max_velocity,
            max_acceleration,
        }
    }
}

impl ProfileState {
    pub fn new(position: f64, velocity: f64) -> Self {
        Self { position, velocity }
    }

    fn direct(&self, direction: f64) -> Self {
        Self {
            position: self.position * direction,
            velocity: self.velocity * direction,
        }
    }
}

impl TrapezoidProfile {
    pub fn new(constraints: Constraints) -> Self {
        Self { constraints }
    }

    /// Compute the state `t_s` seconds along the profile from `current` to `goal`.
    pub fn calculate(&self, t_s: f64, goal: ProfileState, current: ProfileState) -> ProfileState {
        let max_vel = self.constraints.max_velocity;
        let max_acc = self.constraints.max_acceleration;

        // Solve the profile for a positive move and flip the result back afterwards
        let direction = if current.position > goal.position {
            -1.0
        } else {
            1.0
        };
        let mut initial = current.direct(direction);
        let goal = goal.direct(direction);

        if initial.velocity > max_vel {
            initial.velocity = max_vel;
        }

        // Extend the profile as if it started and finished at rest, then cut the ends off
        let cutoff_begin = initial.velocity / max_acc;
        let cutoff_dist_begin = cutoff_begin * cutoff_begin * max_acc / 2.0;

        let cutoff_end = goal.velocity / max_acc;
        let cutoff_dist_end = cutoff_end * cutoff_end * max_acc / 2.0;

        let full_trapezoid_dist =
            cutoff_dist_begin + (goal.position - initial.position) + cutoff_dist_end;
        let mut accel_time = max_vel / max_acc;

        let mut full_speed_dist = full_trapezoid_dist - accel_time * accel_time * max_acc;

        // Triangular profile, max velocity is never reached
        if full_speed_dist < 0.0 {
            accel_time = (full_trapezoid_dist / max_acc).sqrt();
            full_speed_dist = 0.0;
        }

        let end_accel = accel_time - cutoff_begin;
        let end_full_speed = end_accel + full_speed_dist / max_vel;
        let end_decel = end_full_speed + accel_time - cutoff_end;

        let mut result = initial;

        if t_s < end_accel {
            result.velocity += t_s * max_acc;
            result.position += (initial.velocity + t_s * max_acc / 2.0) * t_s;
        } else if t_s < end_full_speed {
            result.velocity = max_vel;
            result.position += (initial.velocity + end_accel * max_acc / 2.0) * end_accel
                + max_vel * (t_s - end_accel);
        } else if t_s <= end_decel {
            let time_left = end_decel - t_s;
            result.velocity = goal.velocity + time_left * max_acc;
            result.position = goal.position - (goal.velocity + time_left * max_acc / 2.0) * time_left;
        } else {
            result = goal;
        }

        result.direct(direction)
    }
}

impl ProfiledPidController {
    pub fn new(gains: &PidGains, constraints: Constraints) -> Self {
        Self {
            pid: PidController::from_gains(gains),
            profile: TrapezoidProfile::new(constraints),
            setpoint: ProfileState::default(),
        }
    }

    /// Treat the input as continuous over `[min, max)`.
    pub fn with_continuous_input(mut self, min: f64, max: f64) -> Self {
        self.pid = self.pid.with_continuous_input(min, max);
        self
    }

    /// Restart the profile from the given measurement, at rest.
    pub fn reset(&mut self, measurement: f64) {
        self.pid.reset();
        self.setpoint = ProfileState::new(measurement, 0.0);
    }

    /// Step the profiled setpoint towards `goal` and get the controller output for `measurement`.
    pub fn calculate(&mut self, measurement: f64, goal: f64, dt_s: f64) -> f64 {
        let mut goal = ProfileState::new(goal, 0.0);

        // Move both the goal and the setpoint onto the same turn as the measurement so the
        // profile takes the short way round
        if let Some((min, max)) = self.pid.continuous_range {
            let error_bound = (max - min) / 2.0;
            let goal_min_dist = input_modulus(goal.position - measurement, -error_bound, error_bound);
            let setpoint_min_dist =
                input_modulus(self.setpoint.position - measurement, -error_bound, error_bound);

            goal.position = goal_min_dist + measurement;
            self.setpoint.position = setpoint_min_dist + measurement;
        }

        self.setpoint = self.profile.calculate(dt_s, goal, self.setpoint);

        self.pid.calculate(measurement, self.setpoint.position, dt_s)
    }

    /// The current profiled setpoint.
    pub fn setpoint(&self) -> ProfileState {
        self.setpoint
    }
}
