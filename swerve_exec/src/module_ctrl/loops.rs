//! # Actuator closed loops
//!
//! The loops that run on the drive and steer actuators themselves. Module control only ever hands
//! them setpoints, they turn a setpoint and a measurement into a normalised actuator output in
//! `[min_output, max_output]`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::controllers::{PidController, PidGains};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of an actuator closed loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopParams {
    #[serde(flatten)]
    pub gains: PidGains,

    /// Velocity feedforward gain, output per unit of setpoint.
    #[serde(default)]
    pub k_ff: f64,

    #[serde(default = "default_min_output")]
    pub min_output: f64,

    #[serde(default = "default_max_output")]
    pub max_output: f64,
}

/// Velocity loop of a drive actuator, PID on the speed error plus a feedforward on the setpoint.
#[derive(Debug, Clone)]
pub struct DriveVelocityLoop {
    pid: PidController,
    params: LoopParams,
}

/// Position loop of a steer actuator, continuous over one turn of the encoder.
#[derive(Debug, Clone)]
pub struct SteerPositionLoop {
    pid: PidController,
    params: LoopParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveVelocityLoop {
    pub fn new(params: LoopParams) -> Self {
        Self {
            pid: PidController::from_gains(&params.gains),
            params,
        }
    }

    /// Output for the measured and demanded speed, both in meters/second.
    pub fn calculate(&mut self, measured_ms: f64, setpoint_ms: f64, dt_s: f64) -> f64 {
        let out = self.params.k_ff * setpoint_ms + self.pid.calculate(measured_ms, setpoint_ms, dt_s);

        out.clamp(self.params.min_output, self.params.max_output)
    }

    pub fn reset(&mut self) {
        self.pid.reset()
    }
}

impl SteerPositionLoop {
    pub fn new(params: LoopParams) -> Self {
        Self {
            pid: PidController::from_gains(&params.gains).with_continuous_input(0.0, TAU),
            params,
        }
    }

    /// Output for the measured and demanded encoder position, both in [0, 2pi) radians.
    pub fn calculate(&mut self, measured_rad: f64, setpoint_rad: f64, dt_s: f64) -> f64 {
        self.pid
            .calculate(measured_rad, setpoint_rad, dt_s)
            .clamp(self.params.min_output, self.params.max_output)
    }

    pub fn reset(&mut self) {
        self.pid.reset()
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_min_output() -> f64 {
    -1.0
}

fn default_max_output() -> f64 {
    1.0
}
