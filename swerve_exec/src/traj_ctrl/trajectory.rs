//! # Trajectories
//!
//! A trajectory is a time-parameterised sequence of samples, each giving the pose the robot should
//! be at, and how fast it should be moving along the path, at that time. Trajectories are
//! generated offline and loaded from JSON files of the form:
//!
//! ```json
//! {
//!     "samples": [
//!         {
//!             "time_s": 0.0,
//!             "pose": {"x_m": 0.0, "y_m": 0.0, "heading_rad": 0.0},
//!             "velocity_ms": 0.0,
//!             "acceleration_mss": 1.0,
//!             "curvature_radm": 0.0
//!         }
//!     ]
//! }
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

// Internal
use crate::loc::Pose2;
use util::maths::get_ang_dist;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Sample time separation below which two samples are considered simultaneous.
///
/// Units: seconds
const TIME_EPSILON_S: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single point on a trajectory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    /// Time since the start of the trajectory.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Pose in the field frame. The heading is the direction of travel along the path.
    pub pose: Pose2,

    /// Speed along the path.
    ///
    /// Units: meters/second
    pub velocity_ms: f64,

    /// Units: meters/second^2
    pub acceleration_mss: f64,

    /// Units: radians/meter
    pub curvature_radm: f64,
}

/// A validated trajectory, with at least one sample and non-decreasing sample times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    samples: Vec<TrajectorySample>,
}

/// On-disk layout of a trajectory, before validation.
#[derive(Debug, Clone, Deserialize)]
struct TrajectoryFile {
    samples: Vec<TrajectorySample>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error("The trajectory contains no samples")]
    Empty,

    #[error("Sample {0} is earlier than the sample before it")]
    NonMonotonicTime(usize),

    #[error("Sample {0} contains a non-finite value")]
    NonFinite(usize),

    #[error("Cannot load the trajectory file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot parse the trajectory file: {0}")]
    ParseError(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajectorySample {
    fn is_finite(&self) -> bool {
        self.time_s.is_finite()
            && self.pose.x_m.is_finite()
            && self.pose.y_m.is_finite()
            && self.pose.heading_rad.is_finite()
            && self.velocity_ms.is_finite()
            && self.acceleration_mss.is_finite()
            && self.curvature_radm.is_finite()
    }

    /// Interpolate between this sample and `end` at fraction `i` of the time between them.
    ///
    /// Kinematic quantities are propagated with constant acceleration from this sample, and the
    /// pose is placed at the fraction of the straight line distance to `end` that distance
    /// represents.
    fn interpolate(&self, end: &TrajectorySample, i: f64) -> TrajectorySample {
        let new_t = lerp(self.time_s, end.time_s, i);
        let dt = new_t - self.time_s;

        // Run backwards from the end sample if needed
        if dt < 0.0 {
            return end.interpolate(self, 1.0 - i);
        }

        let reversing = self.velocity_ms < 0.0
            || (self.velocity_ms.abs() < 1e-9 && self.acceleration_mss < 0.0);

        let new_v = self.velocity_ms + self.acceleration_mss * dt;
        let mut new_s = self.velocity_ms * dt + 0.5 * self.acceleration_mss * dt * dt;
        if reversing {
            new_s = -new_s;
        }

        let total_dist = self.pose.distance_to(&end.pose);
        let frac = if total_dist > 1e-9 {
            (new_s / total_dist).clamp(0.0, 1.0)
        } else {
            i
        };

        TrajectorySample {
            time_s: new_t,
            pose: Pose2 {
                x_m: lerp(self.pose.x_m, end.pose.x_m, frac),
                y_m: lerp(self.pose.y_m, end.pose.y_m, frac),
                heading_rad: util::maths::wrap_pi(
                    self.pose.heading_rad
                        + get_ang_dist(self.pose.heading_rad, end.pose.heading_rad) * frac,
                ),
            },
            velocity_ms: new_v,
            acceleration_mss: self.acceleration_mss,
            curvature_radm: lerp(self.curvature_radm, end.curvature_radm, i),
        }
    }
}

impl Trajectory {
    /// Build a trajectory from samples, checking they are valid.
    pub fn new(samples: Vec<TrajectorySample>) -> Result<Self, TrajectoryError> {
        if samples.is_empty() {
            return Err(TrajectoryError::Empty);
        }

        for (i, s) in samples.iter().enumerate() {
            if !s.is_finite() {
                return Err(TrajectoryError::NonFinite(i));
            }
            if i > 0 && s.time_s < samples[i - 1].time_s {
                return Err(TrajectoryError::NonMonotonicTime(i));
            }
        }

        Ok(Self { samples })
    }

    /// Load a trajectory from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TrajectoryError> {
        let s = std::fs::read_to_string(path).map_err(TrajectoryError::FileLoadError)?;

        Self::from_json(&s)
    }

    /// Parse a trajectory from JSON.
    pub fn from_json(json: &str) -> Result<Self, TrajectoryError> {
        let file: TrajectoryFile = serde_json::from_str(json).map_err(TrajectoryError::ParseError)?;

        Self::new(file.samples)
    }

    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    /// Time from the first to the last sample.
    ///
    /// Units: seconds
    pub fn total_time_s(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.time_s - first.time_s,
            _ => 0.0,
        }
    }

    /// The last sample, which holds the final pose.
    pub fn final_sample(&self) -> TrajectorySample {
        self.samples.last().copied().unwrap_or_default()
    }

    /// Sample the trajectory `t_s` seconds after its start.
    ///
    /// Times before the start give the first sample. Times at or after the end give the final
    /// pose with zero velocity, acceleration and curvature, so a tracker sampling past the end
    /// holds position rather than continuing to drive.
    pub fn sample(&self, t_s: f64) -> TrajectorySample {
        let first = match self.samples.first() {
            Some(f) => *f,
            None => return TrajectorySample::default(),
        };
        let t = first.time_s + t_s;

        if t <= first.time_s {
            return first;
        }

        let last = self.final_sample();
        if t >= last.time_s {
            return TrajectorySample {
                time_s: t,
                velocity_ms: 0.0,
                acceleration_mss: 0.0,
                curvature_radm: 0.0,
                ..last
            };
        }

        // First sample at or after t, guaranteed to be in 1..len by the checks above
        let high_idx = self.samples.partition_point(|s| s.time_s < t);
        let high = &self.samples[high_idx];
        let low = &self.samples[high_idx - 1];

        if (high.time_s - low.time_s).abs() < TIME_EPSILON_S {
            return *high;
        }

        low.interpolate(high, (t - low.time_s) / (high.time_s - low.time_s))
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
