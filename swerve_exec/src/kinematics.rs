//! # Swerve kinematics
//!
//! Converts between the chassis velocity of the robot and the states of its four swerve modules.
//!
//! The chassis frame has X+ forwards, Y+ to the left and rotation counter-clockwise positive when
//! viewed from above. Module offsets are given from the chassis centre of rotation in that frame.
//!
//! Inverse kinematics is exact: each module's velocity is the chassis translation plus the
//! rotational contribution at that module's offset. Forward kinematics is overdetermined (eight
//! equations, three unknowns) so it is solved in the least-squares sense using the pseudo-inverse
//! of the geometry matrix, which is computed once at construction.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Matrix3, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of swerve modules on the robot.
pub const NUM_MODULES: usize = 4;

/// Wheel speed below which a module's direction of travel is considered undefined.
///
/// Units: meters/second
pub const DEGENERATE_SPEED_MS: f64 = 1e-9;

/// Minimum separation between two module offsets.
///
/// Units: meters
const MIN_MODULE_SEPARATION_M: f64 = 1e-6;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Velocity of the chassis in the chassis frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChassisVelocity {
    /// Forward velocity.
    ///
    /// Units: meters/second
    pub vx_ms: f64,

    /// Leftward velocity.
    ///
    /// Units: meters/second
    pub vy_ms: f64,

    /// Counter-clockwise angular velocity.
    ///
    /// Units: radians/second
    pub omega_rads: f64,
}

/// A change in chassis pose expressed in the chassis frame at the start of the change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Twist2 {
    pub dx_m: f64,
    pub dy_m: f64,
    pub dtheta_rad: f64,
}

/// The speed and direction of a single module's wheel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleState {
    /// Signed wheel surface speed.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Direction of the wheel in the chassis frame.
    ///
    /// Units: radians
    pub angle_rad: f64,
}

/// A module state produced by the inverse kinematics.
///
/// When a module's velocity vector is zero its direction is undefined, in which case `angle_rad`
/// is `None` and the module should hold whatever direction it was last commanded to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModuleDemand {
    pub speed_ms: f64,
    pub angle_rad: Option<f64>,
}

/// The accumulated drive distance and current direction of a single module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ModulePosition {
    /// Units: meters
    pub distance_m: f64,

    /// Units: radians
    pub angle_rad: f64,
}

/// Geometry of the four modules, and the conversions it defines.
#[derive(Debug, Clone)]
pub struct ModuleGeometry {
    offsets_m: [Vector2<f64>; NUM_MODULES],

    /// Inverse of `A^T A`, where `A` maps chassis velocity onto stacked module velocities.
    ata_inv: Matrix3<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur while constructing the module geometry.
#[derive(Debug, Error, PartialEq)]
pub enum KinematicsError {
    #[error("Module {0} has a non-finite offset")]
    NonFiniteOffset(usize),

    #[error("Module {0} is located at the chassis centre of rotation")]
    ModuleAtCentre(usize),

    #[error("Modules {0} and {1} are coincident")]
    CoincidentModules(usize, usize),

    #[error("The module geometry does not constrain the chassis motion")]
    SingularGeometry,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ChassisVelocity {
    pub fn new(vx_ms: f64, vy_ms: f64, omega_rads: f64) -> Self {
        Self {
            vx_ms,
            vy_ms,
            omega_rads,
        }
    }

    /// Convert a velocity given in the field frame into the chassis frame of a robot with the
    /// given heading.
    pub fn from_field_relative(vx_ms: f64, vy_ms: f64, omega_rads: f64, heading_rad: f64) -> Self {
        let (sin, cos) = heading_rad.sin_cos();

        Self {
            vx_ms: vx_ms * cos + vy_ms * sin,
            vy_ms: -vx_ms * sin + vy_ms * cos,
            omega_rads,
        }
    }
}

impl ModuleState {
    pub fn new(speed_ms: f64, angle_rad: f64) -> Self {
        Self {
            speed_ms,
            angle_rad,
        }
    }
}

impl ModuleDemand {
    /// Resolve the demand into a concrete state, using `previous_angle_rad` if the direction is
    /// undefined.
    pub fn resolve(&self, previous_angle_rad: f64) -> ModuleState {
        ModuleState {
            speed_ms: self.speed_ms,
            angle_rad: self.angle_rad.unwrap_or(previous_angle_rad),
        }
    }
}

impl From<ModuleState> for ModuleDemand {
    fn from(state: ModuleState) -> Self {
        Self {
            speed_ms: state.speed_ms,
            angle_rad: Some(state.angle_rad),
        }
    }
}

impl ModuleGeometry {
    /// Build the geometry from the module offsets, given as `[x, y]` in meters in FL, FR, RL, RR
    /// order.
    pub fn new(offsets_m: [[f64; 2]; NUM_MODULES]) -> Result<Self, KinematicsError> {
        let mut offsets = [Vector2::zeros(); NUM_MODULES];

        for (i, o) in offsets_m.iter().enumerate() {
            if !o[0].is_finite() || !o[1].is_finite() {
                return Err(KinematicsError::NonFiniteOffset(i));
            }

            offsets[i] = Vector2::new(o[0], o[1]);

            if offsets[i].norm() < MIN_MODULE_SEPARATION_M {
                return Err(KinematicsError::ModuleAtCentre(i));
            }

            for j in 0..i {
                if (offsets[i] - offsets[j]).norm() < MIN_MODULE_SEPARATION_M {
                    return Err(KinematicsError::CoincidentModules(j, i));
                }
            }
        }

        // Each module contributes the rows [1, 0, -y] and [0, 1, x] to A
        let mut ata = Matrix3::zeros();
        for o in offsets.iter() {
            let row_x = Vector3::new(1.0, 0.0, -o.y);
            let row_y = Vector3::new(0.0, 1.0, o.x);
            ata += row_x * row_x.transpose() + row_y * row_y.transpose();
        }

        let ata_inv = ata
            .try_inverse()
            .ok_or(KinematicsError::SingularGeometry)?;

        Ok(Self {
            offsets_m: offsets,
            ata_inv,
        })
    }

    /// Offsets of the modules from the centre of rotation.
    pub fn offsets_m(&self) -> &[Vector2<f64>; NUM_MODULES] {
        &self.offsets_m
    }

    /// Distance of the furthest module from the centre of rotation.
    pub fn max_radius_m(&self) -> f64 {
        self.offsets_m.iter().map(|o| o.norm()).fold(0.0, f64::max)
    }

    /// Inverse kinematics, compute the state of each module which realises the chassis velocity.
    pub fn to_module_states(&self, vel: &ChassisVelocity) -> [ModuleDemand; NUM_MODULES] {
        let mut states = [ModuleDemand {
            speed_ms: 0.0,
            angle_rad: None,
        }; NUM_MODULES];

        for (state, o) in states.iter_mut().zip(self.offsets_m.iter()) {
            let vx = vel.vx_ms - vel.omega_rads * o.y;
            let vy = vel.vy_ms + vel.omega_rads * o.x;

            let speed_ms = vx.hypot(vy);

            *state = if speed_ms < DEGENERATE_SPEED_MS {
                ModuleDemand {
                    speed_ms: 0.0,
                    angle_rad: None,
                }
            } else {
                ModuleDemand {
                    speed_ms,
                    angle_rad: Some(vy.atan2(vx)),
                }
            };
        }

        states
    }

    /// Forward kinematics, compute the chassis velocity which best fits the module states.
    pub fn to_chassis_velocity(&self, states: &[ModuleState; NUM_MODULES]) -> ChassisVelocity {
        let x = self.solve(states.iter().map(|s| (s.speed_ms, s.angle_rad)));

        ChassisVelocity::new(x[0], x[1], x[2])
    }

    /// Forward kinematics on displacements, compute the chassis twist which best fits the change
    /// in distance travelled by each module.
    pub fn to_twist(&self, deltas: &[ModulePosition; NUM_MODULES]) -> Twist2 {
        let x = self.solve(deltas.iter().map(|d| (d.distance_m, d.angle_rad)));

        Twist2 {
            dx_m: x[0],
            dy_m: x[1],
            dtheta_rad: x[2],
        }
    }

    /// Least-squares solution of `A x = b` where `b` holds the module vectors built from the
    /// given `(magnitude, angle)` pairs.
    fn solve<I>(&self, vectors: I) -> Vector3<f64>
    where
        I: Iterator<Item = (f64, f64)>,
    {
        let mut atb = Vector3::zeros();

        for ((mag, angle), o) in vectors.zip(self.offsets_m.iter()) {
            let (sin, cos) = angle.sin_cos();
            let bx = mag * cos;
            let by = mag * sin;

            atb += Vector3::new(bx, by, -o.y * bx + o.x * by);
        }

        self.ata_inv * atb
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Uniformly scale the module speeds so that none exceeds `max_speed_ms`.
///
/// Directions are unchanged, as are the speed ratios between modules. Returns true if the speeds
/// were scaled.
pub fn desaturate(states: &mut [ModuleDemand], max_speed_ms: f64) -> bool {
    let max = states
        .iter()
        .map(|s| s.speed_ms.abs())
        .fold(0.0, f64::max);

    if max > max_speed_ms && max > 0.0 {
        let scale = max_speed_ms / max;
        for s in states.iter_mut() {
            s.speed_ms *= scale;
        }
        true
    } else {
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    const HALF_L: f64 = 0.4064;
    const HALF_W: f64 = 0.3429;

    fn geometry() -> ModuleGeometry {
        ModuleGeometry::new([
            [HALF_L, HALF_W],
            [HALF_L, -HALF_W],
            [-HALF_L, HALF_W],
            [-HALF_L, -HALF_W],
        ])
        .unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_pure_translation() {
        let states = geometry().to_module_states(&ChassisVelocity::new(1.0, 0.0, 0.0));

        for s in states.iter() {
            assert!(approx(s.speed_ms, 1.0));
            assert!(approx(s.angle_rad.unwrap(), 0.0));
        }

        let states = geometry().to_module_states(&ChassisVelocity::new(0.0, -2.0, 0.0));

        for s in states.iter() {
            assert!(approx(s.speed_ms, 2.0));
            assert!(approx(s.angle_rad.unwrap(), -FRAC_PI_2));
        }
    }

    #[test]
    fn test_pure_rotation() {
        let geom = geometry();
        let omega = 1.5;
        let states = geom.to_module_states(&ChassisVelocity::new(0.0, 0.0, omega));

        for (s, o) in states.iter().zip(geom.offsets_m().iter()) {
            // Speed is omega * r, direction is tangential
            assert!(approx(s.speed_ms, omega * o.norm()));

            let tangent = o.y.atan2(o.x) + FRAC_PI_2;
            let diff = util::maths::get_ang_dist(tangent, s.angle_rad.unwrap());
            assert!(approx(diff, 0.0));
        }
    }

    #[test]
    fn test_zero_velocity_is_degenerate() {
        let states = geometry().to_module_states(&ChassisVelocity::default());

        for s in states.iter() {
            assert_eq!(s.speed_ms, 0.0);
            assert_eq!(s.angle_rad, None);
            assert_eq!(s.resolve(0.7).angle_rad, 0.7);
        }
    }

    #[test]
    fn test_single_module_degenerate() {
        // Rotation about the FL module, only that module is stationary
        let geom = geometry();
        let omega = 1.0;
        let vel = ChassisVelocity::new(omega * HALF_W, -omega * HALF_L, omega);

        let states = geom.to_module_states(&vel);

        assert_eq!(states[0].angle_rad, None);
        for s in states[1..].iter() {
            assert!(s.angle_rad.is_some());
            assert!(s.speed_ms > 0.0);
        }
    }

    #[test]
    fn test_forward_inverse_roundtrip() {
        let geom = geometry();
        let vels = [
            ChassisVelocity::new(1.2, -0.4, 0.3),
            ChassisVelocity::new(-0.5, 2.0, -2.5),
            ChassisVelocity::new(0.0, 0.0, PI),
        ];

        for vel in vels.iter() {
            let demands = geom.to_module_states(vel);

            let mut states = [ModuleState::default(); NUM_MODULES];
            for (s, d) in states.iter_mut().zip(demands.iter()) {
                *s = d.resolve(0.0);
            }

            let out = geom.to_chassis_velocity(&states);
            assert!(approx(out.vx_ms, vel.vx_ms), "{:?} != {:?}", out, vel);
            assert!(approx(out.vy_ms, vel.vy_ms), "{:?} != {:?}", out, vel);
            assert!(approx(out.omega_rads, vel.omega_rads), "{:?} != {:?}", out, vel);
        }
    }

    #[test]
    fn test_forward_least_squares() {
        // Three modules forwards at 1 m/s and one inconsistent module, the fit should still be
        // mostly forwards
        let geom = geometry();
        let states = [
            ModuleState::new(1.0, 0.0),
            ModuleState::new(1.0, 0.0),
            ModuleState::new(1.0, 0.0),
            ModuleState::new(0.0, 0.0),
        ];

        let out = geom.to_chassis_velocity(&states);
        assert!(approx(out.vx_ms, 0.75));
        assert!(out.vy_ms.abs() < 1e-9);
    }

    #[test]
    fn test_twist() {
        let geom = geometry();
        let deltas = [ModulePosition {
            distance_m: 0.1,
            angle_rad: FRAC_PI_4,
        }; NUM_MODULES];

        let twist = geom.to_twist(&deltas);
        assert!(approx(twist.dx_m, 0.1 * FRAC_PI_4.cos()));
        assert!(approx(twist.dy_m, 0.1 * FRAC_PI_4.sin()));
        assert!(approx(twist.dtheta_rad, 0.0));
    }

    #[test]
    fn test_field_relative() {
        // Facing +Y in the field, a field +X demand is a rightward (chassis -Y) demand
        let vel = ChassisVelocity::from_field_relative(1.0, 0.0, 0.2, FRAC_PI_2);
        assert!(approx(vel.vx_ms, 0.0));
        assert!(approx(vel.vy_ms, -1.0));
        assert_eq!(vel.omega_rads, 0.2);
    }

    #[test]
    fn test_desaturate() {
        let mut states = [
            ModuleDemand {
                speed_ms: 5.0,
                angle_rad: Some(0.1),
            },
            ModuleDemand {
                speed_ms: -2.5,
                angle_rad: Some(0.2),
            },
            ModuleDemand {
                speed_ms: 1.0,
                angle_rad: None,
            },
            ModuleDemand {
                speed_ms: 0.0,
                angle_rad: Some(0.4),
            },
        ];

        assert!(desaturate(&mut states, 2.5));

        assert!(approx(states[0].speed_ms, 2.5));
        assert!(approx(states[1].speed_ms, -1.25));
        assert!(approx(states[2].speed_ms, 0.5));
        assert_eq!(states[3].speed_ms, 0.0);
        assert_eq!(states[0].angle_rad, Some(0.1));
        assert_eq!(states[2].angle_rad, None);

        // Already within limits, untouched
        let before = states;
        assert!(!desaturate(&mut states, 2.5));
        assert_eq!(states, before);
    }

    #[test]
    fn test_desaturate_scales_uniformly() {
        let angles = [0.3, -1.2, 2.0, -2.9];
        let mut states = [1.0, 2.0, 3.0, 6.0]
            .iter()
            .zip(angles.iter())
            .map(|(&speed_ms, &a)| ModuleDemand {
                speed_ms,
                angle_rad: Some(a),
            })
            .collect::<Vec<_>>();

        assert!(desaturate(&mut states, 4.0));

        let expected = [2.0 / 3.0, 4.0 / 3.0, 2.0, 4.0];
        for ((s, e), a) in states.iter().zip(expected.iter()).zip(angles.iter()) {
            assert!((s.speed_ms - e).abs() < 1e-3);
            assert_eq!(s.angle_rad, Some(*a));
        }
    }

    #[test]
    fn test_invalid_geometry() {
        assert_eq!(
            ModuleGeometry::new([[0.0, 0.0], [0.3, -0.3], [-0.3, 0.3], [-0.3, -0.3]]).unwrap_err(),
            KinematicsError::ModuleAtCentre(0)
        );
        assert_eq!(
            ModuleGeometry::new([[0.3, 0.3], [0.3, -0.3], [0.3, 0.3], [-0.3, -0.3]]).unwrap_err(),
            KinematicsError::CoincidentModules(0, 2)
        );
        assert_eq!(
            ModuleGeometry::new([[f64::NAN, 0.3], [0.3, -0.3], [-0.3, 0.3], [-0.3, -0.3]])
                .unwrap_err(),
            KinematicsError::NonFiniteOffset(0)
        );
    }
}
