//! # Module controller state

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::mech::MechDems;
use log::trace;
use serde::Serialize;
use std::f64::consts::{FRAC_PI_2, PI};
use util::maths::{get_ang_dist, wrap_2pi, wrap_pi};

use super::{LowSpeedPolicy, ModuleFeedback, ModuleId};
use crate::kinematics::{ModuleDemand, ModulePosition, ModuleState};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Controller for a single swerve module.
#[derive(Debug, Clone)]
pub struct ModuleCtrl {
    id: ModuleId,

    /// Steer encoder reading when the wheel points along the chassis X+ axis.
    ///
    /// Units: radians
    angular_offset_rad: f64,

    /// Speed below which the module will not turn unless explicitly allowed to.
    ///
    /// Units: meters/second
    min_speed_ms: f64,

    /// Last steer target issued, in the chassis frame.
    last_angle_rad: Option<f64>,
}

/// What a module did with its demand this cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ModuleOutput {
    /// The state sent to the actuators, in the chassis frame, or `None` if no demands were issued.
    pub target: Option<ModuleState>,

    /// The demand was reversed to reduce the steer rotation.
    pub flipped: bool,

    /// The demand was below the minimum speed and the low speed policy was applied.
    pub low_speed: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ModuleCtrl {
    pub fn new(id: ModuleId, angular_offset_rad: f64, min_speed_ms: f64) -> Self {
        Self {
            id,
            angular_offset_rad,
            min_speed_ms,
            last_angle_rad: None,
        }
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Measured state of the module in the chassis frame.
    pub fn state(&self, fb: &ModuleFeedback) -> ModuleState {
        ModuleState {
            speed_ms: fb.drv_speed_ms,
            angle_rad: wrap_pi(fb.str_pos_rad - self.angular_offset_rad),
        }
    }

    /// Measured position of the module in the chassis frame.
    pub fn position(&self, fb: &ModuleFeedback) -> ModulePosition {
        ModulePosition {
            distance_m: fb.drv_pos_m,
            angle_rad: wrap_pi(fb.str_pos_rad - self.angular_offset_rad),
        }
    }

    /// Last steer target issued, in the chassis frame.
    pub fn last_angle_rad(&self) -> Option<f64> {
        self.last_angle_rad
    }

    /// Minimise the steer rotation needed to reach `desired` from `current_angle_rad`.
    ///
    /// If the wheel would have to turn by more than a quarter turn it is cheaper to point it the
    /// opposite way and reverse the drive. The returned angle is in (-pi, pi] and always within
    /// pi/2 of the current angle.
    pub fn optimize(desired: ModuleState, current_angle_rad: f64) -> ModuleState {
        let diff = get_ang_dist(current_angle_rad, desired.angle_rad);

        if diff.abs() > FRAC_PI_2 {
            ModuleState {
                speed_ms: -desired.speed_ms,
                angle_rad: wrap_pi(desired.angle_rad + PI),
            }
        } else {
            ModuleState {
                speed_ms: desired.speed_ms,
                angle_rad: wrap_pi(desired.angle_rad),
            }
        }
    }

    /// Command the module towards the desired state, writing the actuator setpoints into `dems`.
    ///
    /// If the demand has no direction the module keeps its last commanded direction, or its
    /// measured direction if it has never been commanded. Unless `allow_low_speed_turning` is set,
    /// demands slower than the module's minimum speed are handled by `policy` instead of being
    /// executed.
    pub fn set_desired_state(
        &mut self,
        demand: &ModuleDemand,
        fb: &ModuleFeedback,
        allow_low_speed_turning: bool,
        policy: LowSpeedPolicy,
        dems: &mut MechDems,
    ) -> ModuleOutput {
        let current = self.state(fb);

        let desired = demand.resolve(self.last_angle_rad.unwrap_or(current.angle_rad));
        let optimized = Self::optimize(desired, current.angle_rad);

        let flipped = optimized.speed_ms != desired.speed_ms;

        if !allow_low_speed_turning && optimized.speed_ms.abs() < self.min_speed_ms {
            trace!("{:?} below minimum speed, applying {:?}", self.id, policy);

            return match policy {
                LowSpeedPolicy::StopDrive => {
                    dems.speed_ms.insert(self.id.drv_act(), 0.0);

                    ModuleOutput {
                        target: Some(ModuleState {
                            speed_ms: 0.0,
                            angle_rad: self.last_angle_rad.unwrap_or(current.angle_rad),
                        }),
                        flipped: false,
                        low_speed: true,
                    }
                }
                LowSpeedPolicy::SkipUpdate => ModuleOutput {
                    target: None,
                    flipped: false,
                    low_speed: true,
                },
            };
        }

        dems.speed_ms.insert(self.id.drv_act(), optimized.speed_ms);
        dems.pos_rad.insert(
            self.id.str_act(),
            wrap_2pi(optimized.angle_rad + self.angular_offset_rad),
        );

        self.last_angle_rad = Some(optimized.angle_rad);

        ModuleOutput {
            target: Some(optimized),
            flipped,
            low_speed: false,
        }
    }

    /// Remove the output from both actuators.
    pub fn stop(&self, dems: &mut MechDems) {
        dems.neutral.insert(self.id.drv_act());
        dems.neutral.insert(self.id.str_act());
    }

    /// Returns true if either actuator is above its temperature limit.
    pub fn is_too_hot(&self, fb: &ModuleFeedback, max_drv_temp_c: f64, max_str_temp_c: f64) -> bool {
        fb.drv_temp_c > max_drv_temp_c || fb.str_temp_c > max_str_temp_c
    }
}
