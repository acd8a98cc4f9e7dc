//! # Module control
//!
//! Each swerve module pairs a steer actuator, which points the wheel, with a drive actuator, which
//! spins it. Module control turns a desired wheel state into setpoints for the closed loops running
//! on those two actuators, taking the shortest way round to the new direction.
//!
//! Modules are identified by their corner of the chassis, and are always stored in FL, FR, RL, RR
//! order.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod loops;
mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::mech::{ActId, MechSensData, DRV_IDS, STR_IDS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kinematics::NUM_MODULES;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use loops::{DriveVelocityLoop, LoopParams, SteerPositionLoop};
pub use state::{ModuleCtrl, ModuleOutput};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Snapshot of the sensor data for a single module, sampled once per cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ModuleFeedback {
    /// Cumulative drive displacement.
    ///
    /// Units: meters
    pub drv_pos_m: f64,

    /// Units: meters/second
    pub drv_speed_ms: f64,

    /// Absolute steer encoder position, including the module's angular offset.
    ///
    /// Units: radians
    pub str_pos_rad: f64,

    /// Units: degrees Celsius
    pub drv_temp_c: f64,

    /// Units: degrees Celsius
    pub str_temp_c: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Corner of the chassis a module is mounted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleId {
    FL,
    FR,
    RL,
    RR,
}

/// What a module does when asked to drive slower than its minimum speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LowSpeedPolicy {
    /// Command zero drive speed and hold the steer actuator at its last target.
    StopDrive,

    /// Issue no demands at all, both actuators keep their previous setpoints.
    SkipUpdate,
}

#[derive(Debug, Error, PartialEq)]
pub enum ModuleCtrlError {
    #[error("No sensor data for {0:?}")]
    MissingFeedback(ActId),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ModuleId {
    /// All modules in storage order.
    pub const ALL: [ModuleId; NUM_MODULES] = [ModuleId::FL, ModuleId::FR, ModuleId::RL, ModuleId::RR];

    /// Index of this module in per-module arrays.
    pub fn index(self) -> usize {
        match self {
            ModuleId::FL => 0,
            ModuleId::FR => 1,
            ModuleId::RL => 2,
            ModuleId::RR => 3,
        }
    }

    /// The module's drive actuator.
    pub fn drv_act(self) -> ActId {
        DRV_IDS[self.index()]
    }

    /// The module's steer actuator.
    pub fn str_act(self) -> ActId {
        STR_IDS[self.index()]
    }
}

impl Default for LowSpeedPolicy {
    fn default() -> Self {
        LowSpeedPolicy::StopDrive
    }
}

impl ModuleFeedback {
    /// Extract the feedback for one module from the mechanisms sensor data.
    pub fn from_sens(id: ModuleId, sens: &MechSensData) -> Result<Self, ModuleCtrlError> {
        let drv = id.drv_act();
        let steer = id.str_act();

        let get = |map: &std::collections::HashMap<ActId, f64>, act: ActId| {
            map.get(&act)
                .copied()
                .ok_or(ModuleCtrlError::MissingFeedback(act))
        };

        Ok(Self {
            drv_pos_m: get(&sens.drv_pos_m, drv)?,
            drv_speed_ms: get(&sens.drv_speed_ms, drv)?,
            str_pos_rad: get(&sens.str_pos_rad, steer)?,
            drv_temp_c: get(&sens.temp_c, drv)?,
            str_temp_c: get(&sens.temp_c, steer)?,
        })
    }

    /// Extract the feedback for all modules.
    pub fn all_from_sens(sens: &MechSensData) -> Result<[Self; NUM_MODULES], ModuleCtrlError> {
        let mut fb = [Self::default(); NUM_MODULES];

        for id in ModuleId::ALL.iter() {
            fb[id.index()] = Self::from_sens(*id, sens)?;
        }

        Ok(fb)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_feedback_from_sens() {
        let mut sens = MechSensData::default();

        for id in ModuleId::ALL.iter() {
            let i = id.index() as f64;
            sens.drv_pos_m.insert(id.drv_act(), i);
            sens.drv_speed_ms.insert(id.drv_act(), 0.1 * i);
            sens.str_pos_rad.insert(id.str_act(), 0.5 * i);
            sens.temp_c.insert(id.drv_act(), 30.0);
            sens.temp_c.insert(id.str_act(), 25.0);
        }

        let fb = ModuleFeedback::all_from_sens(&sens).unwrap();
        assert_eq!(fb[3].drv_pos_m, 3.0);
        assert_eq!(fb[2].str_pos_rad, 1.0);
        assert_eq!(fb[1].str_temp_c, 25.0);

        sens.str_pos_rad.remove(&ActId::StrRL);
        assert_eq!(
            ModuleFeedback::all_from_sens(&sens).unwrap_err(),
            ModuleCtrlError::MissingFeedback(ActId::StrRL)
        );
    }
}
