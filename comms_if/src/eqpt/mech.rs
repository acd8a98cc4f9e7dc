//! # Mechanisms Equipment Demands and Sensor Data

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Drive actuators of the four modules, in FL, FR, RL, RR order.
pub const DRV_IDS: [ActId; 4] = [ActId::DrvFL, ActId::DrvFR, ActId::DrvRL, ActId::DrvRR];

/// Steer actuators of the four modules, in FL, FR, RL, RR order.
pub const STR_IDS: [ActId; 4] = [ActId::StrFL, ActId::StrFR, ActId::StrRL, ActId::StrRR];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands that are sent from drive control to the mechanisms.
///
/// An actuator with no entry in any of the maps receives no new demand this cycle and keeps
/// executing its previous setpoint.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MechDems {
    /// Demanded absolute position of a steer actuator in radians, in the range [0, 2pi).
    pub pos_rad: HashMap<ActId, f64>,

    /// Demanded wheel surface speed of a drive actuator in meters/second.
    pub speed_ms: HashMap<ActId, f64>,

    /// Actuators whose output shall be removed entirely.
    ///
    /// A stopped actuator does not run its closed loop until it receives a new setpoint.
    pub neutral: HashSet<ActId>,
}

/// Sensor data returned by the mechanisms.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MechSensData {
    /// Cumulative displacement of each drive actuator in meters.
    pub drv_pos_m: HashMap<ActId, f64>,

    /// Measured wheel surface speed of each drive actuator in meters/second.
    pub drv_speed_ms: HashMap<ActId, f64>,

    /// Measured absolute position of each steer actuator in radians, in the range [0, 2pi).
    pub str_pos_rad: HashMap<ActId, f64>,

    /// Temperature of every actuator in degrees Celsius.
    pub temp_c: HashMap<ActId, f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all actuators available to the robot.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum ActId {
    DrvFL,
    DrvFR,
    DrvRL,
    DrvRR,
    StrFL,
    StrFR,
    StrRL,
    StrRR,

    /// Auxiliary actuators, which may be ganged to one of the module actuators as a follower.
    Aux0,
    Aux1,
    Aux2,
    Aux3,
}

/// The role an actuator plays in a ganged group.
///
/// A leader executes its own demands. A follower never receives demands of its own, it mirrors
/// whatever setpoint its leader is currently executing.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActRole {
    Leader,

    Follower {
        /// The actuator this one mirrors
        leader: ActId,

        /// If true the mirrored setpoint is negated
        #[serde(default)]
        inverted: bool,
    },
}

/// Response from the mechanisms based on the demands sent to them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MechDemsResponse {
    /// Demands were valid and will be executed
    DemsOk,

    /// Demands were invalid and have been rejected
    DemsInvalid,

    /// Equipment is invalid so demands cannot be actuated
    EqptInvalid,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl MechDems {
    /// Returns true if the demands contain nothing for any actuator.
    pub fn is_empty(&self) -> bool {
        self.pos_rad.is_empty() && self.speed_ms.is_empty() && self.neutral.is_empty()
    }
}

impl ActId {
    /// Returns true if the actuator is one of the drive actuators.
    pub fn is_drive(&self) -> bool {
        DRV_IDS.contains(self)
    }

    /// Returns true if the actuator is one of the steer actuators.
    pub fn is_steer(&self) -> bool {
        STR_IDS.contains(self)
    }
}

impl Default for ActRole {
    fn default() -> Self {
        ActRole::Leader
    }
}
