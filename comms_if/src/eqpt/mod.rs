//! # Equipment Interface
//!
//! This module defines the interface structures which are exchanged with the equipment.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod imu;
pub mod mech;
