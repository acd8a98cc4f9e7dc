//! # Communications interface crate.
//!
//! Provides the interface types shared between the drive software, the telecommand sources which
//! command it and the equipment it commands.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod tc;

/// Demand and sensor definitions for equipment (mechanisms and the heading sensor)
pub mod eqpt;
