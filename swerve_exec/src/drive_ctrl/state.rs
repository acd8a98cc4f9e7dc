//! Implementations for the DriveCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};
use serde::Serialize;

// Internal
use super::{DriveCtrlError, DriveDemand, Params};
use crate::{
    kinematics::{
        desaturate, ChassisVelocity, ModuleDemand, ModuleGeometry, ModulePosition, ModuleState,
        NUM_MODULES,
    },
    loc::{self, LocError, LocMgr, Pose2, PoseSourceKind},
    module_ctrl::{ModuleCtrl, ModuleFeedback, ModuleId, ModuleOutput},
};
use comms_if::eqpt::{
    imu::ImuData,
    mech::{MechDems, MechSensData},
};
use util::{
    archive::{Archived, Archiver},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Module directions for the X posture, in FL, FR, RL, RR order.
///
/// Units: degrees
const SET_X_ANGLES_DEG: [f64; NUM_MODULES] = [45.0, -45.0, -45.0, 45.0];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive control module state
pub struct DriveCtrl {
    params: Params,

    geometry: ModuleGeometry,

    modules: [ModuleCtrl; NUM_MODULES],

    loc: LocMgr,

    /// Raw drive displacement at the last encoder reset, subtracted from every reading.
    ///
    /// Units: meters
    drv_pos_offsets_m: [f64; NUM_MODULES],

    /// Feedback snapshot for the current cycle.
    feedback: [ModuleFeedback; NUM_MODULES],

    /// What each module did with its demand this cycle.
    outputs: [ModuleOutput; NUM_MODULES],

    /// True while any motor is over its temperature limit.
    too_hot: bool,

    report: StatusReport,
    arch_report: Archiver,
    arch_targets: Archiver,
}

/// Input data to drive control.
#[derive(Debug, Clone, Default)]
pub struct InputData {
    /// The demand to execute this cycle.
    pub demand: DriveDemand,

    /// Mechanisms sensor data sampled at the start of the cycle.
    pub sens: MechSensData,

    /// Heading sensor reading sampled at the start of the cycle, if there is one.
    pub imu: Option<ImuData>,

    /// Session time at the start of the cycle.
    ///
    /// Units: seconds
    pub time_s: f64,
}

/// Status report for DriveCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    pub time_s: f64,

    /// False if the pose source has not provided a pose, in which case the pose fields are zero.
    pub pose_valid: bool,
    pub x_m: f64,
    pub y_m: f64,
    pub heading_rad: f64,

    /// Units: radians/second
    pub turn_rate_rads: f64,

    /// The heading sensor is not providing trusted readings.
    pub heading_degraded: bool,

    /// The module speeds were scaled down to the maximum speed.
    pub desaturated: bool,

    /// Number of modules which applied the low speed policy.
    pub num_low_speed: u8,

    /// Number of modules which reversed their demand to reduce steering.
    pub num_flipped: u8,

    pub motors_within_safe_temp: bool,
}

/// Module targets of one cycle in a flat form for archiving. A module with no target this cycle
/// is archived as NaN.
#[derive(Clone, Copy, Serialize, Debug)]
struct ModuleTargetsRecord {
    time_s: f64,
    fl_speed_ms: f64,
    fl_angle_rad: f64,
    fr_speed_ms: f64,
    fr_angle_rad: f64,
    rl_speed_ms: f64,
    rl_angle_rad: f64,
    rr_speed_ms: f64,
    rr_angle_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for DriveCtrl {
    type InitData = Params;
    type InitError = DriveCtrlError;

    type InputData = InputData;
    type OutputData = MechDems;
    type StatusReport = StatusReport;
    type ProcError = DriveCtrlError;

    /// Initialise the DriveCtrl module from its parameters.
    fn init(params: Self::InitData) -> Result<Self, Self::InitError> {
        params.validate()?;

        let geometry = ModuleGeometry::new(params.module_offsets_m)?;

        let module = |id: ModuleId| {
            ModuleCtrl::new(
                id,
                params.module_angular_offsets_rad[id.index()],
                params.min_module_speed_ms,
            )
        };
        let modules = [
            module(ModuleId::FL),
            module(ModuleId::FR),
            module(ModuleId::RL),
            module(ModuleId::RR),
        ];

        let loc = LocMgr::from_params(&params.loc, geometry.clone());

        Ok(Self {
            params,
            geometry,
            modules,
            loc,
            drv_pos_offsets_m: [0.0; NUM_MODULES],
            feedback: [ModuleFeedback::default(); NUM_MODULES],
            outputs: [ModuleOutput::default(); NUM_MODULES],
            too_hot: false,
            report: StatusReport::default(),
            arch_report: Archiver::default(),
            arch_targets: Archiver::default(),
        })
    }

    /// Perform cyclic processing of drive control.
    ///
    /// The feedback and heading are sampled first and used for the rest of the cycle. The demand
    /// is then dispatched to the modules, and finally the pose is updated.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport {
            time_s: input_data.time_s,
            ..Default::default()
        };
        self.outputs = [ModuleOutput::default(); NUM_MODULES];

        // ---- SNAPSHOT ----

        let mut feedback = ModuleFeedback::all_from_sens(&input_data.sens)?;
        for (fb, offset) in feedback.iter_mut().zip(self.drv_pos_offsets_m.iter()) {
            fb.drv_pos_m -= offset;
        }
        self.feedback = feedback;

        self.loc
            .sample_heading(input_data.imu.as_ref(), input_data.time_s);

        // ---- DISPATCH ----

        let mut dems = MechDems::default();

        match input_data.demand {
            DriveDemand::None => (),
            DriveDemand::Teleop {
                x,
                y,
                rot,
                field_relative,
            } => self.drive(
                x,
                y,
                rot,
                field_relative.unwrap_or(self.params.field_relative_default),
                &mut dems,
            ),
            DriveDemand::ModuleStates(states) => self.set_module_states(states, true, &mut dems),
            DriveDemand::SetX => self.set_x(&mut dems),
            DriveDemand::Stop => self.stop_modules(&mut dems),
        }

        // ---- POSE UPDATE ----

        let positions = self.module_positions();
        if let Some(pose) = self.loc.update(&positions) {
            self.report.pose_valid = true;
            self.report.x_m = pose.x_m;
            self.report.y_m = pose.y_m;
            self.report.heading_rad = pose.heading_rad;
        }

        let loc_report = self.loc.report();
        self.report.heading_degraded = loc_report.heading_degraded;
        self.report.turn_rate_rads = self.loc.get_turn_rate();

        // ---- THERMAL ----

        self.report.motors_within_safe_temp = self.motors_within_safe_temp();
        if self.report.motors_within_safe_temp == self.too_hot {
            self.too_hot = !self.report.motors_within_safe_temp;
            if self.too_hot {
                warn!("One or more drive motors are over their temperature limit");
            } else {
                info!("All drive motors back within their temperature limits");
            }
        }

        trace!(
            "DriveCtrl output:\n    speed: {:?}\n    pos: {:?}",
            dems.speed_ms,
            dems.pos_rad
        );

        Ok((dems, self.report))
    }
}

impl Archived for DriveCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;

        let t: Vec<(f64, f64)> = self
            .outputs
            .iter()
            .map(|o| match o.target {
                Some(t) => (t.speed_ms, t.angle_rad),
                None => (f64::NAN, f64::NAN),
            })
            .collect();
        self.arch_targets.serialise(ModuleTargetsRecord {
            time_s: self.report.time_s,
            fl_speed_ms: t[0].0,
            fl_angle_rad: t[0].1,
            fr_speed_ms: t[1].0,
            fr_angle_rad: t[1].1,
            rl_speed_ms: t[2].0,
            rl_angle_rad: t[2].1,
            rr_speed_ms: t[3].0,
            rr_angle_rad: t[3].1,
        })?;

        Ok(())
    }
}

impl DriveCtrl {
    /// Start archiving the status report and module targets into the session's archive
    /// directory.
    pub fn init_archive(&mut self, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report = Archiver::from_path(session, "drive_ctrl_status_report.csv")?;
        self.arch_targets = Archiver::from_path(session, "drive_ctrl_module_targets.csv")?;

        Ok(())
    }

    /// Drive with a normalised joystick-style command.
    ///
    /// The inputs are scaled by the speed dampers, rotated into the chassis frame if
    /// `field_relative` is set, and the resulting module speeds are desaturated to the maximum
    /// speed. Modules apply the low speed policy to demands below their minimum speed.
    pub fn drive(&mut self, x: f64, y: f64, rot: f64, field_relative: bool, dems: &mut MechDems) {
        let vx_ms = x * self.params.driving_speed_damper;
        let vy_ms = y * self.params.driving_speed_damper;
        let omega_rads = (rot * self.params.angular_speed_damper).clamp(
            -self.params.max_angular_speed_rads,
            self.params.max_angular_speed_rads,
        );

        let vel = if field_relative {
            ChassisVelocity::from_field_relative(vx_ms, vy_ms, omega_rads, self.loc.get_heading())
        } else {
            ChassisVelocity::new(vx_ms, vy_ms, omega_rads)
        };

        let mut states = self.geometry.to_module_states(&vel);
        self.report.desaturated |= desaturate(&mut states, self.params.max_speed_ms);

        self.dispatch(&states, false, dems);
    }

    /// Drive the modules to the given states, desaturated to the maximum speed.
    pub fn set_module_states(
        &mut self,
        mut states: [ModuleDemand; NUM_MODULES],
        allow_low_speed_turning: bool,
        dems: &mut MechDems,
    ) {
        self.report.desaturated |= desaturate(&mut states, self.params.max_speed_ms);

        self.dispatch(&states, allow_low_speed_turning, dems);
    }

    /// Point the modules in an X with zero speed, so the robot resists being pushed.
    pub fn set_x(&mut self, dems: &mut MechDems) {
        let mut states = [ModuleDemand {
            speed_ms: 0.0,
            angle_rad: None,
        }; NUM_MODULES];

        for (s, a) in states.iter_mut().zip(SET_X_ANGLES_DEG.iter()) {
            s.angle_rad = Some(a.to_radians());
        }

        self.dispatch(&states, true, dems);
    }

    /// Remove the output from every actuator.
    pub fn stop_modules(&mut self, dems: &mut MechDems) {
        for m in self.modules.iter() {
            m.stop(dems);
        }
    }

    /// Reset the pose estimate to `pose`.
    pub fn reset_pose(&mut self, pose: Pose2) {
        self.loc.reset_pose(pose);
    }

    /// Supply a pose from the external field position system.
    pub fn set_external_pose(&mut self, pose: Pose2) -> Result<(), LocError> {
        self.loc.set_external_pose(pose)
    }

    /// Make the current orientation read as zero heading.
    pub fn zero_heading(&mut self) {
        self.loc.zero_heading();
    }

    /// Zero the drive displacement of every module without moving the pose.
    pub fn reset_encoders(&mut self) {
        for (offset, fb) in self.drv_pos_offsets_m.iter_mut().zip(self.feedback.iter_mut()) {
            *offset += fb.drv_pos_m;
            fb.drv_pos_m = 0.0;
        }

        let positions = self.module_positions();
        self.loc.reset_positions(&positions);

        info!("Drive encoders reset");
    }

    /// True if no motor is over its temperature limit.
    pub fn motors_within_safe_temp(&self) -> bool {
        !self.modules.iter().zip(self.feedback.iter()).any(|(m, fb)| {
            m.is_too_hot(fb, self.params.max_drive_temp_c, self.params.max_steer_temp_c)
        })
    }

    /// Which pose source localisation is using.
    pub fn pose_source(&self) -> PoseSourceKind {
        self.loc.source_kind()
    }

    /// Current pose, or `None` if the pose source hasn't provided one.
    pub fn pose(&self) -> Option<Pose2> {
        self.loc.get_pose()
    }

    /// Units: radians
    pub fn heading(&self) -> f64 {
        self.loc.get_heading()
    }

    /// Counter-clockwise positive turn rate.
    ///
    /// Units: radians/second
    pub fn turn_rate(&self) -> f64 {
        self.loc.get_turn_rate()
    }

    pub fn loc_report(&self) -> loc::StatusReport {
        self.loc.report()
    }

    pub fn geometry(&self) -> &ModuleGeometry {
        &self.geometry
    }

    /// Measured module states from this cycle's feedback.
    pub fn module_states(&self) -> [ModuleState; NUM_MODULES] {
        let mut states = [ModuleState::default(); NUM_MODULES];
        for (s, (m, fb)) in states
            .iter_mut()
            .zip(self.modules.iter().zip(self.feedback.iter()))
        {
            *s = m.state(fb);
        }
        states
    }

    pub fn module_outputs(&self) -> &[ModuleOutput; NUM_MODULES] {
        &self.outputs
    }

    pub fn report(&self) -> StatusReport {
        self.report
    }

    fn module_positions(&self) -> [ModulePosition; NUM_MODULES] {
        let mut positions = [ModulePosition::default(); NUM_MODULES];
        for (p, (m, fb)) in positions
            .iter_mut()
            .zip(self.modules.iter().zip(self.feedback.iter()))
        {
            *p = m.position(fb);
        }
        positions
    }

    fn dispatch(
        &mut self,
        states: &[ModuleDemand; NUM_MODULES],
        allow_low_speed_turning: bool,
        dems: &mut MechDems,
    ) {
        for (i, m) in self.modules.iter_mut().enumerate() {
            let out = m.set_desired_state(
                &states[i],
                &self.feedback[i],
                allow_low_speed_turning,
                self.params.low_speed_policy,
                dems,
            );

            if out.low_speed {
                self.report.num_low_speed += 1;
            }
            if out.flipped {
                self.report.num_flipped += 1;
            }

            self.outputs[i] = out;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::loc::{LocMgrParams, PoseSourceKind};
    use crate::module_ctrl::LowSpeedPolicy;
    use comms_if::eqpt::mech::{ActId, DRV_IDS, STR_IDS};
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
    use util::maths::wrap_2pi;

    const OFFSETS: [f64; NUM_MODULES] = [0.1, 0.2, 0.3, 0.4];

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn params() -> Params {
        Params {
            module_offsets_m: [[0.4, 0.35], [0.4, -0.35], [-0.4, 0.35], [-0.4, -0.35]],
            module_angular_offsets_rad: OFFSETS,
            max_speed_ms: 4.0,
            max_angular_speed_rads: 6.0,
            min_module_speed_ms: 0.01,
            low_speed_policy: LowSpeedPolicy::StopDrive,
            driving_speed_damper: 4.0,
            angular_speed_damper: 6.0,
            field_relative_default: false,
            max_drive_temp_c: 80.0,
            max_steer_temp_c: 70.0,
            loc: LocMgrParams {
                source: PoseSourceKind::GyroOdometry,
                heading_inverted: false,
                heading_offset_deg: 0.0,
                heading_stale_limit_s: 0.1,
            },
        }
    }

    /// Sensor data with every wheel pointing forwards and the given drive displacement.
    fn sens(drv_pos_m: f64) -> MechSensData {
        let mut sens = MechSensData::default();
        for i in 0..NUM_MODULES {
            sens.drv_pos_m.insert(DRV_IDS[i], drv_pos_m);
            sens.drv_speed_ms.insert(DRV_IDS[i], 0.0);
            sens.str_pos_rad.insert(STR_IDS[i], OFFSETS[i]);
            sens.temp_c.insert(DRV_IDS[i], 30.0);
            sens.temp_c.insert(STR_IDS[i], 30.0);
        }
        sens
    }

    fn input(demand: DriveDemand, sens: MechSensData, time_s: f64, yaw_deg: f64) -> InputData {
        InputData {
            demand,
            sens,
            imu: Some(ImuData {
                timestamp_s: time_s,
                yaw_deg,
                yaw_rate_degs: 0.0,
            }),
            time_s,
        }
    }

    fn teleop(x: f64, y: f64, rot: f64, field_relative: Option<bool>) -> DriveDemand {
        DriveDemand::Teleop {
            x,
            y,
            rot,
            field_relative,
        }
    }

    #[test]
    fn test_init_rejects_invalid_config() {
        let mut p = params();
        p.module_offsets_m[1] = p.module_offsets_m[0];
        assert!(matches!(
            DriveCtrl::init(p),
            Err(DriveCtrlError::InvalidGeometry(_))
        ));

        let mut p = params();
        p.max_speed_ms = 0.0;
        assert!(matches!(
            DriveCtrl::init(p),
            Err(DriveCtrlError::InvalidParam(_))
        ));

        let mut p = params();
        p.min_module_speed_ms = -1.0;
        assert!(matches!(
            DriveCtrl::init(p),
            Err(DriveCtrlError::InvalidParam(_))
        ));
    }

    #[test]
    fn test_drive_forwards() {
        let mut dc = DriveCtrl::init(params()).unwrap();

        let (dems, rpt) = dc
            .proc(&input(teleop(0.25, 0.0, 0.0, None), sens(0.0), 0.0, 0.0))
            .unwrap();

        for i in 0..NUM_MODULES {
            assert!(approx(dems.speed_ms[&DRV_IDS[i]], 1.0));
            assert!(approx(dems.pos_rad[&STR_IDS[i]], OFFSETS[i]));
        }
        assert!(!rpt.desaturated);
        assert_eq!(rpt.num_flipped, 0);
        assert!(rpt.motors_within_safe_temp);
    }

    #[test]
    fn test_drive_field_relative() {
        let mut dc = DriveCtrl::init(params()).unwrap();

        // Facing field +Y, driving along field +X is driving to the robot's right
        let (dems, _) = dc
            .proc(&input(teleop(0.25, 0.0, 0.0, Some(true)), sens(0.0), 0.0, 90.0))
            .unwrap();

        for i in 0..NUM_MODULES {
            assert!(approx(dems.speed_ms[&DRV_IDS[i]], 1.0));
            assert!(approx(
                dems.pos_rad[&STR_IDS[i]],
                wrap_2pi(OFFSETS[i] - FRAC_PI_2)
            ));
        }

        // The default comes from the parameters
        let mut p = params();
        p.field_relative_default = true;
        let mut dc = DriveCtrl::init(p).unwrap();
        let (dems, _) = dc
            .proc(&input(teleop(0.25, 0.0, 0.0, None), sens(0.0), 0.0, 90.0))
            .unwrap();
        assert!(approx(
            dems.pos_rad[&ActId::StrFL],
            wrap_2pi(OFFSETS[0] - FRAC_PI_2)
        ));
    }

    #[test]
    fn test_drive_desaturates() {
        let mut dc = DriveCtrl::init(params()).unwrap();

        // Full forwards and full rotation together exceed the maximum speed
        let (dems, rpt) = dc
            .proc(&input(teleop(1.0, 0.0, 1.0, None), sens(0.0), 0.0, 0.0))
            .unwrap();

        assert!(rpt.desaturated);
        let max = dems
            .speed_ms
            .values()
            .map(|s| s.abs())
            .fold(0.0, f64::max);
        assert!(approx(max, 4.0));
    }

    #[test]
    fn test_low_speed_policies() {
        let mut dc = DriveCtrl::init(params()).unwrap();

        let (dems, rpt) = dc
            .proc(&input(teleop(0.0, 0.001, 0.0, None), sens(0.0), 0.0, 0.0))
            .unwrap();
        assert_eq!(rpt.num_low_speed, NUM_MODULES as u8);
        assert!(dems.pos_rad.is_empty());
        for id in DRV_IDS.iter() {
            assert_eq!(dems.speed_ms[id], 0.0);
        }

        let mut p = params();
        p.low_speed_policy = LowSpeedPolicy::SkipUpdate;
        let mut dc = DriveCtrl::init(p).unwrap();

        let (dems, rpt) = dc
            .proc(&input(teleop(0.0, 0.001, 0.0, None), sens(0.0), 0.0, 0.0))
            .unwrap();
        assert_eq!(rpt.num_low_speed, NUM_MODULES as u8);
        assert!(dems.is_empty());
    }

    #[test]
    fn test_set_x_and_stop() {
        let mut dc = DriveCtrl::init(params()).unwrap();

        let (dems, _) = dc
            .proc(&input(DriveDemand::SetX, sens(0.0), 0.0, 0.0))
            .unwrap();

        let expected = [FRAC_PI_4, -FRAC_PI_4, -FRAC_PI_4, FRAC_PI_4];
        for i in 0..NUM_MODULES {
            assert_eq!(dems.speed_ms[&DRV_IDS[i]], 0.0);
            assert!(approx(
                dems.pos_rad[&STR_IDS[i]],
                wrap_2pi(expected[i] + OFFSETS[i])
            ));
        }

        let (dems, _) = dc
            .proc(&input(DriveDemand::Stop, sens(0.0), 0.02, 0.0))
            .unwrap();
        assert_eq!(dems.neutral.len(), 2 * NUM_MODULES);
        assert!(dems.speed_ms.is_empty());

        let (dems, _) = dc
            .proc(&input(DriveDemand::None, sens(0.0), 0.04, 0.0))
            .unwrap();
        assert!(dems.is_empty());
    }

    #[test]
    fn test_set_module_states_allows_low_speed_turning() {
        let mut dc = DriveCtrl::init(params()).unwrap();

        let states = [ModuleDemand {
            speed_ms: 0.001,
            angle_rad: Some(FRAC_PI_4),
        }; NUM_MODULES];

        let (dems, rpt) = dc
            .proc(&input(DriveDemand::ModuleStates(states), sens(0.0), 0.0, 0.0))
            .unwrap();

        assert_eq!(rpt.num_low_speed, 0);
        assert!(approx(dems.pos_rad[&ActId::StrRR], FRAC_PI_4 + OFFSETS[3]));
        assert!(approx(dems.speed_ms[&ActId::DrvRR], 0.001));
    }

    #[test]
    fn test_pose_and_encoder_reset() {
        let mut dc = DriveCtrl::init(params()).unwrap();

        // Encoders start well away from zero, the first cycle only seeds the estimator
        dc.proc(&input(DriveDemand::None, sens(5.0), 0.0, 0.0))
            .unwrap();
        let (_, rpt) = dc
            .proc(&input(DriveDemand::None, sens(6.0), 0.02, 0.0))
            .unwrap();
        assert!(rpt.pose_valid);
        assert!(approx(rpt.x_m, 1.0));
        assert!(approx(rpt.y_m, 0.0));

        // Resetting the encoders doesn't move the pose
        dc.reset_encoders();
        let (_, rpt) = dc
            .proc(&input(DriveDemand::None, sens(6.0), 0.04, 0.0))
            .unwrap();
        assert!(approx(rpt.x_m, 1.0));

        let (_, rpt) = dc
            .proc(&input(DriveDemand::None, sens(6.5), 0.06, 0.0))
            .unwrap();
        assert!(approx(rpt.x_m, 1.5));

        // Pose reset then no motion holds the reset pose
        let target = Pose2::new(-2.0, 0.5, FRAC_PI_2);
        dc.reset_pose(target);
        let (_, rpt) = dc
            .proc(&input(DriveDemand::None, sens(6.5), 0.08, 0.0))
            .unwrap();
        assert!(approx(rpt.x_m, -2.0));
        assert!(approx(rpt.y_m, 0.5));
        assert!(approx(rpt.heading_rad, FRAC_PI_2));
        assert!(approx(dc.heading(), FRAC_PI_2));

        dc.zero_heading();
        assert!(approx(dc.heading(), 0.0));
        assert!(approx(dc.pose().unwrap().x_m, -2.0));
    }

    #[test]
    fn test_stale_heading_is_reported() {
        let mut dc = DriveCtrl::init(params()).unwrap();

        dc.proc(&input(DriveDemand::None, sens(0.0), 0.0, 30.0))
            .unwrap();

        let mut stale = input(DriveDemand::None, sens(0.0), 1.0, 60.0);
        stale.imu = Some(ImuData {
            timestamp_s: 0.0,
            yaw_deg: 60.0,
            yaw_rate_degs: 0.0,
        });
        let (_, rpt) = dc.proc(&stale).unwrap();

        assert!(rpt.heading_degraded);
        assert!(approx(rpt.heading_rad, 30f64.to_radians()));
    }

    #[test]
    fn test_thermal_aggregate() {
        let mut dc = DriveCtrl::init(params()).unwrap();

        let mut s = sens(0.0);
        s.temp_c.insert(ActId::StrRL, 70.5);
        let (_, rpt) = dc.proc(&input(DriveDemand::None, s, 0.0, 0.0)).unwrap();
        assert!(!rpt.motors_within_safe_temp);
        assert!(!dc.motors_within_safe_temp());

        let (_, rpt) = dc
            .proc(&input(DriveDemand::None, sens(0.0), 0.02, 0.0))
            .unwrap();
        assert!(rpt.motors_within_safe_temp);
    }

    #[test]
    fn test_missing_feedback() {
        let mut dc = DriveCtrl::init(params()).unwrap();

        let mut s = sens(0.0);
        s.drv_speed_ms.remove(&ActId::DrvFR);
        assert!(matches!(
            dc.proc(&input(DriveDemand::None, s, 0.0, 0.0)),
            Err(DriveCtrlError::ModuleFeedback(_))
        ));
    }
}
