//! # Simulated mechanisms
//!
//! Stands in for the drivetrain hardware. Each actuator runs its own closed loop on whatever
//! setpoint it was last sent, driving a first order plant, and the chassis moves according to the
//! resulting module states. The simulated gyro and encoders report that motion back in the same
//! form as the real equipment would.
//!
//! Auxiliary actuators can be ganged to a module actuator as followers. A follower never takes
//! demands of its own, it mirrors its leader's setpoint.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

pub use params::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use std::collections::HashMap;
use std::f64::consts::TAU;

// Internal
use crate::{
    kinematics::{ModuleGeometry, ModuleState, NUM_MODULES},
    loc::Pose2,
    module_ctrl::{DriveVelocityLoop, SteerPositionLoop},
};
use comms_if::eqpt::{
    imu::ImuData,
    mech::{ActId, ActRole, MechDems, MechDemsResponse, MechSensData, DRV_IDS, STR_IDS},
};
use util::maths::{wrap_2pi, wrap_pi};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulated drivetrain.
pub struct SimMech {
    params: Params,

    geometry: ModuleGeometry,

    acts: HashMap<ActId, SimAct>,

    /// Units: seconds
    time_s: f64,

    /// True pose of the chassis, with the heading unwrapped.
    pose: Pose2,

    /// Units: radians/second
    yaw_rate_rads: f64,
}

#[derive(Debug, Clone)]
struct SimAct {
    role: ActRole,

    ctrl: ActLoop,

    /// Setpoint being executed, `None` if the actuator has been stopped.
    setpoint: Option<f64>,

    /// Normalised loop output
    output: f64,

    /// Drive displacement in meters or steer position in radians
    pos: f64,

    /// Drive speed in meters/second or steer rate in radians/second
    speed: f64,

    temp_c: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum ActLoop {
    Drive(DriveVelocityLoop),
    Steer(SteerPositionLoop),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SimMechError {
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("{0:?} is defined more than once")]
    AlreadyDefined(ActId),

    #[error("{0:?} is an auxiliary actuator and can only be a follower")]
    AuxLeader(ActId),

    #[error("{0:?} follows {1:?}, which is not a leader")]
    InvalidLeader(ActId, ActId),

    #[error("No actuator {0:?}")]
    UnknownActuator(ActId),

    #[error("{0:?} is a follower and cannot take demands")]
    DemandToFollower(ActId),

    #[error("{0:?} cannot take this kind of demand")]
    WrongDemandKind(ActId),

    #[error("Demand {1} for {0:?} is out of range")]
    InvalidDemand(ActId, f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimMech {
    /// Create the simulation with the chassis at the origin and every wheel pointing forwards.
    pub fn new(params: Params, geometry: ModuleGeometry) -> Result<Self, SimMechError> {
        let positive = [
            ("drive_max_speed_ms", params.drive_max_speed_ms),
            ("drive_time_const_s", params.drive_time_const_s),
            ("steer_max_rate_rads", params.steer_max_rate_rads),
        ];
        for (name, value) in positive.iter() {
            if !(value.is_finite() && *value > 0.0) {
                return Err(SimMechError::InvalidParam(format!(
                    "{} must be positive, found {}",
                    name, value
                )));
            }
        }

        let ambient_c = params.thermal.ambient_temp_c;
        let mut acts = HashMap::new();

        for i in 0..NUM_MODULES {
            acts.insert(
                DRV_IDS[i],
                SimAct::new(
                    ActLoop::Drive(DriveVelocityLoop::new(params.drive_loop)),
                    0.0,
                    ambient_c,
                ),
            );
            acts.insert(
                STR_IDS[i],
                SimAct::new(
                    ActLoop::Steer(SteerPositionLoop::new(params.steer_loop)),
                    wrap_2pi(params.module_angular_offsets_rad[i]),
                    ambient_c,
                ),
            );
        }

        for g in params.gang.iter() {
            if acts.contains_key(&g.act) {
                return Err(SimMechError::AlreadyDefined(g.act));
            }

            let leader = match g.role {
                ActRole::Leader => return Err(SimMechError::AuxLeader(g.act)),
                ActRole::Follower { leader, .. } => leader,
            };

            let follower = match acts.get(&leader) {
                Some(l) if l.role == ActRole::Leader => SimAct {
                    role: g.role,
                    ..l.clone()
                },
                _ => return Err(SimMechError::InvalidLeader(g.act, leader)),
            };

            debug!("{:?} ganged as {:?}", g.act, g.role);
            acts.insert(g.act, follower);
        }

        Ok(Self {
            params,
            geometry,
            acts,
            time_s: 0.0,
            pose: Pose2::default(),
            yaw_rate_rads: 0.0,
        })
    }

    /// Take a new set of demands. Invalid demands are rejected as a whole.
    pub fn send_demands(&mut self, dems: &MechDems) -> MechDemsResponse {
        if let Err(e) = self.check_demands(dems) {
            warn!("Demands rejected: {}", e);
            return MechDemsResponse::DemsInvalid;
        }

        for id in dems.neutral.iter() {
            if let Some(act) = self.acts.get_mut(id) {
                act.setpoint = None;
                act.reset_loop();
            }
        }

        for (id, sp) in dems.speed_ms.iter().chain(dems.pos_rad.iter()) {
            if let Some(act) = self.acts.get_mut(id) {
                act.setpoint = Some(*sp);
            }
        }

        MechDemsResponse::DemsOk
    }

    /// Advance the simulation by `dt_s` seconds.
    pub fn step(&mut self, dt_s: f64) {
        let leader_sps: HashMap<ActId, Option<f64>> = self
            .acts
            .iter()
            .filter(|(_, a)| a.role == ActRole::Leader)
            .map(|(id, a)| (*id, a.setpoint))
            .collect();

        let params = &self.params;
        for act in self.acts.values_mut() {
            if let ActRole::Follower { leader, inverted } = act.role {
                act.setpoint = leader_sps
                    .get(&leader)
                    .copied()
                    .flatten()
                    .map(|sp| act.mirror(sp, inverted));
            }

            act.step(dt_s, params);
        }

        // ---- CHASSIS ----

        let mut states = [ModuleState::default(); NUM_MODULES];
        for (i, s) in states.iter_mut().enumerate() {
            *s = ModuleState::new(
                self.act_speed(DRV_IDS[i]),
                wrap_pi(self.act_pos(STR_IDS[i]) - self.params.module_angular_offsets_rad[i]),
            );
        }

        let vel = self.geometry.to_chassis_velocity(&states);

        // Midpoint heading for the cycle
        let (sin, cos) = (self.pose.heading_rad + 0.5 * vel.omega_rads * dt_s).sin_cos();
        self.pose.x_m += (vel.vx_ms * cos - vel.vy_ms * sin) * dt_s;
        self.pose.y_m += (vel.vx_ms * sin + vel.vy_ms * cos) * dt_s;
        self.pose.heading_rad += vel.omega_rads * dt_s;
        self.yaw_rate_rads = vel.omega_rads;

        self.time_s += dt_s;
    }

    /// Current readings of every actuator.
    pub fn sens_data(&self) -> MechSensData {
        let mut sens = MechSensData::default();

        for (id, act) in self.acts.iter() {
            match act.ctrl {
                ActLoop::Drive(_) => {
                    sens.drv_pos_m.insert(*id, act.pos);
                    sens.drv_speed_ms.insert(*id, act.speed);
                }
                ActLoop::Steer(_) => {
                    sens.str_pos_rad.insert(*id, act.pos);
                }
            }
            sens.temp_c.insert(*id, act.temp_c);
        }

        sens
    }

    /// Current reading of the gyro.
    pub fn imu_data(&self) -> ImuData {
        let sign = if self.params.gyro_inverted { -1.0 } else { 1.0 };

        ImuData {
            timestamp_s: self.time_s,
            yaw_deg: sign * self.pose.heading_rad.to_degrees(),
            yaw_rate_degs: sign * self.yaw_rate_rads.to_degrees(),
        }
    }

    /// True pose of the chassis.
    pub fn true_pose(&self) -> Pose2 {
        Pose2 {
            heading_rad: wrap_pi(self.pose.heading_rad),
            ..self.pose
        }
    }

    /// Units: seconds
    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    fn act_pos(&self, id: ActId) -> f64 {
        self.acts.get(&id).map(|a| a.pos).unwrap_or_default()
    }

    fn act_speed(&self, id: ActId) -> f64 {
        self.acts.get(&id).map(|a| a.speed).unwrap_or_default()
    }

    fn leader(&self, id: &ActId) -> Result<&SimAct, SimMechError> {
        match self.acts.get(id) {
            None => Err(SimMechError::UnknownActuator(*id)),
            Some(a) if a.role != ActRole::Leader => Err(SimMechError::DemandToFollower(*id)),
            Some(a) => Ok(a),
        }
    }

    fn check_demands(&self, dems: &MechDems) -> Result<(), SimMechError> {
        for (id, sp) in dems.speed_ms.iter() {
            match self.leader(id)?.ctrl {
                ActLoop::Drive(_) if sp.is_finite() => (),
                ActLoop::Drive(_) => return Err(SimMechError::InvalidDemand(*id, *sp)),
                ActLoop::Steer(_) => return Err(SimMechError::WrongDemandKind(*id)),
            }
        }

        for (id, sp) in dems.pos_rad.iter() {
            match self.leader(id)?.ctrl {
                ActLoop::Steer(_) if (0.0..TAU).contains(sp) => (),
                ActLoop::Steer(_) => return Err(SimMechError::InvalidDemand(*id, *sp)),
                ActLoop::Drive(_) => return Err(SimMechError::WrongDemandKind(*id)),
            }
        }

        for id in dems.neutral.iter() {
            self.leader(id)?;
        }

        Ok(())
    }
}

impl SimAct {
    fn new(ctrl: ActLoop, pos: f64, temp_c: f64) -> Self {
        Self {
            role: ActRole::Leader,
            ctrl,
            setpoint: None,
            output: 0.0,
            pos,
            speed: 0.0,
            temp_c,
        }
    }

    fn reset_loop(&mut self) {
        match self.ctrl {
            ActLoop::Drive(ref mut l) => l.reset(),
            ActLoop::Steer(ref mut l) => l.reset(),
        }
    }

    /// Setpoint a follower executes for its leader's setpoint.
    fn mirror(&self, sp: f64, inverted: bool) -> f64 {
        match (&self.ctrl, inverted) {
            (_, false) => sp,
            (ActLoop::Drive(_), true) => -sp,
            (ActLoop::Steer(_), true) => wrap_2pi(-sp),
        }
    }

    fn step(&mut self, dt_s: f64, params: &Params) {
        match self.ctrl {
            ActLoop::Drive(ref mut l) => {
                self.output = match self.setpoint {
                    Some(sp) => l.calculate(self.speed, sp, dt_s),
                    None => 0.0,
                };

                let target_ms = self.output * params.drive_max_speed_ms;
                let alpha = (dt_s / params.drive_time_const_s).min(1.0);
                self.speed += (target_ms - self.speed) * alpha;
                self.pos += self.speed * dt_s;
            }
            ActLoop::Steer(ref mut l) => {
                self.output = match self.setpoint {
                    Some(sp) => l.calculate(self.pos, sp, dt_s),
                    None => 0.0,
                };

                self.speed = self.output * params.steer_max_rate_rads;
                self.pos = wrap_2pi(self.pos + self.speed * dt_s);
            }
        }

        let th = &params.thermal;
        self.temp_c += (th.heating_rate_cs * self.output * self.output
            - th.cooling_coeff_s * (self.temp_c - th.ambient_temp_c))
            * dt_s;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        controllers::PidGains,
        drive_ctrl::{self, DriveCtrl, DriveDemand},
        loc::{LocMgrParams, PoseSourceKind},
        module_ctrl::{LoopParams, LowSpeedPolicy},
        task::{Scheduler, SourceRequest, TaskInput, TeleopTask},
        traj_ctrl::{self, HeadingSource, TrajCtrl, TrajCtrlMode, Trajectory, TrajectorySample},
    };
    use util::module::State;

    const OFFSETS: [f64; NUM_MODULES] = [0.3, 1.2, 4.0, 5.5];
    const MODULE_OFFSETS_M: [[f64; 2]; NUM_MODULES] =
        [[0.4, 0.35], [0.4, -0.35], [-0.4, 0.35], [-0.4, -0.35]];
    const DT_S: f64 = 0.02;

    fn loop_params(k_p: f64, k_ff: f64) -> LoopParams {
        LoopParams {
            gains: PidGains {
                k_p,
                k_i: 0.0,
                k_d: 0.0,
            },
            k_ff,
            min_output: -1.0,
            max_output: 1.0,
        }
    }

    fn params() -> Params {
        Params {
            drive_loop: loop_params(0.1, 0.25),
            steer_loop: loop_params(2.0, 0.0),
            drive_max_speed_ms: 4.0,
            drive_time_const_s: 0.05,
            steer_max_rate_rads: 20.0,
            module_angular_offsets_rad: OFFSETS,
            gyro_inverted: true,
            thermal: ThermalParams {
                ambient_temp_c: 25.0,
                heating_rate_cs: 20.0,
                cooling_coeff_s: 0.05,
            },
            gang: vec![GangParams {
                act: ActId::Aux0,
                role: ActRole::Follower {
                    leader: ActId::DrvFL,
                    inverted: true,
                },
            }],
        }
    }

    fn geometry() -> ModuleGeometry {
        ModuleGeometry::new(MODULE_OFFSETS_M).unwrap()
    }

    fn forwards(speed_ms: f64) -> MechDems {
        let mut dems = MechDems::default();
        for i in 0..NUM_MODULES {
            dems.speed_ms.insert(DRV_IDS[i], speed_ms);
            dems.pos_rad.insert(STR_IDS[i], OFFSETS[i]);
        }
        dems
    }

    #[test]
    fn test_params_from_toml() {
        let p: Params = util::params::from_toml_str(
            r#"
            drive_max_speed_ms = 4.0
            drive_time_const_s = 0.05
            steer_max_rate_rads = 20.0
            module_angular_offsets_rad = [0.0, 0.0, 0.0, 0.0]
            gyro_inverted = true

            [drive_loop]
            k_p = 0.1
            k_d = 0.0
            k_ff = 0.25

            [steer_loop]
            k_p = 2.0
            k_d = 0.0

            [thermal]
            ambient_temp_c = 25.0
            heating_rate_cs = 20.0
            cooling_coeff_s = 0.05

            [[gang]]
            act = "Aux0"
            role = { Follower = { leader = "DrvFL", inverted = true } }
            "#,
        )
        .unwrap();

        assert_eq!(p.drive_loop.k_ff, 0.25);
        assert_eq!(p.steer_loop.min_output, -1.0);
        assert_eq!(
            p.gang[0].role,
            ActRole::Follower {
                leader: ActId::DrvFL,
                inverted: true
            }
        );
    }

    #[test]
    fn test_invalid_gangs() {
        let mut p = params();
        p.gang[0].act = ActId::StrFR;
        assert_eq!(
            SimMech::new(p, geometry()).err(),
            Some(SimMechError::AlreadyDefined(ActId::StrFR))
        );

        let mut p = params();
        p.gang[0].role = ActRole::Leader;
        assert_eq!(
            SimMech::new(p, geometry()).err(),
            Some(SimMechError::AuxLeader(ActId::Aux0))
        );

        // Followers can't lead
        let mut p = params();
        p.gang.push(GangParams {
            act: ActId::Aux1,
            role: ActRole::Follower {
                leader: ActId::Aux0,
                inverted: false,
            },
        });
        assert_eq!(
            SimMech::new(p, geometry()).err(),
            Some(SimMechError::InvalidLeader(ActId::Aux1, ActId::Aux0))
        );
    }

    #[test]
    fn test_demand_validation() {
        let mut sim = SimMech::new(params(), geometry()).unwrap();

        assert_eq!(sim.send_demands(&forwards(1.0)), MechDemsResponse::DemsOk);

        let mut dems = MechDems::default();
        dems.speed_ms.insert(ActId::Aux0, 1.0);
        assert_eq!(sim.send_demands(&dems), MechDemsResponse::DemsInvalid);

        let mut dems = MechDems::default();
        dems.pos_rad.insert(ActId::DrvRR, 1.0);
        assert_eq!(sim.send_demands(&dems), MechDemsResponse::DemsInvalid);

        let mut dems = MechDems::default();
        dems.pos_rad.insert(ActId::StrRR, TAU);
        assert_eq!(sim.send_demands(&dems), MechDemsResponse::DemsInvalid);

        let mut dems = MechDems::default();
        dems.speed_ms.insert(ActId::DrvRR, f64::NAN);
        assert_eq!(sim.send_demands(&dems), MechDemsResponse::DemsInvalid);
    }

    #[test]
    fn test_drive_forwards_and_follow() {
        let mut sim = SimMech::new(params(), geometry()).unwrap();
        sim.send_demands(&forwards(1.0));

        for _ in 0..50 {
            sim.step(DT_S);
        }

        let pose = sim.true_pose();
        assert!(pose.x_m > 0.9 && pose.x_m <= 1.0, "x = {}", pose.x_m);
        assert!(pose.y_m.abs() < 1e-9);
        assert!(pose.heading_rad.abs() < 1e-9);

        let sens = sim.sens_data();
        assert!((sens.drv_speed_ms[&ActId::DrvFL] - 1.0).abs() < 1e-3);
        assert!((sens.drv_speed_ms[&ActId::Aux0] + 1.0).abs() < 1e-3);
        assert!((sens.str_pos_rad[&ActId::StrRL] - OFFSETS[2]).abs() < 1e-9);

        // Working motors warm up
        assert!(sens.temp_c[&ActId::DrvFL] > 25.0);
        assert_eq!(sens.temp_c[&ActId::StrFL], 25.0);

        // Stopping removes the output and the robot coasts to rest
        let mut dems = MechDems::default();
        for id in DRV_IDS.iter() {
            dems.neutral.insert(*id);
        }
        sim.send_demands(&dems);
        for _ in 0..50 {
            sim.step(DT_S);
        }
        assert!(sim.sens_data().drv_speed_ms[&ActId::DrvFL].abs() < 1e-6);
        assert!(sim.sens_data().drv_speed_ms[&ActId::Aux0].abs() < 1e-6);
    }

    #[test]
    fn test_turn_on_the_spot() {
        let mut sim = SimMech::new(params(), geometry()).unwrap();

        // Wheels tangential for counter-clockwise rotation, steered before driving
        let mut dems = MechDems::default();
        for i in 0..NUM_MODULES {
            let [x, y] = MODULE_OFFSETS_M[i];
            let angle = wrap_2pi(y.atan2(x) + std::f64::consts::FRAC_PI_2 + OFFSETS[i]);
            dems.pos_rad.insert(STR_IDS[i], angle);
        }
        sim.send_demands(&dems);
        for _ in 0..25 {
            sim.step(DT_S);
        }
        assert_eq!(sim.true_pose(), Pose2::default());

        let mut dems = MechDems::default();
        for id in DRV_IDS.iter() {
            dems.speed_ms.insert(*id, 0.5);
        }
        sim.send_demands(&dems);

        for _ in 0..100 {
            sim.step(DT_S);
        }

        let pose = sim.true_pose();
        assert!(pose.x_m.hypot(pose.y_m) < 0.05);
        assert!(pose.heading_rad > 0.5);

        // Inverted gyro
        assert!(sim.imu_data().yaw_deg < 0.0);
        assert!(sim.imu_data().yaw_rate_degs < 0.0);
    }

    /// Straight line trajectory from the origin with a trapezoidal speed profile.
    fn line_trajectory(end_x_m: f64, end_y_m: f64, accel_mss: f64, max_vel_ms: f64) -> Trajectory {
        let dist_m = end_x_m.hypot(end_y_m);
        let heading_rad = end_y_m.atan2(end_x_m);

        let peak_ms = max_vel_ms.min((dist_m * accel_mss).sqrt());
        let t_accel_s = peak_ms / accel_mss;
        let d_accel_m = 0.5 * accel_mss * t_accel_s * t_accel_s;
        let t_cruise_s = (dist_m - 2.0 * d_accel_m) / peak_ms;
        let total_s = 2.0 * t_accel_s + t_cruise_s;

        let state = |t: f64| {
            if t < t_accel_s {
                (0.5 * accel_mss * t * t, accel_mss * t, accel_mss)
            } else if t < t_accel_s + t_cruise_s {
                (d_accel_m + peak_ms * (t - t_accel_s), peak_ms, 0.0)
            } else {
                let r = total_s - t;
                (dist_m - 0.5 * accel_mss * r * r, accel_mss * r, -accel_mss)
            }
        };

        let n = (total_s / 0.05).ceil() as usize;
        let samples = (0..=n)
            .map(|i| {
                let t = (0.05 * i as f64).min(total_s);
                let (s, v, a) = state(t);
                TrajectorySample {
                    time_s: t,
                    pose: Pose2::new(s * heading_rad.cos(), s * heading_rad.sin(), heading_rad),
                    velocity_ms: v,
                    acceleration_mss: a,
                    curvature_radm: 0.0,
                }
            })
            .collect();

        Trajectory::new(samples).unwrap()
    }

    #[test]
    fn test_follow_trajectory_closed_loop() {
        let mut sim = SimMech::new(params(), geometry()).unwrap();

        let mut dc = DriveCtrl::init(drive_ctrl::Params {
            module_offsets_m: MODULE_OFFSETS_M,
            module_angular_offsets_rad: OFFSETS,
            max_speed_ms: 3.5,
            max_angular_speed_rads: 6.0,
            min_module_speed_ms: 0.01,
            low_speed_policy: LowSpeedPolicy::StopDrive,
            driving_speed_damper: 3.5,
            angular_speed_damper: 6.0,
            field_relative_default: false,
            max_drive_temp_c: 80.0,
            max_steer_temp_c: 80.0,
            loc: LocMgrParams {
                source: PoseSourceKind::GyroOdometry,
                heading_inverted: true,
                heading_offset_deg: 0.0,
                heading_stale_limit_s: 0.1,
            },
        })
        .unwrap();

        let traj_ctrl = TrajCtrl::new(
            traj_ctrl::Params {
                x_gains: PidGains {
                    k_p: 1.0,
                    k_i: 0.0,
                    k_d: 0.0,
                },
                y_gains: PidGains {
                    k_p: 1.0,
                    k_i: 0.0,
                    k_d: 0.0,
                },
                theta_gains: PidGains {
                    k_p: 3.0,
                    k_i: 0.0,
                    k_d: 0.0,
                },
                theta_max_vel_rads: TAU,
                theta_max_accel_radss: TAU,
                position_tolerance_m: 0.05,
                angle_tolerance_deg: 2.0,
                angular_output_inverted: false,
            },
            dc.geometry().clone(),
        )
        .unwrap();
        let mut sched = Scheduler::new(TeleopTask::new(None), traj_ctrl);

        let traj = line_trajectory(1.0, 0.5, 1.0, 1.0);
        let final_pose = traj.final_sample().pose;
        sched.request(SourceRequest::Trajectory(traj, HeadingSource::FinalPose));

        let mut finished = false;
        for _ in 0..1000 {
            let time_s = sim.time_s();

            let demand = sched.step(&TaskInput {
                pose: dc.pose(),
                dt_s: DT_S,
                time_s,
            });

            let (dems, rpt) = dc
                .proc(&drive_ctrl::InputData {
                    demand,
                    sens: sim.sens_data(),
                    imu: Some(sim.imu_data()),
                    time_s,
                })
                .unwrap();
            assert!(!rpt.heading_degraded);

            assert_eq!(sim.send_demands(&dems), MechDemsResponse::DemsOk);
            sim.step(DT_S);

            if sched.traj_ctrl().mode() == TrajCtrlMode::Finished {
                finished = true;
                break;
            }
        }

        assert!(finished);

        // The estimate and the truth agree with the final pose
        let est = dc.pose().unwrap();
        let truth = sim.true_pose();
        assert!(est.distance_to(&final_pose) < 0.1);
        assert!(truth.distance_to(&final_pose) < 0.1);
        assert!((truth.heading_rad - final_pose.heading_rad).abs() < 5f64.to_radians());

        // Back under teleop with no command, demands stop being issued
        let demand = sched.step(&TaskInput {
            pose: dc.pose(),
            dt_s: DT_S,
            time_s: sim.time_s(),
        });
        assert_eq!(demand, DriveDemand::None);
    }
}
