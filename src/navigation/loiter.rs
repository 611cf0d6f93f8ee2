//! Loiter (station-keeping) controller.
//!
//! Holds a 3-D target position against disturbances by running the full
//! position→velocity→acceleration→lean-angle cascade. Each stage clamps
//! its output, so the next stage's input range is bounded regardless of
//! how large the upstream error is.
//!
//! The controller is driven by the caller at a nominal 10 Hz; `dt` is the
//! measured elapsed time between calls, not a constant, so late or missed
//! cycles integrate correctly.

use libm::sqrtf;
use nalgebra::{Vector2, Vector3};

use crate::control::{PosPi, RatePid};
use crate::traits::InertialNav;
use crate::{GRAVITY_CMSS, RAD_TO_CD};

use super::geo::{self, safe_sqrt, YawFrame};
use super::types::{NavConfig, NavTelemetry};

/// Full-stick pilot input in centi-degrees, used to scale stick
/// deflection to target velocity.
const PILOT_INPUT_FULL_SCALE_CD: f32 = 4500.0;

/// Upper bound accepted by [`LoiterController::set_angle_limit`].
const ANGLE_LIMIT_MAX_CD: i32 = 9000;

/// Station-keeping controller over injected PI/PID elements.
///
/// One PI element per horizontal axis turns position error into a
/// velocity command; one PID element per axis turns velocity error into
/// an acceleration command; the final stage rotates acceleration into the
/// body frame and converts it to lean angles.
pub struct LoiterController<P: PosPi, R: RatePid> {
    config: NavConfig,

    pi_pos_north: P,
    pi_pos_east: P,
    pid_rate_north: R,
    pid_rate_east: R,

    /// Hold target in cm from home; `z` doubles as the desired altitude.
    target: Vector3<f32>,
    /// Target drag velocity accumulated from pilot input (cm/s).
    target_vel: Vector2<f32>,
    /// Previous cycle's desired velocity, for the feed-forward term.
    vel_last: Vector2<f32>,

    /// Pending pilot stick input as body-frame velocities (cm/s).
    pilot_vel_forward_cms: f32,
    pilot_vel_right_cms: f32,

    frame: YawFrame,
    lean_angle_max_cd: i32,

    desired_roll_cd: i32,
    desired_pitch_cd: i32,
    telemetry: NavTelemetry,
}

impl<P: PosPi, R: RatePid> LoiterController<P, R> {
    /// Creates a loiter controller holding the home point.
    ///
    /// The PI elements serve the position loop (north, east) and the PID
    /// elements the velocity loop (north, east). Both axes should carry
    /// the same gains on a symmetric airframe.
    pub fn new(
        config: NavConfig,
        pi_pos_north: P,
        pi_pos_east: P,
        pid_rate_north: R,
        pid_rate_east: R,
    ) -> Self {
        let lean_angle_max_cd = config.lean_angle_max_cd;
        Self {
            config,
            pi_pos_north,
            pi_pos_east,
            pid_rate_north,
            pid_rate_east,
            target: Vector3::zeros(),
            target_vel: Vector2::zeros(),
            vel_last: Vector2::zeros(),
            pilot_vel_forward_cms: 0.0,
            pilot_vel_right_cms: 0.0,
            frame: YawFrame::default(),
            lean_angle_max_cd,
            desired_roll_cd: 0,
            desired_pitch_cd: 0,
            telemetry: NavTelemetry::default(),
        }
    }

    /// Sets a static hold point in cm from home. Any residual target
    /// drag velocity is discarded.
    pub fn set_target(&mut self, position: Vector3<f32>) {
        self.target = position;
        self.target_vel = Vector2::zeros();
    }

    /// Seeds the hold point from the current position and velocity.
    ///
    /// The target is placed at the projected stopping point so that
    /// entering loiter from motion does not create an instantaneous
    /// large position error; it is then clamped to the configured
    /// overshoot distance from the current position.
    pub fn set_target_from_motion(&mut self, position: Vector3<f32>, velocity: Vector3<f32>) {
        let mut target = geo::project_stopping_point(
            &position,
            &velocity,
            self.pi_pos_north.kp(),
            self.config.loiter_pos_accel_cmss,
        );

        let d_north = target.x - position.x;
        let d_east = target.y - position.y;
        let distance = sqrtf(d_north * d_north + d_east * d_east);
        if distance > self.config.loiter_overshoot_cm {
            target.x = position.x + self.config.loiter_overshoot_cm * d_north / distance;
            target.y = position.y + self.config.loiter_overshoot_cm * d_east / distance;
        }

        self.target = target;
        self.target_vel = Vector2::zeros();
    }

    /// Records pilot stick input to drag the hold point.
    ///
    /// `control_roll`/`control_pitch` are raw stick positions in
    /// centi-degrees (full deflection ±4500), scaled so full stick
    /// requests the position-loop speed limit. The input is held as
    /// forward/right velocity state until consumed by the next
    /// [`update`](Self::update).
    pub fn move_target(&mut self, control_roll: f32, control_pitch: f32, _dt: f32) {
        let scale = self.config.loiter_speed_cms / PILOT_INPUT_FULL_SCALE_CD;
        self.pilot_vel_forward_cms = -control_pitch * scale;
        self.pilot_vel_right_cms = control_roll * scale;
    }

    /// Runs the cascade once over `dt` seconds.
    ///
    /// A `dt` of zero or below is a no-op: no state changes, outputs
    /// keep their previous values. A `dt` at or beyond the configured
    /// maximum resets the integrators and skips the cycle, so a burst of
    /// missed cycles cannot apply one huge correction.
    pub fn update(&mut self, inav: &impl InertialNav, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        if dt >= self.config.dt_max_s {
            self.reset_integrators();
            return;
        }

        self.translate_pilot_inputs(inav, dt);
        self.position_to_velocity(inav, dt);
    }

    /// Clears the PI/PID integrators and the accumulated velocity
    /// history, so the next update behaves like a freshly constructed
    /// controller. Call on mode entry to avoid carrying windup across
    /// flight phases.
    pub fn reset_integrators(&mut self) {
        self.pi_pos_north.reset_integrator();
        self.pi_pos_east.reset_integrator();
        self.pid_rate_north.reset_integrator();
        self.pid_rate_east.reset_integrator();
        self.vel_last = Vector2::zeros();
        self.target_vel = Vector2::zeros();
    }

    /// Runs the shared cascade without pilot-input translation; the
    /// waypoint controller positions the target itself.
    pub(crate) fn run_cascade(&mut self, inav: &impl InertialNav, dt: f32) {
        self.position_to_velocity(inav, dt);
    }

    /// Consumes pilot stick state: rotates it into north/east, ramps the
    /// target drag velocity, moves the target, and keeps the target
    /// within the overshoot limit of the current position.
    fn translate_pilot_inputs(&mut self, inav: &impl InertialNav, nav_dt: f32) {
        let (adj_north, adj_east) = self
            .frame
            .body_to_earth(self.pilot_vel_forward_cms, self.pilot_vel_right_cms);

        self.target_vel.x += adj_north * nav_dt;
        self.target_vel.y += adj_east * nav_dt;

        let vel_total = sqrtf(
            self.target_vel.x * self.target_vel.x + self.target_vel.y * self.target_vel.y,
        );
        if vel_total > self.config.loiter_speed_cms {
            self.target_vel *= self.config.loiter_speed_cms / vel_total;
        }

        self.target.x += self.target_vel.x * nav_dt;
        self.target.y += self.target_vel.y * nav_dt;

        let curr = inav.position();
        let d_north = self.target.x - curr.x;
        let d_east = self.target.y - curr.y;
        let distance = sqrtf(d_north * d_north + d_east * d_east);
        if distance > self.config.loiter_overshoot_cm {
            self.target.x = curr.x + self.config.loiter_overshoot_cm * d_north / distance;
            self.target.y = curr.y + self.config.loiter_overshoot_cm * d_east / distance;
        }
    }

    /// Position stage: horizontal position error to desired velocity.
    ///
    /// Inside the linear region the PI elements' P term sets the
    /// velocity; beyond it the square-root curve
    /// `sqrt(2·a·(d − d_linear))` keeps the implied deceleration within
    /// the position-loop acceleration limit.
    fn position_to_velocity(&mut self, inav: &impl InertialNav, dt: f32) {
        let curr = inav.position();
        let dist_error = Vector2::new(self.target.x - curr.x, self.target.y - curr.y);
        self.telemetry.dist_error = dist_error;

        let kp = self.pi_pos_north.kp();
        let accel = self.config.loiter_pos_accel_cmss;
        let dist_error_total = sqrtf(dist_error.x * dist_error.x + dist_error.y * dist_error.y);

        let mut desired_vel = if kp > 0.0 {
            let linear_distance = accel / (2.0 * kp * kp);
            if dist_error_total > 2.0 * linear_distance {
                let vel_sqrt = safe_sqrt(2.0 * accel * (dist_error_total - linear_distance));
                Vector2::new(
                    vel_sqrt * dist_error.x / dist_error_total,
                    vel_sqrt * dist_error.y / dist_error_total,
                )
            } else {
                Vector2::new(
                    self.pi_pos_north.get_p(dist_error.x),
                    self.pi_pos_east.get_p(dist_error.y),
                )
            }
        } else {
            Vector2::zeros()
        };

        // pilot drag velocity rides on top of the position correction
        desired_vel += self.target_vel;

        // allow headroom above the loiter limit so pilot input stacked on
        // a correction is not truncated prematurely
        let vel_total = sqrtf(desired_vel.x * desired_vel.x + desired_vel.y * desired_vel.y);
        let vel_limit = 2.0 * self.config.loiter_speed_cms;
        if vel_total > vel_limit {
            desired_vel *= vel_limit / vel_total;
        }
        self.telemetry.desired_vel = desired_vel;

        self.velocity_to_acceleration(inav, desired_vel, dt);
    }

    /// Velocity stage: desired minus estimated velocity to desired
    /// acceleration, with a feed-forward term from the change in desired
    /// velocity.
    fn velocity_to_acceleration(
        &mut self,
        inav: &impl InertialNav,
        desired_vel: Vector2<f32>,
        dt: f32,
    ) {
        let curr_vel = inav.velocity();

        // dt > 0 is guaranteed by the update guard
        let mut desired_accel = (desired_vel - self.vel_last) / dt;
        self.vel_last = desired_vel;

        let vel_error = Vector2::new(desired_vel.x - curr_vel.x, desired_vel.y - curr_vel.y);
        desired_accel.x += self.pid_rate_north.update(vel_error.x, dt);
        desired_accel.y += self.pid_rate_east.update(vel_error.y, dt);

        let accel_total =
            sqrtf(desired_accel.x * desired_accel.x + desired_accel.y * desired_accel.y);
        if accel_total > self.config.loiter_vel_accel_cmss {
            desired_accel *= self.config.loiter_vel_accel_cmss / accel_total;
        }
        self.telemetry.desired_accel = desired_accel;

        self.acceleration_to_lean_angles(desired_accel.x, desired_accel.y);
    }

    /// Acceleration stage: north/east acceleration to clamped roll/pitch
    /// lean angles in centi-degrees.
    fn acceleration_to_lean_angles(&mut self, accel_north: f32, accel_east: f32) {
        let (accel_forward, accel_right) = self.frame.earth_to_body(accel_north, accel_east);

        let roll_cd = accel_right / GRAVITY_CMSS * RAD_TO_CD;
        let pitch_cd = -accel_forward / (GRAVITY_CMSS * self.frame.cos_roll()) * RAD_TO_CD;

        let limit = self.lean_angle_max_cd as f32;
        self.desired_roll_cd = constrain_angle_cd(roll_cd, limit);
        self.desired_pitch_cd = constrain_angle_cd(pitch_cd, limit);
    }

    /// Current hold target in cm from home.
    pub fn target(&self) -> Vector3<f32> {
        self.target
    }

    /// Desired roll in centi-degrees, for the attitude stabilizer.
    pub fn desired_roll_cd(&self) -> i32 {
        self.desired_roll_cd
    }

    /// Desired pitch in centi-degrees, for the attitude stabilizer.
    pub fn desired_pitch_cd(&self) -> i32 {
        self.desired_pitch_cd
    }

    /// Desired altitude in cm above home, for the throttle controller.
    pub fn desired_alt_cm(&self) -> f32 {
        self.target.z
    }

    /// Sets the desired altitude in cm above home.
    pub fn set_desired_alt(&mut self, alt_cm: f32) {
        self.target.z = alt_cm;
    }

    /// Installs the trig frame for this cycle. Must be refreshed by the
    /// caller every cycle from the current attitude.
    pub fn set_yaw_frame(&mut self, frame: YawFrame) {
        self.frame = frame;
    }

    /// Limits the maximum lean angle in centi-degrees.
    pub fn set_angle_limit(&mut self, lean_angle_cd: i32) {
        self.lean_angle_max_cd = lean_angle_cd.clamp(0, ANGLE_LIMIT_MAX_CD);
    }

    /// Restores the lean angle limit to the configured default.
    pub fn clear_angle_limit(&mut self) {
        self.lean_angle_max_cd = self.config.lean_angle_max_cd;
    }

    /// Current lean angle limit in centi-degrees.
    pub fn angle_limit_cd(&self) -> i32 {
        self.lean_angle_max_cd
    }

    /// Horizontal distance from the live position estimate to the
    /// target, in cm.
    pub fn distance_to_target(&self, inav: &impl InertialNav) -> f32 {
        geo::horizontal_distance(&inav.position(), &self.target)
    }

    /// Bearing from the live position estimate to the target, in
    /// centi-degrees.
    pub fn bearing_to_target_cd(&self, inav: &impl InertialNav) -> f32 {
        geo::bearing_cd(&inav.position(), &self.target)
    }

    /// Diagnostics from the most recent cascade run.
    pub fn telemetry(&self) -> &NavTelemetry {
        &self.telemetry
    }

    /// Navigation configuration.
    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut NavConfig {
        &mut self.config
    }
}

/// Clamps an angle command to the lean limit, mapping non-finite inputs
/// (degenerate roll frames) to level.
fn constrain_angle_cd(angle_cd: f32, limit_cd: f32) -> i32 {
    let angle = if angle_cd.is_finite() { angle_cd } else { 0.0 };
    angle.clamp(-limit_cd, limit_cd) as i32
}
