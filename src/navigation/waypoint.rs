//! Waypoint/track-following controller.
//!
//! Advances a target point along a fixed origin→destination segment as a
//! function of commanded speed and elapsed time, corrects for lateral
//! and vertical track error, and reuses the loiter cascade for the
//! actual attitude output.
//!
//! Altitude is folded into the track with a vertical scale factor so a
//! given altitude error weighs comparably to a horizontal error of the
//! respective leash length.

use libm::sqrtf;
use nalgebra::Vector3;

use crate::control::{PosPi, RatePid};
use crate::traits::InertialNav;

use super::geo::{self, safe_sqrt, YawFrame};
use super::loiter::LoiterController;
use super::types::{NavConfig, NavTelemetry};

/// Track-following controller over the shared loiter cascade.
///
/// Until a destination is set, the track is zero-length and the
/// controller holds the home point.
pub struct WaypointController<P: PosPi, R: RatePid> {
    loiter: LoiterController<P, R>,

    /// Start of the current leg in cm from home.
    origin: Vector3<f32>,
    /// End of the current leg in cm from home.
    destination: Vector3<f32>,
    /// Unit direction of the leg; `z` is in vertically-scaled units.
    /// Zero for a zero-length leg.
    track_unit: Vector3<f32>,
    /// Leg length over the vertically-scaled displacement, in cm.
    track_length: f32,
    /// Desired distance travelled along the leg, in cm. Monotonic within
    /// one leg.
    track_desired: f32,
    /// Vertical weighting applied to `z` before projecting onto the leg.
    vert_track_scale: f32,

    reached_destination: bool,
}

impl<P: PosPi, R: RatePid> WaypointController<P, R> {
    /// Wraps a loiter controller for track following.
    pub fn new(loiter: LoiterController<P, R>) -> Self {
        Self {
            loiter,
            origin: Vector3::zeros(),
            destination: Vector3::zeros(),
            track_unit: Vector3::zeros(),
            track_length: 0.0,
            track_desired: 0.0,
            vert_track_scale: 1.0,
            reached_destination: false,
        }
    }

    /// Starts a new leg from the current loiter target to `destination`.
    pub fn set_destination(&mut self, destination: Vector3<f32>) {
        let origin = self.loiter.target();
        self.set_origin_and_destination(origin, destination);
    }

    /// Starts a new leg between two explicit points, in cm from home.
    ///
    /// Replaces any previous leg atomically: the unit direction, track
    /// length and vertical scale are recomputed, progress along the leg
    /// restarts at zero, and the reached flag clears. A zero-length leg
    /// degrades to holding the destination.
    pub fn set_origin_and_destination(
        &mut self,
        origin: Vector3<f32>,
        destination: Vector3<f32>,
    ) {
        self.origin = origin;
        self.destination = destination;

        let config = self.loiter.config();
        self.vert_track_scale = if config.alt_leash_cm > 0.0 {
            config.track_leash_cm / config.alt_leash_cm
        } else {
            1.0
        };

        let mut pos_delta = destination - origin;
        pos_delta.z *= self.vert_track_scale;
        self.track_length = sqrtf(
            pos_delta.x * pos_delta.x + pos_delta.y * pos_delta.y + pos_delta.z * pos_delta.z,
        );
        self.track_unit = if self.track_length > 0.0 {
            pos_delta / self.track_length
        } else {
            Vector3::zeros()
        };

        self.track_desired = 0.0;
        self.reached_destination = false;
        self.loiter.set_target(origin);
    }

    /// Moves the commanded target along the leg by `velocity_cms` over
    /// `dt` seconds, with track-error correction.
    ///
    /// The commanded point is not allowed to lead the vehicle's
    /// projection onto the leg by more than the cross-track leash allows:
    /// the available lead shrinks as `sqrt(leash² − track_error²)`, so a
    /// vehicle that has drifted off the line (or fallen behind) pulls the
    /// target back toward itself and converges onto the track instead of
    /// cutting straight at a distant point. Progress is clamped to the
    /// leg and never moves backwards.
    pub fn advance_along_track(
        &mut self,
        inav: &impl InertialNav,
        velocity_cms: f32,
        dt: f32,
    ) {
        if self.track_length <= 0.0 {
            self.loiter.set_target(self.destination);
            self.check_arrival(inav);
            return;
        }

        let curr = inav.position();
        let mut curr_delta = curr - self.origin;
        curr_delta.z *= self.vert_track_scale;

        let track_covered = curr_delta.dot(&self.track_unit);
        let curr_delta_length = sqrtf(
            curr_delta.x * curr_delta.x
                + curr_delta.y * curr_delta.y
                + curr_delta.z * curr_delta.z,
        );
        let track_error =
            safe_sqrt(curr_delta_length * curr_delta_length - track_covered * track_covered);

        let leash = self.loiter.config().track_leash_cm;
        let track_extra_max = safe_sqrt(leash * leash - track_error * track_error);
        let track_desired_max = track_covered + track_extra_max;

        let mut track_desired_temp = self.track_desired + velocity_cms * dt;
        if track_desired_temp > track_desired_max {
            track_desired_temp = track_desired_max;
        }
        track_desired_temp = track_desired_temp.clamp(0.0, self.track_length);
        self.track_desired = self.track_desired.max(track_desired_temp);

        let target = Vector3::new(
            self.origin.x + self.track_unit.x * self.track_desired,
            self.origin.y + self.track_unit.y * self.track_desired,
            self.origin.z + (self.track_unit.z * self.track_desired) / self.vert_track_scale,
        );
        self.loiter.set_target(target);

        self.check_arrival(inav);
    }

    /// Runs one waypoint navigation cycle over `dt` seconds: advances the
    /// track target at the configured horizontal speed, then runs the
    /// shared cascade. Same `dt` discipline as the loiter controller.
    pub fn update(&mut self, inav: &impl InertialNav, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        if dt >= self.loiter.config().dt_max_s {
            self.loiter.reset_integrators();
            return;
        }

        let speed = self.loiter.config().wp_speed_cms;
        self.advance_along_track(inav, speed, dt);
        self.loiter.run_cascade(inav, dt);
    }

    /// Latches the reached flag once the live horizontal distance to the
    /// destination is inside the arrival radius. Crosswind drift that
    /// satisfies the radius counts even if track progress is incomplete.
    fn check_arrival(&mut self, inav: &impl InertialNav) {
        if !self.reached_destination
            && self.distance_to_destination(inav) <= self.loiter.config().wp_radius_cm
        {
            self.reached_destination = true;
        }
    }

    /// Destination of the current leg in cm from home.
    pub fn destination(&self) -> Vector3<f32> {
        self.destination
    }

    /// True once the vehicle has come within the arrival radius of the
    /// destination. Resets only when a new destination is set.
    pub fn reached_destination(&self) -> bool {
        self.reached_destination
    }

    /// Horizontal distance from the live position estimate to the
    /// destination, in cm.
    pub fn distance_to_destination(&self, inav: &impl InertialNav) -> f32 {
        geo::horizontal_distance(&inav.position(), &self.destination)
    }

    /// Bearing from the live position estimate to the destination, in
    /// centi-degrees.
    pub fn bearing_to_destination_cd(&self, inav: &impl InertialNav) -> f32 {
        geo::bearing_cd(&inav.position(), &self.destination)
    }

    /// Length of the current leg in (vertically-scaled) cm.
    pub fn track_length_cm(&self) -> f32 {
        self.track_length
    }

    /// Progress of the commanded point along the leg in cm.
    pub fn track_desired_cm(&self) -> f32 {
        self.track_desired
    }

    /// Sets the horizontal speed for track following (cm/s).
    pub fn set_horizontal_velocity(&mut self, velocity_cms: f32) {
        self.loiter.config_mut().wp_speed_cms = velocity_cms.max(0.0);
    }

    /// Sets the maximum climb rate the caller's altitude controller
    /// should honor (cm/s).
    pub fn set_climb_velocity(&mut self, velocity_cms: f32) {
        self.loiter.config_mut().climb_speed_cms = velocity_cms.max(0.0);
    }

    /// Arrival radius around the destination in cm.
    pub fn waypoint_radius_cm(&self) -> f32 {
        self.loiter.config().wp_radius_cm
    }

    /// Desired roll in centi-degrees, for the attitude stabilizer.
    pub fn desired_roll_cd(&self) -> i32 {
        self.loiter.desired_roll_cd()
    }

    /// Desired pitch in centi-degrees, for the attitude stabilizer.
    pub fn desired_pitch_cd(&self) -> i32 {
        self.loiter.desired_pitch_cd()
    }

    /// Desired altitude in cm above home, for the throttle controller.
    pub fn desired_alt_cm(&self) -> f32 {
        self.loiter.desired_alt_cm()
    }

    /// Installs the trig frame for this cycle; must be refreshed by the
    /// caller every cycle.
    pub fn set_yaw_frame(&mut self, frame: YawFrame) {
        self.loiter.set_yaw_frame(frame);
    }

    /// Clears integrators in the underlying cascade. Call on mode entry.
    pub fn reset_integrators(&mut self) {
        self.loiter.reset_integrators();
    }

    /// Diagnostics from the most recent cascade run.
    pub fn telemetry(&self) -> &NavTelemetry {
        self.loiter.telemetry()
    }

    /// Navigation configuration.
    pub fn config(&self) -> &NavConfig {
        self.loiter.config()
    }

    /// The underlying loiter controller, for callers that alternate
    /// between hold and track modes on one instance.
    pub fn loiter(&self) -> &LoiterController<P, R> {
        &self.loiter
    }

    /// Mutable access to the underlying loiter controller.
    pub fn loiter_mut(&mut self) -> &mut LoiterController<P, R> {
        &mut self.loiter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{Pi, Pid};
    use crate::traits::MockInertialNav;

    const DT: f32 = 0.1;

    fn make_controller() -> WaypointController<Pi, Pid> {
        WaypointController::new(LoiterController::new(
            NavConfig::default(),
            Pi::new(1.0, 0.0, 100.0),
            Pi::new(1.0, 0.0, 100.0),
            Pid::new(0.5, 0.1, 0.0, 400.0),
            Pid::new(0.5, 0.1, 0.0, 400.0),
        ))
    }

    #[test]
    fn set_destination_measures_from_prior_target() {
        let mut wpnav = make_controller();
        let inav = MockInertialNav::new();
        wpnav.set_destination(Vector3::new(600.0, 800.0, 0.0));

        // prior target was home, so the live distance matches the leg
        assert!((wpnav.distance_to_destination(&inav) - 1000.0).abs() < 0.01);
        assert!(!wpnav.reached_destination());
    }

    #[test]
    fn arrival_latches_at_radius_entry() {
        let mut wpnav = make_controller();
        let inav = MockInertialNav::new();
        wpnav.set_origin_and_destination(Vector3::zeros(), Vector3::new(1000.0, 0.0, 0.0));

        let mut reached_at = None;
        let mut x = 0.0;
        while x <= 950.0 {
            inav.set_position(Vector3::new(x, 0.0, 0.0));
            wpnav.update(&inav, DT);
            if wpnav.reached_destination() && reached_at.is_none() {
                reached_at = Some(x);
            }
            x += 50.0;
        }

        // 200 cm radius around x=1000 is first entered at x=800
        assert_eq!(reached_at, Some(800.0));
    }

    #[test]
    fn reached_flag_is_monotonic_until_new_destination() {
        let mut wpnav = make_controller();
        let inav = MockInertialNav::new();
        wpnav.set_origin_and_destination(Vector3::zeros(), Vector3::new(100.0, 0.0, 0.0));

        inav.set_position(Vector3::new(100.0, 0.0, 0.0));
        wpnav.update(&inav, DT);
        assert!(wpnav.reached_destination());

        // drifting back out does not clear the flag
        inav.set_position(Vector3::new(-1000.0, 0.0, 0.0));
        wpnav.update(&inav, DT);
        assert!(wpnav.reached_destination());

        // a new destination does
        wpnav.set_destination(Vector3::new(5000.0, 0.0, 0.0));
        assert!(!wpnav.reached_destination());
    }

    #[test]
    fn track_progress_clamps_at_track_length() {
        let mut wpnav = make_controller();
        let inav = MockInertialNav::new();
        // short horizontal leg, inside the cross-track leash
        wpnav.set_origin_and_destination(Vector3::zeros(), Vector3::new(400.0, 0.0, 0.0));

        for _ in 0..100 {
            wpnav.advance_along_track(&inav, 500.0, DT);
            assert!(wpnav.track_desired_cm() <= wpnav.track_length_cm() + 1e-3);
        }

        assert!((wpnav.track_desired_cm() - wpnav.track_length_cm()).abs() < 1e-3);
        // once progress saturates, the commanded point is the destination
        let target = wpnav.loiter().target();
        assert!((target.x - 400.0).abs() < 1e-3);
        assert!(target.y.abs() < 1e-3);
    }

    #[test]
    fn track_error_throttles_target_lead() {
        let mut wpnav = make_controller();
        let inav = MockInertialNav::new();
        wpnav.set_origin_and_destination(Vector3::zeros(), Vector3::new(5000.0, 0.0, 0.0));

        // vehicle sitting at the origin: the commanded point may lead by
        // at most the full leash
        for _ in 0..200 {
            wpnav.advance_along_track(&inav, 500.0, DT);
        }
        let leash = wpnav.config().track_leash_cm;
        assert!(wpnav.track_desired_cm() <= leash + 1e-3);

        // far off the line the lead collapses entirely
        let mut drifted = make_controller();
        drifted.set_origin_and_destination(Vector3::zeros(), Vector3::new(5000.0, 0.0, 0.0));
        inav.set_position(Vector3::new(0.0, 2.0 * leash, 0.0));
        for _ in 0..200 {
            drifted.advance_along_track(&inav, 500.0, DT);
        }
        assert!(drifted.track_desired_cm() < 1e-3);
    }

    #[test]
    fn zero_length_track_holds_destination() {
        let mut wpnav = make_controller();
        let inav = MockInertialNav::new();
        let point = Vector3::new(250.0, -130.0, 400.0);
        inav.set_position(point);
        wpnav.set_origin_and_destination(point, point);

        for _ in 0..10 {
            wpnav.update(&inav, DT);
        }

        assert_eq!(wpnav.loiter().target(), point);
        assert!(wpnav.reached_destination());
        assert!(wpnav.desired_roll_cd().abs() <= 4500);
    }

    #[test]
    fn climbing_leg_interpolates_altitude() {
        let mut wpnav = make_controller();
        let inav = MockInertialNav::new();
        // short leg so progress can saturate with the vehicle at origin
        wpnav.set_origin_and_destination(
            Vector3::new(0.0, 0.0, 100.0),
            Vector3::new(300.0, 0.0, 150.0),
        );
        inav.set_position(Vector3::new(0.0, 0.0, 100.0));

        for _ in 0..100 {
            wpnav.update(&inav, DT);
        }

        let target = wpnav.loiter().target();
        assert!((target.x - 300.0).abs() < 0.1);
        assert!((target.z - 150.0).abs() < 0.1);
        assert!((wpnav.desired_alt_cm() - 150.0).abs() < 0.1);
    }

    #[test]
    fn zero_dt_update_is_a_no_op() {
        let mut wpnav = make_controller();
        let inav = MockInertialNav::new();
        wpnav.set_origin_and_destination(Vector3::zeros(), Vector3::new(1000.0, 0.0, 0.0));
        wpnav.update(&inav, DT);

        let roll = wpnav.desired_roll_cd();
        let pitch = wpnav.desired_pitch_cd();
        let progress = wpnav.track_desired_cm();

        wpnav.update(&inav, 0.0);
        wpnav.update(&inav, -0.5);

        assert_eq!(wpnav.desired_roll_cd(), roll);
        assert_eq!(wpnav.desired_pitch_cd(), pitch);
        assert_eq!(wpnav.track_desired_cm(), progress);
    }

    #[test]
    fn speed_setter_rejects_negative_values() {
        let mut wpnav = make_controller();
        wpnav.set_horizontal_velocity(-100.0);
        assert_eq!(wpnav.config().wp_speed_cms, 0.0);

        wpnav.set_horizontal_velocity(750.0);
        assert!((wpnav.config().wp_speed_cms - 750.0).abs() < 0.001);
    }

    #[test]
    fn bearing_to_destination_tracks_live_position() {
        let mut wpnav = make_controller();
        let inav = MockInertialNav::new();
        wpnav.set_origin_and_destination(Vector3::zeros(), Vector3::new(0.0, 500.0, 0.0));

        assert!((wpnav.bearing_to_destination_cd(&inav) - 9000.0).abs() < 0.5);

        inav.set_position(Vector3::new(0.0, 1000.0, 0.0));
        assert!((wpnav.bearing_to_destination_cd(&inav) - 27000.0).abs() < 0.5);
    }
}
