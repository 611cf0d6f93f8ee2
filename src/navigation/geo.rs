//! Navigation geometry utilities.
//!
//! Pure functions shared by the loiter and waypoint controllers: bearing
//! and horizontal distance between points, the stopping-point projection,
//! and the per-cycle yaw frame used to rotate between the earth
//! north/east axes and the vehicle's forward/right axes.

use libm::{atan2f, cosf, sinf, sqrtf};
use nalgebra::Vector3;

use crate::RAD_TO_CD;

/// Square root that returns 0 for non-positive inputs.
///
/// Cascade intermediate values can go slightly negative from float
/// cancellation (e.g. `len² - projection²`); those must read as zero,
/// not NaN.
pub fn safe_sqrt(value: f32) -> f32 {
    if value > 0.0 {
        sqrtf(value)
    } else {
        0.0
    }
}

/// Horizontal (north/east plane) distance between two positions in cm.
pub fn horizontal_distance(a: &Vector3<f32>, b: &Vector3<f32>) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    sqrtf(dx * dx + dy * dy)
}

/// Wraps an angle in centi-degrees into the 0..36000 range.
pub fn wrap_360_cd(angle_cd: f32) -> f32 {
    let mut a = angle_cd % 36000.0;
    if a < 0.0 {
        a += 36000.0;
    }
    a
}

/// Bearing from `origin` to `destination` in centi-degrees (0..36000),
/// measured clockwise from north using horizontal components only.
///
/// Coincident points return 0.
pub fn bearing_cd(origin: &Vector3<f32>, destination: &Vector3<f32>) -> f32 {
    let d_north = destination.x - origin.x;
    let d_east = destination.y - origin.y;
    if d_north == 0.0 && d_east == 0.0 {
        return 0.0;
    }
    wrap_360_cd(atan2f(d_east, d_north) * RAD_TO_CD)
}

/// Projects where the vehicle would stop if it decelerated from
/// `velocity` at `accel_cmss`.
///
/// Below the crossover speed `accel_cmss / kp` the position controller's
/// proportional response dominates and the projection is `velocity / kp`;
/// above it the stopping distance is the linear-region offset plus the
/// kinematic `v² / (2·a)`, applied along the horizontal velocity
/// direction. Altitude passes through unchanged. A non-positive `kp`
/// returns the input position.
pub fn project_stopping_point(
    position: &Vector3<f32>,
    velocity: &Vector3<f32>,
    kp: f32,
    accel_cmss: f32,
) -> Vector3<f32> {
    let mut target = *position;
    if kp <= 0.0 || accel_cmss <= 0.0 {
        return target;
    }

    let vel_total = sqrtf(velocity.x * velocity.x + velocity.y * velocity.y);
    let linear_velocity = accel_cmss / kp;

    if vel_total < linear_velocity {
        target.x += velocity.x / kp;
        target.y += velocity.y / kp;
    } else {
        let linear_distance = accel_cmss / (2.0 * kp * kp);
        let stopping_dist = linear_distance + (vel_total * vel_total) / (2.0 * accel_cmss);
        target.x += stopping_dist * velocity.x / vel_total;
        target.y += stopping_dist * velocity.y / vel_total;
    }
    target
}

/// Per-cycle trigonometric frame for earth ↔ body rotations.
///
/// Caches the cosine and sine of the current yaw and the cosine of the
/// current roll. The caller must rebuild this every control cycle from
/// the current attitude; the cascade has no way to detect a stale frame.
#[derive(Debug, Clone, Copy)]
pub struct YawFrame {
    cos_yaw: f32,
    sin_yaw: f32,
    cos_roll: f32,
}

impl YawFrame {
    /// Builds a frame from already-computed trig values.
    pub fn new(cos_yaw: f32, sin_yaw: f32, cos_roll: f32) -> Self {
        Self {
            cos_yaw,
            sin_yaw,
            cos_roll,
        }
    }

    /// Builds a frame from yaw and roll angles in radians.
    pub fn from_angles(yaw_rad: f32, roll_rad: f32) -> Self {
        Self {
            cos_yaw: cosf(yaw_rad),
            sin_yaw: sinf(yaw_rad),
            cos_roll: cosf(roll_rad),
        }
    }

    /// Rotates a north/east pair into body forward/right.
    pub fn earth_to_body(&self, north: f32, east: f32) -> (f32, f32) {
        let forward = north * self.cos_yaw + east * self.sin_yaw;
        let right = -north * self.sin_yaw + east * self.cos_yaw;
        (forward, right)
    }

    /// Rotates a body forward/right pair into north/east.
    pub fn body_to_earth(&self, forward: f32, right: f32) -> (f32, f32) {
        let north = forward * self.cos_yaw - right * self.sin_yaw;
        let east = forward * self.sin_yaw + right * self.cos_yaw;
        (north, east)
    }

    /// Cosine of the current roll, used to keep pitch authority constant
    /// as the vehicle banks.
    pub fn cos_roll(&self) -> f32 {
        self.cos_roll
    }
}

impl Default for YawFrame {
    /// Level vehicle facing north.
    fn default() -> Self {
        Self {
            cos_yaw: 1.0,
            sin_yaw: 0.0,
            cos_roll: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 0.5; // centi-degrees for bearing tests

    #[test]
    fn bearing_due_north_is_zero() {
        let origin = Vector3::zeros();
        let dest = Vector3::new(1000.0, 0.0, 0.0);
        assert!(bearing_cd(&origin, &dest).abs() < EPSILON);
    }

    #[test]
    fn bearing_due_east_is_9000() {
        let origin = Vector3::zeros();
        let dest = Vector3::new(0.0, 1000.0, 0.0);
        assert!((bearing_cd(&origin, &dest) - 9000.0).abs() < EPSILON);
    }

    #[test]
    fn bearing_due_south_is_18000() {
        let origin = Vector3::zeros();
        let dest = Vector3::new(-1000.0, 0.0, 0.0);
        assert!((bearing_cd(&origin, &dest) - 18000.0).abs() < EPSILON);
    }

    #[test]
    fn bearing_due_west_is_27000() {
        let origin = Vector3::zeros();
        let dest = Vector3::new(0.0, -1000.0, 0.0);
        assert!((bearing_cd(&origin, &dest) - 27000.0).abs() < EPSILON);
    }

    #[test]
    fn bearing_reversal_is_reciprocal() {
        let a = Vector3::new(120.0, -340.0, 0.0);
        let b = Vector3::new(-560.0, 780.0, 0.0);
        let fwd = bearing_cd(&a, &b);
        let rev = bearing_cd(&b, &a);
        let diff = wrap_360_cd(rev - fwd);
        assert!((diff - 18000.0).abs() < EPSILON);
    }

    #[test]
    fn bearing_ignores_altitude() {
        let origin = Vector3::new(0.0, 0.0, 500.0);
        let dest = Vector3::new(1000.0, 0.0, -2000.0);
        assert!(bearing_cd(&origin, &dest).abs() < EPSILON);
    }

    #[test]
    fn bearing_of_coincident_points_is_zero() {
        let p = Vector3::new(42.0, 42.0, 42.0);
        assert_eq!(bearing_cd(&p, &p), 0.0);
    }

    #[test]
    fn wrap_360_cd_handles_negative() {
        assert!((wrap_360_cd(-9000.0) - 27000.0).abs() < 0.001);
        assert!((wrap_360_cd(37000.0) - 1000.0).abs() < 0.001);
    }

    #[test]
    fn safe_sqrt_of_negative_is_zero() {
        assert_eq!(safe_sqrt(-1.0), 0.0);
        assert_eq!(safe_sqrt(0.0), 0.0);
        assert!((safe_sqrt(4.0) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn stopping_point_at_rest_is_position() {
        let pos = Vector3::new(100.0, 200.0, 300.0);
        let stop = project_stopping_point(&pos, &Vector3::zeros(), 1.0, 250.0);
        assert_eq!(stop, pos);
    }

    #[test]
    fn stopping_point_lies_along_velocity() {
        let pos = Vector3::new(0.0, 0.0, 500.0);
        let vel = Vector3::new(300.0, 400.0, 0.0); // 500 cm/s at 53°
        let stop = project_stopping_point(&pos, &vel, 1.0, 250.0);

        // further along the velocity direction
        assert!(stop.x > pos.x);
        assert!(stop.y > pos.y);
        // direction preserved: x/y ratio matches velocity
        assert!((stop.x / stop.y - 300.0 / 400.0).abs() < 1e-4);
        // altitude untouched
        assert_eq!(stop.z, 500.0);
    }

    #[test]
    fn stopping_point_linear_region() {
        // below accel/kp the projection is velocity/kp
        let pos = Vector3::zeros();
        let vel = Vector3::new(100.0, 0.0, 0.0);
        let stop = project_stopping_point(&pos, &vel, 1.0, 250.0);
        assert!((stop.x - 100.0).abs() < 1e-3);
    }

    #[test]
    fn stopping_point_sqrt_region() {
        // above accel/kp: d0 + v²/(2a) = 125 + 500²/500 = 625
        let pos = Vector3::zeros();
        let vel = Vector3::new(500.0, 0.0, 0.0);
        let stop = project_stopping_point(&pos, &vel, 1.0, 250.0);
        assert!((stop.x - 625.0).abs() < 0.1);
    }

    #[test]
    fn stopping_point_degenerate_gain_passes_through() {
        let pos = Vector3::new(1.0, 2.0, 3.0);
        let vel = Vector3::new(100.0, 0.0, 0.0);
        assert_eq!(project_stopping_point(&pos, &vel, 0.0, 250.0), pos);
    }

    #[test]
    fn yaw_frame_identity_facing_north() {
        let frame = YawFrame::default();
        let (fwd, right) = frame.earth_to_body(10.0, 5.0);
        assert!((fwd - 10.0).abs() < 1e-6);
        assert!((right - 5.0).abs() < 1e-6);
    }

    #[test]
    fn yaw_frame_facing_east() {
        let frame = YawFrame::from_angles(FRAC_PI_2, 0.0);
        // moving north reads as leftward (negative right) for an
        // east-facing vehicle
        let (fwd, right) = frame.earth_to_body(10.0, 0.0);
        assert!(fwd.abs() < 1e-5);
        assert!((right + 10.0).abs() < 1e-5);
    }

    #[test]
    fn yaw_frame_roundtrip() {
        let frame = YawFrame::from_angles(0.7, 0.1);
        let (fwd, right) = frame.earth_to_body(12.0, -34.0);
        let (north, east) = frame.body_to_earth(fwd, right);
        assert!((north - 12.0).abs() < 1e-4);
        assert!((east + 34.0).abs() < 1e-4);
    }
}
