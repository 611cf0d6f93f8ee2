//! Navigation configuration and telemetry types.

use nalgebra::Vector2;

/// Cascade limits and navigation tuning.
///
/// Every stage of the cascade clamps its output against one of these
/// limits, so commands stay bounded for any input magnitude. Defaults
/// suit a mid-size multirotor.
#[derive(Debug, Clone)]
pub struct NavConfig {
    /// Maximum velocity the loiter position controller will request (cm/s).
    /// Should be 1.5 to 2 times the pilot input's full-stick velocity.
    pub loiter_speed_cms: f32,
    /// Maximum acceleration the position controller asks of the velocity
    /// controller (cm/s²); defines the velocity-vs-distance curve.
    pub loiter_pos_accel_cmss: f32,
    /// Maximum acceleration the velocity controller asks of the
    /// acceleration-to-angle stage (cm/s²); roughly the acceleration a
    /// full lean produces.
    pub loiter_vel_accel_cmss: f32,
    /// Maximum distance the loiter target may sit from the current
    /// position (cm), applied when seeding from motion and when pilot
    /// input drags the target.
    pub loiter_overshoot_cm: f32,
    /// Horizontal speed between waypoints (cm/s).
    pub wp_speed_cms: f32,
    /// Arrival radius around the destination (cm).
    pub wp_radius_cm: f32,
    /// Maximum climb rate for the caller's altitude controller (cm/s).
    pub climb_speed_cms: f32,
    /// Maximum distance the commanded track point may lead the vehicle's
    /// projection onto the track (cm). Smaller values pull the vehicle
    /// back onto the line harder after lateral drift.
    pub track_leash_cm: f32,
    /// Maximum altitude error on the track (cm); sets the vertical
    /// weighting so altitude and horizontal error contribute comparably.
    pub alt_leash_cm: f32,
    /// Default lean angle limit (centi-degrees).
    pub lean_angle_max_cd: i32,
    /// Updates with a measured `dt` at or above this many seconds skip
    /// integration and reset the integrators (missed-cycle guard).
    pub dt_max_s: f32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            loiter_speed_cms: 500.0,
            loiter_pos_accel_cmss: 250.0,
            loiter_vel_accel_cmss: 800.0,
            loiter_overshoot_cm: 531.0,
            wp_speed_cms: 500.0,
            wp_radius_cm: 200.0,
            climb_speed_cms: 125.0,
            track_leash_cm: 531.25,
            alt_leash_cm: 100.0,
            lean_angle_max_cd: 4500,
            dt_max_s: 1.0,
        }
    }
}

/// Side-channel diagnostics from the most recent cascade run.
///
/// These mirror the cascade's intermediate products for logging and
/// tuning; they have no control significance.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavTelemetry {
    /// Horizontal distance error, target minus current (cm).
    pub dist_error: Vector2<f32>,
    /// Velocity requested by the position stage (cm/s).
    pub desired_vel: Vector2<f32>,
    /// Acceleration requested by the velocity stage (cm/s²).
    pub desired_accel: Vector2<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nav_config_defaults() {
        let config = NavConfig::default();
        assert!((config.loiter_speed_cms - 500.0).abs() < 0.001);
        assert!((config.loiter_pos_accel_cmss - 250.0).abs() < 0.001);
        assert!((config.loiter_vel_accel_cmss - 800.0).abs() < 0.001);
        assert!((config.wp_speed_cms - 500.0).abs() < 0.001);
        assert!((config.wp_radius_cm - 200.0).abs() < 0.001);
        assert!((config.climb_speed_cms - 125.0).abs() < 0.001);
        assert!((config.track_leash_cm - 531.25).abs() < 0.001);
        assert!((config.alt_leash_cm - 100.0).abs() < 0.001);
        assert_eq!(config.lean_angle_max_cd, 4500);
        assert!((config.dt_max_s - 1.0).abs() < 0.001);
    }

    #[test]
    fn telemetry_defaults_to_zero() {
        let telem = NavTelemetry::default();
        assert_eq!(telem.dist_error, Vector2::zeros());
        assert_eq!(telem.desired_vel, Vector2::zeros());
        assert_eq!(telem.desired_accel, Vector2::zeros());
    }
}
