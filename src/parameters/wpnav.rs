//! Waypoint Navigation Parameter Definitions
//!
//! Defines the navigation parameter block.
//!
//! # Parameters
//!
//! - `WPNAV_SPEED` - Horizontal speed between waypoints in cm/s
//! - `WPNAV_RADIUS` - Waypoint arrival radius in cm
//! - `WPNAV_SPEED_UP` - Maximum climb rate in cm/s
//! - `WPNAV_LOIT_SPEED` - Maximum loiter correction speed in cm/s

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};
use crate::navigation::NavConfig;

/// Default horizontal speed between waypoints in cm/s
const DEFAULT_SPEED: f32 = 500.0;

/// Default waypoint arrival radius in cm
const DEFAULT_RADIUS: f32 = 200.0;

/// Default maximum climb rate in cm/s
const DEFAULT_SPEED_UP: f32 = 125.0;

/// Default maximum loiter correction speed in cm/s
const DEFAULT_LOIT_SPEED: f32 = 500.0;

/// Speed bounds in cm/s (horizontal and loiter)
const MIN_SPEED: f32 = 50.0;
const MAX_SPEED: f32 = 2000.0;

/// Radius bounds in cm
const MIN_RADIUS: f32 = 50.0;
const MAX_RADIUS: f32 = 1000.0;

/// Climb rate bounds in cm/s
const MIN_SPEED_UP: f32 = 30.0;
const MAX_SPEED_UP: f32 = 500.0;

/// Navigation parameters loaded from the parameter store
#[derive(Debug, Clone)]
pub struct WpNavParams {
    /// Horizontal speed between waypoints in cm/s
    pub wp_speed_cms: f32,
    /// Waypoint arrival radius in cm
    pub wp_radius_cm: f32,
    /// Maximum climb rate in cm/s
    pub climb_speed_cms: f32,
    /// Maximum loiter correction speed in cm/s
    pub loiter_speed_cms: f32,
}

impl Default for WpNavParams {
    fn default() -> Self {
        Self {
            wp_speed_cms: DEFAULT_SPEED,
            wp_radius_cm: DEFAULT_RADIUS,
            climb_speed_cms: DEFAULT_SPEED_UP,
            loiter_speed_cms: DEFAULT_LOIT_SPEED,
        }
    }
}

impl WpNavParams {
    /// Register navigation parameters with default values
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        store.register(
            "WPNAV_SPEED",
            ParamValue::Float(DEFAULT_SPEED),
            ParamFlags::empty(),
        )?;
        store.register(
            "WPNAV_RADIUS",
            ParamValue::Float(DEFAULT_RADIUS),
            ParamFlags::empty(),
        )?;
        store.register(
            "WPNAV_SPEED_UP",
            ParamValue::Float(DEFAULT_SPEED_UP),
            ParamFlags::empty(),
        )?;
        store.register(
            "WPNAV_LOIT_SPEED",
            ParamValue::Float(DEFAULT_LOIT_SPEED),
            ParamFlags::empty(),
        )?;
        Ok(())
    }

    fn read_clamped(store: &ParameterStore, name: &str, default: f32, min: f32, max: f32) -> f32 {
        match store.get(name) {
            Some(ParamValue::Float(v)) => v.clamp(min, max),
            Some(ParamValue::Int(v)) => (*v as f32).clamp(min, max),
            _ => default,
        }
    }

    /// Load navigation parameters from the store, clamping out-of-range
    /// values
    pub fn from_store(store: &ParameterStore) -> Self {
        Self {
            wp_speed_cms: Self::read_clamped(
                store,
                "WPNAV_SPEED",
                DEFAULT_SPEED,
                MIN_SPEED,
                MAX_SPEED,
            ),
            wp_radius_cm: Self::read_clamped(
                store,
                "WPNAV_RADIUS",
                DEFAULT_RADIUS,
                MIN_RADIUS,
                MAX_RADIUS,
            ),
            climb_speed_cms: Self::read_clamped(
                store,
                "WPNAV_SPEED_UP",
                DEFAULT_SPEED_UP,
                MIN_SPEED_UP,
                MAX_SPEED_UP,
            ),
            loiter_speed_cms: Self::read_clamped(
                store,
                "WPNAV_LOIT_SPEED",
                DEFAULT_LOIT_SPEED,
                MIN_SPEED,
                MAX_SPEED,
            ),
        }
    }

    /// Validate navigation parameters
    pub fn is_valid(&self) -> bool {
        if self.wp_speed_cms < MIN_SPEED || self.wp_speed_cms > MAX_SPEED {
            return false;
        }
        if self.wp_radius_cm < MIN_RADIUS || self.wp_radius_cm > MAX_RADIUS {
            return false;
        }
        if self.climb_speed_cms < MIN_SPEED_UP || self.climb_speed_cms > MAX_SPEED_UP {
            return false;
        }
        if self.loiter_speed_cms < MIN_SPEED || self.loiter_speed_cms > MAX_SPEED {
            return false;
        }
        true
    }

    /// Apply these parameters to a navigation configuration
    pub fn apply(&self, config: &mut NavConfig) {
        config.wp_speed_cms = self.wp_speed_cms;
        config.wp_radius_cm = self.wp_radius_cm;
        config.climb_speed_cms = self.climb_speed_cms;
        config.loiter_speed_cms = self.loiter_speed_cms;
    }
}
