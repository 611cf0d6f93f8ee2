//! Inertial navigation estimator abstraction.
//!
//! The navigation controllers never own the estimator; they read it
//! through this narrow interface on every update and accessor call, so
//! distance/bearing queries always reflect the instant of the call.

use core::cell::Cell;

use nalgebra::Vector3;

/// Position/velocity estimate source for the navigation controllers.
///
/// Implementations must report both quantities in the same frame:
/// centimetres from the home point, `x` north, `y` east, `z` altitude
/// above home (positive up); velocity in cm/s.
pub trait InertialNav {
    /// Current position estimate in cm from home.
    fn position(&self) -> Vector3<f32>;

    /// Current velocity estimate in cm/s.
    fn velocity(&self) -> Vector3<f32>;
}

/// Mock estimator for testing with controllable state.
///
/// Setters take `&self` so a test can mutate the estimate between update
/// calls while the controller holds a shared reference.
///
/// # Example
///
/// ```
/// use copter_nav::traits::{InertialNav, MockInertialNav};
/// use nalgebra::Vector3;
///
/// let inav = MockInertialNav::new();
/// inav.set_position(Vector3::new(100.0, 0.0, 500.0));
/// assert_eq!(inav.position().x, 100.0);
/// ```
pub struct MockInertialNav {
    position: Cell<Vector3<f32>>,
    velocity: Cell<Vector3<f32>>,
}

impl Default for MockInertialNav {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInertialNav {
    /// Creates a mock estimator at the home point with zero velocity.
    pub fn new() -> Self {
        Self {
            position: Cell::new(Vector3::zeros()),
            velocity: Cell::new(Vector3::zeros()),
        }
    }

    /// Creates a mock estimator with the given initial state.
    pub fn with_state(position: Vector3<f32>, velocity: Vector3<f32>) -> Self {
        Self {
            position: Cell::new(position),
            velocity: Cell::new(velocity),
        }
    }

    /// Sets the reported position (cm from home).
    pub fn set_position(&self, position: Vector3<f32>) {
        self.position.set(position);
    }

    /// Sets the reported velocity (cm/s).
    pub fn set_velocity(&self, velocity: Vector3<f32>) {
        self.velocity.set(velocity);
    }
}

impl InertialNav for MockInertialNav {
    fn position(&self) -> Vector3<f32> {
        self.position.get()
    }

    fn velocity(&self) -> Vector3<f32> {
        self.velocity.get()
    }
}
