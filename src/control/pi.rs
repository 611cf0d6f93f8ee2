//! Proportional-integral element for the position loop.

use super::PosPi;

/// PI element with a clamped integrator.
///
/// The navigation position loop only consumes the P term directly (the
/// square-root velocity curve takes over outside the linear region), but
/// the integrator is kept so hosts can close slow steady-state errors
/// such as wind drift.
#[derive(Debug, Clone)]
pub struct Pi {
    kp: f32,
    ki: f32,
    integrator: f32,
    imax: f32,
}

impl Pi {
    /// Creates a PI element with the given gains and integrator limit.
    pub fn new(kp: f32, ki: f32, imax: f32) -> Self {
        Self {
            kp,
            ki,
            integrator: 0.0,
            imax,
        }
    }

    /// Accumulates the integrator over `dt` and returns the I term.
    pub fn get_i(&mut self, error: f32, dt: f32) -> f32 {
        if dt > 0.0 && self.ki != 0.0 {
            self.integrator += self.ki * error * dt;
            self.integrator = self.integrator.clamp(-self.imax, self.imax);
        }
        self.integrator
    }

    /// Combined P and I output for the given error over `dt`.
    pub fn get_pi(&mut self, error: f32, dt: f32) -> f32 {
        self.get_p(error) + self.get_i(error, dt)
    }
}

impl PosPi for Pi {
    fn kp(&self) -> f32 {
        self.kp
    }

    fn get_p(&self, error: f32) -> f32 {
        self.kp * error
    }

    fn reset_integrator(&mut self) {
        self.integrator = 0.0;
    }
}
