//! Proportional-integral-derivative element for the velocity loop.

use super::RatePid;

/// PID element with a clamped integrator and derivative-on-error.
///
/// The derivative uses the previous error sample; the first update after
/// construction or reset contributes no D term.
#[derive(Debug, Clone)]
pub struct Pid {
    kp: f32,
    ki: f32,
    kd: f32,
    integrator: f32,
    imax: f32,
    last_error: Option<f32>,
}

impl Pid {
    /// Creates a PID element with the given gains and integrator limit.
    pub fn new(kp: f32, ki: f32, kd: f32, imax: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            integrator: 0.0,
            imax,
            last_error: None,
        }
    }
}

impl RatePid for Pid {
    fn update(&mut self, error: f32, dt: f32) -> f32 {
        let p = self.kp * error;

        if dt > 0.0 && self.ki != 0.0 {
            self.integrator += self.ki * error * dt;
            self.integrator = self.integrator.clamp(-self.imax, self.imax);
        }

        let d = match self.last_error {
            Some(prev) if dt > 0.0 => self.kd * (error - prev) / dt,
            _ => 0.0,
        };
        self.last_error = Some(error);

        p + self.integrator + d
    }

    fn reset_integrator(&mut self) {
        self.integrator = 0.0;
        self.last_error = None;
    }
}
