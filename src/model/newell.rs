use super::{AccelerationInput, LongitudinalModel, ModelCategory, ModelName, NewellParameters};
use crate::error::Result;

/// Newell's model: drive at the speed which closes the net gap to `s0` within
/// one update time, capped by the desired speed.
#[derive(Clone, Debug)]
pub struct Newell {
    params: NewellParameters,
}

impl Newell {
    /// Creates a new Newell model.
    pub fn new(params: NewellParameters) -> Self {
        Self { params }
    }
}

impl LongitudinalModel for Newell {
    fn name(&self) -> ModelName {
        ModelName::Newell
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::IteratedMap
    }

    fn desired_speed(&self) -> Result<f64> {
        Ok(self.params.v0)
    }

    fn minimum_gap(&self) -> Result<f64> {
        Ok(self.params.s0)
    }

    fn update_time(&self) -> Option<f64> {
        Some(self.params.dt)
    }

    fn calc_acc(&self, input: &AccelerationInput) -> f64 {
        let p = &self.params;
        let v0 = input.local_desired_speed(p.v0);
        let v_new = ((input.gap - p.s0) / p.dt).clamp(0.0, v0);
        (v_new - input.speed) / p.dt
    }
}
