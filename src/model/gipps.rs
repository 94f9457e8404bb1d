use super::{AccelerationInput, GippsParameters, LongitudinalModel, ModelCategory, ModelName};
use crate::error::Result;

/// Gipps' model, an iterated map over the update time `dt`.
#[derive(Clone, Debug)]
pub struct Gipps {
    params: GippsParameters,
}

impl Gipps {
    /// Creates a new Gipps model.
    pub fn new(params: GippsParameters) -> Self {
        Self { params }
    }

    pub fn parameters(&self) -> &GippsParameters {
        &self.params
    }
}

/// The speed at which a vehicle can still stop behind a leader braking with `b`.
pub(crate) fn safe_speed(s: f64, v_lead: f64, s0: f64, b: f64, dt: f64) -> f64 {
    let b_dt = b * dt;
    -b_dt + (b_dt * b_dt + v_lead * v_lead + 2.0 * b * f64::max(s - s0, 0.0)).sqrt()
}

impl LongitudinalModel for Gipps {
    fn name(&self) -> ModelName {
        ModelName::Gipps
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
        let a = input.scaling.alpha_a * p.a;
        let v = input.speed;
        let v_safe = safe_speed(input.gap, v - input.dv, p.s0, p.b, p.dt);
        let v_new = v_safe.min(v + a * p.dt).min(v0);
        (v_new - v) / p.dt
    }
}
