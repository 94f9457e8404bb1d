use super::gipps::safe_speed;
use super::{AccelerationInput, KraussParameters, LongitudinalModel, ModelCategory, ModelName};
use crate::error::Result;
use crate::random::{next_f64, SharedRng};
use crate::util::Interval;

/// Krauss' model: the Gipps safe speed with random dawdling below it.
#[derive(Clone, Debug)]
pub struct Krauss {
    params: KraussParameters,
    rng: SharedRng,
}

impl Krauss {
    /// Creates a new Krauss model drawing from `rng`.
    pub fn new(params: KraussParameters, rng: SharedRng) -> Self {
        Self { params, rng }
    }

    pub fn parameters(&self) -> &KraussParameters {
        &self.params
    }

    /// The interval the new speed is sampled from.
    pub fn speed_bounds(&self, input: &AccelerationInput) -> Interval {
        let p = &self.params;
        let v0 = input.local_desired_speed(p.v0);
        let a = input.scaling.alpha_a * p.a;
        let v = input.speed;
        let v_safe = safe_speed(input.gap, v - input.dv, p.s0, p.b, p.dt);
        let v_upper = v_safe.min(v + a * p.dt).min(v0);
        let v_lower = (1.0 - p.epsilon) * v_upper + p.epsilon * f64::max(0.0, v - p.b * p.dt);
        // Never sample above the safe speed, even when braking harder than `b`
        Interval::new(f64::min(v_lower, v_upper), v_upper)
    }
}

impl LongitudinalModel for Krauss {
    fn name(&self) -> ModelName {
        ModelName::Krauss
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
        let bounds = self.speed_bounds(input);
        let r = next_f64(&self.rng);
        let v_new = bounds.lerp(r);
        (v_new - input.speed) / self.params.dt
    }
}
