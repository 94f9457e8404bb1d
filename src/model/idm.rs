use super::{AccelerationInput, IdmParameters, LongitudinalModel, ModelName};
use crate::error::Result;

/// A small speed offset keeping the `s1` term differentiable at standstill.
const SPEED_EPSILON: f64 = 1e-5; // m/s

/// The Intelligent Driver Model.
#[derive(Clone, Debug)]
pub struct Idm {
    params: IdmParameters,
}

impl Idm {
    /// Creates a new IDM.
    pub fn new(params: IdmParameters) -> Self {
        Self { params }
    }

    pub fn parameters(&self) -> &IdmParameters {
        &self.params
    }

    /// The desired dynamic gap `s*`, never less than `s0`.
    pub(crate) fn desired_gap(p: &IdmParameters, v: f64, dv: f64, t: f64, v0: f64, a: f64) -> f64 {
        let s1_term = p.s1 * ((v + SPEED_EPSILON) / v0).sqrt();
        let s_star = p.s0 + t * v + s1_term + v * dv / (2.0 * (a * p.b).sqrt());
        f64::max(s_star, p.s0)
    }
}

impl LongitudinalModel for Idm {
    fn name(&self) -> ModelName {
        ModelName::Idm
    }

    fn desired_speed(&self) -> Result<f64> {
        Ok(self.params.v0)
    }

    fn minimum_gap(&self) -> Result<f64> {
        Ok(self.params.s0)
    }

    fn calc_acc(&self, input: &AccelerationInput) -> f64 {
        let p = &self.params;
        let v0 = input.local_desired_speed(p.v0);
        // A desired speed of zero marks a standing obstacle
        if v0 == 0.0 {
            return 0.0;
        }
        let t = input.scaling.alpha_t * p.t;
        let a = input.scaling.alpha_a * p.a;
        let v = input.speed;
        let s_star = Self::desired_gap(p, v, input.dv, t, v0, a);
        let z = s_star / input.gap;
        a * (1.0 - (v / v0).powf(p.delta) - z * z)
    }
}
