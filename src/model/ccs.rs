use super::{no_desired_speed, AccelerationInput, CcsParameters, LongitudinalModel, ModelName};
use crate::error::Result;

/// Gravitational acceleration in m/s<sup>2</sup>.
const GRAVITY: f64 = 9.81;

/// The smallest speed used as a divisor of the propulsion power, in m/s.
const SMALL_SPEED: f64 = 0.1;

/// The smallest gap used as a divisor, in m.
const MIN_GAP_FLOOR: f64 = 0.01;

/// The skiing technique chosen for the current slope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Technique {
    Diagonal,
    Herringbone,
}

/// The cross-country skiing model.
///
/// A force balance of propulsion, gravity, snow friction and air drag, plus
/// an interaction term braking behind the skier ahead. The model has no
/// desired speed: the free speed follows from the balance of forces.
#[derive(Clone, Debug)]
pub struct Ccs {
    params: CcsParameters,
}

impl Ccs {
    /// Creates a new skiing model.
    pub fn new(params: CcsParameters) -> Self {
        Self { params }
    }

    /// The technique used on the given slope.
    pub fn technique(&self, slope: f64) -> Technique {
        if slope >= self.params.herringbone_slope {
            Technique::Herringbone
        } else {
            Technique::Diagonal
        }
    }

    /// The acceleration on a free track.
    fn free_acc(&self, v: f64, slope: f64, alpha_a: f64) -> f64 {
        let p = &self.params;
        let (power, force) = match self.technique(slope) {
            Technique::Diagonal => (p.power_diagonal, p.force_diagonal),
            Technique::Herringbone => (p.power_herringbone, p.force_herringbone),
        };
        let propulsion = alpha_a * f64::min(power / f64::max(v, SMALL_SPEED), force);
        let angle = slope.atan();
        let weight = p.mass * GRAVITY;
        let gravity = weight * angle.sin();
        let friction = p.friction * weight * angle.cos();
        let drag = 0.5 * p.air_density * p.drag_area * v * v;
        (propulsion - gravity - friction - drag) / p.mass
    }
}

impl LongitudinalModel for Ccs {
    fn name(&self) -> ModelName {
        ModelName::Ccs
    }

    fn desired_speed(&self) -> Result<f64> {
        Err(no_desired_speed(ModelName::Ccs))
    }

    fn minimum_gap(&self) -> Result<f64> {
        Ok(self.params.s0)
    }

    fn calc_acc(&self, input: &AccelerationInput) -> f64 {
        let p = &self.params;
        let v = input.speed;
        let acc_free = self.free_acc(v, input.slope, input.scaling.alpha_a);

        let a_max = p.force_diagonal.max(p.force_herringbone) / p.mass;
        let t = input.scaling.alpha_t * p.t;
        let s_star = p.s0 + f64::max(v * t + v * input.dv / (2.0 * (a_max * p.b).sqrt()), 0.0);
        let z = s_star / f64::max(input.gap, MIN_GAP_FLOOR);
        acc_free - p.b * z * z
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::AccelerationInput;

    fn on_slope(ccs: &Ccs, gap: f64, v: f64, slope: f64) -> f64 {
        ccs.calc_acc(&AccelerationInput {
            slope,
            ..AccelerationInput::simple(gap, v, 0.0)
        })
    }

    #[test]
    fn terminal_speed_on_flat_track() {
        let ccs = Ccs::new(CcsParameters::default());
        assert!(on_slope(&ccs, f64::INFINITY, 6.0, 0.0) > 0.0);
        assert!(on_slope(&ccs, f64::INFINITY, 8.0, 0.0) < 0.0);
    }

    #[test]
    fn herringbone_uphill() {
        let ccs = Ccs::new(CcsParameters::default());
        assert_eq!(ccs.technique(0.05), Technique::Diagonal);
        assert_eq!(ccs.technique(0.2), Technique::Herringbone);
        assert!(on_slope(&ccs, f64::INFINITY, 0.0, 0.2) > 0.0);
    }

    #[test]
    fn brakes_behind_skier() {
        let ccs = Ccs::new(CcsParameters::default());
        let free = on_slope(&ccs, f64::INFINITY, 5.0, 0.0);
        let close = on_slope(&ccs, 2.0, 5.0, 0.0);
        assert!(close < free);
        assert!(close < 0.0);
    }

    #[test]
    fn no_desired_speed_concept() {
        let ccs = Ccs::new(CcsParameters::default());
        assert!(ccs.desired_speed().is_err());
        assert!(!ccs.has_desired_speed());
    }
}
