use super::{AccParameters, AccelerationInput, LongitudinalModel, ModelName};
use crate::error::Result;

/// A small speed offset keeping the `s1` term differentiable at standstill.
const SPEED_EPSILON: f64 = 1e-5; // m/s

/// The smallest gap used as a divisor, in m.
const MIN_GAP_FLOOR: f64 = 0.01;

/// The upper bound of the free-road exponent of the improved IDM.
const MAX_EXPONENT: f64 = 100.0;

/// The adaptive cruise control model: the improved IDM (IIDM) mixed with the
/// constant-acceleration heuristic (CAH), which assumes the leader keeps its
/// current acceleration.
#[derive(Clone, Debug)]
pub struct Acc {
    params: AccParameters,
}

impl Acc {
    /// Creates a new ACC model.
    pub fn new(params: AccParameters) -> Self {
        Self { params }
    }

    pub fn parameters(&self) -> &AccParameters {
        &self.params
    }

    /// The improved IDM acceleration.
    fn iidm(&self, s: f64, v: f64, dv: f64, t: f64, v0: f64, a: f64) -> f64 {
        let p = &self.params;
        let s_star = p.s0
            + f64::max(
                t * v + p.s1 * ((v + SPEED_EPSILON) / v0).sqrt() + 0.5 * v * dv / (a * p.b).sqrt(),
                0.0,
            );
        let z = s_star / f64::max(s, MIN_GAP_FLOOR);
        let acc_free = if v <= v0 {
            a * (1.0 - (v / v0).powf(p.delta))
        } else {
            -p.b * (1.0 - (v0 / v).powf(a * p.delta / p.b))
        };
        let acc_int = a * (1.0 - z * z);
        match (v < v0, z > 1.0) {
            (true, true) => acc_int,
            (true, false) => {
                let exponent = f64::min(2.0 * a / acc_free, MAX_EXPONENT);
                acc_free * (1.0 - z.powf(exponent))
            }
            (false, true) => acc_free + acc_int,
            (false, false) => acc_free,
        }
    }

    /// The constant-acceleration heuristic.
    fn cah(s: f64, v: f64, dv: f64, leader_acc: f64, a: f64) -> f64 {
        let a_lead = f64::min(leader_acc, a);
        let dv_pos = f64::max(dv, 0.0);
        let v_lead = v - dv_pos;
        let denom = v_lead * v_lead - 2.0 * s * a_lead;
        if v_lead * dv_pos < -2.0 * s * a_lead && denom != 0.0 {
            v * v * a_lead / denom
        } else {
            a_lead - 0.5 * dv_pos * dv_pos / f64::max(s, MIN_GAP_FLOOR)
        }
    }
}

impl LongitudinalModel for Acc {
    fn name(&self) -> ModelName {
        ModelName::Acc
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
        let (s, v, dv) = (input.gap, input.speed, input.dv);

        let acc_iidm = self.iidm(s, v, dv, t, v0, a);
        if !s.is_finite() {
            return acc_iidm;
        }
        let acc_cah = Self::cah(s, v, dv, input.leader_acc, a);
        if acc_iidm > acc_cah {
            acc_iidm
        } else {
            let c = p.coolness;
            (1.0 - c) * acc_iidm + c * (acc_cah + p.b * ((acc_iidm - acc_cah) / p.b).tanh())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn standing_obstacle() {
        let acc = Acc::new(AccParameters {
            v0: 0.0,
            ..Default::default()
        });
        for (s, v, dv) in [(0.0, 0.0, 0.0), (1.0, 10.0, 5.0), (100.0, 3.0, -2.0)] {
            assert_eq!(acc.accelerate_simple(s, v, dv), 0.0);
        }
    }

    #[test]
    fn free_road() {
        let acc = Acc::new(AccParameters::default());
        let v0 = acc.parameters().v0;
        assert_approx_eq!(acc.accelerate_simple(f64::INFINITY, 0.0, 0.0), 1.0);
        assert_eq!(acc.accelerate_simple(f64::INFINITY, v0, 0.0), 0.0);
        // Above the desired speed the vehicle brakes at most with `b`
        let dec = acc.accelerate_simple(f64::INFINITY, 2.0 * v0, 0.0);
        assert!(dec < 0.0 && dec > -1.5);
    }

    #[test]
    fn cah_softens_cut_in() {
        let acc = Acc::new(AccParameters::default());
        let params = AccParameters {
            coolness: 0.0,
            ..Default::default()
        };
        let iidm_only = Acc::new(params);
        // A vehicle cuts in close ahead at the same speed: IIDM alone brakes
        // hard, the mix with the CAH stays much calmer.
        let hard = iidm_only.accelerate_simple(10.0, 25.0, 0.0);
        let mixed = acc.accelerate_simple(10.0, 25.0, 0.0);
        assert!(hard < -3.0);
        assert!(mixed > hard);
    }

    #[test]
    fn cah_when_leader_brakes() {
        // The leader acceleration is only capped from above
        assert_approx_eq!(Acc::cah(50.0, 20.0, 0.0, -2.0, 1.0), 20.0 * 20.0 * -2.0 / (400.0 + 200.0));
        assert_approx_eq!(Acc::cah(50.0, 20.0, 10.0, 0.0, 1.0), -0.5 * 100.0 / 50.0);
    }
}
