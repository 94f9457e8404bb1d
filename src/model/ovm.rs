use super::{AccelerationInput, LongitudinalModel, ModelName, OptimalSpeedFunction, OvmFvdmParameters};
use crate::error::Result;

/// The smallest speed used as a divisor, in m/s.
const SMALL_SPEED: f64 = 1e-6;

/// The optimal velocity model with the full velocity difference term.
///
/// `acc = (vOpt(s) - v) / tau - gamma * dv`
#[derive(Clone, Debug)]
pub struct OvmFvdm {
    params: OvmFvdmParameters,
}

impl OvmFvdm {
    /// Creates a new OVM/FVDM.
    pub fn new(params: OvmFvdmParameters) -> Self {
        Self { params }
    }

    pub fn parameters(&self) -> &OvmFvdmParameters {
        &self.params
    }

    /// The optimal speed for the gap `s` and current speed `v`.
    pub fn optimal_speed(&self, s: f64, v: f64, v0: f64) -> f64 {
        let s_net = s - self.params.s0;
        match self.params.function {
            OptimalSpeedFunction::Bando {
                transition_width,
                beta,
            } => {
                let v0_prime = v0 / (1.0 + beta.tanh());
                f64::max(v0_prime * ((s_net / transition_width - beta).tanh() + beta.tanh()), 0.0)
            }
            OptimalSpeedFunction::Triangular { time_headway } => {
                (s_net / time_headway).clamp(0.0, f64::max(v0, 0.0))
            }
            OptimalSpeedFunction::ThreePhase { t_min, t_max } => {
                let t_dyn = s_net / f64::max(v, SMALL_SPEED);
                if t_dyn > t_max {
                    f64::min(s_net / t_max, v0)
                } else if t_dyn > t_min {
                    f64::min(v, v0)
                } else if t_dyn > 0.0 {
                    f64::min(s_net / t_min, v0)
                } else {
                    0.0
                }
            }
        }
    }
}

impl LongitudinalModel for OvmFvdm {
    fn name(&self) -> ModelName {
        ModelName::OvmFvdm
    }

    fn desired_speed(&self) -> Result<f64> {
        Ok(self.params.v0)
    }

    fn minimum_gap(&self) -> Result<f64> {
        Ok(self.params.s0)
    }

    fn relaxation_time(&self) -> Option<f64> {
        Some(self.params.tau)
    }

    fn calc_acc(&self, input: &AccelerationInput) -> f64 {
        let p = &self.params;
        let v0 = input.local_desired_speed(p.v0);
        let v_opt = self.optimal_speed(input.gap, input.speed, v0);
        let tau = p.tau / input.scaling.alpha_a;
        (v_opt - input.speed) / tau - p.gamma * input.dv
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn with(function: OptimalSpeedFunction) -> OvmFvdm {
        OvmFvdm::new(OvmFvdmParameters {
            v0: 20.0,
            s0: 2.0,
            tau: 1.0,
            gamma: 0.5,
            function,
        })
    }

    #[test]
    fn bando_limits() {
        let ovm = with(OptimalSpeedFunction::Bando {
            transition_width: 10.0,
            beta: 1.5,
        });
        assert_approx_eq!(ovm.optimal_speed(f64::INFINITY, 0.0, 20.0), 20.0);
        assert_approx_eq!(ovm.optimal_speed(2.0, 0.0, 20.0), 0.0);
        assert!(ovm.optimal_speed(30.0, 0.0, 20.0) > ovm.optimal_speed(20.0, 0.0, 20.0));
    }

    #[test]
    fn triangular() {
        let ovm = with(OptimalSpeedFunction::Triangular { time_headway: 1.5 });
        assert_approx_eq!(ovm.optimal_speed(17.0, 0.0, 20.0), 10.0);
        assert_eq!(ovm.optimal_speed(500.0, 0.0, 20.0), 20.0);
        assert_eq!(ovm.optimal_speed(1.0, 0.0, 20.0), 0.0);
    }

    #[test]
    fn three_phase_keeps_speed_in_band() {
        let ovm = with(OptimalSpeedFunction::ThreePhase {
            t_min: 1.0,
            t_max: 2.0,
        });
        // Headway of 1.5 s lies in the indifference band
        assert_eq!(ovm.optimal_speed(2.0 + 15.0, 10.0, 20.0), 10.0);
        // Headway of 3 s: free to speed up to s/t_max
        assert_approx_eq!(ovm.optimal_speed(2.0 + 30.0, 10.0, 20.0), 15.0);
        // Headway of 0.5 s: slow down to s/t_min
        assert_approx_eq!(ovm.optimal_speed(2.0 + 5.0, 10.0, 20.0), 5.0);
        assert_eq!(ovm.optimal_speed(1.0, 10.0, 20.0), 0.0);
    }

    #[test]
    fn velocity_difference_term() {
        let ovm = with(OptimalSpeedFunction::Triangular { time_headway: 1.5 });
        let relax = ovm.accelerate_simple(17.0, 8.0, 0.0);
        assert_approx_eq!(relax, 2.0);
        assert_approx_eq!(ovm.accelerate_simple(17.0, 8.0, 2.0), relax - 1.0);
    }
}
