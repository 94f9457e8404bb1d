//! Equilibrium (fundamental diagram) properties of a longitudinal model.
//!
//! The equilibrium speed is tabulated over density by relaxing the model's
//! own dynamics towards a fixed point at every density sample, starting from
//! the equilibrium speed of the previous (lower) density.

use crate::math::LookupTable;
use crate::model::{LongitudinalModel, ModelCategory};
use crate::util::Interval;
use itertools::Itertools;
use log::debug;

/// The number of density samples of the equilibrium table.
pub const NUM_SAMPLES: usize = 51;

/// The number of relaxation steps per density sample.
const NUM_ITERATIONS: usize = 100;

/// The range of relaxation step sizes of continuous models, in s,
/// from standstill to the desired speed.
const RELAXATION_STEP: Interval = Interval::new(0.01, 2.0);

/// The equilibrium speed-density relation of a model.
#[derive(Clone, Debug)]
pub struct EquilibriumProperties {
    /// Jam density in 1/m.
    rho_max: f64,
    /// The equilibrium speed over density.
    v_eq: LookupTable,
    /// The density at which the flow is maximal.
    rho_q_max: f64,
    /// The maximum flow in vehicles per second.
    q_max: f64,
}

impl EquilibriumProperties {
    /// Computes the equilibrium properties of `model` for vehicles of the
    /// given effective length, which fixes the jam density `1 / length`.
    ///
    /// Models without a desired speed or a minimum gap, such as the
    /// cellular automata, yield a degenerate table holding a single zero
    /// speed without being evaluated.
    pub fn compute(model: &dyn LongitudinalModel, vehicle_length: f64) -> Self {
        let rho_max = 1.0 / vehicle_length;
        let range = Interval::new(0.0, rho_max);

        let (v0, s0) = match (model.desired_speed(), model.minimum_gap()) {
            (Ok(v0), Ok(s0)) => (v0, s0),
            (Err(err), _) | (_, Err(err)) => {
                debug!("no equilibrium table: {}", err);
                return Self {
                    rho_max,
                    v_eq: LookupTable::from_samples(range, 1, |_| 0.0),
                    rho_q_max: 0.0,
                    q_max: 0.0,
                };
            }
        };
        let steps = StepSize::for_model(model);

        // Each density relaxes from the equilibrium speed of the previous one
        let mut v = v0;
        let v_eq = LookupTable::from_samples(range, NUM_SAMPLES, |rho| {
            if rho > 0.0 {
                let s = 1.0 / rho - vehicle_length;
                for _ in 0..NUM_ITERATIONS {
                    let acc = model.accelerate_simple(s, v, 0.0);
                    v += steps.at(v, v0) * acc;
                    if v.is_nan() || v < 0.0 || s < s0 {
                        v = 0.0;
                    }
                }
            }
            v
        });
        let (rho_q_max, q_max) = Self::max_flow(&v_eq);
        Self {
            rho_max,
            v_eq,
            rho_q_max,
            q_max,
        }
    }

    /// Finds the tabulated density with the maximum flow `rho * vEq(rho)`.
    fn max_flow(v_eq: &LookupTable) -> (f64, f64) {
        v_eq.values()
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let rho = v_eq.x(i);
                (rho, rho * v)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0.0, 0.0))
    }

    /// Jam density in 1/m.
    pub fn rho_max(&self) -> f64 {
        self.rho_max
    }

    /// The equilibrium speed at density `rho`, linearly interpolated.
    pub fn v_eq(&self, rho: f64) -> f64 {
        self.v_eq.sample(rho)
    }

    /// The tabulated equilibrium speeds, starting at zero density.
    pub fn v_eq_table(&self) -> &[f64] {
        self.v_eq.values()
    }

    /// The equilibrium flow at density `rho`.
    pub fn q_eq(&self, rho: f64) -> f64 {
        rho * self.v_eq(rho)
    }

    /// The density at which the flow is maximal.
    pub fn rho_q_max(&self) -> f64 {
        self.rho_q_max
    }

    /// The maximum flow in vehicles per second.
    pub fn q_max(&self) -> f64 {
        self.q_max
    }

    /// The fundamental diagram as `(density, flow)` pairs.
    pub fn fundamental_diagram(&self) -> Vec<(f64, f64)> {
        self.v_eq
            .values()
            .iter()
            .enumerate()
            .map(|(i, v)| (self.v_eq.x(i), self.v_eq.x(i) * v))
            .collect_vec()
    }
}

/// The relaxation step size policy of a model.
enum StepSize {
    /// Interpolated by `v / v0` over a range of step sizes.
    Interpolated(Interval),
    /// The model's own update time.
    Fixed(f64),
}

impl StepSize {
    fn for_model(model: &dyn LongitudinalModel) -> Self {
        match (model.category(), model.update_time(), model.relaxation_time()) {
            (ModelCategory::IteratedMap, Some(dt), _) => {
                StepSize::Fixed(dt)
            }
            (_, _, Some(tau)) => StepSize::Interpolated(Interval::new(0.01 * tau, tau)),
            _ => StepSize::Interpolated(RELAXATION_STEP),
        }
    }

    fn at(&self, v: f64, v0: f64) -> f64 {
        match self {
            StepSize::Fixed(dt) => *dt,
            StepSize::Interpolated(range) if v0 > 0.0 => range.lerp((v / v0).clamp(0.0, 1.0)),
            StepSize::Interpolated(range) => range.min,
        }
    }
}
