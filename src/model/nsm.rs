use super::{no_minimum_gap, AccelerationInput, LongitudinalModel, ModelCategory, ModelName, NsmParameters};
use crate::error::Result;
use crate::math::to_cells;
use crate::random::{next_f64, SharedRng};

/// The update time of cellular automata in s.
pub(crate) const DT_CA: f64 = 1.0;

/// The length of one NSM cell in m.
const CELL_LENGTH: f64 = 7.5;

/// The Nagel-Schreckenberg automaton with Barlovic's slow-to-start rule.
///
/// Speeds and gaps are whole cells; the returned value is the speed change
/// over one tick of [DT_CA].
#[derive(Clone, Debug)]
pub struct Nsm {
    params: NsmParameters,
    rng: SharedRng,
}

impl Nsm {
    /// Creates a new automaton drawing from `rng`.
    pub fn new(params: NsmParameters, rng: SharedRng) -> Self {
        Self { params, rng }
    }
}

impl LongitudinalModel for Nsm {
    fn name(&self) -> ModelName {
        ModelName::Nsm
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::CellularAutomaton
    }

    fn desired_speed(&self) -> Result<f64> {
        Ok(self.params.v0)
    }

    fn minimum_gap(&self) -> Result<f64> {
        Err(no_minimum_gap(ModelName::Nsm))
    }

    fn update_time(&self) -> Option<f64> {
        Some(DT_CA)
    }

    fn scaling_length(&self) -> f64 {
        CELL_LENGTH
    }

    fn calc_acc(&self, input: &AccelerationInput) -> f64 {
        let p = &self.params;
        let v0 = to_cells(input.local_desired_speed_in(p.v0, CELL_LENGTH / DT_CA));
        let v = to_cells(input.speed);
        let s = to_cells(input.gap);
        let p_slow = if v < 1 { p.p_slow_to_start } else { p.p_slowdown };
        // Always draw, so every call consumes exactly one number
        let r = next_f64(&self.rng);
        let mut v_new = (v + 1).min(v0).min(s);
        if r < p_slow {
            v_new -= 1;
        }
        let v_new = v_new.max(0);
        (v_new - v) as f64 / DT_CA
    }
}
