use super::nsm::DT_CA;
use super::{no_minimum_gap, AccelerationInput, KkwParameters, LongitudinalModel, ModelCategory, ModelName};
use crate::error::Result;
use crate::math::to_cells;
use crate::random::{next_f64, SharedRng};

/// The length of one KKW cell in m.
const CELL_LENGTH: f64 = 0.5;

/// The Kerner-Klenov-Wolf automaton.
///
/// Within the synchronization distance `D = length + k v dt` a vehicle adapts
/// its speed to the leader instead of accelerating freely.
#[derive(Clone, Debug)]
pub struct Kkw {
    params: KkwParameters,
    rng: SharedRng,
}

impl Kkw {
    /// Creates a new automaton drawing from `rng`.
    pub fn new(params: KkwParameters, rng: SharedRng) -> Self {
        Self { params, rng }
    }

    /// The synchronization distance in cells.
    fn synchronization_distance(&self, v: i64) -> f64 {
        let p = &self.params;
        p.length + p.k * v as f64 * DT_CA
    }
}

impl LongitudinalModel for Kkw {
    fn name(&self) -> ModelName {
        ModelName::Kkw
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::CellularAutomaton
    }

    fn desired_speed(&self) -> Result<f64> {
        Ok(self.params.v0)
    }

    fn minimum_gap(&self) -> Result<f64> {
        Err(no_minimum_gap(ModelName::Kkw))
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
        let v_lead = to_cells(input.speed - input.dv);
        let s = to_cells(input.gap);

        // Deterministic part
        let d = self.synchronization_distance(v);
        let v_c = if s as f64 > d - p.length {
            v + 1
        } else {
            v + (v_lead - v).signum()
        };
        let v_tilde = v_c.min(v0).min(s).max(0);

        // Stochastic part
        let r = next_f64(&self.rng);
        let p_b = if v == 0 { p.pb0 } else { p.pb1 };
        let p_a = if (v as f64) < p.vp { p.pa1 } else { p.pa2 };
        let eta = if r < p_b {
            -1
        } else if r < p_b + p_a {
            1
        } else {
            0
        };
        let v_new = (v_tilde + eta).min(v + 1).min(v0).min(s).max(0);
        (v_new - v) as f64 / DT_CA
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::random::seeded;

    fn deterministic() -> Kkw {
        Kkw::new(
            KkwParameters {
                pb0: 0.0,
                pb1: 0.0,
                pa1: 0.0,
                pa2: 0.0,
                ..Default::default()
            },
            seeded(0),
        )
    }

    #[test]
    fn free_flow_accelerates() {
        let kkw = deterministic();
        assert_eq!(kkw.accelerate_simple(f64::INFINITY, 10.0, 0.0), 1.0);
        assert_eq!(kkw.accelerate_simple(f64::INFINITY, 60.0, 0.0), 0.0);
    }

    #[test]
    fn synchronizes_with_leader() {
        let kkw = deterministic();
        // D = 15 + 2.55 * 10 = 40.5 cells, so a gap of 20 is within reach
        assert_eq!(kkw.accelerate_simple(20.0, 10.0, 2.0), -1.0);
        assert_eq!(kkw.accelerate_simple(20.0, 10.0, 0.0), 0.0);
        assert_eq!(kkw.accelerate_simple(20.0, 10.0, -3.0), 1.0);
    }

    #[test]
    fn synchronization_distance_is_not_rounded() {
        let kkw = deterministic();
        // D - length = 2.55 cells at speed 1, so a gap of 3 cells is outside
        assert_eq!(kkw.accelerate_simple(3.0, 1.0, 0.0), 1.0);
        assert_eq!(kkw.accelerate_simple(2.0, 1.0, 0.0), 0.0);
    }

    #[test]
    fn speed_limit_is_converted_to_cells() {
        let kkw = deterministic();
        // 25 m/s on 0.5 m cells is 50 cells per tick
        let limited = |speed: f64| AccelerationInput {
            speed_limit: 25.0,
            ..AccelerationInput::simple(f64::INFINITY, speed, 0.0)
        };
        assert_eq!(kkw.calc_acc(&limited(49.0)), 1.0);
        assert_eq!(kkw.calc_acc(&limited(50.0)), 0.0);
        assert_eq!(kkw.calc_acc(&limited(55.0)), -5.0);
    }

    #[test]
    fn safe_speed_is_gap() {
        let kkw = deterministic();
        assert_eq!(kkw.accelerate_simple(3.0, 10.0, 10.0), -7.0);
        assert_eq!(kkw.accelerate_simple(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn random_acceleration_above_synchronized_speed() {
        let kkw = Kkw::new(
            KkwParameters {
                pb0: 0.0,
                pb1: 0.0,
                pa1: 1.0,
                pa2: 1.0,
                ..Default::default()
            },
            seeded(0),
        );
        // Synchronized at equal speed, but the random acceleration applies
        assert_eq!(kkw.accelerate_simple(20.0, 10.0, 0.0), 1.0);
        assert!(kkw.minimum_gap().is_err());
    }
}
