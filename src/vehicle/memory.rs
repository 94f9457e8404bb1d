use crate::model::Scaling;

/// The parameters of the driver memory sub-model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MemoryParameters {
    /// The relaxation time of the speed memory in s.
    pub tau: f64,
    /// The time headway multiplier after a long time in a jam.
    pub alpha_t_max: f64,
    /// The desired speed multiplier after a long time in a jam.
    pub alpha_v0_min: f64,
    /// The acceleration multiplier after a long time in a jam.
    pub alpha_a_min: f64,
}

impl Default for MemoryParameters {
    fn default() -> Self {
        Self {
            tau: 600.0,
            alpha_t_max: 1.8,
            alpha_v0_min: 1.0,
            alpha_a_min: 1.0,
        }
    }
}

/// Adapts a driver's behaviour to the traffic experienced recently.
///
/// The state `lambda` is an exponential moving average of `v / v0`: 1 in
/// free traffic, falling towards 0 in a long jam.
#[derive(Clone, Debug)]
pub struct Memory {
    params: MemoryParameters,
    lambda: f64,
}

impl Memory {
    pub fn new(params: MemoryParameters) -> Self {
        Self { params, lambda: 1.0 }
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Feeds the current speed into the average.
    pub fn update(&mut self, dt: f64, speed: f64, v0: f64) {
        let ratio = if v0 > 0.0 {
            (speed / v0).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let beta = if self.params.tau > 0.0 {
            (-dt / self.params.tau).exp()
        } else {
            0.0
        };
        self.lambda = beta * self.lambda + (1.0 - beta) * ratio;
    }

    /// The multipliers implied by the current memory state.
    pub fn scaling(&self) -> Scaling {
        let p = &self.params;
        let mix = |jammed: f64| jammed + (1.0 - jammed) * self.lambda;
        Scaling {
            alpha_t: mix(p.alpha_t_max),
            alpha_v0: mix(p.alpha_v0_min),
            alpha_a: mix(p.alpha_a_min),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn free_traffic_is_neutral() {
        let mut memory = Memory::new(MemoryParameters::default());
        memory.update(1.0, 30.0, 30.0);
        assert_eq!(memory.scaling(), Scaling::default());
    }

    #[test]
    fn jam_raises_time_headway() {
        let mut memory = Memory::new(MemoryParameters {
            tau: 10.0,
            ..Default::default()
        });
        for _ in 0..1000 {
            memory.update(1.0, 0.0, 30.0);
        }
        assert!(memory.lambda() < 1e-6);
        assert_approx_eq!(memory.scaling().alpha_t, 1.8);
        assert_approx_eq!(memory.scaling().alpha_v0, 1.0);
    }

    #[test]
    fn relaxes_exponentially() {
        let mut memory = Memory::new(MemoryParameters {
            tau: 10.0,
            ..Default::default()
        });
        memory.update(10.0, 0.0, 30.0);
        assert_approx_eq!(memory.lambda(), (-1.0f64).exp());
    }
}
