use crate::random::{next_gaussian, SharedRng};

/// The parameters of the acceleration noise sub-model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NoiseParameters {
    /// The fluctuation strength in m<sup>2</sup>/s<sup>3</sup>.
    pub fluctuation_strength: f64,
    /// The correlation time in s.
    pub tau: f64,
}

impl Default for NoiseParameters {
    fn default() -> Self {
        Self {
            fluctuation_strength: 0.1,
            tau: 5.0,
        }
    }
}

/// An Ornstein-Uhlenbeck acceleration error.
///
/// Correlation times not longer than the timestep give white noise.
#[derive(Clone, Debug)]
pub struct Noise {
    params: NoiseParameters,
    rng: SharedRng,
    xi: f64,
}

impl Noise {
    pub fn new(params: NoiseParameters, rng: SharedRng) -> Self {
        Self { params, rng, xi: 0.0 }
    }

    /// The current acceleration error in m/s<sup>2</sup>.
    pub fn acc_error(&self) -> f64 {
        self.xi
    }

    /// Draws the error of the next update.
    pub fn update(&mut self, dt: f64) {
        let q = self.params.fluctuation_strength;
        let tau = self.params.tau;
        let r = next_gaussian(&self.rng);
        self.xi = if tau <= dt {
            (q / dt).sqrt() * r
        } else {
            let beta = (-dt / tau).exp();
            beta * self.xi + (0.5 * q * tau * (1.0 - beta * beta)).sqrt() * r
        };
    }
}
