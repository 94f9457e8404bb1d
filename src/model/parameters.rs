//! Immutable parameter records, one per model family.
//!
//! Lengths and speeds are in m and m/s, except for the cellular automata whose
//! records are in cells and cells/s.

use super::ModelName;
use crate::error::{Error, Result};

/// Intelligent Driver Model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IdmParameters {
    /// Desired speed.
    pub v0: f64,
    /// Maximum acceleration in m/s<sup>2</sup>.
    pub a: f64,
    /// Comfortable deceleration in m/s<sup>2</sup>, positive.
    pub b: f64,
    /// Desired time headway in s.
    pub t: f64,
    /// Minimum gap at standstill.
    pub s0: f64,
    /// Speed-dependent jam distance term.
    pub s1: f64,
    /// Acceleration exponent.
    pub delta: f64,
}

impl Default for IdmParameters {
    fn default() -> Self {
        Self {
            v0: 120.0 / 3.6,
            a: 1.0,
            b: 1.5,
            t: 1.5,
            s0: 2.0,
            s1: 0.0,
            delta: 4.0,
        }
    }
}

/// Adaptive cruise control model: the improved IDM blended with the
/// constant-acceleration heuristic.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AccParameters {
    pub v0: f64,
    pub a: f64,
    pub b: f64,
    pub t: f64,
    pub s0: f64,
    pub s1: f64,
    pub delta: f64,
    /// Weight of the constant-acceleration heuristic, in `[0, 1]`.
    pub coolness: f64,
}

impl Default for AccParameters {
    fn default() -> Self {
        Self {
            v0: 120.0 / 3.6,
            a: 1.0,
            b: 1.5,
            t: 1.5,
            s0: 2.0,
            s1: 0.0,
            delta: 4.0,
            coolness: 0.99,
        }
    }
}

/// The optimal-velocity function of the OVM/FVDM.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "variant"))]
pub enum OptimalSpeedFunction {
    /// Bando's hyperbolic tangent.
    Bando { transition_width: f64, beta: f64 },
    /// Free flow up to `v0`, then linear in the gap with the given headway.
    Triangular { time_headway: f64 },
    /// Three-phase function with a band of indifferent headways.
    ThreePhase { t_min: f64, t_max: f64 },
}

/// Optimal velocity model and its full velocity difference extension.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OvmFvdmParameters {
    pub v0: f64,
    pub s0: f64,
    /// Speed relaxation time in s.
    pub tau: f64,
    /// Sensitivity to the closing rate in 1/s; zero gives the plain OVM.
    pub gamma: f64,
    pub function: OptimalSpeedFunction,
}

impl Default for OvmFvdmParameters {
    fn default() -> Self {
        Self {
            v0: 15.0,
            s0: 3.0,
            tau: 0.65,
            gamma: 0.6,
            function: OptimalSpeedFunction::Bando {
                transition_width: 15.0,
                beta: 1.5,
            },
        }
    }
}

/// Gipps' safe-speed model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GippsParameters {
    pub v0: f64,
    pub a: f64,
    pub b: f64,
    pub s0: f64,
    /// Update time (reaction time) of the map in s.
    pub dt: f64,
}

impl Default for GippsParameters {
    fn default() -> Self {
        Self {
            v0: 120.0 / 3.6,
            a: 1.5,
            b: 1.0,
            s0: 2.0,
            dt: 0.5,
        }
    }
}

/// Krauss' stochastic extension of the Gipps model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KraussParameters {
    pub v0: f64,
    pub a: f64,
    pub b: f64,
    pub s0: f64,
    pub dt: f64,
    /// Dawdling parameter in `[0, 1]`.
    pub epsilon: f64,
}

impl Default for KraussParameters {
    fn default() -> Self {
        Self {
            v0: 120.0 / 3.6,
            a: 1.0,
            b: 1.0,
            s0: 2.0,
            dt: 1.0,
            epsilon: 0.4,
        }
    }
}

/// Newell's simplified car-following model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NewellParameters {
    pub v0: f64,
    pub s0: f64,
    pub dt: f64,
}

impl Default for NewellParameters {
    fn default() -> Self {
        Self {
            v0: 120.0 / 3.6,
            s0: 2.0,
            dt: 0.5,
        }
    }
}

/// Nagel-Schreckenberg automaton with Barlovic's slow-to-start rule.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NsmParameters {
    /// Maximum speed in cells/s.
    pub v0: f64,
    /// Slow-down probability of moving vehicles.
    pub p_slowdown: f64,
    /// Slow-down probability of standing vehicles.
    pub p_slow_to_start: f64,
}

impl Default for NsmParameters {
    fn default() -> Self {
        Self {
            v0: 5.0,
            p_slowdown: 0.1,
            p_slow_to_start: 0.5,
        }
    }
}

/// Kerner-Klenov-Wolf automaton.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KkwParameters {
    /// Maximum speed in cells/s.
    pub v0: f64,
    /// Vehicle length in cells.
    pub length: f64,
    /// Multiplier of the synchronization distance.
    pub k: f64,
    /// Slow-down probability of standing vehicles.
    pub pb0: f64,
    /// Slow-down probability of moving vehicles.
    pub pb1: f64,
    /// Acceleration probability below `vp`.
    pub pa1: f64,
    /// Acceleration probability from `vp` upwards.
    pub pa2: f64,
    /// Threshold speed in cells/s.
    pub vp: f64,
}

impl Default for KkwParameters {
    fn default() -> Self {
        Self {
            v0: 60.0,
            length: 15.0,
            k: 2.55,
            pb0: 0.425,
            pb1: 0.04,
            pa1: 0.2,
            pa2: 0.052,
            vp: 28.0,
        }
    }
}

/// Cross-country skiing force-balance model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CcsParameters {
    /// Mass of the skier in kg.
    pub mass: f64,
    /// Propulsion power of the diagonal technique in W.
    pub power_diagonal: f64,
    /// Maximum propulsion force of the diagonal technique in N.
    pub force_diagonal: f64,
    /// Propulsion power of the herringbone technique in W.
    pub power_herringbone: f64,
    /// Maximum propulsion force of the herringbone technique in N.
    pub force_herringbone: f64,
    /// Slope from which the herringbone technique is used.
    pub herringbone_slope: f64,
    /// Kinetic friction coefficient of ski on snow.
    pub friction: f64,
    /// Drag coefficient times frontal area in m<sup>2</sup>.
    pub drag_area: f64,
    /// Air density in kg/m<sup>3</sup>.
    pub air_density: f64,
    /// Minimum gap to the skier ahead.
    pub s0: f64,
    /// Time gap to the skier ahead in s.
    pub t: f64,
    /// Braking deceleration used for interaction, positive.
    pub b: f64,
}

impl Default for CcsParameters {
    fn default() -> Self {
        Self {
            mass: 75.0,
            power_diagonal: 250.0,
            force_diagonal: 150.0,
            power_herringbone: 300.0,
            force_herringbone: 220.0,
            herringbone_slope: 0.1,
            friction: 0.03,
            drag_area: 0.5,
            air_density: 1.2,
            s0: 1.0,
            t: 0.5,
            b: 2.0,
        }
    }
}

/// The parameters of any longitudinal model, tagged by model name.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "model"))]
pub enum ModelParameters {
    #[cfg_attr(feature = "serde", serde(rename = "IDM"))]
    Idm(IdmParameters),
    #[cfg_attr(feature = "serde", serde(rename = "ACC"))]
    Acc(AccParameters),
    #[cfg_attr(feature = "serde", serde(rename = "OVM_FVDM"))]
    OvmFvdm(OvmFvdmParameters),
    Gipps(GippsParameters),
    Krauss(KraussParameters),
    Newell(NewellParameters),
    #[cfg_attr(feature = "serde", serde(rename = "NSM"))]
    Nsm(NsmParameters),
    #[cfg_attr(feature = "serde", serde(rename = "KKW"))]
    Kkw(KkwParameters),
    #[cfg_attr(feature = "serde", serde(rename = "CCS"))]
    Ccs(CcsParameters),
}

impl ModelParameters {
    /// The default parameters of the named model.
    pub fn default_for(name: ModelName) -> Self {
        match name {
            ModelName::Idm => Self::Idm(Default::default()),
            ModelName::Acc => Self::Acc(Default::default()),
            ModelName::OvmFvdm => Self::OvmFvdm(Default::default()),
            ModelName::Gipps => Self::Gipps(Default::default()),
            ModelName::Krauss => Self::Krauss(Default::default()),
            ModelName::Newell => Self::Newell(Default::default()),
            ModelName::Nsm => Self::Nsm(Default::default()),
            ModelName::Kkw => Self::Kkw(Default::default()),
            ModelName::Ccs => Self::Ccs(Default::default()),
        }
    }

    /// The name of the model these parameters belong to.
    pub fn name(&self) -> ModelName {
        match self {
            Self::Idm(_) => ModelName::Idm,
            Self::Acc(_) => ModelName::Acc,
            Self::OvmFvdm(_) => ModelName::OvmFvdm,
            Self::Gipps(_) => ModelName::Gipps,
            Self::Krauss(_) => ModelName::Krauss,
            Self::Newell(_) => ModelName::Newell,
            Self::Nsm(_) => ModelName::Nsm,
            Self::Kkw(_) => ModelName::Kkw,
            Self::Ccs(_) => ModelName::Ccs,
        }
    }

    /// Returns a copy with the desired speed multiplied by `factor`.
    /// Models without a desired speed are returned unchanged.
    pub fn with_desired_speed_factor(&self, factor: f64) -> Self {
        let mut params = self.clone();
        match &mut params {
            Self::Idm(p) => p.v0 *= factor,
            Self::Acc(p) => p.v0 *= factor,
            Self::OvmFvdm(p) => p.v0 *= factor,
            Self::Gipps(p) => p.v0 *= factor,
            Self::Krauss(p) => p.v0 *= factor,
            Self::Newell(p) => p.v0 *= factor,
            Self::Nsm(p) => p.v0 *= factor,
            Self::Kkw(p) => p.v0 *= factor,
            Self::Ccs(_) => {}
        }
        params
    }

    /// Checks that the parameters describe a usable model.
    pub fn validate(&self) -> Result<()> {
        let model = self.name();
        let check = Check { model };
        match self {
            Self::Idm(p) => {
                check.non_negative("v0", p.v0)?;
                check.positive("a", p.a)?;
                check.positive("b", p.b)?;
                check.non_negative("t", p.t)?;
                check.non_negative("s0", p.s0)?;
                check.non_negative("s1", p.s1)?;
                check.positive("delta", p.delta)
            }
            Self::Acc(p) => {
                check.non_negative("v0", p.v0)?;
                check.positive("a", p.a)?;
                check.positive("b", p.b)?;
                check.non_negative("t", p.t)?;
                check.non_negative("s0", p.s0)?;
                check.non_negative("s1", p.s1)?;
                check.positive("delta", p.delta)?;
                check.probability("coolness", p.coolness)
            }
            Self::OvmFvdm(p) => {
                check.non_negative("v0", p.v0)?;
                check.non_negative("s0", p.s0)?;
                check.positive("tau", p.tau)?;
                check.non_negative("gamma", p.gamma)?;
                match p.function {
                    OptimalSpeedFunction::Bando {
                        transition_width, ..
                    } => check.positive("transition_width", transition_width),
                    OptimalSpeedFunction::Triangular { time_headway } => {
                        check.positive("time_headway", time_headway)
                    }
                    OptimalSpeedFunction::ThreePhase { t_min, t_max } => {
                        check.positive("t_min", t_min)?;
                        if t_max < t_min {
                            return Err(check.invalid("t_max", "must not be less than t_min"));
                        }
                        Ok(())
                    }
                }
            }
            Self::Gipps(p) => {
                check.non_negative("v0", p.v0)?;
                check.positive("a", p.a)?;
                check.positive("b", p.b)?;
                check.non_negative("s0", p.s0)?;
                check.positive("dt", p.dt)
            }
            Self::Krauss(p) => {
                check.non_negative("v0", p.v0)?;
                check.positive("a", p.a)?;
                check.positive("b", p.b)?;
                check.non_negative("s0", p.s0)?;
                check.positive("dt", p.dt)?;
                check.probability("epsilon", p.epsilon)
            }
            Self::Newell(p) => {
                check.non_negative("v0", p.v0)?;
                check.non_negative("s0", p.s0)?;
                check.positive("dt", p.dt)
            }
            Self::Nsm(p) => {
                check.non_negative("v0", p.v0)?;
                check.probability("p_slowdown", p.p_slowdown)?;
                check.probability("p_slow_to_start", p.p_slow_to_start)
            }
            Self::Kkw(p) => {
                check.non_negative("v0", p.v0)?;
                check.positive("length", p.length)?;
                check.non_negative("k", p.k)?;
                check.probability("pb0", p.pb0)?;
                check.probability("pb1", p.pb1)?;
                check.probability("pa1", p.pa1)?;
                check.probability("pa2", p.pa2)?;
                if p.pb0 + p.pa1 > 1.0 || p.pb1 + p.pa2 > 1.0 {
                    return Err(check.invalid("pa1", "slow-down and acceleration probabilities exceed one"));
                }
                check.non_negative("vp", p.vp)
            }
            Self::Ccs(p) => {
                check.positive("mass", p.mass)?;
                check.non_negative("power_diagonal", p.power_diagonal)?;
                check.non_negative("force_diagonal", p.force_diagonal)?;
                check.non_negative("power_herringbone", p.power_herringbone)?;
                check.non_negative("force_herringbone", p.force_herringbone)?;
                check.non_negative("friction", p.friction)?;
                check.non_negative("drag_area", p.drag_area)?;
                check.non_negative("air_density", p.air_density)?;
                check.non_negative("s0", p.s0)?;
                check.non_negative("t", p.t)?;
                check.positive("b", p.b)
            }
        }
    }
}

struct Check {
    model: ModelName,
}

impl Check {
    fn invalid(&self, name: &'static str, reason: &'static str) -> Error {
        Error::InvalidParameter {
            model: self.model,
            name,
            reason,
        }
    }

    fn positive(&self, name: &'static str, value: f64) -> Result<()> {
        if value > 0.0 && value.is_finite() {
            Ok(())
        } else {
            Err(self.invalid(name, "must be positive and finite"))
        }
    }

    fn non_negative(&self, name: &'static str, value: f64) -> Result<()> {
        if value >= 0.0 && value.is_finite() {
            Ok(())
        } else {
            Err(self.invalid(name, "must be non-negative and finite"))
        }
    }

    fn probability(&self, name: &'static str, value: f64) -> Result<()> {
        if (0.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(self.invalid(name, "must lie in [0, 1]"))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn desired_speed_factor() {
        let params = ModelParameters::Idm(IdmParameters {
            v0: 30.0,
            ..Default::default()
        });
        match params.with_desired_speed_factor(1.1) {
            ModelParameters::Idm(p) => assert!((p.v0 - 33.0).abs() < 1e-12),
            _ => unreachable!(),
        }
        let ccs = ModelParameters::default_for(ModelName::Ccs);
        assert_eq!(ccs.with_desired_speed_factor(1.2), ccs);
    }

    #[test]
    fn defaults_are_valid() {
        for name in ModelName::ALL {
            let params = ModelParameters::default_for(name);
            assert_eq!(params.name(), name);
            assert_eq!(params.validate(), Ok(()));
        }
    }

    #[test]
    fn three_phase_headways_are_ordered() {
        let params = ModelParameters::OvmFvdm(OvmFvdmParameters {
            function: OptimalSpeedFunction::ThreePhase {
                t_min: 2.0,
                t_max: 1.0,
            },
            ..Default::default()
        });
        assert!(matches!(
            params.validate(),
            Err(Error::InvalidParameter { name: "t_max", .. })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn parameters_from_json() {
        let json = r#"{ "model": "IDM", "v0": 30.0, "t": 1.2 }"#;
        let params: ModelParameters = serde_json::from_str(json).unwrap();
        assert_eq!(
            params,
            ModelParameters::Idm(IdmParameters {
                v0: 30.0,
                t: 1.2,
                ..Default::default()
            })
        );
    }
}
