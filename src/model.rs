//! Longitudinal (car-following) models.
//!
//! Every model implements [LongitudinalModel], a stateless strategy bound to
//! one parameter record. Models fall into three [ModelCategory]s which the
//! vehicle integrator must tell apart, because the meaning of the returned
//! acceleration and the position update differ between them.

use crate::error::{Error, Result};
use crate::random::SharedRng;
use crate::vehicle::Vehicle;
use std::fmt::{self, Debug, Display};
use std::rc::Rc;
use std::str::FromStr;

pub use self::acc::Acc;
pub use self::ccs::Ccs;
pub use self::gipps::Gipps;
pub use self::idm::Idm;
pub use self::kkw::Kkw;
pub use self::krauss::Krauss;
pub use self::newell::Newell;
pub use self::nsm::Nsm;
pub use self::ovm::OvmFvdm;
pub use self::parameters::*;

mod acc;
mod ccs;
mod gipps;
mod idm;
mod kkw;
mod krauss;
mod newell;
mod nsm;
mod ovm;
mod parameters;

/// The update semantics of a longitudinal model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelCategory {
    /// A continuous-time model; the acceleration is integrated ballistically.
    Continuous,
    /// An iterated map whose update time is a model parameter.
    IteratedMap,
    /// A cellular automaton; the "acceleration" is a speed change per 1 s tick.
    CellularAutomaton,
}

/// The names of the available longitudinal models.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelName {
    Idm,
    Acc,
    OvmFvdm,
    Gipps,
    Krauss,
    Newell,
    Nsm,
    Kkw,
    Ccs,
}

impl ModelName {
    /// All model names.
    pub const ALL: [ModelName; 9] = [
        ModelName::Idm,
        ModelName::Acc,
        ModelName::OvmFvdm,
        ModelName::Gipps,
        ModelName::Krauss,
        ModelName::Newell,
        ModelName::Nsm,
        ModelName::Kkw,
        ModelName::Ccs,
    ];

    /// The canonical name of the model.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelName::Idm => "IDM",
            ModelName::Acc => "ACC",
            ModelName::OvmFvdm => "OVM_FVDM",
            ModelName::Gipps => "Gipps",
            ModelName::Krauss => "Krauss",
            ModelName::Newell => "Newell",
            ModelName::Nsm => "NSM",
            ModelName::Kkw => "KKW",
            ModelName::Ccs => "CCS",
        }
    }
}

impl Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ModelName::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownModel(s.to_string()))
    }
}

/// Multipliers applied to the time headway, desired speed and maximum
/// acceleration of a model, from road inhomogeneities and driver memory.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scaling {
    pub alpha_t: f64,
    pub alpha_v0: f64,
    pub alpha_a: f64,
}

impl Default for Scaling {
    fn default() -> Self {
        Self {
            alpha_t: 1.0,
            alpha_v0: 1.0,
            alpha_a: 1.0,
        }
    }
}

impl Scaling {
    /// Combines two sets of multipliers.
    pub fn combine(self, other: Scaling) -> Scaling {
        Scaling {
            alpha_t: self.alpha_t * other.alpha_t,
            alpha_v0: self.alpha_v0 * other.alpha_v0,
            alpha_a: self.alpha_a * other.alpha_a,
        }
    }
}

/// The scalar situation a model computes an acceleration for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AccelerationInput {
    /// Net distance to the leader, infinite without a leader.
    pub gap: f64,
    /// Own speed.
    pub speed: f64,
    /// Own speed minus the leader's speed.
    pub dv: f64,
    /// The leader's acceleration.
    pub leader_acc: f64,
    /// The speed limit in effect for the vehicle.
    pub speed_limit: f64,
    /// Road grade, rise over run.
    pub slope: f64,
    pub scaling: Scaling,
}

impl AccelerationInput {
    /// The situation described by raw scalars only.
    pub fn simple(gap: f64, speed: f64, dv: f64) -> Self {
        Self {
            gap,
            speed,
            dv,
            leader_acc: 0.0,
            speed_limit: f64::INFINITY,
            slope: 0.0,
            scaling: Scaling::default(),
        }
    }

    /// The situation of `me` following `front`.
    pub fn between(me: &Vehicle, front: Option<&Vehicle>, scaling: Scaling) -> Self {
        let (gap, dv, leader_acc) = match front {
            Some(front) => (me.net_distance(front), me.speed() - front.speed(), front.acc()),
            None => (f64::INFINITY, 0.0, 0.0),
        };
        Self {
            gap,
            speed: me.speed(),
            dv,
            leader_acc,
            speed_limit: me.speed_limit(),
            slope: me.slope(),
            scaling,
        }
    }

    /// The desired speed after scaling and capping by the speed limit.
    pub fn local_desired_speed(&self, v0: f64) -> f64 {
        self.local_desired_speed_in(v0, 1.0)
    }

    /// The local desired speed of a model whose speed unit is `unit` m/s,
    /// e.g. cells per tick. Never negative.
    pub fn local_desired_speed_in(&self, v0: f64, unit: f64) -> f64 {
        f64::max(f64::min(self.scaling.alpha_v0 * v0, self.speed_limit / unit), 0.0)
    }
}

/// The contract shared by all acceleration laws.
pub trait LongitudinalModel: Debug {
    /// The model's name.
    fn name(&self) -> ModelName;

    /// How the integrator must interpret the model's output.
    fn category(&self) -> ModelCategory {
        ModelCategory::Continuous
    }

    /// The free-flow target speed, if the model has that concept.
    fn desired_speed(&self) -> Result<f64>;

    /// The standstill gap, if the model has that concept.
    fn minimum_gap(&self) -> Result<f64>;

    fn has_desired_speed(&self) -> bool {
        self.desired_speed().is_ok()
    }

    fn has_minimum_gap(&self) -> bool {
        self.minimum_gap().is_ok()
    }

    /// The intrinsic update time of iterated maps and cellular automata.
    fn update_time(&self) -> Option<f64> {
        None
    }

    /// The speed relaxation time, for models built around one.
    fn relaxation_time(&self) -> Option<f64> {
        None
    }

    /// The length of one model length unit in m.
    fn scaling_length(&self) -> f64 {
        1.0
    }

    /// Computes the acceleration for a scalar situation.
    fn calc_acc(&self, input: &AccelerationInput) -> f64;

    /// Computes the acceleration of `me` following `front`.
    fn accelerate(&self, me: &Vehicle, front: Option<&Vehicle>, scaling: Scaling) -> f64 {
        self.calc_acc(&AccelerationInput::between(me, front, scaling))
    }

    /// Computes the acceleration from raw scalars, without speed limit or scaling.
    fn accelerate_simple(&self, gap: f64, speed: f64, dv: f64) -> f64 {
        self.calc_acc(&AccelerationInput::simple(gap, speed, dv))
    }
}

/// Builds the model described by `params`.
///
/// Stochastic models draw from `rng`, which should be the simulation's stream.
pub fn create_model(params: &ModelParameters, rng: &SharedRng) -> Result<Rc<dyn LongitudinalModel>> {
    params.validate()?;
    let model: Rc<dyn LongitudinalModel> = match params {
        ModelParameters::Idm(p) => Rc::new(Idm::new(p.clone())),
        ModelParameters::Acc(p) => Rc::new(Acc::new(p.clone())),
        ModelParameters::OvmFvdm(p) => Rc::new(OvmFvdm::new(p.clone())),
        ModelParameters::Gipps(p) => Rc::new(Gipps::new(p.clone())),
        ModelParameters::Krauss(p) => Rc::new(Krauss::new(p.clone(), rng.clone())),
        ModelParameters::Newell(p) => Rc::new(Newell::new(p.clone())),
        ModelParameters::Nsm(p) => Rc::new(Nsm::new(p.clone(), rng.clone())),
        ModelParameters::Kkw(p) => Rc::new(Kkw::new(p.clone(), rng.clone())),
        ModelParameters::Ccs(p) => Rc::new(Ccs::new(p.clone())),
    };
    Ok(model)
}

/// The error returned when a model lacks a desired speed.
pub(crate) fn no_desired_speed(model: ModelName) -> Error {
    Error::NotApplicable {
        model,
        quantity: "desired speed",
    }
}

/// The error returned when a model lacks a minimum gap.
pub(crate) fn no_minimum_gap(model: ModelName) -> Error {
    Error::NotApplicable {
        model,
        quantity: "minimum gap",
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::random::seeded;

    #[test]
    fn names_parse() {
        assert_eq!("idm".parse::<ModelName>(), Ok(ModelName::Idm));
        assert_eq!("OVM_FVDM".parse::<ModelName>(), Ok(ModelName::OvmFvdm));
        for name in ModelName::ALL {
            assert_eq!(name.as_str().parse::<ModelName>(), Ok(name));
        }
        assert_eq!(
            "BOGUS".parse::<ModelName>(),
            Err(Error::UnknownModel("BOGUS".into()))
        );
    }

    #[test]
    fn every_default_model_builds() {
        let rng = seeded(1);
        for name in ModelName::ALL {
            let model = create_model(&ModelParameters::default_for(name), &rng).unwrap();
            assert_eq!(model.name(), name);
        }
    }

    #[test]
    fn capabilities() {
        let rng = seeded(1);
        let build = |name| create_model(&ModelParameters::default_for(name), &rng).unwrap();
        assert!(!build(ModelName::Ccs).has_desired_speed());
        assert!(build(ModelName::Ccs).has_minimum_gap());
        assert!(!build(ModelName::Nsm).has_minimum_gap());
        assert!(!build(ModelName::Kkw).has_minimum_gap());
        assert!(build(ModelName::Nsm).has_desired_speed());
        assert_eq!(
            build(ModelName::Nsm).minimum_gap(),
            Err(Error::NotApplicable {
                model: ModelName::Nsm,
                quantity: "minimum gap"
            })
        );
        for name in [ModelName::Idm, ModelName::Acc, ModelName::OvmFvdm, ModelName::Gipps] {
            assert!(build(name).has_desired_speed());
            assert!(build(name).has_minimum_gap());
        }
    }

    #[test]
    fn categories() {
        let rng = seeded(1);
        let category =
            |name| create_model(&ModelParameters::default_for(name), &rng).unwrap().category();
        assert_eq!(category(ModelName::Idm), ModelCategory::Continuous);
        assert_eq!(category(ModelName::Ccs), ModelCategory::Continuous);
        assert_eq!(category(ModelName::Gipps), ModelCategory::IteratedMap);
        assert_eq!(category(ModelName::Krauss), ModelCategory::IteratedMap);
        assert_eq!(category(ModelName::Newell), ModelCategory::IteratedMap);
        assert_eq!(category(ModelName::Nsm), ModelCategory::CellularAutomaton);
        assert_eq!(category(ModelName::Kkw), ModelCategory::CellularAutomaton);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let rng = seeded(1);
        let params = ModelParameters::Idm(IdmParameters {
            b: 0.0,
            ..Default::default()
        });
        assert!(matches!(
            create_model(&params, &rng),
            Err(Error::InvalidParameter { name: "b", .. })
        ));
    }
}
