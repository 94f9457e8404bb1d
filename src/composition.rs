//! Vehicle types, the factory creating vehicles of a type and the traffic
//! composition sampling types by their share of the traffic.

use crate::consumption::FuelModel;
use crate::error::{Error, Result};
use crate::lane_change::{LaneChangeModel, LaneChangeParameters};
use crate::model::{create_model, LongitudinalModel, ModelCategory, ModelName, ModelParameters};
use crate::random::{next_f64, SharedRng};
use crate::vehicle::{
    Memory, MemoryParameters, Noise, NoiseParameters, Vehicle, VehicleAttributes, VehicleId, VehicleKind,
};
use crate::util::Interval;
use log::warn;
use rand_distr::{Distribution, Normal};
use std::rc::Rc;

/// The range of the random desired speed factor.
const DESIRED_SPEED_FACTOR: Interval = Interval::new(0.75, 1.25);

/// A vehicle type.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VehiclePrototype {
    /// The unique label of the type.
    pub label: String,
    pub length: f64,
    pub width: f64,
    /// The maximum deceleration, positive, in m/s<sup>2</sup>.
    pub max_deceleration: f64,
    pub kind: VehicleKind,
    pub model: ModelParameters,
    pub lane_change: Option<LaneChangeParameters>,
    pub memory: Option<MemoryParameters>,
    pub noise: Option<NoiseParameters>,
    /// The standard deviation of the desired speed factor of each vehicle.
    pub desired_speed_spread: f64,
}

impl Default for VehiclePrototype {
    fn default() -> Self {
        Self {
            label: "car".to_string(),
            length: 5.0,
            width: 2.0,
            max_deceleration: 9.0,
            kind: VehicleKind::Ordinary,
            model: ModelParameters::default_for(ModelName::Idm),
            lane_change: None,
            memory: None,
            noise: None,
            desired_speed_spread: 0.0,
        }
    }
}

/// A prototype with the models its vehicles share.
#[derive(Debug)]
struct VehicleType {
    prototype: VehiclePrototype,
    /// The longitudinal model of vehicles without a random desired speed.
    model: Rc<dyn LongitudinalModel>,
    lane_change: Option<Rc<LaneChangeModel>>,
    fuel: Option<Rc<dyn FuelModel>>,
}

/// Creates vehicles from prototypes.
#[derive(Debug)]
pub struct VehicleFactory {
    types: Vec<VehicleType>,
    rng: SharedRng,
    next_id: u64,
}

impl VehicleFactory {
    /// Creates a factory for the given prototypes, whose labels must be unique.
    pub fn new(prototypes: Vec<VehiclePrototype>, rng: SharedRng) -> Result<Self> {
        let mut types: Vec<VehicleType> = Vec::with_capacity(prototypes.len());
        for prototype in prototypes {
            if types.iter().any(|t| t.prototype.label == prototype.label) {
                return Err(Error::DuplicateLabel(prototype.label));
            }
            if !(prototype.desired_speed_spread >= 0.0) {
                return Err(Error::InvalidSetting("the desired speed spread must not be negative"));
            }
            let model = create_model(&prototype.model, &rng)?;
            let lane_change = prototype
                .lane_change
                .clone()
                .map(|params| Rc::new(LaneChangeModel::new(params)));
            types.push(VehicleType {
                prototype,
                model,
                lane_change,
                fuel: None,
            });
        }
        Ok(Self {
            types,
            rng,
            next_id: 0,
        })
    }

    /// The labels of the known vehicle types.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.prototype.label.as_str())
    }

    pub fn prototype(&self, label: &str) -> Option<&VehiclePrototype> {
        self.find(label).ok().map(|t| &t.prototype)
    }

    fn find(&self, label: &str) -> Result<&VehicleType> {
        self.types
            .iter()
            .find(|t| t.prototype.label == label)
            .ok_or_else(|| Error::UnknownLabel(label.to_string()))
    }

    /// Sets the fuel model of a vehicle type.
    pub fn set_fuel_model(&mut self, label: &str, model: Rc<dyn FuelModel>) -> Result<()> {
        let t = self
            .types
            .iter_mut()
            .find(|t| t.prototype.label == label)
            .ok_or_else(|| Error::UnknownLabel(label.to_string()))?;
        t.fuel = Some(model);
        Ok(())
    }

    /// Checks that every vehicle type can be simulated with the timestep `dt`.
    pub fn check_timestep(&self, dt: f64) -> Result<()> {
        for t in &self.types {
            match (t.model.category(), t.model.update_time()) {
                (ModelCategory::CellularAutomaton, Some(expected)) if expected != dt => {
                    return Err(Error::Timestep {
                        model: t.model.name(),
                        expected,
                        actual: dt,
                    });
                }
                (ModelCategory::IteratedMap, Some(update_time)) if update_time != dt => {
                    warn!(
                        "vehicle type `{}`: {} model updates every {} s, simulation every {} s",
                        t.prototype.label,
                        t.model.name(),
                        update_time,
                        dt
                    );
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Creates a vehicle of the type with the given label.
    pub fn create(&mut self, label: &str) -> Result<Vehicle> {
        let t = self.find(label)?;
        let p = &t.prototype;
        let model = if p.desired_speed_spread > 0.0 {
            let normal = Normal::new(1.0, p.desired_speed_spread)
                .map_err(|_| Error::InvalidSetting("the desired speed spread must be finite"))?;
            let factor = DESIRED_SPEED_FACTOR.clamp(normal.sample(&mut *self.rng.borrow_mut()));
            create_model(&p.model.with_desired_speed_factor(factor), &self.rng)?
        } else {
            t.model.clone()
        };

        let attributes = VehicleAttributes {
            length: p.length,
            width: p.width,
            max_deceleration: p.max_deceleration,
            kind: p.kind,
        };
        let mut vehicle = Vehicle::new(VehicleId(self.next_id), &p.label, &attributes, model);
        vehicle.set_lane_change_model(t.lane_change.clone());
        vehicle.set_memory(p.memory.clone().map(Memory::new));
        vehicle.set_noise(p.noise.clone().map(|params| Noise::new(params, self.rng.clone())));
        vehicle.set_fuel_model(t.fuel.clone());
        self.next_id += 1;
        Ok(vehicle)
    }
}

/// The share of each vehicle type in the traffic.
#[derive(Debug)]
pub struct TrafficComposition {
    /// Labels with a share of the traffic and their cumulative normalized fractions.
    cumulative: Vec<(String, f64)>,
    rng: SharedRng,
}

impl TrafficComposition {
    /// Creates a composition from `(label, fraction)` pairs; the fractions
    /// are normalized.
    pub fn new(factory: &VehicleFactory, fractions: &[(&str, f64)], rng: SharedRng) -> Result<Self> {
        for (label, fraction) in fractions {
            factory.find(label)?;
            if !(*fraction >= 0.0) {
                return Err(Error::InvalidSetting("vehicle type fractions must not be negative"));
            }
        }
        let total: f64 = fractions.iter().map(|(_, fraction)| fraction).sum();
        if !(total > 0.0) {
            return Err(Error::ZeroFractions);
        }
        let mut sum = 0.0;
        let cumulative = fractions
            .iter()
            .filter(|(_, fraction)| *fraction > 0.0)
            .map(|(label, fraction)| {
                sum += fraction / total;
                (label.to_string(), sum)
            })
            .collect();
        Ok(Self { cumulative, rng })
    }

    /// Draws the label of the next vehicle's type.
    pub fn sample(&self) -> &str {
        let r = next_f64(&self.rng);
        self.cumulative
            .iter()
            .find(|(_, cumulative)| r < *cumulative)
            .or_else(|| self.cumulative.last())
            .map_or("", |(label, _)| label.as_str())
    }
}
