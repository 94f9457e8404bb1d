//! A microscopic traffic simulation kernel.
//!
//! Vehicles follow one of several longitudinal (car-following) models,
//! change lanes with MOBIL and are advanced by an integrator matching the
//! update semantics of their model.

pub use composition::{TrafficComposition, VehicleFactory, VehiclePrototype};
pub use consumption::FuelModel;
pub use equilibrium::EquilibriumProperties;
pub use error::{Error, Result};
pub use lane_change::{LaneChangeDecision, LaneChangeModel, LaneChangeParameters, OvertakingParameters};
pub use light::{LightCycle, LightState, TrafficLight, TrafficLightSignal};
pub use model::{create_model, LongitudinalModel, ModelCategory, ModelName, ModelParameters};
pub use road::{lanes, LaneNeighbours, LaneType, RoadSegment, RoadSegmentAttributes};
pub use simulation::{Simulation, SimulationSettings};
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
use std::collections::BTreeMap;
pub use util::Interval;
pub use vehicle::{Vehicle, VehicleAttributes, VehicleId, VehicleKind};

mod composition;
mod consumption;
pub mod equilibrium;
mod error;
mod lane_change;
mod light;
pub mod math;
pub mod model;
pub mod random;
pub mod road;
mod simulation;
mod util;
pub mod vehicle;

new_key_type! {
    /// Unique ID of a [RoadSegment].
    pub struct SegmentId;
    /// Unique ID of a [TrafficLight].
    pub struct TrafficLightId;
}

type SegmentSet = SlotMap<SegmentId, RoadSegment>;
type VehicleSet = BTreeMap<VehicleId, Vehicle>;
