use crate::composition::{TrafficComposition, VehicleFactory, VehiclePrototype};
use crate::consumption::FuelModel;
use crate::error::{Error, Result};
use crate::light::{LightCycle, TrafficLight, TrafficLightSignal};
use crate::random::{seeded, SharedRng};
use crate::road::{lanes, LaneType, RoadSegment, RoadSegmentAttributes, SegmentView};
use crate::vehicle::{Acceleration, Vehicle, VehicleId};
use crate::{SegmentId, SegmentSet, TrafficLightId, VehicleSet};
use log::debug;
use slotmap::SlotMap;
use std::rc::Rc;

/// The global settings of a simulation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulationSettings {
    /// The timestep in s.
    pub timestep: f64,
    /// The seed of the random stream.
    pub seed: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            timestep: 0.25,
            seed: 42,
        }
    }
}

/// A traffic simulation.
pub struct Simulation {
    settings: SimulationSettings,
    /// The random stream shared by all stochastic models.
    rng: SharedRng,
    factory: VehicleFactory,
    composition: Option<TrafficComposition>,
    /// The road segments in the network.
    segments: SegmentSet,
    /// The vehicles being simulated, ordered by ID.
    vehicles: VehicleSet,
    /// The traffic lights.
    lights: SlotMap<TrafficLightId, TrafficLight>,
    /// The simulated time in s.
    time: f64,
    /// The number of completed steps.
    iteration: u64,
}

impl Simulation {
    /// Creates a new simulation of vehicles of the given types.
    pub fn new(settings: SimulationSettings, prototypes: Vec<VehiclePrototype>) -> Result<Self> {
        if !(settings.timestep > 0.0) {
            return Err(Error::InvalidSetting("the timestep must be positive"));
        }
        let rng = seeded(settings.seed);
        let factory = VehicleFactory::new(prototypes, rng.clone())?;
        factory.check_timestep(settings.timestep)?;
        Ok(Self {
            settings,
            rng,
            factory,
            composition: None,
            segments: SegmentSet::with_key(),
            vehicles: VehicleSet::new(),
            lights: SlotMap::with_key(),
            time: 0.0,
            iteration: 0,
        })
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// The random stream of the simulation.
    pub fn rng(&self) -> &SharedRng {
        &self.rng
    }

    /// The simulated time in s.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// The number of completed steps.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Sets the shares of the vehicle types in sampled traffic.
    pub fn set_composition(&mut self, fractions: &[(&str, f64)]) -> Result<()> {
        self.composition = Some(TrafficComposition::new(&self.factory, fractions, self.rng.clone())?);
        Ok(())
    }

    /// Sets the fuel model of a vehicle type, for vehicles created afterwards.
    pub fn set_fuel_model(&mut self, label: &str, model: Rc<dyn FuelModel>) -> Result<()> {
        self.factory.set_fuel_model(label, model)
    }

    /// Adds a road segment to the network.
    pub fn add_segment(&mut self, attributes: RoadSegmentAttributes) -> Result<SegmentId> {
        self.segments.try_insert_with_key(|id| RoadSegment::new(id, attributes))
    }

    /// Gets a road segment.
    pub fn segment(&self, id: SegmentId) -> Option<&RoadSegment> {
        self.segments.get(id)
    }

    /// Specifies that traffic leaving the end of `from` enters `to`.
    pub fn connect(&mut self, from: SegmentId, to: SegmentId) -> Result<()> {
        if !self.segments.contains_key(to) {
            return Err(Error::UnknownSegment);
        }
        self.segments.get_mut(from).ok_or(Error::UnknownSegment)?.set_sink(Some(to));
        Ok(())
    }

    /// Specifies that two segments of opposite direction share the overtaking lane.
    pub fn set_peers(&mut self, a: SegmentId, b: SegmentId) -> Result<()> {
        if !self.segments.contains_key(a) || !self.segments.contains_key(b) {
            return Err(Error::UnknownSegment);
        }
        self.segments[a].set_peer(Some(b));
        self.segments[b].set_peer(Some(a));
        Ok(())
    }

    /// Adds a traffic light at a position on a segment.
    pub fn add_traffic_light(&mut self, segment: SegmentId, position: f64, cycle: LightCycle) -> Result<TrafficLightId> {
        if !self.segments.contains_key(segment) {
            return Err(Error::UnknownSegment);
        }
        Ok(self.lights.insert(TrafficLight::new(segment, position, cycle)))
    }

    /// Gets a traffic light.
    pub fn traffic_light(&self, id: TrafficLightId) -> Option<&TrafficLight> {
        self.lights.get(id)
    }

    pub fn traffic_light_mut(&mut self, id: TrafficLightId) -> Option<&mut TrafficLight> {
        self.lights.get_mut(id)
    }

    /// Adds a vehicle of the given type to the simulation.
    ///
    /// # Parameters
    /// * `label` - The label of the vehicle type
    /// * `segment` - The segment to place the vehicle on
    /// * `lane` - The lane to place the vehicle in
    /// * `position` - The front position of the vehicle
    /// * `speed` - The initial speed
    pub fn add_vehicle(
        &mut self,
        label: &str,
        segment: SegmentId,
        lane: i32,
        position: f64,
        speed: f64,
    ) -> Result<VehicleId> {
        let road = self.segments.get(segment).ok_or(Error::UnknownSegment)?;
        road.check_lane(lane)?;
        let mut vehicle = self.factory.create(label)?;
        vehicle.set_location(lane, position);
        vehicle.set_speed(speed);
        vehicle.set_segment(Some(segment));
        vehicle.set_road_conditions(road.speed_limit(), road.slope());
        let id = vehicle.id();
        self.vehicles.insert(id, vehicle);
        self.segments[segment].insert_vehicle(&self.vehicles, lane, id);
        Ok(id)
    }

    /// Adds a vehicle whose type is drawn from the traffic composition.
    pub fn add_sampled_vehicle(&mut self, segment: SegmentId, lane: i32, position: f64, speed: f64) -> Result<VehicleId> {
        let label = self
            .composition
            .as_ref()
            .ok_or(Error::InvalidSetting("no traffic composition is set"))?
            .sample()
            .to_string();
        self.add_vehicle(&label, segment, lane, position, speed)
    }

    /// Removes a vehicle from the simulation.
    pub fn remove_vehicle(&mut self, id: VehicleId) -> Option<Vehicle> {
        let vehicle = self.vehicles.remove(&id)?;
        if let Some(segment) = vehicle.segment().and_then(|s| self.segments.get_mut(s)) {
            segment.remove_vehicle(vehicle.lane(), id);
        }
        Some(vehicle)
    }

    /// Gets a vehicle.
    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(&id)
    }

    /// Gets a vehicle for modification, e.g. of an externally controlled speed.
    pub fn vehicle_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(&id)
    }

    /// Iterates over the vehicles in the simulation, ordered by ID.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// Advances the simulation by one timestep.
    pub fn step(&mut self) {
        let dt = self.settings.timestep;
        // Vehicles may have been moved from outside since the last step
        self.sort_lanes();
        for light in self.lights.values_mut() {
            light.step(dt);
        }
        for vehicle in self.vehicles.values_mut() {
            vehicle.update_lane_change_delay(dt);
            vehicle.update_sub_models(dt);
        }
        self.apply_lane_changes(dt);
        self.apply_accelerations();
        for vehicle in self.vehicles.values_mut() {
            vehicle.update_position_and_speed(dt);
        }
        self.sort_lanes();
        self.hand_over();
        self.time += dt;
        self.iteration += 1;
    }

    /// Finds the vehicles wanting to change lanes on the state before the
    /// update, then decides again and commits one vehicle at a time, so
    /// that each decision sees the lane changes committed before it.
    fn apply_lane_changes(&mut self, dt: f64) {
        let mut candidates: Vec<(SegmentId, VehicleId)> = vec![];
        for segment in self.segments.values() {
            let view = SegmentView::new(&self.segments, &self.vehicles, segment);
            for id in segment.vehicles() {
                if let Some(vehicle) = self.vehicles.get(&id) {
                    if vehicle.decide_lane_change(&view).direction() != lanes::NO_CHANGE {
                        candidates.push((segment.id(), id));
                    }
                }
            }
        }
        candidates.sort_by_key(|(_, id)| *id);

        for (segment, id) in candidates {
            let decision = match (self.segments.get(segment), self.vehicles.get(&id)) {
                (Some(road), Some(vehicle)) => {
                    vehicle.decide_lane_change(&SegmentView::new(&self.segments, &self.vehicles, road))
                }
                _ => continue,
            };
            let vehicle = match self.vehicles.get_mut(&id) {
                Some(vehicle) => vehicle,
                None => continue,
            };
            let from = vehicle.lane();
            if let Some(to) = vehicle.commit_lane_change(decision, dt) {
                debug!("vehicle {} changes from lane {} to {} ({:?})", id, from, to, decision);
                let road = &mut self.segments[segment];
                road.remove_vehicle(from, id);
                road.insert_vehicle(&self.vehicles, to, id);
            }
        }
    }

    fn sort_lanes(&mut self) {
        for segment in self.segments.values_mut() {
            segment.sort_lanes(&self.vehicles);
        }
    }

    /// Computes all accelerations on the state before the update, then
    /// stores them.
    fn apply_accelerations(&mut self) {
        let lights: Vec<&dyn TrafficLightSignal> =
            self.lights.values().map(|light| light as &dyn TrafficLightSignal).collect();
        let mut accelerations: Vec<(VehicleId, Acceleration)> = Vec::with_capacity(self.vehicles.len());
        for segment in self.segments.values() {
            let view = SegmentView::new(&self.segments, &self.vehicles, segment);
            for id in segment.vehicles() {
                if let Some(vehicle) = self.vehicles.get(&id) {
                    accelerations.push((id, vehicle.compute_acceleration(&view, &lights)));
                }
            }
        }
        for (id, acc) in accelerations {
            if let Some(vehicle) = self.vehicles.get_mut(&id) {
                vehicle.set_acceleration(acc.applied, acc.model);
            }
        }
    }

    /// Moves vehicles past the end of their segment onto the downstream
    /// segment, or out of the network.
    fn hand_over(&mut self) {
        let mut passing: Vec<(SegmentId, VehicleId)> = vec![];
        for segment in self.segments.values() {
            for id in segment.vehicles() {
                if let Some(vehicle) = self.vehicles.get(&id) {
                    if vehicle.front_position() > segment.length() {
                        passing.push((segment.id(), id));
                    }
                }
            }
        }
        passing.sort_by_key(|(_, id)| *id);

        for (from, id) in passing {
            let road = &self.segments[from];
            let length = road.length();
            let lane = match self.vehicles.get(&id) {
                Some(vehicle) => vehicle.lane(),
                None => continue,
            };
            let exits = usize::try_from(lane - lanes::MOST_INNER_LANE)
                .ok()
                .and_then(|idx| road.attributes().lanes.get(idx))
                == Some(&LaneType::Exit);
            let sink = road.sink().filter(|_| !exits).and_then(|sink| self.segments.get(sink));

            match sink {
                Some(sink) => {
                    let sink_id = sink.id();
                    let to = lane.clamp(lanes::MOST_INNER_LANE, sink.lane_count());
                    let (speed_limit, slope) = (sink.speed_limit(), sink.slope());
                    if let Some(vehicle) = self.vehicles.get_mut(&id) {
                        vehicle.shift_position(-length);
                        if to != lane {
                            vehicle.enter_lane(to);
                        }
                        vehicle.set_segment(Some(sink_id));
                        vehicle.set_road_conditions(speed_limit, slope);
                    }
                    self.segments[from].remove_vehicle(lane, id);
                    self.segments[sink_id].insert_vehicle(&self.vehicles, to, id);
                }
                None => {
                    debug!("vehicle {} leaves the network", id);
                    self.remove_vehicle(id);
                }
            }
        }
    }
}
