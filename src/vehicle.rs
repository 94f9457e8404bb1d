use crate::consumption::FuelModel;
use crate::error::{Error, Result};
use crate::lane_change::{LaneChangeDecision, LaneChangeModel};
use crate::math::round_half_up;
use crate::model::{LongitudinalModel, ModelCategory};
use crate::road::lanes;
use crate::SegmentId;
use log::{trace, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

pub use self::acceleration::Acceleration;
pub use self::memory::{Memory, MemoryParameters};
pub use self::noise::{Noise, NoiseParameters};
pub use self::physical::PhysicalQuantities;

mod acceleration;
mod memory;
mod noise;
mod physical;

/// The duration of a lane change in s.
pub const LANE_CHANGE_DURATION: f64 = 5.0;

// A vehicle must not be able to cross two lanes within one transition.
const _: () = assert!(LANE_CHANGE_DURATION > 0.0);

/// Brake lights turn on when the acceleration drops below minus this, in m/s<sup>2</sup>.
const BRAKE_LIGHT_ON: f64 = 0.2;

/// Brake lights turn off when the acceleration rises above minus this, in m/s<sup>2</sup>.
const BRAKE_LIGHT_OFF: f64 = 0.1;

/// Brake lights only turn on above this speed, in m/s.
const BRAKE_LIGHT_MIN_SPEED: f64 = 0.1;

/// Below this speed a vehicle counts as standing, in m/s.
const STANDSTILL_SPEED: f64 = 1e-4;

/// Unique, monotonically increasing ID of a [Vehicle].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleId(pub u64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a vehicle is driven.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VehicleKind {
    /// Driven by its longitudinal and lane-change models.
    #[default]
    Ordinary,
    /// An immovable obstacle.
    Obstacle,
    /// Speed is set from outside the simulation.
    ExternalControl,
    /// No particular role; driven like an ordinary vehicle.
    None,
}

/// The attributes of a simulated vehicle.
#[derive(Clone, Copy, Debug)]
pub struct VehicleAttributes {
    /// The vehicle length.
    pub length: f64,
    /// The vehicle width.
    pub width: f64,
    /// The maximum deceleration of the vehicle, a positive number in m/s<sup>2</sup>.
    pub max_deceleration: f64,
    pub kind: VehicleKind,
}

/// A simulated vehicle.
///
/// Lengths and positions are in the units of the vehicle's longitudinal
/// model, which are cells for cellular automata; [PhysicalQuantities] gives
/// the view in SI units.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's ID.
    id: VehicleId,
    /// The label of the vehicle type.
    label: String,
    kind: VehicleKind,
    /// The vehicle length; may be changed for boundary conditions.
    length: f64,
    width: f64,
    /// The maximum deceleration, positive.
    max_deceleration: f64,
    /// The longitudinal position of the front of the vehicle.
    front_position: f64,
    /// The front position before the last update.
    front_position_old: f64,
    speed: f64,
    /// The acceleration applied in the last update.
    acc: f64,
    /// The acceleration applied in the update before.
    acc_old: f64,
    /// The unmoderated model acceleration of the last update.
    acc_model: f64,
    total_travel_distance: f64,
    total_travel_time: f64,
    total_fuel_used: f64,
    lane: i32,
    lane_old: i32,
    /// The lane being changed into, while a lane change is in progress.
    target_lane: Option<i32>,
    /// The time since the last lane change decision in s, saturating at
    /// [LANE_CHANGE_DURATION].
    lane_change_elapsed: f64,
    /// The speed limit of the current road segment.
    road_speed_limit: f64,
    /// A vehicle-specific speed limit.
    speed_limit_override: Option<f64>,
    /// Road grade, rise over run.
    slope: f64,
    /// An upper bound on the acceleration imposed from outside.
    external_acceleration_cap: Option<f64>,
    /// The segment the vehicle is on.
    segment: Option<SegmentId>,
    /// The segment the vehicle wants to leave the network from.
    exit_segment: Option<SegmentId>,
    brake_light_on: bool,
    color: Option<[u8; 3]>,
    longitudinal_model: Rc<dyn LongitudinalModel>,
    lane_change_model: Option<Rc<LaneChangeModel>>,
    memory: Option<Memory>,
    noise: Option<Noise>,
    fuel_model: Option<Rc<dyn FuelModel>>,
    user_data: BTreeMap<String, String>,
}

impl Vehicle {
    /// Creates a new vehicle, standing at the start of the innermost lane.
    pub fn new(
        id: VehicleId,
        label: &str,
        attributes: &VehicleAttributes,
        longitudinal_model: Rc<dyn LongitudinalModel>,
    ) -> Self {
        Self {
            id,
            label: label.to_string(),
            kind: attributes.kind,
            length: attributes.length,
            width: attributes.width,
            max_deceleration: attributes.max_deceleration,
            front_position: 0.0,
            front_position_old: 0.0,
            speed: 0.0,
            acc: 0.0,
            acc_old: 0.0,
            acc_model: 0.0,
            total_travel_distance: 0.0,
            total_travel_time: 0.0,
            total_fuel_used: 0.0,
            lane: lanes::MOST_INNER_LANE,
            lane_old: lanes::MOST_INNER_LANE,
            target_lane: None,
            lane_change_elapsed: LANE_CHANGE_DURATION,
            road_speed_limit: f64::INFINITY,
            speed_limit_override: None,
            slope: 0.0,
            external_acceleration_cap: None,
            segment: None,
            exit_segment: None,
            brake_light_on: false,
            color: None,
            longitudinal_model,
            lane_change_model: None,
            memory: None,
            noise: None,
            fuel_model: None,
            user_data: BTreeMap::new(),
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// The label of the vehicle's type.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> VehicleKind {
        self.kind
    }

    /// The vehicle's length.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Changes the vehicle's length, e.g. to model boundary conditions.
    pub fn set_length(&mut self, length: f64) {
        self.length = length;
    }

    /// The vehicle's width.
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn max_deceleration(&self) -> f64 {
        self.max_deceleration
    }

    /// The longitudinal position of the front of the vehicle.
    pub fn front_position(&self) -> f64 {
        self.front_position
    }

    /// The front position before the last update, for interpolation.
    pub fn front_position_old(&self) -> f64 {
        self.front_position_old
    }

    /// The longitudinal position of the rear of the vehicle.
    pub fn rear_position(&self) -> f64 {
        self.front_position - self.length
    }

    /// The longitudinal position of the centre of the vehicle.
    pub fn mid_position(&self) -> f64 {
        self.front_position - 0.5 * self.length
    }

    /// The vehicle's speed.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// The acceleration applied in the last update.
    pub fn acc(&self) -> f64 {
        self.acc
    }

    /// The acceleration applied in the update before the last.
    pub fn acc_old(&self) -> f64 {
        self.acc_old
    }

    /// The unmoderated acceleration of the longitudinal model in the last update.
    pub fn acc_model(&self) -> f64 {
        self.acc_model
    }

    /// Whether the vehicle is stopped.
    pub fn has_stopped(&self) -> bool {
        self.speed < STANDSTILL_SPEED
    }

    pub fn total_travel_distance(&self) -> f64 {
        self.total_travel_distance
    }

    pub fn total_travel_time(&self) -> f64 {
        self.total_travel_time
    }

    pub fn total_fuel_used(&self) -> f64 {
        self.total_fuel_used
    }

    /// The lane the vehicle is in.
    pub fn lane(&self) -> i32 {
        self.lane
    }

    /// The lane the vehicle was in before its last lane change.
    pub fn lane_old(&self) -> i32 {
        self.lane_old
    }

    /// The lane being changed into, while a lane change is in progress.
    pub fn target_lane(&self) -> Option<i32> {
        self.target_lane
    }

    /// The lane as a continuous quantity, moving from the old to the new lane
    /// during a lane change.
    pub fn continuous_lane(&self) -> f64 {
        if self.in_process_of_lane_change() {
            let frac = self.lane_change_elapsed / LANE_CHANGE_DURATION;
            self.lane_old as f64 + frac * (self.lane - self.lane_old) as f64
        } else {
            self.lane as f64
        }
    }

    /// The speed limit in effect: the road's, capped by the vehicle's own.
    pub fn speed_limit(&self) -> f64 {
        match self.speed_limit_override {
            Some(limit) => f64::min(limit, self.road_speed_limit),
            None => self.road_speed_limit,
        }
    }

    /// Sets the vehicle-specific speed limit, which must be positive.
    pub fn set_speed_limit_override(&mut self, limit: Option<f64>) -> Result<()> {
        if let Some(limit) = limit {
            if !(limit > 0.0) {
                return Err(Error::InvalidSetting("the speed limit must be positive"));
            }
        }
        self.speed_limit_override = limit;
        Ok(())
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Sets the speed limit and grade of the road the vehicle is on.
    pub fn set_road_conditions(&mut self, speed_limit: f64, slope: f64) {
        self.road_speed_limit = speed_limit;
        self.slope = slope;
    }

    /// Caps the vehicle's acceleration from outside, e.g. by a controller.
    pub fn set_external_acceleration_cap(&mut self, cap: Option<f64>) {
        self.external_acceleration_cap = cap;
    }

    /// The segment the vehicle is on.
    pub fn segment(&self) -> Option<SegmentId> {
        self.segment
    }

    pub(crate) fn set_segment(&mut self, segment: Option<SegmentId>) {
        self.segment = segment;
    }

    /// The segment the vehicle wants to leave the network from.
    pub fn exit_segment(&self) -> Option<SegmentId> {
        self.exit_segment
    }

    pub fn set_exit_segment(&mut self, exit: Option<SegmentId>) {
        self.exit_segment = exit;
    }

    pub fn is_brake_light_on(&self) -> bool {
        self.brake_light_on
    }

    pub fn color(&self) -> Option<[u8; 3]> {
        self.color
    }

    pub fn set_color(&mut self, color: Option<[u8; 3]>) {
        self.color = color;
    }

    pub fn longitudinal_model(&self) -> &Rc<dyn LongitudinalModel> {
        &self.longitudinal_model
    }

    pub fn lane_change_model(&self) -> Option<&LaneChangeModel> {
        self.lane_change_model.as_deref()
    }

    pub fn set_lane_change_model(&mut self, model: Option<Rc<LaneChangeModel>>) {
        self.lane_change_model = model;
    }

    pub fn memory(&self) -> Option<&Memory> {
        self.memory.as_ref()
    }

    pub fn set_memory(&mut self, memory: Option<Memory>) {
        self.memory = memory;
    }

    pub fn noise(&self) -> Option<&Noise> {
        self.noise.as_ref()
    }

    pub fn set_noise(&mut self, noise: Option<Noise>) {
        self.noise = noise;
    }

    pub fn set_fuel_model(&mut self, model: Option<Rc<dyn FuelModel>>) {
        self.fuel_model = model;
    }

    /// Opaque key-value data attached by the user.
    pub fn user_data(&self) -> &BTreeMap<String, String> {
        &self.user_data
    }

    pub fn user_data_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.user_data
    }

    /// The scaled view of the vehicle's state in SI units.
    pub fn physical(&self) -> PhysicalQuantities<'_> {
        PhysicalQuantities::new(self)
    }

    /// The bumper-to-bumper distance to a vehicle ahead.
    pub fn net_distance(&self, front: &Vehicle) -> f64 {
        front.rear_position() - self.front_position
    }

    /// Places the vehicle in the given lane and position.
    pub fn set_location(&mut self, lane: i32, front_position: f64) {
        self.lane = lane;
        self.lane_old = lane;
        self.target_lane = None;
        self.lane_change_elapsed = LANE_CHANGE_DURATION;
        self.front_position = front_position;
        self.front_position_old = front_position;
    }

    /// Moves the vehicle into `lane` when the lane it was in does not
    /// continue, keeping its current and previous positions.
    pub(crate) fn enter_lane(&mut self, lane: i32) {
        self.lane = lane;
        self.lane_old = lane;
        self.target_lane = None;
        self.lane_change_elapsed = LANE_CHANGE_DURATION;
    }

    /// Moves the front position by `delta` without driving, e.g. when the
    /// vehicle passes onto the next road segment.
    pub fn shift_position(&mut self, delta: f64) {
        self.front_position += delta;
        self.front_position_old += delta;
    }

    /// Sets the speed, e.g. of an externally controlled vehicle.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    /// Whether the vehicle is in the middle of a lane change.
    pub fn in_process_of_lane_change(&self) -> bool {
        self.lane_change_elapsed > 0.0 && self.lane_change_elapsed < LANE_CHANGE_DURATION
    }

    /// Advances the lane change timer.
    pub fn update_lane_change_delay(&mut self, dt: f64) {
        self.lane_change_elapsed = f64::min(self.lane_change_elapsed + dt, LANE_CHANGE_DURATION);
        if !self.in_process_of_lane_change() {
            self.target_lane = None;
        }
    }

    /// Restarts the lane change timer and advances it straight away, so
    /// the vehicle is in a lane change from this update on.
    fn reset_lane_change_delay(&mut self, dt: f64) {
        self.lane_change_elapsed = 0.0;
        self.update_lane_change_delay(dt);
    }

    /// Evaluates the lane-change model on the given road, without acting on it.
    pub fn decide_lane_change(&self, road: &dyn crate::road::LaneNeighbours) -> LaneChangeDecision {
        let model = match self.lane_change_model.as_deref() {
            Some(model) if model.is_initialized() => model,
            _ => return LaneChangeDecision::None,
        };
        if self.in_process_of_lane_change()
            || (self.kind != VehicleKind::Ordinary && self.kind != VehicleKind::None)
        {
            return LaneChangeDecision::None;
        }
        if road.lane_count() > 1 {
            model.make_decision(self, road)
        } else if road.has_peer() {
            model.make_decision_for_overtaking(self, road)
        } else {
            LaneChangeDecision::None
        }
    }

    /// Acts on a lane-change decision, returning the new lane if it changes.
    pub fn commit_lane_change(&mut self, decision: LaneChangeDecision, dt: f64) -> Option<i32> {
        let direction = decision.direction();
        if direction == lanes::NO_CHANGE {
            return None;
        }
        let target = self.lane + direction;
        self.set_lane(target);
        self.target_lane = Some(target);
        self.reset_lane_change_delay(dt);
        Some(target)
    }

    /// Assigns a new lane, keeping the old one for interpolation.
    pub fn set_lane(&mut self, lane: i32) {
        debug_assert!(lane != self.lane, "vehicle {} is already in lane {}", self.id, lane);
        debug_assert!(lane >= lanes::OVERTAKING);
        self.lane_old = self.lane;
        self.lane = lane;
    }

    /// Updates the noise and memory sub-models.
    pub fn update_sub_models(&mut self, dt: f64) {
        if let Some(noise) = self.noise.as_mut() {
            noise.update(dt);
        }
        if let Some(memory) = self.memory.as_mut() {
            if let Ok(v0) = self.longitudinal_model.desired_speed() {
                memory.update(dt, self.speed, v0);
            }
        }
    }

    /// Stores the accelerations computed for this update.
    pub fn set_acceleration(&mut self, acc: f64, acc_model: f64) {
        self.acc_old = self.acc;
        self.acc = acc;
        self.acc_model = acc_model;
    }

    /// Integrates the vehicle's speed and position.
    ///
    /// # Parameters
    /// * `dt` - The time step in seconds
    pub fn update_position_and_speed(&mut self, dt: f64) {
        self.front_position_old = self.front_position;

        let advance = if self.kind == VehicleKind::Obstacle {
            self.speed = 0.0;
            self.acc = 0.0;
            0.0
        } else if self.kind == VehicleKind::ExternalControl {
            if self.speed < 0.0 {
                warn!("externally controlled vehicle {} has negative speed {}", self.id, self.speed);
                self.speed = 0.0;
            }
            self.speed * dt
        } else {
            match self.longitudinal_model.category() {
                ModelCategory::CellularAutomaton => {
                    self.speed = f64::max(round_half_up(self.speed + dt * self.acc), 0.0);
                    round_half_up(self.front_position + dt * self.speed) - self.front_position
                }
                ModelCategory::IteratedMap => {
                    self.speed = f64::max(self.speed, 0.0);
                    let advance = self.speed * dt + self.acc * dt * dt;
                    self.speed += self.acc * dt;
                    self.clamp_negative_speed();
                    advance
                }
                ModelCategory::Continuous => {
                    let advance = if self.acc * dt < -self.speed {
                        // Stops within this update
                        -0.5 * self.speed * self.speed / self.acc
                    } else {
                        self.speed * dt + 0.5 * self.acc * dt * dt
                    };
                    self.speed += self.acc * dt;
                    self.clamp_negative_speed();
                    advance
                }
            }
        };

        self.front_position += advance;
        self.total_travel_distance += advance;
        self.total_travel_time += dt;
        if let Some(fuel) = self.fuel_model.as_ref() {
            self.total_fuel_used += fuel.fuel_flow(self.speed, self.acc) * dt;
        }
        self.update_brake_light();
    }

    fn clamp_negative_speed(&mut self) {
        if self.speed < 0.0 {
            trace!("vehicle {} clamped from speed {} to zero", self.id, self.speed);
            self.speed = 0.0;
            self.acc = 0.0;
        }
    }

    /// Switches the brake light with hysteresis between two thresholds.
    fn update_brake_light(&mut self) {
        if self.brake_light_on {
            if self.acc > -BRAKE_LIGHT_OFF || self.speed < STANDSTILL_SPEED {
                self.brake_light_on = false;
            }
        } else if self.acc_old > -BRAKE_LIGHT_ON
            && self.acc < -BRAKE_LIGHT_ON
            && self.speed > BRAKE_LIGHT_MIN_SPEED
        {
            self.brake_light_on = true;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::*;
    use crate::random::seeded;
    use assert_approx_eq::assert_approx_eq;

    pub(crate) fn vehicle_with(params: ModelParameters) -> Vehicle {
        let model = create_model(&params, &seeded(0)).unwrap();
        Vehicle::new(
            VehicleId(1),
            "car",
            &VehicleAttributes {
                length: 5.0,
                width: 2.0,
                max_deceleration: 9.0,
                kind: VehicleKind::Ordinary,
            },
            model,
        )
    }

    #[test]
    fn continuous_integration() {
        let mut veh = vehicle_with(ModelParameters::default_for(ModelName::Idm));
        veh.set_speed(10.0);
        veh.set_acceleration(1.0, 1.0);
        veh.update_position_and_speed(0.5);
        assert_approx_eq!(veh.front_position(), 5.0 + 0.125);
        assert_approx_eq!(veh.speed(), 10.5);
        assert_eq!(veh.front_position_old(), 0.0);
        assert_approx_eq!(veh.total_travel_distance(), 5.125);
        assert_approx_eq!(veh.total_travel_time(), 0.5);
    }

    #[test]
    fn continuous_stops_exactly() {
        let mut veh = vehicle_with(ModelParameters::default_for(ModelName::Idm));
        veh.set_speed(2.0);
        veh.set_acceleration(-8.0, -8.0);
        veh.update_position_and_speed(0.5);
        assert_approx_eq!(veh.front_position(), 0.25);
        assert_eq!(veh.speed(), 0.0);
        assert_eq!(veh.acc(), 0.0);
    }

    #[test]
    fn iterated_map_integration() {
        let mut veh = vehicle_with(ModelParameters::default_for(ModelName::Gipps));
        veh.set_speed(10.0);
        veh.set_acceleration(2.0, 2.0);
        veh.update_position_and_speed(0.5);
        assert_approx_eq!(veh.front_position(), 5.0 + 0.5);
        assert_approx_eq!(veh.speed(), 11.0);

        veh.set_acceleration(-30.0, -30.0);
        veh.update_position_and_speed(0.5);
        assert_eq!(veh.speed(), 0.0);
        assert_eq!(veh.acc(), 0.0);
    }

    #[test]
    fn cellular_automaton_snaps_to_cells() {
        let mut veh = vehicle_with(ModelParameters::default_for(ModelName::Nsm));
        veh.set_location(1, 10.3);
        veh.set_speed(3.4);
        veh.set_acceleration(0.2, 0.2);
        veh.update_position_and_speed(1.0);
        assert_eq!(veh.speed(), 4.0);
        assert_eq!(veh.front_position(), 14.0);
        assert_eq!(veh.speed().fract(), 0.0);
        assert_eq!(veh.front_position().fract(), 0.0);
    }

    #[test]
    fn external_control_ignores_acceleration() {
        let mut veh = Vehicle::new(
            VehicleId(2),
            "ext",
            &VehicleAttributes {
                length: 5.0,
                width: 2.0,
                max_deceleration: 9.0,
                kind: VehicleKind::ExternalControl,
            },
            create_model(&ModelParameters::default_for(ModelName::Idm), &seeded(0)).unwrap(),
        );
        veh.set_speed(-3.0);
        veh.set_acceleration(2.0, 2.0);
        veh.update_position_and_speed(1.0);
        assert_eq!(veh.speed(), 0.0);
        assert_eq!(veh.front_position(), 0.0);
        veh.set_speed(4.0);
        veh.update_position_and_speed(0.5);
        assert_eq!(veh.front_position(), 2.0);
    }

    #[test]
    fn brake_light_hysteresis() {
        let mut veh = vehicle_with(ModelParameters::default_for(ModelName::Idm));
        veh.set_speed(20.0);
        let dt = 0.1;
        veh.set_acceleration(-0.15, -0.15);
        veh.update_position_and_speed(dt);
        assert!(!veh.is_brake_light_on());
        veh.set_acceleration(-0.5, -0.5);
        veh.update_position_and_speed(dt);
        assert!(veh.is_brake_light_on());
        // Between the two thresholds the light stays on
        veh.set_acceleration(-0.15, -0.15);
        veh.update_position_and_speed(dt);
        assert!(veh.is_brake_light_on());
        veh.set_acceleration(-0.05, -0.05);
        veh.update_position_and_speed(dt);
        assert!(!veh.is_brake_light_on());
    }

    #[test]
    fn lane_change_timer() {
        let mut veh = vehicle_with(ModelParameters::default_for(ModelName::Idm));
        veh.set_location(2, 0.0);
        assert!(!veh.in_process_of_lane_change());
        let dt = 0.5;
        assert_eq!(veh.commit_lane_change(LaneChangeDecision::ToLeft, dt), Some(1));
        assert!(veh.in_process_of_lane_change());
        assert_eq!(veh.lane(), 1);
        assert_eq!(veh.lane_old(), 2);
        assert_eq!(veh.target_lane(), Some(1));
        let mut elapsed = dt;
        while elapsed + dt < LANE_CHANGE_DURATION {
            veh.update_lane_change_delay(dt);
            elapsed += dt;
            assert!(veh.in_process_of_lane_change());
            assert!(veh.continuous_lane() < 2.0 && veh.continuous_lane() > 1.0);
        }
        veh.update_lane_change_delay(dt);
        assert!(!veh.in_process_of_lane_change());
        assert_eq!(veh.target_lane(), None);
        assert_eq!(veh.continuous_lane(), 1.0);
        assert_eq!(veh.commit_lane_change(LaneChangeDecision::NoChange, dt), None);
    }

    #[test]
    fn speed_limit_override() {
        let mut veh = vehicle_with(ModelParameters::default_for(ModelName::Idm));
        assert_eq!(veh.speed_limit(), f64::INFINITY);
        veh.set_road_conditions(25.0, 0.0);
        assert_eq!(veh.speed_limit(), 25.0);
        veh.set_speed_limit_override(Some(20.0)).unwrap();
        assert_eq!(veh.speed_limit(), 20.0);
        veh.set_speed_limit_override(Some(30.0)).unwrap();
        assert_eq!(veh.speed_limit(), 25.0);
        assert!(veh.set_speed_limit_override(Some(-1.0)).is_err());
        assert!(veh.set_speed_limit_override(Some(f64::NAN)).is_err());
        assert_eq!(veh.speed_limit(), 25.0);
        veh.set_speed_limit_override(None).unwrap();
        assert_eq!(veh.speed_limit(), 25.0);
    }
}
