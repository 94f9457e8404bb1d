use crate::road::LaneNeighbours;
use crate::vehicle::Vehicle;
use crate::SegmentId;

/// Vehicles facing an amber light drive through when stopping would need
/// more than this deceleration, in m/s<sup>2</sup>.
const AMBER_DRIVE_THROUGH_DECELERATION: f64 = 6.0;

/// The state of a traffic light.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LightState {
    Red,
    Amber,
    Green,
}

impl LightState {
    /// The state following this one in the cycle.
    pub fn next(self) -> Self {
        match self {
            LightState::Green => LightState::Amber,
            LightState::Amber => LightState::Red,
            LightState::Red => LightState::Green,
        }
    }
}

/// The durations of the phases of a traffic light cycle in s.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LightCycle {
    pub green: f64,
    pub amber: f64,
    pub red: f64,
}

impl Default for LightCycle {
    fn default() -> Self {
        Self {
            green: 30.0,
            amber: 3.0,
            red: 30.0,
        }
    }
}

/// A source of the acceleration a traffic light imposes on a vehicle.
pub trait TrafficLightSignal {
    /// The acceleration needed to obey the light, or NaN if the light
    /// does not constrain `me`.
    fn acceleration_considering_traffic_light(&self, me: &Vehicle, road: &dyn LaneNeighbours) -> f64;
}

/// A fixed time traffic light at a stop line on a road segment.
#[derive(Clone, Debug)]
pub struct TrafficLight {
    /// The segment the light stands on.
    segment: SegmentId,
    /// The position of the stop line.
    position: f64,
    cycle: LightCycle,
    /// The current state.
    state: LightState,
    /// The time since the current state was entered.
    since: f64,
}

impl TrafficLight {
    /// Creates a traffic light which starts at the beginning of its green phase.
    pub fn new(segment: SegmentId, position: f64, cycle: LightCycle) -> Self {
        Self {
            segment,
            position,
            cycle,
            state: LightState::Green,
            since: 0.0,
        }
    }

    pub fn segment(&self) -> SegmentId {
        self.segment
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn state(&self) -> LightState {
        self.state
    }

    /// Sets the state, restarting its phase.
    pub fn set_state(&mut self, state: LightState) {
        self.state = state;
        self.since = 0.0;
    }

    /// The duration of a phase.
    fn duration(&self, state: LightState) -> f64 {
        match state {
            LightState::Green => self.cycle.green,
            LightState::Amber => self.cycle.amber,
            LightState::Red => self.cycle.red,
        }
    }

    /// Advances the traffic light timing.
    pub fn step(&mut self, dt: f64) {
        self.since += dt;
        // At most one full cycle per update
        for _ in 0..3 {
            let duration = self.duration(self.state);
            if self.since < duration {
                break;
            }
            self.since -= duration;
            self.state = self.state.next();
        }
    }
}

impl TrafficLightSignal for TrafficLight {
    fn acceleration_considering_traffic_light(&self, me: &Vehicle, road: &dyn LaneNeighbours) -> f64 {
        if road.id() != self.segment || self.state == LightState::Green {
            return f64::NAN;
        }
        let distance = self.position - me.front_position();
        if distance < 0.0 {
            return f64::NAN;
        }
        let speed = me.speed();
        if self.state == LightState::Amber
            && speed * speed / (2.0 * distance) > AMBER_DRIVE_THROUGH_DECELERATION
        {
            return f64::NAN;
        }
        let acc = me.longitudinal_model().accelerate_simple(distance, speed, speed);
        if acc < 0.0 {
            acc
        } else {
            f64::NAN
        }
    }
}
