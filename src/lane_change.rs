//! Lane changing with the MOBIL model.
//!
//! A vehicle changes lanes when its own acceleration advantage, minus the
//! politeness-weighted disadvantage to the followers involved, exceeds a
//! threshold and the new follower does not have to brake harder than a
//! safe deceleration.

use crate::model::Scaling;
use crate::road::{lanes, LaneNeighbours, LaneType};
use crate::vehicle::Vehicle;
use log::trace;

/// The parameters of overtaking on the carriageway of oncoming traffic.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OvertakingParameters {
    /// The largest gap to a leader which is considered for overtaking, in m.
    pub max_gap_behind_leader: f64,
    /// The smallest excess of the desired speed over the leader's speed, in m/s.
    pub min_speed_difference: f64,
    /// The smallest gap to merge back into, in m.
    pub min_target_gap: f64,
    /// The time gap to keep to oncoming traffic at the end of the manoeuvre, in s.
    pub safety_time_gap: f64,
}

impl Default for OvertakingParameters {
    fn default() -> Self {
        Self {
            max_gap_behind_leader: 100.0,
            min_speed_difference: 5.0,
            min_target_gap: 10.0,
            safety_time_gap: 2.0,
        }
    }
}

/// The parameters of the MOBIL lane-change model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LaneChangeParameters {
    /// The weight of the followers' disadvantage.
    pub politeness: f64,
    /// The advantage needed to change lanes, in m/s<sup>2</sup>.
    pub threshold: f64,
    /// The extra advantage of changing to the right, in m/s<sup>2</sup>.
    pub bias_right: f64,
    /// The strongest deceleration a change may impose on the new follower.
    pub safe_deceleration: f64,
    /// The smallest gap to the new leader and follower, in m.
    pub minimum_gap: f64,
    /// Whether vehicles must not pass a leader in the lane to the left.
    pub european_rules: bool,
    /// Below this speed of the leader to the left passing on the right is allowed, in m/s.
    pub crit_speed_european_rules: f64,
    pub overtaking: Option<OvertakingParameters>,
}

impl Default for LaneChangeParameters {
    fn default() -> Self {
        Self {
            politeness: 0.1,
            threshold: 0.2,
            bias_right: 0.3,
            safe_deceleration: 4.0,
            minimum_gap: 2.0,
            european_rules: false,
            crit_speed_european_rules: 60.0 / 3.6,
            overtaking: None,
        }
    }
}

/// The outcome of evaluating the lane-change model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaneChangeDecision {
    /// Nothing was evaluated.
    None,
    /// The vehicle stays in its lane.
    NoChange,
    ToLeft,
    ToRight,
    /// Pull out into the overtaking lane.
    OvertakeViaPeer,
    /// Forced change to the right, towards an exit or back from the overtaking lane.
    MandatoryToRight,
}

impl LaneChangeDecision {
    /// The change in lane number the decision implies.
    pub fn direction(self) -> i32 {
        match self {
            LaneChangeDecision::None | LaneChangeDecision::NoChange => lanes::NO_CHANGE,
            LaneChangeDecision::ToLeft | LaneChangeDecision::OvertakeViaPeer => lanes::TO_LEFT,
            LaneChangeDecision::ToRight | LaneChangeDecision::MandatoryToRight => lanes::TO_RIGHT,
        }
    }
}

/// The acceleration changes a lane change would bring about.
struct Prospect {
    /// The own acceleration in the target lane.
    me_new: f64,
    /// The new follower's acceleration with and without the change.
    new_back_new: f64,
    new_back_old: f64,
}

/// The MOBIL lane-change model; configured models are initialized.
#[derive(Clone, Debug, Default)]
pub struct LaneChangeModel {
    params: Option<LaneChangeParameters>,
}

impl LaneChangeModel {
    /// Creates an initialized model.
    pub fn new(params: LaneChangeParameters) -> Self {
        Self { params: Some(params) }
    }

    /// Whether the model was configured.
    pub fn is_initialized(&self) -> bool {
        self.params.is_some()
    }

    pub fn parameters(&self) -> Option<&LaneChangeParameters> {
        self.params.as_ref()
    }

    /// Decides whether to change lanes on a multi-lane segment.
    pub fn make_decision(&self, me: &Vehicle, road: &dyn LaneNeighbours) -> LaneChangeDecision {
        let params = match self.params.as_ref() {
            Some(params) => params,
            None => return LaneChangeDecision::None,
        };
        if let Some(decision) = self.mandatory_decision(params, me, road) {
            return decision;
        }
        if road.lane_type(me.lane()) == Some(LaneType::Exit) {
            return LaneChangeDecision::NoChange;
        }

        let balance = |direction: i32| {
            let lane = me.lane() + direction;
            if road.lane_type(lane) == Some(LaneType::Traffic) && lane >= lanes::MOST_INNER_LANE {
                self.calc_acceleration_balance(params, me, direction, road)
            } else {
                f64::NEG_INFINITY
            }
        };
        let to_left = balance(lanes::TO_LEFT);
        let to_right = balance(lanes::TO_RIGHT);

        if to_left > 0.0 || to_right > 0.0 {
            trace!("vehicle {}: balance left {to_left}, right {to_right}", me.id());
            if to_right > to_left {
                LaneChangeDecision::ToRight
            } else {
                LaneChangeDecision::ToLeft
            }
        } else {
            LaneChangeDecision::NoChange
        }
    }

    /// Merges from an entrance lane, and moves towards the exit lane on
    /// the exit segment; only the safety criterion applies.
    fn mandatory_decision(
        &self,
        params: &LaneChangeParameters,
        me: &Vehicle,
        road: &dyn LaneNeighbours,
    ) -> Option<LaneChangeDecision> {
        if road.lane_type(me.lane()) == Some(LaneType::Entrance) {
            let target = me.lane() + lanes::TO_LEFT;
            let decision = match road.lane_type(target) {
                Some(LaneType::Traffic) if target >= lanes::MOST_INNER_LANE => {
                    match self.prospect(params, me, target, road) {
                        Some(_) => LaneChangeDecision::ToLeft,
                        None => LaneChangeDecision::NoChange,
                    }
                }
                _ => LaneChangeDecision::NoChange,
            };
            return Some(decision);
        }
        if me.exit_segment() == Some(road.id()) {
            let exit_lane = road.exit_lane()?;
            if me.lane() >= exit_lane {
                return None;
            }
            let target = me.lane() + lanes::TO_RIGHT;
            return Some(match self.prospect(params, me, target, road) {
                Some(_) => LaneChangeDecision::MandatoryToRight,
                None => LaneChangeDecision::NoChange,
            });
        }
        None
    }

    /// Evaluates the gaps and the safety criterion in `target`; `None` if
    /// a change is not safe.
    fn prospect(
        &self,
        params: &LaneChangeParameters,
        me: &Vehicle,
        target: i32,
        road: &dyn LaneNeighbours,
    ) -> Option<Prospect> {
        let new_front = road.front_vehicle(target, me);
        let new_back = road.rear_vehicle(target, me);

        let changing = |v: Option<&Vehicle>| v.map_or(false, Vehicle::in_process_of_lane_change);
        if changing(new_front) || changing(new_back) {
            return None;
        }

        let gap_front = new_front.map_or(f64::INFINITY, |front| me.net_distance(front));
        let gap_back = new_back.map_or(f64::INFINITY, |back| back.net_distance(me));
        if gap_front < params.minimum_gap || gap_back < params.minimum_gap {
            return None;
        }

        let (new_back_new, new_back_old) = match new_back {
            Some(back) => {
                let model = back.longitudinal_model();
                (
                    model.accelerate(back, Some(me), Scaling::default()),
                    model.accelerate(back, new_front, Scaling::default()),
                )
            }
            None => (0.0, 0.0),
        };
        if new_back_new <= -params.safe_deceleration {
            return None;
        }

        let me_new = me.longitudinal_model().accelerate(me, new_front, Scaling::default());
        Some(Prospect {
            me_new,
            new_back_new,
            new_back_old,
        })
    }

    /// The MOBIL incentive to change in `direction`, after subtracting the
    /// threshold and adding the bias to the right. Unsafe changes yield
    /// negative infinity.
    pub fn calc_acceleration_balance(
        &self,
        params: &LaneChangeParameters,
        me: &Vehicle,
        direction: i32,
        road: &dyn LaneNeighbours,
    ) -> f64 {
        let prospect = match self.prospect(params, me, me.lane() + direction, road) {
            Some(prospect) => prospect,
            None => return f64::NEG_INFINITY,
        };

        let old_front = road.front_vehicle(me.lane(), me);
        let old_back = road.rear_vehicle(me.lane(), me);
        let me_old = me.longitudinal_model().accelerate(me, old_front, Scaling::default());
        let (old_back_new, old_back_old) = match old_back {
            Some(back) => {
                let model = back.longitudinal_model();
                (
                    model.accelerate(back, old_front, Scaling::default()),
                    model.accelerate(back, Some(me), Scaling::default()),
                )
            }
            None => (0.0, 0.0),
        };

        let bias = if direction == lanes::TO_RIGHT {
            params.bias_right
        } else {
            -params.bias_right
        };
        let others = (old_back_new - old_back_old) + (prospect.new_back_new - prospect.new_back_old);
        prospect.me_new - me_old + params.politeness * others - params.threshold + bias
    }

    /// Decides about overtaking via the peer carriageway on a single-lane
    /// segment, and about returning from the overtaking lane.
    pub fn make_decision_for_overtaking(&self, me: &Vehicle, road: &dyn LaneNeighbours) -> LaneChangeDecision {
        let (params, overtaking) = match self.params.as_ref() {
            Some(params) => match params.overtaking.as_ref() {
                Some(overtaking) => (params, overtaking),
                None => return LaneChangeDecision::None,
            },
            None => return LaneChangeDecision::None,
        };
        if road.lane_count() != 1 || !road.has_peer() || me.in_process_of_lane_change() {
            return LaneChangeDecision::None;
        }
        match me.lane() {
            lanes::MOST_INNER_LANE => self.consider_overtaking(params, overtaking, me, road),
            lanes::OVERTAKING => self.consider_returning(params, overtaking, me, road),
            _ => LaneChangeDecision::None,
        }
    }

    fn consider_overtaking(
        &self,
        params: &LaneChangeParameters,
        overtaking: &OvertakingParameters,
        me: &Vehicle,
        road: &dyn LaneNeighbours,
    ) -> LaneChangeDecision {
        let front = match road.front_vehicle(lanes::MOST_INNER_LANE, me) {
            Some(front) => front,
            None => return LaneChangeDecision::NoChange,
        };
        let gap = me.net_distance(front);
        if gap > overtaking.max_gap_behind_leader {
            return LaneChangeDecision::NoChange;
        }
        let desired_speed = match me.longitudinal_model().desired_speed() {
            Ok(v0) => f64::min(v0, me.speed_limit()),
            Err(_) => return LaneChangeDecision::NoChange,
        };
        let dv = desired_speed - front.speed();
        if dv < overtaking.min_speed_difference {
            return LaneChangeDecision::NoChange;
        }

        // The distance to gain on the leader and the time this takes
        let distance = gap + front.length() + me.length() + overtaking.min_target_gap;
        let duration = distance / dv;
        let travel = desired_speed * duration;
        if me.front_position() + travel > road.length() {
            return LaneChangeDecision::NoChange;
        }

        if let Some(ahead) = road.front_vehicle(lanes::OVERTAKING, me) {
            if me.net_distance(ahead) < travel {
                return LaneChangeDecision::NoChange;
            }
        }
        if let Some(behind) = road.rear_vehicle(lanes::OVERTAKING, me) {
            if behind.net_distance(me) < params.minimum_gap {
                return LaneChangeDecision::NoChange;
            }
        }
        if let Some((distance, speed)) = road.oncoming_vehicle(me) {
            let needed = travel + speed * duration + overtaking.safety_time_gap * (desired_speed + speed);
            if distance < needed {
                return LaneChangeDecision::NoChange;
            }
        }
        LaneChangeDecision::OvertakeViaPeer
    }

    fn consider_returning(
        &self,
        params: &LaneChangeParameters,
        overtaking: &OvertakingParameters,
        me: &Vehicle,
        road: &dyn LaneNeighbours,
    ) -> LaneChangeDecision {
        let gap_front = road
            .front_vehicle(lanes::MOST_INNER_LANE, me)
            .map_or(f64::INFINITY, |front| me.net_distance(front));
        let back = road.rear_vehicle(lanes::MOST_INNER_LANE, me);
        let gap_back = back.map_or(f64::INFINITY, |back| back.net_distance(me));
        if gap_front < overtaking.min_target_gap || gap_back < overtaking.min_target_gap {
            return LaneChangeDecision::NoChange;
        }
        let safe = back.map_or(true, |back| {
            back.longitudinal_model().accelerate(back, Some(me), Scaling::default()) > -params.safe_deceleration
        });
        if safe {
            LaneChangeDecision::MandatoryToRight
        } else {
            LaneChangeDecision::NoChange
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{create_model, IdmParameters, ModelParameters};
    use crate::random::seeded;
    use crate::road::{RoadSegment, RoadSegmentAttributes, SegmentView};
    use crate::vehicle::{VehicleAttributes, VehicleId, VehicleKind};
    use crate::{SegmentId, SegmentSet, VehicleSet};
    use std::rc::Rc;

    struct Scene {
        segments: SegmentSet,
        vehicles: VehicleSet,
        road: SegmentId,
    }

    impl Scene {
        fn new(lanes: Vec<LaneType>) -> Self {
            let mut segments = SegmentSet::with_key();
            let road = segments.insert_with_key(|id| {
                RoadSegment::new(
                    id,
                    RoadSegmentAttributes {
                        lanes,
                        ..Default::default()
                    },
                )
                .unwrap()
            });
            Self {
                segments,
                vehicles: VehicleSet::new(),
                road,
            }
        }

        fn add(&mut self, id: u64, lane: i32, pos: f64, speed: f64, v0: f64) {
            let params = ModelParameters::Idm(IdmParameters {
                v0,
                ..Default::default()
            });
            let model = create_model(&params, &seeded(0)).unwrap();
            let mut veh = Vehicle::new(
                VehicleId(id),
                "car",
                &VehicleAttributes {
                    length: 5.0,
                    width: 2.0,
                    max_deceleration: 9.0,
                    kind: VehicleKind::Ordinary,
                },
                model,
            );
            veh.set_lane_change_model(Some(Rc::new(LaneChangeModel::new(LaneChangeParameters {
                overtaking: Some(OvertakingParameters::default()),
                ..Default::default()
            }))));
            veh.set_location(lane, pos);
            veh.set_speed(speed);
            self.vehicles.insert(VehicleId(id), veh);
            self.segments[self.road].insert_vehicle(&self.vehicles, lane, VehicleId(id));
        }

        fn decide(&self, id: u64) -> LaneChangeDecision {
            let view = SegmentView::new(&self.segments, &self.vehicles, &self.segments[self.road]);
            self.vehicles[&VehicleId(id)].decide_lane_change(&view)
        }
    }

    #[test]
    fn stays_on_free_road() {
        let mut scene = Scene::new(vec![LaneType::Traffic, LaneType::Traffic]);
        scene.add(1, 2, 100.0, 20.0, 30.0);
        assert_eq!(scene.decide(1), LaneChangeDecision::NoChange);
    }

    #[test]
    fn passes_slow_leader() {
        let mut scene = Scene::new(vec![LaneType::Traffic, LaneType::Traffic]);
        scene.add(1, 2, 100.0, 25.0, 30.0);
        scene.add(2, 2, 130.0, 10.0, 10.0);
        assert_eq!(scene.decide(1), LaneChangeDecision::ToLeft);
    }

    #[test]
    fn keeps_right_when_free() {
        let mut scene = Scene::new(vec![LaneType::Traffic, LaneType::Traffic]);
        scene.add(1, 1, 100.0, 30.0, 30.0);
        // The bias to the right outweighs the threshold
        assert_eq!(scene.decide(1), LaneChangeDecision::ToRight);
    }

    #[test]
    fn unsafe_gap_is_rejected() {
        let mut scene = Scene::new(vec![LaneType::Traffic, LaneType::Traffic]);
        scene.add(1, 2, 100.0, 25.0, 30.0);
        scene.add(2, 2, 130.0, 10.0, 10.0);
        // A fast follower right behind in the target lane
        scene.add(3, 1, 97.0, 30.0, 30.0);
        assert_eq!(scene.decide(1), LaneChangeDecision::NoChange);
    }

    #[test]
    fn advantage_equal_to_threshold_stays() {
        let mut scene = Scene::new(vec![LaneType::Traffic, LaneType::Traffic]);
        scene.add(1, 1, 100.0, 30.0, 30.0);
        let params = LaneChangeParameters {
            bias_right: 0.2,
            ..Default::default()
        };
        let view = SegmentView::new(&scene.segments, &scene.vehicles, &scene.segments[scene.road]);
        let model = LaneChangeModel::new(params.clone());
        let me = &scene.vehicles[&VehicleId(1)];
        // Identical surroundings in both lanes, so only threshold and bias remain
        assert_eq!(model.calc_acceleration_balance(&params, me, lanes::TO_RIGHT, &view), 0.0);
        assert_eq!(model.make_decision(me, &view), LaneChangeDecision::NoChange);
    }

    #[test]
    fn merges_from_entrance_lane() {
        let mut scene = Scene::new(vec![LaneType::Traffic, LaneType::Entrance]);
        scene.add(1, 2, 100.0, 20.0, 30.0);
        assert_eq!(scene.decide(1), LaneChangeDecision::ToLeft);
        scene.add(2, 1, 99.0, 20.0, 30.0);
        assert_eq!(scene.decide(1), LaneChangeDecision::NoChange);
    }

    #[test]
    fn heads_for_exit_lane() {
        let mut scene = Scene::new(vec![LaneType::Traffic, LaneType::Traffic, LaneType::Exit]);
        scene.add(1, 1, 100.0, 20.0, 30.0);
        let road = scene.road;
        scene.vehicles.get_mut(&VehicleId(1)).unwrap().set_exit_segment(Some(road));
        assert_eq!(scene.decide(1), LaneChangeDecision::MandatoryToRight);
        // Never leaves the exit lane again
        scene.add(2, 3, 200.0, 20.0, 30.0);
        scene.vehicles.get_mut(&VehicleId(2)).unwrap().set_exit_segment(Some(road));
        assert_eq!(scene.decide(2), LaneChangeDecision::NoChange);
    }

    #[test]
    fn overtakes_via_peer() {
        let mut scene = Scene::new(vec![LaneType::Traffic]);
        let peer = scene
            .segments
            .insert_with_key(|id| RoadSegment::new(id, RoadSegmentAttributes::default()).unwrap());
        let road = scene.road;
        scene.segments[road].set_peer(Some(peer));
        scene.segments[peer].set_peer(Some(road));
        scene.add(1, 1, 100.0, 20.0, 30.0);
        scene.add(2, 1, 130.0, 15.0, 15.0);
        assert_eq!(scene.decide(1), LaneChangeDecision::OvertakeViaPeer);

        // Oncoming vehicle at 1000 - 700 = 300
        let mut oncoming = scene.vehicles[&VehicleId(2)].clone();
        oncoming.set_location(1, 700.0);
        scene.vehicles.insert(VehicleId(3), oncoming);
        scene.segments[peer].insert_vehicle(&scene.vehicles, 1, VehicleId(3));
        assert_eq!(scene.decide(1), LaneChangeDecision::NoChange);
    }

    #[test]
    fn returns_from_overtaking_lane() {
        let mut scene = Scene::new(vec![LaneType::Traffic]);
        let road = scene.road;
        scene.segments[road].set_peer(Some(road));
        scene.add(1, lanes::OVERTAKING, 200.0, 30.0, 30.0);
        scene.add(2, 1, 190.0, 15.0, 15.0);
        assert_eq!(scene.decide(1), LaneChangeDecision::NoChange);
        scene.vehicles.get_mut(&VehicleId(2)).unwrap().set_location(1, 150.0);
        assert_eq!(scene.decide(1), LaneChangeDecision::MandatoryToRight);
    }

    #[test]
    fn uninitialized_model_decides_nothing() {
        let mut scene = Scene::new(vec![LaneType::Traffic, LaneType::Traffic]);
        scene.add(1, 1, 100.0, 20.0, 30.0);
        scene
            .vehicles
            .get_mut(&VehicleId(1))
            .unwrap()
            .set_lane_change_model(Some(Rc::new(LaneChangeModel::default())));
        assert_eq!(scene.decide(1), LaneChangeDecision::None);
    }
}
