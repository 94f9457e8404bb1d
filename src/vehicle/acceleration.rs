//! The acceleration pipeline of a vehicle: noise, behaviour scaling, the
//! longitudinal model and the moderation by external constraints.

use super::{Vehicle, VehicleKind};
use crate::lane_change::LaneChangeParameters;
use crate::light::TrafficLightSignal;
use crate::math::{min_constraint, smooth_step};
use crate::model::{AccelerationInput, Scaling};
use crate::road::{lanes, LaneNeighbours, LaneType};
use log::trace;

/// Positive acceleration noise is suppressed below this gap, in m.
const CRITICAL_GAP: f64 = 2.0;

/// The width of the transition to the European overtaking rule, in m/s.
const EUROPEAN_RULE_TRANSITION: f64 = 1.0;

/// The accelerations of one update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Acceleration {
    /// The acceleration to apply.
    pub applied: f64,
    /// The unmoderated acceleration of the longitudinal model.
    pub model: f64,
}

impl Vehicle {
    /// Computes the acceleration for the next update.
    ///
    /// # Parameters
    /// * `road` - The segment the vehicle is on
    /// * `lights` - The traffic lights which may constrain the vehicle
    pub fn compute_acceleration(
        &self,
        road: &dyn LaneNeighbours,
        lights: &[&dyn TrafficLightSignal],
    ) -> Acceleration {
        if self.kind == VehicleKind::ExternalControl {
            return Acceleration {
                applied: self.acc,
                model: self.acc,
            };
        }

        let input = self.leader_input(road, self.lane, self.scaling(road));
        let acc_error = match self.noise.as_ref() {
            Some(noise) if input.gap < CRITICAL_GAP => f64::min(noise.acc_error(), 0.0),
            Some(noise) => noise.acc_error(),
            None => 0.0,
        };

        let acc_model = match self.lane_change_model.as_ref().and_then(|lc| lc.parameters()) {
            Some(params) if params.european_rules => self.european_acceleration(road, &input, params),
            _ => self.longitudinal_model.calc_acc(&input),
        };

        let acc = if self.lane == lanes::OVERTAKING || self.kind == VehicleKind::Obstacle {
            acc_model
        } else {
            self.moderate(acc_model, road, lights, input.scaling)
        };

        Acceleration {
            applied: f64::max(acc + acc_error, -self.max_deceleration),
            model: acc_model,
        }
    }

    /// The multipliers from the road and the driver's memory.
    fn scaling(&self, road: &dyn LaneNeighbours) -> Scaling {
        let mut scaling = road.scaling_at(self.front_position);
        if let Some(memory) = self.memory.as_ref() {
            scaling = scaling.combine(memory.scaling());
        }
        if scaling.alpha_v0 != 1.0 && !self.longitudinal_model.has_desired_speed() {
            trace!(
                "vehicle {}: {} model has no desired speed to scale",
                self.id,
                self.longitudinal_model.name()
            );
            scaling.alpha_v0 = 1.0;
        }
        scaling
    }

    /// The situation of following the leader in `lane`, which may already
    /// be on the downstream segment.
    fn leader_input(&self, road: &dyn LaneNeighbours, lane: i32, scaling: Scaling) -> AccelerationInput {
        let input = AccelerationInput::between(self, road.front_vehicle(lane, self), scaling);
        if input.gap.is_finite() {
            return input;
        }
        match road.downstream_rear_vehicle(lane) {
            Some(front) => AccelerationInput {
                gap: road.length() + front.rear_position() - self.front_position,
                dv: self.speed - front.speed(),
                leader_acc: front.acc(),
                ..input
            },
            None => input,
        }
    }

    /// Blends in the acceleration behind the leader in the lane to the
    /// left, which must not be overtaken on the right.
    fn european_acceleration(
        &self,
        road: &dyn LaneNeighbours,
        input: &AccelerationInput,
        params: &LaneChangeParameters,
    ) -> f64 {
        let acc_own = self.longitudinal_model.calc_acc(input);
        let left = self.lane + lanes::TO_LEFT;
        if left < lanes::MOST_INNER_LANE {
            return acc_own;
        }
        let front_left = match road.front_vehicle(left, self) {
            Some(front) => front,
            None => return acc_own,
        };
        let speed_left = front_left.speed();
        if speed_left <= params.crit_speed_european_rules {
            return acc_own;
        }
        let acc_left = self
            .longitudinal_model
            .calc_acc(&AccelerationInput::between(self, Some(front_left), input.scaling));
        let weight = smooth_step(self.speed - speed_left, EUROPEAN_RULE_TRANSITION);
        f64::min(acc_own, weight * acc_left + (1.0 - weight) * acc_own)
    }

    /// Limits the model acceleration by traffic lights, lane ends and the
    /// external cap.
    fn moderate(
        &self,
        acc: f64,
        road: &dyn LaneNeighbours,
        lights: &[&dyn TrafficLightSignal],
        scaling: Scaling,
    ) -> f64 {
        let mut acc = acc;
        for light in lights {
            acc = min_constraint(acc, light.acceleration_considering_traffic_light(self, road));
        }
        acc = min_constraint(acc, self.acceleration_considering_exit(road, scaling));
        if let Some(cap) = self.external_acceleration_cap {
            acc = f64::min(acc, cap);
        }
        acc
    }

    /// The acceleration needed to reach an exit or to stop at the end of
    /// an ending lane, or NaN if neither applies.
    fn acceleration_considering_exit(&self, road: &dyn LaneNeighbours, scaling: Scaling) -> f64 {
        let lane_type = road.lane_type(self.lane);
        if lane_type == Some(LaneType::Entrance) {
            return self.acceleration_to_segment_end(road, scaling);
        }
        let exit = match self.exit_segment {
            Some(exit) => exit,
            None => return f64::NAN,
        };
        if exit == road.id() {
            if lane_type == Some(LaneType::Exit) {
                return f64::NAN;
            }
            let mut acc = self.acceleration_to_segment_end(road, scaling);
            if let Some(front) = road.exit_lane().and_then(|lane| road.front_vehicle(lane, self)) {
                let behind = self
                    .longitudinal_model
                    .calc_acc(&AccelerationInput::between(self, Some(front), scaling));
                acc = f64::min(acc, behind);
            }
            return acc;
        }
        match road.downstream_exit_rear(exit) {
            Some(rear) => self.longitudinal_model.calc_acc(&AccelerationInput {
                gap: road.length() - self.front_position + rear.rear_position(),
                dv: self.speed - rear.speed(),
                leader_acc: rear.acc(),
                ..AccelerationInput::between(self, None, scaling)
            }),
            None => f64::NAN,
        }
    }

    /// The acceleration to stop at the end of the segment.
    fn acceleration_to_segment_end(&self, road: &dyn LaneNeighbours, scaling: Scaling) -> f64 {
        self.longitudinal_model.calc_acc(&AccelerationInput {
            gap: road.length() - self.front_position,
            dv: self.speed,
            ..AccelerationInput::between(self, None, scaling)
        })
    }
}
