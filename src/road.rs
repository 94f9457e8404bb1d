//! Road segments and the neighbour queries the driving models rely on.

use crate::error::{Error, Result};
use crate::math::PiecewiseLinear;
use crate::model::Scaling;
use crate::vehicle::{Vehicle, VehicleId};
use crate::{SegmentId, SegmentSet, VehicleSet};
use smallvec::{smallvec, SmallVec};
use std::cmp::Ordering;

/// Lane numbering and lane change directions.
///
/// Lanes are numbered from the innermost (leftmost) lane 1 outwards. Lane 0
/// is the overtaking lane shared with the peer carriageway.
pub mod lanes {
    /// The overtaking lane on the carriageway of oncoming traffic.
    pub const OVERTAKING: i32 = 0;
    /// The innermost regular lane.
    pub const MOST_INNER_LANE: i32 = 1;
    pub const TO_LEFT: i32 = -1;
    pub const TO_RIGHT: i32 = 1;
    pub const NO_CHANGE: i32 = 0;
}

/// The purpose of a lane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LaneType {
    #[default]
    Traffic,
    /// An on-ramp lane which ends at the end of the segment.
    Entrance,
    /// An off-ramp lane leaving the network at the end of the segment.
    Exit,
}

/// Spatially varying multipliers of the driving behaviour along a segment.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Inhomogeneity {
    /// The time headway multiplier over position.
    pub alpha_t: PiecewiseLinear,
    /// The desired speed multiplier over position.
    pub alpha_v0: PiecewiseLinear,
}

/// The attributes of a road segment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RoadSegmentAttributes {
    /// The length of the segment.
    pub length: f64,
    /// The type of each lane, from lane 1 outwards.
    pub lanes: Vec<LaneType>,
    /// The speed limit in m/s.
    pub speed_limit: f64,
    /// Road grade, rise over run.
    pub slope: f64,
    pub inhomogeneity: Option<Inhomogeneity>,
}

impl Default for RoadSegmentAttributes {
    fn default() -> Self {
        Self {
            length: 1000.0,
            lanes: vec![LaneType::Traffic],
            speed_limit: f64::INFINITY,
            slope: 0.0,
            inhomogeneity: None,
        }
    }
}

/// The queries about a vehicle's surroundings that lane changing and
/// acceleration need.
///
/// Front and rear vehicles are searched on the same segment only.
pub trait LaneNeighbours {
    /// The segment's ID.
    fn id(&self) -> SegmentId;

    /// The number of regular lanes.
    fn lane_count(&self) -> i32;

    /// The length of the segment.
    fn length(&self) -> f64;

    /// The type of a lane, or `None` if the lane does not exist.
    fn lane_type(&self, lane: i32) -> Option<LaneType>;

    /// The nearest vehicle ahead of `me` in `lane`.
    fn front_vehicle(&self, lane: i32, me: &Vehicle) -> Option<&Vehicle>;

    /// The nearest vehicle behind `me` in `lane`.
    fn rear_vehicle(&self, lane: i32, me: &Vehicle) -> Option<&Vehicle>;

    /// The rearmost vehicle in `lane` of the downstream segment, whose
    /// positions are offset by [LaneNeighbours::length].
    fn downstream_rear_vehicle(&self, lane: i32) -> Option<&Vehicle>;

    /// The rearmost vehicle in the exit lane of `exit`, if `exit` follows
    /// this segment.
    fn downstream_exit_rear(&self, exit: SegmentId) -> Option<&Vehicle>;

    /// Whether an opposite direction segment shares the overtaking lane.
    fn has_peer(&self) -> bool;

    /// The nearest oncoming vehicle on the peer segment as the distance
    /// between the two fronts and its speed.
    fn oncoming_vehicle(&self, me: &Vehicle) -> Option<(f64, f64)>;

    /// The behaviour multipliers at a position.
    fn scaling_at(&self, _position: f64) -> Scaling {
        Scaling::default()
    }

    /// The first exit lane of the segment.
    fn exit_lane(&self) -> Option<i32> {
        (lanes::MOST_INNER_LANE..=self.lane_count()).find(|&lane| self.lane_type(lane) == Some(LaneType::Exit))
    }
}

/// A road segment with one or more lanes in one direction.
#[derive(Clone, Debug)]
pub struct RoadSegment {
    id: SegmentId,
    attributes: RoadSegmentAttributes,
    /// The vehicles in each lane, indexed by lane number.
    lanes: SmallVec<[Vec<VehicleId>; 4]>,
    /// The segment traffic flows into.
    sink: Option<SegmentId>,
    /// The opposite direction segment sharing the overtaking lane.
    peer: Option<SegmentId>,
}

impl RoadSegment {
    /// Creates a new segment.
    pub(crate) fn new(id: SegmentId, attributes: RoadSegmentAttributes) -> Result<Self> {
        if attributes.lanes.is_empty() {
            return Err(Error::InvalidSetting("a road segment needs at least one lane"));
        }
        if !(attributes.length > 0.0) {
            return Err(Error::InvalidSetting("a road segment needs a positive length"));
        }
        if !(attributes.speed_limit > 0.0) {
            return Err(Error::InvalidSetting("the speed limit must be positive"));
        }
        let lanes = smallvec![Vec::new(); attributes.lanes.len() + 1];
        Ok(Self {
            id,
            attributes,
            lanes,
            sink: None,
            peer: None,
        })
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn attributes(&self) -> &RoadSegmentAttributes {
        &self.attributes
    }

    pub fn length(&self) -> f64 {
        self.attributes.length
    }

    /// The number of regular lanes.
    pub fn lane_count(&self) -> i32 {
        self.attributes.lanes.len() as i32
    }

    pub fn speed_limit(&self) -> f64 {
        self.attributes.speed_limit
    }

    pub fn slope(&self) -> f64 {
        self.attributes.slope
    }

    pub fn sink(&self) -> Option<SegmentId> {
        self.sink
    }

    pub(crate) fn set_sink(&mut self, sink: Option<SegmentId>) {
        self.sink = sink;
    }

    pub fn peer(&self) -> Option<SegmentId> {
        self.peer
    }

    pub(crate) fn set_peer(&mut self, peer: Option<SegmentId>) {
        self.peer = peer;
    }

    /// Checks that a vehicle may be placed in `lane`.
    pub fn check_lane(&self, lane: i32) -> Result<()> {
        let valid = (lanes::MOST_INNER_LANE..=self.lane_count()).contains(&lane)
            || (lane == lanes::OVERTAKING && self.peer.is_some());
        if valid {
            Ok(())
        } else {
            Err(Error::InvalidLane {
                lane,
                lane_count: self.lane_count(),
            })
        }
    }

    /// The IDs of the vehicles in a lane, from the rearmost to the foremost.
    pub fn lane_vehicles(&self, lane: i32) -> &[VehicleId] {
        usize::try_from(lane)
            .ok()
            .and_then(|idx| self.lanes.get(idx))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The IDs of all vehicles on the segment.
    pub fn vehicles(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.lanes.iter().flatten().copied()
    }

    /// Inserts a vehicle into a lane, keeping the lane ordered by position.
    pub(crate) fn insert_vehicle(&mut self, vehicles: &VehicleSet, lane: i32, id: VehicleId) {
        let me = match vehicles.get(&id) {
            Some(vehicle) => vehicle,
            None => return,
        };
        if let Some(ids) = usize::try_from(lane).ok().and_then(|idx| self.lanes.get_mut(idx)) {
            let idx = ids.partition_point(|other| {
                vehicles
                    .get(other)
                    .map_or(true, |other| by_position(other, me) == Ordering::Less)
            });
            ids.insert(idx, id);
        }
    }

    /// Restores the order of the lanes after vehicles have moved.
    pub(crate) fn sort_lanes(&mut self, vehicles: &VehicleSet) {
        for ids in self.lanes.iter_mut() {
            ids.sort_by(|a, b| match (vehicles.get(a), vehicles.get(b)) {
                (Some(a), Some(b)) => by_position(a, b),
                _ => Ordering::Equal,
            });
        }
    }

    /// Removes a vehicle from a lane.
    pub(crate) fn remove_vehicle(&mut self, lane: i32, id: VehicleId) {
        if let Some(ids) = usize::try_from(lane).ok().and_then(|idx| self.lanes.get_mut(idx)) {
            if let Some(idx) = ids.iter().position(|v| *v == id) {
                ids.remove(idx);
            }
        }
    }

    /// The rearmost vehicle in a lane.
    fn rearmost<'v>(&self, vehicles: &'v VehicleSet, lane: i32) -> Option<&'v Vehicle> {
        self.lane_vehicles(lane).first().and_then(|id| vehicles.get(id))
    }
}

/// Orders vehicles from rear to front. Equal positions are ordered by age,
/// older vehicles ahead.
fn by_position(a: &Vehicle, b: &Vehicle) -> Ordering {
    a.front_position()
        .total_cmp(&b.front_position())
        .then_with(|| b.id().cmp(&a.id()))
}

/// Whether `other` is ahead of `me` in the same lane.
fn is_ahead(other: &Vehicle, me: &Vehicle) -> bool {
    by_position(other, me) == Ordering::Greater
}

/// A segment seen together with its neighbours and the vehicles on them.
#[derive(Clone, Copy)]
pub struct SegmentView<'a> {
    pub(crate) segments: &'a SegmentSet,
    pub(crate) vehicles: &'a VehicleSet,
    pub(crate) segment: &'a RoadSegment,
}

impl<'a> SegmentView<'a> {
    pub(crate) fn new(segments: &'a SegmentSet, vehicles: &'a VehicleSet, segment: &'a RoadSegment) -> Self {
        Self {
            segments,
            vehicles,
            segment,
        }
    }

    /// The index of the first vehicle in `ids` ahead of `me`.
    fn first_ahead(&self, ids: &[VehicleId], me: &Vehicle) -> usize {
        ids.partition_point(|id| self.vehicles.get(id).map_or(true, |v| !is_ahead(v, me)))
    }

    fn sink(&self) -> Option<&'a RoadSegment> {
        self.segment.sink.and_then(|id| self.segments.get(id))
    }
}

impl<'a> LaneNeighbours for SegmentView<'a> {
    fn id(&self) -> SegmentId {
        self.segment.id
    }

    fn lane_count(&self) -> i32 {
        self.segment.lane_count()
    }

    fn length(&self) -> f64 {
        self.segment.length()
    }

    fn lane_type(&self, lane: i32) -> Option<LaneType> {
        if lane == lanes::OVERTAKING {
            return self.segment.peer.map(|_| LaneType::Traffic);
        }
        usize::try_from(lane - lanes::MOST_INNER_LANE)
            .ok()
            .and_then(|idx| self.segment.attributes.lanes.get(idx))
            .copied()
    }

    fn front_vehicle(&self, lane: i32, me: &Vehicle) -> Option<&Vehicle> {
        let ids = self.segment.lane_vehicles(lane);
        ids.get(self.first_ahead(ids, me)).and_then(|id| self.vehicles.get(id))
    }

    fn rear_vehicle(&self, lane: i32, me: &Vehicle) -> Option<&Vehicle> {
        let ids = self.segment.lane_vehicles(lane);
        ids[..self.first_ahead(ids, me)]
            .iter()
            .rev()
            .find(|id| **id != me.id())
            .and_then(|id| self.vehicles.get(id))
    }

    fn downstream_rear_vehicle(&self, lane: i32) -> Option<&Vehicle> {
        let sink = self.sink()?;
        let lane = lane.min(sink.lane_count());
        sink.rearmost(self.vehicles, lane)
    }

    fn downstream_exit_rear(&self, exit: SegmentId) -> Option<&Vehicle> {
        let sink = self.sink().filter(|sink| sink.id == exit)?;
        let exit_lane = (lanes::MOST_INNER_LANE..=sink.lane_count())
            .find(|&lane| sink.attributes.lanes[(lane - 1) as usize] == LaneType::Exit)?;
        sink.rearmost(self.vehicles, exit_lane)
    }

    fn has_peer(&self) -> bool {
        self.segment.peer.is_some()
    }

    fn oncoming_vehicle(&self, me: &Vehicle) -> Option<(f64, f64)> {
        let peer = self.segments.get(self.segment.peer?)?;
        // Positions on the peer run in the opposite direction
        peer.vehicles()
            .filter_map(|id| self.vehicles.get(&id))
            .map(|v| (peer.length() - v.front_position() - me.front_position(), v.speed()))
            .filter(|(distance, _)| *distance >= 0.0)
            .min_by(|a, b| a.0.total_cmp(&b.0))
    }

    fn scaling_at(&self, position: f64) -> Scaling {
        match &self.segment.attributes.inhomogeneity {
            Some(inhomogeneity) => Scaling {
                alpha_t: inhomogeneity.alpha_t.eval_or(position, 1.0),
                alpha_v0: inhomogeneity.alpha_v0.eval_or(position, 1.0),
                alpha_a: 1.0,
            },
            None => Scaling::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{create_model, ModelName, ModelParameters};
    use crate::random::seeded;
    use crate::vehicle::{VehicleAttributes, VehicleKind};
    use slotmap::SlotMap;

    fn place(vehicles: &mut VehicleSet, segment: &mut RoadSegment, id: u64, lane: i32, pos: f64) {
        let model = create_model(&ModelParameters::default_for(ModelName::Idm), &seeded(0)).unwrap();
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
        veh.set_location(lane, pos);
        vehicles.insert(VehicleId(id), veh);
        segment.insert_vehicle(vehicles, lane, VehicleId(id));
    }

    #[test]
    fn neighbours_in_lane() {
        let mut segments = SegmentSet::with_key();
        let mut vehicles = VehicleSet::new();
        let id = segments.insert_with_key(|id| {
            RoadSegment::new(
                id,
                RoadSegmentAttributes {
                    lanes: vec![LaneType::Traffic, LaneType::Traffic, LaneType::Exit],
                    ..Default::default()
                },
            )
            .unwrap()
        });
        let segment = &mut segments[id];
        place(&mut vehicles, segment, 1, 1, 100.0);
        place(&mut vehicles, segment, 2, 1, 50.0);
        place(&mut vehicles, segment, 3, 1, 150.0);
        place(&mut vehicles, segment, 4, 2, 120.0);

        let view = SegmentView::new(&segments, &vehicles, &segments[id]);
        let me = &vehicles[&VehicleId(1)];
        assert_eq!(view.front_vehicle(1, me).map(Vehicle::id), Some(VehicleId(3)));
        assert_eq!(view.rear_vehicle(1, me).map(Vehicle::id), Some(VehicleId(2)));
        assert_eq!(view.front_vehicle(2, me).map(Vehicle::id), Some(VehicleId(4)));
        assert!(view.rear_vehicle(2, me).is_none());
        assert!(view.front_vehicle(3, me).is_none());
        assert_eq!(view.lane_count(), 3);
        assert_eq!(view.lane_type(3), Some(LaneType::Exit));
        assert_eq!(view.lane_type(4), None);
        assert_eq!(view.lane_type(lanes::OVERTAKING), None);
        assert_eq!(view.exit_lane(), Some(3));
        assert!(!view.has_peer());
    }

    #[test]
    fn lanes_are_checked() {
        let mut segments: SlotMap<SegmentId, RoadSegment> = SlotMap::with_key();
        let id = segments.insert_with_key(|id| RoadSegment::new(id, RoadSegmentAttributes::default()).unwrap());
        assert!(segments[id].check_lane(1).is_ok());
        assert_eq!(
            segments[id].check_lane(2),
            Err(Error::InvalidLane { lane: 2, lane_count: 1 })
        );
        assert!(segments[id].check_lane(lanes::OVERTAKING).is_err());
        segments[id].set_peer(Some(id));
        assert!(segments[id].check_lane(lanes::OVERTAKING).is_ok());
    }

    #[test]
    fn empty_segments_are_rejected() {
        let mut segments: SlotMap<SegmentId, RoadSegment> = SlotMap::with_key();
        let key = segments.insert_with_key(|id| RoadSegment::new(id, RoadSegmentAttributes::default()).unwrap());
        let attributes = RoadSegmentAttributes {
            lanes: vec![],
            ..Default::default()
        };
        assert!(RoadSegment::new(key, attributes).is_err());
        for speed_limit in [0.0, -1.0, f64::NAN] {
            let attributes = RoadSegmentAttributes {
                speed_limit,
                ..Default::default()
            };
            assert_eq!(
                RoadSegment::new(key, attributes).err(),
                Some(Error::InvalidSetting("the speed limit must be positive"))
            );
        }
    }

    #[test]
    fn lanes_are_ordered_by_position() {
        let mut segments = SegmentSet::with_key();
        let mut vehicles = VehicleSet::new();
        let id = segments.insert_with_key(|id| RoadSegment::new(id, RoadSegmentAttributes::default()).unwrap());
        let segment = &mut segments[id];
        place(&mut vehicles, segment, 1, 1, 100.0);
        place(&mut vehicles, segment, 2, 1, 300.0);
        place(&mut vehicles, segment, 3, 1, 200.0);
        // Same position as vehicle 1, but younger and therefore behind it
        place(&mut vehicles, segment, 4, 1, 100.0);
        let order = |segment: &RoadSegment| segment.lane_vehicles(1).iter().map(|id| id.0).collect::<Vec<_>>();
        assert_eq!(order(segment), vec![4, 1, 3, 2]);

        vehicles.get_mut(&VehicleId(3)).unwrap().shift_position(150.0);
        segment.sort_lanes(&vehicles);
        assert_eq!(order(segment), vec![4, 1, 2, 3]);

        let view = SegmentView::new(&segments, &vehicles, &segments[id]);
        let me = &vehicles[&VehicleId(1)];
        assert_eq!(view.front_vehicle(1, me).map(Vehicle::id), Some(VehicleId(2)));
        assert_eq!(view.rear_vehicle(1, me).map(Vehicle::id), Some(VehicleId(4)));
        let me = &vehicles[&VehicleId(4)];
        assert_eq!(view.front_vehicle(1, me).map(Vehicle::id), Some(VehicleId(1)));
        assert!(view.rear_vehicle(1, me).is_none());
    }

    #[test]
    fn inhomogeneity_scales_behaviour() {
        let mut segments = SegmentSet::with_key();
        let vehicles = VehicleSet::new();
        let id = segments.insert_with_key(|id| {
            RoadSegment::new(
                id,
                RoadSegmentAttributes {
                    inhomogeneity: Some(Inhomogeneity {
                        alpha_t: PiecewiseLinear::new(vec![(0.0, 1.0), (100.0, 2.0)]),
                        alpha_v0: PiecewiseLinear::default(),
                    }),
                    ..Default::default()
                },
            )
            .unwrap()
        });
        let view = SegmentView::new(&segments, &vehicles, &segments[id]);
        assert_eq!(view.scaling_at(50.0).alpha_t, 1.5);
        assert_eq!(view.scaling_at(50.0).alpha_v0, 1.0);
    }

    #[test]
    fn oncoming_vehicles_on_peer() {
        let mut segments = SegmentSet::with_key();
        let mut vehicles = VehicleSet::new();
        let a = segments.insert_with_key(|id| RoadSegment::new(id, RoadSegmentAttributes::default()).unwrap());
        let b = segments.insert_with_key(|id| RoadSegment::new(id, RoadSegmentAttributes::default()).unwrap());
        segments[a].set_peer(Some(b));
        segments[b].set_peer(Some(a));
        place(&mut vehicles, &mut segments[a], 1, 1, 100.0);
        // 1000 - 600 = 400 on segment a
        place(&mut vehicles, &mut segments[b], 2, 1, 600.0);
        // 1000 - 950 = 50, behind vehicle 1
        place(&mut vehicles, &mut segments[b], 3, 1, 950.0);
        vehicles.get_mut(&VehicleId(2)).unwrap().set_speed(20.0);

        let view = SegmentView::new(&segments, &vehicles, &segments[a]);
        let me = &vehicles[&VehicleId(1)];
        assert_eq!(view.oncoming_vehicle(me), Some((300.0, 20.0)));
        assert_eq!(view.lane_type(lanes::OVERTAKING), Some(LaneType::Traffic));
    }
}
