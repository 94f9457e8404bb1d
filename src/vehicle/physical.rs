use super::Vehicle;

/// A read-only view of a vehicle's state in SI units.
///
/// Cellular automata work in cells and cells per tick; every other model
/// already works in metres, in which case the view is the identity.
#[derive(Clone, Copy, Debug)]
pub struct PhysicalQuantities<'a> {
    vehicle: &'a Vehicle,
    /// The length of one model length unit in m.
    scale: f64,
}

impl<'a> PhysicalQuantities<'a> {
    pub(crate) fn new(vehicle: &'a Vehicle) -> Self {
        Self {
            vehicle,
            scale: vehicle.longitudinal_model().scaling_length(),
        }
    }

    /// The length of one model length unit in m.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn length(&self) -> f64 {
        self.scale * self.vehicle.length()
    }

    pub fn front_position(&self) -> f64 {
        self.scale * self.vehicle.front_position()
    }

    pub fn rear_position(&self) -> f64 {
        self.scale * self.vehicle.rear_position()
    }

    pub fn speed(&self) -> f64 {
        self.scale * self.vehicle.speed()
    }

    pub fn acc(&self) -> f64 {
        self.scale * self.vehicle.acc()
    }

    pub fn total_travel_distance(&self) -> f64 {
        self.scale * self.vehicle.total_travel_distance()
    }

    /// The bumper-to-bumper distance to a vehicle ahead in m.
    pub fn net_distance(&self, front: &Vehicle) -> f64 {
        self.scale * self.vehicle.net_distance(front)
    }
}
