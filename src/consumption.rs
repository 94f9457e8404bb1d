use std::fmt::Debug;

/// An instantaneous fuel consumption model.
///
/// Vehicles integrate the consumption rate over their updates.
pub trait FuelModel: Debug {
    /// The fuel flow in l/s at the given speed and acceleration.
    fn fuel_flow(&self, speed: f64, acc: f64) -> f64;
}
