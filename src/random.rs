//! The pseudo-random stream shared by all stochastic parts of a simulation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use std::cell::RefCell;
use std::rc::Rc;

/// A handle to a single sequential random stream.
///
/// Cloning the handle does not fork the stream: every holder draws from
/// the same generator, so a run is reproducible from its seed alone.
pub type SharedRng = Rc<RefCell<StdRng>>;

/// Creates a new stream from the given seed.
pub fn seeded(seed: u64) -> SharedRng {
    Rc::new(RefCell::new(StdRng::seed_from_u64(seed)))
}

/// Draws a uniformly distributed number in `[0, 1)`.
pub fn next_f64(rng: &SharedRng) -> f64 {
    rng.borrow_mut().gen::<f64>()
}

/// Draws a standard normally distributed number.
pub fn next_gaussian(rng: &SharedRng) -> f64 {
    StandardNormal.sample(&mut *rng.borrow_mut())
}
