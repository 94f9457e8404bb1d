//! Mathematical structs and functions.

pub use lut::LookupTable;
pub use piecewise::PiecewiseLinear;
pub use util::*;

mod lut;
mod piecewise;
mod util;
