//! Error type shared by the construction boundaries of the crate.

use crate::model::ModelName;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("unknown longitudinal model `{0}`")]
    UnknownModel(String),

    #[error("duplicate vehicle type label `{0}`")]
    DuplicateLabel(String),

    #[error("no vehicle type with label `{0}`")]
    UnknownLabel(String),

    #[error("vehicle type fractions sum to zero")]
    ZeroFractions,

    #[error("invalid parameter `{name}` of the {model} model: {reason}")]
    InvalidParameter {
        model: ModelName,
        name: &'static str,
        reason: &'static str,
    },

    #[error("{quantity} is not applicable to the {model} model")]
    NotApplicable {
        model: ModelName,
        quantity: &'static str,
    },

    #[error("the {model} model requires a timestep of {expected} s, got {actual} s")]
    Timestep {
        model: ModelName,
        expected: f64,
        actual: f64,
    },

    #[error("invalid simulation setting: {0}")]
    InvalidSetting(&'static str),

    #[error("unknown road segment")]
    UnknownSegment,

    #[error("lane {lane} does not exist on a segment with {lane_count} lanes")]
    InvalidLane { lane: i32, lane_count: i32 },
}
