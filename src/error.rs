// src/error.rs
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OverlayError {
    #[error("smoothing capacity must be at least 1")]
    InvalidCapacity,

    #[error("joint index {0} is outside 0..=20")]
    JointOutOfRange(usize),

    #[error("hand slot {slot} exceeds the {slots} configured slot(s)")]
    HandSlotOutOfRange { slot: usize, slots: usize },

    #[error("no samples recorded for joint {0}")]
    EmptyWindow(usize),

    #[error("expected {expected} landmarks, found {found}")]
    LandmarkCount { expected: usize, found: usize },

    #[error("landmark {index} has {arity} coordinate(s), need at least 2")]
    MalformedLandmark { index: usize, arity: usize },

    #[error("landmark {0} has a non-finite coordinate")]
    NonFiniteLandmark(usize),

    #[error("unknown colour '{0}'")]
    UnknownColor(String),

    #[error("unknown finger '{0}'")]
    UnknownFinger(String),

    #[error("invalid style: {0}")]
    InvalidStyle(String),

    #[error("invalid finger chains: {0}")]
    InvalidChains(String),
}

pub type Result<T> = std::result::Result<T, OverlayError>;
