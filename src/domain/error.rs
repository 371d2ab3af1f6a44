// Error taxonomy for alignment, mapping, encoding and configuration
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlignmentError {
    #[error("no time reference available")]
    MissingTimeReference,
    #[error("time axis is empty")]
    EmptyAxis,
    #[error("could not parse time '{0}'")]
    UnparseableTime(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingError {
    #[error("trajectory '{well}' has {points} point(s), at least 2 are required")]
    InsufficientTrajectory { well: String, points: usize },
    #[error("no trajectory named '{0}' is loaded for the fiber")]
    UnknownWell(String),
    #[error("no well is configured for the fiber")]
    NoFiberWell,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("signal length {signal} does not match coordinate length {coords}")]
    ShapeMismatch { signal: usize, coords: usize },
    #[error("attribute '{0}' is not present in the catalog")]
    UnknownAttribute(String),
    #[error("no events fall inside the time window")]
    EmptyWindow,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown colorscale '{0}'")]
    UnknownColorscale(String),
    #[error("invalid aspect mode '{0}', expected one of: auto, cube, data, manual")]
    UnknownAspectMode(String),
    #[error("downsample factors must be at least 1 (got time={time}, depth={depth})")]
    InvalidDownsample { time: usize, depth: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("{what}: expected {expected} values, found {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Reason a single source contributed no trace to a rebuilt scene.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TraceError {
    #[error(transparent)]
    Alignment(#[from] AlignmentError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}
