use thiserror::Error;

/// Reasons a sensor token is refused before it reaches the episode store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("sensor token too short: expected {expected} feature bits, got {got}")]
    TooShort { expected: usize, got: usize },

    #[error("sensor token too long: {found:?} follows the {expected} feature bits")]
    TooLong { expected: usize, found: char },

    #[error("non-binary character {found:?} at feature position {position}")]
    NonBinaryFeature { position: usize, found: char },

    #[error("malformed timestamp {0:?}")]
    BadTimestamp(String),

    #[error("timestamp {got} does not follow previous timestamp {previous}")]
    NonMonotonicTimestamp { previous: u64, got: u64 },
}

/// Why no route could be produced (or followed) this tick. Always recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("no goal-terminated sequence at any level")]
    NoGoalSequence,

    #[error("route has no remaining steps")]
    RouteExhausted,
}

/// Errors surfaced to the tick caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupervisorError {
    #[error("rejected sensor token: {0}")]
    Parse(#[from] ParseError),

    #[error("invalid supervisor config: {0}")]
    InvalidConfig(&'static str),
}
