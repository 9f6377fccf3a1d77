use thiserror::Error;

/// Fatal construction-time errors.
///
/// Runtime geometric failures (empty intersections, zero-area pieces) are
/// recoverable at the floe level and never surface through this type.
#[derive(Debug, Error)]
pub enum SubzeroError {
    /// A polygon ring has fewer than three distinct points or collapses
    /// onto a line.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Domain walls violate periodic compatibility or bound ordering.
    #[error("domain invariant violated: {0}")]
    DomainInvariant(String),

    /// A scalar argument is outside its admissible range.
    #[error("argument out of range: {0}")]
    ArgumentOutOfRange(String),
}

pub type Result<T> = std::result::Result<T, SubzeroError>;
