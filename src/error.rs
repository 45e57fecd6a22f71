#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("you must ask for at least one nearest neighbor")]
    InvalidNearestCount,

    #[error("invalid origin dimensions. Got {received} but expected {expected}")]
    InvalidOriginDimension { expected: usize, received: usize },

    #[error("origin coordinate {dim} is NaN")]
    NanOriginCoordinate { dim: usize },
}
