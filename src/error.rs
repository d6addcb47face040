use thiserror::Error;

use crate::types::Dtype;

/// Everything that can go wrong before or during a projection.
///
/// All of these are detected before any ray is traversed, apart from
/// `Cancelled`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("data-type mismatch: grid holds {grid} but measurements hold {data}")]
    DtypeMismatch { grid: Dtype, data: Dtype },

    #[error("data-type mismatch: operator works in {operator} but was given {data}")]
    OperatorDtype { operator: Dtype, data: Dtype },

    #[error("unsupported obstacle `{0}`: expected `none` or `sphere`")]
    UnknownObstacle(String),

    #[error("unsupported data-type `{0}`: expected `f32` or `f64`")]
    UnknownDtype(String),

    #[error("malformed geometry: {0}")]
    Geometry(String),

    #[error("{what}: expected {expected} values, found {found}")]
    SizeMismatch { what: &'static str, expected: usize, found: usize },

    #[error("projection cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
