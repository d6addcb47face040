//! Projections whose sample type is only known at run time.
//!
//! Grid and measurements must have exactly the same type: a mismatch is
//! reported before any ray is traversed, never resolved by conversion.

use std::path::Path;

use crate::error::{Error, Result};
use crate::grid::GridGeometry;
use crate::io::raw;
use crate::obstacle::Obstacle;
use crate::operator::SiddonOperator;
use crate::pose::ImageGeometry;
use crate::types::Dtype;

/// A buffer of samples of either type
#[derive(Clone, Debug, PartialEq)]
pub enum Samples {
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl Samples {

    pub fn dtype(&self) -> Dtype {
        match self {
            Samples::F32(_) => Dtype::F32,
            Samples::F64(_) => Dtype::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Samples::F32(v) => v.len(),
            Samples::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn zeros(dtype: Dtype, n: usize) -> Self {
        match dtype {
            Dtype::F32 => Samples::F32(vec![0.0; n]),
            Dtype::F64 => Samples::F64(vec![0.0; n]),
        }
    }

    pub fn read(dtype: Dtype, path: &Path) -> Result<Self> {
        Ok(match dtype {
            Dtype::F32 => Samples::F32(raw::read::<f32>(path)?.collect::<std::io::Result<_>>()?),
            Dtype::F64 => Samples::F64(raw::read::<f64>(path)?.collect::<std::io::Result<_>>()?),
        })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        match self {
            Samples::F32(v) => raw::write(v.iter().copied(), path)?,
            Samples::F64(v) => raw::write(v.iter().copied(), path)?,
        }
        Ok(())
    }
}

impl From<Vec<f32>> for Samples { fn from(v: Vec<f32>) -> Self { Samples::F32(v) } }
impl From<Vec<f64>> for Samples { fn from(v: Vec<f64>) -> Self { Samples::F64(v) } }

/// `SiddonOperator` of either sample type
#[derive(Clone, Debug)]
pub enum DynOperator {
    F32(SiddonOperator<f32>),
    F64(SiddonOperator<f64>),
}

impl DynOperator {

    pub fn new(dtype: Dtype, geometry: GridGeometry, images: Vec<ImageGeometry>, obstacle: Obstacle) -> Result<Self> {
        Ok(match dtype {
            Dtype::F32 => DynOperator::F32(SiddonOperator::new(geometry, images, obstacle)?),
            Dtype::F64 => DynOperator::F64(SiddonOperator::new(geometry, images, obstacle)?),
        })
    }

    pub fn dtype(&self) -> Dtype {
        match self {
            DynOperator::F32(_) => Dtype::F32,
            DynOperator::F64(_) => Dtype::F64,
        }
    }

    pub fn time_resolved(self) -> Self {
        match self {
            DynOperator::F32(op) => DynOperator::F32(op.time_resolved()),
            DynOperator::F64(op) => DynOperator::F64(op.time_resolved()),
        }
    }

    pub fn n_measurements(&self) -> usize {
        match self {
            DynOperator::F32(op) => op.n_measurements(),
            DynOperator::F64(op) => op.n_measurements(),
        }
    }

    /// All frames of a zero grid of this operator's type
    pub fn zero_grid(&self) -> Samples {
        match self {
            DynOperator::F32(op) => Samples::F32(op.zero_grid().data),
            DynOperator::F64(op) => Samples::F64(op.zero_grid().data),
        }
    }

    /// Project the samples of a grid with this operator's geometry
    pub fn project(&self, grid: &Samples) -> Result<Samples> {
        Ok(match (self, grid) {
            (DynOperator::F32(op), Samples::F32(g)) => Samples::F32(op.project_samples(g)?),
            (DynOperator::F64(op), Samples::F64(g)) => Samples::F64(op.project_samples(g)?),
            _ => return Err(self.dtype_error(grid)),
        })
    }

    /// Add the backprojection of `measurements` into `grid`
    pub fn backproject(&self, measurements: &Samples, grid: &mut Samples) -> Result<()> {
        if grid.dtype() != measurements.dtype() {
            return Err(Error::DtypeMismatch { grid: grid.dtype(), data: measurements.dtype() })
        }
        match (self, measurements, &mut *grid) {
            (DynOperator::F32(op), Samples::F32(m), Samples::F32(g)) => op.backproject_samples(m, g),
            (DynOperator::F64(op), Samples::F64(m), Samples::F64(g)) => op.backproject_samples(m, g),
            _ => Err(self.dtype_error(measurements)),
        }
    }

    fn dtype_error(&self, data: &Samples) -> Error {
        Error::OperatorDtype { operator: self.dtype(), data: data.dtype() }
    }
}
