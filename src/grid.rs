//! The voxel grid: its geometry (extent and granularity) and its samples.

use ndarray::{ArrayView3, ShapeBuilder};

use crate::error::{Error, Result};
use crate::index::index3_to_1;
use crate::types::{BoxDim_u, Index1_u, Index3_u, Sample};

/// Pixel-count / reference-pixel / cell-size description of a voxel grid.
///
/// Voxel `i` along axis `k` covers the physical interval
/// `[min_k + i * cdelt_k, min_k + (i+1) * cdelt_k)` where
/// `min_k = crval_k - crpix_k * cdelt_k`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridGeometry {
    /// Number of voxels along each axis
    pub shape: BoxDim_u,
    /// Position of the reference voxel, in voxels (may be fractional)
    pub crpix: [f64; 3],
    /// Cell size along each axis, in physical units
    pub cdelt: [f64; 3],
    /// Physical coordinate of the reference voxel
    pub crval: [f64; 3],
}

impl GridGeometry {

    pub fn new(shape: BoxDim_u, crpix: [f64; 3], cdelt: [f64; 3]) -> Result<Self> {
        Self { shape, crpix, cdelt, crval: [0.0; 3] }.validated()
    }

    pub fn with_crval(self, crval: [f64; 3]) -> Result<Self> {
        Self { crval, ..self }.validated()
    }

    /// Grid of physical size `pshape` whose reference pixel sits at its centre,
    /// at physical position zero.
    pub fn centered(pshape: [f64; 3], shape: BoxDim_u) -> Result<Self> {
        let crpix = [0, 1, 2].map(|k| shape[k] as f64 / 2.0);
        let cdelt = [0, 1, 2].map(|k| pshape[k] / shape[k] as f64);
        Self::new(shape, crpix, cdelt)
    }

    fn validated(self) -> Result<Self> {
        for k in 0..3 {
            if self.shape[k] == 0 {
                return Err(Error::Geometry(format!("grid shape {:?} has an empty axis", self.shape)))
            }
            if !(self.cdelt[k].is_finite() && self.cdelt[k] > 0.0) {
                return Err(Error::Geometry(format!("grid cell size {:?} must be finite and positive", self.cdelt)))
            }
            if !(self.crpix[k].is_finite() && self.crval[k].is_finite()) {
                return Err(Error::Geometry(format!(
                    "grid reference pixel {:?} / value {:?} must be finite", self.crpix, self.crval)))
            }
        }
        Ok(self)
    }

    pub fn n_voxels(&self) -> usize { self.shape.iter().product() }

    /// Physical extent along each axis
    pub fn pshape(&self) -> [f64; 3] {
        [0, 1, 2].map(|k| self.cdelt[k] * self.shape[k] as f64)
    }

    /// Corner of the grid with the smallest coordinates
    pub fn min_corner(&self) -> [f64; 3] {
        [0, 1, 2].map(|k| self.crval[k] - self.crpix[k] * self.cdelt[k])
    }

    /// Corner of the grid with the largest coordinates
    pub fn max_corner(&self) -> [f64; 3] {
        let (min, pshape) = (self.min_corner(), self.pshape());
        [0, 1, 2].map(|k| min[k] + pshape[k])
    }

    /// Derived bounding-box quantities, in the sample type used for traversal.
    pub fn bounds<T: Sample>(&self) -> Bounds<T> {
        let lit = |a: [f64; 3]| a.map(T::lit);
        Bounds {
            min   : lit(self.min_corner()),
            max   : lit(self.max_corner()),
            pshape: lit(self.pshape()),
            cdelt : lit(self.cdelt),
            n     : self.shape,
        }
    }

    /// Find centre of voxel with given 3D index
    pub fn voxel_centre(&self, i: Index3_u) -> [f64; 3] {
        let min = self.min_corner();
        [0, 1, 2].map(|k| min[k] + (i[k] as f64 + 0.5) * self.cdelt[k])
    }

    /// Half-angle of the cone, seen from distance `radius`, which encloses the
    /// grid's diagonal.
    pub fn field_of_view(&self, radius: f64) -> f64 {
        let diagonal = self.pshape().iter().map(|x| x * x).sum::<f64>().sqrt();
        diagonal.atan2(radius)
    }
}

/// Bounding box of a grid, precomputed for ray traversal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds<T> {
    pub min: [T; 3],
    pub max: [T; 3],
    pub pshape: [T; 3],
    pub cdelt: [T; 3],
    pub n: BoxDim_u,
}

impl<T> Bounds<T> {
    pub fn n_voxels(&self) -> usize { self.n.iter().product() }
}

pub type GridData<T> = Vec<T>;

/// Samples on a grid. Holds `n_frames` consecutive 3-d frames: a single frame
/// for ordinary projections, one per image for time-resolved ones.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    pub geometry: GridGeometry,
    pub n_frames: usize,
    pub data: GridData<T>,
}

impl<T: Sample> Grid<T> {

    pub fn new(geometry: GridGeometry, data: GridData<T>) -> Result<Self> {
        Self::from_frames(geometry, 1, data)
    }

    pub fn from_frames(geometry: GridGeometry, n_frames: usize, data: GridData<T>) -> Result<Self> {
        let expected = geometry.n_voxels() * n_frames;
        if n_frames == 0 || data.len() != expected {
            return Err(Error::SizeMismatch { what: "grid samples", expected, found: data.len() })
        }
        Ok(Self { geometry, n_frames, data })
    }

    pub fn zeros(geometry: GridGeometry) -> Self { Self::filled(geometry, 1, T::zero()) }

    pub fn ones (geometry: GridGeometry) -> Self { Self::filled(geometry, 1, T::one()) }

    /// Time-resolved grid with `n_frames` zero frames
    pub fn frames(geometry: GridGeometry, n_frames: usize) -> Self {
        Self::filled(geometry, n_frames, T::zero())
    }

    fn filled(geometry: GridGeometry, n_frames: usize, value: T) -> Self {
        let data = vec![value; geometry.n_voxels() * n_frames];
        Self { geometry, n_frames, data }
    }

    /// A single frame, indexed `[ix, iy, iz]`
    pub fn frame(&self, m: usize) -> ArrayView3<T> {
        let [nx, ny, nz] = self.geometry.shape;
        let n = self.geometry.n_voxels();
        // First axis varies fastest: column-major layout
        ArrayView3::from_shape((nx, ny, nz).f(), &self.data[m * n..(m + 1) * n])
            .unwrap_or_else(|e| panic!("grid frame {m} does not match shape {:?}: {e}", self.geometry.shape))
    }
}

impl<T> core::ops::Index<Index1_u> for Grid<T> {
    type Output = T;
    #[inline]
    fn index(&self, i: Index1_u) -> &Self::Output { &self.data[i] }
}

impl<T> core::ops::IndexMut<Index1_u> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, i: Index1_u) -> &mut Self::Output { &mut self.data[i] }
}

impl<T> core::ops::Index<Index3_u> for Grid<T> {
    type Output = T;
    fn index(&self, i3: Index3_u) -> &Self::Output {
        &self.data[index3_to_1(i3, self.geometry.shape)]
    }
}

impl<T> core::ops::IndexMut<Index3_u> for Grid<T> {
    fn index_mut(&mut self, i3: Index3_u) -> &mut Self::Output {
        let i1 = index3_to_1(i3, self.geometry.shape);
        &mut self.data[i1]
    }
}
