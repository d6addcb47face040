//! Calculation of system matrix elements for use in forward and backward
//! projections.

// ----- The trait --------------------------------------------------------------------

/// Interface for calculation of the system matrix elements coupling one ray to
/// the voxels of a grid.
pub trait SystemMatrix {

    /// Calculate the length of `ray` inside each voxel of the grid described by
    /// `bounds`, ignoring whatever lies behind the obstacle `occluder`. Place the
    /// results in the output parameter `system_matrix_row`.
    fn update_system_matrix_row<T: Sample, O: Occluder>(
        system_matrix_row: &mut SystemMatrixRow<T>,
        ray     : &Ray<T>,
        bounds  : &Bounds<T>,
        occluder: O,
    );

    // Sparse storage of the slice through the system matrix which corresponds
    // to the current ray. Allocating these anew for each ray had a noticeable
    // runtime cost, so we create them up-front and reuse them.
    fn buffers<T: Sample>(n: BoxDim_u) -> SystemMatrixRow<T> {
        let [nx, ny, nz] = n;
        let max_number_of_coupled_voxels_possible = nx + ny + nz - 2;
        SystemMatrixRow(Vec::with_capacity(max_number_of_coupled_voxels_possible))
    }
}

// ----- Implementations of the trait -----------------------------------------------
pub mod siddon;
pub use siddon::Siddon;

// ----- Storage of system matrix elements. Only one row is relevant at any single time ------
pub type SystemMatrixElement<T> = (Index1_u, T);

#[derive(Clone, Debug, Default)]
pub struct SystemMatrixRow<T>(pub Vec<SystemMatrixElement<T>>);

impl<T: Copy> SystemMatrixRow<T> {
    pub fn iter(&self) -> std::slice::Iter<SystemMatrixElement<T>> { self.0.iter() }
    pub fn clear(&mut self) { self.0.clear(); }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl<T> IntoIterator for SystemMatrixRow<T> {
    type Item = SystemMatrixElement<T>;
    type IntoIter = std::vec::IntoIter<Self::Item>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, T: Copy> IntoIterator for &'a SystemMatrixRow<T> {
    type Item = SystemMatrixElement<T>;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Self::Item>>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

// ----- Imports ------------------------------------------------------------------------------------------
use crate::{
    grid::Bounds,
    obstacle::Occluder,
    pose::Ray,
    types::{BoxDim_u, Index1_u, Sample},
};
