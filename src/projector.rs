//! Overall structure of forward and backward projections.
//!
//! The drivers
//!
//! + `project_rays`, which integrates the grid along every ray, and
//!
//! + `backproject_rays`, which smears every ray's value back over the voxels
//!   it crosses,
//!
//! are abstracted over different algorithms for calculating system matrix
//! elements, via the `SystemMatrix` trait, and over the obstacle which may hide
//! part of the grid, via the `Occluder` trait. Both use exactly the same
//! system matrix rows, so one is the transpose of the other.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ndarray::{ArrayView1, ArrayViewMut1, Zip};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::grid::GridGeometry;
use crate::obstacle::Occluder;
use crate::pose::Ray;
use crate::system_matrix::{SystemMatrix, SystemMatrixRow};
use crate::types::Sample;
use crate::utils::group_digits;

/// How the frames of a grid correspond to the images of a `RaySet`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Frames {
    /// A single 3-d frame seen by every image
    #[default]
    Static,
    /// Frame `m` is seen only by image `m`
    PerImage,
}

impl Frames {
    /// Offset of the frame seen by `ray` in a grid of `n_voxels` voxels per frame
    #[inline]
    fn offset<T>(self, ray: &Ray<T>, n_voxels: usize) -> usize {
        match self {
            Frames::Static   => 0,
            Frames::PerImage => ray.image * n_voxels,
        }
    }
}

/// Settings shared by forward and backward projections
#[derive(Clone, Debug, Default)]
pub struct Options {
    pub frames: Frames,
    /// Minimum number of rays handled by one rayon job. By default, the rays
    /// are shared evenly between the threads of the current pool.
    pub job_size: Option<usize>,
    /// Set this flag from another thread to abandon the projection
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Options {

    fn job_size(&self, n_rays: usize) -> usize {
        self.job_size.unwrap_or_else(|| n_rays / rayon::current_num_threads()).max(1)
    }

    #[inline]
    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Integrate the grid of `geometry`, whose samples are `data`, along each of
/// `rays`: element `i` of the result is the sum of the lengths of `rays[i]` in
/// each voxel, weighted by the voxels' values. Rays which miss the grid yield
/// zero.
pub fn project_rays<S, T, O>(
    geometry: &GridGeometry,
    data    : &[T],
    rays    : &[Ray<T>],
    occluder: O,
    options : &Options,
) -> Result<Vec<T>>
where
    S: SystemMatrix,
    T: Sample,
    O: Occluder,
{
    let bounds = geometry.bounds::<T>();
    let n_voxels = bounds.n_voxels();
    check_layout(data.len(), n_voxels, rays, options.frames)?;
    let mut measurements = vec![T::zero(); rays.len()];

    // Each ray writes only its own measurement: no need to combine anything
    let rays_hit = measurements
        .par_iter_mut()
        .zip(rays)
        .with_min_len(options.job_size(rays.len()))
        .map_init(
            || S::buffers::<T>(bounds.n),
            |system_matrix_row, (measurement, ray)| -> Result<usize> {
                options.check_cancelled()?;
                S::update_system_matrix_row(system_matrix_row, ray, &bounds, occluder);
                let frame = &data[options.frames.offset(ray, n_voxels)..][..n_voxels];
                *measurement = forward_project(system_matrix_row, frame);
                Ok(usize::from(!system_matrix_row.is_empty()))
            })
        .try_reduce(|| 0, |a, b| Ok(a + b))?;

    log::debug!("{} of {} rays hit the grid", group_digits(rays_hit), group_digits(rays.len()));
    Ok(measurements)
}

/// Add `measurements[i]` times the length of `rays[i]` in each voxel, to that
/// voxel of the grid of `geometry` whose samples are `data`. `data` is modified
/// only if every ray has been processed.
pub fn backproject_rays<S, T, O>(
    measurements: &[T],
    rays        : &[Ray<T>],
    geometry    : &GridGeometry,
    data        : &mut [T],
    occluder    : O,
    options     : &Options,
) -> Result<()>
where
    S: SystemMatrix,
    T: Sample,
    O: Occluder,
{
    let bounds = geometry.bounds::<T>();
    let n_voxels = bounds.n_voxels();
    let n_samples = data.len();
    check_layout(n_samples, n_voxels, rays, options.frames)?;
    if measurements.len() != rays.len() {
        return Err(Error::SizeMismatch { what: "measurements", expected: rays.len(), found: measurements.len() })
    }

    // Closure preparing the state needed by `fold`: will be called by
    // `fold` at the start of every job that is launched.
    let initial_thread_state = || FoldState {
        backprojection: vec![T::zero(); n_samples],
        system_matrix_row: S::buffers(bounds.n),
    };

    // -------- Backproject all rays into per-job partial grids ---------------
    let fold_result = rays
        .par_iter()
        .zip(measurements)
        // Rayon is too eager in spawning small jobs, each of which requires the
        // construction and subsequent combination of expensive accumulators
        // (whole grids). So here we try to limit it to one job per thread.
        .with_min_len(options.job_size(rays.len()))
        .try_fold(initial_thread_state, |state, (ray, &value)| -> Result<FoldState<T>> {
            options.check_cancelled()?;
            let FoldState { mut backprojection, mut system_matrix_row } = state;
            if value != T::zero() {
                S::update_system_matrix_row(&mut system_matrix_row, ray, &bounds, occluder);
                let offset = options.frames.offset(ray, n_voxels);
                back_project(&mut backprojection[offset..offset + n_voxels], &system_matrix_row, value);
            }
            Ok(FoldState { backprojection, system_matrix_row })
        });

    // -------- Sum the partial grids calculated by each job ------------------
    let backprojection = fold_result
        // Keep only the backprojection (ignore weights and indices)
        .map(|state| state.map(|s| s.backprojection))
        .try_reduce(|| vec![T::zero(); n_samples], |a, b| Ok(elementwise_add(a, b)))?;

    add_into(data, &backprojection);
    Ok(())
}

/// Make sure that every ray finds its frame among the `n_samples` samples
fn check_layout<T>(n_samples: usize, n_voxels: usize, rays: &[Ray<T>], frames: Frames) -> Result<()> {
    let n_frames = match frames {
        Frames::Static => 1,
        Frames::PerImage => rays.iter().map(|ray| ray.image + 1).max().unwrap_or(1),
    };
    let found_frames = n_samples / n_voxels;
    match frames {
        Frames::Static if n_samples != n_voxels =>
            Err(Error::SizeMismatch { what: "grid samples", expected: n_voxels, found: n_samples }),
        Frames::PerImage if n_samples % n_voxels != 0 =>
            Err(Error::SizeMismatch { what: "grid samples", expected: n_voxels * n_frames.max(found_frames), found: n_samples }),
        Frames::PerImage if found_frames < n_frames =>
            Err(Error::SizeMismatch { what: "grid frames", expected: n_frames, found: found_frames }),
        _ => Ok(()),
    }
}

#[inline]
fn forward_project<T: Sample>(system_matrix_row: &SystemMatrixRow<T>, frame: &[T]) -> T {
    let mut projection = T::zero();
    for (j, w) in system_matrix_row {
        projection += w * frame[j]
    }
    projection
}

#[inline]
fn back_project<T: Sample>(backprojection: &mut [T], system_matrix_row: &SystemMatrixRow<T>, value: T) {
    for (j, w) in system_matrix_row {
        backprojection[j] += w * value;
    }
}

fn elementwise_add<T: Sample>(mut a: Vec<T>, b: Vec<T>) -> Vec<T> {
    add_into(&mut a, &b);
    a
}

fn add_into<T: Sample>(a: &mut [T], b: &[T]) {
    Zip::from(ArrayViewMut1::from(a))
        .and(ArrayView1::from(b))
        .for_each(|l, &r| *l += r);
}

/// Data needed to be passed efficiently between the backprojection of one ray
/// and the next. Needs to work in conjunction with `rayon`'s `fold`s.
struct FoldState<T> {
    backprojection: Vec<T>,
    system_matrix_row: SystemMatrixRow<T>,
}
