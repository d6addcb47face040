//! Exact lengths of a ray inside every voxel it crosses (Siddon's algorithm).
//!
//! The algorithm is centred around two key simplifications:
//!
//! 1. Express the voxel size in terms of the components of the ray's direction
//!    vector. This allows trivial calculation of how far we must move along the
//!    ray before reaching a voxel boundary, in any dimension.
//!
//! 2. Measure all progress as parametric distance from the point where the ray
//!    enters the grid. The planes separating voxels along one axis are then
//!    crossed at evenly spaced distances, whichever way the ray points.
//!
//! Axes to which the ray is parallel are never crossed: their distance to the
//! next boundary is infinite.

use crate::grid::Bounds;
use crate::index::{checked_index3_to_1, index3_to_1};
use crate::obstacle::Occluder;
use crate::pose::Ray;
use crate::types::{Index3_u, Sample};

use super::{SystemMatrix, SystemMatrixRow};

/// Where a ray crosses the bounding box of the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxHit<T> {
    /// Parametric distance at which the traversal starts
    pub entry: T,
    /// Parametric distance at which the traversal ends
    pub exit: T,
    /// Parametric distance at which the ray crosses the lower boundary plane of
    /// each axis. Meaningless for axes parallel to the ray.
    pub a1: [T; 3],
    /// Parametric distance needed to cross the full width of the grid along
    /// each axis. Infinite for axes parallel to the ray.
    pub span: [T; 3],
}

impl<T: Sample> BoxHit<T> {
    pub fn length(&self) -> T { self.exit - self.entry }
}

/// Slab intersection of `ray` with the bounding box of the grid.
///
/// Rays start at their origin: nothing behind it is considered. `None` if the
/// ray misses the box.
pub fn box_hit<T: Sample>(ray: &Ray<T>, bounds: &Bounds<T>) -> Option<BoxHit<T>> {
    let mut entry = T::zero();
    let mut exit  = T::infinity();
    let mut a1    = [T::nan(); 3];
    let mut span  = [T::infinity(); 3];
    for k in 0..3 {
        let (origin, dir) = (ray.origin[k], ray.dir[k]);
        if dir == T::zero() {
            // Parallel to this pair of planes: permanently between them, or never
            if !(origin >= bounds.min[k] && origin < bounds.max[k]) { return None }
            continue;
        }
        let a_min = (bounds.min[k] - origin) / dir;
        let a_max = (bounds.max[k] - origin) / dir;
        let (near, far) = if a_min < a_max { (a_min, a_max) } else { (a_max, a_min) };
        a1  [k] = a_min;
        span[k] = bounds.pshape[k] / dir;
        entry = entry.max(near);
        exit  = exit .min(far);
    }
    // Infinite exit means a null direction
    if entry < exit && exit.is_finite() { Some(BoxHit { entry, exit, a1, span }) }
    else                                 { None }
}

/// One step of a ray's traversal: a voxel and the length of ray inside it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment<T> {
    pub index: Index3_u,
    pub length: T,
}

pub struct Siddon;

impl Siddon {

    /// Ordered voxel crossings of `ray`, nearest first
    pub fn segments<T: Sample, O: Occluder>(ray: &Ray<T>, bounds: &Bounds<T>, occluder: O) -> Vec<Segment<T>> {
        let mut segments = vec![];
        if let Some(hit) = box_hit(ray, bounds).and_then(|hit| occluder.trim(ray, hit)) {
            Self::walk(ray, bounds, &hit, |index, length| segments.push(Segment { index, length }));
        }
        segments
    }

    /// Step through the voxels crossed by `ray` between `hit.entry` and
    /// `hit.exit`, passing each voxel's index and the length of ray inside it to
    /// `visit`. The lengths sum to `hit.exit - hit.entry`.
    ///
    /// Panics if the entry point does not lie on the grid: that means the box
    /// intersection is broken, not that the ray is unusual.
    #[inline]
    pub fn walk<T: Sample>(
        ray   : &Ray<T>,
        bounds: &Bounds<T>,
        hit   : &BoxHit<T>,
        mut visit: impl FnMut(Index3_u, T),
    ) {
        let length = hit.length();
        let entry_point = ray.at(hit.entry);

        let mut index         = [0_isize; 3];
        let mut update        = [0_isize; 3];
        let mut next_boundary = [T::infinity(); 3];
        let mut voxel_size    = [T::infinity(); 3];

        for k in 0..3 {
            let n = bounds.n[k];
            // Entry point in voxel units: floor(position) = index of voxel
            let position = (entry_point[k] - bounds.min[k]) / bounds.cdelt[k];
            let slack = T::lit(ENTRY_SLACK).max(
                T::epsilon() * T::lit(64.0) * (ray.origin[k].abs() + hit.entry.abs()) / bounds.cdelt[k]
            );
            assert!(position > -slack && position < T::lit(n as f64) + slack,
                    "ray entry point lies {position} voxels along axis {k} of a grid {n} voxels wide");
            // Entry on the upper face, or a rounding error below the lower one,
            // belongs to the outermost voxel
            index[k] = (position.floor().as_f64() as isize).clamp(0, n as isize - 1);

            let dir = ray.dir[k];
            if      dir > T::zero() { update[k] =  1 }
            else if dir < T::zero() { update[k] = -1 }
            else                    { continue }

            // Voxel size in ray length units: how far we must move along the
            // ray to traverse one voxel along this axis
            voxel_size[k] = (bounds.cdelt[k] / dir).abs();

            // Distance from the entry point to the first boundary ahead.
            // Measured from the entry point rather than the lower boundary
            // plane: for nearly parallel rays both of those distances are huge
            // and their difference is swamped by rounding errors. An entry
            // point a rounding error beyond the boundary crosses it at once.
            let next_plane = index[k] + (update[k] + 1) / 2;
            let plane = bounds.min[k] + T::lit(next_plane as f64) * bounds.cdelt[k];
            next_boundary[k] = ((plane - entry_point[k]) / dir).max(T::zero());
        }

        // How far we have moved since entering the grid
        let mut here = T::zero();

        loop {
            // Distance to the nearest voxel boundary, in any dimension
            let nearest = next_boundary[0].min(next_boundary[1]).min(next_boundary[2]);

            // The last voxel ends where the ray leaves the grid or meets the
            // obstacle. Never move backwards.
            let boundary = nearest.min(length).max(here);

            // The weight is the length of ray in this voxel
            let weight = boundary - here;
            if weight > T::zero() {
                visit(index.map(|i| i as usize), weight);
            }
            if nearest >= length { break }

            // Move along ray until it leaves this voxel
            here = boundary;

            // Cross every boundary lying at this distance: crossing them one at
            // a time would create zero-length segments
            for k in 0..3 {
                if next_boundary[k] == nearest {
                    index[k] += update[k];
                    next_boundary[k] += voxel_size[k];
                }
            }

            // Left the grid a rounding error before reaching `length`
            if checked_index3_to_1(index, bounds.n).is_none() { break }
        }
    }
}

/// Tolerance, in voxels, on the position of the entry point
const ENTRY_SLACK: f64 = 1e-3;

impl SystemMatrix for Siddon {

    #[inline]
    fn update_system_matrix_row<T: Sample, O: Occluder>(
        system_matrix_row: &mut SystemMatrixRow<T>,
        ray     : &Ray<T>,
        bounds  : &Bounds<T>,
        occluder: O,
    ) {
        // Throw away previous ray's values
        system_matrix_row.clear();
        let Some(hit) = box_hit(ray, bounds).and_then(|hit| occluder.trim(ray, hit))
        else { return };
        Self::walk(ray, bounds, &hit, |index, weight| {
            system_matrix_row.0.push((index3_to_1(index, bounds.n), weight))
        });
    }
}
