//! Projection and backprojection packaged as a linear operator.
//!
//! A `SiddonOperator` fixes everything about a projection except the values
//! being projected: grid geometry, camera poses, obstacle, sample type and
//! whether the grid is static or has one frame per image. The rays derived
//! from the poses are kept until the poses are replaced.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::error::{Error, Result};
use crate::grid::{Grid, GridGeometry};
use crate::obstacle::{NoObstacle, Obstacle, UnitSphere};
use crate::pose::{ImageGeometry, RaySet};
use crate::projector::{backproject_rays, project_rays, Frames, Options};
use crate::system_matrix::Siddon;
use crate::types::Sample;
use crate::utils::{group_digits, timing::Progress};

/// A linear map from grids to measurements, together with its adjoint
pub trait LinearOperator<T: Sample> {
    /// `(number of measurements, number of grid samples)`
    fn shape(&self) -> (usize, usize);
    fn apply(&self, grid: &Grid<T>) -> Result<Vec<T>>;
    fn apply_adjoint(&self, measurements: &[T]) -> Result<Grid<T>>;
}

#[derive(Clone, Debug)]
pub struct SiddonOperator<T> {
    geometry: GridGeometry,
    obstacle: Obstacle,
    rays: RaySet<T>,
    options: Options,
}

impl<T: Sample> SiddonOperator<T> {

    pub fn new(geometry: GridGeometry, images: Vec<ImageGeometry>, obstacle: Obstacle) -> Result<Self> {
        Ok(Self::from_rays(geometry, RaySet::new(images)?, obstacle))
    }

    /// Operator for rays which are not described by camera poses
    pub fn from_rays(geometry: GridGeometry, rays: RaySet<T>, obstacle: Obstacle) -> Self {
        Self { geometry, obstacle, rays, options: Options::default() }
    }

    /// Give each image its own grid frame
    pub fn time_resolved(mut self) -> Self {
        self.options.frames = Frames::PerImage;
        self
    }

    pub fn with_job_size(mut self, job_size: usize) -> Self {
        self.options.job_size = Some(job_size);
        self
    }

    /// Abandon any projection in progress as soon as `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.options.cancel = Some(flag);
        self
    }

    /// Replace the camera poses, recalculating the rays
    pub fn set_images(&mut self, images: Vec<ImageGeometry>) -> Result<()> {
        self.rays = RaySet::new(images)?;
        Ok(())
    }

    pub fn geometry(&self) -> &GridGeometry  { &self.geometry }
    pub fn obstacle(&self) -> Obstacle        { self.obstacle }
    pub fn rays    (&self) -> &RaySet<T>      { &self.rays }
    pub fn n_measurements(&self) -> usize     { self.rays.len() }

    pub fn n_frames(&self) -> usize {
        match self.options.frames {
            Frames::Static   => 1,
            Frames::PerImage => self.rays.n_images(),
        }
    }

    /// Grid of the right geometry and number of frames to be projected by this
    /// operator, filled with zeros
    pub fn zero_grid(&self) -> Grid<T> { Grid::frames(self.geometry, self.n_frames()) }

    /// Integrate `grid` along every ray
    pub fn project(&self, grid: &Grid<T>) -> Result<Vec<T>> {
        self.check_grid(grid)?;
        self.project_samples(&grid.data)
    }

    /// Add the backprojection of `measurements` to `grid`. `grid` is left
    /// unchanged if an error is returned.
    pub fn backproject(&self, measurements: &[T], grid: &mut Grid<T>) -> Result<()> {
        self.check_grid(grid)?;
        self.backproject_samples(measurements, &mut grid.data)
    }

    /// Like `project`, for grid samples laid out as in `Grid::data`
    pub fn project_samples(&self, data: &[T]) -> Result<Vec<T>> {
        self.check_samples(data)?;
        let mut progress = Progress::new();
        progress.start(format!("Projecting {} rays ({})", group_digits(self.rays.len()), T::DTYPE));
        let (geometry, rays) = (&self.geometry, self.rays.rays());
        let measurements = match self.obstacle {
            Obstacle::None   => project_rays::<Siddon, _, _>(geometry, data, rays, NoObstacle, &self.options),
            Obstacle::Sphere => project_rays::<Siddon, _, _>(geometry, data, rays, UnitSphere, &self.options),
        }?;
        progress.done();
        Ok(measurements)
    }

    /// Like `backproject`, for grid samples laid out as in `Grid::data`
    pub fn backproject_samples(&self, measurements: &[T], data: &mut [T]) -> Result<()> {
        self.check_samples(data)?;
        if measurements.len() != self.rays.len() {
            return Err(Error::SizeMismatch {
                what: "measurements", expected: self.rays.len(), found: measurements.len()
            })
        }
        let mut progress = Progress::new();
        progress.start(format!("Backprojecting {} rays ({})", group_digits(self.rays.len()), T::DTYPE));
        let (geometry, rays) = (&self.geometry, self.rays.rays());
        match self.obstacle {
            Obstacle::None   => backproject_rays::<Siddon, _, _>(measurements, rays, geometry, data, NoObstacle, &self.options),
            Obstacle::Sphere => backproject_rays::<Siddon, _, _>(measurements, rays, geometry, data, UnitSphere, &self.options),
        }?;
        progress.done();
        Ok(())
    }

    fn check_samples(&self, data: &[T]) -> Result<()> {
        let expected = self.geometry.n_voxels() * self.n_frames();
        if data.len() != expected {
            return Err(Error::SizeMismatch { what: "grid samples", expected, found: data.len() })
        }
        Ok(())
    }

    fn check_grid(&self, grid: &Grid<T>) -> Result<()> {
        if grid.geometry != self.geometry {
            return Err(Error::Geometry(format!(
                "grid geometry {:?} differs from the operator's {:?}", grid.geometry, self.geometry)))
        }
        if grid.n_frames != self.n_frames() {
            return Err(Error::SizeMismatch { what: "grid frames", expected: self.n_frames(), found: grid.n_frames })
        }
        Ok(())
    }
}

impl<T: Sample> LinearOperator<T> for SiddonOperator<T> {

    fn shape(&self) -> (usize, usize) {
        (self.n_measurements(), self.geometry.n_voxels() * self.n_frames())
    }

    fn apply(&self, grid: &Grid<T>) -> Result<Vec<T>> { self.project(grid) }

    fn apply_adjoint(&self, measurements: &[T]) -> Result<Grid<T>> {
        let mut grid = self.zero_grid();
        self.backproject(measurements, &mut grid)?;
        Ok(grid)
    }
}

/// Relative mismatch between `<Ax, y>` and `<x, Aᵗy>`. Zero (to within rounding
/// errors) for an operator which is consistent with its adjoint.
pub fn dot_test<T: Sample>(op: &impl LinearOperator<T>, x: &Grid<T>, y: &[T]) -> Result<f64> {
    let dot = |a: &[T], b: &[T]| a.iter().zip(b).map(|(a, b)| a.as_f64() * b.as_f64()).sum::<f64>();
    let forward  = dot(&op.apply(x)?, y);
    let backward = dot(&x.data, &op.apply_adjoint(y)?.data);
    let scale = forward.abs().max(backward.abs());
    Ok(if scale == 0.0 { 0.0 } else { (forward - backward).abs() / scale })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pose::{Detector, Pose, Ray};
    use float_eq::assert_float_eq;
    #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};
    use rstest::rstest;
    use std::f64::consts::PI;

    fn grid_4() -> GridGeometry { GridGeometry::centered([4.0; 3], [4; 3]).unwrap() }

    /// Single-pixel camera on the -x axis, looking at the origin
    fn pinhole() -> Vec<ImageGeometry> {
        let detector = Detector::new(&[1], &[0.0], &[1e-3]).unwrap();
        vec![ImageGeometry::new(Pose::from_spherical(10.0, PI, 0.0, 0.0), detector)]
    }

    #[rstest(/**/ obstacle        , expected,
             case(Obstacle::None  , 4.0),
             case(Obstacle::Sphere, 1.0),
    )]
    fn pinhole_through_uniform_grid(obstacle: Obstacle, expected: f64) {
        let op = SiddonOperator::<f64>::new(grid_4(), pinhole(), obstacle).unwrap();
        let projected = op.apply(&Grid::ones(grid_4())).unwrap();
        assert_eq!(projected.len(), 1);
        assert_float_eq!(projected[0], expected, rmax <= 1e-12);
    }

    #[test]
    fn adjoint_returns_fresh_grid() {
        let rays = RaySet::from_rays(vec![Ray::new([-10.0, 0.5, 0.5], [1.0, 0.0, 0.0])]);
        let op = SiddonOperator::<f32>::from_rays(grid_4(), rays, Obstacle::None);
        let first  = op.apply_adjoint(&[1.0]).unwrap();
        let second = op.apply_adjoint(&[1.0]).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.data.iter().sum::<f32>(), 4.0);
    }

    #[test]
    fn reject_wrong_number_of_measurements() {
        let op = SiddonOperator::<f64>::new(grid_4(), pinhole(), Obstacle::None).unwrap();
        let mut grid = op.zero_grid();
        let result = op.backproject(&[1.0, 2.0], &mut grid);
        assert!(matches!(result, Err(Error::SizeMismatch { expected: 1, found: 2, .. })));
    }

    #[test]
    fn reject_grid_of_other_geometry() {
        let op = SiddonOperator::<f64>::new(grid_4(), pinhole(), Obstacle::None).unwrap();
        let other = GridGeometry::centered([4.0; 3], [5; 3]).unwrap();
        assert!(matches!(op.project(&Grid::ones(other)), Err(Error::Geometry(_))));
    }

    #[test]
    fn time_resolved_operator_needs_one_frame_per_image() {
        let detector = Detector::centered(&[0.2], &[4]).unwrap();
        let images = crate::pose::circular_trajectory(3, 10.0, 0.0, PI, detector);
        let op = SiddonOperator::<f64>::new(grid_4(), images, Obstacle::None).unwrap().time_resolved();
        assert_eq!(op.n_frames(), 3);
        assert_eq!(op.shape(), (12, 3 * 64));
        assert!(matches!(op.project(&Grid::ones(grid_4())),
                         Err(Error::SizeMismatch { what: "grid frames", expected: 3, found: 1 })));
        assert!(op.project(&op.zero_grid()).is_ok());
    }

    #[test]
    fn changing_poses_replaces_rays() {
        let mut op = SiddonOperator::<f64>::new(grid_4(), pinhole(), Obstacle::None).unwrap();
        let detector = Detector::centered(&[0.2, 0.2], &[2, 3]).unwrap();
        op.set_images(vec![ImageGeometry::new(Pose::from_spherical(10.0, 0.0, 0.0, 0.0), detector)]).unwrap();
        assert_eq!(op.n_measurements(), 6);
        assert_eq!(op.rays().rays()[0].origin, [10.0, 0.0, 0.0]);
    }

    #[test]
    fn reject_grid_with_wrong_number_of_samples() {
        let op = SiddonOperator::<f64>::new(grid_4(), pinhole(), Obstacle::None).unwrap();
        let short = Grid { geometry: grid_4(), n_frames: 1, data: vec![1.0; 10] };
        assert!(matches!(op.apply(&short),
                         Err(Error::SizeMismatch { what: "grid samples", expected: 64, found: 10 })));
        let mut long = vec![0.0; 65];
        assert!(matches!(op.backproject_samples(&[1.0], &mut long),
                         Err(Error::SizeMismatch { what: "grid samples", expected: 64, found: 65 })));
        assert!(long.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn samples_and_grids_project_alike() {
        let op = SiddonOperator::<f64>::new(grid_4(), pinhole(), Obstacle::Sphere).unwrap();
        let grid = Grid::ones(grid_4());
        assert_eq!(op.project_samples(&grid.data).unwrap(), op.project(&grid).unwrap());
        let mut data = vec![0.0; 64];
        op.backproject_samples(&[2.0], &mut data).unwrap();
        assert_eq!(data, op.apply_adjoint(&[2.0]).unwrap().data);
    }
}
