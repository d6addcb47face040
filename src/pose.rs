//! Camera poses, detectors, and the rays they generate.
//!
//! Every detector pixel of every image defines one ray: a half-line starting
//! at the camera position, in the direction seen by that pixel. Rays of all
//! images are concatenated into a single `RaySet`, image after image; within
//! an image, pixel `(i, j)` becomes ray `i + n1 * j`.

use geometry::{Point, Rotation, local_unit_vector, rotation_matrix, spherical_position};
use itertools::iproduct;

use crate::error::{Error, Result};
use crate::types::Sample;

/// Position and orientation of the camera which took one image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// Camera position, in the physical coordinates of the grid
    pub position: Point,
    pub lon: f64,
    pub lat: f64,
    /// Roll about the line of sight
    pub rol: f64,
}

impl Pose {

    pub fn new(position: [f64; 3], lon: f64, lat: f64, rol: f64) -> Self {
        let [x, y, z] = position;
        Self { position: Point::new(x, y, z), lon, lat, rol }
    }

    /// Camera at `distance` from the grid origin, in the direction given by
    /// `lon` and `lat`, looking at the origin.
    pub fn from_spherical(distance: f64, lon: f64, lat: f64, rol: f64) -> Self {
        Self { position: spherical_position(distance, lon, lat), lon, lat, rol }
    }

    pub fn rotation(&self) -> Rotation { rotation_matrix(self.lon, self.lat, self.rol) }

    fn validate(&self) -> Result<()> {
        let p = self.position;
        if [p.x, p.y, p.z, self.lon, self.lat, self.rol].iter().all(|x| x.is_finite()) { Ok(()) }
        else { Err(Error::Geometry(format!("non-finite pose {self:?}"))) }
    }
}

/// Pixel layout of a detector with one or two axes. A one-axis detector is
/// stored with a single pixel on its second axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detector {
    pub shape: [usize; 2],
    /// Reference pixel (the optical axis), in pixels
    pub crpix: [f64; 2],
    /// Angular size of a pixel, in radians
    pub cdelt: [f64; 2],
}

impl Detector {

    pub fn new(shape: &[usize], crpix: &[f64], cdelt: &[f64]) -> Result<Self> {
        let (shape, crpix, cdelt) = match (shape, crpix, cdelt) {
            (&[n], &[c], &[d]) => ([n, 1], [c, 0.0], [d, 0.0]),
            (&[n1, n2], &[c1, c2], &[d1, d2]) => ([n1, n2], [c1, c2], [d1, d2]),
            _ => return Err(Error::Geometry(format!(
                "detector needs 1 or 2 axes, with matching reference pixel and scale: \
                 shape {shape:?}, crpix {crpix:?}, cdelt {cdelt:?}"))),
        };
        Self { shape, crpix, cdelt }.validated()
    }

    /// Detector spanning the angles `pshape` with the optical axis at its centre
    pub fn centered(pshape: &[f64], shape: &[usize]) -> Result<Self> {
        if pshape.len() != shape.len() {
            return Err(Error::Geometry(format!("detector size {pshape:?} does not match shape {shape:?}")))
        }
        let crpix: Vec<f64> = shape.iter().map(|&n| n as f64 / 2.0).collect();
        let cdelt: Vec<f64> = shape.iter().zip(pshape).map(|(&n, &p)| p / n as f64).collect();
        Self::new(shape, &crpix, &cdelt)
    }

    fn validated(self) -> Result<Self> {
        for k in 0..2 {
            if self.shape[k] == 0 {
                return Err(Error::Geometry(format!("detector shape {:?} has an empty axis", self.shape)))
            }
            let usable = self.cdelt[k].is_finite() && (self.cdelt[k] != 0.0 || self.shape[k] == 1);
            if !usable || !self.crpix[k].is_finite() {
                return Err(Error::Geometry(format!(
                    "detector pixel scale {:?} / reference {:?} unusable", self.cdelt, self.crpix)))
            }
        }
        Ok(self)
    }

    pub fn n_pixels(&self) -> usize { self.shape[0] * self.shape[1] }

    /// Angular offsets `(g, l)` of pixel `(i, j)` from the optical axis
    #[inline]
    pub fn angles(&self, i: usize, j: usize) -> (f64, f64) {
        ((i as f64 - self.crpix[0]) * self.cdelt[0],
         (j as f64 - self.crpix[1]) * self.cdelt[1])
    }
}

/// Everything needed to generate the rays of one image
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageGeometry {
    pub pose: Pose,
    pub detector: Detector,
}

impl ImageGeometry {

    pub fn new(pose: Pose, detector: Detector) -> Self { Self { pose, detector } }

    /// Unit direction, in grid coordinates, of every pixel: first detector axis
    /// fastest.
    pub fn directions(&self) -> impl Iterator<Item = geometry::Vector> + '_ {
        let rotation = self.pose.rotation();
        let [n1, n2] = self.detector.shape;
        iproduct!(0..n2, 0..n1).map(move |(j, i)| {
            let (g, l) = self.detector.angles(i, j);
            rotation * local_unit_vector(g, l)
        })
    }
}

/// `n_images` cameras at distance `radius` in the equatorial plane, with
/// longitudes evenly spaced over `[min_lon, max_lon)`.
pub fn circular_trajectory(
    n_images: usize,
    radius  : f64,
    min_lon : f64,
    max_lon : f64,
    detector: Detector,
) -> Vec<ImageGeometry> {
    let dlon = (max_lon - min_lon) / n_images as f64;
    (0..n_images)
        .map(|n| min_lon + n as f64 * dlon)
        .map(|lon| ImageGeometry::new(Pose::from_spherical(radius, lon, 0.0, 0.0), detector))
        .collect()
}

/// A single measurement channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray<T> {
    pub origin: [T; 3],
    /// Unit vector
    pub dir: [T; 3],
    /// Which image of the `RaySet` this ray belongs to
    pub image: usize,
}

impl<T: Sample> Ray<T> {
    pub fn new(origin: [T; 3], dir: [T; 3]) -> Self { Self { origin, dir, image: 0 } }

    /// Point at parametric distance `a` along the ray
    pub fn at(&self, a: T) -> [T; 3] {
        [0, 1, 2].map(|k| self.origin[k] + a * self.dir[k])
    }
}

/// The rays of a sequence of images, derived once from their poses.
#[derive(Clone, Debug)]
pub struct RaySet<T> {
    images: Vec<ImageGeometry>,
    rays: Vec<Ray<T>>,
    n_images: usize,
}

impl<T: Sample> RaySet<T> {

    pub fn new(images: Vec<ImageGeometry>) -> Result<Self> {
        for image in &images { image.pose.validate()? }
        let mut rays = Vec::with_capacity(images.iter().map(|i| i.detector.n_pixels()).sum());
        for (n, image) in images.iter().enumerate() {
            let p = image.pose.position;
            let origin = [p.x, p.y, p.z].map(T::lit);
            rays.extend(image.directions().map(|d| Ray {
                origin,
                dir: [d.x, d.y, d.z].map(T::lit),
                image: n,
            }));
        }
        let n_images = images.len();
        Ok(Self { images, rays, n_images })
    }

    /// Rays that do not come from any particular camera model
    pub fn from_rays(rays: Vec<Ray<T>>) -> Self {
        let n_images = rays.iter().map(|r| r.image + 1).max().unwrap_or(0);
        Self { images: vec![], rays, n_images }
    }

    pub fn rays  (&self) -> &[Ray<T>]          { &self.rays   }
    pub fn images(&self) -> &[ImageGeometry]   { &self.images }
    pub fn len   (&self) -> usize              { self.rays.len() }
    pub fn is_empty(&self) -> bool             { self.rays.is_empty() }
    pub fn n_images(&self) -> usize            { self.n_images }
}
