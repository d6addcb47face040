//! Opaque bodies which stop rays before they have crossed the whole grid.
//!
//! The only body supported is the unit sphere centred on the grid origin (the
//! solar disk, when distances are measured in solar radii). Rays are traced up
//! to the near side of the sphere; whatever lies behind it is invisible.

use std::str::FromStr;

use geometry::sphere_line_intersections;
use serde::Deserialize;

use crate::error::Error;
use crate::pose::Ray;
use crate::system_matrix::siddon::BoxHit;
use crate::types::Sample;

/// Obstacle selector, fixed when an operator is constructed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Obstacle {
    #[default]
    None,
    Sphere,
}

impl FromStr for Obstacle {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none"            => Ok(Self::None),
            "sphere" | "sun"  => Ok(Self::Sphere),
            _ => Err(Error::UnknownObstacle(s.into())),
        }
    }
}

impl TryFrom<String> for Obstacle {
    type Error = Error;
    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

/// Strategy for restricting the part of a ray which is traced through the grid.
pub trait Occluder: Copy + Send + Sync {
    /// Shorten `hit` to the part of `ray` that lies in front of the obstacle.
    /// `None` if nothing remains.
    fn trim<T: Sample>(&self, ray: &Ray<T>, hit: BoxHit<T>) -> Option<BoxHit<T>>;
}

#[derive(Clone, Copy, Debug)]
pub struct NoObstacle;

impl Occluder for NoObstacle {
    #[inline]
    fn trim<T: Sample>(&self, _ray: &Ray<T>, hit: BoxHit<T>) -> Option<BoxHit<T>> { Some(hit) }
}

#[derive(Clone, Copy, Debug)]
pub struct UnitSphere;

impl Occluder for UnitSphere {
    fn trim<T: Sample>(&self, ray: &Ray<T>, hit: BoxHit<T>) -> Option<BoxHit<T>> {
        match sphere_line_intersections(ray.origin, ray.dir, T::one()) {
            // Missed or grazed the sphere
            None => Some(hit),
            Some((near, far)) => {
                if far <= hit.entry || near >= hit.exit {
                    // Sphere lies wholly outside the traversed range
                    Some(hit)
                } else if near <= hit.entry {
                    // Ray enters the grid inside the sphere
                    None
                } else {
                    Some(BoxHit { exit: near, ..hit })
                }
            }
        }
    }
}
