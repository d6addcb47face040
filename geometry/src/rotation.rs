//! Orientation of a camera looking at the voxel grid.
//!
//! A camera is placed by its longitude and latitude as seen from the grid
//! origin, and rolled about its own line of sight. In the camera's local frame
//! the optical axis is `x`; the two detector axes sweep the line of sight
//! towards `y` and `z` respectively.

use std::f64::consts::PI;
use nalgebra::Vector3;

use crate::{Point, Rotation, Vector};

/// Rotation taking camera-local directions into grid coordinates.
///
/// Composed as `Rz(lon + π) · Ry(lat) · Rx(rol)`: first the roll about the line
/// of sight, then the latitude, then the longitude. The extra half-turn in
/// longitude makes the optical axis of a camera at `spherical_position(d, lon,
/// lat)` point back at the origin.
pub fn rotation_matrix(lon: f64, lat: f64, rol: f64) -> Rotation {
    Rotation::from_axis_angle(&Vector3::z_axis(), lon + PI) *
    Rotation::from_axis_angle(&Vector3::y_axis(), lat     ) *
    Rotation::from_axis_angle(&Vector3::x_axis(), rol     )
}

/// Position at `distance` from the origin, in the direction given by `lon` and
/// `lat`.
pub fn spherical_position(distance: f64, lon: f64, lat: f64) -> Point {
    let (sin_lon, cos_lon) = lon.sin_cos();
    let (sin_lat, cos_lat) = lat.sin_cos();
    Point::new(distance * cos_lat * cos_lon,
               distance * cos_lat * sin_lon,
               distance * sin_lat)
}

/// Camera-local unit vector at angular offsets `g` (first detector axis) and
/// `l` (second detector axis) from the optical axis.
#[inline]
pub fn local_unit_vector(g: f64, l: f64) -> Vector {
    let (sin_g, cos_g) = g.sin_cos();
    let (sin_l, cos_l) = l.sin_cos();
    Vector::new(cos_l * cos_g, cos_l * sin_g, sin_l)
}
