mod rotation;
mod sphere;

pub use rotation::{rotation_matrix, spherical_position, local_unit_vector};
pub use sphere::{sphere_line_intersections, Dot};

pub type Point    = nalgebra::Point3   <f64>;
pub type Vector   = nalgebra::Vector3  <f64>;
pub type Rotation = nalgebra::Rotation3<f64>;
