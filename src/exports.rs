pub use crate::error::{Error, Result};
pub use crate::types::{BoxDim_u, Dtype, Index1_u, Index3_u, Sample};
pub use crate::grid::{Bounds, Grid, GridGeometry};
pub use crate::pose::{circular_trajectory, Detector, ImageGeometry, Pose, Ray, RaySet};
pub use crate::obstacle::{NoObstacle, Obstacle, Occluder, UnitSphere};
pub use crate::system_matrix::{Siddon, SystemMatrix, SystemMatrixRow};
pub use crate::system_matrix::siddon::{box_hit, BoxHit, Segment};
pub use crate::operator::{dot_test, LinearOperator, SiddonOperator};
pub use crate::dynamic::{DynOperator, Samples};
pub use crate::config::{read_config_file, Config};

pub use geometry::{Point, Vector, Rotation};
