use std::fmt::{Debug, Display};
use std::ops::AddAssign;
use std::str::FromStr;

use num_traits::Float;
use serde::Deserialize;

use crate::error::Error;

#[allow(non_camel_case_types)] pub type Index1_u = usize;
#[allow(non_camel_case_types)] pub type Index3_u = [usize; 3];
#[allow(non_camel_case_types)] pub type BoxDim_u = [usize; 3];

/// Floating-point type of grid samples and measurements. A single projection
/// uses one `Sample` type throughout: grid, rays and measurements.
pub trait Sample: Float + AddAssign + Send + Sync + Debug + Display + Default + 'static {
    const DTYPE: Dtype;
    /// Convert an `f64` literal or pose-derived value into this type.
    fn lit(x: f64) -> Self;
    fn as_f64(self) -> f64;
}

impl Sample for f32 {
    const DTYPE: Dtype = Dtype::F32;
    #[inline] fn lit(x: f64) -> Self { x as f32 }
    #[inline] fn as_f64(self) -> f64 { self as f64 }
}

impl Sample for f64 {
    const DTYPE: Dtype = Dtype::F64;
    #[inline] fn lit(x: f64) -> Self { x }
    #[inline] fn as_f64(self) -> f64 { self }
}

/// Run-time tag of a `Sample` type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Dtype { F32, F64 }

impl FromStr for Dtype {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "f32" | "float32" => Ok(Self::F32),
            "f64" | "float64" => Ok(Self::F64),
            _ => Err(Error::UnknownDtype(s.into())),
        }
    }
}

impl TryFrom<String> for Dtype {
    type Error = Error;
    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl Display for Dtype {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::F32 => write!(f, "f32"),
            Self::F64 => write!(f, "f64"),
        }
    }
}
