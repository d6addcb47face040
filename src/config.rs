//! Configuration file parser for complete projection problems

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::dynamic::DynOperator;
use crate::error::{Error, Result};
use crate::grid::GridGeometry;
use crate::obstacle::Obstacle;
use crate::pose::{circular_trajectory, Detector, ImageGeometry, Pose};
use crate::types::Dtype;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {

    /// Sample type of grid and measurements
    #[serde(default = "default_dtype")]
    pub dtype: Dtype,

    #[serde(default)]
    pub obstacle: Obstacle,

    pub grid: GridConfig,

    /// Explicitly placed cameras. Mutually exclusive with `trajectory`.
    #[serde(default)]
    pub images: Vec<ImageConfig>,

    pub trajectory: Option<TrajectoryConfig>,

    /// Give each image its own grid frame
    #[serde(default)]
    pub time_resolved: bool,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
    pub shape: [usize; 3],
    pub crpix: [f64; 3],
    pub cdelt: [f64; 3],
    #[serde(default)]
    pub crval: [f64; 3],
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ImageConfig {
    /// Camera position in grid coordinates ...
    pub position: Option<[f64; 3]>,
    /// ... or distance from the origin, in the direction given by `lon` and `lat`
    pub distance: Option<f64>,
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub rol: f64,
    pub detector: DetectorConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DetectorConfig {
    pub shape: Vec<usize>,
    pub crpix: Vec<f64>,
    pub cdelt: Vec<f64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TrajectoryConfig {
    pub n_images: usize,
    pub radius: f64,
    #[serde(default)]
    pub min_lon: f64,
    pub max_lon: f64,
    pub detector: DetectorConfig,
}

fn default_dtype() -> Dtype { Dtype::F64 }

impl FromStr for Config {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> { Ok(toml::from_str(s)?) }
}

pub fn read_config_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config: Config = fs::read_to_string(path)?.parse()?;
    log::info!("Read configuration from {}: {} grid {:?}, {} obstacle",
               path.display(), config.dtype, config.grid.shape, match config.obstacle {
                   Obstacle::None   => "no",
                   Obstacle::Sphere => "sphere",
               });
    Ok(config)
}

impl DetectorConfig {
    pub fn detector(&self) -> Result<Detector> {
        Detector::new(&self.shape, &self.crpix, &self.cdelt)
    }
}

impl ImageConfig {
    pub fn image(&self) -> Result<ImageGeometry> {
        let Self { position, distance, lon, lat, rol, ref detector } = *self;
        let pose = match (position, distance) {
            (Some(position), None) => Pose::new(position, lon, lat, rol),
            (None, Some(distance)) => Pose::from_spherical(distance, lon, lat, rol),
            _ => return Err(Error::Geometry(
                "each image needs exactly one of `position` and `distance`".into())),
        };
        Ok(ImageGeometry::new(pose, detector.detector()?))
    }
}

impl Config {

    pub fn grid_geometry(&self) -> Result<GridGeometry> {
        let GridConfig { shape, crpix, cdelt, crval } = self.grid;
        GridGeometry::new(shape, crpix, cdelt)?.with_crval(crval)
    }

    pub fn images(&self) -> Result<Vec<ImageGeometry>> {
        match (&self.images[..], &self.trajectory) {
            ([], Some(t)) => Ok(circular_trajectory(t.n_images, t.radius, t.min_lon, t.max_lon, t.detector.detector()?)),
            (images, None) if !images.is_empty() => images.iter().map(ImageConfig::image).collect(),
            _ => Err(Error::Geometry("specify either `images` or `trajectory`, not both".into())),
        }
    }

    /// The operator described by this configuration
    pub fn operator(&self) -> Result<DynOperator> {
        let operator = DynOperator::new(self.dtype, self.grid_geometry()?, self.images()?, self.obstacle)?;
        Ok(if self.time_resolved { operator.time_resolved() } else { operator })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};

    const GRID: &str = r#"
        [grid]
        shape = [8, 8, 8]
        crpix = [4.0, 4.0, 4.0]
        cdelt = [0.5, 0.5, 0.5]
    "#;

    // ----- Test an example on-disk config file -----------------------------------------
    #[test]
    fn test_config_file() {
        let config = read_config_file("siddon-config.toml").unwrap();
        assert_eq!(config.dtype, Dtype::F64);
        assert_eq!(config.obstacle, Obstacle::Sphere);
        assert_eq!(config.grid.shape, [64, 64, 64]);
        let trajectory = config.trajectory.as_ref().unwrap();
        assert_eq!(trajectory.n_images, 36);
        assert_eq!(config.images().unwrap().len(), 36);
        assert_eq!(config.operator().unwrap().n_measurements(), 36 * 32 * 32);
    }

    // ----- Some helpers to make the tests more concise ---------------------------------
    fn parse(input: &str) -> Config {
        input.parse().unwrap()
    }
    //  ---  Macro for concise assertions about values of parsed fields -------------------
    macro_rules! check {
        ($text:expr => $($field:ident = $expected:expr);+$(;)?) => {
            let config = parse($text);
            println!("DESERIALIZED: {config:?}");
            $(assert_eq!(config.$field, $expected);)*
        }
    }

    // ----- Test deserializing of individual aspects of the Config type ----------------
    #[test]
    fn config_defaults() {
        let text = format!("{GRID}\n[trajectory]\nn_images = 1\nradius = 5.0\nmax_lon = 1.0\n\
                            detector = {{ shape = [2], crpix = [1.0], cdelt = [0.1] }}");
        check!{&text =>
               dtype         = Dtype::F64;
               obstacle      = Obstacle::None;
               images        = vec![];
               time_resolved = false;
        }
    }

    #[test]
    fn config_dtype_and_obstacle() {
        check!{&format!("dtype = \"float32\"\nobstacle = \"sun\"\n{GRID}") =>
               dtype    = Dtype::F32;
               obstacle = Obstacle::Sphere;
        }
    }

    // ----- Make sure that unknown fields and values are not accepted -------------------
    #[test]
    fn config_reject_unknown_field() {
        let result = format!("unknown_field = 666\n{GRID}").parse::<Config>();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn config_reject_unknown_obstacle() {
        let result = format!("obstacle = \"cube\"\n{GRID}").parse::<Config>();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn config_reject_unknown_dtype() {
        let result = format!("dtype = \"f16\"\n{GRID}").parse::<Config>();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    // ----- Grid ------------------------------------------------------------------------
    #[test]
    fn config_grid() {
        let config = parse(r#"
            [grid]
            shape = [10, 20, 30]
            crpix = [5.0, 10.0, 15.0]
            cdelt = [0.1, 0.2, 0.3]
            crval = [1.0, 0.0, 0.0]
        "#);
        let geometry = config.grid_geometry().unwrap();
        assert_eq!(geometry.shape, [10, 20, 30]);
        assert_float_eq!(geometry.min_corner(), [0.5, -2.0, -4.5], abs_all <= 1e-12);
    }

    #[test]
    fn config_reject_zero_cell_size() {
        let config = parse("[grid]\nshape = [1, 1, 1]\ncrpix = [0.0, 0.0, 0.0]\ncdelt = [1.0, 0.0, 1.0]");
        assert!(matches!(config.grid_geometry(), Err(Error::Geometry(_))));
    }

    // ----- Images ----------------------------------------------------------------------
    #[test]
    fn config_explicit_images() {
        let config = parse(&format!(r#"{GRID}
            [[images]]
            position = [0.0, -215.0, 0.0]
            lon = 1.5707963267948966
            lat = 0.0
            detector = {{ shape = [4, 3], crpix = [2.0, 1.5], cdelt = [1e-4, 1e-4] }}

            [[images]]
            distance = 215.0
            lon = 0.0
            lat = 0.1
            rol = 0.2
            detector = {{ shape = [5], crpix = [2.5], cdelt = [1e-4] }}
        "#));
        let images = config.images().unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].detector.shape, [4, 3]);
        assert_eq!(images[1].detector.shape, [5, 1]);
        assert_float_eq!(images[1].pose.position.coords.norm(), 215.0, rmax <= 1e-12);
        assert_float_eq!(images[1].pose.rol, 0.2, ulps <= 0);
    }

    #[test]
    fn config_image_needs_one_placement() {
        let config = parse(&format!(r#"{GRID}
            [[images]]
            position = [0.0, -215.0, 0.0]
            distance = 215.0
            lon = 0.0
            lat = 0.0
            detector = {{ shape = [1], crpix = [0.0], cdelt = [1e-4] }}
        "#));
        assert!(matches!(config.images(), Err(Error::Geometry(_))));
    }

    #[test]
    fn config_needs_images_or_trajectory() {
        assert!(matches!(parse(GRID).images(), Err(Error::Geometry(_))));
    }

    #[test]
    fn config_time_resolved_operator() {
        let config = parse(&format!(r#"
            dtype = "f32"
            time_resolved = true
            {GRID}
            [trajectory]
            n_images = 3
            radius = 10.0
            max_lon = 3.0
            detector = {{ shape = [2, 2], crpix = [1.0, 1.0], cdelt = [0.01, 0.01] }}
        "#));
        let op = config.operator().unwrap();
        assert_eq!(op.dtype(), Dtype::F32);
        assert_eq!(op.zero_grid().len(), 3 * 512);
        assert_eq!(op.n_measurements(), 12);
    }
}
