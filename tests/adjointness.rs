// Projection followed by a dot product must agree with backprojection followed
// by a dot product, for arbitrary grids and measurements.

use ndarray::Array1;
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::SeedableRng;
use rand_isaac::Isaac64Rng;
use rstest::rstest;

use siddon::{
    circular_trajectory, dot_test, Detector, Grid, GridGeometry, LinearOperator, Obstacle, Sample,
    SiddonOperator,
};

fn operator<T: Sample>(obstacle: Obstacle, n_images: usize) -> SiddonOperator<T> {
    let geometry = GridGeometry::centered([4.0; 3], [16, 12, 10]).unwrap();
    let radius = 10.0;
    let fov = geometry.field_of_view(radius);
    let detector = Detector::centered(&[fov, fov], &[9, 7]).unwrap();
    let images = circular_trajectory(n_images, radius, 0.0, 3.0, detector);
    SiddonOperator::new(geometry, images, obstacle).unwrap()
}

fn random<T: Sample>(n: usize, low: f64, high: f64, seed: u64) -> Vec<T> {
    let mut rng = Isaac64Rng::seed_from_u64(seed);
    Array1::random_using(n, Uniform::new(low, high), &mut rng)
        .into_iter()
        .map(T::lit)
        .collect()
}

fn random_problem<T: Sample>(op: &SiddonOperator<T>, seed: u64) -> (Grid<T>, Vec<T>) {
    let (n_measurements, n_samples) = op.shape();
    let x = Grid::from_frames(*op.geometry(), op.n_frames(), random(n_samples, 0.0, 1.0, seed)).unwrap();
    let y = random(n_measurements, -1.0, 1.0, seed + 1);
    (x, y)
}

#[rstest(/**/ obstacle        , seed,
         case(Obstacle::None  , 1),
         case(Obstacle::None  , 2),
         case(Obstacle::Sphere, 3),
         case(Obstacle::Sphere, 4),
)]
fn adjointness_f64(obstacle: Obstacle, seed: u64) {
    let op = operator::<f64>(obstacle, 5);
    let (x, y) = random_problem(&op, seed);
    let mismatch = dot_test(&op, &x, &y).unwrap();
    assert!(mismatch < 1e-10, "relative mismatch {mismatch}");
}

#[rstest(obstacle, case(Obstacle::None), case(Obstacle::Sphere))]
fn adjointness_f32(obstacle: Obstacle) {
    let op = operator::<f32>(obstacle, 4);
    let (x, y) = random_problem(&op, 42);
    let mismatch = dot_test(&op, &x, &y).unwrap();
    assert!(mismatch < 1e-4, "relative mismatch {mismatch}");
}

#[test]
fn adjointness_time_resolved() {
    let op = operator::<f64>(Obstacle::Sphere, 3).time_resolved();
    assert_eq!(op.n_frames(), 3);
    let (x, y) = random_problem(&op, 99);
    let mismatch = dot_test(&op, &x, &y).unwrap();
    assert!(mismatch < 1e-10, "relative mismatch {mismatch}");
}

#[test]
fn adjointness_independent_of_job_size() {
    let (x, y) = random_problem(&operator::<f64>(Obstacle::None, 2), 7);
    let coarse = operator::<f64>(Obstacle::None, 2).with_job_size(1_000_000);
    let fine   = operator::<f64>(Obstacle::None, 2).with_job_size(1);
    let a = coarse.apply_adjoint(&y).unwrap();
    let b = fine  .apply_adjoint(&y).unwrap();
    for (a, b) in a.data.iter().zip(&b.data) {
        assert!((a - b).abs() <= 1e-12 * a.abs().max(1.0));
    }
    assert_eq!(coarse.apply(&x).unwrap(), fine.apply(&x).unwrap());
}
