use num_traits::Float;

/// Minimal dot product on plain coordinate triplets.
pub trait Dot {
    type Output;
    fn dot(self, other: Self) -> Self::Output;
}

impl<T: Float> Dot for [T; 3] {
    type Output = T;
    #[inline]
    fn dot(self, other: Self) -> T {
        self[0] * other[0] + self[1] * other[1] + self[2] * other[2]
    }
}

/// Parametric distances at which the line `origin + t * dir` crosses the sphere
/// of radius `r` centred on the coordinate origin, nearest first.
///
/// `dir` need not be normalized. Lines which miss the sphere, or only graze it
/// tangentially, give `None`.
pub fn sphere_line_intersections<T: Float>(origin: [T; 3], dir: [T; 3], r: T) -> Option<(T, T)> {
    let two = T::one() + T::one();
    let four = two + two;
    // Viète coefficients
    let a = dir.dot(dir);
    let b = two * origin.dot(dir);
    let c = origin.dot(origin) - r * r;
    let discriminant = b * b - four * a * c;
    if a == T::zero() || !(discriminant > T::zero()) { return None }
    // Avoid cancellation between `b` and the root
    let q = -(b + b.signum() * discriminant.sqrt()) / two;
    let (t1, t2) = (q / a, c / q);
    Some(if t1 <= t2 { (t1, t2) } else { (t2, t1) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest(/**/   origin        ,    dir         ,  r ,  expected,
             // along an axis, towards the centre
             case([-10.0, 0.0, 0.0], [1.0, 0.0, 0.0], 1.0, Some((9.0, 11.0))),
             case([ 0.0, 5.0, 0.0], [0.0,-1.0, 0.0], 2.0, Some((3.0,  7.0))),
             // away from the centre: both crossings behind the origin of the line
             case([ 0.0, 0.0, 4.0], [0.0, 0.0, 1.0], 1.0, Some((-5.0, -3.0))),
             // non-normalized direction
             case([-10.0, 0.0, 0.0], [2.0, 0.0, 0.0], 1.0, Some((4.5, 5.5))),
             // miss
             case([-10.0, 3.0, 0.0], [1.0, 0.0, 0.0], 1.0, None),
             // tangent
             case([-10.0, 1.0, 0.0], [1.0, 0.0, 0.0], 1.0, None),
             // degenerate direction
             case([-10.0, 0.0, 0.0], [0.0, 0.0, 0.0], 1.0, None),
    )]
    fn hand_picked(origin: [f64; 3], dir: [f64; 3], r: f64, expected: Option<(f64, f64)>) {
        let got = sphere_line_intersections(origin, dir, r);
        match (got, expected) {
            (Some((a, b)), Some((x, y))) => {
                assert_float_eq!(a, x, abs <= 1e-12);
                assert_float_eq!(b, y, abs <= 1e-12);
            }
            (got, expected) => assert_eq!(got, expected),
        }
    }

    proptest! {
        #[test]
        fn crossings_lie_on_sphere(
            ox in -50.0..50.0_f64, oy in -50.0..50.0_f64, oz in -50.0..50.0_f64,
            // aim at a point inside the sphere, so that the line cannot miss
            tx in  -0.5..0.5_f64,  ty in  -0.5..0.5_f64,  tz in  -0.5..0.5_f64,
            r  in   1.0..5.0_f64,
        ) {
            let origin = [ox, oy, oz];
            let dir = [tx - ox, ty - oy, tz - oz];
            prop_assume!(dir.dot(dir) > 1e-6);
            let (t1, t2) = sphere_line_intersections(origin, dir, r).unwrap();
            assert!(t1 < t2);
            for t in [t1, t2] {
                let p = [ox + t * dir[0], oy + t * dir[1], oz + t * dir[2]];
                assert_float_eq!(p.dot(p).sqrt(), r, rmax <= 1e-9);
            }
        }
    }
}
