//! Conversion between 1-d and 3-d voxel indices. The first axis varies
//! fastest.

use std::ops::{Add, Div, Mul, Rem};

pub fn index3_to_1<T>([ix, iy, iz]: [T; 3], [nx, ny, _nz]: [T; 3]) -> T
where
    T: Mul<Output = T> + Add<Output = T>
{
    ix + (iy + iz * ny) * nx
}

#[allow(clippy::many_single_char_names)]
pub fn index1_to_3<T>(i: T, [nx, ny, _nz]: [T; 3]) -> [T; 3]
where
    T: Mul<Output = T> +
    Div<Output = T> +
    Rem<Output = T> +
    Copy
{
    let z = i / (nx * ny);
    let r = i % (nx * ny);
    let y = r / nx;
    let x = r % nx;
    [x,y,z]
}

/// Convert a signed 3-d index into a 1-d one, if it lies inside `n`.
#[inline]
pub fn checked_index3_to_1([ix, iy, iz]: [isize; 3], n: [usize; 3]) -> Option<usize> {
    let inside = |i: isize, n: usize| i >= 0 && (i as usize) < n;
    if inside(ix, n[0]) && inside(iy, n[1]) && inside(iz, n[2]) {
        Some(index3_to_1([ix as usize, iy as usize, iz as usize], n))
    } else {
        None
    }
}
