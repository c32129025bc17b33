use std::f64::consts::PI;

use faer::{ColMut, ColRef};

// Returns the cross product of two vectors
pub fn cross(a: ColRef<f64>, b: ColRef<f64>, mut c: ColMut<f64>) {
    c[0] = a[1] * b[2] - a[2] * b[1];
    c[1] = a[2] * b[0] - a[0] * b[2];
    c[2] = a[0] * b[1] - a[1] * b[0];
}

/// Extracts Euler-123 (Tait-Bryan x-y-z) angles from a `[w, i, j, k]`
/// quaternion. Matches the host solver's rotation reporting convention.
#[inline]
pub fn quat_as_euler_angles(q: ColRef<f64>, mut v: ColMut<f64>) {
    let norm = q.norm_l2();
    let (w, x, y, z) = (q[0] / norm, q[1] / norm, q[2] / norm, q[3] / norm);

    v[0] = (2. * (w * x + y * z)).atan2(1. - 2. * (x * x + y * y));
    let a = (1. + 2. * (w * y - x * z)).sqrt();
    let b = (1. - 2. * (w * y - x * z)).sqrt();
    v[1] = -PI / 2. + 2. * a.atan2(b);
    v[2] = (2. * (w * z + x * y)).atan2(1. - 2. * (y * y + z * z));
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------
