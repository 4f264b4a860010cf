use nalgebra::{Unit, Vector3};

/// Reflect `vec` through `normal`.
pub fn reflect(vec: &Unit<Vector3<f32>>, normal: &Unit<Vector3<f32>>) -> Unit<Vector3<f32>> {
    Unit::new_unchecked(vec.as_ref() - normal.as_ref() * 2. * vec.dot(normal))
}

/// The sign of `x`, with zero mapping to zero rather than to `1.0` like `f32::signum`.
#[inline]
pub fn sign(x: f32) -> f32 {
    if x > 0. {
        1.
    } else if x < 0. {
        -1.
    } else {
        0.
    }
}

#[inline]
pub fn deg_to_rad(deg: f32) -> f32 {
    (deg / 180.) * std::f32::consts::PI
}

#[test]
fn test_deg_to_rad() {
    assert_eq!(std::f32::consts::PI, deg_to_rad(180.));
}

#[test]
fn test_sign() {
    assert_eq!(sign(-3.), -1.);
    assert_eq!(sign(0.), 0.);
    assert_eq!(sign(0.25), 1.);
}

#[test]
fn test_reflect() {
    let down = Unit::new_normalize(Vector3::new(1., -1., 0.));
    let up = Vector3::y_axis();
    let out = reflect(&down, &up);
    approx::assert_relative_eq!(out.into_inner(), Vector3::new(1., 1., 0.).normalize());
}
