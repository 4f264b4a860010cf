use nalgebra::{Point3, Unit, Vector3};

use crate::transform::{ApplyTransform, Transform};

#[derive(Debug, Clone)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Unit<Vector3<f32>>,
}

impl Ray {
    /// Construct a new ray.
    pub fn new(origin: Point3<f32>, direction: Unit<Vector3<f32>>) -> Ray {
        Ray { origin, direction }
    }

    /// The point `t` units along the ray.
    #[inline]
    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction.scale(t)
    }

    /// Move the ray into the local space of `transform`. The direction is deliberately left
    /// unnormalized so that ray parameters stay comparable with the world-space ray.
    pub fn to_local(&self, transform: &Transform) -> (Point3<f32>, Vector3<f32>) {
        (
            self.origin.invert(transform),
            self.direction.as_ref().invert(transform),
        )
    }
}

#[test]
fn test_at() {
    let ray = Ray::new(Point3::new(0., 0., 5.), -Vector3::z_axis());
    assert_eq!(ray.at(0.), Point3::new(0., 0., 5.));
    assert_eq!(ray.at(2.), Point3::new(0., 0., 3.));
}

#[test]
fn test_to_local_keeps_parameterization() {
    let t = Transform::new().translate(&Vector3::new(0., 0., -1.));
    let ray = Ray::new(Point3::new(0., 0., 5.), -Vector3::z_axis());
    let (origin, direction) = ray.to_local(&t);
    assert_eq!(origin, Point3::new(0., 0., 6.));
    assert_eq!(direction, Vector3::new(0., 0., -1.));
}
