use std::ops::Neg;

use nalgebra::{Matrix4, Point3, Unit, Vector3};

/// An affine object-to-world transform, carrying its inverse so that rays can be moved into
/// object space without re-inverting per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    matrix: Matrix4<f32>,
    inverse: Matrix4<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    pub fn new() -> Self {
        Self {
            matrix: Matrix4::identity(),
            inverse: Matrix4::identity(),
        }
    }

    /// Wrap an arbitrary matrix. Returns `None` when the matrix has no inverse.
    pub fn from_matrix(matrix: Matrix4<f32>) -> Option<Self> {
        let inverse = matrix.try_inverse()?;
        Some(Self { matrix, inverse })
    }

    pub fn matrix(&self) -> &Matrix4<f32> {
        &self.matrix
    }

    /// Append a translation to this transform. The translation happens in world space, after
    /// everything already in the transform.
    pub fn translate(mut self, vec: &Vector3<f32>) -> Self {
        self.matrix.append_translation_mut(vec);
        self.inverse.prepend_translation_mut(&vec.neg());
        self
    }

    /// Compose an axis-angle rotation on the object side of the transform, so the object turns in
    /// place regardless of where it has been moved to.
    pub fn rotate(mut self, axisangle: &Vector3<f32>) -> Self {
        self.matrix = self.matrix * Matrix4::new_rotation(*axisangle);
        self.inverse = Matrix4::new_rotation(axisangle.neg()) * self.inverse;
        self
    }

    /// Move an object-space normal into world space using the inverse-transpose.
    pub fn normal_to_world(&self, normal: &Vector3<f32>) -> Unit<Vector3<f32>> {
        Unit::new_normalize(self.inverse.transpose().transform_vector(normal))
    }
}

pub trait ApplyTransform {
    fn apply(&self, transform: &Transform) -> Self;
    fn invert(&self, transform: &Transform) -> Self;
}

impl ApplyTransform for Point3<f32> {
    #[inline]
    fn apply(&self, transform: &Transform) -> Self {
        transform.matrix.transform_point(self)
    }

    #[inline]
    fn invert(&self, transform: &Transform) -> Self {
        transform.inverse.transform_point(self)
    }
}

impl ApplyTransform for Vector3<f32> {
    #[inline]
    fn apply(&self, transform: &Transform) -> Self {
        transform.matrix.transform_vector(self)
    }

    #[inline]
    fn invert(&self, transform: &Transform) -> Self {
        transform.inverse.transform_vector(self)
    }
}
