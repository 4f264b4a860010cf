use nalgebra::{Matrix4, Point2, Point3, Unit, Vector3, Vector4};

use crate::ray::Ray;

#[derive(Debug, Clone)]
pub struct CanvasInfo {
    /// The width in pixels of the canvas.
    pub width: u32,

    /// The height in pixels of the canvas.
    pub height: u32,
}

impl CanvasInfo {
    /// Create a new [`CanvasInfo`].
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Compute the aspect ratio.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[derive(Debug, Clone)]
pub struct Sample {
    /// The pixel on the film the ray passes through.
    pub film: Point2<f32>,
}

impl Sample {
    pub fn new(fx: f32, fy: f32) -> Self {
        Self {
            film: Point2::new(fx, fy),
        }
    }

    /// The sample for pixel `(x, y)`, taken at the pixel's corner.
    pub fn pixel(x: u32, y: u32) -> Self {
        Self::new(x as f32, y as f32)
    }
}

pub trait Camera: Sync {
    /// Given a [`Sample`], generate a ray.
    fn generate_ray(&self, sample: &Sample) -> Ray;
}

/// A camera placed with a look-at view matrix. There is no separate projection: the clip-space
/// point of each pixel is pushed through the inverse view matrix directly.
#[derive(Debug, Clone)]
pub struct LookAtCamera {
    position: Point3<f32>,
    inverse_view: Matrix4<f32>,
    width: f32,
    height: f32,
    aspect: f32,
}

impl LookAtCamera {
    /// Returns `None` when the view matrix can't be inverted, for example when the position and
    /// target coincide or `up` is parallel to the view direction.
    pub fn new(
        info: &CanvasInfo,
        position: Point3<f32>,
        target: Point3<f32>,
        up: Vector3<f32>,
    ) -> Option<Self> {
        let view = Matrix4::look_at_rh(&position, &target, &up);
        let inverse_view = view.try_inverse()?;

        if inverse_view.iter().any(|x| !x.is_finite()) {
            return None;
        }

        Some(Self {
            position,
            inverse_view,
            width: info.width as f32,
            height: info.height as f32,
            aspect: info.aspect_ratio(),
        })
    }
}

impl Camera for LookAtCamera {
    fn generate_ray(&self, sample: &Sample) -> Ray {
        let ndc_x = self.aspect * ((2.0 * sample.film.x) / self.width - 1.0);
        let ndc_y = 1.0 - (2.0 * sample.film.y) / self.height;
        let clip = Vector4::new(ndc_x, ndc_y, -1.0, 1.0);
        let eye = self.inverse_view * clip;
        let direction = -Unit::new_normalize(eye.xyz());

        Ray::new(self.position, direction)
    }
}
