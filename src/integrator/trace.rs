use crate::{
    canvas::Color,
    integrator::Integrator,
    ray::Ray,
    scene::{Scene, ShapeId},
    shape::Intersection,
};

/// Find the shape whose surface the ray meets first. When two shapes are hit at exactly the
/// same distance the one earlier in the scene wins.
pub fn nearest_hit(scene: &Scene, ray: &Ray) -> Option<(ShapeId, Intersection)> {
    scene
        .iter()
        .filter_map(|(id, shape)| shape.intersect(ray).map(|hit| (id, hit)))
        .fold(None, |nearest, (id, hit)| match nearest {
            Some((best_id, best)) if best.t <= hit.t => Some((best_id, best)),
            _ => Some((id, hit)),
        })
}

/// Analytic ray casting. Hits are flat colored with no lighting.
#[derive(Debug, Clone, Default)]
pub struct Tracer;

impl Integrator for Tracer {
    fn luminance(&self, scene: &Scene, ray: &Ray) -> Color {
        nearest_hit(scene, ray).map_or_else(Color::black, |(id, _)| scene.shape(id).color)
    }
}
