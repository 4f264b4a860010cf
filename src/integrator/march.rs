use std::ops::ControlFlow;

use nalgebra::Point3;

use crate::{
    canvas::Color,
    integrator::Integrator,
    lighting::Lighting,
    ray::Ray,
    scene::{Scene, ShapeId},
};

#[derive(Debug, Clone)]
pub struct MarchConfig {
    pub max_steps: u32,

    /// Distance below which a point counts as touching a surface.
    pub min_dist: f32,
    pub max_dist: f32,

    /// Step length used when walking toward the light for shadows.
    pub shadow_step: f32,
}

impl Default for MarchConfig {
    fn default() -> Self {
        Self {
            max_steps: 100,
            min_dist: 0.001,
            max_dist: 100.,
            shadow_step: 0.001,
        }
    }
}

impl MarchConfig {
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_max_dist(mut self, max_dist: f32) -> Self {
        self.max_dist = max_dist;
        self
    }

    pub fn with_shadow_step(mut self, shadow_step: f32) -> Self {
        self.shadow_step = shadow_step;
        self
    }
}

/// Why a march gave up without hitting anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhaustion {
    Steps,
    Distance,
}

/// The terminal state of a single march.
#[derive(Debug, Clone, PartialEq)]
pub enum MarchOutcome {
    Hit {
        /// The shape that was touched.
        shape: ShapeId,

        /// Where the ray was when it touched.
        point: Point3<f32>,

        /// The number of steps taken before the hit.
        steps: u32,
    },

    Exhausted(Exhaustion),
}

/// March the ray until it touches a shape or runs out of fuel.
///
/// At each step the shapes are scanned in scene order, and the first one closer than
/// `min_dist` is the hit, even if a later shape would be closer still. Otherwise the ray
/// advances by the smallest distance seen. Shapes without a distance function are skipped.
pub fn march(config: &MarchConfig, scene: &Scene, ray: &Ray) -> MarchOutcome {
    let mut traveled = 0.;

    for steps in 0..config.max_steps {
        if traveled >= config.max_dist {
            return MarchOutcome::Exhausted(Exhaustion::Distance);
        }

        let point = ray.at(traveled);

        let scan = scene.iter().try_fold(f32::INFINITY, |nearest, (id, shape)| {
            match shape.distance(&point) {
                Some(dist) if dist.0 < config.min_dist => ControlFlow::Break(id),
                Some(dist) => ControlFlow::Continue(nearest.min(dist.0)),
                None => ControlFlow::Continue(nearest),
            }
        });

        match scan {
            ControlFlow::Break(shape) => {
                return MarchOutcome::Hit {
                    shape,
                    point,
                    steps,
                }
            }
            ControlFlow::Continue(nearest) => traveled += nearest,
        }
    }

    MarchOutcome::Exhausted(Exhaustion::Steps)
}

/// Sphere marching with Phong lighting and hard shadows.
#[derive(Debug, Clone, Default)]
pub struct Marcher {
    pub config: MarchConfig,
    pub lighting: Lighting,
}

impl Marcher {
    pub fn new(config: MarchConfig, lighting: Lighting) -> Self {
        Self { config, lighting }
    }
}

impl Integrator for Marcher {
    fn luminance(&self, scene: &Scene, ray: &Ray) -> Color {
        match march(&self.config, scene, ray) {
            MarchOutcome::Hit { shape, point, .. } => {
                self.lighting
                    .shade(&self.config, scene, shape, &point, &ray.origin)
            }
            MarchOutcome::Exhausted(_) => Color::black(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        camera::{Camera, CanvasInfo, LookAtCamera, Sample},
        shape::Prim,
    };
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    fn center_ray() -> Ray {
        Ray::new(Point3::new(0., 0., 5.), -Vector3::z_axis())
    }

    #[test]
    fn test_center_ray_hits_quickly() {
        let mut scene = Scene::default();
        let sphere = scene.sphere(Point3::origin(), 1., Color::new(1., 0., 0.));

        let camera = LookAtCamera::new(
            &CanvasInfo::new(4, 4),
            Point3::new(0., 0., 5.),
            Point3::origin(),
            Vector3::y(),
        )
        .expect("valid camera");
        let ray = camera.generate_ray(&Sample::pixel(2, 2));

        match march(&MarchConfig::default(), &scene, &ray) {
            MarchOutcome::Hit { shape, point, steps } => {
                assert_eq!(shape, sphere);
                assert!(steps <= 4);
                assert_abs_diff_eq!(point.z, 1., epsilon = 1e-3);
            }
            other => panic!("expected a hit, got {:?}", other),
        }

        let marcher = Marcher::default();
        let color = marcher.luminance(&scene, &ray);
        let lit = marcher.lighting.phong(&scene, sphere, &(ray.at(4.)), &ray.origin);
        assert!(!color.is_black());
        assert_abs_diff_eq!(color.r, lit.r, epsilon = 1e-4);
        assert_eq!(color.g, lit.g);
        assert_eq!(color.b, lit.b);
    }

    #[test]
    fn test_miss_exhausts_distance() {
        let mut scene = Scene::default();
        scene.sphere(Point3::new(5., 0., 0.), 1., Color::white());
        let outcome = march(&MarchConfig::default(), &scene, &center_ray());
        assert_eq!(outcome, MarchOutcome::Exhausted(Exhaustion::Distance));
        assert!(Marcher::default().luminance(&scene, &center_ray()).is_black());
    }

    #[test]
    fn test_empty_scene_exhausts_distance() {
        let outcome = march(&MarchConfig::default(), &Scene::default(), &center_ray());
        assert_eq!(outcome, MarchOutcome::Exhausted(Exhaustion::Distance));
    }

    #[test]
    fn test_step_budget() {
        let mut scene = Scene::default();
        scene.sphere(Point3::origin(), 1., Color::white());
        let config = MarchConfig::default().with_max_steps(1);
        let outcome = march(&config, &scene, &center_ray());
        assert_eq!(outcome, MarchOutcome::Exhausted(Exhaustion::Steps));
    }

    #[test]
    fn test_planes_are_skipped() {
        let mut scene = Scene::default();
        scene.plane(Point3::origin(), Vector3::z(), Color::white());
        let sphere = scene.sphere(Point3::origin(), 1., Color::white());
        match march(&MarchConfig::default(), &scene, &center_ray()) {
            MarchOutcome::Hit { shape, .. } => assert_eq!(shape, sphere),
            other => panic!("expected a hit, got {:?}", other),
        }
    }

    #[test]
    fn test_first_touch_in_scan_order_wins() {
        // Both surfaces meet the ray at z = 1, so both are touched on the same step.
        let spheres = [
            Prim::Sphere {
                center: Point3::origin(),
                radius: 1.,
            },
            Prim::Sphere {
                center: Point3::new(0., 0., -0.5),
                radius: 1.5,
            },
        ];

        for order in [[0, 1], [1, 0]] {
            let mut scene = Scene::default();
            let ids: Vec<_> = order
                .iter()
                .map(|&ix| match spheres[ix] {
                    Prim::Sphere { center, radius } => scene.sphere(center, radius, Color::white()),
                    _ => unreachable!(),
                })
                .collect();

            match march(&MarchConfig::default(), &scene, &center_ray()) {
                MarchOutcome::Hit { shape, steps, .. } => {
                    assert_eq!(shape, ids[0]);
                    assert_eq!(steps, 1);
                }
                other => panic!("expected a hit, got {:?}", other),
            }
        }
    }
}
