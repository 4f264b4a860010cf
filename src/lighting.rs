use nalgebra::{Point3, Unit};

use crate::{
    canvas::Color,
    integrator::march::MarchConfig,
    math,
    scene::{Scene, ShapeId},
};

/// The single point light and the Phong constants used when shading marched hits.
#[derive(Debug, Clone)]
pub struct Lighting {
    pub light_position: Point3<f32>,
    pub light_color: Color,
    pub ambient: Color,
    pub specular_color: Color,
    pub shininess: f32,

    /// Factor applied to the whole shaded color of a point that can't see the light.
    pub shadow_attenuation: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            light_position: Point3::new(-5., -5., 5.),
            light_color: Color::white(),
            ambient: Color::new(0.1, 0.1, 0.1),
            specular_color: Color::new(0.5, 0.5, 0.5),
            shininess: 10.,
            shadow_attenuation: 0.2,
        }
    }
}

impl Lighting {
    /// Shade `point` on the surface of `hit` as seen from `eye`, including the shadow test.
    pub fn shade(
        &self,
        config: &MarchConfig,
        scene: &Scene,
        hit: ShapeId,
        point: &Point3<f32>,
        eye: &Point3<f32>,
    ) -> Color {
        let color = self.phong(scene, hit, point, eye);
        if self.in_shadow(config, scene, hit, point) {
            color * self.shadow_attenuation
        } else {
            color
        }
    }

    /// The unshadowed color of `point` on the surface of `hit`.
    pub fn phong(
        &self,
        scene: &Scene,
        hit: ShapeId,
        point: &Point3<f32>,
        eye: &Point3<f32>,
    ) -> Color {
        let shape = scene.shape(hit);
        let normal = shape.prim.surface_normal(point);

        // direction to the light
        let lightv = Unit::new_normalize(self.light_position - point);
        let diffuse = normal.dot(&lightv).max(0.);

        // direction to the eye
        let eyev = Unit::new_normalize(eye - point);
        let reflectv = math::reflect(&(-lightv), &normal);
        let specular = eyev.dot(&reflectv).max(0.).powf(self.shininess);

        (self.ambient + diffuse * (shape.color * self.light_color) + specular * self.specular_color)
            .clamp()
    }

    /// Step from `point` toward the light in fixed increments, testing every shape other than
    /// `hit` at each step. Any of them coming within `min_dist` puts the point in shadow. A step
    /// that is not a positive finite length never finds an occluder.
    pub fn in_shadow(
        &self,
        config: &MarchConfig,
        scene: &Scene,
        hit: ShapeId,
        point: &Point3<f32>,
    ) -> bool {
        let step = config.shadow_step;
        if !(step.is_finite() && step > 0.) {
            return false;
        }

        let to_light = self.light_position - point;
        let dist_to_light = to_light.norm();
        let dir = to_light / dist_to_light;
        let steps = (dist_to_light / step).ceil() as u64;

        (1..=steps)
            .map(|i| i as f32 * step)
            .take_while(|t| *t < dist_to_light)
            .any(|t| {
                let probe = point + dir * t;
                scene
                    .iter()
                    .filter(|(id, _)| *id != hit)
                    .filter_map(|(_, shape)| shape.distance(&probe))
                    .any(|dist| dist.0 < config.min_dist)
            })
    }
}
