use nalgebra::{Point3, Unit, Vector2, Vector3};
use smallvec::SmallVec;

use crate::{canvas::Color, math, ray::Ray, scene::ShapeId, transform::Transform};

/// Tolerance for degenerate determinants and for snapping box normals to a face.
pub const EPSILON: f32 = 1e-6;

#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
pub struct Distance(pub f32);

/// Primitive shapes, positioned directly in world space.
#[derive(Debug, Clone, PartialEq)]
pub enum Prim {
    /// A sphere with the given center and radius.
    Sphere { center: Point3<f32>, radius: f32 },

    /// A filled triangle with no depth.
    Triangle {
        a: Point3<f32>,
        b: Point3<f32>,
        c: Point3<f32>,
    },

    /// An axis-aligned cube with edge length `size`.
    Box { center: Point3<f32>, size: f32 },

    /// A cylinder whose axis is parallel to y.
    Cylinder {
        center: Point3<f32>,
        radius: f32,
        height: f32,
    },

    /// An infinite plane through `point`.
    Plane {
        point: Point3<f32>,
        normal: Vector3<f32>,
    },
}

/// A ray hit found by analytic intersection.
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    /// The ray parameter of the hit.
    pub t: f32,

    /// The outward normal at the hit.
    pub normal: Unit<Vector3<f32>>,
}

/// A primitive with its surface color and placement in the scene hierarchy.
#[derive(Debug, Clone)]
pub struct Shape {
    pub prim: Prim,
    pub color: Color,
    pub transform: Transform,

    /// Shapes that follow this one when it is moved. They are owned by the [`crate::scene::Scene`],
    /// this is only used for traversal.
    pub children: SmallVec<[ShapeId; 4]>,
}

impl Prim {
    /// Whether the distance oracle covers this primitive.
    pub fn marchable(&self) -> bool {
        !matches!(self, Prim::Plane { .. })
    }

    /// Whether the analytic intersection oracle covers this primitive.
    pub fn traceable(&self) -> bool {
        matches!(
            self,
            Prim::Sphere { .. } | Prim::Triangle { .. } | Prim::Plane { .. }
        )
    }

    /// Compute the distance from `p` to the surface of the primitive, negative inside closed
    /// solids. Triangles report an unsigned distance. Planes have no distance function and
    /// return `None`.
    pub fn sdf(&self, p: &Point3<f32>) -> Option<Distance> {
        let dist = match self {
            Prim::Sphere { center, radius } => (p - center).norm() - radius,

            Prim::Box { center, size } => {
                let q = (p - center).abs() - Vector3::repeat(0.5 * size);
                q.sup(&Vector3::zeros()).norm() + q.max().min(0.)
            }

            Prim::Cylinder {
                center,
                radius,
                height,
            } => {
                let d = cylinder_excess(p, center, *radius, *height);
                d.sup(&Vector2::zeros()).norm() + d.x.max(d.y).min(0.)
            }

            Prim::Triangle { a, b, c } => {
                let ba = b - a;
                let cb = c - b;
                let ac = a - c;

                let pa = p - a;
                let pb = p - b;
                let pc = p - c;

                let nor = ba.cross(&ac);

                let v = if math::sign(ba.cross(&nor).dot(&pa))
                    + math::sign(cb.cross(&nor).dot(&pb))
                    + math::sign(ac.cross(&nor).dot(&pc))
                    < 2.0
                {
                    let edge = |e: &Vector3<f32>, q: &Vector3<f32>| {
                        (e * f32::clamp(e.dot(q) / e.dot(e), 0.0, 1.0) - q).norm_squared()
                    };
                    edge(&ba, &pa).min(edge(&cb, &pb)).min(edge(&ac, &pc))
                } else {
                    nor.dot(&pa).powi(2) / nor.dot(&nor)
                };

                v.sqrt()
            }

            Prim::Plane { .. } => return None,
        };

        Some(Distance(dist))
    }

    /// The normal used for lighting a point on the surface.
    pub fn surface_normal(&self, p: &Point3<f32>) -> Unit<Vector3<f32>> {
        match self {
            Prim::Sphere { center, .. } => Unit::new_normalize(p - center),

            // Fixed orientation, independent of which side the point is on.
            Prim::Triangle { a, b, c } => -Unit::new_normalize((b - a).cross(&(c - a))),

            Prim::Box { center, .. } => {
                let n = (p - center).normalize();
                let max = n.abs().max();
                let snapped = if (max - n.x.abs()).abs() < EPSILON {
                    Vector3::new(math::sign(n.x), 0., 0.)
                } else if (max - n.y.abs()).abs() < EPSILON {
                    Vector3::new(0., math::sign(n.y), 0.)
                } else {
                    Vector3::new(0., 0., math::sign(n.z))
                };
                Unit::new_unchecked(snapped)
            }

            Prim::Cylinder {
                center,
                radius,
                height,
            } => {
                let d = cylinder_excess(p, center, *radius, *height);
                if d.y > d.x {
                    Unit::new_unchecked(Vector3::new(0., math::sign(p.y - center.y), 0.))
                } else {
                    Unit::new_normalize(Vector3::new(p.x - center.x, 0., p.z - center.z))
                }
            }

            Prim::Plane { normal, .. } => Unit::new_normalize(*normal),
        }
    }

    /// Find the nearest non-negative ray parameter at which the ray meets the primitive. The
    /// direction does not need to be normalized; `t` is measured in multiples of it. Boxes and
    /// cylinders are not supported and never intersect.
    pub fn intersect(&self, origin: &Point3<f32>, dir: &Vector3<f32>) -> Option<Intersection> {
        match self {
            Prim::Sphere { center, radius } => {
                let a = dir.norm_squared();
                let projection = (center - origin).dot(dir) / a;
                let closest = origin + dir * projection;
                let miss = (closest - center).norm_squared();
                let r2 = radius * radius;

                if miss > r2 {
                    return None;
                }

                let t = projection - ((r2 - miss) / a).sqrt();
                if t < 0. {
                    return None;
                }

                Some(Intersection {
                    t,
                    normal: Unit::new_normalize(origin + dir * t - center),
                })
            }

            Prim::Triangle { a, b, c } => {
                let edge1 = b - a;
                let edge2 = c - a;
                let h = dir.cross(&edge2);
                let det = edge1.dot(&h);

                if det.abs() < EPSILON {
                    return None;
                }

                let f = 1. / det;
                let s = origin - a;
                let u = f * s.dot(&h);
                if !(0.0..=1.0).contains(&u) {
                    return None;
                }

                let q = s.cross(&edge1);
                let v = f * dir.dot(&q);
                if v < 0. || u + v > 1. {
                    return None;
                }

                let t = f * edge2.dot(&q);
                if t <= EPSILON {
                    return None;
                }

                Some(Intersection {
                    t,
                    normal: Unit::new_normalize(edge1.cross(&edge2)),
                })
            }

            Prim::Plane { point, normal } => {
                let b = dir.dot(normal);
                if b.abs() < EPSILON {
                    return None;
                }

                let t = -normal.dot(&(origin - point)) / b;
                if t < 0. {
                    return None;
                }

                Some(Intersection {
                    t,
                    normal: Unit::new_normalize(*normal),
                })
            }

            Prim::Box { .. } | Prim::Cylinder { .. } => None,
        }
    }
}

/// Radial and vertical distance outside a y-aligned cylinder, per axis.
#[inline]
fn cylinder_excess(p: &Point3<f32>, center: &Point3<f32>, radius: f32, height: f32) -> Vector2<f32> {
    let radial = (p.xz() - center.xz()).norm();
    Vector2::new(radial, p.y - center.y).abs() - Vector2::new(radius, height * 0.5)
}

impl Shape {
    pub fn new(prim: Prim, color: Color) -> Self {
        Self {
            prim,
            color,
            transform: Transform::new(),
            children: SmallVec::new(),
        }
    }

    /// Distance from a world-space point. The transform is not consulted.
    #[inline]
    pub fn distance(&self, p: &Point3<f32>) -> Option<Distance> {
        self.prim.sdf(p)
    }

    /// Intersect a world-space ray with this shape, testing in the shape's local space and
    /// returning the normal in world space.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let (origin, direction) = ray.to_local(&self.transform);
        self.prim
            .intersect(&origin, &direction)
            .map(|hit| Intersection {
                t: hit.t,
                normal: self.transform.normal_to_world(hit.normal.as_ref()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn sphere() -> Prim {
        Prim::Sphere {
            center: Point3::new(1., 2., 3.),
            radius: 2.,
        }
    }

    fn triangle() -> Prim {
        Prim::Triangle {
            a: Point3::new(-1., -1., 0.),
            b: Point3::new(1., -1., 0.),
            c: Point3::new(0., 1., 0.),
        }
    }

    fn dist(prim: &Prim, p: Point3<f32>) -> f32 {
        prim.sdf(&p).expect("marchable").0
    }

    #[test]
    fn test_sphere_sdf() {
        let s = sphere();
        let center = Point3::new(1., 2., 3.);
        for dir in [
            Vector3::new(1., 0., 0.),
            Vector3::new(0., -1., 0.),
            Vector3::new(1., 1., 1.).normalize(),
            Vector3::new(-0.3, 0.2, -0.9).normalize(),
        ] {
            assert_abs_diff_eq!(dist(&s, center + dir * 2.), 0., epsilon = 1e-5);
            assert!(dist(&s, center + dir * 2.5) > 0.);
            assert!(dist(&s, center + dir * 1.5) < 0.);
        }
    }

    #[test]
    fn test_box_sdf() {
        let b = Prim::Box {
            center: Point3::new(0., 1., 0.),
            size: 2.,
        };
        assert_eq!(dist(&b, Point3::new(0., 1., 0.)), -1.);
        assert_abs_diff_eq!(dist(&b, Point3::new(3., 1., 0.)), 2.);
        assert_abs_diff_eq!(dist(&b, Point3::new(2., 3., 1.)), 2f32.sqrt());

        for axis in [Vector3::x(), Vector3::y(), Vector3::z(), -Vector3::y()] {
            let mut last = dist(&b, Point3::new(0., 1., 0.) + axis);
            for i in 1..20 {
                let next = dist(&b, Point3::new(0., 1., 0.) + axis * (1. + i as f32 * 0.25));
                assert!(next > last);
                last = next;
            }
        }
    }

    #[test]
    fn test_cylinder_sdf() {
        let c = Prim::Cylinder {
            center: Point3::new(1., 0., 1.),
            radius: 1.,
            height: 4.,
        };
        assert_eq!(dist(&c, Point3::new(1., 0., 1.)), -1.);
        assert_abs_diff_eq!(dist(&c, Point3::new(3., 0., 1.)), 1.);
        assert_abs_diff_eq!(dist(&c, Point3::new(1., 5., 1.)), 3.);

        for axis in [Vector3::x(), Vector3::y(), -Vector3::z()] {
            let start = if axis.y != 0. { 2. } else { 1. };
            let mut last = dist(&c, Point3::new(1., 0., 1.) + axis * start);
            for i in 1..20 {
                let p = Point3::new(1., 0., 1.) + axis * (start + i as f32 * 0.25);
                let next = dist(&c, p);
                assert!(next > last);
                last = next;
            }
        }
    }

    #[test]
    fn test_triangle_sdf() {
        let t = triangle();
        // Above the interior: distance to the plane.
        assert_abs_diff_eq!(dist(&t, Point3::new(0., 0., 2.)), 2.);
        assert_abs_diff_eq!(dist(&t, Point3::new(0., 0., -0.5)), 0.5);
        // Beyond a vertex: distance to that vertex.
        assert_abs_diff_eq!(dist(&t, Point3::new(0., 4., 0.)), 3.);
        // Beside an edge.
        assert_abs_diff_eq!(dist(&t, Point3::new(0., -3., 1.)), 5f32.sqrt());
        // On the surface.
        assert_abs_diff_eq!(dist(&t, Point3::new(0., 0., 0.)), 0.);
    }

    #[test]
    fn test_plane_has_no_sdf() {
        let p = Prim::Plane {
            point: Point3::origin(),
            normal: Vector3::y(),
        };
        assert!(p.sdf(&Point3::new(0., 1., 0.)).is_none());
        assert!(!p.marchable());
        assert!(p.traceable());
    }

    #[test]
    fn test_sphere_intersect() {
        let s = sphere();
        let hit = s
            .intersect(&Point3::new(1., 2., 10.), &Vector3::new(0., 0., -1.))
            .expect("hit");
        assert_abs_diff_eq!(hit.t, 5.);
        assert_relative_eq!(hit.normal.into_inner(), Vector3::z());

        // Pointing away.
        assert!(s
            .intersect(&Point3::new(1., 2., 10.), &Vector3::new(0., 0., 1.))
            .is_none());
        // Passing beside it.
        assert!(s
            .intersect(&Point3::new(4., 2., 10.), &Vector3::new(0., 0., -1.))
            .is_none());
    }

    #[test]
    fn test_sphere_intersect_unnormalized_direction() {
        let s = sphere();
        let hit = s
            .intersect(&Point3::new(1., 2., 10.), &Vector3::new(0., 0., -2.))
            .expect("hit");
        assert_abs_diff_eq!(hit.t, 2.5);
    }

    #[test]
    fn test_triangle_intersect_centroid() {
        let (a, b, c) = (
            Point3::new(0., 0., 0.),
            Point3::new(2., 0., 1.),
            Point3::new(0., 3., 1.),
        );
        let t = Prim::Triangle { a, b, c };
        let face = (b - a).cross(&(c - a)).normalize();
        let centroid = Point3::from((a.coords + b.coords + c.coords) / 3.);

        for side in [1., -1.] {
            let origin = centroid + face * (3. * side);
            let hit = t.intersect(&origin, &(-face * side)).expect("hit");
            assert!(hit.t > 0.);
            assert_abs_diff_eq!(hit.t, 3., epsilon = 1e-5);
            assert_abs_diff_eq!(hit.normal.dot(&face).abs(), 1., epsilon = 1e-5);
        }
    }

    #[test]
    fn test_triangle_intersect_misses() {
        let t = triangle();
        // Outside the edges.
        assert!(t
            .intersect(&Point3::new(2., 2., 1.), &-Vector3::z())
            .is_none());
        // Parallel to the plane.
        assert!(t
            .intersect(&Point3::new(0., 0., 1.), &Vector3::x())
            .is_none());
        // Behind the origin.
        assert!(t
            .intersect(&Point3::new(0., 0., 1.), &Vector3::z())
            .is_none());

        let degenerate = Prim::Triangle {
            a: Point3::origin(),
            b: Point3::origin(),
            c: Point3::new(0., 1., 0.),
        };
        assert!(degenerate
            .intersect(&Point3::new(0., 0., 1.), &-Vector3::z())
            .is_none());
    }

    #[test]
    fn test_plane_intersect() {
        let p = Prim::Plane {
            point: Point3::new(0., -1., 0.),
            normal: Vector3::y(),
        };
        let hit = p
            .intersect(&Point3::new(3., 4., 0.), &-Vector3::y())
            .expect("hit");
        assert_abs_diff_eq!(hit.t, 5.);
        assert_relative_eq!(hit.normal.into_inner(), Vector3::y());

        for origin in [
            Point3::new(0., 4., 0.),
            Point3::new(0., -1., 0.),
            Point3::new(7., -9., 2.),
        ] {
            assert!(p.intersect(&origin, &Vector3::x()).is_none());
            assert!(p
                .intersect(&origin, &Vector3::new(1., 0., 1.).normalize())
                .is_none());
        }
    }

    #[test]
    fn test_box_and_cylinder_do_not_trace() {
        let b = Prim::Box {
            center: Point3::origin(),
            size: 1.,
        };
        assert!(b
            .intersect(&Point3::new(0., 0., 5.), &-Vector3::z())
            .is_none());
        assert!(!b.traceable());
    }

    #[test]
    fn test_box_normal_snaps_to_face() {
        let b = Prim::Box {
            center: Point3::origin(),
            size: 2.,
        };
        let n = b.surface_normal(&Point3::new(1., 0.4, -0.2));
        assert_eq!(n.into_inner(), Vector3::x());
        let n = b.surface_normal(&Point3::new(0.3, 0.1, -1.));
        assert_eq!(n.into_inner(), -Vector3::z());
    }

    #[test]
    fn test_cylinder_normal() {
        let c = Prim::Cylinder {
            center: Point3::origin(),
            radius: 1.,
            height: 2.,
        };
        let side = c.surface_normal(&Point3::new(0., 0.5, 1.));
        assert_relative_eq!(side.into_inner(), Vector3::z());
        let top = c.surface_normal(&Point3::new(0.2, 1., 0.1));
        assert_eq!(top.into_inner(), Vector3::y());
        let bottom = c.surface_normal(&Point3::new(0.2, -1., 0.1));
        assert_eq!(bottom.into_inner(), -Vector3::y());
    }

    #[test]
    fn test_triangle_normal_orientation() {
        let n = triangle().surface_normal(&Point3::origin());
        assert_relative_eq!(n.into_inner(), -Vector3::z());
    }

    #[test]
    fn test_shape_intersect_uses_transform() {
        let mut shape = Shape::new(
            Prim::Sphere {
                center: Point3::origin(),
                radius: 1.,
            },
            Color::white(),
        );
        shape.transform = Transform::new().translate(&Vector3::new(3., 0., 0.));

        let ray = Ray::new(Point3::new(3., 0., 5.), -Vector3::z_axis());
        let hit = shape.intersect(&ray).expect("hit");
        assert_abs_diff_eq!(hit.t, 4.);
        assert_relative_eq!(hit.normal.into_inner(), Vector3::z());

        let ray = Ray::new(Point3::new(0., 0., 5.), -Vector3::z_axis());
        assert!(shape.intersect(&ray).is_none());
    }
}
