use nalgebra::{Point3, Unit, Vector3};

use crate::{
    canvas::Color,
    math,
    shape::{Prim, Shape},
    transform::Transform,
};

/// The shapes of a scene, in the order they were added.
#[derive(Debug, Default, Clone)]
pub struct Scene {
    shapes: Vec<Shape>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeId(u32);

impl ShapeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Scene {
    #[inline]
    fn add_shape(&mut self, prim: Prim, color: Color) -> ShapeId {
        let id = ShapeId(self.shapes.len() as u32);
        self.shapes.push(Shape::new(prim, color));
        id
    }

    /// Fetch a shape from the scene.
    #[inline]
    pub fn shape(&self, ShapeId(id): ShapeId) -> &Shape {
        &self.shapes[id as usize]
    }

    #[inline]
    fn shape_mut(&mut self, ShapeId(id): ShapeId) -> &mut Shape {
        &mut self.shapes[id as usize]
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// The most recently added shape.
    pub fn last(&self) -> Option<ShapeId> {
        self.shapes.len().checked_sub(1).map(|ix| ShapeId(ix as u32))
    }

    /// Iterate the shapes in scene order.
    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, &Shape)> {
        self.shapes
            .iter()
            .enumerate()
            .map(|(ix, shape)| (ShapeId(ix as u32), shape))
    }

    /// Construct a sphere in the scene.
    pub fn sphere(&mut self, center: Point3<f32>, radius: f32, color: Color) -> ShapeId {
        self.add_shape(Prim::Sphere { center, radius }, color)
    }

    /// Construct a triangle in the scene, with no depth.
    pub fn triangle(
        &mut self,
        a: Point3<f32>,
        b: Point3<f32>,
        c: Point3<f32>,
        color: Color,
    ) -> ShapeId {
        self.add_shape(Prim::Triangle { a, b, c }, color)
    }

    /// Construct an axis-aligned cube in the scene.
    pub fn cube(&mut self, center: Point3<f32>, size: f32, color: Color) -> ShapeId {
        self.add_shape(Prim::Box { center, size }, color)
    }

    /// Construct a y-aligned cylinder in the scene.
    pub fn cylinder(
        &mut self,
        center: Point3<f32>,
        radius: f32,
        height: f32,
        color: Color,
    ) -> ShapeId {
        self.add_shape(
            Prim::Cylinder {
                center,
                radius,
                height,
            },
            color,
        )
    }

    /// Construct a plane in the scene.
    pub fn plane(&mut self, point: Point3<f32>, normal: Vector3<f32>, color: Color) -> ShapeId {
        self.add_shape(Prim::Plane { point, normal }, color)
    }

    /// Replace the object-to-world transform of a shape.
    pub fn set_transform(&mut self, id: ShapeId, transform: Transform) {
        self.shape_mut(id).transform = transform;
    }

    /// Record `child` as following `parent` when it moves.
    pub fn add_child(&mut self, parent: ShapeId, child: ShapeId) {
        self.shape_mut(parent).children.push(child);
    }

    /// Translate a shape in world space, along with all of its descendants.
    pub fn translate(&mut self, id: ShapeId, offset: &Vector3<f32>) {
        self.propagate(id, |transform| transform.translate(offset));
    }

    /// Rotate a shape about its own origin, along with all of its descendants.
    pub fn rotate(&mut self, id: ShapeId, degrees: f32, axis: &Unit<Vector3<f32>>) {
        let axisangle = axis.into_inner() * math::deg_to_rad(degrees);
        self.propagate(id, |transform| transform.rotate(&axisangle));
    }

    /// Update the transform of `root` and then its children, depth first.
    fn propagate<F>(&mut self, root: ShapeId, update: F)
    where
        F: Fn(Transform) -> Transform,
    {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let shape = self.shape_mut(id);
            shape.transform = update(std::mem::take(&mut shape.transform));
            stack.extend(shape.children.iter().rev().copied());
        }
    }
}
