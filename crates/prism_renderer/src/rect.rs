//! Axis-aligned rectangles.
//!
//! A rectangle lies in a plane perpendicular to one axis at coordinate `k`
//! and spans `[a0, a1] x [b0, b1]` along the two remaining axes. They are
//! zero-thickness, so their bounding box is padded along the fixed axis.

use crate::{
    hittable::{HitRecord, Hittable},
    Material, Ray,
};
use prism_math::{Aabb, Interval, Vec2, Vec3};
use std::sync::Arc;

/// Orientation of a rectangle, named after the two axes it spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectPlane {
    /// Spans X and Y, fixed Z.
    XY,
    /// Spans X and Z, fixed Y.
    XZ,
    /// Spans Y and Z, fixed X.
    YZ,
}

impl RectPlane {
    /// Axis indices as `(a, b, fixed)`.
    #[inline]
    fn axes(self) -> (usize, usize, usize) {
        match self {
            RectPlane::XY => (0, 1, 2),
            RectPlane::XZ => (0, 2, 1),
            RectPlane::YZ => (1, 2, 0),
        }
    }
}

/// An axis-aligned rectangle.
pub struct Rect {
    plane: RectPlane,
    a: Interval,
    b: Interval,
    k: f32,
    material: Arc<dyn Material>,
}

impl Rect {
    /// Create a rectangle spanning `[a0, a1] x [b0, b1]` on the plane's free
    /// axes at coordinate `k` on its fixed axis. Bounds may be given in any order.
    pub fn new(
        plane: RectPlane,
        a0: f32,
        a1: f32,
        b0: f32,
        b1: f32,
        k: f32,
        material: Arc<dyn Material>,
    ) -> Self {
        Self {
            plane,
            a: Interval::new(a0.min(a1), a0.max(a1)),
            b: Interval::new(b0.min(b1), b0.max(b1)),
            k,
            material,
        }
    }

    /// Rectangle in the plane `z = k`.
    pub fn xy(x0: f32, x1: f32, y0: f32, y1: f32, k: f32, material: Arc<dyn Material>) -> Self {
        Self::new(RectPlane::XY, x0, x1, y0, y1, k, material)
    }

    /// Rectangle in the plane `y = k`.
    pub fn xz(x0: f32, x1: f32, z0: f32, z1: f32, k: f32, material: Arc<dyn Material>) -> Self {
        Self::new(RectPlane::XZ, x0, x1, z0, z1, k, material)
    }

    /// Rectangle in the plane `x = k`.
    pub fn yz(y0: f32, y1: f32, z0: f32, z1: f32, k: f32, material: Arc<dyn Material>) -> Self {
        Self::new(RectPlane::YZ, y0, y1, z0, z1, k, material)
    }

    pub fn plane(&self) -> RectPlane {
        self.plane
    }
}

impl Hittable for Rect {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        let (a_axis, b_axis, k_axis) = self.plane.axes();
        let origin = ray.origin().to_array();
        let direction = ray.direction().to_array();

        // Parallel rays give an infinite or NaN t, rejected here as well
        let t = (self.k - origin[k_axis]) / direction[k_axis];
        if !ray_t.surrounds(t) {
            return false;
        }

        let a = origin[a_axis] + t * direction[a_axis];
        let b = origin[b_axis] + t * direction[b_axis];
        if !self.a.contains(a) || !self.b.contains(b) {
            return false;
        }

        rec.t = t;
        rec.p = ray.at(t);
        rec.uv = Vec2::new(
            (a - self.a.min) / self.a.size().max(f32::EPSILON),
            (b - self.b.min) / self.b.size().max(f32::EPSILON),
        );

        let mut outward_normal = [0.0; 3];
        outward_normal[k_axis] = 1.0;
        rec.set_face_normal(ray, Vec3::from_array(outward_normal));
        rec.material = self.material.as_ref();

        true
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Option<Aabb> {
        let (a_axis, b_axis, k_axis) = self.plane.axes();
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];

        min[a_axis] = self.a.min;
        max[a_axis] = self.a.max;
        min[b_axis] = self.b.min;
        max[b_axis] = self.b.max;
        min[k_axis] = self.k;
        max[k_axis] = self.k;

        // from_points pads the flat axis
        Some(Aabb::from_points(Vec3::from_array(min), Vec3::from_array(max)))
    }
}
