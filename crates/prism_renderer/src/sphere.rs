//! Sphere primitives for ray tracing.

use crate::{
    hittable::{HitRecord, Hittable},
    Material, Ray,
};
use prism_math::{Aabb, Interval, Vec2, Vec3};
use std::f32::consts::PI;
use std::sync::Arc;

/// A static sphere.
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material: Arc<dyn Material>,
    bbox: Aabb,
}

impl Sphere {
    /// Create a new sphere. Negative radii are clamped to zero.
    pub fn new(center: Vec3, radius: f32, material: Arc<dyn Material>) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        Self {
            center,
            radius,
            material,
            bbox,
        }
    }
}

impl Hittable for Sphere {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        hit_sphere(
            self.center,
            self.radius,
            self.material.as_ref(),
            ray,
            ray_t,
            rec,
        )
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Option<Aabb> {
        Some(self.bbox)
    }
}

/// A sphere whose center moves linearly from `center0` at `time0` to
/// `center1` at `time1`. Rays sample the position at their own time.
pub struct MovingSphere {
    center0: Vec3,
    center1: Vec3,
    time0: f32,
    time1: f32,
    radius: f32,
    material: Arc<dyn Material>,
}

impl MovingSphere {
    pub fn new(
        center0: Vec3,
        time0: f32,
        center1: Vec3,
        time1: f32,
        radius: f32,
        material: Arc<dyn Material>,
    ) -> Self {
        Self {
            center0,
            center1,
            time0,
            time1,
            radius: radius.max(0.0),
            material,
        }
    }

    /// Center of the sphere at the given time.
    pub fn center(&self, time: f32) -> Vec3 {
        let span = self.time1 - self.time0;
        if span.abs() <= f32::EPSILON {
            return self.center0;
        }
        self.center0 + ((time - self.time0) / span) * (self.center1 - self.center0)
    }

    fn box_at(&self, time: f32) -> Aabb {
        let center = self.center(time);
        let rvec = Vec3::splat(self.radius);
        Aabb::from_points(center - rvec, center + rvec)
    }
}

impl Hittable for MovingSphere {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        hit_sphere(
            self.center(ray.time()),
            self.radius,
            self.material.as_ref(),
            ray,
            ray_t,
            rec,
        )
    }

    fn bounding_box(&self, time0: f32, time1: f32) -> Option<Aabb> {
        Some(self.box_at(time0).merge(&self.box_at(time1)))
    }
}

/// Shared ray/sphere intersection for static and moving spheres.
fn hit_sphere<'a>(
    center: Vec3,
    radius: f32,
    material: &'a dyn Material,
    ray: &Ray,
    ray_t: Interval,
    rec: &mut HitRecord<'a>,
) -> bool {
    if radius <= 0.0 {
        return false;
    }

    let oc = center - ray.origin();
    let a = ray.direction().length_squared();
    let h = ray.direction().dot(oc);
    let c = oc.length_squared() - radius * radius;

    let discriminant = h * h - a * c;
    if discriminant < 0.0 {
        return false;
    }

    let sqrtd = discriminant.sqrt();

    // Find the nearest root in the acceptable range
    let mut root = (h - sqrtd) / a;
    if !ray_t.surrounds(root) {
        root = (h + sqrtd) / a;
        if !ray_t.surrounds(root) {
            return false;
        }
    }

    rec.t = root;
    rec.p = ray.at(rec.t);
    let outward_normal = (rec.p - center) / radius;
    rec.set_face_normal(ray, outward_normal);
    rec.uv = sphere_uv(outward_normal);
    rec.material = material;

    true
}

/// UV coordinates for a point on the unit sphere centered at the origin.
///
/// u: angle around the Y axis from X=-1, v: angle from Y=-1 to Y=+1.
fn sphere_uv(p: Vec3) -> Vec2 {
    let theta = (-p.y).clamp(-1.0, 1.0).acos();
    let phi = (-p.z).atan2(p.x) + PI;

    Vec2::new(phi / (2.0 * PI), theta / PI)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Lambertian;

    fn grey() -> Arc<dyn Material> {
        Arc::new(Lambertian::new(Vec3::splat(0.5)))
    }

    #[test]
    fn test_sphere_hit_distance_and_normal() {
        let center = Vec3::new(0.0, 0.0, -1.0);
        let sphere = Sphere::new(center, 0.5, grey());

        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();

        assert!(sphere.hit(&ray, Ray::valid_range(), &mut rec));
        assert!((rec.t - 0.5).abs() < 1e-4);
        assert!((rec.normal.length() - 1.0).abs() < 1e-4);
        assert!(rec.normal.dot(rec.p - center) > 0.0);
        assert!(rec.front_face);
    }

    #[test]
    fn test_sphere_hit_unnormalized_direction() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0, grey());
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -4.0));
        let mut rec = HitRecord::default();

        assert!(sphere.hit(&ray, Ray::valid_range(), &mut rec));
        // Hit point z = -4 reached at t = 1 with a direction of length 4
        assert!((rec.t - 1.0).abs() < 1e-4);
        assert!((rec.p.z - -4.0).abs() < 1e-4);
    }

    #[test]
    fn test_sphere_hit_from_inside() {
        let sphere = Sphere::new(Vec3::ZERO, 2.0, grey());
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::X);
        let mut rec = HitRecord::default();

        assert!(sphere.hit(&ray, Ray::valid_range(), &mut rec));
        assert!((rec.t - 2.0).abs() < 1e-4);
        assert!(!rec.front_face);
        assert!(rec.normal.dot(ray.direction()) < 0.0);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, grey());

        // Ray pointing away from sphere
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        let mut rec = HitRecord::default();

        assert!(!sphere.hit(&ray, Ray::valid_range(), &mut rec));
    }

    #[test]
    fn test_sphere_outside_interval() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0, grey());
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::NEG_Z);
        let mut rec = HitRecord::default();

        assert!(!sphere.hit(&ray, Interval::new(0.001, 5.0), &mut rec));
    }

    #[test]
    fn test_sphere_uv_range() {
        for p in [Vec3::X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_X] {
            let uv = sphere_uv(p);
            assert!((0.0..=1.0).contains(&uv.x));
            assert!((0.0..=1.0).contains(&uv.y));
        }
        assert!((sphere_uv(Vec3::NEG_Y).y - 0.0).abs() < 1e-5);
        assert!((sphere_uv(Vec3::Y).y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_moving_sphere_follows_ray_time() {
        let sphere = MovingSphere::new(
            Vec3::new(0.0, 0.0, -5.0),
            0.0,
            Vec3::new(10.0, 0.0, -5.0),
            1.0,
            0.5,
            grey(),
        );
        let mut rec = HitRecord::default();

        let early = Ray::new(Vec3::ZERO, Vec3::NEG_Z, 0.0);
        assert!(sphere.hit(&early, Ray::valid_range(), &mut rec));

        let late = Ray::new(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        assert!(!sphere.hit(&late, Ray::valid_range(), &mut rec));

        let late_shifted = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::NEG_Z, 1.0);
        assert!(sphere.hit(&late_shifted, Ray::valid_range(), &mut rec));
    }

    #[test]
    fn test_moving_sphere_box_covers_shutter() {
        let sphere = MovingSphere::new(
            Vec3::new(0.0, 0.0, 0.0),
            0.0,
            Vec3::new(4.0, 0.0, 0.0),
            1.0,
            1.0,
            grey(),
        );
        let bbox = sphere.bounding_box(0.0, 1.0).unwrap();

        assert!((bbox.x.min - -1.0).abs() < 1e-5);
        assert!((bbox.x.max - 5.0).abs() < 1e-5);
    }
}
