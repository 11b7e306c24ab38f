//! Recursive Monte Carlo path tracing estimator.

use crate::{Color, HitRecord, Hittable, Ray};
use rand::RngCore;

/// Compute the radiance carried back along `ray`.
///
/// One scatter sample per bounce; variance is reduced only by the
/// per-pixel sample loop. Paths are cut off after `depth` segments, so
/// `depth == 0` always returns black. Rays that miss everything return
/// `background` unchanged.
pub fn ray_color(
    ray: &Ray,
    world: &dyn Hittable,
    background: Color,
    depth: u32,
    rng: &mut dyn RngCore,
) -> Color {
    if depth == 0 {
        return Color::ZERO;
    }

    let mut rec = HitRecord::default();
    if !world.hit(ray, Ray::valid_range(), &mut rec) {
        return background;
    }

    let emitted = rec.material.emitted(rec.uv, rec.p);

    match rec.material.scatter(ray, &rec, rng) {
        Some(result) => {
            let incoming = ray_color(&result.scattered, world, background, depth - 1, rng);
            emitted + result.attenuation * incoming
        }
        // Absorbed, or a light source
        None => emitted,
    }
}
