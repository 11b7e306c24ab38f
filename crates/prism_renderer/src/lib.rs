//! Prism Renderer - CPU Path Tracing
//!
//! A Monte Carlo path tracer for physically-based rendering of small
//! analytic scenes: spheres, moving spheres and axis-aligned rectangles
//! with diffuse, metal, glass and emissive materials.
//!
//! Scenes are immutable once built and shared across the render threads
//! behind an `Arc`. The [`Renderer`] owns the output image and a worker
//! pool that renders disjoint bands of rows in parallel.

mod bvh;
mod camera;
mod hittable;
mod image_buffer;
mod integrator;
mod material;
mod perlin;
mod rect;
mod renderer;
mod scene;
mod sphere;
mod texture;

pub use bvh::BvhNode;
pub use camera::{Camera, CameraOrientation, CameraProps};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use image_buffer::{color_to_rgba, linear_to_gamma, pack_rgba, unpack_rgba, ImageBuffer};
pub use integrator::ray_color;
pub use material::{
    Color, Dielectric, DiffuseLight, Lambertian, Material, Metal, ScatterResult,
};
pub use perlin::Perlin;
pub use rect::{Rect, RectPlane};
pub use renderer::{
    partition_rows, render_pixel, CancelToken, RenderError, RenderProgress, RenderState,
    RenderStats, Renderer, RendererProps,
};
pub use scene::{Scene, SceneError};
pub use sphere::{MovingSphere, Sphere};
pub use texture::{
    CheckerTexture, ImageTexture, NoiseTexture, SolidColor, Texture, TextureError, TextureResult,
};

/// Re-export Vec3 and common math types from prism_math
pub use prism_math::{Aabb, Interval, Ray, Vec2, Vec3};

use rand::RngCore;

/// Uniform random float in [0, 1).
///
/// Uses the top 24 bits of one draw so every value is exactly representable.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() >> 8) as f32 / (1u32 << 24) as f32
}

/// Random unit vector, uniformly distributed on the sphere.
pub fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
        );
        let len_sq = p.length_squared();
        // Skip points outside the ball and ones too close to the origin
        if len_sq > 1e-12 && len_sq <= 1.0 {
            return p / len_sq.sqrt();
        }
    }
}
