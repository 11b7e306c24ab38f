//! Material trait for surface scattering.

use std::sync::Arc;

use prism_math::{Vec2, Vec3};
use rand::RngCore;

use crate::{gen_f32, hittable::HitRecord, random_unit_vector, Ray, SolidColor, Texture};

/// Color type alias (linear RGB, components in [0, inf))
pub type Color = Vec3;

/// Outcome of a successful scatter.
#[derive(Debug, Clone, Copy)]
pub struct ScatterResult {
    /// Color filter applied to the light carried by `scattered`
    pub attenuation: Color,
    /// The continuation ray
    pub scattered: Ray,
}

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// Scatter an incoming ray.
    ///
    /// Returns `None` if the ray is absorbed and the path ends here.
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult>;

    /// Get emitted light from this material.
    ///
    /// Most materials return black (no emission).
    fn emitted(&self, _uv: Vec2, _p: Vec3) -> Color {
        Color::ZERO
    }
}

/// Lambertian (diffuse) material.
#[derive(Clone)]
pub struct Lambertian {
    albedo: Arc<dyn Texture>,
}

impl Lambertian {
    /// Create a new Lambertian material with the given albedo color.
    pub fn new(albedo: Color) -> Self {
        Self::from_texture(Arc::new(SolidColor::new(albedo)))
    }

    /// Lambertian whose albedo is sampled from a texture.
    pub fn from_texture(albedo: Arc<dyn Texture>) -> Self {
        Self { albedo }
    }
}

impl Material for Lambertian {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        // Normal plus a point on the unit sphere is cosine distributed
        let mut scatter_direction = rec.normal + random_unit_vector(rng);

        // Catch degenerate scatter direction
        if scatter_direction.length_squared() < 1e-8 {
            scatter_direction = rec.normal;
        }

        Some(ScatterResult {
            attenuation: self.albedo.value(rec.uv, rec.p),
            scattered: Ray::new(rec.p, scatter_direction, ray_in.time()),
        })
    }
}

/// Metal (specular) material.
#[derive(Debug, Clone)]
pub struct Metal {
    albedo: Color,
    fuzz: f32,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fn new(albedo: Color, fuzz: f32) -> Self {
        Self {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }

    /// A perfect mirror.
    pub fn polished(albedo: Color) -> Self {
        Self::new(albedo, 0.0)
    }

    pub fn fuzz(&self) -> f32 {
        self.fuzz
    }
}

impl Material for Metal {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let reflected = reflect(ray_in.direction().normalize(), rec.normal);
        let scattered_dir = reflected + self.fuzz * random_unit_vector(rng);

        // Fuzz can push the ray below the surface; such rays are absorbed
        if scattered_dir.dot(rec.normal) > 0.0 {
            Some(ScatterResult {
                attenuation: self.albedo,
                scattered: Ray::new(rec.p, scattered_dir, ray_in.time()),
            })
        } else {
            None
        }
    }
}

/// Dielectric (glass) material.
#[derive(Debug, Clone, Copy)]
pub struct Dielectric {
    /// Index of refraction
    ior: f32,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn new(ior: f32) -> Self {
        Self { ior }
    }

    /// Schlick's approximation for reflectance
    fn reflectance(cosine: f32, ior: f32) -> f32 {
        let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }
}

impl Material for Dielectric {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let refraction_ratio = if rec.front_face { 1.0 / self.ior } else { self.ior };

        let unit_direction = ray_in.direction().normalize();
        let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

        // Total internal reflection
        let cannot_refract = refraction_ratio * sin_theta > 1.0;

        let direction = if cannot_refract
            || Self::reflectance(cos_theta, refraction_ratio) > gen_f32(rng)
        {
            reflect(unit_direction, rec.normal)
        } else {
            refract(unit_direction, rec.normal, refraction_ratio)
        };

        Some(ScatterResult {
            attenuation: Color::ONE,
            scattered: Ray::new(rec.p, direction, ray_in.time()),
        })
    }
}

/// Diffuse light emitter.
#[derive(Clone)]
pub struct DiffuseLight {
    emit: Arc<dyn Texture>,
}

impl DiffuseLight {
    /// Create a new diffuse light with the given emission color.
    pub fn new(emit: Color) -> Self {
        Self::from_texture(Arc::new(SolidColor::new(emit)))
    }

    pub fn from_texture(emit: Arc<dyn Texture>) -> Self {
        Self { emit }
    }
}

impl Material for DiffuseLight {
    fn scatter(&self, _ray_in: &Ray, _rec: &HitRecord, _rng: &mut dyn RngCore) -> Option<ScatterResult> {
        // Lights don't scatter rays
        None
    }

    fn emitted(&self, uv: Vec2, p: Vec3) -> Color {
        self.emit.value(uv, p)
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Reflect a vector about a normal.
#[inline]
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface.
#[inline]
fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CheckerTexture;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record_facing_up(material: &dyn Material) -> HitRecord<'_> {
        HitRecord {
            p: Vec3::ZERO,
            normal: Vec3::Y,
            material,
            uv: Vec2::new(0.5, 0.5),
            t: 1.0,
            front_face: true,
        }
    }

    #[test]
    fn test_lambertian_scatters_above_surface() {
        let material = Lambertian::new(Color::new(0.9, 0.4, 0.4));
        let rec = record_facing_up(&material);
        let ray_in = Ray::new(Vec3::new(0.0, 1.0, -1.0), Vec3::new(0.0, -1.0, 1.0), 0.25);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..200 {
            let result = material.scatter(&ray_in, &rec, &mut rng).unwrap();
            assert_eq!(result.attenuation, Color::new(0.9, 0.4, 0.4));
            assert!(result.scattered.direction().dot(rec.normal) >= 0.0);
            assert_eq!(result.scattered.time(), 0.25);
        }
        assert_eq!(material.emitted(rec.uv, rec.p), Color::ZERO);
    }

    #[test]
    fn test_lambertian_samples_texture_at_hit() {
        let checker = CheckerTexture::from_colors(Color::ONE, Color::ZERO).with_scale(1.0);
        let material = Lambertian::from_texture(Arc::new(checker));
        let mut rec = record_facing_up(&material);
        rec.p = Vec3::new(1.5, 0.5, 0.5);
        let ray_in = Ray::new_simple(Vec3::Y, Vec3::NEG_Y);

        let result = material.scatter(&ray_in, &rec, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(result.attenuation, Color::ZERO);
    }

    #[test]
    fn test_polished_metal_mirrors() {
        let material = Metal::polished(Color::new(0.8, 0.8, 0.2));
        let rec = record_facing_up(&material);
        let ray_in = Ray::new_simple(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0));

        let result = material.scatter(&ray_in, &rec, &mut StdRng::seed_from_u64(3)).unwrap();
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!((result.scattered.direction() - expected).length() < 1e-5);
        assert_eq!(result.attenuation, Color::new(0.8, 0.8, 0.2));
    }

    #[test]
    fn test_metal_fuzz_clamped_and_absorbs_below_surface() {
        assert_eq!(Metal::new(Color::ONE, 3.0).fuzz(), 1.0);
        assert_eq!(Metal::new(Color::ONE, -1.0).fuzz(), 0.0);

        // Grazing incidence with full fuzz must sometimes go below the surface
        let material = Metal::new(Color::ONE, 1.0);
        let rec = record_facing_up(&material);
        let ray_in = Ray::new_simple(Vec3::new(-1.0, 0.01, 0.0), Vec3::new(1.0, -0.01, 0.0));
        let mut rng = StdRng::seed_from_u64(9);

        let mut absorbed = 0;
        for _ in 0..200 {
            match material.scatter(&ray_in, &rec, &mut rng) {
                Some(result) => assert!(result.scattered.direction().dot(rec.normal) > 0.0),
                None => absorbed += 1,
            }
        }
        assert!(absorbed > 0);
    }

    #[test]
    fn test_dielectric_never_absorbs() {
        let material = Dielectric::new(1.5);
        let rec = record_facing_up(&material);
        let ray_in = Ray::new_simple(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..100 {
            let result = material.scatter(&ray_in, &rec, &mut rng).unwrap();
            assert_eq!(result.attenuation, Color::ONE);
            assert!((result.scattered.direction().length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_dielectric_total_internal_reflection() {
        let material = Dielectric::new(1.5);
        let mut rec = record_facing_up(&material);
        // Leaving the glass at a grazing angle
        rec.front_face = false;
        let ray_in = Ray::new_simple(Vec3::new(-1.0, 0.2, 0.0), Vec3::new(1.0, -0.2, 0.0));
        let mut rng = StdRng::seed_from_u64(8);

        for _ in 0..50 {
            let result = material.scatter(&ray_in, &rec, &mut rng).unwrap();
            // Reflection keeps the ray on the normal's side
            assert!(result.scattered.direction().y > 0.0);
        }
    }

    #[test]
    fn test_schlick_reflectance() {
        // Normal incidence on glass reflects about 4%
        assert!((Dielectric::reflectance(1.0, 1.5) - 0.04).abs() < 1e-4);
        // Grazing incidence reflects everything
        assert!((Dielectric::reflectance(0.0, 1.5) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_diffuse_light_emits_and_absorbs() {
        let material = DiffuseLight::new(Color::splat(10.0));
        let rec = record_facing_up(&material);
        let ray_in = Ray::new_simple(Vec3::Y, Vec3::NEG_Y);

        assert!(material
            .scatter(&ray_in, &rec, &mut StdRng::seed_from_u64(0))
            .is_none());
        assert_eq!(material.emitted(rec.uv, rec.p), Color::splat(10.0));
    }
}
