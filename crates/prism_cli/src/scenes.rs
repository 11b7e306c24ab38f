//! Built-in demo scenes.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use prism_renderer::{
    gen_f32, Camera, CameraOrientation, CameraProps, CheckerTexture, Color, Dielectric,
    DiffuseLight, Hittable, ImageTexture, Lambertian, Material, Metal, MovingSphere, NoiseTexture,
    Rect, Scene, Sphere, Texture, Vec3,
};
use rand::rngs::StdRng;

/// Names accepted by [`build`].
pub const SCENE_NAMES: &[&str] = &[
    "sandbox",
    "perlin_noise",
    "cornell_box",
    "random_spheres",
    "motion_blur",
];

const SKY: Color = Color::new(0.5, 0.7, 1.0);

/// Build the scene called `name`.
pub fn build(
    name: &str,
    aspect_ratio: f32,
    earth_texture: Option<&Path>,
    rng: &mut StdRng,
) -> Result<Scene> {
    match name {
        "sandbox" => sandbox(aspect_ratio),
        "perlin_noise" => perlin_noise(aspect_ratio, earth_texture, rng),
        "cornell_box" => cornell_box(aspect_ratio),
        "random_spheres" => random_spheres(aspect_ratio, rng),
        "motion_blur" => motion_blur(aspect_ratio, rng),
        _ => bail!(
            "Unknown scene '{}', expected one of: {}",
            name,
            SCENE_NAMES.join(", ")
        ),
    }
}

fn look_from(position: Vec3, look_at: Vec3) -> CameraOrientation {
    CameraOrientation {
        position,
        look_at,
        up: Vec3::Y,
    }
}

fn random_color(rng: &mut StdRng, min: f32, max: f32) -> Color {
    let r = gen_f32(rng);
    let g = gen_f32(rng);
    let b = gen_f32(rng);
    Color::splat(min) + (max - min) * Color::new(r, g, b)
}

/// Three spheres (metal, diffuse, glass) on a checkered ground.
pub fn sandbox(aspect_ratio: f32) -> Result<Scene> {
    let orientation = look_from(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -3.0));
    let camera = Camera::new(
        orientation,
        CameraProps {
            vfov: 45.0,
            aspect_ratio,
            focus_dist: (orientation.position - orientation.look_at).length(),
            lens_radius: 0.0,
        },
        0.0,
        1.0,
    );

    let checker = Arc::new(CheckerTexture::from_colors(
        Color::splat(0.9),
        Color::new(0.2, 0.3, 0.1),
    ));
    let ground = Arc::new(Lambertian::from_texture(checker));
    let diffuse = Arc::new(Lambertian::new(Color::new(0.9, 0.4, 0.4)));
    let glass = Arc::new(Dielectric::new(1.5));
    let metal = Arc::new(Metal::polished(Color::new(0.8, 0.8, 0.2)));

    let objects: Vec<Box<dyn Hittable>> = vec![
        Box::new(Sphere::new(Vec3::new(0.0, -100.45, 0.0), 100.0, ground)),
        Box::new(Sphere::new(Vec3::new(1.0, 0.0, -3.0), 0.5, metal)),
        Box::new(Sphere::new(Vec3::new(0.0, 0.0, -3.0), 0.5, diffuse)),
        Box::new(Sphere::new(Vec3::new(-1.0, 0.0, -3.0), 0.5, glass)),
    ];

    Ok(Scene::with_bvh(camera, objects, SKY)?)
}

/// Marble ground, a textured globe and two area lights in the dark.
///
/// Without `earth_texture` the globe gets a checker pattern instead.
pub fn perlin_noise(
    aspect_ratio: f32,
    earth_texture: Option<&Path>,
    rng: &mut StdRng,
) -> Result<Scene> {
    let orientation = look_from(Vec3::new(23.0, 3.0, 6.0), Vec3::new(0.0, 2.0, 0.0));
    let camera = Camera::new(
        orientation,
        CameraProps {
            vfov: 20.0,
            aspect_ratio,
            focus_dist: (orientation.position - orientation.look_at).length(),
            lens_radius: 0.0,
        },
        0.0,
        1.0,
    );

    let marble = Arc::new(Lambertian::from_texture(Arc::new(NoiseTexture::new(10.0, rng))));
    let globe_texture: Arc<dyn Texture> = match earth_texture {
        Some(path) => Arc::new(
            ImageTexture::load(path)
                .with_context(|| format!("Failed to load texture {}", path.display()))?,
        ),
        None => Arc::new(
            CheckerTexture::from_colors(Color::new(0.1, 0.2, 0.6), Color::new(0.2, 0.6, 0.2))
                .with_scale(4.0),
        ),
    };
    let globe = Arc::new(Lambertian::from_texture(globe_texture));
    let light: Arc<dyn Material> = Arc::new(DiffuseLight::new(Color::splat(10.0)));

    let objects: Vec<Box<dyn Hittable>> = vec![
        Box::new(Sphere::new(Vec3::new(0.0, -1000.0, 0.0), 1000.0, marble)),
        Box::new(Sphere::new(Vec3::new(0.0, 1.0, 0.0), 1.0, globe)),
        Box::new(Rect::xy(2.0, 6.0, 1.0, 3.0, -3.0, light.clone())),
        Box::new(Sphere::new(Vec3::new(0.0, 3.0, 0.0), 1.0, light)),
    ];

    Ok(Scene::with_bvh(camera, objects, Color::ZERO)?)
}

/// Empty Cornell box lit by a ceiling panel.
pub fn cornell_box(aspect_ratio: f32) -> Result<Scene> {
    let orientation = look_from(Vec3::new(278.0, 278.0, -800.0), Vec3::new(278.0, 278.0, 0.0));
    let camera = Camera::new(
        orientation,
        CameraProps {
            vfov: 40.0,
            aspect_ratio,
            focus_dist: (orientation.position - orientation.look_at).length(),
            lens_radius: 0.0,
        },
        0.0,
        1.0,
    );

    let red = Arc::new(Lambertian::new(Color::new(0.65, 0.05, 0.05)));
    let white: Arc<dyn Material> = Arc::new(Lambertian::new(Color::splat(0.73)));
    let green = Arc::new(Lambertian::new(Color::new(0.12, 0.45, 0.15)));
    let light = Arc::new(DiffuseLight::new(Color::splat(15.0)));

    let objects: Vec<Box<dyn Hittable>> = vec![
        Box::new(Rect::yz(0.0, 555.0, 0.0, 555.0, 555.0, green)),
        Box::new(Rect::yz(0.0, 555.0, 0.0, 555.0, 0.0, red)),
        Box::new(Rect::xz(213.0, 343.0, 227.0, 332.0, 554.0, light)),
        Box::new(Rect::xz(0.0, 555.0, 0.0, 555.0, 0.0, white.clone())),
        Box::new(Rect::xz(0.0, 555.0, 0.0, 555.0, 555.0, white.clone())),
        Box::new(Rect::xy(0.0, 555.0, 0.0, 555.0, 555.0, white)),
    ];

    Ok(Scene::with_bvh(camera, objects, Color::ZERO)?)
}

/// Grid of small random spheres around three large ones.
pub fn random_spheres(aspect_ratio: f32, rng: &mut StdRng) -> Result<Scene> {
    let camera = Camera::still(
        look_from(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO),
        CameraProps {
            vfov: 20.0,
            aspect_ratio,
            focus_dist: 10.0,
            lens_radius: 0.05,
        },
    );

    let mut objects = small_spheres(rng, false);
    objects.push(Box::new(Sphere::new(
        Vec3::new(0.0, -1000.0, 0.0),
        1000.0,
        Arc::new(Lambertian::new(Color::splat(0.5))),
    )));
    objects.extend(feature_spheres());

    Ok(Scene::with_bvh(camera, objects, SKY)?)
}

/// Random spheres again, with the diffuse ones bouncing during the shutter.
pub fn motion_blur(aspect_ratio: f32, rng: &mut StdRng) -> Result<Scene> {
    let camera = Camera::new(
        look_from(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO),
        CameraProps {
            vfov: 20.0,
            aspect_ratio,
            focus_dist: 10.0,
            lens_radius: 0.0,
        },
        0.0,
        1.0,
    );

    let checker = Arc::new(CheckerTexture::from_colors(
        Color::new(0.2, 0.3, 0.1),
        Color::splat(0.9),
    ));
    let mut objects = small_spheres(rng, true);
    objects.push(Box::new(Sphere::new(
        Vec3::new(0.0, -1000.0, 0.0),
        1000.0,
        Arc::new(Lambertian::from_texture(checker)),
    )));
    objects.extend(feature_spheres());

    Ok(Scene::with_bvh(camera, objects, SKY)?)
}

fn small_spheres(rng: &mut StdRng, moving: bool) -> Vec<Box<dyn Hittable>> {
    let mut objects: Vec<Box<dyn Hittable>> = Vec::new();

    for a in -11..11 {
        for b in -11..11 {
            let choose_mat = gen_f32(rng);
            let center = Vec3::new(
                a as f32 + 0.9 * gen_f32(rng),
                0.2,
                b as f32 + 0.9 * gen_f32(rng),
            );

            // Keep clear of the large metal sphere
            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            if choose_mat < 0.8 {
                let albedo = random_color(rng, 0.0, 1.0) * random_color(rng, 0.0, 1.0);
                let material = Arc::new(Lambertian::new(albedo));
                if moving {
                    let center1 = center + Vec3::new(0.0, 0.5 * gen_f32(rng), 0.0);
                    objects.push(Box::new(MovingSphere::new(
                        center, 0.0, center1, 1.0, 0.2, material,
                    )));
                } else {
                    objects.push(Box::new(Sphere::new(center, 0.2, material)));
                }
            } else if choose_mat < 0.95 {
                let albedo = random_color(rng, 0.5, 1.0);
                let fuzz = 0.5 * gen_f32(rng);
                objects.push(Box::new(Sphere::new(center, 0.2, Arc::new(Metal::new(albedo, fuzz)))));
            } else {
                objects.push(Box::new(Sphere::new(center, 0.2, Arc::new(Dielectric::new(1.5)))));
            }
        }
    }

    objects
}

fn feature_spheres() -> Vec<Box<dyn Hittable>> {
    vec![
        Box::new(Sphere::new(
            Vec3::new(0.0, 1.0, 0.0),
            1.0,
            Arc::new(Dielectric::new(1.5)),
        )),
        Box::new(Sphere::new(
            Vec3::new(-4.0, 1.0, 0.0),
            1.0,
            Arc::new(Lambertian::new(Color::new(0.4, 0.2, 0.1))),
        )),
        Box::new(Sphere::new(
            Vec3::new(4.0, 1.0, 0.0),
            1.0,
            Arc::new(Metal::polished(Color::new(0.7, 0.6, 0.5))),
        )),
    ]
}
