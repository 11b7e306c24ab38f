//! Camera for ray generation.

use crate::{gen_f32, Ray};
use prism_math::Vec3;
use rand::RngCore;

/// Where the camera sits and where it looks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraOrientation {
    pub position: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
}

impl Default for CameraOrientation {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            look_at: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }
}

/// Projection and lens settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraProps {
    /// Vertical field of view in degrees
    pub vfov: f32,
    /// Viewport width over height
    pub aspect_ratio: f32,
    /// Distance from camera to plane of perfect focus
    pub focus_dist: f32,
    /// Radius of the lens disk; 0 disables depth of field
    pub lens_radius: f32,
}

impl Default for CameraProps {
    fn default() -> Self {
        Self {
            vfov: 90.0,
            aspect_ratio: 16.0 / 9.0,
            focus_dist: 1.0,
            lens_radius: 0.0,
        }
    }
}

/// Thin-lens perspective camera with a shutter interval.
///
/// All derived vectors are computed on construction; the camera is immutable
/// afterwards and shared by every render thread.
#[derive(Debug, Clone)]
pub struct Camera {
    orientation: CameraOrientation,
    props: CameraProps,
    time0: f32,
    time1: f32,

    // Cached computed values
    upper_left: Vec3,
    horizontal: Vec3,
    vertical: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
}

impl Camera {
    /// Create a camera with shutter open over `[time0, time1]`.
    pub fn new(orientation: CameraOrientation, props: CameraProps, time0: f32, time1: f32) -> Self {
        let theta = props.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * props.focus_dist;
        let viewport_width = viewport_height * props.aspect_ratio;

        // Camera basis vectors
        let w = (orientation.position - orientation.look_at).normalize();
        let u = orientation.up.cross(w).normalize();
        let v = w.cross(u);

        // Viewport spans left to right and top to bottom
        let horizontal = viewport_width * u;
        let vertical = -viewport_height * v;
        let upper_left =
            orientation.position - props.focus_dist * w - horizontal / 2.0 - vertical / 2.0;

        Self {
            orientation,
            props,
            time0,
            time1,
            upper_left,
            horizontal,
            vertical,
            u,
            v,
            w,
        }
    }

    /// Camera with the shutter open only at time 0.
    pub fn still(orientation: CameraOrientation, props: CameraProps) -> Self {
        Self::new(orientation, props, 0.0, 0.0)
    }

    /// Same camera with a different aspect ratio, e.g. after the output
    /// image was resized.
    pub fn with_aspect_ratio(&self, aspect_ratio: f32) -> Self {
        let props = CameraProps {
            aspect_ratio,
            ..self.props
        };
        Self::new(self.orientation, props, self.time0, self.time1)
    }

    /// Generate a ray through normalized image coordinates.
    ///
    /// `s` runs 0..1 left to right and `t` runs 0..1 top to bottom. The
    /// origin is jittered over the lens disk and the time is drawn uniformly
    /// from the shutter interval.
    pub fn cast_ray(&self, s: f32, t: f32, rng: &mut dyn RngCore) -> Ray {
        let origin = if self.props.lens_radius <= 0.0 {
            self.orientation.position
        } else {
            let rd = self.props.lens_radius * random_in_unit_disk(rng);
            self.orientation.position + self.u * rd.x + self.v * rd.y
        };

        let target = self.upper_left + s * self.horizontal + t * self.vertical;
        let time = self.time0 + gen_f32(rng) * (self.time1 - self.time0);

        Ray::new(origin, target - origin, time)
    }

    pub fn orientation(&self) -> &CameraOrientation {
        &self.orientation
    }

    pub fn props(&self) -> &CameraProps {
        &self.props
    }

    /// Shutter interval `(time0, time1)`.
    pub fn shutter(&self) -> (f32, f32) {
        (self.time0, self.time1)
    }

    /// Unit vector pointing from the look-at point back to the camera.
    pub fn backward(&self) -> Vec3 {
        self.w
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::still(CameraOrientation::default(), CameraProps::default())
    }
}

/// Sample a random point in the unit disk.
fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(gen_f32(rng) * 2.0 - 1.0, gen_f32(rng) * 2.0 - 1.0, 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}
