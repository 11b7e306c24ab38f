//! Multithreaded path tracing renderer.
//!
//! The image is split into one contiguous band of rows per worker thread.
//! Each band owns a disjoint slice of the output buffer, so workers write
//! pixels without synchronization while sharing the immutable scene.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{color_to_rgba, gen_f32, pack_rgba, ray_color, Color, ImageBuffer, Scene};

/// Errors that abort a render or renderer setup.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Thread count must be positive")]
    InvalidThreadCount,

    #[error("Failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Non-finite color computed for pixel ({x}, {y})")]
    NonFiniteSample { x: u32, y: u32 },

    #[error("Render was cancelled")]
    Cancelled,

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Renderer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererProps {
    /// Worker threads, and the number of row bands per render
    pub threads_count: usize,
    /// Samples per pixel for anti-aliasing; 0 turns renders into no-ops
    pub samples_per_pixel: u32,
    /// Maximum number of bounces after the primary ray
    pub max_depth: u32,
    /// Base seed for the per-row random streams; random when unset
    pub seed: Option<u64>,
}

impl Default for RendererProps {
    fn default() -> Self {
        Self {
            threads_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            samples_per_pixel: 100,
            max_depth: 50,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Rendering,
}

/// Summary of a finished render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStats {
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
    pub threads: usize,
    pub elapsed: Duration,
}

/// Approximate progress of the current render.
///
/// Workers update it with relaxed atomics as they finish rows, so readers
/// may observe slightly stale values. It is a progress indicator only.
/// Other threads holding it see [`RenderState::Rendering`] while a render
/// is in flight.
#[derive(Debug, Default)]
pub struct RenderProgress {
    rendering: AtomicBool,
    rows_completed: AtomicU32,
    elapsed_ms: AtomicU64,
}

impl RenderProgress {
    pub fn state(&self) -> RenderState {
        if self.rendering.load(Ordering::Relaxed) {
            RenderState::Rendering
        } else {
            RenderState::Idle
        }
    }

    pub fn rows_completed(&self) -> u32 {
        self.rows_completed.load(Ordering::Relaxed)
    }

    /// Wall-clock time since the render started, as last reported by a worker.
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::Relaxed))
    }

    fn start(&self) {
        self.rows_completed.store(0, Ordering::Relaxed);
        self.elapsed_ms.store(0, Ordering::Relaxed);
        self.rendering.store(true, Ordering::Relaxed);
    }

    fn finish(&self, elapsed: Duration) {
        self.record_elapsed(elapsed);
        self.rendering.store(false, Ordering::Relaxed);
    }

    fn row_done(&self, elapsed: Duration) {
        self.rows_completed.fetch_add(1, Ordering::Relaxed);
        self.record_elapsed(elapsed);
    }

    fn record_elapsed(&self, elapsed: Duration) {
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.elapsed_ms.fetch_max(ms, Ordering::Relaxed);
    }
}

/// Cooperative cancellation flag for an in-flight render.
///
/// Workers check it between rows. The flag is cleared when the render it
/// stopped returns, so a token can be reused for the next render.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Split `[0, height)` into `parts` contiguous row ranges.
///
/// Range sizes differ by at most one; earlier ranges take the remainder.
/// When there are more parts than rows the trailing ranges are empty.
pub fn partition_rows(height: u32, parts: usize) -> Vec<Range<u32>> {
    let parts = parts.max(1) as u32;
    let base = height / parts;
    let extra = height % parts;

    let mut start = 0;
    (0..parts)
        .map(|i| {
            let len = base + u32::from(i < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

/// Average `samples_per_pixel` jittered samples for pixel (x, y).
///
/// Each sample picks a uniform offset inside the pixel, casts a camera ray
/// and traces it for the primary segment plus `max_depth` bounces. Black
/// when `samples_per_pixel` is 0.
pub fn render_pixel(
    scene: &Scene,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    props: &RendererProps,
    rng: &mut dyn RngCore,
) -> Color {
    if props.samples_per_pixel == 0 {
        return Color::ZERO;
    }

    let depth = props.max_depth.saturating_add(1);
    let mut pixel_color = Color::ZERO;

    for _ in 0..props.samples_per_pixel {
        let s = (x as f32 + gen_f32(rng)) / width as f32;
        let t = (y as f32 + gen_f32(rng)) / height as f32;
        let ray = scene.camera.cast_ray(s, t, rng);
        pixel_color += ray_color(&ray, scene.world(), scene.background, depth, rng);
    }

    pixel_color / props.samples_per_pixel as f32
}

/// Seed of the random stream for one row, independent of which worker
/// renders it.
fn row_seed(seed: u64, row: u32) -> u64 {
    seed ^ (u64::from(row) + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Read-only state shared by the row-band tasks of one render.
struct FrameContext<'a> {
    scene: &'a Scene,
    props: &'a RendererProps,
    width: u32,
    height: u32,
    seed: u64,
    started: Instant,
    progress: &'a RenderProgress,
    cancel: &'a CancelToken,
}

impl FrameContext<'_> {
    /// Render a band of rows into `pixels`, which holds exactly those rows.
    fn render_rows(&self, rows: Range<u32>, pixels: &mut [u32]) -> Result<(), RenderError> {
        for (y, row) in rows.zip(pixels.chunks_mut(self.width as usize)) {
            if self.cancel.is_cancelled() {
                return Err(RenderError::Cancelled);
            }

            let mut rng = StdRng::seed_from_u64(row_seed(self.seed, y));
            for (x, pixel) in (0..self.width).zip(row.iter_mut()) {
                let color = render_pixel(
                    self.scene,
                    x,
                    y,
                    self.width,
                    self.height,
                    self.props,
                    &mut rng,
                );
                if !color.is_finite() {
                    return Err(RenderError::NonFiniteSample { x, y });
                }
                *pixel = pack_rgba(color_to_rgba(color));
            }

            self.progress.row_done(self.started.elapsed());
        }

        Ok(())
    }
}

/// Render context owning the output image, the worker pool and settings.
pub struct Renderer {
    props: RendererProps,
    image: ImageBuffer,
    scene: Option<Arc<Scene>>,
    pool: rayon::ThreadPool,
    progress: Arc<RenderProgress>,
    cancel: CancelToken,
    last_render_time: Duration,
}

impl Renderer {
    /// Create a renderer with a `width` x `height` image and a pool of
    /// `props.threads_count` worker threads.
    pub fn new(width: u32, height: u32, props: RendererProps) -> Result<Self, RenderError> {
        if props.threads_count == 0 {
            return Err(RenderError::InvalidThreadCount);
        }

        let image = ImageBuffer::new(width, height)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(props.threads_count)
            .thread_name(|i| format!("prism-render-{}", i))
            .build()?;

        log::debug!(
            "Renderer created: {}x{}, {} threads",
            width,
            height,
            props.threads_count
        );

        Ok(Self {
            props,
            image,
            scene: None,
            pool,
            progress: Arc::new(RenderProgress::default()),
            cancel: CancelToken::default(),
            last_render_time: Duration::ZERO,
        })
    }

    /// Render `scene` into the image, blocking until every row is done.
    ///
    /// The first failing row band aborts the render and its error is
    /// returned; the image then holds a partial result.
    pub fn render(&mut self, scene: Arc<Scene>) -> Result<RenderStats, RenderError> {
        self.scene = Some(Arc::clone(&scene));

        let width = self.image.width();
        let height = self.image.height();

        if self.props.samples_per_pixel == 0 {
            log::warn!("Samples per pixel is 0, skipping render");
            return Ok(RenderStats {
                width,
                height,
                samples_per_pixel: 0,
                threads: self.props.threads_count,
                elapsed: Duration::ZERO,
            });
        }

        log::info!(
            "Rendering {}x{} @ {} spp, depth {}, {} threads",
            width,
            height,
            self.props.samples_per_pixel,
            self.props.max_depth,
            self.props.threads_count
        );

        self.progress.start();
        self.image.clear();

        let started = Instant::now();
        let ctx = FrameContext {
            scene: &scene,
            props: &self.props,
            width,
            height,
            seed: self.props.seed.unwrap_or_else(rand::random),
            started,
            progress: &self.progress,
            cancel: &self.cancel,
        };

        // Hand each band its own slice of the buffer
        let mut bands = Vec::with_capacity(self.props.threads_count);
        let mut rest = self.image.pixels_mut();
        for rows in partition_rows(height, self.props.threads_count) {
            let len = (rows.end - rows.start) as usize * width as usize;
            let (band, tail) = std::mem::take(&mut rest).split_at_mut(len);
            bands.push((rows, band));
            rest = tail;
        }

        let result = self.pool.install(|| {
            bands
                .into_par_iter()
                .try_for_each(|(rows, band)| ctx.render_rows(rows, band))
        });

        let elapsed = started.elapsed();
        self.progress.finish(elapsed);
        self.last_render_time = elapsed;
        self.cancel.reset();

        if let Err(err) = result {
            log::warn!("Render aborted after {:?}: {}", elapsed, err);
            return Err(err);
        }

        log::info!("Rendered in {:?}", elapsed);

        Ok(RenderStats {
            width,
            height,
            samples_per_pixel: self.props.samples_per_pixel,
            threads: self.props.threads_count,
            elapsed,
        })
    }

    /// Change the output resolution.
    ///
    /// Reallocates the buffer unless the size is unchanged; previous pixels
    /// are discarded.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == self.image.width() && height == self.image.height() {
            return Ok(());
        }

        self.image = ImageBuffer::new(width, height)?;
        log::debug!("Resized render target to {}x{}", width, height);
        Ok(())
    }

    /// Turn later renders into no-ops. Does not interrupt a running render;
    /// use a [`CancelToken`] for that.
    pub fn shutdown(&mut self) {
        self.props.samples_per_pixel = 0;
        log::info!("Renderer shut down");
    }

    pub fn set_samples_per_pixel(&mut self, samples: u32) {
        self.props.samples_per_pixel = samples;
    }

    pub fn set_max_depth(&mut self, max_depth: u32) {
        self.props.max_depth = max_depth;
    }

    pub fn props(&self) -> &RendererProps {
        &self.props
    }

    pub fn image(&self) -> &ImageBuffer {
        &self.image
    }

    /// The scene of the most recent render.
    pub fn scene(&self) -> Option<&Arc<Scene>> {
        self.scene.as_ref()
    }

    /// Always `Idle` here since `render` blocks; observers on other
    /// threads read the live state through [`Renderer::progress`].
    pub fn state(&self) -> RenderState {
        self.progress.state()
    }

    /// Wall-clock duration of the last completed or aborted render.
    pub fn last_render_time(&self) -> Duration {
        self.last_render_time
    }

    /// Shared progress counters, readable from other threads while rendering.
    pub fn progress(&self) -> Arc<RenderProgress> {
        Arc::clone(&self.progress)
    }

    /// Token that cancels the render in flight when triggered.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        unpack_rgba, Camera, CameraOrientation, CameraProps, HitRecord, Hittable, Lambertian,
        Material, Ray, ScatterResult, Sphere,
    };
    use prism_math::Vec3;

    fn props(threads_count: usize, samples_per_pixel: u32, max_depth: u32) -> RendererProps {
        RendererProps {
            threads_count,
            samples_per_pixel,
            max_depth,
            seed: Some(1234),
        }
    }

    fn sphere_camera() -> Camera {
        Camera::still(
            CameraOrientation::default(),
            CameraProps {
                vfov: 60.0,
                aspect_ratio: 1.0,
                ..CameraProps::default()
            },
        )
    }

    fn sphere_scene() -> Arc<Scene> {
        let camera = sphere_camera();
        let objects: Vec<Box<dyn Hittable>> = vec![Box::new(Sphere::new(
            Vec3::new(0.0, 0.0, -3.0),
            1.0,
            Arc::new(Lambertian::new(Color::new(0.9, 0.4, 0.4))),
        ))];
        Arc::new(Scene::with_bvh(camera, objects, Color::new(0.5, 0.7, 1.0)).unwrap())
    }

    #[test]
    fn test_partition_rows_covers_height() {
        for height in [1, 2, 7, 100, 101, 1080] {
            for parts in [1, 2, 3, 4, 7, 16, 200] {
                let ranges = partition_rows(height, parts);
                assert_eq!(ranges.len(), parts);

                let mut next = 0;
                for range in &ranges {
                    assert_eq!(range.start, next, "gap or overlap at {:?}", range);
                    next = range.end;
                }
                assert_eq!(next, height);

                let sizes: Vec<u32> = ranges.iter().map(|r| r.end - r.start).collect();
                let max = *sizes.iter().max().unwrap();
                let min = *sizes.iter().min().unwrap();
                assert!(max - min <= 1);
            }
        }
    }

    #[test]
    fn test_row_seed_differs_per_row() {
        assert_ne!(row_seed(0, 0), row_seed(0, 1));
        assert_ne!(row_seed(1, 5), row_seed(2, 5));
    }

    #[test]
    fn test_new_validates_input() {
        assert!(matches!(
            Renderer::new(10, 10, props(0, 1, 1)),
            Err(RenderError::InvalidThreadCount)
        ));
        assert!(matches!(
            Renderer::new(0, 10, props(1, 1, 1)),
            Err(RenderError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_render_fills_every_pixel() {
        let mut renderer = Renderer::new(16, 12, props(3, 2, 2)).unwrap();
        let stats = renderer.render(sphere_scene()).unwrap();

        assert_eq!(stats.width, 16);
        assert_eq!(stats.height, 12);
        assert_eq!(renderer.state(), RenderState::Idle);
        assert_eq!(renderer.progress().rows_completed(), 12);
        assert!(renderer.scene().is_some());
        assert!(renderer
            .image()
            .pixels()
            .iter()
            .all(|&p| unpack_rgba(p)[3] == 0xFF));
    }

    #[test]
    fn test_zero_samples_is_a_no_op() {
        let mut renderer = Renderer::new(8, 8, props(2, 0, 5)).unwrap();
        let stats = renderer.render(sphere_scene()).unwrap();

        assert_eq!(stats.samples_per_pixel, 0);
        assert!(renderer.image().pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_render_pixel_without_samples_is_black() {
        let scene = sphere_scene();
        let mut rng = StdRng::seed_from_u64(3);

        let color = render_pixel(&scene, 4, 4, 8, 8, &props(1, 0, 5), &mut rng);
        assert_eq!(color, Color::ZERO);
    }

    /// Records the renderer state each time a worker shades a surface.
    struct StateRecordingMaterial {
        progress: Arc<RenderProgress>,
        saw_rendering: AtomicBool,
    }

    impl Material for StateRecordingMaterial {
        fn scatter(
            &self,
            _ray_in: &Ray,
            _rec: &HitRecord,
            _rng: &mut dyn RngCore,
        ) -> Option<ScatterResult> {
            if self.progress.state() == RenderState::Rendering {
                self.saw_rendering.store(true, Ordering::Relaxed);
            }
            None
        }
    }

    #[test]
    fn test_state_is_rendering_while_workers_run() {
        let mut renderer = Renderer::new(8, 8, props(2, 1, 1)).unwrap();
        assert_eq!(renderer.progress().state(), RenderState::Idle);

        let material = Arc::new(StateRecordingMaterial {
            progress: renderer.progress(),
            saw_rendering: AtomicBool::new(false),
        });
        let objects: Vec<Box<dyn Hittable>> = vec![Box::new(Sphere::new(
            Vec3::new(0.0, 0.0, -3.0),
            1.0,
            material.clone(),
        ))];
        let scene = Scene::with_bvh(sphere_camera(), objects, Color::ZERO).unwrap();

        renderer.render(Arc::new(scene)).unwrap();
        assert!(material.saw_rendering.load(Ordering::Relaxed));
        assert_eq!(renderer.state(), RenderState::Idle);
        assert_eq!(renderer.progress().state(), RenderState::Idle);
    }

    #[test]
    fn test_shutdown_disables_later_renders() {
        let mut renderer = Renderer::new(8, 8, props(2, 1, 1)).unwrap();
        renderer.render(sphere_scene()).unwrap();
        let before = renderer.image().pixels().to_vec();

        renderer.shutdown();
        assert_eq!(renderer.props().samples_per_pixel, 0);
        renderer.render(sphere_scene()).unwrap();
        assert_eq!(renderer.image().pixels(), &before[..]);
    }

    #[test]
    fn test_cancelled_render_returns_error_and_recovers() {
        let mut renderer = Renderer::new(8, 8, props(2, 1, 1)).unwrap();
        renderer.cancel_token().cancel();

        let result = renderer.render(sphere_scene());
        assert!(matches!(result, Err(RenderError::Cancelled)));
        assert_eq!(renderer.state(), RenderState::Idle);
        assert!(!renderer.cancel_token().is_cancelled());

        assert!(renderer.render(sphere_scene()).is_ok());
    }

    #[test]
    fn test_resize() {
        let mut renderer = Renderer::new(100, 100, props(2, 1, 1)).unwrap();
        renderer.resize(200, 150).unwrap();

        assert_eq!(renderer.image().width(), 200);
        assert_eq!(renderer.image().height(), 150);
        assert_eq!(renderer.image().pixels().len(), 200 * 150);
        assert!(matches!(
            renderer.resize(0, 150),
            Err(RenderError::InvalidDimensions { .. })
        ));
        // Failed resize keeps the previous buffer
        assert_eq!(renderer.image().width(), 200);
    }

    #[test]
    fn test_props_deserialize_with_defaults() {
        let props: RendererProps =
            serde_json::from_str(r#"{"samples_per_pixel": 4, "seed": 9}"#).unwrap();
        assert_eq!(props.samples_per_pixel, 4);
        assert_eq!(props.seed, Some(9));
        assert_eq!(props.max_depth, RendererProps::default().max_depth);
    }
}
