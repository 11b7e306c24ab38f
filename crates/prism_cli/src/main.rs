// Render a built-in scene to a PNG file.
// Run with: cargo run --release --bin prism -- <scene> <output.png> [settings.json]

mod scenes;
mod settings;

use std::env;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use prism_renderer::Renderer;
use rand::rngs::StdRng;
use rand::SeedableRng;

use settings::RenderSettings;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <scene> <output.png> [settings.json]", args[0]);
        eprintln!("Scenes: {}", scenes::SCENE_NAMES.join(", "));
        std::process::exit(1);
    }

    let scene_name = &args[1];
    let output = Path::new(&args[2]);
    let settings = match args.get(3) {
        Some(path) => RenderSettings::load(Path::new(path))?,
        None => RenderSettings::default(),
    };

    log::info!("Starting Prism: scene '{}'", scene_name);

    let mut rng = StdRng::seed_from_u64(settings.scene_seed);
    let scene = scenes::build(
        scene_name,
        settings.aspect_ratio(),
        settings.earth_texture.as_deref(),
        &mut rng,
    )?;

    let mut renderer = Renderer::new(settings.width, settings.height, settings.renderer.clone())
        .context("Failed to create renderer")?;
    let stats = renderer
        .render(Arc::new(scene))
        .context("Render failed")?;

    renderer
        .image()
        .save_png(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    log::info!(
        "Wrote {}x{} image to {} in {:.2}s",
        stats.width,
        stats.height,
        output.display(),
        stats.elapsed.as_secs_f64()
    );

    Ok(())
}
