//! Render settings loaded from JSON.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use prism_renderer::RendererProps;
use serde::{Deserialize, Serialize};

/// Everything a render run needs besides the scene name and output path.
///
/// Missing fields fall back to their defaults, so `{}` is a valid file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    /// Seed for scene generation (random sphere layouts, noise tables)
    pub scene_seed: u64,
    /// Optional equirectangular image for the perlin_noise globe
    pub earth_texture: Option<PathBuf>,
    pub renderer: RendererProps,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            scene_seed: 0,
            earth_texture: None,
            renderer: RendererProps::default(),
        }
    }
}

impl RenderSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        let settings = serde_json::from_str(&text)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        Ok(settings)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}
