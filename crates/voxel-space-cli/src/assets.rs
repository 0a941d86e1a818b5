//! PNG-backed map datasets and frame export.
//!
//! Maps live under `<root>/<color_dir>/mapNN.png` and `<root>/<height_dir>/mapNN.png`.
//! Height images store the elevation byte in every channel; the red one is used.

use anyhow::Context;
use image::{DynamicImage, RgbImage};
use std::path::{Path, PathBuf};
use voxel_space_core::color::Rgb;
use voxel_space_core::config::MapConfig;
use voxel_space_core::frame::FrameBuffer;
use voxel_space_core::heightfield::{ColorSource, ElevationSource, Grid, LoadError, SourceKind};
use voxel_space_core::viewer::MapLoader;

#[derive(Clone, Debug)]
pub struct AssetMaps {
    pub root: PathBuf,
    pub color_dir: String,
    pub height_dir: String,
}

impl AssetMaps {
    pub fn from_config(root: impl Into<PathBuf>, config: &MapConfig) -> Self {
        Self {
            root: root.into(),
            color_dir: config.color_dir.clone(),
            height_dir: config.height_dir.clone(),
        }
    }

    pub fn file_name(index: usize) -> String {
        format!("map{index:02}.png")
    }

    /// `(color, height)` image paths for map `index`.
    pub fn paths(&self, index: usize) -> (PathBuf, PathBuf) {
        let name = Self::file_name(index);
        (
            self.root.join(&self.color_dir).join(&name),
            self.root.join(&self.height_dir).join(&name),
        )
    }
}

fn open_image(path: &Path, kind: SourceKind) -> Result<DynamicImage, LoadError> {
    image::open(path).map_err(|e| LoadError::Unavailable {
        kind,
        reason: format!("{}: {e}", path.display()),
    })
}

pub fn elevation_from_image(image: &DynamicImage) -> ElevationSource {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let data = rgb.pixels().map(|p| p.0[0]).collect();
    Grid::new(width as usize, height as usize, data)
}

pub fn colors_from_image(image: &DynamicImage) -> ColorSource {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let data = rgb.pixels().map(|p| Rgb::from(p.0)).collect();
    Grid::new(width as usize, height as usize, data)
}

impl MapLoader for AssetMaps {
    fn load_sources(&self, index: usize) -> Result<(ElevationSource, ColorSource), LoadError> {
        let (color_path, height_path) = self.paths(index);
        let color = open_image(&color_path, SourceKind::Color)?;
        let height = open_image(&height_path, SourceKind::Elevation)?;
        Ok((elevation_from_image(&height), colors_from_image(&color)))
    }
}

pub fn frame_to_image(frame: &FrameBuffer) -> anyhow::Result<RgbImage> {
    RgbImage::from_raw(
        frame.width() as u32,
        frame.height() as u32,
        frame.to_rgb_bytes(),
    )
    .context("framebuffer size does not match its pixel count")
}

pub fn save_png(frame: &FrameBuffer, path: &Path) -> anyhow::Result<()> {
    frame_to_image(frame)?
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}
