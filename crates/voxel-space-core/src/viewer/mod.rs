//! Per-frame driver: applies input to the camera, pages maps and renders.

pub mod report;

pub use report::*;

use crate::camera::{CameraState, ControlInput};
use crate::config::{ConfigError, ViewerConfig};
use crate::frame::FrameBuffer;
use crate::heightfield::{ColorSource, ElevationSource, HeightfieldMap, LoadError};
use crate::procgen::{self, TerrainParams};
use crate::render::RaycastRenderer;
use std::time::Instant;
use std::{error::Error, fmt};
use tracing::{debug, info, warn};

/// Produces the elevation and color sources for a map index.
pub trait MapLoader {
    fn load_sources(&self, index: usize) -> Result<(ElevationSource, ColorSource), LoadError>;
}

/// Procedurally generated maps; index `n` uses seed `base.seed + n`.
#[derive(Clone, Debug, Default)]
pub struct SyntheticMaps {
    pub base: TerrainParams,
}

impl MapLoader for SyntheticMaps {
    fn load_sources(&self, index: usize) -> Result<(ElevationSource, ColorSource), LoadError> {
        let params = TerrainParams {
            seed: self.base.seed.wrapping_add(index as u64),
            ..self.base
        };
        Ok(procgen::generate(&params)?)
    }
}

#[derive(Clone, Debug)]
struct LoadedMap {
    index: usize,
    map: HeightfieldMap,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    NoActiveMap,
    InvalidSampleEvery,
    TooManyFrames { max: usize, actual: usize },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NoActiveMap => write!(f, "no map is loaded; cannot render a frame"),
            RenderError::InvalidSampleEvery => write!(f, "sample_every must be positive"),
            RenderError::TooManyFrames { max, actual } => {
                write!(f, "frames ({actual}) exceed supported maximum ({max})")
            }
        }
    }
}

impl Error for RenderError {}

pub struct Viewer {
    pub camera: CameraState,
    pub(crate) config: ViewerConfig,
    renderer: RaycastRenderer,
    active: Option<LoadedMap>,
    /// Built but not yet visible; swapped in before the next render.
    pending: Option<LoadedMap>,
    pub(crate) frame: FrameBuffer,
    frame_index: usize,
}

impl Viewer {
    pub const MAX_FLIGHT_FRAMES: usize = 1_000_000;

    pub fn new(config: ViewerConfig) -> Self {
        Self::try_new(config).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_new(config: ViewerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let camera = CameraState::from_config(&config.camera)?;
        let renderer = RaycastRenderer::from_config(&config.render);
        let frame = FrameBuffer::new(
            config.render.width,
            config.render.height,
            config.render.background,
        );
        Ok(Self {
            camera,
            config,
            renderer,
            active: None,
            pending: None,
            frame,
            frame_index: 0,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn active_map(&self) -> Option<&HeightfieldMap> {
        self.active.as_ref().map(|m| &m.map)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active.as_ref().map(|m| m.index)
    }

    /// Index the next paging step starts from: the staged map if any, else the active one.
    fn selected_index(&self) -> usize {
        self.pending
            .as_ref()
            .or(self.active.as_ref())
            .map(|m| m.index)
            .unwrap_or(0)
    }

    /// Loads map `index` and stages it for the next frame. On failure the
    /// currently active (and any staged) map is kept.
    pub fn request_map(&mut self, index: usize, loader: &dyn MapLoader) -> Result<(), LoadError> {
        let available = self.config.map.maps_available;
        let result = if index >= available {
            Err(LoadError::IndexOutOfRange { index, available })
        } else {
            loader.load_sources(index).and_then(|(elevation, color)| {
                HeightfieldMap::load_with_exaggeration(
                    &elevation,
                    &color,
                    self.config.map.exaggeration,
                )
            })
        };
        match result {
            Ok(map) => {
                debug!(index, side = map.side(), "map staged");
                self.pending = Some(LoadedMap { index, map });
                Ok(())
            }
            Err(err) => {
                warn!(index, error = %err, "map load rejected; keeping current map");
                Err(err)
            }
        }
    }

    pub fn next_map(&mut self, loader: &dyn MapLoader) -> Result<(), LoadError> {
        let available = self.config.map.maps_available;
        let index = (self.selected_index() + 1) % available;
        self.request_map(index, loader)
    }

    pub fn previous_map(&mut self, loader: &dyn MapLoader) -> Result<(), LoadError> {
        let available = self.config.map.maps_available;
        let index = (self.selected_index() + available - 1) % available;
        self.request_map(index, loader)
    }

    fn install_pending(&mut self) {
        if let Some(next) = self.pending.take() {
            info!(index = next.index, side = next.map.side(), "map activated");
            self.active = Some(next);
        }
    }

    /// Renders the current camera view into the owned framebuffer.
    pub fn render(&mut self) -> Result<usize, RenderError> {
        self.install_pending();
        let map = &self.active.as_ref().ok_or(RenderError::NoActiveMap)?.map;
        Ok(self.renderer.render_into(
            &self.camera,
            map,
            &mut self.frame,
            self.config.render.background,
        ))
    }

    /// One frame: page maps, move the camera, render.
    ///
    /// Failed map loads are logged and skipped; only a missing map stops the frame.
    pub fn tick(
        &mut self,
        input: &ControlInput,
        elapsed: f32,
        loader: &dyn MapLoader,
    ) -> Result<FrameReport, RenderError> {
        let total_start = Instant::now();

        let t0 = Instant::now();
        let mut map_load_error = None;
        if input.next_map {
            map_load_error = self.next_map(loader).err();
        }
        if input.previous_map {
            map_load_error = self.previous_map(loader).err().or(map_load_error);
        }
        self.install_pending();
        let map_install_us = t0.elapsed().as_micros() as u64;

        self.camera
            .apply_controls(input, &self.config.controls, elapsed);

        let t1 = Instant::now();
        let spans_drawn = self.render()?;
        let render_us = t1.elapsed().as_micros() as u64;

        self.frame_index += 1;
        debug!(frame = self.frame_index, spans_drawn, render_us, "frame rendered");
        Ok(FrameReport {
            frame: self.frame_index,
            spans_drawn,
            covered_pixels: self.covered_pixels(),
            map_load_error: map_load_error.map(|e| e.to_string()),
            diagnostics: self.diagnostics(),
            timings: FrameTimings {
                map_install_us,
                render_us,
                total_us: total_start.elapsed().as_micros() as u64,
            },
        })
    }

    /// Plays `script` at a fixed `dt`, keeping a report every `sample_every`
    /// frames and for the final frame.
    pub fn run_flight(
        &mut self,
        script: &[FlightSegment],
        dt: f32,
        sample_every: usize,
        loader: &dyn MapLoader,
    ) -> Result<FlightSummary, RenderError> {
        if sample_every == 0 {
            return Err(RenderError::InvalidSampleEvery);
        }
        let frames = script
            .iter()
            .try_fold(0usize, |acc, s| acc.checked_add(s.frames))
            .filter(|&frames| frames <= Self::MAX_FLIGHT_FRAMES)
            .ok_or_else(|| RenderError::TooManyFrames {
                max: Self::MAX_FLIGHT_FRAMES,
                actual: script.iter().fold(0usize, |acc, s| acc.saturating_add(s.frames)),
            })?;

        let mut samples = Vec::new();
        let mut failed_map_loads = 0;
        let mut played = 0;
        for segment in script {
            for _ in 0..segment.frames {
                let report = self.tick(&segment.input, dt, loader)?;
                played += 1;
                if report.map_load_error.is_some() {
                    failed_map_loads += 1;
                }
                if played % sample_every == 0 || played == frames {
                    samples.push(report);
                }
            }
        }
        Ok(FlightSummary {
            schema_version: 1,
            frames,
            sample_every,
            final_camera: self.camera,
            samples,
            failed_map_loads,
        })
    }
}
