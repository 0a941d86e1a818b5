//! Column-wise raycasting over a wrapped heightfield.
//!
//! Each screen column marches a ray front-to-back through the map. A depth step
//! is drawn only when its projected row rises above everything nearer in the
//! same column, so occlusion falls out of the march order with no depth buffer.

use crate::camera::CameraState;
use crate::color::Rgb;
use crate::config::{CameraConfig, RenderConfig};
use crate::frame::FrameBuffer;
use crate::heightfield::HeightfieldMap;
use rayon::prelude::*;
use std::ops::Range;

/// Default vertical exaggeration of projected elevation.
pub const SCALE_FACTOR: f32 = 70.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

/// Flat-colored vertical run in one column, rows `row_start..=row_end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub column: usize,
    pub row_start: usize,
    pub row_end: usize,
    pub color: Rgb,
    /// Depth step (`z`) that produced this span.
    pub depth: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaycastRenderer {
    pub scale_factor: f32,
    /// Stop a column once its silhouette has reached row 0.
    pub early_exit: bool,
}

impl Default for RaycastRenderer {
    fn default() -> Self {
        Self {
            scale_factor: SCALE_FACTOR,
            early_exit: true,
        }
    }
}

/// Left-most and right-most view directions, scaled to `zfar`.
pub fn fov_endpoints(camera: &CameraState) -> ([f32; 2], [f32; 2]) {
    let (s, c) = camera.angle.sin_cos();
    let zfar = camera.zfar;
    let left = [zfar * (c + s), zfar * (s - c)];
    let right = [zfar * (c - s), zfar * (s + c)];
    (left, right)
}

/// World-space advance per unit of depth for `column` of a `width`-wide view.
pub fn column_step(camera: &CameraState, column: usize, width: usize) -> [f32; 2] {
    let ([plx, ply], [prx, pry]) = fov_endpoints(camera);
    let w = width as f32;
    let i = column as f32;
    [
        (plx + (prx - plx) / w * i) / camera.zfar,
        (ply + (pry - ply) / w * i) / camera.zfar,
    ]
}

impl RaycastRenderer {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            scale_factor: config.scale_factor,
            early_exit: config.early_exit,
        }
    }

    /// Screen row of terrain at `elevation`, seen from `z` units away.
    #[inline]
    pub fn project(&self, camera: &CameraState, elevation: u8, z: u32) -> i64 {
        // divide in f32, scale and offset in f64
        let ratio = (camera.height - elevation as f32) / z as f32;
        let lift = ratio as f64 * self.scale_factor as f64;
        (lift + camera.horizon as f64).floor() as i64
    }

    /// Marches one column front-to-back, handing every visible span to `emit`.
    ///
    /// Spans arrive nearest first; each one ends directly above the previous.
    pub fn march_column<F: FnMut(Span)>(
        &self,
        camera: &CameraState,
        map: &HeightfieldMap,
        column: usize,
        viewport: Viewport,
        mut emit: F,
    ) {
        let [dx, dy] = column_step(camera, column, viewport.width);
        let mut rx = camera.x;
        let mut ry = camera.y;
        let mut tallest = viewport.height as i64;

        let zfar = camera.zfar.min(CameraConfig::MAX_ZFAR);
        let mut z: u32 = 1;
        while (z as f32) < zfar {
            rx += dx;
            ry += dy;
            let (elevation, color) = map.sample(rx, ry);
            let row = self.project(camera, elevation, z);

            if row < tallest {
                if tallest > 0 {
                    emit(Span {
                        column,
                        row_start: row.max(0) as usize,
                        row_end: (tallest - 1) as usize,
                        color,
                        depth: z,
                    });
                }
                tallest = row;
                if self.early_exit && tallest <= 0 {
                    break;
                }
            }
            z += 1;
        }
    }

    pub fn column_spans(
        &self,
        camera: &CameraState,
        map: &HeightfieldMap,
        column: usize,
        viewport: Viewport,
    ) -> Vec<Span> {
        let mut spans = Vec::new();
        self.march_column(camera, map, column, viewport, |span| spans.push(span));
        spans
    }

    /// Spans for a subset of columns, computed in parallel. Index `k` of the
    /// result belongs to column `columns.start + k`.
    pub fn render_columns(
        &self,
        camera: &CameraState,
        map: &HeightfieldMap,
        viewport: Viewport,
        columns: Range<usize>,
    ) -> Vec<Vec<Span>> {
        let end = columns.end.min(viewport.width);
        (columns.start..end)
            .into_par_iter()
            .map(|column| self.column_spans(camera, map, column, viewport))
            .collect()
    }

    /// Spans for every column of the viewport, in parallel.
    pub fn render_spans(
        &self,
        camera: &CameraState,
        map: &HeightfieldMap,
        viewport: Viewport,
    ) -> Vec<Vec<Span>> {
        self.render_columns(camera, map, viewport, 0..viewport.width)
    }

    /// Single-threaded equivalent of [`render_spans`](Self::render_spans).
    pub fn render_spans_serial(
        &self,
        camera: &CameraState,
        map: &HeightfieldMap,
        viewport: Viewport,
    ) -> Vec<Vec<Span>> {
        (0..viewport.width)
            .map(|column| self.column_spans(camera, map, column, viewport))
            .collect()
    }

    /// Clears `frame` to `background` and draws a full view into it.
    /// Returns the number of spans drawn.
    pub fn render_into(
        &self,
        camera: &CameraState,
        map: &HeightfieldMap,
        frame: &mut FrameBuffer,
        background: Rgb,
    ) -> usize {
        let viewport = Viewport::new(frame.width(), frame.height());
        let columns = self.render_spans(camera, map, viewport);
        frame.clear(background);
        let mut drawn = 0;
        for span in columns.iter().flatten() {
            frame.draw_span(span);
            drawn += 1;
        }
        drawn
    }

    pub fn render_frame(
        &self,
        camera: &CameraState,
        map: &HeightfieldMap,
        viewport: Viewport,
        background: Rgb,
    ) -> FrameBuffer {
        let mut frame = FrameBuffer::new(viewport.width, viewport.height, background);
        self.render_into(camera, map, &mut frame, background);
        frame
    }
}
