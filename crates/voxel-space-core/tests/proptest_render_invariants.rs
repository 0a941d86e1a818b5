//! Property-based invariant tests for the raycast renderer.
//!
//! 1. Sampling is invariant under whole-tile shifts on either axis
//! 2. Rendering is deterministic
//! 3. Columns are independent of each other
//! 4. Spans in a column shrink monotonically toward the top
//! 5. Integer horizon shifts move the image by exactly that many rows
//! 6. A rejected load leaves the active map untouched

use proptest::prelude::*;
use voxel_space_core::camera::CameraState;
use voxel_space_core::color::Rgb;
use voxel_space_core::config::{CameraConfig, MapConfig, RenderConfig, ViewerConfig};
use voxel_space_core::heightfield::{ColorSource, ElevationSource, Grid, HeightfieldMap, LoadError};
use voxel_space_core::render::{RaycastRenderer, Viewport};
use voxel_space_core::viewer::{MapLoader, Viewer};

const SIDE: usize = 32;

// ── Strategies ──────────────────────────────────────────────────────────

fn map_strategy() -> impl Strategy<Value = HeightfieldMap> {
    prop::collection::vec(any::<u8>(), SIDE * SIDE).prop_map(|heights| {
        let colors = heights
            .iter()
            .enumerate()
            .map(|(i, &h)| Rgb::new(h, (i % 256) as u8, (i / SIDE) as u8))
            .collect();
        HeightfieldMap::load(&Grid::new(SIDE, SIDE, heights), &Grid::new(SIDE, SIDE, colors))
            .expect("square power-of-two sources")
    })
}

fn camera_strategy() -> impl Strategy<Value = CameraState> {
    (
        -500.0f32..500.0,
        -500.0f32..500.0,
        0.0f32..400.0,
        -60i32..60,
        1.0f32..160.0,
        -10.0f32..10.0,
    )
        .prop_map(|(x, y, height, horizon, zfar, angle)| {
            CameraState::new(x, y, height, horizon as f32, zfar, angle)
        })
}

fn viewport_strategy() -> impl Strategy<Value = Viewport> {
    (1usize..24, 1usize..20).prop_map(|(w, h)| Viewport::new(w, h))
}

fn renderer_strategy() -> impl Strategy<Value = RaycastRenderer> {
    (1.0f32..120.0, any::<bool>()).prop_map(|(scale_factor, early_exit)| RaycastRenderer {
        scale_factor,
        early_exit,
    })
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sampling_wraps_by_whole_tiles(
        map in map_strategy(),
        x in -100_000i64..100_000,
        y in -100_000i64..100_000,
        k in -4i64..4,
    ) {
        let n = SIDE as i64;
        let base = map.sample_cell(x, y);
        prop_assert_eq!(base, map.sample_cell(x + n, y));
        prop_assert_eq!(base, map.sample_cell(x, y + n));
        prop_assert_eq!(base, map.sample_cell(x - n, y));
        prop_assert_eq!(base, map.sample_cell(x + k * n, y - k * n));
    }

    #[test]
    fn rendering_is_deterministic(
        map in map_strategy(),
        camera in camera_strategy(),
        viewport in viewport_strategy(),
        renderer in renderer_strategy(),
    ) {
        let a = renderer.render_frame(&camera, &map, viewport, Rgb::BLACK);
        let b = renderer.render_frame(&camera, &map, viewport, Rgb::BLACK);
        prop_assert_eq!(a.to_rgb_bytes(), b.to_rgb_bytes());
    }

    #[test]
    fn columns_do_not_depend_on_each_other(
        map in map_strategy(),
        camera in camera_strategy(),
        viewport in viewport_strategy(),
        start in 0usize..24,
        len in 0usize..24,
    ) {
        let renderer = RaycastRenderer::default();
        let full = renderer.render_spans(&camera, &map, viewport);
        let start = start.min(viewport.width);
        let end = (start + len).min(viewport.width);
        let subset = renderer.render_columns(&camera, &map, viewport, start..end);
        prop_assert_eq!(subset.as_slice(), &full[start..end]);
        for column in start..end {
            let alone = renderer.column_spans(&camera, &map, column, viewport);
            prop_assert_eq!(&alone, &full[column]);
        }
    }

    #[test]
    fn occlusion_only_ever_rises(
        map in map_strategy(),
        camera in camera_strategy(),
        viewport in viewport_strategy(),
        renderer in renderer_strategy(),
    ) {
        for spans in renderer.render_spans(&camera, &map, viewport) {
            for pair in spans.windows(2) {
                prop_assert!(pair[1].row_end < pair[0].row_start);
                prop_assert!(pair[1].depth > pair[0].depth);
            }
            for span in &spans {
                prop_assert!(span.depth >= 1);
                prop_assert!(span.row_start <= span.row_end);
                prop_assert!(span.row_end < viewport.height);
            }
        }
    }

    #[test]
    fn horizon_shift_translates_rows(
        map in map_strategy(),
        camera in camera_strategy(),
        viewport in viewport_strategy(),
        k in -12i32..12,
    ) {
        let renderer = RaycastRenderer::default();
        let shifted_camera = CameraState { horizon: camera.horizon + k as f32, ..camera };
        let base = renderer.render_frame(&camera, &map, viewport, Rgb::BLACK);
        let shifted = renderer.render_frame(&shifted_camera, &map, viewport, Rgb::BLACK);
        let h = viewport.height as i64;
        for x in 0..viewport.width {
            for row in 0..h {
                let source = row - k as i64;
                if (0..h).contains(&source) {
                    prop_assert_eq!(
                        shifted.pixel(x, row as usize),
                        base.pixel(x, source as usize),
                        "column {} row {}", x, row
                    );
                }
            }
        }
    }

    #[test]
    fn rejected_load_keeps_active_map(
        good_side_log2 in 2u32..6,
        bad_side in 1usize..40,
        probes in prop::collection::vec((-1000.0f32..1000.0, -1000.0f32..1000.0), 1..16),
    ) {
        let good_side = 1usize << good_side_log2;
        prop_assume!(bad_side != good_side);
        let loader = SizedMaps { sides: [good_side, bad_side] };
        let mut viewer = Viewer::new(small_config());
        viewer.request_map(0, &loader).expect("map 0 is valid");
        viewer.render().expect("map 0 active");
        let before: Vec<_> = probes
            .iter()
            .map(|&(x, y)| viewer.active_map().map(|m| m.sample(x, y)))
            .collect();

        prop_assert!(viewer.request_map(1, &loader).is_err());
        viewer.render().expect("map 0 still active");

        let after: Vec<_> = probes
            .iter()
            .map(|&(x, y)| viewer.active_map().map(|m| m.sample(x, y)))
            .collect();
        prop_assert_eq!(before, after);
        prop_assert_eq!(viewer.active_index(), Some(0));
    }
}

/// Map 0 is valid at `sides[0]`; map 1 has a `sides[1]`-wide color source
/// paired with a `sides[0]`-wide elevation source.
struct SizedMaps {
    sides: [usize; 2],
}

impl MapLoader for SizedMaps {
    fn load_sources(&self, index: usize) -> Result<(ElevationSource, ColorSource), LoadError> {
        let side = self.sides[0];
        let color_side = self.sides[index.min(1)];
        let elevation = Grid::new(side, side, (0..side * side).map(|i| (i % 200) as u8).collect());
        let color = Grid::filled(color_side, color_side, Rgb::new(10, 20, 30 + index as u8));
        Ok((elevation, color))
    }
}

fn small_config() -> ViewerConfig {
    ViewerConfig {
        render: RenderConfig {
            width: 16,
            height: 12,
            ..RenderConfig::default()
        },
        map: MapConfig {
            maps_available: 2,
            ..MapConfig::default()
        },
        camera: CameraConfig {
            zfar: 50.0,
            ..CameraConfig::default()
        },
        ..ViewerConfig::default()
    }
}
