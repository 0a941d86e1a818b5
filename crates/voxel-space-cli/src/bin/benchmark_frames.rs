use rayon::ThreadPoolBuilder;
use std::time::Instant;
use voxel_space_core::camera::{CameraState, ControlInput};
use voxel_space_core::config::ControlConfig;
use voxel_space_core::heightfield::HeightfieldMap;
use voxel_space_core::procgen::{self, TerrainParams};
use voxel_space_core::render::{RaycastRenderer, Viewport};

fn create_map(seed: u64) -> HeightfieldMap {
    let params = TerrainParams {
        seed,
        ..TerrainParams::default()
    };
    let (elevation, color) = procgen::generate(&params).expect("default terrain params are valid");
    HeightfieldMap::load(&elevation, &color).expect("generated sources are valid")
}

/// Camera path for `frames` frames of a slow forward turn.
fn create_cameras(frames: usize) -> Vec<CameraState> {
    let controls = ControlConfig::default();
    let input = ControlInput {
        forward: true,
        rotate_right: true,
        ..ControlInput::default()
    };
    let mut camera = CameraState::default();
    (0..frames)
        .map(|_| {
            camera.apply_controls(&input, &controls, 1.0 / 30.0);
            camera
        })
        .collect()
}

fn count_spans(
    renderer: &RaycastRenderer,
    camera: &CameraState,
    map: &HeightfieldMap,
    viewport: Viewport,
) -> usize {
    renderer
        .render_spans(camera, map, viewport)
        .iter()
        .map(Vec::len)
        .sum()
}

fn main() {
    let viewport = Viewport::new(700, 400);
    let frames = 60;
    let threads = rayon::current_num_threads();
    println!(
        "Benchmarking {} frames at {}x{} on a 1024x1024 map ({} rayon threads)",
        frames, viewport.width, viewport.height, threads
    );

    let map = create_map(42);
    let cameras = create_cameras(frames);
    let single = ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .expect("single-thread pool");

    for early_exit in [false, true] {
        let renderer = RaycastRenderer {
            early_exit,
            ..RaycastRenderer::default()
        };

        // Serial: the whole frame on one pool thread
        let start = Instant::now();
        let mut spans_serial = 0usize;
        single.install(|| {
            for camera in &cameras {
                spans_serial += count_spans(&renderer, camera, &map, viewport);
            }
        });
        let duration_serial = start.elapsed();

        // Parallel: columns spread over the global pool
        let start = Instant::now();
        let mut spans_parallel = 0usize;
        for camera in &cameras {
            spans_parallel += count_spans(&renderer, camera, &map, viewport);
        }
        let duration_parallel = start.elapsed();
        assert_eq!(spans_serial, spans_parallel, "pool size must not change output");

        println!("early_exit = {} ({} spans per run)", early_exit, spans_serial);
        println!("  Avg frame time (1 thread):  {:?}", duration_serial / frames as u32);
        println!("  Avg frame time ({} threads): {:?}", threads, duration_parallel / frames as u32);
        let speedup = duration_serial.as_secs_f64() / duration_parallel.as_secs_f64().max(1e-9);
        println!("  Speedup: {:.2}x", speedup);
    }
}
