use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyBytes;
use voxel_space_core::camera::{self, CameraState};
use voxel_space_core::config::ViewerConfig;
use voxel_space_core::heightfield::HeightfieldMap;
use voxel_space_core::procgen::{self, TerrainParams};
use voxel_space_core::render::{RaycastRenderer, Viewport};

/// Minimal PyO3 module exposing voxel-space-core to Python.
#[pyfunction]
fn version() -> &'static str {
    "0.1.0"
}

#[pyfunction]
fn heading_degrees(angle: f32) -> f32 {
    camera::heading_degrees(angle)
}

/// Default viewer configuration as a JSON string.
#[pyfunction]
fn default_config_json() -> PyResult<String> {
    serde_json::to_string(&ViewerConfig::default())
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Renders one frame of a seeded synthetic map; returns packed RGB bytes,
/// row-major, `width * height * 3` long.
#[pyfunction]
#[pyo3(signature = (seed, side, x, y, height, horizon, zfar, angle, width, view_height))]
#[allow(clippy::too_many_arguments)]
fn render_synthetic<'py>(
    py: Python<'py>,
    seed: u64,
    side: usize,
    x: f32,
    y: f32,
    height: f32,
    horizon: f32,
    zfar: f32,
    angle: f32,
    width: usize,
    view_height: usize,
) -> PyResult<Bound<'py, PyBytes>> {
    let to_py = |e: &dyn std::fmt::Display| PyValueError::new_err(e.to_string());
    let camera = CameraState::try_new(x, y, height, horizon, zfar, angle).map_err(|e| to_py(&e))?;
    let params = TerrainParams {
        side,
        seed,
        base_period: side.min(TerrainParams::default().base_period),
        ..TerrainParams::default()
    };
    let (elevation, color) = procgen::generate(&params).map_err(|e| to_py(&e))?;
    let map = HeightfieldMap::load(&elevation, &color).map_err(|e| to_py(&e))?;
    let mut render = ViewerConfig::default().render;
    render.width = width;
    render.height = view_height;
    render.validate().map_err(|e| to_py(&e))?;
    let frame = py.detach(|| {
        RaycastRenderer::from_config(&render).render_frame(
            &camera,
            &map,
            Viewport::new(render.width, render.height),
            render.background,
        )
    });
    Ok(PyBytes::new(py, &frame.to_rgb_bytes()))
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_function(wrap_pyfunction!(heading_degrees, m)?)?;
    m.add_function(wrap_pyfunction!(default_config_json, m)?)?;
    m.add_function(wrap_pyfunction!(render_synthetic, m)?)?;
    Ok(())
}
