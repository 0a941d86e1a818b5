use super::Viewer;
use crate::camera::{CameraState, ControlInput};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FrameTimings {
    pub map_install_us: u64,
    pub render_us: u64,
    pub total_us: u64,
}

/// Values shown by the on-screen overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub x: f32,
    pub y: f32,
    pub height: f32,
    pub heading_degrees: f32,
    pub map_index: Option<usize>,
}

impl Diagnostics {
    pub fn lines(&self) -> Vec<String> {
        let map = self
            .map_index
            .map(|i| i.to_string())
            .unwrap_or_else(|| "-".to_string());
        vec![
            format!("Camera: x = {:.6}", self.x),
            format!("        y = {:.6}", self.y),
            format!("        h = {:.6}", self.height),
            format!("        a = {}", self.heading_degrees as u32),
            format!("Map index = {map}"),
        ]
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame: usize,
    pub spans_drawn: usize,
    /// Pixels not left at the background color.
    pub covered_pixels: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_load_error: Option<String>,
    pub diagnostics: Diagnostics,
    pub timings: FrameTimings,
}

/// One leg of a scripted flight: hold `input` for `frames` frames.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightSegment {
    pub frames: usize,
    pub input: ControlInput,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlightSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub frames: usize,
    pub sample_every: usize,
    pub final_camera: CameraState,
    pub samples: Vec<FrameReport>,
    #[serde(default)]
    pub failed_map_loads: usize,
}

impl Viewer {
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            x: self.camera.x,
            y: self.camera.y,
            height: self.camera.height,
            heading_degrees: self.camera.heading_degrees(),
            map_index: self.active_index(),
        }
    }

    pub(crate) fn covered_pixels(&self) -> usize {
        let background = self.config.render.background;
        self.frame
            .pixels()
            .iter()
            .filter(|&&p| p != background)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_lines_follow_camera_fields() {
        let diagnostics = Diagnostics {
            x: 512.0,
            y: 100.5,
            height: 70.0,
            heading_degrees: 270.4,
            map_index: Some(3),
        };
        let lines = diagnostics.lines();
        assert_eq!(lines[0], "Camera: x = 512.000000");
        assert_eq!(lines[1], "        y = 100.500000");
        assert_eq!(lines[3], "        a = 270");
        assert_eq!(lines[4], "Map index = 3");
    }

    #[test]
    fn summary_without_schema_version_defaults_to_one() {
        let json = r#"{
            "frames": 0,
            "sample_every": 1,
            "final_camera": {"x": 0.0, "y": 0.0, "height": 1.0, "horizon": 0.0, "zfar": 10.0, "angle": 0.0},
            "samples": []
        }"#;
        let summary: FlightSummary = serde_json::from_str(json).expect("summary should parse");
        assert_eq!(summary.schema_version, 1);
        assert_eq!(summary.failed_map_loads, 0);
    }
}
