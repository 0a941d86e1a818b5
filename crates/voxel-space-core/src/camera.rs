use crate::config::{validate_zfar, CameraConfig, ConfigError, ControlConfig};
use serde::{Deserialize, Serialize};

/// Viewer position, heading and projection parameters.
///
/// Position is kept unwrapped; the heightfield wraps it at sample time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CameraConfig")]
pub struct CameraState {
    pub x: f32,
    pub y: f32,
    pub height: f32,
    /// Screen-space row offset of the horizon (look up/down).
    pub horizon: f32,
    /// Maximum ray travel in world units. Always positive.
    pub zfar: f32,
    /// Heading in radians, clockwise positive, never normalized.
    pub angle: f32,
}

impl CameraState {
    pub fn new(x: f32, y: f32, height: f32, horizon: f32, zfar: f32, angle: f32) -> Self {
        Self::try_new(x, y, height, horizon, zfar, angle).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_new(
        x: f32,
        y: f32,
        height: f32,
        horizon: f32,
        zfar: f32,
        angle: f32,
    ) -> Result<Self, ConfigError> {
        validate_zfar(zfar)?;
        Ok(Self {
            x,
            y,
            height,
            horizon,
            zfar,
            angle,
        })
    }

    pub fn from_config(config: &CameraConfig) -> Result<Self, ConfigError> {
        Self::try_new(
            config.x,
            config.y,
            config.height,
            config.horizon,
            config.zfar,
            config.angle,
        )
    }

    /// Resets every field in place.
    pub fn init(
        &mut self,
        x: f32,
        y: f32,
        height: f32,
        horizon: f32,
        zfar: f32,
        angle: f32,
    ) -> Result<(), ConfigError> {
        *self = Self::try_new(x, y, height, horizon, zfar, angle)?;
        Ok(())
    }

    /// Unit vector along the heading: `(cos, sin)`.
    pub fn forward(&self) -> [f32; 2] {
        let (s, c) = self.angle.sin_cos();
        [c, s]
    }

    pub fn move_forward(&mut self, distance: f32) {
        let [c, s] = self.forward();
        self.x += c * distance;
        self.y += s * distance;
    }

    /// Strafe is forward rotated by -90 degrees.
    pub fn strafe_right(&mut self, distance: f32) {
        let [c, s] = self.forward();
        self.x -= s * distance;
        self.y += c * distance;
    }

    pub fn rotate(&mut self, radians: f32) {
        self.angle += radians;
    }

    pub fn raise(&mut self, amount: f32) {
        self.height += amount;
    }

    pub fn tilt_horizon(&mut self, amount: f32) {
        self.horizon += amount;
    }

    /// Heading for display, in [0, 360).
    pub fn heading_degrees(&self) -> f32 {
        heading_degrees(self.angle)
    }

    /// Applies one frame of held controls, scaled by `elapsed` seconds.
    pub fn apply_controls(&mut self, input: &ControlInput, controls: &ControlConfig, elapsed: f32) {
        let mut accel = elapsed;
        if input.boost {
            accel *= controls.boost_multiplier;
        }
        if input.slow {
            accel *= controls.slow_multiplier;
        }
        let step = accel * controls.move_speed;
        let turn = accel * controls.rotate_speed;

        self.rotate(axis(input.rotate_right, input.rotate_left) * turn);
        self.raise(axis(input.elevate_up, input.elevate_down) * step);
        self.tilt_horizon(axis(input.horizon_up, input.horizon_down) * step);
        // translation uses the heading after this frame's rotation
        self.move_forward(axis(input.forward, input.backward) * step);
        self.strafe_right(axis(input.strafe_right, input.strafe_left) * step);
    }
}

impl TryFrom<CameraConfig> for CameraState {
    type Error = ConfigError;

    fn try_from(config: CameraConfig) -> Result<Self, Self::Error> {
        Self::from_config(&config)
    }
}

impl Default for CameraState {
    fn default() -> Self {
        let config = CameraConfig::default();
        Self {
            x: config.x,
            y: config.y,
            height: config.height,
            horizon: config.horizon,
            zfar: config.zfar,
            angle: config.angle,
        }
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    (positive as i8 - negative as i8) as f32
}

/// `((angle * 180/pi) mod 360 + 360) mod 360`
pub fn heading_degrees(angle: f32) -> f32 {
    let degrees = angle.to_degrees();
    (degrees % 360.0 + 360.0) % 360.0
}

/// Named camera effects for one frame, as reported by the input collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlInput {
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub forward: bool,
    pub backward: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
    pub elevate_up: bool,
    pub elevate_down: bool,
    pub horizon_up: bool,
    pub horizon_down: bool,
    pub boost: bool,
    pub slow: bool,
    /// Edge-triggered map paging.
    pub next_map: bool,
    pub previous_map: bool,
}
