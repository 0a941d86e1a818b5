use crate::color::Rgb;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    /// Vertical exaggeration applied to projected elevation differences.
    pub scale_factor: f32,
    pub background: Rgb,
    /// Stop a column's depth march once nothing further can be drawn.
    pub early_exit: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 700,
            height: 400,
            scale_factor: 70.0,
            background: Rgb::BLACK,
            early_exit: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub side: usize,
    pub exaggeration: f32,
    pub maps_available: usize,
    pub asset_root: String,
    pub color_dir: String,
    pub height_dir: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            side: 1024,
            exaggeration: 1.5,
            maps_available: 30,
            asset_root: "maps".to_string(),
            color_dir: "color_data".to_string(),
            height_dir: "height_data".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub x: f32,
    pub y: f32,
    pub height: f32,
    pub horizon: f32,
    pub zfar: f32,
    pub angle: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            x: 512.0,
            y: 512.0,
            height: 70.0,
            horizon: 60.0,
            zfar: 600.0,
            // facing "north" (270 degrees, clockwise)
            angle: 1.5 * std::f32::consts::PI,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// World units per second for translation, elevation and horizon changes.
    pub move_speed: f32,
    /// Radians per second.
    pub rotate_speed: f32,
    pub boost_multiplier: f32,
    pub slow_multiplier: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            move_speed: 20.0,
            rotate_speed: 1.0,
            boost_multiplier: 5.0,
            slow_multiplier: 0.2,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub render: RenderConfig,
    pub map: MapConfig,
    pub camera: CameraConfig,
    pub controls: ControlConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NotPowerOfTwo { side: usize },
    MapTooLarge { max: usize, actual: usize },
    InvalidZFar(f32),
    ZFarTooLarge { max: f32, actual: f32 },
    EmptyViewport { width: usize, height: usize },
    ViewportTooLarge { max: usize, actual: usize },
    InvalidScaleFactor(f32),
    InvalidExaggeration(f32),
    NoMapsAvailable,
    InvalidSpeed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotPowerOfTwo { side } => {
                write!(f, "map side ({side}) must be a positive power of two")
            }
            ConfigError::MapTooLarge { max, actual } => {
                write!(f, "map side ({actual}) exceeds supported maximum ({max})")
            }
            ConfigError::InvalidZFar(zfar) => {
                write!(f, "zfar ({zfar}) must be finite and positive")
            }
            ConfigError::ZFarTooLarge { max, actual } => {
                write!(f, "zfar ({actual}) exceeds supported maximum ({max})")
            }
            ConfigError::EmptyViewport { width, height } => {
                write!(f, "viewport ({width}x{height}) must have a nonzero area")
            }
            ConfigError::ViewportTooLarge { max, actual } => {
                write!(f, "viewport dimension ({actual}) exceeds supported maximum ({max})")
            }
            ConfigError::InvalidScaleFactor(v) => {
                write!(f, "scale_factor ({v}) must be finite and positive")
            }
            ConfigError::InvalidExaggeration(v) => {
                write!(f, "exaggeration ({v}) must be finite and non-negative")
            }
            ConfigError::NoMapsAvailable => write!(f, "maps_available must be positive"),
            ConfigError::InvalidSpeed(name) => {
                write!(f, "{name} must be finite and non-negative")
            }
        }
    }
}

impl Error for ConfigError {}

/// Checks that `side` can be wrapped with a bitmask.
pub fn validate_side(side: usize) -> Result<(), ConfigError> {
    if !side.is_power_of_two() {
        return Err(ConfigError::NotPowerOfTwo { side });
    }
    if side > MapConfig::MAX_SIDE {
        return Err(ConfigError::MapTooLarge {
            max: MapConfig::MAX_SIDE,
            actual: side,
        });
    }
    Ok(())
}

pub fn validate_zfar(zfar: f32) -> Result<(), ConfigError> {
    if !(zfar.is_finite() && zfar > 0.0) {
        return Err(ConfigError::InvalidZFar(zfar));
    }
    if zfar > CameraConfig::MAX_ZFAR {
        return Err(ConfigError::ZFarTooLarge {
            max: CameraConfig::MAX_ZFAR,
            actual: zfar,
        });
    }
    Ok(())
}

impl CameraConfig {
    /// Depth steps are counted in `u32` and compared as `f32`; both stay
    /// exact well past this bound.
    pub const MAX_ZFAR: f32 = 1_048_576.0;
}

impl RenderConfig {
    pub const MAX_DIMENSION: usize = 16_384;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyViewport {
                width: self.width,
                height: self.height,
            });
        }
        let largest = self.width.max(self.height);
        if largest > Self::MAX_DIMENSION {
            return Err(ConfigError::ViewportTooLarge {
                max: Self::MAX_DIMENSION,
                actual: largest,
            });
        }
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err(ConfigError::InvalidScaleFactor(self.scale_factor));
        }
        Ok(())
    }
}

impl MapConfig {
    /// Grids larger than this do not fit comfortably in memory twice over
    /// (active map plus a staged replacement).
    pub const MAX_SIDE: usize = 8192;

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_side(self.side)?;
        if !(self.exaggeration.is_finite() && self.exaggeration >= 0.0) {
            return Err(ConfigError::InvalidExaggeration(self.exaggeration));
        }
        if self.maps_available == 0 {
            return Err(ConfigError::NoMapsAvailable);
        }
        Ok(())
    }
}

impl ControlConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let speeds = [
            ("move_speed", self.move_speed),
            ("rotate_speed", self.rotate_speed),
            ("boost_multiplier", self.boost_multiplier),
            ("slow_multiplier", self.slow_multiplier),
        ];
        for (name, value) in speeds {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidSpeed(name));
            }
        }
        Ok(())
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.render.validate()?;
        self.map.validate()?;
        validate_zfar(self.camera.zfar)?;
        self.controls.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ViewerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn non_power_of_two_side_is_rejected() {
        let config = MapConfig {
            side: 1000,
            ..MapConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPowerOfTwo { side: 1000 })
        );
        assert_eq!(validate_side(0), Err(ConfigError::NotPowerOfTwo { side: 0 }));
    }

    #[test]
    fn zfar_must_be_positive() {
        assert!(validate_zfar(0.0).is_err());
        assert!(validate_zfar(-1.0).is_err());
        assert!(validate_zfar(f32::NAN).is_err());
        assert!(validate_zfar(0.5).is_ok());
        assert!(validate_zfar(CameraConfig::MAX_ZFAR).is_ok());
        assert_eq!(
            validate_zfar(1.0e10),
            Err(ConfigError::ZFarTooLarge {
                max: CameraConfig::MAX_ZFAR,
                actual: 1.0e10
            })
        );
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{"render": {"width": 320}, "camera": {"zfar": 300.0}}"#)
                .expect("config should parse");
        assert_eq!(config.render.width, 320);
        assert_eq!(config.render.height, 400);
        assert_eq!(config.camera.zfar, 300.0);
        assert_eq!(config.camera.x, 512.0);
        assert_eq!(config.map.maps_available, 30);
    }

    #[test]
    fn negative_speed_is_rejected() {
        let config = ControlConfig {
            slow_multiplier: -0.2,
            ..ControlConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidSpeed("slow_multiplier"))
        );
    }
}
