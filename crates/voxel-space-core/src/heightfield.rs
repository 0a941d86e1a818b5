use crate::color::Rgb;
use crate::config::{validate_side, ConfigError};
use std::{error::Error, fmt};

/// Default relief exaggeration applied to raw elevation samples at load time.
pub const DEFAULT_EXAGGERATION: f32 = 1.5;

/// Row-major 2D grid handed over by an external decoder.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    pub width: usize,
    pub height: usize,
    pub data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new(width: usize, height: usize, data: Vec<T>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self::new(width, height, vec![value; width * height])
    }
}

pub type ElevationSource = Grid<u8>;
pub type ColorSource = Grid<Rgb>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Elevation,
    Color,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Elevation => write!(f, "elevation"),
            SourceKind::Color => write!(f, "color"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    Config(ConfigError),
    /// The loader could not produce the source at all (missing file, decode failure).
    Unavailable { kind: SourceKind, reason: String },
    Empty { kind: SourceKind },
    NotSquare { kind: SourceKind, width: usize, height: usize },
    BufferLength { kind: SourceKind, expected: usize, actual: usize },
    DimensionMismatch { elevation: usize, color: usize },
    IndexOutOfRange { index: usize, available: usize },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Config(e) => write!(f, "{}", e),
            LoadError::Unavailable { kind, reason } => {
                write!(f, "{kind} source unavailable: {reason}")
            }
            LoadError::Empty { kind } => write!(f, "{kind} source has zero size"),
            LoadError::NotSquare {
                kind,
                width,
                height,
            } => write!(f, "{kind} source ({width}x{height}) must be square"),
            LoadError::BufferLength {
                kind,
                expected,
                actual,
            } => write!(
                f,
                "{kind} source holds {actual} samples but its dimensions require {expected}"
            ),
            LoadError::DimensionMismatch { elevation, color } => write!(
                f,
                "elevation side ({elevation}) must match color side ({color})"
            ),
            LoadError::IndexOutOfRange { index, available } => {
                write!(f, "map index ({index}) must be below {available}")
            }
        }
    }
}

impl From<ConfigError> for LoadError {
    fn from(err: ConfigError) -> Self {
        LoadError::Config(err)
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Config(e) => Some(e),
            _ => None,
        }
    }
}

fn check_source<T>(grid: &Grid<T>, kind: SourceKind) -> Result<usize, LoadError> {
    if grid.width == 0 || grid.height == 0 {
        return Err(LoadError::Empty { kind });
    }
    let expected = grid
        .width
        .checked_mul(grid.height)
        .ok_or(LoadError::BufferLength {
            kind,
            expected: usize::MAX,
            actual: grid.data.len(),
        })?;
    if grid.data.len() != expected {
        return Err(LoadError::BufferLength {
            kind,
            expected,
            actual: grid.data.len(),
        });
    }
    if grid.width != grid.height {
        return Err(LoadError::NotSquare {
            kind,
            width: grid.width,
            height: grid.height,
        });
    }
    Ok(grid.width)
}

/// Co-indexed elevation and color grids, tiled infinitely in both directions.
///
/// The side is a power of two so any integer coordinate wraps into range with
/// `idx & (side - 1)`.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightfieldMap {
    side: usize,
    mask: i64,
    elevation: Vec<u8>,
    color: Vec<Rgb>,
}

impl HeightfieldMap {
    /// Builds a map from two decoded sources, scaling elevation by
    /// [`DEFAULT_EXAGGERATION`].
    pub fn load(elevation: &ElevationSource, color: &ColorSource) -> Result<Self, LoadError> {
        Self::load_with_exaggeration(elevation, color, DEFAULT_EXAGGERATION)
    }

    /// Scaled elevation saturates at 255.
    pub fn load_with_exaggeration(
        elevation: &ElevationSource,
        color: &ColorSource,
        exaggeration: f32,
    ) -> Result<Self, LoadError> {
        let elevation_side = check_source(elevation, SourceKind::Elevation)?;
        let color_side = check_source(color, SourceKind::Color)?;
        if elevation_side != color_side {
            return Err(LoadError::DimensionMismatch {
                elevation: elevation_side,
                color: color_side,
            });
        }
        validate_side(elevation_side)?;
        if !(exaggeration.is_finite() && exaggeration >= 0.0) {
            return Err(ConfigError::InvalidExaggeration(exaggeration).into());
        }

        let scaled = elevation
            .data
            .iter()
            .map(|&h| (exaggeration * h as f32) as u8)
            .collect();
        Ok(Self::from_parts(elevation_side, scaled, color.data.clone()))
    }

    /// Uniform map, mostly useful for tests and calibration scenes.
    pub fn flat(side: usize, elevation: u8, color: Rgb) -> Result<Self, ConfigError> {
        validate_side(side)?;
        Ok(Self::from_parts(
            side,
            vec![elevation; side * side],
            vec![color; side * side],
        ))
    }

    fn from_parts(side: usize, elevation: Vec<u8>, color: Vec<Rgb>) -> Self {
        debug_assert_eq!(elevation.len(), side * side);
        debug_assert_eq!(color.len(), side * side);
        Self {
            side,
            mask: side as i64 - 1,
            elevation,
            color,
        }
    }

    pub fn side(&self) -> usize {
        self.side
    }

    #[inline]
    fn offset(&self, col: i64, row: i64) -> usize {
        ((row & self.mask) as usize) * self.side + (col & self.mask) as usize
    }

    /// Elevation and color of the cell containing world point `(rx, ry)`.
    ///
    /// Coordinates are truncated toward zero, then wrapped per axis.
    #[inline]
    pub fn sample(&self, rx: f32, ry: f32) -> (u8, Rgb) {
        self.sample_cell(rx as i64, ry as i64)
    }

    #[inline]
    pub fn sample_cell(&self, col: i64, row: i64) -> (u8, Rgb) {
        let offset = self.offset(col, row);
        (self.elevation[offset], self.color[offset])
    }

    pub fn elevation_at(&self, col: i64, row: i64) -> u8 {
        self.elevation[self.offset(col, row)]
    }

    pub fn color_at(&self, col: i64, row: i64) -> Rgb {
        self.color[self.offset(col, row)]
    }

    pub fn elevations(&self) -> &[u8] {
        &self.elevation
    }
}
