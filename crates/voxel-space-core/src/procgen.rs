//! Seeded synthetic terrain, for running the renderer without map assets.
//!
//! Multi-octave value noise on a wrapping lattice, so the generated tile is
//! seamless under the heightfield's wrap-around addressing.

use crate::color::Rgb;
use crate::config::{validate_side, ConfigError};
use crate::heightfield::{ColorSource, ElevationSource, Grid};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainParams {
    pub side: usize,
    pub seed: u64,
    /// Cells per lattice step of the coarsest octave. Power of two, at most `side`.
    pub base_period: usize,
    pub octaves: u32,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f32,
    /// Normalized elevation below which cells are water (flattened to this level).
    pub sea_level: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            side: 1024,
            seed: 42,
            base_period: 256,
            octaves: 6,
            persistence: 0.5,
            sea_level: 0.3,
        }
    }
}

/// Elevation-to-color ramp: water, sand, grass, rock, snow.
const RAMP: [(f32, Rgb); 6] = [
    (0.00, Rgb::new(22, 58, 110)),
    (0.30, Rgb::new(48, 104, 160)),
    (0.34, Rgb::new(194, 178, 128)),
    (0.45, Rgb::new(76, 140, 56)),
    (0.75, Rgb::new(110, 92, 74)),
    (1.00, Rgb::new(240, 240, 245)),
];

pub fn ramp_color(t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    for pair in RAMP.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            return c0.lerp(c1, (t - t0) / (t1 - t0));
        }
    }
    RAMP[RAMP.len() - 1].1
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

struct Lattice {
    period: usize,
    cells: usize,
    values: Vec<f32>,
}

impl Lattice {
    fn new<R: Rng + ?Sized>(rng: &mut R, side: usize, period: usize) -> Self {
        let cells = side / period;
        let values = (0..cells * cells).map(|_| rng.random::<f32>()).collect();
        Self {
            period,
            cells,
            values,
        }
    }

    fn at(&self, cx: usize, cy: usize) -> f32 {
        let mask = self.cells - 1;
        self.values[(cy & mask) * self.cells + (cx & mask)]
    }

    fn sample(&self, x: usize, y: usize) -> f32 {
        let cx = x / self.period;
        let cy = y / self.period;
        let fx = smoothstep((x % self.period) as f32 / self.period as f32);
        let fy = smoothstep((y % self.period) as f32 / self.period as f32);
        let top = self.at(cx, cy) + (self.at(cx + 1, cy) - self.at(cx, cy)) * fx;
        let bottom = self.at(cx, cy + 1) + (self.at(cx + 1, cy + 1) - self.at(cx, cy + 1)) * fx;
        top + (bottom - top) * fy
    }
}

/// Generates a raw (unexaggerated) elevation source and its matching colors.
pub fn generate(params: &TerrainParams) -> Result<(ElevationSource, ColorSource), ConfigError> {
    validate_side(params.side)?;
    validate_side(params.base_period)?;
    let base_period = params.base_period.min(params.side);

    let mut rng = ChaCha12Rng::seed_from_u64(params.seed);
    let mut octaves = Vec::new();
    let mut period = base_period;
    let mut amplitude = 1.0f32;
    for _ in 0..params.octaves.max(1) {
        octaves.push((Lattice::new(&mut rng, params.side, period), amplitude));
        if period == 1 {
            break;
        }
        period /= 2;
        amplitude *= params.persistence;
    }
    let total_amplitude: f32 = octaves.iter().map(|(_, a)| a).sum();

    let side = params.side;
    let mut heights = Vec::with_capacity(side * side);
    let mut colors = Vec::with_capacity(side * side);
    for y in 0..side {
        for x in 0..side {
            let n = octaves
                .iter()
                .map(|(lattice, amp)| lattice.sample(x, y) * amp)
                .sum::<f32>()
                / total_amplitude;
            let level = n.max(params.sea_level);
            heights.push((level * 255.0) as u8);
            colors.push(ramp_color(n));
        }
    }
    Ok((Grid::new(side, side, heights), Grid::new(side, side, colors)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightfield::HeightfieldMap;

    fn small() -> TerrainParams {
        TerrainParams {
            side: 64,
            base_period: 16,
            octaves: 4,
            ..TerrainParams::default()
        }
    }

    #[test]
    fn generation_is_deterministic_for_fixed_seed() {
        assert_eq!(generate(&small()), generate(&small()));
        let other = TerrainParams {
            seed: 7,
            ..small()
        };
        assert_ne!(generate(&small()).map(|g| g.0), generate(&other).map(|g| g.0));
    }

    #[test]
    fn generated_sources_load_as_a_map() {
        let (elevation, color) = generate(&small()).expect("valid params");
        let map = HeightfieldMap::load(&elevation, &color).expect("generated sources are valid");
        assert_eq!(map.side(), 64);
    }

    #[test]
    fn water_is_flattened_to_sea_level() {
        let params = small();
        let (elevation, _) = generate(&params).expect("valid params");
        let floor = (params.sea_level * 255.0) as u8;
        assert!(elevation.data.iter().all(|&h| h >= floor));
    }

    #[test]
    fn rejects_non_power_of_two_sizes() {
        let params = TerrainParams {
            side: 100,
            ..small()
        };
        assert_eq!(generate(&params), Err(ConfigError::NotPowerOfTwo { side: 100 }));
    }

    #[test]
    fn ramp_hits_its_stops() {
        assert_eq!(ramp_color(0.0), RAMP[0].1);
        assert_eq!(ramp_color(1.0), RAMP[5].1);
        assert_eq!(ramp_color(-3.0), RAMP[0].1);
    }
}
