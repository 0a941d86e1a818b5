use crate::color::Rgb;
use crate::render::Span;

/// Row-major RGB framebuffer, the presentation collaborator's input.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize, background: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![background; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self, background: Rgb) {
        self.pixels.fill(background);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.width + x]
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Top-to-bottom copy of one column.
    pub fn column(&self, x: usize) -> Vec<Rgb> {
        (0..self.height).map(|y| self.pixel(x, y)).collect()
    }

    /// Writes an inclusive vertical run. Rows outside the buffer are dropped.
    pub fn draw_span(&mut self, span: &Span) {
        if span.column >= self.width || span.row_start >= self.height {
            return;
        }
        let last = span.row_end.min(self.height - 1);
        for y in span.row_start..=last {
            self.pixels[y * self.width + span.column] = span.color;
        }
    }

    /// Packed `RGBRGB...` bytes, row-major.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_array()).collect()
    }
}
