//! Rendering surface contract and a pixel-buffer implementation
//!
//! The simulation never draws directly. Each frame the viewer fades the
//! surface, then rasterises every star's (position, radius, color) triple
//! onto it with `draw_star`.

use crate::simulation::params::Parameters;
use crate::simulation::states::{Rgb, Star};
use crate::visualization::input::ViewOffset;

/// Operations the viewer needs from a rendering surface
pub trait Canvas {
    /// Set one pixel; coordinates outside the surface are ignored
    fn set(&mut self, x: i32, y: i32, color: Rgb);

    /// Move the whole image one pixel, clearing the row or column uncovered
    fn shift_up(&mut self);
    fn shift_down(&mut self);
    fn shift_left(&mut self);
    fn shift_right(&mut self);

    /// Scale every pixel's color by `factor`, leaving fading trails
    fn darken(&mut self, factor: f32);
}

/// Row-major RGBA8 pixel buffer, top-left origin
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

const BLACK: [u8; 4] = [0, 0, 0, 255];

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: BLACK.repeat(width * height),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// RGBA bytes, `width * height * 4` long
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let o = (y * self.width + x) * 4;
        Some([self.pixels[o], self.pixels[o + 1], self.pixels[o + 2]])
    }

    fn row_bytes(&self) -> usize {
        self.width * 4
    }

    fn clear_row(&mut self, y: usize) {
        let row = self.row_bytes();
        for px in self.pixels[y * row..(y + 1) * row].chunks_exact_mut(4) {
            px.copy_from_slice(&BLACK);
        }
    }
}

impl Canvas for Bitmap {
    fn set(&mut self, x: i32, y: i32, color: Rgb) {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return;
        };
        if x >= self.width || y >= self.height {
            return;
        }
        let o = (y * self.width + x) * 4;
        self.pixels[o..o + 3].copy_from_slice(&color);
        self.pixels[o + 3] = 255;
    }

    fn shift_up(&mut self) {
        if self.height == 0 {
            return;
        }
        let row = self.row_bytes();
        self.pixels.copy_within(row.., 0);
        self.clear_row(self.height - 1);
    }

    fn shift_down(&mut self) {
        if self.height == 0 {
            return;
        }
        let row = self.row_bytes();
        let len = self.pixels.len();
        self.pixels.copy_within(..len - row, row);
        self.clear_row(0);
    }

    fn shift_left(&mut self) {
        if self.width == 0 {
            return;
        }
        let row = self.row_bytes();
        for line in self.pixels.chunks_exact_mut(row) {
            line.copy_within(4.., 0);
            line[row - 4..].copy_from_slice(&BLACK);
        }
    }

    fn shift_right(&mut self) {
        if self.width == 0 {
            return;
        }
        let row = self.row_bytes();
        for line in self.pixels.chunks_exact_mut(row) {
            line.copy_within(..row - 4, 4);
            line[..4].copy_from_slice(&BLACK);
        }
    }

    fn darken(&mut self, factor: f32) {
        for px in self.pixels.chunks_exact_mut(4) {
            for c in &mut px[..3] {
                *c = (*c as f32 * factor) as u8;
            }
        }
    }
}

/// Fill a disk for `star`, shifted by the current view offset.
/// Scans the upper-right quadrant out to 1.1 radii and mirrors each hit
/// into the other three quadrants.
pub fn draw_star<C: Canvas + ?Sized>(canvas: &mut C, star: &Star, params: &Parameters, offset: ViewOffset) {
    let cx = star.x.x as f32 + offset.x as f32;
    let cy = star.x.y as f32 + offset.y as f32;
    let radius = star.radius(params) as f32;
    if !(cx.is_finite() && cy.is_finite() && radius.is_finite()) {
        return;
    }

    let limit = radius * 1.1;
    let mut x = 0.0f32;
    while x <= limit {
        let mut y = 0.0f32;
        while y <= limit {
            if (x * x + y * y).sqrt() < radius {
                canvas.set((cx + x) as i32, (cy + y) as i32, star.color);
                canvas.set((cx + x) as i32, (cy - y) as i32, star.color);
                canvas.set((cx - x) as i32, (cy - y) as i32, star.color);
                canvas.set((cx - x) as i32, (cy + y) as i32, star.color);
            }
            y += 1.0;
        }
        x += 1.0;
    }
}
