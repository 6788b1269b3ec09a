use crate::config::{DARK_VALUE, LIGHT_VALUE};
use crate::simulation::GridBuffer;

/// One opaque grayscale pixel, laid out as RGBA8.
///
/// Layout: 4 bytes, so a `&[Pixel]` can be handed out as `&[u8]` unchanged.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    /// Gray pixel with every channel set to `luma`, fully opaque
    pub fn gray(luma: u8) -> Self {
        Self {
            r: luma,
            g: luma,
            b: luma,
            a: u8::MAX,
        }
    }
}

/// Rasterized image of one committed generation.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    generation: u64,
    pixels: Vec<Pixel>,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Commit count of the grid this frame was taken from
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Row-major pixels
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Pixels as tightly packed RGBA8 bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

/// Gray level for `state` out of `modulus` states.
///
/// State 0 maps to [`LIGHT_VALUE`], state `modulus - 1` to [`DARK_VALUE`],
/// linear in between. `modulus` must be at least 2.
#[inline]
pub fn luma(state: u8, modulus: u32) -> u8 {
    let top = f64::from(modulus - 1);
    // 1.0 for state 0, 0.0 for the top state
    let f = (top - f64::from(state)) / top;
    // truncation, not rounding
    (f * f64::from(LIGHT_VALUE) + (1.0 - f) * f64::from(DARK_VALUE)) as u8
}

/// Render the front plane of `grid` into a new [`Frame`].
pub fn rasterize(grid: &GridBuffer, modulus: u32) -> Frame {
    // one entry per possible state
    let palette: Vec<Pixel> = (0..modulus)
        .map(|state| Pixel::gray(luma(state as u8, modulus)))
        .collect();

    let pixels = grid
        .front()
        .iter()
        .map(|&state| palette[usize::from(state)])
        .collect();

    Frame {
        width: grid.width(),
        height: grid.height(),
        generation: grid.generation(),
        pixels,
    }
}
