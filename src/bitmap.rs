#![deny(missing_docs)]

//! Pixel buffers that glyphs are rendered into and composited onto.

use crate::error::RasterError;

/// Background colour of rendered glyphs.
pub const WHITE: u32 = 0xFFFFFF;
/// Foreground colour of rendered glyphs.
pub const BLACK: u32 = 0x000000;

/// A row-major buffer of `0xRRGGBB` pixels.
///
/// Reads outside the buffer return the background colour and writes outside it are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    background: u32,
    pixels: Vec<u32>,
}

/// The collaborator that encodes finished bitmaps, such as a PNG writer.
pub trait ImageSink {
    /// Error returned when a bitmap cannot be saved.
    type Error;

    /// Encode `bitmap` to `filename`, with an optional image title.
    fn save(&mut self, bitmap: &Bitmap, filename: &str, title: Option<&str>)
        -> Result<(), Self::Error>;
}

impl Bitmap {
    /// Allocate a `width` by `height` bitmap filled with `background`.
    ///
    /// The buffer is reserved fallibly, returning `RasterError::Allocation` if it cannot be.
    pub fn new(width: usize, height: usize, background: u32) -> Result<Bitmap, RasterError> {
        let len = width.checked_mul(height).ok_or(RasterError::Allocation)?;
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len)?;
        pixels.resize(len, background);

        Ok(Bitmap {
            width,
            height,
            background,
            pixels,
        })
    }

    /// The width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The colour the bitmap was filled with when created.
    pub fn background(&self) -> u32 {
        self.background
    }

    /// All pixels, top row first.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Mutable access to all pixels, top row first.
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Iterate over the rows of the bitmap, top row first.
    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.pixels.chunks(self.width.max(1))
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok().filter(|&x| x < self.width)?;
        let y = usize::try_from(y).ok().filter(|&y| y < self.height)?;
        Some(y * self.width + x)
    }

    /// Read the pixel at (`x`, `y`), or the background if it lies outside the bitmap.
    pub fn get(&self, x: i32, y: i32) -> u32 {
        self.index(x, y)
            .map_or(self.background, |index| self.pixels[index])
    }

    /// Write the pixel at (`x`, `y`). Writes outside the bitmap are ignored.
    pub fn set(&mut self, x: i32, y: i32, colour: u32) {
        if let Some(index) = self.index(x, y) {
            self.pixels[index] = colour;
        }
    }

    /// Draw `bitmap` onto this bitmap with its top left corner at (`x`, `y`).
    ///
    /// Pixels of `bitmap` equal to its background are not copied so that adjacent glyphs can
    /// overlap. The part of `bitmap` that falls outside the canvas is clipped, but the origin
    /// itself must lie within the canvas.
    pub fn draw_bitmap(&mut self, bitmap: &Bitmap, x: i32, y: i32) -> Result<(), RasterError> {
        if self.index(x, y).is_none() {
            return Err(RasterError::OutOfBounds);
        }

        for (yb, row) in (0..).zip(bitmap.rows()) {
            for (xb, &colour) in (0..).zip(row) {
                if colour != bitmap.background {
                    self.set(x + xb, y + yb, colour);
                }
            }
        }

        Ok(())
    }

    /// Place `a` and `b` side by side in a new bitmap, `b` to the right of `a`.
    ///
    /// The result is as tall as the taller of the two. Space below the shorter one is filled
    /// with `background`.
    pub fn combine(a: &Bitmap, b: &Bitmap, background: u32) -> Result<Bitmap, RasterError> {
        let width = a.width.checked_add(b.width).ok_or(RasterError::Allocation)?;
        let mut out = Bitmap::new(width, a.height.max(b.height), background)?;
        let out_width = width.max(1);
        for (row, a_row) in out.pixels.chunks_mut(out_width).zip(a.rows()) {
            row[..a.width].copy_from_slice(a_row);
        }
        for (row, b_row) in out.pixels.chunks_mut(out_width).zip(b.rows()) {
            row[a.width..].copy_from_slice(b_row);
        }

        Ok(out)
    }
}
