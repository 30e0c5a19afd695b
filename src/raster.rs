//! Scan conversion of scaled outlines into bitmaps.
//!
//! Each pixel row is intersected with every segment of the outline and the span between
//! alternating intersections is filled (the even-odd rule). Row 0 of the bitmap is the top of
//! the outline's bounding box.
//!
//! In oversampled mode the outline is scanned at twice the resolution along each axis and each
//! output pixel is shaded by the fraction of its samples that were filled.

use log::debug;
use pathfinder_geometry::vector::Vector2F;
use tinyvec::TinyVec;

use crate::bitmap::{Bitmap, WHITE};
use crate::error::RasterError;
use crate::outline::{Outline, Segment};
use crate::scale::{self, round_to_subpixel};
use crate::tables::glyf::BoundingBox;

/// Samples per pixel along each axis in `RasterMode::Oversampled`.
const OVERSAMPLE: usize = 2;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RasterMode {
    /// Each pixel is either fully filled or empty.
    #[default]
    Plain,
    /// Anti-aliased by scanning at twice the resolution and averaging.
    Oversampled,
}

/// Rendering parameters for a font.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RasterConfig {
    pub point: u16,
    pub dpi: u16,
    pub mode: RasterMode,
}

/// How a segment meets a scan line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
enum Edge {
    /// Crosses from one side of the line to the other.
    #[default]
    Through,
    /// Lies along the line.
    Flat,
    /// Ends on the line, the rest of the segment is above it.
    Above,
    /// Ends on the line, the rest of the segment is below it.
    Below,
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
struct Crossing {
    x: f32,
    edge: Edge,
}

/// Intersections of one pixel row with an outline.
struct ScanLine {
    y: f32,
    crossings: TinyVec<[Crossing; 16]>,
}

impl Default for RasterConfig {
    fn default() -> Self {
        RasterConfig {
            point: 12,
            dpi: 96,
            mode: RasterMode::Plain,
        }
    }
}

impl RasterConfig {
    pub fn ppem(&self) -> u32 {
        scale::ppem(self.point, self.dpi)
    }
}

impl ScanLine {
    fn new() -> Self {
        ScanLine {
            y: 0.,
            crossings: TinyVec::new(),
        }
    }

    /// Start a new row, keeping the intersection storage.
    fn reset(&mut self, y: f32) {
        self.y = y;
        self.crossings.clear();
    }

    fn add(&mut self, x: f32, edge: Edge) -> Result<(), RasterError> {
        self.crossings.try_reserve(1)?;
        self.crossings.push(Crossing {
            x: round_to_subpixel(x),
            edge,
        });
        Ok(())
    }

    /// Add the end point `x` of a segment that continues `direction` away from the line.
    fn add_end(&mut self, x: f32, direction: f32) -> Result<(), RasterError> {
        let edge = if direction > 0. {
            Edge::Above
        } else {
            Edge::Below
        };
        self.add(x, edge)
    }

    fn intersect(&mut self, segment: &Segment) -> Result<(), RasterError> {
        match *segment {
            Segment::Line(p0, p1) => self.intersect_line(p0, p1),
            Segment::Curve(p0, p1, p2) => self.intersect_curve(p0, p1, p2),
        }
    }

    fn intersect_line(&mut self, p0: Vector2F, p1: Vector2F) -> Result<(), RasterError> {
        let y = self.y;
        let (x0, y0, x1, y1) = (p0.x(), p0.y(), p1.x(), p1.y());
        if y < y0.min(y1) || y > y0.max(y1) {
            return Ok(());
        }

        if y0 == y1 {
            // Horizontal line lying on the scan line
            self.add(x0, Edge::Flat)?;
            return self.add(x1, Edge::Flat);
        }
        if y == y0 {
            return self.add_end(x0, y1 - y0);
        }
        if y == y1 {
            return self.add_end(x1, y0 - y1);
        }

        let t = (y - y0) / (y1 - y0);
        let x = (x0 + t * (x1 - x0)).max(x0.min(x1)).min(x0.max(x1));
        self.add(x, Edge::Through)
    }

    fn intersect_curve(
        &mut self,
        p0: Vector2F,
        p1: Vector2F,
        p2: Vector2F,
    ) -> Result<(), RasterError> {
        let (x0, x1, x2) = (p0.x(), p1.x(), p2.x());
        let (y0, y1, y2) = (p0.y(), p1.y(), p2.y());

        // y(t) - y = at² + bt + c
        let a = y0 - 2. * y1 + y2;
        let b = 2. * y1 - 2. * y0;
        let c = y0 - self.y;

        if a == 0. && b == 0. {
            // Horizontal, intersects only if it lies on the scan line
            if c == 0. {
                self.add(x0, Edge::Flat)?;
                self.add(x2, Edge::Flat)?;
            }
            return Ok(());
        }

        let at_start = c == 0.;
        let at_end = y2 == self.y;
        if at_start {
            self.add_end(x0, if y1 != y0 { y1 - y0 } else { y2 - y0 })?;
        }
        if at_end {
            self.add_end(x2, if y1 != y2 { y1 - y2 } else { y0 - y2 })?;
        }

        if a == 0. {
            // Straight line, crosses at most once
            if at_start || at_end {
                return Ok(());
            }
            return self.add_curve_root(-c / b, x0, x1, x2);
        }
        if at_start {
            // The roots are t = 0 and t = -b / a
            return self.add_curve_root(-b / a, x0, x1, x2);
        }
        if at_end {
            // The roots are t = 1 and t = c / a
            return self.add_curve_root(c / a, x0, x1, x2);
        }

        let discriminant = b * b - 4. * a * c;
        if discriminant < 0. {
            Ok(())
        } else if discriminant == 0. {
            // Touches the line at the curve's extremum
            let t = -b / (2. * a);
            if t > 0. && t < 1. {
                let x = quad_bezier(t, x0, x1, x2);
                self.add_end(x, a)?;
                self.add_end(x, a)?;
            }
            Ok(())
        } else {
            let sqrt = discriminant.sqrt();
            self.add_curve_root((-b + sqrt) / (2. * a), x0, x1, x2)?;
            self.add_curve_root((-b - sqrt) / (2. * a), x0, x1, x2)
        }
    }

    /// Add the crossing at `t`, if it is between the end points of the curve.
    fn add_curve_root(&mut self, t: f32, x0: f32, x1: f32, x2: f32) -> Result<(), RasterError> {
        if t > 0. && t < 1. {
            self.add(quad_bezier(t, x0, x1, x2), Edge::Through)
        } else {
            Ok(())
        }
    }

    fn sort(&mut self) {
        self.crossings.sort_unstable_by(|a, b| a.x.total_cmp(&b.x));
    }

    /// Fill `row`, whose first sample is at `x_min`, between alternating intersections.
    ///
    /// A run of equal intersections toggles the fill once, except at a vertex where the
    /// outline turns back, which leaves the fill unchanged.
    fn fill(&self, x_min: f32, row: &mut [bool]) {
        let mut filled = false;
        let mut index = 0;
        let mut x = x_min;
        for sample in row.iter_mut() {
            while let Some(crossing) = self.crossings.get(index) {
                if x < crossing.x {
                    break;
                }
                let len = self.crossings[index..]
                    .iter()
                    .take_while(|other| other.x == crossing.x)
                    .count();
                if !is_extremum(&self.crossings[index..index + len]) {
                    filled = !filled;
                }
                index += len;
            }
            *sample = filled;
            x += 1.;
        }
    }
}

/// Whether `run` is made up of pairs of segment ends that all lie on one side of the line.
fn is_extremum(run: &[Crossing]) -> bool {
    run.len() % 2 == 0
        && (run.iter().all(|crossing| crossing.edge == Edge::Above)
            || run.iter().all(|crossing| crossing.edge == Edge::Below))
}

fn quad_bezier(t: f32, p0: f32, p1: f32, p2: f32) -> f32 {
    (1. - t) * (1. - t) * p0 + 2. * (1. - t) * t * p1 + t * t * p2
}

/// The whole pixel bounding box of a scaled outline, rounded outwards.
pub fn pixel_bounds(outline: &Outline) -> BoundingBox<i32> {
    // NOTE(cast): scaled coordinates are small, `as` saturates regardless
    let bbox = &outline.bounding_box;
    BoundingBox {
        x_min: bbox.x_min.floor() as i32,
        x_max: bbox.x_max.ceil() as i32,
        y_min: bbox.y_min.floor() as i32,
        y_max: bbox.y_max.ceil() as i32,
    }
}

/// Render a scaled outline to a black on white bitmap.
///
/// The bitmap covers `pixel_bounds(outline)`: it is `x_max - x_min + 1` pixels wide and
/// `y_max - y_min + 1` pixels tall.
pub fn render_outline(outline: &Outline, mode: RasterMode) -> Result<Bitmap, RasterError> {
    if !outline.is_scaled() {
        return Err(RasterError::NotScaled);
    }

    let bounds = pixel_bounds(outline);
    let width = usize::try_from(i64::from(bounds.x_max) - i64::from(bounds.x_min) + 1).unwrap_or(0);
    let height =
        usize::try_from(i64::from(bounds.y_max) - i64::from(bounds.y_min) + 1).unwrap_or(0);
    debug!("rendering {}x{} bitmap ({:?})", width, height, mode);

    let mut bitmap = Bitmap::new(width, height, WHITE)?;
    match mode {
        RasterMode::Plain => {
            let samples = scan(outline, &bounds, 1, width, height)?;
            for (pixel, &filled) in bitmap.pixels_mut().iter_mut().zip(samples.iter()) {
                *pixel = shade(usize::from(filled), 1);
            }
        }
        RasterMode::Oversampled => {
            // NOTE(cast): OVERSAMPLE is a small constant
            let factor = OVERSAMPLE as f32;
            let oversampled = outline.map_points(|point| point * factor);
            let samples = scan(&oversampled, &bounds, OVERSAMPLE, width, height)?;
            let sample_width = width * OVERSAMPLE;
            let pixels = bitmap.pixels_mut();
            for y in 0..height {
                for x in 0..width {
                    let filled = (0..OVERSAMPLE)
                        .map(|dy| {
                            let start = (y * OVERSAMPLE + dy) * sample_width + x * OVERSAMPLE;
                            samples[start..start + OVERSAMPLE]
                                .iter()
                                .filter(|&&sample| sample)
                                .count()
                        })
                        .sum::<usize>();
                    pixels[y * width + x] = shade(filled, OVERSAMPLE * OVERSAMPLE);
                }
            }
        }
    }

    Ok(bitmap)
}

/// Scan `outline` over a grid of `factor` samples per pixel of `bounds`.
///
/// Returns `width * factor` by `height * factor` samples, top row first.
fn scan(
    outline: &Outline,
    bounds: &BoundingBox<i32>,
    factor: usize,
    width: usize,
    height: usize,
) -> Result<Vec<bool>, RasterError> {
    let sample_width = width.checked_mul(factor).ok_or(RasterError::Allocation)?;
    let sample_height = height.checked_mul(factor).ok_or(RasterError::Allocation)?;
    let len = sample_width
        .checked_mul(sample_height)
        .ok_or(RasterError::Allocation)?;
    let mut samples = Vec::new();
    samples.try_reserve_exact(len)?;
    samples.resize(len, false);
    if len == 0 {
        return Ok(samples);
    }

    // NOTE(cast): factor is 1 or OVERSAMPLE
    let factor = factor as i32;
    // NOTE(cast): pixel bounds are small integers, exactly representable
    let x_min = (bounds.x_min * factor) as f32;
    let top = bounds.y_max * factor;

    let mut scanline = ScanLine::new();
    for (y, row) in (0..).map(|i| top - i).zip(samples.chunks_mut(sample_width)) {
        // NOTE(cast): as above
        scanline.reset(y as f32);
        for segment in outline.segments() {
            scanline.intersect(segment)?;
        }
        scanline.sort();
        scanline.fill(x_min, row);
    }

    Ok(samples)
}

/// Shade of a pixel with `filled` of `samples` samples covered, black on white.
fn shade(filled: usize, samples: usize) -> u32 {
    let level = 0xFF * (samples - filled.min(samples)) / samples;
    // NOTE(cast): level is at most 0xFF
    level as u32 * 0x010101
}
