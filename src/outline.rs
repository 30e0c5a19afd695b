//! Glyph outlines.
//!
//! A glyph's outline can be visited as a series of drawing callbacks on an implementor of
//! `OutlineSink`, or collected into an `Outline`: contours made of line and quadratic Bézier
//! segments that the rasterizer consumes.
//!
//! Runs of consecutive off-curve points are split while visiting, with the implied on-curve
//! point between each pair inserted. Every curve segment of an `Outline` is therefore a single
//! quadratic with three control points.
//!
//! ### Example
//!
//! ```
//! use ttf_raster::pathfinder_geometry::vector::vec2f;
//! use ttf_raster::outline::{OutlineCollector, OutlineSink, Segment};
//!
//! let mut collector = OutlineCollector::new();
//! collector.move_to(vec2f(0., 0.));
//! collector.quadratic_curve_to(vec2f(5., 10.), vec2f(10., 0.));
//! collector.close();
//!
//! let outline = collector.finish();
//! let segments = &outline.contours[0].segments;
//! assert_eq!(segments.len(), 2);
//! assert_eq!(segments[1], Segment::Line(vec2f(10., 0.), vec2f(0., 0.)));
//! ```

use pathfinder_geometry::vector::Vector2F;

use crate::tables::glyf::{BoundingBox, Point};

/// `Outline::point` value of an outline still in font units.
pub const UNSCALED: i32 = -1;

/// Trait for visiting a glyph outline and delivering drawing commands to an `OutlineSink`.
pub trait OutlineBuilder {
    type Error: std::error::Error;

    /// Visit the glyph outlines in `self`.
    fn visit<S: OutlineSink>(&mut self, glyph_index: u16, sink: &mut S) -> Result<(), Self::Error>;
}

/// A trait for visiting a glyph outline
pub trait OutlineSink {
    /// Moves the pen to a point.
    fn move_to(&mut self, to: Vector2F);
    /// Draws a line to a point.
    fn line_to(&mut self, to: Vector2F);
    /// Draws a quadratic Bézier curve to a point.
    fn quadratic_curve_to(&mut self, ctrl: Vector2F, to: Vector2F);
    /// Closes the path, returning to the first point in it.
    fn close(&mut self);
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Segment {
    /// A line from the first point to the second.
    Line(Vector2F, Vector2F),
    /// A quadratic Bézier: start, control point, end.
    Curve(Vector2F, Vector2F, Vector2F),
}

/// A closed sequence of segments, each starting where the previous one ended.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub contours: Vec<Contour>,
    pub bounding_box: BoundingBox<f32>,
    /// Point size the coordinates are scaled to, or `UNSCALED` when they are font units.
    pub point: i32,
}

/// An `OutlineSink` that builds an `Outline`.
#[derive(Debug, Default)]
pub struct OutlineCollector {
    contours: Vec<Contour>,
    current: Vec<Segment>,
    start: Vector2F,
    pen: Vector2F,
}

impl Segment {
    pub fn start(&self) -> Vector2F {
        match *self {
            Segment::Line(start, _) | Segment::Curve(start, _, _) => start,
        }
    }

    pub fn end(&self) -> Vector2F {
        match *self {
            Segment::Line(_, end) | Segment::Curve(_, _, end) => end,
        }
    }

    /// Apply `f` to every point of the segment.
    pub fn map<F: Fn(Vector2F) -> Vector2F>(&self, f: F) -> Segment {
        match *self {
            Segment::Line(p0, p1) => Segment::Line(f(p0), f(p1)),
            Segment::Curve(p0, p1, p2) => Segment::Curve(f(p0), f(p1), f(p2)),
        }
    }
}

impl Contour {
    /// The on-curve points of the contour in order, starting with the first segment's start.
    pub fn on_curve_points(&self) -> impl Iterator<Item = Vector2F> + '_ {
        self.segments.iter().map(Segment::start)
    }

    /// Whether each segment starts where the previous one ended, wrapping around.
    pub fn is_closed(&self) -> bool {
        let ends = self.segments.iter().map(Segment::end);
        let starts = self.segments.iter().cycle().skip(1).map(Segment::start);
        ends.zip(starts).all(|(end, start)| end == start)
    }
}

impl Outline {
    pub fn new(contours: Vec<Contour>, bounding_box: BoundingBox<f32>) -> Self {
        Outline {
            contours,
            bounding_box,
            point: UNSCALED,
        }
    }

    pub fn is_scaled(&self) -> bool {
        self.point >= 0
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.contours
            .iter()
            .flat_map(|contour| contour.segments.iter())
    }

    /// Apply `f` to every point and to the corners of the bounding box.
    pub fn map_points<F: Fn(Vector2F) -> Vector2F>(&self, f: F) -> Outline {
        let contours = self
            .contours
            .iter()
            .map(|contour| Contour {
                segments: contour.segments.iter().map(|segment| segment.map(&f)).collect(),
            })
            .collect();
        let min = f(Vector2F::new(
            self.bounding_box.x_min,
            self.bounding_box.y_min,
        ));
        let max = f(Vector2F::new(
            self.bounding_box.x_max,
            self.bounding_box.y_max,
        ));

        Outline {
            contours,
            bounding_box: BoundingBox {
                x_min: min.x(),
                x_max: max.x(),
                y_min: min.y(),
                y_max: max.y(),
            },
            point: self.point,
        }
    }
}

impl OutlineCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish collecting, using the extent of the segments as the bounding box.
    pub fn finish(mut self) -> Outline {
        self.end_contour();
        let points = self
            .contours
            .iter()
            .flat_map(|contour| contour.segments.iter())
            .flat_map(|segment| match *segment {
                Segment::Line(p0, p1) => vec![p0, p1],
                Segment::Curve(p0, p1, p2) => vec![p0, p1, p2],
            })
            .map(|point| (point.x(), point.y()))
            .collect::<Vec<_>>();
        let bounding_box = BoundingBox::from_points(&points).unwrap_or_default();
        Outline::new(self.contours, bounding_box)
    }

    /// Finish collecting, recording `bounding_box` as the outline's extent.
    pub fn finish_with_bounding_box(mut self, bounding_box: BoundingBox<f32>) -> Outline {
        self.end_contour();
        Outline::new(self.contours, bounding_box)
    }

    fn end_contour(&mut self) {
        if !self.current.is_empty() {
            let segments = std::mem::take(&mut self.current);
            self.contours.push(Contour { segments });
        }
    }
}

impl OutlineSink for OutlineCollector {
    fn move_to(&mut self, to: Vector2F) {
        self.end_contour();
        self.start = to;
        self.pen = to;
    }

    fn line_to(&mut self, to: Vector2F) {
        self.current.push(Segment::Line(self.pen, to));
        self.pen = to;
    }

    fn quadratic_curve_to(&mut self, ctrl: Vector2F, to: Vector2F) {
        self.current.push(Segment::Curve(self.pen, ctrl, to));
        self.pen = to;
    }

    fn close(&mut self) {
        if self.pen != self.start {
            self.line_to(self.start);
        }
        self.end_contour();
        self.pen = self.start;
    }
}

impl From<Point> for Vector2F {
    fn from(point: Point) -> Self {
        Vector2F::new(f32::from(point.0), f32::from(point.1))
    }
}
