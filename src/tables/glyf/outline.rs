use log::warn;

use crate::error::ParseError;
use crate::outline::{Outline, OutlineBuilder, OutlineCollector, OutlineSink};
use crate::tables::glyf::{GlyfTable, Glyph, GlyphData, SimpleGlyph};

use contour::{Contour, CurvePoint};

impl SimpleGlyph {
    /// Deliver the contours of this glyph to `sink` in font units.
    pub fn visit_outline<S: OutlineSink>(&self, sink: &mut S) {
        for points_and_flags in self.contours() {
            let contour = match Contour::new(points_and_flags) {
                Some(contour) => contour,
                None => continue,
            };
            if !contour.first().is_on_curve() {
                warn!("contour starts with off-curve point");
            }

            // Determine origin of the contour and move to it
            let origin = contour.origin();
            sink.move_to(origin);

            // Consume the stream of points...
            let mut points = contour.points();
            // It's assumed that the current location is on curve each time through this loop
            while let Some(next) = points.next() {
                match next {
                    CurvePoint::OnCurve(to) => {
                        sink.line_to(to);
                    }
                    CurvePoint::Control(control) => match points.next() {
                        Some(CurvePoint::OnCurve(to)) => {
                            sink.quadratic_curve_to(control, to);
                        }
                        // The Points iterator inserts an on-curve mid-point between two
                        // consecutive control points so this only happens at the end
                        Some(CurvePoint::Control(_)) | None => {
                            // Wrap around to the first point
                            sink.quadratic_curve_to(control, origin);
                            break;
                        }
                    },
                }
            }

            sink.close();
        }
    }
}

impl Glyph {
    /// Build the font unit outline of this glyph.
    ///
    /// Returns `None` if the glyph could not be decoded. An empty glyph has an outline with no
    /// contours.
    pub fn build_outline(&self) -> Option<Outline> {
        let bounding_box = self.bounding_box.to_f32()?;
        let mut collector = OutlineCollector::new();
        match &self.data {
            GlyphData::Empty => {}
            GlyphData::Simple(simple_glyph) => simple_glyph.visit_outline(&mut collector),
            GlyphData::Unavailable(_) => return None,
        }
        Some(collector.finish_with_bounding_box(bounding_box))
    }
}

impl OutlineBuilder for GlyfTable {
    type Error = ParseError;

    fn visit<V: OutlineSink>(
        &mut self,
        glyph_index: u16,
        visitor: &mut V,
    ) -> Result<(), Self::Error> {
        let glyph = self.get(glyph_index).ok_or(ParseError::BadIndex)?;
        match &glyph.data {
            GlyphData::Empty => Ok(()),
            GlyphData::Simple(simple_glyph) => {
                simple_glyph.visit_outline(visitor);
                Ok(())
            }
            GlyphData::Unavailable(err) => Err(err.clone()),
        }
    }
}

mod contour {
    use crate::tables::glyf::{Point, SimpleGlyphFlag};
    use pathfinder_geometry::vector::Vector2F;

    pub struct Contour<'points> {
        points_and_flags: &'points [(SimpleGlyphFlag, Point)],
    }

    #[derive(Debug, PartialEq)]
    pub enum CurvePoint {
        OnCurve(Vector2F),
        Control(Vector2F),
    }

    pub struct Points<'a, 'points> {
        contour: &'a Contour<'points>,
        i: usize,
        until: usize,
        mid: Option<Vector2F>,
    }

    impl<'points> Contour<'points> {
        /// Returns `None` if there are no points.
        pub fn new(points_and_flags: &'points [(SimpleGlyphFlag, Point)]) -> Option<Self> {
            if points_and_flags.is_empty() {
                None
            } else {
                Some(Contour { points_and_flags })
            }
        }

        pub fn origin(&self) -> Vector2F {
            self.calculate_origin().0
        }

        /// The origin along with the range of points still to visit after it.
        fn calculate_origin(&self) -> (Vector2F, usize, usize) {
            match (self.first(), self.last()) {
                (CurvePoint::OnCurve(first), _) => {
                    // Origin is the first point, so start on the second point
                    (first, 1, self.len())
                }
                (CurvePoint::Control(_), CurvePoint::OnCurve(last)) => {
                    // Origin is the last point, so start on the first point and consider
                    // the last point already processed
                    (last, 0, self.len() - 1)
                }
                (CurvePoint::Control(first), CurvePoint::Control(last)) => {
                    // Origin is the implied on-curve point between the first and last
                    // control points. Start on the first point
                    (first.lerp(last, 0.5), 0, self.len())
                }
            }
        }

        pub fn points<'a>(&'a self) -> Points<'a, 'points> {
            let (_, start, until) = self.calculate_origin();
            Points {
                contour: self,
                i: start,
                until,
                mid: None,
            }
        }

        pub fn first(&self) -> CurvePoint {
            self.get(0)
        }

        pub fn last(&self) -> CurvePoint {
            self.get(self.points_and_flags.len() - 1)
        }

        pub fn len(&self) -> usize {
            self.points_and_flags.len()
        }

        fn get(&self, index: usize) -> CurvePoint {
            let (flags, point) = self.points_and_flags[index];
            CurvePoint::new(point, flags.is_on_curve())
        }
    }

    impl<'a, 'points> Iterator for Points<'a, 'points> {
        type Item = CurvePoint;

        fn next(&mut self) -> Option<Self::Item> {
            if let Some(mid) = self.mid.take() {
                return Some(CurvePoint::OnCurve(mid));
            }

            if self.i >= self.until {
                return None;
            }

            let point = match self.contour.get(self.i) {
                point @ CurvePoint::OnCurve(_) => point,
                CurvePoint::Control(control) => {
                    // The point after the last one visited is the origin, which is already
                    // on curve
                    let is_last = self.i + 1 >= self.until;
                    match self.contour.get((self.i + 1) % self.contour.len()) {
                        CurvePoint::Control(control2) if !is_last => {
                            // Next point is a control point, yield the implied mid point as on
                            // curve point after this one
                            self.mid = Some(control.lerp(control2, 0.5));
                            CurvePoint::Control(control)
                        }
                        _ => CurvePoint::Control(control),
                    }
                }
            };

            self.i += 1;
            Some(point)
        }
    }

    impl CurvePoint {
        fn new(point: Point, on_curve: bool) -> Self {
            if on_curve {
                CurvePoint::OnCurve(Vector2F::from(point))
            } else {
                CurvePoint::Control(Vector2F::from(point))
            }
        }

        pub fn is_on_curve(&self) -> bool {
            matches!(self, CurvePoint::OnCurve(_))
        }
    }
}

#[cfg(test)]
mod tests {
    use pathfinder_geometry::vector::{vec2f, Vector2F};

    use crate::tables::glyf::tests::simple_glyph_fixture;
    use crate::tables::glyf::{BoundingBox, Point, SimpleGlyphFlag};

    use super::*;

    #[derive(Default)]
    struct TestVisitor {
        commands: Vec<String>,
    }

    impl OutlineSink for TestVisitor {
        fn move_to(&mut self, to: Vector2F) {
            self.commands.push(format!("move_to({}, {})", to.x(), to.y()));
        }

        fn line_to(&mut self, to: Vector2F) {
            self.commands.push(format!("line_to({}, {})", to.x(), to.y()));
        }

        fn quadratic_curve_to(&mut self, control: Vector2F, to: Vector2F) {
            self.commands.push(format!(
                "quad_to({}, {}, {}, {})",
                control.x(),
                control.y(),
                to.x(),
                to.y()
            ));
        }

        fn close(&mut self) {
            self.commands.push("close()".to_string());
        }
    }

    fn glyph(coordinates: Vec<(SimpleGlyphFlag, Point)>) -> SimpleGlyph {
        // NOTE(cast): test contours are small
        let end = coordinates.len() as u16 - 1;
        SimpleGlyph {
            end_pts_of_contours: vec![end],
            instructions: vec![],
            coordinates,
        }
    }

    fn on(x: i16, y: i16) -> (SimpleGlyphFlag, Point) {
        (SimpleGlyphFlag::ON_CURVE_POINT, Point(x, y))
    }

    fn off(x: i16, y: i16) -> (SimpleGlyphFlag, Point) {
        (SimpleGlyphFlag::empty(), Point(x, y))
    }

    #[test]
    fn iter_simple_glyph_contours() {
        let simple_glyph = simple_glyph_fixture();
        let contours = simple_glyph
            .contours()
            .map(|contour| contour.iter().map(|(_, point)| *point).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let expected = &[&[
            Point(433, 77),
            Point(499, 30),
            Point(625, 2),
            Point(756, -27),
            Point(915, -31),
            Point(891, -47),
            Point(862, -60),
            Point(832, -73),
            Point(819, -103),
        ]];
        assert_eq!(&contours, expected);
    }

    #[test]
    fn iter_points() {
        let points_and_flags = &[on(0, 0), off(10, 40), off(30, 40), on(40, 10)];
        let contour = Contour::new(points_and_flags).unwrap();
        let points = contour.points().collect::<Vec<_>>();
        let expected = &[
            CurvePoint::Control(vec2f(10., 40.)),
            CurvePoint::OnCurve(vec2f(20., 40.)), // mid point
            CurvePoint::Control(vec2f(30., 40.)),
            CurvePoint::OnCurve(vec2f(40., 10.)),
        ];
        assert_eq!(contour.origin(), vec2f(0., 0.));
        assert_eq!(&points, expected);
    }

    #[test]
    fn origin_is_last_point_when_first_is_off_curve() {
        let points_and_flags = &[off(10, 10), on(20, 0), on(0, 0)];
        let contour = Contour::new(points_and_flags).unwrap();

        assert_eq!(contour.origin(), vec2f(0., 0.));
        assert_eq!(
            contour.points().collect::<Vec<_>>(),
            vec![
                CurvePoint::Control(vec2f(10., 10.)),
                CurvePoint::OnCurve(vec2f(20., 0.)),
            ]
        );
    }

    #[test]
    fn all_off_curve_points() {
        let mut visitor = TestVisitor::default();
        glyph(vec![off(0, 10), off(10, 0), off(0, -10), off(-10, 0)]).visit_outline(&mut visitor);

        assert_eq!(
            visitor.commands,
            vec![
                "move_to(-5, 5)",
                "quad_to(0, 10, 5, 5)",
                "quad_to(10, 0, 5, -5)",
                "quad_to(0, -10, -5, -5)",
                "quad_to(-10, 0, -5, 5)",
                "close()",
            ]
        );
    }

    #[test]
    fn visit_fixture() {
        let mut visitor = TestVisitor::default();
        simple_glyph_fixture().visit_outline(&mut visitor);

        assert_eq!(
            visitor.commands,
            vec![
                "move_to(433, 77)",
                "quad_to(499, 30, 625, 2)",
                "quad_to(756, -27, 915, -31)",
                "quad_to(891, -47, 862, -60)",
                "quad_to(832, -73, 819, -103)",
                "close()",
            ]
        );
    }

    // Every segment starts where the previous one ended and the segment start points, with
    // implied mid points removed, are the contour's on-curve points in order.
    #[test]
    fn segments_cover_on_curve_points() {
        let simple_glyph = glyph(vec![
            on(0, 0),
            off(0, 50),
            off(50, 100),
            off(100, 50),
            on(100, 0),
            on(50, -20),
        ]);
        let mut collector = OutlineCollector::new();
        simple_glyph.visit_outline(&mut collector);
        let outline = collector.finish();

        assert_eq!(outline.contours.len(), 1);
        let contour = &outline.contours[0];
        assert!(contour.is_closed());
        let implied = [vec2f(25., 75.), vec2f(75., 75.)];
        let on_curve = contour
            .on_curve_points()
            .filter(|point| !implied.contains(point))
            .collect::<Vec<_>>();
        assert_eq!(
            on_curve,
            vec![vec2f(0., 0.), vec2f(100., 0.), vec2f(50., -20.)]
        );
        assert_eq!(contour.segments.len(), 5);
    }

    #[test]
    fn outlines() {
        let rect = crate::tests::rectangle_glyph(0, 0, 10, 20);
        let loca = crate::tables::loca::LocaTable {
            offsets: vec![0, 0, rect.len() as u32],
        };
        let mut glyf = crate::binary::read::ReadScope::new(&rect)
            .read_dep::<GlyfTable>((&loca, 2))
            .unwrap();
        let mut visitor = TestVisitor::default();
        glyf.visit(1, &mut visitor)
            .expect("error visiting glyph outline");

        assert_eq!(visitor.commands.first().unwrap(), "move_to(0, 0)");
        assert_eq!(visitor.commands.last().unwrap(), "close()");
        assert_eq!(visitor.commands.len(), 5);
        assert_eq!(glyf.visit(2, &mut visitor), Err(ParseError::BadIndex));

        let outline = glyf.get(1).unwrap().build_outline().unwrap();
        assert_eq!(
            outline.bounding_box,
            BoundingBox {
                x_min: 0.,
                x_max: 10.,
                y_min: 0.,
                y_max: 20.
            }
        );
        assert_eq!(outline.contours[0].segments.len(), 4);
        let empty = glyf.get(0).unwrap().build_outline().unwrap();
        assert!(empty.contours.is_empty());
    }
}
