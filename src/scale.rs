//! Mapping outlines from font units to pixels.

use pathfinder_geometry::vector::{vec2f, Vector2F};

use crate::outline::Outline;

/// Number of subdivisions of a pixel that scaled coordinates snap to.
pub const SUBPIXELS: f32 = 64.;

/// Pixels per em for a point size at a given resolution.
pub fn ppem(point: u16, dpi: u16) -> u32 {
    u32::from(point) * u32::from(dpi) / 72
}

/// Round to the nearest 1/64th of a pixel.
pub fn round_to_subpixel(value: f32) -> f32 {
    (value * SUBPIXELS).round() / SUBPIXELS
}

/// Convert a font unit value to pixels, snapped to the 1/64 pixel grid.
///
/// ```
/// use ttf_raster::scale::funit_to_pixel;
///
/// assert_eq!(funit_to_pixel(1024., 16, 2048), 8.);
/// assert_eq!(funit_to_pixel(-100., 16, 2048), -0.78125);
/// ```
pub fn funit_to_pixel(value: f32, ppem: u32, units_per_em: u16) -> f32 {
    // NOTE(cast): ppem is derived from u16 point size and dpi
    round_to_subpixel(value * ppem as f32 / f32::from(units_per_em))
}

/// Scale a font unit outline to pixels, stamping it with `point`.
///
/// Every segment point and the bounding box are converted with `funit_to_pixel`.
pub fn scale_outline(outline: &Outline, point: i32, ppem: u32, units_per_em: u16) -> Outline {
    let to_pixel = |v: Vector2F| {
        vec2f(
            funit_to_pixel(v.x(), ppem, units_per_em),
            funit_to_pixel(v.y(), ppem, units_per_em),
        )
    };
    let mut scaled = outline.map_points(to_pixel);
    scaled.point = point;
    scaled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::{OutlineCollector, OutlineSink, Segment, UNSCALED};
    use crate::tables::glyf::BoundingBox;

    #[test]
    fn test_ppem() {
        assert_eq!(ppem(12, 96), 16);
        assert_eq!(ppem(12, 72), 12);
        assert_eq!(ppem(10, 100), 13);
    }

    #[test]
    fn test_round_to_subpixel() {
        assert_eq!(round_to_subpixel(0.5), 0.5);
        assert_eq!(round_to_subpixel(0.005), 0.0);
        assert_eq!(round_to_subpixel(0.012), 0.015625);
        assert_eq!(round_to_subpixel(-1.99), -1.984375);
    }

    #[test]
    fn test_scale_outline() {
        let mut collector = OutlineCollector::new();
        collector.move_to(vec2f(0., 0.));
        collector.line_to(vec2f(1000., 0.));
        collector.quadratic_curve_to(vec2f(1000., 700.), vec2f(0., 700.));
        collector.close();
        let outline = collector.finish();
        assert_eq!(outline.point, UNSCALED);

        // 16 ppem at 1000 upem
        let scaled = scale_outline(&outline, 12, 16, 1000);

        assert_eq!(scaled.point, 12);
        assert!(scaled.is_scaled());
        assert_eq!(
            scaled.contours[0].segments[1],
            Segment::Curve(vec2f(16., 0.), vec2f(16., 11.203125), vec2f(0., 11.203125))
        );
        assert_eq!(
            scaled.bounding_box,
            BoundingBox {
                x_min: 0.,
                x_max: 16.,
                y_min: 0.,
                y_max: 11.203125,
            }
        );
    }

    #[test]
    fn test_scale_is_deterministic() {
        let mut collector = OutlineCollector::new();
        collector.move_to(vec2f(-37., 13.));
        collector.line_to(vec2f(1511., -211.));
        collector.line_to(vec2f(733., 1479.));
        collector.close();
        let outline = collector.finish();

        assert_eq!(
            scale_outline(&outline, 12, 16, 2048),
            scale_outline(&outline, 12, 16, 2048)
        );
    }
}
