#[allow(dead_code)]
mod common;

use ttf_raster::bitmap::{Bitmap, BLACK, WHITE};
use ttf_raster::error::RasterError;
use ttf_raster::outline::OutlineSink;
use ttf_raster::pathfinder_geometry::vector::Vector2F;
use ttf_raster::raster::{self, RasterConfig, RasterMode};
use ttf_raster::Font;

use crate::common::{sample_font, GLYPH_A, GLYPH_B};

fn load_sample() -> Font {
    Font::new(sample_font().into_boxed_slice()).expect("unable to load sample font")
}

#[test]
fn render_a_at_12pt_96dpi() {
    let mut font = load_sample();
    font.raster_init(12, 96, RasterMode::Plain).unwrap();
    assert_eq!(font.ppem(), 16);

    let glyph_index = font.get_glyph_index(u32::from('A')).unwrap();
    assert_eq!(glyph_index, GLYPH_A);
    font.scale_glyph(glyph_index).unwrap();
    let bounds = raster::pixel_bounds(
        font.get_glyph(glyph_index)
            .unwrap()
            .outline
            .as_ref()
            .unwrap(),
    );
    let bitmap = font.render_glyph(glyph_index).unwrap();

    assert_eq!(
        bitmap.width() as i32,
        bounds.x_max - bounds.x_min + 1
    );
    assert_eq!(
        bitmap.height() as i32,
        bounds.y_max - bounds.y_min + 1
    );
    assert_eq!((bitmap.width(), bitmap.height()), (17, 17));

    // The bounding box includes the off-curve points, which the curve does not reach
    assert!(bitmap.rows().next().unwrap().iter().all(|&p| p == WHITE));
    // Bottom row: filled from x = 0 up to the right edge at x = 16
    let bottom = bitmap.rows().last().unwrap();
    assert!(bottom[..16].iter().all(|&p| p == BLACK));
    assert_eq!(bottom[16], WHITE);
}

#[test]
fn oversampled_rectangle_edges() {
    let mut font = load_sample();
    font.raster_init_with(RasterConfig {
        mode: RasterMode::Oversampled,
        ..RasterConfig::default()
    })
    .unwrap();

    // B spans y = 0 to 11.203125. Of the bottom row's samples at y = 0 and y = -0.5 only the
    // first is inside the outline.
    let bitmap = font.render_glyph(GLYPH_B).unwrap();
    let middle = bitmap.rows().nth(5).unwrap();
    let bottom = bitmap.rows().last().unwrap();
    assert_eq!(middle[0], WHITE);
    assert_eq!(middle[1], BLACK);
    assert_eq!(middle[8], BLACK);
    assert_eq!(bottom[0], WHITE);
    assert_eq!(bottom[1], 0x7F7F7F);
    assert_eq!(bottom[8], 0x7F7F7F);
}

#[test]
fn changing_mode_rerenders() {
    let mut font = load_sample();
    font.raster_init(12, 96, RasterMode::Plain).unwrap();
    let plain = font.render_glyph(GLYPH_B).unwrap().clone();
    font.raster_init(12, 96, RasterMode::Oversampled).unwrap();
    let oversampled = font.render_glyph(GLYPH_B).unwrap().clone();

    assert_eq!(
        (plain.width(), plain.height()),
        (oversampled.width(), oversampled.height())
    );
    assert_ne!(plain, oversampled);
}

#[test]
fn draw_before_init() {
    let mut font = load_sample();
    let mut canvas = Bitmap::new(10, 10, WHITE).unwrap();

    assert_eq!(
        font.draw_string(&mut canvas, 0, 9, "A"),
        Err(RasterError::NotInitialized)
    );
    assert_eq!(font.render_glyph(GLYPH_A), Err(RasterError::NotInitialized));
}

#[derive(Default)]
struct Counter {
    moves: usize,
    lines: usize,
    curves: usize,
    closes: usize,
}

impl OutlineSink for Counter {
    fn move_to(&mut self, _to: Vector2F) {
        self.moves += 1;
    }

    fn line_to(&mut self, _to: Vector2F) {
        self.lines += 1;
    }

    fn quadratic_curve_to(&mut self, _ctrl: Vector2F, _to: Vector2F) {
        self.curves += 1;
    }

    fn close(&mut self) {
        self.closes += 1;
    }
}

#[test]
fn visit_glyph_outline() {
    let font = load_sample();
    let glyph = font.get_glyph(GLYPH_A).unwrap().simple().unwrap();
    let mut counter = Counter::default();
    glyph.visit_outline(&mut counter);

    assert_eq!(counter.moves, 1);
    assert_eq!(counter.lines, 1);
    // The two off-curve points are split by their implied midpoint
    assert_eq!(counter.curves, 2);
    assert_eq!(counter.closes, 1);
}
