// Builders for the synthetic fonts the tests load. No font binaries are shipped with the
// crate so every fixture is assembled from its big-endian table layouts.

/// Units per em of `sample_font`.
pub const SAMPLE_UNITS_PER_EM: u16 = 1000;

/// Glyph indices of `sample_font`.
pub const GLYPH_A: u16 = 1;
pub const GLYPH_B: u16 = 2;
pub const GLYPH_SPACE: u16 = 3;
pub const GLYPH_COMPOUND: u16 = 4;

use self::writer::{write_ttf, TtfType::*};

pub mod writer {
    //! Testing utilities.
    //!
    #![allow(dead_code)]

    // The writer module is derived from ttf-parser, licenced under Apache-2.0.
    // https://github.com/RazrFalcon/ttf-parser/blob/439aaaebd50eb8aed66302e3c1b51fae047f85b2/src/writer.rs

    #[allow(missing_debug_implementations)]
    #[derive(Clone)]
    pub enum TtfType {
        Raw(Vec<u8>),
        Tag(&'static [u8; 4]),
        Int8(i8),
        UInt8(u8),
        Int16(i16),
        UInt16(u16),
        Int32(i32),
        UInt32(u32),
        Int64(i64),
    }

    /// Convert `values` to their big-endian representation.
    pub fn write_ttf(values: Vec<TtfType>) -> Vec<u8> {
        let mut data = Vec::with_capacity(256);
        for value in values {
            write_type(value, &mut data);
        }

        data
    }

    pub fn write_type(value: TtfType, data: &mut Vec<u8>) {
        match value {
            TtfType::Raw(bytes) => data.extend_from_slice(&bytes),
            TtfType::Tag(tag) => data.extend_from_slice(tag),
            TtfType::Int8(n) => data.extend_from_slice(&i8::to_be_bytes(n)),
            TtfType::UInt8(n) => data.push(n),
            TtfType::Int16(n) => data.extend_from_slice(&i16::to_be_bytes(n)),
            TtfType::UInt16(n) => data.extend_from_slice(&u16::to_be_bytes(n)),
            TtfType::Int32(n) => data.extend_from_slice(&i32::to_be_bytes(n)),
            TtfType::UInt32(n) => data.extend_from_slice(&u32::to_be_bytes(n)),
            TtfType::Int64(n) => data.extend_from_slice(&i64::to_be_bytes(n)),
        }
    }
}

/// Sum of the big-endian words of `data`, zero padded to a multiple of four bytes.
pub fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Assemble a TrueType file from `tables`, which are laid out in the order given, each
/// padded to a four byte boundary and recorded with its correct checksum.
pub fn sfnt(tables: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let entry_selector = (0..16).rev().find(|&n| 1 << n <= num_tables).unwrap_or(0);
    let search_range = (1 << entry_selector) * 16;

    let mut values = vec![
        UInt32(0x00010000),
        UInt16(num_tables),
        UInt16(search_range),
        UInt16(entry_selector),
        UInt16(num_tables * 16 - search_range),
    ];

    let mut offset = 12 + 16 * tables.len();
    for &(tag, ref data) in tables {
        values.extend([
            Raw(tag.to_vec()),
            UInt32(checksum(data)),
            UInt32(offset as u32),
            UInt32(data.len() as u32),
        ]);
        offset += (data.len() + 3) & !3;
    }
    for (_, data) in tables {
        let padding = ((data.len() + 3) & !3) - data.len();
        values.push(Raw(data.clone()));
        values.push(Raw(vec![0; padding]));
    }

    write_ttf(values)
}

/// A `head` table with the given units per em and loca format, with a zero checksum
/// adjustment.
pub fn head(units_per_em: u16, index_to_loc_format: i16) -> Vec<u8> {
    write_ttf(vec![
        UInt16(1), // major version
        UInt16(0),
        UInt32(0x00010000), // font revision
        UInt32(0),          // checksum adjustment
        UInt32(0x5F0F3CF5), // magic
        UInt16(0),          // flags
        UInt16(units_per_em),
        Int64(0), // created
        Int64(0), // modified
        Int16(0),
        Int16(0),
        Int16(1000),
        Int16(1000),
        UInt16(0), // mac style
        UInt16(8), // lowest rec ppem
        Int16(2),
        Int16(index_to_loc_format),
        Int16(0), // glyph data format
    ])
}

pub fn hhea(num_h_metrics: u16) -> Vec<u8> {
    write_ttf(vec![
        UInt16(1),
        UInt16(0),
        Int16(800),  // ascender
        Int16(-200), // descender
        Int16(0),
        UInt16(1000), // advance width max
        Int16(0),
        Int16(0),
        Int16(1000),
        Int16(1), // caret slope rise
        Int16(0),
        Int16(0),
        Raw(vec![0; 8]),
        Int16(0), // metric data format
        UInt16(num_h_metrics),
    ])
}

/// A version 0.5 `maxp` table.
pub fn maxp(num_glyphs: u16) -> Vec<u8> {
    write_ttf(vec![UInt32(0x00005000), UInt16(num_glyphs)])
}

/// A `post` table header of `version` with no glyph name data.
pub fn post(version: u32) -> Vec<u8> {
    write_ttf(vec![
        UInt32(version),
        UInt32(0),   // italic angle
        Int16(-100), // underline position
        Int16(50),   // underline thickness
        UInt32(0),   // is fixed pitch
        UInt32(0),
        UInt32(0),
        UInt32(0),
        UInt32(0),
    ])
}

pub fn hmtx(metrics: &[(u16, i16)]) -> Vec<u8> {
    write_ttf(
        metrics
            .iter()
            .flat_map(|&(advance, lsb)| [UInt16(advance), Int16(lsb)])
            .collect(),
    )
}

pub fn long_loca(offsets: &[u32]) -> Vec<u8> {
    write_ttf(offsets.iter().map(|&offset| UInt32(offset)).collect())
}

/// A single contour simple glyph. Points are `(x, y, on_curve)` and every coordinate is
/// stored as a 16-bit delta.
pub fn simple_glyph(bbox: [i16; 4], points: &[(i16, i16, bool)]) -> Vec<u8> {
    let mut values = vec![
        Int16(1), // number of contours
        Int16(bbox[0]),
        Int16(bbox[1]),
        Int16(bbox[2]),
        Int16(bbox[3]),
        UInt16(points.len() as u16 - 1),
        UInt16(0), // instruction length
    ];
    values.extend(points.iter().map(|&(_, _, on_curve)| UInt8(u8::from(on_curve))));
    let mut prev = 0;
    for &(x, _, _) in points {
        values.push(Int16(x - prev));
        prev = x;
    }
    prev = 0;
    for &(_, y, _) in points {
        values.push(Int16(y - prev));
        prev = y;
    }
    write_ttf(values)
}

/// A rectangle glyph with its corners listed counter-clockwise from (`x0`, `y0`).
pub fn rectangle_glyph(x0: i16, y0: i16, x1: i16, y1: i16) -> Vec<u8> {
    simple_glyph(
        [x0, y0, x1, y1],
        &[(x0, y0, true), (x1, y0, true), (x1, y1, true), (x0, y1, true)],
    )
}

/// A format 4 `cmap` table with one Windows Unicode subtable mapping runs of consecutive
/// characters, given as `(first char, last char, first glyph)`, to consecutive glyphs.
pub fn cmap_format4(ranges: &[(u16, u16, u16)]) -> Vec<u8> {
    let seg_count = ranges.len() as u16 + 1;
    let entry_selector = (0..16).rev().find(|&n| 1 << n <= seg_count).unwrap_or(0);
    let search_range = 2 * (1 << entry_selector);

    let mut values = vec![
        UInt16(0), // version
        UInt16(1), // number of subtables
        UInt16(3), // platform
        UInt16(1), // encoding
        UInt32(12),
        UInt16(4), // format
        UInt16(16 + 8 * seg_count),
        UInt16(0), // language
        UInt16(seg_count * 2),
        UInt16(search_range),
        UInt16(entry_selector),
        UInt16(seg_count * 2 - search_range),
    ];
    values.extend(ranges.iter().map(|&(_, end, _)| UInt16(end)));
    values.extend([UInt16(0xFFFF), UInt16(0)]);
    values.extend(ranges.iter().map(|&(start, _, _)| UInt16(start)));
    values.push(UInt16(0xFFFF));
    values.extend(
        ranges
            .iter()
            .map(|&(start, _, glyph)| UInt16(glyph.wrapping_sub(start))),
    );
    values.push(UInt16(1));
    values.extend((0..seg_count).map(|_| UInt16(0)));

    write_ttf(values)
}

/// Glyph outlines of `sample_font`.
///
/// * 1, 'A': a square with a curved corner, two consecutive off-curve points
/// * 2, 'B': a rectangle
/// * 3, ' ': empty
/// * 4, 'C': a compound glyph
pub fn sample_glyphs() -> Vec<Vec<u8>> {
    let a = simple_glyph(
        [0, 0, 1000, 1000],
        &[
            (0, 0, true),
            (1000, 0, true),
            (1000, 500, false),
            (500, 1000, false),
            (0, 500, true),
        ],
    );
    let b = rectangle_glyph(100, 0, 600, 700);
    let compound = write_ttf(vec![Int16(-1), Int16(0), Int16(0), Int16(10), Int16(10)]);
    vec![Vec::new(), a, b, Vec::new(), compound]
}

/// A complete font of five glyphs at 1000 units per em, see `sample_glyphs`.
///
/// `omit` names tables to leave out of the directory.
pub fn sample_font_without(omit: &[&[u8; 4]]) -> Vec<u8> {
    let glyphs = sample_glyphs();
    let mut glyf = Vec::new();
    let mut offsets = vec![0];
    for glyph in &glyphs {
        glyf.extend_from_slice(glyph);
        offsets.push(glyf.len() as u32);
    }
    let cmap = cmap_format4(&[
        (0x20, 0x20, GLYPH_SPACE),
        (0x41, 0x42, GLYPH_A),
        (0x43, 0x43, GLYPH_COMPOUND),
    ]);
    let metrics = [(500, 0), (1000, 0), (700, 100), (250, 0), (600, 0)];

    let tables: Vec<(&[u8; 4], Vec<u8>)> = vec![
        (b"cmap", cmap),
        (b"glyf", glyf),
        (b"head", head(SAMPLE_UNITS_PER_EM, 1)),
        (b"hhea", hhea(metrics.len() as u16)),
        (b"hmtx", hmtx(&metrics)),
        (b"loca", long_loca(&offsets)),
        (b"maxp", maxp(glyphs.len() as u16)),
        (b"post", post(0x00010000)),
    ];
    let tables = tables
        .into_iter()
        .filter(|(tag, _)| !omit.contains(tag))
        .collect::<Vec<_>>();
    sfnt(&tables)
}

pub fn sample_font() -> Vec<u8> {
    sample_font_without(&[])
}
