//! A loaded TrueType font and the glyph rendering pipeline built on top of it.
//!
//! Loading decodes every table the crate understands. The tables that others depend on
//! (`head`, `hhea`, `maxp`, `post` and `loca`) are decoded first and must be present and valid.
//! The remaining tables are decoded in directory order and a failure in one of them is logged
//! and leaves that table undecoded.
//!
//! Rendering is driven by the rasterizer state set with `raster_init`:
//!
//! ```no_run
//! use ttf_raster::bitmap::{Bitmap, WHITE};
//! use ttf_raster::raster::RasterMode;
//! use ttf_raster::Font;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut font = Font::open("Vera.ttf")?;
//! font.raster_init(12, 96, RasterMode::Oversampled)?;
//!
//! let mut canvas = Bitmap::new(200, 40, WHITE)?;
//! font.draw_string(&mut canvas, 4, 30, "Hello")?;
//! # Ok(())
//! # }
//! ```

use std::num::Wrapping;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder};
use log::{debug, warn};

use crate::binary::read::ReadScope;
use crate::bitmap::Bitmap;
use crate::checksum::{self, ChecksumMismatch};
use crate::error::{FontError, ParseError, RasterError};
use crate::outline::UNSCALED;
use crate::post::PostTable;
use crate::raster::{self, RasterConfig, RasterMode};
use crate::scale;
use crate::tables::cmap::CmapTable;
use crate::tables::glyf::{GlyfTable, Glyph};
use crate::tables::loca::LocaTable;
use crate::tables::{
    CvtTable, HeadTable, HheaTable, HmtxTable, MaxpTable, OffsetTable, Table, TableData,
    TableRecord,
};
use crate::tag::{self, DisplayTag};

/// Tables decoded before all others, in this order.
const REQUIRED_TABLES: [u32; 5] = [tag::HEAD, tag::HHEA, tag::MAXP, tag::POST, tag::LOCA];

/// Offset of `checkSumAdjustment` within `head`.
const CHECKSUM_ADJUSTMENT_OFFSET: usize = 8;

/// Find the decoded payload of a table by its `TableData` variant.
macro_rules! find_table {
    ($tables:expr, $variant:ident) => {
        $tables.iter().find_map(|table| match &table.data {
            Some(TableData::$variant(data)) => Some(data),
            _ => None,
        })
    };
}

pub struct Font {
    data: Box<[u8]>,
    offset_table: OffsetTable,
    tables: Vec<Table>,
    /// Point size set by `raster_init`, `UNSCALED` until then.
    point: i32,
    dpi: u16,
    ppem: u32,
    units_per_em: u16,
    mode: RasterMode,
}

impl Font {
    /// Load a font from its file contents.
    pub fn new(data: Box<[u8]>) -> Result<Font, ParseError> {
        let scope = ReadScope::new(&data);
        let offset_table = scope.read::<OffsetTable>()?;
        debug!(
            "font directory has {} tables",
            offset_table.table_records.len()
        );
        for mismatch in checksum_mismatches(&scope, &offset_table) {
            warn!("{}", mismatch);
        }
        let tables = load_tables(&scope, &offset_table)?;

        Ok(Font {
            data,
            offset_table,
            tables,
            point: UNSCALED,
            dpi: 0,
            ppem: 0,
            units_per_em: 0,
            mode: RasterMode::default(),
        })
    }

    /// Read and load the font file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Font, FontError> {
        let data = std::fs::read(path)?;
        Ok(Font::new(data.into_boxed_slice())?)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn offset_table(&self) -> &OffsetTable {
        &self.offset_table
    }

    /// All tables listed in the font directory, in directory order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, tag: u32) -> Option<&Table> {
        self.tables.iter().find(|table| table.tag() == tag)
    }

    /// Look up a table by its name, such as `"glyf"`. Names shorter than four characters are
    /// padded with spaces.
    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.table(tag::from_string(name).ok()?)
    }

    /// Recompute the checksum of every table and return those that differ from the directory.
    pub fn validate_checksums(&self) -> Vec<ChecksumMismatch> {
        checksum_mismatches(&ReadScope::new(&self.data), &self.offset_table)
    }

    pub fn head(&self) -> Option<&HeadTable> {
        find_table!(self.tables, Head)
    }

    pub fn hhea(&self) -> Option<&HheaTable> {
        find_table!(self.tables, Hhea)
    }

    pub fn hmtx(&self) -> Option<&HmtxTable> {
        find_table!(self.tables, Hmtx)
    }

    pub fn maxp(&self) -> Option<&MaxpTable> {
        find_table!(self.tables, Maxp)
    }

    pub fn loca(&self) -> Option<&LocaTable> {
        find_table!(self.tables, Loca)
    }

    pub fn glyf(&self) -> Option<&GlyfTable> {
        find_table!(self.tables, Glyf)
    }

    pub fn cmap(&self) -> Option<&CmapTable> {
        find_table!(self.tables, Cmap)
    }

    pub fn cvt(&self) -> Option<&CvtTable> {
        find_table!(self.tables, Cvt)
    }

    pub fn post(&self) -> Option<&PostTable> {
        find_table!(self.tables, Post)
    }

    fn glyf_mut(&mut self) -> Option<&mut GlyfTable> {
        self.tables.iter_mut().find_map(|table| match &mut table.data {
            Some(TableData::Glyf(glyf)) => Some(glyf),
            _ => None,
        })
    }

    pub fn num_glyphs(&self) -> u16 {
        self.maxp().map_or(0, |maxp| maxp.num_glyphs)
    }

    /// The PostScript name of a glyph, if the `post` table provides one.
    pub fn glyph_name(&self, glyph_index: u16) -> Option<&str> {
        self.post()?.glyph_name(glyph_index)
    }

    /// Set the point size, resolution and render mode used for scaling and rendering.
    ///
    /// Scaled outlines and rendered bitmaps from earlier settings are discarded.
    pub fn raster_init(&mut self, point: u16, dpi: u16, mode: RasterMode) -> Result<(), RasterError> {
        self.raster_init_with(RasterConfig { point, dpi, mode })
    }

    pub fn raster_init_with(&mut self, config: RasterConfig) -> Result<(), RasterError> {
        let units_per_em = self
            .head()
            .ok_or(ParseError::MissingTable(tag::HEAD))?
            .units_per_em;
        self.point = i32::from(config.point);
        self.dpi = config.dpi;
        self.ppem = config.ppem();
        self.units_per_em = units_per_em;
        self.mode = config.mode;
        if let Some(glyf) = self.glyf_mut() {
            glyf.glyphs.iter_mut().for_each(Glyph::clear_cache);
        }
        debug!(
            "rasterizer initialized: {}pt at {}dpi, {} ppem, {} upem",
            config.point, config.dpi, self.ppem, units_per_em
        );
        Ok(())
    }

    /// The rasterizer settings, or `None` if `raster_init` has not been called.
    pub fn raster_config(&self) -> Option<RasterConfig> {
        let point = u16::try_from(self.point).ok()?;
        Some(RasterConfig {
            point,
            dpi: self.dpi,
            mode: self.mode,
        })
    }

    pub fn ppem(&self) -> u32 {
        self.ppem
    }

    /// Map a character code to a glyph index using the `cmap` table.
    ///
    /// Returns `None` when the font has no usable `cmap` or the character is not mapped.
    pub fn get_glyph_index(&self, ch: u32) -> Option<u16> {
        self.cmap()?
            .map_glyph(ch)
            .filter(|&glyph_index| glyph_index < self.num_glyphs())
    }

    pub fn get_glyph(&self, glyph_index: u16) -> Option<&Glyph> {
        self.glyf()?.get(glyph_index)
    }

    fn glyph_mut(&mut self, glyph_index: u16) -> Result<&mut Glyph, ParseError> {
        self.glyf_mut()
            .ok_or(ParseError::MissingTable(tag::GLYF))?
            .get_mut(glyph_index)
            .ok_or(ParseError::BadIndex)
    }

    /// Scale the outline of a glyph to the current point size.
    ///
    /// Does nothing if the glyph is already scaled to this size. Otherwise the outline is
    /// rebuilt from the glyph's points and any rendered bitmap is discarded.
    pub fn scale_glyph(&mut self, glyph_index: u16) -> Result<(), RasterError> {
        if self.point < 0 {
            return Err(RasterError::NotInitialized);
        }
        let (point, ppem, units_per_em) = (self.point, self.ppem, self.units_per_em);
        let glyph = self.glyph_mut(glyph_index)?;
        if glyph
            .outline
            .as_ref()
            .map_or(false, |outline| outline.point == point)
        {
            return Ok(());
        }

        let outline = glyph.build_outline().ok_or(RasterError::NoOutline)?;
        glyph.clear_cache();
        glyph.outline = Some(scale::scale_outline(&outline, point, ppem, units_per_em));
        Ok(())
    }

    /// Scale and render a glyph, caching the bitmap on the glyph.
    pub fn render_glyph(&mut self, glyph_index: u16) -> Result<&Bitmap, RasterError> {
        self.scale_glyph(glyph_index)?;
        let mode = self.mode;
        let glyph = self.glyph_mut(glyph_index)?;
        if glyph.bitmap.is_none() {
            let outline = glyph.outline.as_ref().ok_or(RasterError::NotScaled)?;
            glyph.bitmap = Some(raster::render_outline(outline, mode)?);
        }
        glyph.bitmap.as_ref().ok_or(RasterError::NotScaled)
    }

    /// Render a glyph onto `canvas` with its origin on the baseline at (`x`, `y`).
    ///
    /// `y` grows downwards on the canvas. Empty glyphs draw nothing.
    pub fn draw_glyph(
        &mut self,
        canvas: &mut Bitmap,
        glyph_index: u16,
        x: i32,
        y: i32,
    ) -> Result<(), RasterError> {
        if self.get_glyph(glyph_index).map_or(false, Glyph::is_empty) {
            return Ok(());
        }
        self.render_glyph(glyph_index)?;

        let glyph = self.get_glyph(glyph_index).ok_or(ParseError::BadIndex)?;
        match (&glyph.outline, &glyph.bitmap) {
            (Some(outline), Some(bitmap)) => {
                let bounds = raster::pixel_bounds(outline);
                canvas.draw_bitmap(bitmap, x + bounds.x_min, y - bounds.y_max)
            }
            _ => Err(RasterError::NotScaled),
        }
    }

    /// Draw `text` onto `canvas`, starting with the pen on the baseline at (`x`, `y`).
    ///
    /// Characters without a glyph are skipped with a warning. So are glyphs without an outline,
    /// glyphs whose origin falls outside the canvas, and glyphs in a font with no `glyf` table.
    /// The pen still advances past glyphs that could not be drawn, and stays put when the font
    /// has no `hmtx` table.
    pub fn draw_string(
        &mut self,
        canvas: &mut Bitmap,
        x: i32,
        y: i32,
        text: &str,
    ) -> Result<(), RasterError> {
        if self.point < 0 {
            return Err(RasterError::NotInitialized);
        }

        // NOTE(cast): canvas coordinates are well within the exact range of f32
        let mut pen = x as f32;
        for ch in text.chars() {
            let glyph_index = match self.get_glyph_index(u32::from(ch)) {
                Some(glyph_index) => glyph_index,
                None => {
                    warn!("no glyph for {:?}, skipping", ch);
                    continue;
                }
            };

            // NOTE(cast): as above
            match self.draw_glyph(canvas, glyph_index, pen.floor() as i32, y) {
                Ok(()) => {}
                Err(
                    err @ (RasterError::OutOfBounds
                    | RasterError::NoOutline
                    | RasterError::Parse(ParseError::MissingTable(_))),
                ) => {
                    warn!("unable to draw {:?} (glyph {}): {}", ch, glyph_index, err)
                }
                Err(err) => return Err(err),
            }
            match self.advance_width(glyph_index) {
                Ok(advance) => pen += advance,
                Err(err @ RasterError::Parse(ParseError::MissingTable(_))) => {
                    warn!("no advance for {:?} (glyph {}): {}", ch, glyph_index, err)
                }
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }

    /// The width in pixels of `text` at the current point size.
    ///
    /// Characters without a glyph do not contribute to the width.
    pub fn text_width(&self, text: &str) -> Result<i32, RasterError> {
        if self.point < 0 {
            return Err(RasterError::NotInitialized);
        }

        let mut width = 0.;
        for glyph_index in text
            .chars()
            .filter_map(|ch| self.get_glyph_index(u32::from(ch)))
        {
            width += self.advance_width(glyph_index)?;
        }

        // NOTE(cast): rounded pixel widths fit in i32
        Ok(width.round() as i32)
    }

    /// The advance width of a glyph in pixels at the current point size.
    pub fn advance_width(&self, glyph_index: u16) -> Result<f32, RasterError> {
        let hmtx = self.hmtx().ok_or(ParseError::MissingTable(tag::HMTX))?;
        let advance = hmtx.horizontal_advance(glyph_index)?;
        Ok(scale::funit_to_pixel(
            f32::from(advance),
            self.ppem,
            self.units_per_em,
        ))
    }
}

/// Decode the tables of the font, required tables first.
fn load_tables(scope: &ReadScope<'_>, offset_table: &OffsetTable) -> Result<Vec<Table>, ParseError> {
    let mut tables = offset_table
        .table_records
        .iter()
        .copied()
        .map(Table::new)
        .collect::<Vec<_>>();

    for tag in REQUIRED_TABLES {
        let index = tables
            .iter()
            .position(|table| table.tag() == tag)
            .ok_or(ParseError::MissingTable(tag))?;
        let table_scope = table_scope(scope, &tables[index].record)?;
        let data = decode_table(table_scope, tag, &tables)?;
        debug!("loaded required table '{}'", DisplayTag(tag));
        tables[index].data = data;
    }

    for index in 0..tables.len() {
        let record = tables[index].record;
        if tables[index].data.is_some() || REQUIRED_TABLES.contains(&record.table_tag) {
            continue;
        }
        let data = table_scope(scope, &record)
            .and_then(|table_scope| decode_table(table_scope, record.table_tag, &tables));
        match data {
            Ok(Some(data)) => {
                debug!("loaded table {}", record);
                tables[index].data = Some(data);
            }
            Ok(None) => debug!("skipping table {}", record),
            Err(err) => warn!("unable to load table {}: {}", record, err),
        }
    }

    Ok(tables)
}

fn table_scope<'a>(scope: &ReadScope<'a>, record: &TableRecord) -> Result<ReadScope<'a>, ParseError> {
    record
        .read_table(scope)
        .map_err(|_| ParseError::BadHeader)
}

/// Decode one table. Tables the crate has no decoder for yield `None`.
///
/// `tables` supplies the already decoded tables this one depends on.
fn decode_table<'a>(
    scope: ReadScope<'a>,
    tag: u32,
    tables: &'a [Table],
) -> Result<Option<TableData>, ParseError> {
    let num_glyphs = || {
        find_table!(tables, Maxp)
            .map(|maxp| maxp.num_glyphs)
            .ok_or(ParseError::MissingTable(tag::MAXP))
    };

    let data = match tag {
        tag::HEAD => TableData::Head(scope.read::<HeadTable>()?),
        tag::HHEA => TableData::Hhea(scope.read::<HheaTable>()?),
        tag::MAXP => TableData::Maxp(scope.read::<MaxpTable>()?),
        tag::POST => TableData::Post(scope.read_dep::<PostTable>(num_glyphs()?)?),
        tag::LOCA => {
            let head = find_table!(tables, Head).ok_or(ParseError::MissingTable(tag::HEAD))?;
            TableData::Loca(scope.read_dep::<LocaTable>((num_glyphs()?, head.loca_format()?))?)
        }
        tag::GLYF => {
            let loca = find_table!(tables, Loca).ok_or(ParseError::MissingTable(tag::LOCA))?;
            TableData::Glyf(scope.read_dep::<GlyfTable>((loca, num_glyphs()?))?)
        }
        tag::CMAP => TableData::Cmap(scope.read_dep::<CmapTable>(num_glyphs()?)?),
        tag::CVT => TableData::Cvt(scope.read::<CvtTable>()?),
        tag::HMTX => {
            let hhea = find_table!(tables, Hhea).ok_or(ParseError::MissingTable(tag::HHEA))?;
            TableData::Hmtx(scope.read_dep::<HmtxTable>((
                usize::from(num_glyphs()?),
                usize::from(hhea.num_h_metrics),
            ))?)
        }
        _ => return Ok(None),
    };

    Ok(Some(data))
}

/// Tables whose data does not sum to the checksum recorded in the directory.
///
/// The `head` checksum is computed without its `checkSumAdjustment` field, which is set after
/// the table checksums are calculated. Tables that lie outside the file are not checked.
fn checksum_mismatches(scope: &ReadScope<'_>, offset_table: &OffsetTable) -> Vec<ChecksumMismatch> {
    offset_table
        .table_records
        .iter()
        .filter_map(|record| {
            let data = record.read_table(scope).ok()?.data();
            let mut sum = checksum::table_checksum(data);
            if record.table_tag == tag::HEAD {
                if let Some(adjustment) =
                    data.get(CHECKSUM_ADJUSTMENT_OFFSET..CHECKSUM_ADJUSTMENT_OFFSET + 4)
                {
                    sum -= Wrapping(BigEndian::read_u32(adjustment));
                }
            }
            (sum.0 != record.checksum).then(|| ChecksumMismatch {
                tag: record.table_tag,
                recorded: record.checksum,
                computed: sum.0,
            })
        })
        .collect()
}
