//! TrueType font directory and fixed-layout table parsing.

pub mod cmap;
pub mod glyf;
pub mod loca;

use crate::binary::read::{ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, I32Be, U16Be, U32Be};
use crate::error::{ParseError, Unsupported};
use crate::post::PostTable;
use crate::tag::{self, DisplayTag};

use self::cmap::CmapTable;
use self::glyf::GlyfTable;
use self::loca::LocaTable;

use std::convert::TryFrom;
use std::fmt;

/// Magic number identifying TrueType 1.0
///
/// The version number 1.0 as a 16.16 fixed-point value, indicating TrueType glyph data.
pub const TTF_MAGIC: u32 = 0x00010000;

/// Magic number used by Apple for TrueType fonts (`true`)
pub const TRUE_MAGIC: u32 = 0x74727565;

/// Size of the offset subtable that precedes the table directory
pub const OFFSET_TABLE_SIZE: usize = 12;

const HEAD_MAGIC: u32 = 0x5F0F3CF5;

/// 32-bit signed fixed-point number (16.16)
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Fixed(i32);

/// Date represented in number of seconds since 12:00 midnight, January 1, 1904
///
/// The value is represented as a signed 64-bit integer.
type LongDateTime = i64;

/// The size of the offsets in the `loca` table
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexToLocFormat {
    /// Offsets are 16-bit. The actual local offset divided by 2 is stored.
    Short,
    /// Offsets are 32-bit. The actual local offset is stored.
    Long,
}

/// The offset subtable and table directory at the start of a font file
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetTable {
    pub scaler_type: u32,
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
    pub table_records: Vec<TableRecord>,
}

/// An entry in the table directory
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TableRecord {
    pub table_tag: u32,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// `head` table
#[derive(Debug, Clone, PartialEq)]
pub struct HeadTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub font_revision: Fixed,
    pub check_sum_adjustment: u32,
    pub magic_number: u32,
    pub flags: u16,
    pub units_per_em: u16,
    pub created: LongDateTime,
    pub modified: LongDateTime,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: u16,
    pub lowest_rec_ppem: u16,
    pub font_direction_hint: i16,
    /// Raw `indexToLocFormat`. Interpreted by `loca_format` when `loca` is decoded.
    pub index_to_loc_format: i16,
    pub glyph_data_format: i16,
}

/// `hhea` horizontal header table
#[derive(Debug, Clone, PartialEq)]
pub struct HheaTable {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub min_left_side_bearing: i16,
    pub min_right_side_bearing: i16,
    pub x_max_extent: i16,
    pub caret_slope_rise: i16,
    pub caret_slope_run: i16,
    pub caret_offset: i16,
    pub num_h_metrics: u16,
}

/// `hmtx` horizontal metrics table
#[derive(Debug, Clone, PartialEq)]
pub struct HmtxTable {
    pub h_metrics: Vec<LongHorMetric>,
    pub left_side_bearings: Vec<i16>,
}

/// A `longHorMetric` record in the `hmtx` table.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct LongHorMetric {
    pub advance_width: u16,
    pub lsb: i16,
}

/// maxp - Maximum profile
///
/// Fonts with TrueType outlines use version 1.0 of this table, where all fields are present.
/// Version 0.5 only carries `num_glyphs`.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxpTable {
    pub version: Fixed,
    pub num_glyphs: u16,
    /// Extra fields, present if maxp table is version 1.0, absent if version 0.5.
    pub version1_sub_table: Option<MaxpVersion1SubTable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaxpVersion1SubTable {
    /// Maximum points in a non-composite glyph.
    pub max_points: u16,
    /// Maximum contours in a non-composite glyph.
    pub max_contours: u16,
    pub max_composite_points: u16,
    pub max_composite_contours: u16,
    pub max_zones: u16,
    pub max_twilight_points: u16,
    pub max_storage: u16,
    pub max_function_defs: u16,
    pub max_instruction_defs: u16,
    pub max_stack_elements: u16,
    pub max_size_of_instructions: u16,
    pub max_component_elements: u16,
    pub max_component_depth: u16,
}

/// `cvt ` control value table
///
/// A list of FWORD values used by the hinting instructions. They are decoded but not
/// interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvtTable {
    pub control_values: Vec<i16>,
}

/// A table directory entry along with its decoded contents, if any.
#[derive(Debug)]
pub struct Table {
    pub record: TableRecord,
    pub data: Option<TableData>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TableStatus {
    /// The table has not been decoded: its tag is unknown, it is intentionally skipped, or
    /// decoding failed.
    None,
    Loaded,
}

/// Decoded table contents, selected by tag
#[derive(Debug)]
pub enum TableData {
    Cmap(CmapTable),
    Cvt(CvtTable),
    Glyf(GlyfTable),
    Head(HeadTable),
    Hhea(HheaTable),
    Hmtx(HmtxTable),
    Loca(LocaTable),
    Maxp(MaxpTable),
    Post(PostTable),
}

impl ReadBinary for OffsetTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let scaler_type = ctxt.read_u32be().map_err(|_| ParseError::BadHeader)?;
        match scaler_type {
            TTF_MAGIC | TRUE_MAGIC => {}
            _ => return Err(ParseError::BadVersion),
        }
        let mut read_header = || -> Result<_, ParseError> {
            let num_tables = ctxt.read_u16be()?;
            let search_range = ctxt.read_u16be()?;
            let entry_selector = ctxt.read_u16be()?;
            let range_shift = ctxt.read_u16be()?;
            Ok((num_tables, search_range, entry_selector, range_shift))
        };
        let (num_tables, search_range, entry_selector, range_shift) =
            read_header().map_err(|_| ParseError::BadHeader)?;
        if ctxt.position() != OFFSET_TABLE_SIZE {
            return Err(ParseError::BadHeader);
        }
        let table_records = ctxt
            .read_array::<TableRecord>(usize::from(num_tables))
            .map_err(|_| ParseError::BadHeader)?
            .to_vec();

        Ok(OffsetTable {
            scaler_type,
            search_range,
            entry_selector,
            range_shift,
            table_records,
        })
    }
}

impl ReadFrom for TableRecord {
    type ReadType = ((U32Be, U32Be), (U32Be, U32Be));

    fn read_from(((table_tag, checksum), (offset, length)): ((u32, u32), (u32, u32))) -> Self {
        TableRecord {
            table_tag,
            checksum,
            offset,
            length,
        }
    }
}

impl OffsetTable {
    /// Find a table record by tag. The directory is small so this is a linear scan.
    pub fn find_table_record(&self, tag: u32) -> Option<TableRecord> {
        self.table_records
            .iter()
            .find(|table_record| table_record.table_tag == tag)
            .copied()
    }

    pub fn read_table<'a>(
        &self,
        scope: &ReadScope<'a>,
        tag: u32,
    ) -> Result<Option<ReadScope<'a>>, ParseError> {
        if let Some(table_record) = self.find_table_record(tag) {
            let table = table_record.read_table(scope)?;
            Ok(Some(table))
        } else {
            Ok(None)
        }
    }
}

impl TableRecord {
    pub const SIZE: usize = 16;

    pub fn read_table<'a>(&self, scope: &ReadScope<'a>) -> Result<ReadScope<'a>, ParseError> {
        let offset = usize::try_from(self.offset)?;
        let length = usize::try_from(self.length)?;
        scope.offset_length(offset, length)
    }
}

impl fmt::Display for TableRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' at 0x{:x}, {} bytes",
            DisplayTag(self.table_tag),
            self.offset,
            self.length
        )
    }
}

impl ReadBinary for HeadTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let major_version = ctxt.read::<U16Be>()?;
        let minor_version = ctxt.read::<U16Be>()?;
        let font_revision = ctxt.read::<Fixed>()?;
        let check_sum_adjustment = ctxt.read::<U32Be>()?;
        let magic_number = ctxt.read::<U32Be>()?;
        ctxt.check(magic_number == HEAD_MAGIC)?;
        let flags = ctxt.read::<U16Be>()?;
        let units_per_em = ctxt.read::<U16Be>()?;
        // Every funit to pixel conversion divides by this
        ctxt.check(units_per_em != 0)?;
        let created = ctxt.read_i64be()?;
        let modified = ctxt.read_i64be()?;
        let x_min = ctxt.read::<I16Be>()?;
        let y_min = ctxt.read::<I16Be>()?;
        let x_max = ctxt.read::<I16Be>()?;
        let y_max = ctxt.read::<I16Be>()?;
        let mac_style = ctxt.read::<U16Be>()?;
        let lowest_rec_ppem = ctxt.read::<U16Be>()?;
        let font_direction_hint = ctxt.read::<I16Be>()?;
        let index_to_loc_format = ctxt.read::<I16Be>()?;
        let glyph_data_format = ctxt.read::<I16Be>()?;

        Ok(HeadTable {
            major_version,
            minor_version,
            font_revision,
            check_sum_adjustment,
            magic_number,
            flags,
            units_per_em,
            created,
            modified,
            x_min,
            y_min,
            x_max,
            y_max,
            mac_style,
            lowest_rec_ppem,
            font_direction_hint,
            index_to_loc_format,
            glyph_data_format,
        })
    }
}

impl HeadTable {
    /// The `loca` offset size, or an error naming the unrecognised format.
    pub fn loca_format(&self) -> Result<IndexToLocFormat, ParseError> {
        match self.index_to_loc_format {
            0 => Ok(IndexToLocFormat::Short),
            1 => Ok(IndexToLocFormat::Long),
            other => Err(ParseError::UnsupportedFormat(Unsupported::LocaFormat(other))),
        }
    }

    pub fn is_bold(&self) -> bool {
        self.mac_style & 1 != 0
    }

    pub fn is_italic(&self) -> bool {
        self.mac_style & 2 != 0
    }
}

impl ReadBinary for HheaTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let major_version = ctxt.read_u16be()?;
        let _minor_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let ascender = ctxt.read_i16be()?;
        let descender = ctxt.read_i16be()?;
        let line_gap = ctxt.read_i16be()?;
        let advance_width_max = ctxt.read_u16be()?;
        let min_left_side_bearing = ctxt.read_i16be()?;
        let min_right_side_bearing = ctxt.read_i16be()?;
        let x_max_extent = ctxt.read_i16be()?;
        let caret_slope_rise = ctxt.read_i16be()?;
        let caret_slope_run = ctxt.read_i16be()?;
        let caret_offset = ctxt.read_i16be()?;
        let _reserved = ctxt.read_array::<I16Be>(4)?;
        let metric_data_format = ctxt.read_i16be()?;
        ctxt.check(metric_data_format == 0)?;
        let num_h_metrics = ctxt.read_u16be()?;

        Ok(HheaTable {
            ascender,
            descender,
            line_gap,
            advance_width_max,
            min_left_side_bearing,
            min_right_side_bearing,
            x_max_extent,
            caret_slope_rise,
            caret_slope_run,
            caret_offset,
            num_h_metrics,
        })
    }
}

impl ReadBinaryDep for HmtxTable {
    type Args<'a> = (usize, usize); // num_glyphs, num_h_metrics
    type HostType<'a> = Self;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (num_glyphs, num_h_metrics): (usize, usize),
    ) -> Result<Self, ParseError> {
        let h_metrics = ctxt.read_array::<LongHorMetric>(num_h_metrics)?;
        let left_side_bearings =
            ctxt.read_array::<I16Be>(num_glyphs.saturating_sub(num_h_metrics))?;
        Ok(HmtxTable {
            h_metrics: h_metrics.to_vec(),
            left_side_bearings: left_side_bearings.to_vec(),
        })
    }
}

impl HmtxTable {
    /// Advance width of `glyph_id` in font units.
    ///
    /// Glyphs past the last long metric share its advance width.
    pub fn horizontal_advance(&self, glyph_id: u16) -> Result<u16, ParseError> {
        let index = usize::from(glyph_id).min(
            self.h_metrics
                .len()
                .checked_sub(1)
                .ok_or(ParseError::BadIndex)?,
        );

        self.h_metrics
            .get(index)
            .map(|long_hor_metric| long_hor_metric.advance_width)
            .ok_or(ParseError::BadIndex)
    }

    pub fn left_side_bearing(&self, glyph_id: u16) -> Result<i16, ParseError> {
        let index = usize::from(glyph_id);
        match self.h_metrics.get(index) {
            Some(metric) => Ok(metric.lsb),
            None => self
                .left_side_bearings
                .get(index - self.h_metrics.len())
                .copied()
                .ok_or(ParseError::BadIndex),
        }
    }
}

impl ReadFrom for LongHorMetric {
    type ReadType = (U16Be, I16Be);

    fn read_from((advance_width, lsb): (u16, i16)) -> Self {
        LongHorMetric { advance_width, lsb }
    }
}

impl ReadBinary for MaxpTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let version = ctxt.read::<Fixed>()?;
        let num_glyphs = ctxt.read_u16be()?;
        let sub_table = if version == Fixed(0x00010000) {
            Some(ctxt.read::<MaxpVersion1SubTable>()?)
        } else {
            None
        };
        Ok(MaxpTable {
            version,
            num_glyphs,
            version1_sub_table: sub_table,
        })
    }
}

impl ReadBinary for MaxpVersion1SubTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let fields = ctxt.read_array::<U16Be>(13)?;
        let field = |index| fields.read_item(index);

        Ok(MaxpVersion1SubTable {
            max_points: field(0)?,
            max_contours: field(1)?,
            max_composite_points: field(2)?,
            max_composite_contours: field(3)?,
            max_zones: field(4)?,
            max_twilight_points: field(5)?,
            max_storage: field(6)?,
            max_function_defs: field(7)?,
            max_instruction_defs: field(8)?,
            max_stack_elements: field(9)?,
            max_size_of_instructions: field(10)?,
            max_component_elements: field(11)?,
            max_component_depth: field(12)?,
        })
    }
}

impl ReadBinary for CvtTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        // A trailing odd byte is ignored
        let count = ctxt.scope().data().len() / 2;
        let control_values = ctxt.read_array::<I16Be>(count)?.to_vec();
        Ok(CvtTable { control_values })
    }
}

impl Table {
    pub fn new(record: TableRecord) -> Self {
        Table { record, data: None }
    }

    pub fn tag(&self) -> u32 {
        self.record.table_tag
    }

    pub fn status(&self) -> TableStatus {
        match self.data {
            Some(_) => TableStatus::Loaded,
            None => TableStatus::None,
        }
    }
}

impl TableData {
    pub fn tag(&self) -> u32 {
        match self {
            TableData::Cmap(_) => tag::CMAP,
            TableData::Cvt(_) => tag::CVT,
            TableData::Glyf(_) => tag::GLYF,
            TableData::Head(_) => tag::HEAD,
            TableData::Hhea(_) => tag::HHEA,
            TableData::Hmtx(_) => tag::HMTX,
            TableData::Loca(_) => tag::LOCA,
            TableData::Maxp(_) => tag::MAXP,
            TableData::Post(_) => tag::POST,
        }
    }
}

impl Fixed {
    pub fn new(value: i32) -> Fixed {
        Fixed(value)
    }

    pub fn raw_value(self) -> i32 {
        self.0
    }
}

impl ReadFrom for Fixed {
    type ReadType = I32Be;

    fn read_from(value: i32) -> Self {
        Fixed(value)
    }
}

impl From<Fixed> for f32 {
    fn from(value: Fixed) -> f32 {
        (f64::from(value.0) / 65536.0) as f32
    }
}
