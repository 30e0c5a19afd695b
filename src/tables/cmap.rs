//! Parsing of the `cmap` table.
//!
//! > This table defines the mapping of character codes to the glyph index values used in the
//! > font.
//!
//! Format 0 (byte encoding) and format 4 (segment mapping to delta values) subtables are
//! supported. Subtables in other formats are skipped.

use log::warn;
use rustc_hash::FxHashMap;

use crate::binary::read::{ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom};
use crate::binary::{U16Be, U32Be};
use crate::error::{ParseError, Unsupported};

/// Marks the final segment of a format 4 subtable.
const END_OF_SEGMENTS: u16 = 0xFFFF;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlatformId(pub u16);

impl PlatformId {
    pub const UNICODE: PlatformId = PlatformId(0);
    pub const MACINTOSH: PlatformId = PlatformId(1);
    pub const WINDOWS: PlatformId = PlatformId(3);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodingId(pub u16);

impl EncodingId {
    pub const WINDOWS_UNICODE_BMP_UCS2: EncodingId = EncodingId(1);
    pub const MACINTOSH_APPLE_ROMAN: EncodingId = EncodingId(0);
}

/// `cmap` table
///
/// Only the subtables that decoded successfully are kept, in directory order.
#[derive(Debug, Clone)]
pub struct CmapTable {
    pub version: u16,
    pub subtables: Vec<CmapSubtable>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodingRecord {
    pub platform_id: PlatformId,
    pub encoding_id: EncodingId,
    /// Offset of the subtable from the start of the `cmap` table.
    pub offset: u32,
}

#[derive(Debug, Clone)]
pub struct CmapSubtable {
    pub platform_id: PlatformId,
    pub encoding_id: EncodingId,
    pub offset: u32,
    pub format: u16,
    pub length: u32,
    pub language: u32,
    mappings: FxHashMap<u32, u16>,
    /// Character code for each glyph index, sized to the number of glyphs in the font.
    glyph_to_char: Vec<Option<u32>>,
}

/// Header fields shared by every subtable format.
struct SubtableHeader {
    format: u16,
    length: u32,
    language: u32,
}

impl ReadBinaryDep for CmapTable {
    type Args<'a> = u16;
    type HostType<'a> = Self;

    /// Read the `cmap` table, `num_glyphs` comes from `maxp`.
    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, num_glyphs: u16) -> Result<Self, ParseError> {
        let table_start = ctxt.tell();
        let version = ctxt.read_u16be()?;
        let num_tables = ctxt.read_u16be()?;

        let mut subtables = Vec::with_capacity(usize::from(num_tables));
        for _ in 0..num_tables {
            let record = ctxt.read::<EncodingRecord>()?;

            // Subtables are located by offset so the position of the next encoding record has
            // to be restored once the subtable has been read
            let pos = ctxt.tell();
            let subtable = usize::try_from(record.offset)
                .map_err(ParseError::from)
                .and_then(|offset| ctxt.seek(table_start + offset))
                .and_then(|()| CmapSubtable::read(ctxt, record, num_glyphs));
            match subtable {
                Ok(subtable) => subtables.push(subtable),
                Err(err) => warn!(
                    "cmap subtable (platform {}, encoding {}): {}",
                    record.platform_id.0, record.encoding_id.0, err
                ),
            }
            ctxt.seek(pos)?;
        }

        Ok(CmapTable { version, subtables })
    }
}

impl ReadFrom for EncodingRecord {
    type ReadType = (U16Be, U16Be, U32Be);

    fn read_from((platform_id, encoding_id, offset): (u16, u16, u32)) -> Self {
        EncodingRecord {
            platform_id: PlatformId(platform_id),
            encoding_id: EncodingId(encoding_id),
            offset,
        }
    }
}

impl ReadBinary for SubtableHeader {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let format = ctxt.read_u16be()?;
        let (length, language) = if format < 8 {
            (
                u32::from(ctxt.read_u16be()?),
                u32::from(ctxt.read_u16be()?),
            )
        } else {
            // The format is a Fixed from format 8 onwards, skip the fractional part
            let _reserved = ctxt.read_u16be()?;
            (ctxt.read_u32be()?, ctxt.read_u32be()?)
        };

        Ok(SubtableHeader {
            format,
            length,
            language,
        })
    }
}

impl CmapSubtable {
    fn read(
        ctxt: &mut ReadCtxt<'_>,
        record: EncodingRecord,
        num_glyphs: u16,
    ) -> Result<Self, ParseError> {
        let header = ctxt.read::<SubtableHeader>()?;
        let mut subtable = CmapSubtable {
            platform_id: record.platform_id,
            encoding_id: record.encoding_id,
            offset: record.offset,
            format: header.format,
            length: header.length,
            language: header.language,
            mappings: FxHashMap::default(),
            glyph_to_char: vec![None; usize::from(num_glyphs)],
        };

        match header.format {
            0 => {
                let glyph_ids = ctxt.read_slice(256)?;
                for (ch, &glyph_id) in (0u32..).zip(glyph_ids) {
                    subtable.insert(ch, u16::from(glyph_id));
                }
            }
            4 => subtable.read_format4(ctxt)?,
            format => {
                return Err(ParseError::UnsupportedFormat(Unsupported::CmapFormat(
                    format,
                )))
            }
        }

        Ok(subtable)
    }

    fn read_format4(&mut self, ctxt: &mut ReadCtxt<'_>) -> Result<(), ParseError> {
        let seg_count = usize::from(ctxt.read_u16be()? / 2);
        let _search_range = ctxt.read_u16be()?;
        let _entry_selector = ctxt.read_u16be()?;
        let _range_shift = ctxt.read_u16be()?;
        let end_codes = ctxt.read_array::<U16Be>(seg_count)?;
        let _reserved_pad = ctxt.read_u16be()?;
        let start_codes = ctxt.read_array::<U16Be>(seg_count)?;
        let id_deltas = ctxt.read_array::<U16Be>(seg_count)?;
        let id_range_offsets = ctxt.read_array::<U16Be>(seg_count)?;
        // The glyph id array follows, range offsets are relative to their own position
        let id_range_offsets_end = ctxt.tell();

        for (i, (((start, end), delta), range_offset)) in start_codes
            .iter()
            .zip(end_codes.iter())
            .zip(id_deltas.iter())
            .zip(id_range_offsets.iter())
            .enumerate()
        {
            if start == END_OF_SEGMENTS || end == END_OF_SEGMENTS {
                continue;
            }

            for ch in start..=end {
                let glyph_id = if range_offset == 0 {
                    ch.wrapping_add(delta)
                } else {
                    let range_offset_pos = id_range_offsets_end - (seg_count - i) * 2;
                    let glyph_offset = range_offset_pos
                        + usize::from(range_offset)
                        + usize::from(ch - start) * 2;
                    ctxt.seek(glyph_offset)?;
                    match ctxt.read_u16be()? {
                        0 => 0,
                        glyph_id => glyph_id.wrapping_add(delta),
                    }
                };
                self.insert(u32::from(ch), glyph_id);
            }
        }

        Ok(())
    }

    /// Record a mapping, keeping the first mapping seen for a glyph. Glyph 0 means unmapped.
    fn insert(&mut self, ch: u32, glyph_id: u16) {
        if glyph_id == 0 {
            return;
        }
        self.mappings.entry(ch).or_insert(glyph_id);
        if let Some(slot @ None) = self.glyph_to_char.get_mut(usize::from(glyph_id)) {
            *slot = Some(ch);
        }
    }

    /// Look up the glyph index for a character code.
    pub fn map_glyph(&self, ch: u32) -> Option<u16> {
        self.mappings.get(&ch).copied()
    }

    /// Look up the first character code that maps to `glyph_id`.
    pub fn glyph_char(&self, glyph_id: u16) -> Option<u32> {
        self.glyph_to_char
            .get(usize::from(glyph_id))
            .copied()
            .flatten()
    }

    pub fn num_mappings(&self) -> usize {
        self.mappings.len()
    }
}

impl CmapTable {
    /// Look up the glyph index for a character code.
    ///
    /// The first subtable with a mapping for `ch` wins.
    pub fn map_glyph(&self, ch: u32) -> Option<u16> {
        self.subtables
            .iter()
            .find_map(|subtable| subtable.map_glyph(ch))
    }

    /// Find the first subtable matching the given platform and encoding.
    pub fn find_subtable(
        &self,
        platform_id: PlatformId,
        encoding_id: EncodingId,
    ) -> Option<&CmapSubtable> {
        self.subtables.iter().find(|subtable| {
            subtable.platform_id == platform_id && subtable.encoding_id == encoding_id
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::tests::writer::{self, TtfType::*};

    // 'A'..='C' map through a delta to 1..=3. 'a' and 'b' go through the glyph id array, 'b'
    // is 0 there and stays unmapped.
    fn format4_subtable() -> Vec<u8> {
        writer::write_ttf(vec![
            UInt16(4),  // format
            UInt16(40), // length
            UInt16(0),  // language
            UInt16(6),  // segCountX2
            UInt16(4),  // searchRange
            UInt16(1),  // entrySelector
            UInt16(2),  // rangeShift
            // endCode
            UInt16(0x43),
            UInt16(0x62),
            UInt16(0xFFFF),
            UInt16(0), // reservedPad
            // startCode
            UInt16(0x41),
            UInt16(0x61),
            UInt16(0xFFFF),
            // idDelta
            Int16(-0x40),
            Int16(1),
            Int16(1),
            // idRangeOffset
            UInt16(0),
            UInt16(4),
            UInt16(0),
            // glyphIdArray
            UInt16(7),
            UInt16(0),
        ])
    }

    fn format0_subtable() -> Vec<u8> {
        let mut glyph_ids = vec![0; 256];
        glyph_ids[usize::from(b'A')] = 5;
        glyph_ids[usize::from(b'z')] = 9;
        writer::write_ttf(vec![UInt16(0), UInt16(262), UInt16(0), Raw(glyph_ids)])
    }

    fn cmap_table(subtables: Vec<(u16, u16, Vec<u8>)>) -> Vec<u8> {
        // NOTE(cast): test tables are small
        let mut offset = 4 + subtables.len() as u32 * 8;
        let mut header = vec![UInt16(0), UInt16(subtables.len() as u16)];
        let mut bodies = Vec::new();
        for (platform_id, encoding_id, body) in subtables {
            header.extend([UInt16(platform_id), UInt16(encoding_id), UInt32(offset)]);
            offset += body.len() as u32;
            bodies.extend(body);
        }
        let mut data = writer::write_ttf(header);
        data.extend(bodies);
        data
    }

    #[test]
    fn test_format4_delta_and_range_offset() {
        let data = cmap_table(vec![(3, 1, format4_subtable())]);
        let cmap = ReadScope::new(&data).read_dep::<CmapTable>(10).unwrap();

        assert_eq!(cmap.subtables.len(), 1);
        let subtable = &cmap.subtables[0];
        assert_eq!(subtable.format, 4);
        assert_eq!(subtable.length, 40);
        assert_eq!(subtable.map_glyph(0x41), Some(1));
        assert_eq!(subtable.map_glyph(0x43), Some(3));
        // range offset glyph plus delta
        assert_eq!(subtable.map_glyph(0x61), Some(8));
        assert_eq!(subtable.map_glyph(0x62), None);
        assert_eq!(subtable.map_glyph(0xFFFF), None);
        assert_eq!(subtable.num_mappings(), 4);
        assert_eq!(subtable.glyph_char(8), Some(0x61));
        assert_eq!(subtable.glyph_char(4), None);
        assert_eq!(subtable.glyph_char(100), None);
    }

    #[test]
    fn test_format0() {
        let data = cmap_table(vec![(1, 0, format0_subtable())]);
        let cmap = ReadScope::new(&data).read_dep::<CmapTable>(10).unwrap();

        assert_eq!(cmap.map_glyph(u32::from(b'A')), Some(5));
        assert_eq!(cmap.map_glyph(u32::from(b'z')), Some(9));
        assert_eq!(cmap.map_glyph(u32::from(b'B')), None);
        assert_eq!(cmap.map_glyph(0x100), None);
    }

    #[test]
    fn test_unsupported_subtable_is_skipped() {
        let format6 = writer::write_ttf(vec![
            UInt16(6),
            UInt16(10),
            UInt16(0),
            UInt16(0x20),
            UInt16(0),
        ]);
        let data = cmap_table(vec![
            (1, 0, format0_subtable()),
            (0, 3, format6),
            (3, 1, format4_subtable()),
        ]);
        let cmap = ReadScope::new(&data).read_dep::<CmapTable>(10).unwrap();

        assert_eq!(cmap.subtables.len(), 2);
        assert_eq!(
            cmap.subtables
                .iter()
                .map(|subtable| subtable.format)
                .collect::<Vec<_>>(),
            vec![0, 4]
        );
        // Format 0 comes first so 'A' maps through it
        assert_eq!(cmap.map_glyph(0x41), Some(5));
        assert_eq!(cmap.map_glyph(0x42), Some(2));
        assert!(cmap
            .find_subtable(PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_BMP_UCS2)
            .is_some());
        assert!(cmap
            .find_subtable(PlatformId::UNICODE, EncodingId(3))
            .is_none());
        assert_eq!(
            cmap.find_subtable(PlatformId::MACINTOSH, EncodingId::MACINTOSH_APPLE_ROMAN)
                .map(|subtable| subtable.format),
            Some(0)
        );
    }

    #[test]
    fn test_subtable_offset_out_of_range() {
        let data = writer::write_ttf(vec![
            UInt16(0),
            UInt16(1),
            UInt16(3),
            UInt16(1),
            UInt32(1000),
        ]);
        let cmap = ReadScope::new(&data).read_dep::<CmapTable>(10).unwrap();

        assert!(cmap.subtables.is_empty());
        assert_eq!(cmap.map_glyph(0x41), None);
    }

    #[test]
    fn test_truncated_directory() {
        let data = writer::write_ttf(vec![UInt16(0), UInt16(2), UInt16(3)]);

        assert_eq!(
            ReadScope::new(&data).read_dep::<CmapTable>(10).map(|_| ()),
            Err(ParseError::BadEof)
        );
    }
}
