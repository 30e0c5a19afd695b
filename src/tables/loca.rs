//! Parsing of the `loca` table.
//!
//! > The indexToLoc table stores the offsets to the locations of the glyphs in the font, relative
//! > to the beginning of the glyphData table.

use crate::binary::read::{ReadBinaryDep, ReadCtxt};
use crate::binary::{U16Be, U32Be};
use crate::error::ParseError;
use crate::tables::IndexToLocFormat;

/// `loca` table
///
/// Offsets are stored as byte offsets into `glyf` regardless of the on-disk format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocaTable {
    pub offsets: Vec<u32>,
}

impl ReadBinaryDep for LocaTable {
    type Args<'a> = (u16, IndexToLocFormat);
    type HostType<'a> = LocaTable;

    /// Read a `loca` table from `ctxt`
    ///
    /// * `num_glyphs` is the number of glyphs in the font, from the `maxp` table.
    /// * `index_to_loc_format` comes from the `head` table.
    ///
    /// `num_glyphs` offsets are required. The closing offset that gives the length of the
    /// last glyph is read when the table has room for it.
    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (num_glyphs, index_to_loc_format): (u16, IndexToLocFormat),
    ) -> Result<Self::HostType<'a>, ParseError> {
        let num_glyphs = usize::from(num_glyphs);
        let entry_size = match index_to_loc_format {
            IndexToLocFormat::Short => 2,
            IndexToLocFormat::Long => 4,
        };
        let available = ctxt.scope().data().len() / entry_size;
        let count = if available > num_glyphs {
            num_glyphs + 1
        } else {
            num_glyphs
        };

        let offsets = match index_to_loc_format {
            IndexToLocFormat::Short => {
                // The actual local offset divided by 2 is stored
                ctxt.read_array::<U16Be>(count)?
                    .iter()
                    .map(|offset| u32::from(offset) * 2)
                    .collect()
            }
            IndexToLocFormat::Long => ctxt.read_array::<U32Be>(count)?.to_vec(),
        };

        Ok(LocaTable { offsets })
    }
}

impl LocaTable {
    pub fn empty() -> Self {
        LocaTable {
            offsets: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// The byte range of glyph `index` within `glyf`, if the table records its end.
    pub fn glyph_range(&self, index: usize) -> Option<(u32, u32)> {
        let start = *self.offsets.get(index)?;
        let end = *self.offsets.get(index + 1)?;
        Some((start, end))
    }
}
