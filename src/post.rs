//! `post` table parsing.
//!
//! Only the glyph names are of interest beyond the header. Formats 1, 2 and 2.5 carry names,
//! format 3 and anything else carry none.

use std::borrow::Cow;

use crate::binary::read::{ReadBinary, ReadBinaryDep, ReadCtxt};
use crate::binary::{I8, U16Be};
use crate::error::ParseError;
use crate::tables::Fixed;

/// Largest `glyphNameIndex` value that refers to the name pool.
const MAX_NAME_INDEX: u16 = 32767;

#[derive(Debug, Clone, PartialEq)]
pub struct PostTable {
    pub header: Header,
    pub glyph_names: GlyphNames,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub version: i32,
    pub italic_angle: Fixed,
    pub underline_position: i16,
    pub underline_thickness: i16,
    pub is_fixed_pitch: u32,
    pub min_mem_type_42: u32,
    pub max_mem_type_42: u32,
    pub min_mem_type_1: u32,
    pub max_mem_type_1: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GlyphNames {
    /// Version 1.0, the glyphs are the standard Macintosh set in order.
    Standard,
    /// Version 2.0, each glyph has an index into the standard names or the name pool.
    Indexed {
        glyph_name_index: Vec<u16>,
        names: Vec<String>,
    },
    /// Version 2.5, each glyph's standard name is offset from its glyph index.
    Offset(Vec<i8>),
    /// Version 3.0 or unknown, no names are provided.
    None,
}

impl ReadBinary for Header {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let version = ctxt.read_i32be()?;
        let italic_angle = Fixed::new(ctxt.read_i32be()?);
        let underline_position = ctxt.read_i16be()?;
        let underline_thickness = ctxt.read_i16be()?;
        let is_fixed_pitch = ctxt.read_u32be()?;
        let min_mem_type_42 = ctxt.read_u32be()?;
        let max_mem_type_42 = ctxt.read_u32be()?;
        let min_mem_type_1 = ctxt.read_u32be()?;
        let max_mem_type_1 = ctxt.read_u32be()?;

        Ok(Header {
            version,
            italic_angle,
            underline_position,
            underline_thickness,
            is_fixed_pitch,
            min_mem_type_42,
            max_mem_type_42,
            min_mem_type_1,
            max_mem_type_1,
        })
    }
}

impl ReadBinaryDep for PostTable {
    type Args<'a> = u16;
    type HostType<'a> = Self;

    /// Read the `post` table, `num_glyphs` comes from `maxp`.
    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, num_glyphs: u16) -> Result<Self, ParseError> {
        let header = ctxt.read::<Header>()?;
        let glyph_names = match header.version {
            0x00010000 => GlyphNames::Standard,
            0x00020000 => {
                let num_glyphs = ctxt.read_u16be()?;
                let glyph_name_index = ctxt.read_array::<U16Be>(usize::from(num_glyphs))?;

                // The pool holds a name for every index from 258 up to the largest one used
                let num_names = glyph_name_index
                    .iter()
                    .filter(|&index| index <= MAX_NAME_INDEX)
                    .max()
                    .and_then(|max| usize::from(max).checked_sub(FORMAT_1_NAMES.len()))
                    .map_or(0, |max| max + 1);
                let mut names = Vec::with_capacity(num_names);
                for _ in 0..num_names {
                    let length = ctxt.read_u8()?;
                    let bytes = ctxt.read_slice(usize::from(length))?;
                    names.push(String::from_utf8_lossy(bytes).into_owned());
                }

                GlyphNames::Indexed {
                    glyph_name_index: glyph_name_index.to_vec(),
                    names,
                }
            }
            0x00025000 => {
                let offsets = ctxt.read_array::<I8>(usize::from(num_glyphs))?;
                GlyphNames::Offset(offsets.to_vec())
            }
            _ => GlyphNames::None,
        };

        Ok(PostTable {
            header,
            glyph_names,
        })
    }
}

impl PostTable {
    /// Look up the PostScript name of a glyph.
    pub fn glyph_name(&self, glyph_index: u16) -> Option<&str> {
        match &self.glyph_names {
            GlyphNames::Standard => FORMAT_1_NAMES.get(usize::from(glyph_index)).copied(),
            GlyphNames::Indexed {
                glyph_name_index,
                names,
            } => {
                let name_index = *glyph_name_index.get(usize::from(glyph_index))?;
                match usize::from(name_index).checked_sub(FORMAT_1_NAMES.len()) {
                    None => Some(FORMAT_1_NAMES[usize::from(name_index)]),
                    Some(_) if name_index > MAX_NAME_INDEX => None,
                    Some(index) => names.get(index).map(String::as_str),
                }
            }
            GlyphNames::Offset(offsets) => {
                let offset = offsets.get(usize::from(glyph_index))?;
                let name_index = i32::from(glyph_index) + i32::from(*offset);
                usize::try_from(name_index)
                    .ok()
                    .and_then(|index| FORMAT_1_NAMES.get(index))
                    .copied()
            }
            GlyphNames::None => None,
        }
    }

    /// The glyph name, or a generated `gidN` name when the font provides none.
    pub fn glyph_name_or_default(&self, glyph_index: u16) -> Cow<'_, str> {
        match self.glyph_name(glyph_index) {
            Some(name) => Cow::from(name),
            None => Cow::from(format!("gid{}", glyph_index)),
        }
    }
}

static FORMAT_1_NAMES: [&str; 258] = [
    ".notdef",
    ".null",
    "nonmarkingreturn",
    "space",
    "exclam",
    "quotedbl",
    "numbersign",
    "dollar",
    "percent",
    "ampersand",
    "quotesingle",
    "parenleft",
    "parenright",
    "asterisk",
    "plus",
    "comma",
    "hyphen",
    "period",
    "slash",
    "zero",
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "colon",
    "semicolon",
    "less",
    "equal",
    "greater",
    "question",
    "at",
    "A",
    "B",
    "C",
    "D",
    "E",
    "F",
    "G",
    "H",
    "I",
    "J",
    "K",
    "L",
    "M",
    "N",
    "O",
    "P",
    "Q",
    "R",
    "S",
    "T",
    "U",
    "V",
    "W",
    "X",
    "Y",
    "Z",
    "bracketleft",
    "backslash",
    "bracketright",
    "asciicircum",
    "underscore",
    "grave",
    "a",
    "b",
    "c",
    "d",
    "e",
    "f",
    "g",
    "h",
    "i",
    "j",
    "k",
    "l",
    "m",
    "n",
    "o",
    "p",
    "q",
    "r",
    "s",
    "t",
    "u",
    "v",
    "w",
    "x",
    "y",
    "z",
    "braceleft",
    "bar",
    "braceright",
    "asciitilde",
    "Adieresis",
    "Aring",
    "Ccedilla",
    "Eacute",
    "Ntilde",
    "Odieresis",
    "Udieresis",
    "aacute",
    "agrave",
    "acircumflex",
    "adieresis",
    "atilde",
    "aring",
    "ccedilla",
    "eacute",
    "egrave",
    "ecircumflex",
    "edieresis",
    "iacute",
    "igrave",
    "icircumflex",
    "idieresis",
    "ntilde",
    "oacute",
    "ograve",
    "ocircumflex",
    "odieresis",
    "otilde",
    "uacute",
    "ugrave",
    "ucircumflex",
    "udieresis",
    "dagger",
    "degree",
    "cent",
    "sterling",
    "section",
    "bullet",
    "paragraph",
    "germandbls",
    "registered",
    "copyright",
    "trademark",
    "acute",
    "dieresis",
    "notequal",
    "AE",
    "Oslash",
    "infinity",
    "plusminus",
    "lessequal",
    "greaterequal",
    "yen",
    "mu",
    "partialdiff",
    "summation",
    "product",
    "pi",
    "integral",
    "ordfeminine",
    "ordmasculine",
    "Omega",
    "ae",
    "oslash",
    "questiondown",
    "exclamdown",
    "logicalnot",
    "radical",
    "florin",
    "approxequal",
    "Delta",
    "guillemotleft",
    "guillemotright",
    "ellipsis",
    "nonbreakingspace",
    "Agrave",
    "Atilde",
    "Otilde",
    "OE",
    "oe",
    "endash",
    "emdash",
    "quotedblleft",
    "quotedblright",
    "quoteleft",
    "quoteright",
    "divide",
    "lozenge",
    "ydieresis",
    "Ydieresis",
    "fraction",
    "currency",
    "guilsinglleft",
    "guilsinglright",
    "fi",
    "fl",
    "daggerdbl",
    "periodcentered",
    "quotesinglbase",
    "quotedblbase",
    "perthousand",
    "Acircumflex",
    "Ecircumflex",
    "Aacute",
    "Edieresis",
    "Egrave",
    "Iacute",
    "Icircumflex",
    "Idieresis",
    "Igrave",
    "Oacute",
    "Ocircumflex",
    "apple",
    "Ograve",
    "Uacute",
    "Ucircumflex",
    "Ugrave",
    "dotlessi",
    "circumflex",
    "tilde",
    "macron",
    "breve",
    "dotaccent",
    "ring",
    "cedilla",
    "hungarumlaut",
    "ogonek",
    "caron",
    "Lslash",
    "lslash",
    "Scaron",
    "scaron",
    "Zcaron",
    "zcaron",
    "brokenbar",
    "Eth",
    "eth",
    "Yacute",
    "yacute",
    "Thorn",
    "thorn",
    "minus",
    "multiply",
    "onesuperior",
    "twosuperior",
    "threesuperior",
    "onehalf",
    "onequarter",
    "threequarters",
    "franc",
    "Gbreve",
    "gbreve",
    "Idotaccent",
    "Scedilla",
    "scedilla",
    "Cacute",
    "cacute",
    "Ccaron",
    "ccaron",
    "dcroat",
];
