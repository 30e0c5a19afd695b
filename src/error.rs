//! Error types

use std::fmt;
use std::io;

use crate::binary::read::ReadEof;
use crate::tag::DisplayTag;

/// Errors that originate when parsing binary data
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ParseError {
    BadEof,
    BadValue,
    BadVersion,
    BadOffset,
    BadIndex,
    /// The offset subtable or table directory is malformed.
    BadHeader,
    MissingTable(u32),
    UnsupportedFormat(Unsupported),
}

/// A recognised, but unimplemented, part of the TrueType format
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Unsupported {
    CompoundGlyph,
    CmapFormat(u16),
    LocaFormat(i16),
}

impl From<ReadEof> for ParseError {
    fn from(_error: ReadEof) -> Self {
        ParseError::BadEof
    }
}

impl From<std::num::TryFromIntError> for ParseError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        ParseError::BadValue
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BadEof => write!(f, "end of data reached unexpectedly"),
            ParseError::BadValue => write!(f, "invalid value"),
            ParseError::BadVersion => write!(f, "unexpected data version"),
            ParseError::BadOffset => write!(f, "invalid data offset"),
            ParseError::BadIndex => write!(f, "invalid data index"),
            ParseError::BadHeader => write!(f, "malformed font directory"),
            ParseError::MissingTable(tag) => {
                write!(f, "font is missing '{}' table", DisplayTag(*tag))
            }
            ParseError::UnsupportedFormat(what) => write!(f, "unsupported {}", what),
        }
    }
}

impl std::error::Error for ParseError {}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unsupported::CompoundGlyph => write!(f, "compound glyph"),
            Unsupported::CmapFormat(format) => write!(f, "cmap subtable format {}", format),
            Unsupported::LocaFormat(format) => write!(f, "loca offset format {}", format),
        }
    }
}

/// Errors that originate when scaling or rasterizing glyphs
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum RasterError {
    /// `raster_init` has not been called on the font.
    NotInitialized,
    /// The outline has not been scaled to a point size.
    NotScaled,
    /// The glyph has no point data to build an outline from.
    NoOutline,
    /// A bitmap was drawn with its origin outside the canvas.
    OutOfBounds,
    Allocation,
    Parse(ParseError),
}

impl From<ParseError> for RasterError {
    fn from(error: ParseError) -> Self {
        RasterError::Parse(error)
    }
}

impl From<std::collections::TryReserveError> for RasterError {
    fn from(_error: std::collections::TryReserveError) -> Self {
        RasterError::Allocation
    }
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::NotInitialized => write!(f, "font rasterizer has not been initialized"),
            RasterError::NotScaled => write!(f, "glyph outline has not been scaled"),
            RasterError::NoOutline => write!(f, "glyph has no outline"),
            RasterError::OutOfBounds => write!(f, "bitmap origin is outside the canvas"),
            RasterError::Allocation => write!(f, "unable to allocate raster buffer"),
            RasterError::Parse(err) => write!(f, "raster parse: {}", err),
        }
    }
}

impl std::error::Error for RasterError {}

/// Error returned when loading a font
#[derive(Debug)]
pub enum FontError {
    Io(io::Error),
    Parse(ParseError),
}

impl From<io::Error> for FontError {
    fn from(error: io::Error) -> Self {
        FontError::Io(error)
    }
}

impl From<ParseError> for FontError {
    fn from(error: ParseError) -> Self {
        FontError::Parse(error)
    }
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontError::Io(err) => write!(f, "unable to read font: {}", err),
            FontError::Parse(err) => write!(f, "unable to load font: {}", err),
        }
    }
}

impl std::error::Error for FontError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FontError::Io(err) => Some(err),
            FontError::Parse(err) => Some(err),
        }
    }
}
