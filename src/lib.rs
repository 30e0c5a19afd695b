#![warn(rust_2018_idioms)]

//! TrueType font decoding and glyph rasterization.
//!
//! A `Font` is loaded from the bytes of a TrueType file. Its simple glyphs can be turned into
//! outlines of lines and quadratic Bézier curves, scaled to a point size and resolution, and
//! scan converted into bitmaps with the even-odd fill rule, optionally anti-aliased.

/// Reading of binary data.
pub mod binary;
pub mod bitmap;
/// Checksum calculation routines.
pub mod checksum;
pub mod error;
pub mod font;
pub mod outline;
pub mod post;
pub mod raster;
pub mod scale;
pub mod tables;
pub mod tag;

pub use font::Font;
pub use pathfinder_geometry;
