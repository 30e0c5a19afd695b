//! Parsing of the `glyf` table.
//!
//! > This table contains information that describes the glyphs in the font in the TrueType
//! > outline format.
//!
//! Only simple glyphs are decoded. Composite glyphs are recognised and recorded as
//! unavailable, the same as any other glyph that fails to decode, without failing the table.

mod outline;

use std::iter;

use bitflags::bitflags;
use itertools::Itertools;
use log::warn;
use num_traits::{cast, Num};

use crate::binary::read::{ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, U16Be, U8};
use crate::bitmap::Bitmap;
use crate::error::{ParseError, Unsupported};
use crate::outline::Outline;
use crate::tables::loca::LocaTable;

/// End point value of a single-contour glyph that marks it as having no points.
const EMPTY_CONTOUR_SENTINEL: u16 = 0xFFFF;

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct SimpleGlyphFlag: u8 {
        const ON_CURVE_POINT = 0b00000001;
        const X_SHORT_VECTOR = 0b00000010;
        const Y_SHORT_VECTOR = 0b00000100;
        const REPEAT_FLAG = 0b00001000;
        const X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR = 0b00010000;
        const Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR = 0b00100000;
    }
}

/// `glyf` table
///
/// Holds one entry per glyph in the font, in glyph index order.
#[derive(Debug)]
pub struct GlyfTable {
    pub glyphs: Vec<Glyph>,
}

/// A glyph along with the outline and bitmap derived from it.
///
/// `outline` and `bitmap` start out empty and are filled in by scaling and rendering.
#[derive(Debug)]
pub struct Glyph {
    pub index: u16,
    pub number_of_contours: i16,
    pub bounding_box: BoundingBox<i16>,
    pub data: GlyphData,
    pub outline: Option<Outline>,
    pub bitmap: Option<Bitmap>,
}

#[derive(Debug, PartialEq)]
pub enum GlyphData {
    /// The glyph has no outline, such as a space.
    Empty,
    Simple(SimpleGlyph),
    /// The glyph could not be decoded. The error is kept for diagnostics.
    Unavailable(ParseError),
}

#[derive(Debug, PartialEq, Clone)]
pub struct SimpleGlyph {
    pub end_pts_of_contours: Vec<u16>,
    pub instructions: Vec<u8>,
    pub coordinates: Vec<(SimpleGlyphFlag, Point)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point(pub i16, pub i16);

/// An axis aligned bounding box
///
/// Used with `i16` font units for the glyph header and `f32` pixels once an outline has been
/// scaled.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct BoundingBox<T> {
    pub x_min: T,
    pub x_max: T,
    pub y_min: T,
    pub y_max: T,
}

impl ReadBinaryDep for GlyfTable {
    type Args<'a> = (&'a LocaTable, u16);
    type HostType<'a> = Self;

    /// Read every glyph referenced by `loca`.
    ///
    /// A glyph that fails to decode is stored as `GlyphData::Unavailable`, it does not fail
    /// the table.
    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (loca, num_glyphs): (&'a LocaTable, u16),
    ) -> Result<Self, ParseError> {
        let num_glyphs = usize::from(num_glyphs);
        if loca.len() < num_glyphs {
            return Err(ParseError::BadIndex);
        }

        let scope = ctxt.scope();
        let mut glyphs = loca
            .offsets
            .iter()
            .copied()
            .tuple_windows()
            .take(num_glyphs)
            .enumerate()
            .map(|(index, (start, end))| Glyph::from_range(&scope, index, start, Some(end)))
            .collect::<Vec<_>>();

        // The last glyph has no closing offset when `loca` only has `num_glyphs` entries
        if glyphs.len() < num_glyphs {
            let index = glyphs.len();
            let glyph = Glyph::from_range(&scope, index, loca.offsets[index], None);
            glyphs.push(glyph);
        }

        Ok(GlyfTable { glyphs })
    }
}

impl Glyph {
    fn from_range(scope: &ReadScope<'_>, index: usize, start: u32, end: Option<u32>) -> Self {
        // NOTE(cast): index is bounded by num_glyphs which is a u16
        let index = index as u16;
        match Self::read_range(scope, start, end) {
            Ok(Some((number_of_contours, bounding_box, data))) => {
                if let GlyphData::Unavailable(err) = &data {
                    warn!("glyph {}: {}", index, err);
                }
                Glyph {
                    index,
                    number_of_contours,
                    bounding_box,
                    data,
                    outline: None,
                    bitmap: None,
                }
            }
            Ok(None) => Glyph::empty(index),
            Err(err) => {
                warn!("glyph {}: {}", index, err);
                Glyph {
                    data: GlyphData::Unavailable(err),
                    ..Glyph::empty(index)
                }
            }
        }
    }

    fn read_range(
        scope: &ReadScope<'_>,
        start: u32,
        end: Option<u32>,
    ) -> Result<Option<(i16, BoundingBox<i16>, GlyphData)>, ParseError> {
        let offset = usize::try_from(start)?;
        let glyph_scope = match end.map(|end| end.checked_sub(start)) {
            Some(Some(0)) => return Ok(None),
            Some(Some(length)) => match scope.offset_length(offset, usize::try_from(length)?) {
                Ok(glyph_scope) => glyph_scope,
                Err(ParseError::BadEof) => {
                    // The length given by `loca` runs past the end of `glyf`. Try parsing
                    // without a length limit since the glyph data itself may be intact.
                    warn!("glyph length out of bounds, trying to parse");
                    scope.offset(offset)
                }
                Err(err) => return Err(err),
            },
            Some(None) => return Err(ParseError::BadOffset),
            None if offset >= scope.data().len() => return Ok(None),
            None => scope.offset(offset),
        };

        let mut ctxt = glyph_scope.ctxt();
        let number_of_contours = ctxt.read_i16be()?;
        let bounding_box = ctxt.read::<BoundingBox<i16>>()?;
        let data = if number_of_contours > 0 {
            // NOTE(cast): Safe as number_of_contours is positive
            match ctxt.read_dep::<SimpleGlyph>(number_of_contours as u16) {
                Ok(glyph) if glyph.coordinates.is_empty() => GlyphData::Empty,
                Ok(glyph) => GlyphData::Simple(glyph),
                Err(err) => GlyphData::Unavailable(err),
            }
        } else if number_of_contours == 0 {
            GlyphData::Empty
        } else {
            GlyphData::Unavailable(ParseError::UnsupportedFormat(Unsupported::CompoundGlyph))
        };

        Ok(Some((number_of_contours, bounding_box, data)))
    }

    /// A glyph with no contours.
    pub fn empty(index: u16) -> Self {
        Glyph {
            index,
            number_of_contours: 0,
            bounding_box: BoundingBox::default(),
            data: GlyphData::Empty,
            outline: None,
            bitmap: None,
        }
    }

    pub fn simple(&self) -> Option<&SimpleGlyph> {
        match &self.data {
            GlyphData::Simple(glyph) => Some(glyph),
            GlyphData::Empty | GlyphData::Unavailable(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data == GlyphData::Empty
    }

    pub fn num_points(&self) -> usize {
        self.simple().map_or(0, |glyph| glyph.coordinates.len())
    }

    /// Drop the derived outline and bitmap.
    pub fn clear_cache(&mut self) {
        self.outline = None;
        self.bitmap = None;
    }
}

impl SimpleGlyph {
    /// Iterate over the contours, each yielded as its run of flags and points.
    pub fn contours(&self) -> impl Iterator<Item = &[(SimpleGlyphFlag, Point)]> {
        self.end_pts_of_contours.iter().scan(0, move |i, &end| {
            let start = *i;
            let end = usize::from(end);
            *i = end + 1;
            self.coordinates.get(start..=end)
        })
    }

    pub fn bounding_box(&self) -> Option<BoundingBox<i16>> {
        let points = self
            .coordinates
            .iter()
            .map(|&(_, point)| point)
            .collect::<Vec<_>>();
        BoundingBox::from_points(&points)
    }
}

impl ReadBinaryDep for SimpleGlyph {
    type Args<'a> = u16;
    type HostType<'a> = Self;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        number_of_contours: Self::Args<'a>,
    ) -> Result<Self, ParseError> {
        let number_of_contours = usize::from(number_of_contours);
        let end_pts_of_contours = ctxt.read_array::<U16Be>(number_of_contours)?.to_vec();
        let instruction_length = ctxt.read::<U16Be>()?;
        let instructions = ctxt.read_slice(usize::from(instruction_length))?.to_vec();

        if end_pts_of_contours == [EMPTY_CONTOUR_SENTINEL] {
            return Ok(SimpleGlyph {
                end_pts_of_contours: Vec::new(),
                instructions,
                coordinates: Vec::new(),
            });
        }
        // Contours must end in increasing point order
        ctxt.check(
            end_pts_of_contours
                .iter()
                .tuple_windows()
                .all(|(prev, next)| prev < next),
        )?;

        // end_pts_of_contours stores the index of the end points.
        // Therefore the number of coordinates is the last index + 1
        let number_of_coordinates = end_pts_of_contours
            .last()
            .map_or(0, |&last| usize::from(last) + 1);

        // Read all the flags
        let mut flags = Vec::with_capacity(number_of_coordinates);
        while flags.len() < number_of_coordinates {
            let flag = ctxt.read::<SimpleGlyphFlag>()?;
            if flag.is_repeated() {
                let count = usize::from(ctxt.read::<U8>()?) + 1; // + 1 to include the current entry
                flags.extend(iter::repeat(flag).take(count));
            } else {
                flags.push(flag);
            }
        }
        // A repeat count may run past the last point
        flags.truncate(number_of_coordinates);

        // Read the x coordinates
        let mut coordinates = flags
            .iter()
            .map(|&flag| {
                if flag.x_is_short() {
                    ctxt.read::<U8>()
                        .map(|val| i16::from(val) * flag.x_short_sign())
                } else if flag.x_is_same_or_positive() {
                    Ok(0)
                } else {
                    ctxt.read::<I16Be>()
                }
                .map(|x| (flag, Point(x, 0)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Read y coordinates, updating the Points in `coordinates`
        let mut prev_point = Point::zero();
        for (flag, point) in coordinates.iter_mut() {
            let y = if flag.y_is_short() {
                ctxt.read::<U8>()
                    .map(|val| i16::from(val) * flag.y_short_sign())?
            } else if flag.y_is_same_or_positive() {
                0
            } else {
                ctxt.read::<I16Be>()?
            };

            // The coordinates are stored as deltas against the previous point, with the first
            // one being against (0, 0). Resolve them into absolute values.
            prev_point = Point(
                prev_point.0.wrapping_add(point.0),
                prev_point.1.wrapping_add(y),
            );
            *point = prev_point
        }

        Ok(SimpleGlyph {
            end_pts_of_contours,
            instructions,
            coordinates,
        })
    }
}

impl ReadFrom for SimpleGlyphFlag {
    type ReadType = U8;

    fn read_from(flag: u8) -> Self {
        SimpleGlyphFlag::from_bits_truncate(flag)
    }
}

impl ReadBinary for BoundingBox<i16> {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let x_min = ctxt.read::<I16Be>()?;
        let y_min = ctxt.read::<I16Be>()?;
        let x_max = ctxt.read::<I16Be>()?;
        let y_max = ctxt.read::<I16Be>()?;

        Ok(BoundingBox {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }
}

impl GlyfTable {
    pub fn num_glyphs(&self) -> usize {
        self.glyphs.len()
    }

    pub fn get(&self, glyph_index: u16) -> Option<&Glyph> {
        self.glyphs.get(usize::from(glyph_index))
    }

    pub fn get_mut(&mut self, glyph_index: u16) -> Option<&mut Glyph> {
        self.glyphs.get_mut(usize::from(glyph_index))
    }
}

impl SimpleGlyphFlag {
    pub fn is_on_curve(self) -> bool {
        self.contains(Self::ON_CURVE_POINT)
    }

    pub fn x_is_short(self) -> bool {
        self.contains(Self::X_SHORT_VECTOR)
    }

    pub fn y_is_short(self) -> bool {
        self.contains(Self::Y_SHORT_VECTOR)
    }

    pub fn is_repeated(self) -> bool {
        self.contains(Self::REPEAT_FLAG)
    }

    pub fn x_short_sign(self) -> i16 {
        if self.x_is_same_or_positive() {
            1
        } else {
            -1
        }
    }

    pub fn y_short_sign(self) -> i16 {
        if self.y_is_same_or_positive() {
            1
        } else {
            -1
        }
    }

    pub fn x_is_same_or_positive(self) -> bool {
        self.contains(Self::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR)
    }

    pub fn y_is_same_or_positive(self) -> bool {
        self.contains(Self::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR)
    }
}

impl Point {
    pub fn zero() -> Self {
        Point(0, 0)
    }
}

impl<T: Num + Copy> Default for BoundingBox<T> {
    fn default() -> Self {
        BoundingBox {
            x_min: T::zero(),
            x_max: T::zero(),
            y_min: T::zero(),
            y_max: T::zero(),
        }
    }
}

impl<T: Num + PartialOrd + Copy> BoundingBox<T> {
    /// Calculate xMin, xMax and yMin, yMax from a collection of points.
    ///
    /// Returns `None` if `points` is empty.
    pub fn from_points<P>(points: &[P]) -> Option<Self>
    where
        P: Copy + Into<(T, T)>,
    {
        let (&first, rest) = points.split_first()?;
        let (initial_x, initial_y) = first.into();
        let initial = BoundingBox {
            x_min: initial_x,
            x_max: initial_x,
            y_min: initial_y,
            y_max: initial_y,
        };

        Some(rest.iter().fold(initial, |mut bounding_box, &point| {
            let (x, y) = point.into();
            if x < bounding_box.x_min {
                bounding_box.x_min = x
            }
            if x > bounding_box.x_max {
                bounding_box.x_max = x
            }
            if y < bounding_box.y_min {
                bounding_box.y_min = y
            }
            if y > bounding_box.y_max {
                bounding_box.y_max = y
            }

            bounding_box
        }))
    }

    pub fn width(&self) -> T {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> T {
        self.y_max - self.y_min
    }

    /// Apply `f` to each edge.
    pub fn map<U, F: Fn(T) -> U>(&self, f: F) -> BoundingBox<U> {
        BoundingBox {
            x_min: f(self.x_min),
            x_max: f(self.x_max),
            y_min: f(self.y_min),
            y_max: f(self.y_max),
        }
    }
}

impl<T: num_traits::NumCast + Copy> BoundingBox<T> {
    /// Convert to a bounding box over `f32`, returning `None` if a value is not representable.
    pub fn to_f32(&self) -> Option<BoundingBox<f32>> {
        Some(BoundingBox {
            x_min: cast(self.x_min)?,
            x_max: cast(self.x_max)?,
            y_min: cast(self.y_min)?,
            y_max: cast(self.y_max)?,
        })
    }
}

impl From<Point> for (i16, i16) {
    fn from(Point(x, y): Point) -> Self {
        (x, y)
    }
}
