#![allow(missing_docs)]

//! Parse binary data
//!
//! All font decoding goes through two types. A `ReadScope` is a bounded view of the font
//! bytes that remembers where it starts in the file. A `ReadCtxt` is a cursor over a scope:
//! values are read sequentially and big-endian, the position can be queried with `tell`
//! and moved with `seek`. Decoders that must read out of line (cmap subtables, cmap format
//! 4 glyph id lookups) save the position with `tell` and put it back with `seek` when done.

use std::fmt;
use std::marker::PhantomData;
use std::mem;

use byteorder::{BigEndian, ByteOrder};

use crate::binary::{I16Be, I32Be, I64Be, U16Be, U32Be, I8, U8};
use crate::error::ParseError;

#[derive(Debug, Copy, Clone)]
pub struct ReadEof {}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ReadScope<'a> {
    base: usize,
    data: &'a [u8],
}

#[derive(Clone)]
pub struct ReadCtxt<'a> {
    scope: ReadScope<'a>,
    offset: usize,
}

pub trait ReadBinary {
    type HostType<'a>: Sized; // default = Self

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError>;
}

pub trait ReadBinaryDep {
    type Args<'a>: Copy;
    type HostType<'a>: Sized; // default = Self

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        args: Self::Args<'a>,
    ) -> Result<Self::HostType<'a>, ParseError>;
}

/// A value with a fixed encoded size.
///
/// Decoding cannot fail once `SIZE` bytes are available.
pub trait ReadFixed {
    type HostType: Sized; // default = Self

    /// The number of bytes consumed by `from_bytes`.
    const SIZE: usize;

    /// Decode a value from exactly `SIZE` bytes.
    fn from_bytes(bytes: &[u8]) -> Self::HostType;
}

pub trait ReadFrom {
    type ReadType: ReadFixed;
    fn read_from(value: <Self::ReadType as ReadFixed>::HostType) -> Self;
}

impl<T> ReadFixed for T
where
    T: ReadFrom,
{
    type HostType = T;

    const SIZE: usize = T::ReadType::SIZE;

    fn from_bytes(bytes: &[u8]) -> Self::HostType {
        T::read_from(T::ReadType::from_bytes(bytes))
    }
}

impl<T> ReadBinary for T
where
    T: ReadFixed,
{
    type HostType<'a> = T::HostType;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let bytes = ctxt.read_slice(T::SIZE)?;
        Ok(T::from_bytes(bytes))
    }
}

impl<T> ReadBinaryDep for T
where
    T: ReadBinary,
{
    type Args<'a> = ();
    type HostType<'a> = T::HostType<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (): Self::Args<'_>,
    ) -> Result<Self::HostType<'a>, ParseError> {
        T::read(ctxt)
    }
}

#[derive(Clone)]
pub struct ReadArray<'a, T: ReadFixed> {
    scope: ReadScope<'a>,
    length: usize,
    phantom: PhantomData<T>,
}

pub struct ReadArrayIter<'a, T: ReadFixed> {
    scope: ReadScope<'a>,
    index: usize,
    length: usize,
    phantom: PhantomData<T>,
}

impl<'a> ReadScope<'a> {
    pub fn new(data: &'a [u8]) -> ReadScope<'a> {
        let base = 0;
        ReadScope { base, data }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Absolute position of the start of this scope in the original data.
    pub fn base(&self) -> usize {
        self.base
    }

    pub fn offset(&self, offset: usize) -> ReadScope<'a> {
        let base = self.base + offset;
        let data = self.data.get(offset..).unwrap_or(&[]);
        ReadScope { base, data }
    }

    pub fn offset_length(&self, offset: usize, length: usize) -> Result<ReadScope<'a>, ParseError> {
        if offset < self.data.len() || length == 0 {
            let data = self.data.get(offset..).unwrap_or(&[]);
            match data.get(..length) {
                Some(data) => Ok(ReadScope {
                    base: self.base + offset,
                    data,
                }),
                None => Err(ParseError::BadEof),
            }
        } else {
            Err(ParseError::BadOffset)
        }
    }

    pub fn ctxt(&self) -> ReadCtxt<'a> {
        ReadCtxt::new(*self)
    }

    pub fn read<T: ReadBinaryDep<Args<'a> = ()>>(&self) -> Result<T::HostType<'a>, ParseError> {
        self.ctxt().read::<T>()
    }

    pub fn read_dep<T: ReadBinaryDep>(
        &self,
        args: T::Args<'a>,
    ) -> Result<T::HostType<'a>, ParseError> {
        self.ctxt().read_dep::<T>(args)
    }
}

impl<'a> ReadCtxt<'a> {
    /// ReadCtxt is constructed by calling `ReadScope::ctxt`.
    fn new(scope: ReadScope<'a>) -> ReadCtxt<'a> {
        ReadCtxt { scope, offset: 0 }
    }

    pub fn check(&self, cond: bool) -> Result<(), ParseError> {
        match cond {
            true => Ok(()),
            false => Err(ParseError::BadValue),
        }
    }

    /// Check a condition, returning `ParseError::BadIndex` if `false`.
    pub fn check_index(&self, cond: bool) -> Result<(), ParseError> {
        match cond {
            true => Ok(()),
            false => Err(ParseError::BadIndex),
        }
    }

    /// Check a condition, returning `ParseError::BadVersion` if `false`.
    ///
    /// Intended for use in checking versions read from data. Example:
    ///
    /// ```
    /// use ttf_raster::binary::read::ReadScope;
    /// use ttf_raster::error::ParseError;
    ///
    /// let scope = ReadScope::new(&[0, 2]);
    /// let mut ctxt = scope.ctxt();
    /// let major_version = ctxt.read_u16be().expect("unable to read version");
    ///
    /// assert!(ctxt.check_version(major_version == 2).is_ok());
    /// assert_eq!(ctxt.check_version(major_version == 1), Err(ParseError::BadVersion));
    /// ```
    pub fn check_version(&self, cond: bool) -> Result<(), ParseError> {
        match cond {
            true => Ok(()),
            false => Err(ParseError::BadVersion),
        }
    }

    /// The remainder of the scope from the current position.
    pub fn scope(&self) -> ReadScope<'a> {
        self.scope.offset(self.offset)
    }

    /// Current position relative to the start of the scope.
    pub fn tell(&self) -> usize {
        self.offset
    }

    /// Current position relative to the start of the original data.
    pub fn position(&self) -> usize {
        self.scope.base + self.offset
    }

    /// Move the cursor to `offset`, relative to the start of the scope.
    ///
    /// Seeking to the very end of the scope is allowed, seeking past it is not.
    pub fn seek(&mut self, offset: usize) -> Result<(), ParseError> {
        if offset <= self.scope.data.len() {
            self.offset = offset;
            Ok(())
        } else {
            Err(ParseError::BadOffset)
        }
    }

    pub fn read<T: ReadBinaryDep<Args<'a> = ()>>(&mut self) -> Result<T::HostType<'a>, ParseError> {
        T::read_dep(self, ())
    }

    pub fn read_dep<T: ReadBinaryDep>(
        &mut self,
        args: T::Args<'a>,
    ) -> Result<T::HostType<'a>, ParseError> {
        T::read_dep(self, args)
    }

    pub fn bytes_available(&self) -> bool {
        self.offset < self.scope.data.len()
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadEof> {
        Ok(self.read_slice(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, ReadEof> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16be(&mut self) -> Result<u16, ReadEof> {
        Ok(BigEndian::read_u16(self.read_slice(2)?))
    }

    pub fn read_i16be(&mut self) -> Result<i16, ReadEof> {
        Ok(BigEndian::read_i16(self.read_slice(2)?))
    }

    pub fn read_u32be(&mut self) -> Result<u32, ReadEof> {
        Ok(BigEndian::read_u32(self.read_slice(4)?))
    }

    pub fn read_i32be(&mut self) -> Result<i32, ReadEof> {
        Ok(BigEndian::read_i32(self.read_slice(4)?))
    }

    pub fn read_u64be(&mut self) -> Result<u64, ReadEof> {
        Ok(BigEndian::read_u64(self.read_slice(8)?))
    }

    pub fn read_i64be(&mut self) -> Result<i64, ReadEof> {
        Ok(BigEndian::read_i64(self.read_slice(8)?))
    }

    /// Read a 16.16 fixed point number as `f32`.
    pub fn read_fixed(&mut self) -> Result<f32, ReadEof> {
        Ok(self.read_i32be()? as f32 / 65536.0)
    }

    /// Read a 4-byte table tag.
    pub fn read_tag(&mut self) -> Result<u32, ReadEof> {
        self.read_u32be()
    }

    pub fn read_array<T: ReadFixed>(&mut self, length: usize) -> Result<ReadArray<'a, T>, ParseError> {
        let size = length.checked_mul(T::SIZE).ok_or(ParseError::BadEof)?;
        let scope = self.read_scope(size)?;
        Ok(ReadArray {
            scope,
            length,
            phantom: PhantomData,
        })
    }

    pub fn read_scope(&mut self, length: usize) -> Result<ReadScope<'a>, ReadEof> {
        if let Ok(scope) = self.scope.offset_length(self.offset, length) {
            self.offset += length;
            Ok(scope)
        } else {
            Err(ReadEof {})
        }
    }

    pub fn read_slice(&mut self, length: usize) -> Result<&'a [u8], ReadEof> {
        let scope = self.read_scope(length)?;
        Ok(scope.data)
    }
}

impl<'a, T: ReadFixed> ReadArray<'a, T> {
    pub fn empty() -> ReadArray<'a, T> {
        ReadArray {
            scope: ReadScope::new(&[]),
            length: 0,
            phantom: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn get_item(&self, index: usize) -> Option<T::HostType> {
        if index < self.length {
            let start = index * T::SIZE;
            let bytes = self.scope.data.get(start..start + T::SIZE)?;
            Some(T::from_bytes(bytes))
        } else {
            None
        }
    }

    pub fn read_item(&self, index: usize) -> Result<T::HostType, ParseError> {
        self.get_item(index).ok_or(ParseError::BadIndex)
    }

    pub fn last(&self) -> Option<T::HostType> {
        let index = self.length.checked_sub(1)?;
        self.get_item(index)
    }

    pub fn to_vec(&self) -> Vec<T::HostType> {
        self.iter().collect()
    }

    pub fn iter(&self) -> ReadArrayIter<'a, T> {
        ReadArrayIter {
            scope: self.scope,
            index: 0,
            length: self.length,
            phantom: PhantomData,
        }
    }
}

impl<'a, 'b, T: ReadFixed> IntoIterator for &'b ReadArray<'a, T> {
    type Item = T::HostType;
    type IntoIter = ReadArrayIter<'a, T>;
    fn into_iter(self) -> ReadArrayIter<'a, T> {
        self.iter()
    }
}

impl<'a, T: ReadFixed> Iterator for ReadArrayIter<'a, T> {
    type Item = T::HostType;

    fn next(&mut self) -> Option<T::HostType> {
        if self.index >= self.length {
            return None;
        }
        let start = self.index * T::SIZE;
        let bytes = self.scope.data.get(start..start + T::SIZE)?;
        self.index += 1;
        Some(T::from_bytes(bytes))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.length - self.index;
        (remaining, Some(remaining))
    }
}

impl<'a, T: ReadFixed> ExactSizeIterator for ReadArrayIter<'a, T> {}

impl<'a, T> fmt::Debug for ReadArray<'a, T>
where
    T: ReadFixed,
    T::HostType: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl ReadFixed for U8 {
    type HostType = u8;

    const SIZE: usize = mem::size_of::<u8>();

    fn from_bytes(bytes: &[u8]) -> u8 {
        bytes[0]
    }
}

impl ReadFixed for I8 {
    type HostType = i8;

    const SIZE: usize = mem::size_of::<i8>();

    fn from_bytes(bytes: &[u8]) -> i8 {
        bytes[0] as i8
    }
}

impl ReadFixed for U16Be {
    type HostType = u16;

    const SIZE: usize = mem::size_of::<u16>();

    fn from_bytes(bytes: &[u8]) -> u16 {
        BigEndian::read_u16(bytes)
    }
}

impl ReadFixed for I16Be {
    type HostType = i16;

    const SIZE: usize = mem::size_of::<i16>();

    fn from_bytes(bytes: &[u8]) -> i16 {
        BigEndian::read_i16(bytes)
    }
}

impl ReadFixed for U32Be {
    type HostType = u32;

    const SIZE: usize = mem::size_of::<u32>();

    fn from_bytes(bytes: &[u8]) -> u32 {
        BigEndian::read_u32(bytes)
    }
}

impl ReadFixed for I32Be {
    type HostType = i32;

    const SIZE: usize = mem::size_of::<i32>();

    fn from_bytes(bytes: &[u8]) -> i32 {
        BigEndian::read_i32(bytes)
    }
}

impl ReadFixed for I64Be {
    type HostType = i64;

    const SIZE: usize = mem::size_of::<i64>();

    fn from_bytes(bytes: &[u8]) -> i64 {
        BigEndian::read_i64(bytes)
    }
}

impl<T1, T2> ReadFixed for (T1, T2)
where
    T1: ReadFixed,
    T2: ReadFixed,
{
    type HostType = (T1::HostType, T2::HostType);

    const SIZE: usize = T1::SIZE + T2::SIZE;

    fn from_bytes(bytes: &[u8]) -> Self::HostType {
        let (b1, b2) = bytes.split_at(T1::SIZE);
        (T1::from_bytes(b1), T2::from_bytes(b2))
    }
}

impl<T1, T2, T3> ReadFixed for (T1, T2, T3)
where
    T1: ReadFixed,
    T2: ReadFixed,
    T3: ReadFixed,
{
    type HostType = (T1::HostType, T2::HostType, T3::HostType);

    const SIZE: usize = T1::SIZE + T2::SIZE + T3::SIZE;

    fn from_bytes(bytes: &[u8]) -> Self::HostType {
        let (b1, rest) = bytes.split_at(T1::SIZE);
        let (b2, b3) = rest.split_at(T2::SIZE);
        (T1::from_bytes(b1), T2::from_bytes(b2), T3::from_bytes(b3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests that offset_length does not panic when length is 0 but offset is out-of-bounds
    #[test]
    fn test_offset_length_oob() {
        let scope = ReadScope::new(&[1, 2, 3]);
        assert!(scope.offset_length(99, 0).is_ok());
    }

    #[test]
    fn test_read_big_endian() {
        let data = [0x12, 0x34, 0xFF, 0xFE, 0x00, 0x01, 0x00, 0x00, 0x80];
        let mut ctxt = ReadScope::new(&data).ctxt();
        assert_eq!(ctxt.read_u16be().unwrap(), 0x1234);
        assert_eq!(ctxt.read_i16be().unwrap(), -2);
        assert_eq!(ctxt.read_fixed().unwrap(), 1.0);
        assert_eq!(ctxt.read_i8().unwrap(), -128);
        assert!(!ctxt.bytes_available());
        assert!(ctxt.read_u8().is_err());
    }

    #[test]
    fn test_seek_and_tell() {
        let data = [0, 1, 0, 2, 0, 3];
        let mut ctxt = ReadScope::new(&data).ctxt();
        assert_eq!(ctxt.read_u16be().unwrap(), 1);
        let saved = ctxt.tell();
        ctxt.seek(4).unwrap();
        assert_eq!(ctxt.read_u16be().unwrap(), 3);
        ctxt.seek(saved).unwrap();
        assert_eq!(ctxt.read_u16be().unwrap(), 2);
        assert_eq!(ctxt.seek(7), Err(ParseError::BadOffset));
    }

    #[test]
    fn test_position_is_absolute() {
        let data = [0; 16];
        let scope = ReadScope::new(&data).offset(10);
        let mut ctxt = scope.ctxt();
        ctxt.read_u16be().unwrap();
        assert_eq!(ctxt.tell(), 2);
        assert_eq!(ctxt.position(), 12);
    }

    #[test]
    fn test_read_array() {
        let data = [0, 1, 0, 2, 0xFF, 0xFF];
        let array = ReadScope::new(&data)
            .ctxt()
            .read_array::<U16Be>(3)
            .unwrap();
        assert_eq!(array.to_vec(), vec![1, 2, 0xFFFF]);
        assert_eq!(array.last(), Some(0xFFFF));
        assert_eq!(array.get_item(3), None);
    }

    #[test]
    fn test_read_array_too_long() {
        let data = [0, 1];
        let mut ctxt = ReadScope::new(&data).ctxt();
        assert!(ctxt.read_array::<U32Be>(1).is_err());
    }
}
