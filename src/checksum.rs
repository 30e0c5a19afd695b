#![deny(missing_docs)]

use std::fmt;
use std::num::Wrapping;

use byteorder::{BigEndian, ByteOrder};

use crate::tag::DisplayTag;

/// Calculate a checksum of `data` according to the TrueType table checksum algorithm
///
/// The data is summed as big-endian 32-bit words. A trailing partial word is padded with
/// zeros, which is what the table would contain up to the next 4-byte boundary.
pub fn table_checksum(data: &[u8]) -> Wrapping<u32> {
    data.chunks(4)
        .map(|chunk| {
            let mut word = [0; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            Wrapping(BigEndian::read_u32(&word))
        })
        .sum()
}

/// A table whose computed checksum differs from the one recorded in the font directory
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ChecksumMismatch {
    /// Tag of the table
    pub tag: u32,
    /// Checksum recorded in the table directory
    pub recorded: u32,
    /// Checksum computed from the table data
    pub computed: u32,
}

impl fmt::Display for ChecksumMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' table checksum mismatch: recorded 0x{:08x}, computed 0x{:08x}",
            DisplayTag(self.tag),
            self.recorded,
            self.computed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Wrapping;

    #[test]
    fn test_table_checksum() {
        let data = [0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4];

        assert_eq!(super::table_checksum(&data), Wrapping(10));
    }

    #[test]
    fn test_table_checksum_overflow() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 2];

        assert_eq!(super::table_checksum(&data), Wrapping(1));
    }

    #[test]
    fn test_table_checksum_unaligned() {
        // The final word is read as 0x01020000
        let data = [0, 0, 0, 1, 1, 2];

        assert_eq!(super::table_checksum(&data), Wrapping(0x01020001));
    }
}
