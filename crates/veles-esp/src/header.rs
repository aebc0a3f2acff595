//! Fixed on-disk record and group headers.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Record flag: the field block is zlib-compressed.
pub const FLAG_COMPRESSED: u32 = 0x0004_0000;
/// Record flag: strings are localized (meaningful on the file header record).
pub const FLAG_LOCALIZED: u32 = 0x0000_0080;

/// The 16 bytes following a record's code and data size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct RecordHeader {
    pub flags: u32,
    pub id: u32,
    pub revision: u32,
    pub version: u16,
    pub unknown: u16,
}

impl RecordHeader {
    pub const SIZE: usize = 16;

    pub fn is_compressed(&self) -> bool {
        let flags = self.flags;
        flags & FLAG_COMPRESSED != 0
    }

    pub fn is_localized(&self) -> bool {
        let flags = self.flags;
        flags & FLAG_LOCALIZED != 0
    }
}

/// The 16 bytes following a group's `GRUP` code and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct GroupHeader {
    pub label: [u8; 4],
    pub group_type: i32,
    pub stamp: u16,
    pub unknown: u16,
    pub version: u16,
    pub unknown2: u16,
}

impl GroupHeader {
    /// Full group header length on disk, code and size included.
    pub const SIZE: usize = 24;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(flags: u32) -> RecordHeader {
        RecordHeader {
            flags,
            id: 0x0100_1234,
            revision: 0,
            version: 44,
            unknown: 0,
        }
    }

    #[test]
    fn compressed_flag() {
        assert!(header(0x0004_0000).is_compressed());
        assert!(!header(0x0000_0000).is_compressed());
    }

    #[test]
    fn localized_flag() {
        assert!(header(0x0000_0080).is_localized());
        assert!(!header(0x0004_0000).is_localized());
    }

    #[test]
    fn header_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<RecordHeader>(), RecordHeader::SIZE);
        assert_eq!(std::mem::size_of::<GroupHeader>(), GroupHeader::SIZE - 8);
    }
}
