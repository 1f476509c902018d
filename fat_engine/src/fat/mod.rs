//! FAT12/FAT16/FAT32 file system implementation
//!
//! Implements the File Allocation Table file system on top of a
//! [`BlockDevice`](crate::BlockDevice).

use crate::filesystem::ClusterId;

/// Number of entries reserved at the start of a File Allocation Table
pub const RESERVED_ENTRIES: u32 = 2;

/// Indentifies the supported types of FAT format
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FatType {
    /// FAT12 Format
    Fat12,
    /// FAT16 Format
    Fat16,
    /// FAT32 Format
    Fat32,
}

impl FatType {
    /// Classify a volume by its number of data clusters. This is the only
    /// way the type of a volume is ever decided.
    pub fn from_cluster_count(count_of_clusters: u32) -> FatType {
        if count_of_clusters < 4085 {
            FatType::Fat12
        } else if count_of_clusters < 65525 {
            FatType::Fat16
        } else {
            FatType::Fat32
        }
    }

    /// Type picked by `format` when the caller does not ask for one.
    pub fn for_sector_count(num_sectors: u32) -> FatType {
        if num_sectors <= 8400 {
            FatType::Fat12
        } else if num_sectors <= 66600 {
            FatType::Fat16
        } else {
            FatType::Fat32
        }
    }

    /// Bits of a FAT entry that carry the value.
    pub fn entry_mask(self) -> u32 {
        match self {
            FatType::Fat12 => 0x0000_0FFF,
            FatType::Fat16 => 0x0000_FFFF,
            FatType::Fat32 => 0x0FFF_FFFF,
        }
    }

    /// Entries at or above this value end a chain.
    pub fn eoc_threshold(self) -> u32 {
        0x0FFF_FFF8 & self.entry_mask()
    }

    /// The value written to mark the last cluster of a chain.
    pub fn eoc_marker(self) -> u32 {
        self.entry_mask()
    }

    /// Does `value`, read from the FAT, end a chain?
    pub fn is_end_of_chain(self, value: u32) -> bool {
        (value & self.entry_mask()) >= self.eoc_threshold()
    }

    /// Byte offset of `cluster`'s entry from the start of the FAT.
    pub fn fat_byte_offset(self, cluster: ClusterId) -> u32 {
        match self {
            FatType::Fat12 => cluster.0 + cluster.0 / 2,
            FatType::Fat16 => cluster.0 * 2,
            FatType::Fat32 => cluster.0 * 4,
        }
    }

    /// The file-system type string stored in the boot sector.
    pub(crate) fn label(self) -> [u8; 8] {
        match self {
            FatType::Fat12 => *b"FAT12   ",
            FatType::Fat16 => *b"FAT16   ",
            FatType::Fat32 => *b"FAT32   ",
        }
    }
}

pub mod bpb;
mod dir;
pub mod ondiskdirentry;
pub mod table;
pub mod volume;

// ****************************************************************************
//
// Unit Tests
//
// ****************************************************************************

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_from_cluster_count() {
        assert_eq!(FatType::from_cluster_count(1), FatType::Fat12);
        assert_eq!(FatType::from_cluster_count(4084), FatType::Fat12);
        assert_eq!(FatType::from_cluster_count(4085), FatType::Fat16);
        assert_eq!(FatType::from_cluster_count(65524), FatType::Fat16);
        assert_eq!(FatType::from_cluster_count(65525), FatType::Fat32);
    }

    #[test]
    fn test_type_for_sector_count() {
        assert_eq!(FatType::for_sector_count(2880), FatType::Fat12);
        assert_eq!(FatType::for_sector_count(8400), FatType::Fat12);
        assert_eq!(FatType::for_sector_count(8401), FatType::Fat16);
        assert_eq!(FatType::for_sector_count(66600), FatType::Fat16);
        assert_eq!(FatType::for_sector_count(66601), FatType::Fat32);
    }

    #[test]
    fn test_end_of_chain() {
        assert!(!FatType::Fat12.is_end_of_chain(0xFF7));
        assert!(FatType::Fat12.is_end_of_chain(0xFF8));
        assert!(FatType::Fat12.is_end_of_chain(0xFFF));
        assert!(!FatType::Fat16.is_end_of_chain(0xFFF8 - 1));
        assert!(FatType::Fat16.is_end_of_chain(0xFFF8));
        assert!(!FatType::Fat32.is_end_of_chain(0x0FFF_FFF7));
        assert!(FatType::Fat32.is_end_of_chain(0x0FFF_FFF8));
        assert!(FatType::Fat32.is_end_of_chain(0xFFFF_FFFF));
        assert!(!FatType::Fat32.is_end_of_chain(0x0000_FFF8));
    }

    #[test]
    fn test_fat_byte_offset() {
        assert_eq!(FatType::Fat12.fat_byte_offset(ClusterId(2)), 3);
        assert_eq!(FatType::Fat12.fat_byte_offset(ClusterId(3)), 4);
        assert_eq!(FatType::Fat12.fat_byte_offset(ClusterId(341)), 511);
        assert_eq!(FatType::Fat16.fat_byte_offset(ClusterId(256)), 512);
        assert_eq!(FatType::Fat32.fat_byte_offset(ClusterId(128)), 512);
    }
}

// ****************************************************************************
//
// End Of File
//
// ****************************************************************************
