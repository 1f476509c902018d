//! Block Device support
//!
//! Generic code for handling sector-addressed storage. A sector is the unit
//! of device I/O; the engine never reads or writes less than one.

use alloc::vec;
use alloc::vec::Vec;

/// Represents a sector-addressed device the FAT engine can run on.
///
/// Every call transfers exactly one sector and blocks until it is done.
pub trait BlockDevice {
    /// The errors that the `BlockDevice` can return. Must be debug formattable.
    type Error: core::fmt::Debug;
    /// Read the sector `block_idx` into `block`, which is `bytes_per_sector()` long.
    fn read_sector(&self, block_idx: BlockIdx, block: &mut [u8]) -> Result<(), Self::Error>;
    /// Write `block`, which is `bytes_per_sector()` long, to the sector `block_idx`.
    fn write_sector(&mut self, block_idx: BlockIdx, block: &[u8]) -> Result<(), Self::Error>;
    /// Determine how many sectors this device can hold.
    fn num_blocks(&self) -> BlockCount;
    /// Size of one sector in bytes.
    fn bytes_per_sector(&self) -> usize;
}

/// The linear numeric address of a sector.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockIdx(pub u32);

/// The a number of sectors (or a difference between two `BlockIdx` values).
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockCount(pub u32);

impl BlockIdx {
    /// Convert a sector index into a byte offset, given the sector size.
    pub fn into_bytes(self, bytes_per_sector: usize) -> u64 {
        u64::from(self.0) * bytes_per_sector as u64
    }
}

impl core::ops::Add<BlockCount> for BlockIdx {
    type Output = BlockIdx;
    fn add(self, rhs: BlockCount) -> BlockIdx {
        BlockIdx(self.0 + rhs.0)
    }
}

impl core::ops::AddAssign<BlockCount> for BlockIdx {
    fn add_assign(&mut self, rhs: BlockCount) {
        self.0 += rhs.0
    }
}

impl core::ops::Sub<BlockIdx> for BlockIdx {
    type Output = BlockCount;
    fn sub(self, rhs: BlockIdx) -> BlockCount {
        BlockCount(self.0 - rhs.0)
    }
}

/// Errors raised by [`RamDisk`].
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RamDiskError {
    /// The sector lies beyond the end of the disk.
    OutOfRange(BlockIdx),
    /// The buffer is not exactly one sector long.
    BadBufferLength(usize),
}

/// A block device held entirely in memory.
#[derive(Debug, Clone)]
pub struct RamDisk {
    contents: Vec<u8>,
    bytes_per_sector: usize,
}

impl RamDisk {
    /// Create a zero-filled disk of `num_sectors` sectors.
    pub fn new(num_sectors: u32, bytes_per_sector: usize) -> RamDisk {
        RamDisk {
            contents: vec![0u8; num_sectors as usize * bytes_per_sector],
            bytes_per_sector,
        }
    }

    /// Wrap an existing image. Trailing bytes that do not fill a sector are
    /// not addressable.
    pub fn from_image(contents: Vec<u8>, bytes_per_sector: usize) -> RamDisk {
        RamDisk {
            contents,
            bytes_per_sector,
        }
    }

    /// The raw image.
    pub fn as_bytes(&self) -> &[u8] {
        &self.contents
    }

    /// Give back the raw image.
    pub fn into_inner(self) -> Vec<u8> {
        self.contents
    }

    fn span(&self, block_idx: BlockIdx, len: usize) -> Result<core::ops::Range<usize>, RamDiskError> {
        if len != self.bytes_per_sector {
            return Err(RamDiskError::BadBufferLength(len));
        }
        let start = block_idx.into_bytes(self.bytes_per_sector) as usize;
        let end = start + self.bytes_per_sector;
        if end > self.contents.len() {
            return Err(RamDiskError::OutOfRange(block_idx));
        }
        Ok(start..end)
    }
}

impl BlockDevice for RamDisk {
    type Error = RamDiskError;

    fn read_sector(&self, block_idx: BlockIdx, block: &mut [u8]) -> Result<(), Self::Error> {
        let span = self.span(block_idx, block.len())?;
        block.copy_from_slice(&self.contents[span]);
        Ok(())
    }

    fn write_sector(&mut self, block_idx: BlockIdx, block: &[u8]) -> Result<(), Self::Error> {
        let span = self.span(block_idx, block.len())?;
        self.contents[span].copy_from_slice(block);
        Ok(())
    }

    fn num_blocks(&self) -> BlockCount {
        BlockCount((self.contents.len() / self.bytes_per_sector) as u32)
    }

    fn bytes_per_sector(&self) -> usize {
        self.bytes_per_sector
    }
}

// ****************************************************************************
//
// Unit Tests
//
// ****************************************************************************

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramdisk_read_back_written_sector() {
        let mut disk = RamDisk::new(8, 512);
        let block = [0xA5u8; 512];
        disk.write_sector(BlockIdx(3), &block).unwrap();
        let mut out = [0u8; 512];
        disk.read_sector(BlockIdx(3), &mut out).unwrap();
        assert_eq!(block, out);
        disk.read_sector(BlockIdx(2), &mut out).unwrap();
        assert!(out.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_ramdisk_rejects_out_of_range() {
        let disk = RamDisk::new(8, 512);
        let mut out = [0u8; 512];
        assert_eq!(
            disk.read_sector(BlockIdx(8), &mut out),
            Err(RamDiskError::OutOfRange(BlockIdx(8)))
        );
        let mut short = [0u8; 100];
        assert_eq!(
            disk.read_sector(BlockIdx(0), &mut short),
            Err(RamDiskError::BadBufferLength(100))
        );
    }

    #[test]
    fn test_ramdisk_geometry() {
        let disk = RamDisk::new(2880, 512);
        assert_eq!(disk.num_blocks(), BlockCount(2880));
        assert_eq!(disk.bytes_per_sector(), 512);
        assert_eq!(BlockIdx(4).into_bytes(512), 2048);
        assert_eq!(BlockIdx(4) + BlockCount(2), BlockIdx(6));
        assert_eq!(BlockIdx(9) - BlockIdx(4), BlockCount(5));
    }
}

// ****************************************************************************
//
// End Of File
//
// ****************************************************************************
