//! Access to the packed entries of the File Allocation Table.

use alloc::vec;
use byteorder::{ByteOrder, LittleEndian};

use crate::blockdevice::{BlockCount, BlockDevice, BlockIdx};
use crate::fat::bpb::Bpb;
use crate::fat::FatType;
use crate::filesystem::ClusterId;
use crate::Error;

/// Reads and writes FAT entries of one volume.
///
/// The entry width differs per FAT type. FAT12 packs two entries into three
/// bytes, so an entry may straddle two sectors; callers never see this.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FatTable {
    fat_type: FatType,
    start: BlockIdx,
    fat_size: u32,
    num_fats: u8,
    bytes_per_sector: usize,
}

impl FatTable {
    /// A table of `fat_size` sectors per copy, starting at `start`.
    pub fn new(
        fat_type: FatType,
        start: BlockIdx,
        fat_size: u32,
        num_fats: u8,
        bytes_per_sector: usize,
    ) -> FatTable {
        FatTable {
            fat_type,
            start,
            fat_size,
            num_fats,
            bytes_per_sector,
        }
    }

    /// The table described by a boot parameter block.
    pub fn from_bpb(bpb: &Bpb) -> FatTable {
        FatTable::new(
            bpb.fat_type(),
            BlockIdx(bpb.fat_start()),
            bpb.fat_size(),
            bpb.num_fats,
            usize::from(bpb.bytes_per_sector),
        )
    }

    /// The entry width of this table.
    pub fn fat_type(&self) -> FatType {
        self.fat_type
    }

    /// Does `value` end a chain?
    pub fn is_end_of_chain(&self, value: u32) -> bool {
        self.fat_type.is_end_of_chain(value)
    }

    /// Sector (relative to the start of a FAT copy) and byte offset of the
    /// entry, and whether it runs into the next sector.
    fn locate(&self, cluster: ClusterId) -> Option<(u32, usize, bool)> {
        let offset = self.fat_type.fat_byte_offset(cluster);
        let bps = self.bytes_per_sector as u32;
        let sector = offset / bps;
        let in_sector = (offset % bps) as usize;
        let straddles = self.fat_type == FatType::Fat12 && in_sector == self.bytes_per_sector - 1;
        let last = if straddles { sector + 1 } else { sector };
        if last >= self.fat_size {
            return None;
        }
        Some((sector, in_sector, straddles))
    }

    /// Read the entry of `cluster`, masked to the type's width.
    pub fn read_entry<D>(&self, device: &D, cluster: ClusterId) -> Result<u32, Error<D::Error>>
    where
        D: BlockDevice,
    {
        let (sector, offset, straddles) = self.locate(cluster).ok_or(Error::BadCluster(cluster))?;
        let bps = self.bytes_per_sector;
        let mut buf = vec![0u8; bps * 2];
        let first = self.start + BlockCount(sector);
        device
            .read_sector(first, &mut buf[..bps])
            .map_err(Error::DeviceIoError)?;
        if straddles {
            device
                .read_sector(first + BlockCount(1), &mut buf[bps..])
                .map_err(Error::DeviceIoError)?;
        }
        let value = match self.fat_type {
            FatType::Fat32 => LittleEndian::read_u32(&buf[offset..]) & 0x0FFF_FFFF,
            FatType::Fat16 => u32::from(LittleEndian::read_u16(&buf[offset..])),
            FatType::Fat12 => {
                let pair = u32::from(LittleEndian::read_u16(&buf[offset..]));
                if cluster.0 & 1 == 1 {
                    pair >> 4
                } else {
                    pair & 0x0FFF
                }
            }
        };
        Ok(value)
    }

    /// Set the entry of `cluster` to `value`, keeping the bits of the
    /// neighbouring FAT12 entry and the top nibble of a FAT32 entry. Every
    /// FAT copy is updated.
    pub fn write_entry<D>(
        &self,
        device: &mut D,
        cluster: ClusterId,
        value: u32,
    ) -> Result<(), Error<D::Error>>
    where
        D: BlockDevice,
    {
        let (sector, offset, straddles) = self.locate(cluster).ok_or(Error::BadCluster(cluster))?;
        let bps = self.bytes_per_sector;
        let mut buf = vec![0u8; bps * 2];
        let first = self.start + BlockCount(sector);
        let span = if straddles { bps * 2 } else { bps };
        device
            .read_sector(first, &mut buf[..bps])
            .map_err(Error::DeviceIoError)?;
        if straddles {
            device
                .read_sector(first + BlockCount(1), &mut buf[bps..])
                .map_err(Error::DeviceIoError)?;
        }
        match self.fat_type {
            FatType::Fat32 => {
                let old = LittleEndian::read_u32(&buf[offset..]);
                let new = (old & 0xF000_0000) | (value & 0x0FFF_FFFF);
                LittleEndian::write_u32(&mut buf[offset..], new);
            }
            FatType::Fat16 => {
                LittleEndian::write_u16(&mut buf[offset..], value as u16);
            }
            FatType::Fat12 => {
                let old = LittleEndian::read_u16(&buf[offset..]);
                let value = (value & 0x0FFF) as u16;
                let new = if cluster.0 & 1 == 1 {
                    (old & 0x000F) | (value << 4)
                } else {
                    (old & 0xF000) | value
                };
                LittleEndian::write_u16(&mut buf[offset..], new);
            }
        }
        for copy in 0..u32::from(self.num_fats) {
            let copy_start = first + BlockCount(copy * self.fat_size);
            device
                .write_sector(copy_start, &buf[..bps])
                .map_err(Error::DeviceIoError)?;
            if straddles {
                device
                    .write_sector(copy_start + BlockCount(1), &buf[bps..span])
                    .map_err(Error::DeviceIoError)?;
            }
        }
        Ok(())
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
    use crate::blockdevice::RamDisk;
    use hex_literal::hex;

    fn fat12_table() -> (RamDisk, FatTable) {
        let disk = RamDisk::new(64, 512);
        let table = FatTable::new(FatType::Fat12, BlockIdx(1), 16, 1, 512);
        (disk, table)
    }

    #[test]
    fn test_fat12_packing() {
        let (mut disk, table) = fat12_table();
        table.write_entry(&mut disk, ClusterId(2), 0x123).unwrap();
        table.write_entry(&mut disk, ClusterId(3), 0x456).unwrap();
        assert_eq!(&disk.as_bytes()[512 + 3..512 + 6], &hex!("23 61 45"));
        assert_eq!(table.read_entry(&disk, ClusterId(2)).unwrap(), 0x123);
        assert_eq!(table.read_entry(&disk, ClusterId(3)).unwrap(), 0x456);
    }

    #[test]
    fn test_fat12_neighbours_are_preserved() {
        let (mut disk, table) = fat12_table();
        for c in 2..200u32 {
            table.write_entry(&mut disk, ClusterId(c), c * 7 + 1).unwrap();
        }
        for c in (2..200u32).step_by(3) {
            table.write_entry(&mut disk, ClusterId(c), 0xFFF).unwrap();
        }
        for c in 2..200u32 {
            let expected = if (c - 2) % 3 == 0 { 0xFFF } else { (c * 7 + 1) & 0xFFF };
            assert_eq!(table.read_entry(&disk, ClusterId(c)).unwrap(), expected, "cluster {}", c);
        }
    }

    #[test]
    fn test_fat12_entry_straddling_sectors() {
        let (mut disk, table) = fat12_table();
        // cluster 341 starts at byte 511 of the first FAT sector
        table.write_entry(&mut disk, ClusterId(340), 0xABC).unwrap();
        table.write_entry(&mut disk, ClusterId(341), 0xDEF).unwrap();
        table.write_entry(&mut disk, ClusterId(342), 0x135).unwrap();
        assert_eq!(table.read_entry(&disk, ClusterId(340)).unwrap(), 0xABC);
        assert_eq!(table.read_entry(&disk, ClusterId(341)).unwrap(), 0xDEF);
        assert_eq!(table.read_entry(&disk, ClusterId(342)).unwrap(), 0x135);
        let bytes = disk.as_bytes();
        assert_eq!(bytes[512 + 511], 0xFA);
        assert_eq!(&bytes[1024..1027], &hex!("DE 35 01"));
        table.write_entry(&mut disk, ClusterId(341), 0).unwrap();
        assert_eq!(table.read_entry(&disk, ClusterId(340)).unwrap(), 0xABC);
        assert_eq!(table.read_entry(&disk, ClusterId(342)).unwrap(), 0x135);
    }

    #[test]
    fn test_fat16_entries() {
        let mut disk = RamDisk::new(64, 512);
        let table = FatTable::new(FatType::Fat16, BlockIdx(1), 8, 1, 512);
        table.write_entry(&mut disk, ClusterId(255), 0xFFF8).unwrap();
        table.write_entry(&mut disk, ClusterId(256), 0x1234).unwrap();
        assert_eq!(&disk.as_bytes()[1024..1026], &hex!("34 12"));
        assert_eq!(table.read_entry(&disk, ClusterId(255)).unwrap(), 0xFFF8);
        assert!(table.is_end_of_chain(0xFFF8));
        assert_eq!(table.read_entry(&disk, ClusterId(256)).unwrap(), 0x1234);
    }

    #[test]
    fn test_fat32_keeps_top_nibble() {
        let mut disk = RamDisk::new(64, 512);
        let mut sector = [0u8; 512];
        sector[8..12].copy_from_slice(&hex!("00 00 00 F0"));
        disk.write_sector(BlockIdx(1), &sector).unwrap();
        let table = FatTable::new(FatType::Fat32, BlockIdx(1), 8, 1, 512);
        table.write_entry(&mut disk, ClusterId(2), 0xFFFF_FFFF).unwrap();
        assert_eq!(&disk.as_bytes()[512 + 8..512 + 12], &hex!("FF FF FF FF"));
        table.write_entry(&mut disk, ClusterId(2), 0x0000_0005).unwrap();
        assert_eq!(&disk.as_bytes()[512 + 8..512 + 12], &hex!("05 00 00 F0"));
        assert_eq!(table.read_entry(&disk, ClusterId(2)).unwrap(), 5);
    }

    #[test]
    fn test_every_copy_is_written() {
        let mut disk = RamDisk::new(64, 512);
        let table = FatTable::new(FatType::Fat16, BlockIdx(1), 4, 2, 512);
        table.write_entry(&mut disk, ClusterId(3), 0x0042).unwrap();
        assert_eq!(&disk.as_bytes()[512 + 6..512 + 8], &hex!("42 00"));
        assert_eq!(&disk.as_bytes()[5 * 512 + 6..5 * 512 + 8], &hex!("42 00"));
    }

    #[test]
    fn test_cluster_outside_table() {
        let (disk, table) = fat12_table();
        // 16 sectors hold 5461 FAT12 entries
        assert!(table.read_entry(&disk, ClusterId(5460)).is_ok());
        assert!(matches!(
            table.read_entry(&disk, ClusterId(5462)),
            Err(Error::BadCluster(ClusterId(5462)))
        ));
    }
}

// ****************************************************************************
//
// End Of File
//
// ****************************************************************************
