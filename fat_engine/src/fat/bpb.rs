//! Boot Parameter Block

use byteorder::{ByteOrder, LittleEndian};

use crate::fat::FatType;
use crate::filesystem::ClusterId;

/// Size of the boot sector record.
pub const BPB_LEN: usize = 512;

/// Ways a boot parameter block can be unusable.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BpbError {
    /// No cluster size fits this disk size for the FAT type.
    DiskSizeOutOfRange,
    /// The jump instruction at the start of the sector is missing.
    BadSignature,
    /// The geometry fields contradict each other.
    BadGeometry,
    /// Fewer than 512 bytes were supplied.
    TooShort,
}

/// Disk size (in 512 byte sectors) up to which a cluster size (in 512 byte
/// sectors) is used. A cluster size of 0 means the type cannot be used.
const FAT16_CLUSTER_SIZES: [(u32, u32); 8] = [
    (8_400, 0),
    (32_680, 2),
    (262_144, 4),
    (524_288, 8),
    (1_048_576, 16),
    (2_097_152, 32),
    (4_194_304, 64),
    (0xFFFF_FFFF, 0),
];

const FAT32_CLUSTER_SIZES: [(u32, u32); 6] = [
    (66_600, 0),
    (532_480, 1),
    (16_777_216, 8),
    (33_554_432, 16),
    (67_108_864, 32),
    (0xFFFF_FFFF, 64),
];

/// Pick the cluster size, in sectors, for a new volume. Returns 0 when no
/// entry of the table covers `disk_size` bytes.
pub fn sectors_per_cluster(fat_type: FatType, disk_size: u64, bytes_per_sector: u32) -> u32 {
    let table: &[(u32, u32)] = match fat_type {
        FatType::Fat12 => return 1,
        FatType::Fat16 => &FAT16_CLUSTER_SIZES,
        FatType::Fat32 => &FAT32_CLUSTER_SIZES,
    };
    let scale = bytes_per_sector / 512;
    if scale == 0 {
        return 0;
    }
    table
        .iter()
        .find(|(limit, _)| u64::from(*limit) * 512 >= disk_size)
        .map_or(0, |(_, size)| size / scale)
}

/// The FAT32-only part of the BPB.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Bpb32 {
    /// Sectors per FAT
    pub fat_size32: u32,
    /// Mirroring flags
    pub ext_flags: u16,
    /// File system version
    pub fs_version: u16,
    /// First cluster of the root directory
    pub root_cluster: u32,
    /// Sector of the FSInfo structure
    pub fs_info: u16,
    /// Sector of the backup boot sector
    pub backup_boot_sector: u16,
}

/// The extended boot record that follows the BPB.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BootInfo {
    /// BIOS drive number
    pub drive_number: u8,
    /// Reserved, zero
    pub reserved1: u8,
    /// 0x29 when the following three fields are present
    pub boot_signature: u8,
    /// Volume serial number
    pub volume_id: u32,
    /// Volume label, space padded
    pub volume_label: [u8; 11],
    /// File system type string, informational only
    pub fs_type: [u8; 8],
}

/// A Boot Parameter Block, as stored in sector 0 of a FAT volume.
///
/// The FAT type is not stored anywhere, [`Bpb::fat_type`] derives it from
/// the cluster count.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Bpb {
    /// x86 jump over the BPB
    pub jmp_boot: [u8; 3],
    /// Name of the formatting system
    pub oem_name: [u8; 8],
    /// Bytes per sector
    pub bytes_per_sector: u16,
    /// Sectors per cluster
    pub sectors_per_cluster: u8,
    /// Sectors before the first FAT
    pub reserved_sector_count: u16,
    /// Number of FAT copies
    pub num_fats: u8,
    /// Slots in the fixed root directory, 0 on FAT32
    pub root_entry_count: u16,
    /// Total sectors when below 0x10000
    pub total_sectors16: u16,
    /// Media descriptor
    pub media: u8,
    /// Sectors per FAT, 0 on FAT32
    pub fat_size16: u16,
    /// Geometry hint
    pub sectors_per_track: u16,
    /// Geometry hint
    pub num_heads: u16,
    /// Sectors before this volume
    pub hidden_sectors: u32,
    /// Total sectors when `total_sectors16` is 0
    pub total_sectors32: u32,
    /// Present when `fat_size16` is 0
    pub fat32: Option<Bpb32>,
    /// Extended boot record
    pub boot: BootInfo,
}

impl Bpb {
    /// Default label written by [`Bpb::build`].
    pub const DEFAULT_LABEL: [u8; 11] = *b"NO NAME    ";
    const MEDIA_FIXED: u8 = 0xF8;
    const FOOTER: [u8; 2] = [0x55, 0xAA];

    /// Build the BPB for a fresh volume of `total_sectors` sectors.
    pub fn build(
        fat_type: FatType,
        total_sectors: u32,
        bytes_per_sector: u16,
    ) -> Result<Bpb, BpbError> {
        if !matches!(bytes_per_sector, 512 | 1024 | 2048 | 4096) {
            return Err(BpbError::BadGeometry);
        }
        let disk_size = u64::from(total_sectors) * u64::from(bytes_per_sector);
        let spc = sectors_per_cluster(fat_type, disk_size, u32::from(bytes_per_sector));
        if spc == 0 {
            return Err(BpbError::DiskSizeOutOfRange);
        }
        let is_fat32 = fat_type == FatType::Fat32;
        let mut bpb = Bpb {
            jmp_boot: [0xEB, 0x00, 0x90],
            oem_name: *b"MSWIN4.1",
            bytes_per_sector,
            sectors_per_cluster: spc as u8,
            reserved_sector_count: if is_fat32 { 32 } else { 1 },
            num_fats: 1,
            root_entry_count: if is_fat32 { 0 } else { 512 },
            total_sectors16: 0,
            media: Self::MEDIA_FIXED,
            fat_size16: 0,
            sectors_per_track: 0,
            num_heads: 0,
            hidden_sectors: 0,
            total_sectors32: 0,
            fat32: None,
            boot: BootInfo {
                drive_number: if fat_type == FatType::Fat12 { 0x00 } else { 0x80 },
                reserved1: 0,
                boot_signature: 0x29,
                volume_id: 0,
                volume_label: Self::DEFAULT_LABEL,
                fs_type: fat_type.label(),
            },
        };
        if total_sectors < 0x10000 {
            bpb.total_sectors16 = total_sectors as u16;
        } else {
            bpb.total_sectors32 = total_sectors;
        }

        let fat_size = bpb.compute_fat_size(is_fat32)?;
        if is_fat32 {
            bpb.fat32 = Some(Bpb32 {
                fat_size32: fat_size,
                ext_flags: 0x0081,
                fs_version: 0,
                // no root directory cluster is set up by format
                root_cluster: 0,
                fs_info: 1,
                backup_boot_sector: 0,
            });
        } else {
            bpb.fat_size16 = u16::try_from(fat_size).map_err(|_| BpbError::DiskSizeOutOfRange)?;
        }
        if bpb.cluster_count() == 0 {
            return Err(BpbError::DiskSizeOutOfRange);
        }
        Ok(bpb)
    }

    /// Sectors per FAT so that the FAT covers every data cluster.
    fn compute_fat_size(&self, is_fat32: bool) -> Result<u32, BpbError> {
        let metadata = u32::from(self.reserved_sector_count) + self.root_dir_sectors();
        let tmp1 = self
            .total_sectors()
            .checked_sub(metadata)
            .ok_or(BpbError::DiskSizeOutOfRange)?;
        let mut tmp2 = 256 * u32::from(self.sectors_per_cluster) + u32::from(self.num_fats);
        if is_fat32 {
            tmp2 /= 2;
        }
        Ok(tmp1.div_ceil(tmp2))
    }

    /// Decode sector 0.
    pub fn parse(data: &[u8]) -> Result<Bpb, BpbError> {
        if data.len() < BPB_LEN {
            return Err(BpbError::TooShort);
        }
        let fat_size16 = LittleEndian::read_u16(&data[22..24]);
        let (fat32, boot_offset) = if fat_size16 == 0 {
            let fat32 = Bpb32 {
                fat_size32: LittleEndian::read_u32(&data[36..40]),
                ext_flags: LittleEndian::read_u16(&data[40..42]),
                fs_version: LittleEndian::read_u16(&data[42..44]),
                root_cluster: LittleEndian::read_u32(&data[44..48]),
                fs_info: LittleEndian::read_u16(&data[48..50]),
                backup_boot_sector: LittleEndian::read_u16(&data[50..52]),
            };
            (Some(fat32), 64)
        } else {
            (None, 36)
        };
        let boot = &data[boot_offset..boot_offset + 26];
        let mut volume_label = [0u8; 11];
        volume_label.copy_from_slice(&boot[7..18]);
        let mut fs_type = [0u8; 8];
        fs_type.copy_from_slice(&boot[18..26]);
        let mut oem_name = [0u8; 8];
        oem_name.copy_from_slice(&data[3..11]);

        Ok(Bpb {
            jmp_boot: [data[0], data[1], data[2]],
            oem_name,
            bytes_per_sector: LittleEndian::read_u16(&data[11..13]),
            sectors_per_cluster: data[13],
            reserved_sector_count: LittleEndian::read_u16(&data[14..16]),
            num_fats: data[16],
            root_entry_count: LittleEndian::read_u16(&data[17..19]),
            total_sectors16: LittleEndian::read_u16(&data[19..21]),
            media: data[21],
            fat_size16,
            sectors_per_track: LittleEndian::read_u16(&data[24..26]),
            num_heads: LittleEndian::read_u16(&data[26..28]),
            hidden_sectors: LittleEndian::read_u32(&data[28..32]),
            total_sectors32: LittleEndian::read_u32(&data[32..36]),
            fat32,
            boot: BootInfo {
                drive_number: boot[0],
                reserved1: boot[1],
                boot_signature: boot[2],
                volume_id: LittleEndian::read_u32(&boot[3..7]),
                volume_label,
                fs_type,
            },
        })
    }

    /// Encode into the first 512 bytes of `data`. Bytes not covered by a
    /// field are zeroed, the boot sector signature goes at 510.
    pub fn serialize(&self, data: &mut [u8]) {
        let data = &mut data[..BPB_LEN];
        data.fill(0);
        data[0..3].copy_from_slice(&self.jmp_boot);
        data[3..11].copy_from_slice(&self.oem_name);
        LittleEndian::write_u16(&mut data[11..13], self.bytes_per_sector);
        data[13] = self.sectors_per_cluster;
        LittleEndian::write_u16(&mut data[14..16], self.reserved_sector_count);
        data[16] = self.num_fats;
        LittleEndian::write_u16(&mut data[17..19], self.root_entry_count);
        LittleEndian::write_u16(&mut data[19..21], self.total_sectors16);
        data[21] = self.media;
        LittleEndian::write_u16(&mut data[22..24], self.fat_size16);
        LittleEndian::write_u16(&mut data[24..26], self.sectors_per_track);
        LittleEndian::write_u16(&mut data[26..28], self.num_heads);
        LittleEndian::write_u32(&mut data[28..32], self.hidden_sectors);
        LittleEndian::write_u32(&mut data[32..36], self.total_sectors32);
        let boot_offset = match &self.fat32 {
            Some(fat32) => {
                LittleEndian::write_u32(&mut data[36..40], fat32.fat_size32);
                LittleEndian::write_u16(&mut data[40..42], fat32.ext_flags);
                LittleEndian::write_u16(&mut data[42..44], fat32.fs_version);
                LittleEndian::write_u32(&mut data[44..48], fat32.root_cluster);
                LittleEndian::write_u16(&mut data[48..50], fat32.fs_info);
                LittleEndian::write_u16(&mut data[50..52], fat32.backup_boot_sector);
                64
            }
            None => 36,
        };
        let boot = &mut data[boot_offset..boot_offset + 26];
        boot[0] = self.boot.drive_number;
        boot[1] = self.boot.reserved1;
        boot[2] = self.boot.boot_signature;
        LittleEndian::write_u32(&mut boot[3..7], self.boot.volume_id);
        boot[7..18].copy_from_slice(&self.boot.volume_label);
        boot[18..26].copy_from_slice(&self.boot.fs_type);
        data[510..512].copy_from_slice(&Self::FOOTER);
    }

    /// Does the sector start with one of the two x86 jumps a FAT boot
    /// sector carries?
    pub fn has_boot_jump(&self) -> bool {
        (self.jmp_boot[0] == 0xEB && self.jmp_boot[2] == 0x90) || self.jmp_boot[0] == 0xE9
    }

    /// Check the sector is a FAT boot sector whose geometry can be used
    /// without dividing by zero or running off the volume.
    pub fn validate(&self) -> Result<(), BpbError> {
        if !self.has_boot_jump() {
            return Err(BpbError::BadSignature);
        }
        let bps = self.bytes_per_sector;
        if bps < 512 || !bps.is_power_of_two() || self.sectors_per_cluster == 0 || self.num_fats == 0 {
            return Err(BpbError::BadGeometry);
        }
        if self.fat_size() == 0 || self.first_data_sector() >= self.total_sectors() {
            return Err(BpbError::BadGeometry);
        }
        Ok(())
    }

    /// Total sectors of the volume, from whichever field is in use.
    pub fn total_sectors(&self) -> u32 {
        if self.total_sectors16 != 0 {
            u32::from(self.total_sectors16)
        } else {
            self.total_sectors32
        }
    }

    /// Sectors per FAT, from whichever field is in use.
    pub fn fat_size(&self) -> u32 {
        if self.fat_size16 != 0 {
            u32::from(self.fat_size16)
        } else {
            self.fat32.map_or(0, |f| f.fat_size32)
        }
    }

    /// Sectors taken by the fixed root directory, 0 on FAT32.
    pub fn root_dir_sectors(&self) -> u32 {
        let bps = u32::from(self.bytes_per_sector);
        if bps == 0 {
            return 0;
        }
        (u32::from(self.root_entry_count) * 32).div_ceil(bps)
    }

    /// First sector of the first FAT.
    pub fn fat_start(&self) -> u32 {
        u32::from(self.reserved_sector_count)
    }

    /// First sector of the fixed root directory.
    pub fn root_dir_start(&self) -> u32 {
        self.fat_start() + u32::from(self.num_fats) * self.fat_size()
    }

    /// First sector of cluster 2.
    pub fn first_data_sector(&self) -> u32 {
        self.root_dir_start() + self.root_dir_sectors()
    }

    /// Number of data clusters.
    pub fn cluster_count(&self) -> u32 {
        if self.sectors_per_cluster == 0 {
            return 0;
        }
        self.total_sectors().saturating_sub(self.first_data_sector())
            / u32::from(self.sectors_per_cluster)
    }

    /// The FAT type, derived from the cluster count.
    pub fn fat_type(&self) -> FatType {
        FatType::from_cluster_count(self.cluster_count())
    }

    /// First cluster of the root directory. 0 means the fixed root region
    /// on FAT12/FAT16, and "no root" on FAT32.
    pub fn root_cluster(&self) -> ClusterId {
        ClusterId(self.fat32.map_or(0, |f| f.root_cluster))
    }

    /// Label stored in the extended boot record.
    pub fn volume_label(&self) -> &[u8; 11] {
        &self.boot.volume_label
    }
}

// ****************************************************************************
//
// Unit Tests
//
// ****************************************************************************


// ****************************************************************************
//
// End Of File
//
// ****************************************************************************
