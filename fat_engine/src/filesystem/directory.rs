use byteorder::{ByteOrder, LittleEndian};

use crate::fat::ondiskdirentry::OnDiskDirEntry;

use super::attributes::Attributes;
use super::cluster::ClusterId;
use super::filename::ShortFileName;
use super::timestamp::Timestamp;

/// Represents a directory entry, which tells you about
/// other files and directories.
///
/// Dates and times are kept in their packed FAT form so a record read from
/// disk is written back unchanged.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DirEntry {
    /// The name of the file
    pub name: ShortFileName,
    /// The file attributes (Read Only, Archive, etc)
    pub attributes: Attributes,
    /// Byte 12, reserved for Windows NT
    pub nt_reserved: u8,
    /// Creation time, tenths of a second
    pub ctime_tenths: u8,
    /// Creation time, FAT time format
    pub ctime: u16,
    /// Creation date, FAT date format
    pub cdate: u16,
    /// Last access date, FAT date format
    pub adate: u16,
    /// Last write time, FAT time format
    pub mtime: u16,
    /// Last write date, FAT date format
    pub mdate: u16,
    /// The starting cluster of the file. The FAT tells us the following Clusters.
    pub cluster: ClusterId,
    /// The size of the file in bytes.
    pub size: u32,
}

impl DirEntry {
    /// A zero-size entry with the given name and attributes, created and
    /// modified at `now`.
    pub fn new(name: ShortFileName, attributes: Attributes, now: Timestamp) -> DirEntry {
        let (date, time) = now.to_fat();
        DirEntry {
            name,
            attributes,
            nt_reserved: 0,
            ctime_tenths: 0,
            ctime: time,
            cdate: date,
            adate: date,
            mtime: time,
            mdate: date,
            cluster: ClusterId::FREE,
            size: 0,
        }
    }

    /// The all-zero record that ends a directory.
    pub fn terminator() -> DirEntry {
        DirEntry {
            name: ShortFileName::from_raw([0u8; 11]),
            attributes: Attributes(0),
            nt_reserved: 0,
            ctime_tenths: 0,
            ctime: 0,
            cdate: 0,
            adate: 0,
            mtime: 0,
            mdate: 0,
            cluster: ClusterId::FREE,
            size: 0,
        }
    }

    /// A volume label record.
    pub fn volume_label(label: [u8; 11]) -> DirEntry {
        let mut entry = DirEntry::terminator();
        entry.name = ShortFileName::from_raw(label);
        entry.attributes = Attributes(Attributes::VOLUME);
        entry
    }

    /// Decode a 32 byte record.
    pub fn parse(data: &[u8]) -> DirEntry {
        OnDiskDirEntry::new(data).get_entry()
    }

    /// Encode as a 32 byte record.
    pub fn serialize(&self) -> [u8; OnDiskDirEntry::LEN] {
        let mut data = [0u8; OnDiskDirEntry::LEN];
        data[0..11].copy_from_slice(&self.name.contents);
        data[11] = self.attributes.0;
        data[12] = self.nt_reserved;
        data[13] = self.ctime_tenths;
        LittleEndian::write_u16(&mut data[14..16], self.ctime);
        LittleEndian::write_u16(&mut data[16..18], self.cdate);
        LittleEndian::write_u16(&mut data[18..20], self.adate);
        LittleEndian::write_u16(&mut data[20..22], (self.cluster.0 >> 16) as u16);
        LittleEndian::write_u16(&mut data[22..24], self.mtime);
        LittleEndian::write_u16(&mut data[24..26], self.mdate);
        LittleEndian::write_u16(&mut data[26..28], self.cluster.0 as u16);
        LittleEndian::write_u32(&mut data[28..32], self.size);
        data
    }

    /// When the entry was created.
    pub fn created(&self) -> Timestamp {
        Timestamp::from_fat(self.cdate, self.ctime)
    }

    /// When the entry was last written.
    pub fn modified(&self) -> Timestamp {
        Timestamp::from_fat(self.mdate, self.mtime)
    }

    /// Stamp the last write time.
    pub fn touch(&mut self, now: Timestamp) {
        let (date, time) = now.to_fat();
        self.mdate = date;
        self.mtime = time;
        self.adate = date;
    }

    /// Slot was deleted and may be reused.
    pub fn is_free(&self) -> bool {
        self.name.contents[0] == ShortFileName::FREE_MARKER
    }

    /// Record ends the directory.
    pub fn is_end(&self) -> bool {
        self.name.contents[0] == ShortFileName::END_MARKER
    }

    /// Mark the record deleted.
    pub fn tombstone(&mut self) {
        self.name.contents[0] = ShortFileName::FREE_MARKER;
    }
}

/// Where a directory entry lives: the directory's cluster, the sector within
/// that cluster and the slot within that sector.
///
/// Cluster 0 addresses the fixed root region on FAT12/FAT16, in which case
/// `sector` counts from the start of the root region.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EntryLocation {
    /// Cluster of the directory, 0 for the fixed root
    pub cluster: ClusterId,
    /// Sector within the cluster (or within the root region)
    pub sector: u32,
    /// Slot within the sector
    pub number: u32,
}

impl EntryLocation {
    /// The first slot of a directory starting at `cluster`.
    pub fn start_of(cluster: ClusterId) -> EntryLocation {
        EntryLocation {
            cluster,
            sector: 0,
            number: 0,
        }
    }
}

/// A file or directory as seen by the last lookup: a snapshot of its entry
/// plus where that entry lives. Nothing is cached, every change goes back
/// to disk through `location`.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Snapshot of the directory entry
    pub entry: DirEntry,
    /// Location of the entry on disk
    pub location: EntryLocation,
}

impl Node {
    /// The synthetic node standing for the root directory.
    pub fn root(cluster: ClusterId) -> Node {
        let mut entry = DirEntry::terminator();
        entry.name = ShortFileName::blank();
        entry.attributes = Attributes(Attributes::VOLUME);
        entry.cluster = cluster;
        Node {
            entry,
            location: EntryLocation::start_of(ClusterId::ROOT_DIR),
        }
    }

    /// Name of the entry.
    pub fn name(&self) -> &ShortFileName {
        &self.entry.name
    }

    /// Size in bytes, 0 for directories.
    pub fn size(&self) -> u32 {
        self.entry.size
    }

    /// First cluster of the data, 0 when none is allocated.
    pub fn first_cluster(&self) -> ClusterId {
        self.entry.cluster
    }

    /// Is this a directory (the root included)?
    pub fn is_dir(&self) -> bool {
        self.entry.attributes.is_directory() || self.is_root()
    }

    /// Does this node stand for the root directory? That is the case for
    /// the synthetic root, and for a `..` entry of a top-level directory.
    pub fn is_root(&self) -> bool {
        let attributes = self.entry.attributes;
        (attributes.is_volume() && !attributes.is_lfn())
            || (attributes.is_directory() && self.entry.cluster.is_free())
            || self.entry.name.contents[0] == b' '
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
