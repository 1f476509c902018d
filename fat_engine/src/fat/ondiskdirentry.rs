//! Directory Entry as stored on-disk

use byteorder::{ByteOrder, LittleEndian};

use crate::filesystem::{Attributes, ClusterId, DirEntry, ShortFileName};

/// A 32-byte directory entry as stored on-disk in a directory file.
pub struct OnDiskDirEntry<'a> {
    data: &'a [u8],
}

impl<'a> core::fmt::Debug for OnDiskDirEntry<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "OnDiskDirEntry<")?;
        write!(f, "raw_attr = {}", self.raw_attr())?;
        write!(f, ", is_end = {}", self.is_end())?;
        write!(f, ", is_free = {}", self.is_free())?;
        write!(f, ", first_cluster = {}", self.first_cluster().0)?;
        write!(f, ", file_size = {}", self.file_size())?;
        write!(f, ">")
    }
}

impl<'a> OnDiskDirEntry<'a> {
    /// Size of one entry.
    pub const LEN: usize = 32;

    /// Create a new on-disk directory entry from a block of 32 bytes read
    /// from a directory file.
    pub fn new(data: &[u8]) -> OnDiskDirEntry {
        OnDiskDirEntry {
            data: &data[..Self::LEN],
        }
    }

    /// Is this the last entry in the directory?
    pub fn is_end(&self) -> bool {
        self.data[0] == ShortFileName::END_MARKER
    }

    /// Is this a deleted slot?
    pub fn is_free(&self) -> bool {
        self.data[0] == ShortFileName::FREE_MARKER
    }

    /// Is this an entry in use?
    pub fn is_live(&self) -> bool {
        !self.is_end() && !self.is_free()
    }

    /// The raw 11 byte name.
    pub fn name(&self) -> &[u8] {
        &self.data[0..11]
    }

    /// The raw attribute byte.
    pub fn raw_attr(&self) -> u8 {
        self.data[11]
    }

    /// Is this a volume label (or a long file name fragment)?
    pub fn is_volume_label(&self) -> bool {
        Attributes::create_from_fat(self.raw_attr()).is_volume()
    }

    /// First cluster, joined from the high and low halves.
    pub fn first_cluster(&self) -> ClusterId {
        let hi = u32::from(LittleEndian::read_u16(&self.data[20..22]));
        let lo = u32::from(LittleEndian::read_u16(&self.data[26..28]));
        ClusterId((hi << 16) | lo)
    }

    /// File size in bytes.
    pub fn file_size(&self) -> u32 {
        LittleEndian::read_u32(&self.data[28..32])
    }

    /// Convert the on-disk format into a DirEntry
    pub fn get_entry(&self) -> DirEntry {
        let mut name = [0u8; 11];
        name.copy_from_slice(self.name());
        DirEntry {
            name: ShortFileName::from_raw(name),
            attributes: Attributes::create_from_fat(self.raw_attr()),
            nt_reserved: self.data[12],
            ctime_tenths: self.data[13],
            ctime: LittleEndian::read_u16(&self.data[14..16]),
            cdate: LittleEndian::read_u16(&self.data[16..18]),
            adate: LittleEndian::read_u16(&self.data[18..20]),
            mtime: LittleEndian::read_u16(&self.data[22..24]),
            mdate: LittleEndian::read_u16(&self.data[24..26]),
            cluster: self.first_cluster(),
            size: self.file_size(),
        }
    }
}

/// What a directory search is looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The first entry in use.
    Live,
    /// The first deleted slot.
    Free,
    /// The entry that ends the directory.
    End,
    /// An entry with exactly this name.
    Name(ShortFileName),
}

impl Target {
    fn matches(&self, entry: &OnDiskDirEntry) -> bool {
        match self {
            Target::Live => entry.is_live(),
            Target::Free => entry.is_free(),
            Target::End => entry.is_end(),
            Target::Name(name) => entry.name() == name.as_bytes(),
        }
    }
}

/// How a scan of one sector ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The target is at the returned slot.
    Found,
    /// The returned slot ends the directory, nothing follows.
    NoMoreEntries,
    /// The sector holds no match, carry on with the next one.
    NotFoundContinue,
}

/// Scan slots `first..=last` of a directory sector for `target`.
///
/// A slot that matches wins even when it is the terminator, so a search for
/// [`Target::End`] finds the place to append.
pub fn find_in_sector(
    sector: &[u8],
    target: &Target,
    first: usize,
    last: usize,
) -> (usize, ScanOutcome) {
    let last = last.min(sector.len() / OnDiskDirEntry::LEN - 1);
    for index in first..=last {
        let start = index * OnDiskDirEntry::LEN;
        let entry = OnDiskDirEntry::new(&sector[start..start + OnDiskDirEntry::LEN]);
        if target.matches(&entry) {
            return (index, ScanOutcome::Found);
        }
        if entry.is_end() {
            return (index, ScanOutcome::NoMoreEntries);
        }
    }
    (last, ScanOutcome::NotFoundContinue)
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
