/// Identifies a cluster on disk.
///
/// Cluster 0 means "free" in the FAT and "root directory" in a directory
/// entry, cluster 1 is reserved, data clusters start at 2.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterId(pub u32);

impl ClusterId {
    /// Marks a free FAT entry, or a file with no data yet.
    pub const FREE: ClusterId = ClusterId(0);
    /// The entry carrying the dismount / hard-error marker.
    pub const RESERVED: ClusterId = ClusterId(1);
    /// The first cluster of the data region.
    pub const FIRST_DATA: ClusterId = ClusterId(2);
    /// A fixed root directory (FAT12/FAT16) is addressed as cluster 0.
    pub const ROOT_DIR: ClusterId = ClusterId(0);

    /// Is this a free entry / an empty file.
    pub fn is_free(self) -> bool {
        self.0 == 0
    }
}

impl core::ops::Add<u32> for ClusterId {
    type Output = ClusterId;
    fn add(self, rhs: u32) -> ClusterId {
        ClusterId(self.0 + rhs)
    }
}

impl core::ops::AddAssign<u32> for ClusterId {
    fn add_assign(&mut self, rhs: u32) {
        self.0 += rhs;
    }
}

impl From<u32> for ClusterId {
    fn from(value: u32) -> Self {
        ClusterId(value)
    }
}
