//! A mounted FAT volume and the file operations on it.

use alloc::vec;

use crate::blockdevice::{BlockCount, BlockDevice, BlockIdx};
use crate::fat::bpb::{Bpb, BpbError};
use crate::fat::ondiskdirentry::Target;
use crate::fat::table::FatTable;
use crate::fat::{FatType, RESERVED_ENTRIES};
use crate::filesystem::{
    Attributes, ClusterId, DirEntry, EntryLocation, FreeClusterList, Node, ShortFileName,
    TimeSource, Timestamp, ToShortFileName, MAX_FILE_SIZE,
};
use crate::{debug, info, trace, warn, Error};

/// Health markers kept in the reserved FAT entry of cluster 1.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VolumeFlags {
    /// The volume was unmounted properly last time.
    pub clean_shutdown: bool,
    /// No disk I/O error was recorded.
    pub no_hard_error: bool,
}

/// Write a fresh, empty volume onto `device`.
///
/// `None` picks the FAT type from the number of sectors. The type of the
/// result is decided by its cluster count, which can differ from the one
/// requested (see [`Bpb::fat_type`]). No root directory is created on
/// FAT32, such a volume mounts but every root operation fails with
/// [`Error::UnsupportedFatType`].
pub fn format<D>(device: &mut D, fat_type: Option<FatType>) -> Result<Bpb, Error<D::Error>>
where
    D: BlockDevice,
{
    let num_sectors = device.num_blocks().0;
    let requested = fat_type.unwrap_or_else(|| FatType::for_sector_count(num_sectors));
    let bytes_per_sector =
        u16::try_from(device.bytes_per_sector()).map_err(|_| Error::from(BpbError::BadGeometry))?;
    let bpb = Bpb::build(requested, num_sectors, bytes_per_sector)?;

    let mut sector = vec![0u8; usize::from(bytes_per_sector)];
    bpb.serialize(&mut sector);
    device
        .write_sector(BlockIdx(0), &sector)
        .map_err(Error::DeviceIoError)?;

    let fat_type = bpb.fat_type();
    info!(
        "formatting {:?}: {} sectors, {} sectors per cluster, {} sectors per FAT, {} clusters",
        fat_type,
        num_sectors,
        bpb.sectors_per_cluster,
        bpb.fat_size(),
        bpb.cluster_count()
    );
    if fat_type != requested {
        warn!("requested {:?} but the geometry gives {:?}", requested, fat_type);
    }

    sector.fill(0);
    let fat_sectors = u32::from(bpb.num_fats) * bpb.fat_size();
    for offset in 0..fat_sectors {
        device
            .write_sector(BlockIdx(bpb.fat_start() + offset), &sector)
            .map_err(Error::DeviceIoError)?;
    }
    let table = FatTable::from_bpb(&bpb);
    let media_entry = (0x0FFF_FF00 | u32::from(bpb.media)) & fat_type.entry_mask();
    table.write_entry(&mut *device, ClusterId(0), media_entry)?;
    table.write_entry(&mut *device, ClusterId::RESERVED, fat_type.eoc_marker())?;

    if fat_type == FatType::Fat32 {
        warn!("no root directory is created on FAT32, the volume has no root");
        return Ok(bpb);
    }

    for offset in 1..bpb.root_dir_sectors() {
        device
            .write_sector(BlockIdx(bpb.root_dir_start() + offset), &sector)
            .map_err(Error::DeviceIoError)?;
    }
    let label = DirEntry::volume_label(bpb.boot.volume_label);
    sector[..32].copy_from_slice(&label.serialize());
    device
        .write_sector(BlockIdx(bpb.root_dir_start()), &sector)
        .map_err(Error::DeviceIoError)?;
    Ok(bpb)
}

/// A mounted FAT volume.
///
/// Holds the device for as long as it is mounted, so there can only be one
/// mount per device. Every operation goes straight to the device, there is
/// nothing to flush.
pub struct FatFileSystem<'a, D, T>
where
    D: BlockDevice,
    T: TimeSource,
{
    pub(crate) device: &'a mut D,
    pub(crate) time_source: T,
    pub(crate) bpb: Bpb,
    pub(crate) table: FatTable,
    pub(crate) eoc_marker: u32,
    pub(crate) free_clusters: FreeClusterList,
}

impl<'a, D, T> FatFileSystem<'a, D, T>
where
    D: BlockDevice,
    T: TimeSource,
{
    /// Mount the volume on `device`, returning it together with its root
    /// directory.
    ///
    /// Every FAT entry is read once to build the pool of free clusters.
    pub fn mount(device: &'a mut D, time_source: T) -> Result<(Self, Node), Error<D::Error>> {
        let bytes_per_sector = device.bytes_per_sector();
        let mut sector = vec![0u8; bytes_per_sector];
        device
            .read_sector(BlockIdx(0), &mut sector)
            .map_err(Error::DeviceIoError)?;
        let bpb = Bpb::parse(&sector)?;
        bpb.validate()?;
        if usize::from(bpb.bytes_per_sector) != bytes_per_sector {
            warn!(
                "volume uses {} byte sectors, device has {}",
                bpb.bytes_per_sector, bytes_per_sector
            );
            return Err(Error::InvalidBpb);
        }

        let table = FatTable::from_bpb(&bpb);
        let eoc_marker = table.read_entry(&*device, ClusterId::RESERVED)?;
        let mut fs = FatFileSystem {
            device,
            time_source,
            bpb,
            table,
            eoc_marker,
            free_clusters: FreeClusterList::new(),
        };

        let flags = fs.volume_flags();
        if !flags.clean_shutdown {
            warn!("volume was not dismounted cleanly");
        }
        if !flags.no_hard_error {
            warn!("volume reports a hard error");
        }

        fs.scan_free_clusters()?;
        info!(
            "mounted {:?}: {} sectors, {} clusters, {} free",
            fs.fat_type(),
            fs.bpb.total_sectors(),
            fs.bpb.cluster_count(),
            fs.free_clusters.count()
        );
        let root = Node::root(fs.bpb.root_cluster());
        Ok((fs, root))
    }

    /// Let go of the volume.
    pub fn unmount(mut self) {
        self.free_clusters.release();
        debug!("unmounted");
    }

    fn scan_free_clusters(&mut self) -> Result<(), Error<D::Error>> {
        self.free_clusters.release();
        let end = RESERVED_ENTRIES + self.bpb.cluster_count();
        for number in RESERVED_ENTRIES..end {
            let cluster = ClusterId(number);
            if self.table.read_entry(&*self.device, cluster)? == 0 {
                self.free_clusters.push(cluster);
            }
        }
        Ok(())
    }

    /// The type of the volume.
    pub fn fat_type(&self) -> FatType {
        self.table.fat_type()
    }

    /// The boot parameter block read at mount.
    pub fn bpb(&self) -> &Bpb {
        &self.bpb
    }

    /// The FAT entry of cluster 1, as read at mount.
    pub fn eoc_marker(&self) -> u32 {
        self.eoc_marker
    }

    /// The pool of free clusters.
    pub fn free_clusters(&self) -> &FreeClusterList {
        &self.free_clusters
    }

    /// The label stored in the boot sector.
    pub fn volume_label(&self) -> &[u8; 11] {
        self.bpb.volume_label()
    }

    /// The root directory.
    pub fn root(&self) -> Node {
        Node::root(self.bpb.root_cluster())
    }

    /// Decode the dismount and error bits of cluster 1. FAT12 has none.
    pub fn volume_flags(&self) -> VolumeFlags {
        let (clean, no_error) = match self.fat_type() {
            FatType::Fat12 => (0, 0),
            FatType::Fat16 => (0x8000, 0x4000),
            FatType::Fat32 => (0x0800_0000, 0x0400_0000),
        };
        VolumeFlags {
            clean_shutdown: self.eoc_marker & clean == clean,
            no_hard_error: self.eoc_marker & no_error == no_error,
        }
    }

    /// Size of a cluster in bytes.
    pub fn bytes_per_cluster(&self) -> usize {
        self.bytes_per_sector() * usize::from(self.bpb.sectors_per_cluster)
    }

    /// `(total, used)` sectors of the volume, from the free cluster count.
    pub fn free_space(&self) -> (u32, u32) {
        let total = self.bpb.total_sectors();
        let free = self.free_clusters.count() * u32::from(self.bpb.sectors_per_cluster);
        (total, total.saturating_sub(free))
    }

    pub(crate) fn bytes_per_sector(&self) -> usize {
        usize::from(self.bpb.bytes_per_sector)
    }

    pub(crate) fn entries_per_sector(&self) -> u32 {
        (self.bytes_per_sector() / 32) as u32
    }

    fn now(&self) -> Timestamp {
        self.time_source.get_timestamp()
    }

    pub(crate) fn read_sector(&self, idx: BlockIdx, sector: &mut [u8]) -> Result<(), Error<D::Error>> {
        self.device
            .read_sector(idx, sector)
            .map_err(Error::DeviceIoError)
    }

    pub(crate) fn write_sector(&mut self, idx: BlockIdx, sector: &[u8]) -> Result<(), Error<D::Error>> {
        self.device
            .write_sector(idx, sector)
            .map_err(Error::DeviceIoError)
    }

    /// First sector of a data cluster.
    fn cluster_to_sector(&self, cluster: ClusterId) -> Result<BlockIdx, Error<D::Error>> {
        let index = cluster
            .0
            .checked_sub(RESERVED_ENTRIES)
            .filter(|i| *i < self.bpb.cluster_count())
            .ok_or(Error::BadCluster(cluster))?;
        Ok(BlockIdx(
            self.bpb.first_data_sector() + index * u32::from(self.bpb.sectors_per_cluster),
        ))
    }

    /// Sector holding the directory entry at `location`.
    pub(crate) fn dir_sector(&self, location: &EntryLocation) -> Result<BlockIdx, Error<D::Error>> {
        if location.cluster == ClusterId::ROOT_DIR {
            if self.fat_type() == FatType::Fat32 {
                return Err(Error::UnsupportedFatType);
            }
            if location.sector >= self.bpb.root_dir_sectors() {
                return Err(Error::BadCluster(location.cluster));
            }
            return Ok(BlockIdx(self.bpb.root_dir_start() + location.sector));
        }
        Ok(self.cluster_to_sector(location.cluster)? + BlockCount(location.sector))
    }

    /// Cluster following `cluster` in its chain, `None` at the end.
    pub(crate) fn next_cluster(&self, cluster: ClusterId) -> Result<Option<ClusterId>, Error<D::Error>> {
        let value = self.table.read_entry(&*self.device, cluster)?;
        if value == 0 || self.table.is_end_of_chain(value) {
            Ok(None)
        } else {
            Ok(Some(ClusterId(value)))
        }
    }

    /// Take a free cluster, mark it as the end of its chain and link it after
    /// `tail`. Pass [`ClusterId::FREE`] as `tail` to start a new chain.
    pub fn chain_allocate(&mut self, tail: ClusterId) -> Result<ClusterId, Error<D::Error>> {
        let Some(cluster) = self.free_clusters.pop() else {
            warn!("no free cluster left");
            return Err(Error::ClusterExhausted);
        };
        if !tail.is_free() {
            self.table.write_entry(&mut *self.device, tail, cluster.0)?;
        }
        let eoc = self.fat_type().eoc_marker();
        self.table.write_entry(&mut *self.device, cluster, eoc)?;
        trace!("allocated cluster {:?} after {:?}", cluster, tail);
        Ok(cluster)
    }

    /// Release every cluster of the chain starting at `first`. A chain that
    /// is already free is left alone.
    pub fn free_chain(&mut self, first: ClusterId) -> Result<(), Error<D::Error>> {
        let mut cluster = first;
        while cluster >= ClusterId::FIRST_DATA && !self.table.is_end_of_chain(cluster.0) {
            let next = self.table.read_entry(&*self.device, cluster)?;
            if next == 0 {
                // already released
                break;
            }
            self.table.write_entry(&mut *self.device, cluster, 0)?;
            self.free_clusters.push(cluster);
            trace!("freed cluster {:?}", cluster);
            cluster = ClusterId(next);
        }
        Ok(())
    }

    /// Cluster to search for the entries of `dir`.
    fn search_root(&self, dir: &Node) -> Result<ClusterId, Error<D::Error>> {
        if dir.is_root() {
            if self.fat_type() != FatType::Fat32 {
                return Ok(ClusterId::ROOT_DIR);
            }
            let root = self.bpb.root_cluster();
            if root.is_free() {
                return Err(Error::UnsupportedFatType);
            }
            return Ok(root);
        }
        if !dir.entry.attributes.is_directory() {
            return Err(Error::NotADirectory);
        }
        Ok(dir.first_cluster())
    }

    /// Fail with `AlreadyExists` if `name` is live in the directory at `dir`.
    fn ensure_absent(&self, dir: ClusterId, name: &ShortFileName) -> Result<(), Error<D::Error>> {
        if *name == ShortFileName::this_dir() || *name == ShortFileName::parent_dir() {
            return Err(Error::AlreadyExists);
        }
        match self.lookup_entry(EntryLocation::start_of(dir), &Target::Name(name.clone())) {
            Ok(_) => Err(Error::AlreadyExists),
            Err(Error::NotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Look up `name` in the directory `parent`.
    pub fn lookup<N>(&self, parent: &Node, name: N) -> Result<Node, Error<D::Error>>
    where
        N: ToShortFileName,
    {
        let name = name.to_short_filename()?;
        let dir = self.search_root(parent)?;
        self.lookup_entry(EntryLocation::start_of(dir), &Target::Name(name))
    }

    /// Call `visit` for every file and directory in `dir`, in on-disk order.
    pub fn read_dir<F>(&self, dir: &Node, visit: F) -> Result<(), Error<D::Error>>
    where
        F: FnMut(&Node),
    {
        let dir = self.search_root(dir)?;
        self.visit_entries(dir, visit)
    }

    /// Create an empty file called `name` in `parent`.
    pub fn create<N>(&mut self, parent: &Node, name: N) -> Result<Node, Error<D::Error>>
    where
        N: ToShortFileName,
    {
        let name = name.to_short_filename()?;
        let dir = self.search_root(parent)?;
        self.ensure_absent(dir, &name)?;
        let entry = DirEntry::new(name, Attributes(Attributes::ARCHIVE), self.now());
        let location = self.insert_entry(dir, &entry, false)?;
        Ok(Node { entry, location })
    }

    /// Create a directory called `name` in `parent`, holding `.` and `..`.
    pub fn mkdir<N>(&mut self, parent: &Node, name: N) -> Result<Node, Error<D::Error>>
    where
        N: ToShortFileName,
    {
        let name = name.to_short_filename()?;
        let dir = self.search_root(parent)?;
        self.ensure_absent(dir, &name)?;

        let now = self.now();
        let cluster = self.chain_allocate(ClusterId::FREE)?;
        let mut entry = DirEntry::new(name, Attributes(Attributes::DIRECTORY), now);
        entry.cluster = cluster;
        let location = match self.insert_entry(dir, &entry, false) {
            Ok(location) => location,
            // nothing was written to the parent, the cluster can go back
            Err(e @ (Error::ClusterExhausted | Error::DirectoryFull)) => {
                self.free_chain(cluster)?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let mut dot = DirEntry::new(ShortFileName::this_dir(), Attributes(Attributes::DIRECTORY), now);
        dot.cluster = cluster;
        self.insert_entry(cluster, &dot, true)?;
        let mut dotdot =
            DirEntry::new(ShortFileName::parent_dir(), Attributes(Attributes::DIRECTORY), now);
        // `..` of a top-level directory points at cluster 0, on FAT32 too
        dotdot.cluster = if parent.is_root() { ClusterId::ROOT_DIR } else { dir };
        self.insert_entry(cluster, &dotdot, false)?;
        debug!("created directory at {:?}", cluster);
        Ok(Node { entry, location })
    }

    /// Remove the empty directory `node`.
    pub fn rmdir(&mut self, node: &Node) -> Result<(), Error<D::Error>> {
        if !node.entry.attributes.is_directory() {
            return Err(Error::NotADirectory);
        }
        if *node.name() == ShortFileName::this_dir() || *node.name() == ShortFileName::parent_dir() {
            return Err(Error::NotEmpty);
        }
        let first = node.first_cluster();
        if !first.is_free() {
            // slots 0 and 1 hold `.` and `..`
            let probe = EntryLocation {
                cluster: first,
                sector: 0,
                number: 2,
            };
            match self.lookup_entry(probe, &Target::Live) {
                Ok(_) => return Err(Error::NotEmpty),
                Err(Error::NotFound) => {}
                Err(e) => return Err(e),
            }
        }
        let mut entry = node.entry.clone();
        entry.tombstone();
        self.set_entry(&node.location, &entry)?;
        self.free_chain(first)
    }

    /// Delete the file `node` and release its clusters.
    pub fn remove(&mut self, node: &Node) -> Result<(), Error<D::Error>> {
        if node.is_dir() {
            return Err(Error::IsADirectory);
        }
        let mut entry = node.entry.clone();
        entry.tombstone();
        self.set_entry(&node.location, &entry)?;
        self.free_chain(node.first_cluster())
    }

    /// Read from `file` at `offset` into `buffer`, up to the end of the file.
    ///
    /// Returns the number of bytes read. A device error after some bytes
    /// were copied ends the read early and the count so far is returned.
    pub fn read(&self, file: &Node, offset: u32, buffer: &mut [u8]) -> Result<usize, Error<D::Error>> {
        if file.is_dir() {
            return Err(Error::IsADirectory);
        }
        let mut copied = 0;
        match self.read_span(file, offset, buffer, &mut copied) {
            Ok(()) => Ok(copied),
            Err(e) if copied == 0 => Err(e),
            Err(_) => {
                warn!("read stopped after {} bytes", copied);
                Ok(copied)
            }
        }
    }

    fn read_span(
        &self,
        file: &Node,
        offset: u32,
        buffer: &mut [u8],
        copied: &mut usize,
    ) -> Result<(), Error<D::Error>> {
        let bps = self.bytes_per_sector() as u64;
        let bpc = self.bytes_per_cluster() as u64;
        let start = u64::from(offset);
        let end = (start + buffer.len() as u64).min(u64::from(file.size()));
        let mut sector = vec![0u8; bps as usize];
        let mut cluster = file.first_cluster();
        let mut cluster_index = 0;
        let mut pos = start;
        while pos < end {
            while cluster_index < pos / bpc {
                cluster = self
                    .next_cluster(cluster)?
                    .ok_or(Error::BadCluster(cluster))?;
                cluster_index += 1;
            }
            let sector_offset = (pos % bps) as usize;
            let len = (bps as usize - sector_offset).min((end - pos) as usize);
            let idx = self.cluster_to_sector(cluster)? + BlockCount(((pos % bpc) / bps) as u32);
            self.read_sector(idx, &mut sector)?;
            let at = (pos - start) as usize;
            buffer[at..at + len].copy_from_slice(&sector[sector_offset..sector_offset + len]);
            *copied += len;
            pos += len as u64;
        }
        Ok(())
    }

    /// Write `buffer` into `file` at `offset`, growing the file as needed.
    ///
    /// Returns the number of bytes written. Running out of clusters (or a
    /// device error) after some bytes landed ends the write early and the
    /// count so far is returned; those bytes stay written. The entry of
    /// `file` is updated on disk and in `file`.
    pub fn write(&mut self, file: &mut Node, offset: u32, buffer: &[u8]) -> Result<usize, Error<D::Error>> {
        if file.is_dir() {
            return Err(Error::IsADirectory);
        }
        let first_before = file.first_cluster();
        let mut written = 0;
        let result = self.write_span(file, offset, buffer, &mut written);
        if written > 0 {
            let end = (u64::from(offset) + written as u64) as u32;
            file.entry.size = file.entry.size.max(end);
        }
        if written > 0 || file.first_cluster() != first_before {
            let now = self.now();
            file.entry.touch(now);
            file.entry.attributes.0 |= Attributes::ARCHIVE;
            self.set_entry(&file.location, &file.entry)?;
        }
        match result {
            Ok(()) => Ok(written),
            Err(e) if written == 0 => Err(e),
            Err(_) => {
                warn!("write stopped after {} bytes", written);
                Ok(written)
            }
        }
    }

    fn write_span(
        &mut self,
        file: &mut Node,
        offset: u32,
        buffer: &[u8],
        written: &mut usize,
    ) -> Result<(), Error<D::Error>> {
        let bps = self.bytes_per_sector() as u64;
        let bpc = self.bytes_per_cluster() as u64;
        let start = u64::from(offset);
        let end = (start + buffer.len() as u64).min(u64::from(MAX_FILE_SIZE));
        if start >= end {
            return Ok(());
        }
        if file.first_cluster().is_free() {
            file.entry.cluster = self.chain_allocate(ClusterId::FREE)?;
        }
        let mut sector = vec![0u8; bps as usize];
        let mut cluster = file.first_cluster();
        let mut cluster_index = 0;
        let mut pos = start;
        while pos < end {
            while cluster_index < pos / bpc {
                cluster = match self.next_cluster(cluster)? {
                    Some(next) => next,
                    None => self.chain_allocate(cluster)?,
                };
                cluster_index += 1;
            }
            let sector_offset = (pos % bps) as usize;
            let len = (bps as usize - sector_offset).min((end - pos) as usize);
            let idx = self.cluster_to_sector(cluster)? + BlockCount(((pos % bpc) / bps) as u32);
            if len as u64 != bps {
                self.read_sector(idx, &mut sector)?;
            }
            let at = (pos - start) as usize;
            sector[sector_offset..sector_offset + len].copy_from_slice(&buffer[at..at + len]);
            self.write_sector(idx, &sector)?;
            *written += len;
            pos += len as u64;
        }
        Ok(())
    }
}

impl<'a, D, T> core::fmt::Debug for FatFileSystem<'a, D, T>
where
    D: BlockDevice,
    T: TimeSource,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FatFileSystem")
            .field("fat_type", &self.fat_type())
            .field("bpb", &self.bpb)
            .field("eoc_marker", &self.eoc_marker)
            .field("free_clusters", &self.free_clusters)
            .finish()
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

    struct Epoch;

    impl TimeSource for Epoch {
        fn get_timestamp(&self) -> Timestamp {
            Timestamp::from_fat(0, 0)
        }
    }

    #[test]
    fn test_format_reserved_entries() {
        let mut disk = RamDisk::new(4096, 512);
        format(&mut disk, Some(FatType::Fat12)).unwrap();
        assert_eq!(&disk.as_bytes()[512..518], &hex!("F8 FF FF 00 00 00"));

        let mut disk = RamDisk::new(20_000, 512);
        format(&mut disk, Some(FatType::Fat16)).unwrap();
        assert_eq!(&disk.as_bytes()[512..518], &hex!("F8 FF FF FF 00 00"));
    }

    #[test]
    fn test_format_root_holds_label() {
        let mut disk = RamDisk::new(4096, 512);
        let bpb = format(&mut disk, Some(FatType::Fat12)).unwrap();
        let root = bpb.root_dir_start() as usize * 512;
        assert_eq!(&disk.as_bytes()[root..root + 11], b"NO NAME    ");
        assert_eq!(disk.as_bytes()[root + 11], Attributes::VOLUME);
        assert_eq!(disk.as_bytes()[root + 32], 0);
    }

    #[test]
    fn test_mount_reads_markers() {
        let mut disk = RamDisk::new(20_000, 512);
        format(&mut disk, None).unwrap();
        let (fs, root) = FatFileSystem::mount(&mut disk, Epoch).unwrap();
        assert_eq!(fs.fat_type(), FatType::Fat16);
        assert_eq!(fs.eoc_marker(), 0xFFFF);
        assert_eq!(
            fs.volume_flags(),
            VolumeFlags {
                clean_shutdown: true,
                no_hard_error: true
            }
        );
        assert!(root.is_root());
        assert_eq!(fs.free_clusters().count(), fs.bpb().cluster_count());
    }

    #[test]
    fn test_dirty_flag_is_reported() {
        let mut disk = RamDisk::new(20_000, 512);
        format(&mut disk, Some(FatType::Fat16)).unwrap();
        // clear the clean shutdown bit of cluster 1
        let mut sector = [0u8; 512];
        disk.read_sector(BlockIdx(1), &mut sector).unwrap();
        sector[3] = 0x7F;
        disk.write_sector(BlockIdx(1), &sector).unwrap();
        let (fs, _) = FatFileSystem::mount(&mut disk, Epoch).unwrap();
        assert!(!fs.volume_flags().clean_shutdown);
        assert!(fs.volume_flags().no_hard_error);
    }

    #[test]
    fn test_chain_allocate_and_free() {
        let mut disk = RamDisk::new(4096, 512);
        format(&mut disk, Some(FatType::Fat12)).unwrap();
        let (mut fs, _) = FatFileSystem::mount(&mut disk, Epoch).unwrap();
        let before = fs.free_clusters().count();
        let a = fs.chain_allocate(ClusterId::FREE).unwrap();
        let b = fs.chain_allocate(a).unwrap();
        let c = fs.chain_allocate(b).unwrap();
        assert_eq!(fs.next_cluster(a).unwrap(), Some(b));
        assert_eq!(fs.next_cluster(b).unwrap(), Some(c));
        assert_eq!(fs.next_cluster(c).unwrap(), None);
        assert_eq!(fs.free_clusters().count(), before - 3);
        fs.free_chain(a).unwrap();
        assert_eq!(fs.free_clusters().count(), before);
        fs.free_chain(a).unwrap();
        assert_eq!(fs.free_clusters().count(), before);
        fs.free_chain(ClusterId::FREE).unwrap();
        assert_eq!(fs.free_clusters().count(), before);
    }

    #[test]
    fn test_bad_cluster_is_rejected() {
        let mut disk = RamDisk::new(4096, 512);
        format(&mut disk, Some(FatType::Fat12)).unwrap();
        let (fs, _) = FatFileSystem::mount(&mut disk, Epoch).unwrap();
        assert!(matches!(
            fs.cluster_to_sector(ClusterId(1)),
            Err(Error::BadCluster(ClusterId(1)))
        ));
        assert!(fs.cluster_to_sector(ClusterId(4048)).is_ok());
        assert!(matches!(
            fs.cluster_to_sector(ClusterId(4049)),
            Err(Error::BadCluster(_))
        ));
    }
}

// ****************************************************************************
//
// End Of File
//
// ****************************************************************************
