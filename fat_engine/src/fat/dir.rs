//! Directory entry engine: search, insert and rewrite of the 32 byte records
//! making up a directory.

use core::ops::ControlFlow;

use alloc::vec;

use crate::blockdevice::BlockDevice;
use crate::fat::ondiskdirentry::{find_in_sector, OnDiskDirEntry, ScanOutcome, Target};
use crate::fat::volume::FatFileSystem;
use crate::fat::FatType;
use crate::filesystem::{ClusterId, DirEntry, EntryLocation, Node, TimeSource};
use crate::{debug, warn, Error};

impl<'a, D, T> FatFileSystem<'a, D, T>
where
    D: BlockDevice,
    T: TimeSource,
{
    /// Visit the sectors of a directory starting at `start`, until `f`
    /// breaks or the directory runs out. Cluster 0 is the fixed root region.
    fn walk_sectors<R, F>(&self, start: EntryLocation, mut f: F) -> Result<Option<R>, Error<D::Error>>
    where
        F: FnMut(EntryLocation, &[u8]) -> ControlFlow<R>,
    {
        let mut sector = vec![0u8; self.bytes_per_sector()];
        if start.cluster == ClusterId::ROOT_DIR {
            if self.fat_type() == FatType::Fat32 {
                return Err(Error::UnsupportedFatType);
            }
            for number in start.sector..self.bpb.root_dir_sectors() {
                let location = EntryLocation {
                    cluster: ClusterId::ROOT_DIR,
                    sector: number,
                    number: 0,
                };
                self.read_sector(self.dir_sector(&location)?, &mut sector)?;
                if let ControlFlow::Break(r) = f(location, &sector) {
                    return Ok(Some(r));
                }
            }
            return Ok(None);
        }

        let mut cluster = start.cluster;
        let mut first = start.sector;
        loop {
            for number in first..u32::from(self.bpb.sectors_per_cluster) {
                let location = EntryLocation {
                    cluster,
                    sector: number,
                    number: 0,
                };
                self.read_sector(self.dir_sector(&location)?, &mut sector)?;
                if let ControlFlow::Break(r) = f(location, &sector) {
                    return Ok(Some(r));
                }
            }
            first = 0;
            match self.next_cluster(cluster)? {
                Some(next) => cluster = next,
                None => return Ok(None),
            }
        }
    }

    /// Find the first entry matching `target`, searching from `start`. The
    /// slot number of `start` only applies to the first sector.
    pub(crate) fn lookup_entry(
        &self,
        start: EntryLocation,
        target: &Target,
    ) -> Result<Node, Error<D::Error>> {
        let last = self.entries_per_sector() as usize - 1;
        let mut begin = start.number as usize;
        let found = self.walk_sectors(start, |location, sector| {
            let first = core::mem::take(&mut begin);
            match find_in_sector(sector, target, first, last) {
                (index, ScanOutcome::Found) => {
                    let at = index * OnDiskDirEntry::LEN;
                    ControlFlow::Break(Some(Node {
                        entry: DirEntry::parse(&sector[at..at + OnDiskDirEntry::LEN]),
                        location: EntryLocation {
                            number: index as u32,
                            ..location
                        },
                    }))
                }
                (_, ScanOutcome::NoMoreEntries) => ControlFlow::Break(None),
                (_, ScanOutcome::NotFoundContinue) => ControlFlow::Continue(()),
            }
        })?;
        found.flatten().ok_or(Error::NotFound)
    }

    /// Call `visit` for every live entry of the directory starting at
    /// `dir`, skipping deleted slots and volume labels.
    pub(crate) fn visit_entries<F>(&self, dir: ClusterId, mut visit: F) -> Result<(), Error<D::Error>>
    where
        F: FnMut(&Node),
    {
        self.walk_sectors(EntryLocation::start_of(dir), |location, sector| {
            for (index, raw) in sector.chunks_exact(OnDiskDirEntry::LEN).enumerate() {
                let on_disk = OnDiskDirEntry::new(raw);
                if on_disk.is_end() {
                    return ControlFlow::Break(());
                }
                if on_disk.is_free() || on_disk.is_volume_label() {
                    continue;
                }
                visit(&Node {
                    entry: on_disk.get_entry(),
                    location: EntryLocation {
                        number: index as u32,
                        ..location
                    },
                });
            }
            ControlFlow::Continue(())
        })?;
        Ok(())
    }

    /// Place `entry` in the directory starting at `dir`.
    ///
    /// With `overwrite` (not allowed for the fixed root) the entry goes to
    /// slot 0 followed by a terminator. Otherwise a deleted slot is reused,
    /// or the entry replaces the terminator and a new terminator is written
    /// after it, growing the directory by one cluster when needed.
    pub(crate) fn insert_entry(
        &mut self,
        dir: ClusterId,
        entry: &DirEntry,
        overwrite: bool,
    ) -> Result<EntryLocation, Error<D::Error>> {
        let fixed_root = dir == ClusterId::ROOT_DIR;
        let start = EntryLocation::start_of(dir);
        if overwrite && !fixed_root {
            self.set_entry(&start, entry)?;
            self.set_entry(&EntryLocation { number: 1, ..start }, &DirEntry::terminator())?;
            return Ok(start);
        }

        match self.lookup_entry(start, &Target::Free) {
            Ok(slot) => {
                debug!("reusing deleted slot {:?}", slot.location);
                self.set_entry(&slot.location, entry)?;
                return Ok(slot.location);
            }
            Err(Error::NotFound) => {}
            Err(e) => return Err(e),
        }

        let end = match self.lookup_entry(start, &Target::End) {
            Ok(slot) => slot.location,
            Err(Error::NotFound) if fixed_root => {
                warn!("root directory has no terminator");
                return Err(Error::DirectoryFull);
            }
            Err(Error::NotFound) => {
                // every slot of the chain is taken, start a new cluster
                let tail = self.last_cluster(dir)?;
                let fresh = self.chain_allocate(tail)?;
                EntryLocation::start_of(fresh)
            }
            Err(e) => return Err(e),
        };

        let mut next = EntryLocation {
            number: end.number + 1,
            ..end
        };
        if next.number == self.entries_per_sector() {
            next.number = 0;
            next.sector += 1;
        }
        if fixed_root && next.sector == self.bpb.root_dir_sectors() {
            warn!("root directory is full");
            return Err(Error::DirectoryFull);
        }

        if !fixed_root && next.sector == u32::from(self.bpb.sectors_per_cluster) {
            // the terminator moves to the following cluster, get it before
            // anything is written
            let following = match self.next_cluster(end.cluster)? {
                Some(cluster) => cluster,
                None => self.chain_allocate(end.cluster)?,
            };
            next = EntryLocation::start_of(following);
        }
        debug!("appending entry at {:?}", end);
        self.set_entry(&end, entry)?;
        self.set_entry(&next, &DirEntry::terminator())?;
        Ok(end)
    }

    /// Rewrite the record at `location`.
    pub(crate) fn set_entry(
        &mut self,
        location: &EntryLocation,
        entry: &DirEntry,
    ) -> Result<(), Error<D::Error>> {
        let idx = self.dir_sector(location)?;
        let mut sector = vec![0u8; self.bytes_per_sector()];
        self.read_sector(idx, &mut sector)?;
        let at = location.number as usize * OnDiskDirEntry::LEN;
        sector[at..at + OnDiskDirEntry::LEN].copy_from_slice(&entry.serialize());
        self.write_sector(idx, &sector)
    }

    /// Last cluster of the chain starting at `first`.
    fn last_cluster(&self, first: ClusterId) -> Result<ClusterId, Error<D::Error>> {
        let mut cluster = first;
        while let Some(next) = self.next_cluster(cluster)? {
            cluster = next;
        }
        Ok(cluster)
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
