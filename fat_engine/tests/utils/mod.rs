//! Useful library code for tests

use std::cell::Cell;

use fat_engine::{
    format, BlockCount, BlockDevice, BlockIdx, FatType, RamDisk, RamDiskError, TimeSource,
    Timestamp,
};

/// A disk of `num_sectors` 512 byte sectors, formatted as `fat_type`.
#[allow(unused)]
pub fn formatted_disk(num_sectors: u32, fat_type: FatType) -> RamDisk {
    let mut disk = RamDisk::new(num_sectors, 512);
    format(&mut disk, Some(fat_type)).expect("format");
    disk
}

/// FAT12, 4096 sectors of 512 bytes, one sector per cluster.
#[allow(unused)]
pub fn small_fat12_disk() -> RamDisk {
    formatted_disk(4096, FatType::Fat12)
}

/// Errors raised by [`FaultyDisk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultyDiskError {
    /// Raised on purpose
    Injected,
    /// From the wrapped disk
    Disk(RamDiskError),
}

/// Wraps a [`RamDisk`] and starts failing after a number of successful
/// reads or writes.
#[allow(unused)]
pub struct FaultyDisk {
    pub inner: RamDisk,
    reads_left: Cell<Option<usize>>,
    writes_left: Option<usize>,
}

#[allow(unused)]
impl FaultyDisk {
    pub fn new(inner: RamDisk) -> FaultyDisk {
        FaultyDisk {
            inner,
            reads_left: Cell::new(None),
            writes_left: None,
        }
    }

    /// Let `count` more reads through, then fail every read.
    pub fn fail_reads_after(&mut self, count: usize) {
        self.reads_left.set(Some(count));
    }

    /// Let `count` more writes through, then fail every write.
    pub fn fail_writes_after(&mut self, count: usize) {
        self.writes_left = Some(count);
    }
}

impl BlockDevice for FaultyDisk {
    type Error = FaultyDiskError;

    fn read_sector(&self, block_idx: BlockIdx, block: &mut [u8]) -> Result<(), Self::Error> {
        match self.reads_left.get() {
            Some(0) => return Err(FaultyDiskError::Injected),
            Some(n) => self.reads_left.set(Some(n - 1)),
            None => {}
        }
        self.inner
            .read_sector(block_idx, block)
            .map_err(FaultyDiskError::Disk)
    }

    fn write_sector(&mut self, block_idx: BlockIdx, block: &[u8]) -> Result<(), Self::Error> {
        match self.writes_left {
            Some(0) => return Err(FaultyDiskError::Injected),
            Some(n) => self.writes_left = Some(n - 1),
            None => {}
        }
        self.inner
            .write_sector(block_idx, block)
            .map_err(FaultyDiskError::Disk)
    }

    fn num_blocks(&self) -> BlockCount {
        self.inner.num_blocks()
    }

    fn bytes_per_sector(&self) -> usize {
        self.inner.bytes_per_sector()
    }
}

pub struct TestTimeSource {
    fixed: Timestamp,
}

impl TimeSource for TestTimeSource {
    fn get_timestamp(&self) -> Timestamp {
        self.fixed
    }
}

/// Make a time source that gives a fixed time.
///
/// It always claims to be 4 April 2003, at 13:30:04.
#[allow(unused)]
pub fn make_time_source() -> TestTimeSource {
    TestTimeSource {
        fixed: Timestamp::from_calendar(2003, 4, 4, 13, 30, 4).expect("valid timestamp"),
    }
}

/// Reads the wall clock.
#[allow(unused)]
pub struct Clock;

impl TimeSource for Clock {
    fn get_timestamp(&self) -> Timestamp {
        use chrono::{Datelike, Timelike};
        let now = chrono::Local::now();
        Timestamp::from_calendar(
            now.year() as u16,
            now.month() as u8,
            now.day() as u8,
            now.hour() as u8,
            now.minute() as u8,
            now.second().min(59) as u8,
        )
        .expect("clock within the FAT date range")
    }
}

/// A buffer of `len` bytes with a pattern that does not repeat at sector or
/// cluster boundaries.
#[allow(unused)]
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| ((i * 7 + i / 251) as u8).wrapping_add(seed))
        .collect()
}

// ****************************************************************************
//
// End Of File
//
// ****************************************************************************
