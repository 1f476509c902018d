//! # fat_engine
//!
//! A FAT12/FAT16/FAT32 engine operating over a sector-addressed block device.
//!
//! The crate covers the on-disk metadata of a FAT volume: building and
//! validating the boot parameter block, reading and writing packed File
//! Allocation Table entries, allocating clusters from a free list, and
//! managing directory entries. On top of that, [`FatFileSystem`] offers
//! `mount`/`format` and the usual file operations.
//!
//! ```rust
//! use fat_engine::{format, FatFileSystem, FatType, RamDisk, Timestamp, TimeSource};
//!
//! struct Clock;
//!
//! impl TimeSource for Clock {
//!     fn get_timestamp(&self) -> Timestamp {
//!         Timestamp::from_calendar(2024, 5, 1, 12, 0, 0).unwrap()
//!     }
//! }
//!
//! let mut disk = RamDisk::new(4096, 512);
//! format(&mut disk, Some(FatType::Fat12)).unwrap();
//! let (mut fs, root) = FatFileSystem::mount(&mut disk, Clock).unwrap();
//! let mut file = fs.create(&root, "HELLO.TXT").unwrap();
//! fs.write(&mut file, 0, b"hello").unwrap();
//! let mut buffer = [0u8; 5];
//! assert_eq!(fs.read(&file, 0, &mut buffer).unwrap(), 5);
//! fs.unmount();
//! ```
//!
//! ## Features
//!
//! * `log`: Enabled by default. Generates log messages using the `log` crate.
//! * `defmt-log`: By turning off the default features and enabling the
//! `defmt-log` feature you can configure this crate to log messages over defmt
//! instead.
//!
//! Only one of `log` and `defmt-log` can be enabled at a time.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[cfg(all(feature = "defmt-log", feature = "log"))]
compile_error!("Cannot enable both log and defmt-log");

#[cfg(feature = "log")]
use log::{debug, info, trace, warn};

#[cfg(feature = "defmt-log")]
use defmt::{debug, info, trace, warn};

#[cfg(all(not(feature = "defmt-log"), not(feature = "log")))]
#[macro_export]
/// Like log::debug! but does nothing at all
macro_rules! debug {
    ($($arg:tt)+) => {};
}

#[cfg(all(not(feature = "defmt-log"), not(feature = "log")))]
#[macro_export]
/// Like log::info! but does nothing at all
macro_rules! info {
    ($($arg:tt)+) => {};
}

#[cfg(all(not(feature = "defmt-log"), not(feature = "log")))]
#[macro_export]
/// Like log::trace! but does nothing at all
macro_rules! trace {
    ($($arg:tt)+) => {};
}

#[cfg(all(not(feature = "defmt-log"), not(feature = "log")))]
#[macro_export]
/// Like log::warn! but does nothing at all
macro_rules! warn {
    ($($arg:tt)+) => {};
}

pub mod blockdevice;
pub mod fat;
pub mod filesystem;

pub use crate::blockdevice::{BlockCount, BlockDevice, BlockIdx, RamDisk, RamDiskError};
pub use crate::fat::{
    bpb::{Bpb, BpbError},
    volume::{format, FatFileSystem, VolumeFlags},
    FatType,
};
pub use crate::filesystem::{
    Attributes, ClusterId, DirEntry, EntryLocation, FilenameError, FreeClusterList, Node,
    ShortFileName, TimeSource, Timestamp, ToShortFileName,
};

/// Represents all the ways the functions in this crate can fail.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error<E>
where
    E: core::fmt::Debug,
{
    /// The underlying block device threw an error.
    DeviceIoError(E),
    /// Sector 0 does not hold a usable boot parameter block.
    InvalidBpb,
    /// The requested operation is not available for this FAT type.
    UnsupportedFatType,
    /// The given name cannot be expressed as an 8.3 short name.
    InvalidName(FilenameError),
    /// No live directory entry matched.
    NotFound,
    /// A live directory entry with that name already exists.
    AlreadyExists,
    /// The directory holds entries besides `.` and `..`.
    NotEmpty,
    /// A directory was expected.
    NotADirectory,
    /// A file was expected, found a directory.
    IsADirectory,
    /// No free cluster is left on the volume.
    ClusterExhausted,
    /// The fixed root directory has no slot left.
    DirectoryFull,
    /// The disk is too small or too large for the requested FAT type.
    DiskSizeOutOfRange,
    /// A cluster number points outside the volume.
    BadCluster(ClusterId),
}

impl<E> From<BpbError> for Error<E>
where
    E: core::fmt::Debug,
{
    fn from(value: BpbError) -> Self {
        match value {
            BpbError::DiskSizeOutOfRange => Error::DiskSizeOutOfRange,
            BpbError::BadSignature | BpbError::BadGeometry | BpbError::TooShort => {
                Error::InvalidBpb
            }
        }
    }
}

impl<E> From<FilenameError> for Error<E>
where
    E: core::fmt::Debug,
{
    fn from(value: FilenameError) -> Self {
        Error::InvalidName(value)
    }
}

impl<E> core::fmt::Display for Error<E>
where
    E: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::DeviceIoError(e) => write!(f, "block device error: {:?}", e),
            Error::InvalidBpb => f.write_str("not a FAT volume"),
            Error::UnsupportedFatType => f.write_str("operation not supported for this FAT type"),
            Error::InvalidName(e) => write!(f, "invalid name: {:?}", e),
            Error::NotFound => f.write_str("no such file or directory"),
            Error::AlreadyExists => f.write_str("file exists"),
            Error::NotEmpty => f.write_str("directory not empty"),
            Error::NotADirectory => f.write_str("not a directory"),
            Error::IsADirectory => f.write_str("is a directory"),
            Error::ClusterExhausted => f.write_str("no free cluster left"),
            Error::DirectoryFull => f.write_str("root directory is full"),
            Error::DiskSizeOutOfRange => f.write_str("disk size out of range for FAT type"),
            Error::BadCluster(c) => write!(f, "bad cluster {:#x}", c.0),
        }
    }
}

// ****************************************************************************
//
// End Of File
//
// ****************************************************************************
