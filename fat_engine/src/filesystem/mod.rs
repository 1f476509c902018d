//! Generic file-system types shared by every FAT flavour.

pub mod attributes;
pub mod cluster;
pub mod directory;
pub mod filename;
pub mod free_list;
pub mod timestamp;

pub use self::attributes::Attributes;
pub use self::cluster::ClusterId;
pub use self::directory::{DirEntry, EntryLocation, Node};
pub use self::filename::{FilenameError, ShortFileName, ToShortFileName};
pub use self::free_list::FreeClusterList;
pub use self::timestamp::{TimeSource, Timestamp};

/// Maximum file size supported by FAT
pub const MAX_FILE_SIZE: u32 = u32::MAX;
