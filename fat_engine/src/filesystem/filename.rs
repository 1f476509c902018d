//! Filename related types

/// Various filename related errors that can occur.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameError {
    /// Tried to create a file with an invalid character.
    InvalidCharacter,
    /// Tried to create a file with no file name.
    FilenameEmpty,
    /// Given name was too long (we are limited to 8.3).
    NameTooLong,
    /// Can't start a file with a period, or after 8 characters.
    MisplacedPeriod,
}

/// Describes things we can convert to short 8.3 filenames
pub trait ToShortFileName {
    /// Try and convert this value into a [`ShortFileName`].
    fn to_short_filename(self) -> Result<ShortFileName, FilenameError>;
}

impl ToShortFileName for ShortFileName {
    fn to_short_filename(self) -> Result<ShortFileName, FilenameError> {
        Ok(self)
    }
}

impl ToShortFileName for &ShortFileName {
    fn to_short_filename(self) -> Result<ShortFileName, FilenameError> {
        Ok(self.clone())
    }
}

impl ToShortFileName for &str {
    fn to_short_filename(self) -> Result<ShortFileName, FilenameError> {
        ShortFileName::create_from_str(self)
    }
}

/// An MS-DOS 8.3 filename, exactly as stored in a directory entry: base
/// name padded to 8 bytes and extension padded to 3, both with spaces.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(PartialEq, Eq, Clone)]
pub struct ShortFileName {
    pub(crate) contents: [u8; Self::TOTAL_LEN],
}

impl ShortFileName {
    const BASE_LEN: usize = 8;
    const TOTAL_LEN: usize = 11;

    /// First name byte of a deleted entry whose slot may be reused.
    pub const FREE_MARKER: u8 = 0xE5;
    /// First name byte of the entry that ends a directory.
    pub const END_MARKER: u8 = 0x00;

    /// Get a short file name containing "..", which means "parent directory".
    pub const fn parent_dir() -> Self {
        Self {
            contents: *b"..         ",
        }
    }

    /// Get a short file name containing ".", which means "this directory".
    pub const fn this_dir() -> Self {
        Self {
            contents: *b".          ",
        }
    }

    /// The all-space name carried by the synthetic root node.
    pub const fn blank() -> Self {
        Self {
            contents: [b' '; Self::TOTAL_LEN],
        }
    }

    /// Wrap the 11 raw bytes of a directory entry.
    pub fn from_raw(contents: [u8; 11]) -> Self {
        Self { contents }
    }

    /// The 11 raw bytes.
    pub fn as_bytes(&self) -> &[u8; 11] {
        &self.contents
    }

    /// Get base name (without extension) of file name
    pub fn base_name(&self) -> &[u8] {
        Self::bytes_before_space(&self.contents[..Self::BASE_LEN])
    }

    /// Get extension of file name (without base name)
    pub fn extension(&self) -> &[u8] {
        Self::bytes_before_space(&self.contents[Self::BASE_LEN..])
    }

    fn bytes_before_space(bytes: &[u8]) -> &[u8] {
        bytes.split(|b| *b == b' ').next().unwrap_or(&[])
    }

    /// Normalise a user supplied name into 8.3 form.
    ///
    /// `.` and `..` are kept as they are. Anything else is upper-cased and
    /// may only hold ASCII letters, digits and at most one `.`, with a base
    /// name of 1 to 8 characters and an extension of at most 3.
    pub fn create_from_str(name: &str) -> Result<ShortFileName, FilenameError> {
        match name {
            "." => return Ok(ShortFileName::this_dir()),
            ".." => return Ok(ShortFileName::parent_dir()),
            _ => {}
        }

        let mut sfn = ShortFileName::blank();
        let mut idx = 0;
        let mut seen_dot = false;
        for ch in name.bytes() {
            match ch {
                b'.' => {
                    if seen_dot || idx == 0 {
                        return Err(FilenameError::MisplacedPeriod);
                    }
                    seen_dot = true;
                    idx = Self::BASE_LEN;
                }
                _ if ch.is_ascii_alphanumeric() => {
                    let limit = if seen_dot {
                        Self::TOTAL_LEN
                    } else {
                        Self::BASE_LEN
                    };
                    if idx == limit {
                        return Err(FilenameError::NameTooLong);
                    }
                    sfn.contents[idx] = ch.to_ascii_uppercase();
                    idx += 1;
                }
                _ => return Err(FilenameError::InvalidCharacter),
            }
        }
        if idx == 0 {
            return Err(FilenameError::FilenameEmpty);
        }
        Ok(sfn)
    }
}

impl core::fmt::Display for ShortFileName {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        for b in self.base_name() {
            write!(f, "{}", char::from(*b))?;
        }
        let extension = self.extension();
        if !extension.is_empty() {
            write!(f, ".")?;
            for b in extension {
                write!(f, "{}", char::from(*b))?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for ShortFileName {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "ShortFileName(\"{}\")", self)
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
