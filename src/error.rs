//! Error types for every conversion layer

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::directory::page_file_name;
use crate::document::{Slot, FORMAT_VERSION, HEADER_SIZE, MAGIC, MAX_PAGES};

/// Where in a document an error was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Location {
    /// Raised by a context-free operation such as `TileRef::unpack`
    #[default]
    Unknown,
    /// A whole page
    Page { page: usize },
    /// A tile word in the binary body
    Slot { page: usize, block: usize, slot: Slot },
    /// A line of a page file; `slot` is `None` for the block label
    Line {
        page: usize,
        line: usize,
        slot: Option<Slot>,
    },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Unknown => Ok(()),
            Location::Page { page } => write!(f, " in {}", page_file_name(*page)),
            Location::Slot { page, block, slot } => {
                write!(f, " at page 0x{:03X}, block 0x{:02X}, {}", page, block, slot)
            }
            Location::Line { page, line, slot } => {
                write!(f, " in {}, line {}", page_file_name(*page), line)?;
                match slot {
                    Some(slot) => write!(f, ", {}", slot),
                    None => write!(f, ", block label"),
                }
            }
        }
    }
}

/// Header validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("not a map16 file: expected magic {:02X?}, found {found:02X?}", MAGIC)]
    BadMagic { found: Vec<u8> },

    #[error("unsupported format version {found} (only version {} is supported)", FORMAT_VERSION)]
    UnsupportedVersion { found: u16 },

    #[error("file is {found} bytes but its header requires exactly {expected} bytes")]
    TruncatedOrOversized { expected: usize, found: usize },

    #[error("page count {count} is outside the supported range 1..={}", MAX_PAGES)]
    PageCountOutOfRange { count: usize },
}

impl HeaderError {
    /// Shorthand for a buffer too small to hold the fixed header
    pub(crate) fn short_header(found: usize) -> Self {
        HeaderError::TruncatedOrOversized {
            expected: HEADER_SIZE,
            found,
        }
    }
}

/// Invalid tile data, in either representation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileError {
    #[error("tile word 0x{word:08X} has reserved bits 0x{reserved:08X} set{location}")]
    ReservedBitsSet {
        word: u32,
        reserved: u32,
        location: Location,
    },

    #[error("tile number 0x{tile_number:03X} exceeds the maximum 0x{max:03X}{location}")]
    TileNumberOutOfRange {
        tile_number: u32,
        max: u16,
        location: Location,
    },

    #[error("palette {palette} exceeds the maximum {max}{location}")]
    PaletteOutOfRange {
        palette: u8,
        max: u8,
        location: Location,
    },

    #[error("expected {expected} blocks, found {found}{location}")]
    WrongBlockCount {
        expected: usize,
        found: usize,
        location: Location,
    },

    #[error("malformed token {token:?}, expected {expected}{location}")]
    MalformedToken {
        token: String,
        expected: String,
        location: Location,
    },
}

impl TileError {
    /// Replace the location carried by this error
    pub fn at(mut self, at: Location) -> Self {
        match &mut self {
            TileError::ReservedBitsSet { location, .. }
            | TileError::TileNumberOutOfRange { location, .. }
            | TileError::PaletteOutOfRange { location, .. }
            | TileError::WrongBlockCount { location, .. }
            | TileError::MalformedToken { location, .. } => *location = at,
        }
        self
    }

    /// Where the error was found, if known
    pub fn location(&self) -> Location {
        match self {
            TileError::ReservedBitsSet { location, .. }
            | TileError::TileNumberOutOfRange { location, .. }
            | TileError::PaletteOutOfRange { location, .. }
            | TileError::WrongBlockCount { location, .. }
            | TileError::MalformedToken { location, .. } => *location,
        }
    }
}

/// Filesystem failures on either side of a conversion
#[derive(Debug, Error)]
pub enum FilesystemError {
    #[error("failed to read {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create {}: {source}", .path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("refusing to overwrite existing {}", .path.display())]
    TargetExists { path: PathBuf },

    #[error("{} is missing page files: {}", .dir.display(), page_list(.missing))]
    MissingPages { dir: PathBuf, missing: Vec<usize> },

    #[error("{} contains entries that are not page files: {}", .dir.display(), entry_list(.entries))]
    UnexpectedEntries { dir: PathBuf, entries: Vec<PathBuf> },
}

fn page_list(pages: &[usize]) -> String {
    pages
        .iter()
        .map(|&page| page_file_name(page))
        .collect::<Vec<_>>()
        .join(", ")
}

fn entry_list(entries: &[PathBuf]) -> String {
    entries
        .iter()
        .map(|entry| {
            entry
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| entry.display().to_string())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Coarse error category, stable enough to map onto exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Header,
    Tile,
    Filesystem,
}

impl ErrorKind {
    /// Process exit code for this kind of failure
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Header => 2,
            ErrorKind::Tile => 3,
            ErrorKind::Filesystem => 4,
        }
    }
}

/// Any failure raised by a conversion
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Tile(#[from] TileError),

    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

impl Error {
    /// Which layer raised the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Header(_) => ErrorKind::Header,
            Error::Tile(_) => ErrorKind::Tile,
            Error::Filesystem(_) => ErrorKind::Filesystem,
        }
    }
}

/// A convenience `Result` type alias using the crate's `Error` type.
pub type Result<T> = std::result::Result<T, Error>;
