//! # human-map16
//!
//! Lossless conversion between binary `.map16` tile tables and a directory of
//! plain-text page files that diff cleanly under version control.
//!
//! ## Binary Format
//!
//! A map16 file is an 8-byte header followed by pages of 16x16 blocks:
//!
//! ```text
//! "MP16"  version:u16  page_count:u16  tile words...
//! ```
//!
//! Each page holds 0x100 blocks, each block four 32-bit little-endian tile
//! words in the order top-left, top-right, bottom-left, bottom-right. See
//! [`tile::MAP16_LAYOUT`] for the bits of a tile word.
//!
//! ## Text Format
//!
//! Every page becomes one file named after its index in hex (`000.txt`,
//! `001.txt`, ...), with one line per block:
//!
//! ```text
//! 2F: 1A4x-p3 000---0 000---0 3FF-y-7
//! ```
//!
//! A token is the tile number, the `x`/`y`/`p` flags (`-` when clear) and the
//! palette. See [`text`] for the exact grammar.
//!
//! ## Round Trip
//!
//! Decoding a file and encoding the resulting directory reproduces the
//! original bytes exactly. Both directions validate strictly and fail on the
//! first problem, and neither leaves a partial output behind.
//!
//! ```no_run
//! human_map16::decode("level.map16", "level")?;
//! human_map16::encode("level", "rebuilt.map16")?;
//! # Ok::<(), human_map16::Error>(())
//! ```

pub mod binary;
pub mod decoder;
pub mod directory;
pub mod document;
pub mod encoder;
pub mod error;
pub mod text;
pub mod tile;

use std::path::Path;

pub use binary::{decode_bytes, encode_bytes};
pub use decoder::Decoder;
pub use document::{Block, Map16Document, Page, Slot};
pub use encoder::Encoder;
pub use error::{Error, ErrorKind, FilesystemError, HeaderError, Location, Result, TileError};
pub use text::{Formatter, Parser};
pub use tile::TileRef;

/// Convert a map16 file into a new directory of page files
pub fn decode(input_file: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Result<()> {
    Decoder::new().decode(input_file.as_ref(), output_dir.as_ref())?;
    Ok(())
}

/// Convert a directory of page files into a new map16 file
///
/// Fails with [`FilesystemError::TargetExists`] if `output_file` exists; use
/// [`Encoder::with_overwrite`] to replace it.
pub fn encode(input_dir: impl AsRef<Path>, output_file: impl AsRef<Path>) -> Result<()> {
    Encoder::new().encode(input_dir.as_ref(), output_file.as_ref())?;
    Ok(())
}
