//! In-memory map16 structure and format constants

use std::fmt;
use std::ops::Index;

use crate::error::{HeaderError, Location, TileError};
use crate::tile::{TileRef, TILE_WORD_SIZE};

// Map16 format constants
pub const MAGIC: [u8; 4] = *b"MP16";
pub const FORMAT_VERSION: u16 = 1;
pub const HEADER_SIZE: usize = 8; // magic + version + page count
pub const TILES_PER_BLOCK: usize = 4;
pub const BLOCKS_PER_PAGE: usize = 0x100;
pub const BLOCK_BYTE_SIZE: usize = TILES_PER_BLOCK * TILE_WORD_SIZE;
pub const PAGE_BYTE_SIZE: usize = BLOCKS_PER_PAGE * BLOCK_BYTE_SIZE;
pub const MAX_PAGES: usize = 0x1000;

/// Position of a tile inside its 16x16 block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Slot {
    /// Slots in storage order
    pub const ALL: [Slot; TILES_PER_BLOCK] = [
        Slot::TopLeft,
        Slot::TopRight,
        Slot::BottomLeft,
        Slot::BottomRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Slot::TopLeft => "top-left",
            Slot::TopRight => "top-right",
            Slot::BottomLeft => "bottom-left",
            Slot::BottomRight => "bottom-right",
        };
        f.write_str(name)
    }
}

/// A 16x16 block made of four 8x8 tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Block {
    tiles: [TileRef; TILES_PER_BLOCK],
}

impl Block {
    /// Create a block from tiles in slot order
    pub fn new(tiles: [TileRef; TILES_PER_BLOCK]) -> Self {
        Self { tiles }
    }

    pub fn tile(&self, slot: Slot) -> &TileRef {
        &self.tiles[slot.index()]
    }

    pub fn tiles(&self) -> &[TileRef; TILES_PER_BLOCK] {
        &self.tiles
    }

    /// Iterate tiles together with their slot
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &TileRef)> {
        Slot::ALL.into_iter().zip(self.tiles.iter())
    }
}

impl Index<Slot> for Block {
    type Output = TileRef;

    fn index(&self, slot: Slot) -> &TileRef {
        self.tile(slot)
    }
}

/// A page of exactly `BLOCKS_PER_PAGE` blocks
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Page {
    blocks: Vec<Block>,
}

impl Page {
    pub fn new(blocks: Vec<Block>) -> Result<Self, TileError> {
        if blocks.len() != BLOCKS_PER_PAGE {
            return Err(TileError::WrongBlockCount {
                expected: BLOCKS_PER_PAGE,
                found: blocks.len(),
                location: Location::Unknown,
            });
        }
        Ok(Self { blocks })
    }

    /// A page where every tile word is zero
    pub fn blank() -> Self {
        Self {
            blocks: vec![Block::default(); BLOCKS_PER_PAGE],
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Replace one block, returning the previous one
    pub fn set_block(&mut self, index: usize, block: Block) -> Option<Block> {
        let slot = self.blocks.get_mut(index)?;
        Some(std::mem::replace(slot, block))
    }
}

/// A decoded map16 file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Map16Document {
    version: u16,
    pages: Vec<Page>,
}

impl Map16Document {
    /// Create a current-version document, checking the page count
    pub fn new(pages: Vec<Page>) -> Result<Self, HeaderError> {
        if pages.is_empty() || pages.len() > MAX_PAGES {
            return Err(HeaderError::PageCountOutOfRange { count: pages.len() });
        }
        Ok(Self {
            version: FORMAT_VERSION,
            pages,
        })
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }

    /// Every tile in storage order
    pub fn tiles(&self) -> impl Iterator<Item = &TileRef> {
        self.pages
            .iter()
            .flat_map(|page| page.blocks.iter())
            .flat_map(|block| block.tiles.iter())
    }

    /// Exact size of the binary encoding
    pub fn byte_len(&self) -> usize {
        HEADER_SIZE + self.pages.len() * PAGE_BYTE_SIZE
    }
}
