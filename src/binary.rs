//! Binary map16 reader and writer
//!
//! Layout (little-endian):
//! - 4 bytes: magic `MP16`
//! - 2 bytes: format version
//! - 2 bytes: page count
//! - `page_count * PAGE_BYTE_SIZE` bytes: tile words, page by page, block by
//!   block, in slot order

use byteorder::{ByteOrder, LittleEndian};

use crate::document::{
    Block, Map16Document, Page, Slot, BLOCK_BYTE_SIZE, FORMAT_VERSION, HEADER_SIZE, MAGIC,
    MAX_PAGES, PAGE_BYTE_SIZE, TILES_PER_BLOCK,
};
use crate::error::{HeaderError, Location, Result};
use crate::tile::{TileRef, TILE_WORD_SIZE};

/// Fixed-size file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub page_count: u16,
}

impl Header {
    /// Validate the header against the full buffer, including its length
    pub fn parse(bytes: &[u8]) -> std::result::Result<Self, HeaderError> {
        let magic_len = MAGIC.len();
        if bytes.len() < magic_len || bytes[..magic_len] != MAGIC {
            return Err(HeaderError::BadMagic {
                found: bytes[..bytes.len().min(magic_len)].to_vec(),
            });
        }
        if bytes.len() < HEADER_SIZE {
            return Err(HeaderError::short_header(bytes.len()));
        }

        let version = LittleEndian::read_u16(&bytes[4..6]);
        if version != FORMAT_VERSION {
            return Err(HeaderError::UnsupportedVersion { found: version });
        }

        let page_count = LittleEndian::read_u16(&bytes[6..8]);
        if page_count == 0 || usize::from(page_count) > MAX_PAGES {
            return Err(HeaderError::PageCountOutOfRange {
                count: usize::from(page_count),
            });
        }

        let header = Self {
            version,
            page_count,
        };
        if bytes.len() != header.file_len() {
            return Err(HeaderError::TruncatedOrOversized {
                expected: header.file_len(),
                found: bytes.len(),
            });
        }
        Ok(header)
    }

    /// Total file length implied by this header
    pub fn file_len(&self) -> usize {
        HEADER_SIZE + usize::from(self.page_count) * PAGE_BYTE_SIZE
    }

    fn write(&self, out: &mut [u8]) {
        out[..4].copy_from_slice(&MAGIC);
        LittleEndian::write_u16(&mut out[4..6], self.version);
        LittleEndian::write_u16(&mut out[6..8], self.page_count);
    }
}

impl From<&Map16Document> for Header {
    fn from(doc: &Map16Document) -> Self {
        Self {
            version: doc.version(),
            // Map16Document caps the page count at MAX_PAGES
            page_count: doc.page_count() as u16,
        }
    }
}

/// Decode a complete map16 file
pub fn decode_bytes(bytes: &[u8]) -> Result<Map16Document> {
    let header = Header::parse(bytes)?;
    log::debug!(
        "map16 header: version {}, {} pages",
        header.version,
        header.page_count
    );

    let pages = bytes[HEADER_SIZE..]
        .chunks_exact(PAGE_BYTE_SIZE)
        .enumerate()
        .map(|(index, chunk)| decode_page(index, chunk))
        .collect::<Result<Vec<_>>>()?;

    Ok(Map16Document::new(pages)?)
}

fn decode_page(page: usize, bytes: &[u8]) -> Result<Page> {
    let mut blocks = Vec::with_capacity(bytes.len() / BLOCK_BYTE_SIZE);

    for (block, block_bytes) in bytes.chunks_exact(BLOCK_BYTE_SIZE).enumerate() {
        let mut tiles = [TileRef::default(); TILES_PER_BLOCK];
        for (slot, word_bytes) in Slot::ALL
            .into_iter()
            .zip(block_bytes.chunks_exact(TILE_WORD_SIZE))
        {
            let word = LittleEndian::read_u32(word_bytes);
            tiles[slot.index()] = TileRef::unpack(word)
                .map_err(|e| e.at(Location::Slot { page, block, slot }))?;
        }
        blocks.push(Block::new(tiles));
    }

    Page::new(blocks).map_err(|e| e.at(Location::Page { page }).into())
}

/// Encode a document; every valid document is encodable
pub fn encode_bytes(doc: &Map16Document) -> Vec<u8> {
    let mut out = vec![0u8; doc.byte_len()];
    Header::from(doc).write(&mut out[..HEADER_SIZE]);

    for (word_bytes, tile) in out[HEADER_SIZE..]
        .chunks_exact_mut(TILE_WORD_SIZE)
        .zip(doc.tiles())
    {
        LittleEndian::write_u32(word_bytes, tile.pack());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, TileError};

    fn blank_file(pages: u16) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"MP16");
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&pages.to_le_bytes());
        bytes.resize(HEADER_SIZE + usize::from(pages) * PAGE_BYTE_SIZE, 0);
        bytes
    }

    fn word_offset(page: usize, block: usize, slot: Slot) -> usize {
        HEADER_SIZE + page * PAGE_BYTE_SIZE + block * BLOCK_BYTE_SIZE + slot.index() * TILE_WORD_SIZE
    }

    #[test]
    fn test_decode_blank_page() {
        let doc = decode_bytes(&blank_file(1)).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.pages()[0], Page::blank());
    }

    #[test]
    fn test_bytes_round_trip() {
        let mut bytes = blank_file(3);
        let offset = word_offset(1, 0x42, Slot::BottomRight);
        bytes[offset..offset + 4].copy_from_slice(&0x0003_A1FFu32.to_le_bytes());
        let offset = word_offset(2, 0xFF, Slot::TopLeft);
        bytes[offset..offset + 4].copy_from_slice(&0x0000_93FFu32.to_le_bytes());

        let doc = decode_bytes(&bytes).unwrap();
        let tile = doc.pages()[1].block(0x42).unwrap()[Slot::BottomRight];
        assert_eq!(tile.tile_number(), 0x1FF);
        assert!(tile.x_flip() && tile.y_flip() && tile.priority());

        assert_eq!(encode_bytes(&doc), bytes);
    }

    #[test]
    fn test_document_round_trip() {
        let mut doc = Map16Document::new(vec![Page::blank(), Page::blank()]).unwrap();
        let tile = TileRef::new(0x2AB, 6).unwrap().with_y_flip(true);
        doc.page_mut(1)
            .unwrap()
            .set_block(7, Block::new([tile, TileRef::default(), tile, TileRef::default()]));

        let bytes = encode_bytes(&doc);
        assert_eq!(bytes.len(), doc.byte_len());
        assert_eq!(&bytes[..8], b"MP16\x01\x00\x02\x00");
        assert_eq!(decode_bytes(&bytes).unwrap(), doc);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = blank_file(1);
        bytes[0] = b'X';
        assert!(matches!(
            decode_bytes(&bytes),
            Err(Error::Header(HeaderError::BadMagic { .. }))
        ));

        assert!(matches!(
            decode_bytes(b"MP"),
            Err(Error::Header(HeaderError::BadMagic { .. }))
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = blank_file(1);
        bytes[4] = 2;
        assert!(matches!(
            decode_bytes(&bytes),
            Err(Error::Header(HeaderError::UnsupportedVersion { found: 2 }))
        ));
    }

    #[test]
    fn test_truncated_and_oversized() {
        let bytes = blank_file(2);
        let expected = HEADER_SIZE + 2 * PAGE_BYTE_SIZE;

        let short = &bytes[..bytes.len() - 1];
        assert!(matches!(
            decode_bytes(short),
            Err(Error::Header(HeaderError::TruncatedOrOversized { expected: e, found })) if e == expected && found == expected - 1
        ));

        let mut long = bytes.clone();
        long.push(0);
        assert!(matches!(
            decode_bytes(&long),
            Err(Error::Header(HeaderError::TruncatedOrOversized { found, .. })) if found == expected + 1
        ));

        assert!(matches!(
            decode_bytes(&bytes[..6]),
            Err(Error::Header(HeaderError::TruncatedOrOversized { expected: HEADER_SIZE, found: 6 }))
        ));
    }

    #[test]
    fn test_zero_pages_rejected() {
        let bytes = blank_file(0);
        assert!(matches!(
            decode_bytes(&bytes),
            Err(Error::Header(HeaderError::PageCountOutOfRange { count: 0 }))
        ));
    }

    #[test]
    fn test_tile_error_carries_position() {
        let mut bytes = blank_file(2);
        let offset = word_offset(1, 0x05, Slot::BottomLeft);
        bytes[offset..offset + 4].copy_from_slice(&0x0004_0000u32.to_le_bytes());

        match decode_bytes(&bytes) {
            Err(Error::Tile(err @ TileError::ReservedBitsSet { .. })) => {
                assert_eq!(
                    err.location(),
                    Location::Slot {
                        page: 1,
                        block: 5,
                        slot: Slot::BottomLeft
                    }
                );
            }
            other => panic!("expected reserved bits error, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_tile_number() {
        let mut bytes = blank_file(1);
        let offset = word_offset(0, 0, Slot::TopRight);
        bytes[offset..offset + 4].copy_from_slice(&0x0000_0400u32.to_le_bytes());

        assert!(matches!(
            decode_bytes(&bytes),
            Err(Error::Tile(TileError::TileNumberOutOfRange { tile_number: 0x400, .. }))
        ));
    }
}
