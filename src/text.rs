//! Line-oriented text rendering of map16 pages
//!
//! Each page becomes `BLOCKS_PER_PAGE` lines, one per block:
//!
//! ```text
//! 2F: 1A4x-p3 000---0 000---0 3FF-y-7
//! ```
//!
//! The line starts with the block index as two hex digits and `": "`, followed
//! by the four tiles in slot order (top-left, top-right, bottom-left,
//! bottom-right) separated by single spaces. A tile token is the tile number
//! as three hex digits, the flags `x`, `y` and `p` (or `-` when clear), and the
//! palette digit.

use std::fmt::Write;

use crate::document::{Block, Map16Document, Page, Slot, BLOCKS_PER_PAGE, TILES_PER_BLOCK};
use crate::error::{Location, Result, TileError};
use crate::tile::TileRef;

pub const LABEL_SEPARATOR: &str = ": ";
pub const TOKEN_DELIMITER: char = ' ';
pub const TOKEN_LEN: usize = 7;

const X_FLIP_FLAG: u8 = b'x';
const Y_FLIP_FLAG: u8 = b'y';
const PRIORITY_FLAG: u8 = b'p';
const CLEAR_FLAG: u8 = b'-';

/// Renders pages as text
pub struct Formatter {
    // Currently stateless
}

impl Formatter {
    pub fn new() -> Self {
        Self {}
    }

    /// Render a single page; output depends on nothing but the page
    pub fn format_page(&self, page: &Page) -> String {
        let line_len = 2 + LABEL_SEPARATOR.len() + TILES_PER_BLOCK * (TOKEN_LEN + 1);
        let mut output = String::with_capacity(BLOCKS_PER_PAGE * line_len);

        for (index, block) in page.blocks().iter().enumerate() {
            // Writing to a String cannot fail
            let _ = write!(output, "{:02X}", index);
            output.push_str(LABEL_SEPARATOR);
            for (slot, tile) in block.iter() {
                if slot != Slot::TopLeft {
                    output.push(TOKEN_DELIMITER);
                }
                Self::write_tile(&mut output, tile);
            }
            output.push('\n');
        }

        output
    }

    /// Render one page per entry, in page order
    pub fn format_document(&self, doc: &Map16Document) -> Vec<String> {
        doc.pages().iter().map(|page| self.format_page(page)).collect()
    }

    /// Render a single tile token such as `1A4x-p3`
    pub fn format_tile(tile: &TileRef) -> String {
        let mut token = String::with_capacity(TOKEN_LEN);
        Self::write_tile(&mut token, tile);
        token
    }

    fn write_tile(output: &mut String, tile: &TileRef) {
        let flag = |set: bool, c: u8| char::from(if set { c } else { CLEAR_FLAG });
        let _ = write!(output, "{:03X}", tile.tile_number());
        output.push(flag(tile.x_flip(), X_FLIP_FLAG));
        output.push(flag(tile.y_flip(), Y_FLIP_FLAG));
        output.push(flag(tile.priority(), PRIORITY_FLAG));
        output.push(char::from(b'0' + tile.palette()));
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses the text produced by [`Formatter`]
pub struct Parser {
    // Currently stateless
}

impl Parser {
    pub fn new() -> Self {
        Self {}
    }

    /// Parse the text of page `page`; the index is used for error locations
    pub fn parse_page(&self, page: usize, input: &str) -> std::result::Result<Page, TileError> {
        // At most one `\r` before each `\n` is dropped
        let lines: Vec<&str> = input
            .split_terminator('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        if lines.len() != BLOCKS_PER_PAGE {
            return Err(TileError::WrongBlockCount {
                expected: BLOCKS_PER_PAGE,
                found: lines.len(),
                location: Location::Page { page },
            });
        }
        if !input.ends_with('\n') {
            let last = input.rsplit('\n').next().unwrap_or(input);
            return Err(TileError::MalformedToken {
                token: last.to_string(),
                expected: "a newline at the end of the line".to_string(),
                location: Location::Line {
                    page,
                    line: BLOCKS_PER_PAGE,
                    slot: None,
                },
            });
        }

        let blocks = lines
            .iter()
            .enumerate()
            .map(|(index, line)| Self::parse_line(page, index, line))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Page::new(blocks).map_err(|e| e.at(Location::Page { page }))
    }

    /// Parse raw page file contents
    ///
    /// Invalid UTF-8 becomes U+FFFD, which no token accepts, so bad bytes are
    /// reported as malformed tokens at their line and slot.
    pub fn parse_page_bytes(&self, page: usize, input: &[u8]) -> std::result::Result<Page, TileError> {
        self.parse_page(page, &String::from_utf8_lossy(input))
    }

    /// Parse one text per page, in page order
    pub fn parse_document<S: AsRef<str>>(&self, pages: &[S]) -> Result<Map16Document> {
        let pages = pages
            .iter()
            .enumerate()
            .map(|(index, text)| self.parse_page(index, text.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Map16Document::new(pages)?)
    }

    fn parse_line(page: usize, block: usize, line: &str) -> std::result::Result<Block, TileError> {
        let line_number = block + 1;
        let label_location = Location::Line {
            page,
            line: line_number,
            slot: None,
        };

        let expected_label = format!("{:02X}", block);
        let (label, rest) = line.split_once(LABEL_SEPARATOR).ok_or_else(|| {
            malformed(line, format!("line starting with \"{}{}\"", expected_label, LABEL_SEPARATOR))
                .at(label_location)
        })?;
        if label != expected_label {
            return Err(malformed(label, format!("block label \"{}\"", expected_label)).at(label_location));
        }

        let tokens: Vec<&str> = rest.split(TOKEN_DELIMITER).collect();
        if tokens.len() != TILES_PER_BLOCK {
            return Err(malformed(
                rest,
                format!("{} tile tokens separated by single spaces", TILES_PER_BLOCK),
            )
            .at(label_location));
        }

        let mut tiles = [TileRef::default(); TILES_PER_BLOCK];
        for (slot, token) in Slot::ALL.into_iter().zip(tokens) {
            tiles[slot.index()] = Self::parse_tile(token).map_err(|e| {
                e.at(Location::Line {
                    page,
                    line: line_number,
                    slot: Some(slot),
                })
            })?;
        }
        Ok(Block::new(tiles))
    }

    /// Parse a single tile token such as `1A4x-p3`
    pub fn parse_tile(token: &str) -> std::result::Result<TileRef, TileError> {
        let bytes = token.as_bytes();
        if bytes.len() != TOKEN_LEN || !token.is_ascii() {
            return Err(malformed(token, "a 7-character tile token like \"1A4x-p3\""));
        }

        let digits = &token[..3];
        if !digits.bytes().all(|b| matches!(b, b'0'..=b'9' | b'A'..=b'F')) {
            return Err(malformed(token, "three upper-case hex digits for the tile number"));
        }
        let tile_number = u32::from_str_radix(digits, 16)
            .map_err(|_| malformed(token, "three upper-case hex digits for the tile number"))?;
        if tile_number > u32::from(TileRef::MAX_TILE_NUMBER) {
            return Err(TileError::TileNumberOutOfRange {
                tile_number,
                max: TileRef::MAX_TILE_NUMBER,
                location: Location::Unknown,
            });
        }

        let x_flip = parse_flag(token, bytes[3], X_FLIP_FLAG)?;
        let y_flip = parse_flag(token, bytes[4], Y_FLIP_FLAG)?;
        let priority = parse_flag(token, bytes[5], PRIORITY_FLAG)?;

        if !bytes[6].is_ascii_digit() {
            return Err(malformed(token, "a palette digit"));
        }
        let palette = bytes[6] - b'0';

        // new() rejects palettes 8 and 9
        Ok(TileRef::new(tile_number as u16, palette)?
            .with_x_flip(x_flip)
            .with_y_flip(y_flip)
            .with_priority(priority))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_flag(token: &str, found: u8, set: u8) -> std::result::Result<bool, TileError> {
    match found {
        c if c == set => Ok(true),
        CLEAR_FLAG => Ok(false),
        _ => Err(malformed(
            token,
            format!("'{}' or '-' for the {} flag", char::from(set), flag_name(set)),
        )),
    }
}

fn flag_name(flag: u8) -> &'static str {
    match flag {
        X_FLIP_FLAG => "x-flip",
        Y_FLIP_FLAG => "y-flip",
        _ => "priority",
    }
}

fn malformed(token: &str, expected: impl Into<String>) -> TileError {
    TileError::MalformedToken {
        token: token.to_string(),
        expected: expected.into(),
        location: Location::Unknown,
    }
}
