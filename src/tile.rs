//! 8x8 tile references and the bit layout of a packed tile word

use crate::error::{Location, TileError};

/// Size in bytes of one packed tile word
pub const TILE_WORD_SIZE: usize = 4;

/// A contiguous run of bits within a tile word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    pub shift: u32,
    pub width: u32,
}

impl BitRange {
    /// Range of `width` bits starting at bit `shift`
    pub const fn new(shift: u32, width: u32) -> Self {
        Self { shift, width }
    }

    /// Single-bit flag at bit `shift`
    pub const fn bit(shift: u32) -> Self {
        Self::new(shift, 1)
    }

    /// Largest value the range can hold
    pub const fn max_value(self) -> u32 {
        ((1u64 << self.width) - 1) as u32
    }

    /// Bits covered by the range, in place
    pub const fn mask(self) -> u32 {
        self.max_value() << self.shift
    }

    /// Read the range out of `word`
    pub fn extract(self, word: u32) -> u32 {
        (word & self.mask()) >> self.shift
    }

    /// Shift `value` into position, dropping bits that do not fit
    pub fn insert(self, value: u32) -> u32 {
        (value << self.shift) & self.mask()
    }
}

/// Field layout of a packed tile word
///
/// The tile number field is wider than the addressable tile space, so a word
/// can be well-formed bitwise and still name a tile that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    pub tile_number: BitRange,
    pub max_tile_number: u16,
    pub palette: BitRange,
    pub priority: BitRange,
    pub x_flip: BitRange,
    pub y_flip: BitRange,
}

/// The layout used by format version 1
pub const MAP16_LAYOUT: TileLayout = TileLayout {
    tile_number: BitRange::new(0, 12),
    max_tile_number: 0x3FF,
    palette: BitRange::new(12, 3),
    priority: BitRange::bit(15),
    x_flip: BitRange::bit(16),
    y_flip: BitRange::bit(17),
};

impl TileLayout {
    /// Bits covered by some field
    pub const fn defined_bits(&self) -> u32 {
        self.tile_number.mask()
            | self.palette.mask()
            | self.priority.mask()
            | self.x_flip.mask()
            | self.y_flip.mask()
    }

    /// Bits that must be zero in a valid word
    pub const fn reserved_bits(&self) -> u32 {
        !self.defined_bits()
    }

    /// Largest palette index the layout can store
    pub const fn max_palette(&self) -> u8 {
        self.palette.max_value() as u8
    }

    /// Pack a tile into a word; total for every valid `TileRef`
    pub fn pack(&self, tile: &TileRef) -> u32 {
        self.tile_number.insert(u32::from(tile.tile_number))
            | self.palette.insert(u32::from(tile.palette))
            | self.priority.insert(u32::from(tile.priority))
            | self.x_flip.insert(u32::from(tile.x_flip))
            | self.y_flip.insert(u32::from(tile.y_flip))
    }

    /// Unpack a word, rejecting reserved bits and unaddressable tiles
    pub fn unpack(&self, word: u32) -> Result<TileRef, TileError> {
        let reserved = word & self.reserved_bits();
        if reserved != 0 {
            return Err(TileError::ReservedBitsSet {
                word,
                reserved,
                location: Location::Unknown,
            });
        }

        let tile_number = self.tile_number.extract(word);
        if tile_number > u32::from(self.max_tile_number) {
            return Err(TileError::TileNumberOutOfRange {
                tile_number,
                max: self.max_tile_number,
                location: Location::Unknown,
            });
        }

        Ok(TileRef {
            // Range checked above
            tile_number: tile_number as u16,
            palette: self.palette.extract(word) as u8,
            priority: self.priority.extract(word) != 0,
            x_flip: self.x_flip.extract(word) != 0,
            y_flip: self.y_flip.extract(word) != 0,
        })
    }
}

/// Reference to one 8x8 tile with its rendering attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileRef {
    tile_number: u16,
    palette: u8,
    x_flip: bool,
    y_flip: bool,
    priority: bool,
}

impl TileRef {
    pub const MAX_TILE_NUMBER: u16 = MAP16_LAYOUT.max_tile_number;
    pub const MAX_PALETTE: u8 = MAP16_LAYOUT.max_palette();

    /// Create an unflipped, low-priority tile reference
    pub fn new(tile_number: u16, palette: u8) -> Result<Self, TileError> {
        if tile_number > Self::MAX_TILE_NUMBER {
            return Err(TileError::TileNumberOutOfRange {
                tile_number: u32::from(tile_number),
                max: Self::MAX_TILE_NUMBER,
                location: Location::Unknown,
            });
        }
        if palette > Self::MAX_PALETTE {
            return Err(TileError::PaletteOutOfRange {
                palette,
                max: Self::MAX_PALETTE,
                location: Location::Unknown,
            });
        }
        Ok(Self {
            tile_number,
            palette,
            ..Self::default()
        })
    }

    /// Set the horizontal flip flag
    pub fn with_x_flip(mut self, x_flip: bool) -> Self {
        self.x_flip = x_flip;
        self
    }

    /// Set the vertical flip flag
    pub fn with_y_flip(mut self, y_flip: bool) -> Self {
        self.y_flip = y_flip;
        self
    }

    /// Set the priority flag
    pub fn with_priority(mut self, priority: bool) -> Self {
        self.priority = priority;
        self
    }

    pub fn tile_number(&self) -> u16 {
        self.tile_number
    }

    pub fn palette(&self) -> u8 {
        self.palette
    }

    pub fn x_flip(&self) -> bool {
        self.x_flip
    }

    pub fn y_flip(&self) -> bool {
        self.y_flip
    }

    pub fn priority(&self) -> bool {
        self.priority
    }

    /// Pack with [`MAP16_LAYOUT`]
    pub fn pack(&self) -> u32 {
        MAP16_LAYOUT.pack(self)
    }

    /// Unpack with [`MAP16_LAYOUT`]
    pub fn unpack(word: u32) -> Result<Self, TileError> {
        MAP16_LAYOUT.unpack(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_fields_do_not_overlap() {
        let fields = [
            MAP16_LAYOUT.tile_number,
            MAP16_LAYOUT.palette,
            MAP16_LAYOUT.priority,
            MAP16_LAYOUT.x_flip,
            MAP16_LAYOUT.y_flip,
        ];
        let mut seen = 0u32;
        for field in fields {
            assert_eq!(seen & field.mask(), 0, "{:?} overlaps another field", field);
            seen |= field.mask();
        }
        assert_eq!(seen, MAP16_LAYOUT.defined_bits());
        assert_eq!(MAP16_LAYOUT.reserved_bits(), 0xFFFC_0000);
        assert!(u32::from(MAP16_LAYOUT.max_tile_number) <= MAP16_LAYOUT.tile_number.max_value());
    }

    #[test]
    fn test_bit_range_insert_drops_overflow() {
        let palette = MAP16_LAYOUT.palette;
        assert_eq!(palette.mask(), 0x7000);
        assert_eq!(palette.insert(5), 0x5000);
        assert_eq!(palette.insert(0xF), 0x7000);
        assert_eq!(palette.extract(0xFFFF_FFFF), 7);
        assert_eq!(BitRange::bit(17).max_value(), 1);
    }

    #[test]
    fn test_pack_known_fixture_word() {
        let tile = TileRef::new(0x1FF, 2)
            .unwrap()
            .with_priority(true)
            .with_x_flip(true)
            .with_y_flip(true);
        assert_eq!(tile.pack(), 0x0003_A1FF);

        let tile = TileRef::new(0x025, 5).unwrap().with_x_flip(true);
        assert_eq!(tile.pack(), 0x0001_5025);
    }

    #[test]
    fn test_unpack_fields() {
        let tile = TileRef::unpack(0x0002_7133).unwrap();
        assert_eq!(tile.tile_number(), 0x133);
        assert_eq!(tile.palette(), 7);
        assert!(!tile.priority());
        assert!(!tile.x_flip());
        assert!(tile.y_flip());
    }

    #[test]
    fn test_unpack_zero_word() {
        assert_eq!(TileRef::unpack(0).unwrap(), TileRef::default());
    }

    #[test]
    fn test_pack_unpack_inverse() {
        for tile_number in [0u16, 1, 0x0FF, 0x200, 0x3FF] {
            for palette in 0..=TileRef::MAX_PALETTE {
                for flags in 0..8u8 {
                    let tile = TileRef::new(tile_number, palette)
                        .unwrap()
                        .with_x_flip(flags & 1 != 0)
                        .with_y_flip(flags & 2 != 0)
                        .with_priority(flags & 4 != 0);
                    assert_eq!(TileRef::unpack(tile.pack()).unwrap(), tile);
                }
            }
        }
    }

    #[test]
    fn test_unpack_rejects_each_reserved_bit() {
        for bit in 18..32 {
            let word = 1u32 << bit;
            match TileRef::unpack(word) {
                Err(TileError::ReservedBitsSet { reserved, .. }) => assert_eq!(reserved, word),
                other => panic!("bit {} accepted: {:?}", bit, other),
            }
        }
    }

    #[test]
    fn test_reserved_bits_checked_before_tile_range() {
        let result = TileRef::unpack(0x8000_0FFF);
        assert!(matches!(result, Err(TileError::ReservedBitsSet { .. })));
    }

    #[test]
    fn test_tile_number_boundary() {
        let max = TileRef::unpack(0x3FF).unwrap();
        assert_eq!(max.tile_number(), 0x3FF);

        let result = TileRef::unpack(0x400);
        assert!(matches!(
            result,
            Err(TileError::TileNumberOutOfRange { tile_number: 0x400, max: 0x3FF, .. })
        ));
    }

    #[test]
    fn test_new_validates_ranges() {
        assert!(TileRef::new(0x3FF, 7).is_ok());
        assert!(matches!(
            TileRef::new(0x400, 0),
            Err(TileError::TileNumberOutOfRange { .. })
        ));
        assert!(matches!(
            TileRef::new(0, 8),
            Err(TileError::PaletteOutOfRange { palette: 8, max: 7, .. })
        ));
    }
}
