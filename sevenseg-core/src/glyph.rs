//! Glyph encoder
//!
//! Maps printable characters to segment masks. The reference table is
//! stored for common-anode wiring (a lit segment is a 0 bit); a
//! [`GlyphTable`] is derived once per display in the polarity reported by
//! its sink, so displays with different wiring can coexist.
//!
//! Bit layout: bit 0..6 = segments a..g, bit 7 = decimal point.

/// Characters the encoder can render, in table order
pub const CHARSET: &str = "0123456789AabCcdEeFGHhIiJLlnOoPqrStUuY-_=~* .";

/// Number of renderable characters
pub const CHARSET_LEN: usize = 45;

/// Segment masks for a common-anode display, indexed like [`CHARSET`]
const COMMON_ANODE_MASKS: [u8; CHARSET_LEN] = [
    0xC0, // 0
    0xF9, // 1
    0xA4, // 2
    0xB0, // 3
    0x99, // 4
    0x92, // 5
    0x82, // 6
    0xF8, // 7
    0x80, // 8
    0x90, // 9
    0x88, // A
    0xA0, // a
    0x83, // b
    0xC6, // C
    0xA7, // c
    0xA1, // d
    0x86, // E
    0x84, // e
    0x8E, // F
    0xC2, // G
    0x89, // H
    0x8B, // h
    0xF9, // I
    0xFB, // i
    0xF1, // J
    0xC7, // L
    0xCF, // l
    0xAB, // n
    0xC0, // O
    0xA3, // o
    0x8C, // P
    0x98, // q
    0xAF, // r
    0x92, // S
    0x87, // t
    0xC1, // U
    0xE3, // u
    0x91, // Y
    0xBF, // -
    0xF7, // _
    0xB7, // = (lower bars)
    0xB6, // ~ (three bars)
    0x9C, // * (degree)
    0xFF, // space
    0x7F, // .
];

const SPACE_INDEX: usize = CHARSET_LEN - 2;
const DOT_INDEX: usize = CHARSET_LEN - 1;

/// Electrical wiring of the LED segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Polarity {
    /// Segments light when driven low
    #[default]
    CommonAnode,
    /// Segments light when driven high
    CommonCathode,
}

impl Polarity {
    /// Convert a common-anode mask to this polarity
    pub const fn adjust(self, common_anode_mask: u8) -> u8 {
        match self {
            Polarity::CommonAnode => common_anode_mask,
            Polarity::CommonCathode => !common_anode_mask,
        }
    }

    /// Overlay the lit segments of two masks
    pub const fn merge(self, a: u8, b: u8) -> u8 {
        match self {
            Polarity::CommonAnode => a & b,
            Polarity::CommonCathode => a | b,
        }
    }
}

/// Segment table in the native polarity of one display
#[derive(Debug, Clone)]
pub struct GlyphTable {
    polarity: Polarity,
    masks: [u8; CHARSET_LEN],
}

impl GlyphTable {
    /// Build the table for the given wiring
    pub const fn new(polarity: Polarity) -> Self {
        let mut masks = [0u8; CHARSET_LEN];
        let mut i = 0;
        while i < CHARSET_LEN {
            masks[i] = polarity.adjust(COMMON_ANODE_MASKS[i]);
            i += 1;
        }
        Self { polarity, masks }
    }

    /// Wiring this table was built for
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Encode a character, `None` if it cannot be displayed
    pub fn encode(&self, ch: char) -> Option<u8> {
        CHARSET
            .chars()
            .position(|c| c == ch)
            .map(|index| self.masks[index])
    }

    /// Mask with every segment off
    pub fn space(&self) -> u8 {
        self.masks[SPACE_INDEX]
    }

    /// Mask with only the decimal point lit
    pub fn dot(&self) -> u8 {
        self.masks[DOT_INDEX]
    }

    /// Add the decimal point to a glyph
    pub fn with_dot(&self, mask: u8) -> u8 {
        self.polarity.merge(mask, self.dot())
    }
}
