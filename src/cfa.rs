use std::fmt;

/// Color channel in a CFA pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Red channel.
    Red = 0,
    /// Green channel.
    Green = 1,
    /// Blue channel.
    Blue = 2,
}

impl Channel {
    /// All three channels in plane order.
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => f.write_str("R"),
            Self::Green => f.write_str("G"),
            Self::Blue => f.write_str("B"),
        }
    }
}

/// CFA pattern descriptor for both 2x2 Bayer and 6x6 X-Trans sensors.
///
/// Stored as a fixed 6x6 table; Bayer patterns use the first four entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CfaPattern {
    pattern: [Channel; 36],
    size: usize,
}

use Channel::*;

/// Standard X-Trans 6x6 pattern used by Fujifilm ILC cameras (X-T*, X-Pro*, X-H*, X-E*, X-S*).
const XTRANS_DEFAULT: [Channel; 36] = [
    Red,   Blue,  Green, Blue,  Red,   Green,
    Green, Green, Red,   Green, Green, Blue,
    Green, Green, Blue,  Green, Green, Red,
    Blue,  Red,   Green, Red,   Blue,  Green,
    Green, Green, Blue,  Green, Green, Red,
    Green, Green, Red,   Green, Green, Blue,
];

impl CfaPattern {
    /// Create a Bayer RGGB pattern.
    pub fn bayer_rggb() -> Self {
        Self::bayer([Red, Green, Green, Blue])
    }

    /// Create a Bayer BGGR pattern.
    pub fn bayer_bggr() -> Self {
        Self::bayer([Blue, Green, Green, Red])
    }

    /// Create a Bayer GRBG pattern.
    pub fn bayer_grbg() -> Self {
        Self::bayer([Green, Red, Blue, Green])
    }

    /// Create a Bayer GBRG pattern.
    pub fn bayer_gbrg() -> Self {
        Self::bayer([Green, Blue, Red, Green])
    }

    fn bayer(pat: [Channel; 4]) -> Self {
        let mut pattern = [Green; 36];
        pattern[..4].copy_from_slice(&pat);
        Self { pattern, size: 2 }
    }

    /// Decode a dcraw-style 32-bit `filters` word into a Bayer pattern.
    ///
    /// The word packs two bits per photosite for an 8x2 tile; only codes whose
    /// tile repeats every 2x2 (all four bytes identical) describe a plain
    /// Bayer sensor. Color 3 is the second green and maps to [`Channel::Green`].
    ///
    /// Returns `None` for `filters == 9` (the X-Trans marker), for
    /// non-repeating tiles, and for tiles that lack one of the three colors.
    pub fn from_dcraw_filters(filters: u32) -> Option<Self> {
        let bytes = filters.to_le_bytes();
        if filters == 9 || bytes.iter().any(|&b| b != bytes[0]) {
            return None;
        }
        let mut pat = [Green; 4];
        let mut seen = [false; 3];
        for row in 0..2 {
            for col in 0..2 {
                let shift = (((row << 1) & 14) | (col & 1)) << 1;
                let ch = match (filters >> shift) & 3 {
                    0 => Red,
                    2 => Blue,
                    _ => Green,
                };
                seen[ch as usize] = true;
                pat[row * 2 + col] = ch;
            }
        }
        seen.iter().all(|&s| s).then(|| Self::bayer(pat))
    }

    /// Create a custom X-Trans 6x6 pattern.
    pub fn xtrans(pattern: [Channel; 36]) -> Self {
        Self { pattern, size: 6 }
    }

    /// Standard Fujifilm X-Trans ILC pattern.
    pub fn xtrans_default() -> Self {
        Self::xtrans(XTRANS_DEFAULT)
    }

    /// Return a shifted view of this pattern.
    ///
    /// The shift (dy, dx) follows the additive convention:
    /// `shifted.color_at(row, col) == self.color_at(row + dy, col + dx)`
    pub fn shift(&self, dy: usize, dx: usize) -> Self {
        let n = self.size;
        let mut shifted = [Green; 36];
        for y in 0..n {
            for x in 0..n {
                shifted[y * n + x] = self.pattern[((y + dy) % n) * n + ((x + dx) % n)];
            }
        }
        Self { pattern: shifted, size: n }
    }

    /// Return the color channel at the given row and column (wraps modulo pattern size).
    #[inline]
    pub fn color_at(&self, row: usize, col: usize) -> Channel {
        self.pattern[(row % self.size) * self.size + (col % self.size)]
    }

    /// Pattern width: 2 for Bayer, 6 for X-Trans.
    pub fn width(&self) -> usize {
        self.size
    }

    /// Pattern height: 2 for Bayer, 6 for X-Trans.
    pub fn height(&self) -> usize {
        self.size
    }

    /// Returns `true` if this is a 2x2 Bayer pattern.
    pub fn is_bayer(&self) -> bool {
        self.size == 2
    }

    /// Returns `true` if this is a 6x6 X-Trans pattern.
    pub fn is_xtrans(&self) -> bool {
        self.size == 6
    }
}

impl fmt::Display for CfaPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bayer() {
            for ch in &self.pattern[..4] {
                write!(f, "{ch}")?;
            }
            Ok(())
        } else {
            write!(f, "X-Trans 6x6")
        }
    }
}
