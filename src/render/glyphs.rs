//! 3x5 dot-matrix digits for the track number overlay

/// Glyph rows top to bottom, bit 2 is the left column
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b011, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

pub const GLYPH_WIDTH: u8 = 3;
pub const GLYPH_HEIGHT: u8 = 5;

/// Whether the dot at (row, col) of `digit` is lit
pub fn dot(digit: u8, row: u8, col: u8) -> bool {
    if digit > 9 || row >= GLYPH_HEIGHT || col >= GLYPH_WIDTH {
        return false;
    }
    DIGITS[digit as usize][row as usize] & (0b100 >> col) != 0
}

/// Decimal digits of `n` (clamped to 0..=99), most significant first
pub fn digits(n: usize) -> Vec<u8> {
    let n = n.min(99) as u8;
    if n >= 10 {
        vec![n / 10, n % 10]
    } else {
        vec![n]
    }
}
