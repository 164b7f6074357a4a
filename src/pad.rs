//! Byte-buffer padding helpers for fixed-width lines.

/// Fill byte used when the encoder extends a line.
pub const SPACE: u8 = b' ';

/// Append `fill` to the right of `buf` until it is `len` bytes long.
///
/// Never truncates: a buffer already `len` bytes or longer is left untouched.
pub fn pad_right(buf: &mut Vec<u8>, len: usize, fill: u8) {
    if buf.len() < len {
        buf.resize(len, fill);
    }
}

/// Prepend `fill` to the left of `buf` until it is `len` bytes long.
///
/// Useful for right-aligned numeric columns, e.g. zero-filled amounts.
pub fn pad_left(buf: &mut Vec<u8>, len: usize, fill: u8) {
    if buf.len() < len {
        let missing = len - buf.len();
        buf.splice(0..0, std::iter::repeat_n(fill, missing));
    }
}
