/*
 *  display/font.rs
 *
 *  sharpmip - Sharp Memory-in-Pixel display driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Glyph table view over packed bitmap font blobs
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::borrow::Cow;
use std::path::Path;

use log::debug;

use crate::display::error::DisplayError;

/// Header bytes: width in bytes, height in pixels, first character code
pub const GLYPH_HEADER_LEN: usize = 3;

/// A validated glyph table.
///
/// Layout: `[width_bytes, height_px, first_char]` followed by one bitmap per
/// character in ascending code order, each `width_bytes * height_px` bytes,
/// row-major. The bitmaps are copied into the framebuffer untouched, so they
/// must already be in panel polarity (1 = white) and panel bit order.
#[derive(Debug, Clone)]
pub struct GlyphTable<'a> {
    data: Cow<'a, [u8]>,
    width_bytes: u8,
    height_px: u8,
    first_char: u8,
    glyph_count: usize,
}

impl<'a> GlyphTable<'a> {
    /// Borrow a table, typically a `static` font array
    pub fn new(data: &'a [u8]) -> Result<Self, DisplayError> {
        Self::parse(Cow::Borrowed(data))
    }

    fn parse(data: Cow<'a, [u8]>) -> Result<Self, DisplayError> {
        if data.len() < GLYPH_HEADER_LEN {
            return Err(DisplayError::InvalidGlyphTable(format!(
                "header needs {} bytes, got {}",
                GLYPH_HEADER_LEN,
                data.len()
            )));
        }
        let (width_bytes, height_px, first_char) = (data[0], data[1], data[2]);
        if width_bytes == 0 || height_px == 0 {
            return Err(DisplayError::InvalidGlyphTable(format!(
                "zero glyph size {}x{}",
                width_bytes, height_px
            )));
        }

        let glyph_size = width_bytes as usize * height_px as usize;
        let body = data.len() - GLYPH_HEADER_LEN;
        if body == 0 || body % glyph_size != 0 {
            return Err(DisplayError::InvalidGlyphTable(format!(
                "body of {} bytes is not a whole number of {}-byte glyphs",
                body, glyph_size
            )));
        }
        let glyph_count = body / glyph_size;
        if first_char as usize + glyph_count > 256 {
            return Err(DisplayError::InvalidGlyphTable(format!(
                "{} glyphs from code {} run past 0xFF",
                glyph_count, first_char
            )));
        }

        Ok(Self { data, width_bytes, height_px, first_char, glyph_count })
    }

    pub fn width_bytes(&self) -> u8 { self.width_bytes }
    pub fn height_px(&self) -> u8 { self.height_px }
    pub fn first_char(&self) -> u8 { self.first_char }
    pub fn glyph_count(&self) -> usize { self.glyph_count }

    /// Bytes in a single glyph bitmap
    pub fn glyph_size(&self) -> usize {
        self.width_bytes as usize * self.height_px as usize
    }

    /// Code point of the character to be drawn, if the table has it
    fn code_of(&self, ch: char) -> Result<usize, DisplayError> {
        let code = ch as u32;
        let first = self.first_char as u32;
        if code < first || code - first >= self.glyph_count as u32 {
            return Err(DisplayError::UnsupportedCharacter {
                ch,
                first: self.first_char,
                count: self.glyph_count,
            });
        }
        Ok((code - first) as usize)
    }

    /// True when the table has a glyph for `ch`
    pub fn supports(&self, ch: char) -> bool {
        self.code_of(ch).is_ok()
    }

    /// Bitmap for `ch`, `width_bytes` per glyph row
    pub fn glyph(&self, ch: char) -> Result<&[u8], DisplayError> {
        let start = self.code_of(ch)? * self.glyph_size() + GLYPH_HEADER_LEN;
        Ok(&self.data[start..start + self.glyph_size()])
    }

    /// Fail on the first character the table does not cover
    pub fn check_text(&self, text: &str) -> Result<(), DisplayError> {
        text.chars().try_for_each(|ch| self.code_of(ch).map(|_| ()))
    }
}

impl GlyphTable<'static> {
    /// Take ownership of a table built at runtime
    pub fn from_vec(data: Vec<u8>) -> Result<Self, DisplayError> {
        Self::parse(Cow::Owned(data))
    }

    /// Read a raw glyph table file
    pub fn load(path: &Path) -> Result<Self, DisplayError> {
        let data = std::fs::read(path)?;
        let table = Self::from_vec(data)?;
        debug!(
            "loaded glyph table {}: {}x{} px, {} glyphs from {:#04x}",
            path.display(),
            table.width_bytes as u32 * 8,
            table.height_px,
            table.glyph_count,
            table.first_char
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1 byte wide, 2 rows, glyphs for 'A'..='C' whose rows are the code twice
    fn abc() -> Vec<u8> {
        let mut t = vec![1, 2, b'A'];
        for c in b'A'..=b'C' {
            t.extend_from_slice(&[c, c]);
        }
        t
    }

    #[test]
    fn test_parse_header() {
        let data = abc();
        let table = GlyphTable::new(&data).unwrap();
        assert_eq!(table.width_bytes(), 1);
        assert_eq!(table.height_px(), 2);
        assert_eq!(table.first_char(), b'A');
        assert_eq!(table.glyph_count(), 3);
        assert_eq!(table.glyph_size(), 2);
    }

    #[test]
    fn test_glyph_offsets() {
        let data = abc();
        let table = GlyphTable::new(&data).unwrap();
        assert_eq!(table.glyph('A').unwrap(), &[b'A', b'A']);
        assert_eq!(table.glyph('C').unwrap(), &[b'C', b'C']);
    }

    #[test]
    fn test_out_of_range_characters_rejected() {
        let data = abc();
        let table = GlyphTable::new(&data).unwrap();
        for ch in ['@', 'D', 'a', 'é', '€'] {
            assert!(
                matches!(table.glyph(ch), Err(DisplayError::UnsupportedCharacter { .. })),
                "{ch:?}"
            );
            assert!(!table.supports(ch));
        }
        assert!(table.check_text("ABCA").is_ok());
        assert!(table.check_text("ABD").is_err());
    }

    #[test]
    fn test_malformed_tables() {
        assert!(GlyphTable::new(&[1, 2]).is_err());
        assert!(GlyphTable::new(&[0, 2, 32, 0xFF]).is_err());
        assert!(GlyphTable::new(&[1, 0, 32, 0xFF]).is_err());
        // header only
        assert!(GlyphTable::new(&[1, 2, 32]).is_err());
        // half a glyph left over
        assert!(GlyphTable::new(&[1, 2, 32, 0xFF, 0xFF, 0xFF]).is_err());
        // two glyphs starting at 0xFF would need code 0x100
        assert!(GlyphTable::new(&[1, 1, 0xFF, 0xFF, 0xFF]).is_err());
    }

    #[test]
    fn test_owned_table() {
        let table = GlyphTable::from_vec(abc()).unwrap();
        assert_eq!(table.glyph('B').unwrap(), &[b'B', b'B']);
    }

    #[test]
    fn test_load_missing_file() {
        let err = GlyphTable::load(Path::new("/nonexistent/font.bin")).unwrap_err();
        assert!(matches!(err, DisplayError::Io(_)));
    }
}
