/*
 *  display/framebuffer.rs
 *
 *  sharpmip - Sharp Memory-in-Pixel display driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Bit-packed monochrome framebuffer in panel order
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

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use crate::display::error::DisplayError;

/// Byte value of eight white pixels
pub const WHITE_BYTE: u8 = 0xFF;

/// Byte value of eight black pixels
pub const BLACK_BYTE: u8 = 0x00;

/// Line addresses on the wire are a single byte
pub const MAX_ROWS: u32 = 256;

/// Monochrome framebuffer, 1 bit per pixel, laid out exactly as the panel
/// receives it.
///
/// Bit `k` of byte `row * words_per_row + col` holds pixel `(col * 8 + k, row)`.
/// The panel is active-low: a `1` bit is white, a `0` bit is black. "Set"
/// throughout this crate means black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    buf: Vec<u8>,
    width: u32,
    height: u32,
    words_per_row: usize,
}

impl FrameBuffer {
    /// Allocate an all-white framebuffer
    pub fn new(width: u32, height: u32) -> Result<Self, DisplayError> {
        if width == 0 || height == 0 || height > MAX_ROWS {
            return Err(DisplayError::InvalidGeometry { width, height });
        }
        let words_per_row = width.div_ceil(8) as usize;
        Ok(Self {
            buf: vec![WHITE_BYTE; words_per_row * height as usize],
            width,
            height,
            words_per_row,
        })
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }

    /// Bytes (8-pixel columns) in one row
    pub fn words_per_row(&self) -> usize { self.words_per_row }

    /// Make pixel `(x, y)` black
    pub fn set_pixel(&mut self, x: u32, y: u32) -> Result<(), DisplayError> {
        let (idx, mask) = self.locate(x, y)?;
        self.buf[idx] &= !mask;
        Ok(())
    }

    /// Make pixel `(x, y)` white
    pub fn reset_pixel(&mut self, x: u32, y: u32) -> Result<(), DisplayError> {
        let (idx, mask) = self.locate(x, y)?;
        self.buf[idx] |= mask;
        Ok(())
    }

    /// True when pixel `(x, y)` is black
    pub fn is_set(&self, x: u32, y: u32) -> Result<bool, DisplayError> {
        let (idx, mask) = self.locate(x, y)?;
        Ok(self.buf[idx] & mask == 0)
    }

    /// Every pixel white
    pub fn clear_all(&mut self) {
        self.buf.fill(WHITE_BYTE);
    }

    /// Packed bytes of one row, as sent on the wire
    pub fn row_bytes(&self, row: u32) -> Result<&[u8], DisplayError> {
        let range = self.row_range(row)?;
        Ok(&self.buf[range])
    }

    /// Mutable packed bytes of one row
    pub fn row_bytes_mut(&mut self, row: u32) -> Result<&mut [u8], DisplayError> {
        let range = self.row_range(row)?;
        Ok(&mut self.buf[range])
    }

    /// Overwrite a whole row with one byte value
    pub fn fill_row(&mut self, row: u32, byte: u8) -> Result<(), DisplayError> {
        self.row_bytes_mut(row)?.fill(byte);
        Ok(())
    }

    /// Immutable raw access
    pub fn as_bytes(&self) -> &[u8] { &self.buf }

    /// Mutable raw access, used by the glyph blitter
    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8] { &mut self.buf }

    /// Text picture of the buffer: one line per pixel row, `+` black, `.` white.
    /// Handy with `trace!` when a glyph table looks wrong.
    pub fn render_ascii(&self) -> String {
        let w = self.width as usize;
        let mut out = String::with_capacity((w + 1) * self.height as usize);
        for row in self.buf.chunks(self.words_per_row) {
            for x in 0..w {
                let black = row[x / 8] & (1 << (x % 8)) == 0;
                out.push(if black { '+' } else { '.' });
            }
            out.push('\n');
        }
        out
    }

    #[inline]
    fn locate(&self, x: u32, y: u32) -> Result<(usize, u8), DisplayError> {
        if x >= self.width {
            return Err(DisplayError::out_of_bounds("pixel x", x as usize, self.width as usize));
        }
        if y >= self.height {
            return Err(DisplayError::out_of_bounds("pixel y", y as usize, self.height as usize));
        }
        let idx = y as usize * self.words_per_row + (x / 8) as usize;
        Ok((idx, 1u8 << (x % 8)))
    }

    fn row_range(&self, row: u32) -> Result<core::ops::Range<usize>, DisplayError> {
        if row >= self.height {
            return Err(DisplayError::out_of_bounds("row", row as usize, self.height as usize));
        }
        let start = row as usize * self.words_per_row;
        Ok(start..start + self.words_per_row)
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// `BinaryColor::On` paints black, `Off` paints white. Pixels outside the
/// panel are dropped, as embedded-graphics expects of a draw target.
impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            if p.x < 0 || p.y < 0 {
                continue;
            }
            let (x, y) = (p.x as u32, p.y as u32);
            let _ = match color {
                BinaryColor::On => self.set_pixel(x, y),
                BinaryColor::Off => self.reset_pixel(x, y),
            };
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let byte = match color {
            BinaryColor::On => BLACK_BYTE,
            BinaryColor::Off => WHITE_BYTE,
        };
        self.buf.fill(byte);
        Ok(())
    }
}
