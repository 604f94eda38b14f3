/*
 *  lib.rs
 *
 *  sharpmip - Sharp Memory-in-Pixel display driver
 *  (c) 2020-26 Stuart Hunter
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

//! # sharpmip
//!
//! Driver for SHARP Memory-in-Pixel LCDs (LS013B7DH05 and friends).
//!
//! - [`display::FrameBuffer`] keeps the image in the panel's own bit layout
//! - [`display::SharpMemoryDriver`] blits glyph-table text, draws lines and
//!   serializes rows into line-addressed SPI frames, flipping VCOM on every
//!   transmission
//! - [`display::Bus`] is the seam to the hardware; [`display::HalBus`] covers
//!   any embedded-hal 1.0 SPI bus + GPIO chip select
//!
//! ```ignore
//! use sharpmip::display::{DisplayDriver, DrawMode, GlyphTable, SharpMemoryDriver};
//!
//! let font = GlyphTable::new(FONT_16X20)?;
//! let mut lcd = SharpMemoryDriver::new(bus, 144, 168)?;
//! lcd.clear_screen()?;
//! lcd.draw_line_of_text(0, 0, "HELLO", &font, DrawMode::Replace)?;
//! lcd.refresh(0, font.height_px() as u32)?;
//! ```

pub mod config;
pub mod demo;
pub mod display;
