/*
 *  display/traits.rs
 *
 *  sharpmip - Sharp Memory-in-Pixel display driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for display driver abstraction
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

use std::time::Duration;

use crate::display::error::DisplayError;
use crate::display::font::GlyphTable;

/// How a line of text is merged with what is already in the framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    /// Write the glyphs, then blank the rest of the touched rows out to the
    /// right edge. Nothing stale survives in the text's row band.
    #[default]
    Replace,

    /// Write the glyphs; columns the text does not cover keep their content.
    Mix,

    /// AND the glyphs into the existing content: black is painted over
    /// what is there, nothing is ever turned white.
    Add,
}

/// The older two-valued form: joining with existing pixels is `Add`,
/// otherwise `Replace`.
impl From<bool> for DrawMode {
    fn from(join_with_existing_pixels: bool) -> Self {
        if join_with_existing_pixels { DrawMode::Add } else { DrawMode::Replace }
    }
}

/// Display capabilities and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCapabilities {
    /// Display width in pixels
    pub width: u32,

    /// Display height in pixels
    pub height: u32,

    /// Bytes per pixel row (width rounded up to whole bytes)
    pub words_per_row: usize,

    /// Longest the panel may go without a VCOM transition
    pub vcom_interval: Duration,
}

/// Monochrome panel abstraction - every memory-LCD style driver implements this
///
/// Drawing calls only touch the driver's framebuffer; `refresh`,
/// `clear_screen` and `toggle_vcom` are the operations that talk to the
/// hardware. Text x positions are in byte columns (8 pixels), y positions in
/// pixel rows.
pub trait DisplayDriver: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Make one pixel black
    fn set_pixel(&mut self, x: u32, y: u32) -> Result<(), DisplayError>;

    /// Make one pixel white
    fn reset_pixel(&mut self, x: u32, y: u32) -> Result<(), DisplayError>;

    /// Render `text` with `font` starting at byte column `x_col`, pixel row `y`
    fn draw_line_of_text(
        &mut self,
        x_col: u32,
        y: u32,
        text: &str,
        font: &GlyphTable<'_>,
        mode: DrawMode,
    ) -> Result<(), DisplayError>;

    /// Blacken a full pixel row
    fn draw_horizontal_line(&mut self, row: u32) -> Result<(), DisplayError>;

    /// Blacken a full pixel column
    fn draw_vertical_line(&mut self, col: u32) -> Result<(), DisplayError>;

    /// Send rows `[row_start, row_end)` to the panel
    fn refresh(&mut self, row_start: u32, row_end: u32) -> Result<(), DisplayError>;

    /// Send every row to the panel
    fn refresh_all(&mut self) -> Result<(), DisplayError> {
        let (_, height) = self.dimensions();
        self.refresh(0, height)
    }

    /// Blank the framebuffer and the panel
    fn clear_screen(&mut self) -> Result<(), DisplayError>;

    /// Keep-alive transmission that only flips VCOM
    fn toggle_vcom(&mut self) -> Result<(), DisplayError>;
}
