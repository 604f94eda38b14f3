/*
 *  display/drivers/sharp_memory.rs
 *
 *  sharpmip - Sharp Memory-in-Pixel display driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  SHARP Memory LCD driver implementation
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

// SHARP Memory LCDs (LS013B7DH05 144x168, LS027B7DH01A 400x240, ...) are
// monochrome panels with a 1-bit memory behind every pixel. Key points:
// - SPI, active-high chip select
// - rows are written individually, addressed by a bit-reversed line number
// - VCOM must be reversed at least once per second or the panel degrades
// - nothing is read back, so the framebuffer is the only copy of the image

use std::time::Duration;

use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use log::{debug, info, log_enabled, trace, warn, Level};

use crate::display::bus::Bus;
use crate::display::error::DisplayError;
use crate::display::font::GlyphTable;
use crate::display::framebuffer::{FrameBuffer, BLACK_BYTE, WHITE_BYTE};
use crate::display::protocol::{self, Command, Vcom};
use crate::display::traits::{DisplayCapabilities, DisplayDriver, DrawMode};

/// Pause after releasing chip select, in milliseconds
pub const DEFAULT_SETTLE_MS: u32 = 10;

/// Panels want a VCOM transition at least this often
pub const DEFAULT_VCOM_INTERVAL: Duration = Duration::from_secs(1);

/// SHARP Memory LCD driver
///
/// Owns the framebuffer, the bus and the VCOM polarity. Drawing only touches
/// memory; `refresh`, `clear_screen` and `toggle_vcom` each make one
/// transmission and each flip VCOM exactly once. Keeping VCOM alive while
/// idle is the caller's job (see [`crate::display::VcomPacer`]).
pub struct SharpMemoryDriver<B: Bus> {
    framebuffer: FrameBuffer,
    bus: B,
    vcom: Vcom,
    settle_ms: u32,
    capabilities: DisplayCapabilities,
}

impl<B: Bus> SharpMemoryDriver<B> {
    /// Create a driver for a `width` x `height` panel with a blank framebuffer.
    /// Nothing is sent until the first transmission.
    pub fn new(bus: B, width: u32, height: u32) -> Result<Self, DisplayError> {
        let framebuffer = FrameBuffer::new(width, height)?;
        let capabilities = DisplayCapabilities {
            width,
            height,
            words_per_row: framebuffer.words_per_row(),
            vcom_interval: DEFAULT_VCOM_INTERVAL,
        };
        info!("SHARP memory LCD {}x{} ({} bytes per row)", width, height, capabilities.words_per_row);
        Ok(Self {
            framebuffer,
            bus,
            vcom: Vcom::new(),
            settle_ms: DEFAULT_SETTLE_MS,
            capabilities,
        })
    }

    /// Override the post-transmission settle delay
    pub fn with_settle_ms(mut self, settle_ms: u32) -> Self {
        self.settle_ms = settle_ms;
        self
    }

    /// Override the advertised VCOM interval
    pub fn with_vcom_interval(mut self, interval: Duration) -> Self {
        self.capabilities.vcom_interval = interval;
        self
    }

    pub fn framebuffer(&self) -> &FrameBuffer { &self.framebuffer }
    pub fn framebuffer_mut(&mut self) -> &mut FrameBuffer { &mut self.framebuffer }

    /// VCOM polarity the next transmission will carry
    pub fn vcom(&self) -> bool { self.vcom.is_high() }

    pub fn settle_ms(&self) -> u32 { self.settle_ms }

    pub fn bus(&self) -> &B { &self.bus }
    pub fn bus_mut(&mut self) -> &mut B { &mut self.bus }

    /// Consume the driver and hand back the bus
    pub fn release(self) -> B {
        self.bus
    }

    /// Two-valued text drawing: `join_with_existing_pixels` selects `Add`,
    /// otherwise `Replace`.
    #[deprecated(note = "use draw_line_of_text with a DrawMode")]
    pub fn draw_line_of_text_joined(
        &mut self,
        x_col: u32,
        y: u32,
        text: &str,
        font: &GlyphTable<'_>,
        join_with_existing_pixels: bool,
    ) -> Result<(), DisplayError>
    where
        B: Send,
    {
        self.draw_line_of_text(x_col, y, text, font, DrawMode::from(join_with_existing_pixels))
    }

    /// The one path to the wire: select, write, deselect, settle.
    ///
    /// On a write failure chip select is still released before the error is
    /// returned. Nothing is retried.
    fn transmit(&mut self, frame: &[u8]) -> Result<(), DisplayError> {
        trace!("transmit {} bytes, control {:#04x}", frame.len(), frame[0]);
        self.bus.select().map_err(DisplayError::bus)?;
        if let Err(err) = self.bus.write_blocking(frame) {
            if let Err(cs_err) = self.bus.deselect() {
                warn!("chip select release failed after write error: {:?}", cs_err);
            }
            return Err(DisplayError::bus(err));
        }
        self.bus.deselect().map_err(DisplayError::bus)?;
        self.bus.delay_ms(self.settle_ms);
        Ok(())
    }

    /// Reject text that would leave the framebuffer or the font
    fn check_text_extent(
        &self,
        x_col: u32,
        y: u32,
        text: &str,
        font: &GlyphTable<'_>,
    ) -> Result<usize, DisplayError> {
        font.check_text(text)?;

        // glyphs cover whole bytes; none of them may spill into the padding bits
        let end_col = x_col as usize + text.chars().count() * font.width_bytes() as usize;
        let width = self.framebuffer.width() as usize;
        if end_col * 8 > width {
            return Err(DisplayError::out_of_bounds("text right edge pixel", end_col * 8, width));
        }
        let height = self.framebuffer.height() as usize;
        let bottom = y as usize + font.height_px() as usize;
        if bottom > height {
            return Err(DisplayError::out_of_bounds("text bottom row", bottom, height));
        }
        Ok(end_col)
    }
}

impl<B: Bus + Send> DisplayDriver for SharpMemoryDriver<B> {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn set_pixel(&mut self, x: u32, y: u32) -> Result<(), DisplayError> {
        self.framebuffer.set_pixel(x, y)
    }

    fn reset_pixel(&mut self, x: u32, y: u32) -> Result<(), DisplayError> {
        self.framebuffer.reset_pixel(x, y)
    }

    fn draw_line_of_text(
        &mut self,
        x_col: u32,
        y: u32,
        text: &str,
        font: &GlyphTable<'_>,
        mode: DrawMode,
    ) -> Result<(), DisplayError> {
        let end_col = self.check_text_extent(x_col, y, text, font)?;
        debug!("text {:?} at col {} row {} ({:?})", text, x_col, y, mode);

        let words_per_row = self.framebuffer.words_per_row();
        let width = font.width_bytes() as usize;
        let rows = y as usize..y as usize + font.height_px() as usize;
        let bytes = self.framebuffer.as_mut_bytes();

        for (n, ch) in text.chars().enumerate() {
            let glyph = font.glyph(ch)?;
            let col = x_col as usize + n * width;
            for (src, row) in glyph.chunks(width).zip(rows.clone()) {
                let start = row * words_per_row + col;
                let dst = &mut bytes[start..start + width];
                match mode {
                    DrawMode::Replace | DrawMode::Mix => dst.copy_from_slice(src),
                    DrawMode::Add => dst.iter_mut().zip(src).for_each(|(d, s)| *d &= *s),
                }
            }
        }

        if mode == DrawMode::Replace {
            for row in rows {
                let start = row * words_per_row;
                bytes[start + end_col..start + words_per_row].fill(WHITE_BYTE);
            }
        }

        if log_enabled!(Level::Trace) {
            trace!("framebuffer after text:\n{}", self.framebuffer.render_ascii());
        }
        Ok(())
    }

    fn draw_horizontal_line(&mut self, row: u32) -> Result<(), DisplayError> {
        self.framebuffer.fill_row(row, BLACK_BYTE)
    }

    /// Touches one bit in every row, so it is O(height)
    fn draw_vertical_line(&mut self, col: u32) -> Result<(), DisplayError> {
        if col >= self.framebuffer.width() {
            return Err(DisplayError::out_of_bounds(
                "column",
                col as usize,
                self.framebuffer.width() as usize,
            ));
        }
        for y in 0..self.framebuffer.height() {
            self.framebuffer.set_pixel(col, y)?;
        }
        Ok(())
    }

    fn refresh(&mut self, row_start: u32, row_end: u32) -> Result<(), DisplayError> {
        let height = self.framebuffer.height();
        if row_end > height {
            return Err(DisplayError::out_of_bounds("refresh end row", row_end as usize, height as usize));
        }
        if row_start > row_end {
            return Err(DisplayError::out_of_bounds(
                "refresh start row",
                row_start as usize,
                row_end as usize,
            ));
        }

        let words_per_row = self.framebuffer.words_per_row();
        let row_count = (row_end - row_start) as usize;
        let control = self.vcom.next_control(Command::WriteLines);
        let data = &self.framebuffer.as_bytes()
            [row_start as usize * words_per_row..row_end as usize * words_per_row];
        // heights are capped at 256, so every row number fits a byte
        let rows = (row_start..row_end).map(|r| r as u8).zip(data.chunks(words_per_row));
        let frame = protocol::encode_update(control, rows, words_per_row, row_count);

        debug!("refresh rows {}..{} ({} bytes)", row_start, row_end, frame.len());
        self.transmit(&frame)
    }

    fn clear_screen(&mut self) -> Result<(), DisplayError> {
        self.framebuffer.clear_all();
        let control = self.vcom.next_control(Command::Clear);
        debug!("clear screen");
        self.transmit(&protocol::encode_command(control))
    }

    fn toggle_vcom(&mut self) -> Result<(), DisplayError> {
        let control = self.vcom.next_control(Command::Nop);
        trace!("toggle vcom");
        self.transmit(&protocol::encode_command(control))
    }
}

impl<B: Bus> DrawTarget for SharpMemoryDriver<B> {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.framebuffer.draw_iter(pixels)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.framebuffer.clear(color)
    }
}

impl<B: Bus> OriginDimensions for SharpMemoryDriver<B> {
    fn size(&self) -> Size {
        self.framebuffer.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::{BusEvent, MockBus};

    /// 1 byte wide, 2 rows tall, glyphs for '0' and '1'
    const TINY: [u8; 7] = [1, 2, b'0', 0x0F, 0xF0, 0x00, 0x81];

    fn driver(width: u32, height: u32) -> (SharpMemoryDriver<MockBus>, MockBus) {
        let bus = MockBus::new();
        (SharpMemoryDriver::new(bus.clone(), width, height).unwrap(), bus)
    }

    #[test]
    fn test_driver_creation() {
        let (d, bus) = driver(144, 168);
        assert_eq!(d.dimensions(), (144, 168));
        assert_eq!(d.capabilities().words_per_row, 18);
        assert_eq!(d.capabilities().vcom_interval, DEFAULT_VCOM_INTERVAL);
        assert!(!d.vcom());
        assert!(bus.transfers().is_empty());
    }

    #[test]
    fn test_vcom_interval_reaches_capabilities() {
        let (d, _) = driver(144, 168);
        let d = d.with_vcom_interval(Duration::from_millis(400));
        assert_eq!(d.capabilities().vcom_interval, Duration::from_millis(400));
    }

    #[test]
    fn test_text_modes_in_small_buffer() {
        let font = GlyphTable::new(&TINY).unwrap();
        let (mut d, _) = driver(32, 4);
        d.framebuffer_mut().as_mut_bytes().fill(0x55);

        d.draw_line_of_text(1, 1, "01", &font, DrawMode::Mix).unwrap();
        assert_eq!(d.framebuffer().row_bytes(1).unwrap(), &[0x55, 0x0F, 0x00, 0x55]);
        assert_eq!(d.framebuffer().row_bytes(2).unwrap(), &[0x55, 0xF0, 0x81, 0x55]);

        d.draw_line_of_text(0, 1, "1", &font, DrawMode::Add).unwrap();
        assert_eq!(d.framebuffer().row_bytes(1).unwrap(), &[0x00, 0x0F, 0x00, 0x55]);
        assert_eq!(d.framebuffer().row_bytes(2).unwrap(), &[0x01, 0xF0, 0x81, 0x55]);

        d.draw_line_of_text(1, 2, "0", &font, DrawMode::Replace).unwrap();
        assert_eq!(d.framebuffer().row_bytes(2).unwrap(), &[0x01, 0x0F, 0xFF, 0xFF]);
        assert_eq!(d.framebuffer().row_bytes(3).unwrap(), &[0x55, 0xF0, 0xFF, 0xFF]);
        assert_eq!(d.framebuffer().row_bytes(0).unwrap(), &[0x55; 4]);
    }

    #[test]
    fn test_add_mode_uses_same_rows_as_replace() {
        let font = GlyphTable::new(&TINY).unwrap();
        let (mut add, _) = driver(16, 8);
        let (mut mix, _) = driver(16, 8);
        add.draw_line_of_text(1, 5, "0", &font, DrawMode::Add).unwrap();
        mix.draw_line_of_text(1, 5, "0", &font, DrawMode::Mix).unwrap();
        assert_eq!(add.framebuffer(), mix.framebuffer());
    }

    #[test]
    #[allow(deprecated)]
    fn test_joined_form_maps_to_add_and_replace() {
        let font = GlyphTable::new(&TINY).unwrap();
        let (mut d, _) = driver(16, 2);
        d.framebuffer_mut().as_mut_bytes().fill(0x3C);

        d.draw_line_of_text_joined(0, 0, "0", &font, true).unwrap();
        assert_eq!(d.framebuffer().row_bytes(0).unwrap(), &[0x0C, 0x3C]);

        d.draw_line_of_text_joined(0, 0, "0", &font, false).unwrap();
        assert_eq!(d.framebuffer().row_bytes(0).unwrap(), &[0x0F, 0xFF]);
    }

    #[test]
    fn test_text_rejections_leave_buffer_untouched() {
        let font = GlyphTable::new(&TINY).unwrap();
        let (mut d, bus) = driver(16, 4);
        let before = d.framebuffer().clone();

        assert!(matches!(
            d.draw_line_of_text(1, 0, "00", &font, DrawMode::Replace),
            Err(DisplayError::OutOfBounds { .. })
        ));
        assert!(matches!(
            d.draw_line_of_text(0, 3, "0", &font, DrawMode::Replace),
            Err(DisplayError::OutOfBounds { .. })
        ));
        // valid first char, bad second: nothing may be drawn
        assert!(matches!(
            d.draw_line_of_text(0, 0, "02", &font, DrawMode::Replace),
            Err(DisplayError::UnsupportedCharacter { ch: '2', .. })
        ));
        assert_eq!(d.framebuffer(), &before);
        assert!(bus.transfers().is_empty());
    }

    #[test]
    fn test_text_may_not_reach_padding_bits() {
        let font = GlyphTable::new(&TINY).unwrap();
        // 130 px: 17 bytes per row, the last one only 2 pixels wide
        let (mut d, bus) = driver(130, 4);
        let before = d.framebuffer().clone();

        assert!(matches!(
            d.draw_line_of_text(16, 0, "0", &font, DrawMode::Replace),
            Err(DisplayError::OutOfBounds { value: 136, limit: 130, .. })
        ));
        assert_eq!(d.framebuffer(), &before);
        assert!(bus.transfers().is_empty());

        d.draw_line_of_text(15, 0, "0", &font, DrawMode::Replace).unwrap();
        assert_eq!(d.framebuffer().row_bytes(0).unwrap()[15], 0x0F);
        // Replace still blanks to the end of the row
        assert_eq!(d.framebuffer().row_bytes(0).unwrap()[16], 0xFF);
    }

    #[test]
    fn test_empty_text_replace_blanks_band() {
        let font = GlyphTable::new(&TINY).unwrap();
        let (mut d, _) = driver(16, 3);
        d.framebuffer_mut().as_mut_bytes().fill(0x00);
        d.draw_line_of_text(0, 1, "", &font, DrawMode::Replace).unwrap();
        assert_eq!(d.framebuffer().as_bytes(), &[0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_lines() {
        let (mut d, _) = driver(16, 4);
        d.draw_horizontal_line(2).unwrap();
        assert_eq!(d.framebuffer().row_bytes(2).unwrap(), &[0x00, 0x00]);

        d.draw_vertical_line(9).unwrap();
        for y in [0, 1, 3] {
            assert_eq!(d.framebuffer().row_bytes(y).unwrap(), &[0xFF, 0b1111_1101]);
        }

        assert!(d.draw_horizontal_line(4).is_err());
        assert!(d.draw_vertical_line(16).is_err());
    }

    #[test]
    fn test_refresh_frame() {
        let (mut d, bus) = driver(16, 4);
        d.set_pixel(0, 1).unwrap();
        d.refresh(1, 3).unwrap();

        assert_eq!(
            bus.last_transfer().unwrap(),
            vec![0x80, 0x80, 0xFE, 0xFF, 0x00, 0x40, 0xFF, 0xFF, 0x00, 0x00]
        );
        assert_eq!(
            bus.events(),
            vec![BusEvent::Select, BusEvent::Write(10), BusEvent::Deselect, BusEvent::Delay(10)]
        );
        assert!(d.vcom());
    }

    #[test]
    fn test_refresh_bad_range_is_atomic() {
        let (mut d, bus) = driver(16, 4);
        assert!(d.refresh(0, 5).is_err());
        assert!(d.refresh(3, 2).is_err());
        assert!(bus.events().is_empty());
        assert!(!d.vcom());
    }

    #[test]
    fn test_refresh_empty_range_sends_control_and_trailer() {
        let (mut d, bus) = driver(16, 4);
        d.refresh(2, 2).unwrap();
        assert_eq!(bus.last_transfer().unwrap(), vec![0x80, 0x00]);
    }

    #[test]
    fn test_clear_and_toggle_frames() {
        let (mut d, bus) = driver(16, 4);
        d.set_pixel(3, 3).unwrap();

        d.clear_screen().unwrap();
        assert!(d.framebuffer().as_bytes().iter().all(|&b| b == 0xFF));
        d.toggle_vcom().unwrap();
        d.clear_screen().unwrap();
        d.toggle_vcom().unwrap();

        assert_eq!(
            bus.transfers(),
            vec![vec![0x20, 0x00], vec![0x40, 0x00], vec![0x20, 0x00], vec![0x40, 0x00]]
        );
    }

    #[test]
    fn test_write_failure_releases_chip_select() {
        let (mut d, bus) = driver(16, 4);
        bus.fail_writes(true);

        let err = d.toggle_vcom().unwrap_err();
        assert!(matches!(err, DisplayError::BusTransferFailed(_)));
        assert_eq!(bus.events(), vec![BusEvent::Select, BusEvent::Deselect]);
        assert!(!bus.state().selected);
    }

    #[test]
    fn test_select_failure_surfaces() {
        let (mut d, bus) = driver(16, 4);
        bus.fail_selects(true);
        assert!(matches!(d.refresh_all(), Err(DisplayError::BusTransferFailed(_))));
        assert!(bus.events().is_empty());
    }

    #[test]
    fn test_settle_delay_override() {
        let bus = MockBus::new();
        let mut d = SharpMemoryDriver::new(bus.clone(), 16, 4).unwrap().with_settle_ms(3);
        d.toggle_vcom().unwrap();
        assert_eq!(bus.state().total_delay_ms, 3);
        assert_eq!(d.settle_ms(), 3);
    }

    #[test]
    fn test_draw_target_delegates() {
        use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
        let (mut d, _) = driver(16, 4);
        Rectangle::new(Point::new(0, 0), Size::new(8, 2))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut d)
            .unwrap();
        assert_eq!(d.framebuffer().row_bytes(0).unwrap(), &[0x00, 0xFF]);
        assert_eq!(d.framebuffer().row_bytes(1).unwrap(), &[0x00, 0xFF]);
        assert_eq!(d.framebuffer().row_bytes(2).unwrap(), &[0xFF, 0xFF]);
    }
}
