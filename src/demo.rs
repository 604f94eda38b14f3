/*
 *  demo.rs
 *
 *  sharpmip - Sharp Memory-in-Pixel display driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Reference render loop: greeting, scrolling text, idle VCOM keep-alive
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

use std::time::{Duration, Instant};

use log::{debug, info};

use crate::config::DemoConfig;
use crate::display::{Bus, DisplayDriver, DisplayError, DrawMode, GlyphTable, SharpMemoryDriver, VcomPacer};

pub const GREETING: &str = "HELLO";
pub const MOVING_TEXT: &str = "CZE";
pub const DEFAULT_START_ROW: u32 = 20;
pub const DEFAULT_END_ROW: u32 = 120;
const MAX_TICK: Duration = Duration::from_secs(1);

/// What a single demo step sent to the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Text moved down a row and the band was refreshed
    Moved(u32),
    /// Nothing to draw, VCOM keep-alive sent
    Toggled,
    /// Nothing to draw and VCOM not due yet
    Idle,
}

/// The reference usage loop, one `step` per tick.
pub struct Demo<'f> {
    font: &'f GlyphTable<'f>,
    row: u32,
    start_row: u32,
    end_row: u32,
    dump: bool,
    pacer: VcomPacer,
    tick: Duration,
}

impl<'f> Demo<'f> {
    /// `vcom_interval` is the panel's keep-alive deadline; the loop ticks at
    /// half of it (at most once a second) so idle toggles land before it.
    pub fn new(font: &'f GlyphTable<'f>, config: &DemoConfig, vcom_interval: Duration) -> Self {
        let start_row = config.start_row.unwrap_or(DEFAULT_START_ROW);
        Self {
            font,
            row: start_row,
            start_row,
            end_row: config.end_row.unwrap_or(DEFAULT_END_ROW),
            dump: config.dump.unwrap_or(false),
            pacer: VcomPacer::new(vcom_interval),
            tick: (vcom_interval / 2).min(MAX_TICK),
        }
    }

    /// How long the caller should sleep between steps
    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Blank the panel and show the greeting in the top rows
    pub fn intro<B: Bus + Send>(&mut self, lcd: &mut SharpMemoryDriver<B>) -> Result<(), DisplayError> {
        lcd.clear_screen()?;
        lcd.draw_line_of_text(0, 0, GREETING, self.font, DrawMode::Replace)?;
        let (_, height) = lcd.dimensions();
        lcd.refresh(0, (self.font.height_px() as u32).min(height))?;
        self.pacer.note_transmission();
        self.log_frame(lcd);
        info!("greeting shown");
        Ok(())
    }

    /// Move the text one row down while there is room, otherwise keep VCOM alive
    pub fn step<B: Bus + Send>(&mut self, lcd: &mut SharpMemoryDriver<B>) -> Result<Step, DisplayError> {
        self.step_at(lcd, Instant::now())
    }

    pub fn step_at<B: Bus + Send>(
        &mut self,
        lcd: &mut SharpMemoryDriver<B>,
        now: Instant,
    ) -> Result<Step, DisplayError> {
        let (_, height) = lcd.dimensions();
        let glyph_rows = self.font.height_px() as u32;

        if self.row < self.end_row && self.row.saturating_add(glyph_rows) <= height {
            lcd.clear_screen()?;
            lcd.draw_line_of_text(0, self.row, MOVING_TEXT, self.font, DrawMode::Replace)?;
            let band_end = self.end_row.saturating_add(glyph_rows).min(height);
            lcd.refresh(self.start_row.min(band_end), band_end)?;
            self.pacer.note_transmission_at(now);
            self.log_frame(lcd);

            let moved = self.row;
            self.row += 1;
            return Ok(Step::Moved(moved));
        }

        if self.pacer.due_within_at(now, self.tick) {
            lcd.toggle_vcom()?;
            self.pacer.note_transmission_at(now);
            return Ok(Step::Toggled);
        }
        Ok(Step::Idle)
    }

    fn log_frame<B: Bus>(&self, lcd: &SharpMemoryDriver<B>) {
        if self.dump {
            info!("\n{}", lcd.framebuffer().render_ascii());
        } else {
            debug!("frame sent, vcom now {}", lcd.vcom());
        }
    }
}
