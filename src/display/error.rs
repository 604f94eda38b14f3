/*
 *  display/error.rs
 *
 *  sharpmip - Sharp Memory-in-Pixel display driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error types for display subsystem
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

use thiserror::Error;

/// Unified error type for all display operations
///
/// Every drawing call validates its arguments before touching the
/// framebuffer, so an `OutOfBounds` or `UnsupportedCharacter` error means
/// nothing was changed and no VCOM transition was consumed.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Pixel, row, column or text extent outside the framebuffer
    #[error("{what} out of bounds: {value} (limit {limit})")]
    OutOfBounds {
        what: &'static str,
        value: usize,
        limit: usize,
    },

    /// Character not covered by the glyph table
    #[error("unsupported character {ch:?}: font covers {count} glyphs from code {first}")]
    UnsupportedCharacter { ch: char, first: u8, count: usize },

    /// Glyph table header or body is malformed
    #[error("invalid glyph table: {0}")]
    InvalidGlyphTable(String),

    /// Framebuffer dimensions the panel protocol cannot address
    #[error("invalid display geometry {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    /// The bus collaborator reported a failure; the transmission is lost
    #[error("bus transfer failed: {0}")]
    BusTransferFailed(String),

    /// GPIO pin error
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// SPI setup error
    #[error("SPI error: {0}")]
    Spi(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// File access (glyph tables loaded from disk)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DisplayError {
    pub(crate) fn out_of_bounds(what: &'static str, value: usize, limit: usize) -> Self {
        DisplayError::OutOfBounds { what, value, limit }
    }

    /// Wrap any bus-level error, keeping its debug rendering
    pub(crate) fn bus<E: core::fmt::Debug>(err: E) -> Self {
        DisplayError::BusTransferFailed(format!("{:?}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_message() {
        let err = DisplayError::out_of_bounds("pixel x", 144, 144);
        assert_eq!(err.to_string(), "pixel x out of bounds: 144 (limit 144)");
    }

    #[test]
    fn test_bus_error_keeps_debug_text() {
        #[derive(Debug)]
        struct Nak;
        let err = DisplayError::bus(Nak);
        assert!(matches!(err, DisplayError::BusTransferFailed(ref s) if s == "Nak"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "font.bin");
        let err: DisplayError = io.into();
        assert!(matches!(err, DisplayError::Io(_)));
    }
}
