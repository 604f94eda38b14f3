/*
 *  display/protocol.rs
 *
 *  sharpmip - Sharp Memory-in-Pixel display driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Wire format of the memory LCD: control byte, line addresses, frames
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

/// Control byte bits
pub struct Cmd;
impl Cmd {
    /// Data update: line-addressed rows follow
    pub const WRITE_LINE: u8 = 0b1000_0000;
    /// VCOM polarity high
    pub const VCOM: u8 = 0b0100_0000;
    /// Clear the panel's pixel memory
    pub const CLEAR_ALL: u8 = 0b0010_0000;
    /// Display mode, no data; only the VCOM bit matters
    pub const NOP: u8 = 0b0000_0000;
}

/// Zero byte closing every line and the whole transmission
pub const TRAILER: u8 = 0x00;

/// The three kinds of transmission the panel understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    WriteLines,
    Clear,
    Nop,
}

impl Command {
    fn bits(self) -> u8 {
        match self {
            Command::WriteLines => Cmd::WRITE_LINE,
            Command::Clear => Cmd::CLEAR_ALL,
            Command::Nop => Cmd::NOP,
        }
    }
}

/// VCOM polarity carried by the next transmission.
///
/// The panel needs the common electrode polarity reversed regularly; every
/// transmission carries the current polarity and flips it for the next one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vcom {
    high: bool,
}

impl Vcom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Polarity the next transmission will carry
    pub fn is_high(&self) -> bool {
        self.high
    }

    /// Build the control byte for `cmd` and advance the polarity
    pub fn next_control(&mut self, cmd: Command) -> u8 {
        let byte = control_byte(cmd, self.high);
        self.high = !self.high;
        byte
    }
}

/// Command bits plus the VCOM bit
#[inline]
pub fn control_byte(cmd: Command, vcom_high: bool) -> u8 {
    if vcom_high { cmd.bits() | Cmd::VCOM } else { cmd.bits() }
}

/// Line addresses go out LSB first while the bus shifts MSB first, so the
/// 8 bits of the row number are mirrored. This is a bit reversal, not a
/// byte swap.
#[inline]
pub fn line_address(row: u8) -> u8 {
    row.reverse_bits()
}

/// Size of a line-update frame for `rows` rows of `words_per_row` bytes
#[inline]
pub fn update_frame_len(rows: usize, words_per_row: usize) -> usize {
    1 + rows * (1 + words_per_row + 1) + 1
}

/// Serialize a line update: control byte, then per row address + data +
/// trailer, then the transmission trailer.
pub fn encode_update<'a, I>(control: u8, rows: I, words_per_row: usize, row_count: usize) -> Vec<u8>
where
    I: IntoIterator<Item = (u8, &'a [u8])>,
{
    let mut frame = Vec::with_capacity(update_frame_len(row_count, words_per_row));
    frame.push(control);
    for (row, data) in rows {
        frame.push(line_address(row));
        frame.extend_from_slice(data);
        frame.push(TRAILER);
    }
    frame.push(TRAILER);
    frame
}

/// Two-byte frame used by clear and VCOM toggle
#[inline]
pub fn encode_command(control: u8) -> [u8; 2] {
    [control, TRAILER]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_reverse(v: u8) -> u8 {
        (0..8).fold(0u8, |acc, bit| acc | (((v >> bit) & 1) << (7 - bit)))
    }

    #[test]
    fn test_line_address_is_bit_reversal() {
        assert_eq!(line_address(0), 0);
        assert_eq!(line_address(1), 0b1000_0000);
        assert_eq!(line_address(160), 0b0000_0101);
        assert_eq!(line_address(0xFF), 0xFF);
        for row in 0..=255u8 {
            assert_eq!(line_address(row), naive_reverse(row), "row {row}");
            assert_eq!(line_address(line_address(row)), row);
        }
    }

    #[test]
    fn test_control_bytes() {
        assert_eq!(control_byte(Command::WriteLines, false), 0x80);
        assert_eq!(control_byte(Command::WriteLines, true), 0xC0);
        assert_eq!(control_byte(Command::Clear, false), 0x20);
        assert_eq!(control_byte(Command::Clear, true), 0x60);
        assert_eq!(control_byte(Command::Nop, false), 0x00);
        assert_eq!(control_byte(Command::Nop, true), 0x40);
    }

    #[test]
    fn test_vcom_alternates() {
        let mut vcom = Vcom::new();
        assert!(!vcom.is_high());
        assert_eq!(vcom.next_control(Command::Nop), 0x00);
        assert!(vcom.is_high());
        assert_eq!(vcom.next_control(Command::Clear), 0x60);
        assert_eq!(vcom.next_control(Command::WriteLines), 0x80);
        assert_eq!(vcom.next_control(Command::WriteLines), 0xC0);
    }

    #[test]
    fn test_encode_update_layout() {
        let r0 = [0xAA, 0xBB];
        let r1 = [0x11, 0x22];
        let frame = encode_update(0x80, [(2u8, &r0[..]), (3u8, &r1[..])], 2, 2);
        assert_eq!(
            frame,
            vec![0x80, 0x40, 0xAA, 0xBB, 0x00, 0xC0, 0x11, 0x22, 0x00, 0x00]
        );
        assert_eq!(frame.len(), update_frame_len(2, 2));
    }

    #[test]
    fn test_encode_update_no_rows() {
        let frame = encode_update(0xC0, core::iter::empty(), 18, 0);
        assert_eq!(frame, vec![0xC0, 0x00]);
        assert_eq!(frame.len(), update_frame_len(0, 18));
    }

    #[test]
    fn test_frame_len_formula() {
        assert_eq!(update_frame_len(20, 18), 402);
        assert_eq!(update_frame_len(1, 18), 22);
        assert_eq!(update_frame_len(168, 18), 1 + 168 * 20 + 1);
    }

    #[test]
    fn test_encode_command() {
        assert_eq!(encode_command(0x60), [0x60, 0x00]);
    }
}
