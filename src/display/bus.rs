/*
 *  display/bus.rs
 *
 *  sharpmip - Sharp Memory-in-Pixel display driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Bus collaborator: chip select, blocking writes and settle delays
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

use core::fmt::Debug;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

/// What the panel driver needs from the wiring.
///
/// The driver performs exactly `select → write_blocking → deselect →
/// delay_ms` for every transmission. Timeouts, if any, belong to the
/// implementation; the driver never retries.
pub trait Bus {
    type Error: Debug;

    /// Assert the panel's chip select
    fn select(&mut self) -> Result<(), Self::Error>;

    /// Release the panel's chip select
    fn deselect(&mut self) -> Result<(), Self::Error>;

    /// Write the whole buffer, returning once it is on the wire
    fn write_blocking(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Busy-wait
    fn delay_ms(&mut self, ms: u32);
}

/// Error from one of the three embedded-hal parts of a [`HalBus`]
#[derive(Debug)]
pub enum HalBusError<S, P> {
    Spi(S),
    ChipSelect(P),
}

/// [`Bus`] over embedded-hal 1.0: an exclusive SPI bus, a GPIO chip select
/// and a delay source.
///
/// Sharp memory panels use an active-high chip select that idles low, which
/// is why this does not build on `SpiDevice`.
pub struct HalBus<SPI, CS, D> {
    spi: SPI,
    cs: CS,
    delay: D,
}

impl<SPI, CS, D> HalBus<SPI, CS, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    D: DelayNs,
{
    /// Wrap the parts; drives chip select to its idle (low) level
    pub fn new(spi: SPI, mut cs: CS, delay: D) -> Result<Self, HalBusError<SPI::Error, CS::Error>> {
        cs.set_low().map_err(HalBusError::ChipSelect)?;
        Ok(Self { spi, cs, delay })
    }

    /// Give the parts back
    pub fn release(self) -> (SPI, CS, D) {
        (self.spi, self.cs, self.delay)
    }
}

impl<SPI, CS, D> Bus for HalBus<SPI, CS, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    D: DelayNs,
{
    type Error = HalBusError<SPI::Error, CS::Error>;

    fn select(&mut self) -> Result<(), Self::Error> {
        self.cs.set_high().map_err(HalBusError::ChipSelect)
    }

    fn deselect(&mut self) -> Result<(), Self::Error> {
        self.cs.set_low().map_err(HalBusError::ChipSelect)
    }

    fn write_blocking(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.spi.write(bytes).map_err(HalBusError::Spi)?;
        self.spi.flush().map_err(HalBusError::Spi)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
