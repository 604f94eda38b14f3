/*
 *  display/factory.rs
 *
 *  sharpmip - Sharp Memory-in-Pixel display driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Build a Linux-backed panel driver from configuration
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

use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::sysfs_gpio::Direction;
use linux_embedded_hal::{Delay, SpidevBus, SysfsPin};
use log::{debug, info};

use crate::config::{
    BusConfig, DisplayConfig, DEFAULT_HEIGHT, DEFAULT_SETTLE_MS, DEFAULT_SPI_SPEED_HZ,
    DEFAULT_VCOM_INTERVAL_MS, DEFAULT_WIDTH,
};
use crate::display::bus::HalBus;
use crate::display::drivers::sharp_memory::SharpMemoryDriver;
use crate::display::error::DisplayError;
use crate::display::traits::DisplayDriver;

/// spidev bus, sysfs chip select, thread-sleep delay
pub type LinuxBus = HalBus<SpidevBus, SysfsPin, Delay>;

/// Type alias for boxed display driver trait objects
pub type BoxedDriver = Box<dyn DisplayDriver>;

/// Factory for creating display drivers from configuration
pub struct DisplayDriverFactory;

impl DisplayDriverFactory {
    /// Open the SPI device and chip-select GPIO named in `config` and wrap
    /// them in a SHARP memory driver.
    ///
    /// Missing geometry and timing fall back to the 144x168 panel defaults.
    pub fn create_from_config(
        config: &DisplayConfig,
    ) -> Result<SharpMemoryDriver<LinuxBus>, DisplayError> {
        Self::validate_config(config)?;
        let BusConfig::Spi { bus, speed_hz, cs_pin } = config.bus.clone().unwrap_or_default();
        let speed_hz = speed_hz.unwrap_or(DEFAULT_SPI_SPEED_HZ);

        info!("Opening SHARP memory LCD on {} at {} Hz, CS gpio {}", bus, speed_hz, cs_pin);
        let spi = open_spi(&bus, speed_hz)?;
        let cs = open_chip_select(cs_pin)?;
        let hal_bus = HalBus::new(spi, cs, Delay)
            .map_err(|e| DisplayError::Gpio(format!("{:?}", e)))?;

        let driver = SharpMemoryDriver::new(
            hal_bus,
            config.width.unwrap_or(DEFAULT_WIDTH),
            config.height.unwrap_or(DEFAULT_HEIGHT),
        )?
        .with_settle_ms(config.settle_ms.unwrap_or(DEFAULT_SETTLE_MS))
        .with_vcom_interval(Duration::from_millis(
            config.vcom_interval_ms.unwrap_or(DEFAULT_VCOM_INTERVAL_MS),
        ));
        Ok(driver)
    }

    /// Same as `create_from_config`, behind the panel trait
    pub fn create_boxed(config: &DisplayConfig) -> Result<BoxedDriver, DisplayError> {
        Ok(Box::new(Self::create_from_config(config)?))
    }

    /// Validate a configuration without touching hardware
    pub fn validate_config(config: &DisplayConfig) -> Result<(), DisplayError> {
        if config.width == Some(0) || config.height == Some(0) {
            return Err(DisplayError::InvalidConfiguration(
                "display width/height must be > 0".to_string(),
            ));
        }
        if let Some(BusConfig::Spi { bus, .. }) = config.bus.as_ref() {
            if bus.is_empty() {
                return Err(DisplayError::InvalidConfiguration(
                    "spi bus path must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Mode 0, 8-bit words, MSB first
fn open_spi(path: &str, speed_hz: u32) -> Result<SpidevBus, DisplayError> {
    let mut spi = SpidevBus::open(path)
        .map_err(|e| DisplayError::Spi(format!("failed to open {}: {:?}", path, e)))?;
    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(speed_hz)
        .mode(SpiModeFlags::SPI_MODE_0)
        .build();
    spi.configure(&options)
        .map_err(|e| DisplayError::Spi(format!("failed to configure {}: {:?}", path, e)))?;
    debug!("{} configured", path);
    Ok(spi)
}

/// Export the pin and park it low: the panel's chip select idles low
fn open_chip_select(pin: u64) -> Result<SysfsPin, DisplayError> {
    let cs = SysfsPin::new(pin);
    cs.export()
        .map_err(|e| DisplayError::Gpio(format!("export gpio {}: {:?}", pin, e)))?;
    cs.set_direction(Direction::Low)
        .map_err(|e| DisplayError::Gpio(format!("gpio {} direction: {:?}", pin, e)))?;
    Ok(cs)
}
