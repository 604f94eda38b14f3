/*
 *  display/mod.rs
 *
 *  sharpmip - Sharp Memory-in-Pixel display driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - framebuffer, wire protocol and panel drivers
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod framebuffer;
pub mod font;
pub mod protocol;
pub mod bus;
pub mod pacer;

// Panel drivers
pub mod drivers;

// Linux wiring
pub mod factory;

// Re-exports for convenience
pub use traits::{DisplayDriver, DisplayCapabilities, DrawMode};
pub use error::DisplayError;
pub use framebuffer::FrameBuffer;
pub use font::GlyphTable;
pub use bus::{Bus, HalBus};
pub use pacer::VcomPacer;
pub use drivers::sharp_memory::SharpMemoryDriver;
pub use drivers::mock::MockBus;
pub use factory::{DisplayDriverFactory, BoxedDriver, LinuxBus};
