/*
 *  display/drivers/mock.rs
 *
 *  sharpmip - Sharp Memory-in-Pixel display driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock bus for testing without hardware
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

use std::sync::{Arc, Mutex, MutexGuard};

use crate::display::bus::Bus;

/// Mock bus for testing
///
/// Records every transfer and chip-select edge instead of driving hardware.
/// It's useful for:
/// - Unit tests
/// - Integration tests
/// - Development without a panel attached
///
/// State lives behind an `Arc<Mutex<_>>` so a test can keep a handle after
/// the bus has been moved into a driver.
#[derive(Debug, Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<MockBusState>>,
}

/// Internal state for the mock bus (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockBusState {
    /// Every completed write, in order
    pub transfers: Vec<Vec<u8>>,

    /// Every select/deselect/write/delay, in order
    pub events: Vec<BusEvent>,

    /// Whether chip select is currently asserted
    pub selected: bool,

    /// Sum of all delays requested
    pub total_delay_ms: u64,

    /// Simulate failures (for error testing)
    pub simulate_write_failure: bool,
    pub simulate_select_failure: bool,
}

/// One recorded bus action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    Select,
    Write(usize),
    Deselect,
    Delay(u32),
}

/// Error raised by the mock when a failure is simulated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBusError {
    Write,
    Select,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the shared state for inspection
    pub fn state(&self) -> MutexGuard<'_, MockBusState> {
        // a poisoned lock only means another test thread panicked mid-record
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All completed transfers
    pub fn transfers(&self) -> Vec<Vec<u8>> {
        self.state().transfers.clone()
    }

    /// The most recent completed transfer
    pub fn last_transfer(&self) -> Option<Vec<u8>> {
        self.state().transfers.last().cloned()
    }

    /// All recorded events
    pub fn events(&self) -> Vec<BusEvent> {
        self.state().events.clone()
    }

    /// Forget recorded traffic, keep failure switches
    pub fn reset(&self) {
        let mut state = self.state();
        state.transfers.clear();
        state.events.clear();
        state.total_delay_ms = 0;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state().simulate_write_failure = fail;
    }

    pub fn fail_selects(&self, fail: bool) {
        self.state().simulate_select_failure = fail;
    }
}

impl Bus for MockBus {
    type Error = MockBusError;

    fn select(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state();
        if state.simulate_select_failure {
            return Err(MockBusError::Select);
        }
        state.selected = true;
        state.events.push(BusEvent::Select);
        Ok(())
    }

    fn deselect(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state();
        state.selected = false;
        state.events.push(BusEvent::Deselect);
        Ok(())
    }

    fn write_blocking(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        let mut state = self.state();
        if state.simulate_write_failure {
            return Err(MockBusError::Write);
        }
        state.events.push(BusEvent::Write(bytes.len()));
        state.transfers.push(bytes.to_vec());
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) {
        let mut state = self.state();
        state.total_delay_ms += u64::from(ms);
        state.events.push(BusEvent::Delay(ms));
    }
}
