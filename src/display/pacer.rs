/*
 *  display/pacer.rs
 *
 *  sharpmip - Sharp Memory-in-Pixel display driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Caller-side VCOM keep-alive scheduling
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

/// Tracks when the panel last saw a transmission.
///
/// The driver has no timer of its own; a render loop calls
/// `note_transmission` after every refresh or clear and asks `due` whether
/// an idle `toggle_vcom` is needed.
pub struct VcomPacer {
    last: Instant,
    interval: Duration,
}

impl VcomPacer {
    pub fn new(interval: Duration) -> Self {
        Self { last: Instant::now(), interval }
    }

    #[inline]
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration { self.interval }

    /// Record that VCOM just flipped
    #[inline]
    pub fn note_transmission(&mut self) {
        self.note_transmission_at(Instant::now());
    }

    pub fn note_transmission_at(&mut self, at: Instant) {
        self.last = at;
    }

    /// True once the interval has passed without a transmission
    #[inline]
    pub fn due(&self) -> bool {
        self.due_at(Instant::now())
    }

    pub fn due_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last) >= self.interval
    }

    /// True when the interval will have passed within `lead`.
    ///
    /// A loop that wakes every `lead` uses this to toggle before the
    /// deadline rather than after it.
    pub fn due_within_at(&self, now: Instant, lead: Duration) -> bool {
        now.saturating_duration_since(self.last) + lead >= self.interval
    }

    /// Time left before a toggle is required
    pub fn remaining(&self) -> Duration {
        self.interval.saturating_sub(self.last.elapsed())
    }
}
