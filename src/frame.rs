//! ToF frame value object.
//!
//! A [`TofFrame`] is one combined snapshot of time and amplitude samples
//! across all lines and pulses. The raw device buffer arrives as a single
//! linear run of 32-bit samples: the first half is the time channel, the
//! second half the amplitude channel, both indexed by
//! `line * pulses_virtual + pulse`. The frame owns that buffer and exposes
//! the channels by name instead of index arithmetic.
//!
//! Frames are immutable once built; acquisition replaces them wholesale.

use crate::error::{Error, Result};
use crate::types::{DataChannel, FrameGeometry};

/// One acquired ToF frame: geometry plus both sample channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TofFrame {
    geometry: FrameGeometry,
    samples: Vec<u32>,
}

impl TofFrame {
    /// Builds a frame from a raw combined sample buffer.
    ///
    /// The buffer must hold exactly `geometry.frame_len()` samples
    /// (time channel followed by amplitude channel).
    pub fn from_raw(geometry: FrameGeometry, samples: Vec<u32>) -> Result<Self> {
        let expected = geometry.frame_len();
        if samples.len() != expected {
            return Err(Error::FrameGeometry {
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self { geometry, samples })
    }

    /// Returns the frame geometry.
    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// The time (depth-proxy) channel.
    pub fn time(&self) -> &[u32] {
        &self.samples[..self.geometry.samples_per_channel()]
    }

    /// The amplitude channel.
    pub fn amplitude(&self) -> &[u32] {
        &self.samples[self.geometry.samples_per_channel()..]
    }

    /// The selected channel.
    pub fn channel(&self, channel: DataChannel) -> &[u32] {
        match channel {
            DataChannel::Time => self.time(),
            DataChannel::Amplitude => self.amplitude(),
        }
    }

    /// One sample addressed by logical line and pulse.
    ///
    /// Returns `None` when the coordinates are outside the geometry.
    pub fn sample(&self, channel: DataChannel, line: u32, pulse: u32) -> Option<u32> {
        if line >= self.geometry.lines_virtual() || pulse >= self.geometry.pulses_virtual() {
            return None;
        }
        let index = (line * self.geometry.pulses_virtual() + pulse) as usize;
        Some(self.channel(channel)[index])
    }

    /// The raw combined buffer: time channel then amplitude channel.
    pub fn raw_samples(&self) -> &[u32] {
        &self.samples
    }

    /// Consumes the frame, returning the raw combined buffer.
    pub fn into_raw(self) -> Vec<u32> {
        self.samples
    }
}
