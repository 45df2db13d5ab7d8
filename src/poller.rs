//! Timer-driven frame acquisition.
//!
//! [`FramePoller`] drives an [`Engine`] on the caller's thread: it checks
//! the device's frame backlog on a fixed interval, drains all but the
//! newest buffered frame, and hands that frame to a callback. After a
//! successful acquisition it re-polls on a much shorter interval so a
//! steadily producing device is serviced at its own rate.
//!
//! A cloneable [`PollerControl`] stops the loop from another thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace, warn};

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::frame::TofFrame;

// =============================================================================
// Configuration
// =============================================================================

/// Timing configuration for a [`FramePoller`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PollerConfig {
    /// Delay between polls while the device has no frames buffered.
    pub interval: Duration,
    /// Delay after a successful acquisition, before the next poll.
    pub fast_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(250),
            fast_interval: Duration::from_millis(10),
        }
    }
}

// =============================================================================
// Control
// =============================================================================

/// Control handle for a running [`FramePoller`].
///
/// Cloneable; a stop request from any clone ends the loop at the next
/// poll boundary or sleep slice.
#[derive(Clone)]
pub struct PollerControl {
    stop_requested: Arc<AtomicBool>,
}

impl PollerControl {
    fn new() -> Self {
        Self {
            stop_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request the poll loop to stop.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    /// Check if a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }
}

/// Why a poll loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    /// A [`PollerControl::stop`] request was honored.
    Stopped,
    /// The engine connection was lost.
    Disconnected,
}

// =============================================================================
// Frame Poller
// =============================================================================

/// Polls an engine for ToF frames, keeping only the freshest.
///
/// # Example
///
/// ```no_run
/// use picop::{ConnectionInfo, Engine, FramePoller, SimBackend, UsbInfo};
///
/// let engine = Engine::connect(
///     Box::new(SimBackend::new()),
///     ConnectionInfo::Usb(UsbInfo { product_id: 4, serial_number: "1234".into() }),
/// )?;
///
/// let mut poller = FramePoller::new(engine);
/// let control = poller.control();
///
/// poller.run(
///     |frame| {
///         println!("frame with {} samples", frame.raw_samples().len());
///         control.stop();
///     },
///     |err| eprintln!("poll error: {}", err),
/// )?;
/// # Ok::<(), picop::Error>(())
/// ```
pub struct FramePoller {
    engine: Engine,
    config: PollerConfig,
    control: PollerControl,
    scratch: Vec<u32>,
}

impl FramePoller {
    /// Create a poller with the default timing configuration.
    pub fn new(engine: Engine) -> Self {
        Self::with_config(engine, PollerConfig::default())
    }

    /// Create a poller with explicit timing.
    pub fn with_config(engine: Engine, config: PollerConfig) -> Self {
        Self {
            engine,
            config,
            control: PollerControl::new(),
            scratch: Vec::new(),
        }
    }

    /// Returns a control handle for stopping the loop.
    pub fn control(&self) -> PollerControl {
        self.control.clone()
    }

    /// Access the underlying engine between polls.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Consume the poller, returning the engine.
    pub fn into_engine(self) -> Engine {
        self.engine
    }

    /// One poll cycle: check the backlog and drain it down to the newest frame.
    ///
    /// Returns `Ok(None)` when the device has nothing buffered. When `n`
    /// frames are buffered, all `n` are acquired and the last one is
    /// returned; the rest are discarded as stale.
    pub fn poll_once(&mut self) -> Result<Option<TofFrame>> {
        let count = self.engine.frame_count()?;
        if count == 0 {
            return Ok(None);
        }

        if count > 1 {
            trace!("discarding {} stale frames", count - 1);
        }
        for _ in 1..count {
            self.engine.acquire_frame_into(&mut self.scratch)?;
        }

        let frame = self.engine.acquire_frame()?;
        Ok(Some(frame))
    }

    /// Run the poll loop until stopped or disconnected.
    ///
    /// `on_frame` receives every retained frame. `on_error` receives every
    /// failed cycle; a failure other than a lost connection aborts only
    /// that cycle, and polling resumes after the idle interval.
    pub fn run<F, E>(&mut self, mut on_frame: F, mut on_error: E) -> Result<PollExit>
    where
        F: FnMut(TofFrame),
        E: FnMut(Error),
    {
        debug!(
            "poll loop started (idle {:?}, fast {:?})",
            self.config.interval, self.config.fast_interval
        );
        loop {
            if self.control.is_stop_requested() {
                return Ok(PollExit::Stopped);
            }

            let delay = match self.poll_once() {
                Ok(Some(frame)) => {
                    on_frame(frame);
                    self.config.fast_interval
                }
                Ok(None) => self.config.interval,
                Err(err) if err.is_disconnected() => {
                    warn!("poll loop lost connection: {}", err);
                    on_error(err);
                    return Ok(PollExit::Disconnected);
                }
                Err(err) => {
                    on_error(err);
                    self.config.interval
                }
            };

            if self.sleep_with_stop(delay) {
                return Ok(PollExit::Stopped);
            }
        }
    }

    fn sleep_with_stop(&self, duration: Duration) -> bool {
        const SLICE: Duration = Duration::from_millis(50);
        let mut remaining = duration;
        while remaining > Duration::ZERO {
            if self.control.is_stop_requested() {
                return true;
            }
            let slice = remaining.min(SLICE);
            std::thread::sleep(slice);
            remaining = remaining.saturating_sub(slice);
        }
        self.control.is_stop_requested()
    }
}
