//! Engine backend trait.
//!
//! This module provides the [`EngineBackend`] trait, the seam behind which
//! a concrete transport to the display/sensing engine lives. The vendor's
//! own control library is a closed binary, so the crate does not assume
//! anything about wire framing; a backend only has to honor the call
//! contract below. [`SimBackend`](crate::sim::SimBackend) is the in-memory
//! implementation used by tests and demos.

use crate::draw::DrawCommand;
use crate::error::Result;
use crate::types::{
    Color, ConnectionInfo, FrameGeometry, LibraryInfo, Param, ParamValue, PulsingConfig,
    RenderTarget, SystemInfo, ValueStorage,
};

/// Backend trait for engine transports.
///
/// # Contract
///
/// - Every call is synchronous and blocking from the caller's perspective.
/// - A failing device call maps to [`Error::Device`](crate::Error::Device)
///   carrying the operation name and the device's result code; transport
///   faults map to `Disconnected` or `Backend`.
/// - `disconnect` is idempotent.
/// - Getters accept a [`ValueStorage`] selector; setters accept a `commit`
///   flag that persists the new value to startup storage when true.
pub trait EngineBackend: Send + 'static {
    /// Open a connection with the given parameters.
    fn connect(&mut self, info: &ConnectionInfo) -> Result<()>;

    /// Close the connection. Idempotent.
    fn disconnect(&mut self) -> Result<()>;

    /// Returns whether a connection is open.
    fn is_connected(&self) -> bool;

    /// Version information for the control library.
    fn library_info(&mut self) -> Result<LibraryInfo>;

    /// Identity of the connected engine.
    fn system_info(&mut self) -> Result<SystemInfo>;

    /// Read one scalar parameter from the selected storage.
    fn get_param(&mut self, param: Param, storage: ValueStorage) -> Result<ParamValue>;

    /// Write one scalar parameter; `commit` persists it to startup storage.
    fn set_param(&mut self, param: Param, value: ParamValue, commit: bool) -> Result<()>;

    /// Read the pulsing-engine configuration from the selected storage.
    fn pulsing_config(&mut self, storage: ValueStorage) -> Result<PulsingConfig>;

    /// Write the pulsing-engine configuration.
    fn set_pulsing_config(&mut self, config: &PulsingConfig, commit: bool) -> Result<()>;

    /// Number of ToF frames currently buffered on the device.
    fn frame_count(&mut self) -> Result<u32>;

    /// Geometry of the frames the device is producing.
    fn frame_dimensions(&mut self) -> Result<FrameGeometry>;

    /// Acquire up to `count` of the oldest buffered frames.
    ///
    /// Frames are written consecutively into `out`, which must hold at
    /// least `count * frame_len` samples. Returns the number of frames
    /// actually written.
    fn acquire_frame(&mut self, count: u32, out: &mut [u32]) -> Result<u32>;

    /// Queue a drawing primitive against a render target.
    fn draw(&mut self, target: RenderTarget, command: &DrawCommand) -> Result<()>;

    /// Fill a render target with a solid color, discarding queued commands.
    fn clear_target(&mut self, target: RenderTarget, color: Color) -> Result<()>;

    /// Flush queued commands, making the target visible.
    fn render(&mut self, target: RenderTarget) -> Result<()>;
}
