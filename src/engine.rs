//! Typed device handle over an engine backend.
//!
//! [`Engine`] owns a boxed [`EngineBackend`] together with the connection
//! parameters it was opened with, and exposes the device surface as typed
//! methods: enum-valued getters and setters over the generic parameter
//! channel, structured pulsing configuration, frame transport, and the
//! drawing surface. All access to the device goes through this one value;
//! there is no global state.

use log::{debug, warn};

use crate::backend::EngineBackend;
use crate::draw::DrawCommand;
use crate::error::{Error, Result, ResultCode};
use crate::frame::TofFrame;
use crate::types::{
    Color, ColorMode, ColorSelect, ConnectionInfo, FlipState, FrameGeometry, LibraryInfo, Param,
    ParamKind, ParamValue, PrimaryColor, PulsingConfig, RenderTarget, SensingDataInterface,
    SensingState, SystemInfo, TofDataFormat, ValueStorage, DOUT_B_SCALE_MAX, TX_FALL_MAX,
    TX_RISE_MAX,
};

/// A connected display/sensing engine.
///
/// Created with [`Engine::connect`]; the connection is closed on drop, or
/// explicitly with [`Engine::close`].
pub struct Engine {
    info: ConnectionInfo,
    backend: Box<dyn EngineBackend>,
}

impl Engine {
    /// Opens a connection through the given backend.
    pub fn connect(mut backend: Box<dyn EngineBackend>, info: ConnectionInfo) -> Result<Self> {
        backend.connect(&info)?;
        debug!("engine connected over {}", info);
        Ok(Self { info, backend })
    }

    /// The connection parameters this engine was opened with.
    pub fn connection(&self) -> &ConnectionInfo {
        &self.info
    }

    /// Returns whether the connection is open.
    pub fn is_connected(&self) -> bool {
        self.backend.is_connected()
    }

    /// Closes the connection.
    pub fn close(mut self) -> Result<()> {
        debug!("engine closing connection {}", self.info);
        self.backend.disconnect()
    }

    // =========================================================================
    // Information
    // =========================================================================

    /// Version information for the control library.
    pub fn library_info(&mut self) -> Result<LibraryInfo> {
        self.backend.library_info()
    }

    /// Identity of the connected engine.
    pub fn system_info(&mut self) -> Result<SystemInfo> {
        self.backend.system_info()
    }

    // =========================================================================
    // Sensing Parameters
    // =========================================================================

    /// The sensing engine state from the selected storage.
    pub fn sensing_state(&mut self, storage: ValueStorage) -> Result<SensingState> {
        let raw = self.get_u32(Param::SensingState, storage)?;
        SensingState::from_raw(raw).ok_or(Error::InvalidValue {
            param: Param::SensingState,
            value: raw,
        })
    }

    /// Enables or disables the sensing engine.
    pub fn set_sensing_state(&mut self, state: SensingState, commit: bool) -> Result<()> {
        debug!("sensing state -> {:?} (commit: {})", state, commit);
        self.backend
            .set_param(Param::SensingState, ParamValue::U32(state.raw()), commit)
    }

    /// The interface carrying sensing data.
    pub fn sensing_data_interface(
        &mut self,
        storage: ValueStorage,
    ) -> Result<SensingDataInterface> {
        let raw = self.get_u32(Param::SensingDataInterface, storage)?;
        SensingDataInterface::from_raw(raw).ok_or(Error::InvalidValue {
            param: Param::SensingDataInterface,
            value: raw,
        })
    }

    /// Selects the interface carrying sensing data.
    pub fn set_sensing_data_interface(
        &mut self,
        interface: SensingDataInterface,
        commit: bool,
    ) -> Result<()> {
        self.backend.set_param(
            Param::SensingDataInterface,
            ParamValue::U32(interface.raw()),
            commit,
        )
    }

    /// The layout of acquired sample data.
    pub fn tof_data_format(&mut self, storage: ValueStorage) -> Result<TofDataFormat> {
        let raw = self.get_u32(Param::TofDataFormat, storage)?;
        TofDataFormat::from_raw(raw).ok_or(Error::InvalidValue {
            param: Param::TofDataFormat,
            value: raw,
        })
    }

    /// Selects the layout of acquired sample data.
    pub fn set_tof_data_format(&mut self, format: TofDataFormat, commit: bool) -> Result<()> {
        self.backend
            .set_param(Param::TofDataFormat, ParamValue::U32(format.raw()), commit)
    }

    /// The pulsing-engine configuration from the selected storage.
    pub fn pulsing_config(&mut self, storage: ValueStorage) -> Result<PulsingConfig> {
        self.backend.pulsing_config(storage)
    }

    /// Writes the pulsing-engine configuration.
    pub fn set_pulsing_config(&mut self, config: &PulsingConfig, commit: bool) -> Result<()> {
        self.backend.set_pulsing_config(config, commit)
    }

    /// IR laser fall- and rise-time slope codes.
    pub fn tx_fall_rise(&mut self, storage: ValueStorage) -> Result<(u32, u32)> {
        let fall = self.get_u32(Param::TxFall, storage)?;
        let rise = self.get_u32(Param::TxRise, storage)?;
        Ok((fall, rise))
    }

    /// Sets the IR laser fall- and rise-time slope codes.
    pub fn set_tx_fall_rise(&mut self, fall: u32, rise: u32, commit: bool) -> Result<()> {
        if fall > TX_FALL_MAX || rise > TX_RISE_MAX {
            return Err(Error::invalid_config(format!(
                "TX slope codes {}/{} exceed maxima {}/{}",
                fall, rise, TX_FALL_MAX, TX_RISE_MAX
            )));
        }
        self.backend
            .set_param(Param::TxFall, ParamValue::U32(fall), commit)?;
        self.backend
            .set_param(Param::TxRise, ParamValue::U32(rise), commit)
    }

    /// TDC-B depth data scale factor.
    pub fn dout_b_scale(&mut self, storage: ValueStorage) -> Result<u32> {
        self.get_u32(Param::DoutBScale, storage)
    }

    /// Sets the TDC-B depth data scale factor.
    pub fn set_dout_b_scale(&mut self, scale: u32, commit: bool) -> Result<()> {
        if scale > DOUT_B_SCALE_MAX {
            return Err(Error::invalid_config(format!(
                "TDC-B scale {} exceeds maximum {}",
                scale, DOUT_B_SCALE_MAX
            )));
        }
        self.backend
            .set_param(Param::DoutBScale, ParamValue::U32(scale), commit)
    }

    // =========================================================================
    // Display Parameters
    // =========================================================================

    /// Display brightness, 0.0 to 1.0.
    pub fn brightness(&mut self, storage: ValueStorage) -> Result<f32> {
        self.get_f32(Param::Brightness, storage)
    }

    /// Sets the display brightness.
    pub fn set_brightness(&mut self, value: f32, commit: bool) -> Result<()> {
        if !(0.0..=1.0).contains(&value) {
            return Err(Error::invalid_config(format!(
                "brightness {} outside 0.0..=1.0",
                value
            )));
        }
        self.backend
            .set_param(Param::Brightness, ParamValue::F32(value), commit)
    }

    /// Gamma value for one primary color.
    pub fn gamma(&mut self, color: PrimaryColor, storage: ValueStorage) -> Result<f32> {
        self.get_f32(Param::Gamma(color), storage)
    }

    /// Sets the gamma value for the selected color(s).
    pub fn set_gamma(&mut self, select: ColorSelect, value: f32, commit: bool) -> Result<()> {
        for color in select.colors() {
            self.backend
                .set_param(Param::Gamma(*color), ParamValue::F32(value), commit)?;
        }
        Ok(())
    }

    /// The display color mode.
    pub fn color_mode(&mut self, storage: ValueStorage) -> Result<ColorMode> {
        let raw = self.get_u32(Param::ColorMode, storage)?;
        ColorMode::from_raw(raw).ok_or(Error::InvalidValue {
            param: Param::ColorMode,
            value: raw,
        })
    }

    /// Sets the display color mode.
    pub fn set_color_mode(&mut self, mode: ColorMode, commit: bool) -> Result<()> {
        self.backend
            .set_param(Param::ColorMode, ParamValue::U32(mode.raw()), commit)
    }

    /// The display flip state.
    pub fn flip_state(&mut self, storage: ValueStorage) -> Result<FlipState> {
        let raw = self.get_u32(Param::FlipState, storage)?;
        FlipState::from_raw(raw).ok_or(Error::InvalidValue {
            param: Param::FlipState,
            value: raw,
        })
    }

    /// Sets the display flip state.
    pub fn set_flip_state(&mut self, state: FlipState, commit: bool) -> Result<()> {
        self.backend
            .set_param(Param::FlipState, ParamValue::U32(state.raw()), commit)
    }

    // =========================================================================
    // Frame Transport
    // =========================================================================

    /// Number of ToF frames buffered on the device.
    pub fn frame_count(&mut self) -> Result<u32> {
        self.backend.frame_count()
    }

    /// Geometry of the frames the device is producing.
    pub fn frame_dimensions(&mut self) -> Result<FrameGeometry> {
        self.backend.frame_dimensions()
    }

    /// Acquires the oldest buffered frame as a [`TofFrame`].
    pub fn acquire_frame(&mut self) -> Result<TofFrame> {
        let geometry = self.backend.frame_dimensions()?;
        let mut samples = vec![0u32; geometry.frame_len()];
        let acquired = self.backend.acquire_frame(1, &mut samples)?;
        if acquired == 0 {
            return Err(Error::device("acquire_frame", ResultCode::Timeout));
        }
        TofFrame::from_raw(geometry, samples)
    }

    /// Acquires the oldest buffered frame into a reusable raw buffer.
    ///
    /// The buffer is resized to the frame length. Used by the poller to
    /// discard backlog without re-allocating per frame.
    pub fn acquire_frame_into(&mut self, samples: &mut Vec<u32>) -> Result<()> {
        let geometry = self.backend.frame_dimensions()?;
        samples.resize(geometry.frame_len(), 0);
        let acquired = self.backend.acquire_frame(1, samples)?;
        if acquired == 0 {
            return Err(Error::device("acquire_frame", ResultCode::Timeout));
        }
        Ok(())
    }

    // =========================================================================
    // Drawing
    // =========================================================================

    /// Queues a drawing primitive against a render target.
    pub fn draw(&mut self, target: RenderTarget, command: &DrawCommand) -> Result<()> {
        debug!("queue {} on {}", command.kind(), target);
        self.backend.draw(target, command)
    }

    /// Fills a render target with a solid color, discarding queued commands.
    pub fn clear(&mut self, target: RenderTarget, color: Color) -> Result<()> {
        self.backend.clear_target(target, color)
    }

    /// Flushes queued commands, making the target visible.
    pub fn render(&mut self, target: RenderTarget) -> Result<()> {
        self.backend.render(target)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn get_u32(&mut self, param: Param, storage: ValueStorage) -> Result<u32> {
        let value = self.backend.get_param(param, storage)?;
        value.as_u32().ok_or(Error::ParamType {
            param,
            expected: ParamKind::U32,
            got: value.kind(),
        })
    }

    fn get_f32(&mut self, param: Param, storage: ValueStorage) -> Result<f32> {
        let value = self.backend.get_param(param, storage)?;
        value.as_f32().ok_or(Error::ParamType {
            param,
            expected: ParamKind::F32,
            got: value.kind(),
        })
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.backend.is_connected() {
            if let Err(err) = self.backend.disconnect() {
                warn!("disconnect on drop failed: {}", err);
            }
        }
    }
}
