//! In-memory simulated engine.
//!
//! [`SimBackend`] implements [`EngineBackend`] entirely in memory: a
//! parameter store with current/startup/factory slots, a bounded frame
//! queue fed by the test (or by [`push_synthetic_frame`]), and a journal
//! of drawing commands per render target. Clones share state, so a test
//! can keep a handle and feed frames or inject failures while an
//! [`Engine`](crate::engine::Engine) owns another clone.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::backend::EngineBackend;
use crate::draw::DrawCommand;
use crate::error::{Error, Result, ResultCode};
use crate::types::{
    Color, ConnectionInfo, FrameGeometry, LibraryInfo, Param, ParamKind, ParamValue, PrimaryColor,
    PulsingConfig, RenderTarget, SystemInfo, TofPulsingMode, ValueStorage,
};

/// Frames buffered before the oldest is dropped, as a real device would.
const FRAME_QUEUE_LIMIT: usize = 8;

/// Expected value kind for each scalar parameter.
fn expected_kind(param: Param) -> ParamKind {
    match param {
        Param::Brightness | Param::Gamma(_) => ParamKind::F32,
        _ => ParamKind::U32,
    }
}

#[derive(Debug, Clone, Copy)]
struct Stored {
    current: ParamValue,
    startup: ParamValue,
    factory: ParamValue,
}

impl Stored {
    fn seeded(value: ParamValue) -> Self {
        Self {
            current: value,
            startup: value,
            factory: value,
        }
    }

    fn get(&self, storage: ValueStorage) -> ParamValue {
        match storage {
            ValueStorage::Current => self.current,
            ValueStorage::Startup => self.startup,
            ValueStorage::Factory => self.factory,
        }
    }
}

struct SimState {
    connected: Option<ConnectionInfo>,
    geometry: FrameGeometry,
    params: HashMap<Param, Stored>,
    pulsing_current: PulsingConfig,
    pulsing_startup: PulsingConfig,
    pulsing_factory: PulsingConfig,
    frames: VecDeque<Vec<u32>>,
    fail_next: Option<(&'static str, ResultCode)>,
    queued: HashMap<RenderTarget, Vec<DrawCommand>>,
    rendered: HashMap<RenderTarget, Vec<DrawCommand>>,
    render_log: Vec<RenderTarget>,
}

impl SimState {
    fn new(geometry: FrameGeometry) -> Self {
        let mut params = HashMap::new();
        params.insert(Param::SensingState, Stored::seeded(ParamValue::U32(1)));
        params.insert(
            Param::SensingDataInterface,
            Stored::seeded(ParamValue::U32(0)),
        );
        params.insert(Param::TofDataFormat, Stored::seeded(ParamValue::U32(0)));
        params.insert(Param::Brightness, Stored::seeded(ParamValue::F32(1.0)));
        for color in PrimaryColor::all() {
            params.insert(Param::Gamma(color), Stored::seeded(ParamValue::F32(1.0)));
        }
        params.insert(Param::ColorMode, Stored::seeded(ParamValue::U32(1)));
        params.insert(Param::FlipState, Stored::seeded(ParamValue::U32(0)));
        params.insert(Param::TxFall, Stored::seeded(ParamValue::U32(8)));
        params.insert(Param::TxRise, Stored::seeded(ParamValue::U32(8)));
        params.insert(Param::DoutBScale, Stored::seeded(ParamValue::U32(0x800)));

        let pulsing = PulsingConfig {
            mode: TofPulsingMode::EqualAngle,
            pulses_per_line: geometry.pulses_per_line as u16,
            line_phases: 0,
            frame_phases: 0,
        };

        Self {
            connected: None,
            geometry,
            params,
            pulsing_current: pulsing,
            pulsing_startup: pulsing,
            pulsing_factory: pulsing,
            frames: VecDeque::new(),
            fail_next: None,
            queued: HashMap::new(),
            rendered: HashMap::new(),
            render_log: Vec::new(),
        }
    }

    fn check_failure(&mut self, op: &'static str) -> Result<()> {
        if let Some((failing_op, code)) = self.fail_next {
            if failing_op == op {
                self.fail_next = None;
                return Err(Error::device(op, code));
            }
        }
        Ok(())
    }

    fn check_connected(&self) -> Result<()> {
        if self.connected.is_none() {
            return Err(Error::disconnected("not connected"));
        }
        Ok(())
    }
}

/// Simulated engine backend with shared state across clones.
#[derive(Clone)]
pub struct SimBackend {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBackend {
    /// A simulated engine producing frames with the default geometry.
    pub fn new() -> Self {
        Self::with_geometry(FrameGeometry::default())
    }

    /// A simulated engine with an explicit frame geometry.
    pub fn with_geometry(geometry: FrameGeometry) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::new(geometry))),
        }
    }

    /// The geometry this simulation produces frames in.
    pub fn geometry(&self) -> FrameGeometry {
        self.state.lock().unwrap().geometry
    }

    /// Queue a raw frame for acquisition.
    ///
    /// The buffer must hold exactly `geometry.frame_len()` samples. When
    /// the queue is full the oldest frame is dropped, as on the device.
    pub fn push_frame(&self, samples: Vec<u32>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let expected = state.geometry.frame_len();
        if samples.len() != expected {
            return Err(Error::FrameGeometry {
                expected,
                actual: samples.len(),
            });
        }
        if state.frames.len() == FRAME_QUEUE_LIMIT {
            state.frames.pop_front();
        }
        state.frames.push_back(samples);
        Ok(())
    }

    /// Queue a deterministic gradient frame.
    ///
    /// Time samples ramp along each line; amplitude samples ramp down the
    /// frame. Both stay within the low byte.
    pub fn push_synthetic_frame(&self) {
        let geometry = self.geometry();
        let pulses = geometry.pulses_virtual();
        let lines = geometry.lines_virtual();
        let per_channel = geometry.samples_per_channel();

        let mut samples = vec![0u32; geometry.frame_len()];
        for line in 0..lines {
            for pulse in 0..pulses {
                let index = (line * pulses + pulse) as usize;
                samples[index] = (pulse * 255 / pulses.max(1)) & 0xff;
                samples[per_channel + index] = (line * 255 / lines.max(1)) & 0xff;
            }
        }
        self.push_frame(samples).unwrap();
    }

    /// Number of frames waiting in the queue.
    pub fn pending_frames(&self) -> usize {
        self.state.lock().unwrap().frames.len()
    }

    /// Make the next call to the named operation fail with `code`.
    ///
    /// The failure is consumed by that call; subsequent calls succeed.
    pub fn fail_next(&self, op: &'static str, code: ResultCode) {
        self.state.lock().unwrap().fail_next = Some((op, code));
    }

    /// Sever the connection out from under the owning engine.
    pub fn drop_connection(&self) {
        self.state.lock().unwrap().connected = None;
    }

    /// Commands rendered (flushed) to a target so far.
    pub fn drawn(&self, target: RenderTarget) -> Vec<DrawCommand> {
        self.state
            .lock()
            .unwrap()
            .rendered
            .get(&target)
            .cloned()
            .unwrap_or_default()
    }

    /// Commands queued against a target but not yet rendered.
    pub fn queued(&self, target: RenderTarget) -> Vec<DrawCommand> {
        self.state
            .lock()
            .unwrap()
            .queued
            .get(&target)
            .cloned()
            .unwrap_or_default()
    }

    /// Every render flush, in order.
    pub fn renders(&self) -> Vec<RenderTarget> {
        self.state.lock().unwrap().render_log.clone()
    }
}

impl EngineBackend for SimBackend {
    fn connect(&mut self, info: &ConnectionInfo) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_failure("open_connection")?;
        if state.connected.is_some() {
            return Err(Error::device("open_connection", ResultCode::Fail));
        }
        state.connected = Some(info.clone());
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_failure("close_connection")?;
        state.connected = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected.is_some()
    }

    fn library_info(&mut self) -> Result<LibraryInfo> {
        let mut state = self.state.lock().unwrap();
        state.check_failure("get_library_info")?;
        Ok(LibraryInfo {
            major_version: 2,
            minor_version: 4,
            patch_version: 0,
            capability_flags: 0x7,
        })
    }

    fn system_info(&mut self) -> Result<SystemInfo> {
        let mut state = self.state.lock().unwrap();
        state.check_connected()?;
        state.check_failure("get_system_info")?;
        let serial = match &state.connected {
            Some(ConnectionInfo::Usb(usb)) => usb.serial_number.clone(),
            _ => "SIM-0001".to_string(),
        };
        Ok(SystemInfo {
            serial_number: serial,
            software_version: 0x0204_0000,
            fpga_version: 0x0101_0000,
        })
    }

    fn get_param(&mut self, param: Param, storage: ValueStorage) -> Result<ParamValue> {
        let mut state = self.state.lock().unwrap();
        state.check_connected()?;
        state.check_failure("get_param")?;
        let stored = state
            .params
            .get(&param)
            .ok_or_else(|| Error::device("get_param", ResultCode::NotSupported))?;
        Ok(stored.get(storage))
    }

    fn set_param(&mut self, param: Param, value: ParamValue, commit: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_connected()?;
        state.check_failure("set_param")?;
        if value.kind() != expected_kind(param) {
            return Err(Error::device("set_param", ResultCode::InvalidArgument));
        }
        let stored = state
            .params
            .get_mut(&param)
            .ok_or_else(|| Error::device("set_param", ResultCode::NotSupported))?;
        stored.current = value;
        if commit {
            stored.startup = value;
        }
        Ok(())
    }

    fn pulsing_config(&mut self, storage: ValueStorage) -> Result<PulsingConfig> {
        let mut state = self.state.lock().unwrap();
        state.check_connected()?;
        state.check_failure("get_pulsing_config")?;
        Ok(match storage {
            ValueStorage::Current => state.pulsing_current,
            ValueStorage::Startup => state.pulsing_startup,
            ValueStorage::Factory => state.pulsing_factory,
        })
    }

    fn set_pulsing_config(&mut self, config: &PulsingConfig, commit: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_connected()?;
        state.check_failure("set_pulsing_config")?;
        state.pulsing_current = *config;
        if commit {
            state.pulsing_startup = *config;
        }
        Ok(())
    }

    fn frame_count(&mut self) -> Result<u32> {
        let mut state = self.state.lock().unwrap();
        state.check_connected()?;
        state.check_failure("get_frame_count")?;
        Ok(state.frames.len() as u32)
    }

    fn frame_dimensions(&mut self) -> Result<FrameGeometry> {
        let mut state = self.state.lock().unwrap();
        state.check_connected()?;
        state.check_failure("get_frame_dimensions")?;
        Ok(state.geometry)
    }

    fn acquire_frame(&mut self, count: u32, out: &mut [u32]) -> Result<u32> {
        let mut state = self.state.lock().unwrap();
        state.check_connected()?;
        state.check_failure("acquire_frame")?;

        let frame_len = state.geometry.frame_len();
        let needed = frame_len * count as usize;
        if out.len() < needed {
            return Err(Error::device("acquire_frame", ResultCode::BufferTooSmall));
        }
        if state.frames.is_empty() {
            return Err(Error::device("acquire_frame", ResultCode::Timeout));
        }

        let mut acquired = 0u32;
        while acquired < count {
            let Some(frame) = state.frames.pop_front() else {
                break;
            };
            let offset = acquired as usize * frame_len;
            out[offset..offset + frame_len].copy_from_slice(&frame);
            acquired += 1;
        }
        Ok(acquired)
    }

    fn draw(&mut self, target: RenderTarget, command: &DrawCommand) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_connected()?;
        state.check_failure("draw")?;
        state.queued.entry(target).or_default().push(command.clone());
        Ok(())
    }

    fn clear_target(&mut self, target: RenderTarget, _color: Color) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_connected()?;
        state.check_failure("clear")?;
        state.queued.remove(&target);
        Ok(())
    }

    fn render(&mut self, target: RenderTarget) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_connected()?;
        state.check_failure("render")?;
        let queued = state.queued.remove(&target).unwrap_or_default();
        state.rendered.entry(target).or_default().extend(queued);
        state.render_log.push(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Point, UsbInfo};

    fn connected() -> SimBackend {
        let mut backend = SimBackend::new();
        backend
            .connect(&ConnectionInfo::Usb(UsbInfo {
                product_id: 4,
                serial_number: "SIM-42".to_string(),
            }))
            .unwrap();
        backend
    }

    #[test]
    fn test_device_ops_require_connection() {
        let mut backend = SimBackend::new();
        assert!(backend
            .get_param(Param::Brightness, ValueStorage::Current)
            .unwrap_err()
            .is_disconnected());
        assert!(backend.frame_count().unwrap_err().is_disconnected());
    }

    #[test]
    fn test_double_connect_fails() {
        let mut backend = connected();
        let err = backend
            .connect(&ConnectionInfo::Usb(UsbInfo {
                product_id: 4,
                serial_number: "other".to_string(),
            }))
            .unwrap_err();
        assert!(err.is_device());
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut backend = connected();
        backend.disconnect().unwrap();
        backend.disconnect().unwrap();
        assert!(!backend.is_connected());
    }

    #[test]
    fn test_system_info_echoes_usb_serial() {
        let mut backend = connected();
        assert_eq!(backend.system_info().unwrap().serial_number, "SIM-42");
    }

    #[test]
    fn test_set_param_rejects_wrong_kind() {
        let mut backend = connected();
        let err = backend
            .set_param(Param::Brightness, ParamValue::U32(1), false)
            .unwrap_err();
        match err {
            Error::Device { op, code } => {
                assert_eq!(op, "set_param");
                assert_eq!(code, ResultCode::InvalidArgument);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_push_frame_validates_length() {
        let backend = SimBackend::new();
        assert!(backend.push_frame(vec![0; 3]).is_err());
    }

    #[test]
    fn test_frame_queue_drops_oldest_when_full() {
        let backend = SimBackend::with_geometry(FrameGeometry::new(2, 2, 1).unwrap());
        let len = backend.geometry().frame_len();
        for marker in 0..=FRAME_QUEUE_LIMIT as u32 {
            let mut samples = vec![0u32; len];
            samples[0] = marker;
            backend.push_frame(samples).unwrap();
        }
        assert_eq!(backend.pending_frames(), FRAME_QUEUE_LIMIT);

        let mut backend_conn = backend.clone();
        backend_conn
            .connect(&ConnectionInfo::Usb(UsbInfo {
                product_id: 4,
                serial_number: "x".to_string(),
            }))
            .unwrap();
        let mut out = vec![0u32; len];
        backend_conn.acquire_frame(1, &mut out).unwrap();
        // Frame 0 was dropped when frame 8 arrived
        assert_eq!(out[0], 1);
    }

    #[test]
    fn test_acquire_checks_buffer_size() {
        let mut backend = connected();
        backend.push_synthetic_frame();
        let mut out = vec![0u32; 3];
        let err = backend.acquire_frame(1, &mut out).unwrap_err();
        match err {
            Error::Device { code, .. } => assert_eq!(code, ResultCode::BufferTooSmall),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_acquire_empty_queue_times_out() {
        let mut backend = connected();
        let mut out = vec![0u32; backend.geometry().frame_len()];
        let err = backend.acquire_frame(1, &mut out).unwrap_err();
        match err {
            Error::Device { op, code } => {
                assert_eq!(op, "acquire_frame");
                assert_eq!(code, ResultCode::Timeout);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_acquire_multiple_returns_partial_count() {
        let mut backend = connected();
        backend.push_synthetic_frame();
        backend.push_synthetic_frame();
        let len = backend.geometry().frame_len();
        let mut out = vec![0u32; len * 3];
        assert_eq!(backend.acquire_frame(3, &mut out).unwrap(), 2);
        assert_eq!(backend.pending_frames(), 0);
    }

    #[test]
    fn test_draw_queue_flushes_on_render() {
        let mut backend = connected();
        let command = DrawCommand::Point {
            at: Point::new(1, 2),
            color: Color::new(255, 0, 0),
        };
        backend.draw(RenderTarget::Osd0, &command).unwrap();
        assert_eq!(backend.queued(RenderTarget::Osd0).len(), 1);
        assert!(backend.drawn(RenderTarget::Osd0).is_empty());

        backend.render(RenderTarget::Osd0).unwrap();
        assert!(backend.queued(RenderTarget::Osd0).is_empty());
        assert_eq!(backend.drawn(RenderTarget::Osd0), vec![command]);
        assert_eq!(backend.renders(), vec![RenderTarget::Osd0]);
    }

    #[test]
    fn test_clear_discards_queued_commands() {
        let mut backend = connected();
        backend
            .draw(
                RenderTarget::FrameBuffer0,
                &DrawCommand::Point {
                    at: Point::new(0, 0),
                    color: Color::new(1, 2, 3),
                },
            )
            .unwrap();
        backend
            .clear_target(RenderTarget::FrameBuffer0, Color::default())
            .unwrap();
        backend.render(RenderTarget::FrameBuffer0).unwrap();
        assert!(backend.drawn(RenderTarget::FrameBuffer0).is_empty());
    }

    #[test]
    fn test_fail_next_is_consumed() {
        let mut backend = connected();
        backend.fail_next("get_frame_count", ResultCode::CommunicationError);
        assert!(backend.frame_count().is_err());
        assert_eq!(backend.frame_count().unwrap(), 0);
    }
}
