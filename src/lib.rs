//! Client library for PicoP laser-projection display and ToF sensing engines.
//!
//! This crate models the engine's control surface as a typed handle over a
//! pluggable backend: connection lifecycle, parameter get/set with
//! current/startup/factory storage, ToF frame transport, and drawing
//! primitives against render targets. On top of that it provides the two
//! host-side building blocks a viewer needs: a polling loop that drains
//! the device's frame backlog down to the freshest frame, and a renderer
//! that maps a frame's time or amplitude channel to a BGR image.
//!
//! # Getting Started
//!
//! The vendor transport is a closed binary; [`SimBackend`] is the
//! in-memory engine used here and by the tests. Any transport implementing
//! [`EngineBackend`] plugs into the same [`Engine`] handle.
//!
//! ```no_run
//! use picop::{
//!     ChannelRenderer, ConnectionInfo, DataChannel, Engine, FramePoller, SensingState,
//!     SimBackend, UsbInfo,
//! };
//!
//! let backend = SimBackend::new();
//! let mut engine = Engine::connect(
//!     Box::new(backend),
//!     ConnectionInfo::Usb(UsbInfo { product_id: 4, serial_number: "1234".into() }),
//! )?;
//!
//! engine.set_sensing_state(SensingState::Enabled, false)?;
//!
//! let geometry = engine.frame_dimensions()?;
//! let renderer = ChannelRenderer::for_geometry(geometry)?;
//!
//! let mut poller = FramePoller::new(engine);
//! let control = poller.control();
//!
//! poller.run(
//!     |frame| {
//!         let image = renderer.render(&frame, DataChannel::Time).unwrap();
//!         println!("rendered {}x{}", image.width(), image.height());
//!         control.stop();
//!     },
//!     |err| eprintln!("poll error: {}", err),
//! )?;
//! # Ok::<(), picop::Error>(())
//! ```
//!
//! # Storage Model
//!
//! Every scalar parameter exists in three storage slots: the *current*
//! value in effect, the *startup* value applied at power-on, and the
//! immutable *factory* value. Getters select a slot; setters always write
//! the current value and additionally persist to startup when the commit
//! flag is set.

pub mod backend;
pub mod draw;
pub mod engine;
mod error;
pub mod frame;
pub mod poller;
pub mod render;
pub mod sim;
pub mod types;

// Crate-level error types
pub use error::{Error, Result, ResultCode};

// Backend trait
pub use backend::EngineBackend;

// Engine handle
pub use engine::Engine;

// Core types
pub use types::{
    BluetoothInfo,
    Color,
    ColorMode,
    ColorSelect,
    ConnectionInfo,
    DataChannel,
    FlipState,
    FrameGeometry,
    LibraryInfo,
    Param,
    ParamKind,
    ParamValue,
    Point,
    PrimaryColor,
    PulsingConfig,
    RectSize,
    RenderTarget,
    Rs232Info,
    Rs232Parity,
    SensingDataInterface,
    SensingState,
    SystemInfo,
    TestPattern,
    TofDataFormat,
    TofPulsingMode,
    UsbInfo,
    ValueStorage,
    DOUT_B_SCALE_MAX,
    TX_FALL_MAX,
    TX_RISE_MAX,
};

// Frames and rendering
pub use frame::TofFrame;
pub use render::{ChannelRenderer, DisplayConfig, ImageBuffer, BYTES_PER_PIXEL};

// Drawing
pub use draw::DrawCommand;

// Polling
pub use poller::{FramePoller, PollExit, PollerConfig, PollerControl};

// Simulated engine
pub use sim::SimBackend;
