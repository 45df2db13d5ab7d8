//! Core types for the PicoP device surface.
//!
//! Provides the connection-parameter records, the tagged parameter value
//! used by the generic get/set channel, the device enumerations, and the
//! ToF frame geometry.

use std::fmt;

use crate::error::{Error, Result};

/// Maximum code for the IR laser fall-time slope.
pub const TX_FALL_MAX: u32 = 15;
/// Maximum code for the IR laser rise-time slope.
pub const TX_RISE_MAX: u32 = 15;
/// Maximum TDC-B depth data scale factor.
pub const DOUT_B_SCALE_MAX: u32 = 0x1000;

// =============================================================================
// Connection Parameters
// =============================================================================

/// RS232 parity selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rs232Parity {
    None,
    Even,
    Odd,
}

/// Attributes required for a USB connection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UsbInfo {
    /// Product ID.
    pub product_id: u32,
    /// Device serial number.
    pub serial_number: String,
}

/// Attributes required for an RS232 connection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rs232Info {
    /// Port name (`COM1`, `/dev/ttyS0`, ...).
    pub port: String,
    /// Baud rate; the device accepts 4800, 9600, and 115200.
    pub baud_rate: u32,
    /// Parity selection.
    pub parity: Rs232Parity,
    /// Stop bit count, 1 or 2.
    pub stop_bits: u8,
}

/// Attributes required for a Bluetooth connection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BluetoothInfo {
    /// Bluetooth MAC address.
    pub mac_addr: String,
    /// Authentication key.
    pub pass_key: String,
}

/// Physical connection parameters.
///
/// The vendor surface passes a union discriminated by a connection-type
/// enum; here the discriminant and payload are one tagged type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionInfo {
    Usb(UsbInfo),
    Rs232(Rs232Info),
    Bluetooth(BluetoothInfo),
}

impl ConnectionInfo {
    /// Short label for the transport kind.
    pub fn transport(&self) -> &'static str {
        match self {
            ConnectionInfo::Usb(_) => "usb",
            ConnectionInfo::Rs232(_) => "rs232",
            ConnectionInfo::Bluetooth(_) => "bluetooth",
        }
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionInfo::Usb(info) => {
                write!(f, "usb:{}:{}", info.product_id, info.serial_number)
            }
            ConnectionInfo::Rs232(info) => write!(f, "rs232:{}@{}", info.port, info.baud_rate),
            ConnectionInfo::Bluetooth(info) => write!(f, "bth:{}", info.mac_addr),
        }
    }
}

// =============================================================================
// Parameter Channel
// =============================================================================

/// Which stored value of a parameter a getter reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueStorage {
    /// The value currently in effect.
    Current,
    /// The value applied on system startup.
    Startup,
    /// The value set at the factory.
    Factory,
}

/// Primary color selector for per-color parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimaryColor {
    Red,
    Green,
    Blue,
}

impl PrimaryColor {
    /// All primary colors, in device order.
    pub fn all() -> [PrimaryColor; 3] {
        [PrimaryColor::Red, PrimaryColor::Green, PrimaryColor::Blue]
    }
}

/// Color selector accepted by per-color setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorSelect {
    Red,
    Green,
    Blue,
    All,
}

impl ColorSelect {
    /// The primary colors this selector addresses.
    pub fn colors(&self) -> &'static [PrimaryColor] {
        match self {
            ColorSelect::Red => &[PrimaryColor::Red],
            ColorSelect::Green => &[PrimaryColor::Green],
            ColorSelect::Blue => &[PrimaryColor::Blue],
            ColorSelect::All => &[PrimaryColor::Red, PrimaryColor::Green, PrimaryColor::Blue],
        }
    }
}

/// Scalar device parameters addressed through the generic get/set channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Param {
    /// ToF sensing on/off.
    SensingState,
    /// Interface carrying sensing data (USB, MIPI, or both).
    SensingDataInterface,
    /// Layout of acquired ToF sample data.
    TofDataFormat,
    /// Display brightness, 0.0 to 1.0.
    Brightness,
    /// Gamma value for one primary color.
    Gamma(PrimaryColor),
    /// Display color mode.
    ColorMode,
    /// Display flip state.
    FlipState,
    /// IR laser fall-time slope code, 0 to [`TX_FALL_MAX`].
    TxFall,
    /// IR laser rise-time slope code, 0 to [`TX_RISE_MAX`].
    TxRise,
    /// TDC-B depth data scale factor, 0 to [`DOUT_B_SCALE_MAX`].
    DoutBScale,
}

impl Param {
    /// Every scalar parameter the device exposes.
    pub fn all() -> &'static [Param] {
        &[
            Param::SensingState,
            Param::SensingDataInterface,
            Param::TofDataFormat,
            Param::Brightness,
            Param::Gamma(PrimaryColor::Red),
            Param::Gamma(PrimaryColor::Green),
            Param::Gamma(PrimaryColor::Blue),
            Param::ColorMode,
            Param::FlipState,
            Param::TxFall,
            Param::TxRise,
            Param::DoutBScale,
        ]
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::SensingState => write!(f, "sensing state"),
            Param::SensingDataInterface => write!(f, "sensing data interface"),
            Param::TofDataFormat => write!(f, "ToF data format"),
            Param::Brightness => write!(f, "brightness"),
            Param::Gamma(PrimaryColor::Red) => write!(f, "red gamma"),
            Param::Gamma(PrimaryColor::Green) => write!(f, "green gamma"),
            Param::Gamma(PrimaryColor::Blue) => write!(f, "blue gamma"),
            Param::ColorMode => write!(f, "color mode"),
            Param::FlipState => write!(f, "flip state"),
            Param::TxFall => write!(f, "TX fall slope"),
            Param::TxRise => write!(f, "TX rise slope"),
            Param::DoutBScale => write!(f, "TDC-B output scale"),
        }
    }
}

/// Kind discriminant of a [`ParamValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamKind {
    Bool,
    I8,
    I16,
    I32,
    U8,
    U16,
    U32,
    F32,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::Bool => "bool",
            ParamKind::I8 => "i8",
            ParamKind::I16 => "i16",
            ParamKind::I32 => "i32",
            ParamKind::U8 => "u8",
            ParamKind::U16 => "u16",
            ParamKind::U32 => "u32",
            ParamKind::F32 => "f32",
        };
        f.write_str(name)
    }
}

/// A parameter value of one of the enumerated primitive kinds.
///
/// The vendor surface passes these through a kind-tagged union; this is
/// the same data as a sum type, accessed by exhaustive match instead of
/// raw union fields.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamValue {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    U8(u8),
    U16(u16),
    U32(u32),
    F32(f32),
}

impl ParamValue {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::I8(_) => ParamKind::I8,
            ParamValue::I16(_) => ParamKind::I16,
            ParamValue::I32(_) => ParamKind::I32,
            ParamValue::U8(_) => ParamKind::U8,
            ParamValue::U16(_) => ParamKind::U16,
            ParamValue::U32(_) => ParamKind::U32,
            ParamValue::F32(_) => ParamKind::F32,
        }
    }

    /// Returns the contained bool, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the contained u32, if this is a `U32`.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            ParamValue::U32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the contained f32, if this is an `F32`.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ParamValue::F32(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::I8(v) => write!(f, "{}", v),
            ParamValue::I16(v) => write!(f, "{}", v),
            ParamValue::I32(v) => write!(f, "{}", v),
            ParamValue::U8(v) => write!(f, "{}", v),
            ParamValue::U16(v) => write!(f, "{}", v),
            ParamValue::U32(v) => write!(f, "{}", v),
            ParamValue::F32(v) => write!(f, "{}", v),
        }
    }
}

// =============================================================================
// Device Enumerations
// =============================================================================

/// ToF sensing engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensingState {
    Disabled,
    Enabled,
}

impl SensingState {
    pub(crate) fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(SensingState::Disabled),
            1 => Some(SensingState::Enabled),
            _ => None,
        }
    }

    pub(crate) fn raw(self) -> u32 {
        self as u32
    }
}

/// Interface carrying sensing data out of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensingDataInterface {
    Usb,
    Mipi,
    UsbAndMipi,
}

impl SensingDataInterface {
    pub(crate) fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(SensingDataInterface::Usb),
            1 => Some(SensingDataInterface::Mipi),
            2 => Some(SensingDataInterface::UsbAndMipi),
            _ => None,
        }
    }

    pub(crate) fn raw(self) -> u32 {
        self as u32
    }
}

/// Layout of the sample data delivered per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TofDataFormat {
    /// Fused depth and amplitude data.
    Fused,
    /// Left detector depth and amplitude only.
    LeftSensorOnly,
    /// Right detector depth and amplitude only.
    RightSensorOnly,
    /// Depth from both detectors, left then right.
    DepthOnly,
    /// Amplitude from both detectors, left then right.
    AmplitudeOnly,
    /// Depth and amplitude from both detectors (twice the bandwidth).
    All,
}

impl TofDataFormat {
    pub(crate) fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(TofDataFormat::Fused),
            1 => Some(TofDataFormat::LeftSensorOnly),
            2 => Some(TofDataFormat::RightSensorOnly),
            3 => Some(TofDataFormat::DepthOnly),
            4 => Some(TofDataFormat::AmplitudeOnly),
            5 => Some(TofDataFormat::All),
            _ => None,
        }
    }

    pub(crate) fn raw(self) -> u32 {
        self as u32
    }
}

/// ToF pulsing pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TofPulsingMode {
    EqualAngle,
    EqualTime,
    Polynomial,
}

/// Configuration of the pulsing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PulsingConfig {
    /// Pulsing mode.
    pub mode: TofPulsingMode,
    /// Number of pulses per scan line.
    pub pulses_per_line: u16,
    /// Number of phased lines: 0, 2, or 4.
    pub line_phases: u32,
    /// Number of phased frames: 0 to 4.
    pub frame_phases: u32,
}

/// Display color mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorMode {
    Brilliant,
    Standard,
    Inverted,
}

impl ColorMode {
    pub(crate) fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(ColorMode::Brilliant),
            1 => Some(ColorMode::Standard),
            2 => Some(ColorMode::Inverted),
            _ => None,
        }
    }

    pub(crate) fn raw(self) -> u32 {
        self as u32
    }
}

/// Display flip state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlipState {
    Neither,
    Horizontal,
    Vertical,
    Both,
}

impl FlipState {
    pub(crate) fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(FlipState::Neither),
            1 => Some(FlipState::Horizontal),
            2 => Some(FlipState::Vertical),
            3 => Some(FlipState::Both),
            _ => None,
        }
    }

    pub(crate) fn raw(self) -> u32 {
        self as u32
    }
}

// =============================================================================
// Drawing Vocabulary
// =============================================================================

/// An (R,G,B) color value with alpha reserved for future use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Creates an opaque color.
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// A location in (x,y) display space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

impl Point {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// Width and height of a rectangle in display space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RectSize {
    pub width: u16,
    pub height: u16,
}

impl RectSize {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Target rendering buffers addressed by draw operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RenderTarget {
    FrameBuffer0,
    FrameBuffer1,
    FrameBuffer2,
    Osd0,
    Osd1,
}

impl fmt::Display for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RenderTarget::FrameBuffer0 => "frame buffer 0",
            RenderTarget::FrameBuffer1 => "frame buffer 1",
            RenderTarget::FrameBuffer2 => "frame buffer 2",
            RenderTarget::Osd0 => "OSD 0",
            RenderTarget::Osd1 => "OSD 1",
        };
        f.write_str(name)
    }
}

/// Built-in test patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TestPattern {
    Checkerboard,
    SplashScreen,
    Grid16x12,
    CrossHair,
    AllOn,
    AllOff,
    NinePoint,
    Dots9x7,
}

// =============================================================================
// Frames
// =============================================================================

/// The two sample channels delivered in every ToF frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataChannel {
    /// Time (depth-proxy) samples.
    Time,
    /// Amplitude samples.
    Amplitude,
}

impl fmt::Display for DataChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataChannel::Time => f.write_str("time"),
            DataChannel::Amplitude => f.write_str("amplitude"),
        }
    }
}

/// Geometry of a ToF frame.
///
/// A frame carries `pulses_per_line * lines_per_frame` samples per channel.
/// Phase interleave combines `lines_combined` physical lines into one
/// logical line, widening each logical line and shortening the frame:
/// `pulses_virtual = pulses_per_line * lines_combined` and
/// `lines_virtual = lines_per_frame / lines_combined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameGeometry {
    /// Pulses per physical scan line.
    pub pulses_per_line: u32,
    /// Physical scan lines per frame.
    pub lines_per_frame: u32,
    /// Lines combined due to phase interleave: 1, 2, or 4.
    pub lines_combined: u32,
}

impl FrameGeometry {
    /// Creates a geometry, validating the interleave factor.
    pub fn new(pulses_per_line: u32, lines_per_frame: u32, lines_combined: u32) -> Result<Self> {
        if pulses_per_line == 0 || lines_per_frame == 0 {
            return Err(Error::invalid_config("frame dimensions must be non-zero"));
        }
        if !matches!(lines_combined, 1 | 2 | 4) {
            return Err(Error::invalid_config(format!(
                "lines_combined must be 1, 2, or 4, got {}",
                lines_combined
            )));
        }
        if lines_per_frame % lines_combined != 0 {
            return Err(Error::invalid_config(format!(
                "{} lines cannot be combined {} at a time",
                lines_per_frame, lines_combined
            )));
        }
        Ok(Self {
            pulses_per_line,
            lines_per_frame,
            lines_combined,
        })
    }

    /// Pulses per logical line after interleave.
    pub fn pulses_virtual(&self) -> u32 {
        self.pulses_per_line * self.lines_combined
    }

    /// Logical lines per frame after interleave.
    pub fn lines_virtual(&self) -> u32 {
        self.lines_per_frame / self.lines_combined
    }

    /// Samples in one channel.
    pub fn samples_per_channel(&self) -> usize {
        self.pulses_per_line as usize * self.lines_per_frame as usize
    }

    /// Total samples in a combined frame: time channel then amplitude.
    pub fn frame_len(&self) -> usize {
        self.samples_per_channel() * 2
    }
}

impl Default for FrameGeometry {
    /// The Phoenix engine geometry: 120 pulses, 720 lines, no interleave.
    fn default() -> Self {
        Self {
            pulses_per_line: 120,
            lines_per_frame: 720,
            lines_combined: 1,
        }
    }
}

// =============================================================================
// Device Information
// =============================================================================

/// Version information for the control library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LibraryInfo {
    pub major_version: u8,
    pub minor_version: u8,
    pub patch_version: u8,
    /// Flags describing the capability of this library version.
    pub capability_flags: u32,
}

impl fmt::Display for LibraryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.major_version, self.minor_version, self.patch_version
        )
    }
}

/// Identity of a connected engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemInfo {
    pub serial_number: String,
    pub software_version: u32,
    pub fpga_version: u32,
}
