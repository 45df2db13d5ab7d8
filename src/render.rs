//! Channel-to-pixel mapping for on-screen display of ToF frames.
//!
//! The renderer is a pure function of the most recent frame and the
//! selected channel: it maps every (line, pulse) sample into a BGR pixel
//! buffer at a position computed from the frame geometry and display
//! configuration. Nothing is maintained incrementally; each render
//! rebuilds the buffer from scratch.
//!
//! # Mapping
//!
//! - column: `pulse * pulses_logical / pulses_virtual + left_margin`
//! - row: `(lines_virtual - line) * mapped_height / lines_virtual`
//!   (vertically flipped, rescaled into `mapped_height`)
//! - intensity: the low 8 bits of the 32-bit sample; the high byte does
//!   not contribute to the displayed color
//! - time channel paints grayscale (B = G = R = intensity); amplitude
//!   paints yellow-tinted (B = 0, G = R = intensity)
//!
//! Samples are processed row-major (line outer, pulse inner). When the
//! virtual-to-display scale factor is below 1, multiple samples land on
//! the same pixel and the last writer wins; this is the crate's
//! downsampling policy, not blending.
//!
//! Rows follow the bottom-up DIB convention: row 0 is the bottom
//! scanline.

use crate::error::{Error, Result};
use crate::frame::TofFrame;
use crate::types::{DataChannel, FrameGeometry};

/// Bytes per pixel in an [`ImageBuffer`] (B, G, R).
pub const BYTES_PER_PIXEL: usize = 3;

// =============================================================================
// Display Configuration
// =============================================================================

/// Dimensions and placement of the rendered image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Height the frame's lines are rescaled into; must be below `height`.
    pub mapped_height: u32,
    /// Blank columns left of the mapped samples.
    pub left_margin: u32,
}

impl DisplayConfig {
    /// The viewer's native configuration: 520x200 output, samples
    /// rescaled into 180 rows, 80 columns of left margin.
    pub fn phoenix() -> Self {
        Self {
            width: 520,
            height: 200,
            mapped_height: 180,
            left_margin: 80,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self::phoenix()
    }
}

// =============================================================================
// Image Buffer
// =============================================================================

/// A 2D grid of BGR triples, rows stored bottom-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Creates a zeroed (black) buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    /// Buffer width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The (B, G, R) triple at a column and bottom-up row.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the buffer.
    pub fn bgr(&self, x: u32, row: u32) -> [u8; 3] {
        assert!(x < self.width && row < self.height, "pixel out of bounds");
        let base = (row as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        [self.data[base], self.data[base + 1], self.data[base + 2]]
    }

    /// Raw pixel bytes, `width * height * 3` long.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn clear(&mut self) {
        self.data.fill(0);
    }

    fn put_bgr(&mut self, x: u32, row: u32, b: u8, g: u8, r: u8) {
        let base = (row as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        self.data[base] = b;
        self.data[base + 1] = g;
        self.data[base + 2] = r;
    }
}

// =============================================================================
// Channel Renderer
// =============================================================================

/// Maps one channel of a [`TofFrame`] into an [`ImageBuffer`].
///
/// Construction validates the geometry against the display configuration,
/// so every mapped pixel is in bounds for the renderer's lifetime; a
/// mismatch is a configuration error, never a runtime bounds failure.
#[derive(Debug, Clone)]
pub struct ChannelRenderer {
    geometry: FrameGeometry,
    config: DisplayConfig,
}

impl ChannelRenderer {
    /// Creates a renderer for a geometry/display pairing.
    pub fn new(geometry: FrameGeometry, config: DisplayConfig) -> Result<Self> {
        if config.mapped_height >= config.height {
            return Err(Error::invalid_config(format!(
                "mapped height {} does not fit display height {}",
                config.mapped_height, config.height
            )));
        }
        // Widest column any pulse can map to.
        let pulses_virtual = geometry.pulses_virtual();
        let pulses_logical = geometry.pulses_per_line * geometry.lines_combined;
        let max_col = (pulses_virtual - 1) * pulses_logical / pulses_virtual + config.left_margin;
        if max_col >= config.width {
            return Err(Error::invalid_config(format!(
                "rightmost mapped column {} does not fit display width {}",
                max_col, config.width
            )));
        }
        Ok(Self { geometry, config })
    }

    /// Creates a renderer with the viewer's native display configuration.
    pub fn for_geometry(geometry: FrameGeometry) -> Result<Self> {
        Self::new(geometry, DisplayConfig::default())
    }

    /// The geometry this renderer accepts frames of.
    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// The display configuration.
    pub fn config(&self) -> DisplayConfig {
        self.config
    }

    /// Renders the selected channel into a fresh buffer.
    pub fn render(&self, frame: &TofFrame, channel: DataChannel) -> Result<ImageBuffer> {
        let mut out = ImageBuffer::new(self.config.width, self.config.height);
        self.render_into(frame, channel, &mut out)?;
        Ok(out)
    }

    /// Renders the selected channel into an existing buffer.
    ///
    /// The buffer is cleared first; its dimensions must match the
    /// renderer's display configuration.
    pub fn render_into(
        &self,
        frame: &TofFrame,
        channel: DataChannel,
        out: &mut ImageBuffer,
    ) -> Result<()> {
        if frame.geometry() != self.geometry {
            return Err(Error::invalid_config(
                "frame geometry does not match renderer geometry",
            ));
        }
        if out.width != self.config.width || out.height != self.config.height {
            return Err(Error::invalid_config(
                "image buffer does not match display configuration",
            ));
        }
        out.clear();

        let pulses_virtual = self.geometry.pulses_virtual();
        let lines_virtual = self.geometry.lines_virtual();
        let pulses_logical = self.geometry.pulses_per_line * self.geometry.lines_combined;
        let samples = frame.channel(channel);

        for line in 0..lines_virtual {
            let row = (lines_virtual - line) * self.config.mapped_height / lines_virtual;
            let line_base = (line * pulses_virtual) as usize;
            for pulse in 0..pulses_virtual {
                let value = samples[line_base + pulse as usize];
                let col = pulse * pulses_logical / pulses_virtual + self.config.left_margin;
                // Only the low byte contributes to the displayed intensity.
                let intensity = (value & 0xff) as u8;
                match channel {
                    DataChannel::Time => out.put_bgr(col, row, intensity, intensity, intensity),
                    DataChannel::Amplitude => out.put_bgr(col, row, 0, intensity, intensity),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::TofFrame;

    fn small_renderer() -> (FrameGeometry, ChannelRenderer) {
        let geometry = FrameGeometry::new(4, 8, 1).unwrap();
        let config = DisplayConfig {
            width: 10,
            height: 6,
            mapped_height: 4,
            left_margin: 2,
        };
        (geometry, ChannelRenderer::new(geometry, config).unwrap())
    }

    fn frame_with(geometry: FrameGeometry, fill: impl Fn(usize) -> u32) -> TofFrame {
        let samples: Vec<u32> = (0..geometry.frame_len()).map(fill).collect();
        TofFrame::from_raw(geometry, samples).unwrap()
    }

    #[test]
    fn test_rejects_mapped_height_overflow() {
        let geometry = FrameGeometry::new(4, 8, 1).unwrap();
        let config = DisplayConfig {
            width: 10,
            height: 4,
            mapped_height: 4,
            left_margin: 2,
        };
        assert!(ChannelRenderer::new(geometry, config).is_err());
    }

    #[test]
    fn test_rejects_width_overflow() {
        let geometry = FrameGeometry::new(16, 8, 1).unwrap();
        let config = DisplayConfig {
            width: 10,
            height: 6,
            mapped_height: 4,
            left_margin: 2,
        };
        assert!(ChannelRenderer::new(geometry, config).is_err());
    }

    #[test]
    fn test_all_destinations_in_bounds() {
        // render() panics on an out-of-bounds write, so a clean pass over a
        // saturated frame demonstrates every destination is in bounds.
        let (geometry, renderer) = small_renderer();
        let frame = frame_with(geometry, |_| 0xffff_ffff);
        let image = renderer.render(&frame, DataChannel::Time).unwrap();
        assert_eq!(image.width(), 10);
        assert_eq!(image.height(), 6);
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let (geometry, renderer) = small_renderer();
        let frame = frame_with(geometry, |i| (i as u32).wrapping_mul(2654435761));
        let a = renderer.render(&frame, DataChannel::Amplitude).unwrap();
        let b = renderer.render(&frame, DataChannel::Amplitude).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_time_channel_paints_grayscale() {
        let (geometry, renderer) = small_renderer();
        let frame = frame_with(geometry, |_| 0x7b);
        let image = renderer.render(&frame, DataChannel::Time).unwrap();
        // line 0, pulse 0 -> col = 0 + 2, row = 8*4/8 = 4
        assert_eq!(image.bgr(2, 4), [0x7b, 0x7b, 0x7b]);
    }

    #[test]
    fn test_amplitude_channel_zeroes_blue() {
        let (geometry, renderer) = small_renderer();
        let frame = frame_with(geometry, |_| 0x7b);
        let image = renderer.render(&frame, DataChannel::Amplitude).unwrap();
        assert_eq!(image.bgr(2, 4), [0, 0x7b, 0x7b]);
    }

    #[test]
    fn test_high_byte_never_affects_output() {
        let (geometry, renderer) = small_renderer();
        let low_only = frame_with(geometry, |_| 0xff);
        let with_high = frame_with(geometry, |_| 0x1ff);
        let a = renderer.render(&low_only, DataChannel::Time).unwrap();
        let b = renderer.render(&with_high, DataChannel::Time).unwrap();
        assert_eq!(a, b);
        assert_eq!(b.bgr(2, 4), [255, 255, 255]);
    }

    #[test]
    fn test_aliasing_is_last_writer_wins() {
        // 8 lines rescaled into 4 rows: lines alias in pairs. Lines 1 and 2
        // both map to row 3; line 2 is processed later, so its value sticks.
        let (geometry, renderer) = small_renderer();
        let pulses = geometry.pulses_virtual() as usize;
        let frame = frame_with(geometry, |i| {
            let line = i / pulses;
            match line {
                1 => 0x11,
                2 => 0x22,
                _ => 0,
            }
        });
        let lines_virtual = geometry.lines_virtual();
        let row_of = |line: u32| (lines_virtual - line) * 4 / lines_virtual;
        assert_eq!(row_of(1), row_of(2), "test premise: lines must alias");
        let image = renderer.render(&frame, DataChannel::Time).unwrap();
        assert_eq!(image.bgr(2, row_of(2)), [0x22, 0x22, 0x22]);
    }

    #[test]
    fn test_vertical_flip() {
        // Mark only line 0; with the flip it lands at the top of the
        // mapped band (row == mapped_height), not the bottom.
        let (geometry, renderer) = small_renderer();
        let pulses = geometry.pulses_virtual() as usize;
        let frame = frame_with(geometry, |i| if i / pulses == 0 { 0xff } else { 0 });
        let image = renderer.render(&frame, DataChannel::Time).unwrap();
        assert_eq!(image.bgr(2, 4), [255, 255, 255]);
        assert_eq!(image.bgr(2, 1), [0, 0, 0]);
    }

    #[test]
    fn test_render_into_clears_previous_content() {
        let (geometry, renderer) = small_renderer();
        let bright = frame_with(geometry, |_| 0xff);
        let dark = frame_with(geometry, |_| 0);
        let mut image = ImageBuffer::new(10, 6);
        renderer
            .render_into(&bright, DataChannel::Time, &mut image)
            .unwrap();
        renderer
            .render_into(&dark, DataChannel::Time, &mut image)
            .unwrap();
        assert!(image.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_render_into_rejects_mismatched_buffer() {
        let (geometry, renderer) = small_renderer();
        let frame = frame_with(geometry, |_| 0);
        let mut wrong = ImageBuffer::new(3, 3);
        assert!(renderer
            .render_into(&frame, DataChannel::Time, &mut wrong)
            .is_err());
    }

    #[test]
    fn test_phoenix_configuration_accepts_default_geometry() {
        let renderer = ChannelRenderer::for_geometry(FrameGeometry::default()).unwrap();
        assert_eq!(renderer.config().width, 520);
        let frame = frame_with(FrameGeometry::default(), |i| i as u32);
        renderer.render(&frame, DataChannel::Time).unwrap();
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_display_config_serde_roundtrip() {
        let config = DisplayConfig::phoenix();
        let json = serde_json::to_string(&config).expect("serialize");
        let restored: DisplayConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, config);
    }
}
