//! Drawing primitives queued against a render target.
//!
//! Draw commands accumulate against a [`RenderTarget`](crate::types::RenderTarget)
//! (a frame buffer or an on-screen-display overlay) and take effect when
//! the target is flushed with [`Engine::render`](crate::engine::Engine::render).

use crate::types::{Color, Point, RectSize, TestPattern};

/// A drawing primitive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DrawCommand {
    /// A single pixel.
    Point { at: Point, color: Color },
    /// A line between two points.
    Line { from: Point, to: Point, color: Color },
    /// An axis-aligned rectangle.
    Rectangle {
        origin: Point,
        size: RectSize,
        color: Color,
        filled: bool,
    },
    /// A triangle between three points.
    Triangle {
        a: Point,
        b: Point,
        c: Point,
        color: Color,
        filled: bool,
    },
    /// A text string drawn with the engine's built-in font.
    Text {
        origin: Point,
        text: String,
        color: Color,
    },
    /// One of the engine's built-in test patterns.
    TestPattern {
        pattern: TestPattern,
        foreground: Color,
        background: Color,
    },
    /// A raw bitmap placed at a position, 3 bytes per pixel.
    BitmapImage {
        origin: Point,
        size: RectSize,
        data: Vec<u8>,
    },
}

impl DrawCommand {
    /// Short name of the primitive kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DrawCommand::Point { .. } => "point",
            DrawCommand::Line { .. } => "line",
            DrawCommand::Rectangle { .. } => "rectangle",
            DrawCommand::Triangle { .. } => "triangle",
            DrawCommand::Text { .. } => "text",
            DrawCommand::TestPattern { .. } => "test pattern",
            DrawCommand::BitmapImage { .. } => "bitmap",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let cmd = DrawCommand::Line {
            from: Point::new(0, 0),
            to: Point::new(10, 10),
            color: Color::new(255, 0, 0),
        };
        assert_eq!(cmd.kind(), "line");

        let cmd = DrawCommand::TestPattern {
            pattern: TestPattern::Checkerboard,
            foreground: Color::new(255, 255, 255),
            background: Color::default(),
        };
        assert_eq!(cmd.kind(), "test pattern");
    }
}
