//! Solid color generator.

use splice_core::{Box2i, Param, Result, VideoFrame, VideoSource};

/// Fills the requested frame with one color, optionally limited to a window.
///
/// Both the color and the window may vary per frame. The window defaults to
/// the unbounded box, so the whole full window is painted.
#[derive(Debug, Clone)]
pub struct SolidColorSource {
    color: Param,
    window: Param,
}

impl SolidColorSource {
    pub fn new(color: Param) -> Self {
        Self {
            color,
            window: Param::window(Box2i::UNBOUNDED),
        }
    }

    /// Limit painting to `window`.
    pub fn with_window(mut self, window: Param) -> Self {
        self.window = window;
        self
    }

    pub fn color(&self) -> &Param {
        &self.color
    }

    pub fn window(&self) -> &Param {
        &self.window
    }
}

impl VideoSource for SolidColorSource {
    fn get_frame(&self, frame_index: i64, frame: &mut VideoFrame) -> Result<()> {
        let window = frame.full.intersect(&self.window.box2i(frame_index));
        if window.is_empty() {
            frame.clear_current();
            return Ok(());
        }
        frame.fill(window, self.color.rgba(frame_index));
        frame.current = window;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splice_core::{EasingCurve, KeyframeFunction, Rgba};
    use std::sync::Arc;

    #[test]
    fn test_fills_full_window_by_default() {
        let source = SolidColorSource::new(Param::color(Rgba::WHITE));
        let mut frame = VideoFrame::new(Box2i::new(-2, -2, 5, 5));
        source.get_frame(0, &mut frame).unwrap();
        assert_eq!(frame.current, frame.full);
        assert_eq!(frame.pixel(-2, 5), Rgba::WHITE);
    }

    #[test]
    fn test_window_clips_and_can_be_empty() {
        let source = SolidColorSource::new(Param::color(Rgba::WHITE))
            .with_window(Param::window(Box2i::new(2, 2, 100, 3)));
        let mut frame = VideoFrame::new(Box2i::from_size(4, 4));
        source.get_frame(0, &mut frame).unwrap();
        assert_eq!(frame.current, Box2i::new(2, 2, 3, 3));
        assert_eq!(frame.pixel(0, 0), Rgba::TRANSPARENT);

        let outside = SolidColorSource::new(Param::color(Rgba::WHITE))
            .with_window(Param::window(Box2i::new(10, 10, 12, 12)));
        outside.get_frame(0, &mut frame).unwrap();
        assert!(frame.current.is_empty());
    }

    #[test]
    fn test_color_follows_keyframes() {
        let mut fade = KeyframeFunction::new();
        fade.set(0, [0.0, 0.0, 0.0, 1.0], EasingCurve::Linear);
        fade.set(10, [1.0, 1.0, 1.0, 1.0], EasingCurve::Linear);
        let source = SolidColorSource::new(Param::function(Arc::new(fade)));
        let mut frame = VideoFrame::new(Box2i::from_size(1, 1));

        source.get_frame(5, &mut frame).unwrap();
        let px = frame.pixel(0, 0);
        assert!((px.r - 0.5).abs() < 1e-6);
        assert_eq!(px.a, 1.0);
    }
}
