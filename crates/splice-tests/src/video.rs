//! Integration tests for the video compositing filters.

use std::sync::Arc;

use splice_core::{Box2i, KeyframeFunction, Param, Rgba, VideoFrame, VideoSource, VideoSourceRef};
use splice_video::{MixMode, SolidColorSource, VideoMixFilter, VideoPassThroughFilter};

const A: Rgba = Rgba::new(0.25, 0.5, 0.75, 1.0);
const B: Rgba = Rgba::new(1.0, 0.0, 0.5, 0.5);

fn solid(color: Rgba, window: Box2i) -> VideoSourceRef {
    Arc::new(SolidColorSource::new(Param::color(color)).with_window(Param::window(window)))
}

fn render(source: &dyn VideoSource, index: i64) -> VideoFrame {
    let mut frame = VideoFrame::new(Box2i::from_size(8, 8));
    source.get_frame(index, &mut frame).unwrap();
    frame
}

#[test]
fn keyframed_crossfade_goes_from_a_to_b() {
    let everywhere = Box2i::UNBOUNDED;
    let ramp = KeyframeFunction::ramp(0, 0.0, 10, 1.0);
    let mix = VideoMixFilter::crossfade(
        solid(A, everywhere),
        solid(B, everywhere),
        Param::function(Arc::new(ramp)),
    );

    assert_eq!(render(&mix, 0).pixel(3, 3), A);
    assert_eq!(render(&mix, 10).pixel(3, 3), B);

    let mid = render(&mix, 5).pixel(3, 3);
    assert_eq!(mid.r, (A.r + B.r) / 2.0);
    assert_eq!(mid.g, (A.g + B.g) / 2.0);
    assert_eq!(mid.b, (A.b + B.b) / 2.0);
    assert_eq!(mid.a, (A.a + B.a) / 2.0);
}

#[test]
fn crossfade_over_mismatched_windows_covers_the_union() {
    let mix = VideoMixFilter::crossfade(
        solid(A, Box2i::new(0, 0, 3, 7)),
        solid(B, Box2i::new(2, 2, 7, 5)),
        Param::constant(0.5),
    );
    let frame = render(&mix, 0);

    assert_eq!(frame.current, Box2i::new(0, 0, 7, 7));
    // A only: fades toward transparent.
    assert_eq!(frame.pixel(0, 0), A.lerp(Rgba::TRANSPARENT, 0.5));
    // B only.
    assert_eq!(frame.pixel(6, 3), Rgba::TRANSPARENT.lerp(B, 0.5));
    // Neither.
    assert_eq!(frame.pixel(6, 7), Rgba::TRANSPARENT);
}

#[test]
fn blend_modes_can_be_switched_live() {
    let mix = VideoMixFilter::new(
        Some(solid(A, Box2i::UNBOUNDED)),
        Some(solid(B, Box2i::UNBOUNDED)),
        MixMode::Add,
        Param::constant(1.0),
    );
    let added = render(&mix, 0).pixel(0, 0);
    assert_eq!(added.a, A.a);
    assert_eq!(added.r, A.r + B.r * B.a);

    mix.set_mode(MixMode::Blend);
    let blended = render(&mix, 0).pixel(0, 0);
    assert_eq!(blended.r, A.r * 0.5 + B.r * 0.5);
    assert_eq!(blended.a, 1.0);
}

#[test]
fn mixers_nest_behind_a_passthrough() {
    let inner = Arc::new(VideoMixFilter::crossfade(
        solid(A, Box2i::UNBOUNDED),
        solid(B, Box2i::UNBOUNDED),
        Param::constant(1.0),
    ));
    let outer = VideoPassThroughFilter::new(Some(inner));
    assert_eq!(render(&outer, 0).pixel(7, 7), B);
}
