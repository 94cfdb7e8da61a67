//! Splice Core - Foundation types for the compositing engine
//!
//! This crate provides the types every other Splice crate builds on:
//! - Exact rational time (`Rational`, frame/nanosecond conversion)
//! - Integer windows (`Box2i`, `SampleRange`)
//! - Audio and video frame buffers with full/current windows
//! - The pull-based source traits and time-varying parameters

pub mod color;
pub mod error;
pub mod frame;
pub mod keyframe;
pub mod source;
pub mod time;
pub mod window;

pub use color::Rgba;
pub use error::{Result, SpliceError};
pub use frame::{AudioFrame, VideoFrame};
pub use keyframe::{CubicBezier, EasingCurve, Keyframe, KeyframeFunction};
pub use source::{
    AudioSource, AudioSourceRef, FnFrameFunction, FrameFunction, Param, VideoSource,
    VideoSourceRef,
};
pub use time::{frame_to_ns, ns_to_frame, Rational, NANOS_PER_SECOND};
pub use window::{Box2i, SampleRange, V2i};
