//! Splice Video - Compositing filters and generators
//!
//! Every type here is a [`VideoSource`](splice_core::VideoSource):
//! - `VideoMixFilter`: blend, add or crossfade two sources by a per-frame factor
//! - `SolidColorSource`: a flat color, optionally limited to a window
//! - `VideoPassThroughFilter`: a stable node in front of a replaceable source
//!
//! The pixel kernel behind the mixer is exposed as [`composite()`] so other
//! composers (the video workspace) share the same window semantics.

pub mod composite;
pub mod mix_filter;
pub mod passthrough;
pub mod solid_color;

pub use composite::{clamp_factor, composite, MixMode};
pub use mix_filter::VideoMixFilter;
pub use passthrough::VideoPassThroughFilter;
pub use solid_color::SolidColorSource;
