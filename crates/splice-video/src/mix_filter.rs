//! Two-input video mixer with a time-varying blend factor.

use parking_lot::RwLock;
use splice_core::{Box2i, Param, Result, VideoFrame, VideoSource, VideoSourceRef};
use tracing::trace;

use crate::composite::{clamp_factor, composite, MixMode};

#[derive(Clone)]
struct MixInputs {
    src_a: Option<VideoSourceRef>,
    src_b: Option<VideoSourceRef>,
    mode: MixMode,
    factor: Param,
}

/// Composites source B over source A.
///
/// The factor is sampled per frame and clamped to `[0, 1]`. At 0 only A is
/// pulled; in crossfade mode at 1 only B is pulled. A missing input behaves
/// like a source with an empty current window.
pub struct VideoMixFilter {
    inputs: RwLock<MixInputs>,
}

impl VideoMixFilter {
    pub fn new(
        src_a: Option<VideoSourceRef>,
        src_b: Option<VideoSourceRef>,
        mode: MixMode,
        factor: Param,
    ) -> Self {
        Self {
            inputs: RwLock::new(MixInputs {
                src_a,
                src_b,
                mode,
                factor,
            }),
        }
    }

    /// Crossfade from `src_a` to `src_b` as `factor` goes from 0 to 1.
    pub fn crossfade(src_a: VideoSourceRef, src_b: VideoSourceRef, factor: Param) -> Self {
        Self::new(Some(src_a), Some(src_b), MixMode::Crossfade, factor)
    }

    pub fn mode(&self) -> MixMode {
        self.inputs.read().mode
    }

    pub fn set_mode(&self, mode: MixMode) {
        self.inputs.write().mode = mode;
    }

    pub fn set_factor(&self, factor: Param) {
        self.inputs.write().factor = factor;
    }

    pub fn set_source_a(&self, source: Option<VideoSourceRef>) {
        self.inputs.write().src_a = source;
    }

    pub fn set_source_b(&self, source: Option<VideoSourceRef>) {
        self.inputs.write().src_b = source;
    }
}

fn pull(source: Option<&VideoSourceRef>, frame_index: i64, frame: &mut VideoFrame) -> Result<()> {
    match source {
        Some(source) => {
            source.get_frame(frame_index, frame)?;
            frame.validate()
        }
        None => {
            frame.clear_current();
            Ok(())
        }
    }
}

impl VideoSource for VideoMixFilter {
    fn get_frame(&self, frame_index: i64, frame: &mut VideoFrame) -> Result<()> {
        // Sources are pulled outside the lock.
        let inputs = self.inputs.read().clone();
        let factor = clamp_factor(inputs.factor.scalar(frame_index));

        if inputs.mode == MixMode::Crossfade && factor >= 1.0 {
            return pull(inputs.src_b.as_ref(), frame_index, frame);
        }
        pull(inputs.src_a.as_ref(), frame_index, frame)?;
        if factor <= 0.0 {
            return Ok(());
        }

        let Some(src_b) = inputs.src_b.as_ref() else {
            if inputs.mode == MixMode::Crossfade {
                composite(frame, &VideoFrame::new(Box2i::EMPTY), inputs.mode, factor);
            }
            return Ok(());
        };

        // Add only ever touches A's pixels; the other modes may reveal B
        // anywhere in the full window.
        let window = match inputs.mode {
            MixMode::Add => frame.current,
            MixMode::Blend | MixMode::Crossfade => frame.full,
        };
        if window.is_empty() {
            return Ok(());
        }

        let mut temp = VideoFrame::new(window);
        temp.current = window;
        src_b.get_frame(frame_index, &mut temp)?;
        temp.validate()?;

        trace!(
            frame_index,
            factor,
            mode = ?inputs.mode,
            a = ?frame.current,
            b = ?temp.current,
            "compositing mix inputs"
        );
        composite(frame, &temp, inputs.mode, factor);
        Ok(())
    }
}
