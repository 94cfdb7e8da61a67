//! Video frame source over a workspace.

use splice_core::{Result, VideoFrame, VideoSource, VideoSourceRef};
use splice_video::{composite, MixMode};
use tracing::trace;

use crate::arena::Workspace;

/// Workspace whose items are video sources. Higher `z` is composited on top.
pub type VideoWorkspace = Workspace<VideoSourceRef>;

impl VideoSource for Workspace<VideoSourceRef> {
    /// Alpha-over every item covering `frame_index`, lowest `z` first.
    ///
    /// The bottom item is pulled straight into `frame`; each item above it
    /// is pulled into a frame-sized scratch buffer and blended on.
    fn get_frame(&self, frame_index: i64, frame: &mut VideoFrame) -> Result<()> {
        let layers = self.layers_at(frame_index);
        frame.clear_current();

        let mut layers = layers.iter();
        let Some(bottom) = layers.next() else {
            return Ok(());
        };
        bottom
            .source
            .get_frame(bottom.source_position(frame_index), frame)?;
        frame.validate()?;

        for item in layers {
            let mut temp = VideoFrame::new(frame.full);
            temp.current = frame.full;
            item.source
                .get_frame(item.source_position(frame_index), &mut temp)?;
            temp.validate()?;
            trace!(frame_index, z = item.z, window = ?temp.current, "workspace video layer");
            composite(frame, &temp, MixMode::Blend, 1.0);
        }
        Ok(())
    }
}
