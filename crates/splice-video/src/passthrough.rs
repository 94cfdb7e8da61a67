//! Video pass-through filter.

use parking_lot::RwLock;
use splice_core::{Result, VideoFrame, VideoSource, VideoSourceRef};

/// Forwards pulls to a replaceable inner source.
///
/// With no inner source every pull reports an empty window.
#[derive(Default)]
pub struct VideoPassThroughFilter {
    source: RwLock<Option<VideoSourceRef>>,
}

impl VideoPassThroughFilter {
    pub fn new(source: Option<VideoSourceRef>) -> Self {
        Self {
            source: RwLock::new(source),
        }
    }

    pub fn source(&self) -> Option<VideoSourceRef> {
        self.source.read().clone()
    }

    /// Replace the inner source, returning the previous one.
    pub fn set_source(&self, source: Option<VideoSourceRef>) -> Option<VideoSourceRef> {
        std::mem::replace(&mut *self.source.write(), source)
    }
}

impl VideoSource for VideoPassThroughFilter {
    fn get_frame(&self, frame_index: i64, frame: &mut VideoFrame) -> Result<()> {
        let source = self.source.read().clone();
        match source {
            Some(source) => source.get_frame(frame_index, frame),
            None => {
                frame.clear_current();
                Ok(())
            }
        }
    }
}
