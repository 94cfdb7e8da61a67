//! Audio pass-through filter.

use parking_lot::RwLock;
use splice_core::{AudioFrame, AudioSource, AudioSourceRef, Result};

/// Forwards pulls to a replaceable inner source.
///
/// Lets a graph keep a stable node while the source behind it changes.
/// With no inner source every pull reports an empty range.
#[derive(Default)]
pub struct AudioPassThroughFilter {
    source: RwLock<Option<AudioSourceRef>>,
}

impl AudioPassThroughFilter {
    pub fn new(source: Option<AudioSourceRef>) -> Self {
        Self {
            source: RwLock::new(source),
        }
    }

    pub fn source(&self) -> Option<AudioSourceRef> {
        self.source.read().clone()
    }

    /// Replace the inner source, returning the previous one.
    pub fn set_source(&self, source: Option<AudioSourceRef>) -> Option<AudioSourceRef> {
        std::mem::replace(&mut *self.source.write(), source)
    }
}

impl AudioSource for AudioPassThroughFilter {
    fn get_frame(&self, frame: &mut AudioFrame) -> Result<()> {
        // Pull outside the lock so a slow source doesn't stall set_source.
        let source = self.source.read().clone();
        match source {
            Some(source) => source.get_frame(frame),
            None => {
                frame.clear_current();
                Ok(())
            }
        }
    }
}
