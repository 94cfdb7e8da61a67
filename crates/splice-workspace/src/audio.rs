//! Audio frame source over a workspace.

use splice_audio::mix;
use splice_core::{AudioFrame, AudioSource, AudioSourceRef, Result};
use tracing::trace;

use crate::arena::Workspace;

/// Workspace whose items are audio sources. Overlapping items sum.
pub type AudioWorkspace = Workspace<AudioSourceRef>;

impl AudioSource for Workspace<AudioSourceRef> {
    /// Sum every item overlapping the requested range.
    ///
    /// Each item contributes only inside its own span, pulled from its source
    /// at `sample - x + offset`. The result covers the union of what the
    /// items produced; gaps between them inside that union are silent.
    fn get_frame(&self, frame: &mut AudioFrame) -> Result<()> {
        let layers = self.layers(frame.full);
        frame.clear_current();

        for item in &layers {
            let span = item.span().intersect(&frame.full);
            if span.is_empty() {
                continue;
            }

            let mut temp = AudioFrame::new(span, frame.channels());
            mix::pull_shifted(item.source.as_ref(), &mut temp, item.offset - item.x)?;
            trace!(x = item.x, z = item.z, produced = ?temp.current, "workspace audio layer");
            mix::mix_add(frame, 1.0, &temp, 1.0, 0);
        }
        Ok(())
    }
}
