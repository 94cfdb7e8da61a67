//! Splice Workspace - Timed, z-ordered items composed into one source
//!
//! A [`Workspace`] owns items that each place a shared source on a timeline
//! (`x`, `length`, `offset`) at a stacking depth (`z`). The audio flavour
//! sums overlapping items; the video flavour alpha-composites them by `z`.
//! Both are themselves sources, so a workspace can feed the player or
//! another workspace.
//!
//! Reads take the shared lock only long enough to snapshot the covering
//! items; structural changes take the exclusive lock and are never seen
//! half-applied.

pub mod arena;
pub mod audio;
pub mod item;
pub mod video;

pub use arena::{Layers, Workspace};
pub use audio::AudioWorkspace;
pub use item::{Item, ItemHandle, ItemUpdate, Tag};
pub use video::VideoWorkspace;
