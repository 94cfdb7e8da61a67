//! Arena-backed item store shared by the audio and video workspaces.
//!
//! Items live in generational slots behind one reader/writer lock. Queries
//! snapshot what they need (cheap `Arc` clones of the sources) under the
//! read lock and do their pulling after releasing it, so a slow source never
//! holds back an `add` or `remove`.

use parking_lot::RwLock;
use smallvec::SmallVec;
use splice_core::{Result, SampleRange, SpliceError};
use tracing::debug;

use crate::item::{Item, ItemHandle, ItemUpdate, Tag};

/// Items covering a query, bottom layer first.
pub type Layers<S> = SmallVec<[Item<S>; 8]>;

struct Entry<S> {
    item: Item<S>,
    /// Insertion sequence, the tie-break for equal `z`.
    seq: u64,
}

struct Slot<S> {
    generation: u32,
    entry: Option<Entry<S>>,
}

struct Arena<S> {
    slots: Vec<Slot<S>>,
    free: Vec<u32>,
    /// Live slots in insertion order.
    order: Vec<u32>,
    next_seq: u64,
}

impl<S> Arena<S> {
    fn entry(&self, handle: ItemHandle) -> Result<&Entry<S>> {
        self.slots
            .get(handle.slot as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(SpliceError::StaleHandle)
    }

    fn entry_mut(&mut self, handle: ItemHandle) -> Result<&mut Entry<S>> {
        self.slots
            .get_mut(handle.slot as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_mut())
            .ok_or(SpliceError::StaleHandle)
    }

    fn handle_of(&self, slot: u32) -> ItemHandle {
        ItemHandle {
            slot,
            generation: self.slots[slot as usize].generation,
        }
    }
}

fn check_length(length: i64) -> Result<()> {
    if length < 0 {
        return Err(SpliceError::InvalidParameter(format!(
            "item length {length} is negative"
        )));
    }
    Ok(())
}

/// Ordered collection of timed, z-ordered items wrapping sources of type `S`.
pub struct Workspace<S> {
    arena: RwLock<Arena<S>>,
}

impl<S> Default for Workspace<S> {
    fn default() -> Self {
        Self {
            arena: RwLock::new(Arena {
                slots: Vec::new(),
                free: Vec::new(),
                order: Vec::new(),
                next_seq: 0,
            }),
        }
    }
}

impl<S: Clone> Workspace<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item and return its handle.
    pub fn add(&self, item: Item<S>) -> Result<ItemHandle> {
        check_length(item.length)?;

        let mut arena = self.arena.write();
        let seq = arena.next_seq;
        arena.next_seq += 1;

        let slot = match arena.free.pop() {
            Some(slot) => slot,
            None => {
                let slot = u32::try_from(arena.slots.len()).map_err(|_| {
                    SpliceError::Internal("workspace slot space exhausted".into())
                })?;
                arena.slots.push(Slot {
                    generation: 0,
                    entry: None,
                });
                slot
            }
        };
        debug!(slot, x = item.x, length = item.length, z = item.z, "workspace item added");
        arena.slots[slot as usize].entry = Some(Entry { item, seq });
        arena.order.push(slot);
        Ok(arena.handle_of(slot))
    }

    /// Remove an item, returning it. The handle is dead afterwards.
    pub fn remove(&self, handle: ItemHandle) -> Result<Item<S>> {
        let mut guard = self.arena.write();
        let arena = &mut *guard;
        arena.entry(handle)?;

        let slot = &mut arena.slots[handle.slot as usize];
        let entry = slot.entry.take().ok_or(SpliceError::StaleHandle)?;
        // Retire the slot when its generation space runs out.
        match slot.generation.checked_add(1) {
            Some(next) => {
                slot.generation = next;
                arena.free.push(handle.slot);
            }
            None => slot.generation = u32::MAX,
        }
        arena.order.retain(|&s| s != handle.slot);

        debug!(%handle, "workspace item removed");
        Ok(entry.item)
    }

    /// Change any subset of an item's fields in one step.
    pub fn update(&self, handle: ItemHandle, update: ItemUpdate<S>) -> Result<()> {
        if let Some(length) = update.length {
            check_length(length)?;
        }
        let mut arena = self.arena.write();
        update.apply(&mut arena.entry_mut(handle)?.item);
        Ok(())
    }

    /// Snapshot of one item.
    pub fn get(&self, handle: ItemHandle) -> Result<Item<S>> {
        Ok(self.arena.read().entry(handle)?.item.clone())
    }

    pub fn contains(&self, handle: ItemHandle) -> bool {
        self.arena.read().entry(handle).is_ok()
    }

    pub fn len(&self) -> usize {
        self.arena.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handle of the `index`-th live item in insertion order.
    pub fn handle_at(&self, index: usize) -> Result<ItemHandle> {
        let arena = self.arena.read();
        let slot = arena
            .order
            .get(index)
            .copied()
            .ok_or(SpliceError::IndexOutOfRange {
                index,
                len: arena.order.len(),
            })?;
        Ok(arena.handle_of(slot))
    }

    /// Snapshot of the `index`-th live item in insertion order.
    pub fn item_at(&self, index: usize) -> Result<Item<S>> {
        let arena = self.arena.read();
        let slot = *arena.order.get(index).ok_or(SpliceError::IndexOutOfRange {
            index,
            len: arena.order.len(),
        })?;
        let entry = arena.slots[slot as usize]
            .entry
            .as_ref()
            .ok_or_else(|| SpliceError::Internal(format!("ordered slot {slot} is vacant")))?;
        Ok(entry.item.clone())
    }

    /// Handles of every live item in insertion order.
    pub fn handles(&self) -> Vec<ItemHandle> {
        let arena = self.arena.read();
        arena.order.iter().map(|&slot| arena.handle_of(slot)).collect()
    }

    // ── Field accessors ─────────────────────────────────────────────

    pub fn source(&self, handle: ItemHandle) -> Result<S> {
        Ok(self.arena.read().entry(handle)?.item.source.clone())
    }

    pub fn x(&self, handle: ItemHandle) -> Result<i64> {
        Ok(self.arena.read().entry(handle)?.item.x)
    }

    pub fn length(&self, handle: ItemHandle) -> Result<i64> {
        Ok(self.arena.read().entry(handle)?.item.length)
    }

    pub fn z(&self, handle: ItemHandle) -> Result<i32> {
        Ok(self.arena.read().entry(handle)?.item.z)
    }

    pub fn offset(&self, handle: ItemHandle) -> Result<i64> {
        Ok(self.arena.read().entry(handle)?.item.offset)
    }

    pub fn tag(&self, handle: ItemHandle) -> Result<Option<Tag>> {
        Ok(self.arena.read().entry(handle)?.item.tag.clone())
    }

    pub fn set_source(&self, handle: ItemHandle, source: S) -> Result<()> {
        self.update(handle, ItemUpdate::new().source(source))
    }

    /// Move the item to `[x, x + length)`.
    pub fn set_position(&self, handle: ItemHandle, x: i64, length: i64) -> Result<()> {
        self.update(handle, ItemUpdate::new().x(x).length(length))
    }

    pub fn set_z(&self, handle: ItemHandle, z: i32) -> Result<()> {
        self.update(handle, ItemUpdate::new().z(z))
    }

    pub fn set_offset(&self, handle: ItemHandle, offset: i64) -> Result<()> {
        self.update(handle, ItemUpdate::new().offset(offset))
    }

    pub fn set_tag(&self, handle: ItemHandle, tag: Option<Tag>) -> Result<()> {
        self.update(handle, ItemUpdate::new().tag(tag))
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Items overlapping `range`, ordered by `z` then insertion.
    pub fn layers(&self, range: SampleRange) -> Layers<S> {
        if range.is_empty() {
            return Layers::new();
        }
        let arena = self.arena.read();
        let mut hits: SmallVec<[(i32, u64, u32); 8]> = arena
            .order
            .iter()
            .filter_map(|&slot| {
                let entry = arena.slots[slot as usize].entry.as_ref()?;
                let overlaps = !entry.item.span().intersect(&range).is_empty();
                overlaps.then_some((entry.item.z, entry.seq, slot))
            })
            .collect();
        hits.sort_unstable();

        hits.iter()
            .filter_map(|&(_, _, slot)| {
                arena.slots[slot as usize]
                    .entry
                    .as_ref()
                    .map(|entry| entry.item.clone())
            })
            .collect()
    }

    /// Items covering `position`, ordered by `z` then insertion.
    pub fn layers_at(&self, position: i64) -> Layers<S> {
        self.layers(SampleRange::new(position, position))
    }
}
