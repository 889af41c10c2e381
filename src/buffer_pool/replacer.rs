use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;

use super::FrameId;

/// A replacement strategy picks a victim among evictable (unpinned) frames.
/// Modeled as a trait so FIFO/LRU (and, if ever needed, CLOCK/LFU) are
/// variants of one `pick_victim` operation rather than branches inside
/// `BufferPool::pin_page`.
pub(super) trait Replacer: Debug {
    /// Record that `frame_id` was touched (on both pin hits and misses).
    fn record_access(&mut self, frame_id: FrameId);
    /// Evictable frames are candidates for `evict`; non-evictable frames
    /// (pin_count > 0) are never chosen.
    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool);
    /// Drop all bookkeeping for a frame, e.g. after it's been evicted.
    fn remove(&mut self, frame_id: FrameId);
    /// Pick and remove the victim frame, or `None` if nothing is evictable.
    fn evict(&mut self) -> Option<FrameId>;
}

/// Victim = first unpinned frame from head-of-insertion.
#[derive(Debug, Default)]
pub(super) struct Fifo {
    order: VecDeque<FrameId>,
    evictable: HashMap<FrameId, bool>,
}

impl Fifo {
    pub(super) fn new() -> Self {
        Self::default()
    }
}

impl Replacer for Fifo {
    fn record_access(&mut self, frame_id: FrameId) {
        self.evictable.entry(frame_id).or_insert_with(|| {
            self.order.push_back(frame_id);
            false
        });
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        self.evictable.insert(frame_id, evictable);
    }

    fn remove(&mut self, frame_id: FrameId) {
        self.order.retain(|&f| f != frame_id);
        self.evictable.remove(&frame_id);
    }

    fn evict(&mut self) -> Option<FrameId> {
        let victim = *self
            .order
            .iter()
            .find(|f| self.evictable.get(f).copied().unwrap_or(false))?;
        self.order.retain(|&f| f != victim);
        self.evictable.remove(&victim);
        Some(victim)
    }
}

/// Victim = unpinned frame with the smallest `last_touch`. Touch is bumped
/// on every `record_access` call, i.e. on every pin, hit or miss.
#[derive(Debug, Default)]
pub(super) struct Lru {
    tick: u64,
    last_touch: HashMap<FrameId, u64>,
    evictable: HashMap<FrameId, bool>,
}

impl Lru {
    pub(super) fn new() -> Self {
        Self::default()
    }
}

impl Replacer for Lru {
    fn record_access(&mut self, frame_id: FrameId) {
        self.tick += 1;
        self.last_touch.insert(frame_id, self.tick);
        self.evictable.entry(frame_id).or_insert(false);
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        self.evictable.insert(frame_id, evictable);
    }

    fn remove(&mut self, frame_id: FrameId) {
        self.last_touch.remove(&frame_id);
        self.evictable.remove(&frame_id);
    }

    fn evict(&mut self) -> Option<FrameId> {
        let victim = *self
            .evictable
            .iter()
            .filter(|(_, &evictable)| evictable)
            .min_by_key(|(f, _)| self.last_touch.get(f).copied().unwrap_or(u64::MAX))?
            .0;
        self.last_touch.remove(&victim);
        self.evictable.remove(&victim);
        Some(victim)
    }
}
