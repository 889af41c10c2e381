use super::{BufferPool, FrameId};
use crate::pages::{Page, PageId};

/// A scoped handle to a resident, pinned page. Dropping it unpins the frame
/// automatically, the same scoped-release idiom a `MutexGuard` uses — a
/// caller can never forget to unpin, and can never keep using the page
/// after the pool recycles its frame.
///
/// Holds a raw pointer to the pool rather than a borrowed `&mut BufferPool`:
/// spec.md §5 says a pin is just a reservation count ("multiple
/// simultaneous pins on the same page are allowed and share one buffer")
/// and S6 pins the same page twice in a row, so a second `pin_page` call
/// must be possible while an earlier `PinnedPage` is still alive — an
/// exclusive borrow on the guard would make that impossible to express.
/// Safety: every `PinnedPage` is constructed from a live `&mut BufferPool`
/// and must not outlive it; callers never move or drop a `Table`'s pool
/// while a `PinnedPage` borrowed from it is still in scope, which holds
/// under the single-threaded, scoped-acquisition model spec.md §5 assumes.
pub struct PinnedPage {
    pool: *mut BufferPool,
    frame_id: FrameId,
}

impl PinnedPage {
    pub(super) fn new(pool: &mut BufferPool, frame_id: FrameId) -> Self {
        Self {
            pool: pool as *mut BufferPool,
            frame_id,
        }
    }

    pub(crate) fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    fn pool(&self) -> &BufferPool {
        // SAFETY: see struct-level comment.
        unsafe { &*self.pool }
    }

    fn pool_mut(&mut self) -> &mut BufferPool {
        // SAFETY: see struct-level comment.
        unsafe { &mut *self.pool }
    }

    pub fn page_id(&self) -> PageId {
        self.pool().page_data(self.frame_id).page_id()
    }

    pub fn data(&self) -> &Page {
        self.pool().page_data(self.frame_id)
    }

    pub fn data_mut(&mut self) -> &mut Page {
        let frame_id = self.frame_id;
        self.pool_mut().mark_dirty(frame_id);
        self.pool_mut().page_data_mut(frame_id)
    }
}

impl Drop for PinnedPage {
    fn drop(&mut self) {
        let frame_id = self.frame_id;
        let _ = self.pool_mut().unpin_page(frame_id);
    }
}
