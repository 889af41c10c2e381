//! The cache sitting between the record manager and the storage manager.
//! Owned directly by the table that uses it (no global singleton): every
//! `Table` opens its own `disk_manager::FileHandle` and wraps it in a
//! `BufferPool` sized to whatever capacity the caller asks for.

mod frame;
mod pinned_page;
mod replacer;

use crate::disk_manager::FileHandle;
use crate::errors::Error;
use crate::pages::{Page, PageId};
use crate::printdbg;
use anyhow::{bail, Result};
use frame::Frame;
use replacer::{Fifo, Lru, Replacer};
use std::collections::{HashMap, VecDeque};

pub use pinned_page::PinnedPage;

pub(crate) type FrameId = usize;

/// Which victim-selection strategy a pool uses. Chosen once at construction;
/// see SPEC_FULL.md for why both are kept as first-class options instead of
/// hardcoding one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementPolicy {
    Fifo,
    Lru,
}

pub struct BufferPool {
    disk: FileHandle,
    frames: Vec<Frame>,
    page_table: HashMap<PageId, FrameId>,
    free_list: VecDeque<FrameId>,
    replacer: Box<dyn Replacer>,
    num_read_io: u64,
    num_write_io: u64,
}

impl BufferPool {
    pub fn new(disk: FileHandle, capacity: usize, policy: ReplacementPolicy) -> Self {
        let frames = (0..capacity).map(|_| Frame::empty()).collect();
        let replacer: Box<dyn Replacer> = match policy {
            ReplacementPolicy::Fifo => Box::new(Fifo::new()),
            ReplacementPolicy::Lru => Box::new(Lru::new()),
        };

        Self {
            disk,
            frames,
            page_table: HashMap::new(),
            free_list: VecDeque::from_iter(0..capacity),
            replacer,
            num_read_io: 0,
            num_write_io: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.frames.len()
    }

    pub fn total_pages(&self) -> PageId {
        self.disk.total_pages()
    }

    pub fn ensure_capacity(&mut self, n: PageId) -> Result<()> {
        self.disk.ensure_capacity(n)
    }

    pub fn num_read_io(&self) -> u64 {
        self.num_read_io
    }

    pub fn num_write_io(&self) -> u64 {
        self.num_write_io
    }

    /// The page resident in each frame, in frame (insertion) order; `None`
    /// for a frame that has never been filled. Capacity-sized and
    /// caller-owned like the stats accessors spec.md §4.2 describes.
    pub fn frame_contents(&self) -> Vec<Option<PageId>> {
        let mut by_frame: HashMap<FrameId, PageId> = HashMap::new();
        for (&page_id, &frame_id) in &self.page_table {
            by_frame.insert(frame_id, page_id);
        }
        (0..self.frames.len()).map(|f| by_frame.get(&f).copied()).collect()
    }

    /// Pin count of each frame, in frame order.
    pub fn pin_counts(&self) -> Vec<usize> {
        self.frames.iter().map(Frame::pin_count).collect()
    }

    /// Dirty flag of each frame, in frame order.
    pub fn dirty_flags(&self) -> Vec<bool> {
        self.frames.iter().map(|f| f.page().is_dirty()).collect()
    }

    /// Finds a frame to hold a page not currently resident: a free frame if
    /// one exists, otherwise the replacer's victim. The victim's page, if
    /// dirty, is flushed before its frame is reused.
    fn find_or_evict_frame(&mut self) -> Result<FrameId> {
        if let Some(frame_id) = self.free_list.pop_front() {
            return Ok(frame_id);
        }

        let victim = self
            .replacer
            .evict()
            .ok_or_else(|| Error::Generic("buffer pool is full and has no evictable frame".into()))?;

        let evicted_page_id = self.frames[victim].page().page_id();
        if self.frames[victim].page().is_dirty() {
            self.disk.write_block(evicted_page_id, self.frames[victim].page())?;
            self.num_write_io += 1;
        }
        self.page_table.remove(&evicted_page_id);
        self.replacer.remove(victim);

        Ok(victim)
    }

    /// Pins page `page_id`, loading it from disk on a miss. Growing the
    /// underlying file to fit `page_id` is the caller's responsibility (the
    /// record manager calls `ensure_capacity` on the disk manager before
    /// asking for a page that doesn't exist yet).
    pub fn pin_page(&mut self, page_id: PageId) -> Result<PinnedPage> {
        if let Some(&frame_id) = self.page_table.get(&page_id) {
            self.frames[frame_id].pin();
            self.replacer.record_access(frame_id);
            self.replacer.set_evictable(frame_id, false);
            printdbg!("pin hit for page {page_id} in frame {frame_id}");
            return Ok(PinnedPage::new(self, frame_id));
        }

        let frame_id = self.find_or_evict_frame()?;
        let page = self.disk.read_block(page_id)?;
        self.num_read_io += 1;

        self.frames[frame_id].set_page(page);
        self.frames[frame_id].pin();
        self.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);

        printdbg!("pin miss for page {page_id}, loaded into frame {frame_id}");
        Ok(PinnedPage::new(self, frame_id))
    }

    pub(crate) fn unpin_page(&mut self, frame_id: FrameId) -> Result<()> {
        self.frames[frame_id].unpin()?;
        if self.frames[frame_id].pin_count() == 0 {
            self.replacer.set_evictable(frame_id, true);
        }
        Ok(())
    }

    pub(crate) fn mark_dirty(&mut self, frame_id: FrameId) {
        self.frames[frame_id].page_mut().mark_dirty();
    }

    pub(crate) fn page_data(&self, frame_id: FrameId) -> &Page {
        self.frames[frame_id].page()
    }

    pub(crate) fn page_data_mut(&mut self, frame_id: FrameId) -> &mut Page {
        self.frames[frame_id].page_mut()
    }

    /// Flushes a single resident page regardless of pin state.
    pub fn force_page(&mut self, page_id: PageId) -> Result<()> {
        let Some(&frame_id) = self.page_table.get(&page_id) else {
            return Ok(());
        };
        if self.frames[frame_id].page().is_dirty() {
            self.disk.write_block(page_id, self.frames[frame_id].page())?;
            self.num_write_io += 1;
            self.frames[frame_id].page_mut().mark_clean();
        }
        Ok(())
    }

    /// Flushes every dirty resident page.
    pub fn flush_all(&mut self) -> Result<()> {
        let dirty_pages: Vec<PageId> = self
            .page_table
            .iter()
            .filter(|(_, &frame_id)| self.frames[frame_id].page().is_dirty())
            .map(|(&page_id, _)| page_id)
            .collect();
        for page_id in dirty_pages {
            self.force_page(page_id)?;
        }
        Ok(())
    }

    /// Flushes every dirty page and closes the underlying file. Fails if
    /// any frame is still pinned, since shutting down would silently drop
    /// a borrowed view a caller still holds. The flush always runs first —
    /// even on a failing shutdown, every other frame's dirty data must
    /// reach disk rather than being silently lost (SPEC_FULL.md §7).
    pub fn shutdown(&mut self) -> Result<()> {
        self.flush_all()?;
        if self.frames.iter().any(|f| f.pin_count() > 0) {
            bail!(Error::PinnedPagesInBuffer);
        }
        self.disk.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk_manager::{create_page_file, test_path, FileHandle};

    fn pool_with_capacity(capacity: usize, pages: i64, policy: ReplacementPolicy) -> (BufferPool, String) {
        let path = test_path();
        create_page_file(&path).unwrap();
        let mut disk = FileHandle::open(&path).unwrap();
        disk.ensure_capacity(pages).unwrap();
        (BufferPool::new(disk, capacity, policy), path)
    }

    #[test]
    fn pin_then_unpin_allows_eviction() {
        let (mut pool, path) = pool_with_capacity(1, 2, ReplacementPolicy::Lru);

        {
            let p0 = pool.pin_page(0).unwrap();
            assert_eq!(p0.page_id(), 0);
        }
        // frame freed by Drop, so pinning page 1 should succeed in a pool of size 1
        let p1 = pool.pin_page(1).unwrap();
        assert_eq!(p1.page_id(), 1);
        drop(p1);

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn pool_full_with_all_pinned_fails() {
        let (mut pool, path) = pool_with_capacity(1, 2, ReplacementPolicy::Fifo);

        let _p0 = pool.pin_page(0).unwrap();
        assert!(pool.pin_page(1).is_err());

        drop(_p0);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn fifo_evicts_in_insertion_order() {
        let (mut pool, path) = pool_with_capacity(2, 3, ReplacementPolicy::Fifo);

        // pin then immediately drop, so each page is resident but unpinned
        // (and hence evictable) by the time the next one is pinned
        drop(pool.pin_page(0).unwrap());
        drop(pool.pin_page(1).unwrap());

        // pool full (0 and 1 resident, both unpinned); page 2 should evict 0 (FIFO)
        drop(pool.pin_page(2).unwrap());
        // page 0's frame is reused in place, so getFrameContents reports {2, 1} (spec.md S4)
        assert_eq!(pool.frame_contents(), vec![Some(2), Some(1)]);

        // three pins, three misses (0, 1, then 2 after evicting 0): getNumReadIO
        // increments by 1 per miss (spec.md S4)
        assert_eq!(pool.num_read_io(), 3);

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn shutdown_fails_with_pinned_pages() {
        let (mut pool, path) = pool_with_capacity(1, 1, ReplacementPolicy::Lru);
        let _p0 = pool.pin_page(0).unwrap();
        assert!(pool.shutdown().is_err());
        drop(_p0);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn dirty_pages_flush_on_shutdown() {
        let (mut pool, path) = pool_with_capacity(1, 1, ReplacementPolicy::Lru);
        {
            let mut p0 = pool.pin_page(0).unwrap();
            p0.data_mut().write_bytes(0, b"hi");
        }
        pool.shutdown().unwrap();
        // reopen via a fresh pool and the pattern is present; getNumWriteIO
        // reports >= 1 (spec.md S5)
        assert!(pool.num_write_io() >= 1);

        let mut disk = FileHandle::open(&path).unwrap();
        let page = disk.read_block(0).unwrap();
        assert_eq!(page.read_bytes(0, 2), b"hi");

        std::fs::remove_file(path).unwrap();
    }
}
