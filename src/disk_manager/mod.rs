//! Block-addressable single-file storage. Every table is one page file:
//! a sequence of fixed-size pages numbered from 0. All reads and writes
//! are whole pages; every write path flushes the stream before returning.

use crate::errors::Error;
use crate::pages::{Page, PageId, PAGE_SIZE};
use crate::printdbg;
use anyhow::{bail, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

#[cfg(test)]
pub fn test_path() -> String {
    use uuid::Uuid;

    format!("data/test/test_{}.db", Uuid::new_v4())
}

/// Creates or truncates the named file and writes exactly one zeroed page.
pub fn create_page_file(name: &str) -> Result<()> {
    if let Some(parent) = Path::new(name).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(name)
        .map_err(|_| Error::FileNotFound(name.to_string()))?;

    let zeroed = [0u8; PAGE_SIZE];
    file.write_all(&zeroed)
        .map_err(|e| Error::WriteFailed(e.to_string()))?;
    file.flush()?;

    Ok(())
}

/// Removes the page file; fails FileNotFound if missing.
pub fn destroy_page_file(name: &str) -> Result<()> {
    std::fs::remove_file(name).map_err(|_| Error::FileNotFound(name.to_string()))?;
    Ok(())
}

/// An open page file: owns the file name, the stream, the total page count
/// and the current cursor.
#[derive(Debug)]
pub struct FileHandle {
    name: String,
    file: File,
    total_pages: i64,
    cursor: i64,
}

impl FileHandle {
    /// Opens the named file read/write; `totalPages = ceil(fileSize /
    /// PAGE_SIZE)` with a minimum of 1; cursor starts at 0.
    pub fn open(name: &str) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(name)
            .map_err(|_| Error::FileNotFound(name.to_string()))?;

        let len = file.metadata()?.len() as usize;
        let total_pages = (len.div_ceil(PAGE_SIZE)).max(1) as i64;

        Ok(FileHandle {
            name: name.to_string(),
            file,
            total_pages,
            cursor: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_pages(&self) -> i64 {
        self.total_pages
    }

    pub fn block_pos(&self) -> i64 {
        self.cursor
    }

    /// Flushes and closes the stream. Idempotent: repeated calls just flush
    /// an already-flushed stream.
    pub fn close(&mut self) -> Result<()> {
        self.file
            .flush()
            .map_err(|e| Error::FileCloseFailed(e.to_string()))?;
        Ok(())
    }

    fn check_bounds(&self, n: i64) -> Result<()> {
        if n < 0 || n >= self.total_pages {
            bail!(Error::ReadNonExistingPage(n));
        }
        Ok(())
    }

    /// Reads page `n` into a freshly allocated `Page`; updates the cursor.
    pub fn read_block(&mut self, n: i64) -> Result<Page> {
        self.check_bounds(n)?;

        self.file
            .seek(SeekFrom::Start(n as u64 * PAGE_SIZE as u64))
            .context("seek for read")?;

        let mut buf = [0u8; PAGE_SIZE];
        self.file
            .read_exact(&mut buf)
            .map_err(|_| Error::ReadNonExistingPage(n))?;

        self.cursor = n;
        Ok(Page::from_bytes(n, buf))
    }

    pub fn read_first_block(&mut self) -> Result<Page> {
        self.read_block(0)
    }

    pub fn read_previous_block(&mut self) -> Result<Page> {
        self.read_block(self.cursor - 1)
    }

    pub fn read_current_block(&mut self) -> Result<Page> {
        self.read_block(self.cursor)
    }

    pub fn read_next_block(&mut self) -> Result<Page> {
        self.read_block(self.cursor + 1)
    }

    pub fn read_last_block(&mut self) -> Result<Page> {
        self.read_block(self.total_pages - 1)
    }

    /// Writes page `n`; flushes; updates the cursor.
    pub fn write_block(&mut self, n: i64, page: &Page) -> Result<()> {
        self.check_bounds(n)?;

        self.file
            .seek(SeekFrom::Start(n as u64 * PAGE_SIZE as u64))
            .context("seek for write")?;

        self.file
            .write_all(page.as_slice())
            .map_err(|e| Error::WriteFailed(e.to_string()))?;
        self.file.flush()?;

        self.cursor = n;
        printdbg!("wrote page {n} to {}", self.name);
        Ok(())
    }

    pub fn write_current_block(&mut self, page: &Page) -> Result<()> {
        self.write_block(self.cursor, page)
    }

    /// Seeks to end, writes one zeroed page, grows `total_pages`, sets the
    /// cursor to the new last page. Returns the new page's id.
    pub fn append_empty_block(&mut self) -> Result<PageId> {
        let new_page_id = self.total_pages;

        self.file
            .seek(SeekFrom::Start(new_page_id as u64 * PAGE_SIZE as u64))
            .context("seek for append")?;

        let zeroed = [0u8; PAGE_SIZE];
        self.file
            .write_all(&zeroed)
            .map_err(|e| Error::WriteFailed(e.to_string()))?;
        self.file.flush()?;

        self.total_pages += 1;
        self.cursor = new_page_id;

        Ok(new_page_id)
    }

    /// Appends zeroed pages one at a time until `total_pages >= n`. No-op
    /// if already satisfied. A short write part-way through leaves the
    /// file enlarged up to the last successful append (documented, not
    /// rolled back — see SPEC_FULL.md §4).
    pub fn ensure_capacity(&mut self, n: i64) -> Result<()> {
        while self.total_pages < n {
            self.append_empty_block()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn create_then_open_has_one_page() -> Result<()> {
        let path = test_path();
        create_page_file(&path)?;

        let fh = FileHandle::open(&path)?;
        assert_eq!(fh.total_pages(), 1);

        fs::remove_file(&path)?;
        Ok(())
    }

    #[test]
    fn write_then_read_round_trips() -> Result<()> {
        let path = test_path();
        create_page_file(&path)?;
        let mut fh = FileHandle::open(&path)?;

        let mut page = Page::zeroed(0);
        page.write_bytes(0, b"hello");
        fh.write_block(0, &page)?;

        let read_back = fh.read_block(0)?;
        assert_eq!(read_back.read_bytes(0, 5), b"hello");

        fs::remove_file(&path)?;
        Ok(())
    }

    #[test]
    fn read_out_of_range_fails() -> Result<()> {
        let path = test_path();
        create_page_file(&path)?;
        let mut fh = FileHandle::open(&path)?;

        assert!(fh.read_block(5).is_err());

        fs::remove_file(&path)?;
        Ok(())
    }

    #[test]
    fn append_and_ensure_capacity_grow_file() -> Result<()> {
        let path = test_path();
        create_page_file(&path)?;
        let mut fh = FileHandle::open(&path)?;

        let id = fh.append_empty_block()?;
        assert_eq!(id, 1);
        assert_eq!(fh.total_pages(), 2);

        fh.ensure_capacity(5)?;
        assert_eq!(fh.total_pages(), 5);

        // no-op if already satisfied
        fh.ensure_capacity(3)?;
        assert_eq!(fh.total_pages(), 5);

        fs::remove_file(&path)?;
        Ok(())
    }

    #[test]
    fn destroy_removes_file() -> Result<()> {
        let path = test_path();
        create_page_file(&path)?;
        destroy_page_file(&path)?;

        assert!(FileHandle::open(&path).is_err());
        Ok(())
    }
}
