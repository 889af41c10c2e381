use crate::pages::Page;
use anyhow::{bail, Result};

use crate::errors::Error;

/// One cached page: the owned buffer plus its pin count. Replacement
/// metadata (last-touch tick, access history) lives in the replacer, not
/// here, so a frame can be reused in place without resetting bookkeeping
/// the replacer is tracking separately.
#[derive(Debug)]
pub(super) struct Frame {
    page: Page,
    pin_count: usize,
}

impl Frame {
    pub(super) fn empty() -> Self {
        Self {
            page: Page::new(),
            pin_count: 0,
        }
    }

    pub(super) fn pin(&mut self) {
        self.pin_count += 1;
    }

    pub(super) fn unpin(&mut self) -> Result<()> {
        if self.pin_count == 0 {
            bail!(Error::Generic(
                "unpin called on a frame with pin count 0".into()
            ));
        }
        self.pin_count -= 1;
        Ok(())
    }

    pub(super) fn pin_count(&self) -> usize {
        self.pin_count
    }

    pub(super) fn page(&self) -> &Page {
        &self.page
    }

    pub(super) fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub(super) fn set_page(&mut self, page: Page) {
        self.page = page;
    }
}
