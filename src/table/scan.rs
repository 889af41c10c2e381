//! Full-table scan cursor. A scan walks every data page up to the table's
//! `first_free_page + 1` in slot order, skips tombstoned slots, and
//! evaluates the caller's predicate against each live record, returning
//! the first match. See SPEC_FULL.md §4.3.4.

use super::FIRST_DATA_PAGE;
use crate::errors::Error;
use crate::expr::Predicate;
use crate::pages::table_page::{slot_offset, slots_per_page, TOMBSTONE_OCCUPIED};
use crate::record::{Record, Rid};
use anyhow::{bail, Result};

use super::Table;

pub struct ScanContext {
    page_id: i64,
    slot: i64,
    slot_width: usize,
    /// `first_free_page` snapshotted when the scan started; a scan never
    /// reads past `bound_page + 1` even if the table grows mid-scan.
    bound_page: i64,
    predicate: Box<dyn Predicate>,
    /// Backstop against an inconsistent `first_free_page`/`slots_per_page`
    /// pair looping forever; see SPEC_FULL.md §4.3.4.
    remaining_probes: u64,
}

impl ScanContext {
    pub(crate) fn new(first_free_page: i32, slot_width: usize, predicate: Box<dyn Predicate>) -> Self {
        let slots_per_page = slots_per_page(slot_width).max(1) as u64;
        Self {
            page_id: FIRST_DATA_PAGE,
            slot: -1,
            slot_width,
            bound_page: first_free_page as i64,
            predicate,
            remaining_probes: (first_free_page as u64 + 2) * slots_per_page + 2,
        }
    }

    /// Advances to the next record matching the predicate, or `None` once
    /// the scan is exhausted. Non-matching and tombstoned slots are
    /// skipped transparently.
    pub fn next(&mut self, table: &mut Table) -> Result<Option<(Rid, Record)>> {
        if self.slot_width == 0 {
            bail!(Error::InvalidParameter("zero-width slot in scan".into()));
        }
        let slots_per_page = slots_per_page(self.slot_width);

        loop {
            if self.remaining_probes == 0 {
                return Ok(None);
            }
            self.remaining_probes -= 1;

            self.slot += 1;
            if self.slot as usize >= slots_per_page {
                self.slot = 0;
                self.page_id += 1;
            }
            if self.page_id > self.bound_page + 1 {
                return Ok(None);
            }
            if self.page_id >= table.pool_mut().total_pages() {
                return Ok(None);
            }

            let offset = slot_offset(self.slot_width, self.slot as usize);
            let page = table.pool_mut().pin_page(self.page_id)?;
            let tombstone = page.data().read_bytes(offset, 1)[0];

            if tombstone != TOMBSTONE_OCCUPIED {
                continue;
            }

            let record = Record::from_bytes(page.data().read_bytes(offset + 1, self.slot_width - 1));
            drop(page);

            if self.predicate.matches(&record, table.schema())? {
                let rid = Rid::new(self.page_id, self.slot);
                return Ok(Some((rid, record)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer_pool::ReplacementPolicy;
    use crate::disk_manager::test_path;
    use crate::expr::{AllRows, CompareOp, Expr};
    use crate::schema::{Attribute, DataType, Schema};
    use crate::value::Value;

    fn schema() -> Schema {
        Schema::new(vec![Attribute::new("id", DataType::Int).unwrap()], vec![0]).unwrap()
    }

    #[test]
    fn scan_skips_deleted_rows() {
        let path = test_path();
        let mut table = Table::create(&path, schema(), 8, ReplacementPolicy::Lru).unwrap();

        let rid0 = table.insert_record(&[Value::Int(1)]).unwrap();
        table.insert_record(&[Value::Int(2)]).unwrap();
        table.insert_record(&[Value::Int(3)]).unwrap();
        table.delete_record(rid0).unwrap();

        let mut ctx = table.start_scan(Box::new(AllRows)).unwrap();
        let mut seen = Vec::new();
        while let Some((_, record)) = table.fetch_next(&mut ctx).unwrap() {
            seen.push(record.get(0, table.schema()));
        }

        assert_eq!(seen, vec![Value::Int(2), Value::Int(3)]);

        table.close().unwrap();
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn scan_applies_predicate() {
        let path = test_path();
        let mut table = Table::create(&path, schema(), 8, ReplacementPolicy::Lru).unwrap();

        table.insert_record(&[Value::Int(1)]).unwrap();
        table.insert_record(&[Value::Int(2)]).unwrap();
        table.insert_record(&[Value::Int(3)]).unwrap();

        let pred = Expr::Compare(
            Box::new(Expr::Attr("id".into())),
            CompareOp::Gt,
            Box::new(Expr::Literal(Value::Int(1))),
        );
        let mut ctx = table.start_scan(Box::new(pred)).unwrap();

        let mut seen = Vec::new();
        while let Some((_, record)) = table.fetch_next(&mut ctx).unwrap() {
            seen.push(record.get(0, table.schema()));
        }
        assert_eq!(seen, vec![Value::Int(2), Value::Int(3)]);

        table.close().unwrap();
        std::fs::remove_file(path).unwrap();
    }
}
