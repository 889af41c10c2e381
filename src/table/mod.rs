//! The record manager: fixed-schema heap tables over a single page file.
//! Page 0 holds the schema plus two persisted counters (tuple count, first
//! free page); pages 1.. are slotted heaps of fixed-width, tombstoned
//! records. No indexes, no transactions, no variable-length tuples — see
//! SPEC_FULL.md for the Non-goals this leaves out.

pub mod scan;

use crate::buffer_pool::{BufferPool, ReplacementPolicy};
use crate::disk_manager::{self, FileHandle};
use crate::errors::Error;
use crate::pages::PAGE_SIZE;
use crate::printdbg;
use crate::record::{Record, Rid};
use crate::schema::Schema;
use crate::value::Value;
use anyhow::{bail, ensure, Result};

pub use scan::ScanContext;

/// First data page; page 0 is metadata-only.
const FIRST_DATA_PAGE: i64 = 1;

/// Byte width of one slot: a one-byte tombstone plus the record itself.
fn slot_width(schema: &Schema) -> usize {
    1 + schema.record_width()
}

pub struct Table {
    schema: Schema,
    pool: BufferPool,
    tuple_count: i32,
    first_free_page: i32,
}

impl Table {
    /// Creates a fresh page file, seeds page 0 with the schema, and opens
    /// page 1 as the first (empty) data page.
    pub fn create(path: &str, schema: Schema, capacity: usize, policy: ReplacementPolicy) -> Result<Self> {
        let slot_width = slot_width(&schema);
        ensure!(
            slot_width <= PAGE_SIZE,
            Error::InvalidParameter(format!("record width {slot_width} exceeds page size")),
        );

        disk_manager::create_page_file(path)?;
        let mut disk = FileHandle::open(path)?;

        let header_bytes = schema.encode(0, FIRST_DATA_PAGE as i32);
        ensure!(
            header_bytes.len() <= PAGE_SIZE,
            Error::InvalidParameter("schema too large to fit in one page".into()),
        );
        let mut page0 = crate::pages::Page::zeroed(0);
        page0.write_bytes(0, &header_bytes);
        disk.write_block(0, &page0)?;
        disk.ensure_capacity(FIRST_DATA_PAGE + 1)?;

        let pool = BufferPool::new(disk, capacity, policy);

        Ok(Self { schema, pool, tuple_count: 0, first_free_page: FIRST_DATA_PAGE as i32 })
    }

    /// Opens an existing page file, reading the schema and counters back
    /// from page 0.
    pub fn open(path: &str, capacity: usize, policy: ReplacementPolicy) -> Result<Self> {
        let mut disk = FileHandle::open(path)?;
        let page0 = disk.read_block(0)?;
        let (schema, tuple_count, first_free_page) = Schema::decode(page0.as_slice())?;

        let pool = BufferPool::new(disk, capacity, policy);
        Ok(Self { schema, pool, tuple_count, first_free_page })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn num_tuples(&self) -> i32 {
        self.tuple_count
    }

    fn persist_header(&mut self) -> Result<()> {
        let tuple_count = self.tuple_count;
        let first_free_page = self.first_free_page;
        let mut page0 = self.pool.pin_page(0)?;
        page0.data_mut().write_bytes(0, &tuple_count.to_ne_bytes());
        page0.data_mut().write_bytes(4, &first_free_page.to_ne_bytes());
        Ok(())
    }

    /// Finds the first data page with a free slot at or after `from`,
    /// appending a new page if none exists. Leaves the pool untouched
    /// otherwise (no page is pinned by this call).
    fn find_insertion_page(&mut self, from: i64) -> Result<i64> {
        let slot_width = slot_width(&self.schema);
        let slots_per_page = crate::pages::table_page::slots_per_page(slot_width);

        let mut page_id = from.max(FIRST_DATA_PAGE);
        loop {
            if page_id >= self.pool.total_pages() {
                self.pool.ensure_capacity(page_id + 1)?;
                return Ok(page_id);
            }

            let page = self.pool.pin_page(page_id)?;
            let has_free_slot = (0..slots_per_page).any(|slot| {
                let offset = crate::pages::table_page::slot_offset(slot_width, slot);
                page.data().read_bytes(offset, 1)[0] == crate::pages::table_page::TOMBSTONE_FREE
            });
            drop(page);

            if has_free_slot {
                return Ok(page_id);
            }
            page_id += 1;
        }
    }

    pub fn insert_record(&mut self, values: &[Value]) -> Result<Rid> {
        let record = Record::from_values(values, &self.schema)?;
        let slot_width = slot_width(&self.schema);
        let slots_per_page = crate::pages::table_page::slots_per_page(slot_width);

        let page_id = self.find_insertion_page(self.first_free_page as i64)?;
        let mut page = self.pool.pin_page(page_id)?;

        let slot = (0..slots_per_page)
            .find(|&slot| {
                let offset = crate::pages::table_page::slot_offset(slot_width, slot);
                page.data().read_bytes(offset, 1)[0] == crate::pages::table_page::TOMBSTONE_FREE
            })
            .ok_or_else(|| Error::Generic(format!("page {page_id} unexpectedly has no free slot")))?;

        let offset = crate::pages::table_page::slot_offset(slot_width, slot);
        page.data_mut().write_bytes(offset, &[crate::pages::table_page::TOMBSTONE_OCCUPIED]);
        page.data_mut().write_bytes(offset + 1, record.as_bytes());
        drop(page);

        self.tuple_count += 1;
        if page_id as i32 > self.first_free_page {
            self.first_free_page = page_id as i32;
        }
        self.persist_header()?;

        printdbg!("inserted record at page {page_id} slot {slot}");
        Ok(Rid::new(page_id, slot as i64))
    }

    fn read_slot(&mut self, rid: Rid) -> Result<(bool, Record)> {
        let slot_width = slot_width(&self.schema);
        let offset = crate::pages::table_page::slot_offset(slot_width, rid.slot as usize);
        let page = self.pool.pin_page(rid.page)?;
        let tombstone = page.data().read_bytes(offset, 1)[0];
        let record = Record::from_bytes(page.data().read_bytes(offset + 1, self.schema.record_width()));
        Ok((tombstone == crate::pages::table_page::TOMBSTONE_OCCUPIED, record))
    }

    pub fn get_record(&mut self, rid: Rid) -> Result<Record> {
        let (occupied, record) = self.read_slot(rid)?;
        if !occupied {
            bail!(Error::NoTupleWithGivenRid);
        }
        Ok(record)
    }

    pub fn delete_record(&mut self, rid: Rid) -> Result<()> {
        let (occupied, _) = self.read_slot(rid)?;
        if !occupied {
            bail!(Error::NoTupleWithGivenRid);
        }

        let slot_width = slot_width(&self.schema);
        let offset = crate::pages::table_page::slot_offset(slot_width, rid.slot as usize);
        let mut page = self.pool.pin_page(rid.page)?;
        page.data_mut().write_bytes(offset, &[crate::pages::table_page::TOMBSTONE_FREE]);
        drop(page);

        self.tuple_count -= 1;
        if (rid.page as i32) < self.first_free_page {
            self.first_free_page = rid.page as i32;
        }
        self.persist_header()?;
        Ok(())
    }

    pub fn update_record(&mut self, rid: Rid, values: &[Value]) -> Result<()> {
        let (occupied, _) = self.read_slot(rid)?;
        if !occupied {
            bail!(Error::NoTupleWithGivenRid);
        }

        let record = Record::from_values(values, &self.schema)?;
        let slot_width = slot_width(&self.schema);
        let offset = crate::pages::table_page::slot_offset(slot_width, rid.slot as usize);
        let mut page = self.pool.pin_page(rid.page)?;
        page.data_mut().write_bytes(offset, &[crate::pages::table_page::TOMBSTONE_OCCUPIED]);
        page.data_mut().write_bytes(offset + 1, record.as_bytes());
        Ok(())
    }

    /// Starts a predicate-filtered scan; callers that want every row pass
    /// `AllRows`. The typed `Box<dyn Predicate>` is this crate's version of
    /// the collaborator contract's null-predicate check — the type system
    /// rejects an absent predicate instead of a runtime `ScanConditionNotFound`.
    pub fn start_scan(&mut self, predicate: Box<dyn crate::expr::Predicate>) -> Result<ScanContext> {
        Ok(ScanContext::new(self.first_free_page, slot_width(&self.schema), predicate))
    }

    pub fn fetch_next(&mut self, ctx: &mut ScanContext) -> Result<Option<(Rid, Record)>> {
        ctx.next(self)
    }

    pub(crate) fn pool_mut(&mut self) -> &mut BufferPool {
        &mut self.pool
    }

    pub fn close(mut self) -> Result<()> {
        self.persist_header()?;
        self.pool.shutdown()
    }
}

pub fn delete_table(path: &str) -> Result<()> {
    disk_manager::destroy_page_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk_manager::test_path;
    use crate::schema::{Attribute, DataType};

    fn schema() -> Schema {
        Schema::new(
            vec![
                Attribute::new("id", DataType::Int).unwrap(),
                Attribute::new("name", DataType::String(8)).unwrap(),
            ],
            vec![0],
        )
        .unwrap()
    }

    #[test]
    fn insert_then_get_round_trips() {
        let path = test_path();
        let mut table = Table::create(&path, schema(), 8, ReplacementPolicy::Lru).unwrap();

        let rid = table
            .insert_record(&[Value::Int(1), Value::Str("alice".into())])
            .unwrap();
        let record = table.get_record(rid).unwrap();
        assert_eq!(record.get(0, table.schema()), Value::Int(1));
        assert_eq!(record.get(1, table.schema()), Value::Str("alice".into()));
        assert_eq!(table.num_tuples(), 1);

        table.close().unwrap();
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn delete_then_get_fails_and_reuses_slot() {
        let path = test_path();
        let mut table = Table::create(&path, schema(), 8, ReplacementPolicy::Lru).unwrap();

        let rid = table.insert_record(&[Value::Int(1), Value::Str("a".into())]).unwrap();
        table.delete_record(rid).unwrap();
        assert!(table.get_record(rid).is_err());
        assert_eq!(table.num_tuples(), 0);

        let rid2 = table.insert_record(&[Value::Int(2), Value::Str("b".into())]).unwrap();
        assert_eq!(rid2, rid, "freed slot should be reused before growing the file");

        table.close().unwrap();
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn update_changes_fields_in_place() {
        let path = test_path();
        let mut table = Table::create(&path, schema(), 8, ReplacementPolicy::Lru).unwrap();

        let rid = table.insert_record(&[Value::Int(1), Value::Str("a".into())]).unwrap();
        table.update_record(rid, &[Value::Int(1), Value::Str("bob".into())]).unwrap();

        let record = table.get_record(rid).unwrap();
        assert_eq!(record.get(1, table.schema()), Value::Str("bob".into()));

        table.close().unwrap();
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn reopen_recovers_schema_and_counters() {
        let path = test_path();
        {
            let mut table = Table::create(&path, schema(), 8, ReplacementPolicy::Lru).unwrap();
            table.insert_record(&[Value::Int(1), Value::Str("a".into())]).unwrap();
            table.insert_record(&[Value::Int(2), Value::Str("b".into())]).unwrap();
            table.close().unwrap();
        }

        let table = Table::open(&path, 8, ReplacementPolicy::Lru).unwrap();
        assert_eq!(table.num_tuples(), 2);
        assert_eq!(table.schema().attributes.len(), 2);

        std::fs::remove_file(path).unwrap();
    }

    /// Tuple-count conservation under a random interleaving of inserts and
    /// deletes: `num_tuples` always equals #inserts - #deletes, clamped at
    /// 0, regardless of order (spec.md §8).
    #[test]
    fn tuple_count_is_conserved_under_random_inserts_and_deletes() {
        use rand::Rng;

        let path = test_path();
        let mut table = Table::create(&path, schema(), 4, ReplacementPolicy::Fifo).unwrap();

        let mut rng = rand::thread_rng();
        let mut live: Vec<Rid> = Vec::new();
        let mut next_id = 0i32;

        for _ in 0..200 {
            let do_insert = live.is_empty() || rng.gen_bool(0.6);
            if do_insert {
                let rid = table
                    .insert_record(&[Value::Int(next_id), Value::Str(format!("v{next_id}"))])
                    .unwrap();
                next_id += 1;
                live.push(rid);
            } else {
                let i = rng.gen_range(0..live.len());
                let rid = live.swap_remove(i);
                table.delete_record(rid).unwrap();
            }
            assert_eq!(table.num_tuples() as usize, live.len());
        }

        table.close().unwrap();
        std::fs::remove_file(path).unwrap();
    }
}
