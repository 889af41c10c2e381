use anyhow::Result;
use tablestore::{AllRows, Attribute, DataType, ReplacementPolicy, Schema, Table, Value};

fn main() -> Result<()> {
    let path = "data/demo_users.db";
    let _ = std::fs::remove_file(path);

    let schema = Schema::new(
        vec![
            Attribute::new("id", DataType::Int)?,
            Attribute::new("name", DataType::String(16))?,
            Attribute::new("active", DataType::Bool)?,
        ],
        vec![0],
    )?;

    let mut table = Table::create(path, schema, 16, ReplacementPolicy::Lru)?;

    table.insert_record(&[Value::Int(1), Value::Str("alice".into()), Value::Bool(true)])?;
    let bob = table.insert_record(&[Value::Int(2), Value::Str("bob".into()), Value::Bool(false)])?;
    table.insert_record(&[Value::Int(3), Value::Str("carol".into()), Value::Bool(true)])?;

    table.delete_record(bob)?;
    table.close()?;

    let mut table = Table::open(path, 16, ReplacementPolicy::Lru)?;
    println!("tuples after reopen: {}", table.num_tuples());

    let mut ctx = table.start_scan(Box::new(AllRows))?;
    while let Some((rid, record)) = table.fetch_next(&mut ctx)? {
        println!("{:?} -> {:?}", rid, record.values(table.schema()));
    }

    table.close()?;
    std::fs::remove_file(path)?;

    Ok(())
}
