//! Example demonstrating chorm's bulk loading: value inserts and file uploads.
//!
//! Run with:
//!   cargo run --example bulk_insert -p chorm
//!
//! Optional (load into a real server):
//!   CLICKHOUSE_HOST=localhost

use chorm::events::TracingDispatcher;
use chorm::{Connection, ConnectionConfig, Format, InsertValues, OrmResult, Record};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

fn demo_insert_statement(conn: &Connection) -> OrmResult<()> {
    // Column order differs per row; the compiled INSERT sorts them.
    let rows = vec![
        Record::new().set("url", "/").set("id", 1),
        Record::new().set("id", 2).set("url", "/pricing"),
    ];
    if let Some((sql, bindings)) = conn.table("hits").insert_statement(rows)? {
        println!("[insert]");
        println!("  SQL:      {sql}");
        println!("  bindings: {bindings:?}\n");
    }

    // JSON payloads work too.
    let payload = InsertValues::try_from(serde_json::json!({"id": 3, "url": "/docs"}))?;
    if let Some((sql, _)) = conn.table("hits").insert_statement(payload)? {
        println!("[insert json]");
        println!("  SQL:      {sql}\n");
    }
    Ok(())
}

async fn demo_live(conn: &Connection) -> OrmResult<()> {
    conn.statement("CREATE TABLE IF NOT EXISTS chorm_bulk (id UInt64, url String) ENGINE = Memory")
        .await?;

    let dir = env::temp_dir();
    let mut files: Vec<PathBuf> = Vec::new();
    for part in 0..3 {
        let path = dir.join(format!("chorm_bulk_{part}.csv"));
        let body: String = (0..100)
            .map(|i| format!("{},/page/{}\n", part * 100 + i, i))
            .collect();
        tokio::fs::write(&path, body).await?;
        files.push(path);
    }

    let results = conn
        .table("chorm_bulk")
        .insert_files(&["id", "url"], files, Format::Csv, 2)
        .await?;
    for result in &results {
        match &result.result {
            Ok(()) => println!("[live] loaded {}", result.path.display()),
            Err(e) => println!("[live] failed {}: {e}", result.path.display()),
        }
    }

    let total = conn.table("chorm_bulk").count("*").await?;
    println!("[live] chorm_bulk has {total} rows");
    Ok(())
}

#[tokio::main]
async fn main() -> OrmResult<()> {
    println!("=== Bulk Insert Examples ===\n");

    let host = env::var("CLICKHOUSE_HOST").ok();
    let config = ConnectionConfig::new().host(host.clone().unwrap_or_else(|| "localhost".into()));
    let mut conn = Connection::new(config)?;
    conn.set_event_dispatcher(Arc::new(TracingDispatcher::new()));

    demo_insert_statement(&conn)?;

    if host.is_none() {
        println!("CLICKHOUSE_HOST not set; skipping live demo.");
        return Ok(());
    }
    demo_live(&conn).await
}
