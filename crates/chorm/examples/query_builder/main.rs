//! Example demonstrating chorm's ClickHouse query builder.
//!
//! Run with:
//!   cargo run --example query_builder -p chorm
//!
//! Optional (run queries against a real server):
//!   CLICKHOUSE_HOST=localhost

use chorm::{
    Connection, ConnectionConfig, Direction, Expr, JoinKind, JoinStrictness, JoinTarget, OrmResult,
    TempTable,
};
use std::env;

// ─── Pure SQL generation demos (no server required) ─────────────────────────

fn demo_select(conn: &Connection) {
    let q = conn
        .table("hits")
        .select(&["user_id", "count() AS hits"])
        .with_final()
        .prewhere_eq("site_id", 42)
        .where_between("date", "2024-01-01", "2024-01-31")
        .where_expr(Expr::or(vec![
            Expr::eq("device", "mobile"),
            Expr::is_null("device"),
        ]))
        .group_by(&["user_id"])
        .order_by("hits", Direction::Desc)
        .limit_by(3, &["user_id"])
        .limit(10);

    println!("[select]");
    println!("  {}\n", q.to_sql());
}

fn demo_joins(conn: &Connection) {
    let users = conn.table("users").select(&["id AS user_id", "name"]);
    let q = conn
        .table("hits")
        .any_left_join(users, &["user_id"])
        .join_raw(
            JoinTarget::configure(|join| {
                join.table("sessions")
                    .alias("s")
                    .on("hits.session_id", "=", "s.id");
            }),
            Some(JoinStrictness::All),
            Some(JoinKind::Inner),
            None,
            true,
            None,
        );

    println!("[joins]");
    println!("  {}\n", q.to_sql());
}

fn demo_temp_table(conn: &Connection) {
    let ids = TempTable::new("wanted_ids", "/tmp/wanted_ids.csv", "id UInt64");
    let q = conn.table("hits").where_in_file("user_id", ids);

    println!("[temp table]");
    println!("  {}", q.to_sql());
    for file in q.get_files() {
        println!("  ships {} ({}) as {}", file.path().display(), file.structure(), file.name());
    }
    println!();
}

fn demo_count_and_async(conn: &Connection) {
    let q = conn.table("hits").where_eq("site_id", 42).limit(100);
    println!("[count]");
    println!("  {}\n", q.count_query("*").to_sql());

    let q = q.async_with_query(conn.table("sessions").where_eq("site_id", 42));
    println!("[async]");
    for query in q.to_async_queries() {
        println!("  {}", query.sql);
    }
    println!();
}

// ─── Live demo ──────────────────────────────────────────────────────────────

async fn demo_live(conn: &Connection) -> OrmResult<()> {
    conn.statement("CREATE TABLE IF NOT EXISTS chorm_hits (id UInt64, url String) ENGINE = Memory")
        .await?;
    conn.statement("TRUNCATE TABLE chorm_hits").await?;

    conn.table("chorm_hits")
        .insert(vec![
            chorm::Record::new().set("id", 1).set("url", "/"),
            chorm::Record::new().set("url", "/about").set("id", 2),
        ])
        .await?;

    let total = conn.table("chorm_hits").count("*").await?;
    println!("[live] chorm_hits has {total} rows");

    if let Some(row) = conn.table("chorm_hits").order_by_desc("id").first().await? {
        println!("[live] newest row: {row:?}");
    }
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> OrmResult<()> {
    println!("=== Query Builder Examples ===\n");

    let host = env::var("CLICKHOUSE_HOST").ok();
    let config = ConnectionConfig::new().host(host.clone().unwrap_or_else(|| "localhost".into()));
    let conn = Connection::new(config)?;

    demo_select(&conn);
    demo_joins(&conn);
    demo_temp_table(&conn);
    demo_count_and_async(&conn);

    if host.is_none() {
        println!("CLICKHOUSE_HOST not set; skipping live demo.");
        return Ok(());
    }
    demo_live(&conn).await
}
