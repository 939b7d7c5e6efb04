//! Unit tests for the query builder and grammar.

use crate::config::ConnectionConfig;
use crate::connection::Connection;
use crate::query::{Direction, Expr, JoinKind, JoinStrictness, JoinTarget};
use crate::temp_table::TempTable;
use crate::value::{InsertValues, Record};
use serde_json::json;

fn conn() -> Connection {
    Connection::new(ConnectionConfig::new()).unwrap()
}

fn ids_file() -> TempTable {
    TempTable::new("ids", "/tmp/ids.csv", "id UInt64")
}

// ==================== SELECT ====================

#[test]
fn test_select_basic() {
    let q = conn().table("events");
    assert_eq!(q.to_sql(), "SELECT * FROM events");

    let q = conn().table("events").select(&["a", "b"]).add_select("c");
    assert_eq!(q.to_sql(), "SELECT a, b, c FROM events");
}

#[test]
fn test_clause_order() {
    let q = conn()
        .table("hits")
        .alias("h")
        .with_final()
        .sample(0.1)
        .left_array_join("tags")
        .prewhere_eq("site", 1)
        .where_in("id", [1, 2])
        .group_by(&["id"])
        .having_raw("count() > 1")
        .order_by("id", Direction::Asc)
        .limit_by(2, &["id"])
        .limit(5)
        .offset(10);

    assert_eq!(
        q.to_sql(),
        "SELECT * FROM hits AS h FINAL SAMPLE 0.1 LEFT ARRAY JOIN tags \
         PREWHERE site = 1 WHERE id IN (1, 2) GROUP BY id HAVING count() > 1 \
         ORDER BY id ASC LIMIT 2 BY id LIMIT 5 OFFSET 10"
    );
}

#[test]
fn test_where_conjunctions() {
    let q = conn()
        .table("events")
        .where_eq("a", 1)
        .or_where_eq("b", "x")
        .where_null("c");
    assert_eq!(
        q.to_sql(),
        "SELECT * FROM events WHERE a = 1 OR b = 'x' AND c IS NULL"
    );
}

#[test]
fn test_where_grouped_expr() {
    let q = conn()
        .table("events")
        .where_expr(Expr::or(vec![Expr::eq("a", 1), Expr::is_null("b")]))
        .where_between("d", "2024-01-01", "2024-01-31");
    assert_eq!(
        q.to_sql(),
        "SELECT * FROM events WHERE (a = 1 OR b IS NULL) AND d BETWEEN '2024-01-01' AND '2024-01-31'"
    );
}

#[test]
fn test_empty_in_list_is_constant() {
    let q = conn().table("events").where_in("id", Vec::<i64>::new());
    assert_eq!(q.to_sql(), "SELECT * FROM events WHERE 0");

    let q = conn().table("events").where_not_in("id", Vec::<i64>::new());
    assert_eq!(q.to_sql(), "SELECT * FROM events WHERE 1");
}

#[test]
fn test_where_in_sub_query() {
    let sub = conn().table("users").select(&["id"]).where_eq("active", true);
    let q = conn().table("events").where_global_in_query("user_id", sub);
    assert_eq!(
        q.to_sql(),
        "SELECT * FROM events WHERE user_id GLOBAL IN (SELECT id FROM users WHERE active = true)"
    );
}

#[test]
fn test_where_in_file_ships_temp_table() {
    let q = conn().table("events").where_in_file("id", ids_file());
    assert_eq!(q.to_sql(), "SELECT * FROM events WHERE id IN ids");
    assert_eq!(q.get_files(), &[ids_file()]);
}

#[test]
fn test_add_file_dedupes() {
    let q = conn().table("events").add_file(ids_file()).add_file(ids_file());
    assert_eq!(q.get_files().len(), 1);
}

#[test]
fn test_add_file_same_name_replaces() {
    let other = TempTable::new("ids", "/tmp/other.csv", "id UInt64");
    let q = conn()
        .table("events")
        .add_file(ids_file())
        .add_file(TempTable::new("names", "/tmp/names.csv", "name String"))
        .add_file(other.clone());

    let names: Vec<&str> = q.get_files().iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["ids", "names"]);
    assert_eq!(q.get_files()[0], other);
}

#[test]
fn test_shared_temp_table_is_shipped_once() {
    let sub = conn().table("users").where_in_file("id", ids_file());
    let q = conn()
        .table("events")
        .where_in_file("id", ids_file())
        .any_left_join(sub.clone(), &["id"])
        .where_in_query("user_id", sub.clone())
        .union_all(sub.clone());
    let q = conn().query().from_query(q);

    let names: Vec<&str> = q.get_files().iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["ids"]);
    assert_eq!(q.to_async_queries()[0].files.len(), 1);
}

#[test]
fn test_union_all_merges_files() {
    let other = conn().table("archive").add_file(ids_file());
    let q = conn().table("events").union_all(other);
    assert_eq!(q.to_sql(), "SELECT * FROM events UNION ALL SELECT * FROM archive");
    assert_eq!(q.get_files().len(), 1);
}

#[test]
fn test_from_sub_query() {
    let sub = conn().table("events").select(&["user_id"]).group_by(&["user_id"]);
    let q = conn().query().from_query(sub).alias("t").select(&["count()"]);
    assert_eq!(
        q.to_sql(),
        "SELECT count() FROM (SELECT user_id FROM events GROUP BY user_id) AS t"
    );
    assert_eq!(q.table_name(), None);
}

// ==================== JOIN ====================

#[test]
fn test_join_raw_with_table_name() {
    let q = conn().table("events").join_raw(
        "users",
        Some(JoinStrictness::All),
        Some(JoinKind::Left),
        Some(&["user_id"][..]),
        false,
        None,
    );
    assert_eq!(
        q.to_sql(),
        "SELECT * FROM events ALL LEFT JOIN users USING (user_id)"
    );

    let join = &q.get_joins()[0];
    assert_eq!(join.get_strict(), Some(JoinStrictness::All));
    assert_eq!(join.get_kind(), Some(JoinKind::Left));
    assert!(!join.is_distributed());
    assert!(join.get_sub_query().is_none());
}

#[test]
fn test_join_raw_callback_settings_take_precedence() {
    let q = conn().table("events").join_raw(
        JoinTarget::configure(|join| {
            join.table("sessions")
                .strict(JoinStrictness::Any)
                .alias("s")
                .on("events.session_id", "=", "s.id");
        }),
        Some(JoinStrictness::All),
        Some(JoinKind::Inner),
        None,
        true,
        Some("x"),
    );
    assert_eq!(
        q.to_sql(),
        "SELECT * FROM events GLOBAL ANY INNER JOIN sessions AS s ON events.session_id = s.id"
    );
}

#[test]
fn test_join_raw_using_is_appended_to_callback() {
    let q = conn().table("events").join_raw(
        JoinTarget::configure(|join| {
            join.table("users").using(&["site_id"]);
        }),
        None,
        Some(JoinKind::Left),
        Some(&["user_id", "site_id"][..]),
        false,
        None,
    );
    assert_eq!(
        q.get_joins()[0].get_using(),
        &["site_id".to_string(), "user_id".to_string()]
    );
    assert_eq!(
        q.to_sql(),
        "SELECT * FROM events LEFT JOIN users USING (site_id, user_id)"
    );
}

#[test]
fn test_join_sub_query_merges_files_once() {
    let sub = conn().table("ids_src").add_file(ids_file());
    let q = conn().table("events").any_left_join(sub, &["id"]);

    assert_eq!(q.get_files(), &[ids_file()]);
    let join = &q.get_joins()[0];
    let attached = join.get_sub_query().unwrap();
    assert_eq!(attached.to_sql(), "SELECT * FROM ids_src");
    assert_eq!(
        q.to_sql(),
        "SELECT * FROM events ANY LEFT JOIN (SELECT * FROM ids_src) USING (id)"
    );
}

#[test]
fn test_callback_sub_query_does_not_merge_files() {
    let sub = conn().table("ids_src").add_file(ids_file());
    let q = conn().table("events").join_raw(
        JoinTarget::configure(move |join| {
            join.query(sub).using(&["id"]);
        }),
        Some(JoinStrictness::Any),
        Some(JoinKind::Inner),
        None,
        false,
        None,
    );
    assert!(q.get_files().is_empty());
    assert!(q.get_joins()[0].get_sub_query().is_some());
}

#[test]
fn test_joins_accumulate() {
    let q = conn()
        .table("events")
        .all_inner_join("users", &["user_id"])
        .left_join("sites", &["site_id"]);
    assert_eq!(q.get_joins().len(), 2);
    assert_eq!(
        q.to_sql(),
        "SELECT * FROM events ALL INNER JOIN users USING (user_id) LEFT JOIN sites USING (site_id)"
    );
}

#[test]
fn test_array_join() {
    let q = conn().table("events").array_join("tags").where_eq("tags", "a");
    assert_eq!(q.to_sql(), "SELECT * FROM events ARRAY JOIN tags WHERE tags = 'a'");
}

// ==================== COUNT / ASYNC ====================

#[test]
fn test_count_query_drops_limits_and_orders() {
    let q = conn()
        .table("events")
        .select(&["a"])
        .where_eq("a", 1)
        .order_by_desc("a")
        .limit(10)
        .offset(5);
    assert_eq!(
        q.count_query("*").to_sql(),
        "SELECT count(*) AS count FROM events WHERE a = 1"
    );
}

#[test]
fn test_count_query_keeps_grouping() {
    let q = conn()
        .table("events")
        .group_by(&["a"])
        .order_by_desc("a");
    assert_eq!(
        q.count_query("id").to_sql(),
        "SELECT count(id) AS count FROM events GROUP BY a ORDER BY a DESC"
    );
}

#[test]
fn test_async_queries_expand_in_order() {
    let c = conn();
    let q = c
        .table("a")
        .add_file(ids_file())
        .async_with_query(c.table("b").async_with_query(c.table("c")))
        .async_with_query(c.table("d"));

    let queries = q.to_async_queries();
    let sqls: Vec<&str> = queries.iter().map(|q| q.sql.as_str()).collect();
    assert_eq!(
        sqls,
        vec![
            "SELECT * FROM a",
            "SELECT * FROM b",
            "SELECT * FROM c",
            "SELECT * FROM d",
        ]
    );
    assert_eq!(queries[0].files.len(), 1);
    assert!(queries[1].files.is_empty());
}

#[test]
fn test_new_query_shares_connection() {
    let q = conn().table("events");
    let fresh = q.new_query();
    assert_eq!(fresh.to_sql(), "SELECT *");
    assert_eq!(fresh.connection().name(), q.connection().name());
}

// ==================== INSERT ====================

#[test]
fn test_insert_statement_sorts_columns() {
    let values = InsertValues::try_from(json!([{"b": 2, "a": 1}, {"a": 3, "b": 4}])).unwrap();
    let (sql, bindings) = conn()
        .table("events")
        .insert_statement(values)
        .unwrap()
        .unwrap();

    assert_eq!(sql, "INSERT INTO events (a, b) VALUES (?, ?), (?, ?)");
    assert_eq!(bindings, vec![json!(1), json!(2), json!(3), json!(4)]);
}

#[test]
fn test_insert_statement_single_record() {
    let record = Record::new().set("name", "x").set("id", 7);
    let (sql, bindings) = conn()
        .table("events")
        .insert_statement(record)
        .unwrap()
        .unwrap();

    assert_eq!(sql, "INSERT INTO events (id, name) VALUES (?, ?)");
    assert_eq!(bindings, vec![json!(7), json!("x")]);
}

#[test]
fn test_insert_statement_empty_is_none() {
    let q = conn().table("events");
    assert!(q.insert_statement(Vec::<Record>::new()).unwrap().is_none());
    assert!(q.insert_statement(Record::new()).unwrap().is_none());
}

#[test]
fn test_insert_statement_rejects_mismatched_columns() {
    let rows = vec![
        Record::new().set("a", 1).set("b", 2),
        Record::new().set("a", 3).set("c", 4),
    ];
    let err = conn().table("events").insert_statement(rows).unwrap_err();
    assert!(err.to_string().contains("row 1"));
}

#[test]
fn test_insert_statement_requires_table() {
    let record = Record::new().set("a", 1);
    assert!(conn().query().insert_statement(record).is_err());
}
