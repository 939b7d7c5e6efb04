use super::http::parse_json_each_row;
use super::*;
use crate::config::ConnectionConfig;
use crate::error::OrmError;
use std::io::Write;
use url::Url;
use wiremock::matchers::{body_string, header, method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ConnectionConfig {
    let url = Url::parse(&server.uri()).unwrap();
    ConnectionConfig::new()
        .host(url.host_str().unwrap())
        .port(url.port().unwrap())
        .credentials("reader", "secret")
        .database("analytics")
        .setting("max_threads", "2")
}

#[test]
fn test_parse_json_each_row() {
    let rows = parse_json_each_row("{\"a\":1}\n\n{\"a\":2,\"b\":\"x\"}\n").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["b"], "x");

    assert!(parse_json_each_row("").unwrap().is_empty());
    assert!(matches!(parse_json_each_row("not json"), Err(OrmError::Decode(_))));
}

#[tokio::test]
async fn test_select_sends_query_in_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("default_format", "JSONEachRow"))
        .and(query_param("database", "analytics"))
        .and(query_param("max_threads", "2"))
        .and(header("X-ClickHouse-User", "reader"))
        .and(header("X-ClickHouse-Key", "secret"))
        .and(body_string("SELECT 1 AS one"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"one\":1}\n"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config_for(&server)).unwrap();
    let rows = transport.select("SELECT 1 AS one", &[]).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["one"], 1);
}

#[tokio::test]
async fn test_select_with_temp_table_uses_query_param() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("query", "SELECT * FROM events WHERE id IN ids"))
        .and(query_param("ids_structure", "id UInt64"))
        .and(query_param("ids_format", "CSV"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\":7}\n"))
        .expect(1)
        .mount(&server)
        .await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "7").unwrap();
    let table = TempTable::new("ids", file.path(), "id UInt64");

    let transport = HttpTransport::new(&config_for(&server)).unwrap();
    let rows = transport
        .select("SELECT * FROM events WHERE id IN ids", &[table])
        .await
        .unwrap();
    assert_eq!(rows[0]["id"], 7);
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string("Code: 60. DB::Exception: Table analytics.nope does not exist."),
        )
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config_for(&server)).unwrap();
    let err = transport.select("SELECT * FROM nope", &[]).await.unwrap_err();
    assert_eq!(err.server_code(), Some(60));
}

#[tokio::test]
async fn test_insert_file_uploads_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("query", "INSERT INTO events (a, b) FORMAT CSV"))
        .and(body_string("1,2\n3,4\n"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "1,2\n3,4\n").unwrap();

    let transport = HttpTransport::new(&config_for(&server)).unwrap();
    transport
        .insert_file("INSERT INTO events (a, b) FORMAT CSV", file.path())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_insert_file_missing_path_is_io_error() {
    let transport = HttpTransport::new(&ConnectionConfig::new()).unwrap();
    let err = transport
        .insert_file("INSERT INTO events FORMAT CSV", std::path::Path::new("/nonexistent/chorm.csv"))
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Io(_)));
}

#[tokio::test]
async fn test_insert_file_streams_large_body_intact() {
    let body: String = (0..20_000).map(|i| format!("{i},row-{i}\n")).collect();
    assert!(body.len() > 64 * 1024);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("query", "INSERT INTO events (id, name) FORMAT CSV"))
        .and(body_string(body.clone()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();

    let transport = HttpTransport::new(&config_for(&server)).unwrap();
    transport
        .insert_file("INSERT INTO events (id, name) FORMAT CSV", file.path())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_select_with_missing_temp_table_file_is_io_error() {
    let transport = HttpTransport::new(&ConnectionConfig::new()).unwrap();
    let table = TempTable::new("ids", "/nonexistent/ids.csv", "id UInt64");
    let err = transport
        .select("SELECT * FROM events WHERE id IN ids", &[table])
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Io(_)));
}
