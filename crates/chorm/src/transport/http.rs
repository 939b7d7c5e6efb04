use super::Transport;
use crate::config::ConnectionConfig;
use crate::error::{OrmError, OrmResult};
use crate::temp_table::TempTable;
use crate::value::Row;
use async_trait::async_trait;
use reqwest::Body;
use reqwest::multipart::{Form, Part};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::io::ReaderStream;
use url::Url;

const USER_HEADER: &str = "X-ClickHouse-User";
const KEY_HEADER: &str = "X-ClickHouse-Key";

/// Transport over ClickHouse's HTTP interface.
///
/// Queries are POSTed as the request body. When external data is attached,
/// the query moves to the `query` URL parameter and each file becomes a
/// multipart part named after its temp table. Results are read as
/// `JSONEachRow`.
#[derive(Clone)]
pub struct HttpTransport {
    inner: Arc<HttpTransportInner>,
}

struct HttpTransportInner {
    client: reqwest::Client,
    base_url: Url,
    username: String,
    password: String,
    database: String,
    settings: BTreeMap<String, String>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.inner.base_url.as_str())
            .field("username", &self.inner.username)
            .field("database", &self.inner.database)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Build a transport for the given connection configuration.
    pub fn new(config: &ConnectionConfig) -> OrmResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            inner: Arc::new(HttpTransportInner {
                client,
                base_url: config.base_url()?,
                username: config.username.clone(),
                password: config.password.clone(),
                database: config.database.clone(),
                settings: config.settings.clone(),
            }),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn url(&self, params: &[(String, String)]) -> Url {
        let mut url = self.inner.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("database", &self.inner.database);
            for (key, value) in &self.inner.settings {
                pairs.append_pair(key, value);
            }
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    fn post(&self, url: Url) -> reqwest::RequestBuilder {
        self.inner
            .client
            .post(url)
            .header(USER_HEADER, &self.inner.username)
            .header(KEY_HEADER, &self.inner.password)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> OrmResult<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(OrmError::from_response(status.as_u16(), &body));
        }
        Ok(body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn select(&self, sql: &str, files: &[TempTable]) -> OrmResult<Vec<Row>> {
        let start = Instant::now();
        let mut params = vec![("default_format".to_string(), "JSONEachRow".to_string())];

        let request = if files.is_empty() {
            self.post(self.url(&params)).body(sql.to_string())
        } else {
            params.push(("query".to_string(), sql.to_string()));
            let mut form = Form::new();
            for file in files {
                params.push((format!("{}_structure", file.name()), file.structure().to_string()));
                params.push((format!("{}_format", file.name()), file.file_format().to_string()));
                let (body, len) = open_body(file.path()).await?;
                let file_name = file
                    .path()
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.name().to_string());
                let part = Part::stream_with_length(body, len).file_name(file_name);
                form = form.part(file.name().to_string(), part);
            }
            self.post(self.url(&params)).multipart(form)
        };

        let body = self.send(request).await?;
        let rows = parse_json_each_row(&body)?;
        tracing::debug!(
            target: "chorm.http",
            rows = rows.len(),
            files = files.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "select completed"
        );
        Ok(rows)
    }

    async fn execute(&self, sql: &str) -> OrmResult<()> {
        let request = self.post(self.url(&[])).body(sql.to_string());
        self.send(request).await?;
        Ok(())
    }

    async fn insert_file(&self, sql: &str, path: &Path) -> OrmResult<()> {
        let (body, len) = open_body(path).await?;
        tracing::debug!(
            target: "chorm.http",
            path = %path.display(),
            bytes = len,
            "uploading file"
        );
        let params = [("query".to_string(), sql.to_string())];
        let request = self.post(self.url(&params)).body(body);
        self.send(request).await?;
        Ok(())
    }
}

/// Open a local file as a streaming request body, with its size in bytes.
async fn open_body(path: &Path) -> OrmResult<(Body, u64)> {
    let file = tokio::fs::File::open(path).await?;
    let len = file.metadata().await?.len();
    Ok((Body::wrap_stream(ReaderStream::new(file)), len))
}

/// Parse a `JSONEachRow` body: one JSON object per line.
pub(crate) fn parse_json_each_row(body: &str) -> OrmResult<Vec<Row>> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str::<Row>(line)
                .map_err(|e| OrmError::decode(format!("invalid JSONEachRow line: {e}")))
        })
        .collect()
}
