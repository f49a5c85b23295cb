//! REST implementation of the [`Host`] trait.
//!
//! Talks to the note server's kernel HTTP API. Every JSON endpoint answers a
//! `{code, msg, data}` envelope; a non-zero `code` is an API-level error.
//! Queries against the block index go through the SQL endpoint, with string
//! literals escaped by doubling single quotes. The raw file endpoint is the
//! one exception to the envelope: it streams the file body directly and
//! signals failure through the HTTP status.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ChildEntry, DocEntry, Host, HostError, Locator, RefEntry, Severity, TitleGroup};

/// Notification display time in milliseconds.
const NOTIFY_TIMEOUT_MS: u64 = 7000;

/// Host client for the kernel HTTP API.
#[derive(Debug, Clone)]
pub struct RestHost {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

/// Standard response envelope of the JSON endpoints.
#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Value,
}

impl RestHost {
    /// Create a client for the server at `base_url`.
    ///
    /// `token` may be empty, in which case no Authorization header is sent.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, HostError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(self.endpoint(path));
        if !self.token.is_empty() {
            builder = builder.header("Authorization", format!("Token {}", self.token));
        }
        builder
    }

    /// POST a JSON payload and unwrap the response envelope.
    async fn post_json(&self, path: &str, payload: Value) -> Result<Value, HostError> {
        log::trace!("POST {}", path);
        let response = self.request(path).json(&payload).send().await?;
        let envelope: Envelope = response.json().await?;
        if envelope.code != 0 {
            return Err(HostError::Api {
                code: envelope.code,
                message: envelope.msg,
            });
        }
        Ok(envelope.data)
    }

    /// Run a SQL statement against the block index.
    async fn sql(&self, stmt: &str) -> Result<Vec<Value>, HostError> {
        let data = self.post_json("/api/query/sql", json!({ "stmt": stmt })).await?;
        match data {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(HostError::Decode(format!(
                "expected row array from sql endpoint, got {other}"
            ))),
        }
    }
}

#[async_trait]
impl Host for RestHost {
    async fn duplicate_title_groups(&self) -> Result<Vec<TitleGroup>, HostError> {
        let stmt = "SELECT content, COUNT(*) as count, \
                    GROUP_CONCAT(id) as ids, \
                    GROUP_CONCAT(hpath) as hpaths, \
                    GROUP_CONCAT(box) as boxes, \
                    GROUP_CONCAT(path) as paths, \
                    GROUP_CONCAT(updated) as updateds, \
                    GROUP_CONCAT(length(content)) as sizes \
                    FROM blocks \
                    WHERE type = 'd' \
                    GROUP BY content \
                    HAVING COUNT(*) > 1 \
                    ORDER BY count DESC, content";
        let rows = self.sql(stmt).await?;

        let mut groups = Vec::with_capacity(rows.len());
        for row in &rows {
            match parse_title_group_row(row) {
                Some(group) => groups.push(group),
                None => log::warn!(
                    "Skipping malformed duplicate-title row for {:?}",
                    row.get("content").and_then(Value::as_str).unwrap_or("?")
                ),
            }
        }
        Ok(groups)
    }

    async fn empty_documents(&self) -> Result<Vec<DocEntry>, HostError> {
        let stmt = "SELECT b.id, b.content, b.hpath, b.box, b.path, b.updated, \
                    length(b.content) as size \
                    FROM blocks b \
                    WHERE b.type = 'd' \
                    AND NOT EXISTS ( \
                    SELECT 1 FROM blocks c \
                    WHERE c.root_id = b.id AND c.type != 'd' AND c.markdown != '' \
                    ) \
                    ORDER BY b.updated DESC";
        let rows = self.sql(stmt).await?;
        rows.iter().map(parse_doc_row).collect()
    }

    async fn inbound_references(&self, id: &str) -> Result<Vec<RefEntry>, HostError> {
        let stmt = format!(
            "SELECT b.id, b.content, b.root_id \
             FROM refs r \
             JOIN blocks b ON b.id = r.block_id \
             WHERE r.def_block_id = '{}' \
             ORDER BY b.updated DESC",
            escape_sql(id)
        );
        let rows = self.sql(&stmt).await?;
        rows.iter().map(parse_ref_row).collect()
    }

    async fn lookup_document(&self, id: &str) -> Result<Option<DocEntry>, HostError> {
        let stmt = format!(
            "SELECT id, content, hpath, box, path, updated, length(content) as size \
             FROM blocks \
             WHERE id = '{}' AND type = 'd'",
            escape_sql(id)
        );
        let rows = self.sql(&stmt).await?;
        match rows.first() {
            Some(row) => Ok(Some(parse_doc_row(row)?)),
            None => Ok(None),
        }
    }

    async fn transfer_references(&self, from_id: &str, to_id: &str) -> Result<(), HostError> {
        // Empty refIDs asks the server to move every reference; reloadUI is
        // suppressed so batch merges do not flicker any connected client.
        self.post_json(
            "/api/block/transferBlockRef",
            json!({
                "fromID": from_id,
                "toID": to_id,
                "refIDs": [],
                "reloadUI": false,
            }),
        )
        .await?;
        Ok(())
    }

    async fn export_text_content(&self, id: &str) -> Result<String, HostError> {
        let data = self
            .post_json("/api/export/exportMdContent", json!({ "id": id }))
            .await?;
        Ok(data
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn append_text_content(&self, target_id: &str, text: &str) -> Result<(), HostError> {
        self.post_json(
            "/api/block/appendBlock",
            json!({
                "dataType": "markdown",
                "data": text,
                "parentID": target_id,
            }),
        )
        .await?;
        Ok(())
    }

    async fn delete_item(&self, locator: &Locator) -> Result<(), HostError> {
        self.post_json(
            "/api/filetree/removeDoc",
            json!({
                "notebook": locator.notebook,
                "path": locator.path,
            }),
        )
        .await?;
        Ok(())
    }

    async fn child_entries(
        &self,
        notebook: &str,
        path: &str,
    ) -> Result<Vec<ChildEntry>, HostError> {
        let data = self
            .post_json(
                "/api/filetree/listDocsByPath",
                json!({
                    "notebook": notebook,
                    "path": path,
                    "sort": 0,
                }),
            )
            .await?;
        let files = match data.get("files") {
            Some(Value::Array(files)) => files.as_slice(),
            Some(Value::Null) | None => &[],
            Some(other) => {
                return Err(HostError::Decode(format!(
                    "expected file array from folder listing, got {other}"
                )))
            }
        };
        Ok(files.iter().map(parse_child_entry).collect())
    }

    async fn fetch_raw(&self, path: &str) -> Result<Option<Vec<u8>>, HostError> {
        // This endpoint returns the file body directly, not an envelope.
        let response = self
            .request("/api/file/getFile")
            .json(&json!({ "path": path }))
            .send()
            .await?;
        if !response.status().is_success() {
            log::debug!("Raw fetch of {} failed: HTTP {}", path, response.status());
            return Ok(None);
        }
        Ok(Some(response.bytes().await?.to_vec()))
    }

    async fn notify(&self, message: &str, severity: Severity) -> Result<(), HostError> {
        let endpoint = match severity {
            Severity::Info => "/api/notification/pushMsg",
            Severity::Error => "/api/notification/pushErrMsg",
        };
        self.post_json(
            endpoint,
            json!({
                "msg": message,
                "timeout": NOTIFY_TIMEOUT_MS,
            }),
        )
        .await?;
        Ok(())
    }
}

/// Escape a string literal for inclusion in a SQL statement.
fn escape_sql(s: &str) -> String {
    s.replace('\'', "''")
}

/// Read a string field from a row object.
fn str_field(row: &Value, key: &str) -> Result<String, HostError> {
    row.get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| HostError::Decode(format!("row is missing string field `{key}`")))
}

/// Read a numeric field that the index may report as a number or a numeric
/// string. Missing or unparsable values become 0.
fn u64_field(row: &Value, key: &str) -> u64 {
    match row.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Parse one document row (`id, content, hpath, box, path, updated, size`).
fn parse_doc_row(row: &Value) -> Result<DocEntry, HostError> {
    Ok(DocEntry {
        id: str_field(row, "id")?,
        title: str_field(row, "content")?,
        locator: Locator {
            notebook: str_field(row, "box")?,
            path: str_field(row, "path")?,
        },
        readable_path: str_field(row, "hpath")?,
        updated: u64_field(row, "updated"),
        size_bytes: u64_field(row, "size"),
    })
}

/// Parse one reference row (`id, content, root_id`).
fn parse_ref_row(row: &Value) -> Result<RefEntry, HostError> {
    Ok(RefEntry {
        id: str_field(row, "id")?,
        doc_id: str_field(row, "root_id")?,
        excerpt: str_field(row, "content")?,
    })
}

/// Parse one grouped duplicate-title row into a [`TitleGroup`].
///
/// The grouped query concatenates each per-document column with commas, so
/// the columns must all split into the same number of parts. Rows where they
/// do not (a title containing a comma breaks the concatenation) are rejected
/// by returning `None`.
fn parse_title_group_row(row: &Value) -> Option<TitleGroup> {
    let title = row.get("content")?.as_str()?.to_string();
    let ids: Vec<&str> = row.get("ids")?.as_str()?.split(',').collect();
    let hpaths: Vec<&str> = row.get("hpaths")?.as_str()?.split(',').collect();
    let boxes: Vec<&str> = row.get("boxes")?.as_str()?.split(',').collect();
    let paths: Vec<&str> = row.get("paths")?.as_str()?.split(',').collect();
    let updateds: Vec<&str> = row.get("updateds")?.as_str()?.split(',').collect();
    let sizes: Vec<&str> = row.get("sizes")?.as_str()?.split(',').collect();

    let n = ids.len();
    if n < 2
        || hpaths.len() != n
        || boxes.len() != n
        || paths.len() != n
        || updateds.len() != n
        || sizes.len() != n
    {
        return None;
    }

    let documents = (0..n)
        .map(|i| DocEntry {
            id: ids[i].to_string(),
            title: title.clone(),
            locator: Locator {
                notebook: boxes[i].to_string(),
                path: paths[i].to_string(),
            },
            readable_path: hpaths[i].to_string(),
            updated: updateds[i].trim().parse().unwrap_or(0),
            size_bytes: sizes[i].trim().parse().unwrap_or(0),
        })
        .collect();

    Some(TitleGroup { title, documents })
}

/// Parse one folder-listing entry. Leaves have a zero child count.
fn parse_child_entry(value: &Value) -> ChildEntry {
    let updated = if value.get("updated").is_some() {
        u64_field(value, "updated")
    } else {
        u64_field(value, "mtime")
    };
    ChildEntry {
        name: value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        path: value
            .get("path")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        child_count: u64_field(value, "subFileCount"),
        updated,
        size_bytes: u64_field(value, "size"),
    }
}
