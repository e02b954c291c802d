//! REST implementation of [`Backend`] for a hosted Appwrite project.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fastfood_core::{AppwriteConfig, Error, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::backend::Backend;
use crate::query::Query;
use crate::types::{Account, Document, FileUpload, Identified, Session, StoredFile};

/// Page size used when listing everything in a collection or bucket.
const PAGE_SIZE: usize = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One page of a list response. Documents and files share the envelope.
#[derive(Deserialize)]
struct Page<T> {
    #[serde(default)]
    total: u64,
    #[serde(alias = "documents", alias = "files")]
    items: Vec<T>,
}

/// Error body returned on non-2xx responses.
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(rename = "type", default)]
    kind: String,
}

/// Backend client over the project's REST API.
///
/// Session cookies set by `create_email_password_session` are kept by the
/// underlying client, so later calls run as the signed-in user. With an
/// API key configured every call runs with server privileges.
#[derive(Debug, Clone)]
pub struct AppwriteBackend {
    client: Client,
    config: Arc<AppwriteConfig>,
}

impl AppwriteBackend {
    pub fn new(config: Arc<AppwriteConfig>) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AppwriteConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint, path.trim_start_matches('/'))
    }

    fn documents_path(&self, collection_id: &str) -> String {
        format!(
            "databases/{}/collections/{}/documents",
            self.config.database_id, collection_id
        )
    }

    fn files_path(&self, bucket_id: &str) -> String {
        format!("storage/buckets/{}/files", bucket_id)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self
            .client
            .request(method, self.url(path))
            .header("X-Appwrite-Project", &self.config.project_id);
        if let Some(key) = &self.config.api_key {
            req = req.header("X-Appwrite-Key", key);
        }
        req
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let response = req.send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn send_empty(&self, req: RequestBuilder) -> Result<()> {
        let response = req.send().await?;
        check_status(response).await?;
        Ok(())
    }

    /// Follow cursors until the listing is exhausted. An explicit `limit`
    /// in `queries` turns this into a single request.
    async fn list_all<T>(&self, path: &str, queries: &[Query]) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Identified,
    {
        let explicit_limit = queries.iter().any(|q| q.limit_value().is_some());
        let mut items: Vec<T> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut params: Vec<(&str, String)> =
                queries.iter().map(|q| ("queries[]", q.to_param())).collect();
            if !explicit_limit {
                params.push(("queries[]", Query::limit(PAGE_SIZE).to_param()));
            }
            if let Some(after) = &cursor {
                params.push(("queries[]", Query::cursor_after(after.clone()).to_param()));
            }

            let page: Page<T> = self
                .send(self.request(Method::GET, path).query(&params))
                .await?;
            let fetched = page.items.len();
            debug!(
                "Listed {} of {} from {} (cursor={:?})",
                fetched, page.total, path, cursor
            );

            cursor = page.items.last().map(|item| item.id().to_string());
            items.extend(page.items);

            if explicit_limit || fetched < PAGE_SIZE || cursor.is_none() {
                break;
            }
        }

        Ok(items)
    }
}

/// Turn a non-2xx response into a typed error.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let (kind, message) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.kind, body.message),
        Err(_) => (String::from("http"), text),
    };

    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Unauthorized(message));
    }
    Err(Error::Remote {
        status: Some(status.as_u16()),
        kind,
        message,
    })
}

/// A declared content type the multipart encoder will accept.
fn part_mime(content_type: &str) -> &str {
    match content_type.parse::<mime_guess::mime::Mime>() {
        Ok(_) => content_type,
        Err(_) => "application/octet-stream",
    }
}

#[async_trait]
impl Backend for AppwriteBackend {
    async fn list_documents(&self, collection_id: &str, queries: &[Query]) -> Result<Vec<Document>> {
        self.list_all(&self.documents_path(collection_id), queries)
            .await
    }

    async fn create_document(
        &self,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Document> {
        let body = json!({
            "documentId": document_id,
            "data": data,
        });
        self.send(
            self.request(Method::POST, &self.documents_path(collection_id))
                .json(&body),
        )
        .await
    }

    async fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<()> {
        let path = format!("{}/{}", self.documents_path(collection_id), document_id);
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    async fn list_files(&self, bucket_id: &str) -> Result<Vec<StoredFile>> {
        self.list_all(&self.files_path(bucket_id), &[]).await
    }

    async fn create_file(
        &self,
        bucket_id: &str,
        file_id: &str,
        upload: FileUpload,
    ) -> Result<StoredFile> {
        let mime = part_mime(&upload.content_type).to_string();
        let part = Part::bytes(upload.bytes)
            .file_name(upload.name)
            .mime_str(&mime)?;
        let form = Form::new()
            .text("fileId", file_id.to_string())
            .part("file", part);

        self.send(
            self.request(Method::POST, &self.files_path(bucket_id))
                .multipart(form),
        )
        .await
    }

    async fn delete_file(&self, bucket_id: &str, file_id: &str) -> Result<()> {
        let path = format!("{}/{}", self.files_path(bucket_id), file_id);
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    fn file_view_url(&self, bucket_id: &str, file_id: &str) -> String {
        self.config.file_view_url(bucket_id, file_id)
    }

    async fn create_account(
        &self,
        user_id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account> {
        let body = json!({
            "userId": user_id,
            "email": email,
            "password": password,
            "name": name,
        });
        self.send(self.request(Method::POST, "account").json(&body))
            .await
    }

    async fn create_email_password_session(&self, email: &str, password: &str) -> Result<Session> {
        let body = json!({
            "email": email,
            "password": password,
        });
        self.send(
            self.request(Method::POST, "account/sessions/email")
                .json(&body),
        )
        .await
    }

    async fn get_account(&self) -> Result<Account> {
        self.send(self.request(Method::GET, "account")).await
    }

    fn avatar_initials_url(&self, name: &str) -> String {
        self.config.avatar_initials_url(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> AppwriteBackend {
        let config = AppwriteConfig::new("https://cloud.appwrite.io/v1/", "fastfood")
            .unwrap()
            .with_api_key("key");
        AppwriteBackend::new(Arc::new(config)).unwrap()
    }

    #[test]
    fn test_paths() {
        let b = backend();
        assert_eq!(
            b.url(&b.documents_path("menu")),
            format!(
                "https://cloud.appwrite.io/v1/databases/{}/collections/menu/documents",
                b.config().database_id
            )
        );
        assert_eq!(
            b.url(&b.files_path("images")),
            "https://cloud.appwrite.io/v1/storage/buckets/images/files"
        );
        assert_eq!(b.url("/account"), "https://cloud.appwrite.io/v1/account");
    }

    #[test]
    fn test_request_headers() {
        let b = backend();
        let req = b.request(Method::GET, "account").build().unwrap();
        assert_eq!(req.headers()["X-Appwrite-Project"], "fastfood");
        assert_eq!(req.headers()["X-Appwrite-Key"], "key");
    }

    #[test]
    fn test_page_envelopes() {
        let docs: Page<Document> = serde_json::from_value(serde_json::json!({
            "total": 2,
            "documents": [{"$id": "a"}, {"$id": "b"}],
        }))
        .unwrap();
        assert_eq!(docs.total, 2);
        assert_eq!(docs.items[1].id, "b");

        let files: Page<StoredFile> = serde_json::from_value(serde_json::json!({
            "total": 1,
            "files": [{"$id": "f", "bucketId": "images", "name": "a.jpg"}],
        }))
        .unwrap();
        assert_eq!(files.items[0].name, "a.jpg");
    }

    #[test]
    fn test_error_body() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"message":"Document with the requested ID could not be found.","code":404,"type":"document_not_found","version":"1.6.0"}"#,
        )
        .unwrap();
        assert_eq!(body.kind, "document_not_found");
    }

    #[test]
    fn test_part_mime_fallback() {
        assert_eq!(part_mime("image/png"), "image/png");
        assert_eq!(part_mime("not a mime"), "application/octet-stream");
    }
}
