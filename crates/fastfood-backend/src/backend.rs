//! The backend service trait.

use async_trait::async_trait;
use fastfood_core::Result;
use serde_json::Value;

use crate::query::Query;
use crate::types::{Account, Document, FileUpload, Session, StoredFile};

/// Operations consumed from the hosted backend.
///
/// Collection and bucket ids are passed explicitly; the database is fixed
/// by the implementation's configuration.
#[async_trait]
pub trait Backend: Send + Sync {
    /// All documents in a collection matching `queries` (all of them when empty).
    async fn list_documents(&self, collection_id: &str, queries: &[Query]) -> Result<Vec<Document>>;

    /// Create a document with the given id. `data` must be a JSON object.
    async fn create_document(
        &self,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Document>;

    async fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<()>;

    async fn list_files(&self, bucket_id: &str) -> Result<Vec<StoredFile>>;

    async fn create_file(
        &self,
        bucket_id: &str,
        file_id: &str,
        upload: FileUpload,
    ) -> Result<StoredFile>;

    async fn delete_file(&self, bucket_id: &str, file_id: &str) -> Result<()>;

    /// Durable, servable URL for a stored file.
    fn file_view_url(&self, bucket_id: &str, file_id: &str) -> String;

    async fn create_account(
        &self,
        user_id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account>;

    async fn create_email_password_session(&self, email: &str, password: &str) -> Result<Session>;

    /// Account of the current session.
    async fn get_account(&self) -> Result<Account>;

    fn avatar_initials_url(&self, name: &str) -> String;
}
