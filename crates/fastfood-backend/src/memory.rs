//! In-process [`Backend`] used by tests and dry runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fastfood_core::{AppwriteConfig, Error, Result};
use parking_lot::RwLock;
use serde_json::Value;

use crate::backend::Backend;
use crate::id::unique_id;
use crate::query::{Query, QueryMethod};
use crate::types::{Account, Document, FileUpload, Session, StoredFile};

const MIN_PASSWORD_LEN: usize = 8;

struct StoredAccount {
    account: Account,
    password: String,
}

#[derive(Default)]
struct MemoryState {
    /// Documents per collection, in creation order.
    documents: HashMap<String, Vec<Document>>,
    /// Files per bucket, in creation order.
    files: HashMap<String, Vec<(StoredFile, Vec<u8>)>>,
    accounts: Vec<StoredAccount>,
    session: Option<Session>,
}

/// A complete backend held in memory. Behaves like the remote service for
/// the operations this workspace uses, including error kinds.
pub struct MemoryBackend {
    config: Arc<AppwriteConfig>,
    state: RwLock<MemoryState>,
}

fn remote(status: u16, kind: &str, message: impl Into<String>) -> Error {
    Error::Remote {
        status: Some(status),
        kind: kind.into(),
        message: message.into(),
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl MemoryBackend {
    pub fn new(config: Arc<AppwriteConfig>) -> Self {
        Self {
            config,
            state: RwLock::new(MemoryState::default()),
        }
    }

    /// Snapshot of a collection's documents.
    pub fn documents(&self, collection_id: &str) -> Vec<Document> {
        self.state
            .read()
            .documents
            .get(collection_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Snapshot of a bucket's file metadata.
    pub fn files(&self, bucket_id: &str) -> Vec<StoredFile> {
        self.state
            .read()
            .files
            .get(bucket_id)
            .map(|files| files.iter().map(|(meta, _)| meta.clone()).collect())
            .unwrap_or_default()
    }

    pub fn file_bytes(&self, bucket_id: &str, file_id: &str) -> Option<Vec<u8>> {
        self.state
            .read()
            .files
            .get(bucket_id)?
            .iter()
            .find(|(meta, _)| meta.id == file_id)
            .map(|(_, bytes)| bytes.clone())
    }

    /// Drop the current session.
    pub fn sign_out(&self) {
        self.state.write().session = None;
    }
}

fn field_matches(field: Option<&Value>, expected: &Value) -> bool {
    match field {
        Some(Value::Array(items)) => items.contains(expected),
        Some(value) => value == expected,
        None => expected.is_null(),
    }
}

fn search_matches(field: Option<&Value>, text: &str) -> bool {
    let haystack = match field.and_then(|v| v.as_str()) {
        Some(s) => s.to_lowercase(),
        None => return false,
    };
    let mut terms = text.split_whitespace().map(str::to_lowercase).peekable();
    if terms.peek().is_none() {
        return true;
    }
    terms.any(|term| haystack.contains(&term))
}

fn attribute_value<'a>(doc: &'a Document, attribute: &str, id: &'a Value) -> Option<&'a Value> {
    if attribute == "$id" {
        Some(id)
    } else {
        doc.get(attribute)
    }
}

fn query_matches(doc: &Document, query: &Query) -> bool {
    let attribute = match &query.attribute {
        Some(a) => a.as_str(),
        None => return true,
    };
    let id = Value::String(doc.id.clone());
    let field = attribute_value(doc, attribute, &id);
    match query.method {
        QueryMethod::Equal => query.values.iter().any(|v| field_matches(field, v)),
        QueryMethod::Search => query
            .values
            .first()
            .and_then(|v| v.as_str())
            .is_some_and(|text| search_matches(field, text)),
        QueryMethod::Limit | QueryMethod::CursorAfter => true,
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list_documents(&self, collection_id: &str, queries: &[Query]) -> Result<Vec<Document>> {
        let state = self.state.read();
        let docs = state
            .documents
            .get(collection_id)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut start = 0;
        if let Some(cursor) = queries.iter().find_map(|q| q.cursor_value()) {
            start = docs
                .iter()
                .position(|d| d.id == cursor)
                .map(|i| i + 1)
                .ok_or_else(|| remote(400, "general_cursor_not_found", cursor))?;
        }
        let limit = queries
            .iter()
            .find_map(|q| q.limit_value())
            .unwrap_or(usize::MAX);

        Ok(docs[start..]
            .iter()
            .filter(|d| queries.iter().all(|q| query_matches(d, q)))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn create_document(
        &self,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Document> {
        let fields = match data {
            Value::Object(map) => map,
            _ => {
                return Err(remote(
                    400,
                    "document_invalid_structure",
                    "document data must be an object",
                ))
            }
        };

        let mut state = self.state.write();
        let docs = state.documents.entry(collection_id.to_string()).or_default();
        if docs.iter().any(|d| d.id == document_id) {
            return Err(remote(
                409,
                "document_already_exists",
                format!("document {} already exists", document_id),
            ));
        }

        let timestamp = now();
        let doc = Document {
            id: document_id.to_string(),
            collection_id: Some(collection_id.to_string()),
            created_at: Some(timestamp.clone()),
            updated_at: Some(timestamp),
            fields,
        };
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<()> {
        let mut state = self.state.write();
        let docs = state.documents.entry(collection_id.to_string()).or_default();
        let before = docs.len();
        docs.retain(|d| d.id != document_id);
        if docs.len() == before {
            return Err(remote(
                404,
                "document_not_found",
                format!("document {} not found", document_id),
            ));
        }
        Ok(())
    }

    async fn list_files(&self, bucket_id: &str) -> Result<Vec<StoredFile>> {
        Ok(self.files(bucket_id))
    }

    async fn create_file(
        &self,
        bucket_id: &str,
        file_id: &str,
        upload: FileUpload,
    ) -> Result<StoredFile> {
        let mut state = self.state.write();
        let files = state.files.entry(bucket_id.to_string()).or_default();
        if files.iter().any(|(meta, _)| meta.id == file_id) {
            return Err(remote(
                409,
                "storage_file_already_exists",
                format!("file {} already exists", file_id),
            ));
        }

        let meta = StoredFile {
            id: file_id.to_string(),
            bucket_id: bucket_id.to_string(),
            name: upload.name,
            mime_type: upload.content_type,
            size: upload.bytes.len() as u64,
            created_at: Some(now()),
        };
        files.push((meta.clone(), upload.bytes));
        Ok(meta)
    }

    async fn delete_file(&self, bucket_id: &str, file_id: &str) -> Result<()> {
        let mut state = self.state.write();
        let files = state.files.entry(bucket_id.to_string()).or_default();
        let before = files.len();
        files.retain(|(meta, _)| meta.id != file_id);
        if files.len() == before {
            return Err(remote(
                404,
                "storage_file_not_found",
                format!("file {} not found", file_id),
            ));
        }
        Ok(())
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
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(remote(
                400,
                "general_argument_invalid",
                format!("password must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }

        let mut state = self.state.write();
        if state
            .accounts
            .iter()
            .any(|a| a.account.id == user_id || a.account.email.eq_ignore_ascii_case(email))
        {
            return Err(remote(409, "user_already_exists", "account already exists"));
        }

        let account = Account {
            id: user_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
        };
        state.accounts.push(StoredAccount {
            account: account.clone(),
            password: password.to_string(),
        });
        Ok(account)
    }

    async fn create_email_password_session(&self, email: &str, password: &str) -> Result<Session> {
        let mut state = self.state.write();
        let user_id = state
            .accounts
            .iter()
            .find(|a| a.account.email.eq_ignore_ascii_case(email) && a.password == password)
            .map(|a| a.account.id.clone())
            .ok_or_else(|| {
                Error::Unauthorized("Invalid credentials. Please check the email and password.".into())
            })?;

        let session = Session {
            id: unique_id(),
            user_id,
            expire: None,
        };
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn get_account(&self) -> Result<Account> {
        let state = self.state.read();
        let session = state
            .session
            .as_ref()
            .ok_or_else(|| Error::Unauthorized("no active session".into()))?;
        state
            .accounts
            .iter()
            .find(|a| a.account.id == session.user_id)
            .map(|a| a.account.clone())
            .ok_or_else(|| Error::Unauthorized("session account no longer exists".into()))
    }

    fn avatar_initials_url(&self, name: &str) -> String {
        self.config.avatar_initials_url(name)
    }
}
