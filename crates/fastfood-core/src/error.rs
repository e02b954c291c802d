//! Error types for the fastfood data layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which kind of record a dangling name reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Category,
    Customisation,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category => write!(f, "category"),
            Self::Customisation => write!(f, "customisation"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// A backend call was rejected, or never reached the server (`status: None`).
    #[error("Remote error ({}): {kind}: {message}", status_label(.status))]
    Remote {
        status: Option<u16>,
        kind: String,
        message: String,
    },

    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Unresolved {kind} reference '{reference}' in menu item '{item}'")]
    UnresolvedReference {
        item: String,
        reference: String,
        kind: ReferenceKind,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a remote error from a transport-level failure.
    pub fn transport(err: impl fmt::Display) -> Self {
        Self::Remote {
            status: None,
            kind: "transport".into(),
            message: err.to_string(),
        }
    }

    /// Whether re-running the same operation may succeed.
    ///
    /// Network hiccups, throttling and server-side failures are retryable;
    /// validation rejections and data-shape problems are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Remote { status: None, .. } => true,
            Self::Remote {
                status: Some(code), ..
            } => *code == 408 || *code == 429 || *code >= 500,
            Self::Fetch { .. } => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Remote {
                status: Some(status.as_u16()),
                kind: "http".into(),
                message: err.to_string(),
            },
            None => Self::transport(err),
        }
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "transport".into(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
