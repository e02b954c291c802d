//! Backend and seeding configuration.
//!
//! Built once at process start and passed by reference into the backend
//! client, the seeder and the API layer.

use std::fmt;
use std::str::FromStr;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

pub const DEFAULT_PLATFORM: &str = "com.company.fastfood";
pub const DEFAULT_DATABASE_ID: &str = "689ca88b002b600c0861";
pub const DEFAULT_BUCKET_ID: &str = "68a1d70000064fa16155";
pub const DEFAULT_USER_COLLECTION_ID: &str = "689ca8ce001a5c48a3d4";
pub const DEFAULT_CATEGORIES_COLLECTION_ID: &str = "68a1cff9001da1006a05";
pub const DEFAULT_MENU_COLLECTION_ID: &str = "68a1d0d5001f506963e2";
pub const DEFAULT_CUSTOMISATIONS_COLLECTION_ID: &str = "68a1d558000750ac556b";
pub const DEFAULT_MENU_CUSTOMISATIONS_COLLECTION_ID: &str = "68a1d5fe000c302e0185";

pub const DEFAULT_CLEAR_CONCURRENCY: usize = 16;

/// Connection settings and resource identifiers for the hosted backend.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppwriteConfig {
    /// API root, e.g. `https://cloud.appwrite.io/v1` (no trailing slash).
    pub endpoint: String,
    pub project_id: String,
    pub platform: String,
    /// Server key; seeding needs one, end-user flows use a session instead.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    pub database_id: String,
    pub bucket_id: String,
    pub user_collection_id: String,
    pub categories_collection_id: String,
    pub menu_collection_id: String,
    pub customisations_collection_id: String,
    pub menu_customisations_collection_id: String,
}

impl fmt::Debug for AppwriteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppwriteConfig")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("platform", &self.platform)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("database_id", &self.database_id)
            .field("bucket_id", &self.bucket_id)
            .finish_non_exhaustive()
    }
}

impl AppwriteConfig {
    /// Create a configuration with the default resource identifiers.
    pub fn new(endpoint: impl Into<String>, project_id: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        let project_id = project_id.into();

        if project_id.trim().is_empty() {
            return Err(Error::Config("project id must not be empty".into()));
        }
        Url::parse(&endpoint)
            .map_err(|e| Error::Config(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        Ok(Self {
            endpoint,
            project_id,
            platform: DEFAULT_PLATFORM.into(),
            api_key: None,
            database_id: DEFAULT_DATABASE_ID.into(),
            bucket_id: DEFAULT_BUCKET_ID.into(),
            user_collection_id: DEFAULT_USER_COLLECTION_ID.into(),
            categories_collection_id: DEFAULT_CATEGORIES_COLLECTION_ID.into(),
            menu_collection_id: DEFAULT_MENU_COLLECTION_ID.into(),
            customisations_collection_id: DEFAULT_CUSTOMISATIONS_COLLECTION_ID.into(),
            menu_customisations_collection_id: DEFAULT_MENU_CUSTOMISATIONS_COLLECTION_ID.into(),
        })
    }

    /// Set the server API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Create configuration from environment and defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |primary: &str, fallback: &str| {
            lookup(primary)
                .or_else(|| lookup(fallback))
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{} is not set", primary)))
        };

        let endpoint = required("APPWRITE_ENDPOINT", "EXPO_PUBLIC_APPWRITE_ENDPOINT")?;
        let project_id = required("APPWRITE_PROJECT_ID", "EXPO_PUBLIC_APPWRITE_PROJECT_ID")?;

        let mut config = Self::new(endpoint, project_id)?;
        config.api_key = lookup("APPWRITE_API_KEY").filter(|k| !k.is_empty());

        let overrides: [(&str, &mut String); 8] = [
            ("APPWRITE_PLATFORM", &mut config.platform),
            ("APPWRITE_DATABASE_ID", &mut config.database_id),
            ("APPWRITE_BUCKET_ID", &mut config.bucket_id),
            ("APPWRITE_USER_COLLECTION_ID", &mut config.user_collection_id),
            (
                "APPWRITE_CATEGORIES_COLLECTION_ID",
                &mut config.categories_collection_id,
            ),
            ("APPWRITE_MENU_COLLECTION_ID", &mut config.menu_collection_id),
            (
                "APPWRITE_CUSTOMISATIONS_COLLECTION_ID",
                &mut config.customisations_collection_id,
            ),
            (
                "APPWRITE_MENU_CUSTOMISATIONS_COLLECTION_ID",
                &mut config.menu_customisations_collection_id,
            ),
        ];
        for (key, slot) in overrides {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *slot = value;
            }
        }

        info!(
            "Backend config: endpoint={}, project={}, database={}",
            config.endpoint, config.project_id, config.database_id
        );
        Ok(config)
    }

    /// Servable URL of a stored file.
    pub fn file_view_url(&self, bucket_id: &str, file_id: &str) -> String {
        let base = format!(
            "{}/storage/buckets/{}/files/{}/view",
            self.endpoint, bucket_id, file_id
        );
        with_params(&base, &[("project", self.project_id.as_str())])
    }

    /// Generated initials avatar for a display name.
    pub fn avatar_initials_url(&self, name: &str) -> String {
        let base = format!("{}/avatars/initials", self.endpoint);
        with_params(&base, &[("name", name), ("project", self.project_id.as_str())])
    }
}

fn with_params(base: &str, params: &[(&str, &str)]) -> String {
    match Url::parse_with_params(base, params) {
        Ok(url) => url.into(),
        Err(e) => {
            warn!("Failed to build URL from {}: {}", base, e);
            let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            format!("{}?{}", base, query.join("&"))
        }
    }
}

/// What to do when a menu item names a category or customisation that is
/// not part of the dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingReferencePolicy {
    /// Write the record without the reference and report a warning.
    #[default]
    Proceed,
    /// Leave the menu item (or the link) out and report a warning.
    Skip,
    /// Refuse to seed; checked before anything is cleared.
    Abort,
}

impl FromStr for MissingReferencePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proceed" => Ok(Self::Proceed),
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(Error::Config(format!(
                "unknown missing-reference policy '{}' (expected proceed, skip or abort)",
                other
            ))),
        }
    }
}

impl fmt::Display for MissingReferencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proceed => write!(f, "proceed"),
            Self::Skip => write!(f, "skip"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

/// Seeding behaviour knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Upper bound on in-flight deletes while clearing one collection or the bucket.
    pub clear_concurrency: usize,
    pub missing_references: MissingReferencePolicy,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            clear_concurrency: DEFAULT_CLEAR_CONCURRENCY,
            missing_references: MissingReferencePolicy::default(),
        }
    }
}

impl SeedConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup("FASTFOOD_CLEAR_CONCURRENCY") {
            let n: usize = raw.trim().parse().map_err(|_| {
                Error::Config(format!("FASTFOOD_CLEAR_CONCURRENCY must be a number, got '{}'", raw))
            })?;
            config.clear_concurrency = n.max(1);
        }
        if let Some(raw) = lookup("FASTFOOD_MISSING_REFERENCES") {
            config.missing_references = raw.parse()?;
        }

        Ok(config)
    }
}
