//! Seeding types.

use std::fmt;

use fastfood_core::{Error, ReferenceKind};
use serde::Serialize;

/// Seeding stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedStage {
    /// Reference check before anything is touched (abort policy only).
    Validate,
    Clear,
    Categories,
    Customisations,
    Menu,
    Links,
}

impl fmt::Display for SeedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validate => write!(f, "validate"),
            Self::Clear => write!(f, "clear"),
            Self::Categories => write!(f, "categories"),
            Self::Customisations => write!(f, "customisations"),
            Self::Menu => write!(f, "menu"),
            Self::Links => write!(f, "links"),
        }
    }
}

/// A menu item named something the dataset does not define.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeedWarning {
    UnresolvedCategory { menu_item: String, category: String },
    UnresolvedCustomisation { menu_item: String, customisation: String },
}

impl SeedWarning {
    /// The error raised for this warning under the abort policy.
    pub fn into_error(self) -> Error {
        match self {
            Self::UnresolvedCategory {
                menu_item,
                category,
            } => Error::UnresolvedReference {
                item: menu_item,
                reference: category,
                kind: ReferenceKind::Category,
            },
            Self::UnresolvedCustomisation {
                menu_item,
                customisation,
            } => Error::UnresolvedReference {
                item: menu_item,
                reference: customisation,
                kind: ReferenceKind::Customisation,
            },
        }
    }
}

impl fmt::Display for SeedWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedCategory {
                menu_item,
                category,
            } => write!(f, "menu item '{}' names unknown category '{}'", menu_item, category),
            Self::UnresolvedCustomisation {
                menu_item,
                customisation,
            } => write!(
                f,
                "menu item '{}' names unknown customisation '{}'",
                menu_item, customisation
            ),
        }
    }
}

/// Result of a completed seeding run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedReport {
    #[serde(rename = "documentsCleared")]
    pub documents_cleared: usize,
    #[serde(rename = "filesCleared")]
    pub files_cleared: usize,
    pub categories: usize,
    pub customisations: usize,
    #[serde(rename = "menuItems")]
    pub menu_items: usize,
    #[serde(rename = "menuItemsSkipped")]
    pub menu_items_skipped: usize,
    pub links: usize,
    #[serde(rename = "imagesUploaded")]
    pub images_uploaded: usize,
    pub warnings: Vec<SeedWarning>,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
}

/// A seeding run that stopped. Records created before the failing stage
/// stay in place; re-running starts over from the clear stage.
#[derive(Debug, thiserror::Error)]
#[error("seeding failed in {stage} stage: {source}")]
pub struct SeedError {
    pub stage: SeedStage,
    #[source]
    pub source: Error,
}

impl SeedError {
    pub fn new(stage: SeedStage, source: Error) -> Self {
        Self { stage, source }
    }

    /// Tag an error with the stage it happened in, for `map_err`.
    pub fn at(stage: SeedStage) -> impl Fn(Error) -> Self {
        move |source| Self::new(stage, source)
    }

    pub fn is_retryable(&self) -> bool {
        self.source.is_retryable()
    }
}
