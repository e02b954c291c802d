//! Fastfood Core — backend configuration and the shared error taxonomy.

pub mod config;
pub mod error;

pub use config::{AppwriteConfig, MissingReferencePolicy, SeedConfig};
pub use error::{Error, ReferenceKind, Result};
