//! Operations the mobile app performs against the backend once the data
//! is seeded: sign-up, sign-in, current user lookup and menu browsing.

use std::sync::Arc;

use fastfood_backend::Backend;
use fastfood_core::AppwriteConfig;

pub mod auth;
pub mod menu;
pub mod types;

pub use types::*;

/// Handle over one backend connection. Cheap to clone.
#[derive(Clone)]
pub struct Api {
    backend: Arc<dyn Backend>,
    config: Arc<AppwriteConfig>,
}

impl Api {
    pub fn new(backend: Arc<dyn Backend>, config: Arc<AppwriteConfig>) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &AppwriteConfig {
        &self.config
    }
}
