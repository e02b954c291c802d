//! Seeding: wipe the menu collections and the image bucket, then rebuild
//! them from a static dataset.
//!
//! Stages run strictly in order: clear, categories, customisations, menu
//! items (each with its image re-upload), and the menu/customisation
//! links. Each stage consumes the id map built by the one before it.

pub mod dataset;
pub mod ids;
pub mod seeder;
pub mod types;
pub mod upload;

pub use dataset::{Category, Customisation, CustomisationKind, MenuItem, SeedData};
pub use seeder::Seeder;
pub use types::*;
