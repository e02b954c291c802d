//! Fastfood Backend — the remote document/file/account service boundary.
//!
//! The `Backend` trait mirrors the operations the app consumes from the
//! hosted platform. Implementations:
//! - `AppwriteBackend`: REST client over `reqwest`
//! - `MemoryBackend`: in-process store for tests and dry runs
//!
//! `ImageSource` abstracts the plain HTTP fetch of external images.

pub mod appwrite;
pub mod backend;
pub mod id;
pub mod image;
pub mod memory;
pub mod query;
pub mod types;

pub use appwrite::AppwriteBackend;
pub use backend::Backend;
pub use id::unique_id;
pub use image::{
    resolve_content_type, FetchedImage, HttpImageSource, ImageSource, PlaceholderImageSource,
};
pub use memory::MemoryBackend;
pub use query::{Query, QueryMethod};
pub use types::*;
