//! Name → id maps built during one seeding run.
//!
//! Each map type can only be produced by the stage that creates its
//! records, so a later stage taking `&CategoryIds` cannot run before the
//! categories exist. Outside this crate none of them can be constructed:
//!
//! ```compile_fail
//! let forged = fastfood_seed::ids::CategoryIds::default();
//! ```
//!
//! ```compile_fail
//! let forged = fastfood_seed::ids::Cleared { documents: 0, files: 0 };
//! ```
//!
//! The maps live for a single run and are never reused.

use std::collections::HashMap;

/// Name → generated document id.
#[derive(Debug, Default)]
pub struct IdMap {
    ids: HashMap<String, String>,
}

impl IdMap {
    pub(crate) fn insert(&mut self, name: &str, id: &str) {
        self.ids.insert(name.to_string(), id.to_string());
    }

    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.ids.get(name).map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}

macro_rules! stage_ids {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug)]
            pub struct $name(pub(crate) IdMap);

            impl std::ops::Deref for $name {
                type Target = IdMap;

                fn deref(&self) -> &IdMap {
                    &self.0
                }
            }
        )*
    };
}

stage_ids! {
    /// Output of the categories stage.
    CategoryIds;
    /// Output of the customisations stage.
    CustomisationIds;
    /// Output of the menu stage.
    MenuIds;
}

/// Proof that the clear stage finished, with what it removed.
#[derive(Debug)]
pub struct Cleared {
    pub(crate) documents: usize,
    pub(crate) files: usize,
}

impl Cleared {
    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn files(&self) -> usize {
        self.files
    }
}
