//! Request parameters and typed document views.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserParams {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInParams {
    pub email: String,
    pub password: String,
}

/// Menu filters. Absent fields do not filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetMenuParams {
    /// Category document id.
    pub category: Option<String>,
    /// Free text matched against item names.
    pub query: Option<String>,
    pub limit: Option<usize>,
}

/// A document in the user collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "accountId")]
    pub account_id: String,
    pub email: String,
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDocument {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuDocument {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub image_url: String,
    pub price: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub calories: u32,
    #[serde(default)]
    pub protein: u32,
    /// Category document id; absent when the item was seeded without one.
    #[serde(default, deserialize_with = "relation_id")]
    pub categories: Option<String>,
}

/// One side of a relationship attribute as returned by the backend.
#[derive(Deserialize)]
#[serde(untagged)]
enum RelatedRef {
    Id(String),
    Expanded {
        #[serde(rename = "$id")]
        id: String,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Related {
    One(RelatedRef),
    Many(Vec<RelatedRef>),
}

impl RelatedRef {
    fn into_id(self) -> String {
        match self {
            Self::Id(id) | Self::Expanded { id } => id,
        }
    }
}

/// Relationship attributes come back either as the related id or as the
/// expanded document; lists keep their first entry.
fn relation_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let related = Option::<Related>::deserialize(deserializer)?;
    Ok(match related {
        Some(Related::One(one)) => Some(one.into_id()),
        Some(Related::Many(many)) => many.into_iter().next().map(RelatedRef::into_id),
        None => None,
    })
}
