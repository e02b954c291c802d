//! Seed dataset: categories, customisations and menu items.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use fastfood_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::types::SeedWarning;

/// Dataset compiled into the crate.
const BUNDLED: &str = include_str!("../data/seed.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub description: String,
}

/// Kind of customisation. Unknown kinds are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CustomisationKind {
    Topping,
    Side,
    Size,
    Crust,
    Other(String),
}

impl From<String> for CustomisationKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "topping" => Self::Topping,
            "side" => Self::Side,
            "size" => Self::Size,
            "crust" => Self::Crust,
            _ => Self::Other(s),
        }
    }
}

impl From<CustomisationKind> for String {
    fn from(kind: CustomisationKind) -> Self {
        match kind {
            CustomisationKind::Topping => "topping".into(),
            CustomisationKind::Side => "side".into(),
            CustomisationKind::Size => "size".into(),
            CustomisationKind::Crust => "crust".into(),
            CustomisationKind::Other(s) => s,
        }
    }
}

impl fmt::Display for CustomisationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topping => write!(f, "topping"),
            Self::Side => write!(f, "side"),
            Self::Size => write!(f, "size"),
            Self::Crust => write!(f, "crust"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customisation {
    pub name: String,
    pub price: f64,
    #[serde(rename = "type")]
    pub kind: CustomisationKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub description: String,
    /// Source image; replaced by a bucket URL when seeded.
    pub image_url: String,
    pub price: f64,
    pub rating: f64,
    pub calories: u32,
    pub protein: u32,
    pub category_name: String,
    /// Customisation names, in display order.
    #[serde(default)]
    pub customisations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub customisations: Vec<Customisation>,
    #[serde(default)]
    pub menu: Vec<MenuItem>,
}

impl SeedData {
    /// The dataset shipped with the crate.
    pub fn bundled() -> Result<Self> {
        Ok(serde_json::from_str(BUNDLED)?)
    }

    /// Load a dataset from a JSON file with the same shape as the bundled one.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            Error::Config(format!("invalid dataset {}: {}", path.display(), e))
        })
    }

    /// Every menu-item reference that does not name a record in this dataset,
    /// in the order the seeder would meet them.
    pub fn unresolved_references(&self) -> Vec<SeedWarning> {
        let categories: HashSet<&str> = self.categories.iter().map(|c| c.name.as_str()).collect();
        let customisations: HashSet<&str> =
            self.customisations.iter().map(|c| c.name.as_str()).collect();

        let mut warnings = Vec::new();
        for item in &self.menu {
            if !categories.contains(item.category_name.as_str()) {
                warnings.push(SeedWarning::UnresolvedCategory {
                    menu_item: item.name.clone(),
                    category: item.category_name.clone(),
                });
            }
            for name in &item.customisations {
                if !customisations.contains(name.as_str()) {
                    warnings.push(SeedWarning::UnresolvedCustomisation {
                        menu_item: item.name.clone(),
                        customisation: name.clone(),
                    });
                }
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bundled_dataset_is_consistent() {
        let data = SeedData::bundled().unwrap();
        assert!(!data.categories.is_empty());
        assert!(!data.customisations.is_empty());
        assert!(!data.menu.is_empty());
        assert!(data.unresolved_references().is_empty());
        assert!(data.menu.iter().all(|m| m.image_url.starts_with("https://")));
    }

    #[test]
    fn test_customisation_kind_serde() {
        let c: Customisation =
            serde_json::from_str(r#"{"name":"Cheese","price":1.0,"type":"topping"}"#).unwrap();
        assert_eq!(c.kind, CustomisationKind::Topping);

        let c: Customisation =
            serde_json::from_str(r#"{"name":"Spicy","price":0.5,"type":"sauce"}"#).unwrap();
        assert_eq!(c.kind, CustomisationKind::Other("sauce".into()));
        assert_eq!(
            serde_json::to_value(&c).unwrap(),
            serde_json::json!({"name": "Spicy", "price": 0.5, "type": "sauce"})
        );
    }

    #[test]
    fn test_unresolved_references() {
        let data = SeedData {
            categories: vec![Category {
                name: "Burgers".into(),
                description: String::new(),
            }],
            customisations: vec![Customisation {
                name: "Cheese".into(),
                price: 1.0,
                kind: CustomisationKind::Topping,
            }],
            menu: vec![MenuItem {
                name: "Lemonade".into(),
                description: String::new(),
                image_url: "https://example.com/l.jpg".into(),
                price: 2.0,
                rating: 4.0,
                calories: 120,
                protein: 0,
                category_name: "Drinks".into(),
                customisations: vec!["Cheese".into(), "Ice".into()],
            }],
        };

        let warnings = data.unresolved_references();
        assert_eq!(
            warnings,
            vec![
                SeedWarning::UnresolvedCategory {
                    menu_item: "Lemonade".into(),
                    category: "Drinks".into(),
                },
                SeedWarning::UnresolvedCustomisation {
                    menu_item: "Lemonade".into(),
                    customisation: "Ice".into(),
                },
            ]
        );
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"categories":[{{"name":"Wraps","description":"Rolled"}}]}}"#
        )
        .unwrap();

        let data = SeedData::from_path(file.path()).unwrap();
        assert_eq!(data.categories.len(), 1);
        assert!(data.menu.is_empty());
    }

    #[test]
    fn test_from_path_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            SeedData::from_path(file.path()),
            Err(Error::Config(_))
        ));

        let missing = SeedData::from_path(Path::new("/nonexistent/seed.json"));
        assert!(matches!(missing, Err(Error::Io(_))));
    }
}
