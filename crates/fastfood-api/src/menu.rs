//! Menu browsing.

use fastfood_backend::{Document, Query};
use fastfood_core::Result;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{CategoryDocument, GetMenuParams, MenuDocument};
use crate::Api;

impl Api {
    /// Menu items, optionally filtered by category id and name search.
    pub async fn get_menu(&self, params: GetMenuParams) -> Result<Vec<MenuDocument>> {
        let mut queries = Vec::new();
        if let Some(category) = params.category.filter(|c| !c.is_empty()) {
            queries.push(Query::equal("categories", category));
        }
        if let Some(text) = params.query.filter(|q| !q.trim().is_empty()) {
            queries.push(Query::search("name", text));
        }
        if let Some(limit) = params.limit {
            queries.push(Query::limit(limit));
        }

        let docs = self
            .backend
            .list_documents(&self.config.menu_collection_id, &queries)
            .await?;
        debug!("Menu query returned {} items", docs.len());
        parse_all(&docs)
    }

    pub async fn get_categories(&self) -> Result<Vec<CategoryDocument>> {
        let docs = self
            .backend
            .list_documents(&self.config.categories_collection_id, &[])
            .await?;
        parse_all(&docs)
    }
}

fn parse_all<T: DeserializeOwned>(docs: &[Document]) -> Result<Vec<T>> {
    docs.iter().map(Document::parse).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fastfood_backend::{Backend, MemoryBackend};
    use fastfood_core::AppwriteConfig;
    use serde_json::json;

    use super::*;

    async fn seeded() -> Api {
        let config = Arc::new(AppwriteConfig::new("https://cloud.example.com/v1", "fastfood").unwrap());
        let backend = Arc::new(MemoryBackend::new(config.clone()));

        for (id, name) in [("burgers", "Burgers"), ("pizzas", "Pizzas")] {
            backend
                .create_document(
                    &config.categories_collection_id,
                    id,
                    json!({"name": name, "description": ""}),
                )
                .await
                .unwrap();
        }
        let items = [
            ("m1", "Classic Cheeseburger", Some("burgers")),
            ("m2", "Double Patty Burger", Some("burgers")),
            ("m3", "Pepperoni Pizza", Some("pizzas")),
            ("m4", "Lemonade", None),
        ];
        for (id, name, category) in items {
            let mut data = json!({
                "name": name,
                "description": "",
                "image_url": "https://cloud.example.com/v1/storage/buckets/b/files/f/view",
                "price": 10.5,
                "rating": 4.5,
                "calories": 500,
                "protein": 20,
            });
            if let Some(category) = category {
                data["categories"] = json!(category);
            }
            backend
                .create_document(&config.menu_collection_id, id, data)
                .await
                .unwrap();
        }

        Api::new(backend, config)
    }

    fn names(items: &[MenuDocument]) -> Vec<&str> {
        items.iter().map(|m| m.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_unfiltered_menu() {
        let api = seeded().await;
        let menu = api.get_menu(GetMenuParams::default()).await.unwrap();
        assert_eq!(menu.len(), 4);
        assert_eq!(menu[3].categories, None);
    }

    #[tokio::test]
    async fn test_menu_by_category() {
        let api = seeded().await;
        let menu = api
            .get_menu(GetMenuParams {
                category: Some("burgers".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(names(&menu), vec!["Classic Cheeseburger", "Double Patty Burger"]);
    }

    #[tokio::test]
    async fn test_menu_search_and_limit() {
        let api = seeded().await;
        let menu = api
            .get_menu(GetMenuParams {
                query: Some("pizza".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(names(&menu), vec!["Pepperoni Pizza"]);

        let menu = api
            .get_menu(GetMenuParams {
                category: Some("burgers".into()),
                query: Some("double".into()),
                limit: Some(5),
            })
            .await
            .unwrap();
        assert_eq!(names(&menu), vec!["Double Patty Burger"]);

        let menu = api
            .get_menu(GetMenuParams {
                limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(menu.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_filters_ignored() {
        let api = seeded().await;
        let menu = api
            .get_menu(GetMenuParams {
                category: Some(String::new()),
                query: Some("  ".into()),
                limit: None,
            })
            .await
            .unwrap();
        assert_eq!(menu.len(), 4);
    }

    #[tokio::test]
    async fn test_expanded_category_relation() {
        let config = Arc::new(AppwriteConfig::new("https://cloud.example.com/v1", "fastfood").unwrap());
        let backend = Arc::new(MemoryBackend::new(config.clone()));
        backend
            .create_document(
                &config.menu_collection_id,
                "m1",
                json!({
                    "name": "Pepperoni Pizza",
                    "image_url": "https://cloud.example.com/v1/storage/buckets/b/files/f/view",
                    "price": 30.99,
                    "categories": {"$id": "pizzas", "name": "Pizzas", "description": ""},
                }),
            )
            .await
            .unwrap();

        let api = Api::new(backend, config);
        let menu = api.get_menu(GetMenuParams::default()).await.unwrap();
        assert_eq!(menu.len(), 1);
        assert_eq!(menu[0].categories.as_deref(), Some("pizzas"));
    }

    #[tokio::test]
    async fn test_categories() {
        let api = seeded().await;
        let categories = api.get_categories().await.unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].name, "Burgers");
        assert_eq!(categories[0].id, "burgers");
    }
}
