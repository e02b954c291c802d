//! Seed pipeline execution.

use std::time::Instant;

use fastfood_backend::{unique_id, Backend, ImageSource};
use fastfood_core::{AppwriteConfig, MissingReferencePolicy, Result, SeedConfig};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dataset::{Category, Customisation, MenuItem, SeedData};
use crate::ids::{CategoryIds, Cleared, CustomisationIds, IdMap, MenuIds};
use crate::types::{SeedError, SeedReport, SeedStage, SeedWarning};
use crate::upload::reupload_image;

/// Fields written for a menu item. `categories` is left out when the
/// category name did not resolve.
#[derive(Serialize)]
struct MenuFields<'a> {
    name: &'a str,
    description: &'a str,
    image_url: &'a str,
    price: f64,
    rating: f64,
    calories: u32,
    protein: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    categories: Option<&'a str>,
}

/// Fields written for a menu/customisation link.
#[derive(Serialize)]
struct LinkFields<'a> {
    menu: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    customisations: Option<&'a str>,
}

/// Rebuilds the menu collections and image bucket from a dataset.
///
/// Destructive: every run first deletes all documents in the four menu
/// collections and every file in the bucket. Any failure stops the run
/// where it is; nothing is rolled back.
pub struct Seeder<'a> {
    backend: &'a dyn Backend,
    images: &'a dyn ImageSource,
    config: &'a AppwriteConfig,
    seed_config: SeedConfig,
}

impl<'a> Seeder<'a> {
    pub fn new(
        backend: &'a dyn Backend,
        images: &'a dyn ImageSource,
        config: &'a AppwriteConfig,
    ) -> Self {
        Self {
            backend,
            images,
            config,
            seed_config: SeedConfig::default(),
        }
    }

    pub fn with_seed_config(mut self, seed_config: SeedConfig) -> Self {
        self.seed_config = seed_config;
        self
    }

    /// Run the whole pipeline.
    pub async fn seed(&self, data: &SeedData) -> std::result::Result<SeedReport, SeedError> {
        let start = Instant::now();
        let mut report = SeedReport::default();

        info!(
            "Starting seed: {} categories, {} customisations, {} menu items (missing references: {})",
            data.categories.len(),
            data.customisations.len(),
            data.menu.len(),
            self.seed_config.missing_references
        );

        if self.seed_config.missing_references == MissingReferencePolicy::Abort {
            if let Some(warning) = data.unresolved_references().into_iter().next() {
                return Err(SeedError::new(SeedStage::Validate, warning.into_error()));
            }
        }

        // Stage 1: wipe everything
        let cleared = self.clear().await?;
        report.documents_cleared = cleared.documents();
        report.files_cleared = cleared.files();

        // Stage 2: categories
        let categories = self
            .create_categories(&cleared, &data.categories)
            .await
            .map_err(SeedError::at(SeedStage::Categories))?;
        report.categories = data.categories.len();

        // Stage 3: customisations
        let customisations = self
            .create_customisations(&categories, &data.customisations)
            .await
            .map_err(SeedError::at(SeedStage::Customisations))?;
        report.customisations = data.customisations.len();

        // Stages 4 and 5: menu items, each followed by its links
        let menu = self
            .create_menu(&categories, &customisations, &data.menu, &mut report)
            .await?;

        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Seeding complete: categories={}, customisations={}, menu_items={} ({} distinct names), links={}, images={}, warnings={}, duration={}ms",
            report.categories,
            report.customisations,
            report.menu_items,
            menu.len(),
            report.links,
            report.images_uploaded,
            report.warnings.len(),
            report.duration_ms
        );

        Ok(report)
    }

    /// Delete every document in the four menu collections and every file
    /// in the bucket. Deletes within one collection run concurrently.
    pub async fn clear(&self) -> std::result::Result<Cleared, SeedError> {
        let collections = [
            &self.config.categories_collection_id,
            &self.config.customisations_collection_id,
            &self.config.menu_collection_id,
            &self.config.menu_customisations_collection_id,
        ];

        let mut documents = 0;
        for collection_id in collections {
            documents += self
                .clear_collection(collection_id)
                .await
                .map_err(SeedError::at(SeedStage::Clear))?;
        }
        let files = self
            .clear_bucket()
            .await
            .map_err(SeedError::at(SeedStage::Clear))?;

        info!("Cleared {} documents and {} files", documents, files);
        Ok(Cleared { documents, files })
    }

    fn concurrency(&self) -> usize {
        self.seed_config.clear_concurrency.max(1)
    }

    async fn clear_collection(&self, collection_id: &str) -> Result<usize> {
        let docs = self.backend.list_documents(collection_id, &[]).await?;

        stream::iter(docs.iter())
            .map(|doc| self.backend.delete_document(collection_id, &doc.id))
            .buffer_unordered(self.concurrency())
            .try_collect::<Vec<()>>()
            .await?;

        debug!("Cleared {} documents from {}", docs.len(), collection_id);
        Ok(docs.len())
    }

    async fn clear_bucket(&self) -> Result<usize> {
        let bucket_id = &self.config.bucket_id;
        let files = self.backend.list_files(bucket_id).await?;

        stream::iter(files.iter())
            .map(|file| self.backend.delete_file(bucket_id, &file.id))
            .buffer_unordered(self.concurrency())
            .try_collect::<Vec<()>>()
            .await?;

        debug!("Cleared {} files from bucket {}", files.len(), bucket_id);
        Ok(files.len())
    }

    async fn create_categories(&self, _cleared: &Cleared, categories: &[Category]) -> Result<CategoryIds> {
        let mut ids = IdMap::default();
        for category in categories {
            let doc = self
                .backend
                .create_document(
                    &self.config.categories_collection_id,
                    &unique_id(),
                    serde_json::to_value(category)?,
                )
                .await?;
            debug!("Created category {} -> {}", category.name, doc.id);
            ids.insert(&category.name, &doc.id);
        }
        info!("Created {} categories", categories.len());
        Ok(CategoryIds(ids))
    }

    async fn create_customisations(
        &self,
        _categories: &CategoryIds,
        customisations: &[Customisation],
    ) -> Result<CustomisationIds> {
        let mut ids = IdMap::default();
        for customisation in customisations {
            let doc = self
                .backend
                .create_document(
                    &self.config.customisations_collection_id,
                    &unique_id(),
                    serde_json::to_value(customisation)?,
                )
                .await?;
            debug!("Created customisation {} -> {}", customisation.name, doc.id);
            ids.insert(&customisation.name, &doc.id);
        }
        info!("Created {} customisations", customisations.len());
        Ok(CustomisationIds(ids))
    }

    async fn create_menu(
        &self,
        categories: &CategoryIds,
        customisations: &CustomisationIds,
        items: &[MenuItem],
        report: &mut SeedReport,
    ) -> std::result::Result<MenuIds, SeedError> {
        let policy = self.seed_config.missing_references;
        let mut ids = IdMap::default();

        for item in items {
            let category_id = categories.resolve(&item.category_name);
            if category_id.is_none() {
                self.record(
                    report,
                    SeedWarning::UnresolvedCategory {
                        menu_item: item.name.clone(),
                        category: item.category_name.clone(),
                    },
                );
                if policy == MissingReferencePolicy::Skip {
                    report.menu_items_skipped += 1;
                    continue;
                }
            }

            let menu_id = self
                .create_menu_item(item, category_id)
                .await
                .map_err(SeedError::at(SeedStage::Menu))?;
            report.images_uploaded += 1;
            report.menu_items += 1;
            ids.insert(&item.name, &menu_id);

            self.create_links(&menu_id, item, customisations, report)
                .await
                .map_err(SeedError::at(SeedStage::Links))?;
        }

        info!(
            "Created {} menu items ({} skipped)",
            report.menu_items, report.menu_items_skipped
        );
        Ok(MenuIds(ids))
    }

    /// Re-upload the item's image, then write the item pointing at the
    /// bucket copy. Returns the new document id.
    async fn create_menu_item(&self, item: &MenuItem, category_id: Option<&str>) -> Result<String> {
        let image_url = reupload_image(
            self.backend,
            self.images,
            &self.config.bucket_id,
            &item.image_url,
        )
        .await?;

        let fields = MenuFields {
            name: &item.name,
            description: &item.description,
            image_url: &image_url,
            price: item.price,
            rating: item.rating,
            calories: item.calories,
            protein: item.protein,
            categories: category_id,
        };
        let doc = self
            .backend
            .create_document(
                &self.config.menu_collection_id,
                &unique_id(),
                serde_json::to_value(&fields)?,
            )
            .await?;

        debug!("Created menu item {} -> {}", item.name, doc.id);
        Ok(doc.id)
    }

    async fn create_links(
        &self,
        menu_id: &str,
        item: &MenuItem,
        customisations: &CustomisationIds,
        report: &mut SeedReport,
    ) -> Result<()> {
        for name in &item.customisations {
            let customisation_id = customisations.resolve(name);
            if customisation_id.is_none() {
                self.record(
                    report,
                    SeedWarning::UnresolvedCustomisation {
                        menu_item: item.name.clone(),
                        customisation: name.clone(),
                    },
                );
                if self.seed_config.missing_references == MissingReferencePolicy::Skip {
                    continue;
                }
            }

            let fields = LinkFields {
                menu: menu_id,
                customisations: customisation_id,
            };
            self.backend
                .create_document(
                    &self.config.menu_customisations_collection_id,
                    &unique_id(),
                    serde_json::to_value(&fields)?,
                )
                .await?;
            report.links += 1;
        }
        Ok(())
    }

    fn record(&self, report: &mut SeedReport, warning: SeedWarning) {
        warn!("{}", warning);
        report.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use fastfood_backend::{FetchedImage, MemoryBackend};
    use fastfood_core::Error;
    use serde_json::json;

    struct StaticImages;

    #[async_trait]
    impl ImageSource for StaticImages {
        async fn fetch(&self, _url: &str) -> Result<FetchedImage> {
            Ok(FetchedImage {
                bytes: vec![0xff, 0xd8, 0xff],
                content_type: Some("image/jpeg".into()),
            })
        }
    }

    fn config() -> AppwriteConfig {
        AppwriteConfig::new("http://localhost/v1", "test").unwrap()
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let config = config();
        let backend = MemoryBackend::new(Arc::new(config.clone()));
        for i in 0..40 {
            backend
                .create_document(&config.menu_collection_id, &format!("m{}", i), json!({}))
                .await
                .unwrap();
        }
        backend
            .create_document(&config.user_collection_id, "u1", json!({"name": "kept"}))
            .await
            .unwrap();

        let seeder = Seeder::new(&backend, &StaticImages, &config).with_seed_config(SeedConfig {
            clear_concurrency: 3,
            ..SeedConfig::default()
        });
        let cleared = seeder.clear().await.unwrap();

        assert_eq!(cleared.documents(), 40);
        assert!(backend.documents(&config.menu_collection_id).is_empty());
        // Collections outside the menu set are untouched.
        assert_eq!(backend.documents(&config.user_collection_id).len(), 1);
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_clamped() {
        let config = config();
        let backend = MemoryBackend::new(Arc::new(config.clone()));
        backend
            .create_document(&config.categories_collection_id, "c1", json!({}))
            .await
            .unwrap();

        let seeder = Seeder::new(&backend, &StaticImages, &config).with_seed_config(SeedConfig {
            clear_concurrency: 0,
            ..SeedConfig::default()
        });
        assert_eq!(seeder.clear().await.unwrap().documents(), 1);
    }

    #[tokio::test]
    async fn test_empty_dataset() {
        let config = config();
        let backend = MemoryBackend::new(Arc::new(config.clone()));
        let seeder = Seeder::new(&backend, &StaticImages, &config);

        let report = seeder.seed(&SeedData::default()).await.unwrap();
        assert_eq!(report.menu_items, 0);
        assert_eq!(report.links, 0);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_abort_policy_touches_nothing() {
        let config = config();
        let backend = MemoryBackend::new(Arc::new(config.clone()));
        backend
            .create_document(&config.categories_collection_id, "old", json!({"name": "Old"}))
            .await
            .unwrap();

        let mut data = SeedData::bundled().unwrap();
        data.menu[0].category_name = "Drinks".into();

        let seeder = Seeder::new(&backend, &StaticImages, &config).with_seed_config(SeedConfig {
            missing_references: MissingReferencePolicy::Abort,
            ..SeedConfig::default()
        });
        let err = seeder.seed(&data).await.unwrap_err();

        assert_eq!(err.stage, SeedStage::Validate);
        assert!(matches!(err.source, Error::UnresolvedReference { .. }));
        assert!(!err.is_retryable());
        assert_eq!(backend.documents(&config.categories_collection_id).len(), 1);
    }

    #[tokio::test]
    async fn test_bundled_dataset_seeds() {
        let config = config();
        let backend = MemoryBackend::new(Arc::new(config.clone()));
        let data = SeedData::bundled().unwrap();
        let seeder = Seeder::new(&backend, &StaticImages, &config);

        let report = seeder.seed(&data).await.unwrap();

        let expected_links: usize = data.menu.iter().map(|m| m.customisations.len()).sum();
        assert_eq!(report.categories, data.categories.len());
        assert_eq!(report.customisations, data.customisations.len());
        assert_eq!(report.menu_items, data.menu.len());
        assert_eq!(report.images_uploaded, data.menu.len());
        assert_eq!(report.links, expected_links);
        assert_eq!(
            backend.documents(&config.menu_customisations_collection_id).len(),
            expected_links
        );
        assert_eq!(backend.files(&config.bucket_id).len(), data.menu.len());
    }
}
