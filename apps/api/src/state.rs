//! Shared application state behind the router.

use domain_recipes::{MemoryRecipeStore, RecipeStore, RecipesState};
use messaging::{EventBroadcaster, MemoryPublisherProvider, PublisherProvider};
use std::sync::Arc;
use uploads::{UploadManager, UploadsConfig, UploadsError};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecipeStore>,
    pub publishers: Arc<dyn PublisherProvider>,
    pub uploads: Arc<UploadManager>,
    pub broadcaster: Arc<EventBroadcaster>,
}

impl AppState {
    /// State with in-process backends only: memory store, memory
    /// publishers, memory uploads. Used by the OpenAPI generator to prove
    /// the router constructs, and by handler tests.
    pub async fn neutralized() -> Result<Self, UploadsError> {
        let uploads =
            UploadManager::new(Some(UploadsConfig::memory("uploads", ""))).await?;

        Ok(Self {
            store: Arc::new(MemoryRecipeStore::new()),
            publishers: Arc::new(MemoryPublisherProvider::new()),
            uploads: Arc::new(uploads),
            broadcaster: EventBroadcaster::new(),
        })
    }

    /// The slice of state the recipe handlers see.
    pub fn recipes(&self) -> RecipesState {
        RecipesState::new(Arc::clone(&self.store), Arc::clone(&self.publishers))
    }
}
