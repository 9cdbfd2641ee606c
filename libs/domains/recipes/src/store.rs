use async_trait::async_trait;
use axum_helpers::QueryFilter;
use uuid::Uuid;

use crate::error::RecipeResult;
use crate::models::{Recipe, RecipePrepTask};

/// One page of results plus the counts the pagination block needs.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Rows matching the filter, across all pages.
    pub filtered: u64,
    /// Rows before filtering.
    pub total: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            filtered: 0,
            total: 0,
        }
    }
}

/// Persistence seam for recipes and their prep tasks.
///
/// Entities arrive fully formed (IDs and back-references already assigned by
/// the conversion layer); the store only persists and retrieves. Archival is
/// a soft delete: it sets `archived_at` rather than removing rows, and the
/// archive methods return `false` when the row was absent.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn create_recipe(&self, recipe: Recipe) -> RecipeResult<Recipe>;

    async fn get_recipe(&self, recipe_id: Uuid) -> RecipeResult<Option<Recipe>>;

    async fn list_recipes(&self, filter: &QueryFilter) -> RecipeResult<Page<Recipe>>;

    /// Substring search over recipe names and descriptions.
    async fn search_recipes(&self, query: &str, filter: &QueryFilter)
        -> RecipeResult<Page<Recipe>>;

    async fn update_recipe(&self, recipe: Recipe) -> RecipeResult<Recipe>;

    async fn archive_recipe(&self, recipe_id: Uuid) -> RecipeResult<bool>;

    async fn recipe_prep_task_exists(
        &self,
        recipe_id: Uuid,
        prep_task_id: Uuid,
    ) -> RecipeResult<bool>;

    async fn get_recipe_prep_task(
        &self,
        recipe_id: Uuid,
        prep_task_id: Uuid,
    ) -> RecipeResult<Option<RecipePrepTask>>;

    async fn list_recipe_prep_tasks(
        &self,
        recipe_id: Uuid,
        filter: &QueryFilter,
    ) -> RecipeResult<Page<RecipePrepTask>>;

    async fn create_recipe_prep_task(
        &self,
        task: RecipePrepTask,
    ) -> RecipeResult<RecipePrepTask>;

    async fn update_recipe_prep_task(
        &self,
        task: RecipePrepTask,
    ) -> RecipeResult<RecipePrepTask>;

    async fn archive_recipe_prep_task(
        &self,
        recipe_id: Uuid,
        prep_task_id: Uuid,
    ) -> RecipeResult<bool>;
}
