//! In-memory store, used by tests and local development.

use async_trait::async_trait;
use axum_helpers::{QueryFilter, SortBy};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{RecipeError, RecipeResult};
use crate::models::{Recipe, RecipePrepTask};
use crate::store::{Page, RecipeStore};

#[derive(Default)]
pub struct MemoryRecipeStore {
    recipes: RwLock<HashMap<Uuid, Recipe>>,
    prep_tasks: RwLock<HashMap<Uuid, RecipePrepTask>>,
}

impl MemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page_of<T: Clone>(
    mut matching: Vec<&T>,
    total: usize,
    filter: &QueryFilter,
    created_at: impl Fn(&T) -> chrono::DateTime<Utc>,
) -> Page<T> {
    matching.sort_by_key(|item| created_at(item));
    if filter.sort_by() == SortBy::Desc {
        matching.reverse();
    }

    let filtered = matching.len() as u64;
    let limit = filter.limit() as usize;
    let offset = (filter.page() as usize - 1) * limit;

    let items = matching
        .into_iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();

    Page {
        items,
        filtered,
        total: total as u64,
    }
}

fn recipe_matches(recipe: &Recipe, filter: &QueryFilter) -> bool {
    if recipe.is_archived() && !filter.include_archived() {
        return false;
    }
    filter.matches_timestamps(recipe.created_at, recipe.last_updated_at)
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn create_recipe(&self, recipe: Recipe) -> RecipeResult<Recipe> {
        let mut recipes = self.recipes.write().await;
        recipes.insert(recipe.id, recipe.clone());
        Ok(recipe)
    }

    async fn get_recipe(&self, recipe_id: Uuid) -> RecipeResult<Option<Recipe>> {
        let recipes = self.recipes.read().await;
        Ok(recipes.get(&recipe_id).filter(|r| !r.is_archived()).cloned())
    }

    async fn list_recipes(&self, filter: &QueryFilter) -> RecipeResult<Page<Recipe>> {
        let recipes = self.recipes.read().await;
        let matching: Vec<&Recipe> = recipes
            .values()
            .filter(|r| recipe_matches(r, filter))
            .collect();
        Ok(page_of(matching, recipes.len(), filter, |r| r.created_at))
    }

    async fn search_recipes(
        &self,
        query: &str,
        filter: &QueryFilter,
    ) -> RecipeResult<Page<Recipe>> {
        let needle = query.to_lowercase();
        let recipes = self.recipes.read().await;
        let matching: Vec<&Recipe> = recipes
            .values()
            .filter(|r| recipe_matches(r, filter))
            .filter(|r| {
                r.name.to_lowercase().contains(&needle)
                    || r.description.to_lowercase().contains(&needle)
            })
            .collect();
        Ok(page_of(matching, recipes.len(), filter, |r| r.created_at))
    }

    async fn update_recipe(&self, recipe: Recipe) -> RecipeResult<Recipe> {
        let mut recipes = self.recipes.write().await;
        if !recipes.contains_key(&recipe.id) {
            return Err(RecipeError::RecipeNotFound(recipe.id));
        }
        recipes.insert(recipe.id, recipe.clone());
        Ok(recipe)
    }

    async fn archive_recipe(&self, recipe_id: Uuid) -> RecipeResult<bool> {
        let mut recipes = self.recipes.write().await;
        match recipes.get_mut(&recipe_id) {
            Some(recipe) if !recipe.is_archived() => {
                recipe.archived_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn recipe_prep_task_exists(
        &self,
        recipe_id: Uuid,
        prep_task_id: Uuid,
    ) -> RecipeResult<bool> {
        let tasks = self.prep_tasks.read().await;
        Ok(tasks
            .get(&prep_task_id)
            .is_some_and(|t| t.belongs_to_recipe == recipe_id && !t.is_archived()))
    }

    async fn get_recipe_prep_task(
        &self,
        recipe_id: Uuid,
        prep_task_id: Uuid,
    ) -> RecipeResult<Option<RecipePrepTask>> {
        let tasks = self.prep_tasks.read().await;
        Ok(tasks
            .get(&prep_task_id)
            .filter(|t| t.belongs_to_recipe == recipe_id && !t.is_archived())
            .cloned())
    }

    async fn list_recipe_prep_tasks(
        &self,
        recipe_id: Uuid,
        filter: &QueryFilter,
    ) -> RecipeResult<Page<RecipePrepTask>> {
        let tasks = self.prep_tasks.read().await;
        let in_recipe: Vec<&RecipePrepTask> = tasks
            .values()
            .filter(|t| t.belongs_to_recipe == recipe_id)
            .collect();
        let total = in_recipe.len();

        let matching: Vec<&RecipePrepTask> = in_recipe
            .into_iter()
            .filter(|t| !t.is_archived() || filter.include_archived())
            .filter(|t| filter.matches_timestamps(t.created_at, t.last_updated_at))
            .collect();

        Ok(page_of(matching, total, filter, |t| t.created_at))
    }

    async fn create_recipe_prep_task(
        &self,
        task: RecipePrepTask,
    ) -> RecipeResult<RecipePrepTask> {
        {
            let recipes = self.recipes.read().await;
            if !recipes.contains_key(&task.belongs_to_recipe) {
                return Err(RecipeError::RecipeNotFound(task.belongs_to_recipe));
            }
        }

        let mut tasks = self.prep_tasks.write().await;
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update_recipe_prep_task(
        &self,
        task: RecipePrepTask,
    ) -> RecipeResult<RecipePrepTask> {
        let mut tasks = self.prep_tasks.write().await;
        if !tasks.contains_key(&task.id) {
            return Err(RecipeError::PrepTaskNotFound(task.id));
        }
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn archive_recipe_prep_task(
        &self,
        recipe_id: Uuid,
        prep_task_id: Uuid,
    ) -> RecipeResult<bool> {
        let mut tasks = self.prep_tasks.write().await;
        match tasks.get_mut(&prep_task_id) {
            Some(task) if task.belongs_to_recipe == recipe_id && !task.is_archived() => {
                task.archived_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversions;
    use crate::models::RecipeCreationInput;

    fn sample_recipe(name: &str) -> Recipe {
        conversions::recipe_from_creation_input(
            RecipeCreationInput {
                name: name.to_string(),
                description: String::new(),
                source: String::new(),
                inspired_by_recipe_id: None,
            },
            Uuid::new_v4(),
        )
    }

    #[tokio::test]
    async fn archived_recipes_are_hidden_by_default() {
        let store = MemoryRecipeStore::new();
        let recipe = store.create_recipe(sample_recipe("Soup")).await.unwrap();

        assert!(store.archive_recipe(recipe.id).await.unwrap());
        assert!(store.get_recipe(recipe.id).await.unwrap().is_none());

        let hidden = store.list_recipes(&QueryFilter::default()).await.unwrap();
        assert!(hidden.items.is_empty());

        let filter = QueryFilter {
            include_archived: Some(true),
            ..Default::default()
        };
        let visible = store.list_recipes(&filter).await.unwrap();
        assert_eq!(visible.items.len(), 1);
    }

    #[tokio::test]
    async fn double_archive_reports_absent() {
        let store = MemoryRecipeStore::new();
        let recipe = store.create_recipe(sample_recipe("Soup")).await.unwrap();

        assert!(store.archive_recipe(recipe.id).await.unwrap());
        assert!(!store.archive_recipe(recipe.id).await.unwrap());
        assert!(!store.archive_recipe(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn search_matches_name_and_description() {
        let store = MemoryRecipeStore::new();
        store.create_recipe(sample_recipe("Chicken Soup")).await.unwrap();
        let mut with_description = sample_recipe("Plain");
        with_description.description = "a soup for cold days".to_string();
        store.create_recipe(with_description).await.unwrap();
        store.create_recipe(sample_recipe("Toast")).await.unwrap();

        let page = store
            .search_recipes("soup", &QueryFilter::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.filtered, 2);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn prep_tasks_are_scoped_to_their_recipe() {
        let store = MemoryRecipeStore::new();
        let recipe = store.create_recipe(sample_recipe("Soup")).await.unwrap();
        let other = store.create_recipe(sample_recipe("Toast")).await.unwrap();

        let task = RecipePrepTask {
            id: Uuid::new_v4(),
            name: "Chop".to_string(),
            notes: String::new(),
            optional: false,
            explicit_storage_instructions: String::new(),
            storage_type: None,
            belongs_to_recipe: recipe.id,
            task_steps: vec![],
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        };
        store.create_recipe_prep_task(task.clone()).await.unwrap();

        assert!(store
            .recipe_prep_task_exists(recipe.id, task.id)
            .await
            .unwrap());
        assert!(!store
            .recipe_prep_task_exists(other.id, task.id)
            .await
            .unwrap());
        assert!(store
            .get_recipe_prep_task(other.id, task.id)
            .await
            .unwrap()
            .is_none());
    }
}
