use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;
use validator::Validate;

/// How a prepped component is stored between prep and cooking.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum StorageType {
    #[serde(rename = "uncovered")]
    #[strum(serialize = "uncovered")]
    Uncovered,
    #[serde(rename = "covered")]
    #[strum(serialize = "covered")]
    Covered,
    #[serde(rename = "on a wire rack")]
    #[strum(serialize = "on a wire rack")]
    WireRack,
    #[serde(rename = "in an airtight container")]
    #[strum(serialize = "in an airtight container")]
    AirtightContainer,
}

/// A recipe belonging to a household's collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "inspiredByRecipeID", skip_serializing_if = "Option::is_none", default)]
    pub inspired_by_recipe_id: Option<Uuid>,
    pub created_by_user: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecipeCreationInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "inspiredByRecipeID", default)]
    pub inspired_by_recipe_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecipeUpdateInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub source: Option<String>,
}

impl Recipe {
    /// Apply non-nil fields of an update input.
    pub fn apply_update(&mut self, update: RecipeUpdateInput) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(source) = update.source {
            self.source = source;
        }
        self.last_updated_at = Some(Utc::now());
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// A step a prep task satisfies within its recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePrepTaskStep {
    pub id: Uuid,
    pub belongs_to_recipe_step: Uuid,
    pub belongs_to_recipe_prep_task: Uuid,
    pub satisfies_recipe_step: bool,
}

/// Work that can be done ahead of cooking a recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePrepTask {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub explicit_storage_instructions: String,
    pub storage_type: Option<StorageType>,
    pub belongs_to_recipe: Uuid,
    pub task_steps: Vec<RecipePrepTaskStep>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl RecipePrepTask {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    pub fn apply_update(&mut self, update: RecipePrepTaskUpdateInput) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        if let Some(optional) = update.optional {
            self.optional = optional;
        }
        if let Some(instructions) = update.explicit_storage_instructions {
            self.explicit_storage_instructions = instructions;
        }
        if let Some(storage_type) = update.storage_type {
            self.storage_type = Some(storage_type);
        }
        self.last_updated_at = Some(Utc::now());
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecipePrepTaskStepCreationInput {
    pub belongs_to_recipe_step: Uuid,
    #[serde(default)]
    pub satisfies_recipe_step: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecipePrepTaskCreationInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub explicit_storage_instructions: String,
    #[serde(default)]
    pub storage_type: Option<StorageType>,
    #[serde(default)]
    #[validate(nested)]
    pub task_steps: Vec<RecipePrepTaskStepCreationInput>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecipePrepTaskUpdateInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub notes: Option<String>,
    pub optional: Option<bool>,
    pub explicit_storage_instructions: Option<String>,
    pub storage_type: Option<StorageType>,
}
