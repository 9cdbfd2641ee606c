//! Request input → persistence record conversions.
//!
//! Pure mappings: they assign generated IDs and parent back-references and
//! nothing else. Handlers call these between validation and the datastore
//! write.

use chrono::Utc;
use uuid::Uuid;

use crate::models::{
    Recipe, RecipeCreationInput, RecipePrepTask, RecipePrepTaskCreationInput, RecipePrepTaskStep,
};

pub fn recipe_from_creation_input(input: RecipeCreationInput, created_by_user: Uuid) -> Recipe {
    Recipe {
        id: Uuid::new_v4(),
        name: input.name,
        description: input.description,
        source: input.source,
        inspired_by_recipe_id: input.inspired_by_recipe_id,
        created_by_user,
        created_at: Utc::now(),
        last_updated_at: None,
        archived_at: None,
    }
}

/// Build a prep task for `recipe_id`, assigning the task ID and pointing
/// every step back at it. Step order follows the input.
pub fn prep_task_from_creation_input(
    input: RecipePrepTaskCreationInput,
    recipe_id: Uuid,
) -> RecipePrepTask {
    let task_id = Uuid::new_v4();

    let task_steps: Vec<RecipePrepTaskStep> = input
        .task_steps
        .into_iter()
        .map(|step| RecipePrepTaskStep {
            id: Uuid::new_v4(),
            belongs_to_recipe_step: step.belongs_to_recipe_step,
            belongs_to_recipe_prep_task: task_id,
            satisfies_recipe_step: step.satisfies_recipe_step,
        })
        .collect();

    RecipePrepTask {
        id: task_id,
        name: input.name,
        notes: input.notes,
        optional: input.optional,
        explicit_storage_instructions: input.explicit_storage_instructions,
        storage_type: input.storage_type,
        belongs_to_recipe: recipe_id,
        task_steps,
        created_at: Utc::now(),
        last_updated_at: None,
        archived_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecipePrepTaskStepCreationInput;

    #[test]
    fn prep_task_conversion_assigns_ids_and_back_references() {
        let recipe_id = Uuid::new_v4();
        let step_targets: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

        let input = RecipePrepTaskCreationInput {
            name: "Chop".to_string(),
            notes: "n".to_string(),
            optional: true,
            explicit_storage_instructions: String::new(),
            storage_type: None,
            task_steps: step_targets
                .iter()
                .map(|&belongs_to_recipe_step| RecipePrepTaskStepCreationInput {
                    belongs_to_recipe_step,
                    satisfies_recipe_step: true,
                })
                .collect(),
        };

        let task = prep_task_from_creation_input(input, recipe_id);

        assert!(!task.id.is_nil());
        assert_eq!(task.belongs_to_recipe, recipe_id);
        assert_eq!(task.task_steps.len(), 3);

        // Step order follows the input, and every step points at the task.
        for (step, expected_target) in task.task_steps.iter().zip(&step_targets) {
            assert!(!step.id.is_nil());
            assert_eq!(step.belongs_to_recipe_prep_task, task.id);
            assert_eq!(step.belongs_to_recipe_step, *expected_target);
        }
    }

    #[test]
    fn recipe_conversion_records_the_creator() {
        let user = Uuid::new_v4();
        let recipe = recipe_from_creation_input(
            RecipeCreationInput {
                name: "Soup".to_string(),
                description: String::new(),
                source: String::new(),
                inspired_by_recipe_id: None,
            },
            user,
        );

        assert!(!recipe.id.is_nil());
        assert_eq!(recipe.created_by_user, user);
        assert!(recipe.archived_at.is_none());
    }
}
