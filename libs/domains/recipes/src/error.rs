use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Recipe not found: {0}")]
    RecipeNotFound(Uuid),

    #[error("Recipe prep task not found: {0}")]
    PrepTaskNotFound(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Datastore error: {0}")]
    Datastore(String),
}

pub type RecipeResult<T> = Result<T, RecipeError>;

/// Map domain failures onto the shared handler error kinds.
impl From<RecipeError> for AppError {
    fn from(err: RecipeError) -> Self {
        match err {
            RecipeError::RecipeNotFound(id) => AppError::NotFound(format!("recipe {id} not found")),
            RecipeError::PrepTaskNotFound(id) => {
                AppError::NotFound(format!("recipe prep task {id} not found"))
            }
            RecipeError::Validation(msg) => AppError::InvalidInput(msg),
            RecipeError::Datastore(msg) => AppError::Datastore(msg),
        }
    }
}
