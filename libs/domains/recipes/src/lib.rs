//! # Recipes domain
//!
//! Recipes and their prep tasks: the data model, the storage trait with an
//! in-memory implementation, and the HTTP handlers that wire writes to the
//! data-changes event stream.

pub mod conversions;
pub mod error;
pub mod http;
pub mod memory;
pub mod models;
pub mod store;

pub use error::{RecipeError, RecipeResult};
pub use http::RecipesState;
pub use memory::MemoryRecipeStore;
pub use models::{
    Recipe, RecipeCreationInput, RecipePrepTask, RecipePrepTaskCreationInput,
    RecipePrepTaskStep, RecipePrepTaskStepCreationInput, RecipePrepTaskUpdateInput,
    RecipeUpdateInput, StorageType,
};
pub use store::{Page, RecipeStore};

#[cfg(test)]
pub use store::MockRecipeStore;
