//! HTTP handlers for recipes and recipe prep tasks.
//!
//! Every write handler follows the same shape: resolve the session, decode
//! and validate the body, convert the input to a persistence record, write,
//! then publish the change event(s). Events are emitted only after the write
//! succeeds, and a publish failure never rolls the write back.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_helpers::{
    AppError, ApiResponse, EnvelopeError, QueryFilter, RequestDetails, ResponseDetails,
    SessionContext, ValidatedJson,
};
use messaging::{
    DataChangeMessage, PublisherExt, PublisherProvider, ServiceEventType, Topic,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::conversions;
use crate::models::{
    Recipe, RecipeCreationInput, RecipePrepTask, RecipePrepTaskCreationInput,
    RecipePrepTaskUpdateInput, RecipeUpdateInput,
};
use crate::store::RecipeStore;

/// Shared state for the recipe routes.
#[derive(Clone)]
pub struct RecipesState {
    pub store: Arc<dyn RecipeStore>,
    pub publishers: Arc<dyn PublisherProvider>,
}

impl RecipesState {
    pub fn new(store: Arc<dyn RecipeStore>, publishers: Arc<dyn PublisherProvider>) -> Self {
        Self { store, publishers }
    }

    /// Fire-and-forget emission onto the data-changes topic.
    fn emit(&self, message: DataChangeMessage) {
        match self.publishers.provide_publisher(Topic::DataChanges) {
            Ok(publisher) => publisher.publish_async(&message),
            Err(error) => {
                tracing::error!(%error, "No data-changes publisher available, dropping event");
            }
        }
    }
}

fn details_for(request: &RequestDetails, session: &SessionContext) -> ResponseDetails {
    request.response_details(session.household_id)
}

fn event(
    event_type: ServiceEventType,
    session: &SessionContext,
    details: &ResponseDetails,
) -> DataChangeMessage {
    DataChangeMessage::new(
        event_type,
        session.user_id,
        session.household_id,
        details.trace_id.clone(),
    )
}

type HandlerResult = Result<Response, EnvelopeError>;

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

pub async fn list_recipes(
    State(state): State<RecipesState>,
    Extension(request): Extension<RequestDetails>,
    session: SessionContext,
    Query(filter): Query<QueryFilter>,
) -> HandlerResult {
    let details = details_for(&request, &session);

    let page = state
        .store
        .list_recipes(&filter)
        .await
        .map_err(|e| AppError::from(e).with_details(&details))?;

    let pagination = filter.pagination(page.filtered, page.total);
    let body = ApiResponse::with_list(details, page.items, pagination);
    Ok((StatusCode::OK, Json(body)).into_response())
}

pub async fn search_recipes(
    State(state): State<RecipesState>,
    Extension(request): Extension<RequestDetails>,
    session: SessionContext,
    Query(filter): Query<QueryFilter>,
) -> HandlerResult {
    let details = details_for(&request, &session);

    let query = filter
        .q
        .clone()
        .filter(|q| !q.is_empty())
        .ok_or_else(|| {
            AppError::InvalidInput("search query 'q' is required".to_string())
                .with_details(&details)
        })?;

    let page = state
        .store
        .search_recipes(&query, &filter)
        .await
        .map_err(|e| AppError::from(e).with_details(&details))?;

    let pagination = filter.pagination(page.filtered, page.total);
    let body = ApiResponse::with_list(details, page.items, pagination);
    Ok((StatusCode::OK, Json(body)).into_response())
}

pub async fn create_recipe(
    State(state): State<RecipesState>,
    Extension(request): Extension<RequestDetails>,
    session: SessionContext,
    ValidatedJson(input): ValidatedJson<RecipeCreationInput>,
) -> HandlerResult {
    let details = details_for(&request, &session);

    let recipe = conversions::recipe_from_creation_input(input, session.user_id);
    let recipe = state
        .store
        .create_recipe(recipe)
        .await
        .map_err(|e| AppError::from(e).with_details(&details))?;

    state.emit(event(ServiceEventType::RecipeCreated, &session, &details).with_payload(&recipe));

    let body = ApiResponse::with_data(details, recipe);
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

pub async fn get_recipe(
    State(state): State<RecipesState>,
    Extension(request): Extension<RequestDetails>,
    session: SessionContext,
    Path(recipe_id): Path<Uuid>,
) -> HandlerResult {
    let details = details_for(&request, &session);

    let recipe = fetch_recipe(&state, recipe_id, &details).await?;
    let body = ApiResponse::with_data(details, recipe);
    Ok((StatusCode::OK, Json(body)).into_response())
}

pub async fn update_recipe(
    State(state): State<RecipesState>,
    Extension(request): Extension<RequestDetails>,
    session: SessionContext,
    Path(recipe_id): Path<Uuid>,
    ValidatedJson(input): ValidatedJson<RecipeUpdateInput>,
) -> HandlerResult {
    let details = details_for(&request, &session);

    let mut recipe = fetch_recipe(&state, recipe_id, &details).await?;
    recipe.apply_update(input);

    let recipe = state
        .store
        .update_recipe(recipe)
        .await
        .map_err(|e| AppError::from(e).with_details(&details))?;

    state.emit(event(ServiceEventType::RecipeUpdated, &session, &details).with_payload(&recipe));

    let body = ApiResponse::with_data(details, recipe);
    Ok((StatusCode::OK, Json(body)).into_response())
}

pub async fn archive_recipe(
    State(state): State<RecipesState>,
    Extension(request): Extension<RequestDetails>,
    session: SessionContext,
    Path(recipe_id): Path<Uuid>,
) -> HandlerResult {
    let details = details_for(&request, &session);

    let archived = state
        .store
        .archive_recipe(recipe_id)
        .await
        .map_err(|e| AppError::from(e).with_details(&details))?;
    if !archived {
        return Err(
            AppError::NotFound(format!("recipe {recipe_id} not found")).with_details(&details)
        );
    }

    // Archive events carry only IDs, in context, no entity body.
    state.emit(
        event(ServiceEventType::RecipeArchived, &session, &details)
            .with_context("recipeID", recipe_id.to_string()),
    );

    let body = ApiResponse::<Recipe>::empty(details);
    Ok((StatusCode::ACCEPTED, Json(body)).into_response())
}

async fn fetch_recipe(
    state: &RecipesState,
    recipe_id: Uuid,
    details: &ResponseDetails,
) -> Result<Recipe, EnvelopeError> {
    state
        .store
        .get_recipe(recipe_id)
        .await
        .map_err(|e| AppError::from(e).with_details(details))?
        .ok_or_else(|| {
            AppError::NotFound(format!("recipe {recipe_id} not found")).with_details(details)
        })
}

// ---------------------------------------------------------------------------
// Recipe prep tasks
// ---------------------------------------------------------------------------

pub async fn list_recipe_prep_tasks(
    State(state): State<RecipesState>,
    Extension(request): Extension<RequestDetails>,
    session: SessionContext,
    Path(recipe_id): Path<Uuid>,
    Query(filter): Query<QueryFilter>,
) -> HandlerResult {
    let details = details_for(&request, &session);

    // An unknown recipe lists as empty, it is not a 404.
    let page = state
        .store
        .list_recipe_prep_tasks(recipe_id, &filter)
        .await
        .map_err(|e| AppError::from(e).with_details(&details))?;

    let pagination = filter.pagination(page.filtered, page.total);
    let body = ApiResponse::with_list(details, page.items, pagination);
    Ok((StatusCode::OK, Json(body)).into_response())
}

pub async fn create_recipe_prep_task(
    State(state): State<RecipesState>,
    Extension(request): Extension<RequestDetails>,
    session: SessionContext,
    Path(recipe_id): Path<Uuid>,
    ValidatedJson(input): ValidatedJson<RecipePrepTaskCreationInput>,
) -> HandlerResult {
    let details = details_for(&request, &session);

    fetch_recipe(&state, recipe_id, &details).await?;

    let task = conversions::prep_task_from_creation_input(input, recipe_id);
    let task = state
        .store
        .create_recipe_prep_task(task)
        .await
        .map_err(|e| AppError::from(e).with_details(&details))?;

    // One event for the task, then one per step, in source order.
    state.emit(
        event(ServiceEventType::RecipePrepTaskCreated, &session, &details).with_payload(&task),
    );
    for step in &task.task_steps {
        state.emit(
            event(ServiceEventType::RecipePrepTaskStepCreated, &session, &details)
                .with_payload(step),
        );
    }

    let body = ApiResponse::with_data(details, task);
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

pub async fn get_recipe_prep_task(
    State(state): State<RecipesState>,
    Extension(request): Extension<RequestDetails>,
    session: SessionContext,
    Path((recipe_id, prep_task_id)): Path<(Uuid, Uuid)>,
) -> HandlerResult {
    let details = details_for(&request, &session);

    let task = fetch_prep_task(&state, recipe_id, prep_task_id, &details).await?;
    let body = ApiResponse::with_data(details, task);
    Ok((StatusCode::OK, Json(body)).into_response())
}

pub async fn update_recipe_prep_task(
    State(state): State<RecipesState>,
    Extension(request): Extension<RequestDetails>,
    session: SessionContext,
    Path((recipe_id, prep_task_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(input): ValidatedJson<RecipePrepTaskUpdateInput>,
) -> HandlerResult {
    let details = details_for(&request, &session);

    let mut task = fetch_prep_task(&state, recipe_id, prep_task_id, &details).await?;
    task.apply_update(input);

    let task = state
        .store
        .update_recipe_prep_task(task)
        .await
        .map_err(|e| AppError::from(e).with_details(&details))?;

    state.emit(
        event(ServiceEventType::RecipePrepTaskUpdated, &session, &details).with_payload(&task),
    );

    let body = ApiResponse::with_data(details, task);
    Ok((StatusCode::OK, Json(body)).into_response())
}

pub async fn archive_recipe_prep_task(
    State(state): State<RecipesState>,
    Extension(request): Extension<RequestDetails>,
    session: SessionContext,
    Path((recipe_id, prep_task_id)): Path<(Uuid, Uuid)>,
) -> HandlerResult {
    let details = details_for(&request, &session);

    let exists = state
        .store
        .recipe_prep_task_exists(recipe_id, prep_task_id)
        .await
        .map_err(|e| AppError::from(e).with_details(&details))?;
    if !exists {
        return Err(
            AppError::NotFound(format!("recipe prep task {prep_task_id} not found"))
                .with_details(&details),
        );
    }

    let archived = state
        .store
        .archive_recipe_prep_task(recipe_id, prep_task_id)
        .await
        .map_err(|e| AppError::from(e).with_details(&details))?;
    if !archived {
        return Err(
            AppError::NotFound(format!("recipe prep task {prep_task_id} not found"))
                .with_details(&details),
        );
    }

    state.emit(
        event(ServiceEventType::RecipePrepTaskArchived, &session, &details)
            .with_context("recipeID", recipe_id.to_string())
            .with_context("recipePrepTaskID", prep_task_id.to_string()),
    );

    let body = ApiResponse::<RecipePrepTask>::empty(details);
    Ok((StatusCode::ACCEPTED, Json(body)).into_response())
}

async fn fetch_prep_task(
    state: &RecipesState,
    recipe_id: Uuid,
    prep_task_id: Uuid,
    details: &ResponseDetails,
) -> Result<RecipePrepTask, EnvelopeError> {
    state
        .store
        .get_recipe_prep_task(recipe_id, prep_task_id)
        .await
        .map_err(|e| AppError::from(e).with_details(details))?
        .ok_or_else(|| {
            AppError::NotFound(format!("recipe prep task {prep_task_id} not found"))
                .with_details(details)
        })
}
