//! Typed data-change events emitted after successful writes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// The closed set of event types the platform emits.
///
/// One variant per (entity, mutation) pair; handlers pick the variant,
/// never a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceEventType {
    RecipeCreated,
    RecipeUpdated,
    RecipeArchived,
    RecipePrepTaskCreated,
    RecipePrepTaskUpdated,
    RecipePrepTaskArchived,
    RecipePrepTaskStepCreated,
    MealPlanCreated,
    MealPlanUpdated,
    MealPlanArchived,
    MealPlanFinalized,
    WebhookCreated,
    WebhookArchived,
    HouseholdCreated,
    HouseholdUpdated,
    HouseholdArchived,
    GroceryListItemCreated,
    GroceryListItemUpdated,
    GroceryListItemArchived,
    UserDataAggregationRequested,
}

/// The payload envelope carried on the data-changes topic.
///
/// `payload` holds the affected entity (or, for archive events, only its
/// IDs); `user_id` and `household_id` identify the actor and tenant so the
/// SSE fan-out can route the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataChangeMessage {
    pub event_type: ServiceEventType,

    #[serde(rename = "userID")]
    pub user_id: Uuid,

    #[serde(rename = "householdID", skip_serializing_if = "Option::is_none", default)]
    pub household_id: Option<Uuid>,

    #[serde(rename = "requestID")]
    pub request_id: String,

    #[serde(skip_serializing_if = "Value::is_null", default)]
    pub payload: Value,

    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub context: HashMap<String, String>,
}

impl DataChangeMessage {
    pub fn new(
        event_type: ServiceEventType,
        user_id: Uuid,
        household_id: Option<Uuid>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            user_id,
            household_id,
            request_id: request_id.into(),
            payload: Value::Null,
            context: HashMap::new(),
        }
    }

    /// Attach the affected entity as the payload.
    ///
    /// Serialization failure leaves the payload null and is logged; an event
    /// with a missing payload is still routable by its IDs.
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(value) => self.payload = value,
            Err(error) => {
                tracing::error!(%error, event_type = ?self.event_type, "Failed to serialize event payload");
            }
        }
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_types_serialize_snake_case() {
        assert_eq!(
            serde_json::to_value(ServiceEventType::RecipePrepTaskCreated).unwrap(),
            json!("recipe_prep_task_created")
        );
        assert_eq!(
            serde_json::to_value(ServiceEventType::RecipePrepTaskStepCreated).unwrap(),
            json!("recipe_prep_task_step_created")
        );
    }

    #[test]
    fn message_serializes_ids_with_upper_id_suffix() {
        let user = Uuid::new_v4();
        let household = Uuid::new_v4();
        let message = DataChangeMessage::new(
            ServiceEventType::RecipeCreated,
            user,
            Some(household),
            "deadbeef",
        )
        .with_payload(&json!({"id": "r1"}));

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["userID"], json!(user.to_string()));
        assert_eq!(value["householdID"], json!(household.to_string()));
        assert_eq!(value["requestID"], "deadbeef");
        assert_eq!(value["eventType"], "recipe_created");
        assert_eq!(value["payload"]["id"], "r1");
    }

    #[test]
    fn null_payload_and_empty_context_are_omitted() {
        let message = DataChangeMessage::new(
            ServiceEventType::RecipeArchived,
            Uuid::new_v4(),
            None,
            "cafe",
        );
        let value = serde_json::to_value(&message).unwrap();
        assert!(value.get("payload").is_none());
        assert!(value.get("context").is_none());
        assert!(value.get("householdID").is_none());
    }
}
