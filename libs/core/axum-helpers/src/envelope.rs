//! Uniform response envelope shared by every JSON endpoint.
//!
//! Every response body, success or failure, has the same outer shape:
//!
//! ```json
//! {
//!   "details": { "traceID": "…", "currentHouseholdID": "…" },
//!   "data": { … },
//!   "pagination": { "limit": 50, "page": 1, "filtered": 10, "totalCount": 10 },
//!   "error": { "code": "not_found", "message": "…" }
//! }
//! ```
//!
//! `data` and `error` are mutually exclusive; `pagination` only appears on
//! list responses.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-request metadata echoed back to the client on every response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDetails {
    /// Hex trace identifier for the request span.
    #[serde(rename = "traceID")]
    pub trace_id: String,
    /// Household the request was scoped to, when a session carried one.
    #[serde(rename = "currentHouseholdID", skip_serializing_if = "Option::is_none")]
    pub current_household_id: Option<Uuid>,
}

impl ResponseDetails {
    pub fn new(trace_id: String) -> Self {
        Self {
            trace_id,
            current_household_id: None,
        }
    }

    pub fn with_household(mut self, household_id: Uuid) -> Self {
        self.current_household_id = Some(household_id);
        self
    }
}

/// Pagination block attached to list responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub limit: u16,
    pub page: u16,
    /// Number of rows matching the filter.
    pub filtered: u64,
    /// Number of rows before filtering.
    pub total_count: u64,
}

/// Machine-readable error block inside the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// The outer envelope wrapping every JSON response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub details: ResponseDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    /// Envelope for a single entity.
    pub fn with_data(details: ResponseDetails, data: T) -> Self {
        Self {
            details,
            data: Some(data),
            pagination: None,
            error: None,
        }
    }

    /// Envelope for a list plus its pagination block.
    pub fn with_list(details: ResponseDetails, data: T, pagination: Pagination) -> Self {
        Self {
            details,
            data: Some(data),
            pagination: Some(pagination),
            error: None,
        }
    }

    /// Envelope carrying only details (archive responses).
    pub fn empty(details: ResponseDetails) -> Self {
        Self {
            details,
            data: None,
            pagination: None,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// Error envelope; `data` is always absent.
    pub fn with_error(details: ResponseDetails, error: ApiError) -> Self {
        Self {
            details,
            data: None,
            pagination: None,
            error: Some(error),
        }
    }
}
