//! Per-request trace details and session resolution.
//!
//! The `request_details` middleware runs first, mints a hex trace ID, opens a
//! request span, and stashes [`RequestDetails`] in the request extensions so
//! handlers and extractors can build envelopes from it. [`SessionContext`] is
//! an extractor that resolves the acting user and household from headers and
//! rejects with a 401 envelope when the user header is missing or malformed.

use crate::{
    envelope::{ApiError, ApiResponse, ResponseDetails},
    errors::AppError,
};
use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::Instrument;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const HOUSEHOLD_ID_HEADER: &str = "x-household-id";

/// Trace metadata minted once per request.
#[derive(Debug, Clone)]
pub struct RequestDetails {
    pub trace_id: String,
}

impl RequestDetails {
    fn mint() -> Self {
        Self {
            trace_id: Uuid::new_v4().simple().to_string(),
        }
    }

    /// Response details scoped to the given household, if any.
    pub fn response_details(&self, household_id: Option<Uuid>) -> ResponseDetails {
        ResponseDetails {
            trace_id: self.trace_id.clone(),
            current_household_id: household_id,
        }
    }
}

/// Middleware that opens the request span and attaches [`RequestDetails`].
pub async fn request_details(mut request: Request, next: Next) -> Response {
    let details = RequestDetails::mint();
    let span = tracing::info_span!(
        "request",
        trace_id = %details.trace_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    request.extensions_mut().insert(details);
    next.run(request).instrument(span).await
}

/// The authenticated caller: user plus optional household scope.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub household_id: Option<Uuid>,
}

impl SessionContext {
    fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthenticated)?;
        let user_id = Uuid::parse_str(user_id).map_err(|_| AppError::Unauthenticated)?;

        let household_id = match headers
            .get(HOUSEHOLD_ID_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            Some(raw) => Some(Uuid::parse_str(raw).map_err(|_| AppError::Unauthenticated)?),
            None => None,
        };

        Ok(Self {
            user_id,
            household_id,
        })
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers).map_err(|error| {
            let details = parts
                .extensions
                .get::<RequestDetails>()
                .cloned()
                .unwrap_or_else(RequestDetails::mint);
            let body = ApiResponse::with_error(
                details.response_details(None),
                ApiError {
                    code: error.code().to_string(),
                    message: error.public_message(),
                },
            );
            (StatusCode::UNAUTHORIZED, Json(body)).into_response()
        })
    }
}
