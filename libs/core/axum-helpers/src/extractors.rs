//! Request-body extractor that decodes and validates in one step.

use crate::{
    errors::{AppError, EnvelopeError},
    session::RequestDetails,
};
use axum::{
    extract::{FromRequest, Json, Request},
    response::IntoResponse,
    response::Response,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON extractor that runs `validator` rules after decoding.
///
/// Both decode failures and validation failures reject with a 400 error
/// envelope carrying the request's trace ID.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let details = req
            .extensions()
            .get::<RequestDetails>()
            .cloned()
            .map(|details| details.response_details(None));

        let reject = |error: AppError| {
            let details = details
                .clone()
                .unwrap_or_else(|| crate::envelope::ResponseDetails::new(String::new()));
            EnvelopeError { details, error }.into_response()
        };

        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| reject(AppError::InvalidInput(e.body_text())))?;

        data.validate()
            .map_err(|e| reject(AppError::Validation(e)))?;

        Ok(ValidatedJson(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct NameInput {
        #[validate(length(min = 1))]
        name: String,
    }

    async fn accept(ValidatedJson(input): ValidatedJson<NameInput>) -> String {
        input.name
    }

    fn app() -> Router {
        Router::new().route("/", post(accept))
    }

    #[tokio::test]
    async fn valid_body_passes_through() {
        let response = app()
            .oneshot(
                axum::http::Request::post("/")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":"soup"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn empty_name_fails_validation() {
        let response = app()
            .oneshot(
                axum::http::Request::post("/")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let response = app()
            .oneshot(
                axum::http::Request::post("/")
                    .header("content-type", "application/json")
                    .body(Body::from("{"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
