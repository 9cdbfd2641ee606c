//! The route catalog and the router built from it.
//!
//! The catalog is the single authority on what the API serves: the router
//! mounts exactly these entries, and the OpenAPI generator walks the same
//! list. Adding a route means adding a catalog entry; a catalog entry
//! without a handler panics at router construction, which surfaces in
//! every handler test.

use crate::api;
use crate::state::AppState;
use axum::routing::{delete, get, post, put, MethodRouter};
use axum::Router;
use axum_helpers::apply_common_layers;
use domain_recipes::http;
use domain_recipes::RecipesState;

/// One mounted route: method, axum path (`{name}` parameters), and the
/// operation ID the generated API document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    pub method: &'static str,
    pub path: &'static str,
    pub operation_id: &'static str,
}

const ROUTE_CATALOG: &[RouteSpec] = &[
    RouteSpec {
        method: "GET",
        path: "/_meta_/live",
        operation_id: "CheckForLiveness",
    },
    RouteSpec {
        method: "GET",
        path: "/_meta_/ready",
        operation_id: "CheckForReadiness",
    },
    RouteSpec {
        method: "GET",
        path: "/api/v1/recipes/",
        operation_id: "GetRecipes",
    },
    RouteSpec {
        method: "POST",
        path: "/api/v1/recipes/",
        operation_id: "CreateRecipe",
    },
    RouteSpec {
        method: "GET",
        path: "/api/v1/recipes/search",
        operation_id: "SearchForRecipes",
    },
    RouteSpec {
        method: "GET",
        path: "/api/v1/recipes/{recipeID}/",
        operation_id: "GetRecipe",
    },
    RouteSpec {
        method: "PUT",
        path: "/api/v1/recipes/{recipeID}/",
        operation_id: "UpdateRecipe",
    },
    RouteSpec {
        method: "DELETE",
        path: "/api/v1/recipes/{recipeID}/",
        operation_id: "ArchiveRecipe",
    },
    RouteSpec {
        method: "GET",
        path: "/api/v1/recipes/{recipeID}/prep_tasks/",
        operation_id: "GetRecipePrepTasks",
    },
    RouteSpec {
        method: "POST",
        path: "/api/v1/recipes/{recipeID}/prep_tasks/",
        operation_id: "CreateRecipePrepTask",
    },
    RouteSpec {
        method: "GET",
        path: "/api/v1/recipes/{recipeID}/prep_tasks/{recipePrepTaskID}/",
        operation_id: "GetRecipePrepTask",
    },
    RouteSpec {
        method: "PUT",
        path: "/api/v1/recipes/{recipeID}/prep_tasks/{recipePrepTaskID}/",
        operation_id: "UpdateRecipePrepTask",
    },
    RouteSpec {
        method: "DELETE",
        path: "/api/v1/recipes/{recipeID}/prep_tasks/{recipePrepTaskID}/",
        operation_id: "ArchiveRecipePrepTask",
    },
    RouteSpec {
        method: "GET",
        path: "/api/v1/data_changes",
        operation_id: "SubscribeToDataChanges",
    },
    RouteSpec {
        method: "GET",
        path: "/api/v1/uploads/{filename}",
        operation_id: "ServeUploadedFile",
    },
];

/// The authoritative list of served routes.
pub fn route_catalog() -> &'static [RouteSpec] {
    ROUTE_CATALOG
}

fn recipe_handler(operation_id: &str) -> Option<MethodRouter<RecipesState>> {
    Some(match operation_id {
        "GetRecipes" => get(http::list_recipes),
        "CreateRecipe" => post(http::create_recipe),
        "SearchForRecipes" => get(http::search_recipes),
        "GetRecipe" => get(http::get_recipe),
        "UpdateRecipe" => put(http::update_recipe),
        "ArchiveRecipe" => delete(http::archive_recipe),
        "GetRecipePrepTasks" => get(http::list_recipe_prep_tasks),
        "CreateRecipePrepTask" => post(http::create_recipe_prep_task),
        "GetRecipePrepTask" => get(http::get_recipe_prep_task),
        "UpdateRecipePrepTask" => put(http::update_recipe_prep_task),
        "ArchiveRecipePrepTask" => delete(http::archive_recipe_prep_task),
        _ => return None,
    })
}

fn app_handler(operation_id: &str) -> Option<MethodRouter<AppState>> {
    Some(match operation_id {
        "CheckForLiveness" => get(api::meta::live),
        "CheckForReadiness" => get(api::meta::ready),
        "SubscribeToDataChanges" => get(api::events::data_changes),
        "ServeUploadedFile" => get(api::uploads::serve_upload),
        _ => return None,
    })
}

/// Mount every catalog entry onto a router with the common layers applied.
///
/// The upload-serving route binds its path parameter by name, so the
/// catalog path must use the filename key the upload manager was
/// configured with; a mismatch panics here rather than 404ing at runtime.
pub fn build_router(state: AppState) -> Router {
    let mut domain: Router<RecipesState> = Router::new();
    let mut app: Router<AppState> = Router::new();

    for route in route_catalog() {
        if route.operation_id == "ServeUploadedFile" {
            let parameter = format!("{{{}}}", state.uploads.upload_filename_key());
            if !route.path.ends_with(&parameter) {
                panic!(
                    "upload route {} does not bind the configured filename key {parameter}",
                    route.path
                );
            }
        }

        if let Some(handler) = recipe_handler(route.operation_id) {
            domain = domain.route(route.path, handler);
        } else if let Some(handler) = app_handler(route.operation_id) {
            app = app.route(route.path, handler);
        } else {
            panic!("catalog route {} has no handler", route.operation_id);
        }
    }

    let router = domain
        .with_state(state.recipes())
        .merge(app.with_state(state));
    apply_common_layers(router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum_helpers::session::{HOUSEHOLD_ID_HEADER, USER_ID_HEADER};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn app() -> (Router, AppState) {
        let state = AppState::neutralized().await.unwrap();
        (build_router(state.clone()), state)
    }

    #[tokio::test]
    async fn liveness_probe_needs_no_auth() {
        let (app, _) = app().await;
        let response = app
            .oneshot(Request::get("/_meta_/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn every_catalog_route_is_mounted() {
        // An unknown method on a mounted path is 405, while an unmounted
        // path falls through to the enveloped 404. Requesting each catalog
        // path with its own method must never produce the 404 fallback.
        let (app, _) = app().await;
        for route in route_catalog() {
            let request = Request::builder()
                .method(route.method)
                .uri(route.path.replace("{recipeID}", &Uuid::new_v4().to_string())
                    .replace("{recipePrepTaskID}", &Uuid::new_v4().to_string())
                    .replace("{filename}", "sample.txt"))
                .header(USER_ID_HEADER, Uuid::new_v4().to_string())
                .body(Body::empty())
                .unwrap();

            let response = app.clone().oneshot(request).await.unwrap();
            if response.status() == StatusCode::NOT_FOUND {
                let body = response.into_body().collect().await.unwrap().to_bytes();
                let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
                assert!(
                    !value["error"]["message"]
                        .as_str()
                        .unwrap_or_default()
                        .starts_with("no route"),
                    "catalog route {} {} is not mounted",
                    route.method,
                    route.path
                );
            }
        }
    }

    #[tokio::test]
    async fn upload_round_trip_serves_stored_content_type() {
        let (app, state) = app().await;
        state
            .uploads
            .save_file("avatar.png", vec![0x89, 0x50, 0x4e, 0x47])
            .await
            .unwrap();

        let request = Request::get("/api/v1/uploads/avatar.png")
            .header(USER_ID_HEADER, Uuid::new_v4().to_string())
            .header(HOUSEHOLD_ID_HEADER, Uuid::new_v4().to_string())
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "image/png"
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), &[0x89, 0x50, 0x4e, 0x47]);
    }

    #[tokio::test]
    async fn unknown_extension_serves_octet_stream() {
        let (app, state) = app().await;
        state
            .uploads
            .save_file("export.bin", vec![1, 2, 3])
            .await
            .unwrap();

        let request = Request::get("/api/v1/uploads/export.bin")
            .header(USER_ID_HEADER, Uuid::new_v4().to_string())
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    #[should_panic(expected = "does not bind the configured filename key")]
    async fn mismatched_filename_key_fails_router_construction() {
        let mut config = uploads::UploadsConfig::memory("uploads", "");
        config.upload_filename_key = "blobName".to_string();
        let manager = uploads::UploadManager::new(Some(config)).await.unwrap();

        let mut state = AppState::neutralized().await.unwrap();
        state.uploads = std::sync::Arc::new(manager);
        build_router(state);
    }

    #[tokio::test]
    async fn missing_upload_is_enveloped_404() {
        let (app, _) = app().await;
        let request = Request::get("/api/v1/uploads/nope.txt")
            .header(USER_ID_HEADER, Uuid::new_v4().to_string())
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"]["code"], "not_found");
        assert!(!value["details"]["traceID"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sse_route_requires_a_session() {
        let (app, _) = app().await;
        let response = app
            .oneshot(
                Request::get("/api/v1/data_changes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn catalog_has_no_duplicate_method_path_pairs() {
        let mut seen = std::collections::HashSet::new();
        for route in route_catalog() {
            assert!(
                seen.insert((route.method, route.path)),
                "duplicate catalog entry {} {}",
                route.method,
                route.path
            );
        }
    }
}
