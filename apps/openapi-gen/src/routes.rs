//! Per-route metadata the served catalog does not carry.
//!
//! The catalog in `apps/api` names (method, path, operation ID); this
//! table adds everything the document needs on top. A catalog entry with
//! no table row is a fatal error so the two can never drift silently.

use crate::error::GeneratorError;

/// Routes the document deliberately omits.
pub const SKIP_PATHS: &[&str] = &[
    "/api/v1/recipes/{recipeID}/steps/{recipeStepID}",
    "/api/v1/households/{householdID}/invitations/",
    "/oauth2/authorize",
    "/oauth2/token",
];

/// How a route's success response body is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    /// Envelope with a typed `data` object.
    Entity(&'static str),
    /// Envelope with a typed `data` array plus filter parameters.
    List(&'static str),
    /// Like `List`, with `q` required.
    Search(&'static str),
    /// Envelope with no `data` at all (archives).
    Empty,
    /// Raw bytes, content type from blob attributes.
    Binary,
    /// `text/event-stream`, no schema.
    EventStream,
    /// No body (probes).
    None,
}

#[derive(Debug, Clone, Copy)]
pub struct RouteInfo {
    pub description: &'static str,
    pub input_type: Option<&'static str>,
    pub body: BodyShape,
    pub authless: bool,
    pub scopes: &'static [&'static str],
}

const MEMBER: &[&str] = &["household_member"];

const ROUTE_INFO: &[(&str, RouteInfo)] = &[
    (
        "GET /_meta_/live",
        RouteInfo {
            description: "Operation for checking service liveness.",
            input_type: None,
            body: BodyShape::None,
            authless: true,
            scopes: &[],
        },
    ),
    (
        "GET /_meta_/ready",
        RouteInfo {
            description: "Operation for checking service readiness.",
            input_type: None,
            body: BodyShape::None,
            authless: true,
            scopes: &[],
        },
    ),
    (
        "GET /api/v1/recipes/",
        RouteInfo {
            description: "Operation for fetching Recipes.",
            input_type: None,
            body: BodyShape::List("Recipe"),
            authless: false,
            scopes: MEMBER,
        },
    ),
    (
        "POST /api/v1/recipes/",
        RouteInfo {
            description: "Operation for creating a Recipe.",
            input_type: Some("RecipeCreationInput"),
            body: BodyShape::Entity("Recipe"),
            authless: false,
            scopes: MEMBER,
        },
    ),
    (
        "GET /api/v1/recipes/search",
        RouteInfo {
            description: "Operation for searching Recipes.",
            input_type: None,
            body: BodyShape::Search("Recipe"),
            authless: false,
            scopes: MEMBER,
        },
    ),
    (
        "GET /api/v1/recipes/{recipeID}/",
        RouteInfo {
            description: "Operation for fetching a Recipe.",
            input_type: None,
            body: BodyShape::Entity("Recipe"),
            authless: false,
            scopes: MEMBER,
        },
    ),
    (
        "PUT /api/v1/recipes/{recipeID}/",
        RouteInfo {
            description: "Operation for updating a Recipe.",
            input_type: Some("RecipeUpdateInput"),
            body: BodyShape::Entity("Recipe"),
            authless: false,
            scopes: MEMBER,
        },
    ),
    (
        "DELETE /api/v1/recipes/{recipeID}/",
        RouteInfo {
            description: "Operation for archiving a Recipe.",
            input_type: None,
            body: BodyShape::Empty,
            authless: false,
            scopes: MEMBER,
        },
    ),
    (
        "GET /api/v1/recipes/{recipeID}/prep_tasks/",
        RouteInfo {
            description: "Operation for fetching RecipePrepTasks.",
            input_type: None,
            body: BodyShape::List("RecipePrepTask"),
            authless: false,
            scopes: MEMBER,
        },
    ),
    (
        "POST /api/v1/recipes/{recipeID}/prep_tasks/",
        RouteInfo {
            description: "Operation for creating a RecipePrepTask.",
            input_type: Some("RecipePrepTaskCreationInput"),
            body: BodyShape::Entity("RecipePrepTask"),
            authless: false,
            scopes: MEMBER,
        },
    ),
    (
        "GET /api/v1/recipes/{recipeID}/prep_tasks/{recipePrepTaskID}/",
        RouteInfo {
            description: "Operation for fetching a RecipePrepTask.",
            input_type: None,
            body: BodyShape::Entity("RecipePrepTask"),
            authless: false,
            scopes: MEMBER,
        },
    ),
    (
        "PUT /api/v1/recipes/{recipeID}/prep_tasks/{recipePrepTaskID}/",
        RouteInfo {
            description: "Operation for updating a RecipePrepTask.",
            input_type: Some("RecipePrepTaskUpdateInput"),
            body: BodyShape::Entity("RecipePrepTask"),
            authless: false,
            scopes: MEMBER,
        },
    ),
    (
        "DELETE /api/v1/recipes/{recipeID}/prep_tasks/{recipePrepTaskID}/",
        RouteInfo {
            description: "Operation for archiving a RecipePrepTask.",
            input_type: None,
            body: BodyShape::Empty,
            authless: false,
            scopes: MEMBER,
        },
    ),
    (
        "GET /api/v1/data_changes",
        RouteInfo {
            description: "Operation for subscribing to the caller's data-change events.",
            input_type: None,
            body: BodyShape::EventStream,
            authless: false,
            scopes: MEMBER,
        },
    ),
    (
        "GET /api/v1/uploads/{filename}",
        RouteInfo {
            description: "Operation for fetching an uploaded file.",
            input_type: None,
            body: BodyShape::Binary,
            authless: false,
            scopes: MEMBER,
        },
    ),
];

pub fn route_info(method: &str, path: &str) -> Result<&'static RouteInfo, GeneratorError> {
    let key = format!("{method} {path}");
    ROUTE_INFO
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, info)| info)
        .ok_or(GeneratorError::UnknownRoute(key))
}

pub fn is_skipped(path: &str) -> bool {
    SKIP_PATHS.contains(&path)
}

/// `{name}` path parameters, in order of appearance.
pub fn path_params(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| segment.starts_with('{') && segment.ends_with('}'))
        .map(|segment| segment[1..segment.len() - 1].to_string())
        .collect()
}

/// Segment replacements applied before a segment becomes a tag.
const TAG_REPLACEMENTS: &[(&str, &str)] = &[("_meta_", "meta")];

/// Descriptions for the tags we bother describing.
const TAG_DESCRIPTIONS: &[(&str, &str)] = &[
    ("meta", "Service health probes."),
    ("recipes", "Recipes and their derived planning data."),
    ("prep_tasks", "Advance preparation tasks attached to recipes."),
    ("data_changes", "Server-sent data-change events."),
    ("uploads", "Stored file retrieval."),
];

/// Tags for a route: the non-version, non-parameter path segments, run
/// through the replacement table and kept only when the description
/// whitelist knows them.
pub fn tags_for(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty() && !segment.starts_with('{'))
        .map(|segment| {
            TAG_REPLACEMENTS
                .iter()
                .find(|(from, _)| *from == segment)
                .map(|(_, to)| to.to_string())
                .unwrap_or_else(|| segment.to_string())
        })
        .filter(|tag| tag_description(tag).is_some())
        .collect()
}

pub fn tag_description(tag: &str) -> Option<&'static str> {
    TAG_DESCRIPTIONS
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, description)| *description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_route_has_info_or_is_skipped() {
        for route in api::route_catalog() {
            if is_skipped(route.path) {
                continue;
            }
            route_info(route.method, route.path).unwrap();
        }
    }

    #[test]
    fn unknown_routes_are_fatal() {
        assert!(matches!(
            route_info("GET", "/api/v1/unknown"),
            Err(GeneratorError::UnknownRoute(_))
        ));
    }

    #[test]
    fn path_params_extract_in_order() {
        assert_eq!(
            path_params("/api/v1/recipes/{recipeID}/prep_tasks/{recipePrepTaskID}/"),
            vec!["recipeID", "recipePrepTaskID"]
        );
        assert!(path_params("/api/v1/recipes/").is_empty());
    }

    #[test]
    fn meta_routes_get_the_meta_tag() {
        assert_eq!(tags_for("/_meta_/live"), vec!["meta"]);
        assert_eq!(
            tags_for("/api/v1/recipes/{recipeID}/prep_tasks/"),
            vec!["recipes", "prep_tasks"]
        );
        assert_eq!(tags_for("/api/v1/recipes/search"), vec!["recipes"]);
    }
}
