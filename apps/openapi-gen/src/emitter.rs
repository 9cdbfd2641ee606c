//! Document assembly: catalog + route info + parsed schemas → OpenAPI 3.1.

use crate::config::GeneratorConfig;
use crate::error::GeneratorError;
use crate::parser::ParsedTypes;
use crate::routes::{self, BodyShape, RouteInfo};
use crate::schema::{
    Components, Document, ImplicitFlow, Info, MediaType, OauthFlows, Operation, Parameter,
    PathItem, RequestBody, ResponseObject, Schema, SecurityScheme, Server, Tag,
};
use std::collections::{BTreeMap, BTreeSet};

const JSON: &str = "application/json";
const XML: &str = "application/xml";
const OCTET_STREAM: &str = "application/octet-stream";
const EVENT_STREAM: &str = "text/event-stream";

pub fn build_document(
    config: &GeneratorConfig,
    parsed: &ParsedTypes,
) -> Result<Document, GeneratorError> {
    let mut paths: BTreeMap<String, PathItem> = BTreeMap::new();
    let mut tag_names: BTreeSet<String> = BTreeSet::new();

    for route in api::route_catalog() {
        if routes::is_skipped(route.path) {
            continue;
        }
        let info = routes::route_info(route.method, route.path)?;
        let tags = routes::tags_for(route.path);
        tag_names.extend(tags.iter().cloned());

        let operation = build_operation(route, info, tags);
        let item = paths.entry(route.path.to_string()).or_default();
        match route.method {
            "GET" => item.get = Some(operation),
            "PUT" => item.put = Some(operation),
            "POST" => item.post = Some(operation),
            "DELETE" => item.delete = Some(operation),
            other => return Err(GeneratorError::UnknownRoute(format!("{other} {}", route.path))),
        }
    }

    let mut schemas = parsed.schemas.clone();
    schemas.insert("APIResponse".to_string(), api_response_schema());
    schemas.insert(
        "APIResponseWithError".to_string(),
        api_response_with_error_schema(),
    );

    let mut scopes = BTreeMap::new();
    scopes.insert(
        "service_admin".to_string(),
        "Platform-operator access.".to_string(),
    );
    scopes.insert(
        "household_admin".to_string(),
        "Household administration access.".to_string(),
    );
    scopes.insert(
        "household_member".to_string(),
        "Ordinary household member access.".to_string(),
    );

    let mut security_schemes = BTreeMap::new();
    security_schemes.insert(
        "oauth2".to_string(),
        SecurityScheme {
            scheme_type: "oauth2".to_string(),
            flows: OauthFlows {
                implicit: ImplicitFlow {
                    authorization_url: format!("{}/oauth2/authorize", config.server_url),
                    scopes,
                },
            },
        },
    );

    Ok(Document {
        openapi: "3.1.0".to_string(),
        info: Info {
            title: config.title.clone(),
            version: config.version.clone(),
        },
        servers: vec![Server {
            url: config.server_url.clone(),
        }],
        tags: tag_names
            .into_iter()
            .map(|name| Tag {
                description: routes::tag_description(&name).map(str::to_string),
                name,
            })
            .collect(),
        paths,
        components: Components {
            schemas,
            security_schemes,
        },
    })
}

fn build_operation(route: &api::RouteSpec, info: &RouteInfo, tags: Vec<String>) -> Operation {
    let mut parameters: Vec<Parameter> = routes::path_params(route.path)
        .into_iter()
        .map(|name| Parameter {
            name,
            location: "path".to_string(),
            required: true,
            schema: Schema::typed("string"),
        })
        .collect();

    match info.body {
        BodyShape::List(_) => parameters.extend(filter_parameters(false)),
        BodyShape::Search(_) => parameters.extend(filter_parameters(true)),
        _ => {}
    }

    // Write endpoints accept the same payload as JSON or XML.
    let request_body = info.input_type.map(|input| {
        let mut content = BTreeMap::new();
        for media_type in [JSON, XML] {
            content.insert(
                media_type.to_string(),
                MediaType {
                    schema: Some(Schema::reference(input)),
                },
            );
        }
        RequestBody { content }
    });

    let mut responses = BTreeMap::new();
    let success_status = match route.method {
        "POST" => "201",
        "DELETE" => "202",
        _ => "200",
    };
    responses.insert(success_status.to_string(), success_response(info));

    if !info.authless {
        for status in ["400", "401", "500"] {
            let mut content = BTreeMap::new();
            content.insert(
                JSON.to_string(),
                MediaType {
                    schema: Some(Schema::reference("APIResponseWithError")),
                },
            );
            responses.insert(
                status.to_string(),
                ResponseObject {
                    description: String::new(),
                    content,
                },
            );
        }
    }

    let security = if info.authless {
        Vec::new()
    } else {
        let mut requirement = BTreeMap::new();
        requirement.insert(
            "oauth2".to_string(),
            info.scopes.iter().map(|s| s.to_string()).collect(),
        );
        vec![requirement]
    };

    Operation {
        operation_id: route.operation_id.to_string(),
        description: info.description.to_string(),
        tags,
        parameters,
        request_body,
        responses,
        security,
    }
}

fn success_response(info: &RouteInfo) -> ResponseObject {
    let mut content = BTreeMap::new();
    match info.body {
        BodyShape::Entity(data_type) => {
            content.insert(JSON.to_string(), enveloped(Schema::reference(data_type)));
        }
        BodyShape::List(data_type) | BodyShape::Search(data_type) => {
            content.insert(
                JSON.to_string(),
                enveloped(Schema::array_of(Schema::reference(data_type))),
            );
        }
        BodyShape::Empty => {
            content.insert(
                JSON.to_string(),
                MediaType {
                    schema: Some(Schema::reference("APIResponse")),
                },
            );
        }
        BodyShape::Binary => {
            content.insert(
                OCTET_STREAM.to_string(),
                MediaType {
                    schema: Some(Schema::typed_format("string", "binary")),
                },
            );
        }
        BodyShape::EventStream => {
            content.insert(EVENT_STREAM.to_string(), MediaType { schema: None });
        }
        BodyShape::None => {}
    }

    ResponseObject {
        description: String::new(),
        content,
    }
}

/// `allOf` of the envelope plus a typed `data` overlay.
fn enveloped(data: Schema) -> MediaType {
    let mut overlay_properties = BTreeMap::new();
    overlay_properties.insert("data".to_string(), data);

    MediaType {
        schema: Some(Schema {
            all_of: vec![
                Schema::reference("APIResponse"),
                Schema::object(overlay_properties),
            ],
            ..Schema::default()
        }),
    }
}

/// The fixed query-filter parameter set carried by list and search routes.
fn filter_parameters(search: bool) -> Vec<Parameter> {
    let mut parameters = vec![
        query("limit", Schema::typed_format("integer", "int64"), false),
        query("page", Schema::typed_format("integer", "int64"), false),
        query(
            "createdBefore",
            Schema::typed_format("string", "date-time"),
            false,
        ),
        query(
            "createdAfter",
            Schema::typed_format("string", "date-time"),
            false,
        ),
        query(
            "updatedBefore",
            Schema::typed_format("string", "date-time"),
            false,
        ),
        query(
            "updatedAfter",
            Schema::typed_format("string", "date-time"),
            false,
        ),
        query("includeArchived", Schema::typed("boolean"), false),
        query("sortBy", Schema::reference("SortBy"), false),
    ];
    if search {
        parameters.push(query("q", Schema::typed("string"), true));
    }
    parameters
}

fn query(name: &str, schema: Schema, required: bool) -> Parameter {
    Parameter {
        name: name.to_string(),
        location: "query".to_string(),
        required,
        schema,
    }
}

fn api_response_schema() -> Schema {
    let mut properties = BTreeMap::new();
    properties.insert("details".to_string(), Schema::reference("ResponseDetails"));
    properties.insert(
        "pagination".to_string(),
        Schema::nullable(Schema::reference("Pagination")),
    );
    Schema::object(properties)
}

fn api_response_with_error_schema() -> Schema {
    let mut overlay = BTreeMap::new();
    overlay.insert("error".to_string(), Schema::reference("ApiError"));
    Schema {
        all_of: vec![Schema::reference("APIResponse"), Schema::object(overlay)],
        ..Schema::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use std::path::{Path, PathBuf};

    fn workspace_config() -> GeneratorConfig {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
        GeneratorConfig {
            source_directories: vec![
                root.join("libs/domains/recipes/src"),
                root.join("libs/core/axum-helpers/src"),
            ],
            output_file: PathBuf::from("openapi_spec.yaml"),
            server_url: "https://api.dinnerdonebetter.dev".to_string(),
            title: "Dinner Done Better API".to_string(),
            version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn two_runs_emit_identical_yaml() {
        let config = workspace_config();
        let first = {
            let parsed = parser::parse_sources(&config.source_directories).unwrap();
            serde_yaml_ng::to_string(&build_document(&config, &parsed).unwrap()).unwrap()
        };
        let second = {
            let parsed = parser::parse_sources(&config.source_directories).unwrap();
            serde_yaml_ng::to_string(&build_document(&config, &parsed).unwrap()).unwrap()
        };
        assert_eq!(first, second);
    }

    #[test]
    fn every_catalog_route_lands_in_the_document() {
        let config = workspace_config();
        let parsed = parser::parse_sources(&config.source_directories).unwrap();
        let document = build_document(&config, &parsed).unwrap();

        for route in api::route_catalog() {
            if routes::is_skipped(route.path) {
                continue;
            }
            let item = document
                .paths
                .get(route.path)
                .unwrap_or_else(|| panic!("missing path {}", route.path));
            let operation = match route.method {
                "GET" => item.get.as_ref(),
                "PUT" => item.put.as_ref(),
                "POST" => item.post.as_ref(),
                "DELETE" => item.delete.as_ref(),
                _ => None,
            }
            .unwrap_or_else(|| panic!("missing {} {}", route.method, route.path));
            assert_eq!(operation.operation_id, route.operation_id);
        }
    }

    #[test]
    fn domain_schemas_and_envelopes_are_published() {
        let config = workspace_config();
        let parsed = parser::parse_sources(&config.source_directories).unwrap();
        let document = build_document(&config, &parsed).unwrap();

        for name in [
            "Recipe",
            "RecipeCreationInput",
            "RecipePrepTask",
            "RecipePrepTaskStep",
            "StorageType",
            "SortBy",
            "ResponseDetails",
            "Pagination",
            "ApiError",
            "APIResponse",
            "APIResponseWithError",
        ] {
            assert!(
                document.components.schemas.contains_key(name),
                "missing schema {name}"
            );
        }
    }

    #[test]
    fn search_route_requires_q_and_list_does_not_carry_it() {
        let config = workspace_config();
        let parsed = parser::parse_sources(&config.source_directories).unwrap();
        let document = build_document(&config, &parsed).unwrap();

        let search = document.paths["/api/v1/recipes/search"]
            .get
            .as_ref()
            .unwrap();
        let q = search
            .parameters
            .iter()
            .find(|p| p.name == "q")
            .expect("search carries q");
        assert!(q.required);

        let list = document.paths["/api/v1/recipes/"].get.as_ref().unwrap();
        assert!(list.parameters.iter().all(|p| p.name != "q"));
        assert!(list.parameters.iter().any(|p| p.name == "limit"));
    }

    #[test]
    fn overrides_shape_the_upload_and_sse_routes() {
        let config = workspace_config();
        let parsed = parser::parse_sources(&config.source_directories).unwrap();
        let document = build_document(&config, &parsed).unwrap();

        let upload = document.paths["/api/v1/uploads/{filename}"]
            .get
            .as_ref()
            .unwrap();
        let success = &upload.responses["200"];
        assert!(success.content.contains_key(OCTET_STREAM));

        let sse = document.paths["/api/v1/data_changes"].get.as_ref().unwrap();
        let success = &sse.responses["200"];
        let media = &success.content[EVENT_STREAM];
        assert!(media.schema.is_none());
    }

    #[test]
    fn write_routes_accept_json_and_xml_bodies() {
        let config = workspace_config();
        let parsed = parser::parse_sources(&config.source_directories).unwrap();
        let document = build_document(&config, &parsed).unwrap();

        let create = document.paths["/api/v1/recipes/"].post.as_ref().unwrap();
        let body = create.request_body.as_ref().unwrap();
        for media_type in [JSON, XML] {
            let media = body
                .content
                .get(media_type)
                .unwrap_or_else(|| panic!("missing request media type {media_type}"));
            assert_eq!(
                media.schema.as_ref().unwrap().reference.as_deref(),
                Some("#/components/schemas/RecipeCreationInput")
            );
        }
    }

    #[test]
    fn archive_routes_answer_202_with_the_bare_envelope() {
        let config = workspace_config();
        let parsed = parser::parse_sources(&config.source_directories).unwrap();
        let document = build_document(&config, &parsed).unwrap();

        let archive = document.paths["/api/v1/recipes/{recipeID}/"]
            .delete
            .as_ref()
            .unwrap();
        let success = &archive.responses["202"];
        let media = &success.content[JSON];
        assert_eq!(
            media.schema.as_ref().unwrap().reference.as_deref(),
            Some("#/components/schemas/APIResponse")
        );
    }
}
