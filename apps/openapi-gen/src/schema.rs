//! A hand-rolled OpenAPI 3.1 document model.
//!
//! Only the parts of OpenAPI this generator emits are modeled. Every map
//! is a `BTreeMap` so serialization order is fixed and the output is
//! byte-stable across runs.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct Schema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "oneOf", skip_serializing_if = "Vec::is_empty", default)]
    pub one_of: Vec<Schema>,

    #[serde(rename = "allOf", skip_serializing_if = "Vec::is_empty", default)]
    pub all_of: Vec<Schema>,

    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty", default)]
    pub enum_values: Vec<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub properties: BTreeMap<String, Schema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
}

impl Schema {
    pub fn typed(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Self::default()
        }
    }

    pub fn typed_format(schema_type: &str, format: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            format: Some(format.to_string()),
            ..Self::default()
        }
    }

    /// The 3.1 spelling of "may be null".
    pub fn null() -> Self {
        Self::typed("null")
    }

    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("#/components/schemas/{name}")),
            ..Self::default()
        }
    }

    pub fn array_of(items: Schema) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    pub fn nullable(base: Schema) -> Self {
        Self {
            one_of: vec![Self::null(), base],
            ..Self::default()
        }
    }

    pub fn string_enum(values: Vec<String>) -> Self {
        Self {
            schema_type: Some("string".to_string()),
            enum_values: values,
            ..Self::default()
        }
    }

    pub fn object(properties: BTreeMap<String, Schema>) -> Self {
        Self {
            schema_type: Some("object".to_string()),
            properties,
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Document {
    pub openapi: String,
    pub info: Info,
    pub servers: Vec<Server>,
    pub tags: Vec<Tag>,
    pub paths: BTreeMap<String, PathItem>,
    pub components: Components,
}

#[derive(Debug, Serialize)]
pub struct Info {
    pub title: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct Server {
    pub url: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
}

#[derive(Debug, Serialize)]
pub struct Operation {
    #[serde(rename = "operationId")]
    pub operation_id: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, ResponseObject>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    pub schema: Schema,
}

#[derive(Debug, Serialize)]
pub struct RequestBody {
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Serialize)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

#[derive(Debug, Serialize)]
pub struct ResponseObject {
    pub description: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Serialize)]
pub struct Components {
    pub schemas: BTreeMap<String, Schema>,
    #[serde(rename = "securitySchemes")]
    pub security_schemes: BTreeMap<String, SecurityScheme>,
}

#[derive(Debug, Serialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: String,
    pub flows: OauthFlows,
}

#[derive(Debug, Serialize)]
pub struct OauthFlows {
    pub implicit: ImplicitFlow,
}

#[derive(Debug, Serialize)]
pub struct ImplicitFlow {
    #[serde(rename = "authorizationUrl")]
    pub authorization_url: String,
    pub scopes: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_renders_one_of_with_null_first() {
        let schema = Schema::nullable(Schema::typed("string"));
        let yaml = serde_yaml_ng::to_string(&schema).unwrap();
        assert!(yaml.contains("oneOf"));
        let parsed: serde_yaml_ng::Value = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(parsed["oneOf"][0]["type"], "null");
        assert_eq!(parsed["oneOf"][1]["type"], "string");
    }

    #[test]
    fn reference_points_into_components() {
        let schema = Schema::reference("Recipe");
        let yaml = serde_yaml_ng::to_string(&schema).unwrap();
        let parsed: serde_yaml_ng::Value = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(parsed["$ref"], "#/components/schemas/Recipe");
    }
}
