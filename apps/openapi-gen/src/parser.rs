//! Schema extraction from Rust sources.
//!
//! Walks the configured source directories, parses every `.rs` file with
//! `syn`, and derives a JSON-schema descriptor for each serde-serializable
//! named-field struct, plus a string schema for each unit-variant enum.
//! Any field type this module cannot classify is a fatal error: a hole in
//! the published document is worse than a failed generation.

use crate::error::GeneratorError;
use crate::schema::Schema;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use syn::{Fields, GenericArgument, Item, PathArguments, Type};
use walkdir::WalkDir;

/// Types never emitted as schemas: generic envelope machinery that the
/// emitter hand-authors instead.
const TYPE_SKIP_SET: &[&str] = &["ApiResponse", "EnvelopeError", "Page"];

/// `(type, field)` pairs whose derived schema is replaced with a `$ref` to
/// a named enum schema. Carried over from the previous generation tooling;
/// the audit-log types are not part of this workspace yet.
const ENUM_FIELD_OVERRIDES: &[((&str, &str), &str)] =
    &[(("AuditLogEntry", "changes"), "ChangeLog")];

#[derive(Debug, Default)]
pub struct ParsedTypes {
    pub schemas: BTreeMap<String, Schema>,
    pub enum_names: BTreeSet<String>,
}

pub fn parse_sources(directories: &[PathBuf]) -> Result<ParsedTypes, GeneratorError> {
    let mut parsed = ParsedTypes::default();

    for directory in directories {
        for entry in WalkDir::new(directory).sort_by_file_name() {
            let entry = entry.map_err(|e| GeneratorError::ReadSource {
                path: directory.clone(),
                details: e.to_string(),
            })?;
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "rs") {
                continue;
            }

            let source =
                std::fs::read_to_string(path).map_err(|e| GeneratorError::ReadSource {
                    path: path.to_path_buf(),
                    details: e.to_string(),
                })?;
            let file = syn::parse_file(&source).map_err(|e| GeneratorError::ParseSource {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?;

            collect_from_file(&file, &mut parsed)?;
        }
    }

    Ok(parsed)
}

/// Collect schemas from one parsed file. Top-level items only; inline
/// test modules hold no wire types.
pub fn collect_from_file(file: &syn::File, parsed: &mut ParsedTypes) -> Result<(), GeneratorError> {
    for item in &file.items {
        match item {
            Item::Struct(item) => {
                if let Some((name, schema)) = struct_schema(item)? {
                    parsed.schemas.insert(name, schema);
                }
            }
            Item::Enum(item) => {
                if let Some((name, schema)) = enum_schema(item)? {
                    parsed.enum_names.insert(name.clone());
                    parsed.schemas.insert(name, schema);
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn struct_schema(item: &syn::ItemStruct) -> Result<Option<(String, Schema)>, GeneratorError> {
    let name = item.ident.to_string();
    if TYPE_SKIP_SET.contains(&name.as_str()) {
        return Ok(None);
    }
    // Generic wrappers cannot be named as a single schema.
    if !item.generics.params.is_empty() {
        return Ok(None);
    }
    if !derives_serde(&item.attrs) {
        return Ok(None);
    }
    let Fields::Named(fields) = &item.fields else {
        return Ok(None);
    };

    let container = SerdeMeta::from_attrs(&item.attrs)?;
    let mut properties = BTreeMap::new();

    for field in &fields.named {
        let ident = field
            .ident
            .as_ref()
            .map(|i| i.to_string())
            .unwrap_or_default();
        let meta = SerdeMeta::from_attrs(&field.attrs)?;
        if meta.skipped {
            continue;
        }

        let property_name = meta
            .rename
            .clone()
            .unwrap_or_else(|| apply_rename_all(container.rename_all.as_deref(), &ident));

        let schema = if let Some(target) = enum_field_override(&name, &ident) {
            Schema::reference(target)
        } else {
            field_schema(&field.ty, &name, &ident, &property_name)?
        };

        properties.insert(property_name, schema);
    }

    Ok(Some((name, Schema::object(properties))))
}

fn enum_schema(item: &syn::ItemEnum) -> Result<Option<(String, Schema)>, GeneratorError> {
    if !derives_serde(&item.attrs) {
        return Ok(None);
    }
    if !item
        .variants
        .iter()
        .all(|variant| matches!(variant.fields, Fields::Unit))
    {
        return Ok(None);
    }

    let container = SerdeMeta::from_attrs(&item.attrs)?;
    let mut values = Vec::new();
    for variant in &item.variants {
        let meta = SerdeMeta::from_attrs(&variant.attrs)?;
        if meta.skipped {
            continue;
        }
        let value = meta.rename.unwrap_or_else(|| {
            apply_rename_all(container.rename_all.as_deref(), &variant.ident.to_string())
        });
        values.push(value);
    }

    Ok(Some((item.ident.to_string(), Schema::string_enum(values))))
}

fn enum_field_override(type_name: &str, field: &str) -> Option<&'static str> {
    ENUM_FIELD_OVERRIDES
        .iter()
        .find(|((ty, fld), _)| *ty == type_name && *fld == field)
        .map(|(_, target)| *target)
}

/// Derive the schema for one field type.
fn field_schema(
    ty: &Type,
    type_name: &str,
    field: &str,
    property_name: &str,
) -> Result<Schema, GeneratorError> {
    match ty {
        Type::Reference(reference) => field_schema(&reference.elem, type_name, field, property_name),
        Type::Path(path) => {
            let Some(segment) = path.path.segments.last() else {
                return Err(unhandled(type_name, field, "empty type path"));
            };
            let ident = segment.ident.to_string();
            match ident.as_str() {
                "Option" => {
                    let inner = generic_argument(segment, type_name, field)?;
                    Ok(Schema::nullable(field_schema(
                        inner,
                        type_name,
                        field,
                        property_name,
                    )?))
                }
                "Vec" => {
                    let inner = generic_argument(segment, type_name, field)?;
                    Ok(Schema::array_of(field_schema(
                        inner,
                        type_name,
                        field,
                        property_name,
                    )?))
                }
                "Box" => {
                    let inner = generic_argument(segment, type_name, field)?;
                    field_schema(inner, type_name, field, property_name)
                }
                // Maps are published as opaque objects.
                "HashMap" | "BTreeMap" => Ok(Schema::typed("object")),
                "String" | "str" => Ok(string_schema(property_name)),
                "i8" | "i16" | "i32" | "u8" => Ok(Schema::typed_format("integer", "int32")),
                "i64" | "u16" | "u32" | "u64" | "usize" | "isize" => {
                    Ok(Schema::typed_format("integer", "int64"))
                }
                "f32" | "f64" => Ok(Schema::typed_format("number", "double")),
                "bool" => Ok(Schema::typed("boolean")),
                "DateTime" => Ok(Schema::typed_format("string", "date-time")),
                "Duration" => Ok(Schema::typed("string")),
                "Uuid" => Ok(Schema::typed_format("string", "uuid")),
                other if other
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_uppercase()) =>
                {
                    Ok(Schema::reference(other))
                }
                other => Err(unhandled(type_name, field, other)),
            }
        }
        other => Err(unhandled(
            type_name,
            field,
            &format!("{:?}", std::mem::discriminant(other)),
        )),
    }
}

/// String fields whose name implies a format.
fn string_schema(property_name: &str) -> Schema {
    let lowered = property_name.to_ascii_lowercase();
    match lowered.as_str() {
        "password" | "currentpassword" | "newpassword" => {
            Schema::typed_format("string", "password")
        }
        "url" => Schema::typed_format("string", "uri"),
        _ => Schema::typed("string"),
    }
}

fn generic_argument<'a>(
    segment: &'a syn::PathSegment,
    type_name: &str,
    field: &str,
) -> Result<&'a Type, GeneratorError> {
    if let PathArguments::AngleBracketed(args) = &segment.arguments {
        for argument in &args.args {
            if let GenericArgument::Type(ty) = argument {
                return Ok(ty);
            }
        }
    }
    Err(unhandled(type_name, field, "missing generic argument"))
}

fn unhandled(type_name: &str, field: &str, details: &str) -> GeneratorError {
    GeneratorError::UnhandledFieldType {
        type_name: type_name.to_string(),
        field: field.to_string(),
        details: details.to_string(),
    }
}

fn derives_serde(attrs: &[syn::Attribute]) -> bool {
    let mut found = false;
    for attr in attrs {
        if !attr.path().is_ident("derive") {
            continue;
        }
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(segment) = meta.path.segments.last() {
                let ident = segment.ident.to_string();
                if ident == "Serialize" || ident == "Deserialize" {
                    found = true;
                }
            }
            Ok(())
        });
    }
    found
}

/// The serde attributes this generator understands.
#[derive(Debug, Default)]
struct SerdeMeta {
    rename_all: Option<String>,
    rename: Option<String>,
    skipped: bool,
}

impl SerdeMeta {
    fn from_attrs(attrs: &[syn::Attribute]) -> Result<Self, GeneratorError> {
        let mut meta = Self::default();
        for attr in attrs {
            if !attr.path().is_ident("serde") {
                continue;
            }
            attr.parse_nested_meta(|nested| {
                if nested.path.is_ident("rename_all") {
                    meta.rename_all = Some(string_value(&nested)?);
                } else if nested.path.is_ident("rename") {
                    meta.rename = Some(string_value(&nested)?);
                } else if nested.path.is_ident("skip") || nested.path.is_ident("skip_serializing")
                {
                    meta.skipped = true;
                } else if nested.input.peek(syn::Token![=]) {
                    // Unrelated name = value attribute (skip_serializing_if,
                    // with, ...); consume the value so parsing continues.
                    let _: syn::Expr = nested.value()?.parse()?;
                }
                Ok(())
            })
            .map_err(|e| GeneratorError::ParseSource {
                path: PathBuf::new(),
                details: format!("bad serde attribute: {e}"),
            })?;
        }
        Ok(meta)
    }
}

fn string_value(meta: &syn::meta::ParseNestedMeta) -> syn::Result<String> {
    let literal: syn::LitStr = meta.value()?.parse()?;
    Ok(literal.value())
}

fn apply_rename_all(rename_all: Option<&str>, ident: &str) -> String {
    match rename_all {
        Some("camelCase") => to_camel_case(ident),
        Some("snake_case") => to_snake_case(ident),
        Some("lowercase") => ident.to_ascii_lowercase(),
        Some("UPPERCASE") => ident.to_ascii_uppercase(),
        _ => ident.to_string(),
    }
}

fn to_camel_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let mut upper_next = false;
    for c in ident.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn to_snake_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, c) in ident.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse a single inline source, for exercising the collector directly.
#[cfg(test)]
pub fn parse_source_str(source: &str) -> Result<ParsedTypes, GeneratorError> {
    let file = syn::parse_file(source).map_err(|e| GeneratorError::ParseSource {
        path: Path::new("<inline>").to_path_buf(),
        details: e.to_string(),
    })?;
    let mut parsed = ParsedTypes::default();
    collect_from_file(&file, &mut parsed)?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_string_becomes_one_of_null_then_string() {
        let parsed = parse_source_str(
            r#"
            #[derive(Serialize)]
            #[serde(rename_all = "camelCase")]
            pub struct Profile {
                pub display_name: String,
                pub nickname: Option<String>,
            }
            "#,
        )
        .unwrap();

        let schema = &parsed.schemas["Profile"];
        assert_eq!(schema.properties["displayName"], Schema::typed("string"));

        let nickname = &schema.properties["nickname"];
        assert_eq!(nickname.one_of.len(), 2);
        assert_eq!(nickname.one_of[0], Schema::null());
        assert_eq!(nickname.one_of[1], Schema::typed("string"));
    }

    #[test]
    fn field_rename_beats_container_rename_all() {
        let parsed = parse_source_str(
            r#"
            #[derive(Serialize)]
            #[serde(rename_all = "camelCase")]
            pub struct Recipe {
                #[serde(rename = "inspiredByRecipeID")]
                pub inspired_by_recipe_id: Option<Uuid>,
                #[serde(skip)]
                pub internal_marker: String,
                #[serde(skip_serializing_if = "Option::is_none")]
                pub source: Option<String>,
            }
            "#,
        )
        .unwrap();

        let schema = &parsed.schemas["Recipe"];
        assert!(schema.properties.contains_key("inspiredByRecipeID"));
        assert!(!schema.properties.contains_key("internal_marker"));
        assert!(!schema.properties.contains_key("internalMarker"));
        // skip_serializing_if is conditional, not an exclusion.
        assert!(schema.properties.contains_key("source"));
    }

    #[test]
    fn unit_enum_collects_renamed_values() {
        let parsed = parse_source_str(
            r#"
            #[derive(Serialize, Deserialize)]
            #[serde(rename_all = "snake_case")]
            pub enum StorageKind {
                Uncovered,
                #[serde(rename = "on a wire rack")]
                WireRack,
            }
            "#,
        )
        .unwrap();

        assert!(parsed.enum_names.contains("StorageKind"));
        let schema = &parsed.schemas["StorageKind"];
        assert_eq!(
            schema.enum_values,
            vec!["uncovered".to_string(), "on a wire rack".to_string()]
        );
    }

    #[test]
    fn vectors_and_refs_nest() {
        let parsed = parse_source_str(
            r#"
            #[derive(Serialize)]
            pub struct Task {
                pub steps: Vec<TaskStep>,
                pub when: DateTime<Utc>,
                pub id: Uuid,
            }
            "#,
        )
        .unwrap();

        let schema = &parsed.schemas["Task"];
        let steps = &schema.properties["steps"];
        assert_eq!(steps.schema_type.as_deref(), Some("array"));
        assert_eq!(
            steps.items.as_deref().unwrap(),
            &Schema::reference("TaskStep")
        );
        assert_eq!(
            schema.properties["when"],
            Schema::typed_format("string", "date-time")
        );
        assert_eq!(
            schema.properties["id"],
            Schema::typed_format("string", "uuid")
        );
    }

    #[test]
    fn non_serde_and_generic_types_are_ignored() {
        let parsed = parse_source_str(
            r#"
            pub struct Plain { pub a: String }

            #[derive(Serialize)]
            pub struct Wrapper<T> { pub inner: T }
            "#,
        )
        .unwrap();
        assert!(parsed.schemas.is_empty());
    }

    #[test]
    fn tuple_field_type_is_fatal() {
        let result = parse_source_str(
            r#"
            #[derive(Serialize)]
            pub struct Odd { pub pair: (String, String) }
            "#,
        );
        assert!(matches!(
            result,
            Err(GeneratorError::UnhandledFieldType { .. })
        ));
    }

    #[test]
    fn password_fields_get_the_password_format() {
        let parsed = parse_source_str(
            r#"
            #[derive(Deserialize)]
            #[serde(rename_all = "camelCase")]
            pub struct PasswordUpdateInput {
                pub current_password: String,
                pub new_password: String,
                pub url: String,
            }
            "#,
        )
        .unwrap();

        let schema = &parsed.schemas["PasswordUpdateInput"];
        assert_eq!(
            schema.properties["currentPassword"],
            Schema::typed_format("string", "password")
        );
        assert_eq!(
            schema.properties["url"],
            Schema::typed_format("string", "uri")
        );
    }
}
